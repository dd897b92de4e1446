//! 服务注册

mod announcer;

pub use announcer::{Announcer, AnnouncerConfig, AnnounceError};
