//! HTTP Handlers

mod ping;
mod process;
mod service;
mod task;

pub use ping::ping;
pub use process::process_sync;
pub use service::get_service_info;
pub use task::{download_task_result, query_task_status, submit_task};
