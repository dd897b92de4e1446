//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod inference;
pub mod transcoder;

pub use inference::*;
pub use transcoder::*;
