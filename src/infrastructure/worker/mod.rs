//! 后台任务处理

mod task_worker;

pub use task_worker::{TaskWorker, TaskWorkerConfig};
