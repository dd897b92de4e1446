//! Task Manager Port - 生成任务管理
//!
//! 定义任务管理的抽象接口，具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::application::bridge::AudioResult;

/// Task Manager 错误
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// 等待执行
    Pending,
    /// 正在执行
    Running,
    /// 执行完成，结果可下载
    Ready,
    /// 执行失败
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Ready => "ready",
            TaskState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Ready | TaskState::Failed)
    }
}

/// 生成任务
///
/// 一个任务对应 InferenceBridge 的一次调用：恰好消费一份描述符
/// 和一份提示词
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub task_id: String,
    /// 原始描述符字节（UTF-8 JSON），解析推迟到执行时
    pub json_description: Vec<u8>,
    /// 原始提示词字节（UTF-8 文本）
    pub input_text: Vec<u8>,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl GenerationTask {
    pub fn new(json_description: Vec<u8>, input_text: Vec<u8>) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            json_description,
            input_text,
            state: TaskState::Pending,
            created_at: Utc::now(),
            completed_at: None,
            error_message: None,
        }
    }
}

/// Task Manager Port
///
/// 管理生成任务的生命周期，所有状态存储在内存中
pub trait TaskManagerPort: Send + Sync {
    /// 提交任务到队列，返回任务 ID
    fn submit(&self, task: GenerationTask) -> Result<String, TaskError>;

    /// 获取任务
    fn get_task(&self, task_id: &str) -> Option<GenerationTask>;

    /// 获取任务状态
    fn get_state(&self, task_id: &str) -> Option<TaskState>;

    /// 标记任务开始执行
    fn set_running(&self, task_id: &str) -> Result<(), TaskError>;

    /// 标记任务完成并存入结果
    fn set_ready(&self, task_id: &str, result: AudioResult) -> Result<(), TaskError>;

    /// 标记任务失败并记录错误
    fn set_failed(&self, task_id: &str, error: String) -> Result<(), TaskError>;

    /// 获取已完成任务的结果
    fn get_result(&self, task_id: &str) -> Option<AudioResult>;
}
