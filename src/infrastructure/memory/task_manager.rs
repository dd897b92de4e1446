//! In-Memory Task Manager Implementation

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::application::bridge::AudioResult;
use crate::application::ports::{GenerationTask, TaskError, TaskManagerPort, TaskState};

/// 内存任务管理器
///
/// 任务记录和结果都只存活在进程内存里；结果持久化属于外部
/// 编排平台的存储层，不在本服务内实现
pub struct InMemoryTaskManager {
    /// task_id -> GenerationTask
    tasks: DashMap<String, GenerationTask>,
    /// task_id -> AudioResult（只有 Ready 状态的任务有结果）
    results: DashMap<String, AudioResult>,
    /// 任务队列发送端
    queue_sender: mpsc::Sender<String>,
}

impl InMemoryTaskManager {
    pub fn new(queue_sender: mpsc::Sender<String>) -> Self {
        Self {
            tasks: DashMap::new(),
            results: DashMap::new(),
            queue_sender,
        }
    }
}

impl TaskManagerPort for InMemoryTaskManager {
    fn submit(&self, task: GenerationTask) -> Result<String, TaskError> {
        let task_id = task.task_id.clone();

        self.tasks.insert(task_id.clone(), task);

        if let Err(e) = self.queue_sender.try_send(task_id.clone()) {
            tracing::warn!(task_id = %task_id, error = %e, "Failed to enqueue task");
        }

        tracing::debug!(task_id = %task_id, "Task submitted");
        Ok(task_id)
    }

    fn get_task(&self, task_id: &str) -> Option<GenerationTask> {
        self.tasks.get(task_id).map(|t| t.clone())
    }

    fn get_state(&self, task_id: &str) -> Option<TaskState> {
        self.tasks.get(task_id).map(|t| t.state)
    }

    fn set_running(&self, task_id: &str) -> Result<(), TaskError> {
        let mut task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        task.state = TaskState::Running;
        tracing::debug!(task_id = %task_id, "Task running");
        Ok(())
    }

    fn set_ready(&self, task_id: &str, result: AudioResult) -> Result<(), TaskError> {
        let mut task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        task.state = TaskState::Ready;
        task.completed_at = Some(Utc::now());
        self.results.insert(task_id.to_string(), result);

        tracing::debug!(task_id = %task_id, "Task ready");
        Ok(())
    }

    fn set_failed(&self, task_id: &str, error: String) -> Result<(), TaskError> {
        let mut task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        task.state = TaskState::Failed;
        task.error_message = Some(error);
        task.completed_at = Some(Utc::now());

        tracing::debug!(task_id = %task_id, "Task failed");
        Ok(())
    }

    fn get_result(&self, task_id: &str) -> Option<AudioResult> {
        self.results.get(task_id).map(|r| r.clone())
    }
}
