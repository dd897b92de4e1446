//! Task Worker - Background Generation Task Processor

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::bridge::InferenceBridge;
use crate::application::ports::TaskManagerPort;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct TaskWorkerConfig {
    /// 最大并发任务数
    pub max_concurrent: usize,
}

impl Default for TaskWorkerConfig {
    fn default() -> Self {
        Self { max_concurrent: 2 }
    }
}

/// 任务 Worker
///
/// 后台任务处理器，从队列消费任务并执行桥接流程。每个任务在独立的
/// tokio task 中运行，慢的上游调用只占住自己的并发额度
pub struct TaskWorker {
    config: TaskWorkerConfig,
    queue_receiver: mpsc::Receiver<String>,
    task_manager: Arc<dyn TaskManagerPort>,
    bridge: Arc<InferenceBridge>,
}

impl TaskWorker {
    pub fn new(
        config: TaskWorkerConfig,
        queue_receiver: mpsc::Receiver<String>,
        task_manager: Arc<dyn TaskManagerPort>,
        bridge: Arc<InferenceBridge>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            task_manager,
            bridge,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "TaskWorker started"
        );

        // 使用 semaphore 控制并发
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent));

        while let Some(task_id) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    tracing::error!("Failed to acquire semaphore permit");
                    continue;
                }
            };

            let task_manager = self.task_manager.clone();
            let bridge = self.bridge.clone();

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到任务完成

                Self::process_task(&task_id, task_manager, bridge).await;
            });
        }

        tracing::info!("TaskWorker stopped");
    }

    /// 处理单个任务
    async fn process_task(
        task_id: &str,
        task_manager: Arc<dyn TaskManagerPort>,
        bridge: Arc<InferenceBridge>,
    ) {
        let task = match task_manager.get_task(task_id) {
            Some(t) => t,
            None => {
                tracing::warn!(task_id = %task_id, "Task not found, skipping");
                return;
            }
        };

        if let Err(e) = task_manager.set_running(task_id) {
            tracing::error!(task_id = %task_id, error = %e, "Failed to update task state");
            return;
        }

        match bridge
            .process(&task.json_description, &task.input_text)
            .await
        {
            Ok(result) => {
                tracing::info!(
                    task_id = %task_id,
                    result_size = result.data.len(),
                    "Task completed"
                );
                if let Err(e) = task_manager.set_ready(task_id, result) {
                    tracing::error!(task_id = %task_id, error = %e, "Failed to store result");
                }
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Task failed");
                let _ = task_manager.set_failed(task_id, e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{GenerationTask, TaskManagerPort, TaskState, TranscodeConfig};
    use crate::infrastructure::adapters::{FakeInferenceClient, OggTranscoder};
    use crate::infrastructure::memory::InMemoryTaskManager;
    use std::time::Duration;

    fn bridge_with_upstream(response: Vec<u8>) -> Arc<InferenceBridge> {
        Arc::new(InferenceBridge::new(
            Arc::new(FakeInferenceClient::new(response)),
            Arc::new(OggTranscoder::new()),
            TranscodeConfig::default(),
        ))
    }

    async fn wait_for_terminal_state(
        manager: &Arc<InMemoryTaskManager>,
        task_id: &str,
    ) -> TaskState {
        for _ in 0..100 {
            if let Some(state) = manager.get_state(task_id) {
                if state.is_terminal() {
                    return state;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task did not reach a terminal state");
    }

    #[tokio::test]
    async fn test_worker_marks_failed_task() {
        let (tx, rx) = mpsc::channel(10);
        let manager = Arc::new(InMemoryTaskManager::new(tx));
        // 上游返回错误负载，任务应以 Failed 结束
        let bridge = bridge_with_upstream(br#"{"error":"model loading"}"#.to_vec());

        let worker = TaskWorker::new(
            TaskWorkerConfig::default(),
            rx,
            manager.clone(),
            bridge,
        );
        tokio::spawn(worker.run());

        let task = GenerationTask::new(
            br#"{"api_token":"t","api_url":"http://x"}"#.to_vec(),
            b"prompt".to_vec(),
        );
        let task_id = manager.submit(task).unwrap();

        let state = wait_for_terminal_state(&manager, &task_id).await;
        assert_eq!(state, TaskState::Failed);

        let task = manager.get_task(&task_id).unwrap();
        assert_eq!(task.error_message.as_deref(), Some("model loading"));
        assert!(manager.get_result(&task_id).is_none());
    }

    #[tokio::test]
    async fn test_worker_skips_unknown_task_id() {
        let (tx, rx) = mpsc::channel(10);
        let manager = Arc::new(InMemoryTaskManager::new(tx.clone()));
        let bridge = bridge_with_upstream(b"irrelevant".to_vec());

        let worker = TaskWorker::new(
            TaskWorkerConfig::default(),
            rx,
            manager.clone(),
            bridge,
        );
        tokio::spawn(worker.run());

        // 队列里有 ID 但管理器中无记录
        tx.send("ghost-task".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(manager.get_task("ghost-task").is_none());
    }
}
