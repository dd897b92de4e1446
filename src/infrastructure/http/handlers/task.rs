//! Task Handlers - 异步任务提交/查询/结果下载

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::ports::{GenerationTask, TaskState};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Submit Task
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    /// 描述符 JSON 文本（api_token + api_url）
    pub json_description: String,
    /// 生成提示词
    pub input_text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitTaskResponseDto {
    pub task_id: String,
    pub state: String,
}

pub async fn submit_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitTaskRequest>,
) -> Result<Json<ApiResponse<SubmitTaskResponseDto>>, ApiError> {
    // 输入在执行时才解析校验；提交阶段只负责入队
    let task = GenerationTask::new(
        req.json_description.into_bytes(),
        req.input_text.into_bytes(),
    );

    let task_id = state
        .task_manager
        .submit(task)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(task_id = %task_id, "Generation task submitted");

    Ok(Json(ApiResponse::success(SubmitTaskResponseDto {
        task_id,
        state: TaskState::Pending.as_str().to_string(),
    })))
}

// ============================================================================
// Query Task Status
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QueryTaskStatusRequest {
    pub task_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskStatusDto {
    pub task_id: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryTaskStatusResponseDto {
    pub tasks: Vec<TaskStatusDto>,
}

pub async fn query_task_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryTaskStatusRequest>,
) -> Json<ApiResponse<QueryTaskStatusResponseDto>> {
    let tasks = req
        .task_ids
        .iter()
        .filter_map(|task_id| {
            state.task_manager.get_task(task_id).map(|task| TaskStatusDto {
                task_id: task.task_id,
                state: task.state.as_str().to_string(),
                error: task.error_message,
            })
        })
        .collect();

    Json(ApiResponse::success(QueryTaskStatusResponseDto { tasks }))
}

// ============================================================================
// Download Task Result
// ============================================================================

pub async fn download_task_result(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let task = state
        .task_manager
        .get_task(&task_id)
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;

    match task.state {
        TaskState::Pending | TaskState::Running => Err(ApiError::Conflict(format!(
            "Task not ready: {}",
            task.state.as_str()
        ))),
        TaskState::Failed => Err(ApiError::Internal(
            task.error_message
                .unwrap_or_else(|| "Task failed".to_string()),
        )),
        TaskState::Ready => {
            let result = state
                .task_manager
                .get_result(&task_id)
                .ok_or_else(|| ApiError::Internal("Result missing for ready task".to_string()))?;

            Ok(([(header::CONTENT_TYPE, result.media_type)], result.data).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bridge::{AudioResult, InferenceBridge};
    use crate::application::ports::{TaskManagerPort, TranscodeConfig};
    use crate::infrastructure::adapters::{FakeInferenceClient, OggTranscoder};
    use crate::infrastructure::http::create_routes;
    use crate::infrastructure::memory::InMemoryTaskManager;
    use crate::domain::service_info::ServiceInfo;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    fn test_state() -> (Arc<AppState>, Arc<InMemoryTaskManager>) {
        let (tx, _rx) = mpsc::channel(100);
        let manager = Arc::new(InMemoryTaskManager::new(tx));
        let bridge = Arc::new(InferenceBridge::new(
            Arc::new(FakeInferenceClient::new(b"unused".to_vec())),
            Arc::new(OggTranscoder::new()),
            TranscodeConfig::default(),
        ));
        let state = Arc::new(AppState::new(
            manager.clone(),
            bridge,
            ServiceInfo::new("http://localhost:5070"),
        ));
        (state, manager)
    }

    fn app(state: Arc<AppState>) -> axum::Router {
        create_routes().with_state(state)
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_submit_creates_pending_task() {
        let (state, manager) = test_state();

        let body = serde_json::json!({
            "json_description": r#"{"api_token":"t","api_url":"http://x"}"#,
            "input_text": "a prompt",
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/task/submit")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["state"], "pending");

        let task_id = json["data"]["task_id"].as_str().unwrap();
        assert_eq!(manager.get_state(task_id), Some(TaskState::Pending));
    }

    #[tokio::test]
    async fn test_status_reports_failure_message() {
        let (state, manager) = test_state();

        let task = GenerationTask::new(b"{}".to_vec(), b"p".to_vec());
        let task_id = manager.submit(task).unwrap();
        manager.set_failed(&task_id, "model loading".to_string()).unwrap();

        let body = serde_json::json!({ "task_ids": [task_id] });
        let request = Request::builder()
            .method("POST")
            .uri("/api/task/status")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        let json = response_json(response).await;

        assert_eq!(json["data"]["tasks"][0]["state"], "failed");
        assert_eq!(json["data"]["tasks"][0]["error"], "model loading");
    }

    #[tokio::test]
    async fn test_result_for_unknown_task_is_not_found() {
        let (state, _manager) = test_state();

        let request = Request::builder()
            .uri("/api/task/no-such-task/result")
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        let json = response_json(response).await;

        assert_eq!(json["errno"], 404);
    }

    #[tokio::test]
    async fn test_result_before_completion_is_conflict() {
        let (state, manager) = test_state();

        let task = GenerationTask::new(b"{}".to_vec(), b"p".to_vec());
        let task_id = manager.submit(task).unwrap();

        let request = Request::builder()
            .uri(format!("/api/task/{}/result", task_id))
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        let json = response_json(response).await;

        assert_eq!(json["errno"], 409);
    }

    #[tokio::test]
    async fn test_ready_result_is_served_as_ogg() {
        let (state, manager) = test_state();

        let task = GenerationTask::new(b"{}".to_vec(), b"p".to_vec());
        let task_id = manager.submit(task).unwrap();
        manager
            .set_ready(
                &task_id,
                AudioResult {
                    data: b"OggS-fake-bytes".to_vec(),
                    media_type: "audio/ogg",
                },
            )
            .unwrap();

        let request = Request::builder()
            .uri(format!("/api/task/{}/result", task_id))
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "audio/ogg"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"OggS-fake-bytes");
    }
}
