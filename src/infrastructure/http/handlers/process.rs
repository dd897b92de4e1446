//! Process Handler - 同步执行端点
//!
//! 不经过任务队列，直接在请求上下文里跑完整个桥接流程并返回
//! Ogg 字节。上游没有超时约束，调用方自行决定等多久。

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    /// 描述符 JSON 文本（api_token + api_url）
    pub json_description: String,
    /// 生成提示词
    pub input_text: String,
}

pub async fn process_sync(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessRequest>,
) -> Result<Response, ApiError> {
    let result = state
        .bridge
        .process(req.json_description.as_bytes(), req.input_text.as_bytes())
        .await?;

    Ok(([(header::CONTENT_TYPE, result.media_type)], result.data).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bridge::InferenceBridge;
    use crate::application::ports::TranscodeConfig;
    use crate::infrastructure::adapters::{FakeInferenceClient, OggTranscoder};
    use crate::infrastructure::http::create_routes;
    use crate::infrastructure::memory::InMemoryTaskManager;
    use crate::domain::service_info::ServiceInfo;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    fn app_with_upstream(upstream_response: Vec<u8>) -> axum::Router {
        let (tx, _rx) = mpsc::channel(100);
        let manager = Arc::new(InMemoryTaskManager::new(tx));
        let bridge = Arc::new(InferenceBridge::new(
            Arc::new(FakeInferenceClient::new(upstream_response)),
            Arc::new(OggTranscoder::new()),
            TranscodeConfig::default(),
        ));
        let state = Arc::new(AppState::new(
            manager,
            bridge,
            ServiceInfo::new("http://localhost:5070"),
        ));
        create_routes().with_state(state)
    }

    fn process_request(json_description: &str, input_text: &str) -> Request<Body> {
        let body = serde_json::json!({
            "json_description": json_description,
            "input_text": input_text,
        });
        Request::builder()
            .method("POST")
            .uri("/api/process")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upstream_error_maps_to_errno_503() {
        let app = app_with_upstream(br#"{"error":"model loading"}"#.to_vec());

        let response = app
            .oneshot(process_request(
                r#"{"api_token":"t","api_url":"http://x"}"#,
                "a prompt",
            ))
            .await
            .unwrap();

        // 业务错误走 HTTP 200 + errno 约定
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["errno"], 503);
        assert_eq!(json["error"], "model loading");
    }

    #[tokio::test]
    async fn test_bad_descriptor_maps_to_errno_400() {
        let app = app_with_upstream(b"unused".to_vec());

        let response = app
            .oneshot(process_request("not json", "a prompt"))
            .await
            .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["errno"], 400);
    }
}
