//! HTTP Inference Client - 调用上游文本转音频推理 API
//!
//! 实现 InferenceClientPort trait，通过 HTTP 调用 hub 推理端点
//!
//! 上游 API:
//! POST {api_url}
//! Header: Authorization: Bearer {api_token}
//! Request: {"inputs": "..."}  (JSON)
//! Response: 音频容器字节，或 {"error": "..."} JSON

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{InferenceClientPort, InferenceError, InferenceRequest};

/// HTTP 推理客户端配置
#[derive(Debug, Clone, Default)]
pub struct HttpInferenceClientConfig {
    /// 请求超时时间（秒），0 表示不设超时
    /// 模型冷加载可能耗时很久，默认不限制，截止时间由调用方负责
    pub timeout_secs: u64,
}

impl HttpInferenceClientConfig {
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 推理客户端
///
/// 每次请求的目标 URL 和凭证来自描述符，客户端本身只持有传输层配置
pub struct HttpInferenceClient {
    client: Client,
}

impl HttpInferenceClient {
    /// 创建新的 HTTP 推理客户端
    pub fn new(config: HttpInferenceClientConfig) -> Result<Self, InferenceError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| InferenceError::NetworkError(e.to_string()))?;

        Ok(Self { client })
    }

    /// 使用默认配置创建客户端
    pub fn with_default_config() -> Result<Self, InferenceError> {
        Self::new(HttpInferenceClientConfig::default())
    }
}

#[async_trait]
impl InferenceClientPort for HttpInferenceClient {
    async fn query(&self, request: InferenceRequest) -> Result<Vec<u8>, InferenceError> {
        tracing::debug!(
            url = %request.api_url,
            prompt_len = request.payload.inputs.len(),
            "Sending inference request"
        );

        let response = self
            .client
            .post(&request.api_url)
            .bearer_auth(&request.api_token)
            .json(&request.payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else if e.is_connect() {
                    InferenceError::NetworkError(format!(
                        "Cannot connect to inference endpoint: {}",
                        e
                    ))
                } else {
                    InferenceError::NetworkError(e.to_string())
                }
            })?;

        // 状态码故意不在这里判定：上游把错误作为 JSON 负载返回
        // （常见 503 + {"error": ...}），由响应体检查识别
        let status = response.status();

        let body = response
            .bytes()
            .await
            .map_err(|e| InferenceError::InvalidResponse(format!("Failed to read body: {}", e)))?
            .to_vec();

        tracing::debug!(
            status = status.as_u16(),
            body_size = body.len(),
            "Inference response received"
        );

        Ok(body)
    }
}
