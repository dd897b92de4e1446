//! Inference Client Port - 上游推理 API 抽象
//!
//! 定义对第三方文本转音频推理端点的抽象接口，具体实现在
//! infrastructure/adapters 层
//!
//! 上游协议：
//! POST {api_url}
//! Header: Authorization: Bearer {api_token}
//! Request: {"inputs": "..."}  (JSON)
//! Response: 某种容器格式的音频字节，或 {"error": "..."} JSON

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 推理客户端错误（传输层）
///
/// 只覆盖「请求没有到达/没有返回」的情况；上游返回的错误负载
/// 由调用方检查响应体来识别
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 推理请求体 (JSON)
///
/// 通过 serde 序列化构造，提示词中的引号和控制字符由序列化器转义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferencePayload {
    /// 生成提示词
    pub inputs: String,
}

/// 一次推理调用的完整参数
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// 上游模型端点的绝对 URL
    pub api_url: String,
    /// Bearer 访问凭证
    pub api_token: String,
    /// 请求负载
    pub payload: InferencePayload,
}

/// Inference Client Port
///
/// 上游推理服务的抽象接口
#[async_trait]
pub trait InferenceClientPort: Send + Sync {
    /// 执行一次推理查询，返回原始响应体
    ///
    /// 响应体不做任何解释：可能是音频容器字节，也可能是错误 JSON，
    /// 由调用方自行判断
    async fn query(&self, request: InferenceRequest) -> Result<Vec<u8>, InferenceError>;
}
