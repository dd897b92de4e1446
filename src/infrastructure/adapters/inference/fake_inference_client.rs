//! Fake Inference Client - 用于测试的推理客户端
//!
//! 始终返回固定的响应字节，不发出任何网络请求，并记录收到的
//! 每个请求供测试断言

use async_trait::async_trait;
use std::sync::Mutex;

use crate::application::ports::{InferenceClientPort, InferenceError, InferenceRequest};

/// Fake Inference Client
///
/// 确定性桩实现：相同输入永远得到相同响应
pub struct FakeInferenceClient {
    /// 固定返回的响应体
    response: Vec<u8>,
    /// 收到的请求记录
    calls: Mutex<Vec<InferenceRequest>>,
}

impl FakeInferenceClient {
    pub fn new(response: Vec<u8>) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 已收到的请求数
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 已收到的请求记录
    pub fn calls(&self) -> Vec<InferenceRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClientPort for FakeInferenceClient {
    async fn query(&self, request: InferenceRequest) -> Result<Vec<u8>, InferenceError> {
        tracing::debug!(
            url = %request.api_url,
            prompt_len = request.payload.inputs.len(),
            "FakeInferenceClient: returning fixed response"
        );

        self.calls.lock().unwrap().push(request);
        Ok(self.response.clone())
    }
}
