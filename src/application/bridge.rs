//! Inference Bridge - 核心流程
//!
//! 给定一份端点描述符和一段提示词，查询上游文本转音频模型，
//! 把返回的音频重编码为 Ogg 容器：
//!
//! 1. 解析描述符（失败在任何网络调用之前）
//! 2. 解码提示词并构造 {"inputs": "..."} 负载
//! 3. 一次同步 POST，不重试（重试策略属于外部任务框架）
//! 4. 响应体若是带 error 键的 JSON，原样上报错误文本
//! 5. 否则探测容器格式并转码为 Ogg
//!
//! 每次调用独立无状态：恰好消费一份描述符和一份提示词

use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::{
    AudioTranscoderPort, InferenceClientPort, InferencePayload, InferenceRequest, TranscodeConfig,
    TranscodeError,
};
use crate::domain::descriptor::{DescriptorError, EndpointDescriptor};

/// 输出音频的媒体类型
pub const AUDIO_OGG_MEDIA_TYPE: &str = "audio/ogg";

/// 桥接错误
///
/// 所有错误对单次调用都是终止性的，内部不做任何重试
#[derive(Debug, Error)]
pub enum BridgeError {
    /// 描述符不是合法 JSON
    #[error("json_description is invalid: {0}")]
    InvalidDescriptor(String),

    /// 描述符缺少必需字段
    #[error("api_url or api_token missing from json_description: {0}")]
    MissingField(&'static str),

    /// 提示词不是合法 UTF-8
    #[error("input_text is not valid UTF-8: {0}")]
    InvalidPrompt(String),

    /// 网络层面无法完成请求
    #[error("inference endpoint unreachable: {0}")]
    UpstreamUnavailable(String),

    /// 上游端点自身报告了错误（如模型仍在加载），文本原样透传
    #[error("{0}")]
    UpstreamError(String),

    /// 响应体既不是错误 JSON 也不是可识别的音频容器
    #[error("unsupported audio format: {0}")]
    UnsupportedAudioFormat(String),

    /// 音频已解码但 Ogg 编码失败
    #[error("audio transcoding failed: {0}")]
    TranscodeFailed(String),
}

impl From<DescriptorError> for BridgeError {
    fn from(err: DescriptorError) -> Self {
        match err {
            DescriptorError::InvalidJson(msg) => BridgeError::InvalidDescriptor(msg),
            DescriptorError::MissingField(field) => BridgeError::MissingField(field),
        }
    }
}

/// 桥接结果：Ogg 容器字节 + 媒体类型标签
#[derive(Debug, Clone)]
pub struct AudioResult {
    pub data: Vec<u8>,
    pub media_type: &'static str,
}

/// Inference Bridge
pub struct InferenceBridge {
    client: Arc<dyn InferenceClientPort>,
    transcoder: Arc<dyn AudioTranscoderPort>,
    transcode_config: TranscodeConfig,
}

impl InferenceBridge {
    pub fn new(
        client: Arc<dyn InferenceClientPort>,
        transcoder: Arc<dyn AudioTranscoderPort>,
        transcode_config: TranscodeConfig,
    ) -> Self {
        Self {
            client,
            transcoder,
            transcode_config,
        }
    }

    /// 执行一次完整的「文本 → Ogg 音频」流程
    ///
    /// # Arguments
    /// * `json_description` - UTF-8 JSON 描述符字节（api_token + api_url）
    /// * `input_text` - UTF-8 提示词字节
    pub async fn process(
        &self,
        json_description: &[u8],
        input_text: &[u8],
    ) -> Result<AudioResult, BridgeError> {
        let descriptor = EndpointDescriptor::from_slice(json_description)?;

        let prompt = std::str::from_utf8(input_text)
            .map_err(|e| BridgeError::InvalidPrompt(e.to_string()))?;

        tracing::debug!(
            api_url = %descriptor.api_url,
            prompt_len = prompt.len(),
            "Dispatching inference query"
        );

        let request = InferenceRequest {
            api_url: descriptor.api_url,
            api_token: descriptor.api_token,
            payload: InferencePayload {
                inputs: prompt.to_string(),
            },
        };

        let raw = self
            .client
            .query(request)
            .await
            .map_err(|e| BridgeError::UpstreamUnavailable(e.to_string()))?;

        // 上游用 JSON 负载报告自身错误（如 503 + {"error": "..."}），
        // 错误文本对调用方有诊断价值，原样透传
        if let Some(message) = upstream_error_message(&raw) {
            tracing::error!(error = %message, "Inference endpoint reported an error");
            return Err(BridgeError::UpstreamError(message));
        }

        let transcoded = self
            .transcoder
            .transcode_to_ogg(&raw, &self.transcode_config)
            .await
            .map_err(|e| match e {
                TranscodeError::UnrecognizedContainer(msg) | TranscodeError::DecodingError(msg) => {
                    BridgeError::UnsupportedAudioFormat(msg)
                }
                TranscodeError::EncodingError(msg) => BridgeError::TranscodeFailed(msg),
            })?;

        tracing::info!(
            ogg_bytes = transcoded.ogg_data.len(),
            duration_ms = transcoded.duration_ms,
            sample_rate = transcoded.sample_rate,
            "Audio generation completed"
        );

        Ok(AudioResult {
            data: transcoded.ogg_data,
            media_type: AUDIO_OGG_MEDIA_TYPE,
        })
    }
}

/// 从响应体中提取上游错误文本
///
/// 响应体能解析成 JSON 对象且带有 error 键时返回其内容；
/// error 值不是字符串时退回其 JSON 文本表示
fn upstream_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let error = value.get("error")?;
    Some(
        error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::{FakeInferenceClient, OggTranscoder};

    const DESCRIPTOR: &[u8] = br#"{"api_token":"t","api_url":"http://x"}"#;

    /// 1 秒 16kHz 单声道 16 位静音 WAV
    fn create_test_wav() -> Vec<u8> {
        let sample_rate: u32 = 16000;
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let num_samples = sample_rate as usize;

        let data_size = num_samples * (bits_per_sample as usize / 8) * num_channels as usize;
        let file_size = 36 + data_size;

        let mut wav = Vec::with_capacity(44 + data_size);

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(file_size as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        let block_align = num_channels * (bits_per_sample / 8);
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());
        for _ in 0..num_samples {
            wav.extend_from_slice(&0i16.to_le_bytes());
        }

        wav
    }

    fn bridge_with_upstream(response: Vec<u8>) -> (InferenceBridge, Arc<FakeInferenceClient>) {
        let client = Arc::new(FakeInferenceClient::new(response));
        let bridge = InferenceBridge::new(
            client.clone(),
            Arc::new(OggTranscoder::new()),
            TranscodeConfig::default(),
        );
        (bridge, client)
    }

    #[tokio::test]
    async fn test_valid_audio_produces_ogg() {
        let (bridge, _) = bridge_with_upstream(create_test_wav());

        let result = bridge.process(DESCRIPTOR, b"liquid drum and bass").await.unwrap();

        assert_eq!(result.media_type, "audio/ogg");
        assert_eq!(&result.data[0..4], b"OggS");
        // 第一个 Ogg 包是 RFC 7845 的 OpusHead
        assert!(result
            .data
            .windows(8)
            .any(|window| window == b"OpusHead"));
    }

    #[tokio::test]
    async fn test_upstream_error_payload_is_surfaced_verbatim() {
        let (bridge, _) = bridge_with_upstream(br#"{"error":"model loading"}"#.to_vec());

        let err = bridge.process(DESCRIPTOR, b"some prompt").await.unwrap_err();

        match err {
            BridgeError::UpstreamError(message) => assert_eq!(message, "model loading"),
            other => panic!("expected UpstreamError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_api_url_fails_before_any_network_call() {
        let (bridge, client) = bridge_with_upstream(create_test_wav());

        let err = bridge
            .process(br#"{"api_token":"t"}"#, b"prompt")
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::MissingField("api_url")));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_descriptor_fails_before_any_network_call() {
        let (bridge, client) = bridge_with_upstream(create_test_wav());

        let err = bridge.process(b"not json", b"prompt").await.unwrap_err();

        assert!(matches!(err, BridgeError::InvalidDescriptor(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_utf8_prompt_is_rejected() {
        let (bridge, client) = bridge_with_upstream(create_test_wav());

        let err = bridge.process(DESCRIPTOR, &[0xff, 0xfe]).await.unwrap_err();

        assert!(matches!(err, BridgeError::InvalidPrompt(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unrecognized_bytes_fail_as_unsupported_format() {
        let (bridge, _) = bridge_with_upstream(b"definitely not audio".to_vec());

        let err = bridge.process(DESCRIPTOR, b"prompt").await.unwrap_err();

        assert!(matches!(err, BridgeError::UnsupportedAudioFormat(_)));
    }

    #[tokio::test]
    async fn test_identical_inputs_produce_identical_ogg() {
        let (bridge, _) = bridge_with_upstream(create_test_wav());

        let first = bridge.process(DESCRIPTOR, b"same prompt").await.unwrap();
        let second = bridge.process(DESCRIPTOR, b"same prompt").await.unwrap();

        assert_eq!(first.data, second.data);
    }

    #[tokio::test]
    async fn test_prompt_quotes_survive_payload_serialization() {
        let (bridge, client) = bridge_with_upstream(create_test_wav());

        let prompt = r#"say "hi" \ done"#;
        bridge.process(DESCRIPTOR, prompt.as_bytes()).await.unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].payload.inputs, prompt);
        assert_eq!(calls[0].api_url, "http://x");
        assert_eq!(calls[0].api_token, "t");
    }

    #[test]
    fn test_upstream_error_message_extraction() {
        assert_eq!(
            upstream_error_message(br#"{"error":"boom"}"#),
            Some("boom".to_string())
        );
        // error 值不是字符串时退回 JSON 表示
        assert_eq!(
            upstream_error_message(br#"{"error":{"code":503}}"#),
            Some(r#"{"code":503}"#.to_string())
        );
        assert_eq!(upstream_error_message(br#"{"ok":true}"#), None);
        assert_eq!(upstream_error_message(b"RIFF\x00\x01"), None);
    }
}
