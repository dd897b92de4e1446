//! Audio Transcoder Port - 音频转码抽象
//!
//! 定义「任意容器格式 → Ogg/Opus」转码的抽象接口。输入容器格式
//! 由实现方探测（不依赖文件名或扩展名），输出固定为 Ogg 容器。

use async_trait::async_trait;
use thiserror::Error;

/// 转码错误
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// 探测器无法识别输入的容器格式
    #[error("Unrecognized container: {0}")]
    UnrecognizedContainer(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// 转码配置
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    /// Opus 目标比特率（bps）
    pub bitrate: u32,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self { bitrate: 32000 }
    }
}

/// 转码结果
#[derive(Debug, Clone)]
pub struct TranscodeResult {
    /// Ogg 容器字节
    pub ogg_data: Vec<u8>,
    /// 源音频时长（毫秒）
    pub duration_ms: u64,
    /// 源音频采样率
    pub sample_rate: u32,
    /// 源音频声道数
    pub channels: u8,
}

/// Audio Transcoder Port
#[async_trait]
pub trait AudioTranscoderPort: Send + Sync {
    /// 探测输入容器格式，解码后重编码为 Ogg
    ///
    /// # Arguments
    /// * `audio_data` - 某种容器格式的音频字节
    /// * `config` - 转码配置
    async fn transcode_to_ogg(
        &self,
        audio_data: &[u8],
        config: &TranscodeConfig,
    ) -> Result<TranscodeResult, TranscodeError>;
}
