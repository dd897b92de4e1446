//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（InferenceClient、AudioTranscoder、TaskManager）
//! - bridge: InferenceBridge 核心流程

pub mod bridge;
pub mod ports;

pub use bridge::{AudioResult, BridgeError, InferenceBridge, AUDIO_OGG_MEDIA_TYPE};

pub use ports::{
    // Audio transcoder
    AudioTranscoderPort,
    TranscodeConfig,
    TranscodeError,
    TranscodeResult,
    // Inference client
    InferenceClientPort,
    InferenceError,
    InferencePayload,
    InferenceRequest,
    // Task manager
    GenerationTask,
    TaskError,
    TaskManagerPort,
    TaskState,
};
