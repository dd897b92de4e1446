//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_transcoder;
mod inference_client;
mod task_manager;

pub use audio_transcoder::{AudioTranscoderPort, TranscodeConfig, TranscodeError, TranscodeResult};
pub use inference_client::{
    InferenceClientPort, InferenceError, InferencePayload, InferenceRequest,
};
pub use task_manager::{GenerationTask, TaskError, TaskManagerPort, TaskState};
