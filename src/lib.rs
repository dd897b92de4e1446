//! Hubtone - 模型 Hub 文本转音频桥接服务
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - EndpointDescriptor: 推理端点描述符（api_url + api_token）
//! - ServiceInfo: 服务注册描述文档（输入/输出 schema + 能力标签）
//!
//! 应用层 (application/):
//! - Ports: 端口定义（InferenceClient, AudioTranscoder, TaskManager）
//! - InferenceBridge: 核心流程（解析描述符 → 调用上游 → 错误检测 → 转码 Ogg）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API（任务提交/查询/结果下载 + 同步处理端点）
//! - Memory: TaskManager 内存实现
//! - Worker: TaskWorker 后台任务处理
//! - Adapters: HTTP 推理客户端、Ogg 转码器
//! - Announce: 向编排引擎注册服务（有限重试 + 异步等待）

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
