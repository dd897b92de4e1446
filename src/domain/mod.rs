//! 领域层
//!
//! 包含：
//! - descriptor: 推理端点描述符（每次调用随输入到达，解析后即用即弃）
//! - service_info: 服务注册描述文档（输入/输出 schema + 能力标签）

pub mod descriptor;
pub mod service_info;

pub use descriptor::{DescriptorError, EndpointDescriptor};
pub use service_info::{ExecutionUnitTag, FieldDescription, ServiceInfo, ServiceStatus};
