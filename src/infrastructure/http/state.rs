//! Application State

use std::sync::Arc;

use crate::application::bridge::InferenceBridge;
use crate::application::ports::TaskManagerPort;
use crate::domain::service_info::ServiceInfo;

/// 应用状态
///
/// 所有依赖在进程启动时显式构造并传入，不使用全局单例
pub struct AppState {
    pub task_manager: Arc<dyn TaskManagerPort>,
    pub bridge: Arc<InferenceBridge>,
    pub service_info: ServiceInfo,
}

impl AppState {
    pub fn new(
        task_manager: Arc<dyn TaskManagerPort>,
        bridge: Arc<InferenceBridge>,
        service_info: ServiceInfo,
    ) -> Self {
        Self {
            task_manager,
            bridge,
            service_info,
        }
    }
}
