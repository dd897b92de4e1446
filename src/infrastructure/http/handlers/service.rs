//! Service Handler
//!
//! 返回服务描述文档（与注册到引擎的是同一份）

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::domain::service_info::ServiceInfo;
use crate::infrastructure::http::state::AppState;

pub async fn get_service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(state.service_info.clone())
}
