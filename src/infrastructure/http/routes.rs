//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                  GET   健康检查
//! - /api/service               GET   服务描述文档（注册到引擎的同一份）
//! - /api/process               POST  同步执行：提交描述符+提示词，直接返回 Ogg
//! - /api/task/submit           POST  提交异步任务
//! - /api/task/status           POST  查询任务状态
//! - /api/task/{task_id}/result GET   下载任务结果（audio/ogg）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/service", get(handlers::get_service_info))
        .route("/process", post(handlers::process_sync))
        .nest("/task", task_routes())
}

/// Task 路由
fn task_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/submit", post(handlers::submit_task))
        .route("/status", post(handlers::query_task_status))
        .route("/:task_id/result", get(handlers::download_task_result))
}
