//! Hubtone - 模型 Hub 文本转音频桥接服务
//!
//! 启动流程：
//! 1. 加载配置、初始化日志
//! 2. 显式构造所有依赖（客户端、转码器、任务管理器、桥接器）
//! 3. 启动 Worker 和 HTTP 服务器
//! 4. 后台向引擎注册服务，关闭时撤销注册

use std::sync::Arc;
use std::time::Duration;

use hubtone::application::bridge::InferenceBridge;
use hubtone::application::ports::TranscodeConfig;
use hubtone::config::{load_config, print_config};
use hubtone::domain::service_info::ServiceInfo;
use hubtone::infrastructure::adapters::{
    HttpInferenceClient, HttpInferenceClientConfig, OggTranscoder,
};
use hubtone::infrastructure::http::{AppState, HttpServer, ServerConfig};
use hubtone::infrastructure::memory::InMemoryTaskManager;
use hubtone::infrastructure::worker::{TaskWorker, TaskWorkerConfig};
use hubtone::infrastructure::{Announcer, AnnouncerConfig};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},hubtone={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Hubtone - hub text-to-audio bridge");
    print_config(&config);

    // 创建推理客户端
    let inference_client = Arc::new(HttpInferenceClient::new(
        HttpInferenceClientConfig {
            timeout_secs: config.upstream.timeout_secs,
        },
    )?);

    // 创建转码器
    let transcoder = Arc::new(OggTranscoder::new());

    // 创建桥接器
    let bridge = Arc::new(InferenceBridge::new(
        inference_client,
        transcoder,
        TranscodeConfig {
            bitrate: config.audio.bitrate,
        },
    ));

    // 创建任务队列和内存任务管理器
    let (task_tx, task_rx) = mpsc::channel(config.worker.queue_capacity);
    let task_manager = Arc::new(InMemoryTaskManager::new(task_tx));

    // 创建并启动 TaskWorker
    let worker = TaskWorker::new(
        TaskWorkerConfig {
            max_concurrent: config.worker.max_concurrent,
        },
        task_rx,
        task_manager.clone(),
        bridge.clone(),
    );
    tokio::spawn(worker.run());

    // 服务描述文档（注册到引擎 + /api/service 返回的同一份）
    let service_info = ServiceInfo::new(config.server.public_base_url());

    // 创建注册器并在后台注册（有限重试，不阻塞启动）
    let announcer = Arc::new(Announcer::new(
        AnnouncerConfig {
            engine_urls: config.engine.urls.clone(),
            announce_retries: config.engine.announce_retries,
            retry_delay: Duration::from_secs(config.engine.announce_retry_delay_secs),
        },
        service_info.clone(),
    )?);
    {
        let announcer = announcer.clone();
        tokio::spawn(async move {
            announcer.announce_all().await;
        });
    }

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(task_manager, bridge, service_info);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 撤销引擎上的注册
    announcer.withdraw_all().await;

    tracing::info!("Server shutdown complete");

    Ok(())
}
