//! Announcer - 向编排引擎注册服务
//!
//! 启动时把本服务的描述文档 POST 到每个引擎的 /services，引擎据此
//! 知道服务的输入/输出 schema 并开始调度任务；关闭时撤销注册。
//!
//! 注册失败按固定间隔重试，重试预算耗尽后放弃并告警。等待用
//! tokio::time::sleep，不会阻塞运行时里的其他任务。

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::domain::service_info::ServiceInfo;

/// 注册调用错误
#[derive(Debug, Error)]
pub enum AnnounceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Engine rejected announcement: HTTP {0}")]
    Rejected(u16),
}

/// Announcer 配置
#[derive(Debug, Clone)]
pub struct AnnouncerConfig {
    /// 引擎 Base URL 列表
    pub engine_urls: Vec<String>,
    /// 每个引擎的注册尝试次数（至少按 1 次处理）
    pub announce_retries: u32,
    /// 两次尝试之间的间隔
    pub retry_delay: Duration,
}

/// 服务注册器
pub struct Announcer {
    config: AnnouncerConfig,
    client: Client,
    service_info: ServiceInfo,
}

impl Announcer {
    pub fn new(config: AnnouncerConfig, service_info: ServiceInfo) -> Result<Self, AnnounceError> {
        // 注册调用走固定的短超时，避免挂死启动流程
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AnnounceError::NetworkError(e.to_string()))?;

        Ok(Self {
            config,
            client,
            service_info,
        })
    }

    /// 向所有配置的引擎注册
    pub async fn announce_all(&self) {
        for engine_url in &self.config.engine_urls {
            self.announce_engine(engine_url).await;
        }
    }

    /// 向单个引擎注册（带重试预算）
    ///
    /// 返回是否注册成功
    async fn announce_engine(&self, engine_url: &str) -> bool {
        let attempts = self.config.announce_retries.max(1);

        for attempt in 1..=attempts {
            match self.announce_once(engine_url).await {
                Ok(()) => {
                    tracing::info!(
                        engine = %engine_url,
                        slug = %self.service_info.slug,
                        "Service announced"
                    );
                    return true;
                }
                Err(e) => {
                    tracing::debug!(
                        engine = %engine_url,
                        attempt = attempt,
                        error = %e,
                        "Service announcement attempt failed"
                    );
                    if attempt == attempts {
                        tracing::warn!(
                            engine = %engine_url,
                            "Aborting service announcement after {} retries",
                            attempts
                        );
                        return false;
                    }
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }

        false
    }

    async fn announce_once(&self, engine_url: &str) -> Result<(), AnnounceError> {
        let response = self
            .client
            .post(format!("{}/services", engine_url))
            .json(&self.service_info)
            .send()
            .await
            .map_err(|e| AnnounceError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnnounceError::Rejected(status.as_u16()));
        }

        Ok(())
    }

    /// 撤销所有引擎上的注册（优雅关闭时调用，尽力而为）
    pub async fn withdraw_all(&self) {
        for engine_url in &self.config.engine_urls {
            match self.withdraw_once(engine_url).await {
                Ok(()) => {
                    tracing::info!(engine = %engine_url, "Service withdrawn");
                }
                Err(e) => {
                    tracing::warn!(engine = %engine_url, error = %e, "Failed to withdraw service");
                }
            }
        }
    }

    async fn withdraw_once(&self, engine_url: &str) -> Result<(), AnnounceError> {
        let response = self
            .client
            .delete(format!(
                "{}/services/{}",
                engine_url, self.service_info.slug
            ))
            .send()
            .await
            .map_err(|e| AnnounceError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnnounceError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}
