//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

/// 应用主配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 编排引擎配置（服务注册）
    #[serde(default)]
    pub engine: EngineConfig,

    /// 上游推理 API 配置
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// 音频输出配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// Worker 配置
    #[serde(default)]
    pub worker: WorkerConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL（注册到引擎时使用）
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// 编排引擎配置
///
/// 服务启动时向每个引擎注册自身的描述文档，失败时按固定间隔重试，
/// 重试预算耗尽后放弃（不会无限轮询）
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// 引擎 Base URL 列表，为空则不注册
    #[serde(default)]
    pub urls: Vec<String>,

    /// 每个引擎的注册重试次数
    #[serde(default = "default_announce_retries")]
    pub announce_retries: u32,

    /// 注册重试间隔（秒）
    #[serde(default = "default_announce_retry_delay")]
    pub announce_retry_delay_secs: u64,
}

fn default_announce_retries() -> u32 {
    5
}

fn default_announce_retry_delay() -> u64 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            announce_retries: default_announce_retries(),
            announce_retry_delay_secs: default_announce_retry_delay(),
        }
    }
}

/// 上游推理 API 配置
///
/// 上游端点地址和凭证由每次请求的描述符提供，这里只有传输层参数
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpstreamConfig {
    /// 请求超时时间（秒），0 表示不设超时
    /// 上游模型冷加载可能耗时很久，默认不限制，由调用方决定截止时间
    #[serde(default)]
    pub timeout_secs: u64,
}

/// 音频输出配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Opus 目标比特率（bps）
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
}

fn default_bitrate() -> u32 {
    32000 // 32kbps
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bitrate: default_bitrate(),
        }
    }
}

/// Worker 配置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// 最大并发任务数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// 任务队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_max_concurrent() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    1000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5070);
        assert!(config.engine.urls.is_empty());
        assert_eq!(config.engine.announce_retries, 5);
        assert_eq!(config.upstream.timeout_secs, 0);
        assert_eq!(config.audio.bitrate, 32000);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5070");
    }

    #[test]
    fn test_public_base_url_falls_back_to_localhost() {
        let config = ServerConfig::default();
        assert_eq!(config.public_base_url(), "http://localhost:5070");
    }

    #[test]
    fn test_public_base_url_prefers_explicit() {
        let config = ServerConfig {
            base_url: Some("https://hubtone.example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(config.public_base_url(), "https://hubtone.example.com");
    }
}
