//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `HUBTONE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `HUBTONE_SERVER__HOST=127.0.0.1`
/// - `HUBTONE_SERVER__PORT=8080`
/// - `HUBTONE_ENGINE__URLS=http://engine:8080`
/// - `HUBTONE_UPSTREAM__TIMEOUT_SECS=300`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("engine.urls", Vec::<String>::new())?
        .set_default("engine.announce_retries", 5)?
        .set_default("engine.announce_retry_delay_secs", 3)?
        .set_default("upstream.timeout_secs", 0)?
        .set_default("audio.bitrate", 32000)?
        .set_default("worker.max_concurrent", 2)?
        .set_default("worker.queue_capacity", 1000)?
        .set_default("log.level", "info")?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: HUBTONE_
    // 层级分隔符: __ (双下划线)
    // 例如: HUBTONE_ENGINE__URLS=http://engine:8080
    builder = builder.add_source(
        Environment::with_prefix("HUBTONE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("engine.urls"),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证端口范围
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    // 验证引擎 URL
    if config.engine.urls.iter().any(|url| url.is_empty()) {
        return Err(ConfigError::ValidationError(
            "Engine URL cannot be empty".to_string(),
        ));
    }

    // 验证 Worker 配置
    if config.worker.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "Worker max_concurrent cannot be 0".to_string(),
        ));
    }
    if config.worker.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "Worker queue_capacity cannot be 0".to_string(),
        ));
    }

    // 验证比特率（Opus 编码器可接受的下限）
    if config.audio.bitrate < 500 {
        return Err(ConfigError::ValidationError(
            "Audio bitrate must be at least 500 bps".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("Engine URLs: {:?}", config.engine.urls);
    tracing::info!("Announce Retries: {}", config.engine.announce_retries);
    tracing::info!(
        "Announce Retry Delay: {}s",
        config.engine.announce_retry_delay_secs
    );
    if config.upstream.timeout_secs == 0 {
        tracing::info!("Upstream Timeout: none");
    } else {
        tracing::info!("Upstream Timeout: {}s", config.upstream.timeout_secs);
    }
    tracing::info!("Audio Bitrate: {} bps", config.audio.bitrate);
    tracing::info!("Worker Max Concurrent: {}", config.worker.max_concurrent);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5070);
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_engine_url() {
        let mut config = AppConfig::default();
        config.engine.urls = vec![String::new()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_workers() {
        let mut config = AppConfig::default();
        config.worker.max_concurrent = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_tiny_bitrate() {
        let mut config = AppConfig::default();
        config.audio.bitrate = 100;
        assert!(validate_config(&config).is_err());
    }
}
