//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, TtsProvider};

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

/// 环境变量前缀
const ENV_PREFIX: &str = "NARRATOR";

/// `tts.api_keys` 为空时读取的环境变量
const API_KEY_FALLBACK_VAR: &str = "GEMINI_API_KEY";

/// 加载应用配置
///
/// # 环境变量示例
/// - `NARRATOR_SERVER__PORT=8080`
/// - `NARRATOR_TTS__PROVIDER=fake`
/// - `NARRATOR_TTS__API_KEYS=key1,key2`
/// - `NARRATOR_GENERATION__CONCURRENCY=3`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5678)?
        .set_default("server.body_limit_bytes", 5 * 1024 * 1024)?
        .set_default("tts.provider", "gemini")?
        .set_default("tts.base_url", "https://generativelanguage.googleapis.com")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.backoff_ms", 1000)?
        .set_default("tts.min_attempts", 5)?
        .set_default("tts.retry_permanent_errors", false)?
        .set_default("generation.concurrency", 2)?
        .set_default("generation.segment_length", 300)?
        .set_default("generation.min_segment_length", 50)?
        .set_default("storage.uploads_dir", "public/uploads")?
        .set_default("storage.public_path", "/uploads")?
        .set_default("log.level", "info")?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量，层级分隔符为 `__`，列表以逗号分隔
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("tts.api_keys")
            .with_list_parse_key("server.allowed_origin_hosts")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let mut app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    apply_api_key_fallback(&mut app_config, std::env::var(API_KEY_FALLBACK_VAR).ok());
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 未配置凭证时使用逗号分隔的回退值
fn apply_api_key_fallback(config: &mut AppConfig, fallback: Option<String>) {
    if !config.tts.effective_api_keys().is_empty() {
        return;
    }
    if let Some(raw) = fallback {
        config.tts.api_keys = raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
    }
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return invalid("Server port cannot be 0");
    }
    if config.tts.base_url.trim().is_empty() {
        return invalid("TTS base URL cannot be empty");
    }
    if config.tts.timeout_secs == 0 {
        return invalid("TTS timeout cannot be 0");
    }
    if config.generation.concurrency == 0 {
        return invalid("Generation concurrency cannot be 0");
    }
    if config.generation.min_segment_length == 0 {
        return invalid("Minimum segment length cannot be 0");
    }
    if config.generation.queue_capacity == 0 {
        return invalid("Work queue capacity cannot be 0");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志），凭证只输出数量
pub fn print_config(config: &AppConfig) {
    let api_keys = config.tts.effective_api_keys();

    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Body Limit: {} bytes", config.server.body_limit_bytes);
    tracing::info!("Allowed Origin Hosts: {:?}", config.server.allowed_origin_hosts);
    if config.server.static_files.enabled {
        tracing::info!(
            "Static Files: {:?} at {}",
            config.server.static_files.dir,
            config.server.static_files.path
        );
    }
    tracing::info!("TTS Provider: {}", config.tts.provider.as_str());
    if config.tts.provider == TtsProvider::Gemini {
        tracing::info!("TTS Base URL: {}", config.tts.base_url);
    }
    tracing::info!("TTS Default Model: {}", config.tts.default_model);
    tracing::info!("TTS Default Voice: {}", config.tts.default_voice);
    tracing::info!("TTS API Keys: {}", api_keys.len());
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!(
        "TTS Retry: backoff {}ms, min attempts {}, retry permanent errors {}",
        config.tts.backoff_ms,
        config.tts.min_attempts,
        config.tts.retry_permanent_errors
    );
    if let Some(proxy) = &config.tts.proxy {
        tracing::info!("TTS Proxy: {}", mask_proxy(proxy));
    }
    tracing::info!("Generation Concurrency: {}", config.generation.concurrency);
    tracing::info!(
        "Segment Length: {} (min {})",
        config.generation.segment_length,
        config.generation.min_segment_length
    );
    tracing::info!(
        "Uploads: {:?} at {}",
        config.storage.uploads_dir,
        config.storage.public_path
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

/// 代理 URL 中可能带有用户名密码
fn mask_proxy(proxy: &str) -> String {
    let Some((userinfo, host)) = proxy.rsplit_once('@') else {
        return proxy.to_string();
    };
    match userinfo.split_once("://") {
        Some((scheme, _)) => format!("{}://***@{}", scheme, host),
        None => format!("***@{}", host),
    }
}
