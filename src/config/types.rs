//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音合成配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 分段与调度配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

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

    /// JSON 请求体上限（字节）
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,

    /// 允许跨域访问的 Origin 主机名，端口不限
    #[serde(default = "default_allowed_origin_hosts")]
    pub allowed_origin_hosts: Vec<String>,
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "default_static_enabled")]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// URL 路径前缀（如 "/" 表示根路径托管）
    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_enabled() -> bool {
    false
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_static_path() -> String {
    "/".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_enabled(),
            dir: default_static_dir(),
            path: default_static_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5678
}

fn default_body_limit() -> usize {
    5 * 1024 * 1024 // 5 MiB
}

fn default_allowed_origin_hosts() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            static_files: StaticFilesConfig::default(),
            allowed_origin_hosts: default_allowed_origin_hosts(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 语音合成服务提供方
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    /// Gemini generateContent 接口
    #[default]
    Gemini,
    /// 离线静音生成，不访问网络
    Fake,
}

impl TtsProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Fake => "fake",
        }
    }
}

/// 语音合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsProvider,

    /// API 基础 URL
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// 服务端凭证池；为空时回退到 `GEMINI_API_KEY`（逗号分隔）
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// 单次请求超时（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 非配额类失败的重试间隔（毫秒）
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// 最少尝试次数；实际为 max(2 × 凭证数, min_attempts)
    #[serde(default = "default_min_attempts")]
    pub min_attempts: usize,

    /// 是否把凭证/请求被拒也当作可重试失败
    #[serde(default)]
    pub retry_permanent_errors: bool,

    /// 代理地址；未设置时由 reqwest 读取 HTTPS_PROXY/HTTP_PROXY
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_tts_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    crate::domain::voice::DEFAULT_MODEL.to_string()
}

fn default_voice() -> String {
    crate::domain::voice::DEFAULT_VOICE.to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_min_attempts() -> usize {
    5
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            base_url: default_tts_base_url(),
            default_model: default_model(),
            default_voice: default_voice(),
            api_keys: Vec::new(),
            timeout_secs: default_tts_timeout(),
            backoff_ms: default_backoff_ms(),
            min_attempts: default_min_attempts(),
            retry_permanent_errors: false,
            proxy: None,
        }
    }
}

impl TtsConfig {
    /// 去掉空白项后的凭证列表
    pub fn effective_api_keys(&self) -> Vec<String> {
        self.api_keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// 分段与调度配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// 同一 job 内同时合成的片段数
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// 默认分段长度（字符）
    #[serde(default = "default_segment_length")]
    pub segment_length: usize,

    /// 分段长度下限
    #[serde(default = "default_min_segment_length")]
    pub min_segment_length: usize,

    /// 工作队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_concurrency() -> usize {
    2
}

fn default_segment_length() -> usize {
    300
}

fn default_min_segment_length() -> usize {
    50
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            segment_length: default_segment_length(),
            min_segment_length: default_min_segment_length(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 音频产物目录
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,

    /// 产物对外访问路径
    #[serde(default = "default_public_path")]
    pub public_path: String,
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("public/uploads")
}

fn default_public_path() -> String {
    "/uploads".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            public_path: default_public_path(),
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
        assert_eq!(config.server.port, 5678);
        assert_eq!(config.server.body_limit_bytes, 5 * 1024 * 1024);
        assert_eq!(config.tts.provider, TtsProvider::Gemini);
        assert_eq!(config.tts.default_voice, "Puck");
        assert_eq!(config.tts.default_model, "gemini-2.5-flash-preview-tts");
        assert_eq!(config.tts.min_attempts, 5);
        assert!(!config.tts.retry_permanent_errors);
        assert_eq!(config.generation.concurrency, 2);
        assert_eq!(config.generation.segment_length, 300);
        assert_eq!(config.generation.min_segment_length, 50);
        assert_eq!(config.storage.public_path, "/uploads");
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5678");
    }

    #[test]
    fn test_effective_api_keys() {
        let config = TtsConfig {
            api_keys: vec![" k1 ".into(), "".into(), "k2".into()],
            ..Default::default()
        };
        assert_eq!(config.effective_api_keys(), vec!["k1", "k2"]);
    }
}
