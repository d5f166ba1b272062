//! Speech API Port - 外部语音合成服务抽象
//!
//! 一次调用对应一次 HTTP 请求；重试与凭证轮换由 `SynthesisClient` 负责

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioFormat;
use crate::domain::voice::VoiceParams;

/// 未知错误展示给用户时保留的最大字符数
const UNKNOWN_MESSAGE_LIMIT: usize = 100;

/// 服务端明确拒绝的请求类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    InvalidCredential,
    PermissionDenied,
    ModelNotFound,
    BadRequest,
}

impl RejectionKind {
    /// 换一个凭证可能成功
    pub fn is_credential_scoped(&self) -> bool {
        matches!(self, Self::InvalidCredential | Self::PermissionDenied)
    }
}

/// 合成失败
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    /// 外部取消，不是失败
    #[error("Synthesis cancelled")]
    Cancelled,

    #[error("No API Key provided")]
    NoCredential,

    #[error("Quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    /// 5xx 或其他无法归类的状态码
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Request rejected ({status}): {message}")]
    Rejected {
        kind: RejectionKind,
        status: u16,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No audio data in response")]
    NoAudioReturned,

    #[error("Content blocked: {0}")]
    ContentFiltered(String),
}

impl SynthesisError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Cancelled => FailureKind::Cancelled,
            Self::NoCredential => FailureKind::InvalidCredential,
            Self::QuotaExceeded(_) => FailureKind::QuotaExceeded,
            Self::Timeout => FailureKind::Timeout,
            Self::Network(_) => FailureKind::NetworkUnreachable,
            Self::Rejected { kind, .. } => match kind {
                RejectionKind::InvalidCredential => FailureKind::InvalidCredential,
                RejectionKind::PermissionDenied => FailureKind::PermissionDenied,
                RejectionKind::ModelNotFound => FailureKind::ModelNotFound,
                RejectionKind::BadRequest => FailureKind::BadRequest,
            },
            Self::NoAudioReturned => FailureKind::NoAudioReturned,
            Self::ContentFiltered(_) => FailureKind::ContentFiltered,
            Self::Service { .. } | Self::InvalidResponse(_) => FailureKind::Unknown,
        }
    }

    /// 面向用户的提示
    pub fn user_message(&self) -> String {
        match self.kind() {
            FailureKind::Unknown => truncate_message(&self.to_string()),
            kind => kind.user_message().to_string(),
        }
    }
}

/// 失败分类（决定用户提示）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Cancelled,
    InvalidCredential,
    QuotaExceeded,
    PermissionDenied,
    ModelNotFound,
    Timeout,
    NetworkUnreachable,
    NoAudioReturned,
    ContentFiltered,
    BadRequest,
    Unknown,
}

impl FailureKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Cancelled => "生成已取消",
            Self::InvalidCredential => "API Key 无效，请检查后重试",
            Self::QuotaExceeded => "API 调用次数已达上限，请稍后再试或更换 Key",
            Self::PermissionDenied => "API Key 权限不足，请确认已开启 Generative Language API",
            Self::ModelNotFound => "模型不存在或已下线，请尝试切换模型",
            Self::Timeout => "请求超时，请检查网络连接后重试",
            Self::NetworkUnreachable => "无法连接到 Google API，请检查网络或代理设置",
            Self::NoAudioReturned => "API 未返回音频数据，请缩短文本或更换模型重试",
            Self::ContentFiltered => "内容被安全过滤器拦截，请修改文本后重试",
            Self::BadRequest => "请求参数有误，请检查文本内容和设置",
            Self::Unknown => "服务器内部错误，请稍后重试",
        }
    }
}

/// 截断未知错误信息
pub fn truncate_message(message: &str) -> String {
    if message.trim().is_empty() {
        return FailureKind::Unknown.user_message().to_string();
    }
    if message.chars().count() <= UNKNOWN_MESSAGE_LIMIT {
        return message.to_string();
    }
    let head: String = message.chars().take(UNKNOWN_MESSAGE_LIMIT).collect();
    format!("{}...", head)
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub params: VoiceParams,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, params: VoiceParams) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }

    pub fn prompt(&self) -> String {
        self.params.prompt_for(&self.text)
    }
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    /// 音频字节：通常为裸 PCM，也可能已是完整容器
    pub bytes: Vec<u8>,
    /// 服务端声明的格式
    pub format: AudioFormat,
}

/// Speech API Port
#[async_trait]
pub trait SpeechApiPort: Send + Sync {
    /// 使用指定凭证执行一次合成
    async fn synthesize_once(
        &self,
        request: &SpeechRequest,
        credential: &str,
    ) -> Result<SpeechAudio, SynthesisError>;
}
