//! Gemini TTS Client - 调用 Gemini generateContent 接口合成语音
//!
//! 实现 SpeechApiPort trait，一次调用只发送一次请求
//!
//! 外部 API:
//! POST {base_url}/v1beta/models/{model}:generateContent?key={api_key}
//! Request: contents[0].parts[0].text + generationConfig（AUDIO 模态与预置音色）
//! Response: candidates[0].content.parts[*].inlineData（base64 PCM）

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    RejectionKind, SpeechApiPort, SpeechAudio, SpeechRequest, SynthesisError,
};
use crate::domain::audio::AudioFormat;

/// 被视为内容拦截的结束原因
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "RECITATION",
];

// ---------- 请求体 ----------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: [&'static str; 1],
    speech_config: SpeechConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

// ---------- 响应体 ----------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Gemini TTS 客户端配置
#[derive(Debug, Clone)]
pub struct GeminiTtsClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 代理地址；未设置时 reqwest 读取 HTTPS_PROXY/HTTP_PROXY
    pub proxy: Option<String>,
}

impl Default for GeminiTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 120,
            proxy: None,
        }
    }
}

impl GeminiTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy.filter(|p| !p.trim().is_empty());
        self
    }
}

/// Gemini TTS 客户端
pub struct GeminiTtsClient {
    client: Client,
    config: GeminiTtsClientConfig,
}

impl GeminiTtsClient {
    /// 创建新的客户端
    pub fn new(config: GeminiTtsClientConfig) -> Result<Self, SynthesisError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| SynthesisError::Network(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取生成 URL（不含 key）
    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }
}

/// 按 HTTP 状态码与错误体分类失败
fn classify_status(status: StatusCode, body: &str) -> SynthesisError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let api_status = parsed
        .as_ref()
        .map(|e| e.error.status.as_str())
        .unwrap_or_default();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(500).collect());

    let rejected = |kind| SynthesisError::Rejected {
        kind,
        status: status.as_u16(),
        message: message.clone(),
    };

    if status == StatusCode::TOO_MANY_REQUESTS
        || api_status == "RESOURCE_EXHAUSTED"
        || body.contains("RESOURCE_EXHAUSTED")
    {
        return SynthesisError::QuotaExceeded(message);
    }

    match status {
        StatusCode::UNAUTHORIZED => rejected(RejectionKind::InvalidCredential),
        StatusCode::BAD_REQUEST
            if body.contains("API_KEY_INVALID") || body.contains("API key not valid") =>
        {
            rejected(RejectionKind::InvalidCredential)
        }
        StatusCode::BAD_REQUEST => rejected(RejectionKind::BadRequest),
        StatusCode::FORBIDDEN => rejected(RejectionKind::PermissionDenied),
        StatusCode::NOT_FOUND => rejected(RejectionKind::ModelNotFound),
        _ => SynthesisError::Service {
            status: status.as_u16(),
            message,
        },
    }
}

/// 从成功响应中取出第一段内联音频
fn extract_audio(response: GenerateContentResponse) -> Result<SpeechAudio, SynthesisError> {
    let inline = response
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| d.data.as_deref().is_some_and(|data| !data.is_empty()));

    let Some(inline) = inline else {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(SynthesisError::ContentFiltered(reason));
        }
        if let Some(reason) = response
            .candidates
            .iter()
            .filter_map(|c| c.finish_reason.as_deref())
            .find(|r| BLOCKING_FINISH_REASONS.contains(r))
        {
            return Err(SynthesisError::ContentFiltered(reason.to_string()));
        }
        return Err(SynthesisError::NoAudioReturned);
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(inline.data.as_deref().unwrap_or_default())
        .map_err(|e| SynthesisError::InvalidResponse(format!("Invalid base64 audio: {}", e)))?;
    let format = inline
        .mime_type
        .as_deref()
        .map(AudioFormat::from_mime_type)
        .unwrap_or_default();

    Ok(SpeechAudio { bytes, format })
}

#[async_trait]
impl SpeechApiPort for GeminiTtsClient {
    async fn synthesize_once(
        &self,
        request: &SpeechRequest,
        credential: &str,
    ) -> Result<SpeechAudio, SynthesisError> {
        let prompt = request.prompt();
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [TextPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: &request.params.voice,
                        },
                    },
                },
            },
        };

        let url = self.generate_url(&request.params.model);
        tracing::debug!(
            url = %url,
            text_len = request.text.chars().count(),
            voice = %request.params.voice,
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", credential)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout
                } else if e.is_connect() {
                    SynthesisError::Network(format!("Cannot connect to speech API: {}", e))
                } else {
                    SynthesisError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &error_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SynthesisError::Timeout
            } else {
                SynthesisError::InvalidResponse(e.to_string())
            }
        })?;

        let audio = extract_audio(parsed)?;
        tracing::info!(
            audio_size = audio.bytes.len(),
            sample_rate = audio.format.sample_rate,
            "Speech synthesis completed"
        );
        Ok(audio)
    }
}
