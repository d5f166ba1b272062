//! Fake TTS Client - 用于离线开发和测试的语音合成客户端
//!
//! 不访问外部服务，按文本长度返回静音 PCM

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{SpeechApiPort, SpeechAudio, SpeechRequest, SynthesisError};
use crate::domain::audio::AudioFormat;

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 每个字符对应的音频时长（毫秒）
    pub millis_per_char: u64,
    /// 模拟的请求延迟
    pub latency: Duration,
    /// 输出格式
    pub format: AudioFormat,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            millis_per_char: 200,
            latency: Duration::from_millis(200),
            format: AudioFormat::default(),
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            millis_per_char = config.millis_per_char,
            sample_rate = config.format.sample_rate,
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    fn silence_for(&self, text: &str) -> Vec<u8> {
        let millis = text.chars().count() as u64 * self.config.millis_per_char;
        let bytes = self.config.format.byte_rate as u64 * millis / 1000;
        let align = self.config.format.block_align.max(1) as u64;
        vec![0u8; (bytes - bytes % align) as usize]
    }
}

#[async_trait]
impl SpeechApiPort for FakeTtsClient {
    async fn synthesize_once(
        &self,
        request: &SpeechRequest,
        _credential: &str,
    ) -> Result<SpeechAudio, SynthesisError> {
        tracing::debug!(
            text_len = request.text.chars().count(),
            voice = %request.params.voice,
            "FakeTtsClient: returning silence"
        );

        tokio::time::sleep(self.config.latency).await;

        Ok(SpeechAudio {
            bytes: self.silence_for(&request.text),
            format: self.config.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::VoiceParams;

    #[tokio::test]
    async fn test_silence_scales_with_text() {
        let client = FakeTtsClient::new(FakeTtsClientConfig {
            latency: Duration::ZERO,
            ..Default::default()
        });

        let request = SpeechRequest::new("一二三四五", VoiceParams::default());
        let audio = client.synthesize_once(&request, "unused").await.unwrap();

        // 5 字 * 200ms = 1s，24kHz 16-bit 单声道
        assert_eq!(audio.bytes.len(), 48_000);
        assert!((audio.format.duration_secs(audio.bytes.len()) - 1.0).abs() < 1e-9);
    }
}
