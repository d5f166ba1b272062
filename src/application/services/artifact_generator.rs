//! Artifact Generator - 合成一段文本并保存为音频文件

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::SynthesisClient;
use crate::application::ports::{ArtifactStoragePort, SpeechRequest, StorageError, SynthesisError};
use crate::domain::audio::{self, AudioFormat, ContainerError};
use crate::domain::segment::GeneratedAudio;
use crate::domain::voice::{CredentialPool, VoiceParams};

/// 单段音频产物的文件名前缀
pub const SEGMENT_ARTIFACT_PREFIX: &str = "tts";

/// 生成失败
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("音频封装失败: {0}")]
    Container(#[from] ContainerError),

    #[error("音频保存失败: {0}")]
    Storage(#[from] StorageError),
}

impl RenderError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Synthesis(err) if err.is_cancelled())
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Synthesis(err) => err.user_message(),
            other => crate::application::ports::truncate_message(&other.to_string()),
        }
    }
}

/// 片段渲染器：调度器只依赖此抽象
#[async_trait]
pub trait SegmentRenderer: Send + Sync {
    async fn render(
        &self,
        text: &str,
        params: &VoiceParams,
        credentials: &CredentialPool,
        cancel: &CancellationToken,
    ) -> Result<GeneratedAudio, RenderError>;
}

/// 合成 → 封装容器 → 保存
pub struct ArtifactGenerator {
    client: SynthesisClient,
    storage: Arc<dyn ArtifactStoragePort>,
}

impl ArtifactGenerator {
    pub fn new(client: SynthesisClient, storage: Arc<dyn ArtifactStoragePort>) -> Self {
        Self { client, storage }
    }
}

/// 把服务端返回的音频规整为标准容器
///
/// 已是容器时取出其 data 块重新封装（丢弃元数据块）
fn to_canonical_container(
    bytes: &[u8],
    declared: AudioFormat,
) -> Result<(Vec<u8>, AudioFormat, usize), ContainerError> {
    if audio::is_container(bytes) {
        let format = audio::parse_format(bytes);
        let payload = audio::locate_data_chunk(bytes).slice(bytes);
        Ok((audio::wrap_pcm(&format, payload)?, format, payload.len()))
    } else {
        Ok((audio::wrap_pcm(&declared, bytes)?, declared, bytes.len()))
    }
}

#[async_trait]
impl SegmentRenderer for ArtifactGenerator {
    async fn render(
        &self,
        text: &str,
        params: &VoiceParams,
        credentials: &CredentialPool,
        cancel: &CancellationToken,
    ) -> Result<GeneratedAudio, RenderError> {
        let request = SpeechRequest::new(text, params.clone());
        let speech = self.client.synthesize(&request, credentials, cancel).await?;

        let (container, format, payload_len) = to_canonical_container(&speech.bytes, speech.format)?;
        let audio_ref = self
            .storage
            .save(SEGMENT_ARTIFACT_PREFIX, &container)
            .await?;

        let duration_secs = format.duration_secs(payload_len);
        tracing::debug!(
            audio_ref = %audio_ref,
            payload_len,
            duration_secs,
            "Artifact saved"
        );

        Ok(GeneratedAudio::new(audio_ref, duration_secs))
    }
}
