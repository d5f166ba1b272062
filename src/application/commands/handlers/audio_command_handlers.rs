//! Audio Command Handlers

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::commands::audio_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{sanitize_artifact_name, ArtifactStoragePort};
use crate::application::services::{ArtifactMerger, SegmentRenderer, SynthesisDefaults};

/// GenerateAudio Handler - 合成单段文本
pub struct GenerateAudioHandler {
    renderer: Arc<dyn SegmentRenderer>,
    storage: Arc<dyn ArtifactStoragePort>,
    defaults: Arc<SynthesisDefaults>,
}

impl GenerateAudioHandler {
    pub fn new(
        renderer: Arc<dyn SegmentRenderer>,
        storage: Arc<dyn ArtifactStoragePort>,
        defaults: Arc<SynthesisDefaults>,
    ) -> Self {
        Self {
            renderer,
            storage,
            defaults,
        }
    }

    pub async fn handle(
        &self,
        cmd: GenerateAudioCommand,
    ) -> Result<GenerateAudioResponse, ApplicationError> {
        if cmd.text.trim().is_empty() {
            return Err(ApplicationError::validation("Text is required"));
        }

        let credentials = self.defaults.resolve_credentials(cmd.api_key.as_deref())?;
        let params = self
            .defaults
            .resolve_params(cmd.voice, cmd.model, cmd.voice_profile)?;

        tracing::info!(
            text_len = cmd.text.chars().count(),
            voice = %params.voice,
            model = %params.model,
            credentials = credentials.len(),
            "Generating audio"
        );

        let audio = self
            .renderer
            .render(&cmd.text, &params, &credentials, &CancellationToken::new())
            .await?;

        Ok(GenerateAudioResponse {
            audio_url: self.storage.public_url(&audio.audio_ref),
            audio_ref: audio.audio_ref,
            duration_secs: audio.duration_secs,
        })
    }
}

/// MergeAudio Handler - 合并已有音频文件
pub struct MergeAudioHandler {
    merger: Arc<ArtifactMerger>,
    storage: Arc<dyn ArtifactStoragePort>,
}

impl MergeAudioHandler {
    pub fn new(merger: Arc<ArtifactMerger>, storage: Arc<dyn ArtifactStoragePort>) -> Self {
        Self { merger, storage }
    }

    pub async fn handle(
        &self,
        cmd: MergeAudioCommand,
    ) -> Result<MergeAudioResponse, ApplicationError> {
        if cmd.files.is_empty() {
            return Err(ApplicationError::validation("No files to merge"));
        }

        let mut refs = Vec::with_capacity(cmd.files.len());
        let mut skipped = Vec::new();
        for raw in &cmd.files {
            match sanitize_artifact_name(raw) {
                Ok(audio_ref) => refs.push(audio_ref),
                Err(e) => {
                    tracing::warn!(file = %raw, error = %e, "Invalid merge input, skipped");
                    skipped.push(raw.clone());
                }
            }
        }

        if refs.is_empty() {
            return Err(ApplicationError::NothingToMerge(
                "没有可合并的音频文件".to_string(),
            ));
        }

        let outcome = self.merger.merge_refs(&refs).await?;
        skipped.extend(outcome.skipped.iter().map(|r| r.to_string()));

        Ok(MergeAudioResponse {
            audio_url: self.storage.public_url(&outcome.audio_ref),
            audio_ref: outcome.audio_ref,
            merged_count: outcome.merged_count,
            skipped,
            duration_secs: outcome.duration_secs,
        })
    }
}
