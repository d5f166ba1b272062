//! Artifact Merger - 合并已保存的音频文件

use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::{ArtifactStoragePort, StorageError};
use crate::domain::audio::{merge_containers, MergeError};
use crate::domain::segment::{AudioRef, Segment};

/// 合并产物的文件名前缀
pub const MERGED_ARTIFACT_PREFIX: &str = "merged";

#[derive(Debug, Error)]
pub enum ArtifactMergeError {
    /// 所有输入都不存在
    #[error("没有可合并的音频文件")]
    InputMissing,

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// 合并结果
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub audio_ref: AudioRef,
    pub merged_count: usize,
    pub skipped: Vec<AudioRef>,
    pub duration_secs: f64,
}

pub struct ArtifactMerger {
    storage: Arc<dyn ArtifactStoragePort>,
}

impl ArtifactMerger {
    pub fn new(storage: Arc<dyn ArtifactStoragePort>) -> Self {
        Self { storage }
    }

    /// 合并 ready 片段的音频，按 index 顺序
    pub async fn merge_segments(
        &self,
        segments: &[Segment],
    ) -> Result<MergeOutcome, ArtifactMergeError> {
        let mut ready: Vec<&Segment> = segments.iter().filter(|s| s.is_ready()).collect();
        ready.sort_by_key(|s| s.index());

        let refs: Vec<AudioRef> = ready
            .into_iter()
            .filter_map(|s| s.audio().map(|a| a.audio_ref.clone()))
            .collect();
        if refs.is_empty() {
            return Err(MergeError::NothingToMerge.into());
        }
        self.merge_refs(&refs).await
    }

    /// 按给定顺序合并；不存在的文件跳过
    pub async fn merge_refs(&self, refs: &[AudioRef]) -> Result<MergeOutcome, ArtifactMergeError> {
        let mut buffers = Vec::with_capacity(refs.len());
        let mut skipped = Vec::new();

        for audio_ref in refs {
            match self.storage.load(audio_ref).await {
                Ok(bytes) => buffers.push(bytes),
                Err(StorageError::NotFound(_)) => {
                    tracing::warn!(audio_ref = %audio_ref, "Merge input missing, skipped");
                    skipped.push(audio_ref.clone());
                }
                Err(e) => return Err(e.into()),
            }
        }

        if buffers.is_empty() {
            return Err(ArtifactMergeError::InputMissing);
        }

        let merged = merge_containers(&buffers)?;
        let audio_ref = self.storage.save(MERGED_ARTIFACT_PREFIX, &merged.bytes).await?;

        tracing::info!(
            audio_ref = %audio_ref,
            inputs = buffers.len(),
            skipped = skipped.len(),
            payload_len = merged.payload_len,
            "Audio merged"
        );

        Ok(MergeOutcome {
            audio_ref,
            merged_count: buffers.len(),
            skipped,
            duration_secs: merged.duration_secs(),
        })
    }
}
