//! Artifact Storage Port - 出站端口
//!
//! 音频产物按文件名存取，文件名由存储层生成

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::segment::AudioRef;

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 把任意路径或 URL 规整为裸文件名，防止目录穿越
///
/// 取最后一个 `/` 或 `\` 之后的部分；结果为空或为 `.`/`..` 时拒绝
pub fn sanitize_artifact_name(raw: &str) -> Result<AudioRef, StorageError> {
    let without_query = raw.split(['?', '#']).next().unwrap_or_default();
    let name = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return Err(StorageError::InvalidName(raw.to_string()));
    }
    Ok(AudioRef::new(name))
}

/// Artifact Storage Port
#[async_trait]
pub trait ArtifactStoragePort: Send + Sync {
    /// 以 `{prefix}_{毫秒时间戳}_{随机8位}.wav` 命名保存
    async fn save(&self, prefix: &str, bytes: &[u8]) -> Result<AudioRef, StorageError>;

    async fn load(&self, audio_ref: &AudioRef) -> Result<Vec<u8>, StorageError>;

    async fn exists(&self, audio_ref: &AudioRef) -> bool;

    /// 对外访问路径
    fn public_url(&self, audio_ref: &AudioRef) -> String;
}
