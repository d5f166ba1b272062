//! File Storage - 文件系统音频产物存储
//!
//! 实现 ArtifactStoragePort trait，所有产物平铺在同一目录下

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{sanitize_artifact_name, ArtifactStoragePort, StorageError};
use crate::domain::segment::AudioRef;

/// 文件系统产物存储
pub struct FileArtifactStorage {
    /// 存储根目录
    base_dir: PathBuf,
    /// 对外访问前缀，例如 `/uploads`
    public_path: String,
}

impl FileArtifactStorage {
    /// 创建新的文件存储
    pub async fn new(
        base_dir: impl AsRef<Path>,
        public_path: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        let public_path = public_path.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_dir,
            public_path,
        })
    }

    /// 获取存储根目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 产物的磁盘路径；名称先经过规整，不会越出根目录
    fn artifact_path(&self, audio_ref: &AudioRef) -> Result<PathBuf, StorageError> {
        let name = sanitize_artifact_name(audio_ref.as_str())?;
        Ok(self.base_dir.join(name.as_str()))
    }

    fn generate_name(prefix: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}_{}_{}.wav", prefix, millis, &suffix[..8])
    }
}

#[async_trait]
impl ArtifactStoragePort for FileArtifactStorage {
    async fn save(&self, prefix: &str, bytes: &[u8]) -> Result<AudioRef, StorageError> {
        let audio_ref = AudioRef::new(Self::generate_name(prefix));
        let path = self.artifact_path(&audio_ref)?;

        fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        tracing::debug!(
            name = %audio_ref,
            size = bytes.len(),
            "Saved artifact"
        );

        Ok(audio_ref)
    }

    async fn load(&self, audio_ref: &AudioRef) -> Result<Vec<u8>, StorageError> {
        let path = self.artifact_path(audio_ref)?;

        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(audio_ref.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e.to_string())),
        }
    }

    async fn exists(&self, audio_ref: &AudioRef) -> bool {
        match self.artifact_path(audio_ref) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    fn public_url(&self, audio_ref: &AudioRef) -> String {
        format!("{}/{}", self.public_path, audio_ref)
    }
}
