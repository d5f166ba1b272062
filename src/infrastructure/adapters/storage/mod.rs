//! Storage Adapter - 音频产物存储

mod file_artifact_storage;

pub use file_artifact_storage::FileArtifactStorage;
