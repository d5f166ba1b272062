//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;
use uuid::Uuid;

use crate::application::ports::{FailureKind, JobError, StorageError};
use crate::application::services::{ArtifactMergeError, RenderError};
use crate::domain::segment::SegmentError;
use crate::domain::voice::VoiceError;

/// 合并失败时展示给用户的提示
pub const MERGE_FAILED_MESSAGE: &str = "音频合并失败，请重试";

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: Uuid,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态冲突（例如已有运行在进行）
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 合成失败，message 为面向用户的提示
    #[error("{message}")]
    SynthesisFailed { kind: FailureKind, message: String },

    /// 没有可合并的音频
    #[error("Nothing to merge: {0}")]
    NothingToMerge(String),

    /// 合并失败
    #[error("Merge failed: {0}")]
    MergeFailed(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource_type, id }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<VoiceError> for ApplicationError {
    fn from(err: VoiceError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<SegmentError> for ApplicationError {
    fn from(err: SegmentError) -> Self {
        match err {
            SegmentError::NotFound(index) => {
                Self::ValidationError(format!("Invalid segment index: {}", index))
            }
            SegmentError::EmptyContent(_) => Self::ValidationError(err.to_string()),
            SegmentError::InvalidTransition { .. } => Self::InvalidState(err.to_string()),
        }
    }
}

impl From<JobError> for ApplicationError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => Self::not_found("Job", id),
            JobError::RunActive(_) => Self::InvalidState(err.to_string()),
            JobError::QueueFull | JobError::QueueClosed => Self::InternalError(err.to_string()),
        }
    }
}

impl From<StorageError> for ApplicationError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName(_) => Self::ValidationError(err.to_string()),
            other => Self::StorageError(other.to_string()),
        }
    }
}

impl From<RenderError> for ApplicationError {
    fn from(err: RenderError) -> Self {
        match &err {
            RenderError::Synthesis(inner) => Self::SynthesisFailed {
                kind: inner.kind(),
                message: inner.user_message(),
            },
            RenderError::Storage(_) | RenderError::Container(_) => {
                Self::StorageError(err.to_string())
            }
        }
    }
}

impl From<ArtifactMergeError> for ApplicationError {
    fn from(err: ArtifactMergeError) -> Self {
        match err {
            ArtifactMergeError::InputMissing => Self::NothingToMerge(err.to_string()),
            ArtifactMergeError::Merge(crate::domain::audio::MergeError::NothingToMerge) => {
                Self::NothingToMerge(err.to_string())
            }
            other => {
                tracing::error!(error = %other, "Audio merge failed");
                Self::MergeFailed(MERGE_FAILED_MESSAGE.to_string())
            }
        }
    }
}
