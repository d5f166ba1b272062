//! Job Registry Port - 生成任务注册表与工作队列
//!
//! 具体实现在 infrastructure/memory 层

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::services::GenerationJob;

/// Job Registry 错误
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Job {0} already has an active run")]
    RunActive(Uuid),

    #[error("Work queue is full")]
    QueueFull,

    #[error("Work queue closed")]
    QueueClosed,
}

/// 队列中的工作项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItem {
    /// 调度 job 中所有 pending 片段
    Run { job_id: Uuid },
    /// 单片段重试
    RetrySegment { job_id: Uuid, index: usize },
}

impl WorkItem {
    pub fn job_id(&self) -> Uuid {
        match self {
            Self::Run { job_id } | Self::RetrySegment { job_id, .. } => *job_id,
        }
    }
}

/// Job Registry Port
///
/// 所有 job 仅保存在内存中
pub trait JobRegistryPort: Send + Sync {
    fn register(&self, job: Arc<GenerationJob>);

    fn get(&self, job_id: Uuid) -> Option<Arc<GenerationJob>>;

    /// 移除并返回 job
    fn remove(&self, job_id: Uuid) -> Option<Arc<GenerationJob>>;

    fn count(&self) -> usize;

    /// 提交工作项到队列
    fn enqueue(&self, item: WorkItem) -> Result<(), JobError>;
}
