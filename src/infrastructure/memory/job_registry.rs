//! In-Memory Job Registry Implementation

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::application::ports::{JobError, JobRegistryPort, WorkItem};
use crate::application::services::GenerationJob;

/// 内存 job 注册表
pub struct InMemoryJobRegistry {
    /// job_id -> GenerationJob
    jobs: DashMap<Uuid, Arc<GenerationJob>>,
    /// 工作队列发送端
    queue_sender: mpsc::Sender<WorkItem>,
}

impl InMemoryJobRegistry {
    pub fn new(queue_sender: mpsc::Sender<WorkItem>) -> Self {
        Self {
            jobs: DashMap::new(),
            queue_sender,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl JobRegistryPort for InMemoryJobRegistry {
    fn register(&self, job: Arc<GenerationJob>) {
        tracing::debug!(job_id = %job.id(), segments = job.board().len(), "Job registered");
        self.jobs.insert(job.id(), job);
    }

    fn get(&self, job_id: Uuid) -> Option<Arc<GenerationJob>> {
        self.jobs.get(&job_id).map(|j| j.value().clone())
    }

    fn remove(&self, job_id: Uuid) -> Option<Arc<GenerationJob>> {
        let removed = self.jobs.remove(&job_id).map(|(_, job)| job);
        if removed.is_some() {
            tracing::debug!(job_id = %job_id, "Job removed");
        }
        removed
    }

    fn count(&self) -> usize {
        self.jobs.len()
    }

    fn enqueue(&self, item: WorkItem) -> Result<(), JobError> {
        self.queue_sender.try_send(item).map_err(|e| {
            tracing::warn!(job_id = %item.job_id(), error = %e, "Failed to enqueue work item");
            match e {
                TrySendError::Full(_) => JobError::QueueFull,
                TrySendError::Closed(_) => JobError::QueueClosed,
            }
        })
    }
}
