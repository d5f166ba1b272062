//! Generation Worker - 后台生成任务处理器

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::application::ports::{JobRegistryPort, SegmentEvent, SegmentEventPort, WorkItem};
use crate::application::services::GenerationScheduler;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct GenerationWorkerConfig {
    /// 同时处理的工作项上限（不同 job 之间）
    pub max_concurrent_items: usize,
}

impl Default for GenerationWorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_items: 8,
        }
    }
}

/// 生成 Worker
///
/// 从队列消费工作项：整轮调度或单片段重试
pub struct GenerationWorker {
    config: GenerationWorkerConfig,
    queue_receiver: mpsc::Receiver<WorkItem>,
    registry: Arc<dyn JobRegistryPort>,
    scheduler: Arc<GenerationScheduler>,
    events: Arc<dyn SegmentEventPort>,
}

impl GenerationWorker {
    pub fn new(
        config: GenerationWorkerConfig,
        queue_receiver: mpsc::Receiver<WorkItem>,
        registry: Arc<dyn JobRegistryPort>,
        scheduler: Arc<GenerationScheduler>,
        events: Arc<dyn SegmentEventPort>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            registry,
            scheduler,
            events,
        }
    }

    /// 启动 Worker，队列关闭后返回
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent_items = self.config.max_concurrent_items,
            segment_concurrency = self.scheduler.concurrency(),
            "GenerationWorker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_items.max(1)));

        while let Some(item) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to acquire semaphore permit");
                    continue;
                }
            };

            let registry = self.registry.clone();
            let scheduler = self.scheduler.clone();
            let events = self.events.clone();

            tokio::spawn(async move {
                let _permit = permit;
                Self::process_item(item, registry, scheduler, events).await;
            });
        }

        tracing::info!("GenerationWorker stopped");
    }

    /// 处理单个工作项
    async fn process_item(
        item: WorkItem,
        registry: Arc<dyn JobRegistryPort>,
        scheduler: Arc<GenerationScheduler>,
        events: Arc<dyn SegmentEventPort>,
    ) {
        let job_id = item.job_id();
        let Some(job) = registry.get(job_id) else {
            tracing::debug!(job_id = %job_id, "Job no longer registered, skipping");
            return;
        };

        match item {
            WorkItem::Run { .. } => {
                let Some(token) = job.begin_run() else {
                    tracing::debug!(job_id = %job_id, "Job closed or already running, skipping");
                    return;
                };

                let summary = scheduler
                    .run(job.board(), job.params(), job.credentials(), &token)
                    .await;
                job.finish_run();

                events.publish(SegmentEvent::RunFinished {
                    job_id,
                    ready: summary.ready,
                    failed: summary.failed,
                    pending: summary.pending,
                    halted: summary.halted,
                    cancelled: summary.cancelled,
                });
            }
            WorkItem::RetrySegment { index, .. } => {
                let token = job.retry_token();
                match scheduler
                    .retry_one(job.board(), index, job.params(), job.credentials(), &token)
                    .await
                {
                    Ok(status) => {
                        tracing::info!(job_id = %job_id, index, status = %status, "Segment retry finished");
                    }
                    Err(e) => {
                        tracing::warn!(job_id = %job_id, index, error = %e, "Segment retry rejected");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::SpeechApiPort;
    use crate::application::services::{
        ArtifactGenerator, GenerationJob, RetryPolicy, SynthesisClient,
    };
    use crate::domain::segment::{segments_from_text, SegmentStatus};
    use crate::domain::voice::{CredentialPool, VoiceParams};
    use crate::infrastructure::adapters::{FakeTtsClient, FakeTtsClientConfig, FileArtifactStorage};
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::InMemoryJobRegistry;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::broadcast;

    struct Harness {
        _dir: TempDir,
        registry: Arc<InMemoryJobRegistry>,
        events: Arc<EventPublisher>,
    }

    async fn idle_worker() -> (Harness, GenerationWorker) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileArtifactStorage::new(dir.path(), "/uploads").await.unwrap());
        let api: Arc<dyn SpeechApiPort> = Arc::new(FakeTtsClient::new(FakeTtsClientConfig {
            latency: Duration::from_millis(5),
            millis_per_char: 10,
            ..Default::default()
        }));
        let generator = ArtifactGenerator::new(
            SynthesisClient::new(api, RetryPolicy::default()),
            storage,
        );
        let scheduler = Arc::new(GenerationScheduler::new(Arc::new(generator), 2));
        let events = EventPublisher::new().arc();

        let (tx, rx) = mpsc::channel(16);
        let registry = InMemoryJobRegistry::new(tx).arc();
        let worker = GenerationWorker::new(
            GenerationWorkerConfig::default(),
            rx,
            registry.clone(),
            scheduler,
            events.clone(),
        );

        let harness = Harness {
            _dir: dir,
            registry,
            events,
        };
        (harness, worker)
    }

    async fn start_worker() -> Harness {
        let (harness, worker) = idle_worker().await;
        tokio::spawn(worker.run());
        harness
    }

    async fn wait_run_finished(rx: &mut broadcast::Receiver<SegmentEvent>) -> SegmentEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match rx.recv().await {
                    Ok(event @ SegmentEvent::RunFinished { .. }) => return event,
                    Ok(_) => continue,
                    Err(e) => panic!("event channel error: {:?}", e),
                }
            }
        })
        .await
        .unwrap()
    }

    fn new_job(harness: &Harness, text: &str) -> Arc<GenerationJob> {
        let job = Arc::new(GenerationJob::new(
            segments_from_text(text, 50),
            VoiceParams::default(),
            CredentialPool::single("k").unwrap(),
            harness.events.clone(),
        ));
        harness.registry.register(job.clone());
        job
    }

    #[tokio::test]
    async fn test_run_generates_all_segments() {
        let harness = start_worker().await;
        let mut rx = harness.events.subscribe();
        let text = format!("{}\n{}\n{}", "甲".repeat(40), "乙".repeat(40), "丙".repeat(40));
        let job = new_job(&harness, &text);

        harness
            .registry
            .enqueue(WorkItem::Run { job_id: job.id() })
            .unwrap();

        let finished = wait_run_finished(&mut rx).await;
        assert_eq!(
            finished,
            SegmentEvent::RunFinished {
                job_id: job.id(),
                ready: 3,
                failed: 0,
                pending: 0,
                halted: false,
                cancelled: false,
            }
        );
        assert!(!job.is_running());
        assert!(job
            .board()
            .snapshot()
            .iter()
            .all(|s| s.status() == SegmentStatus::Ready));
    }

    #[tokio::test]
    async fn test_stop_while_run_is_queued() {
        let (harness, worker) = idle_worker().await;
        let mut rx = harness.events.subscribe();
        let text = format!("{}\n{}\n{}", "甲".repeat(40), "乙".repeat(40), "丙".repeat(40));
        let job = new_job(&harness, &text);

        harness
            .registry
            .enqueue(WorkItem::Run { job_id: job.id() })
            .unwrap();
        assert!(!job.stop());

        tokio::spawn(worker.run());

        let finished = wait_run_finished(&mut rx).await;
        assert_eq!(
            finished,
            SegmentEvent::RunFinished {
                job_id: job.id(),
                ready: 0,
                failed: 0,
                pending: 3,
                halted: false,
                cancelled: true,
            }
        );
        assert!(job
            .board()
            .snapshot()
            .iter()
            .all(|s| s.status() == SegmentStatus::Pending));

        job.prepare_run();
        harness
            .registry
            .enqueue(WorkItem::Run { job_id: job.id() })
            .unwrap();
        let resumed = wait_run_finished(&mut rx).await;
        assert!(matches!(
            resumed,
            SegmentEvent::RunFinished {
                ready: 3,
                cancelled: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_retry_segment_item() {
        let harness = start_worker().await;
        let mut rx = harness.events.subscribe();
        let job = new_job(&harness, "只有一句话。");
        job.board().claim(0).unwrap();
        job.board().fail(0, "boom").unwrap();

        harness
            .registry
            .enqueue(WorkItem::RetrySegment {
                job_id: job.id(),
                index: 0,
            })
            .unwrap();

        let ready = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Ok(SegmentEvent::SegmentStateChanged {
                    status: SegmentStatus::Ready,
                    ..
                }) = rx.recv().await
                {
                    return;
                }
            }
        })
        .await;
        assert!(ready.is_ok());
        assert!(job.board().get(0).unwrap().audio().is_some());
    }

    #[tokio::test]
    async fn test_unknown_job_is_skipped() {
        let harness = start_worker().await;
        let mut rx = harness.events.subscribe();

        harness
            .registry
            .enqueue(WorkItem::Run {
                job_id: uuid::Uuid::new_v4(),
            })
            .unwrap();

        let result = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(result.is_err());
    }
}
