//! Generation Scheduler - 有界并发的片段合成调度
//!
//! 运行规则:
//! - 只调度当前 pending 的片段，按 index 升序派发
//! - 同时在途的合成不超过 `concurrency`
//! - 任一片段失败：标记 error，停止派发并取消其余在途合成，已完成的保持 ready
//! - 因取消而中止的片段回到 pending
//!
//! 同一组片段上的多次运行必须串行

use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;

use super::{RenderError, SegmentBoard, SegmentRenderer};
use crate::domain::segment::{GeneratedAudio, SegmentError, SegmentStatus};
use crate::domain::voice::{CredentialPool, VoiceParams};

/// 默认并发数
pub const DEFAULT_CONCURRENCY: usize = 2;

/// 一次运行的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dispatched: usize,
    pub ready: usize,
    pub failed: usize,
    pub pending: usize,
    /// 因失败而停止派发
    pub halted: bool,
    /// 被外部取消
    pub cancelled: bool,
    /// 第一个失败的片段
    pub failed_index: Option<usize>,
}

pub struct GenerationScheduler {
    renderer: Arc<dyn SegmentRenderer>,
    concurrency: usize,
}

impl GenerationScheduler {
    pub fn new(renderer: Arc<dyn SegmentRenderer>, concurrency: usize) -> Self {
        Self {
            renderer,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// 调度所有 pending 片段直到完成、失败停止或被取消
    ///
    /// `cancel` 为本次运行专属，失败时会被触发
    pub async fn run(
        &self,
        board: &SegmentBoard,
        params: &VoiceParams,
        credentials: &CredentialPool,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let mut queue = board.pending_indices().into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut summary = RunSummary::default();

        tracing::info!(
            job_id = %board.job_id(),
            pending = queue.len(),
            concurrency = self.concurrency,
            "Generation run started"
        );

        loop {
            while !summary.halted && !cancel.is_cancelled() && in_flight.len() < self.concurrency {
                let Some(index) = queue.next() else {
                    break;
                };
                match board.claim(index) {
                    Ok(content) => {
                        summary.dispatched += 1;
                        in_flight.push(self.render_one(index, content, params, credentials, cancel));
                    }
                    Err(e) => {
                        tracing::debug!(index, error = %e, "Segment no longer pending, skipped");
                    }
                }
            }

            let Some((index, result)) = in_flight.next().await else {
                break;
            };

            match result {
                Ok(audio) => log_transition(index, board.complete(index, audio)),
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(index, "Segment cancelled, back to pending");
                    log_transition(index, board.roll_back(index));
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "Segment failed, halting dispatch");
                    log_transition(index, board.fail(index, e.user_message()));
                    if !summary.halted {
                        summary.halted = true;
                        summary.failed_index = Some(index);
                        cancel.cancel();
                    }
                }
            }
        }

        let counts = board.counts();
        summary.ready = counts.ready;
        summary.failed = counts.error;
        summary.pending = counts.pending;
        summary.cancelled = cancel.is_cancelled() && !summary.halted;

        tracing::info!(
            job_id = %board.job_id(),
            dispatched = summary.dispatched,
            ready = summary.ready,
            failed = summary.failed,
            pending = summary.pending,
            halted = summary.halted,
            cancelled = summary.cancelled,
            "Generation run finished"
        );

        summary
    }

    /// 单片段重试，不经过并发池
    ///
    /// 片段正在合成时拒绝；返回片段的最终状态
    pub async fn retry_one(
        &self,
        board: &SegmentBoard,
        index: usize,
        params: &VoiceParams,
        credentials: &CredentialPool,
        cancel: &CancellationToken,
    ) -> Result<SegmentStatus, SegmentError> {
        let content = board.begin_retry(index)?;
        tracing::info!(job_id = %board.job_id(), index, "Retrying segment");

        let (_, result) = self
            .render_one(index, content, params, credentials, cancel)
            .await;

        match result {
            Ok(audio) => {
                board.complete(index, audio)?;
                Ok(SegmentStatus::Ready)
            }
            Err(e) if e.is_cancelled() => {
                board.roll_back(index)?;
                Ok(SegmentStatus::Pending)
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "Segment retry failed");
                board.fail(index, e.user_message())?;
                Ok(SegmentStatus::Error)
            }
        }
    }

    async fn render_one(
        &self,
        index: usize,
        content: String,
        params: &VoiceParams,
        credentials: &CredentialPool,
        cancel: &CancellationToken,
    ) -> (usize, Result<GeneratedAudio, RenderError>) {
        let result = self
            .renderer
            .render(&content, params, credentials, cancel)
            .await;
        (index, result)
    }
}

fn log_transition(index: usize, result: Result<(), SegmentError>) {
    if let Err(e) = result {
        tracing::error!(index, error = %e, "Unexpected segment transition");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{SegmentEvent, SegmentEventPort, SynthesisError};
    use crate::domain::segment::{segments_from_text, AudioRef};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use uuid::Uuid;

    /// 记录事件并跟踪同时处于 generating 的片段数
    #[derive(Default)]
    struct RecordingEvents {
        statuses: Mutex<HashMap<usize, SegmentStatus>>,
        log: Mutex<Vec<(usize, SegmentStatus)>>,
        max_generating: Mutex<usize>,
    }

    impl SegmentEventPort for RecordingEvents {
        fn publish(&self, event: SegmentEvent) {
            if let SegmentEvent::SegmentStateChanged { index, status, .. } = event {
                let mut statuses = self.statuses.lock().unwrap();
                statuses.insert(index, status);
                let generating = statuses
                    .values()
                    .filter(|s| **s == SegmentStatus::Generating)
                    .count();
                let mut max = self.max_generating.lock().unwrap();
                *max = (*max).max(generating);
                self.log.lock().unwrap().push((index, status));
            }
        }
    }

    impl RecordingEvents {
        fn log(&self) -> Vec<(usize, SegmentStatus)> {
            self.log.lock().unwrap().clone()
        }

        fn max_generating(&self) -> usize {
            *self.max_generating.lock().unwrap()
        }
    }

    /// 按片段内容决定耗时与结果：内容以 "fail" 开头的片段失败
    struct ScriptedRenderer {
        delay_per_char: Duration,
    }

    #[async_trait]
    impl SegmentRenderer for ScriptedRenderer {
        async fn render(
            &self,
            text: &str,
            _params: &VoiceParams,
            _credentials: &CredentialPool,
            cancel: &CancellationToken,
        ) -> Result<GeneratedAudio, RenderError> {
            let delay = self.delay_per_char * text.chars().count() as u32;
            tokio::select! {
                _ = cancel.cancelled() => return Err(SynthesisError::Cancelled.into()),
                _ = tokio::time::sleep(delay) => {}
            }
            if text.starts_with("fail") {
                return Err(SynthesisError::NoAudioReturned.into());
            }
            Ok(GeneratedAudio::new(
                AudioRef::new(format!("{}.wav", text.len())),
                1.0,
            ))
        }
    }

    fn scheduler(concurrency: usize) -> GenerationScheduler {
        GenerationScheduler::new(
            Arc::new(ScriptedRenderer {
                delay_per_char: Duration::from_millis(10),
            }),
            concurrency,
        )
    }

    /// 相邻段落长度之和超过 50，保证每个段落独立成段
    fn board_from(paragraphs: &[String], events: Arc<RecordingEvents>) -> SegmentBoard {
        let segments = segments_from_text(&paragraphs.join("\n"), 50);
        assert_eq!(segments.len(), paragraphs.len());
        SegmentBoard::new(Uuid::new_v4(), segments, events)
    }

    fn ok_paragraph(i: usize, len: usize) -> String {
        format!("ok{:02}{}", i, "x".repeat(len))
    }

    fn pool() -> CredentialPool {
        CredentialPool::single("key").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_respected() {
        let events = Arc::new(RecordingEvents::default());
        let paragraphs: Vec<String> = (0..7).map(|i| ok_paragraph(i, 30 + i)).collect();
        let board = board_from(&paragraphs, events.clone());

        let summary = scheduler(3)
            .run(&board, &VoiceParams::default(), &pool(), &CancellationToken::new())
            .await;

        assert_eq!(summary.ready, 7);
        assert_eq!(summary.dispatched, 7);
        assert!(!summary.halted && !summary.cancelled);
        assert_eq!(events.max_generating(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_follows_index_order() {
        let events = Arc::new(RecordingEvents::default());
        let paragraphs: Vec<String> = (0..5).map(|i| ok_paragraph(i, 40 - i * 5)).collect();
        let board = board_from(&paragraphs, events.clone());

        scheduler(1)
            .run(&board, &VoiceParams::default(), &pool(), &CancellationToken::new())
            .await;

        let claimed: Vec<usize> = events
            .log()
            .into_iter()
            .filter(|(_, s)| *s == SegmentStatus::Generating)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(claimed, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_halts_dispatch_and_keeps_ready() {
        let events = Arc::new(RecordingEvents::default());
        // 0 很快完成，1 稍后失败，2 在途时被取消，3/4 从未派发
        let paragraphs = vec![
            ok_paragraph(0, 22),
            format!("fail{}", "y".repeat(26)),
            ok_paragraph(2, 40),
            ok_paragraph(3, 22),
            ok_paragraph(4, 22),
        ];
        let board = board_from(&paragraphs, events.clone());

        let summary = scheduler(2)
            .run(&board, &VoiceParams::default(), &pool(), &CancellationToken::new())
            .await;

        assert!(summary.halted);
        assert!(!summary.cancelled);
        assert_eq!(summary.failed_index, Some(1));
        assert_eq!(summary.ready, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pending, 3);

        let statuses: Vec<SegmentStatus> = board.snapshot().iter().map(|s| s.status()).collect();
        assert_eq!(
            statuses,
            vec![
                SegmentStatus::Ready,
                SegmentStatus::Error,
                SegmentStatus::Pending,
                SegmentStatus::Pending,
                SegmentStatus::Pending,
            ]
        );

        // 出现 error 之后不再有新的 generating
        let log = events.log();
        let first_error = log
            .iter()
            .position(|(_, s)| *s == SegmentStatus::Error)
            .unwrap();
        assert!(log[first_error..]
            .iter()
            .all(|(_, s)| *s != SegmentStatus::Generating));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_segments_return_to_pending() {
        let events = Arc::new(RecordingEvents::default());
        let paragraphs: Vec<String> = (0..4).map(|i| ok_paragraph(i, 40)).collect();
        let board = board_from(&paragraphs, events.clone());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let summary = scheduler(2)
            .run(&board, &VoiceParams::default(), &pool(), &cancel)
            .await;

        assert!(summary.cancelled);
        assert!(!summary.halted);
        assert_eq!(summary.pending, 4);
        assert_eq!(summary.failed, 0);
        assert!(events.log().iter().all(|(_, s)| *s != SegmentStatus::Error));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rerun_only_dispatches_pending() {
        let events = Arc::new(RecordingEvents::default());
        let paragraphs = vec![
            ok_paragraph(0, 22),
            format!("fail{}", "y".repeat(26)),
            ok_paragraph(2, 40),
        ];
        let board = board_from(&paragraphs, events.clone());
        let runner = scheduler(2);

        let first = runner
            .run(&board, &VoiceParams::default(), &pool(), &CancellationToken::new())
            .await;
        assert!(first.halted);

        // error 片段未重置时不会被再次派发
        let second = runner
            .run(&board, &VoiceParams::default(), &pool(), &CancellationToken::new())
            .await;
        assert_eq!(second.dispatched, 1);
        assert_eq!(second.ready, 2);
        assert_eq!(second.failed, 1);

        assert_eq!(board.reset_errors(), 1);
        let third = runner
            .run(&board, &VoiceParams::default(), &pool(), &CancellationToken::new())
            .await;
        assert_eq!(third.dispatched, 1);
        assert_eq!(third.failed, 1);
        assert_eq!(third.ready, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_one_outside_pool() {
        let events = Arc::new(RecordingEvents::default());
        let paragraphs: Vec<String> = (0..2).map(|i| ok_paragraph(i, 40)).collect();
        let board = board_from(&paragraphs, events);
        let runner = scheduler(2);

        let status = runner
            .retry_one(&board, 1, &VoiceParams::default(), &pool(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(status, SegmentStatus::Ready);
        assert_eq!(board.pending_indices(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_rejected_while_generating() {
        let events = Arc::new(RecordingEvents::default());
        let paragraphs: Vec<String> = (0..2).map(|i| ok_paragraph(i, 40)).collect();
        let board = board_from(&paragraphs, events);
        board.claim(0).unwrap();

        let result = scheduler(2)
            .retry_one(&board, 0, &VoiceParams::default(), &pool(), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(SegmentError::InvalidTransition { index: 0, .. })
        ));
    }
}
