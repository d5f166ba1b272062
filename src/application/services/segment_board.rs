//! Segment Board - 一组片段的共享状态
//!
//! 片段状态的唯一写入口，每次状态变更后发布事件

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::application::ports::{SegmentEvent, SegmentEventPort};
use crate::domain::segment::{AudioRef, GeneratedAudio, Segment, SegmentError, SegmentStatus};

/// 各状态计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardCounts {
    pub pending: usize,
    pub generating: usize,
    pub ready: usize,
    pub error: usize,
}

impl BoardCounts {
    pub fn total(&self) -> usize {
        self.pending + self.generating + self.ready + self.error
    }
}

pub struct SegmentBoard {
    job_id: Uuid,
    segments: DashMap<usize, Segment>,
    len: usize,
    events: Arc<dyn SegmentEventPort>,
}

impl SegmentBoard {
    /// 片段需按 index 从 0 连续编号
    pub fn new(job_id: Uuid, segments: Vec<Segment>, events: Arc<dyn SegmentEventPort>) -> Self {
        let len = segments.len();
        let segments = segments
            .into_iter()
            .map(|segment| (segment.index(), segment))
            .collect();
        Self {
            job_id,
            segments,
            len,
            events,
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<Segment> {
        self.segments.get(&index).map(|s| s.value().clone())
    }

    /// 按 index 顺序的快照
    pub fn snapshot(&self) -> Vec<Segment> {
        (0..self.len).filter_map(|i| self.get(i)).collect()
    }

    /// 当前 pending 的 index，升序
    pub fn pending_indices(&self) -> Vec<usize> {
        (0..self.len)
            .filter(|i| {
                self.segments
                    .get(i)
                    .is_some_and(|s| s.status() == SegmentStatus::Pending)
            })
            .collect()
    }

    pub fn counts(&self) -> BoardCounts {
        let mut counts = BoardCounts::default();
        for segment in self.segments.iter() {
            match segment.status() {
                SegmentStatus::Pending => counts.pending += 1,
                SegmentStatus::Generating => counts.generating += 1,
                SegmentStatus::Ready => counts.ready += 1,
                SegmentStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    /// 已完成片段的音频，按 index 顺序
    pub fn ready_audio(&self) -> Vec<(usize, AudioRef)> {
        self.snapshot()
            .into_iter()
            .filter_map(|s| s.audio().map(|a| (s.index(), a.audio_ref.clone())))
            .collect()
    }

    /// Pending → Generating，返回片段内容
    pub fn claim(&self, index: usize) -> Result<String, SegmentError> {
        self.transition(index, |s| s.claim().map(|_| s.content().to_string()))
    }

    /// 非 Generating → Generating，返回片段内容
    pub fn begin_retry(&self, index: usize) -> Result<String, SegmentError> {
        self.transition(index, |s| s.begin_retry().map(|_| s.content().to_string()))
    }

    pub fn complete(&self, index: usize, audio: GeneratedAudio) -> Result<(), SegmentError> {
        self.transition(index, |s| s.complete(audio))
    }

    pub fn fail(&self, index: usize, message: impl Into<String>) -> Result<(), SegmentError> {
        let message = message.into();
        self.transition(index, |s| s.fail(message))
    }

    pub fn roll_back(&self, index: usize) -> Result<(), SegmentError> {
        self.transition(index, |s| s.roll_back())
    }

    /// 所有 Error 片段重置为 Pending，返回重置数量
    pub fn reset_errors(&self) -> usize {
        let mut reset = Vec::new();
        for i in 0..self.len {
            if let Some(mut segment) = self.segments.get_mut(&i) {
                if segment.reset_error() {
                    reset.push(segment.value().clone());
                }
            }
        }
        for segment in &reset {
            self.publish(segment);
        }
        reset.len()
    }

    fn transition<T>(
        &self,
        index: usize,
        f: impl FnOnce(&mut Segment) -> Result<T, SegmentError>,
    ) -> Result<T, SegmentError> {
        let (value, snapshot) = {
            let mut segment = self
                .segments
                .get_mut(&index)
                .ok_or(SegmentError::NotFound(index))?;
            let value = f(segment.value_mut())?;
            (value, segment.value().clone())
        };
        self.publish(&snapshot);
        Ok(value)
    }

    fn publish(&self, segment: &Segment) {
        self.events.publish(SegmentEvent::SegmentStateChanged {
            job_id: self.job_id,
            index: segment.index(),
            status: segment.status(),
            duration_secs: segment.audio().map(|a| a.duration_secs),
            error: segment.last_error().map(str::to_string),
        });
    }
}
