//! Segment Event Port - 片段状态通知

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::segment::SegmentStatus;

/// 推送给订阅方的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SegmentEvent {
    /// 片段状态变更
    SegmentStateChanged {
        job_id: Uuid,
        index: usize,
        status: SegmentStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_secs: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 一次调度运行结束
    RunFinished {
        job_id: Uuid,
        ready: usize,
        failed: usize,
        pending: usize,
        halted: bool,
        cancelled: bool,
    },
}

/// Segment Event Port
///
/// 发布是同步且不阻塞的；没有订阅者时事件被丢弃
pub trait SegmentEventPort: Send + Sync {
    fn publish(&self, event: SegmentEvent);
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl SegmentEventPort for NoopEvents {
    fn publish(&self, _event: SegmentEvent) {}
}
