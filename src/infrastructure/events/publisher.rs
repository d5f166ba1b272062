//! Event Publisher Implementation
//!
//! 基于 broadcast 通道的事件推送，WebSocket 连接各自订阅

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{SegmentEvent, SegmentEventPort};

const DEFAULT_CAPACITY: usize = 256;

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<SegmentEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// 指定通道容量；慢订阅者超出容量后会丢失最旧的事件
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SegmentEvent> {
        self.channel.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentEventPort for EventPublisher {
    fn publish(&self, event: SegmentEvent) {
        // 没有订阅者时 send 返回错误，直接丢弃
        if self.channel.send(event).is_err() {
            tracing::trace!("No event subscribers, event dropped");
        }
    }
}
