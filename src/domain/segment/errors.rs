//! Segment Context - Errors

use thiserror::Error;

use super::SegmentStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("片段内容不能为空: #{0}")]
    EmptyContent(usize),

    #[error("片段不存在: #{0}")]
    NotFound(usize),

    #[error("片段 #{index} 当前状态为 {from}，不能执行 {action}")]
    InvalidTransition {
        index: usize,
        from: SegmentStatus,
        action: &'static str,
    },
}
