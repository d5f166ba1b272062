//! Segment Queries

use uuid::Uuid;

use crate::application::services::BoardCounts;
use crate::domain::segment::SegmentStatus;

/// 分段预览
#[derive(Debug, Clone)]
pub struct PreviewSegmentsQuery {
    pub text: String,
    pub segment_length: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct PreviewSegmentsResponse {
    pub segment_length: usize,
    pub segments: Vec<String>,
}

/// 查询 job 状态
#[derive(Debug, Clone)]
pub struct GetJobStatusQuery {
    pub job_id: Uuid,
}

/// 单个片段的展示信息
#[derive(Debug, Clone)]
pub struct SegmentView {
    pub index: usize,
    pub content: String,
    pub status: SegmentStatus,
    pub audio_url: Option<String>,
    pub duration_secs: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub running: bool,
    pub counts: BoardCounts,
    pub segments: Vec<SegmentView>,
}
