//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{
    GenerateAudioResponse, JobStatusResponse, MergeAudioResponse, SegmentView,
};
use crate::domain::segment::{format_duration, SegmentStatus};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Generate / Merge DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, alias = "api_key")]
    pub api_key: Option<String>,
    #[serde(default, alias = "voice_profile")]
    pub voice_profile: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponseDto {
    pub audio_ref: String,
    pub audio_url: String,
    /// `m:ss`
    pub duration: String,
    pub duration_seconds: u64,
}

impl From<GenerateAudioResponse> for GenerateResponseDto {
    fn from(r: GenerateAudioResponse) -> Self {
        Self {
            audio_ref: r.audio_ref.to_string(),
            audio_url: r.audio_url,
            duration: format_duration(r.duration_secs),
            duration_seconds: rounded_secs(r.duration_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MergeResponseDto {
    pub audio_ref: String,
    pub url: String,
    pub merged_count: usize,
    pub skipped: Vec<String>,
    pub duration: String,
    pub duration_seconds: u64,
}

impl From<MergeAudioResponse> for MergeResponseDto {
    fn from(r: MergeAudioResponse) -> Self {
        Self {
            audio_ref: r.audio_ref.to_string(),
            url: r.audio_url,
            merged_count: r.merged_count,
            skipped: r.skipped,
            duration: format_duration(r.duration_secs),
            duration_seconds: rounded_secs(r.duration_secs),
        }
    }
}

// ============================================================================
// Segment / Job DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SegmentRequest {
    pub text: String,
    #[serde(default)]
    pub segment_length: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SegmentPreviewDto {
    pub segment_length: usize,
    pub total: usize,
    pub segments: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartJobRequest {
    pub text: String,
    #[serde(default)]
    pub segment_length: Option<usize>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "apiKey", alias = "api_key")]
    pub api_key: Option<String>,
    #[serde(default, rename = "voiceProfile", alias = "voice_profile")]
    pub voice_profile: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartJobResponseDto {
    pub job_id: Uuid,
    pub total_segments: usize,
    pub segment_length: usize,
}

#[derive(Debug, Deserialize)]
pub struct JobRequest {
    pub job_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RetrySegmentRequest {
    pub job_id: Uuid,
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct StopJobResponseDto {
    pub job_id: Uuid,
    pub was_running: bool,
}

#[derive(Debug, Serialize)]
pub struct ResumeJobResponseDto {
    pub job_id: Uuid,
    pub reset: usize,
    pub queued: bool,
}

#[derive(Debug, Serialize)]
pub struct RetrySegmentResponseDto {
    pub job_id: Uuid,
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct CloseJobResponseDto {
    pub job_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SegmentStatusDto {
    pub index: usize,
    pub content: String,
    pub status: SegmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SegmentView> for SegmentStatusDto {
    fn from(v: SegmentView) -> Self {
        Self {
            index: v.index,
            content: v.content,
            status: v.status,
            audio_url: v.audio_url,
            duration: v.duration_secs.map(format_duration),
            error: v.error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobStatusDto {
    pub job_id: Uuid,
    pub running: bool,
    pub total: usize,
    pub ready: usize,
    pub generating: usize,
    pub pending: usize,
    pub failed: usize,
    pub segments: Vec<SegmentStatusDto>,
}

impl From<JobStatusResponse> for JobStatusDto {
    fn from(r: JobStatusResponse) -> Self {
        Self {
            job_id: r.job_id,
            running: r.running,
            total: r.counts.total(),
            ready: r.counts.ready,
            generating: r.counts.generating,
            pending: r.counts.pending,
            failed: r.counts.error,
            segments: r.segments.into_iter().map(Into::into).collect(),
        }
    }
}

fn rounded_secs(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        secs.round() as u64
    } else {
        0
    }
}
