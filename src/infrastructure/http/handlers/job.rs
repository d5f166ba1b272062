//! Job Handlers - 服务端生成任务

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    CloseJobCommand, GetJobStatusQuery, MergeJobCommand, ResumeJobCommand, RetrySegmentCommand,
    StartJobCommand, StopJobCommand,
};
use crate::infrastructure::http::dto::{
    ApiResponse, CloseJobResponseDto, JobRequest, JobStatusDto, MergeResponseDto,
    ResumeJobResponseDto, RetrySegmentRequest, RetrySegmentResponseDto, StartJobRequest,
    StartJobResponseDto, StopJobResponseDto,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Start / Stop / Resume
// ============================================================================

pub async fn start_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartJobRequest>,
) -> Result<Json<ApiResponse<StartJobResponseDto>>, ApiError> {
    let cmd = StartJobCommand {
        text: req.text,
        segment_length: req.segment_length,
        voice: req.voice,
        model: req.model,
        api_key: req.api_key,
        voice_profile: req.voice_profile,
    };

    let result = state.start_job_handler.handle(cmd)?;
    Ok(Json(ApiResponse::success(StartJobResponseDto {
        job_id: result.job_id,
        total_segments: result.total_segments,
        segment_length: result.segment_length,
    })))
}

pub async fn stop_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JobRequest>,
) -> Result<Json<ApiResponse<StopJobResponseDto>>, ApiError> {
    let result = state.stop_job_handler.handle(StopJobCommand { job_id: req.job_id })?;
    Ok(Json(ApiResponse::success(StopJobResponseDto {
        job_id: result.job_id,
        was_running: result.was_running,
    })))
}

pub async fn resume_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JobRequest>,
) -> Result<Json<ApiResponse<ResumeJobResponseDto>>, ApiError> {
    let result = state
        .resume_job_handler
        .handle(ResumeJobCommand { job_id: req.job_id })?;
    Ok(Json(ApiResponse::success(ResumeJobResponseDto {
        job_id: result.job_id,
        reset: result.reset,
        queued: result.queued,
    })))
}

// ============================================================================
// Retry / Status
// ============================================================================

pub async fn retry_segment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetrySegmentRequest>,
) -> Result<Json<ApiResponse<RetrySegmentResponseDto>>, ApiError> {
    let result = state.retry_segment_handler.handle(RetrySegmentCommand {
        job_id: req.job_id,
        index: req.index,
    })?;
    Ok(Json(ApiResponse::success(RetrySegmentResponseDto {
        job_id: result.job_id,
        index: result.index,
    })))
}

pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JobRequest>,
) -> Result<Json<ApiResponse<JobStatusDto>>, ApiError> {
    let result = state
        .job_status_handler
        .handle(GetJobStatusQuery { job_id: req.job_id })?;
    Ok(Json(ApiResponse::success(result.into())))
}

// ============================================================================
// Merge / Close
// ============================================================================

pub async fn merge_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JobRequest>,
) -> Result<Json<ApiResponse<MergeResponseDto>>, ApiError> {
    let result = state
        .merge_job_handler
        .handle(MergeJobCommand { job_id: req.job_id })
        .await?;
    Ok(Json(ApiResponse::success(result.into())))
}

pub async fn close_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JobRequest>,
) -> Result<Json<ApiResponse<CloseJobResponseDto>>, ApiError> {
    let result = state
        .close_job_handler
        .handle(CloseJobCommand { job_id: req.job_id })?;
    Ok(Json(ApiResponse::success(CloseJobResponseDto {
        job_id: result.job_id,
    })))
}
