//! Segment Handler - 分段预览

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::PreviewSegmentsQuery;
use crate::infrastructure::http::dto::{ApiResponse, SegmentPreviewDto, SegmentRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn preview_segments(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SegmentRequest>,
) -> Result<Json<ApiResponse<SegmentPreviewDto>>, ApiError> {
    let result = state.preview_segments_handler.handle(PreviewSegmentsQuery {
        text: req.text,
        segment_length: req.segment_length,
    })?;

    Ok(Json(ApiResponse::success(SegmentPreviewDto {
        segment_length: result.segment_length,
        total: result.segments.len(),
        segments: result.segments,
    })))
}
