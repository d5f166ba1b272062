//! Audio Handlers - 单段合成与文件合并

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{GenerateAudioCommand, MergeAudioCommand};
use crate::infrastructure::http::dto::{
    ApiResponse, GenerateRequest, GenerateResponseDto, MergeRequest, MergeResponseDto,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponseDto>>, ApiError> {
    let cmd = GenerateAudioCommand {
        text: req.text,
        voice: req.voice,
        model: req.model,
        api_key: req.api_key,
        voice_profile: req.voice_profile,
    };

    let result = state.generate_audio_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

pub async fn merge_audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<ApiResponse<MergeResponseDto>>, ApiError> {
    if req.files.is_empty() {
        return Err(ApiError::BadRequest("No files to merge".to_string()));
    }

    let result = state
        .merge_audio_handler
        .handle(MergeAudioCommand { files: req.files })
        .await?;
    Ok(Json(ApiResponse::success(result.into())))
}
