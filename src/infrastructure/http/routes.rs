//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/generate          POST  合成一段文本并保存
//! - /api/merge             POST  按顺序合并已有音频文件
//! - /api/segment           POST  分段预览
//! - /api/job/start         POST  创建生成任务并开始调度
//! - /api/job/stop          POST  取消当前运行
//! - /api/job/resume        POST  重置失败片段并继续
//! - /api/job/retry         POST  单片段重试
//! - /api/job/status        POST  查询片段状态
//! - /api/job/merge         POST  合并已完成片段
//! - /api/job/close         POST  关闭任务
//! - /ws/events             WS    片段事件推送（可选 ?job_id=）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::events_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/generate", post(handlers::generate_audio))
        .route("/merge", post(handlers::merge_audio))
        .route("/segment", post(handlers::preview_segments))
        .nest("/job", job_routes())
}

/// Job 路由
fn job_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(handlers::start_job))
        .route("/stop", post(handlers::stop_job))
        .route("/resume", post(handlers::resume_job))
        .route("/retry", post(handlers::retry_segment))
        .route("/status", post(handlers::job_status))
        .route("/merge", post(handlers::merge_job))
        .route("/close", post(handlers::close_job))
}
