//! Job Commands - 服务端生成任务

use uuid::Uuid;

/// 创建 job 并开始生成
#[derive(Debug, Clone, Default)]
pub struct StartJobCommand {
    pub text: String,
    pub segment_length: Option<usize>,
    pub voice: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub voice_profile: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StartJobResponse {
    pub job_id: Uuid,
    pub total_segments: usize,
    pub segment_length: usize,
}

/// 停止当前运行
#[derive(Debug, Clone)]
pub struct StopJobCommand {
    pub job_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct StopJobResponse {
    pub job_id: Uuid,
    pub was_running: bool,
}

/// 重置失败片段并继续生成
#[derive(Debug, Clone)]
pub struct ResumeJobCommand {
    pub job_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct ResumeJobResponse {
    pub job_id: Uuid,
    /// 从 error 重置为 pending 的片段数
    pub reset: usize,
    /// 是否提交了新的运行
    pub queued: bool,
}

/// 单片段重试
#[derive(Debug, Clone)]
pub struct RetrySegmentCommand {
    pub job_id: Uuid,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct RetrySegmentResponse {
    pub job_id: Uuid,
    pub index: usize,
}

/// 合并 job 中已完成的片段
#[derive(Debug, Clone)]
pub struct MergeJobCommand {
    pub job_id: Uuid,
}

/// 关闭 job 并丢弃片段
#[derive(Debug, Clone)]
pub struct CloseJobCommand {
    pub job_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CloseJobResponse {
    pub job_id: Uuid,
}
