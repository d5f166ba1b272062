//! Application Services - 核心用例服务
//!
//! - SynthesisClient: 重试与凭证轮换
//! - ArtifactGenerator: 合成并保存单段音频
//! - SegmentBoard / GenerationScheduler: 片段状态与有界并发调度
//! - ArtifactMerger: 合并已保存的音频
//! - GenerationJob: 片段集合与运行控制
//! - SynthesisDefaults: 请求参数默认值与凭证解析

mod artifact_generator;
mod artifact_merger;
mod generation_job;
mod generation_scheduler;
mod segment_board;
mod synthesis_client;
mod synthesis_defaults;

pub use artifact_generator::{
    ArtifactGenerator, RenderError, SegmentRenderer, SEGMENT_ARTIFACT_PREFIX,
};
pub use artifact_merger::{ArtifactMergeError, ArtifactMerger, MergeOutcome, MERGED_ARTIFACT_PREFIX};
pub use generation_job::GenerationJob;
pub use generation_scheduler::{GenerationScheduler, RunSummary, DEFAULT_CONCURRENCY};
pub use segment_board::{BoardCounts, SegmentBoard};
pub use synthesis_client::{RetryPolicy, SynthesisClient};
pub use synthesis_defaults::{SegmentLengthPolicy, SynthesisDefaults};
