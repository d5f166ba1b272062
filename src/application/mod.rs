//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeechApi、ArtifactStorage、SegmentEvent、JobRegistry）
//! - services: 合成重试、调度、合并等核心服务
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

// Re-exports
pub use commands::{
    // Audio commands
    GenerateAudioCommand,
    GenerateAudioResponse,
    MergeAudioCommand,
    MergeAudioResponse,
    // Job commands
    CloseJobCommand,
    CloseJobResponse,
    MergeJobCommand,
    ResumeJobCommand,
    ResumeJobResponse,
    RetrySegmentCommand,
    RetrySegmentResponse,
    StartJobCommand,
    StartJobResponse,
    StopJobCommand,
    StopJobResponse,
    // Handlers
    handlers::{
        CloseJobHandler, GenerateAudioHandler, MergeAudioHandler, MergeJobHandler,
        ResumeJobHandler, RetrySegmentHandler, StartJobHandler, StopJobHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Artifact storage
    sanitize_artifact_name,
    ArtifactStoragePort,
    StorageError,
    // Job registry
    JobError,
    JobRegistryPort,
    WorkItem,
    // Segment events
    SegmentEvent,
    SegmentEventPort,
    // Speech API
    FailureKind,
    SpeechApiPort,
    SpeechAudio,
    SpeechRequest,
    SynthesisError,
};

pub use queries::{
    GetJobStatusQuery,
    JobStatusResponse,
    PreviewSegmentsQuery,
    PreviewSegmentsResponse,
    SegmentView,
    // Handlers
    handlers::{GetJobStatusHandler, PreviewSegmentsHandler},
};

pub use services::{
    ArtifactGenerator, ArtifactMerger, GenerationJob, GenerationScheduler, RetryPolicy,
    RunSummary, SegmentLengthPolicy, SegmentRenderer, SynthesisClient, SynthesisDefaults,
};
