//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod artifact_storage;
mod job_registry;
mod segment_events;
mod speech_api;

pub use artifact_storage::{sanitize_artifact_name, ArtifactStoragePort, StorageError};
pub use job_registry::{JobError, JobRegistryPort, WorkItem};
pub use segment_events::{NoopEvents, SegmentEvent, SegmentEventPort};
pub use speech_api::{
    truncate_message, FailureKind, RejectionKind, SpeechApiPort, SpeechAudio, SpeechRequest,
    SynthesisError,
};
