//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::services::SegmentRenderer;
use crate::application::{
    // Command handlers
    CloseJobHandler, GenerateAudioHandler, MergeAudioHandler, MergeJobHandler, ResumeJobHandler,
    RetrySegmentHandler, StartJobHandler, StopJobHandler,
    // Query handlers
    GetJobStatusHandler, PreviewSegmentsHandler,
    // Ports
    ArtifactStoragePort, JobRegistryPort,
    // Services
    ArtifactMerger, SegmentLengthPolicy, SynthesisDefaults,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub registry: Arc<dyn JobRegistryPort>,
    pub storage: Arc<dyn ArtifactStoragePort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub generate_audio_handler: GenerateAudioHandler,
    pub merge_audio_handler: MergeAudioHandler,
    pub start_job_handler: StartJobHandler,
    pub stop_job_handler: StopJobHandler,
    pub resume_job_handler: ResumeJobHandler,
    pub retry_segment_handler: RetrySegmentHandler,
    pub merge_job_handler: MergeJobHandler,
    pub close_job_handler: CloseJobHandler,

    // ========== Query Handlers ==========
    pub preview_segments_handler: PreviewSegmentsHandler,
    pub job_status_handler: GetJobStatusHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        renderer: Arc<dyn SegmentRenderer>,
        storage: Arc<dyn ArtifactStoragePort>,
        registry: Arc<dyn JobRegistryPort>,
        event_publisher: Arc<EventPublisher>,
        defaults: Arc<SynthesisDefaults>,
        length_policy: SegmentLengthPolicy,
    ) -> Self {
        let merger = Arc::new(ArtifactMerger::new(storage.clone()));

        Self {
            // Ports
            registry: registry.clone(),
            storage: storage.clone(),
            event_publisher: event_publisher.clone(),

            // Command handlers
            generate_audio_handler: GenerateAudioHandler::new(
                renderer,
                storage.clone(),
                defaults.clone(),
            ),
            merge_audio_handler: MergeAudioHandler::new(merger.clone(), storage.clone()),
            start_job_handler: StartJobHandler::new(
                registry.clone(),
                event_publisher,
                defaults,
                length_policy,
            ),
            stop_job_handler: StopJobHandler::new(registry.clone()),
            resume_job_handler: ResumeJobHandler::new(registry.clone()),
            retry_segment_handler: RetrySegmentHandler::new(registry.clone()),
            merge_job_handler: MergeJobHandler::new(registry.clone(), merger, storage.clone()),
            close_job_handler: CloseJobHandler::new(registry.clone()),

            // Query handlers
            preview_segments_handler: PreviewSegmentsHandler::new(length_policy),
            job_status_handler: GetJobStatusHandler::new(registry, storage),
        }
    }
}
