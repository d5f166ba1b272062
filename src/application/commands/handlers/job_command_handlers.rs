//! Job Command Handlers

use std::sync::Arc;

use crate::application::commands::audio_commands::MergeAudioResponse;
use crate::application::commands::job_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ArtifactStoragePort, JobError, JobRegistryPort, SegmentEventPort, WorkItem,
};
use crate::application::services::{
    ArtifactMerger, GenerationJob, SegmentLengthPolicy, SynthesisDefaults,
};
use crate::domain::segment::{segments_from_text, SegmentStatus};

fn find_job(
    registry: &dyn JobRegistryPort,
    job_id: uuid::Uuid,
) -> Result<Arc<GenerationJob>, ApplicationError> {
    registry
        .get(job_id)
        .ok_or_else(|| ApplicationError::not_found("Job", job_id))
}

/// StartJob Handler - 分段、注册 job 并提交首次运行
pub struct StartJobHandler {
    registry: Arc<dyn JobRegistryPort>,
    events: Arc<dyn SegmentEventPort>,
    defaults: Arc<SynthesisDefaults>,
    length_policy: SegmentLengthPolicy,
}

impl StartJobHandler {
    pub fn new(
        registry: Arc<dyn JobRegistryPort>,
        events: Arc<dyn SegmentEventPort>,
        defaults: Arc<SynthesisDefaults>,
        length_policy: SegmentLengthPolicy,
    ) -> Self {
        Self {
            registry,
            events,
            defaults,
            length_policy,
        }
    }

    pub fn handle(&self, cmd: StartJobCommand) -> Result<StartJobResponse, ApplicationError> {
        if cmd.text.trim().is_empty() {
            return Err(ApplicationError::validation("Text is required"));
        }

        let credentials = self.defaults.resolve_credentials(cmd.api_key.as_deref())?;
        let params = self
            .defaults
            .resolve_params(cmd.voice, cmd.model, cmd.voice_profile)?;

        let segment_length = self.length_policy.resolve(cmd.segment_length);
        let segments = segments_from_text(&cmd.text, segment_length);
        let total_segments = segments.len();

        let job = Arc::new(GenerationJob::new(
            segments,
            params,
            credentials,
            self.events.clone(),
        ));
        let job_id = job.id();

        self.registry.register(job);
        if let Err(e) = self.registry.enqueue(WorkItem::Run { job_id }) {
            self.registry.remove(job_id);
            return Err(e.into());
        }

        tracing::info!(
            job_id = %job_id,
            total_segments,
            segment_length,
            "Generation job started"
        );

        Ok(StartJobResponse {
            job_id,
            total_segments,
            segment_length,
        })
    }
}

/// StopJob Handler - 取消当前运行
pub struct StopJobHandler {
    registry: Arc<dyn JobRegistryPort>,
}

impl StopJobHandler {
    pub fn new(registry: Arc<dyn JobRegistryPort>) -> Self {
        Self { registry }
    }

    pub fn handle(&self, cmd: StopJobCommand) -> Result<StopJobResponse, ApplicationError> {
        let job = find_job(self.registry.as_ref(), cmd.job_id)?;
        let was_running = job.stop();

        tracing::info!(job_id = %cmd.job_id, was_running, "Generation job stopped");

        Ok(StopJobResponse {
            job_id: cmd.job_id,
            was_running,
        })
    }
}

/// ResumeJob Handler - 重置失败片段并提交新的运行
pub struct ResumeJobHandler {
    registry: Arc<dyn JobRegistryPort>,
}

impl ResumeJobHandler {
    pub fn new(registry: Arc<dyn JobRegistryPort>) -> Self {
        Self { registry }
    }

    pub fn handle(&self, cmd: ResumeJobCommand) -> Result<ResumeJobResponse, ApplicationError> {
        let job = find_job(self.registry.as_ref(), cmd.job_id)?;
        if job.is_running() {
            return Err(JobError::RunActive(cmd.job_id).into());
        }

        let reset = job.board().reset_errors();
        let queued = !job.board().pending_indices().is_empty();
        if queued {
            job.prepare_run();
            self.registry.enqueue(WorkItem::Run { job_id: cmd.job_id })?;
        }

        tracing::info!(job_id = %cmd.job_id, reset, queued, "Generation job resumed");

        Ok(ResumeJobResponse {
            job_id: cmd.job_id,
            reset,
            queued,
        })
    }
}

/// RetrySegment Handler - 单片段重试
pub struct RetrySegmentHandler {
    registry: Arc<dyn JobRegistryPort>,
}

impl RetrySegmentHandler {
    pub fn new(registry: Arc<dyn JobRegistryPort>) -> Self {
        Self { registry }
    }

    pub fn handle(
        &self,
        cmd: RetrySegmentCommand,
    ) -> Result<RetrySegmentResponse, ApplicationError> {
        let job = find_job(self.registry.as_ref(), cmd.job_id)?;
        let segment = job.board().get(cmd.index).ok_or_else(|| {
            ApplicationError::validation(format!("Invalid segment index: {}", cmd.index))
        })?;
        if segment.status() == SegmentStatus::Generating {
            return Err(ApplicationError::invalid_state(format!(
                "Segment {} is generating",
                cmd.index
            )));
        }

        self.registry.enqueue(WorkItem::RetrySegment {
            job_id: cmd.job_id,
            index: cmd.index,
        })?;

        Ok(RetrySegmentResponse {
            job_id: cmd.job_id,
            index: cmd.index,
        })
    }
}

/// MergeJob Handler - 合并 ready 片段
pub struct MergeJobHandler {
    registry: Arc<dyn JobRegistryPort>,
    merger: Arc<ArtifactMerger>,
    storage: Arc<dyn ArtifactStoragePort>,
}

impl MergeJobHandler {
    pub fn new(
        registry: Arc<dyn JobRegistryPort>,
        merger: Arc<ArtifactMerger>,
        storage: Arc<dyn ArtifactStoragePort>,
    ) -> Self {
        Self {
            registry,
            merger,
            storage,
        }
    }

    pub async fn handle(&self, cmd: MergeJobCommand) -> Result<MergeAudioResponse, ApplicationError> {
        let job = find_job(self.registry.as_ref(), cmd.job_id)?;
        let outcome = self.merger.merge_segments(&job.board().snapshot()).await?;

        Ok(MergeAudioResponse {
            audio_url: self.storage.public_url(&outcome.audio_ref),
            audio_ref: outcome.audio_ref,
            merged_count: outcome.merged_count,
            skipped: outcome.skipped.iter().map(|r| r.to_string()).collect(),
            duration_secs: outcome.duration_secs,
        })
    }
}

/// CloseJob Handler - 取消一切并丢弃片段
pub struct CloseJobHandler {
    registry: Arc<dyn JobRegistryPort>,
}

impl CloseJobHandler {
    pub fn new(registry: Arc<dyn JobRegistryPort>) -> Self {
        Self { registry }
    }

    pub fn handle(&self, cmd: CloseJobCommand) -> Result<CloseJobResponse, ApplicationError> {
        let job = self
            .registry
            .remove(cmd.job_id)
            .ok_or_else(|| ApplicationError::not_found("Job", cmd.job_id))?;
        job.close();

        tracing::info!(job_id = %cmd.job_id, "Generation job closed");

        Ok(CloseJobResponse { job_id: cmd.job_id })
    }
}
