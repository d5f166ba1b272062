//! Segment Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{ArtifactStoragePort, JobRegistryPort};
use crate::application::queries::segment_queries::*;
use crate::application::services::SegmentLengthPolicy;
use crate::domain::segment_text;

/// PreviewSegments Handler
pub struct PreviewSegmentsHandler {
    length_policy: SegmentLengthPolicy,
}

impl PreviewSegmentsHandler {
    pub fn new(length_policy: SegmentLengthPolicy) -> Self {
        Self { length_policy }
    }

    pub fn handle(
        &self,
        query: PreviewSegmentsQuery,
    ) -> Result<PreviewSegmentsResponse, ApplicationError> {
        if query.text.trim().is_empty() {
            return Err(ApplicationError::validation("Text is required"));
        }

        let segment_length = self.length_policy.resolve(query.segment_length);
        Ok(PreviewSegmentsResponse {
            segment_length,
            segments: segment_text(&query.text, segment_length),
        })
    }
}

/// GetJobStatus Handler
pub struct GetJobStatusHandler {
    registry: Arc<dyn JobRegistryPort>,
    storage: Arc<dyn ArtifactStoragePort>,
}

impl GetJobStatusHandler {
    pub fn new(registry: Arc<dyn JobRegistryPort>, storage: Arc<dyn ArtifactStoragePort>) -> Self {
        Self { registry, storage }
    }

    pub fn handle(&self, query: GetJobStatusQuery) -> Result<JobStatusResponse, ApplicationError> {
        let job = self
            .registry
            .get(query.job_id)
            .ok_or_else(|| ApplicationError::not_found("Job", query.job_id))?;

        let board = job.board();
        let segments = board
            .snapshot()
            .into_iter()
            .map(|segment| SegmentView {
                index: segment.index(),
                content: segment.content().to_string(),
                status: segment.status(),
                audio_url: segment
                    .audio()
                    .map(|a| self.storage.public_url(&a.audio_ref)),
                duration_secs: segment.audio().map(|a| a.duration_secs),
                error: segment.last_error().map(str::to_string),
            })
            .collect();

        Ok(JobStatusResponse {
            job_id: job.id(),
            running: job.is_running(),
            counts: board.counts(),
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_clamps_length() {
        let handler = PreviewSegmentsHandler::new(SegmentLengthPolicy::default());
        let text = format!("{}\n{}", "甲".repeat(45), "乙".repeat(45));

        let response = handler
            .handle(PreviewSegmentsQuery {
                text,
                segment_length: Some(1),
            })
            .unwrap();

        assert_eq!(response.segment_length, 50);
        assert_eq!(response.segments.len(), 2);
    }

    #[test]
    fn test_preview_requires_text() {
        let handler = PreviewSegmentsHandler::new(SegmentLengthPolicy::default());
        let result = handler.handle(PreviewSegmentsQuery {
            text: "  ".into(),
            segment_length: None,
        });
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }
}
