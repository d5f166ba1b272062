//! HTTP Error Handling
//!
//! 业务错误统一以 HTTP 200 + `{errno, error, data}` 返回

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Conflict(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::Conflict(_) => errno::CONFLICT,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Internal(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let msg = self.message();
        match &self {
            ApiError::NotFound(_) => {
                tracing::warn!(errno, error = %msg, "Resource not found")
            }
            ApiError::BadRequest(_) => tracing::warn!(errno, error = %msg, "Bad request"),
            ApiError::Conflict(_) => tracing::warn!(errno, error = %msg, "Resource conflict"),
            ApiError::Internal(_) => {
                tracing::error!(errno, error = %msg, "Internal server error")
            }
            ApiError::ServiceUnavailable(_) => {
                tracing::error!(errno, error = %msg, "Service unavailable")
            }
        }

        (StatusCode::OK, Json(ErrorResponse::new(errno, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::InvalidState(msg) => ApiError::Conflict(msg),
            ApplicationError::SynthesisFailed { message, .. } => {
                ApiError::ServiceUnavailable(message)
            }
            ApplicationError::NothingToMerge(msg) => ApiError::BadRequest(msg),
            ApplicationError::MergeFailed(msg) => ApiError::Internal(msg),
            ApplicationError::StorageError(msg) => ApiError::Internal(msg),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::FailureKind;
    use uuid::Uuid;

    #[test]
    fn test_application_error_mapping() {
        let cases = [
            (ApplicationError::not_found("Job", Uuid::nil()), errno::NOT_FOUND),
            (ApplicationError::validation("No API Key provided"), errno::BAD_REQUEST),
            (ApplicationError::invalid_state("running"), errno::CONFLICT),
            (
                ApplicationError::SynthesisFailed {
                    kind: FailureKind::Timeout,
                    message: FailureKind::Timeout.user_message().to_string(),
                },
                errno::SERVICE_UNAVAILABLE,
            ),
            (ApplicationError::NothingToMerge("none".into()), errno::BAD_REQUEST),
            (ApplicationError::internal("boom"), errno::INTERNAL_ERROR),
        ];

        for (app_err, expected) in cases {
            assert_eq!(ApiError::from(app_err).errno(), expected);
        }
    }

    #[test]
    fn test_user_message_is_passed_through() {
        let err = ApiError::from(ApplicationError::validation("No API Key provided"));
        assert_eq!(err.message(), "No API Key provided");

        let err = ApiError::from(ApplicationError::SynthesisFailed {
            kind: FailureKind::QuotaExceeded,
            message: FailureKind::QuotaExceeded.user_message().to_string(),
        });
        assert_eq!(err.message(), FailureKind::QuotaExceeded.user_message());
    }
}
