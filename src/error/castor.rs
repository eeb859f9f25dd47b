use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error as ThisError;

use super::IsRetryable;

#[derive(Debug, ThisError)]
pub enum CastorError {
    /// The job behind a status URL has not reached a terminal state yet.
    /// This is the only retryable classification.
    #[error("Job still in progress")]
    JobInProgress { progress: Option<String> },

    #[error("No Content-Location header found")]
    MissingStatusUrl,

    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Server error {code}: {message}")]
    Server {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),
}

impl IsRetryable for CastorError {
    fn is_retryable(&self) -> bool {
        matches!(self, CastorError::JobInProgress { .. })
    }
}

/// Structured error payload returned by the analytics server.
#[derive(Debug, Deserialize, Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_in_progress_is_retryable() {
        assert!(CastorError::JobInProgress { progress: None }.is_retryable());
        assert!(
            CastorError::JobInProgress {
                progress: Some("50% complete".to_string())
            }
            .is_retryable()
        );
        assert!(!CastorError::MissingStatusUrl.is_retryable());
        assert!(!CastorError::UpstreamStatus(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(
            !CastorError::Server {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "QUERY_FAILED".to_string(),
                message: "worker died".to_string(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn structured_error_body_parses_without_details() {
        let body: ApiErrorBody = serde_json::from_value(serde_json::json!({
            "error": { "code": "OVERLOADED", "message": "try again later" }
        }))
        .expect("parse error body");
        assert_eq!(body.inner.code, "OVERLOADED");
        assert_eq!(body.inner.message, "try again later");
        assert_eq!(body.inner.details, None);
    }
}
