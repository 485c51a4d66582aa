//! Typed errors for calls to the hosted APIs.

use reqwest::StatusCode;

/// Failure talking to the embedding, completion, or vector index service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{service} API error {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned a {actual}-dimensional vector, expected {expected}")]
    DimensionMismatch {
        service: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl ApiError {
    /// Rate limits, server errors, and network failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ApiError::Transport { .. } => true,
            ApiError::Decode { .. } | ApiError::DimensionMismatch { .. } => false,
        }
    }

    pub(crate) fn decode(service: &'static str, message: impl Into<String>) -> Self {
        ApiError::Decode {
            service,
            message: message.into(),
        }
    }
}
