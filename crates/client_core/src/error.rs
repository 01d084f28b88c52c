use shared::error::ValidationError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Submit,
}

impl Operation {
    pub fn method(self) -> &'static str {
        match self {
            Operation::Fetch => "GET",
            Operation::Submit => "POST",
        }
    }
}

/// Coarse grouping used by front ends to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Protocol,
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{} failed: {status} {body}", .operation.method())]
    Status {
        operation: Operation,
        status: u16,
        body: String,
    },
    #[error("malformed response body: {0}")]
    Decode(String),
    #[error("unexpected response format: expected a JSON array of messages")]
    UnexpectedShape,
    #[error("server unreachable: {0}")]
    Unreachable(String),
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Validation(_) => ErrorCategory::Validation,
            SyncError::Status { .. } | SyncError::Decode(_) | SyncError::UnexpectedShape => {
                ErrorCategory::Protocol
            }
            SyncError::Unreachable(_) => ErrorCategory::Unreachable,
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else {
            SyncError::Unreachable(err.to_string())
        }
    }
}
