use std::time::Duration;

use rail_core::ValidationError;
use serde::Serialize;
use thiserror::Error;

/// Machine-readable error category reported to tool callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TransportError,
    TimeoutError,
    UpstreamGraphqlError,
    ValidationError,
    NotFound,
}

/// Everything that can go wrong between a tool call and the upstream API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RailError {
    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream did not answer within {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("upstream GraphQL error: {0}")]
    Graphql(String),

    #[error("upstream response did not match the expected shape: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("no place found matching {0:?}")]
    NotFound(String),
}

impl RailError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::TransportError,
            Self::Timeout(_) => ErrorKind::TimeoutError,
            Self::Graphql(_) => ErrorKind::UpstreamGraphqlError,
            Self::Validation(_) | Self::InvalidArguments(_) => ErrorKind::ValidationError,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// The `{kind, message}` value handed back as a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}
