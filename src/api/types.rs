use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::verb::ReplyStatus;

/// Errors that can occur while talking to the site.
/// Every variant is local to the one widget that issued the request.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Network-level failure (DNS, connection refused, reset). Retryable.
    Network(String),
    /// The site answered with a non-success HTTP status.
    Api { status: u16, message: String },
    /// The reply body wasn't the JSON shape we expect.
    Parse(String),
    /// No reply within the configured request timeout.
    Timeout,
    /// The request was aborted before it completed.
    Cancelled,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Api { status, message } => {
                write!(f, "site error (HTTP {status}): {message}")
            }
            ApiError::Parse(msg) => write!(f, "parse error: {msg}"),
            ApiError::Timeout => write!(f, "request timed out"),
            ApiError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for ApiError {}

/// JSON body of every `/api/...` endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StatusReply {
    pub status: String,
}

impl StatusReply {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }

    pub fn parsed(&self) -> ReplyStatus {
        ReplyStatus::parse(&self.status)
    }
}

/// A completed request's payload: JSON status for actions, raw HTML otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Status(StatusReply),
    Html(String),
}
