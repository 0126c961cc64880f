//! Error types for the declarative client

use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the Dataplex client.
pub type Result<T> = std::result::Result<T, DclError>;

/// Errors surfaced by Get/Apply/Delete/List calls.
#[derive(Error, Debug)]
pub enum DclError {
    /// An enum field holds a value outside its allow-list.
    #[error("invalid value {value:?} for enum {enum_name}")]
    InvalidEnum { enum_name: &'static str, value: String },

    /// A required resource field is unset.
    #[error("required field {field:?} is missing on {resource}")]
    RequiredField { resource: &'static str, field: &'static str },

    /// A required identity parameter (project, location, ...) is unset.
    #[error("required parameter {0} is missing")]
    RequiredParameter(&'static str),

    /// The API answered 404.
    #[error("resource not found: {message}")]
    NotFound { url: String, message: String },

    /// The API answered 409.
    #[error("conflict: {message}")]
    Conflict { url: String, message: String },

    /// Any other non-success HTTP status.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Http {
        operation: String,
        status: u16,
        message: String,
    },

    /// Apply cannot reach the desired state without recreating the resource,
    /// or a lifecycle parameter blocked it.
    #[error("apply infeasible: {0}")]
    ApplyInfeasible(String),

    /// Operations completed but the backend state still differs.
    #[error("diffs remain after apply: {}", .diffs.join("; "))]
    DiffAfterApply { diffs: Vec<String> },

    /// A long-running operation finished with an error status.
    #[error("operation {name} failed with code {code}: {message}")]
    OperationFailed {
        name: String,
        code: i64,
        message: String,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// The API returned a body that cannot be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("no such operation with name: {0}")]
    UnknownOperation(String),

    /// One or more deletions failed during a bulk delete.
    #[error("{0}")]
    DeleteAll(String),

    #[error("authentication failed: {0}")]
    Auth(#[from] gcp_auth::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl DclError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DclError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DclError::Conflict { .. })
    }

    /// Whether the HTTP layer should resend the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            DclError::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            DclError::Transport(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DclError::NotFound { .. } => Some(404),
            DclError::Conflict { .. } => Some(409),
            DclError::Http { status, .. } => Some(*status),
            DclError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        let nf = DclError::NotFound {
            url: "u".into(),
            message: "gone".into(),
        };
        assert!(nf.is_not_found());
        assert!(!nf.is_conflict());
        assert_eq!(nf.status(), Some(404));

        let busy = DclError::Http {
            operation: "GET".into(),
            status: 503,
            message: "unavailable".into(),
        };
        assert!(busy.is_retryable());

        let bad = DclError::Http {
            operation: "GET".into(),
            status: 400,
            message: "bad".into(),
        };
        assert!(!bad.is_retryable());
    }

    #[test]
    fn test_diff_after_apply_message() {
        let err = DclError::DiffAfterApply {
            diffs: vec!["displayName".into(), "labels".into()],
        };
        assert_eq!(err.to_string(), "diffs remain after apply: displayName; labels");
    }
}
