//! Errors from the storage-as-a-service client

use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SdsError>;

#[derive(Error, Debug)]
pub enum SdsError {
    /// Options failed validation before any request was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Non-2xx reply. `errors` holds the `errors[].message` entries of the
    /// body when present.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        errors: Vec<String>,
        trace: Option<String>,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Missing or inconsistent external configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SdsError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SdsError::Http { status, .. } => Some(*status),
            SdsError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Builds an [`SdsError::Http`] from an IBM error body:
    /// `{"errors": [{"code", "message"}], "trace": "..."}`.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let errors: Vec<String> = parsed
            .as_ref()
            .and_then(|v| v.get("errors"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let message = errors
            .first()
            .cloned()
            .or_else(|| {
                parsed.as_ref().and_then(|v| {
                    ["message", "error", "errorMessage"]
                        .iter()
                        .find_map(|k| v.get(*k).and_then(Value::as_str))
                        .map(str::to_string)
                })
            })
            .unwrap_or_else(|| crate::gcp::http::sanitize_for_log(body));
        let trace = parsed
            .as_ref()
            .and_then(|v| v.get("trace"))
            .and_then(Value::as_str)
            .map(str::to_string);

        SdsError::Http {
            status,
            message,
            errors,
            trace,
        }
    }
}

impl crate::dcl::retry::Retryable for SdsError {
    /// 429 and 5xx other than 501, plus connect and timeout failures.
    fn is_retryable(&self) -> bool {
        match self {
            SdsError::Http { status, .. } => *status == 429 || (*status >= 500 && *status != 501),
            SdsError::Transport(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcl::retry::Retryable;

    #[test]
    fn test_from_response_parses_ibm_errors() {
        let body = r#"{"errors":[{"code":"not_found","message":"Volume not found"}],"trace":"abc-123"}"#;
        match SdsError::from_response(404, body) {
            SdsError::Http {
                status,
                message,
                errors,
                trace,
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Volume not found");
                assert_eq!(errors, vec!["Volume not found".to_string()]);
                assert_eq!(trace.as_deref(), Some("abc-123"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_from_response_plain_body() {
        let err = SdsError::from_response(502, "bad gateway");
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
        assert!(err.is_retryable());
        assert!(!SdsError::from_response(501, "").is_retryable());
        assert!(!SdsError::from_response(400, "{}").is_retryable());
    }
}
