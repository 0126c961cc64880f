//! HTTP utilities for GCP REST API calls

use crate::dcl::error::{DclError, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncates long bodies and strips control characters before logging.
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pulls `error.message` out of a Google API error body, falling back to the
/// sanitized raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| sanitize_for_log(body))
}

/// HTTP client wrapper for GCP API calls. One request per call; retries live
/// in [`super::client::GcpClient`].
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    /// Sends one request and parses the JSON reply. Empty bodies become `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!("API error: {} - {}", status, sanitize_for_log(&text));
            let message = error_message(&text);
            return Err(match status {
                StatusCode::NOT_FOUND => DclError::NotFound {
                    url: url.to_string(),
                    message,
                },
                StatusCode::CONFLICT => DclError::Conflict {
                    url: url.to_string(),
                    message,
                },
                _ => DclError::Http {
                    operation: format!("{} {}", method, url),
                    status: status.as_u16(),
                    message,
                },
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Renders an error for the terminal. Known HTTP statuses get a short hint;
/// everything else is truncated.
pub fn format_error(error: &anyhow::Error) -> String {
    if let Some(dcl) = error.downcast_ref::<DclError>() {
        let hint = match dcl.status() {
            Some(401) => Some("Authentication failed. Run 'gcloud auth application-default login'."),
            Some(403) => Some("Permission denied. Check your GCP IAM permissions."),
            Some(429) => Some("Rate limit exceeded. Please try again later."),
            Some(500) | Some(503) => Some("GCP service temporarily unavailable. Please try again."),
            _ => None,
        };
        if let Some(hint) = hint {
            return format!("{} ({})", hint, dcl);
        }
    }
    if let Some(sds) = error.downcast_ref::<crate::sdsaas::SdsError>() {
        let hint = match sds.status() {
            Some(401) => Some("Authentication failed. Check SDSAAS_APIKEY or SDSAAS_BEARER_TOKEN."),
            Some(403) => Some("Permission denied. Check your IBM Cloud IAM access policies."),
            Some(429) => Some("Rate limit exceeded. Please try again later."),
            _ => None,
        };
        if let Some(hint) = hint {
            return format!("{} ({})", hint, sds);
        }
    }

    let error_str = format!("{:#}", error);
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(400)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(500);
        let out = sanitize_for_log(&long);
        assert!(out.starts_with(&"a".repeat(200)));
        assert!(out.contains("500 bytes total"));
        assert_eq!(sanitize_for_log("ok\nline"), "okline");
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":404,"message":"Lake not found","status":"NOT_FOUND"}}"#;
        assert_eq!(error_message(body), "Lake not found");
        assert_eq!(error_message("plain text"), "plain text");
    }

    #[test]
    fn test_format_error_hints() {
        let err = anyhow::Error::new(DclError::Http {
            operation: "GET u".into(),
            status: 403,
            message: "denied".into(),
        });
        assert!(format_error(&err).starts_with("Permission denied"));

        let err = anyhow::Error::new(crate::sdsaas::SdsError::from_response(401, "{}"));
        assert!(format_error(&err).starts_with("Authentication failed. Check SDSAAS"));

        let err = anyhow::anyhow!("something else");
        assert_eq!(format_error(&err), "something else");
    }
}
