//! Long-running operation polling

use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use super::config::ClientConfig;
use super::error::{DclError, Result};
use crate::gcp::client::GcpClient;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OperationError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// A `google.longrunning.Operation`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl Operation {
    /// Parses an operation body. An empty body counts as already finished.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self {
                done: true,
                ..Self::default()
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// The resource the operation returned, when it returned one.
    pub fn first_response(&self) -> Option<&Map<String, Value>> {
        self.response.as_ref().filter(|r| !r.is_empty())
    }

    fn finish(self) -> Result<Self> {
        match self.error {
            Some(ref e) if e.code != 0 || !e.message.is_empty() => Err(DclError::OperationFailed {
                name: self.name.clone(),
                code: e.code,
                message: e.message.clone(),
            }),
            _ => Ok(self),
        }
    }

    /// Polls `GET <base_path><name>` until `done`, doubling the delay up to
    /// the configured cap.
    pub async fn wait(mut self, client: &GcpClient, base_path: &str, config: &ClientConfig) -> Result<Self> {
        let mut delay = config.poll_interval;
        let mut polls = 0u32;
        loop {
            if self.done {
                tracing::debug!("operation {} done after {} polls", self.name, polls);
                return self.finish();
            }
            if self.name.is_empty() {
                return Err(DclError::InvalidResponse(
                    "operation is not done and has no name to poll".to_string(),
                ));
            }

            tokio::time::sleep(delay).await;
            delay = next_delay(delay, config.max_poll_interval);
            polls += 1;

            let url = format!("{}{}", base_path, self.name);
            tracing::debug!("polling operation {} (attempt {})", self.name, polls);
            self = Operation::from_value(client.get(&url).await?)?;
        }
    }
}

fn next_delay(current: Duration, cap: Duration) -> Duration {
    let doubled = current.saturating_mul(2);
    if doubled.is_zero() {
        return current;
    }
    doubled.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_body_is_done() {
        let op = Operation::from_value(Value::Null).unwrap();
        assert!(op.done);
        assert!(op.first_response().is_none());
    }

    #[test]
    fn test_finish_maps_error() {
        let op = Operation::from_value(json!({
            "name": "projects/p/locations/l/operations/op1",
            "done": true,
            "error": {"code": 9, "message": "precondition failed"}
        }))
        .unwrap();
        match op.finish() {
            Err(DclError::OperationFailed { code, message, .. }) => {
                assert_eq!(code, 9);
                assert_eq!(message, "precondition failed");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_first_response() {
        let op = Operation::from_value(json!({
            "name": "op",
            "done": true,
            "response": {"name": "projects/p/locations/l/lakes/x", "uid": "u"}
        }))
        .unwrap();
        assert_eq!(op.first_response().unwrap()["uid"], "u");
    }

    #[test]
    fn test_next_delay_caps() {
        let cap = Duration::from_secs(5);
        assert_eq!(next_delay(Duration::from_secs(1), cap), Duration::from_secs(2));
        assert_eq!(next_delay(Duration::from_secs(4), cap), cap);
        assert_eq!(next_delay(Duration::ZERO, cap), Duration::ZERO);
    }
}
