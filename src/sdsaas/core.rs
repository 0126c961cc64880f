//! Base service: URL, headers, authentication and retries shared by every
//! operation

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use super::auth::{env_prefix, Authenticator};
use super::error::{Result, SdsError};
use crate::dcl::config::RetryConfig;
use crate::dcl::retry::with_retry;

const DEFAULT_MAX_RETRIES: u32 = 4;
const DEFAULT_MAX_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Status, headers and raw body of a completed call.
#[derive(Debug, Clone)]
pub struct DetailedResponse {
    pub status_code: u16,
    pub headers: HeaderMap,
    /// Parsed JSON body; `None` for empty or non-JSON replies.
    pub result: Option<Value>,
    pub raw_result: Vec<u8>,
}

impl DetailedResponse {
    /// Deserializes the body into `T`, or `None` when the body was empty.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.result {
            None | Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
        }
    }
}

/// Request body variants.
#[derive(Debug, Clone)]
pub enum Body {
    Json(Value),
    /// JSON with an explicit content type such as `application/merge-patch+json`.
    JsonAs(&'static str, Value),
    Bytes(&'static str, Vec<u8>),
}

/// A request under construction. Mirrors what each operation needs:
/// path parameters, query parameters, extra headers and a body.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub operation_id: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Body>,
}

impl Request {
    /// `path` may contain `{name}` placeholders filled by [`Request::path_param`].
    pub fn new(method: Method, path: &str, operation_id: &'static str) -> Self {
        Self {
            method,
            path: path.to_string(),
            operation_id,
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn path_param(mut self, name: &str, value: &str) -> Self {
        self.path = self
            .path
            .replace(&format!("{{{name}}}"), &urlencoding::encode(value));
        self
    }

    pub fn query(mut self, name: &'static str, value: Option<impl ToString>) -> Self {
        if let Some(v) = value {
            self.query.push((name, v.to_string()));
        }
        self
    }

    pub fn headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }
}

/// `X-IBMCloud-SDK-Analytics` value for one operation.
pub fn sdk_analytics(service: &str, version: &str, operation_id: &str) -> String {
    format!("service_name={service};service_version={version};operation_id={operation_id}")
}

/// Shared HTTP plumbing for IBM-style REST services.
#[derive(Debug, Clone)]
pub struct BaseService {
    client: Client,
    service_url: String,
    authenticator: Authenticator,
    default_headers: HeaderMap,
    retry: Option<RetryConfig>,
}

impl BaseService {
    pub fn new(authenticator: Authenticator, service_url: Option<String>) -> Result<Self> {
        let user_agent = format!("dplx/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder().user_agent(user_agent).build()?;
        let mut service = Self {
            client,
            service_url: String::new(),
            authenticator,
            default_headers: HeaderMap::new(),
            retry: None,
        };
        if let Some(url) = service_url.filter(|u| !u.is_empty()) {
            service.set_service_url(&url)?;
        }
        Ok(service)
    }

    /// Applies `<SERVICE>_URL`, `<SERVICE>_ENABLE_RETRIES`,
    /// `<SERVICE>_MAX_RETRIES` and `<SERVICE>_RETRY_INTERVAL` (seconds).
    pub fn configure_service(&mut self, service_name: &str) -> Result<()> {
        self.configure_from(service_name, |key| std::env::var(key).ok())
    }

    pub(crate) fn configure_from<F>(&mut self, service_name: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = env_prefix(service_name);
        let get = |suffix: &str| lookup(&format!("{prefix}_{suffix}")).filter(|v| !v.is_empty());

        if let Some(url) = get("URL") {
            self.set_service_url(&url)?;
        }
        if get("ENABLE_RETRIES").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            let max_retries = get("MAX_RETRIES")
                .map(|v| {
                    v.parse::<u32>()
                        .map_err(|_| SdsError::Config(format!("{prefix}_MAX_RETRIES is not a number: {v}")))
                })
                .transpose()?
                .unwrap_or(0);
            let interval = get("RETRY_INTERVAL")
                .map(|v| {
                    v.parse::<u64>().map_err(|_| {
                        SdsError::Config(format!("{prefix}_RETRY_INTERVAL is not a number: {v}"))
                    })
                })
                .transpose()?
                .unwrap_or(0);
            self.enable_retries(max_retries, Duration::from_secs(interval));
        }
        Ok(())
    }

    pub fn set_service_url(&mut self, url: &str) -> Result<()> {
        let trimmed = url.trim_end_matches('/');
        url::Url::parse(trimmed)?;
        self.service_url = trimmed.to_string();
        Ok(())
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn set_default_headers(&mut self, headers: HeaderMap) {
        self.default_headers = headers;
    }

    /// Zero for either argument selects the default (4 retries, 30s).
    pub fn enable_retries(&mut self, max_retries: u32, max_retry_interval: Duration) {
        let max_retries = if max_retries == 0 {
            DEFAULT_MAX_RETRIES
        } else {
            max_retries
        };
        let interval = if max_retry_interval.is_zero() {
            DEFAULT_MAX_RETRY_INTERVAL
        } else {
            max_retry_interval
        };
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.retry = Some(RetryConfig {
            max_attempts: max_retries + 1,
            initial_backoff_ms: 1_000.min(interval_ms),
            max_backoff_ms: interval_ms,
            ..RetryConfig::default()
        });
    }

    pub fn disable_retries(&mut self) {
        self.retry = None;
    }

    pub fn retries_enabled(&self) -> bool {
        self.retry.is_some()
    }

    /// Sends `req`, retrying when enabled, and returns the detailed response.
    pub async fn request(&self, req: Request, service: &str, version: &str) -> Result<DetailedResponse> {
        if self.service_url.is_empty() {
            return Err(SdsError::Config("service URL is not set".to_string()));
        }
        let what = format!("{} {}", req.method, req.path);
        match &self.retry {
            Some(retry) => with_retry(retry, &what, || self.send_once(&req, service, version)).await,
            None => self.send_once(&req, service, version).await,
        }
    }

    async fn send_once(&self, req: &Request, service: &str, version: &str) -> Result<DetailedResponse> {
        let url = format!("{}{}", self.service_url, req.path);
        tracing::debug!("{} {}", req.method, url);

        let mut builder = self
            .client
            .request(req.method.clone(), &url)
            .headers(self.default_headers.clone())
            .header(ACCEPT, "application/json")
            .header(
                "X-IBMCloud-SDK-Analytics",
                sdk_analytics(service, version, req.operation_id),
            );
        for (name, value) in &req.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SdsError::Validation(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SdsError::Validation(format!("invalid header value: {e}")))?;
            builder = builder.header(name, value);
        }
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        builder = match &req.body {
            None => builder,
            Some(Body::Json(v)) => builder.header(CONTENT_TYPE, "application/json").body(serde_json::to_vec(v)?),
            Some(Body::JsonAs(content_type, v)) => builder
                .header(CONTENT_TYPE, *content_type)
                .body(serde_json::to_vec(v)?),
            Some(Body::Bytes(content_type, bytes)) => builder
                .header(CONTENT_TYPE, *content_type)
                .body(bytes.clone()),
        };
        builder = self.authenticator.authenticate(builder).await?;

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let raw = response.bytes().await?.to_vec();

        if !status.is_success() {
            let text = String::from_utf8_lossy(&raw);
            tracing::debug!("API error: {} - {}", status, crate::gcp::http::sanitize_for_log(&text));
            return Err(SdsError::from_response(status.as_u16(), &text));
        }

        let result = if raw.is_empty() || status == StatusCode::NO_CONTENT {
            None
        } else {
            serde_json::from_slice(&raw).ok()
        };
        Ok(DetailedResponse {
            status_code: status.as_u16(),
            headers,
            result,
            raw_result: raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_fills_path_and_query() {
        let req = Request::new(Method::DELETE, "/hosts/{host_id}/volumes/{volume_id}", "HostVolDelete")
            .path_param("host_id", "h 1")
            .path_param("volume_id", "v1")
            .query("limit", Some(10))
            .query("name", None::<String>);
        assert_eq!(req.path, "/hosts/h%201/volumes/v1");
        assert_eq!(req.query, vec![("limit", "10".to_string())]);
    }

    #[test]
    fn test_enable_retries_defaults() {
        let mut svc = BaseService::new(Authenticator::NoAuth, Some("https://sds.example.com/".into())).unwrap();
        assert_eq!(svc.service_url(), "https://sds.example.com");
        assert!(!svc.retries_enabled());

        svc.enable_retries(0, Duration::ZERO);
        let retry = svc.retry.clone().unwrap();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.max_backoff_ms, 30_000);

        svc.disable_retries();
        assert!(!svc.retries_enabled());
    }

    #[test]
    fn test_configure_from_environment() {
        let mut svc = BaseService::new(Authenticator::NoAuth, None).unwrap();
        let vars = |key: &str| match key {
            "SDSAAS_URL" => Some("http://localhost:8080".to_string()),
            "SDSAAS_ENABLE_RETRIES" => Some("true".to_string()),
            "SDSAAS_MAX_RETRIES" => Some("2".to_string()),
            _ => None,
        };
        svc.configure_from("sdsaas", vars).unwrap();
        assert_eq!(svc.service_url(), "http://localhost:8080");
        assert_eq!(svc.retry.as_ref().unwrap().max_attempts, 3);

        let bad = |key: &str| (key == "SDSAAS_URL").then(|| "not a url".to_string());
        assert!(svc.configure_from("sdsaas", bad).is_err());
    }

    #[test]
    fn test_sdk_analytics() {
        assert_eq!(
            sdk_analytics("sdsaas", "V1", "Volumes"),
            "service_name=sdsaas;service_version=V1;operation_id=Volumes"
        );
    }
}
