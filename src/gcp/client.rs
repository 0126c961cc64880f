//! GCP Client
//!
//! Combines authentication, the HTTP wrapper and request retries.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use crate::dcl::config::{ClientConfig, RetryConfig};
use crate::dcl::error::Result;
use crate::dcl::retry::with_retry;
use reqwest::Method;
use serde_json::Value;

#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    retry: RetryConfig,
}

impl GcpClient {
    /// Client authenticated through Application Default Credentials.
    pub async fn new(config: &ClientConfig) -> Result<Self> {
        let credentials = GcpCredentials::new().await?;
        Self::with_credentials(credentials, config)
    }

    pub fn with_credentials(credentials: GcpCredentials, config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            credentials,
            http: GcpHttpClient::new(&config.user_agent)?,
            retry: config.retry.clone(),
        })
    }

    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    async fn request(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let what = format!("{} {}", method, url);
        with_retry(&self.retry, &what, move || {
            let method = method.clone();
            async move {
                let token = self.get_token().await?;
                match self.http.send(method.clone(), url, &token, body).await {
                    Err(e) if e.status() == Some(401) => {
                        tracing::debug!("Token rejected, refreshing");
                        let token = self.credentials.refresh_token().await?;
                        self.http.send(method, url, &token, body).await
                    }
                    other => other,
                }
            }
        })
        .await
    }

    pub async fn get(&self, url: &str) -> Result<Value> {
        self.request(Method::GET, url, None).await
    }

    pub async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, url, Some(body)).await
    }

    pub async fn patch(&self, url: &str, body: &Value) -> Result<Value> {
        self.request(Method::PATCH, url, Some(body)).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value> {
        self.request(Method::DELETE, url, None).await
    }
}
