//! Authenticators for IBM Cloud APIs

use chrono::Utc;
use reqwest::RequestBuilder;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::{Result, SdsError};

/// Default IAM endpoint for API key exchange.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

#[derive(Debug, Clone, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
    /// Unix seconds.
    #[serde(default)]
    expiration: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: i64,
}

impl CachedToken {
    /// Refreshes once 80% of the token lifetime has passed.
    fn from_response(resp: IamTokenResponse, now: i64) -> Self {
        let expiration = if resp.expiration > 0 {
            resp.expiration
        } else {
            now + resp.expires_in
        };
        let lifetime = if resp.expires_in > 0 {
            resp.expires_in
        } else {
            (expiration - now).max(0)
        };
        Self {
            access_token: resp.access_token,
            refresh_at: expiration - lifetime / 5,
        }
    }

    fn is_fresh(&self, now: i64) -> bool {
        now < self.refresh_at
    }
}

/// Exchanges an API key for IAM access tokens and caches them.
#[derive(Clone)]
pub struct IamAuthenticator {
    api_key: String,
    url: String,
    client: reqwest::Client,
    cache: Arc<Mutex<Option<CachedToken>>>,
}

impl std::fmt::Debug for IamAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamAuthenticator")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl IamAuthenticator {
    pub fn new(api_key: impl Into<String>, url: Option<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SdsError::Config("IAM authenticator requires an API key".to_string()));
        }
        let url = url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_IAM_URL.to_string());
        Ok(Self {
            api_key,
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            cache: Arc::new(Mutex::new(None)),
        })
    }

    /// Returns a cached token, fetching a new one when it is close to expiry.
    pub async fn token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now().timestamp();
        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh(now)) {
            return Ok(cached.access_token.clone());
        }

        tracing::debug!("Requesting IAM token from {}", self.url);
        let response = self
            .client
            .post(format!("{}/identity/token", self.url))
            .header("Accept", "application/json")
            .form(&[("grant_type", IAM_GRANT_TYPE), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SdsError::Auth(format!(
                "IAM token request failed with HTTP {}: {}",
                status.as_u16(),
                crate::gcp::http::sanitize_for_log(&body)
            )));
        }

        let token: IamTokenResponse = response.json().await?;
        let cached = CachedToken::from_response(token, now);
        let access_token = cached.access_token.clone();
        *cache = Some(cached);
        Ok(access_token)
    }
}

/// How requests are authenticated.
#[derive(Debug, Clone)]
pub enum Authenticator {
    NoAuth,
    BearerToken(String),
    Iam(IamAuthenticator),
}

impl Authenticator {
    /// Reads `<SERVICE>_AUTH_TYPE`, `<SERVICE>_APIKEY`,
    /// `<SERVICE>_BEARER_TOKEN` and `<SERVICE>_AUTH_URL`. When no auth type is
    /// given, an API key selects IAM.
    pub fn from_environment(service_name: &str) -> Result<Self> {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(service_name: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = env_prefix(service_name);
        let get = |suffix: &str| lookup(&format!("{prefix}_{suffix}")).filter(|v| !v.is_empty());

        let auth_type = get("AUTH_TYPE").map(|t| t.to_ascii_lowercase());
        match auth_type.as_deref() {
            Some("noauth") => Ok(Authenticator::NoAuth),
            Some("bearertoken") => get("BEARER_TOKEN")
                .map(Authenticator::BearerToken)
                .ok_or_else(|| SdsError::Config(format!("{prefix}_BEARER_TOKEN is not set"))),
            Some("iam") | None => match get("APIKEY") {
                Some(key) => Ok(Authenticator::Iam(IamAuthenticator::new(key, get("AUTH_URL"))?)),
                None if auth_type.is_none() => Err(SdsError::Config(format!(
                    "no authentication configured; set {prefix}_AUTH_TYPE or {prefix}_APIKEY"
                ))),
                None => Err(SdsError::Config(format!("{prefix}_APIKEY is not set"))),
            },
            Some(other) => Err(SdsError::Config(format!("unsupported auth type: {other}"))),
        }
    }

    /// Adds the `Authorization` header, if any.
    pub async fn authenticate(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self {
            Authenticator::NoAuth => request,
            Authenticator::BearerToken(token) => request.bearer_auth(token),
            Authenticator::Iam(iam) => request.bearer_auth(iam.token().await?),
        })
    }
}

/// `sdsaas` -> `SDSAAS`, `my-service` -> `MY_SERVICE`.
pub(crate) fn env_prefix(service_name: &str) -> String {
    service_name.to_ascii_uppercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_variants() {
        let auth = Authenticator::from_lookup("sdsaas", lookup(&[("SDSAAS_AUTH_TYPE", "noauth")])).unwrap();
        assert!(matches!(auth, Authenticator::NoAuth));

        let auth = Authenticator::from_lookup(
            "sdsaas",
            lookup(&[("SDSAAS_AUTH_TYPE", "bearerToken"), ("SDSAAS_BEARER_TOKEN", "tok")]),
        )
        .unwrap();
        assert!(matches!(auth, Authenticator::BearerToken(t) if t == "tok"));

        let auth = Authenticator::from_lookup("sdsaas", lookup(&[("SDSAAS_APIKEY", "key")])).unwrap();
        assert!(matches!(auth, Authenticator::Iam(_)));
    }

    #[test]
    fn test_from_lookup_errors() {
        assert!(matches!(
            Authenticator::from_lookup("sdsaas", lookup(&[])),
            Err(SdsError::Config(_))
        ));
        assert!(matches!(
            Authenticator::from_lookup("sdsaas", lookup(&[("SDSAAS_AUTH_TYPE", "bearertoken")])),
            Err(SdsError::Config(_))
        ));
        assert!(matches!(
            Authenticator::from_lookup("sdsaas", lookup(&[("SDSAAS_AUTH_TYPE", "basic")])),
            Err(SdsError::Config(_))
        ));
    }

    #[test]
    fn test_token_refresh_window() {
        let cached = CachedToken::from_response(
            IamTokenResponse {
                access_token: "t".into(),
                expires_in: 3600,
                expiration: 10_000,
            },
            6_400,
        );
        assert_eq!(cached.refresh_at, 10_000 - 720);
        assert!(cached.is_fresh(9_000));
        assert!(!cached.is_fresh(9_300));
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(env_prefix("sdsaas"), "SDSAAS");
        assert_eq!(env_prefix("my-svc"), "MY_SVC");
    }
}
