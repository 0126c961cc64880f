//! Typed client for the sdsaas v1 API (block volumes, hosts, object storage
//! credentials and certificates)

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use super::auth::Authenticator;
use super::core::{BaseService, Body, DetailedResponse, Request};
use super::error::{Result, SdsError};
use super::models::{
    CertificateFound, CertificateUpdated, CredentialsFound, CredentialsUpdated, Host,
    HostCollection, Volume, VolumeCollection, VolumeMappingIdentity,
};

/// Key used to find external configuration.
pub const DEFAULT_SERVICE_NAME: &str = "sdsaas";

const SERVICE_VERSION: &str = "V1";
const MERGE_PATCH: &str = "application/merge-patch+json";
// The API expects this spelling.
const OCTET_STREAM: &str = "application/octect-stream";

#[derive(Debug, Clone, Default)]
pub struct SdsaasV1Options {
    /// Defaults to [`DEFAULT_SERVICE_NAME`].
    pub service_name: Option<String>,
    pub url: Option<String>,
    /// Read from the environment when `None` and built with
    /// [`SdsaasV1::from_external_config`].
    pub authenticator: Option<Authenticator>,
}

/// Client for the sdsaas v1 API.
#[derive(Debug, Clone)]
pub struct SdsaasV1 {
    service: BaseService,
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(SdsError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

macro_rules! options {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $field:ident : $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            $($(#[$fmeta])* pub $field: $ty,)*
            /// Extra headers sent with this request only.
            pub headers: BTreeMap<String, String>,
        }

        impl $name {
            pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
                self.headers.insert(name.into(), value.into());
                self
            }
        }
    };
}

options!(VolumesOptions {
    /// Maximum number of results per page.
    limit: Option<i64>,
    /// Filters the collection to volumes with this name.
    name: Option<String>,
});

options!(VolumeCreateOptions {
    /// Capacity in gigabytes.
    capacity: i64,
    name: Option<String>,
    /// NQN of a host to map the new volume to.
    hostnqnstring: Option<String>,
});

options!(VolumeOptions { volume_id: String });
options!(VolumeDeleteOptions { volume_id: String });

options!(VolumeUpdateOptions {
    volume_id: String,
    /// Built with [`super::models::VolumePatch::as_patch`].
    volume_patch: Map<String, Value>,
});

options!(CredsOptions {});
options!(CredCreateOptions { access_key: String });
options!(CredDeleteOptions { access_key: String });
options!(CertOptions {});

options!(CertUploadOptions {
    /// PEM bundle holding the certificate and its key.
    body: Vec<u8>,
});

options!(HostsOptions {
    limit: Option<i64>,
    name: Option<String>,
});

options!(HostCreateOptions {
    nqn: String,
    name: Option<String>,
    volumes: Vec<VolumeMappingIdentity>,
});

options!(HostOptions { host_id: String });

options!(HostUpdateOptions {
    host_id: String,
    /// Built with [`super::models::HostPatch::as_patch`].
    host_patch: Map<String, Value>,
});

options!(HostDeleteOptions { host_id: String });
options!(HostVolDeleteallOptions { host_id: String });
options!(HostVolDeleteOptions { host_id: String, volume_id: String });
options!(HostVolUpdateOptions { host_id: String, volume_id: String });

impl VolumeOptions {
    pub fn new(volume_id: impl Into<String>) -> Self {
        Self {
            volume_id: volume_id.into(),
            ..Default::default()
        }
    }
}

impl VolumeDeleteOptions {
    pub fn new(volume_id: impl Into<String>) -> Self {
        Self {
            volume_id: volume_id.into(),
            ..Default::default()
        }
    }
}

impl VolumeCreateOptions {
    pub fn new(capacity: i64) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }
}

impl CredCreateOptions {
    pub fn new(access_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            ..Default::default()
        }
    }
}

impl CredDeleteOptions {
    pub fn new(access_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            ..Default::default()
        }
    }
}

impl HostCreateOptions {
    pub fn new(nqn: impl Into<String>) -> Self {
        Self {
            nqn: nqn.into(),
            ..Default::default()
        }
    }
}

impl HostOptions {
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
            ..Default::default()
        }
    }
}

impl HostDeleteOptions {
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
            ..Default::default()
        }
    }
}

impl HostVolDeleteallOptions {
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
            ..Default::default()
        }
    }
}

impl HostVolDeleteOptions {
    pub fn new(host_id: impl Into<String>, volume_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
            volume_id: volume_id.into(),
            ..Default::default()
        }
    }
}

impl HostVolUpdateOptions {
    pub fn new(host_id: impl Into<String>, volume_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
            volume_id: volume_id.into(),
            ..Default::default()
        }
    }
}

impl SdsaasV1 {
    /// Builds a client from explicit options. Without an authenticator the
    /// client sends unauthenticated requests.
    pub fn new(options: SdsaasV1Options) -> Result<Self> {
        let authenticator = options.authenticator.unwrap_or(Authenticator::NoAuth);
        let service = BaseService::new(authenticator, options.url)?;
        Ok(Self { service })
    }

    /// Like [`SdsaasV1::new`], but fills the authenticator and service
    /// settings from `<SERVICE_NAME>_*` environment variables. An explicit
    /// `url` still wins over `<SERVICE_NAME>_URL`.
    pub fn from_external_config(options: SdsaasV1Options) -> Result<Self> {
        Self::from_lookup(options, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(mut options: SdsaasV1Options, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_name = options
            .service_name
            .take()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());
        if options.authenticator.is_none() {
            options.authenticator = Some(Authenticator::from_lookup(&service_name, &lookup)?);
        }
        let url = options.url.take();
        let mut client = Self::new(options)?;
        client.service.configure_from(&service_name, &lookup)?;
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            client.set_service_url(&url)?;
        }
        tracing::debug!("sdsaas client configured for {}", client.service_url());
        Ok(client)
    }

    pub fn set_service_url(&mut self, url: &str) -> Result<()> {
        self.service.set_service_url(url)
    }

    pub fn service_url(&self) -> &str {
        self.service.service_url()
    }

    pub fn set_default_headers(&mut self, headers: HeaderMap) {
        self.service.set_default_headers(headers);
    }

    /// Zero for either argument selects the default.
    pub fn enable_retries(&mut self, max_retries: u32, max_retry_interval: Duration) {
        self.service.enable_retries(max_retries, max_retry_interval);
    }

    pub fn disable_retries(&mut self) {
        self.service.disable_retries();
    }

    async fn send(&self, req: Request) -> Result<DetailedResponse> {
        self.service.request(req, DEFAULT_SERVICE_NAME, SERVICE_VERSION).await
    }

    async fn fetch<T: DeserializeOwned>(&self, req: Request) -> Result<(Option<T>, DetailedResponse)> {
        let response = self.send(req).await?;
        let result = response.parse()?;
        Ok((result, response))
    }

    /// Lists volumes in the region.
    pub async fn volumes(&self, options: &VolumesOptions) -> Result<(Option<VolumeCollection>, DetailedResponse)> {
        let req = Request::new(Method::GET, "/volumes", "Volumes")
            .headers(&options.headers)
            .query("limit", options.limit)
            .query("name", options.name.as_deref());
        self.fetch(req).await
    }

    pub async fn volume_create(&self, options: &VolumeCreateOptions) -> Result<(Option<Volume>, DetailedResponse)> {
        let mut body = Map::new();
        body.insert("capacity".to_string(), Value::from(options.capacity));
        if let Some(name) = &options.name {
            body.insert("name".to_string(), Value::from(name.as_str()));
        }
        let req = Request::new(Method::POST, "/volumes", "VolumeCreate")
            .headers(&options.headers)
            .query("hostnqnstring", options.hostnqnstring.as_deref())
            .body(Body::Json(Value::Object(body)));
        self.fetch(req).await
    }

    pub async fn volume(&self, options: &VolumeOptions) -> Result<(Option<Volume>, DetailedResponse)> {
        require("volume_id", &options.volume_id)?;
        let req = Request::new(Method::GET, "/volumes/{volume_id}", "Volume")
            .path_param("volume_id", &options.volume_id)
            .headers(&options.headers);
        self.fetch(req).await
    }

    pub async fn volume_delete(&self, options: &VolumeDeleteOptions) -> Result<DetailedResponse> {
        require("volume_id", &options.volume_id)?;
        let req = Request::new(Method::DELETE, "/volumes/{volume_id}", "VolumeDelete")
            .path_param("volume_id", &options.volume_id)
            .headers(&options.headers);
        self.send(req).await
    }

    pub async fn volume_update(&self, options: &VolumeUpdateOptions) -> Result<(Option<Volume>, DetailedResponse)> {
        require("volume_id", &options.volume_id)?;
        let req = Request::new(Method::PATCH, "/volumes/{volume_id}", "VolumeUpdate")
            .path_param("volume_id", &options.volume_id)
            .headers(&options.headers)
            .body(Body::JsonAs(MERGE_PATCH, Value::Object(options.volume_patch.clone())));
        self.fetch(req).await
    }

    /// Lists the access keys of the object storage workspace.
    pub async fn creds(&self, options: &CredsOptions) -> Result<(Option<CredentialsFound>, DetailedResponse)> {
        let req = Request::new(Method::GET, "/v1/object/workspace/credentials", "Creds")
            .headers(&options.headers);
        self.fetch(req).await
    }

    pub async fn cred_create(
        &self,
        options: &CredCreateOptions,
    ) -> Result<(Option<CredentialsUpdated>, DetailedResponse)> {
        require("access_key", &options.access_key)?;
        let req = Request::new(Method::POST, "/v1/object/workspace/credentials", "CredCreate")
            .headers(&options.headers)
            .query("access_key", Some(&options.access_key));
        self.fetch(req).await
    }

    pub async fn cred_delete(&self, options: &CredDeleteOptions) -> Result<DetailedResponse> {
        require("access_key", &options.access_key)?;
        let req = Request::new(Method::DELETE, "/v1/object/workspace/credentials", "CredDelete")
            .headers(&options.headers)
            .query("access_key", Some(&options.access_key));
        self.send(req).await
    }

    /// Reports expiry of the S3 endpoint certificate.
    pub async fn cert(&self, options: &CertOptions) -> Result<(Option<CertificateFound>, DetailedResponse)> {
        let req = Request::new(Method::GET, "/v1/object/certificate/s3", "Cert").headers(&options.headers);
        self.fetch(req).await
    }

    pub async fn cert_upload(
        &self,
        options: &CertUploadOptions,
    ) -> Result<(Option<CertificateUpdated>, DetailedResponse)> {
        if options.body.is_empty() {
            return Err(SdsError::Validation("body must not be empty".to_string()));
        }
        let req = Request::new(Method::POST, "/v1/object/certificate/s3", "CertUpload")
            .headers(&options.headers)
            .body(Body::Bytes(OCTET_STREAM, options.body.clone()));
        self.fetch(req).await
    }

    pub async fn hosts(&self, options: &HostsOptions) -> Result<(Option<HostCollection>, DetailedResponse)> {
        let req = Request::new(Method::GET, "/hosts", "Hosts")
            .headers(&options.headers)
            .query("limit", options.limit)
            .query("name", options.name.as_deref());
        self.fetch(req).await
    }

    pub async fn host_create(&self, options: &HostCreateOptions) -> Result<(Option<Host>, DetailedResponse)> {
        require("nqn", &options.nqn)?;
        let mut body = Map::new();
        body.insert("nqn".to_string(), Value::from(options.nqn.as_str()));
        if let Some(name) = &options.name {
            body.insert("name".to_string(), Value::from(name.as_str()));
        }
        if !options.volumes.is_empty() {
            for v in &options.volumes {
                require("volumes[].volume_id", &v.volume_id)?;
            }
            body.insert("volumes".to_string(), serde_json::to_value(&options.volumes)?);
        }
        let req = Request::new(Method::POST, "/hosts", "HostCreate")
            .headers(&options.headers)
            .body(Body::Json(Value::Object(body)));
        self.fetch(req).await
    }

    pub async fn host(&self, options: &HostOptions) -> Result<(Option<Host>, DetailedResponse)> {
        require("host_id", &options.host_id)?;
        let req = Request::new(Method::GET, "/hosts/{host_id}", "Host")
            .path_param("host_id", &options.host_id)
            .headers(&options.headers);
        self.fetch(req).await
    }

    pub async fn host_update(&self, options: &HostUpdateOptions) -> Result<(Option<Host>, DetailedResponse)> {
        require("host_id", &options.host_id)?;
        let req = Request::new(Method::PATCH, "/hosts/{host_id}", "HostUpdate")
            .path_param("host_id", &options.host_id)
            .headers(&options.headers)
            .body(Body::JsonAs(MERGE_PATCH, Value::Object(options.host_patch.clone())));
        self.fetch(req).await
    }

    pub async fn host_delete(&self, options: &HostDeleteOptions) -> Result<DetailedResponse> {
        require("host_id", &options.host_id)?;
        let req = Request::new(Method::DELETE, "/hosts/{host_id}", "HostDelete")
            .path_param("host_id", &options.host_id)
            .headers(&options.headers);
        self.send(req).await
    }

    /// Unmaps every volume from the host.
    pub async fn host_vol_deleteall(&self, options: &HostVolDeleteallOptions) -> Result<DetailedResponse> {
        require("host_id", &options.host_id)?;
        let req = Request::new(Method::DELETE, "/hosts/{host_id}/volumes", "HostVolDeleteall")
            .path_param("host_id", &options.host_id)
            .headers(&options.headers);
        self.send(req).await
    }

    pub async fn host_vol_delete(&self, options: &HostVolDeleteOptions) -> Result<DetailedResponse> {
        require("host_id", &options.host_id)?;
        require("volume_id", &options.volume_id)?;
        let req = Request::new(Method::DELETE, "/hosts/{host_id}/volumes/{volume_id}", "HostVolDelete")
            .path_param("host_id", &options.host_id)
            .path_param("volume_id", &options.volume_id)
            .headers(&options.headers);
        self.send(req).await
    }

    /// Maps a volume to the host.
    pub async fn host_vol_update(&self, options: &HostVolUpdateOptions) -> Result<(Option<Host>, DetailedResponse)> {
        require("host_id", &options.host_id)?;
        require("volume_id", &options.volume_id)?;
        let req = Request::new(Method::PUT, "/hosts/{host_id}/volumes/{volume_id}", "HostVolUpdate")
            .path_param("host_id", &options.host_id)
            .path_param("volume_id", &options.volume_id)
            .headers(&options.headers);
        self.fetch(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SdsaasV1 {
        SdsaasV1::new(SdsaasV1Options {
            url: Some("http://127.0.0.1:1".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_new_without_url() {
        let c = SdsaasV1::new(SdsaasV1Options::default()).unwrap();
        assert_eq!(c.service_url(), "");
        assert!(matches!(
            tokio_test::block_on(c.creds(&CredsOptions::default())),
            Err(SdsError::Config(_))
        ));
    }

    #[test]
    fn test_from_lookup_explicit_url_wins() {
        let vars = |key: &str| match key {
            "SDSAAS_AUTH_TYPE" => Some("noauth".to_string()),
            "SDSAAS_URL" => Some("https://env.example.com".to_string()),
            _ => None,
        };
        let c = SdsaasV1::from_lookup(SdsaasV1Options::default(), vars).unwrap();
        assert_eq!(c.service_url(), "https://env.example.com");

        let c = SdsaasV1::from_lookup(
            SdsaasV1Options {
                url: Some("https://explicit.example.com/".into()),
                ..Default::default()
            },
            vars,
        )
        .unwrap();
        assert_eq!(c.service_url(), "https://explicit.example.com");
    }

    #[test]
    fn test_from_lookup_requires_auth() {
        let err = SdsaasV1::from_lookup(SdsaasV1Options::default(), |_| None).unwrap_err();
        assert!(matches!(err, SdsError::Config(_)));
    }

    #[test]
    fn test_empty_path_params_fail_validation() {
        let c = client();
        let err = tokio_test::block_on(c.volume(&VolumeOptions::new(""))).unwrap_err();
        assert!(matches!(err, SdsError::Validation(m) if m.contains("volume_id")));

        let err = tokio_test::block_on(c.host_vol_delete(&HostVolDeleteOptions::new("h1", ""))).unwrap_err();
        assert!(matches!(err, SdsError::Validation(_)));

        let err = tokio_test::block_on(c.cred_create(&CredCreateOptions::new(""))).unwrap_err();
        assert!(matches!(err, SdsError::Validation(_)));

        let err = tokio_test::block_on(c.cert_upload(&CertUploadOptions::default())).unwrap_err();
        assert!(matches!(err, SdsError::Validation(_)));
    }

    #[test]
    fn test_options_header_builder() {
        let opts = HostsOptions::default().header("X-Trace", "1");
        assert_eq!(opts.headers.get("X-Trace").map(String::as_str), Some("1"));
    }
}
