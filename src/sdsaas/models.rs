//! Request and response models for the sdsaas v1 API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::error::{Result, SdsError};

/// Link to a page of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl PageLink {
    /// The `start` query parameter of `href`, used to fetch the next page.
    pub fn start(&self) -> Option<String> {
        let href = self.href.as_deref()?;
        let url = url::Url::parse(href)
            .or_else(|_| url::Url::parse("http://localhost").and_then(|base| base.join(href)))
            .ok()?;
        url.query_pairs()
            .find(|(k, _)| k == "start")
            .map(|(_, v)| v.into_owned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateFound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateUpdated {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error: Vec<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_certificate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_key: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialsFound {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialsUpdated {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

/// A host that may be mapped to volumes over NVMe-oF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Host {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// NVMe qualified name.
    #[serde(default)]
    pub nqn: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeMappingReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostCollection {
    #[serde(default)]
    pub first: PageLink,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_nqn: Option<String>,
}

/// Fields of a host that HostUpdate may change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl HostPatch {
    /// Merge-patch document holding only the set fields.
    pub fn as_patch(&self) -> Result<Map<String, Value>> {
        as_patch(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfoReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageIdentifiersReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_info: Vec<NetworkInfoReference>,
}

/// A block storage volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    /// Maximum bandwidth in megabits per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<i64>,
    /// Capacity in gigabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<HostMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<PageLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(default)]
    pub total_count: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

/// Reference to a volume when creating a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeMappingIdentity {
    pub volume_id: String,
}

impl VolumeMappingIdentity {
    pub fn new(volume_id: impl Into<String>) -> Self {
        Self {
            volume_id: volume_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeMappingReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub volume_id: String,
    #[serde(default)]
    pub volume_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_identifiers: Option<StorageIdentifiersReference>,
}

/// Fields of a volume that VolumeUpdate may change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl VolumePatch {
    pub fn as_patch(&self) -> Result<Map<String, Value>> {
        as_patch(self)
    }
}

fn as_patch<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(SdsError::Validation(format!(
            "patch must serialize to an object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_volume_deserialize() {
        let v: Volume = serde_json::from_value(json!({
            "id": "r134-1",
            "name": "vol-a",
            "capacity": 10,
            "status": "available",
            "hosts": [{"host_id": "h1", "host_name": "host-a", "host_nqn": "nqn.2014-08.org:a"}],
            "unknown_field": true
        }))
        .unwrap();
        assert_eq!(v.capacity, Some(10));
        assert_eq!(v.hosts[0].host_id.as_deref(), Some("h1"));
        assert!(v.status_reasons.is_empty());
    }

    #[test]
    fn test_host_with_storage_identifiers() {
        let h: Host = serde_json::from_value(json!({
            "id": "h1",
            "nqn": "nqn.2014-08.org:a",
            "volumes": [{
                "volume_id": "v1",
                "volume_name": "vol-a",
                "status": "mapped",
                "storage_identifiers": {
                    "namespace_id": 1,
                    "network_info": [{"gateway_ip": "10.0.0.1", "port": 4420}]
                }
            }]
        }))
        .unwrap();
        let ids = h.volumes[0].storage_identifiers.as_ref().unwrap();
        assert_eq!(ids.namespace_id, Some(1));
        assert_eq!(ids.network_info[0].port, Some(4420));
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = VolumePatch {
            capacity: Some(20),
            name: None,
        }
        .as_patch()
        .unwrap();
        assert_eq!(Value::Object(patch), json!({"capacity": 20}));
        assert!(HostPatch::default().as_patch().unwrap().is_empty());
    }

    #[test]
    fn test_page_link_start() {
        let link = PageLink {
            href: Some("https://sds.example.com/v1/volumes?limit=10&start=abc".into()),
        };
        assert_eq!(link.start().as_deref(), Some("abc"));
        let relative = PageLink {
            href: Some("/hosts?start=h2".into()),
        };
        assert_eq!(relative.start().as_deref(), Some("h2"));
        assert_eq!(PageLink::default().start(), None);
    }
}
