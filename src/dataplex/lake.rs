//! Lake: the top-level Dataplex container

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::common::AssetStatus;
use super::resource::{document_string, identity, DataplexResource};
use crate::dcl::config::DEFAULT_BASE_PATH;
use crate::dcl::canonicalize::{
    keep_desired, keep_new, keep_string, name_to_self_link, nested_desired, nested_new,
    partial_self_link_to_self_link, pick, pick_string, pick_unless_zero, short_name,
};
use crate::dcl::diff::{diff_field, diff_object, nest, DiffInfo, FieldDiff, NestedObject};
use crate::dcl::enums::{string_enum, validate_opt};
use crate::dcl::error::Result;
use crate::dcl::flatten::{
    expand_object, flatten_enum, flatten_key_value_pairs, flatten_object, flatten_string, put,
    put_object,
};
use crate::dcl::url::url;
use crate::dcl::validate::{required, required_parameter};

string_enum!(
    /// Lifecycle state of a lake.
    LakeStateEnum {
        "STATE_UNSPECIFIED",
        "ACTIVE",
        "CREATING",
        "DELETING",
        "ACTION_REQUIRED",
    }
);

string_enum!(
    /// State of the metastore association.
    LakeMetastoreStatusStateEnum {
        "STATE_UNSPECIFIED",
        "NONE",
        "READY",
        "UPDATING",
        "ERROR",
    }
);

pub type LakeAssetStatus = AssetStatus;

/// Dataproc Metastore service the lake's metadata is published to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LakeMetastore {
    /// `projects/{project_id}/locations/{location_id}/services/{service_id}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// True only for the explicit empty-object sentinel.
    #[serde(skip)]
    pub empty: bool,
}

impl NestedObject for LakeMetastore {
    const EMPTY: Self = LakeMetastore {
        service: None,
        empty: true,
    };

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn compare(&self, actual: &Self, path: &str, op: &'static str, out: &mut Vec<FieldDiff>) {
        diff_field(out, nest(path, "service"), &self.service, &actual.service, DiffInfo::update(op));
    }
}

impl LakeMetastore {
    fn expand(&self) -> Map<String, Value> {
        let mut m = Map::new();
        put(&mut m, "service", &self.service);
        m
    }

    fn flatten(value: Option<&Value>) -> Option<Self> {
        flatten_object(value, |m| LakeMetastore {
            service: flatten_string(m.get("service")),
            empty: false,
        })
    }

    fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
        nested_desired(des, initial, |d, i| LakeMetastore {
            service: pick_string(&d.service, &i.service),
            empty: false,
        })
    }

    fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
        nested_new(des, nw, |d, n| LakeMetastore {
            service: keep_string(&d.service, n.service),
            empty: n.empty,
        })
    }
}

/// Metastore association status. Output only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LakeMetastoreStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<LakeMetastoreStatusStateEnum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// True only for the explicit empty-object sentinel.
    #[serde(skip)]
    pub empty: bool,
}

impl NestedObject for LakeMetastoreStatus {
    const EMPTY: Self = LakeMetastoreStatus {
        state: None,
        message: None,
        update_time: None,
        endpoint: None,
        empty: true,
    };

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn compare(&self, actual: &Self, path: &str, op: &'static str, out: &mut Vec<FieldDiff>) {
        let info = DiffInfo::update(op);
        diff_field(out, nest(path, "state"), &self.state, &actual.state, info.clone().enumeration());
        diff_field(out, nest(path, "message"), &self.message, &actual.message, info.clone());
        diff_field(out, nest(path, "updateTime"), &self.update_time, &actual.update_time, info.clone());
        diff_field(out, nest(path, "endpoint"), &self.endpoint, &actual.endpoint, info);
    }
}

impl LakeMetastoreStatus {
    fn flatten(value: Option<&Value>) -> Option<Self> {
        flatten_object(value, |m| LakeMetastoreStatus {
            state: flatten_enum(m.get("state")),
            message: flatten_string(m.get("message")),
            update_time: flatten_string(m.get("updateTime")),
            endpoint: flatten_string(m.get("endpoint")),
            empty: false,
        })
    }

    fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
        nested_desired(des, initial, |d, i| LakeMetastoreStatus {
            state: pick_unless_zero(&d.state, &i.state),
            message: pick_string(&d.message, &i.message),
            update_time: pick_unless_zero(&d.update_time, &i.update_time),
            endpoint: pick_string(&d.endpoint, &i.endpoint),
            empty: false,
        })
    }

    fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
        nested_new(des, nw, |d, n| LakeMetastoreStatus {
            state: n.state,
            message: keep_string(&d.message, n.message),
            update_time: n.update_time,
            endpoint: keep_string(&d.endpoint, n.endpoint),
            empty: n.empty,
        })
    }
}

/// A Dataplex lake.
///
/// Fields marked output only are reported by the server and ignored on
/// input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lake {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<LakeStateEnum>,
    /// Output only. Service account Dataplex uses for this lake.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metastore: Option<LakeMetastore>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_status: Option<LakeAssetStatus>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metastore_status: Option<LakeMetastoreStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Lake {
    /// A lake identified by project, location and name.
    pub fn new(project: impl Into<String>, location: impl Into<String>, name: impl Into<String>) -> Self {
        Lake {
            project: Some(project.into()),
            location: Some(location.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    fn params(&self) -> Result<[(&'static str, &str); 3]> {
        Ok([
            ("project", identity("Project", &self.project)?),
            ("location", identity("Location", &self.location)?),
            ("name", identity("Name", &self.name)?),
        ])
    }

    /// `projects/{project}/locations/{location}/lakes/{name}`
    pub fn full_name(&self) -> Result<String> {
        let [(_, project), (_, location), (_, name)] = self.params()?;
        Ok(format!("projects/{project}/locations/{location}/lakes/{name}"))
    }

    fn expand_user_fields(&self, m: &mut Map<String, Value>) {
        put(m, "displayName", &self.display_name);
        put(m, "labels", &self.labels);
        put(m, "description", &self.description);
        put_object(m, "metastore", expand_object(&self.metastore, LakeMetastore::expand));
    }
}

impl DataplexResource for Lake {
    const KIND: &'static str = "Lake";
    const LIST_FIELD: &'static str = "lakes";
    const UPDATE_OPERATION: &'static str = "updateLakeUpdateLakeOperation";

    fn validate(&self) -> Result<()> {
        required("Lake", "name", &self.name)?;
        required_parameter("Project", &self.project)?;
        required_parameter("Location", &self.location)?;
        validate_opt(&self.state)?;
        if let Some(status) = &self.metastore_status {
            validate_opt(&status.state)?;
        }
        Ok(())
    }

    fn url_normalized(&self) -> Self {
        Lake {
            name: short_name(&self.name),
            project: short_name(&self.project),
            location: short_name(&self.location),
            ..self.clone()
        }
    }

    fn self_url(&self, user_base_path: Option<&str>) -> Result<String> {
        Ok(url(
            "projects/{{project}}/locations/{{location}}/lakes/{{name}}",
            DEFAULT_BASE_PATH,
            user_base_path,
            &self.params()?,
        ))
    }

    fn list_url(&self, user_base_path: Option<&str>) -> Result<String> {
        Ok(url(
            "projects/{{project}}/locations/{{location}}/lakes",
            DEFAULT_BASE_PATH,
            user_base_path,
            &[
                ("project", identity("Project", &self.project)?),
                ("location", identity("Location", &self.location)?),
            ],
        ))
    }

    fn create_url(&self, user_base_path: Option<&str>) -> Result<String> {
        Ok(url(
            "projects/{{project}}/locations/{{location}}/lakes?lakeId={{name}}",
            DEFAULT_BASE_PATH,
            user_base_path,
            &self.params()?,
        ))
    }

    fn expand(&self) -> Result<Map<String, Value>> {
        let mut m = Map::new();
        m.insert("name".to_string(), Value::String(self.full_name()?));
        self.expand_user_fields(&mut m);
        Ok(m)
    }

    fn flatten(value: &Map<String, Value>) -> Self {
        Lake {
            name: flatten_string(value.get("name")),
            display_name: flatten_string(value.get("displayName")),
            uid: flatten_string(value.get("uid")),
            create_time: flatten_string(value.get("createTime")),
            update_time: flatten_string(value.get("updateTime")),
            labels: flatten_key_value_pairs(value.get("labels")),
            description: flatten_string(value.get("description")),
            state: flatten_enum(value.get("state")),
            service_account: flatten_string(value.get("serviceAccount")),
            metastore: LakeMetastore::flatten(value.get("metastore")),
            asset_status: AssetStatus::flatten(value.get("assetStatus")),
            metastore_status: LakeMetastoreStatus::flatten(value.get("metastoreStatus")),
            project: document_string(value, "project"),
            location: document_string(value, "location"),
        }
    }

    fn update_request(&self) -> Result<Map<String, Value>> {
        self.expand()
    }

    fn inherit_parent(&mut self, parent: &Self) {
        self.project = parent.project.clone();
        self.location = parent.location.clone();
    }

    fn adopt_identity(&mut self, from: &Self) {
        self.inherit_parent(from);
        self.name = from.name.clone();
    }

    fn canonicalize_desired(raw_desired: &Self, raw_initial: Option<&Self>) -> Self {
        let Some(initial) = raw_initial else {
            return Lake {
                metastore: LakeMetastore::canonicalize_desired(&raw_desired.metastore, &None),
                asset_status: AssetStatus::canonicalize_desired(&raw_desired.asset_status, &None),
                metastore_status: LakeMetastoreStatus::canonicalize_desired(
                    &raw_desired.metastore_status,
                    &None,
                ),
                ..raw_desired.clone()
            };
        };
        let d = raw_desired;

        Lake {
            name: pick(
                &d.name,
                &initial.name,
                partial_self_link_to_self_link(&d.name, &initial.name),
            ),
            display_name: pick_string(&d.display_name, &initial.display_name),
            labels: pick_unless_zero(&d.labels, &initial.labels),
            description: pick_string(&d.description, &initial.description),
            metastore: LakeMetastore::canonicalize_desired(&d.metastore, &initial.metastore),
            project: pick(&d.project, &initial.project, name_to_self_link(&d.project, &initial.project)),
            location: pick(
                &d.location,
                &initial.location,
                name_to_self_link(&d.location, &initial.location),
            ),
            ..Default::default()
        }
    }

    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self {
        let d = raw_desired;
        let n = raw_new;
        let name_equivalent = partial_self_link_to_self_link(&d.name, &n.name);

        Lake {
            name: keep_desired(&d.name, n.name, name_equivalent),
            display_name: keep_string(&d.display_name, n.display_name),
            uid: keep_new(&d.uid, n.uid),
            create_time: keep_new(&d.create_time, n.create_time),
            update_time: keep_new(&d.update_time, n.update_time),
            labels: keep_new(&d.labels, n.labels),
            description: keep_string(&d.description, n.description),
            state: keep_new(&d.state, n.state),
            service_account: keep_new(&d.service_account, n.service_account),
            metastore: LakeMetastore::canonicalize_new(&d.metastore, n.metastore),
            asset_status: AssetStatus::canonicalize_new(&d.asset_status, n.asset_status),
            metastore_status: LakeMetastoreStatus::canonicalize_new(&d.metastore_status, n.metastore_status),
            project: d.project.clone(),
            location: d.location.clone(),
        }
    }

    fn diff(desired: &Self, actual: &Self) -> Vec<FieldDiff> {
        let op = Self::UPDATE_OPERATION;
        let mut out = Vec::new();

        diff_field(&mut out, "name", &desired.name, &actual.name, DiffInfo::update(op).reference());
        diff_field(&mut out, "displayName", &desired.display_name, &actual.display_name, DiffInfo::update(op));
        diff_field(&mut out, "uid", &desired.uid, &actual.uid, DiffInfo::output_only());
        diff_field(&mut out, "createTime", &desired.create_time, &actual.create_time, DiffInfo::output_only());
        diff_field(&mut out, "updateTime", &desired.update_time, &actual.update_time, DiffInfo::output_only());
        diff_field(&mut out, "labels", &desired.labels, &actual.labels, DiffInfo::update(op));
        diff_field(&mut out, "description", &desired.description, &actual.description, DiffInfo::update(op));
        diff_field(&mut out, "state", &desired.state, &actual.state, DiffInfo::output_only().enumeration());
        diff_field(
            &mut out,
            "serviceAccount",
            &desired.service_account,
            &actual.service_account,
            DiffInfo::output_only(),
        );
        diff_object(&mut out, "metastore", &desired.metastore, &actual.metastore, op, false);
        diff_object(&mut out, "assetStatus", &desired.asset_status, &actual.asset_status, op, true);
        diff_object(
            &mut out,
            "metastoreStatus",
            &desired.metastore_status,
            &actual.metastore_status,
            op,
            true,
        );
        diff_field(&mut out, "project", &desired.project, &actual.project, DiffInfo::recreate().reference());
        diff_field(&mut out, "location", &desired.location, &actual.location, DiffInfo::recreate());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcl::diff::Remediation;
    use crate::dcl::error::DclError;
    use serde_json::json;

    fn lake() -> Lake {
        Lake {
            display_name: Some("Sales".into()),
            labels: Some(BTreeMap::from([("env".to_string(), "prod".to_string())])),
            description: Some("sales data".into()),
            metastore: Some(LakeMetastore {
                service: Some("projects/p/locations/us-central1/services/ms".into()),
                empty: false,
            }),
            ..Lake::new("p", "us-central1", "sales")
        }
    }

    #[test]
    fn test_urls() {
        let l = lake();
        assert_eq!(
            l.self_url(None).unwrap(),
            "https://dataplex.googleapis.com/v1/projects/p/locations/us-central1/lakes/sales"
        );
        assert_eq!(
            l.create_url(Some("http://127.0.0.1:9000/v1/")).unwrap(),
            "http://127.0.0.1:9000/v1/projects/p/locations/us-central1/lakes?lakeId=sales"
        );
        assert_eq!(
            l.list_url(None).unwrap(),
            "https://dataplex.googleapis.com/v1/projects/p/locations/us-central1/lakes"
        );

        let full = Lake {
            project: Some("projects/p".into()),
            ..lake()
        };
        assert_eq!(full.self_url(None).unwrap(), l.self_url(None).unwrap());
    }

    #[test]
    fn test_validate() {
        assert!(lake().validate().is_ok());
        let err = Lake {
            name: None,
            ..lake()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, DclError::RequiredField { field: "name", .. }));
        let err = Lake {
            location: Some(String::new()),
            ..lake()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, DclError::RequiredParameter("Location")));
        let err = Lake {
            state: Some(LakeStateEnum::new("SLEEPING")),
            ..lake()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, DclError::InvalidEnum { .. }));
    }

    #[test]
    fn test_expand_uses_full_name_and_skips_identity() {
        let body = lake().expand().unwrap();
        assert_eq!(body["name"], json!("projects/p/locations/us-central1/lakes/sales"));
        assert_eq!(body["labels"], json!({"env": "prod"}));
        assert_eq!(body["metastore"]["service"], json!("projects/p/locations/us-central1/services/ms"));
        assert!(!body.contains_key("project"));
        assert!(!body.contains_key("location"));
    }

    #[test]
    fn test_flatten_response() {
        let body = json!({
            "name": "projects/p/locations/us-central1/lakes/sales",
            "uid": "1234",
            "state": "ACTIVE",
            "metastore": {},
            "assetStatus": {"activeAssets": "3"},
            "metastoreStatus": {"state": "READY", "endpoint": "thrift://x"}
        });
        let l = Lake::flatten(body.as_object().unwrap());
        assert_eq!(l.state, Some(LakeStateEnum::new("ACTIVE")));
        assert_eq!(l.metastore, Some(LakeMetastore::EMPTY));
        assert_eq!(l.asset_status.unwrap().active_assets, Some(3));
        assert_eq!(l.metastore_status.unwrap().endpoint.as_deref(), Some("thrift://x"));
        assert!(l.project.is_none());
    }

    #[test]
    fn test_canonicalize_desired_keeps_initial_forms() {
        let initial = Lake {
            name: Some("projects/p/locations/us-central1/lakes/sales".into()),
            display_name: Some("Sales".into()),
            uid: Some("1234".into()),
            description: Some("sales data".into()),
            ..Lake::new("p", "us-central1", "")
        };
        let desired = Lake {
            display_name: Some(" Sales ".into()),
            labels: None,
            ..lake()
        };
        let c = Lake::canonicalize_desired(&desired, Some(&initial));
        assert_eq!(c.name, initial.name);
        assert_eq!(c.display_name.as_deref(), Some("Sales"));
        assert!(c.uid.is_none());
        assert!(Lake::diff(&c, &initial)
            .iter()
            .all(|d| d.field_name.starts_with("metastore")));
    }

    #[test]
    fn test_canonicalize_new_adopts_desired_when_equivalent() {
        let server = Lake {
            name: Some("projects/p/locations/us-central1/lakes/sales".into()),
            display_name: Some("Sales".into()),
            uid: Some("1234".into()),
            ..Default::default()
        };
        let desired = Lake {
            display_name: Some("Sales ".into()),
            ..lake()
        };
        let n = Lake::canonicalize_new(server, &desired);
        assert_eq!(n.name.as_deref(), Some("sales"));
        assert_eq!(n.display_name.as_deref(), Some("Sales "));
        assert_eq!(n.uid.as_deref(), Some("1234"));
        assert_eq!(n.project.as_deref(), Some("p"));
        assert!(n.metastore.is_none());
    }

    #[test]
    fn test_diff_remediations() {
        let desired = lake();
        let actual = Lake {
            display_name: Some("Old".into()),
            metastore: None,
            location: Some("europe-west1".into()),
            ..lake()
        };
        let diffs = Lake::diff(&desired, &actual);
        let by_name = |n: &str| diffs.iter().find(|d| d.field_name == n).unwrap().remediation.clone();
        assert_eq!(by_name("displayName"), Remediation::Update("updateLakeUpdateLakeOperation"));
        assert_eq!(by_name("metastore.service"), Remediation::Update("updateLakeUpdateLakeOperation"));
        assert_eq!(by_name("location"), Remediation::Recreate);
        assert!(Lake::diff(&desired, &desired).is_empty());
    }
}
