//! Asset: a storage bucket or BigQuery dataset attached to a zone

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::common::DiscoverySpec;
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
    expand_object, flatten_enum, flatten_integer, flatten_key_value_pairs, flatten_object,
    flatten_string, put, put_object,
};
use crate::dcl::url::url;
use crate::dcl::validate::{required, required_object, required_parameter};

string_enum!(
    AssetStateEnum {
        "STATE_UNSPECIFIED",
        "ACTIVE",
        "CREATING",
        "DELETING",
        "ACTION_REQUIRED",
    }
);

string_enum!(
    AssetResourceSpecTypeEnum {
        "TYPE_UNSPECIFIED",
        "STORAGE_BUCKET",
        "BIGQUERY_DATASET",
    }
);

string_enum!(
    /// Whether data is read directly or through Dataplex-managed tables.
    AssetResourceSpecReadAccessModeEnum { "DIRECT", "MANAGED" }
);

string_enum!(
    AssetResourceStatusStateEnum { "STATE_UNSPECIFIED", "READY", "ERROR" }
);

string_enum!(
    AssetSecurityStatusStateEnum {
        "STATE_UNSPECIFIED",
        "READY",
        "APPLYING",
        "ERROR",
    }
);

string_enum!(
    AssetDiscoveryStatusStateEnum {
        "STATE_UNSPECIFIED",
        "SCHEDULED",
        "IN_PROGRESS",
        "PAUSED",
        "DISABLED",
    }
);

pub type AssetDiscoverySpec = DiscoverySpec;

/// The attached storage resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResourceSpec {
    /// `projects/{project}/buckets/{bucket}` or
    /// `projects/{project}/datasets/{dataset}`. Immutable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Required. Immutable.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<AssetResourceSpecTypeEnum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_access_mode: Option<AssetResourceSpecReadAccessModeEnum>,
    /// True only for the explicit empty-object sentinel.
    #[serde(skip)]
    pub empty: bool,
}

impl NestedObject for AssetResourceSpec {
    const EMPTY: Self = AssetResourceSpec {
        name: None,
        resource_type: None,
        read_access_mode: None,
        empty: true,
    };

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn compare(&self, actual: &Self, path: &str, op: &'static str, out: &mut Vec<FieldDiff>) {
        diff_field(out, nest(path, "name"), &self.name, &actual.name, DiffInfo::recreate());
        diff_field(
            out,
            nest(path, "type"),
            &self.resource_type,
            &actual.resource_type,
            DiffInfo::recreate().enumeration(),
        );
        diff_field(
            out,
            nest(path, "readAccessMode"),
            &self.read_access_mode,
            &actual.read_access_mode,
            DiffInfo::update(op).enumeration(),
        );
    }
}

impl AssetResourceSpec {
    fn expand(&self) -> Map<String, Value> {
        let mut m = Map::new();
        put(&mut m, "name", &self.name);
        put(&mut m, "type", &self.resource_type);
        put(&mut m, "readAccessMode", &self.read_access_mode);
        m
    }

    fn flatten(value: Option<&Value>) -> Option<Self> {
        flatten_object(value, |m| AssetResourceSpec {
            name: flatten_string(m.get("name")),
            resource_type: flatten_enum(m.get("type")),
            read_access_mode: flatten_enum(m.get("readAccessMode")),
            empty: false,
        })
    }

    fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
        nested_desired(des, initial, |d, i| AssetResourceSpec {
            name: pick_string(&d.name, &i.name),
            resource_type: pick_unless_zero(&d.resource_type, &i.resource_type),
            read_access_mode: pick_unless_zero(&d.read_access_mode, &i.read_access_mode),
            empty: false,
        })
    }

    fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
        nested_new(des, nw, |d, n| AssetResourceSpec {
            name: keep_string(&d.name, n.name),
            resource_type: n.resource_type,
            read_access_mode: n.read_access_mode,
            empty: n.empty,
        })
    }
}

/// Generates the output-only `{state, message, updateTime}` status types.
macro_rules! status_object {
    ($(#[$meta:meta])* $name:ident, $state:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            #[serde(skip_serializing_if = "Option::is_none")]
            pub state: Option<$state>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub message: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub update_time: Option<String>,
            /// True only for the explicit empty-object sentinel.
            #[serde(skip)]
            pub empty: bool,
        }

        impl NestedObject for $name {
            const EMPTY: Self = $name {
                state: None,
                message: None,
                update_time: None,
                empty: true,
            };

            fn is_empty(&self) -> bool {
                self.empty
            }

            fn compare(&self, actual: &Self, path: &str, op: &'static str, out: &mut Vec<FieldDiff>) {
                let info = DiffInfo::update(op);
                diff_field(out, nest(path, "state"), &self.state, &actual.state, info.clone().enumeration());
                diff_field(out, nest(path, "message"), &self.message, &actual.message, info.clone());
                diff_field(out, nest(path, "updateTime"), &self.update_time, &actual.update_time, info);
            }
        }

        impl $name {
            fn flatten(value: Option<&Value>) -> Option<Self> {
                flatten_object(value, |m| $name {
                    state: flatten_enum(m.get("state")),
                    message: flatten_string(m.get("message")),
                    update_time: flatten_string(m.get("updateTime")),
                    empty: false,
                })
            }

            fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
                nested_desired(des, initial, |d, i| $name {
                    state: pick_unless_zero(&d.state, &i.state),
                    message: pick_string(&d.message, &i.message),
                    update_time: pick_unless_zero(&d.update_time, &i.update_time),
                    empty: false,
                })
            }

            fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
                nested_new(des, nw, |d, n| $name {
                    state: n.state,
                    message: keep_string(&d.message, n.message),
                    update_time: n.update_time,
                    empty: n.empty,
                })
            }
        }
    };
}

status_object!(
    /// Health of the attached resource. Output only.
    AssetResourceStatus,
    AssetResourceStatusStateEnum
);

status_object!(
    /// Whether security policy has been applied to the attached resource.
    /// Output only.
    AssetSecurityStatus,
    AssetSecurityStatusStateEnum
);

/// Counts gathered by the last discovery run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDiscoveryStatusStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_items: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesets: Option<i64>,
    /// True only for the explicit empty-object sentinel.
    #[serde(skip)]
    pub empty: bool,
}

impl NestedObject for AssetDiscoveryStatusStats {
    const EMPTY: Self = AssetDiscoveryStatusStats {
        data_items: None,
        data_size: None,
        tables: None,
        filesets: None,
        empty: true,
    };

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn compare(&self, actual: &Self, path: &str, op: &'static str, out: &mut Vec<FieldDiff>) {
        let info = DiffInfo::update(op);
        diff_field(out, nest(path, "dataItems"), &self.data_items, &actual.data_items, info.clone());
        diff_field(out, nest(path, "dataSize"), &self.data_size, &actual.data_size, info.clone());
        diff_field(out, nest(path, "tables"), &self.tables, &actual.tables, info.clone());
        diff_field(out, nest(path, "filesets"), &self.filesets, &actual.filesets, info);
    }
}

impl AssetDiscoveryStatusStats {
    fn flatten(value: Option<&Value>) -> Option<Self> {
        flatten_object(value, |m| AssetDiscoveryStatusStats {
            data_items: flatten_integer(m.get("dataItems")),
            data_size: flatten_integer(m.get("dataSize")),
            tables: flatten_integer(m.get("tables")),
            filesets: flatten_integer(m.get("filesets")),
            empty: false,
        })
    }

    fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
        nested_desired(des, initial, |d, i| AssetDiscoveryStatusStats {
            data_items: pick_unless_zero(&d.data_items, &i.data_items),
            data_size: pick_unless_zero(&d.data_size, &i.data_size),
            tables: pick_unless_zero(&d.tables, &i.tables),
            filesets: pick_unless_zero(&d.filesets, &i.filesets),
            empty: false,
        })
    }

    fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
        nested_new(des, nw, |_, n| n)
    }
}

/// State of discovery on the asset. Output only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDiscoveryStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AssetDiscoveryStatusStateEnum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<AssetDiscoveryStatusStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_duration: Option<String>,
    /// True only for the explicit empty-object sentinel.
    #[serde(skip)]
    pub empty: bool,
}

impl NestedObject for AssetDiscoveryStatus {
    const EMPTY: Self = AssetDiscoveryStatus {
        state: None,
        message: None,
        update_time: None,
        last_run_time: None,
        stats: None,
        last_run_duration: None,
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
        diff_field(out, nest(path, "lastRunTime"), &self.last_run_time, &actual.last_run_time, info.clone());
        diff_object(out, &nest(path, "stats"), &self.stats, &actual.stats, op, false);
        diff_field(
            out,
            nest(path, "lastRunDuration"),
            &self.last_run_duration,
            &actual.last_run_duration,
            info,
        );
    }
}

impl AssetDiscoveryStatus {
    fn flatten(value: Option<&Value>) -> Option<Self> {
        flatten_object(value, |m| AssetDiscoveryStatus {
            state: flatten_enum(m.get("state")),
            message: flatten_string(m.get("message")),
            update_time: flatten_string(m.get("updateTime")),
            last_run_time: flatten_string(m.get("lastRunTime")),
            stats: AssetDiscoveryStatusStats::flatten(m.get("stats")),
            last_run_duration: flatten_string(m.get("lastRunDuration")),
            empty: false,
        })
    }

    fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
        nested_desired(des, initial, |d, i| AssetDiscoveryStatus {
            state: pick_unless_zero(&d.state, &i.state),
            message: pick_string(&d.message, &i.message),
            update_time: pick_unless_zero(&d.update_time, &i.update_time),
            last_run_time: pick_unless_zero(&d.last_run_time, &i.last_run_time),
            stats: AssetDiscoveryStatusStats::canonicalize_desired(&d.stats, &i.stats),
            last_run_duration: pick_unless_zero(&d.last_run_duration, &i.last_run_duration),
            empty: false,
        })
    }

    fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
        nested_new(des, nw, |d, n| AssetDiscoveryStatus {
            state: n.state,
            message: keep_string(&d.message, n.message),
            update_time: n.update_time,
            last_run_time: n.last_run_time,
            stats: AssetDiscoveryStatusStats::canonicalize_new(&d.stats, n.stats),
            last_run_duration: n.last_run_duration,
            empty: n.empty,
        })
    }
}

/// A Dataplex asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AssetStateEnum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_spec: Option<AssetResourceSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_status: Option<AssetResourceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_status: Option<AssetSecurityStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_spec: Option<AssetDiscoverySpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_status: Option<AssetDiscoveryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lake: Option<String>,
    /// The parent zone. Serialized as `zone`.
    #[serde(rename = "zone", skip_serializing_if = "Option::is_none")]
    pub dataplex_zone: Option<String>,
}

impl Asset {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        lake: impl Into<String>,
        zone: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Asset {
            project: Some(project.into()),
            location: Some(location.into()),
            lake: Some(lake.into()),
            dataplex_zone: Some(zone.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    fn parent_params(&self) -> Result<[(&'static str, &str); 4]> {
        Ok([
            ("project", identity("Project", &self.project)?),
            ("location", identity("Location", &self.location)?),
            ("lake", identity("Lake", &self.lake)?),
            ("zone", identity("DataplexZone", &self.dataplex_zone)?),
        ])
    }

    fn params(&self) -> Result<[(&'static str, &str); 5]> {
        let [project, location, lake, zone] = self.parent_params()?;
        Ok([project, location, lake, zone, ("name", identity("Name", &self.name)?)])
    }

    /// `projects/{project}/locations/{location}/lakes/{lake}/zones/{zone}/assets/{name}`
    pub fn full_name(&self) -> Result<String> {
        let [(_, project), (_, location), (_, lake), (_, zone), (_, name)] = self.params()?;
        Ok(format!(
            "projects/{project}/locations/{location}/lakes/{lake}/zones/{zone}/assets/{name}"
        ))
    }
}

impl DataplexResource for Asset {
    const KIND: &'static str = "Asset";
    const LIST_FIELD: &'static str = "assets";
    const UPDATE_OPERATION: &'static str = "updateAssetUpdateAssetOperation";

    fn validate(&self) -> Result<()> {
        required("Asset", "name", &self.name)?;
        required_object("Asset", "resourceSpec", &self.resource_spec)?;
        required_object("Asset", "discoverySpec", &self.discovery_spec)?;
        required_parameter("Project", &self.project)?;
        required_parameter("Location", &self.location)?;
        required_parameter("Lake", &self.lake)?;
        required_parameter("DataplexZone", &self.dataplex_zone)?;
        validate_opt(&self.state)?;
        if let Some(spec) = &self.resource_spec {
            required("Asset", "type", &spec.resource_type)?;
            validate_opt(&spec.resource_type)?;
            validate_opt(&spec.read_access_mode)?;
        }
        if let Some(spec) = &self.discovery_spec {
            spec.validate("Asset")?;
        }
        Ok(())
    }

    fn url_normalized(&self) -> Self {
        Asset {
            name: short_name(&self.name),
            project: short_name(&self.project),
            location: short_name(&self.location),
            lake: short_name(&self.lake),
            dataplex_zone: short_name(&self.dataplex_zone),
            ..self.clone()
        }
    }

    fn self_url(&self, user_base_path: Option<&str>) -> Result<String> {
        Ok(url(
            "projects/{{project}}/locations/{{location}}/lakes/{{lake}}/zones/{{zone}}/assets/{{name}}",
            DEFAULT_BASE_PATH,
            user_base_path,
            &self.params()?,
        ))
    }

    fn list_url(&self, user_base_path: Option<&str>) -> Result<String> {
        Ok(url(
            "projects/{{project}}/locations/{{location}}/lakes/{{lake}}/zones/{{zone}}/assets",
            DEFAULT_BASE_PATH,
            user_base_path,
            &self.parent_params()?,
        ))
    }

    fn create_url(&self, user_base_path: Option<&str>) -> Result<String> {
        Ok(url(
            "projects/{{project}}/locations/{{location}}/lakes/{{lake}}/zones/{{zone}}/assets?assetId={{name}}",
            DEFAULT_BASE_PATH,
            user_base_path,
            &self.params()?,
        ))
    }

    fn expand(&self) -> Result<Map<String, Value>> {
        let mut m = Map::new();
        m.insert("name".to_string(), Value::String(self.full_name()?));
        put(&mut m, "displayName", &self.display_name);
        put(&mut m, "labels", &self.labels);
        put(&mut m, "description", &self.description);
        put_object(&mut m, "resourceSpec", expand_object(&self.resource_spec, AssetResourceSpec::expand));
        put_object(&mut m, "discoverySpec", DiscoverySpec::expand(&self.discovery_spec));
        Ok(m)
    }

    fn flatten(value: &Map<String, Value>) -> Self {
        Asset {
            name: flatten_string(value.get("name")),
            display_name: flatten_string(value.get("displayName")),
            uid: flatten_string(value.get("uid")),
            create_time: flatten_string(value.get("createTime")),
            update_time: flatten_string(value.get("updateTime")),
            labels: flatten_key_value_pairs(value.get("labels")),
            description: flatten_string(value.get("description")),
            state: flatten_enum(value.get("state")),
            resource_spec: AssetResourceSpec::flatten(value.get("resourceSpec")),
            resource_status: AssetResourceStatus::flatten(value.get("resourceStatus")),
            security_status: AssetSecurityStatus::flatten(value.get("securityStatus")),
            discovery_spec: DiscoverySpec::flatten(value.get("discoverySpec"), None),
            discovery_status: AssetDiscoveryStatus::flatten(value.get("discoveryStatus")),
            project: document_string(value, "project"),
            location: document_string(value, "location"),
            lake: document_string(value, "lake"),
            dataplex_zone: document_string(value, "zone"),
        }
    }

    /// Same body as create; the status objects are output only and left out.
    fn update_request(&self) -> Result<Map<String, Value>> {
        self.expand()
    }

    fn inherit_parent(&mut self, parent: &Self) {
        self.project = parent.project.clone();
        self.location = parent.location.clone();
        self.lake = parent.lake.clone();
        self.dataplex_zone = parent.dataplex_zone.clone();
    }

    fn adopt_identity(&mut self, from: &Self) {
        self.inherit_parent(from);
        self.name = from.name.clone();
    }

    fn canonicalize_desired(raw_desired: &Self, raw_initial: Option<&Self>) -> Self {
        let Some(initial) = raw_initial else {
            return Asset {
                resource_spec: AssetResourceSpec::canonicalize_desired(&raw_desired.resource_spec, &None),
                resource_status: AssetResourceStatus::canonicalize_desired(&raw_desired.resource_status, &None),
                security_status: AssetSecurityStatus::canonicalize_desired(&raw_desired.security_status, &None),
                discovery_spec: DiscoverySpec::canonicalize_desired(&raw_desired.discovery_spec, &None),
                discovery_status: AssetDiscoveryStatus::canonicalize_desired(&raw_desired.discovery_status, &None),
                ..raw_desired.clone()
            };
        };
        let d = raw_desired;

        Asset {
            name: pick(
                &d.name,
                &initial.name,
                partial_self_link_to_self_link(&d.name, &initial.name),
            ),
            display_name: pick_string(&d.display_name, &initial.display_name),
            labels: pick_unless_zero(&d.labels, &initial.labels),
            description: pick_string(&d.description, &initial.description),
            resource_spec: AssetResourceSpec::canonicalize_desired(&d.resource_spec, &initial.resource_spec),
            discovery_spec: DiscoverySpec::canonicalize_desired(&d.discovery_spec, &initial.discovery_spec),
            project: pick(&d.project, &initial.project, name_to_self_link(&d.project, &initial.project)),
            location: pick(
                &d.location,
                &initial.location,
                name_to_self_link(&d.location, &initial.location),
            ),
            lake: pick(&d.lake, &initial.lake, name_to_self_link(&d.lake, &initial.lake)),
            dataplex_zone: pick(
                &d.dataplex_zone,
                &initial.dataplex_zone,
                name_to_self_link(&d.dataplex_zone, &initial.dataplex_zone),
            ),
            ..Default::default()
        }
    }

    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self {
        let d = raw_desired;
        let n = raw_new;
        let name_equivalent = partial_self_link_to_self_link(&d.name, &n.name);

        Asset {
            name: keep_desired(&d.name, n.name, name_equivalent),
            display_name: keep_string(&d.display_name, n.display_name),
            uid: keep_new(&d.uid, n.uid),
            create_time: keep_new(&d.create_time, n.create_time),
            update_time: keep_new(&d.update_time, n.update_time),
            labels: keep_new(&d.labels, n.labels),
            description: keep_string(&d.description, n.description),
            state: keep_new(&d.state, n.state),
            resource_spec: AssetResourceSpec::canonicalize_new(&d.resource_spec, n.resource_spec),
            resource_status: AssetResourceStatus::canonicalize_new(&d.resource_status, n.resource_status),
            security_status: AssetSecurityStatus::canonicalize_new(&d.security_status, n.security_status),
            discovery_spec: DiscoverySpec::canonicalize_new(&d.discovery_spec, n.discovery_spec),
            discovery_status: AssetDiscoveryStatus::canonicalize_new(&d.discovery_status, n.discovery_status),
            project: d.project.clone(),
            location: d.location.clone(),
            lake: d.lake.clone(),
            dataplex_zone: d.dataplex_zone.clone(),
        }
    }

    fn diff(desired: &Self, actual: &Self) -> Vec<FieldDiff> {
        let op = Self::UPDATE_OPERATION;
        let mut out = Vec::new();

        diff_field(&mut out, "name", &desired.name, &actual.name, DiffInfo::update(op));
        diff_field(&mut out, "displayName", &desired.display_name, &actual.display_name, DiffInfo::update(op));
        diff_field(&mut out, "uid", &desired.uid, &actual.uid, DiffInfo::output_only());
        diff_field(&mut out, "createTime", &desired.create_time, &actual.create_time, DiffInfo::output_only());
        diff_field(&mut out, "updateTime", &desired.update_time, &actual.update_time, DiffInfo::output_only());
        diff_field(&mut out, "labels", &desired.labels, &actual.labels, DiffInfo::update(op));
        diff_field(&mut out, "description", &desired.description, &actual.description, DiffInfo::update(op));
        diff_field(&mut out, "state", &desired.state, &actual.state, DiffInfo::output_only().enumeration());
        diff_object(&mut out, "resourceSpec", &desired.resource_spec, &actual.resource_spec, op, false);
        diff_object(&mut out, "resourceStatus", &desired.resource_status, &actual.resource_status, op, true);
        diff_object(&mut out, "securityStatus", &desired.security_status, &actual.security_status, op, true);
        diff_object(&mut out, "discoverySpec", &desired.discovery_spec, &actual.discovery_spec, op, false);
        diff_object(&mut out, "discoveryStatus", &desired.discovery_status, &actual.discovery_status, op, true);
        diff_field(&mut out, "project", &desired.project, &actual.project, DiffInfo::recreate().reference());
        diff_field(&mut out, "location", &desired.location, &actual.location, DiffInfo::recreate());
        diff_field(&mut out, "lake", &desired.lake, &actual.lake, DiffInfo::recreate().reference());
        diff_field(
            &mut out,
            "zone",
            &desired.dataplex_zone,
            &actual.dataplex_zone,
            DiffInfo::recreate().reference(),
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcl::diff::Remediation;
    use crate::dcl::error::DclError;
    use serde_json::json;

    fn asset() -> Asset {
        Asset {
            resource_spec: Some(AssetResourceSpec {
                name: Some("projects/p/buckets/raw-events".into()),
                resource_type: Some(AssetResourceSpecTypeEnum::new("STORAGE_BUCKET")),
                read_access_mode: Some(AssetResourceSpecReadAccessModeEnum::new("DIRECT")),
                empty: false,
            }),
            discovery_spec: Some(DiscoverySpec {
                enabled: Some(false),
                ..Default::default()
            }),
            ..Asset::new("p", "us-central1", "sales", "landing", "events")
        }
    }

    #[test]
    fn test_urls_use_zone_segment() {
        assert_eq!(
            asset().self_url(None).unwrap(),
            "https://dataplex.googleapis.com/v1/projects/p/locations/us-central1/lakes/sales/zones/landing/assets/events"
        );
        assert!(asset().create_url(None).unwrap().ends_with("/assets?assetId=events"));
        let orphan = Asset {
            dataplex_zone: None,
            ..asset()
        };
        assert!(matches!(
            orphan.self_url(None),
            Err(DclError::RequiredParameter("DataplexZone"))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(asset().validate().is_ok());
        let no_type = Asset {
            resource_spec: Some(AssetResourceSpec {
                name: Some("projects/p/buckets/b".into()),
                ..Default::default()
            }),
            ..asset()
        };
        assert!(matches!(no_type.validate(), Err(DclError::RequiredField { field: "type", .. })));
        let bad_mode = Asset {
            resource_spec: Some(AssetResourceSpec {
                read_access_mode: Some(AssetResourceSpecReadAccessModeEnum::new("CACHED")),
                ..asset().resource_spec.unwrap()
            }),
            ..asset()
        };
        assert!(matches!(bad_mode.validate(), Err(DclError::InvalidEnum { .. })));
    }

    #[test]
    fn test_flatten_document_reads_zone_key() {
        let doc = json!({
            "name": "events",
            "project": "p",
            "location": "us-central1",
            "lake": "sales",
            "zone": "landing",
            "resourceSpec": {"type": "STORAGE_BUCKET", "name": "projects/p/buckets/b"},
            "discoverySpec": {"enabled": true}
        });
        let a = Asset::flatten(doc.as_object().unwrap());
        assert_eq!(a.dataplex_zone.as_deref(), Some("landing"));
        assert_eq!(a.full_name().unwrap(), "projects/p/locations/us-central1/lakes/sales/zones/landing/assets/events");
        assert!(a.validate().is_ok());

        let missing_enabled = json!({"discoverySpec": {"schedule": "x"}});
        let a = Asset::flatten(missing_enabled.as_object().unwrap());
        assert_eq!(a.discovery_spec.unwrap().enabled, None);
    }

    #[test]
    fn test_flatten_discovery_status() {
        let body = json!({
            "discoveryStatus": {
                "state": "SCHEDULED",
                "stats": {"dataItems": "12", "tables": 2},
                "lastRunDuration": "3.5s"
            },
            "securityStatus": {"state": "READY"}
        });
        let a = Asset::flatten(body.as_object().unwrap());
        let status = a.discovery_status.unwrap();
        assert_eq!(status.state, Some(AssetDiscoveryStatusStateEnum::new("SCHEDULED")));
        let stats = status.stats.unwrap();
        assert_eq!(stats.data_items, Some(12));
        assert_eq!(stats.tables, Some(2));
        assert_eq!(a.security_status.unwrap().state, Some(AssetSecurityStatusStateEnum::new("READY")));
    }

    #[test]
    fn test_diff_read_access_mode_updates_but_bucket_recreates() {
        let desired = asset();
        let mut actual = asset();
        if let Some(spec) = actual.resource_spec.as_mut() {
            spec.read_access_mode = Some(AssetResourceSpecReadAccessModeEnum::new("MANAGED"));
        }
        let diffs = Asset::diff(&desired, &actual);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field_name, "resourceSpec.readAccessMode");
        assert_eq!(diffs[0].remediation, Remediation::Update("updateAssetUpdateAssetOperation"));

        if let Some(spec) = actual.resource_spec.as_mut() {
            spec.name = Some("projects/p/buckets/other".into());
        }
        let diffs = Asset::diff(&desired, &actual);
        assert!(diffs
            .iter()
            .any(|d| d.field_name == "resourceSpec.name" && d.remediation == Remediation::Recreate));
    }

    #[test]
    fn test_status_diffs_are_noop() {
        let desired = Asset {
            discovery_status: Some(AssetDiscoveryStatus {
                message: Some("stale".into()),
                ..Default::default()
            }),
            ..asset()
        };
        let diffs = Asset::diff(&desired, &asset());
        assert_eq!(diffs.len(), 1);
        assert!(!diffs[0].is_actionable());
    }
}
