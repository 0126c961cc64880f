//! Zone: a raw or curated data domain inside a lake

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::common::{AssetStatus, DiscoverySpec};
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
use crate::dcl::validate::{required, required_object, required_parameter};

string_enum!(
    ZoneStateEnum {
        "STATE_UNSPECIFIED",
        "ACTIVE",
        "CREATING",
        "DELETING",
        "ACTION_REQUIRED",
    }
);

string_enum!(
    /// RAW zones hold unprocessed data; CURATED zones hold structured data
    /// ready for analytics.
    ZoneTypeEnum { "TYPE_UNSPECIFIED", "RAW", "CURATED" }
);

string_enum!(
    ZoneResourceSpecLocationTypeEnum {
        "LOCATION_TYPE_UNSPECIFIED",
        "SINGLE_REGION",
        "MULTI_REGION",
    }
);

pub type ZoneAssetStatus = AssetStatus;
pub type ZoneDiscoverySpec = DiscoverySpec;

/// Where the zone's attached resources may live. Immutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResourceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_type: Option<ZoneResourceSpecLocationTypeEnum>,
    /// True only for the explicit empty-object sentinel.
    #[serde(skip)]
    pub empty: bool,
}

impl NestedObject for ZoneResourceSpec {
    const EMPTY: Self = ZoneResourceSpec {
        location_type: None,
        empty: true,
    };

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn compare(&self, actual: &Self, path: &str, _op: &'static str, out: &mut Vec<FieldDiff>) {
        diff_field(
            out,
            nest(path, "locationType"),
            &self.location_type,
            &actual.location_type,
            DiffInfo::recreate().enumeration(),
        );
    }
}

impl ZoneResourceSpec {
    fn expand(&self) -> Map<String, Value> {
        let mut m = Map::new();
        put(&mut m, "locationType", &self.location_type);
        m
    }

    fn flatten(value: Option<&Value>) -> Option<Self> {
        flatten_object(value, |m| ZoneResourceSpec {
            location_type: flatten_enum(m.get("locationType")),
            empty: false,
        })
    }

    fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
        nested_desired(des, initial, |d, i| ZoneResourceSpec {
            location_type: pick_unless_zero(&d.location_type, &i.location_type),
            empty: false,
        })
    }

    fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
        nested_new(des, nw, |_, n| n)
    }
}

/// A Dataplex zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
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
    pub state: Option<ZoneStateEnum>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<ZoneTypeEnum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_spec: Option<ZoneDiscoverySpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_spec: Option<ZoneResourceSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_status: Option<ZoneAssetStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lake: Option<String>,
}

impl Zone {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        lake: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Zone {
            project: Some(project.into()),
            location: Some(location.into()),
            lake: Some(lake.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    fn parent_params(&self) -> Result<[(&'static str, &str); 3]> {
        Ok([
            ("project", identity("Project", &self.project)?),
            ("location", identity("Location", &self.location)?),
            ("lake", identity("Lake", &self.lake)?),
        ])
    }

    fn params(&self) -> Result<[(&'static str, &str); 4]> {
        let [project, location, lake] = self.parent_params()?;
        Ok([project, location, lake, ("name", identity("Name", &self.name)?)])
    }

    /// `projects/{project}/locations/{location}/lakes/{lake}/zones/{name}`
    pub fn full_name(&self) -> Result<String> {
        let [(_, project), (_, location), (_, lake), (_, name)] = self.params()?;
        Ok(format!(
            "projects/{project}/locations/{location}/lakes/{lake}/zones/{name}"
        ))
    }

    fn expand_common(&self) -> Result<Map<String, Value>> {
        let mut m = Map::new();
        m.insert("name".to_string(), Value::String(self.full_name()?));
        put(&mut m, "displayName", &self.display_name);
        put(&mut m, "labels", &self.labels);
        put(&mut m, "description", &self.description);
        Ok(m)
    }

    /// `missing_enabled` fills `discoverySpec.enabled` when it is absent.
    fn flatten_with(value: &Map<String, Value>, missing_enabled: Option<bool>) -> Self {
        Zone {
            name: flatten_string(value.get("name")),
            display_name: flatten_string(value.get("displayName")),
            uid: flatten_string(value.get("uid")),
            create_time: flatten_string(value.get("createTime")),
            update_time: flatten_string(value.get("updateTime")),
            labels: flatten_key_value_pairs(value.get("labels")),
            description: flatten_string(value.get("description")),
            state: flatten_enum(value.get("state")),
            zone_type: flatten_enum(value.get("type")),
            discovery_spec: DiscoverySpec::flatten(value.get("discoverySpec"), missing_enabled),
            resource_spec: ZoneResourceSpec::flatten(value.get("resourceSpec")),
            asset_status: AssetStatus::flatten(value.get("assetStatus")),
            project: document_string(value, "project"),
            location: document_string(value, "location"),
            lake: document_string(value, "lake"),
        }
    }
}

impl DataplexResource for Zone {
    const KIND: &'static str = "Zone";
    const LIST_FIELD: &'static str = "zones";
    const UPDATE_OPERATION: &'static str = "updateZoneUpdateZoneOperation";

    fn validate(&self) -> Result<()> {
        required("Zone", "name", &self.name)?;
        required("Zone", "type", &self.zone_type)?;
        required_object("Zone", "discoverySpec", &self.discovery_spec)?;
        required_object("Zone", "resourceSpec", &self.resource_spec)?;
        required_parameter("Project", &self.project)?;
        required_parameter("Location", &self.location)?;
        required_parameter("Lake", &self.lake)?;
        validate_opt(&self.state)?;
        validate_opt(&self.zone_type)?;
        if let Some(spec) = &self.discovery_spec {
            spec.validate("Zone")?;
        }
        if let Some(spec) = &self.resource_spec {
            required("Zone", "locationType", &spec.location_type)?;
            validate_opt(&spec.location_type)?;
        }
        Ok(())
    }

    fn url_normalized(&self) -> Self {
        Zone {
            name: short_name(&self.name),
            project: short_name(&self.project),
            location: short_name(&self.location),
            lake: short_name(&self.lake),
            ..self.clone()
        }
    }

    fn self_url(&self, user_base_path: Option<&str>) -> Result<String> {
        Ok(url(
            "projects/{{project}}/locations/{{location}}/lakes/{{lake}}/zones/{{name}}",
            DEFAULT_BASE_PATH,
            user_base_path,
            &self.params()?,
        ))
    }

    fn list_url(&self, user_base_path: Option<&str>) -> Result<String> {
        Ok(url(
            "projects/{{project}}/locations/{{location}}/lakes/{{lake}}/zones",
            DEFAULT_BASE_PATH,
            user_base_path,
            &self.parent_params()?,
        ))
    }

    fn create_url(&self, user_base_path: Option<&str>) -> Result<String> {
        Ok(url(
            "projects/{{project}}/locations/{{location}}/lakes/{{lake}}/zones?zoneId={{name}}",
            DEFAULT_BASE_PATH,
            user_base_path,
            &self.params()?,
        ))
    }

    fn expand(&self) -> Result<Map<String, Value>> {
        let mut m = self.expand_common()?;
        put(&mut m, "type", &self.zone_type);
        put_object(&mut m, "discoverySpec", DiscoverySpec::expand(&self.discovery_spec));
        put_object(&mut m, "resourceSpec", expand_object(&self.resource_spec, ZoneResourceSpec::expand));
        Ok(m)
    }

    fn flatten(value: &Map<String, Value>) -> Self {
        // The API drops `enabled: false` from responses.
        Self::flatten_with(value, Some(false))
    }

    fn from_document(value: &Map<String, Value>) -> Self {
        Self::flatten_with(value, None)
    }

    fn update_request(&self) -> Result<Map<String, Value>> {
        let mut m = self.expand_common()?;
        put_object(&mut m, "discoverySpec", DiscoverySpec::expand(&self.discovery_spec));
        Ok(m)
    }

    fn inherit_parent(&mut self, parent: &Self) {
        self.project = parent.project.clone();
        self.location = parent.location.clone();
        self.lake = parent.lake.clone();
    }

    fn adopt_identity(&mut self, from: &Self) {
        self.inherit_parent(from);
        self.name = from.name.clone();
    }

    fn canonicalize_desired(raw_desired: &Self, raw_initial: Option<&Self>) -> Self {
        let Some(initial) = raw_initial else {
            return Zone {
                discovery_spec: DiscoverySpec::canonicalize_desired(&raw_desired.discovery_spec, &None),
                resource_spec: ZoneResourceSpec::canonicalize_desired(&raw_desired.resource_spec, &None),
                asset_status: AssetStatus::canonicalize_desired(&raw_desired.asset_status, &None),
                ..raw_desired.clone()
            };
        };
        let d = raw_desired;

        Zone {
            name: pick(
                &d.name,
                &initial.name,
                partial_self_link_to_self_link(&d.name, &initial.name),
            ),
            display_name: pick_string(&d.display_name, &initial.display_name),
            labels: pick_unless_zero(&d.labels, &initial.labels),
            description: pick_string(&d.description, &initial.description),
            zone_type: pick_unless_zero(&d.zone_type, &initial.zone_type),
            discovery_spec: DiscoverySpec::canonicalize_desired(&d.discovery_spec, &initial.discovery_spec),
            resource_spec: ZoneResourceSpec::canonicalize_desired(&d.resource_spec, &initial.resource_spec),
            project: pick(&d.project, &initial.project, name_to_self_link(&d.project, &initial.project)),
            location: pick(
                &d.location,
                &initial.location,
                name_to_self_link(&d.location, &initial.location),
            ),
            lake: pick(&d.lake, &initial.lake, name_to_self_link(&d.lake, &initial.lake)),
            ..Default::default()
        }
    }

    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self {
        let d = raw_desired;
        let n = raw_new;
        let name_equivalent = partial_self_link_to_self_link(&d.name, &n.name);

        Zone {
            name: keep_desired(&d.name, n.name, name_equivalent),
            display_name: keep_string(&d.display_name, n.display_name),
            uid: keep_new(&d.uid, n.uid),
            create_time: keep_new(&d.create_time, n.create_time),
            update_time: keep_new(&d.update_time, n.update_time),
            labels: keep_new(&d.labels, n.labels),
            description: keep_string(&d.description, n.description),
            state: keep_new(&d.state, n.state),
            zone_type: keep_new(&d.zone_type, n.zone_type),
            discovery_spec: DiscoverySpec::canonicalize_new(&d.discovery_spec, n.discovery_spec),
            resource_spec: ZoneResourceSpec::canonicalize_new(&d.resource_spec, n.resource_spec),
            asset_status: AssetStatus::canonicalize_new(&d.asset_status, n.asset_status),
            project: d.project.clone(),
            location: d.location.clone(),
            lake: d.lake.clone(),
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
        diff_field(&mut out, "type", &desired.zone_type, &actual.zone_type, DiffInfo::recreate().enumeration());
        diff_object(&mut out, "discoverySpec", &desired.discovery_spec, &actual.discovery_spec, op, false);
        diff_object(&mut out, "resourceSpec", &desired.resource_spec, &actual.resource_spec, op, false);
        diff_object(&mut out, "assetStatus", &desired.asset_status, &actual.asset_status, op, true);
        diff_field(&mut out, "project", &desired.project, &actual.project, DiffInfo::recreate().reference());
        diff_field(&mut out, "location", &desired.location, &actual.location, DiffInfo::recreate());
        diff_field(&mut out, "lake", &desired.lake, &actual.lake, DiffInfo::recreate().reference());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcl::diff::Remediation;
    use crate::dcl::error::DclError;
    use serde_json::json;

    fn zone() -> Zone {
        Zone {
            zone_type: Some(ZoneTypeEnum::new("RAW")),
            discovery_spec: Some(DiscoverySpec {
                enabled: Some(true),
                include_patterns: Some(vec!["raw/**".into()]),
                ..Default::default()
            }),
            resource_spec: Some(ZoneResourceSpec {
                location_type: Some(ZoneResourceSpecLocationTypeEnum::new("SINGLE_REGION")),
                empty: false,
            }),
            ..Zone::new("p", "us-central1", "sales", "landing")
        }
    }

    #[test]
    fn test_urls_include_lake() {
        assert_eq!(
            zone().create_url(None).unwrap(),
            "https://dataplex.googleapis.com/v1/projects/p/locations/us-central1/lakes/sales/zones?zoneId=landing"
        );
        let no_lake = Zone { lake: None, ..zone() };
        assert!(matches!(no_lake.list_url(None), Err(DclError::RequiredParameter("Lake"))));
    }

    #[test]
    fn test_validate_requires_nested_fields() {
        assert!(zone().validate().is_ok());

        let missing_enabled = Zone {
            discovery_spec: Some(DiscoverySpec::default()),
            ..zone()
        };
        assert!(matches!(
            missing_enabled.validate(),
            Err(DclError::RequiredField { field: "enabled", .. })
        ));

        let bad_type = Zone {
            zone_type: Some(ZoneTypeEnum::new("WARM")),
            ..zone()
        };
        assert!(matches!(bad_type.validate(), Err(DclError::InvalidEnum { .. })));
    }

    #[test]
    fn test_flatten_defaults_enabled_to_false() {
        let body = json!({
            "name": "projects/p/locations/us-central1/lakes/sales/zones/landing",
            "type": "RAW",
            "discoverySpec": {"schedule": "0 * * * *"},
            "resourceSpec": {"locationType": "SINGLE_REGION"}
        });
        let z = Zone::flatten(body.as_object().unwrap());
        let spec = z.discovery_spec.unwrap();
        assert_eq!(spec.enabled, Some(false));
        assert_eq!(spec.schedule.as_deref(), Some("0 * * * *"));
    }

    #[test]
    fn test_document_without_enabled_fails_validation() {
        let doc = json!({
            "name": "landing",
            "project": "p",
            "location": "us-central1",
            "lake": "sales",
            "type": "RAW",
            "discoverySpec": {"includePatterns": ["*.csv"]},
            "resourceSpec": {"locationType": "SINGLE_REGION"}
        });
        let z = Zone::from_document(doc.as_object().unwrap());
        assert_eq!(z.discovery_spec.as_ref().unwrap().enabled, None);
        assert!(matches!(
            z.validate(),
            Err(DclError::RequiredField { field: "enabled", .. })
        ));
    }

    #[test]
    fn test_expand_and_update_request() {
        let z = zone();
        let body = z.expand().unwrap();
        assert_eq!(body["name"], json!("projects/p/locations/us-central1/lakes/sales/zones/landing"));
        assert_eq!(body["type"], json!("RAW"));
        assert_eq!(body["resourceSpec"], json!({"locationType": "SINGLE_REGION"}));
        assert_eq!(body["discoverySpec"]["includePatterns"], json!(["raw/**"]));

        let update = z.update_request().unwrap();
        assert!(!update.contains_key("type"));
        assert!(!update.contains_key("resourceSpec"));
        assert!(update.contains_key("discoverySpec"));
    }

    #[test]
    fn test_diff_type_and_location_type_recreate() {
        let desired = zone();
        let actual = Zone {
            zone_type: Some(ZoneTypeEnum::new("CURATED")),
            resource_spec: Some(ZoneResourceSpec {
                location_type: Some(ZoneResourceSpecLocationTypeEnum::new("MULTI_REGION")),
                empty: false,
            }),
            discovery_spec: Some(DiscoverySpec {
                enabled: Some(false),
                ..Default::default()
            }),
            ..zone()
        };
        let diffs = Zone::diff(&desired, &actual);
        let remediation = |n: &str| {
            diffs
                .iter()
                .find(|d| d.field_name == n)
                .map(|d| d.remediation.clone())
        };
        assert_eq!(remediation("type"), Some(Remediation::Recreate));
        assert_eq!(remediation("resourceSpec.locationType"), Some(Remediation::Recreate));
        assert_eq!(
            remediation("discoverySpec.enabled"),
            Some(Remediation::Update("updateZoneUpdateZoneOperation"))
        );
        assert_eq!(
            remediation("discoverySpec.includePatterns"),
            Some(Remediation::Update("updateZoneUpdateZoneOperation"))
        );
    }

    #[test]
    fn test_canonicalize_round_trip_has_no_diffs() {
        let desired = zone();
        let body = desired.expand().unwrap();
        let mut server = Zone::flatten(&body);
        server.adopt_identity(&desired);
        server.uid = Some("abc".into());
        let new_state = Zone::canonicalize_new(server, &desired);
        let canonical = Zone::canonicalize_desired(&desired, Some(&new_state));
        assert!(Zone::diff(&canonical, &new_state).is_empty());
    }
}
