//! Nested messages shared by more than one Dataplex resource

use serde::Serialize;
use serde_json::{Map, Value};

use crate::dcl::canonicalize::{
    keep_bool, keep_string, keep_strings, nested_desired, nested_new, pick_bool, pick_string,
    pick_strings, pick_unless_zero,
};
use crate::dcl::diff::{diff_field, diff_object, nest, DiffInfo, FieldDiff, NestedObject};
use crate::dcl::error::Result;
use crate::dcl::flatten::{
    expand_object, flatten_bool, flatten_integer, flatten_object, flatten_string,
    flatten_string_slice, put, put_object,
};
use crate::dcl::validate::required;

/// Aggregated asset counts reported on lakes and zones. Output only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_assets: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_policy_applying_assets: Option<i64>,
    /// True only for the explicit empty-object sentinel.
    #[serde(skip)]
    pub empty: bool,
}

impl NestedObject for AssetStatus {
    const EMPTY: Self = AssetStatus {
        update_time: None,
        active_assets: None,
        security_policy_applying_assets: None,
        empty: true,
    };

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn compare(&self, actual: &Self, path: &str, op: &'static str, out: &mut Vec<FieldDiff>) {
        let info = DiffInfo::update(op);
        diff_field(out, nest(path, "updateTime"), &self.update_time, &actual.update_time, info.clone());
        diff_field(out, nest(path, "activeAssets"), &self.active_assets, &actual.active_assets, info.clone());
        diff_field(
            out,
            nest(path, "securityPolicyApplyingAssets"),
            &self.security_policy_applying_assets,
            &actual.security_policy_applying_assets,
            info,
        );
    }
}

impl AssetStatus {
    pub(crate) fn flatten(value: Option<&Value>) -> Option<Self> {
        flatten_object(value, |m| AssetStatus {
            update_time: flatten_string(m.get("updateTime")),
            active_assets: flatten_integer(m.get("activeAssets")),
            security_policy_applying_assets: flatten_integer(m.get("securityPolicyApplyingAssets")),
            empty: false,
        })
    }

    pub(crate) fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
        nested_desired(des, initial, |d, i| AssetStatus {
            update_time: pick_unless_zero(&d.update_time, &i.update_time),
            active_assets: pick_unless_zero(&d.active_assets, &i.active_assets),
            security_policy_applying_assets: pick_unless_zero(
                &d.security_policy_applying_assets,
                &i.security_policy_applying_assets,
            ),
            empty: false,
        })
    }

    pub(crate) fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
        nested_new(des, nw, |_, n| n)
    }
}

/// CSV parsing hints for discovery.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_rows: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_type_inference: Option<bool>,
    /// True only for the explicit empty-object sentinel.
    #[serde(skip)]
    pub empty: bool,
}

impl NestedObject for CsvOptions {
    const EMPTY: Self = CsvOptions {
        header_rows: None,
        delimiter: None,
        encoding: None,
        disable_type_inference: None,
        empty: true,
    };

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn compare(&self, actual: &Self, path: &str, op: &'static str, out: &mut Vec<FieldDiff>) {
        let info = DiffInfo::update(op);
        diff_field(out, nest(path, "headerRows"), &self.header_rows, &actual.header_rows, info.clone());
        diff_field(out, nest(path, "delimiter"), &self.delimiter, &actual.delimiter, info.clone());
        diff_field(out, nest(path, "encoding"), &self.encoding, &actual.encoding, info.clone());
        diff_field(
            out,
            nest(path, "disableTypeInference"),
            &self.disable_type_inference,
            &actual.disable_type_inference,
            info,
        );
    }
}

impl CsvOptions {
    fn expand(&self) -> Map<String, Value> {
        let mut m = Map::new();
        put(&mut m, "headerRows", &self.header_rows);
        put(&mut m, "delimiter", &self.delimiter);
        put(&mut m, "encoding", &self.encoding);
        put(&mut m, "disableTypeInference", &self.disable_type_inference);
        m
    }

    fn flatten(value: Option<&Value>) -> Option<Self> {
        flatten_object(value, |m| CsvOptions {
            header_rows: flatten_integer(m.get("headerRows")),
            delimiter: flatten_string(m.get("delimiter")),
            encoding: flatten_string(m.get("encoding")),
            disable_type_inference: flatten_bool(m.get("disableTypeInference")),
            empty: false,
        })
    }

    fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
        nested_desired(des, initial, |d, i| CsvOptions {
            header_rows: pick_unless_zero(&d.header_rows, &i.header_rows),
            delimiter: pick_string(&d.delimiter, &i.delimiter),
            encoding: pick_string(&d.encoding, &i.encoding),
            disable_type_inference: pick_bool(d.disable_type_inference, i.disable_type_inference),
            empty: false,
        })
    }

    fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
        nested_new(des, nw, |d, n| CsvOptions {
            header_rows: n.header_rows,
            delimiter: keep_string(&d.delimiter, n.delimiter),
            encoding: keep_string(&d.encoding, n.encoding),
            disable_type_inference: keep_bool(d.disable_type_inference, n.disable_type_inference),
            empty: n.empty,
        })
    }
}

/// JSON parsing hints for discovery.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_type_inference: Option<bool>,
    /// True only for the explicit empty-object sentinel.
    #[serde(skip)]
    pub empty: bool,
}

impl NestedObject for JsonOptions {
    const EMPTY: Self = JsonOptions {
        encoding: None,
        disable_type_inference: None,
        empty: true,
    };

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn compare(&self, actual: &Self, path: &str, op: &'static str, out: &mut Vec<FieldDiff>) {
        let info = DiffInfo::update(op);
        diff_field(out, nest(path, "encoding"), &self.encoding, &actual.encoding, info.clone());
        diff_field(
            out,
            nest(path, "disableTypeInference"),
            &self.disable_type_inference,
            &actual.disable_type_inference,
            info,
        );
    }
}

impl JsonOptions {
    fn expand(&self) -> Map<String, Value> {
        let mut m = Map::new();
        put(&mut m, "encoding", &self.encoding);
        put(&mut m, "disableTypeInference", &self.disable_type_inference);
        m
    }

    fn flatten(value: Option<&Value>) -> Option<Self> {
        flatten_object(value, |m| JsonOptions {
            encoding: flatten_string(m.get("encoding")),
            disable_type_inference: flatten_bool(m.get("disableTypeInference")),
            empty: false,
        })
    }

    fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
        nested_desired(des, initial, |d, i| JsonOptions {
            encoding: pick_string(&d.encoding, &i.encoding),
            disable_type_inference: pick_bool(d.disable_type_inference, i.disable_type_inference),
            empty: false,
        })
    }

    fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
        nested_new(des, nw, |d, n| JsonOptions {
            encoding: keep_string(&d.encoding, n.encoding),
            disable_type_inference: keep_bool(d.disable_type_inference, n.disable_type_inference),
            empty: n.empty,
        })
    }
}

/// Discovery settings for zones and assets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySpec {
    /// Required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_options: Option<CsvOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_options: Option<JsonOptions>,
    /// Cron schedule, e.g. `CRON_TZ=America/New_York 1 * * * *`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    /// True only for the explicit empty-object sentinel.
    #[serde(skip)]
    pub empty: bool,
}

impl NestedObject for DiscoverySpec {
    const EMPTY: Self = DiscoverySpec {
        enabled: None,
        include_patterns: None,
        exclude_patterns: None,
        csv_options: None,
        json_options: None,
        schedule: None,
        empty: true,
    };

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn compare(&self, actual: &Self, path: &str, op: &'static str, out: &mut Vec<FieldDiff>) {
        let info = DiffInfo::update(op);
        diff_field(out, nest(path, "enabled"), &self.enabled, &actual.enabled, info.clone());
        diff_field(
            out,
            nest(path, "includePatterns"),
            &self.include_patterns,
            &actual.include_patterns,
            info.clone(),
        );
        diff_field(
            out,
            nest(path, "excludePatterns"),
            &self.exclude_patterns,
            &actual.exclude_patterns,
            info.clone(),
        );
        diff_object(out, &nest(path, "csvOptions"), &self.csv_options, &actual.csv_options, op, false);
        diff_object(out, &nest(path, "jsonOptions"), &self.json_options, &actual.json_options, op, false);
        diff_field(out, nest(path, "schedule"), &self.schedule, &actual.schedule, info);
    }
}

impl DiscoverySpec {
    pub(crate) fn validate(&self, resource: &'static str) -> Result<()> {
        required(resource, "enabled", &self.enabled)
    }

    pub(crate) fn expand(value: &Option<Self>) -> Option<Map<String, Value>> {
        expand_object(value, |d| {
            let mut m = Map::new();
            put(&mut m, "enabled", &d.enabled);
            put(&mut m, "includePatterns", &d.include_patterns);
            put(&mut m, "excludePatterns", &d.exclude_patterns);
            put_object(&mut m, "csvOptions", expand_object(&d.csv_options, CsvOptions::expand));
            put_object(&mut m, "jsonOptions", expand_object(&d.json_options, JsonOptions::expand));
            put(&mut m, "schedule", &d.schedule);
            m
        })
    }

    /// `missing_enabled` fills `enabled` when the server omits it.
    pub(crate) fn flatten(value: Option<&Value>, missing_enabled: Option<bool>) -> Option<Self> {
        flatten_object(value, |m| DiscoverySpec {
            enabled: flatten_bool(m.get("enabled")).or(missing_enabled),
            include_patterns: flatten_string_slice(m.get("includePatterns")),
            exclude_patterns: flatten_string_slice(m.get("excludePatterns")),
            csv_options: CsvOptions::flatten(m.get("csvOptions")),
            json_options: JsonOptions::flatten(m.get("jsonOptions")),
            schedule: flatten_string(m.get("schedule")),
            empty: false,
        })
    }

    pub(crate) fn canonicalize_desired(des: &Option<Self>, initial: &Option<Self>) -> Option<Self> {
        nested_desired(des, initial, |d, i| DiscoverySpec {
            enabled: pick_bool(d.enabled, i.enabled),
            include_patterns: pick_strings(&d.include_patterns, &i.include_patterns),
            exclude_patterns: pick_strings(&d.exclude_patterns, &i.exclude_patterns),
            csv_options: CsvOptions::canonicalize_desired(&d.csv_options, &i.csv_options),
            json_options: JsonOptions::canonicalize_desired(&d.json_options, &i.json_options),
            schedule: pick_string(&d.schedule, &i.schedule),
            empty: false,
        })
    }

    pub(crate) fn canonicalize_new(des: &Option<Self>, nw: Option<Self>) -> Option<Self> {
        nested_new(des, nw, |d, n| DiscoverySpec {
            enabled: keep_bool(d.enabled, n.enabled),
            include_patterns: keep_strings(&d.include_patterns, n.include_patterns),
            exclude_patterns: keep_strings(&d.exclude_patterns, n.exclude_patterns),
            csv_options: CsvOptions::canonicalize_new(&d.csv_options, n.csv_options),
            json_options: JsonOptions::canonicalize_new(&d.json_options, n.json_options),
            schedule: keep_string(&d.schedule, n.schedule),
            empty: n.empty,
        })
    }
}
