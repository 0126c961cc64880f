//! The per-resource surface the generic client drives

use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::dcl::canonicalize::self_link_to_name;
use crate::dcl::diff::FieldDiff;
use crate::dcl::error::{DclError, Result};

/// Short form of a required identity field.
pub(crate) fn identity<'a>(param: &'static str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref().map(self_link_to_name) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DclError::RequiredParameter(param)),
    }
}

/// Reads an identity field that only appears in desired-state documents.
pub(crate) fn document_string(value: &Map<String, Value>, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A Dataplex resource that can be fetched, listed, applied and deleted.
///
/// Implementors are plain data; every method is pure. The async behavior
/// lives in [`super::Client`].
pub trait DataplexResource: Clone + Debug + Default + Send + Sync + 'static {
    /// Display name used in logs and errors, e.g. `Lake`.
    const KIND: &'static str;
    /// Array field holding items in a list response, e.g. `lakes`.
    const LIST_FIELD: &'static str;
    /// Name of the single update operation the API offers.
    const UPDATE_OPERATION: &'static str;

    /// Checks required fields and enum values of user input.
    fn validate(&self) -> Result<()>;

    /// Copy with identity fields reduced to their last path segment.
    fn url_normalized(&self) -> Self;

    /// URL for GET, PATCH and DELETE.
    fn self_url(&self, user_base_path: Option<&str>) -> Result<String>;

    /// URL of the parent collection.
    fn list_url(&self, user_base_path: Option<&str>) -> Result<String>;

    /// Collection URL with the `<kind>Id` query parameter.
    fn create_url(&self, user_base_path: Option<&str>) -> Result<String>;

    /// Request body for create.
    fn expand(&self) -> Result<Map<String, Value>>;

    /// Builds a resource from an API response object.
    fn flatten(value: &Map<String, Value>) -> Self;

    /// Builds a desired state from a user document. Defaults the API
    /// implies for omitted response fields are not filled in.
    fn from_document(value: &Map<String, Value>) -> Self {
        Self::flatten(value)
    }

    /// Request body for the update operation.
    fn update_request(&self) -> Result<Map<String, Value>>;

    /// Copies the parent identity (project, location and so on) from `parent`.
    fn inherit_parent(&mut self, parent: &Self);

    /// Copies the full identity, including the resource's own name.
    fn adopt_identity(&mut self, from: &Self);

    /// Resolves the user's desired state against what the server reported,
    /// keeping server values wherever they are equivalent.
    fn canonicalize_desired(raw_desired: &Self, raw_initial: Option<&Self>) -> Self;

    /// Resolves a server response against the desired state, keeping
    /// desired values wherever they are equivalent.
    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self;

    /// Differences between `desired` and `actual`.
    fn diff(desired: &Self, actual: &Self) -> Vec<FieldDiff>;
}
