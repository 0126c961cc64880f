//! Field-level diffing between desired and actual resource states

use std::collections::BTreeMap;
use std::fmt;

use super::canonicalize::self_link_to_name;

/// How two leaf values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffKind {
    #[default]
    Plain,
    Enum,
    /// Compared by the last path segment, so `projects/p` matches `p`.
    Reference,
}

/// What must happen to converge a differing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remediation {
    /// Server-owned field; recorded but never acted on.
    NoOp,
    /// Resolved by the named update operation.
    Update(&'static str),
    /// The resource must be deleted and created again.
    Recreate,
}

/// Per-field diff metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffInfo {
    pub output_only: bool,
    pub kind: DiffKind,
    /// `None` means a change requires recreation.
    pub operation: Option<&'static str>,
}

impl DiffInfo {
    pub const fn update(op: &'static str) -> Self {
        Self {
            output_only: false,
            kind: DiffKind::Plain,
            operation: Some(op),
        }
    }

    pub const fn recreate() -> Self {
        Self {
            output_only: false,
            kind: DiffKind::Plain,
            operation: None,
        }
    }

    pub const fn output_only() -> Self {
        Self {
            output_only: true,
            kind: DiffKind::Plain,
            operation: None,
        }
    }

    pub const fn reference(mut self) -> Self {
        self.kind = DiffKind::Reference;
        self
    }

    pub const fn enumeration(mut self) -> Self {
        self.kind = DiffKind::Enum;
        self
    }

    fn remediation(&self) -> Remediation {
        if self.output_only {
            return Remediation::NoOp;
        }
        match self.operation {
            Some(op) => Remediation::Update(op),
            None => Remediation::Recreate,
        }
    }
}

/// One differing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    /// JSON field path, e.g. `discoverySpec.csvOptions.delimiter`.
    pub field_name: String,
    pub desired: Option<String>,
    pub actual: Option<String>,
    pub remediation: Remediation,
}

impl FieldDiff {
    pub fn is_actionable(&self) -> bool {
        self.remediation != Remediation::NoOp
    }
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: desired {}, actual {}",
            self.field_name,
            self.desired.as_deref().unwrap_or("<unset>"),
            self.actual.as_deref().unwrap_or("<unset>")
        )
    }
}

/// A leaf value that can be diffed.
pub trait FieldValue: Default {
    /// True when the value means "not managed".
    fn is_unset(&self) -> bool;

    fn equivalent(&self, actual: &Self, kind: DiffKind) -> bool;

    fn render(&self) -> String;
}

impl FieldValue for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn equivalent(&self, actual: &Self, kind: DiffKind) -> bool {
        match kind {
            DiffKind::Reference => self_link_to_name(self) == self_link_to_name(actual),
            _ => self.trim() == actual.trim(),
        }
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl FieldValue for bool {
    fn is_unset(&self) -> bool {
        false
    }

    fn equivalent(&self, actual: &Self, _kind: DiffKind) -> bool {
        self == actual
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for i64 {
    fn is_unset(&self) -> bool {
        *self == 0
    }

    fn equivalent(&self, actual: &Self, _kind: DiffKind) -> bool {
        self == actual
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for Vec<String> {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn equivalent(&self, actual: &Self, kind: DiffKind) -> bool {
        self.len() == actual.len()
            && self
                .iter()
                .zip(actual.iter())
                .all(|(d, a)| d.equivalent(a, kind))
    }

    fn render(&self) -> String {
        format!("{:?}", self)
    }
}

impl FieldValue for BTreeMap<String, String> {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn equivalent(&self, actual: &Self, _kind: DiffKind) -> bool {
        self == actual
    }

    fn render(&self) -> String {
        format!("{:?}", self)
    }
}

/// Joins a parent path and a field name.
pub fn nest(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{parent}.{field}")
    }
}

/// Compares one leaf field, appending a diff when desired is set and differs.
pub fn diff_field<T: FieldValue>(
    out: &mut Vec<FieldDiff>,
    field_name: impl Into<String>,
    desired: &Option<T>,
    actual: &Option<T>,
    info: DiffInfo,
) {
    let Some(d) = desired.as_ref().filter(|d| !d.is_unset()) else {
        return;
    };
    let fallback = T::default();
    let a = actual.as_ref().unwrap_or(&fallback);
    if d.equivalent(a, info.kind) {
        return;
    }
    out.push(FieldDiff {
        field_name: field_name.into(),
        desired: Some(d.render()),
        actual: actual.as_ref().map(FieldValue::render),
        remediation: info.remediation(),
    });
}

/// A nested message type with an empty sentinel and its own comparator.
pub trait NestedObject: Default + PartialEq {
    /// Explicitly empty value, distinct from "unset".
    const EMPTY: Self;

    /// True for the explicit empty sentinel.
    fn is_empty(&self) -> bool;

    /// True for the sentinel or a value with no fields set.
    fn is_blank(&self) -> bool {
        self.is_empty() || *self == Self::default()
    }

    /// Compares `self` (desired) against `actual`, emitting diffs under
    /// `path`. `op` is the owning resource's update operation.
    fn compare(&self, actual: &Self, path: &str, op: &'static str, out: &mut Vec<FieldDiff>);
}

/// Compares a nested object field. An unset actual compares against the
/// type's empty sentinel. Output-only objects downgrade every emitted diff
/// to [`Remediation::NoOp`].
pub fn diff_object<T: NestedObject>(
    out: &mut Vec<FieldDiff>,
    field_name: &str,
    desired: &Option<T>,
    actual: &Option<T>,
    op: &'static str,
    output_only: bool,
) {
    let Some(d) = desired.as_ref().filter(|d| !d.is_blank()) else {
        return;
    };
    let empty = T::EMPTY;
    let a = actual.as_ref().unwrap_or(&empty);
    let start = out.len();
    d.compare(a, field_name, op, out);
    if output_only {
        for diff in &mut out[start..] {
            diff.remediation = Remediation::NoOp;
        }
    }
}

/// Sorted, de-duplicated field paths of the diffs, comma-joined.
pub fn update_mask(diffs: &[FieldDiff]) -> String {
    let mut fields: Vec<&str> = diffs
        .iter()
        .filter(|d| d.is_actionable())
        .map(|d| d.field_name.as_str())
        .collect();
    fields.sort_unstable();
    fields.dedup();
    fields.join(",")
}

/// Actionable diffs bucketed by the operation that resolves them.
#[derive(Debug, Default, Clone)]
pub struct GroupedDiffs {
    pub operations: BTreeMap<&'static str, Vec<FieldDiff>>,
    pub recreate: Vec<FieldDiff>,
}

impl GroupedDiffs {
    pub fn requires_recreate(&self) -> bool {
        !self.recreate.is_empty()
    }
}

pub fn group_operations(diffs: &[FieldDiff]) -> GroupedDiffs {
    let mut grouped = GroupedDiffs::default();
    for diff in diffs {
        match diff.remediation {
            Remediation::NoOp => {}
            Remediation::Update(op) => grouped
                .operations
                .entry(op)
                .or_default()
                .push(diff.clone()),
            Remediation::Recreate => grouped.recreate.push(diff.clone()),
        }
    }
    grouped
}
