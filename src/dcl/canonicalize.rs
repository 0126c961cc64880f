//! Canonicalization helpers
//!
//! Each predicate answers "are these two values equivalent?". Callers keep
//! the server's copy when they are, so cosmetic differences (whitespace,
//! full vs short resource names) never surface as diffs.

use super::diff::{FieldValue, NestedObject};

/// Last path segment of a resource name: `projects/p/locations/l` -> `l`.
pub fn self_link_to_name(value: &str) -> &str {
    value.trim_end_matches('/').rsplit('/').next().unwrap_or(value)
}

/// Shortens an optional name to its last segment.
pub fn short_name(value: &Option<String>) -> Option<String> {
    value.as_deref().map(|v| self_link_to_name(v).to_string())
}

fn is_self_link(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("projects/")
}

/// True when both are unset/empty, equal after trimming, or when either is a
/// self link and both name the same last segment.
pub fn string_canonicalize(a: &Option<String>, b: &Option<String>) -> bool {
    let a = a.as_deref().unwrap_or("").trim();
    let b = b.as_deref().unwrap_or("").trim();
    if a == b {
        return true;
    }
    if a.is_empty() || b.is_empty() {
        return false;
    }
    (is_self_link(a) || is_self_link(b)) && self_link_to_name(a) == self_link_to_name(b)
}

/// Unset counts as `false`.
pub fn bool_canonicalize(a: Option<bool>, b: Option<bool>) -> bool {
    a.unwrap_or(false) == b.unwrap_or(false)
}

/// Unset and empty lists are equivalent; otherwise elementwise.
pub fn string_array_canonicalize(a: &Option<Vec<String>>, b: &Option<Vec<String>>) -> bool {
    let a = a.as_deref().unwrap_or(&[]);
    let b = b.as_deref().unwrap_or(&[]);
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| string_canonicalize(&Some(x.clone()), &Some(y.clone())))
}

/// Identity parameters (project, location) given as a bare name or a path.
pub fn name_to_self_link(a: &Option<String>, b: &Option<String>) -> bool {
    match (a.as_deref(), b.as_deref()) {
        (None, None) => true,
        (Some(x), Some(y)) => self_link_to_name(x) == self_link_to_name(y),
        _ => false,
    }
}

/// A resource name given short (`my-lake`) or as a full/partial path.
pub fn partial_self_link_to_self_link(a: &Option<String>, b: &Option<String>) -> bool {
    match (a.as_deref(), b.as_deref()) {
        (None, None) => true,
        (Some(x), Some(y)) => {
            x == y
                || y.ends_with(&format!("/{x}"))
                || x.ends_with(&format!("/{y}"))
                || self_link_to_name(x) == self_link_to_name(y)
        }
        _ => false,
    }
}

/// Unset, or set to the type's empty value.
pub fn is_zero_value<T: FieldValue>(value: &Option<T>) -> bool {
    value.as_ref().map_or(true, FieldValue::is_unset)
}

/// Desired-state choice: the initial value when equivalent, else desired.
pub fn pick<T: Clone>(desired: &Option<T>, initial: &Option<T>, equivalent: bool) -> Option<T> {
    if equivalent {
        initial.clone()
    } else {
        desired.clone()
    }
}

/// Desired-state choice for fields whose only equivalence is "desired unset".
pub fn pick_unless_zero<T: FieldValue + Clone>(desired: &Option<T>, initial: &Option<T>) -> Option<T> {
    pick(desired, initial, is_zero_value(desired))
}

/// New-state choice: desired when both are empty or they are equivalent,
/// else whatever the server returned.
pub fn keep_desired<T: FieldValue + Clone>(
    desired: &Option<T>,
    new: Option<T>,
    equivalent: bool,
) -> Option<T> {
    if (is_zero_value(desired) && is_zero_value(&new)) || equivalent {
        desired.clone()
    } else {
        new
    }
}

/// New-state choice for server-owned fields: desired only when both are empty.
pub fn keep_new<T: FieldValue + Clone>(desired: &Option<T>, new: Option<T>) -> Option<T> {
    keep_desired(desired, new, false)
}

pub fn pick_string(desired: &Option<String>, initial: &Option<String>) -> Option<String> {
    pick(
        desired,
        initial,
        string_canonicalize(desired, initial) || is_zero_value(desired),
    )
}

pub fn pick_bool(desired: Option<bool>, initial: Option<bool>) -> Option<bool> {
    if bool_canonicalize(desired, initial) || desired.is_none() {
        initial
    } else {
        desired
    }
}

pub fn pick_strings(desired: &Option<Vec<String>>, initial: &Option<Vec<String>>) -> Option<Vec<String>> {
    pick(desired, initial, string_array_canonicalize(desired, initial))
}

pub fn keep_string(desired: &Option<String>, new: Option<String>) -> Option<String> {
    let equivalent = string_canonicalize(desired, &new);
    keep_desired(desired, new, equivalent)
}

pub fn keep_bool(desired: Option<bool>, new: Option<bool>) -> Option<bool> {
    if bool_canonicalize(desired, new) {
        desired
    } else {
        new
    }
}

pub fn keep_strings(desired: &Option<Vec<String>>, new: Option<Vec<String>>) -> Option<Vec<String>> {
    if string_array_canonicalize(desired, &new) {
        desired.clone()
    } else {
        new
    }
}

/// Nested object desired-state rule:
/// desired unset uses initial; the explicit empty sentinel stays; initial
/// unset uses desired; otherwise `merge` decides field by field.
pub fn nested_desired<T, F>(desired: &Option<T>, initial: &Option<T>, merge: F) -> Option<T>
where
    T: NestedObject + Clone,
    F: FnOnce(&T, &T) -> T,
{
    let Some(d) = desired else {
        return initial.clone();
    };
    if d.is_empty() {
        return desired.clone();
    }
    match initial {
        None => desired.clone(),
        Some(i) => Some(merge(d, i)),
    }
}

/// Nested object new-state rule:
/// desired unset keeps the server value; a server value that is missing
/// keeps a blank desired (and drops anything else); otherwise `merge` adopts
/// desired values the server echoed back equivalently.
pub fn nested_new<T, F>(desired: &Option<T>, new: Option<T>, merge: F) -> Option<T>
where
    T: NestedObject + Clone,
    F: FnOnce(&T, T) -> T,
{
    let Some(d) = desired else {
        return new;
    };
    match new {
        None if d.is_blank() => desired.clone(),
        None => None,
        Some(n) if n.is_blank() && d.is_blank() => desired.clone(),
        Some(n) => Some(merge(d, n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_self_link_to_name() {
        assert_eq!(self_link_to_name("projects/p/locations/us"), "us");
        assert_eq!(self_link_to_name("us"), "us");
        assert_eq!(self_link_to_name("a/b/"), "b");
    }

    #[test]
    fn test_string_canonicalize() {
        assert!(string_canonicalize(&None, &s("")));
        assert!(string_canonicalize(&s(" x "), &s("x")));
        assert!(string_canonicalize(&s("projects/p/buckets/b"), &s("b")));
        assert!(!string_canonicalize(&s("x"), &s("y")));
        assert!(!string_canonicalize(&s("x"), &None));
    }

    #[test]
    fn test_bool_and_array_canonicalize() {
        assert!(bool_canonicalize(None, Some(false)));
        assert!(!bool_canonicalize(None, Some(true)));
        assert!(string_array_canonicalize(&None, &Some(vec![])));
        assert!(string_array_canonicalize(
            &Some(vec!["a".into()]),
            &Some(vec![" a".into()])
        ));
        assert!(!string_array_canonicalize(
            &Some(vec!["a".into(), "b".into()]),
            &Some(vec!["b".into(), "a".into()])
        ));
    }

    #[test]
    fn test_name_matching() {
        assert!(name_to_self_link(&s("projects/p1"), &s("p1")));
        assert!(partial_self_link_to_self_link(
            &s("lake-1"),
            &s("projects/p/locations/l/lakes/lake-1")
        ));
        assert!(!partial_self_link_to_self_link(&s("lake-1"), &None));
    }

    #[test]
    fn test_pick_helpers() {
        assert_eq!(pick_unless_zero(&s(""), &s("init")), s("init"));
        assert_eq!(pick_unless_zero(&s("want"), &s("init")), s("want"));
        assert_eq!(keep_new(&None, s("server")), s("server"));
        assert_eq!(keep_desired(&s("a"), s(" a"), true), s("a"));
        assert_eq!(pick_string(&s(" x"), &s("x")), s("x"));
        assert_eq!(pick_string(&None, &s("x")), s("x"));
        assert_eq!(pick_bool(Some(true), Some(false)), Some(true));
        assert_eq!(pick_bool(None, Some(true)), Some(true));
        assert_eq!(keep_string(&s("a"), s(" a ")), s("a"));
        assert_eq!(keep_string(&s("a"), s("b")), s("b"));
        assert_eq!(keep_bool(None, Some(false)), None);
        assert_eq!(keep_strings(&None, Some(vec!["a".into()])), Some(vec!["a".into()]));
    }
}
