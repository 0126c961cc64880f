//! JSON <-> field conversions shared by every resource's expand/flatten pair

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::diff::NestedObject;

/// A leaf value that knows whether and how to appear in a request body.
pub trait Expand {
    /// `None` means the field is omitted from the request.
    fn expand(&self) -> Option<Value>;
}

impl Expand for String {
    fn expand(&self) -> Option<Value> {
        if self.is_empty() {
            None
        } else {
            Some(Value::String(self.clone()))
        }
    }
}

impl Expand for bool {
    fn expand(&self) -> Option<Value> {
        Some(Value::Bool(*self))
    }
}

impl Expand for i64 {
    fn expand(&self) -> Option<Value> {
        Some(Value::from(*self))
    }
}

impl Expand for Vec<String> {
    fn expand(&self) -> Option<Value> {
        Some(Value::Array(
            self.iter().map(|s| Value::String(s.clone())).collect(),
        ))
    }
}

impl Expand for BTreeMap<String, String> {
    fn expand(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        Some(Value::Object(
            self.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        ))
    }
}

/// Inserts `value` under `key` when it should be sent.
pub fn put<T: Expand>(map: &mut Map<String, Value>, key: &str, value: &Option<T>) {
    if let Some(v) = value.as_ref().and_then(Expand::expand) {
        map.insert(key.to_string(), v);
    }
}

/// Inserts an already-expanded nested object unless it is empty.
pub fn put_object(map: &mut Map<String, Value>, key: &str, value: Option<Map<String, Value>>) {
    if let Some(obj) = value {
        if !obj.is_empty() {
            map.insert(key.to_string(), Value::Object(obj));
        }
    }
}

/// Flattens a nested message: non-objects are unset, `{}` is the explicit
/// empty sentinel.
pub fn flatten_object<T, F>(value: Option<&Value>, f: F) -> Option<T>
where
    T: NestedObject,
    F: FnOnce(&Map<String, Value>) -> T,
{
    let obj = value?.as_object()?;
    if obj.is_empty() {
        return Some(T::EMPTY);
    }
    Some(f(obj))
}

/// Expands a nested message; unset and blank values are omitted.
pub fn expand_object<T, F>(value: &Option<T>, f: F) -> Option<Map<String, Value>>
where
    T: NestedObject,
    F: FnOnce(&T) -> Map<String, Value>,
{
    value.as_ref().filter(|v| !v.is_blank()).map(f)
}

pub fn flatten_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

pub fn flatten_bool(value: Option<&Value>) -> Option<bool> {
    value.and_then(Value::as_bool)
}

/// Accepts JSON integers, integral floats, and int64 values that Google APIs
/// encode as strings.
pub fn flatten_integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn flatten_string_slice(value: Option<&Value>) -> Option<Vec<String>> {
    let arr = value?.as_array()?;
    Some(
        arr.iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

pub fn flatten_key_value_pairs(value: Option<&Value>) -> Option<BTreeMap<String, String>> {
    let obj = value?.as_object()?;
    Some(
        obj.iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
    )
}

/// Flattens a string enum field.
pub fn flatten_enum<E>(value: Option<&Value>) -> Option<E>
where
    E: for<'a> From<&'a str>,
{
    value.and_then(Value::as_str).map(E::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_integer_variants() {
        assert_eq!(flatten_integer(Some(&json!(3))), Some(3));
        assert_eq!(flatten_integer(Some(&json!(3.0))), Some(3));
        assert_eq!(flatten_integer(Some(&json!("42"))), Some(42));
        assert_eq!(flatten_integer(Some(&json!(3.5))), None);
        assert_eq!(flatten_integer(Some(&json!(true))), None);
        assert_eq!(flatten_integer(None), None);
    }

    #[test]
    fn test_put_skips_empty_values() {
        let mut m = Map::new();
        put(&mut m, "a", &Some(String::new()));
        put(&mut m, "b", &Some(BTreeMap::<String, String>::new()));
        put::<String>(&mut m, "c", &None);
        put(&mut m, "d", &Some(false));
        assert_eq!(m.len(), 1);
        assert_eq!(m["d"], json!(false));
    }

    #[test]
    fn test_flatten_labels_keeps_strings_only() {
        let labels = flatten_key_value_pairs(Some(&json!({"env": "prod", "n": 1}))).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels["env"], "prod");
    }
}
