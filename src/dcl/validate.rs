//! Required-field checks

use super::diff::{FieldValue, NestedObject};
use super::error::{DclError, Result};

/// A user field that must be set and non-empty.
pub fn required<T: FieldValue>(resource: &'static str, field: &'static str, value: &Option<T>) -> Result<()> {
    match value {
        Some(v) if !v.is_unset() => Ok(()),
        _ => Err(DclError::RequiredField { resource, field }),
    }
}

/// A required nested message. The explicit empty value counts as set.
pub fn required_object<T: NestedObject>(resource: &'static str, field: &'static str, value: &Option<T>) -> Result<()> {
    match value {
        Some(_) => Ok(()),
        None => Err(DclError::RequiredField { resource, field }),
    }
}

/// A required identity parameter such as `Project`.
pub fn required_parameter(name: &'static str, value: &Option<String>) -> Result<()> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(DclError::RequiredParameter(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_checks() {
        assert!(required("Lake", "name", &Some("x".to_string())).is_ok());
        assert!(matches!(
            required::<String>("Lake", "name", &Some(String::new())),
            Err(DclError::RequiredField { field: "name", .. })
        ));
        assert!(required("Zone", "enabled", &Some(false)).is_ok());
        assert!(required::<bool>("Zone", "enabled", &None).is_err());
        assert!(matches!(
            required_parameter("Project", &None),
            Err(DclError::RequiredParameter("Project"))
        ));
    }
}
