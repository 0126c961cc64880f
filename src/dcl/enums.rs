//! Closed string enums
//!
//! API enums are kept as string newtypes rather than Rust enums so that values
//! the server adds later still flatten. User input is checked against the
//! allow-list through [`DclEnum::validate`].

use super::error::{DclError, Result};

pub trait DclEnum {
    const NAME: &'static str;
    const VALUES: &'static [&'static str];

    fn as_str(&self) -> &str;

    /// Accepts the empty string or any listed value.
    fn validate(&self) -> Result<()> {
        let value = self.as_str();
        if value.is_empty() || Self::VALUES.contains(&value) {
            return Ok(());
        }
        Err(DclError::InvalidEnum {
            enum_name: Self::NAME,
            value: value.to_string(),
        })
    }
}

/// Declares a string enum newtype with its allowed values.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }
        }

        impl $crate::dcl::enums::DclEnum for $name {
            const NAME: &'static str = stringify!($name);
            const VALUES: &'static [&'static str] = &[$($value),+];

            fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl $crate::dcl::diff::FieldValue for $name {
            fn is_unset(&self) -> bool {
                self.0.is_empty()
            }

            fn equivalent(&self, actual: &Self, _kind: $crate::dcl::diff::DiffKind) -> bool {
                self.0 == actual.0
            }

            fn render(&self) -> String {
                self.0.clone()
            }
        }

        impl $crate::dcl::flatten::Expand for $name {
            fn expand(&self) -> Option<serde_json::Value> {
                if self.0.is_empty() {
                    None
                } else {
                    Some(serde_json::Value::String(self.0.clone()))
                }
            }
        }
    };
}

pub(crate) use string_enum;

/// Validates an optional enum field.
pub fn validate_opt<E: DclEnum>(value: &Option<E>) -> Result<()> {
    match value {
        Some(v) => v.validate(),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    string_enum!(
        /// Test enum.
        ColorEnum { "RED", "GREEN" }
    );

    #[test]
    fn test_validate_accepts_listed_and_empty() {
        assert!(ColorEnum::new("RED").validate().is_ok());
        assert!(ColorEnum::new("").validate().is_ok());
        assert!(validate_opt::<ColorEnum>(&None).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown() {
        let err = ColorEnum::new("BLUE").validate().unwrap_err();
        match err {
            DclError::InvalidEnum { enum_name, value } => {
                assert_eq!(enum_name, "ColorEnum");
                assert_eq!(value, "BLUE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
