//! Argument and return descriptors
//!
//! The leaf value objects of the signature model. Both are plain data:
//! construction, equality, and field access only.

use serde::{Deserialize, Serialize};

use crate::reflect::RawParam;

/// Normalized description of a single declared parameter.
///
/// A required argument never carries a default value; the constructors
/// enforce this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDescriptor {
    /// Parameter name as declared.
    pub name: String,
    /// Declared type name, or `None` for an untyped parameter.
    pub declared_type: Option<String>,
    /// Whether the argument may be omitted (has a default or is a
    /// variadic tail).
    pub is_optional: bool,
    /// Whether the declared type accepts the host's null value.
    pub allows_null: bool,
    /// Default value for optional arguments, when one was declared.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default_value: Option<serde_json::Value>,
}

impl ArgumentDescriptor {
    /// Create a descriptor for an argument the caller must supply.
    pub fn required(
        name: impl Into<String>,
        declared_type: Option<String>,
        allows_null: bool,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type,
            is_optional: false,
            allows_null,
            default_value: None,
        }
    }

    /// Create a descriptor for an argument the caller may omit.
    pub fn optional(
        name: impl Into<String>,
        declared_type: Option<String>,
        allows_null: bool,
        default_value: Option<serde_json::Value>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type,
            is_optional: true,
            allows_null,
            default_value,
        }
    }

    /// Whether no type was declared for this parameter.
    pub fn is_untyped(&self) -> bool {
        self.declared_type.is_none()
    }

    pub(crate) fn from_raw(param: RawParam) -> Self {
        if param.is_optional {
            Self::optional(
                param.name,
                param.declared_type,
                param.allows_null,
                param.default_value,
            )
        } else {
            // A required argument has no default, whatever the host reported.
            Self::required(param.name, param.declared_type, param.allows_null)
        }
    }
}

/// Normalized description of a callable's return contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnDescriptor {
    /// Declared return type name, or `None` when absent.
    pub declared_type: Option<String>,
    /// True iff no declared type was present at introspection time.
    pub is_void: bool,
    /// Whether the declared type accepts the host's null value.
    pub allows_null: bool,
}

impl ReturnDescriptor {
    /// Return contract with a declared type.
    pub fn typed(declared_type: impl Into<String>, allows_null: bool) -> Self {
        Self {
            declared_type: Some(declared_type.into()),
            is_void: false,
            allows_null,
        }
    }

    /// Return contract for a callable that declared no return type.
    pub fn untyped() -> Self {
        Self {
            declared_type: None,
            is_void: true,
            allows_null: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_argument_never_keeps_a_default() {
        let arg = ArgumentDescriptor::required("count", Some("int".to_string()), false);
        assert!(!arg.is_optional);
        assert!(arg.default_value.is_none());
    }

    #[test]
    fn optional_argument_keeps_its_default() {
        let arg = ArgumentDescriptor::optional(
            "options",
            None,
            true,
            Some(serde_json::json!(13)),
        );
        assert!(arg.is_optional);
        assert!(arg.is_untyped());
        assert_eq!(arg.default_value, Some(serde_json::json!(13)));
    }

    #[test]
    fn untyped_return_is_void_without_a_type() {
        let ret = ReturnDescriptor::untyped();
        assert!(ret.is_void);
        assert!(ret.declared_type.is_none());

        let ret = ReturnDescriptor::typed("string", true);
        assert!(!ret.is_void);
        assert_eq!(ret.declared_type.as_deref(), Some("string"));
        assert!(ret.allows_null);
    }

    #[test]
    fn descriptor_serialization_round_trip() {
        let arg = ArgumentDescriptor::optional(
            "name",
            Some("string".to_string()),
            false,
            Some(serde_json::json!("Haha")),
        );
        let json = serde_json::to_string(&arg).unwrap();
        let decoded: ArgumentDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(arg, decoded);
    }
}
