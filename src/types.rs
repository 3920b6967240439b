//! Core types for schema compilation.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extension annotation carrying a field's skip reason.
pub const SKIP_REASON_KEY: &str = "x-oma3-skip-reason";

/// Extension annotation carrying an explicit ABI type override.
pub const ABI_OVERRIDE_KEY: &str = "x-oma3-abi";

/// Returns the JSON type name for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Why a field carries a skip annotation.
///
/// Unrecognized tags parse to `Other` and behave like an untagged field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Off-chain metadata; excluded from the schema string.
    Metadata,
    /// Handled natively by the attestation service (e.g. `revoked`); excluded.
    Eas,
    /// Reserved slot kept for layout compatibility; always included.
    Unused,
    /// Any other tag value.
    Other(String),
}

impl SkipReason {
    /// Parse a skip-reason tag.
    pub fn parse(s: &str) -> Self {
        match s {
            "metadata" => SkipReason::Metadata,
            "eas" => SkipReason::Eas,
            "unused" => SkipReason::Unused,
            other => SkipReason::Other(other.to_string()),
        }
    }

    /// Read the skip-reason annotation from a property, if it is a string.
    pub fn from_property(prop: &Value) -> Option<Self> {
        prop.get(SKIP_REASON_KEY)
            .and_then(Value::as_str)
            .map(SkipReason::parse)
    }

    /// Whether a field tagged with this reason is left out of the schema string.
    pub fn excludes(&self) -> bool {
        matches!(self, SkipReason::Metadata | SkipReason::Eas)
    }

    /// The tag as written in the schema.
    pub fn as_str(&self) -> &str {
        match self {
            SkipReason::Metadata => "metadata",
            SkipReason::Eas => "eas",
            SkipReason::Unused => "unused",
            SkipReason::Other(s) => s,
        }
    }
}

/// Explicit ABI type requested by a schema author.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiOverride {
    Bytes32,
    /// Unrecognized override; ignored by the mapper.
    Other(String),
}

impl AbiOverride {
    /// Parse an override annotation value.
    pub fn parse(s: &str) -> Self {
        match s {
            "bytes32" => AbiOverride::Bytes32,
            other => AbiOverride::Other(other.to_string()),
        }
    }

    /// Read the override annotation from a property, if it is a string.
    pub fn from_property(prop: &Value) -> Option<Self> {
        prop.get(ABI_OVERRIDE_KEY)
            .and_then(Value::as_str)
            .map(AbiOverride::parse)
    }
}

/// Target schema registry.
///
/// The two registries derive schema UIDs differently and their output
/// records differ (only `Eas` records carry a resolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Registry {
    /// UID = keccak256(schema ‖ resolver ‖ revocable), tightly packed.
    #[default]
    Eas,
    /// UID = keccak256(schema).
    SchemaOnly,
}

impl Registry {
    /// Whether records for this registry carry a resolver address.
    pub fn uses_resolver(&self) -> bool {
        matches!(self, Registry::Eas)
    }
}

/// Options for compiling one schema document.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Registry the compiled schema targets.
    pub registry: Registry,
    /// Record name override. Falls back to the schema `title`.
    pub name: Option<String>,
    /// Revocable override. Falls back to auto-detection from a `revoked` field.
    pub revocable: Option<bool>,
    /// Resolver address for `Registry::Eas`. Defaults to the zero address.
    pub resolver: Option<Address>,
}

impl CompileOptions {
    /// Create options for the given registry with nothing overridden.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Override the record name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override revocability.
    pub fn revocable(mut self, revocable: bool) -> Self {
        self.revocable = Some(revocable);
        self
    }

    /// Set the resolver address.
    pub fn resolver(mut self, resolver: Address) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skip_reason_parse_known() {
        assert_eq!(SkipReason::parse("metadata"), SkipReason::Metadata);
        assert_eq!(SkipReason::parse("eas"), SkipReason::Eas);
        assert_eq!(SkipReason::parse("unused"), SkipReason::Unused);
    }

    #[test]
    fn skip_reason_unknown_fails_safe() {
        let reason = SkipReason::parse("later");
        assert_eq!(reason, SkipReason::Other("later".into()));
        assert!(!reason.excludes());
        assert_eq!(reason.as_str(), "later");
    }

    #[test]
    fn skip_reason_excludes() {
        assert!(SkipReason::Metadata.excludes());
        assert!(SkipReason::Eas.excludes());
        assert!(!SkipReason::Unused.excludes());
    }

    #[test]
    fn skip_reason_ignores_non_string_annotation() {
        let prop = json!({ "type": "string", SKIP_REASON_KEY: true });
        assert_eq!(SkipReason::from_property(&prop), None);
    }

    #[test]
    fn abi_override_parse() {
        assert_eq!(AbiOverride::parse("bytes32"), AbiOverride::Bytes32);
        assert_eq!(
            AbiOverride::parse("address"),
            AbiOverride::Other("address".into())
        );
    }

    #[test]
    fn registry_serde_names() {
        assert_eq!(serde_json::to_value(Registry::Eas).unwrap(), json!("eas"));
        assert_eq!(
            serde_json::to_value(Registry::SchemaOnly).unwrap(),
            json!("schema-only")
        );
    }

    #[test]
    fn compile_options_builder() {
        let opts = CompileOptions::new(Registry::SchemaOnly)
            .name("My-Schema")
            .revocable(true);
        assert_eq!(opts.registry, Registry::SchemaOnly);
        assert_eq!(opts.name.as_deref(), Some("My-Schema"));
        assert_eq!(opts.revocable, Some(true));
        assert_eq!(opts.resolver, None);
    }
}
