//! Flattening a schema's top-level properties into a schema string.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use crate::abi::{join_fields, map_type, AbiType, ItemContext, MapContext, SchemaField};
use crate::loader::{SchemaCache, SchemaSource};
use crate::node::PropertySchema;
use crate::resolver::resolve_property;
use crate::types::SkipReason;
use crate::typing::resolve_effective_type;

/// What happened to one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    /// Emitted with this ABI type.
    Included(AbiType),
    /// Tagged `unused` and emitted anyway to keep the on-chain layout.
    Reserved(AbiType),
    /// Left out because of its skip reason.
    Skipped(SkipReason),
    /// Could not be mapped to an ABI type.
    Dropped,
}

/// Per-field record of a build, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecision {
    pub field: String,
    pub outcome: FieldOutcome,
}

/// Result of flattening a set of properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltSchema {
    /// Emitted fields, in declaration order.
    pub fields: Vec<SchemaField>,
    /// One decision per input property.
    pub decisions: Vec<FieldDecision>,
}

impl BuiltSchema {
    /// The comma-separated `type name` schema string.
    pub fn schema_string(&self) -> String {
        join_fields(&self.fields)
    }

    /// Decision recorded for `field`, if it was among the inputs.
    pub fn decision(&self, field: &str) -> Option<&FieldOutcome> {
        self.decisions
            .iter()
            .find(|d| d.field == field)
            .map(|d| &d.outcome)
    }
}

/// Flatten `properties` into schema fields.
///
/// Each property's `$ref` is resolved against `document` (or, for external
/// refs, files under `base_dir`) before its skip reason and type are read.
/// Properties that can't be mapped are dropped; the build itself never fails.
pub fn build_schema<S: SchemaSource>(
    properties: &Map<String, Value>,
    document: &Value,
    base_dir: &Path,
    cache: &mut SchemaCache<S>,
) -> BuiltSchema {
    let mut built = BuiltSchema::default();

    for (name, prop) in properties {
        let outcome = build_field(name, prop, document, base_dir, cache);
        if let FieldOutcome::Included(abi) | FieldOutcome::Reserved(abi) = &outcome {
            built.fields.push(SchemaField::new(*abi, name.as_str()));
        }
        built.decisions.push(FieldDecision {
            field: name.clone(),
            outcome,
        });
    }

    built
}

/// Flatten `properties` straight to a schema string.
pub fn build_schema_string<S: SchemaSource>(
    properties: &Map<String, Value>,
    document: &Value,
    base_dir: &Path,
    cache: &mut SchemaCache<S>,
) -> String {
    build_schema(properties, document, base_dir, cache).schema_string()
}

fn build_field<S: SchemaSource>(
    name: &str,
    prop: &Value,
    document: &Value,
    base_dir: &Path,
    cache: &mut SchemaCache<S>,
) -> FieldOutcome {
    let resolved = resolve_property(prop, document, base_dir, cache);
    let node = PropertySchema::from_value(&resolved);

    let reserved = match &node.skip_reason {
        Some(reason) if reason.excludes() => {
            info!("skipping field {}: skip reason {}", name, reason.as_str());
            return FieldOutcome::Skipped(reason.clone());
        }
        Some(SkipReason::Unused) => {
            info!(
                "including field {} despite skip reason unused: reserved slot",
                name
            );
            true
        }
        _ => false,
    };

    let effective = resolve_effective_type(&node);
    let items = match (effective.as_deref(), node.items.as_ref()) {
        (Some("array"), Some(raw)) => Some(item_context(raw, document, base_dir, cache)),
        _ => None,
    };

    let ctx = MapContext {
        field: name,
        pattern: node.pattern.as_deref(),
        abi_override: node.abi_override.as_ref(),
        items: items.as_ref(),
    };

    match map_type(effective.as_deref(), &ctx) {
        Some(abi) if reserved => FieldOutcome::Reserved(abi),
        Some(abi) => FieldOutcome::Included(abi),
        None => FieldOutcome::Dropped,
    }
}

fn item_context<S: SchemaSource>(
    raw: &Value,
    document: &Value,
    base_dir: &Path,
    cache: &mut SchemaCache<S>,
) -> ItemContext {
    let resolved = resolve_property(raw, document, base_dir, cache);
    let node = PropertySchema::from_value(&resolved);
    ItemContext {
        effective_type: resolve_effective_type(&node),
        pattern: node.pattern,
        abi_override: node.abi_override,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::AbiScalar;
    use crate::loader::test_support::CountingSource;
    use serde_json::json;

    fn build(document: &Value) -> BuiltSchema {
        let mut cache = SchemaCache::with_source(CountingSource::default());
        let props = document["properties"].as_object().unwrap();
        build_schema(props, document, Path::new("/schemas"), &mut cache)
    }

    #[test]
    fn scalar_fields_in_order() {
        let doc = json!({
            "properties": {
                "subject": { "type": "string" },
                "score": { "type": "integer" }
            }
        });
        assert_eq!(build(&doc).schema_string(), "string subject, uint256 score");
    }

    #[test]
    fn hash_field() {
        let doc = json!({
            "properties": {
                "hash": { "type": "string", "pattern": "^0x[a-fA-F0-9]{64}$" }
            }
        });
        assert_eq!(build(&doc).schema_string(), "bytes32 hash");
    }

    #[test]
    fn array_field() {
        let doc = json!({
            "properties": {
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        });
        assert_eq!(build(&doc).schema_string(), "string[] tags");
    }

    #[test]
    fn array_items_through_local_ref() {
        let doc = json!({
            "$defs": { "Digest": { "type": "string", "pattern": "[0-9a-f]{64}" } },
            "properties": {
                "digests": { "type": "array", "items": { "$ref": "#/$defs/Digest" } }
            }
        });
        assert_eq!(build(&doc).schema_string(), "bytes32[] digests");
    }

    #[test]
    fn skip_reasons() {
        let doc = json!({
            "properties": {
                "subject": { "type": "string" },
                "version": { "type": "string", "x-oma3-skip-reason": "metadata" },
                "revoked": { "type": "boolean", "x-oma3-skip-reason": "eas" },
                "legacy": { "type": "integer", "x-oma3-skip-reason": "unused" },
                "note": { "type": "string", "x-oma3-skip-reason": "someday" }
            }
        });
        let built = build(&doc);
        assert_eq!(
            built.schema_string(),
            "string subject, uint256 legacy, string note"
        );
        assert_eq!(
            built.decision("version"),
            Some(&FieldOutcome::Skipped(SkipReason::Metadata))
        );
        assert_eq!(
            built.decision("revoked"),
            Some(&FieldOutcome::Skipped(SkipReason::Eas))
        );
        assert_eq!(
            built.decision("legacy"),
            Some(&FieldOutcome::Reserved(AbiType::scalar(AbiScalar::Uint256)))
        );
    }

    #[test]
    fn skip_reason_read_after_ref_resolution() {
        let doc = json!({
            "$defs": { "Meta": { "type": "string", "x-oma3-skip-reason": "metadata" } },
            "properties": {
                "subject": { "type": "string" },
                "meta": { "$ref": "#/$defs/Meta" }
            }
        });
        assert_eq!(build(&doc).schema_string(), "string subject");
    }

    #[test]
    fn dropped_fields_keep_survivor_order() {
        let doc = json!({
            "properties": {
                "a": { "type": "string" },
                "broken": { "type": "array" },
                "b": { "type": "boolean" },
                "nested": { "type": "array", "items": { "type": "array" } },
                "c": { "type": "number" }
            }
        });
        let built = build(&doc);
        assert_eq!(built.schema_string(), "string a, bool b, uint256 c");
        assert_eq!(built.decision("broken"), Some(&FieldOutcome::Dropped));
        assert_eq!(built.decisions.len(), 5);
    }

    #[test]
    fn unresolvable_ref_falls_back_to_string() {
        let doc = json!({
            "properties": {
                "proof": { "$ref": "#/$defs/Missing" }
            }
        });
        assert_eq!(build(&doc).schema_string(), "string proof");
    }

    #[test]
    fn empty_properties() {
        let doc = json!({ "properties": {} });
        assert_eq!(build(&doc).schema_string(), "");
    }

    #[test]
    fn external_refs_read_once() {
        let source = CountingSource::default().with_file(
            "/schemas/common.schema.json",
            r#"{"$defs": {"Proof": {"type": "object"}, "Count": {"type": "integer"}}}"#,
        );
        let mut cache = SchemaCache::with_source(source);
        let doc = json!({
            "properties": {
                "proof": { "$ref": "common.schema.json#/$defs/Proof" },
                "count": { "$ref": "common.schema.json#/$defs/Count" }
            }
        });
        let props = doc["properties"].as_object().unwrap();
        let schema = build_schema_string(props, &doc, Path::new("/schemas"), &mut cache);

        assert_eq!(schema, "string proof, uint256 count");
        assert_eq!(cache.source().reads(), 1);
    }
}
