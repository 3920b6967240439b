//! Effective JSON type resolution.
//!
//! A property either declares its type directly or spreads it across
//! composition branches. Branch candidates are reduced to a single type with a
//! fixed priority order, which keeps output stable for schemas already
//! registered on-chain.

use serde_json::Value;

use crate::node::{Branch, PropertySchema, Shape};

/// Conflict resolution order for candidate types collected from branches.
pub const TYPE_PRIORITY: [&str; 6] = ["object", "array", "string", "integer", "number", "boolean"];

/// Determine the effective (lowercased) JSON type of a property.
///
/// Returns `None` when the property gives no type information at all; callers
/// treat that as `string`.
pub fn resolve_effective_type(prop: &PropertySchema) -> Option<String> {
    match &prop.shape {
        Shape::Declared(decl) => decl.primary(),
        Shape::Composed(branches) => {
            let candidates: Vec<String> = branches.iter().flat_map(Branch::candidates).collect();
            pick_by_priority(&candidates)
        }
        Shape::Untyped => None,
    }
}

/// Effective type of a raw property value.
pub fn effective_type(value: &Value) -> Option<String> {
    resolve_effective_type(&PropertySchema::from_value(value))
}

/// Pick the highest-priority candidate, or the first one if none is ranked.
pub fn pick_by_priority(candidates: &[String]) -> Option<String> {
    TYPE_PRIORITY
        .iter()
        .find(|ranked| candidates.iter().any(|c| c == *ranked))
        .map(|ranked| ranked.to_string())
        .or_else(|| candidates.first().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direct_string_type() {
        assert_eq!(effective_type(&json!({ "type": "Integer" })).as_deref(), Some("integer"));
    }

    #[test]
    fn nullable_union_either_order() {
        assert_eq!(
            effective_type(&json!({ "type": ["string", "null"] })).as_deref(),
            Some("string")
        );
        assert_eq!(
            effective_type(&json!({ "type": ["null", "string"] })).as_deref(),
            Some("string")
        );
    }

    #[test]
    fn direct_type_ignores_branches() {
        let prop = json!({ "type": "boolean", "oneOf": [{ "type": "object" }] });
        assert_eq!(effective_type(&prop).as_deref(), Some("boolean"));
    }

    #[test]
    fn object_wins_regardless_of_order() {
        let a = json!({ "oneOf": [{ "type": "object" }, { "type": "string" }] });
        let b = json!({ "oneOf": [{ "type": "string" }, { "type": "object" }] });
        assert_eq!(effective_type(&a).as_deref(), Some("object"));
        assert_eq!(effective_type(&b).as_deref(), Some("object"));
    }

    #[test]
    fn priority_across_keywords() {
        let prop = json!({
            "oneOf": [{ "type": "boolean" }],
            "anyOf": [{ "type": "number" }],
            "allOf": [{ "type": "integer" }]
        });
        assert_eq!(effective_type(&prop).as_deref(), Some("integer"));
    }

    #[test]
    fn array_beats_string() {
        let prop = json!({ "anyOf": [{ "type": "string" }, { "type": "array" }] });
        assert_eq!(effective_type(&prop).as_deref(), Some("array"));
    }

    #[test]
    fn branch_nullable_union() {
        let prop = json!({ "oneOf": [{ "type": ["null", "number"] }, { "type": "null" }] });
        assert_eq!(effective_type(&prop).as_deref(), Some("number"));
    }

    #[test]
    fn conditional_then_else_types() {
        let prop = json!({
            "oneOf": [{
                "if": { "properties": { "mode": { "const": "x" } } },
                "then": { "properties": { "a": { "type": "boolean" } } },
                "else": { "properties": { "b": { "type": "integer" } } }
            }]
        });
        assert_eq!(effective_type(&prop).as_deref(), Some("integer"));
    }

    #[test]
    fn unranked_candidate_used_verbatim() {
        let prop = json!({ "oneOf": [{ "type": "null" }] });
        assert_eq!(effective_type(&prop).as_deref(), Some("null"));
    }

    #[test]
    fn no_candidates() {
        assert_eq!(effective_type(&json!({ "oneOf": [{ "const": 1 }] })), None);
        assert_eq!(effective_type(&json!({ "description": "free" })), None);
    }

    #[test]
    fn pick_by_priority_empty() {
        assert_eq!(pick_by_priority(&[]), None);
    }
}
