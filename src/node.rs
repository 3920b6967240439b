//! Typed view of a property schema.
//!
//! Built from a property after `$ref` resolution. Only the keys that matter
//! for flattening to ABI types are kept; everything else is ignored.

use serde_json::Value;

use crate::types::{AbiOverride, SkipReason};

/// Composition keywords, in the order their branches are scanned.
pub const COMPOSITION_KEYWORDS: [&str; 3] = ["oneOf", "anyOf", "allOf"];

/// Conditional keywords whose nested `properties` contribute candidate types.
const CONDITIONAL_KEYWORDS: [&str; 2] = ["then", "else"];

/// A declared `type` keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDecl {
    /// `"type": "string"`
    Single(String),
    /// `"type": ["string", "null"]`
    Union(Vec<String>),
}

impl TypeDecl {
    /// Read a `type` value. Non-string, non-array values are not a declaration.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(TypeDecl::Single(s.clone())),
            Value::Array(arr) => Some(TypeDecl::Union(
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
            )),
            _ => None,
        }
    }

    /// The lowercased type this declaration stands for.
    ///
    /// For unions `null` is discarded and the first remaining entry wins; a
    /// union of nothing but `null` falls back to its first entry.
    pub fn primary(&self) -> Option<String> {
        match self {
            TypeDecl::Single(s) => Some(s.to_lowercase()),
            TypeDecl::Union(types) => types
                .iter()
                .find(|t| !t.eq_ignore_ascii_case("null"))
                .or_else(|| types.first())
                .map(|t| t.to_lowercase()),
        }
    }
}

/// One member of a `oneOf`/`anyOf`/`allOf` list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Branch {
    /// The branch's own `type`.
    pub type_decl: Option<TypeDecl>,
    /// Types of the properties under the branch's `then.properties` and `else.properties`.
    pub conditional_types: Vec<TypeDecl>,
}

impl Branch {
    fn from_value(value: &Value) -> Self {
        let type_decl = value.get("type").and_then(TypeDecl::from_value);
        let conditional_types = CONDITIONAL_KEYWORDS
            .iter()
            .filter_map(|key| value.get(*key))
            .filter_map(|cond| cond.get("properties").and_then(Value::as_object))
            .flat_map(|props| props.values())
            .filter_map(|prop| prop.get("type").and_then(TypeDecl::from_value))
            .collect();
        Self {
            type_decl,
            conditional_types,
        }
    }

    /// Candidate types contributed by this branch, lowercased.
    pub fn candidates(&self) -> impl Iterator<Item = String> + '_ {
        self.type_decl
            .iter()
            .chain(self.conditional_types.iter())
            .filter_map(TypeDecl::primary)
    }
}

/// How a property declares its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A direct `type` keyword.
    Declared(TypeDecl),
    /// No direct type; branches of the composition keywords, in scan order.
    Composed(Vec<Branch>),
    /// Neither.
    Untyped,
}

/// A property schema reduced to what the ABI mapper needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySchema {
    pub shape: Shape,
    pub pattern: Option<String>,
    /// Raw `items` schema; may still carry a `$ref`.
    pub items: Option<Value>,
    pub skip_reason: Option<SkipReason>,
    pub abi_override: Option<AbiOverride>,
}

impl PropertySchema {
    /// Build the typed view of an (already `$ref`-resolved) property.
    pub fn from_value(value: &Value) -> Self {
        Self {
            shape: shape_of(value),
            pattern: value
                .get("pattern")
                .and_then(Value::as_str)
                .map(String::from),
            items: value.get("items").cloned(),
            skip_reason: SkipReason::from_property(value),
            abi_override: AbiOverride::from_property(value),
        }
    }
}

fn shape_of(value: &Value) -> Shape {
    if let Some(decl) = value.get("type").and_then(TypeDecl::from_value) {
        return Shape::Declared(decl);
    }

    let mut present = false;
    let mut branches = Vec::new();
    for keyword in COMPOSITION_KEYWORDS {
        if let Some(members) = value.get(keyword).and_then(Value::as_array) {
            present = true;
            branches.extend(members.iter().filter(|m| m.is_object()).map(Branch::from_value));
        }
    }

    if present {
        Shape::Composed(branches)
    } else {
        Shape::Untyped
    }
}
