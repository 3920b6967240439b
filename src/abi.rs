//! Mapping effective JSON types to on-chain ABI types.
//!
//! | Effective type | ABI type |
//! |----------------|----------|
//! | `string` | `bytes32` when the pattern describes 64 hex digits, else `string` |
//! | `integer`, `number` | `uint256` |
//! | `boolean` | `bool` |
//! | `object` | `string` (serialized out-of-band as JSON) |
//! | anything else, or unknown | `string` |
//!
//! Arrays map their item type through the same table and append `[]`.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::SchemaStringError;
use crate::types::AbiOverride;

/// Field name that always maps to `string`.
///
/// Its type only exists inside ambiguous conditionals, and the deployed
/// schemas have it as `string`.
pub const STRING_PINNED_FIELD: &str = "purpose";

/// Separator between fields in a schema string.
pub const FIELD_SEPARATOR: &str = ", ";

/// A primitive ABI type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiScalar {
    String,
    Uint256,
    Bool,
    Bytes32,
}

impl AbiScalar {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiScalar::String => "string",
            AbiScalar::Uint256 => "uint256",
            AbiScalar::Bool => "bool",
            AbiScalar::Bytes32 => "bytes32",
        }
    }
}

/// An ABI type: a primitive, optionally as a dynamic array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbiType {
    pub scalar: AbiScalar,
    pub is_array: bool,
}

impl AbiType {
    pub const fn scalar(scalar: AbiScalar) -> Self {
        Self {
            scalar,
            is_array: false,
        }
    }

    pub const fn array_of(scalar: AbiScalar) -> Self {
        Self {
            scalar,
            is_array: true,
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scalar.as_str())?;
        if self.is_array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

impl FromStr for AbiType {
    type Err = SchemaStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, is_array) = match s.strip_suffix("[]") {
            Some(base) => (base, true),
            None => (s, false),
        };
        let scalar = match base {
            "string" => AbiScalar::String,
            "uint256" => AbiScalar::Uint256,
            "bool" => AbiScalar::Bool,
            "bytes32" => AbiScalar::Bytes32,
            _ => {
                return Err(SchemaStringError::UnknownAbiType {
                    value: s.to_string(),
                })
            }
        };
        Ok(Self { scalar, is_array })
    }
}

/// What the mapper knows about an array's items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemContext {
    /// Effective type of the (resolved) item schema.
    pub effective_type: Option<String>,
    pub pattern: Option<String>,
    pub abi_override: Option<AbiOverride>,
}

/// Context for mapping one field.
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    pub field: &'a str,
    pub pattern: Option<&'a str>,
    pub abi_override: Option<&'a AbiOverride>,
    /// Present only when the field has an `items` schema.
    pub items: Option<&'a ItemContext>,
}

impl<'a> MapContext<'a> {
    pub fn new(field: &'a str) -> Self {
        Self {
            field,
            pattern: None,
            abi_override: None,
            items: None,
        }
    }
}

/// Map a field's effective type to its ABI type.
///
/// Returns `None` (after logging why) when the field cannot be represented:
/// arrays without a determinable item type, and arrays of arrays.
pub fn map_type(effective_type: Option<&str>, ctx: &MapContext<'_>) -> Option<AbiType> {
    if matches!(ctx.abi_override, Some(AbiOverride::Bytes32)) {
        return Some(AbiType::scalar(AbiScalar::Bytes32));
    }

    if ctx.field == STRING_PINNED_FIELD {
        return Some(AbiType::scalar(AbiScalar::String));
    }

    let is_array = effective_type
        .map(|t| t.eq_ignore_ascii_case("array"))
        .unwrap_or(false);
    if !is_array {
        return Some(AbiType::scalar(map_scalar(effective_type, ctx.pattern)));
    }

    let Some((item, item_type)) = ctx
        .items
        .and_then(|item| item.effective_type.as_deref().map(|ty| (item, ty)))
    else {
        warn!(
            "dropping field {}: array has no determinable item type",
            ctx.field
        );
        return None;
    };
    if item_type.eq_ignore_ascii_case("array") {
        warn!(
            "dropping field {}: arrays of arrays are not supported",
            ctx.field
        );
        return None;
    }

    let scalar = match item.abi_override {
        Some(AbiOverride::Bytes32) => AbiScalar::Bytes32,
        _ => map_scalar(Some(item_type), item.pattern.as_deref()),
    };
    Some(AbiType::array_of(scalar))
}

/// Map a non-array effective type through the scalar table.
pub fn map_scalar(effective_type: Option<&str>, pattern: Option<&str>) -> AbiScalar {
    let Some(ty) = effective_type else {
        return AbiScalar::String;
    };
    match ty.to_ascii_lowercase().as_str() {
        "string" if pattern.map(is_hex64_pattern).unwrap_or(false) => AbiScalar::Bytes32,
        "integer" | "number" => AbiScalar::Uint256,
        "boolean" => AbiScalar::Bool,
        _ => AbiScalar::String,
    }
}

/// Whether a regex pattern describes a run of exactly 64 hex digits.
///
/// This is a containment check, not a parse: any `[...]{64}` whose class
/// covers digits (`0-9` or `\d`) and a hex letter range counts, anchored
/// or not.
pub fn is_hex64_pattern(pattern: &str) -> bool {
    pattern.match_indices("]{64}").any(|(end, _)| {
        pattern[..end]
            .rfind('[')
            .map(|start| {
                let class = &pattern[start + 1..end];
                let digits = class.contains("0-9") || class.contains("\\d");
                digits && (class.contains("a-f") || class.contains("A-F"))
            })
            .unwrap_or(false)
    })
}

/// One `type name` pair of a schema string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub abi: AbiType,
    pub name: String,
}

impl SchemaField {
    pub fn new(abi: AbiType, name: impl Into<String>) -> Self {
        Self {
            abi,
            name: name.into(),
        }
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.abi, self.name)
    }
}

/// Join fields into a schema string.
pub fn join_fields(fields: &[SchemaField]) -> String {
    fields
        .iter()
        .map(SchemaField::to_string)
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR)
}

/// Split a schema string back into its fields.
///
/// This is how attestation decoders read the layout, so an empty string is
/// an empty layout.
///
/// # Errors
///
/// Returns `SchemaStringError` for a pair that isn't `<type> <name>` or
/// names an ABI type outside the supported set.
pub fn parse_schema_string(schema: &str) -> Result<Vec<SchemaField>, SchemaStringError> {
    if schema.trim().is_empty() {
        return Ok(Vec::new());
    }

    schema
        .split(',')
        .map(|pair| {
            let pair = pair.trim();
            let mut parts = pair.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(ty), Some(name), None) => Ok(SchemaField::new(ty.parse()?, name)),
                _ => Err(SchemaStringError::MalformedField {
                    field: pair.to_string(),
                }),
            }
        })
        .collect()
}
