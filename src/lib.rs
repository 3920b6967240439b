//! Attestation Schema Compiler
//!
//! Flattens JSON Schema documents into the comma-separated `type name`
//! strings that on-chain attestation registries store, and derives the
//! registry UID for the result.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use attestation_schema::{compile_schema, CompileOptions, Registry};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "title": "User Review",
//!     "properties": {
//!         "subject": { "type": "string" },
//!         "rating": { "type": "integer" },
//!         "tags": { "type": "array", "items": { "type": "string" } },
//!         "revoked": { "type": "boolean", "x-oma3-skip-reason": "eas" }
//!     }
//! });
//!
//! let options = CompileOptions::new(Registry::Eas);
//! let compiled = compile_schema(&schema, Path::new("."), &options).unwrap();
//!
//! assert_eq!(compiled.record.name, "User-Review");
//! assert_eq!(compiled.record.schema, "string subject, uint256 rating, string[] tags");
//! assert!(compiled.record.revocable);
//! assert!(compiled.uid.starts_with("0x"));
//! ```
//!
//! # Type Mapping
//!
//! | JSON Schema | ABI |
//! |-------------|-----|
//! | `string` | `string` |
//! | `string` with a 64-hex-digit `pattern` | `bytes32` |
//! | `integer`, `number` | `uint256` |
//! | `boolean` | `bool` |
//! | `object`, unknown, untyped | `string` |
//! | `array` of any of the above | item type + `[]` |
//!
//! Ambiguous unions (`oneOf`/`anyOf`/`allOf`) resolve by the priority
//! `object > array > string > integer > number > boolean`.
//!
//! # Annotations
//!
//! | Key | Value | Effect |
//! |-----|-------|--------|
//! | `x-oma3-skip-reason` | `"metadata"`, `"eas"` | field left out |
//! | `x-oma3-skip-reason` | `"unused"` | field kept (reserved slot) |
//! | `x-oma3-abi` | `"bytes32"` | field forced to `bytes32` |

mod abi;
mod builder;
mod compile;
mod did;
mod error;
mod linter;
mod loader;
mod node;
mod resolver;
mod types;
mod typing;
mod uid;

pub use abi::{
    is_hex64_pattern, join_fields, map_scalar, map_type, parse_schema_string, AbiScalar, AbiType,
    ItemContext, MapContext, SchemaField,
};
pub use builder::{build_schema, build_schema_string, BuiltSchema, FieldDecision, FieldOutcome};
pub use compile::{compile_schema, schema_name, Compilation, CompileSession, SchemaRecord};
pub use did::{canonicalize_did, did_hash, did_to_index_address, DID_INDEX_DOMAIN};
pub use error::{CompileError, DidError, LoadError, RefError, SchemaStringError};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{
    load_schema, load_schema_str, navigate_fragment, FsSource, SchemaCache, SchemaSource,
};
pub use node::{Branch, PropertySchema, Shape, TypeDecl};
pub use resolver::{resolve_property, resolve_ref, RefTarget};
pub use types::{
    AbiOverride, CompileOptions, Registry, SkipReason, ABI_OVERRIDE_KEY, SKIP_REASON_KEY,
};
pub use typing::{effective_type, pick_by_priority, resolve_effective_type, TYPE_PRIORITY};
pub use uid::{address_hex, calculate_uid, format_uid, pack_eas, parse_resolver, uid_hex};

pub use alloy_primitives::{Address, B256};
