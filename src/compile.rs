//! Compiling a root schema document into a registry record.

use std::path::Path;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::builder::{build_schema, BuiltSchema, FieldOutcome};
use crate::error::CompileError;
use crate::loader::{FsSource, SchemaCache, SchemaSource};
use crate::types::{CompileOptions, SkipReason};
use crate::uid::{address_hex, calculate_uid, uid_hex};

/// Property whose `eas` skip reason marks the schema as revocable.
pub const REVOKED_FIELD: &str = "revoked";

/// The record a registry deployment consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub name: String,
    pub schema: String,
    pub revocable: bool,
    /// Only present for registries that take a resolver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver: Option<String>,
}

/// Everything produced by one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    pub record: SchemaRecord,
    /// `0x`-prefixed schema UID for the selected registry.
    pub uid: String,
    /// Field-level detail behind `record.schema`.
    pub built: BuiltSchema,
}

/// State shared by compilations: the external schema cache.
///
/// Reuse one session to share cached `$ref` targets across documents, or
/// create one per compilation to keep them isolated.
#[derive(Debug, Default)]
pub struct CompileSession<S = FsSource> {
    cache: SchemaCache<S>,
}

impl CompileSession<FsSource> {
    /// Create a session reading from the filesystem.
    pub fn new() -> Self {
        Self::with_source(FsSource)
    }
}

impl<S: SchemaSource> CompileSession<S> {
    /// Create a session reading from `source`.
    pub fn with_source(source: S) -> Self {
        Self {
            cache: SchemaCache::with_source(source),
        }
    }

    /// The session's external schema cache.
    pub fn cache(&self) -> &SchemaCache<S> {
        &self.cache
    }

    /// Load and compile the schema at `path`.
    ///
    /// External refs resolve relative to the file's directory.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::Load` if the file can't be loaded, plus any
    /// error from [`CompileSession::compile`].
    pub fn compile_file(
        &mut self,
        path: &Path,
        options: &CompileOptions,
    ) -> Result<Compilation, CompileError> {
        let document = self.cache.load_root(path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        self.compile(&document, base_dir, options)
    }

    /// Compile an already-parsed root document.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::MissingName` when neither a name override nor a
    /// `title` yields a non-blank name, and `CompileError::NoProperties` when the
    /// document has no top-level properties.
    pub fn compile(
        &mut self,
        document: &Value,
        base_dir: &Path,
        options: &CompileOptions,
    ) -> Result<Compilation, CompileError> {
        let name = match (&options.name, document.get("title").and_then(Value::as_str)) {
            (Some(name), _) => name.clone(),
            (None, Some(title)) => schema_name(title),
            (None, None) => String::new(),
        };
        if name.trim().is_empty() {
            return Err(CompileError::MissingName);
        }

        let properties = document
            .get("properties")
            .and_then(Value::as_object)
            .filter(|props| !props.is_empty())
            .ok_or(CompileError::NoProperties)?;

        let built = build_schema(properties, document, base_dir, &mut self.cache);
        let schema = built.schema_string();

        let revocable = match options.revocable {
            Some(revocable) => revocable,
            None => {
                let detected = has_service_revocation(&built);
                if detected {
                    info!(
                        "revocable: true (field {} is handled by the attestation service)",
                        REVOKED_FIELD
                    );
                }
                detected
            }
        };

        let resolver = if options.registry.uses_resolver() {
            let resolver = options.resolver.unwrap_or_else(|| {
                info!("no resolver supplied, using the zero address");
                Address::ZERO
            });
            Some(resolver)
        } else {
            None
        };

        let uid = calculate_uid(
            options.registry,
            &schema,
            resolver.unwrap_or(Address::ZERO),
            revocable,
        );
        let uid = uid_hex(&uid);
        info!("compiled schema {}: {}", name, schema);
        info!("schema UID: {}", uid);

        Ok(Compilation {
            record: SchemaRecord {
                name,
                schema,
                revocable,
                resolver: resolver.as_ref().map(address_hex),
            },
            uid,
            built,
        })
    }
}

/// Compile a document with a fresh filesystem-backed session.
///
/// # Errors
///
/// See [`CompileSession::compile`].
pub fn compile_schema(
    document: &Value,
    base_dir: &Path,
    options: &CompileOptions,
) -> Result<Compilation, CompileError> {
    CompileSession::new().compile(document, base_dir, options)
}

/// Derive a record name from a schema title: whitespace runs become `-`.
pub fn schema_name(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join("-")
}

fn has_service_revocation(built: &BuiltSchema) -> bool {
    matches!(
        built.decision(REVOKED_FIELD),
        Some(FieldOutcome::Skipped(SkipReason::Eas))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::test_support::CountingSource;
    use crate::types::Registry;
    use serde_json::json;

    fn session() -> CompileSession<CountingSource> {
        CompileSession::with_source(CountingSource::default())
    }

    fn compile(document: &Value, options: &CompileOptions) -> Result<Compilation, CompileError> {
        session().compile(document, Path::new("/schemas"), options)
    }

    #[test]
    fn schema_name_collapses_whitespace() {
        assert_eq!(schema_name("User Review"), "User-Review");
        assert_eq!(schema_name("Linked  \t Identifier"), "Linked-Identifier");
    }

    #[test]
    fn compiles_record() {
        let doc = json!({
            "title": "Score Card",
            "properties": {
                "subject": { "type": "string" },
                "score": { "type": "integer" }
            }
        });
        let result = compile(&doc, &CompileOptions::new(Registry::Eas)).unwrap();

        assert_eq!(result.record.name, "Score-Card");
        assert_eq!(result.record.schema, "string subject, uint256 score");
        assert!(!result.record.revocable);
        assert_eq!(
            result.record.resolver.as_deref(),
            Some("0x0000000000000000000000000000000000000000")
        );
        assert_eq!(result.uid.len(), 66);
    }

    #[test]
    fn name_override_wins() {
        let doc = json!({ "title": "Ignored", "properties": { "a": { "type": "string" } } });
        let opts = CompileOptions::new(Registry::Eas).name("Explicit");
        assert_eq!(compile(&doc, &opts).unwrap().record.name, "Explicit");
    }

    #[test]
    fn missing_name_is_fatal() {
        let doc = json!({ "properties": { "a": { "type": "string" } } });
        let result = compile(&doc, &CompileOptions::default());
        assert!(matches!(result, Err(CompileError::MissingName)));
    }

    #[test]
    fn blank_name_is_fatal() {
        let doc = json!({ "title": "   ", "properties": { "a": { "type": "string" } } });
        let result = compile(&doc, &CompileOptions::default());
        assert!(matches!(result, Err(CompileError::MissingName)));

        let doc = json!({ "title": "", "properties": { "a": { "type": "string" } } });
        let result = compile(&doc, &CompileOptions::default());
        assert!(matches!(result, Err(CompileError::MissingName)));

        let doc = json!({ "title": "Titled", "properties": { "a": { "type": "string" } } });
        let result = compile(&doc, &CompileOptions::default().name(" "));
        assert!(matches!(result, Err(CompileError::MissingName)));
    }

    #[test]
    fn missing_properties_is_fatal() {
        let doc = json!({ "title": "Common", "$defs": { "X": { "type": "string" } } });
        let result = compile(&doc, &CompileOptions::default());
        assert!(matches!(result, Err(CompileError::NoProperties)));

        let doc = json!({ "title": "Common", "properties": {} });
        let result = compile(&doc, &CompileOptions::default());
        assert!(matches!(result, Err(CompileError::NoProperties)));
    }

    #[test]
    fn revocable_auto_detected_from_revoked_field() {
        let doc = json!({
            "title": "T",
            "properties": {
                "subject": { "type": "string" },
                "revoked": { "type": "boolean", "x-oma3-skip-reason": "eas" }
            }
        });
        let result = compile(&doc, &CompileOptions::default()).unwrap();
        assert!(result.record.revocable);
        assert_eq!(result.record.schema, "string subject");
    }

    #[test]
    fn revoked_without_eas_reason_is_not_revocable() {
        let doc = json!({
            "title": "T",
            "properties": { "revoked": { "type": "boolean" } }
        });
        let result = compile(&doc, &CompileOptions::default()).unwrap();
        assert!(!result.record.revocable);
        assert_eq!(result.record.schema, "bool revoked");
    }

    #[test]
    fn explicit_revocable_wins() {
        let doc = json!({
            "title": "T",
            "properties": {
                "revoked": { "type": "boolean", "x-oma3-skip-reason": "eas" },
                "a": { "type": "string" }
            }
        });
        let opts = CompileOptions::default().revocable(false);
        assert!(!compile(&doc, &opts).unwrap().record.revocable);
    }

    #[test]
    fn schema_only_record_has_no_resolver() {
        let doc = json!({ "title": "T", "properties": { "a": { "type": "string" } } });
        let opts = CompileOptions::new(Registry::SchemaOnly).resolver(Address::repeat_byte(7));
        let result = compile(&doc, &opts).unwrap();

        assert_eq!(result.record.resolver, None);
        let expected = calculate_uid(Registry::SchemaOnly, "string a", Address::ZERO, false);
        assert_eq!(result.uid, uid_hex(&expected));

        let serialized = serde_json::to_value(&result.record).unwrap();
        assert!(serialized.get("resolver").is_none());
    }

    #[test]
    fn eas_uid_uses_resolver_and_revocable() {
        let doc = json!({ "title": "T", "properties": { "a": { "type": "string" } } });
        let resolver = Address::repeat_byte(0x42);
        let opts = CompileOptions::new(Registry::Eas)
            .resolver(resolver)
            .revocable(true);
        let result = compile(&doc, &opts).unwrap();

        let expected = calculate_uid(Registry::Eas, "string a", resolver, true);
        assert_eq!(result.uid, uid_hex(&expected));
        assert_eq!(result.record.resolver, Some(address_hex(&resolver)));
    }

    #[test]
    fn compile_file_resolves_external_refs_next_to_the_file() {
        let source = CountingSource::default()
            .with_file(
                "/schemas/review.json",
                r#"{"title": "Review", "properties": {
                    "proof": {"$ref": "common.json#/$defs/Proof"},
                    "digest": {"$ref": "common.json#/$defs/Digest"}
                }}"#,
            )
            .with_file(
                "/schemas/common.json",
                r#"{"$defs": {"Proof": {"type": "object"}, "Digest": {"type": "string", "pattern": "^0x[a-f0-9]{64}$"}}}"#,
            );
        let mut session = CompileSession::with_source(source);
        let result = session
            .compile_file(Path::new("/schemas/review.json"), &CompileOptions::default())
            .unwrap();

        assert_eq!(result.record.schema, "string proof, bytes32 digest");
        // one read for the root, one for common.json
        assert_eq!(session.cache().source().reads(), 2);
    }
}
