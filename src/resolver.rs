//! `$ref` resolution for property schemas.
//!
//! Local refs (`#/...`) are walked inside the current document; external refs
//! (`file.json#/...`) load the file through the [`SchemaCache`] first. Nothing
//! here returns an error to the caller: failures are logged and the caller gets
//! `None` or the unresolved property back.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::RefError;
use crate::loader::{navigate_fragment, SchemaCache, SchemaSource};

/// Where a `$ref` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget<'a> {
    /// A pointer into the current document.
    Local(&'a str),
    /// A pointer into another file, relative to the current base directory.
    External { file: &'a str, fragment: &'a str },
}

impl<'a> RefTarget<'a> {
    /// Classify a ref string.
    ///
    /// A ref is external when it contains `#` and doesn't start with it.
    /// The external fragment keeps its leading `#`.
    pub fn parse(reference: &'a str) -> Self {
        match reference.find('#') {
            Some(idx) if idx > 0 => RefTarget::External {
                file: &reference[..idx],
                fragment: &reference[idx..],
            },
            _ => RefTarget::Local(reference),
        }
    }
}

/// Resolve a `$ref` string to the node it points at.
///
/// Returns `None` (after logging a warning) if the target cannot be found.
pub fn resolve_ref<S: SchemaSource>(
    reference: &str,
    document: &Value,
    base_dir: &Path,
    cache: &mut SchemaCache<S>,
) -> Option<Value> {
    match try_resolve_ref(reference, document, base_dir, cache) {
        Ok(node) => Some(node),
        Err(e) => {
            warn!("cannot resolve $ref {}: {}", reference, e);
            None
        }
    }
}

/// Resolve a property's `$ref`, if any, layering its sibling keys on top.
///
/// Sibling keys win over keys of the resolved target; `$ref` itself is dropped.
/// A property without `$ref` is returned as-is. If the ref cannot be resolved
/// the original property comes back unchanged.
pub fn resolve_property<S: SchemaSource>(
    prop: &Value,
    document: &Value,
    base_dir: &Path,
    cache: &mut SchemaCache<S>,
) -> Value {
    let Some(reference) = prop.get("$ref").and_then(Value::as_str) else {
        return prop.clone();
    };

    let Some(target) = resolve_ref(reference, document, base_dir, cache) else {
        warn!("leaving $ref {} unresolved", reference);
        return prop.clone();
    };

    let mut merged = match target {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Some(local) = prop.as_object() {
        for (key, value) in local {
            if key != "$ref" {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(merged)
}

fn try_resolve_ref<S: SchemaSource>(
    reference: &str,
    document: &Value,
    base_dir: &Path,
    cache: &mut SchemaCache<S>,
) -> Result<Value, RefError> {
    match RefTarget::parse(reference) {
        RefTarget::External { file, fragment } => {
            let loaded = cache
                .load(file, base_dir)
                .ok_or_else(|| RefError::Unloadable {
                    file: file.to_string(),
                })?;
            navigate_fragment(loaded, fragment).cloned()
        }
        RefTarget::Local(pointer) => {
            if !pointer.starts_with("#/") {
                return Err(RefError::UnsupportedFormat {
                    reference: reference.to_string(),
                });
            }
            navigate_fragment(document, pointer).cloned()
        }
    }
}
