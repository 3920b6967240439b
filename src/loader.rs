//! Schema loading from disk.
//!
//! Root documents are loaded with [`load_schema`], which fails loudly.
//! Documents reached through an external `$ref` go through a [`SchemaCache`],
//! which reads each relative path at most once per cache and degrades every
//! failure to a logged warning.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{LoadError, RefError};

/// Where schema documents come from.
///
/// The filesystem implementation is [`FsSource`]; tests substitute their own.
pub trait SchemaSource {
    /// Whether a document exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Read the document at `path` as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
}

/// Reads schema documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl SchemaSource for FsSource {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Load a schema from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, LoadError> {
    load_from(&FsSource, path)
}

/// Load a schema from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

fn load_from<S: SchemaSource + ?Sized>(source: &S, path: &Path) -> Result<Value, LoadError> {
    if !source.exists(path) {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = source
        .read_to_string(path)
        .map_err(|source| LoadError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

    load_schema_str(&content)
}

/// Navigate a JSON Pointer fragment (e.g., "#/$defs/foo").
///
/// An empty pointer ("#" or "#/") yields the whole document.
pub fn navigate_fragment<'a>(schema: &'a Value, fragment: &str) -> Result<&'a Value, RefError> {
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Ok(schema);
    }

    let mut current = schema;
    for part in path.split('/') {
        // ~1 = /, ~0 = ~
        let key = part.replace("~1", "/").replace("~0", "~");
        let next = match current {
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => current.get(key.as_str()),
        };
        current = next.ok_or_else(|| RefError::PointerNotFound {
            pointer: fragment.to_string(),
        })?;
    }
    Ok(current)
}

/// Cache of externally referenced schema documents.
///
/// Keyed by the relative path string exactly as written in the `$ref`, so two
/// references spelling the same file differently are loaded separately.
/// Failed loads are not cached and will be retried on the next request.
#[derive(Debug, Default)]
pub struct SchemaCache<S = FsSource> {
    source: S,
    documents: HashMap<String, Value>,
}

impl SchemaCache<FsSource> {
    /// Create an empty cache backed by the filesystem.
    pub fn new() -> Self {
        Self::with_source(FsSource)
    }
}

impl<S: SchemaSource> SchemaCache<S> {
    /// Create an empty cache backed by `source`.
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            documents: HashMap::new(),
        }
    }

    /// Load `relative_path` (resolved against `base_dir`), serving repeats from cache.
    ///
    /// Returns `None` when the file is missing or isn't valid JSON.
    pub fn load(&mut self, relative_path: &str, base_dir: &Path) -> Option<&Value> {
        if self.documents.contains_key(relative_path) {
            debug!(file = relative_path, "external schema served from cache");
            return self.documents.get(relative_path);
        }

        let path = base_dir.join(relative_path);
        match load_from(&self.source, &path) {
            Ok(document) => Some(
                &*self
                    .documents
                    .entry(relative_path.to_string())
                    .or_insert(document),
            ),
            Err(e) => {
                warn!("could not load external schema {}: {}", relative_path, e);
                None
            }
        }
    }

    /// Load the root document of a compilation through this cache's source.
    ///
    /// The root document itself is not cached.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the file is missing, unreadable, or not JSON.
    pub fn load_root(&self, path: &Path) -> Result<Value, LoadError> {
        load_from(&self.source, path)
    }

    /// Whether `relative_path` has been loaded successfully.
    pub fn contains(&self, relative_path: &str) -> bool {
        self.documents.contains_key(relative_path)
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The underlying document source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use super::SchemaSource;

    /// In-memory source that counts reads.
    #[derive(Debug, Default)]
    pub struct CountingSource {
        files: HashMap<PathBuf, String>,
        reads: Cell<usize>,
    }

    impl CountingSource {
        pub fn with_file(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
            self.files.insert(path.into(), content.to_string());
            self
        }

        pub fn reads(&self) -> usize {
            self.reads.get()
        }
    }

    impl SchemaSource for CountingSource {
        fn exists(&self, path: &Path) -> bool {
            self.files.contains_key(path)
        }

        fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
            self.reads.set(self.reads.get() + 1);
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
        }
    }
}
