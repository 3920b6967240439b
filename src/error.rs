//! Error types for schema loading, compilation and DID derivation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading a schema document from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Reasons a `$ref` could not be resolved.
///
/// These never abort a compilation; the resolver logs them and falls back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefError {
    #[error("unsupported $ref format: {reference}")]
    UnsupportedFormat { reference: String },

    #[error("cannot load referenced schema file: {file}")]
    Unloadable { file: String },

    #[error("pointer target not found: {pointer}")]
    PointerNotFound { pointer: String },
}

/// Errors while parsing a flattened schema string back into fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaStringError {
    #[error("malformed field \"{field}\": expected \"<type> <name>\"")]
    MalformedField { field: String },

    #[error("unknown ABI type \"{value}\"")]
    UnknownAbiType { value: String },
}

/// Fatal errors that abort a compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("schema has no title and no name override was supplied")]
    MissingName,

    #[error("schema has no properties: this looks like a shared-definitions file, not an attestation schema")]
    NoProperties,

    #[error("invalid resolver address \"{value}\": expected 0x followed by 40 hex digits")]
    InvalidResolver { value: String },
}

impl CompileError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Load(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Errors while deriving an index address from a DID.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DidError {
    #[error("not a DID: \"{value}\"")]
    NotADid { value: String },

    #[error("malformed did:pkh \"{did}\": expected did:pkh:<namespace>:<chainId>:<address>")]
    MalformedPkh { did: String },
}
