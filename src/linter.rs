//! Schema linting - static checks for attestation schema files.
//!
//! Validates schema files for:
//! - JSON syntax errors
//! - Broken or unsupported $ref references
//! - Unknown skip-reason and ABI override values
//! - Missing title/properties and dangling `required` entries

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::loader::{load_schema, navigate_fragment};
use crate::resolver::RefTarget;
use crate::types::{
    json_type_name, AbiOverride, SkipReason, ABI_OVERRIDE_KEY, SKIP_REASON_KEY,
};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/properties/hash/$ref")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings count as failures.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_schema_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += count(&file_result, Severity::Error);
        total_warnings += count(&file_result, Severity::Warning);
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

fn count(result: &FileResult, severity: Severity) -> usize {
    result
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .count()
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diags = Diagnostics {
        file,
        items: Vec::new(),
    };

    let schema = match load_schema(file) {
        Ok(s) => s,
        Err(e) => {
            diags.error("E001", "/", format!("syntax error: {}", e));
            return finish(file, base_path, diags.items);
        }
    };

    let file_dir = file.parent().unwrap_or(Path::new("."));
    check_refs(&schema, file_dir, "", &schema, &mut diags);
    check_annotations(&schema, "", &mut diags);
    check_document(&schema, &mut diags);

    finish(file, base_path, diags.items)
}

fn finish(file: &Path, base_path: &Path, diagnostics: Vec<Diagnostic>) -> FileResult {
    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

struct Diagnostics<'a> {
    file: &'a Path,
    items: Vec<Diagnostic>,
}

impl Diagnostics<'_> {
    fn push(&mut self, severity: Severity, code: &str, path: &str, message: String) {
        self.items.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            message,
        });
    }

    fn error(&mut self, code: &str, path: &str, message: String) {
        self.push(Severity::Error, code, path, message);
    }

    fn warning(&mut self, code: &str, path: &str, message: String) {
        self.push(Severity::Warning, code, path, message);
    }
}

/// Document-level checks: something to name it by, something to compile.
fn check_document(schema: &Value, diags: &mut Diagnostics<'_>) {
    let properties = schema.get("properties").and_then(Value::as_object);

    if properties.map(|p| p.is_empty()).unwrap_or(true) {
        diags.warning(
            "W001",
            "/",
            "no properties: shared-definitions file, cannot be compiled on its own".to_string(),
        );
    }

    if schema.get("title").and_then(Value::as_str).is_none() {
        diags.warning(
            "W002",
            "/",
            "schema missing title: a name override will be required".to_string(),
        );
    }

    let Some(required) = schema.get("required").and_then(Value::as_array) else {
        return;
    };
    for (i, entry) in required.iter().enumerate() {
        let Some(name) = entry.as_str() else {
            continue;
        };
        if !properties.map(|p| p.contains_key(name)).unwrap_or(false) {
            diags.warning(
                "W005",
                &format!("/required/{}", i),
                format!("required field \"{}\" is not a property", name),
            );
        }
    }
}

/// Recursively check $ref values in a schema.
fn check_refs(
    value: &Value,
    file_dir: &Path,
    path: &str,
    root: &Value,
    diags: &mut Diagnostics<'_>,
) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_val)) = map.get("$ref") {
                check_single_ref(ref_val, file_dir, &format!("{}/$ref", path), root, diags);
            }

            for (key, val) in map {
                let child_path = format!("{}/{}", path, key);
                check_refs(val, file_dir, &child_path, root, diags);
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                let child_path = format!("{}/{}", path, i);
                check_refs(item, file_dir, &child_path, root, diags);
            }
        }
        _ => {}
    }
}

/// Check a single $ref value the same way the compiler will resolve it.
fn check_single_ref(
    ref_val: &str,
    file_dir: &Path,
    path: &str,
    root: &Value,
    diags: &mut Diagnostics<'_>,
) {
    match RefTarget::parse(ref_val) {
        RefTarget::Local(pointer) => {
            if !pointer.starts_with("#/") {
                diags.error(
                    "E004",
                    path,
                    format!("unsupported $ref format: {}", ref_val),
                );
            } else if navigate_fragment(root, pointer).is_err() {
                diags.error("E003", path, format!("anchor not found: {}", ref_val));
            }
        }
        RefTarget::External { file, fragment } => {
            let ref_path = file_dir.join(file);
            if !ref_path.exists() {
                diags.error("E002", path, format!("file not found: {}", file));
                return;
            }

            // An unreadable target is reported when that file is linted itself
            if let Ok(ref_schema) = load_schema(&ref_path) {
                if navigate_fragment(&ref_schema, fragment).is_err() {
                    diags.error(
                        "E003",
                        path,
                        format!("anchor not found in {}: {}", file, fragment),
                    );
                }
            }
        }
    }
}

/// Recursively check skip-reason and ABI override annotations.
fn check_annotations(value: &Value, path: &str, diags: &mut Diagnostics<'_>) {
    match value {
        Value::Object(map) => {
            if let Some(annotation) = map.get(SKIP_REASON_KEY) {
                let annotation_path = format!("{}/{}", path, SKIP_REASON_KEY);
                match annotation.as_str().map(SkipReason::parse) {
                    Some(SkipReason::Other(s)) => diags.warning(
                        "W003",
                        &annotation_path,
                        format!(
                            "unknown skip reason \"{}\": expected metadata, eas, or unused; field will be included",
                            s
                        ),
                    ),
                    Some(_) => {}
                    None => diags.warning(
                        "W003",
                        &annotation_path,
                        format!(
                            "invalid {} type: expected string, got {}",
                            SKIP_REASON_KEY,
                            json_type_name(annotation)
                        ),
                    ),
                }
            }

            if let Some(annotation) = map.get(ABI_OVERRIDE_KEY) {
                let annotation_path = format!("{}/{}", path, ABI_OVERRIDE_KEY);
                match annotation.as_str().map(AbiOverride::parse) {
                    Some(AbiOverride::Other(s)) => diags.warning(
                        "W004",
                        &annotation_path,
                        format!("unknown ABI override \"{}\": expected bytes32; ignored", s),
                    ),
                    Some(AbiOverride::Bytes32) => {}
                    None => diags.warning(
                        "W004",
                        &annotation_path,
                        format!(
                            "invalid {} type: expected string, got {}",
                            ABI_OVERRIDE_KEY,
                            json_type_name(annotation)
                        ),
                    ),
                }
            }

            for (key, val) in map {
                let child_path = format!("{}/{}", path, key);
                check_annotations(val, &child_path, diags);
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                let child_path = format!("{}/{}", path, i);
                check_annotations(item, &child_path, diags);
            }
        }
        _ => {}
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}
