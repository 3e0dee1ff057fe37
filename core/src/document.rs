#![deny(missing_docs)]

//! # Specification Documents
//!
//! Loads and saves the JSON document being patched. Key order is preserved
//! through `serde_json`'s `preserve_order` feature, so untouched members
//! serialize exactly where they were read. `arbitrary_precision` keeps
//! number literals as written (`1.10`, `1e5`, integers past `u64::MAX`).

use crate::backup::{backup_file, BackupOptions, BackupOutcome};
use crate::error::{PatchError, PatchResult};
use crate::path::FieldPath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A JSON specification document with an object root.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    /// Wraps a parsed value. Non-object roots are rejected.
    pub fn from_value(value: Value, origin: &str) -> PatchResult<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(PatchError::parse(
                origin,
                format!("expected a JSON object at the root, found {}", kind(&other)),
            )),
        }
    }

    /// Parses JSON text.
    pub fn from_json_str(content: &str, origin: &str) -> PatchResult<Self> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| PatchError::parse(origin, e))?;
        Self::from_value(value, origin)
    }

    /// The root object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub(crate) fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.root
    }

    /// Reads the value at a dotted path (see [`FieldPath`]).
    pub fn get(&self, path: &str) -> Option<&Value> {
        FieldPath::parse(path).ok()?.get(&self.root)
    }

    /// Consumes the document.
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Serializes with 2-space indentation.
    pub fn to_json_string(&self, trailing_newline: bool) -> PatchResult<String> {
        let mut out = serde_json::to_string_pretty(&self.root)
            .map_err(|e| PatchError::parse("document", e))?;
        if trailing_newline {
            out.push('\n');
        }
        Ok(out)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serialization settings, from the plan's `output` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputOptions {
    /// End the file with a newline.
    pub trailing_newline: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            trailing_newline: true,
        }
    }
}

/// Everything `save` needs besides the document and destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Backup of the file being replaced.
    pub backup: BackupOptions,
    /// Output formatting.
    pub output: OutputOptions,
}

/// Result of a successful `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Where the document was written.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: usize,
    /// Backup step result, if backups were enabled.
    pub backup: Option<BackupOutcome>,
}

/// Loads a document from disk.
pub fn load(path: &Path) -> PatchResult<Document> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PatchError::NotFound(path.to_path_buf()),
        _ => PatchError::Io(e),
    })?;
    let doc = Document::from_json_str(&content, &path.display().to_string())?;
    log::debug!("Loaded {:?} ({} top-level keys)", path, doc.root.len());
    Ok(doc)
}

/// Writes `doc` to `path`, backing up any existing file first if requested.
///
/// The document is written to a temporary file in the destination directory
/// and renamed into place, so a failed save never leaves a truncated file.
pub fn save(doc: &Document, path: &Path, options: &SaveOptions) -> PatchResult<SaveReport> {
    let content = doc.to_json_string(options.output.trailing_newline)?;

    let backup = if options.backup.enabled {
        Some(backup_file(path, &options.backup)?)
    } else {
        None
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;

    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| PatchError::Io(e.error))?;

    log::info!("Wrote {} bytes to {:?}", content.len(), path);

    Ok(SaveReport {
        path: path.to_path_buf(),
        bytes: content.len(),
        backup,
    })
}
