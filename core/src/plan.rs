#![deny(missing_docs)]

//! # Patch Plans
//!
//! A plan is the external data file listing the operations to run along with
//! plan-wide options. It is read as YAML for `.yaml`/`.yml` files and as
//! JSON otherwise.

use crate::backup::BackupOptions;
use crate::document::{OutputOptions, SaveOptions};
use crate::error::{PatchError, PatchResult};
use crate::operations::{PatchOperation, PatchOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Operations plus the options that govern them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchPlan {
    /// Defaults for the operations.
    pub options: PatchOptions,
    /// Backup of the destination file.
    pub backup: BackupOptions,
    /// Output formatting.
    pub output: OutputOptions,
    /// Edits, applied in order.
    pub operations: Vec<PatchOperation>,
}

impl PatchPlan {
    /// Reads a plan file, choosing the format from its extension.
    pub fn load(path: &Path) -> PatchResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PatchError::NotFound(path.to_path_buf()),
            _ => PatchError::Io(e),
        })?;
        let origin = path.display().to_string();

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let plan = match ext {
            "yaml" | "yml" => Self::from_yaml_str(&content, &origin)?,
            _ => Self::from_json_str(&content, &origin)?,
        };
        log::debug!(
            "Loaded plan {:?} with {} operations",
            path,
            plan.operations.len()
        );
        Ok(plan)
    }

    /// Parses a YAML plan.
    pub fn from_yaml_str(content: &str, origin: &str) -> PatchResult<Self> {
        serde_yaml::from_str(content).map_err(|e| PatchError::parse(origin, e))
    }

    /// Parses a JSON plan.
    pub fn from_json_str(content: &str, origin: &str) -> PatchResult<Self> {
        serde_json::from_str(content).map_err(|e| PatchError::parse(origin, e))
    }

    /// The save settings carried by this plan.
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            backup: self.backup.clone(),
            output: self.output.clone(),
        }
    }
}
