#![deny(missing_docs)]

//! # Backups
//!
//! Copies the file about to be overwritten to a sibling
//! `<file>.backup.<suffix>` path. The suffix is a caller-supplied label or a
//! local timestamp. Existing backups are never silently replaced with
//! different content.

use crate::error::{PatchError, PatchResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Backup settings, usually taken from the plan's `backup` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupOptions {
    /// Write a backup before saving.
    pub enabled: bool,
    /// Fixed suffix (e.g. `pre-v1.7.2`); a timestamp is used when absent.
    pub label: Option<String>,
    /// Allow replacing a labelled backup whose content differs.
    pub overwrite: bool,
}

/// What the backup step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// A new backup was written.
    Written(PathBuf),
    /// A backup with identical content already existed.
    Reused(PathBuf),
    /// The destination did not exist yet.
    NothingToBackUp,
}

/// Builds `<dir>/<file name>.backup.<suffix>`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.backup.{}", file_name, suffix))
}

/// Backs up `path` using a local-time stamp when no label is configured.
pub fn backup_file(path: &Path, options: &BackupOptions) -> PatchResult<BackupOutcome> {
    let stamp = chrono::Local::now().format("%Y%m%dT%H%M%S").to_string();
    backup_file_with_stamp(path, options, &stamp)
}

/// Backs up `path`, using `stamp` as the suffix when no label is configured.
pub fn backup_file_with_stamp(
    path: &Path,
    options: &BackupOptions,
    stamp: &str,
) -> PatchResult<BackupOutcome> {
    let original = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BackupOutcome::NothingToBackUp),
        Err(e) => return Err(e.into()),
    };

    match options.label.as_deref() {
        Some(label) => {
            if label.is_empty() || label.contains(['/', '\\']) {
                return Err(PatchError::Precondition(format!(
                    "backup label '{}' must be a non-empty file name suffix",
                    label
                )));
            }
            let target = backup_path(path, label);
            match write_new(&target, &original)? {
                Some(outcome) => Ok(outcome),
                None if options.overwrite => {
                    fs::write(&target, &original)?;
                    log::info!("Overwrote backup {:?}", target);
                    Ok(BackupOutcome::Written(target))
                }
                None => Err(PatchError::Io(std::io::Error::new(
                    ErrorKind::AlreadyExists,
                    format!("backup {:?} exists with different content", target),
                ))),
            }
        }
        None => {
            for attempt in 0usize.. {
                let suffix = match attempt {
                    0 => stamp.to_string(),
                    n => format!("{}-{}", stamp, n),
                };
                if let Some(outcome) = write_new(&backup_path(path, &suffix), &original)? {
                    return Ok(outcome);
                }
            }
            unreachable!("unbounded suffix search always returns")
        }
    }
}

/// Creates `target` with `bytes`.
///
/// Returns `None` when `target` already exists with different content.
fn write_new(target: &Path, bytes: &[u8]) -> PatchResult<Option<BackupOutcome>> {
    match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => {
            fill_or_discard(target, file, bytes, |f| f.sync_all())?;
            log::info!("Wrote backup {:?}", target);
            Ok(Some(BackupOutcome::Written(target.to_path_buf())))
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            if fs::read(target)? == bytes {
                log::debug!("Backup {:?} already holds this content", target);
                Ok(Some(BackupOutcome::Reused(target.to_path_buf())))
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Writes `bytes` to the freshly created `target` through `file`, then
/// calls `sync`. On failure `target` is removed so no truncated backup is
/// left behind.
fn fill_or_discard<W: Write>(
    target: &Path,
    mut file: W,
    bytes: &[u8],
    sync: impl FnOnce(&W) -> io::Result<()>,
) -> PatchResult<()> {
    let written = file
        .write_all(bytes)
        .and_then(|()| file.flush())
        .and_then(|()| sync(&file));
    drop(file);

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(target) {
            log::warn!("Could not remove partial backup {:?}: {}", target, cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}
