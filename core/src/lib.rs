#![deny(missing_docs)]

//! # oaspatch Core
//!
//! Loads an OpenAPI specification document, applies an ordered list of
//! declarative patch operations and saves the result, optionally after
//! backing up the file it replaces.

/// Shared error types.
pub mod error;

/// Dotted field paths.
pub mod path;

/// Document loading and saving.
pub mod document;

/// Backups of replaced files.
pub mod backup;

/// Tag collection and operation tag edits.
pub mod tags;

/// Server URL rewriting.
pub mod servers;

/// Patch operations and `apply`.
pub mod operations;

/// Plan files.
pub mod plan;

/// End-to-end runs.
pub mod workflow;

pub use backup::{backup_file, BackupOptions, BackupOutcome};
pub use document::{load, save, Document, OutputOptions, SaveOptions, SaveReport};
pub use error::{PatchError, PatchResult};
pub use operations::{apply, apply_with, Applied, Outcome, PatchOperation, PatchOptions};
pub use path::FieldPath;
pub use plan::PatchPlan;
pub use servers::ServerMatcher;
pub use tags::{Tag, TagPolicy, TagReport};
pub use workflow::{run, RunReport, RunRequest};
