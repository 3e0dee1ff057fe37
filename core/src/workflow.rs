#![deny(missing_docs)]

//! # Patch Workflow
//!
//! The full run: load → apply → (backup) → save.
//!
//! Nothing reaches the destination unless every operation succeeds.

use crate::document::{load, save, SaveReport};
use crate::error::PatchResult;
use crate::operations::{apply_with, Outcome};
use crate::plan::PatchPlan;
use std::path::PathBuf;

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Document to read.
    pub input: PathBuf,
    /// Destination; may equal `input`.
    pub output: PathBuf,
    /// Operations and options.
    pub plan: PatchPlan,
    /// Apply in memory only.
    pub dry_run: bool,
}

/// What a run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One entry per operation.
    pub outcomes: Vec<Outcome>,
    /// `None` for dry runs.
    pub saved: Option<SaveReport>,
}

/// Executes `request`, reporting each completed operation to `on_outcome`.
pub fn run(request: &RunRequest, on_outcome: impl FnMut(&Outcome)) -> PatchResult<RunReport> {
    let doc = load(&request.input)?;
    let applied = apply_with(
        &doc,
        &request.plan.operations,
        &request.plan.options,
        on_outcome,
    )?;

    if request.dry_run {
        log::info!("Dry run: {:?} left untouched", request.output);
        return Ok(RunReport {
            outcomes: applied.outcomes,
            saved: None,
        });
    }

    let saved = save(
        &applied.document,
        &request.output,
        &request.plan.save_options(),
    )?;

    Ok(RunReport {
        outcomes: applied.outcomes,
        saved: Some(saved),
    })
}
