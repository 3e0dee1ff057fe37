#![deny(missing_docs)]

//! # Apply / Check Commands
//!
//! Builds a plan from the plan file and command line overrides, then runs
//! load → apply → save.
//!
//! - `apply` writes the result (after an optional backup).
//! - `check` stops after applying in memory.

use crate::error::{CliError, CliResult};
use oaspatch_core::{run, BackupOutcome, PatchOperation, PatchPlan, RunRequest};
use serde_json::Value;
use std::path::PathBuf;

/// Arguments shared by `apply` and `check`.
#[derive(clap::Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Plan file listing the operations (YAML or JSON).
    #[clap(long, short)]
    pub plan: Option<PathBuf>,

    /// Specification document to patch.
    #[clap(long, short, env = "OASPATCH_SPEC", default_value = "spec.json")]
    pub input: PathBuf,

    /// Destination. Defaults to the input file.
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Extra `set_scalar_field` operations, run after the plan's.
    /// Format: `"path=value"`; the value is always written as a string.
    /// Example: `"--set info.version=2.0"`
    #[clap(long = "set", value_parser = parse_key_val)]
    pub set: Vec<(String, String)>,

    /// Like `--set`, but the value is parsed as JSON. Run after `--set`.
    /// Example: `"--set-json x-retries=3"`
    #[clap(long = "set-json", value_parser = parse_key_val)]
    pub set_json: Vec<(String, String)>,

    /// Back up the destination before overwriting it.
    #[clap(long)]
    pub backup: bool,

    /// Backup suffix (implies `--backup`). Defaults to a timestamp.
    #[clap(long)]
    pub backup_label: Option<String>,

    /// Replace a labelled backup even if its content differs.
    #[clap(long)]
    pub overwrite_backup: bool,

    /// Create missing intermediate objects for `set` operations.
    #[clap(long)]
    pub create_missing: bool,

    /// Do not end the output file with a newline.
    #[clap(long)]
    pub no_trailing_newline: bool,
}

/// Helper to parse "key=value" arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid PATH=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Parses a `--set-json` value.
fn parse_json_value(path: &str, raw: &str) -> CliResult<Value> {
    serde_json::from_str(raw).map_err(|e| {
        CliError::Usage(format!("--set-json {}: invalid JSON `{}`: {}", path, raw, e))
    })
}

/// Merges the plan file with command line overrides.
pub fn build_plan(args: &ApplyArgs) -> CliResult<PatchPlan> {
    let mut plan = match &args.plan {
        Some(path) => PatchPlan::load(path)?,
        None if args.set.is_empty() && args.set_json.is_empty() => {
            return Err(CliError::Usage(
                "provide --plan or at least one --set/--set-json".to_string(),
            ))
        }
        None => PatchPlan::default(),
    };

    plan.operations
        .extend(args.set.iter().map(|(path, raw)| PatchOperation::SetScalarField {
            path: path.clone(),
            value: Value::String(raw.clone()),
        }));
    for (path, raw) in &args.set_json {
        plan.operations.push(PatchOperation::SetScalarField {
            path: path.clone(),
            value: parse_json_value(path, raw)?,
        });
    }

    if args.create_missing {
        plan.options.create_missing = true;
    }
    if args.backup || args.backup_label.is_some() {
        plan.backup.enabled = true;
    }
    if let Some(label) = &args.backup_label {
        plan.backup.label = Some(label.clone());
    }
    if args.overwrite_backup {
        plan.backup.overwrite = true;
    }
    if args.no_trailing_newline {
        plan.output.trailing_newline = false;
    }

    log::debug!(
        "Plan resolved: {} operations, backup {:?}, options {:?}",
        plan.operations.len(),
        plan.backup,
        plan.options
    );
    Ok(plan)
}

/// Executes the command.
///
/// # Arguments
///
/// * `args` - Command arguments.
/// * `dry_run` - Apply in memory only (`check`).
pub fn execute(args: &ApplyArgs, dry_run: bool) -> CliResult<()> {
    let plan = build_plan(args)?;
    let output = args.output.clone().unwrap_or_else(|| args.input.clone());

    println!(
        "Patching {:?} -> {:?} ({} operations)",
        args.input,
        output,
        plan.operations.len()
    );

    let request = RunRequest {
        input: args.input.clone(),
        output,
        plan,
        dry_run,
    };
    let report = run(&request, |outcome| println!("{}", outcome))?;

    match &report.saved {
        Some(saved) => {
            match &saved.backup {
                Some(BackupOutcome::Written(path)) => println!("Backup saved to {:?}", path),
                Some(BackupOutcome::Reused(path)) => {
                    println!("Backup already present at {:?}", path)
                }
                Some(BackupOutcome::NothingToBackUp) => {
                    println!("No existing file at {:?} to back up", saved.path)
                }
                None => {}
            }
            println!("Wrote {:?} ({} bytes)", saved.path, saved.bytes);
        }
        None => println!(
            "Check passed: {} operations applied in memory, nothing written",
            report.outcomes.len()
        ),
    }

    Ok(())
}
