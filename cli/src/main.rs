#![deny(missing_docs)]

//! # oaspatch CLI
//!
//! Command Line Interface for the OpenAPI document patcher.
//!
//! Supported Commands:
//! - `apply`: Load -> Apply plan -> Backup -> Save.
//! - `check`: Load -> Apply plan, without writing anything.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod apply;
mod error;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI specification patcher")]
struct Cli {
    /// Log verbosity (`-v` info, `-vv` debug). `RUST_LOG` takes precedence.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a patch plan and write the result.
    Apply(apply::ApplyArgs),
    /// Apply a patch plan in memory and report, without writing.
    Check(apply::ApplyArgs),
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Apply(args) => apply::execute(args, false),
        Commands::Check(args) => apply::execute(args, true),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
