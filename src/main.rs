//! `nvd-check`: check a project's dependencies for known vulnerabilities.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and start logging ([`logging`]).
//! 2. Load the configuration document ([`document`]).
//! 3. Normalize it into engine settings ([`config::populate_settings`]).
//! 4. Run the command:
//!    - `check`: scan the classpath, analyze, write reports ([`check`]).
//!    - `update`: refresh the local vulnerability store ([`database::update`]).
//!    - `purge`: delete the local store ([`database::purge`]).
//! 5. Exit `0` (clean), `4` (vulnerabilities found) or the error's code ([`error`]).

mod check;
mod cli;
mod config;
mod database;
mod document;
mod engine;
mod error;
mod logging;
mod models;
mod report;
mod settings;
mod transient;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use check::Outcome;
use cli::{Cli, Commands};
use database::PurgeOutcome;
use document::Document;
use error::{NvdError, EXIT_OK};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(&cli.log_level, cli.log_format.as_str()) {
        eprintln!("{} {e:#}", "error:".red().bold());
        return ExitCode::FAILURE;
    }

    let code = match cli.command {
        Commands::Check {
            config,
            keep_config,
            quiet,
        } => report_result(run_check(&config, keep_config, quiet)),
        Commands::Update { config } => report_result(run_update(config.as_deref())),
        Commands::Purge { config } => report_result(run_purge(config.as_deref())),
    };

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn load_optional(path: Option<&Path>) -> Result<Document, NvdError> {
    match path {
        Some(path) => Document::load(path),
        None => Ok(Document::default()),
    }
}

fn run_check(config: &Path, keep_config: bool, quiet: bool) -> Result<i32, NvdError> {
    let outcome = check::check_file(config, keep_config, quiet)?;
    if let Outcome::Vulnerable(count) = outcome {
        debug!(count, "vulnerabilities found");
    }
    Ok(outcome.exit_code())
}

fn run_update(config: Option<&Path>) -> Result<i32, NvdError> {
    let doc = load_optional(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Updating vulnerability database");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = database::update(&doc);
    spinner.finish_and_clear();
    result?;

    println!("{} Vulnerability database updated", "✓".green());
    Ok(EXIT_OK)
}

fn run_purge(config: Option<&Path>) -> Result<i32, NvdError> {
    let doc = load_optional(config)?;
    match database::purge(&doc)? {
        PurgeOutcome::Removed(path) => {
            println!("{} Removed {}", "✓".green(), path.display())
        }
        PurgeOutcome::Absent(path) => {
            println!("{} Nothing to purge at {}", "✓".green(), path.display())
        }
    }
    Ok(EXIT_OK)
}

fn report_result(result: Result<i32, NvdError>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            e.exit_code()
        }
    }
}
