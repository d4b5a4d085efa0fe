//! CLI module for the Kestrel frontend
//!
//! This module provides the command-line interface for the compiler.
//!
//! ## Usage
//!
//! - `kestrel <file>` - Check a file: resolve every top-level declaration and fold constants
//! - `kestrel --lex <file>` - Dump tokens with `line:column` positions
//! - `kestrel --parse <file>` - Dump the syntax tree
//!
//! Scheduling flags (`--workers`, `--requeue`, `--max-attempts`) map onto [`JobConfig`].
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::driver::CompileConfig;
use crate::jobs::{DEFAULT_MAX_ATTEMPTS, JobConfig, Suspension};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// Command-line usage problems.
    pub const USAGE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create a usage error (exit code 2).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::USAGE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The Kestrel compiler frontend
#[derive(Parser, Debug)]
#[command(name = "kestrel")]
#[command(version = VERSION)]
#[command(about = "The Kestrel compiler frontend", long_about = None)]
pub struct Cli {
    /// File to check (default action)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    // Debug/development flags
    /// Tokenize only (debug)
    #[arg(long = "lex", value_name = "FILE", conflicts_with_all = ["file", "parse_file"])]
    pub lex_file: Option<PathBuf>,

    /// Parse only (debug)
    #[arg(long = "parse", value_name = "FILE", conflicts_with = "file")]
    pub parse_file: Option<PathBuf>,

    // Scheduling
    /// Worker threads for the job system
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub workers: usize,

    /// Requeue suspended jobs instead of parking them on their dependency
    #[arg(long)]
    pub requeue: bool,

    /// Checker runs allowed per declaration
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Do not print warnings
    #[arg(long)]
    pub no_warnings: bool,
}

impl Cli {
    /// Compilation settings selected by the flags.
    pub fn compile_config(&self) -> CompileConfig {
        let suspension = if self.requeue {
            Suspension::Requeue
        } else {
            Suspension::Park
        };
        let jobs = JobConfig::new()
            .with_workers(self.workers)
            .with_suspension(suspension)
            .with_max_attempts(self.max_attempts);
        CompileConfig::new()
            .with_jobs(jobs)
            .with_report_warnings(!self.no_warnings)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    if let Some(file) = &cli.lex_file {
        return commands::lex_file(&file.to_string_lossy());
    }
    if let Some(file) = &cli.parse_file {
        return commands::parse_file(&file.to_string_lossy());
    }

    match &cli.file {
        Some(file) => commands::check_file(&file.to_string_lossy(), &cli.compile_config()),
        None => Err(CliError::usage("Error: no input file (see --help)")),
    }
}

// ============================================================================
// Tests
// ============================================================================
