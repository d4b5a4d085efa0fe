//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::io::IsTerminal;

use crate::driver::{self, CompileConfig};
use crate::frontend::diagnostics::{Diagnostic, Diagnostics, format_diagnostic};
use crate::frontend::scanner::{Scanner, TokenKind};
use crate::frontend::symbols::SymbolTable;
use crate::frontend::{parser, scanner};

use super::{CliError, CliResult, ExitCode};

/// Maximum source file size (100 MB)
///
/// Files larger than this are rejected to prevent out-of-memory conditions
/// during compilation.
const MAX_SOURCE_SIZE: u64 = 100 * 1024 * 1024;

/// Read source file contents.
///
/// Sources are raw bytes; decoding problems are reported by the scanner, not here.
///
/// ## Errors
///
/// Returns an error if:
/// - The file cannot be read (I/O error)
/// - The file exceeds `MAX_SOURCE_SIZE` (100 MB)
pub fn read_source(file_path: &str) -> CliResult<Vec<u8>> {
    let metadata =
        fs::metadata(file_path).map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", file_path, e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Source file '{}' is too large ({} bytes, max {} bytes)",
            file_path,
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read(file_path).map_err(|e| CliError::failure(format!("Error reading file '{}': {}", file_path, e)))
}

/// Render diagnostics in report order.
fn render(file_path: &str, source: &[u8], diagnostics: &[Diagnostic]) -> String {
    let color = std::io::stderr().is_terminal();
    diagnostics
        .iter()
        .map(|d| format_diagnostic(file_path, source, d, color))
        .collect()
}

/// Fail with every diagnostic rendered when any of them is an error; otherwise print the warnings.
fn finish(file_path: &str, source: &[u8], sink: Diagnostics) -> CliResult<()> {
    let diagnostics = sink.into_vec();
    let rendered = render(file_path, source, &diagnostics);
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        let summary = format!("{} error{} in {}", errors, if errors == 1 { "" } else { "s" }, file_path);
        return Err(CliError::failure(format!("{}{}", rendered, summary)));
    }
    if !rendered.is_empty() {
        eprint!("{}", rendered);
    }
    Ok(())
}

/// Tokenize a file and print one token per line with its `line:column`.
pub fn lex_file(file_path: &str) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    let sink = Diagnostics::new();
    {
        let mut scanner = Scanner::new(&source, &sink);
        loop {
            let token = scanner.scan();
            let (line, column) = scanner.position(token.pos);
            println!("{}:{}\t{}", line, column, token);
            if token.kind == TokenKind::Eof {
                break;
            }
        }
    }
    finish(file_path, &source, sink)?;
    Ok(ExitCode::SUCCESS)
}

/// Parse a file and print the syntax tree, one top-level item per line.
pub fn parse_file(file_path: &str) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    let sink = Diagnostics::new();
    let symbols = SymbolTable::new();
    let tokens = scanner::scan_all(&source, &sink);
    let program = parser::parse(&source, &tokens, &symbols, &sink);
    print!("{}", program);
    finish(file_path, &source, sink)?;
    Ok(ExitCode::SUCCESS)
}

/// Check a file: resolve and fold every top-level declaration.
pub fn check_file(file_path: &str, config: &CompileConfig) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    let sink = Diagnostics::new();
    let compilation = driver::compile(&source, config, &sink).map_err(|e| CliError::usage(format!("Error: {}", e)))?;
    finish(file_path, &source, sink)?;

    let emitted = compilation.emitted_names();
    println!("✓ Check passed: {} declaration{} emitted", emitted.len(), if emitted.len() == 1 { "" } else { "s" });
    if let Some(entry) = compilation.entry_point() {
        println!("  entry point: {}", compilation.symbols.entity(entry).name);
    }
    Ok(ExitCode::SUCCESS)
}
