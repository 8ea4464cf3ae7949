//! `quill_conformance`: parse-phase conformance harness.
//!
//! Walks a directory of Test262-style `.js` files, parses each one in the
//! modes its front matter asks for, and checks that files marked
//! `negative: phase: parse` are rejected while every other file parses.
//! Prints pass/fail counts and exits non-zero on any failure.

mod metadata;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser as _;
use quill_core::config::ParserOptions;
use quill_core::parser::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use crate::metadata::{Mode, TestMetadata};

#[derive(Debug, clap::Parser)]
#[command(name = "quill_conformance")]
#[command(about = "Run parse-phase conformance tests against the Quill parser")]
struct Cli {
    /// Directory (or single file) holding the tests.
    root: PathBuf,

    /// Only run files whose path contains this substring.
    #[arg(long)]
    filter: Option<String>,

    /// Print every failing file with the reason.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Summary {
    passed: usize,
    failed: usize,
    skipped: usize,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Every `.js` file under `root`, sorted, skipping Test262 fixtures.
fn discover(root: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "js"))
        .filter(|path| {
            !path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains("_FIXTURE"))
        })
        .filter(|path| filter.is_none_or(|f| path.to_string_lossy().contains(f)))
        .collect();
    files.sort();
    files
}

/// Parse `source` once in `mode`; `Err` carries the first error.
fn parse_in_mode(source: &str, mode: Mode) -> Result<(), String> {
    let mut parser = Parser::new(source, ParserOptions::new());
    let result = match mode {
        Mode::Sloppy => parser.parse_script(false),
        Mode::Strict => parser.parse_script(true),
        Mode::Module => parser.parse_module(),
    };
    result.map(|_| ()).map_err(|e| e.to_string())
}

/// Run one file in all its modes; `Err` names the first mismatch.
fn run_file(path: &Path, source: &str) -> Result<(), String> {
    let meta = TestMetadata::parse(source);
    let expect_error = meta.expects_parse_error();
    for mode in meta.modes() {
        let outcome = parse_in_mode(source, mode);
        debug!(path = %path.display(), ?mode, ok = outcome.is_ok(), "parsed");
        match (outcome, expect_error) {
            (Ok(()), true) => return Err(format!("{mode:?}: expected a parse error")),
            (Err(message), false) => return Err(format!("{mode:?}: {message}")),
            _ => {}
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let files = discover(&cli.root, cli.filter.as_deref());
    info!(root = %cli.root.display(), files = files.len(), "discovered tests");

    let mut summary = Summary::default();
    for path in &files {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                warn!(path = %path.display(), "cannot read: {e}");
                summary.skipped += 1;
                continue;
            }
        };
        match run_file(path, &source) {
            Ok(()) => summary.passed += 1,
            Err(reason) => {
                summary.failed += 1;
                if cli.verbose {
                    println!("FAIL {}: {reason}", path.display());
                }
            }
        }
    }

    let total = summary.passed + summary.failed;
    let rate = if total == 0 {
        100.0
    } else {
        summary.passed as f64 * 100.0 / total as f64
    };
    println!(
        "passed {} / failed {} / skipped {} ({rate:.1}%)",
        summary.passed, summary.failed, summary.skipped
    );
    if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
