//! `quill`: command-line driver for the Quill parser.
//!
//! Parses each file as a script or module and prints a one-line summary,
//! every tolerated or fatal error as `file:line:column: message`, and
//! optionally the token stream.  Exits non-zero when any file has errors.
//!
//! Set `RUST_LOG=quill_core=debug` to see parser events.

use std::path::{Path, PathBuf};

use clap::{Parser as _, ValueEnum};
use quill_core::config::{ParserOptions, RegExpMode};
use quill_core::error::ParseError;
use quill_core::parser::Parser;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Error)]
enum CommandError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("detected errors in {0} file(s)")]
    HasErrors(usize),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RegExpArg {
    /// Check flags only.
    Skip,
    /// Validate patterns without translating them.
    Validate,
    /// Translate and compile patterns for the host engine.
    Adapt,
}

impl From<RegExpArg> for RegExpMode {
    fn from(arg: RegExpArg) -> Self {
        match arg {
            RegExpArg::Skip => RegExpMode::Skip,
            RegExpArg::Validate => RegExpMode::Validate,
            RegExpArg::Adapt => RegExpMode::Adapt,
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(name = "quill")]
#[command(about = "Parse Quill sources and report diagnostics")]
struct Cli {
    /// Source files to parse.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Parse as modules instead of scripts.
    #[arg(long)]
    module: bool,

    /// Start scripts in strict mode.
    #[arg(long, conflicts_with = "module")]
    strict: bool,

    /// Record recoverable errors and keep parsing.
    #[arg(long)]
    tolerant: bool,

    /// Print every token.
    #[arg(long)]
    tokens: bool,

    /// Count comments in the summary.
    #[arg(long)]
    comments: bool,

    /// How regular-expression literals are processed.
    #[arg(long, value_enum, default_value = "adapt")]
    regexp: RegExpArg,

    /// Maximum expression nesting depth.
    #[arg(long)]
    max_depth: Option<u32>,

    /// Accept `return` outside functions.
    #[arg(long)]
    allow_return: bool,
}

impl Cli {
    fn options(&self) -> ParserOptions {
        let mut options = ParserOptions::new()
            .tolerant(self.tolerant)
            .tokens(self.tokens)
            .comments(self.comments)
            .regexp(self.regexp.into())
            .allow_return_outside_function(self.allow_return);
        if let Some(depth) = self.max_depth {
            options = options.max_assignment_depth(depth);
        }
        options
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report(path: &Path, error: &ParseError) {
    eprintln!(
        "{}:{}:{}: {}",
        path.display(),
        error.line,
        error.column,
        error.description
    );
}

/// Parse one file; returns whether it had any error.
fn check_file(cli: &Cli, path: &Path) -> Result<bool, CommandError> {
    let source = std::fs::read_to_string(path).map_err(|source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = source.len(), "read source");

    let mut parser = Parser::new(&source, cli.options());
    let result = if cli.module {
        parser.parse_module()
    } else {
        parser.parse_script(cli.strict)
    };
    let (tokens, comments, errors) = parser.finish();

    if cli.tokens {
        for token in &tokens {
            println!(
                "{}:{}\t{:?}\t{}",
                token.span.start.line,
                token.span.start.column,
                token.kind,
                token.raw(&source)
            );
        }
    }

    for error in &errors {
        report(path, error);
    }
    match result {
        Ok(program) => {
            let mut summary = format!(
                "{}: {} top-level item(s), {} error(s)",
                path.display(),
                program.body.len(),
                errors.len()
            );
            if cli.comments {
                summary.push_str(&format!(", {} comment(s)", comments.len()));
            }
            if program.strict && !cli.module {
                summary.push_str(", strict");
            }
            println!("{summary}");
            Ok(!errors.is_empty())
        }
        Err(e) => {
            match e.as_parse_error() {
                Some(error) => report(path, error),
                None => eprintln!("{}: {e}", path.display()),
            }
            Ok(true)
        }
    }
}

fn main() -> Result<(), CommandError> {
    init_logging();
    let cli = Cli::parse();

    let mut failed = 0;
    for path in &cli.files {
        if check_file(&cli, path)? {
            failed += 1;
        }
    }
    info!(files = cli.files.len(), failed, "done");
    if failed > 0 {
        return Err(CommandError::HasErrors(failed));
    }
    Ok(())
}
