//! Error types for the Quill parser.
//!
//! Every diagnostic the scanner, parser or regexp translator produces is a
//! positioned [`ParseError`].  Errors are never built directly: they are
//! created through an [`ErrorHandler`], which also decides whether a
//! *tolerable* error aborts the parse or is recorded and skipped.

use thiserror::Error;
use tracing::debug;

/// Broad classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed token: bad escape, unterminated literal, stray character.
    Lexical,
    /// Grammar violation detected while parsing.
    Syntax,
    /// A construct accepted tentatively and invalidated once strict mode
    /// became known (restricted parameter names, octal literals, …).
    Strict,
    /// Structurally invalid regular-expression pattern or flags.
    RegExp,
    /// A valid regular expression the host engine cannot represent.
    Conversion,
    /// A resource bound (nesting depth) was exceeded.
    Limit,
}

/// A positioned diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Line {line}: {description}")]
pub struct ParseError {
    /// Byte offset into the source.
    pub index: usize,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// Human-readable description.
    pub description: String,
    /// Error classification.
    pub kind: ErrorKind,
}

/// All errors that can be produced by the Quill front end.
#[derive(Debug, Error)]
pub enum QuillError {
    /// A fatal parse error.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An internal invariant was broken.  Never produced for any input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QuillError {
    /// Returns the underlying [`ParseError`], if any.
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            QuillError::Parse(e) => Some(e),
            QuillError::Internal(_) => None,
        }
    }
}

/// Convenient `Result` alias for fallible front-end operations.
pub type QuillResult<T> = Result<T, QuillError>;

// ─────────────────────────────────────────────────────────────────────────────
// ErrorHandler
// ─────────────────────────────────────────────────────────────────────────────

/// Creates errors and applies the fatal-versus-tolerant policy.
///
/// The scanner and parser call [`create_error`](Self::create_error) for
/// errors that always abort, and [`tolerate_error`](Self::tolerate_error) /
/// [`tolerate`](Self::tolerate) for errors a tolerant front end may skip.
pub trait ErrorHandler {
    /// Build a positioned error.
    fn create_error(
        &self,
        index: usize,
        line: u32,
        column: u32,
        description: &str,
        kind: ErrorKind,
    ) -> ParseError {
        ParseError {
            index,
            line,
            column,
            description: description.to_string(),
            kind,
        }
    }

    /// Record `error`, or hand it back when this handler does not tolerate
    /// errors.  The caller propagates a returned error as fatal.
    fn tolerate(&mut self, error: ParseError) -> Result<(), ParseError>;

    /// [`create_error`](Self::create_error) followed by
    /// [`tolerate`](Self::tolerate).
    fn tolerate_error(
        &mut self,
        index: usize,
        line: u32,
        column: u32,
        description: &str,
        kind: ErrorKind,
    ) -> Result<(), ParseError> {
        let error = self.create_error(index, line, column, description, kind);
        self.tolerate(error)
    }

    /// Whether tolerable errors are recorded instead of returned.
    fn is_tolerant(&self) -> bool;

    /// Errors recorded so far.
    fn errors(&self) -> &[ParseError];
}

/// The default [`ErrorHandler`]: records tolerated errors in order.
#[derive(Debug, Default, Clone)]
pub struct ErrorCollector {
    tolerant: bool,
    errors: Vec<ParseError>,
}

impl ErrorCollector {
    /// Create a collector.  When `tolerant` is `false` every tolerable error
    /// is returned to the caller instead of being recorded.
    pub fn new(tolerant: bool) -> Self {
        Self {
            tolerant,
            errors: Vec::new(),
        }
    }
}

impl ErrorHandler for ErrorCollector {
    fn tolerate(&mut self, error: ParseError) -> Result<(), ParseError> {
        if !self.tolerant {
            return Err(error);
        }
        debug!(
            line = error.line,
            column = error.column,
            kind = ?error.kind,
            "tolerated: {}",
            error.description
        );
        self.errors.push(error);
        Ok(())
    }

    fn is_tolerant(&self) -> bool {
        self.tolerant
    }

    fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}
