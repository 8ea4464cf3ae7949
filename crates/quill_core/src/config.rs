//! Parser configuration.

use std::fmt;

use crate::error::{ErrorCollector, ErrorHandler};
use crate::parser::ast::NodeInfo;

/// Backtracking budget handed to the host regex engine by default.
pub const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;

/// Default bound on nested assignment-expression recursion.
pub const DEFAULT_MAX_ASSIGNMENT_DEPTH: u32 = 256;

/// How regular-expression literals are processed while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegExpMode {
    /// Only the flags are checked; the pattern is stored verbatim.
    Skip,
    /// The pattern is fully validated but not translated.
    Validate,
    /// The pattern is validated, translated and compiled for the host engine.
    #[default]
    Adapt,
}

/// Callback invoked once for every finalized AST node.
pub type NodeCallback = Box<dyn FnMut(&NodeInfo)>;

/// Options controlling a parse.
///
/// ```
/// use quill_core::config::{ParserOptions, RegExpMode};
///
/// let options = ParserOptions::new()
///     .tolerant(true)
///     .tokens(true)
///     .regexp(RegExpMode::Validate);
/// assert!(options.tolerant);
/// ```
pub struct ParserOptions {
    /// Record tolerable errors and keep parsing instead of aborting.
    pub tolerant: bool,
    /// Collect comments into the parse output.
    pub comments: bool,
    /// Collect every consumed token into the parse output.
    pub tokens: bool,
    /// Regular-expression processing mode.
    pub regexp: RegExpMode,
    /// Backtracking budget for compiled regular expressions.
    pub regex_backtrack_limit: usize,
    /// Maximum nesting of assignment expressions before the parse aborts.
    pub max_assignment_depth: u32,
    /// Accept `return` at the top level of a script.
    pub allow_return_outside_function: bool,
    /// Added to every reported line number, for sources spliced into a
    /// larger virtual file.
    pub line_offset: u32,
    /// Error collaborator; an [`ErrorCollector`] honoring `tolerant` when
    /// unset.
    pub error_handler: Option<Box<dyn ErrorHandler>>,
    /// Per-node callback.
    pub on_node: Option<NodeCallback>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            tolerant: false,
            comments: false,
            tokens: false,
            regexp: RegExpMode::default(),
            regex_backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
            max_assignment_depth: DEFAULT_MAX_ASSIGNMENT_DEPTH,
            allow_return_outside_function: false,
            line_offset: 0,
            error_handler: None,
            on_node: None,
        }
    }
}

impl fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserOptions")
            .field("tolerant", &self.tolerant)
            .field("comments", &self.comments)
            .field("tokens", &self.tokens)
            .field("regexp", &self.regexp)
            .field("regex_backtrack_limit", &self.regex_backtrack_limit)
            .field("max_assignment_depth", &self.max_assignment_depth)
            .field(
                "allow_return_outside_function",
                &self.allow_return_outside_function,
            )
            .field("line_offset", &self.line_offset)
            .field("error_handler", &self.error_handler.is_some())
            .field("on_node", &self.on_node.is_some())
            .finish()
    }
}

impl ParserOptions {
    /// Default options: intolerant, no token or comment collection, regexes
    /// adapted to the host engine.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tolerant(mut self, tolerant: bool) -> Self {
        self.tolerant = tolerant;
        self
    }

    pub fn comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }

    pub fn tokens(mut self, tokens: bool) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn regexp(mut self, mode: RegExpMode) -> Self {
        self.regexp = mode;
        self
    }

    pub fn regex_backtrack_limit(mut self, limit: usize) -> Self {
        self.regex_backtrack_limit = limit;
        self
    }

    pub fn max_assignment_depth(mut self, depth: u32) -> Self {
        self.max_assignment_depth = depth;
        self
    }

    pub fn allow_return_outside_function(mut self, allow: bool) -> Self {
        self.allow_return_outside_function = allow;
        self
    }

    pub fn line_offset(mut self, offset: u32) -> Self {
        self.line_offset = offset;
        self
    }

    /// Install a custom error collaborator.
    pub fn error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// Install a per-node callback.
    pub fn on_node(mut self, callback: impl FnMut(&NodeInfo) + 'static) -> Self {
        self.on_node = Some(Box::new(callback));
        self
    }

    /// Takes the configured error handler, or builds the default one.
    pub(crate) fn take_error_handler(&mut self) -> Box<dyn ErrorHandler> {
        self.error_handler
            .take()
            .unwrap_or_else(|| Box::new(ErrorCollector::new(self.tolerant)))
    }
}
