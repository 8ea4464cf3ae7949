//! Scanner, parser and regular-expression translator for the Quill dialect.
//!
//! - [`scanner`]: pull-based lexer producing [`token::Token`]s, including
//!   template continuation and the `/` regex re-lex.
//! - [`regexp`]: validates regex literals and rewrites them for
//!   `fancy-regex`.
//! - [`ast`]: node definitions.
//! - [`Parser`]: recursive-descent parser with a cover grammar for
//!   parenthesized expressions, arrow parameters and destructuring.
//!
//! The free functions [`parse_script`], [`parse_module`] and
//! [`parse_expression`] run a parser to completion and return the tree
//! together with the collected tokens, comments and tolerated errors.

/// AST node types.
pub mod ast;
mod character;
mod class;
mod context;
mod cover;
mod expression;
mod function;
/// Error message texts.
pub mod messages;
mod module;
mod parse;
mod pattern;
/// Regular-expression validation and translation.
pub mod regexp;
/// The lexer.
pub mod scanner;
mod statement;
/// Tokens, spans and comments.
pub mod token;

#[cfg(test)]
mod tests;

pub use parse::Parser;

use tracing::debug;

use crate::config::ParserOptions;
use crate::error::{ParseError, QuillResult};
use crate::parser::ast::{Expr, Program};
use crate::parser::token::{Comment, Token};

/// The result of a complete parse.
#[derive(Debug)]
pub struct ParseOutput<T> {
    /// The root node.
    pub ast: T,
    /// Every consumed token, when [`ParserOptions::tokens`] is on.
    pub tokens: Vec<Token>,
    /// Every comment, when [`ParserOptions::comments`] is on.
    pub comments: Vec<Comment>,
    /// Errors recorded in tolerant mode.
    pub errors: Vec<ParseError>,
}

impl<T> ParseOutput<T> {
    fn collect(ast: T, parser: Parser<'_>) -> Self {
        let (tokens, comments, errors) = parser.finish();
        debug!(
            tokens = tokens.len(),
            comments = comments.len(),
            errors = errors.len(),
            "parse finished"
        );
        Self {
            ast,
            tokens,
            comments,
            errors,
        }
    }
}

/// Parse `source` as a sloppy-mode script.
///
/// ```
/// use quill_core::config::ParserOptions;
///
/// let out = quill_core::parser::parse_script("a::b->c;", ParserOptions::new()).unwrap();
/// assert_eq!(out.ast.body.len(), 1);
/// assert!(out.errors.is_empty());
/// ```
pub fn parse_script(source: &str, options: ParserOptions) -> QuillResult<ParseOutput<Program>> {
    debug!(len = source.len(), "parsing script");
    let mut parser = Parser::new(source, options);
    let program = parser.parse_script(false)?;
    Ok(ParseOutput::collect(program, parser))
}

/// Parse `source` as a module.
pub fn parse_module(source: &str, options: ParserOptions) -> QuillResult<ParseOutput<Program>> {
    debug!(len = source.len(), "parsing module");
    let mut parser = Parser::new(source, options);
    let program = parser.parse_module()?;
    Ok(ParseOutput::collect(program, parser))
}

/// Parse `source` as a single expression; trailing input is an error.
pub fn parse_expression(source: &str, options: ParserOptions) -> QuillResult<ParseOutput<Expr>> {
    debug!(len = source.len(), "parsing expression");
    let mut parser = Parser::new(source, options);
    let expr = parser.parse_expression()?;
    Ok(ParseOutput::collect(expr, parser))
}
