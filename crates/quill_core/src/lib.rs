//! `quill_core`: the front end of the Quill scripting dialect.
//!
//! Quill is a JavaScript-family language.  This crate turns source text
//! into a fully positioned abstract syntax tree and stops there; it does
//! not evaluate anything.
//!
//! # Crate layout
//!
//! - [`parser`]: scanner, parser, AST and the regex dialect translator.
//! - [`config`]: [`config::ParserOptions`], the parser configuration.
//! - [`error`]: error types and the [`error::ErrorHandler`] collaborator.

/// Parser configuration.
pub mod config;
/// Error types and error collection.
pub mod error;
/// Scanner, parser, AST and regex translation.
pub mod parser;
