//! The [`Parser`] struct: token machinery, error reporting, context scoping
//! and the program-level entry points.
//!
//! The grammar itself is spread over sibling modules, each adding an
//! `impl Parser` block:
//!
//! - `expression`: expressions, object/array literals, templates.
//! - `pattern`: binding patterns.
//! - `function`: parameter lists, functions, arrows, methods.
//! - `class`: class declarations and expressions.
//! - `statement`: statements and the dialect statements.
//! - `module`: `import` / `export`.
//! - `cover`: cover-grammar scoping and pattern reinterpretation.

use tracing::debug;

use crate::config::{NodeCallback, ParserOptions};
use crate::error::{ErrorKind, ParseError, QuillError, QuillResult};
use crate::parser::ast::{
    Expr, Ident, NodeInfo, NodeType, Program, ProgramItem, SourceLocation, SourceType, Stmt,
};
use crate::parser::context::{CoverState, DeferredError, GrammarFlags, LabelSet};
use crate::parser::messages;
use crate::parser::scanner::{Scanner, ScannerOptions};
use crate::parser::token::{
    Comment, Position, Span, Token, TokenKind, TokenValue, is_strict_mode_reserved_word,
};

/// Recursive-descent parser with one token of lookahead.
///
/// # Example
///
/// ```
/// use quill_core::config::ParserOptions;
/// use quill_core::parser::Parser;
///
/// let mut parser = Parser::new("foreach (x in xs) log(x);", ParserOptions::new());
/// let program = parser.parse_script(false).unwrap();
/// assert_eq!(program.body.len(), 1);
/// ```
pub struct Parser<'src> {
    pub(super) source: &'src str,
    pub(super) scanner: Scanner<'src>,
    /// The next, not yet consumed, token.
    pub(super) lookahead: Token,
    /// End of the last consumed token.
    pub(super) last_marker: Position,
    pub(super) flags: GrammarFlags,
    pub(super) cover: CoverState,
    pub(super) labels: LabelSet,
    pub(super) allow_return_outside_function: bool,
    tokens: Option<Vec<Token>>,
    on_node: Option<NodeCallback>,
    max_depth: u32,
    depth: u32,
    started: bool,
}

/// Stack that must remain before another level of recursion is entered.
const STACK_RED_ZONE: usize = 256 * 1024;

/// Size of each stack segment allocated once the red zone is reached.
const STACK_SEGMENT: usize = 4 * 1024 * 1024;

/// Run `f`, moving to a fresh heap-allocated stack segment first when
/// little stack is left.  Every recursive descent goes through here, so
/// nesting is bounded by the depth limit rather than the thread's stack.
pub(crate) fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, f)
}

impl<'src> Parser<'src> {
    /// Create a parser.  No input is read until one of the `parse_*`
    /// entry points is called.
    pub fn new(source: &'src str, mut options: ParserOptions) -> Self {
        let handler = options.take_error_handler();
        let scanner = Scanner::with_handler(
            source,
            ScannerOptions::from_parser_options(&options, false),
            handler,
        );
        let origin = Position {
            offset: 0,
            line: 1 + options.line_offset,
            column: 1,
        };
        Self {
            source,
            scanner,
            lookahead: Token::new(
                TokenKind::Eof,
                TokenValue::None,
                Span {
                    start: origin,
                    end: origin,
                },
            ),
            last_marker: origin,
            flags: GrammarFlags::top_level(false, false),
            cover: CoverState::permissive(),
            labels: LabelSet::default(),
            allow_return_outside_function: options.allow_return_outside_function,
            tokens: options.tokens.then(Vec::new),
            on_node: options.on_node.take(),
            max_depth: options.max_assignment_depth,
            depth: 0,
            started: false,
        }
    }

    // ── Entry points ────────────────────────────────────────────────────────

    /// Parse the whole input as a classic script.  `strict` starts the
    /// script in strict mode, as if it began with `"use strict"`.
    pub fn parse_script(&mut self, strict: bool) -> QuillResult<Program> {
        self.start(GrammarFlags::top_level(strict, false))?;
        let marker = self.create_node();
        let mut body: Vec<ProgramItem> = self
            .parse_directive_prologue()?
            .into_iter()
            .map(ProgramItem::Stmt)
            .collect();
        while !self.matches(TokenKind::Eof) {
            body.push(self.parse_program_item()?);
        }
        let loc = self.finalize(marker, NodeType::Program);
        Ok(Program {
            loc,
            source_type: SourceType::Script,
            strict: self.flags.strict,
            body,
        })
    }

    /// Parse the whole input as a module: strict, with `import`/`export`
    /// and top-level `await`.
    pub fn parse_module(&mut self) -> QuillResult<Program> {
        self.scanner.set_module(true);
        self.start(GrammarFlags::top_level(true, true))?;
        let marker = self.create_node();
        let mut body: Vec<ProgramItem> = self
            .parse_directive_prologue()?
            .into_iter()
            .map(ProgramItem::Stmt)
            .collect();
        while !self.matches(TokenKind::Eof) {
            body.push(self.parse_program_item()?);
        }
        let loc = self.finalize(marker, NodeType::Program);
        Ok(Program {
            loc,
            source_type: SourceType::Module,
            strict: true,
            body,
        })
    }

    /// Parse the whole input as a single expression.
    pub fn parse_expression(&mut self) -> QuillResult<Expr> {
        self.start(GrammarFlags::top_level(false, false))?;
        let expr = self.parse_comma_expression()?;
        if !self.matches(TokenKind::Eof) {
            return Err(self.unexpected(&self.lookahead));
        }
        Ok(expr)
    }

    /// Collected tokens, comments and tolerated errors.  Consumes the
    /// parser.
    pub fn finish(mut self) -> (Vec<Token>, Vec<Comment>, Vec<ParseError>) {
        let comments = self.scanner.take_comments();
        let tokens = self.tokens.take().unwrap_or_default();
        let errors = self.scanner.into_handler().errors().to_vec();
        (tokens, comments, errors)
    }

    fn start(&mut self, flags: GrammarFlags) -> QuillResult<()> {
        if self.started {
            return Err(QuillError::Internal("parser already used".into()));
        }
        self.started = true;
        debug!(strict = flags.strict, module = flags.is_module, "parse started");
        self.flags = flags;
        self.lookahead = self.scanner.next_token()?;
        Ok(())
    }

    // ── Tokens ──────────────────────────────────────────────────────────────

    /// Consume the lookahead and fetch the next token.
    pub(super) fn next_token(&mut self) -> QuillResult<Token> {
        let next = self.scanner.next_token()?;
        let token = std::mem::replace(&mut self.lookahead, next);
        self.last_marker = token.span.end;
        if let Some(tokens) = self.tokens.as_mut() {
            tokens.push(token.clone());
        }
        Ok(token)
    }

    /// The token after the lookahead, without consuming anything.
    pub(super) fn peek_token(&mut self) -> QuillResult<Token> {
        let state = self.scanner.save_state();
        let token = self.scanner.next_token();
        self.scanner.restore_state(state);
        token
    }

    /// Re-lex the `/` or `/=` lookahead as a regular-expression literal.
    pub(super) fn rescan_lookahead_as_regexp(&mut self) -> QuillResult<()> {
        let had_lt = self.lookahead.had_line_terminator_before;
        let mut token = self.scanner.rescan_as_regexp(self.lookahead.span.start)?;
        token.had_line_terminator_before = had_lt;
        self.lookahead = token;
        Ok(())
    }

    pub(super) fn matches(&self, kind: TokenKind) -> bool {
        self.lookahead.kind == kind
    }

    pub(super) fn matches_contextual(&self, word: &str) -> bool {
        self.lookahead.is_contextual(word)
    }

    pub(super) fn has_line_terminator(&self) -> bool {
        self.lookahead.had_line_terminator_before
    }

    pub(super) fn expect(&mut self, kind: TokenKind) -> QuillResult<Token> {
        if self.lookahead.kind != kind {
            return Err(self.unexpected(&self.lookahead));
        }
        self.next_token()
    }

    pub(super) fn expect_contextual(&mut self, word: &str) -> QuillResult<Token> {
        if !self.matches_contextual(word) {
            return Err(self.unexpected(&self.lookahead));
        }
        self.next_token()
    }

    /// Automatic semicolon insertion.  A missing `;` is accepted before a
    /// line break, `}` or the end of input.  The statement's end stays at
    /// the last consumed token.
    pub(super) fn consume_semicolon(&mut self) -> QuillResult<()> {
        if self.matches(TokenKind::Semicolon) {
            self.next_token()?;
        } else if !self.has_line_terminator()
            && !self.matches(TokenKind::Eof)
            && !self.matches(TokenKind::RightBrace)
        {
            let token = self.lookahead.clone();
            self.tolerate_unexpected(&token)?;
        }
        Ok(())
    }

    pub(super) fn is_tolerant(&self) -> bool {
        self.scanner.handler().is_tolerant()
    }

    // ── Nodes ───────────────────────────────────────────────────────────────

    /// Marker at the start of the lookahead.
    pub(super) fn create_node(&self) -> Position {
        self.lookahead.span.start
    }

    /// Close a node opened at `marker`: its location runs to the end of
    /// the last consumed token.  Fires the per-node callback.
    pub(super) fn finalize(&mut self, marker: Position, node_type: NodeType) -> SourceLocation {
        self.finalize_between(marker, self.last_marker, node_type)
    }

    /// Close a node with an explicit end.
    pub(super) fn finalize_between(
        &mut self,
        start: Position,
        end: Position,
        node_type: NodeType,
    ) -> SourceLocation {
        let end = if end.offset < start.offset { start } else { end };
        let loc = Span { start, end };
        if let Some(callback) = self.on_node.as_mut() {
            callback(&NodeInfo { node_type, loc });
        }
        loc
    }

    /// Identifier node spanning exactly the consumed `token`.
    pub(super) fn finalize_ident(&mut self, token: &Token) -> Ident {
        let loc = self.finalize_between(token.span.start, token.span.end, NodeType::Identifier);
        Ident {
            loc,
            name: token.str_value().to_string(),
        }
    }

    /// Bound the recursion of `f` by the configured nesting limit.
    pub(super) fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> QuillResult<T>,
    ) -> QuillResult<T> {
        if self.depth >= self.max_depth {
            return Err(self.error_at(
                self.lookahead.span.start,
                messages::NESTING_TOO_DEEP,
                ErrorKind::Limit,
            ));
        }
        self.depth += 1;
        let result = with_stack(|| f(self));
        self.depth -= 1;
        result
    }

    // ── Context ─────────────────────────────────────────────────────────────

    /// Run `f` with grammar flags adjusted by `update`; the previous flags
    /// are restored afterwards, on success or failure.
    pub(super) fn with_flags<T>(
        &mut self,
        update: impl FnOnce(&mut GrammarFlags),
        f: impl FnOnce(&mut Self) -> QuillResult<T>,
    ) -> QuillResult<T> {
        let saved = self.flags;
        update(&mut self.flags);
        let result = f(self);
        self.flags = saved;
        result
    }

    /// Run `f` with an empty label set.
    pub(super) fn with_fresh_labels<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> QuillResult<T>,
    ) -> QuillResult<T> {
        let saved = std::mem::take(&mut self.labels);
        let result = f(self);
        self.labels = saved;
        result
    }

    // ── Errors ──────────────────────────────────────────────────────────────

    pub(super) fn error_at(&self, pos: Position, message: &str, kind: ErrorKind) -> QuillError {
        self.scanner.error_at(pos, message, kind)
    }

    pub(super) fn tolerate_at(
        &mut self,
        pos: Position,
        message: &str,
        kind: ErrorKind,
    ) -> QuillResult<()> {
        self.scanner.tolerate_at(pos, message, kind)
    }

    /// Tolerate `message` at the end of the last consumed token.
    pub(super) fn tolerate_error(&mut self, message: &str) -> QuillResult<()> {
        self.tolerate_at(self.last_marker, message, ErrorKind::Syntax)
    }

    pub(super) fn tolerate_deferred(
        &mut self,
        deferred: &DeferredError,
        kind: ErrorKind,
    ) -> QuillResult<()> {
        self.tolerate_at(deferred.position, deferred.message, kind)
    }

    /// Strict-mode message for an octal-flagged literal token.
    pub(super) fn strict_octal_message(&self, token: &Token) -> &'static str {
        if token.kind != TokenKind::StringLiteral {
            return messages::STRICT_OCTAL_LITERAL;
        }
        let mut chars = token.raw(self.source).chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('8' | '9') => return messages::STRICT_ESCAPE_89,
                    Some('0'..='7') => return messages::STRICT_OCTAL_LITERAL,
                    _ => {}
                }
            }
        }
        messages::STRICT_OCTAL_LITERAL
    }

    fn unexpected_message(&self, token: &Token) -> String {
        use TokenKind::*;
        match token.kind {
            Eof => messages::UNEXPECTED_EOS.into(),
            Identifier if self.flags.strict && is_strict_mode_reserved_word(token.str_value()) => {
                messages::STRICT_RESERVED_WORD.into()
            }
            Identifier => messages::UNEXPECTED_IDENTIFIER.into(),
            NumericLiteral | BigIntLiteral => messages::UNEXPECTED_NUMBER.into(),
            StringLiteral => messages::UNEXPECTED_STRING.into(),
            NoSubstitutionTemplate | TemplateHead | TemplateMiddle | TemplateTail => {
                messages::unexpected_template(token.raw(self.source))
            }
            Enum => messages::UNEXPECTED_RESERVED.into(),
            Let | Yield if self.flags.strict => messages::STRICT_RESERVED_WORD.into(),
            _ => messages::unexpected_token(token.raw(self.source)),
        }
    }

    /// "Unexpected …" error anchored at `token`.
    pub(super) fn unexpected(&self, token: &Token) -> QuillError {
        let message = self.unexpected_message(token);
        self.error_at(token.span.start, &message, ErrorKind::Syntax)
    }

    pub(super) fn tolerate_unexpected(&mut self, token: &Token) -> QuillResult<()> {
        let message = self.unexpected_message(token);
        self.tolerate_at(token.span.start, &message, ErrorKind::Syntax)
    }

    // ── Program items ───────────────────────────────────────────────────────

    fn parse_program_item(&mut self) -> QuillResult<ProgramItem> {
        let kind = self.lookahead.kind;
        match kind {
            TokenKind::Import if !self.is_import_expression_start()? => {
                if !self.flags.is_module {
                    let token = self.lookahead.clone();
                    self.tolerate_at(
                        token.span.start,
                        messages::IMPORT_OUTSIDE_MODULE,
                        ErrorKind::Syntax,
                    )?;
                }
                Ok(ProgramItem::ModuleDecl(self.parse_import_declaration()?))
            }
            TokenKind::Export => {
                if !self.flags.is_module {
                    let token = self.lookahead.clone();
                    self.tolerate_at(
                        token.span.start,
                        messages::EXPORT_OUTSIDE_MODULE,
                        ErrorKind::Syntax,
                    )?;
                }
                Ok(ProgramItem::ModuleDecl(self.parse_export_declaration()?))
            }
            _ => Ok(ProgramItem::Stmt(self.parse_statement_list_item()?)),
        }
    }

    /// `import(` or `import.` starts an expression, not a declaration.
    pub(super) fn is_import_expression_start(&mut self) -> QuillResult<bool> {
        if !self.matches(TokenKind::Import) {
            return Ok(false);
        }
        let next = self.peek_token()?;
        Ok(matches!(next.kind, TokenKind::LeftParen | TokenKind::Dot))
    }

    /// Directive prologue of a script, module or function body.  Turns on
    /// strict mode at `"use strict"` and reports earlier octal escapes.
    pub(super) fn parse_directive_prologue(&mut self) -> QuillResult<Vec<Stmt>> {
        let mut first_octal: Option<(Position, &'static str)> = None;
        let mut body = Vec::new();
        while self.matches(TokenKind::StringLiteral) {
            let token = self.lookahead.clone();
            let statement = self.parse_directive()?;
            let directive = match &statement {
                Stmt::Expr(expr) => expr.directive.clone(),
                _ => None,
            };
            body.push(statement);
            let Some(directive) = directive else {
                break;
            };
            if directive == "use strict" {
                self.flags.strict = true;
                if let Some((pos, message)) = first_octal {
                    self.tolerate_at(pos, message, ErrorKind::Strict)?;
                }
                if !self.flags.allow_strict_directive {
                    self.tolerate_at(
                        token.span.start,
                        messages::ILLEGAL_LANGUAGE_MODE_DIRECTIVE,
                        ErrorKind::Syntax,
                    )?;
                }
            } else if first_octal.is_none() && token.octal {
                first_octal = Some((token.span.start, self.strict_octal_message(&token)));
            }
        }
        Ok(body)
    }
}
