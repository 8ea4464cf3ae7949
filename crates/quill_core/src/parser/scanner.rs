//! Lexer for the Quill dialect.
//!
//! See [`Scanner`] for the main entry point.

use num_bigint::BigInt;
use smallvec::SmallVec;
use tracing::trace;

use super::character::{hex_value, is_id_continue, is_id_start, is_line_terminator, is_whitespace};
use super::messages;
use super::regexp::{self, RegExpFlags};
use super::token::{
    Comment, CommentKind, InvalidEscape, Position, RegExpValue, Span, TemplatePart, Token,
    TokenKind, TokenValue, keyword_kind,
};
use crate::config::{DEFAULT_BACKTRACK_LIMIT, ParserOptions, RegExpMode};
use crate::error::{ErrorCollector, ErrorHandler, ErrorKind, QuillError, QuillResult};

/// Whether `c` may appear in an identifier, at its `first` position or later.
fn is_ident_char(c: char, first: bool) -> bool {
    if first {
        is_id_start(c)
    } else {
        is_id_continue(c)
    }
}

/// Decide whether a `/` begins a regular expression, given the previous
/// significant token.  Only used by [`Scanner::tokenize_all`]; the parser
/// knows from the grammar.
///
/// `/` is *division* only after tokens that produce a value (identifier,
/// literal, `)`, `]`, `}`-closed templates, `++`, `--`, `this`, `super`).
fn slash_is_regexp(last: Option<TokenKind>) -> bool {
    match last {
        None => true,
        Some(k) => !matches!(
            k,
            TokenKind::Identifier
                | TokenKind::PrivateIdentifier
                | TokenKind::NumericLiteral
                | TokenKind::BigIntLiteral
                | TokenKind::StringLiteral
                | TokenKind::NoSubstitutionTemplate
                | TokenKind::TemplateTail
                | TokenKind::RegExpLiteral
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::Super
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Options / state
// ─────────────────────────────────────────────────────────────────────────────

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScannerOptions {
    /// Module code: HTML-like comments are not recognized.
    pub is_module: bool,
    /// Keep skipped comments for [`Scanner::take_comments`].
    pub track_comments: bool,
    /// Regular-expression processing mode.
    pub regexp: RegExpMode,
    /// Backtracking budget for compiled regular expressions.
    pub regex_backtrack_limit: usize,
    /// Added to every line number.
    pub line_offset: u32,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            is_module: false,
            track_comments: false,
            regexp: RegExpMode::default(),
            regex_backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
            line_offset: 0,
        }
    }
}

impl ScannerOptions {
    /// Scanner settings derived from parser options.
    pub fn from_parser_options(options: &ParserOptions, is_module: bool) -> Self {
        Self {
            is_module,
            track_comments: options.comments,
            regexp: options.regexp,
            regex_backtrack_limit: options.regex_backtrack_limit,
            line_offset: options.line_offset,
        }
    }
}

/// A checkpoint for one-token speculation.
#[derive(Debug, Clone)]
pub struct ScannerState {
    pos: usize,
    line: u32,
    column: u32,
    brace_depth: usize,
    template_stack: SmallVec<[usize; 4]>,
    comments_len: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

/// Pull-based lexer.
///
/// Produces a stream of [`Token`]s from a UTF-8 source string.  Call
/// [`Scanner::next_token`] repeatedly until a token with
/// [`TokenKind::Eof`] is returned.  A `/` is always lexed as a punctuator;
/// the parser calls [`Scanner::rescan_as_regexp`] where the grammar expects
/// an expression.
///
/// # Example
///
/// ```
/// use quill_core::parser::scanner::Scanner;
/// use quill_core::parser::token::TokenKind;
///
/// let mut sc = Scanner::new("foreach (x in xs) a::b;");
/// loop {
///     let tok = sc.next_token().unwrap();
///     if tok.kind == TokenKind::Eof { break; }
///     println!("{:?}", tok.kind);
/// }
/// ```
pub struct Scanner<'src> {
    /// The complete source string.
    source: &'src str,
    /// Current byte position within `source`.
    pos: usize,
    /// Current 1-based line number (plus the configured offset).
    line: u32,
    /// Current 1-based column number.
    column: u32,
    /// `brace_depth` values recorded when entering each template
    /// substitution.  A `}` seen while `brace_depth` equals the top of this
    /// stack closes the substitution.
    template_stack: SmallVec<[usize; 4]>,
    /// Nesting depth of plain `{…}` braces.
    brace_depth: usize,
    options: ScannerOptions,
    handler: Box<dyn ErrorHandler>,
    comments: Vec<Comment>,
}

impl<'src> Scanner<'src> {
    /// Create a scanner with default options and an intolerant error
    /// collector.
    pub fn new(source: &'src str) -> Self {
        Self::with_options(source, ScannerOptions::default())
    }

    pub fn with_options(source: &'src str, options: ScannerOptions) -> Self {
        Self::with_handler(source, options, Box::new(ErrorCollector::new(false)))
    }

    pub fn with_handler(
        source: &'src str,
        options: ScannerOptions,
        handler: Box<dyn ErrorHandler>,
    ) -> Self {
        Self {
            source,
            pos: 0,
            line: 1 + options.line_offset,
            column: 1,
            template_stack: SmallVec::new(),
            brace_depth: 0,
            options,
            handler,
            comments: Vec::new(),
        }
    }

    /// The source being scanned.
    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn is_module(&self) -> bool {
        self.options.is_module
    }

    /// Switch module mode; only meaningful before the first token.
    pub(crate) fn set_module(&mut self, is_module: bool) {
        self.options.is_module = is_module;
    }

    pub fn handler(&self) -> &dyn ErrorHandler {
        self.handler.as_ref()
    }

    /// Give up the error collaborator, with everything it recorded.
    pub fn into_handler(self) -> Box<dyn ErrorHandler> {
        self.handler
    }

    /// Comments collected so far (when tracking is on).
    pub fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.comments)
    }

    pub fn current_position(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    // ── Errors ──────────────────────────────────────────────────────────────

    /// A fatal error at `pos`, created by the collaborator.
    pub fn error_at(&self, pos: Position, message: &str, kind: ErrorKind) -> QuillError {
        QuillError::Parse(
            self.handler
                .create_error(pos.offset, pos.line, pos.column, message, kind),
        )
    }

    /// Tolerate an error at `pos`, or return it when the collaborator does
    /// not tolerate errors.
    pub fn tolerate_at(
        &mut self,
        pos: Position,
        message: &str,
        kind: ErrorKind,
    ) -> QuillResult<()> {
        self.handler
            .tolerate_error(pos.offset, pos.line, pos.column, message, kind)
            .map_err(QuillError::from)
    }

    fn illegal(&self) -> QuillError {
        self.error_at(
            self.current_position(),
            messages::UNEXPECTED_TOKEN_ILLEGAL,
            ErrorKind::Lexical,
        )
    }

    // ── Checkpoints ─────────────────────────────────────────────────────────

    pub fn save_state(&self) -> ScannerState {
        ScannerState {
            pos: self.pos,
            line: self.line,
            column: self.column,
            brace_depth: self.brace_depth,
            template_stack: self.template_stack.clone(),
            comments_len: self.comments.len(),
        }
    }

    pub fn restore_state(&mut self, state: ScannerState) {
        self.pos = state.pos;
        self.line = state.line;
        self.column = state.column;
        self.brace_depth = state.brace_depth;
        self.template_stack = state.template_stack;
        self.comments.truncate(state.comments_len);
    }

    // ── Low-level character helpers ─────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut it = self.source[self.pos..].chars();
        it.next();
        it.next()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.source[self.pos..].starts_with(s)
    }

    /// Advance past the current character and update line/column tracking.
    ///
    /// `\r\n` is a single line terminator; the `\n` is consumed with the
    /// `\r` so callers never see it.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        match ch {
            '\r' => {
                if self.source[self.pos..].starts_with('\n') {
                    self.pos += 1;
                }
                self.line += 1;
                self.column = 1;
            }
            '\n' | '\u{2028}' | '\u{2029}' => {
                self.line += 1;
                self.column = 1;
            }
            _ => {
                self.column += 1;
            }
        }
        Some(ch)
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn span_from(&self, start: Position) -> Span {
        Span {
            start,
            end: self.current_position(),
        }
    }

    // ── Whitespace and comments ─────────────────────────────────────────────

    /// Skip whitespace and comments, returning the comments that were
    /// skipped.  Comments are returned even when tracking is off.
    pub fn scan_comments(&mut self) -> QuillResult<Vec<Comment>> {
        let tracked = self.options.track_comments;
        let before = self.comments.len();
        self.options.track_comments = true;
        let result = self.skip_trivia();
        self.options.track_comments = tracked;
        result?;
        let skipped = self.comments.split_off(before);
        if tracked {
            self.comments.extend(skipped.iter().cloned());
        }
        Ok(skipped)
    }

    /// Skip whitespace and comments; returns `true` when a line terminator
    /// was crossed.
    fn skip_trivia(&mut self) -> QuillResult<bool> {
        let mut had_lt = false;
        let at_source_start = self.pos == 0;
        while let Some(c) = self.peek() {
            let at_line_start = at_source_start || had_lt;
            if is_whitespace(c) {
                self.advance();
            } else if is_line_terminator(c) {
                self.advance();
                had_lt = true;
            } else if c == '/' && self.peek2() == Some('/') {
                self.skip_line_comment(2, CommentKind::Line);
            } else if c == '/' && self.peek2() == Some('*') {
                if self.skip_block_comment()? {
                    had_lt = true;
                }
            } else if c == '#' && self.pos == 0 && self.peek2() == Some('!') {
                self.skip_line_comment(2, CommentKind::Hashbang);
            } else if !self.options.is_module && self.starts_with("<!--") {
                self.skip_line_comment(4, CommentKind::HtmlOpen);
            } else if !self.options.is_module && at_line_start && self.starts_with("-->") {
                self.skip_line_comment(3, CommentKind::HtmlClose);
            } else {
                break;
            }
        }
        Ok(had_lt)
    }

    fn skip_line_comment(&mut self, opener: usize, kind: CommentKind) {
        let start = self.current_position();
        self.advance_by(opener);
        let text_start = self.pos;
        while let Some(c) = self.peek() {
            if is_line_terminator(c) {
                break;
            }
            self.advance();
        }
        if self.options.track_comments {
            self.comments.push(Comment {
                kind,
                value: self.source[text_start..self.pos].to_string(),
                span: self.span_from(start),
            });
        }
    }

    /// Returns `true` when the comment spans a line terminator.
    fn skip_block_comment(&mut self) -> QuillResult<bool> {
        let start = self.current_position();
        self.advance_by(2);
        let text_start = self.pos;
        let mut had_lt = false;
        loop {
            match self.peek() {
                None => {
                    return Err(self.error_at(
                        start,
                        messages::UNTERMINATED_COMMENT,
                        ErrorKind::Lexical,
                    ));
                }
                Some('*') if self.peek2() == Some('/') => {
                    let text_end = self.pos;
                    self.advance_by(2);
                    if self.options.track_comments {
                        self.comments.push(Comment {
                            kind: CommentKind::Block,
                            value: self.source[text_start..text_end].to_string(),
                            span: self.span_from(start),
                        });
                    }
                    return Ok(had_lt);
                }
                Some(c) => {
                    if is_line_terminator(c) {
                        had_lt = true;
                    }
                    self.advance();
                }
            }
        }
    }

    // ── Main public API ─────────────────────────────────────────────────────

    /// Skip trivia and lex the next [`Token`].
    ///
    /// Returns a token with [`TokenKind::Eof`] when the input is exhausted.
    pub fn next_token(&mut self) -> QuillResult<Token> {
        let had_lt = self.skip_trivia()?;
        let mut token = self.lex()?;
        token.had_line_terminator_before = had_lt;
        trace!(
            kind = ?token.kind,
            line = token.span.start.line,
            column = token.span.start.column,
            "token"
        );
        Ok(token)
    }

    /// Lex one token at the current position (no trivia skipping).
    pub fn lex(&mut self) -> QuillResult<Token> {
        let start = self.current_position();
        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, TokenValue::None, self.span_from(start)));
        };
        match c {
            '"' | '\'' => self.scan_string(start),
            '`' => {
                self.advance();
                self.scan_template(start, true)
            }
            '0'..='9' => self.scan_numeric(start),
            '.' if matches!(self.peek2(), Some(d) if d.is_ascii_digit()) => {
                self.scan_numeric(start)
            }
            '#' => {
                self.advance();
                if !matches!(self.peek(), Some(n) if is_id_start(n) || n == '\\') {
                    return Err(self.error_at(
                        start,
                        messages::UNEXPECTED_TOKEN_ILLEGAL,
                        ErrorKind::Lexical,
                    ));
                }
                let (name, escaped) = self.scan_identifier_name()?;
                let mut token = Token::new(
                    TokenKind::PrivateIdentifier,
                    TokenValue::Str(name),
                    self.span_from(start),
                );
                token.escaped = escaped;
                Ok(token)
            }
            '}' if self.template_stack.last() == Some(&self.brace_depth) => {
                self.template_stack.pop();
                self.advance();
                self.scan_template(start, false)
            }
            c if is_id_start(c) || c == '\\' => self.scan_identifier(start),
            _ => self.scan_punctuator(start),
        }
    }

    /// Rewind to `start`, the beginning of a `/` or `/=` token, and lex a
    /// regular-expression literal there.
    pub fn rescan_as_regexp(&mut self, start: Position) -> QuillResult<Token> {
        self.pos = start.offset;
        self.line = start.line;
        self.column = start.column;
        self.scan_regexp(start)
    }

    /// Tokenize the entire `source` string and return all tokens (the
    /// [`TokenKind::Eof`] sentinel is **not** included).
    ///
    /// `/` is disambiguated with the previous significant token.
    ///
    /// # Errors
    ///
    /// Returns the first lexical error encountered.
    pub fn tokenize_all(source: &'src str) -> QuillResult<Vec<Token>> {
        let mut scanner = Scanner::new(source);
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            let mut token = scanner.next_token()?;
            if matches!(token.kind, TokenKind::Slash | TokenKind::SlashEqual)
                && slash_is_regexp(tokens.last().map(|t| t.kind))
            {
                let had_lt = token.had_line_terminator_before;
                token = scanner.rescan_as_regexp(token.span.start)?;
                token.had_line_terminator_before = had_lt;
            }
            if token.kind == TokenKind::Eof {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    // ── Identifier / keyword ────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: Position) -> QuillResult<Token> {
        let (name, escaped) = self.scan_identifier_name()?;
        let kind = keyword_kind(&name).unwrap_or(TokenKind::Identifier);
        let mut token = Token::new(kind, TokenValue::Str(name), self.span_from(start));
        token.escaped = escaped;
        if escaped && kind != TokenKind::Identifier {
            self.tolerate_at(
                start,
                messages::INVALID_ESCAPED_RESERVED_WORD,
                ErrorKind::Lexical,
            )?;
        }
        Ok(token)
    }

    /// Scan an *IdentifierName*, decoding `\u` escapes.  Returns the name and
    /// whether any escape was used.
    fn scan_identifier_name(&mut self) -> QuillResult<(String, bool)> {
        let mut name = String::new();
        let mut escaped = false;
        loop {
            match self.peek() {
                Some('\\') => {
                    let escape_start = self.current_position();
                    self.advance();
                    let decoded = if self.peek() == Some('u') {
                        self.advance();
                        self.scan_unicode_escape_value().and_then(char::from_u32)
                    } else {
                        None
                    };
                    let valid = decoded.filter(|&ch| is_ident_char(ch, name.is_empty()));
                    let Some(ch) = valid else {
                        return Err(self.error_at(
                            escape_start,
                            messages::INVALID_UNICODE_ESCAPE,
                            ErrorKind::Lexical,
                        ));
                    };
                    name.push(ch);
                    escaped = true;
                }
                Some(c) if is_ident_char(c, name.is_empty()) => {
                    self.advance();
                    name.push(c);
                }
                _ => break,
            }
        }
        Ok((name, escaped))
    }

    // ── Escape helpers ──────────────────────────────────────────────────────

    /// Exactly `n` hex digits.
    fn scan_hex_digits(&mut self, n: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..n {
            let d = self.peek().and_then(hex_value)?;
            self.advance();
            value = value * 16 + d;
        }
        Some(value)
    }

    /// After `\u`: `XXXX` or `{X…}` (at most 10FFFF).
    fn scan_unicode_escape_value(&mut self) -> Option<u32> {
        if self.peek() != Some('{') {
            return self.scan_hex_digits(4);
        }
        self.advance();
        let mut value = 0u32;
        let mut digits = 0;
        while let Some(d) = self.peek().and_then(hex_value) {
            self.advance();
            value = value.saturating_mul(16).saturating_add(d);
            digits += 1;
        }
        if digits == 0 || self.peek() != Some('}') || value > 0x10FFFF {
            return None;
        }
        self.advance();
        Some(value)
    }

    /// A `\u` escape in a string or template, joining surrogate pairs.  A
    /// lone surrogate decodes to U+FFFD.
    fn scan_unicode_escape_cooked(&mut self) -> Option<char> {
        let value = self.scan_unicode_escape_value()?;
        if (0xD800..0xDC00).contains(&value)
            && let Some(low) = self.trailing_low_surrogate()
        {
            self.advance_by(6);
            let combined = 0x10000 + ((value - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(combined);
        }
        Some(char::from_u32(value).unwrap_or('\u{FFFD}'))
    }

    /// A `\uXXXX` low surrogate starting at the current position.
    fn trailing_low_surrogate(&self) -> Option<u32> {
        let rest = &self.source[self.pos..];
        let digits = rest.strip_prefix("\\u")?.get(..4)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let low = u32::from_str_radix(digits, 16).ok()?;
        (0xDC00..0xE000).contains(&low).then_some(low)
    }

    /// Legacy octal escape value; the first digit has been consumed.
    fn scan_legacy_octal(&mut self, first: char) -> char {
        let mut value = first as u32 - '0' as u32;
        let max_more = if first <= '3' { 2 } else { 1 };
        for _ in 0..max_more {
            match self.peek() {
                Some(d @ '0'..='7') => {
                    self.advance();
                    value = value * 8 + (d as u32 - '0' as u32);
                }
                _ => break,
            }
        }
        char::from_u32(value).unwrap_or('\u{FFFD}')
    }

    // ── String literal ──────────────────────────────────────────────────────

    fn scan_string(&mut self, start: Position) -> QuillResult<Token> {
        let Some(quote) = self.advance() else {
            return Err(self.illegal());
        };
        let mut cooked = String::new();
        let mut octal = false;
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => return Err(self.illegal()),
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    let escape_start = self.current_position();
                    self.advance();
                    let Some(e) = self.advance() else {
                        return Err(self.illegal());
                    };
                    match e {
                        // Line continuation.
                        c if is_line_terminator(c) => {}
                        'n' => cooked.push('\n'),
                        'r' => cooked.push('\r'),
                        't' => cooked.push('\t'),
                        'b' => cooked.push('\u{8}'),
                        'f' => cooked.push('\u{C}'),
                        'v' => cooked.push('\u{B}'),
                        'x' => {
                            let value = self.scan_hex_digits(2).and_then(char::from_u32);
                            let Some(ch) = value else {
                                return Err(self.error_at(
                                    escape_start,
                                    messages::INVALID_HEX_ESCAPE,
                                    ErrorKind::Lexical,
                                ));
                            };
                            cooked.push(ch);
                        }
                        'u' => {
                            let Some(ch) = self.scan_unicode_escape_cooked() else {
                                return Err(self.error_at(
                                    escape_start,
                                    messages::INVALID_UNICODE_ESCAPE,
                                    ErrorKind::Lexical,
                                ));
                            };
                            cooked.push(ch);
                        }
                        '0' if !matches!(self.peek(), Some('0'..='9')) => cooked.push('\0'),
                        '0' if matches!(self.peek(), Some('8' | '9')) => {
                            octal = true;
                            cooked.push('\0');
                        }
                        '0'..='7' => {
                            octal = true;
                            let ch = self.scan_legacy_octal(e);
                            cooked.push(ch);
                        }
                        '8' | '9' => {
                            octal = true;
                            cooked.push(e);
                        }
                        c => cooked.push(c),
                    }
                }
                Some(c) => {
                    self.advance();
                    cooked.push(c);
                }
            }
        }
        let mut token = Token::new(
            TokenKind::StringLiteral,
            TokenValue::Str(cooked),
            self.span_from(start),
        );
        token.octal = octal;
        Ok(token)
    }

    // ── Template literal ────────────────────────────────────────────────────

    /// Scan a template segment after the opening `` ` `` (`head`) or after
    /// the `}` closing a substitution.
    fn scan_template(&mut self, start: Position, head: bool) -> QuillResult<Token> {
        let mut raw = String::new();
        let mut cooked = Some(String::new());
        let mut invalid: Option<InvalidEscape> = None;
        let tail = loop {
            let Some(c) = self.peek() else {
                return Err(self.illegal());
            };
            match c {
                '`' => {
                    self.advance();
                    break true;
                }
                '$' if self.peek2() == Some('{') => {
                    self.advance_by(2);
                    self.template_stack.push(self.brace_depth);
                    break false;
                }
                '\\' => {
                    let escape_start = self.current_position();
                    self.advance();
                    let text_start = self.pos;
                    let Some(e) = self.advance() else {
                        return Err(self.illegal());
                    };
                    raw.push('\\');
                    if is_line_terminator(e) {
                        raw.push(if e == '\r' { '\n' } else { e });
                        continue;
                    }
                    let decoded: Result<char, &'static str> = match e {
                        'n' => Ok('\n'),
                        'r' => Ok('\r'),
                        't' => Ok('\t'),
                        'b' => Ok('\u{8}'),
                        'f' => Ok('\u{C}'),
                        'v' => Ok('\u{B}'),
                        'x' => self
                            .scan_hex_digits(2)
                            .and_then(char::from_u32)
                            .ok_or(messages::INVALID_HEX_ESCAPE),
                        'u' => self
                            .scan_unicode_escape_cooked()
                            .ok_or(messages::INVALID_UNICODE_ESCAPE),
                        '0' if !matches!(self.peek(), Some('0'..='9')) => Ok('\0'),
                        '0'..='7' => Err(messages::TEMPLATE_OCTAL_LITERAL),
                        '8' | '9' => Err(messages::TEMPLATE_ESCAPE_89),
                        c => Ok(c),
                    };
                    raw.push_str(&self.source[text_start..self.pos]);
                    match decoded {
                        Ok(ch) => {
                            if let Some(text) = cooked.as_mut() {
                                text.push(ch);
                            }
                        }
                        Err(message) => {
                            cooked = None;
                            invalid.get_or_insert(InvalidEscape {
                                position: escape_start,
                                message,
                            });
                        }
                    }
                }
                _ => {
                    self.advance();
                    let ch = if c == '\r' { '\n' } else { c };
                    raw.push(ch);
                    if let Some(text) = cooked.as_mut() {
                        text.push(ch);
                    }
                }
            }
        };
        let kind = match (head, tail) {
            (true, true) => TokenKind::NoSubstitutionTemplate,
            (true, false) => TokenKind::TemplateHead,
            (false, false) => TokenKind::TemplateMiddle,
            (false, true) => TokenKind::TemplateTail,
        };
        let part = TemplatePart {
            raw,
            cooked,
            invalid_escape: invalid,
        };
        Ok(Token::new(
            kind,
            TokenValue::Template(Box::new(part)),
            self.span_from(start),
        ))
    }

    // ── Regular-expression literal ──────────────────────────────────────────

    fn scan_regexp(&mut self, start: Position) -> QuillResult<Token> {
        let unterminated = |sc: &Self| {
            sc.error_at(
                sc.current_position(),
                messages::UNTERMINATED_REGEXP,
                ErrorKind::Lexical,
            )
        };
        self.advance(); // opening /
        let body_start = self.pos;
        let mut in_class = false;
        loop {
            match self.peek() {
                None => return Err(unterminated(self)),
                Some(c) if is_line_terminator(c) => return Err(unterminated(self)),
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        None => return Err(unterminated(self)),
                        Some(c) if is_line_terminator(c) => return Err(unterminated(self)),
                        Some(_) => {
                            self.advance();
                        }
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => break,
                Some(_) => {
                    self.advance();
                }
            }
        }
        let pattern = self.source[body_start..self.pos].to_string();
        self.advance(); // closing /

        let flags_start = self.pos;
        while matches!(self.peek(), Some(c) if is_id_continue(c)) {
            self.advance();
        }
        if self.peek() == Some('\\') {
            return Err(self.error_at(
                self.current_position(),
                messages::INVALID_REGEXP_FLAGS,
                ErrorKind::RegExp,
            ));
        }
        let flags = self.source[flags_start..self.pos].to_string();
        let parsed = RegExpFlags::parse(&flags).map_err(|_| {
            self.error_at(start, messages::INVALID_REGEXP_FLAGS, ErrorKind::RegExp)
        })?;

        let translation = regexp::process(
            &pattern,
            &parsed,
            self.options.regexp,
            self.options.regex_backtrack_limit,
        )
        .map_err(|e| {
            self.error_at(
                start,
                &messages::invalid_regexp(&pattern, &flags, e.message),
                ErrorKind::RegExp,
            )
        })?;
        if let Some(reason) = &translation.conversion_error
            && self.handler.is_tolerant()
        {
            let message = messages::regexp_not_convertible(&pattern, &flags, reason);
            self.tolerate_at(start, &message, ErrorKind::Conversion)?;
        }

        let value = RegExpValue {
            pattern,
            flags,
            adapted: translation.adapted,
            regex: translation.regex,
            conversion_error: translation.conversion_error,
        };
        Ok(Token::new(
            TokenKind::RegExpLiteral,
            TokenValue::RegExp(Box::new(value)),
            self.span_from(start),
        ))
    }

    // ── Numeric literal ─────────────────────────────────────────────────────

    fn scan_numeric(&mut self, start: Position) -> QuillResult<Token> {
        if self.peek() == Some('0') {
            match self.peek2() {
                Some('x' | 'X') => return self.scan_radix_literal(start, 16),
                Some('o' | 'O') => return self.scan_radix_literal(start, 8),
                Some('b' | 'B') => return self.scan_radix_literal(start, 2),
                Some('_') => {
                    self.advance();
                    return Err(self.error_at(
                        self.current_position(),
                        messages::NUMERIC_SEPARATOR_NOT_ALLOWED,
                        ErrorKind::Lexical,
                    ));
                }
                Some(d) if d.is_ascii_digit() => {
                    if self.is_implicit_octal() {
                        return self.scan_legacy_octal_literal(start);
                    }
                    let mut token = self.scan_decimal_literal(start, true)?;
                    token.octal = true;
                    return Ok(token);
                }
                _ => {}
            }
        }
        self.scan_decimal_literal(start, false)
    }

    /// `0` followed by a digit run with no `8`/`9`.
    fn is_implicit_octal(&self) -> bool {
        self.source[self.pos + 1..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .all(|c| matches!(c, '0'..='7'))
    }

    fn scan_legacy_octal_literal(&mut self, start: Position) -> QuillResult<Token> {
        let mut value = 0f64;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(8)) {
            self.advance();
            value = value * 8.0 + f64::from(d);
        }
        if self.peek() == Some('_') {
            return Err(self.error_at(
                self.current_position(),
                messages::NUMERIC_SEPARATOR_NOT_ALLOWED,
                ErrorKind::Lexical,
            ));
        }
        self.check_after_number()?;
        let mut token = Token::new(
            TokenKind::NumericLiteral,
            TokenValue::Number(value),
            self.span_from(start),
        );
        token.octal = true;
        Ok(token)
    }

    /// Consume a digit run in `radix` into `digits`, enforcing separator
    /// placement.
    fn scan_digits_into(
        &mut self,
        digits: &mut String,
        radix: u32,
        allow_separators: bool,
    ) -> QuillResult<()> {
        let mut any = false;
        let mut last_separator = false;
        loop {
            match self.peek() {
                Some('_') => {
                    if !allow_separators || !any || last_separator {
                        return Err(self.error_at(
                            self.current_position(),
                            messages::NUMERIC_SEPARATOR_NOT_ALLOWED,
                            ErrorKind::Lexical,
                        ));
                    }
                    self.advance();
                    last_separator = true;
                }
                Some(c) if c.is_digit(radix) => {
                    self.advance();
                    digits.push(c);
                    any = true;
                    last_separator = false;
                }
                _ => break,
            }
        }
        if last_separator {
            return Err(self.error_at(
                self.current_position(),
                messages::NUMERIC_SEPARATOR_NOT_ALLOWED,
                ErrorKind::Lexical,
            ));
        }
        Ok(())
    }

    fn scan_radix_literal(&mut self, start: Position, radix: u32) -> QuillResult<Token> {
        self.advance_by(2);
        let mut digits = String::new();
        self.scan_digits_into(&mut digits, radix, true)?;
        if digits.is_empty() {
            return Err(self.illegal());
        }
        if self.peek() == Some('n') {
            self.advance();
            self.check_after_number()?;
            let value = BigInt::parse_bytes(digits.as_bytes(), radix)
                .ok_or_else(|| self.illegal())?;
            return Ok(Token::new(
                TokenKind::BigIntLiteral,
                TokenValue::BigInt(value),
                self.span_from(start),
            ));
        }
        self.check_after_number()?;
        Ok(Token::new(
            TokenKind::NumericLiteral,
            TokenValue::Number(parse_radix_digits(&digits, radix)),
            self.span_from(start),
        ))
    }

    /// Decimal literal.  `leading_zero` marks a `0`-prefixed non-octal
    /// literal (`019`), which takes no separators and no BigInt suffix.
    fn scan_decimal_literal(&mut self, start: Position, leading_zero: bool) -> QuillResult<Token> {
        let mut text = String::new();
        let mut integer = true;
        if self.peek() != Some('.') {
            self.scan_digits_into(&mut text, 10, !leading_zero)?;
        }
        if self.peek() == Some('.') {
            self.advance();
            integer = false;
            text.push('.');
            self.scan_digits_into(&mut text, 10, true)?;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            integer = false;
            text.push('e');
            if let Some(sign @ ('+' | '-')) = self.peek() {
                self.advance();
                text.push(sign);
            }
            let before = text.len();
            self.scan_digits_into(&mut text, 10, true)?;
            if text.len() == before {
                return Err(self.illegal());
            }
        }
        if integer && !leading_zero && self.peek() == Some('n') {
            self.advance();
            self.check_after_number()?;
            let value = BigInt::parse_bytes(text.as_bytes(), 10).ok_or_else(|| self.illegal())?;
            return Ok(Token::new(
                TokenKind::BigIntLiteral,
                TokenValue::BigInt(value),
                self.span_from(start),
            ));
        }
        self.check_after_number()?;
        let value = text.parse::<f64>().map_err(|_| self.illegal())?;
        Ok(Token::new(
            TokenKind::NumericLiteral,
            TokenValue::Number(value),
            self.span_from(start),
        ))
    }

    /// No identifier start or digit may directly follow a numeric literal.
    fn check_after_number(&self) -> QuillResult<()> {
        match self.peek() {
            Some(c) if is_id_start(c) || c.is_ascii_digit() || c == '\\' => Err(self.illegal()),
            _ => Ok(()),
        }
    }

    // ── Punctuators ─────────────────────────────────────────────────────────

    fn scan_punctuator(&mut self, start: Position) -> QuillResult<Token> {
        let Some((kind, len)) = match_punctuator(&self.source[self.pos..]) else {
            return Err(self.illegal());
        };
        self.advance_by(len);
        match kind {
            TokenKind::LeftBrace => self.brace_depth += 1,
            TokenKind::RightBrace => self.brace_depth = self.brace_depth.saturating_sub(1),
            _ => {}
        }
        Ok(Token::new(kind, TokenValue::None, self.span_from(start)))
    }
}

/// Longest punctuator at the start of `rest`, with its length in chars.
fn match_punctuator(rest: &str) -> Option<(TokenKind, usize)> {
    use TokenKind::*;
    const LONG: &[(&str, TokenKind)] = &[
        (">>>=", GreaterGreaterGreaterEqual),
        ("===", EqualEqualEqual),
        ("!==", BangEqualEqual),
        ("**=", StarStarEqual),
        ("<<=", LessLessEqual),
        (">>=", GreaterGreaterEqual),
        (">>>", GreaterGreaterGreater),
        ("...", DotDotDot),
        ("&&=", AmpersandAmpersandEqual),
        ("||=", PipePipeEqual),
        ("??=", QuestionQuestionEqual),
        ("=>", Arrow),
        ("==", EqualEqual),
        ("!=", BangEqual),
        ("<=", LessEqual),
        (">=", GreaterEqual),
        ("&&", AmpersandAmpersand),
        ("||", PipePipe),
        ("??", QuestionQuestion),
        ("++", PlusPlus),
        ("--", MinusMinus),
        ("+=", PlusEqual),
        ("-=", MinusEqual),
        ("*=", StarEqual),
        ("/=", SlashEqual),
        ("%=", PercentEqual),
        ("&=", AmpersandEqual),
        ("|=", PipeEqual),
        ("^=", CaretEqual),
        ("<<", LessLess),
        (">>", GreaterGreater),
        ("**", StarStar),
        ("::", ColonColon),
        ("->", ThinArrow),
    ];
    for &(text, kind) in LONG {
        if rest.starts_with(text) {
            return Some((kind, text.len()));
        }
    }
    // `?.` but not `?.5`, which is `?` followed by `.5`.
    if rest.starts_with("?.") && !rest[2..].starts_with(|c: char| c.is_ascii_digit()) {
        return Some((QuestionDot, 2));
    }
    let kind = match rest.chars().next()? {
        '{' => LeftBrace,
        '}' => RightBrace,
        '(' => LeftParen,
        ')' => RightParen,
        '[' => LeftBracket,
        ']' => RightBracket,
        '.' => Dot,
        ';' => Semicolon,
        ',' => Comma,
        '<' => Less,
        '>' => Greater,
        '+' => Plus,
        '-' => Minus,
        '*' => Star,
        '/' => Slash,
        '%' => Percent,
        '&' => Ampersand,
        '|' => Pipe,
        '^' => Caret,
        '!' => Bang,
        '~' => Tilde,
        '?' => Question,
        ':' => Colon,
        '=' => Equal,
        '@' => At,
        _ => return None,
    };
    Some((kind, 1))
}

// ─────────────────────────────────────────────────────────────────────────────
// Numeric parsing helper
// ─────────────────────────────────────────────────────────────────────────────

/// Value of a separator-free digit run in `radix`.  Runs too long for a
/// `u64` fold into the nearest `f64`, overflowing to infinity.
fn parse_radix_digits(digits: &str, radix: u32) -> f64 {
    if let Ok(n) = u64::from_str_radix(digits, radix) {
        return n as f64;
    }
    digits.chars().fold(0.0, |acc, c| {
        acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Tokenise `src` and return the token kinds.
    fn kinds(src: &str) -> Vec<TokenKind> {
        Scanner::tokenize_all(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn tokens(src: &str) -> Vec<Token> {
        Scanner::tokenize_all(src).unwrap()
    }

    fn number(src: &str) -> f64 {
        match &tokens(src)[0].value {
            TokenValue::Number(n) => *n,
            other => panic!("not a number: {other:?}"),
        }
    }

    fn cooked(token: &Token) -> Option<&str> {
        match &token.value {
            TokenValue::Template(part) => part.cooked.as_deref(),
            _ => None,
        }
    }

    fn error_message(src: &str) -> String {
        match Scanner::tokenize_all(src) {
            Err(QuillError::Parse(e)) => e.description,
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    // ── Keywords ─────────────────────────────────────────────────────────────

    #[test]
    fn test_keywords_reserved() {
        let toks = kinds("break foreach let yield class enum true null");
        assert_eq!(
            toks,
            vec![
                TokenKind::Break,
                TokenKind::Foreach,
                TokenKind::Let,
                TokenKind::Yield,
                TokenKind::Class,
                TokenKind::Enum,
                TokenKind::True,
                TokenKind::Null,
            ]
        );
    }

    #[test]
    fn test_keywords_contextual_are_identifiers() {
        let toks = tokens("async await of get set static as from include require source");
        assert!(toks.iter().all(|t| t.kind == TokenKind::Identifier));
        assert!(toks[0].is_contextual("async"));
    }

    // ── Identifiers ──────────────────────────────────────────────────────────

    #[test]
    fn test_identifier_unicode() {
        let toks = tokens("café λ $_ _x9");
        assert_eq!(toks.len(), 4);
        assert_eq!(toks[0].str_value(), "café");
    }

    #[test]
    fn test_identifier_escapes_decoded() {
        let toks = tokens(r"\u0061b a\u{62}");
        assert_eq!(toks[0].str_value(), "ab");
        assert!(toks[0].escaped);
        assert_eq!(toks[1].str_value(), "ab");
        assert!(!toks[0].is_contextual("ab"));
    }

    #[test]
    fn test_identifier_invalid_escape() {
        assert_eq!(error_message(r"\u0031x"), messages::INVALID_UNICODE_ESCAPE);
        assert_eq!(error_message(r"a\x41"), messages::INVALID_UNICODE_ESCAPE);
    }

    #[test]
    fn test_escaped_keyword_tolerated() {
        let mut sc = Scanner::with_handler(
            r"\u0069f",
            ScannerOptions::default(),
            Box::new(ErrorCollector::new(true)),
        );
        let tok = sc.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::If);
        assert!(tok.escaped);
        assert_eq!(
            sc.handler().errors()[0].description,
            messages::INVALID_ESCAPED_RESERVED_WORD
        );
        assert_eq!(
            error_message(r"\u{69}f"),
            messages::INVALID_ESCAPED_RESERVED_WORD
        );
    }

    #[test]
    fn test_private_identifier() {
        let toks = tokens("#secret");
        assert_eq!(toks[0].kind, TokenKind::PrivateIdentifier);
        assert_eq!(toks[0].str_value(), "secret");
        assert!(Scanner::tokenize_all("# x").is_err());
    }

    // ── Numeric literals ─────────────────────────────────────────────────────

    #[test]
    fn test_numeric_decimal() {
        assert_eq!(number("42"), 42.0);
        assert_eq!(number("3.25"), 3.25);
        assert_eq!(number(".5"), 0.5);
        assert_eq!(number("1e3"), 1000.0);
        assert_eq!(number("2.5E-1"), 0.25);
        assert_eq!(number("1_000"), 1000.0);
    }

    #[test]
    fn test_numeric_radix() {
        assert_eq!(number("0x1F"), 31.0);
        assert_eq!(number("0b101"), 5.0);
        assert_eq!(number("0o17"), 15.0);
        assert_eq!(number("0xFF_FF"), 65535.0);
    }

    #[test]
    fn test_numeric_legacy_octal() {
        let toks = tokens("017 019 0");
        assert_eq!(toks[0].value, TokenValue::Number(15.0));
        assert!(toks[0].octal);
        assert_eq!(toks[1].value, TokenValue::Number(19.0));
        assert!(toks[1].octal);
        assert!(!toks[2].octal);
    }

    #[test]
    fn test_numeric_bigint() {
        let toks = tokens("10n 0x1fn 0b11n");
        assert!(toks.iter().all(|t| t.kind == TokenKind::BigIntLiteral));
        assert_eq!(toks[0].value, TokenValue::BigInt(BigInt::from(10)));
        assert_eq!(toks[1].value, TokenValue::BigInt(BigInt::from(31)));
        assert!(Scanner::tokenize_all("1.5n").is_err());
        assert!(Scanner::tokenize_all("017n").is_err());
    }

    #[test]
    fn test_numeric_overflow_is_infinite() {
        let big = "9".repeat(400);
        assert_eq!(number(&big), f64::INFINITY);
        assert_eq!(number("1e400"), f64::INFINITY);
        assert_eq!(number(&format!("0x{}", "f".repeat(300))), f64::INFINITY);
    }

    #[test]
    fn test_numeric_separator_placement() {
        for bad in ["1__0", "1_", "0_1", "1._5", "0x_1", "1e_1", "017_1"] {
            assert_eq!(
                error_message(bad),
                messages::NUMERIC_SEPARATOR_NOT_ALLOWED,
                "{bad}"
            );
        }
    }

    #[test]
    fn test_identifier_directly_after_number() {
        assert_eq!(error_message("3in x"), messages::UNEXPECTED_TOKEN_ILLEGAL);
        assert_eq!(error_message("0x"), messages::UNEXPECTED_TOKEN_ILLEGAL);
    }

    // ── String literals ───────────────────────────────────────────────────────

    #[test]
    fn test_string_cooked_values() {
        let toks = tokens(r#""a\n\t\\\"" '\x41B\u{43}' 'it\'s'"#);
        assert_eq!(toks[0].str_value(), "a\n\t\\\"");
        assert_eq!(toks[1].str_value(), "ABC");
        assert_eq!(toks[2].str_value(), "it's");
    }

    #[test]
    fn test_string_octal_escapes_flagged() {
        let toks = tokens(r"'\101' '\0' '\8' '\08'");
        assert_eq!(toks[0].str_value(), "A");
        assert!(toks[0].octal);
        assert_eq!(toks[1].str_value(), "\0");
        assert!(!toks[1].octal);
        assert!(toks[2].octal);
        assert!(toks[3].octal);
    }

    #[test]
    fn test_string_surrogates() {
        let toks = tokens(r"'\uD83D\uDE00' '\uD800'");
        assert_eq!(toks[0].str_value(), "😀");
        assert_eq!(toks[1].str_value(), "\u{FFFD}");
    }

    #[test]
    fn test_string_line_continuation_and_separators() {
        let toks = tokens("'a\\\nb' 'x\u{2028}y'");
        assert_eq!(toks[0].str_value(), "ab");
        assert_eq!(toks[1].str_value(), "x\u{2028}y");
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(error_message("\"open"), messages::UNEXPECTED_TOKEN_ILLEGAL);
        assert_eq!(error_message("'a\nb'"), messages::UNEXPECTED_TOKEN_ILLEGAL);
        assert_eq!(error_message(r"'\x4'"), messages::INVALID_HEX_ESCAPE);
        assert_eq!(error_message(r"'\u{110000}'"), messages::INVALID_UNICODE_ESCAPE);
    }

    // ── Template literals ─────────────────────────────────────────────────────

    #[test]
    fn test_template_with_substitutions() {
        let toks = tokens("`${a} and ${b}`");
        assert_eq!(
            toks.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::TemplateHead,
                TokenKind::Identifier,
                TokenKind::TemplateMiddle,
                TokenKind::Identifier,
                TokenKind::TemplateTail,
            ]
        );
        assert_eq!(cooked(&toks[2]), Some(" and "));
    }

    #[test]
    fn test_template_nested_and_braces() {
        let toks = kinds("`a ${ {k: `in${1}`} } b`");
        assert_eq!(
            toks,
            vec![
                TokenKind::TemplateHead,
                TokenKind::LeftBrace,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::TemplateHead,
                TokenKind::NumericLiteral,
                TokenKind::TemplateTail,
                TokenKind::RightBrace,
                TokenKind::TemplateTail,
            ]
        );
    }

    #[test]
    fn test_template_raw_normalizes_line_endings() {
        let toks = tokens("`a\r\nb\rc`");
        let TokenValue::Template(part) = &toks[0].value else {
            panic!("not a template");
        };
        assert_eq!(part.raw, "a\nb\nc");
        assert_eq!(part.cooked.as_deref(), Some("a\nb\nc"));
    }

    #[test]
    fn test_template_invalid_escape_deferred() {
        let toks = tokens(r"`\01 \x` `\unicode`");
        let TokenValue::Template(part) = &toks[0].value else {
            panic!("not a template");
        };
        assert!(part.cooked.is_none());
        assert_eq!(part.raw, r"\01 \x");
        let invalid = part.invalid_escape.as_ref().unwrap();
        assert_eq!(invalid.message, messages::TEMPLATE_OCTAL_LITERAL);
        assert_eq!(invalid.position.offset, 1);
        assert!(cooked(&toks[1]).is_none());
    }

    #[test]
    fn test_template_unterminated() {
        assert!(Scanner::tokenize_all("`abc").is_err());
    }

    // ── Regular expressions ───────────────────────────────────────────────────

    #[test]
    fn test_regexp_value() {
        let toks = tokens(r"/[/]\/x/gi");
        let TokenValue::RegExp(re) = &toks[0].value else {
            panic!("not a regexp");
        };
        assert_eq!(re.pattern, r"[/]\/x");
        assert_eq!(re.flags, "gi");
        assert!(re.regex.is_some());
    }

    #[test]
    fn test_regexp_heuristic() {
        assert_eq!(kinds("return /foo/"), vec![TokenKind::Return, TokenKind::RegExpLiteral]);
        assert_eq!(
            kinds("x = /foo/"),
            vec![TokenKind::Identifier, TokenKind::Equal, TokenKind::RegExpLiteral]
        );
        assert_eq!(
            kinds("(a) / b"),
            vec![
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::RightParen,
                TokenKind::Slash,
                TokenKind::Identifier
            ]
        );
        assert_eq!(
            kinds("4 /= 2"),
            vec![TokenKind::NumericLiteral, TokenKind::SlashEqual, TokenKind::NumericLiteral]
        );
    }

    #[test]
    fn test_regexp_errors() {
        assert_eq!(error_message("/abc"), messages::UNTERMINATED_REGEXP);
        assert_eq!(error_message("/a/gg"), messages::INVALID_REGEXP_FLAGS);
        assert_eq!(error_message("/a/uv"), messages::INVALID_REGEXP_FLAGS);
        assert_eq!(
            error_message("/a**/"),
            "Invalid regular expression: /a**/: Nothing to repeat"
        );
    }

    #[test]
    fn test_regexp_conversion_failure_kept_on_token() {
        let toks = tokens(r"/\1(a)/");
        let TokenValue::RegExp(re) = &toks[0].value else {
            panic!("not a regexp");
        };
        assert!(re.regex.is_none());
        assert!(re.conversion_error.is_some());

        let mut sc = Scanner::with_handler(
            r"/\1(a)/",
            ScannerOptions::default(),
            Box::new(ErrorCollector::new(true)),
        );
        let tok = sc.next_token().unwrap();
        let tok = sc.rescan_as_regexp(tok.span.start).unwrap();
        assert_eq!(tok.kind, TokenKind::RegExpLiteral);
        assert_eq!(sc.handler().errors()[0].kind, ErrorKind::Conversion);
    }

    #[test]
    fn test_regexp_skip_mode_keeps_pattern() {
        let options = ScannerOptions {
            regexp: RegExpMode::Skip,
            ..ScannerOptions::default()
        };
        let mut sc = Scanner::with_options("/(/", options);
        let tok = sc.next_token().unwrap();
        let tok = sc.rescan_as_regexp(tok.span.start).unwrap();
        let TokenValue::RegExp(re) = &tok.value else {
            panic!("not a regexp");
        };
        assert_eq!(re.pattern, "(");
        assert!(re.regex.is_none());
    }

    // ── Comments ──────────────────────────────────────────────────────────────

    #[test]
    fn test_comments_collected() {
        let options = ScannerOptions {
            track_comments: true,
            ..ScannerOptions::default()
        };
        let mut sc = Scanner::with_options("#!/usr/bin/env q\n// line\n/* block */ x", options);
        let tok = sc.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert!(tok.had_line_terminator_before);
        let comments = sc.take_comments();
        let kinds: Vec<_> = comments.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![CommentKind::Hashbang, CommentKind::Line, CommentKind::Block]
        );
        assert_eq!(comments[1].value, " line");
        assert_eq!(comments[2].value, " block ");
    }

    #[test]
    fn test_block_comment_line_terminator_counts() {
        let toks = tokens("a /* x\ny */ b");
        assert!(toks[1].had_line_terminator_before);
        assert_eq!(toks[1].span.start.line, 2);
    }

    #[test]
    fn test_html_comments_script_only() {
        assert_eq!(kinds("a <!-- b\nc"), vec![TokenKind::Identifier, TokenKind::Identifier]);
        assert_eq!(kinds("a\n--> b\nc"), vec![TokenKind::Identifier, TokenKind::Identifier]);
        assert_eq!(kinds("a\n  --> b\nc"), vec![TokenKind::Identifier, TokenKind::Identifier]);
        assert_eq!(
            kinds("a-->b"),
            vec![
                TokenKind::Identifier,
                TokenKind::MinusMinus,
                TokenKind::Greater,
                TokenKind::Identifier
            ]
        );
        let options = ScannerOptions {
            is_module: true,
            ..ScannerOptions::default()
        };
        let mut sc = Scanner::with_options("<!-- x", options);
        assert_eq!(sc.next_token().unwrap().kind, TokenKind::Less);
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(error_message("/* open"), messages::UNTERMINATED_COMMENT);
    }

    #[test]
    fn test_scan_comments_returns_skipped() {
        let mut sc = Scanner::new("  // a\n/*b*/x");
        let comments = sc.scan_comments().unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(sc.lex().unwrap().kind, TokenKind::Identifier);
        assert!(sc.take_comments().is_empty());
    }

    // ── Punctuators ───────────────────────────────────────────────────────────

    #[test]
    fn test_punctuators() {
        assert_eq!(
            kinds("a?.b ?? c ??= d **= e >>>= f => ..."),
            vec![
                TokenKind::Identifier,
                TokenKind::QuestionDot,
                TokenKind::Identifier,
                TokenKind::QuestionQuestion,
                TokenKind::Identifier,
                TokenKind::QuestionQuestionEqual,
                TokenKind::Identifier,
                TokenKind::StarStarEqual,
                TokenKind::Identifier,
                TokenKind::GreaterGreaterGreaterEqual,
                TokenKind::Identifier,
                TokenKind::Arrow,
                TokenKind::DotDotDot,
            ]
        );
        assert_eq!(
            kinds("a?.5:1"),
            vec![
                TokenKind::Identifier,
                TokenKind::Question,
                TokenKind::NumericLiteral,
                TokenKind::Colon,
                TokenKind::NumericLiteral
            ]
        );
    }

    #[test]
    fn test_dialect_punctuators() {
        assert_eq!(
            kinds("@A a::b c->d"),
            vec![
                TokenKind::At,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::ColonColon,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::ThinArrow,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_illegal_character() {
        assert_eq!(error_message("a ¬ b"), messages::UNEXPECTED_TOKEN_ILLEGAL);
    }

    // ── Line tracking ─────────────────────────────────────────────────────────

    #[test]
    fn test_line_column_tracking() {
        let toks = tokens("x\n  y");
        assert_eq!(toks[0].span.start.line, 1);
        assert_eq!(toks[0].span.start.column, 1);
        assert_eq!(toks[1].span.start.line, 2);
        assert_eq!(toks[1].span.start.column, 3);
        assert_eq!(toks[1].span.start.offset, 4);
    }

    #[test]
    fn test_crlf_counts_as_one_line() {
        let toks = tokens("x\r\ny\rz");
        assert_eq!(toks[1].span.start.line, 2);
        assert_eq!(toks[2].span.start.line, 3);
    }

    #[test]
    fn test_line_offset() {
        let options = ScannerOptions {
            line_offset: 10,
            ..ScannerOptions::default()
        };
        let mut sc = Scanner::with_options("a\nb", options);
        assert_eq!(sc.next_token().unwrap().span.start.line, 11);
        assert_eq!(sc.next_token().unwrap().span.start.line, 12);
    }

    #[test]
    fn test_asi_flag() {
        let toks = tokens("x\ny z");
        assert!(!toks[0].had_line_terminator_before);
        assert!(toks[1].had_line_terminator_before);
        assert!(!toks[2].had_line_terminator_before);
    }

    // ── Checkpoints ───────────────────────────────────────────────────────────

    #[test]
    fn test_save_restore_state() {
        let mut sc = Scanner::new("`a${ b }c` d");
        assert_eq!(sc.next_token().unwrap().kind, TokenKind::TemplateHead);
        let state = sc.save_state();
        assert_eq!(sc.next_token().unwrap().kind, TokenKind::Identifier);
        assert_eq!(sc.next_token().unwrap().kind, TokenKind::TemplateTail);
        sc.restore_state(state);
        let b = sc.next_token().unwrap();
        assert_eq!(b.str_value(), "b");
        assert_eq!(sc.next_token().unwrap().kind, TokenKind::TemplateTail);
        assert_eq!(sc.next_token().unwrap().str_value(), "d");
    }
}
