//! Lexical tokens produced by the [`Scanner`](super::scanner::Scanner).

use std::fmt;

use num_bigint::BigInt;

// ─────────────────────────────────────────────────────────────────────────────
// Position / Span
// ─────────────────────────────────────────────────────────────────────────────

/// A byte offset + line/column location in source code.
///
/// The parser uses a `Position` as its *marker*: a snapshot taken at the
/// start of a construct from which the node's span is later derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Position {
    /// Byte offset from the beginning of the source string.
    pub offset: usize,
    /// 1-based line number (incremented on every *LineTerminator*).
    pub line: u32,
    /// 1-based column number, measured in Unicode scalar values.
    pub column: u32,
}

/// A half-open `[start, end)` source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// Inclusive start of the span.
    pub start: Position,
    /// Exclusive end of the span.
    pub end: Position,
}

impl Span {
    /// Returns `true` when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Span) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }

    /// The source text covered by this span.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start.offset..self.end.offset]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────────────

/// The syntactic category of a lexical token.
///
/// Only reserved words have their own kind.  Contextual words (`async`,
/// `await`, `of`, `get`, `set`, `static`, `as`, `from`, `target`, `meta`,
/// `include`, `require`, `source`) are [`TokenKind::Identifier`] and are
/// interpreted by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────────────────
    /// Decimal, hex, binary or octal numeric literal.
    NumericLiteral,
    /// Numeric literal with a trailing `n`.
    BigIntLiteral,
    /// String literal enclosed in `"` or `'`.
    StringLiteral,
    /// A complete template literal with no substitutions: `` `…` ``.
    NoSubstitutionTemplate,
    /// Opening span of a substituted template: `` `…${ ``.
    TemplateHead,
    /// Middle span between two substitutions: `}…${`.
    TemplateMiddle,
    /// Closing span of a substituted template: `}…`` ` ``.
    TemplateTail,
    /// Regular expression literal `/pattern/flags`.
    RegExpLiteral,

    // ── Identifiers ───────────────────────────────────────────────────────
    /// An identifier that is not a reserved word.
    Identifier,
    /// A private identifier beginning with `#`.
    PrivateIdentifier,

    // ── Reserved words ────────────────────────────────────────────────────
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    False,
    Finally,
    For,
    /// `foreach`, the dialect's value-iteration loop.
    Foreach,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    Yield,

    // ── Punctuators ───────────────────────────────────────────────────────
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Dot,
    DotDotDot,
    Semicolon,
    Comma,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    EqualEqual,
    BangEqual,
    EqualEqualEqual,
    BangEqualEqual,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    LessLess,
    GreaterGreater,
    GreaterGreaterGreater,
    Ampersand,
    Pipe,
    Caret,
    Bang,
    Tilde,
    AmpersandAmpersand,
    PipePipe,
    QuestionQuestion,
    Question,
    Colon,
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    StarStarEqual,
    SlashEqual,
    PercentEqual,
    LessLessEqual,
    GreaterGreaterEqual,
    GreaterGreaterGreaterEqual,
    AmpersandEqual,
    PipeEqual,
    CaretEqual,
    AmpersandAmpersandEqual,
    PipePipeEqual,
    QuestionQuestionEqual,
    /// `=>`
    Arrow,
    /// `?.`
    QuestionDot,
    /// `::`, static-qualified member access.
    ColonColon,
    /// `->`, object selector.
    ThinArrow,
    /// `@`, attribute prefix.
    At,

    // ── End of file ───────────────────────────────────────────────────────
    /// End of input.
    Eof,
}

/// Coarse grouping of [`TokenKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Identifier,
    Keyword,
    Punctuator,
    NumericLiteral,
    StringLiteral,
    BooleanLiteral,
    NullLiteral,
    Template,
    RegularExpression,
    PrivateIdentifier,
    Eof,
}

impl TokenKind {
    /// The coarse category of this kind.
    pub fn category(self) -> TokenCategory {
        use TokenKind::*;
        match self {
            NumericLiteral | BigIntLiteral => TokenCategory::NumericLiteral,
            StringLiteral => TokenCategory::StringLiteral,
            NoSubstitutionTemplate | TemplateHead | TemplateMiddle | TemplateTail => {
                TokenCategory::Template
            }
            RegExpLiteral => TokenCategory::RegularExpression,
            Identifier => TokenCategory::Identifier,
            PrivateIdentifier => TokenCategory::PrivateIdentifier,
            True | False => TokenCategory::BooleanLiteral,
            Null => TokenCategory::NullLiteral,
            Eof => TokenCategory::Eof,
            k if k.is_keyword() => TokenCategory::Keyword,
            _ => TokenCategory::Punctuator,
        }
    }

    /// Returns `true` for reserved words other than the literal words
    /// `true`, `false` and `null`.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Break
                | Case
                | Catch
                | Class
                | Const
                | Continue
                | Debugger
                | Default
                | Delete
                | Do
                | Else
                | Enum
                | Export
                | Extends
                | Finally
                | For
                | Foreach
                | Function
                | If
                | Import
                | In
                | Instanceof
                | Let
                | New
                | Return
                | Super
                | Switch
                | This
                | Throw
                | Try
                | Typeof
                | Var
                | Void
                | While
                | With
                | Yield
        )
    }

    /// Returns `true` for any token that may be used as an *IdentifierName*
    /// (property names, `a.b`, `a::b`).
    pub fn is_identifier_name(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier | TokenKind::True | TokenKind::False | TokenKind::Null
        ) || self.is_keyword()
    }

    /// Fixed source text of a reserved word or punctuator.
    pub fn text(self) -> &'static str {
        use TokenKind::*;
        match self {
            NumericLiteral | BigIntLiteral => "number",
            StringLiteral => "string",
            NoSubstitutionTemplate | TemplateHead | TemplateMiddle | TemplateTail => "template",
            RegExpLiteral => "regular expression",
            Identifier => "identifier",
            PrivateIdentifier => "private identifier",
            Break => "break",
            Case => "case",
            Catch => "catch",
            Class => "class",
            Const => "const",
            Continue => "continue",
            Debugger => "debugger",
            Default => "default",
            Delete => "delete",
            Do => "do",
            Else => "else",
            Enum => "enum",
            Export => "export",
            Extends => "extends",
            False => "false",
            Finally => "finally",
            For => "for",
            Foreach => "foreach",
            Function => "function",
            If => "if",
            Import => "import",
            In => "in",
            Instanceof => "instanceof",
            Let => "let",
            New => "new",
            Null => "null",
            Return => "return",
            Super => "super",
            Switch => "switch",
            This => "this",
            Throw => "throw",
            True => "true",
            Try => "try",
            Typeof => "typeof",
            Var => "var",
            Void => "void",
            While => "while",
            With => "with",
            Yield => "yield",
            LeftBrace => "{",
            RightBrace => "}",
            LeftParen => "(",
            RightParen => ")",
            LeftBracket => "[",
            RightBracket => "]",
            Dot => ".",
            DotDotDot => "...",
            Semicolon => ";",
            Comma => ",",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            EqualEqual => "==",
            BangEqual => "!=",
            EqualEqualEqual => "===",
            BangEqualEqual => "!==",
            Plus => "+",
            Minus => "-",
            Star => "*",
            StarStar => "**",
            Slash => "/",
            Percent => "%",
            PlusPlus => "++",
            MinusMinus => "--",
            LessLess => "<<",
            GreaterGreater => ">>",
            GreaterGreaterGreater => ">>>",
            Ampersand => "&",
            Pipe => "|",
            Caret => "^",
            Bang => "!",
            Tilde => "~",
            AmpersandAmpersand => "&&",
            PipePipe => "||",
            QuestionQuestion => "??",
            Question => "?",
            Colon => ":",
            Equal => "=",
            PlusEqual => "+=",
            MinusEqual => "-=",
            StarEqual => "*=",
            StarStarEqual => "**=",
            SlashEqual => "/=",
            PercentEqual => "%=",
            LessLessEqual => "<<=",
            GreaterGreaterEqual => ">>=",
            GreaterGreaterGreaterEqual => ">>>=",
            AmpersandEqual => "&=",
            PipeEqual => "|=",
            CaretEqual => "^=",
            AmpersandAmpersandEqual => "&&=",
            PipePipeEqual => "||=",
            QuestionQuestionEqual => "??=",
            Arrow => "=>",
            QuestionDot => "?.",
            ColonColon => "::",
            ThinArrow => "->",
            At => "@",
            Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Map an identifier string to a reserved-word [`TokenKind`], or return
/// `None` for identifiers.
pub fn keyword_kind(s: &str) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match s {
        "break" => Break,
        "case" => Case,
        "catch" => Catch,
        "class" => Class,
        "const" => Const,
        "continue" => Continue,
        "debugger" => Debugger,
        "default" => Default,
        "delete" => Delete,
        "do" => Do,
        "else" => Else,
        "enum" => Enum,
        "export" => Export,
        "extends" => Extends,
        "false" => False,
        "finally" => Finally,
        "for" => For,
        "foreach" => Foreach,
        "function" => Function,
        "if" => If,
        "import" => Import,
        "in" => In,
        "instanceof" => Instanceof,
        "let" => Let,
        "new" => New,
        "null" => Null,
        "return" => Return,
        "super" => Super,
        "switch" => Switch,
        "this" => This,
        "throw" => Throw,
        "true" => True,
        "try" => Try,
        "typeof" => Typeof,
        "var" => Var,
        "void" => Void,
        "while" => While,
        "with" => With,
        "yield" => Yield,
        _ => return None,
    };
    Some(kind)
}

/// Words reserved only in strict mode code.
pub fn is_strict_mode_reserved_word(s: &str) -> bool {
    matches!(
        s,
        "implements"
            | "interface"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "static"
            | "yield"
            | "let"
    )
}

/// `eval` and `arguments`, which strict code may not bind.
pub fn is_restricted_word(s: &str) -> bool {
    matches!(s, "eval" | "arguments")
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenValue
// ─────────────────────────────────────────────────────────────────────────────

/// An invalid escape inside a template segment, raised only when the
/// template turns out to be untagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEscape {
    /// Position of the backslash.
    pub position: Position,
    /// Description of the problem.
    pub message: &'static str,
}

/// Payload of a template token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePart {
    /// Raw text, with CRLF and CR normalized to LF.
    pub raw: String,
    /// Cooked text; `None` when the segment holds an invalid escape.
    pub cooked: Option<String>,
    /// The first invalid escape in this segment.
    pub invalid_escape: Option<InvalidEscape>,
}

/// Payload of a regular-expression token.
#[derive(Debug, Clone)]
pub struct RegExpValue {
    /// Pattern body between the slashes.
    pub pattern: String,
    /// Flag characters after the closing slash.
    pub flags: String,
    /// Pattern rewritten for the host engine (adapt mode only).
    pub adapted: Option<String>,
    /// The compiled host regex, when translation and compilation succeeded.
    pub regex: Option<fancy_regex::Regex>,
    /// Why the pattern could not be compiled, when it could not.
    pub conversion_error: Option<String>,
}

impl PartialEq for RegExpValue {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.flags == other.flags
            && self.adapted == other.adapted
            && self.conversion_error == other.conversion_error
    }
}

/// The payload value associated with a [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// No semantic value (punctuators, EOF).
    None,
    /// Decoded name of an identifier, keyword or private name, or the cooked
    /// value of a string literal.
    Str(String),
    /// Parsed numeric value.
    Number(f64),
    /// Parsed BigInt value.
    BigInt(BigInt),
    /// Template segment.
    Template(Box<TemplatePart>),
    /// Regular expression literal.
    RegExp(Box<RegExpValue>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────────────

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The syntactic category.
    pub kind: TokenKind,
    /// The associated value, if any.
    pub value: TokenValue,
    /// Source location of this token.
    pub span: Span,
    /// `true` when at least one *LineTerminator* appeared between the previous
    /// token and this one.
    ///
    /// The parser uses this flag for Automatic Semicolon Insertion (ASI).
    pub had_line_terminator_before: bool,
    /// Legacy octal numeric literal, or string holding an octal, `\8` or
    /// `\9` escape.
    pub octal: bool,
    /// Identifier or keyword spelled with unicode escapes.
    pub escaped: bool,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, value: TokenValue, span: Span) -> Self {
        Self {
            kind,
            value,
            span,
            had_line_terminator_before: false,
            octal: false,
            escaped: false,
        }
    }

    /// The decoded string payload, or `""` for tokens without one.
    pub fn str_value(&self) -> &str {
        match &self.value {
            TokenValue::Str(s) => s,
            _ => "",
        }
    }

    /// Returns `true` for an unescaped identifier spelling `word`.
    pub fn is_contextual(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && !self.escaped && self.str_value() == word
    }

    /// The token's source text.
    pub fn raw<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Comment
// ─────────────────────────────────────────────────────────────────────────────

/// The syntactic form of a [`Comment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// …`
    Line,
    /// `/* … */`
    Block,
    /// `#!…` at the very start of the source.
    Hashbang,
    /// `<!-- …` (scripts only).
    HtmlOpen,
    /// `--> …` at the start of a line (scripts only).
    HtmlClose,
}

/// A comment skipped by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    /// Text without the delimiters.
    pub value: String,
    pub span: Span,
}
