//! Pattern validation and rewriting for the host regex engine.
//!
//! [`Translator`] walks the pattern once, following the ECMAScript
//! *Pattern* grammar, and appends the host-dialect equivalent of every term
//! to its output.  Legacy (Annex B) and unicode mode share the driver; the
//! [`Mode`] decides the handful of places where they differ.

use std::collections::{HashMap, HashSet};

use super::groups::{self, GroupKind, GroupTable, hex4};
use super::{RegExpError, RegExpFlags, encode_group_name, messages};
use crate::parser::character::{hex_value, is_octal_digit, is_syntax_character};
use crate::parser::parse::with_stack;

/// Grammar strategy selected by the `u` / `v` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No `u` or `v`: Annex B extensions apply.
    Legacy,
    /// `u`
    Unicode,
    /// `v`: validated only, never converted.
    UnicodeSets,
}

impl Mode {
    fn is_unicode(self) -> bool {
        !matches!(self, Mode::Legacy)
    }
}

/// Result of a successful walk.
#[derive(Debug, Clone)]
pub struct TranslateOutput {
    /// Host-dialect pattern.
    pub pattern: String,
    /// First reason the pattern cannot be handed to the host engine.
    pub unsupported: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
struct Modifiers {
    ignore_case: bool,
    multiline: bool,
    dot_all: bool,
}

type Ranges = Vec<(u32, u32)>;

const DIGIT: &[(u32, u32)] = &[(0x30, 0x39)];
const WORD: &[(u32, u32)] = &[(0x30, 0x39), (0x41, 0x5A), (0x5F, 0x5F), (0x61, 0x7A)];
const SPACE: &[(u32, u32)] = &[
    (0x09, 0x0D),
    (0x20, 0x20),
    (0xA0, 0xA0),
    (0x1680, 0x1680),
    (0x2000, 0x200A),
    (0x2028, 0x2029),
    (0x202F, 0x202F),
    (0x205F, 0x205F),
    (0x3000, 0x3000),
    (0xFEFF, 0xFEFF),
];
const MAX_CODE_POINT: u32 = 0x10FFFF;

const WORD_CLASS: &str = "[0-9A-Z_a-z]";
const LINE_TERMINATOR_CLASS: &str = "[\\n\\r\u{2028}\u{2029}]";
const NOT_LINE_TERMINATOR_CLASS: &str = "[^\\n\\r\u{2028}\u{2029}]";
const ANY_CHAR: &str = "[\\s\\S]";
const NEVER: &str = "(?!)";

/// Deepest group nesting handed to the host engine, whose own parser
/// enforces a nesting limit.
const MAX_HOST_GROUP_NESTING: usize = 128;

/// `\d \D \w \W \s \S` or a property escape.
#[derive(Debug, Clone)]
enum ClassEscape {
    Predefined {
        set: &'static [(u32, u32)],
        negated: bool,
    },
    Property(String),
}

#[derive(Debug, Clone)]
enum ClassAtom {
    Char(u32),
    Escape(ClassEscape),
}

#[derive(Debug, Default)]
struct ClassBuilder {
    ranges: Ranges,
    properties: Vec<String>,
}

/// Upper bound of a braced quantifier.
#[derive(Debug, Clone, Copy)]
enum Upper {
    Exact,
    Unbounded,
    Bounded(u64),
}

#[derive(Debug, Clone, Copy)]
struct Braced {
    min: u64,
    upper: Upper,
    end: usize,
}

/// Per-alternative group-name sets.
///
/// A name may repeat only in different alternatives of some disjunction.
/// Each open group owns a frame; names of a closed group are hoisted into
/// the enclosing alternative.
#[derive(Debug)]
struct NameScopes {
    frames: Vec<NameFrame>,
}

#[derive(Debug, Default)]
struct NameFrame {
    current: HashSet<String>,
    previous: HashSet<String>,
}

impl NameScopes {
    fn new() -> Self {
        Self {
            frames: vec![NameFrame::default()],
        }
    }

    fn declare(&mut self, name: &str) -> bool {
        if self.frames.iter().any(|f| f.current.contains(name)) {
            return false;
        }
        if let Some(top) = self.frames.last_mut() {
            top.current.insert(name.to_string());
        }
        true
    }

    fn next_alternative(&mut self) {
        if let Some(top) = self.frames.last_mut() {
            let finished: Vec<String> = top.current.drain().collect();
            top.previous.extend(finished);
        }
    }

    fn push_group(&mut self) {
        self.frames.push(NameFrame::default());
    }

    fn pop_group(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        if let Some(frame) = self.frames.pop()
            && let Some(parent) = self.frames.last_mut()
        {
            parent.current.extend(frame.previous);
            parent.current.extend(frame.current);
        }
    }
}

/// Single-pass pattern validator and rewriter.
pub struct Translator<'a> {
    chars: &'a [char],
    pos: usize,
    mode: Mode,
    ignore_case: bool,
    table: GroupTable,
    out: String,
    unsupported: Option<&'static str>,
    groups_opened: usize,
    closed: Vec<bool>,
    names: NameScopes,
    modifiers: Vec<Modifiers>,
    host_names: HashMap<String, String>,
}

impl<'a> Translator<'a> {
    pub fn new(chars: &'a [char], flags: &RegExpFlags, mode: Mode, table: GroupTable) -> Self {
        let closed = vec![false; table.len()];
        Self {
            chars,
            pos: 0,
            mode,
            ignore_case: flags.ignore_case,
            table,
            out: String::with_capacity(chars.len() * 2),
            unsupported: None,
            groups_opened: 0,
            closed,
            names: NameScopes::new(),
            modifiers: vec![Modifiers {
                ignore_case: flags.ignore_case,
                multiline: flags.multiline,
                dot_all: flags.dot_all,
            }],
            host_names: HashMap::new(),
        }
    }

    /// Walk the whole pattern.
    pub fn translate(mut self) -> Result<TranslateOutput, RegExpError> {
        if self.table.has_duplicate_names() {
            self.mark_unsupported(messages::UNSUPPORTED_DUPLICATE_NAMES);
        }
        self.assign_host_names();
        if self.ignore_case {
            self.out.push_str("(?i)");
        }
        self.parse_disjunction()?;
        if self.pos < self.chars.len() {
            return Err(self.error(messages::UNMATCHED_PAREN));
        }
        if self.mode == Mode::UnicodeSets {
            self.mark_unsupported(messages::UNSUPPORTED_UNICODE_SETS);
        }
        Ok(TranslateOutput {
            pattern: self.out,
            unsupported: self.unsupported,
        })
    }

    // ── Helpers ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: &'static str) -> RegExpError {
        RegExpError::new(self.pos, message)
    }

    fn mark_unsupported(&mut self, reason: &'static str) {
        self.unsupported.get_or_insert(reason);
    }

    fn current(&self) -> Modifiers {
        self.modifiers.last().copied().unwrap_or(Modifiers {
            ignore_case: false,
            multiline: false,
            dot_all: false,
        })
    }

    fn assign_host_names(&mut self) {
        let mut owners: HashMap<String, String> = HashMap::new();
        for group in &self.table.groups {
            let Some(name) = &group.name else { continue };
            let host = encode_group_name(name);
            if let Some(owner) = owners.insert(host.clone(), name.clone())
                && owner != *name
            {
                self.unsupported
                    .get_or_insert(messages::UNSUPPORTED_NAME_COLLISION);
            }
            self.host_names.insert(name.clone(), host);
        }
    }

    fn host_name(&self, name: &str) -> String {
        self.host_names
            .get(name)
            .cloned()
            .unwrap_or_else(|| encode_group_name(name))
    }

    fn host_char(&mut self, cp: u32) -> char {
        match char::from_u32(cp) {
            Some(c) => c,
            None => {
                self.mark_unsupported(messages::UNSUPPORTED_LONE_SURROGATE);
                '\u{FFFD}'
            }
        }
    }

    fn emit_literal(&mut self, cp: u32) {
        let c = self.host_char(cp);
        push_escaped(&mut self.out, c);
    }

    // ── Disjunction / Alternative / Term ────────────────────────────────────

    fn parse_disjunction(&mut self) -> Result<(), RegExpError> {
        self.parse_alternative()?;
        while self.eat('|') {
            self.out.push('|');
            self.names.next_alternative();
            self.parse_alternative()?;
        }
        Ok(())
    }

    fn parse_alternative(&mut self) -> Result<(), RegExpError> {
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            self.parse_term()?;
        }
        Ok(())
    }

    fn parse_term(&mut self) -> Result<(), RegExpError> {
        let Some(c) = self.peek() else {
            return Ok(());
        };
        match c {
            '^' => {
                self.pos += 1;
                if self.current().multiline {
                    self.out.push_str("(?:^|(?<=");
                    self.out.push_str(LINE_TERMINATOR_CLASS);
                    self.out.push_str("))");
                } else {
                    self.out.push('^');
                }
                self.reject_quantifier()
            }
            '$' => {
                self.pos += 1;
                if self.current().multiline {
                    self.out.push_str("(?:$|(?=");
                    self.out.push_str(LINE_TERMINATOR_CLASS);
                    self.out.push_str("))");
                } else {
                    self.out.push('$');
                }
                self.reject_quantifier()
            }
            '\\' if matches!(self.peek_at(1), Some('b' | 'B')) => {
                let negated = self.peek_at(1) == Some('B');
                self.pos += 2;
                self.out.push_str(&word_boundary(negated));
                self.reject_quantifier()
            }
            '(' => {
                let kind = groups::classify(self.chars, self.pos);
                self.parse_group(kind)?;
                match kind {
                    GroupKind::Lookbehind | GroupKind::NegativeLookbehind => {
                        self.reject_quantifier()
                    }
                    GroupKind::Lookahead | GroupKind::NegativeLookahead
                        if self.mode.is_unicode() =>
                    {
                        self.reject_quantifier()
                    }
                    _ => self.parse_quantifier(),
                }
            }
            '*' | '+' | '?' => Err(self.error(messages::NOTHING_TO_REPEAT)),
            '{' => {
                if self.scan_braced(self.pos).is_some() {
                    return Err(self.error(messages::NOTHING_TO_REPEAT));
                }
                if self.mode.is_unicode() {
                    return Err(self.error(messages::LONE_QUANTIFIER_BRACKETS));
                }
                self.pos += 1;
                self.emit_literal('{' as u32);
                self.parse_quantifier()
            }
            '}' | ']' => {
                if self.mode.is_unicode() {
                    return Err(self.error(messages::LONE_QUANTIFIER_BRACKETS));
                }
                self.pos += 1;
                self.emit_literal(c as u32);
                self.parse_quantifier()
            }
            _ => {
                self.parse_atom()?;
                self.parse_quantifier()
            }
        }
    }

    fn parse_atom(&mut self) -> Result<(), RegExpError> {
        let Some(c) = self.peek() else {
            return Ok(());
        };
        match c {
            '.' => {
                self.pos += 1;
                let dot = if self.current().dot_all {
                    ANY_CHAR
                } else {
                    NOT_LINE_TERMINATOR_CLASS
                };
                self.out.push_str(dot);
                Ok(())
            }
            '[' => {
                if self.mode == Mode::UnicodeSets {
                    self.parse_class_set().map(|_| ())
                } else {
                    self.parse_class()
                }
            }
            '\\' => {
                self.pos += 1;
                self.parse_atom_escape()
            }
            _ => {
                self.pos += 1;
                self.emit_literal(c as u32);
                Ok(())
            }
        }
    }

    // ── Quantifiers ─────────────────────────────────────────────────────────

    /// Parse `{n}`, `{n,}` or `{n,m}` at `pos` without consuming anything.
    fn scan_braced(&self, pos: usize) -> Option<Braced> {
        let digits = |mut p: usize| -> Option<(u64, usize)> {
            let start = p;
            let mut value: u64 = 0;
            while let Some(d) = self.chars.get(p).and_then(|c| c.to_digit(10)) {
                value = value.saturating_mul(10).saturating_add(u64::from(d));
                p += 1;
            }
            (p > start).then_some((value, p))
        };
        if self.chars.get(pos) != Some(&'{') {
            return None;
        }
        let (min, mut p) = digits(pos + 1)?;
        let upper = if self.chars.get(p) == Some(&',') {
            match digits(p + 1) {
                Some((max, next)) => {
                    p = next;
                    Upper::Bounded(max)
                }
                None => {
                    p += 1;
                    Upper::Unbounded
                }
            }
        } else {
            Upper::Exact
        };
        (self.chars.get(p) == Some(&'}')).then_some(Braced {
            min,
            upper,
            end: p + 1,
        })
    }

    fn reject_quantifier(&self) -> Result<(), RegExpError> {
        let quantified = match self.peek() {
            Some('*' | '+' | '?') => true,
            Some('{') => self.scan_braced(self.pos).is_some(),
            _ => false,
        };
        if quantified {
            Err(self.error(messages::NOTHING_TO_REPEAT))
        } else {
            Ok(())
        }
    }

    fn parse_quantifier(&mut self) -> Result<(), RegExpError> {
        match self.peek() {
            Some(c @ ('*' | '+' | '?')) => {
                self.pos += 1;
                self.out.push(c);
            }
            Some('{') => match self.scan_braced(self.pos) {
                Some(braced) => {
                    let text = self.format_braced(braced)?;
                    self.pos = braced.end;
                    self.out.push_str(&text);
                }
                None if self.mode.is_unicode() => {
                    return Err(self.error(messages::INCOMPLETE_QUANTIFIER));
                }
                None => return Ok(()),
            },
            _ => return Ok(()),
        }
        if self.eat('?') {
            self.out.push('?');
        }
        Ok(())
    }

    fn format_braced(&mut self, braced: Braced) -> Result<String, RegExpError> {
        if let Upper::Bounded(max) = braced.upper
            && braced.min > max
        {
            return Err(self.error(messages::QUANTIFIER_OUT_OF_ORDER));
        }
        let mut bound = |n: u64| -> u64 {
            if n > u64::from(u32::MAX) {
                self.mark_unsupported(messages::UNSUPPORTED_QUANTIFIER_BOUND);
                u64::from(u32::MAX)
            } else {
                n
            }
        };
        let min = bound(braced.min);
        Ok(match braced.upper {
            Upper::Exact => format!("{{{min}}}"),
            Upper::Unbounded => format!("{{{min},}}"),
            Upper::Bounded(max) => format!("{{{min},{}}}", bound(max)),
        })
    }

    // ── Groups ──────────────────────────────────────────────────────────────

    fn parse_group(&mut self, kind: GroupKind) -> Result<(), RegExpError> {
        let open = self.pos;
        let mut modifiers = self.current();
        match kind {
            GroupKind::Capturing => {
                self.pos += 1;
                self.out.push('(');
            }
            GroupKind::NamedCapturing => {
                let (name, end) = groups::parse_group_name(self.chars, self.pos + 3)?;
                if !self.names.declare(&name) {
                    return Err(RegExpError::new(open, messages::DUPLICATE_GROUP_NAME));
                }
                self.pos = end;
                let host = self.host_name(&name);
                self.out.push_str("(?<");
                self.out.push_str(&host);
                self.out.push('>');
            }
            GroupKind::NonCapturing => {
                self.pos += 3;
                self.out.push_str("(?:");
            }
            GroupKind::Lookahead => {
                self.pos += 3;
                self.out.push_str("(?=");
            }
            GroupKind::NegativeLookahead => {
                self.pos += 3;
                self.out.push_str("(?!");
            }
            GroupKind::Lookbehind => {
                self.pos += 4;
                self.out.push_str("(?<=");
            }
            GroupKind::NegativeLookbehind => {
                self.pos += 4;
                self.out.push_str("(?<!");
            }
            GroupKind::Modifiers => {
                self.pos += 2;
                modifiers = self.parse_modifiers(modifiers)?;
            }
        }
        let index = kind.is_capturing().then(|| {
            self.groups_opened += 1;
            self.groups_opened - 1
        });

        self.names.push_group();
        self.modifiers.push(modifiers);
        if self.modifiers.len() > MAX_HOST_GROUP_NESTING {
            self.mark_unsupported(messages::UNSUPPORTED_GROUP_NESTING);
        }
        with_stack(|| self.parse_disjunction())?;
        if !self.eat(')') {
            return Err(RegExpError::new(open, messages::UNTERMINATED_GROUP));
        }
        self.out.push(')');
        self.modifiers.pop();
        self.names.pop_group();
        if let Some(slot) = index.and_then(|i| self.closed.get_mut(i)) {
            *slot = true;
        }
        Ok(())
    }

    /// Parse `ims-ims:` after `(?` and emit the host group opener.
    fn parse_modifiers(&mut self, base: Modifiers) -> Result<Modifiers, RegExpError> {
        let mut seen = HashSet::new();
        let mut add = Vec::new();
        let mut remove = Vec::new();
        let mut removing = false;
        loop {
            match self.peek() {
                Some(':') => {
                    self.pos += 1;
                    break;
                }
                Some('-') if !removing => {
                    removing = true;
                    self.pos += 1;
                }
                Some(c @ ('i' | 'm' | 's')) if seen.insert(c) => {
                    self.pos += 1;
                    if removing {
                        remove.push(c);
                    } else {
                        add.push(c);
                    }
                }
                _ => return Err(self.error(messages::INVALID_GROUP)),
            }
        }
        if removing && add.is_empty() && remove.is_empty() {
            return Err(self.error(messages::INVALID_GROUP));
        }
        let mut next = base;
        for &c in &add {
            match c {
                'i' => next.ignore_case = true,
                'm' => next.multiline = true,
                _ => next.dot_all = true,
            }
        }
        for &c in &remove {
            match c {
                'i' => next.ignore_case = false,
                'm' => next.multiline = false,
                _ => next.dot_all = false,
            }
        }
        if add.contains(&'i') {
            self.out.push_str("(?i:");
        } else if remove.contains(&'i') {
            self.out.push_str("(?-i:");
        } else {
            self.out.push_str("(?:");
        }
        Ok(next)
    }

    // ── Escapes ─────────────────────────────────────────────────────────────

    /// After the backslash of an atom escape.
    fn parse_atom_escape(&mut self) -> Result<(), RegExpError> {
        let Some(c) = self.peek() else {
            return Err(self.error(messages::INVALID_ESCAPE));
        };
        match c {
            '1'..='9' => self.parse_backreference(),
            'k' => self.parse_named_reference(),
            'd' | 'D' | 'w' | 'W' | 's' | 'S' => {
                self.pos += 1;
                let mut class = ClassBuilder::default();
                let ClassEscape::Predefined { set, negated } = predefined(c) else {
                    return Ok(());
                };
                class.ranges.extend_from_slice(set);
                let text = self.render_class(class, negated);
                self.out.push_str(&text);
                Ok(())
            }
            'p' | 'P' if self.mode.is_unicode() => {
                self.pos += 1;
                let property = self.parse_property(c == 'P')?;
                self.out.push_str(&property);
                Ok(())
            }
            _ => {
                let cp = self.parse_character_escape(false)?;
                self.emit_literal(cp);
                Ok(())
            }
        }
    }

    fn parse_backreference(&mut self) -> Result<(), RegExpError> {
        let start = self.pos;
        let mut n: u64 = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            n = n.saturating_mul(10).saturating_add(u64::from(d));
            self.pos += 1;
        }
        if n >= 1 && n <= self.table.len() as u64 {
            let index = (n - 1) as usize;
            if !self.closed.get(index).copied().unwrap_or(false) {
                self.mark_unsupported(messages::UNSUPPORTED_FORWARD_REFERENCE);
            }
            self.out.push_str(&format!("(?:\\{n})"));
            return Ok(());
        }
        if self.mode.is_unicode() {
            self.pos = start;
            return Err(self.error(messages::INVALID_ESCAPE));
        }
        self.pos = start;
        let cp = self.parse_legacy_decimal();
        self.emit_literal(cp);
        Ok(())
    }

    /// Annex B fallback for a decimal escape that is not a back-reference:
    /// `\8` and `\9` are identity escapes, anything else is octal.
    fn parse_legacy_decimal(&mut self) -> u32 {
        match self.peek() {
            Some(c @ ('8' | '9')) => {
                self.pos += 1;
                c as u32
            }
            _ => self.parse_legacy_octal(),
        }
    }

    fn parse_legacy_octal(&mut self) -> u32 {
        let Some(first) = self.peek().filter(|&c| is_octal_digit(c)) else {
            return 0;
        };
        self.pos += 1;
        let mut value = first as u32 - '0' as u32;
        let max_digits = if first <= '3' { 2 } else { 1 };
        for _ in 0..max_digits {
            match self.peek() {
                Some(c) if is_octal_digit(c) => {
                    value = value * 8 + (c as u32 - '0' as u32);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        value
    }

    fn parse_named_reference(&mut self) -> Result<(), RegExpError> {
        if !self.mode.is_unicode() && !self.table.has_named_groups() {
            self.pos += 1;
            self.emit_literal('k' as u32);
            return Ok(());
        }
        if self.peek_at(1) != Some('<') {
            return Err(self.error(messages::INVALID_NAMED_REFERENCE));
        }
        let (name, end) = groups::parse_group_name(self.chars, self.pos + 2)
            .map_err(|e| RegExpError::new(e.offset, messages::INVALID_NAMED_REFERENCE))?;
        let indices = self.table.indices_of(&name);
        if indices.is_empty() {
            return Err(self.error(messages::INVALID_NAMED_CAPTURE_REFERENCED));
        }
        self.pos = end;
        if !indices
            .iter()
            .any(|&i| self.closed.get(i).copied().unwrap_or(false))
        {
            self.mark_unsupported(messages::UNSUPPORTED_FORWARD_REFERENCE);
        }
        let host = self.host_name(&name);
        self.out.push_str(&format!("(?:\\k<{host}>)"));
        Ok(())
    }

    /// `{Name}` or `{Name=Value}` after `\p` / `\P`.
    fn parse_property(&mut self, negated: bool) -> Result<String, RegExpError> {
        if !self.eat('{') {
            return Err(self.error(messages::INVALID_PROPERTY_NAME));
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '=')
        {
            self.pos += 1;
        }
        let body: String = self.chars[start..self.pos].iter().collect();
        if !self.eat('}') {
            return Err(self.error(messages::INVALID_PROPERTY_NAME));
        }
        let parts: Vec<&str> = body.split('=').collect();
        if parts.len() > 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(RegExpError::new(start, messages::INVALID_PROPERTY_NAME));
        }
        let letter = if negated { 'P' } else { 'p' };
        Ok(format!("\\{letter}{{{body}}}"))
    }

    /// *CharacterEscape* after the backslash; returns a code point (which
    /// may be a lone surrogate).
    fn parse_character_escape(&mut self, in_class: bool) -> Result<u32, RegExpError> {
        let Some(c) = self.peek() else {
            return Err(self.error(messages::INVALID_ESCAPE));
        };
        let simple = match c {
            't' => Some(0x09),
            'n' => Some(0x0A),
            'v' => Some(0x0B),
            'f' => Some(0x0C),
            'r' => Some(0x0D),
            _ => None,
        };
        if let Some(cp) = simple {
            self.pos += 1;
            return Ok(cp);
        }
        match c {
            'c' => {
                let letter = self.peek_at(1);
                match letter {
                    Some(l) if l.is_ascii_alphabetic() => {
                        self.pos += 2;
                        Ok(l as u32 % 32)
                    }
                    Some(l)
                        if in_class
                            && self.mode == Mode::Legacy
                            && (l.is_ascii_digit() || l == '_') =>
                    {
                        self.pos += 2;
                        Ok(l as u32 % 32)
                    }
                    _ if self.mode.is_unicode() => {
                        Err(self.error(messages::INVALID_UNICODE_ESCAPE))
                    }
                    // The backslash is literal; `c` is read again as an atom.
                    _ => Ok('\\' as u32),
                }
            }
            '0' if !matches!(self.peek_at(1), Some('0'..='9')) => {
                self.pos += 1;
                Ok(0)
            }
            '0'..='9' => {
                if self.mode.is_unicode() {
                    let message = if in_class {
                        messages::INVALID_CLASS_ESCAPE
                    } else {
                        messages::INVALID_DECIMAL_ESCAPE
                    };
                    return Err(self.error(message));
                }
                Ok(self.parse_legacy_decimal())
            }
            'x' => {
                let hex = (
                    self.peek_at(1).and_then(hex_value),
                    self.peek_at(2).and_then(hex_value),
                );
                match hex {
                    (Some(hi), Some(lo)) => {
                        self.pos += 3;
                        Ok(hi * 16 + lo)
                    }
                    _ if self.mode.is_unicode() => Err(self.error(messages::INVALID_ESCAPE)),
                    _ => {
                        self.pos += 1;
                        Ok('x' as u32)
                    }
                }
            }
            'u' => self.parse_unicode_escape(),
            '-' if in_class && self.mode.is_unicode() => {
                self.pos += 1;
                Ok('-' as u32)
            }
            'k' if self.mode == Mode::Legacy && self.table.has_named_groups() => {
                Err(self.error(messages::INVALID_NAMED_REFERENCE))
            }
            _ if self.mode.is_unicode() => {
                if is_syntax_character(c) || c == '/' {
                    self.pos += 1;
                    Ok(c as u32)
                } else {
                    Err(self.error(messages::INVALID_ESCAPE))
                }
            }
            _ => {
                self.pos += 1;
                Ok(c as u32)
            }
        }
    }

    /// `\u` escapes, at the `u`.
    fn parse_unicode_escape(&mut self) -> Result<u32, RegExpError> {
        if self.mode.is_unicode() && self.peek_at(1) == Some('{') {
            let mut p = self.pos + 2;
            let mut value: u32 = 0;
            while let Some(d) = self.chars.get(p).and_then(|&c| hex_value(c)) {
                value = value.saturating_mul(16).saturating_add(d);
                p += 1;
            }
            if p == self.pos + 2 || self.chars.get(p) != Some(&'}') || value > MAX_CODE_POINT {
                return Err(self.error(messages::INVALID_UNICODE_ESCAPE));
            }
            self.pos = p + 1;
            return Ok(value);
        }
        if let Some(high) = hex4(self.chars, self.pos + 1) {
            self.pos += 5;
            if (0xD800..0xDC00).contains(&high)
                && self.peek() == Some('\\')
                && self.peek_at(1) == Some('u')
                && let Some(low) = hex4(self.chars, self.pos + 2)
                && (0xDC00..0xE000).contains(&low)
            {
                self.pos += 6;
                return Ok(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00));
            }
            return Ok(high);
        }
        if self.mode.is_unicode() {
            return Err(self.error(messages::INVALID_UNICODE_ESCAPE));
        }
        self.pos += 1;
        Ok('u' as u32)
    }

    // ── Character classes ───────────────────────────────────────────────────

    fn parse_class(&mut self) -> Result<(), RegExpError> {
        let open = self.pos;
        self.pos += 1;
        let negated = self.eat('^');
        let mut class = ClassBuilder::default();
        loop {
            match self.peek() {
                None => return Err(RegExpError::new(open, messages::UNTERMINATED_CLASS)),
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {}
            }
            let atom_pos = self.pos;
            let first = self.parse_class_atom()?;
            if self.peek() == Some('-') && !matches!(self.peek_at(1), Some(']') | None) {
                self.pos += 1;
                let second = self.parse_class_atom()?;
                match (first, second) {
                    (ClassAtom::Char(lo), ClassAtom::Char(hi)) => {
                        if lo > hi {
                            return Err(RegExpError::new(atom_pos, messages::RANGE_OUT_OF_ORDER));
                        }
                        self.add_range(&mut class, lo, hi);
                    }
                    (first, second) => {
                        if self.mode.is_unicode() {
                            return Err(RegExpError::new(
                                atom_pos,
                                messages::INVALID_CHARACTER_CLASS,
                            ));
                        }
                        self.add_atom(&mut class, first);
                        self.add_range(&mut class, '-' as u32, '-' as u32);
                        self.add_atom(&mut class, second);
                    }
                }
            } else {
                self.add_atom(&mut class, first);
            }
        }
        let text = self.render_class(class, negated);
        self.out.push_str(&text);
        Ok(())
    }

    fn parse_class_atom(&mut self) -> Result<ClassAtom, RegExpError> {
        let Some(c) = self.peek() else {
            return Err(self.error(messages::UNTERMINATED_CLASS));
        };
        if c != '\\' {
            self.pos += 1;
            return Ok(ClassAtom::Char(c as u32));
        }
        self.pos += 1;
        let Some(e) = self.peek() else {
            return Err(self.error(messages::INVALID_ESCAPE));
        };
        match e {
            'b' => {
                self.pos += 1;
                Ok(ClassAtom::Char(0x08))
            }
            'd' | 'D' | 'w' | 'W' | 's' | 'S' => {
                self.pos += 1;
                Ok(ClassAtom::Escape(predefined(e)))
            }
            'p' | 'P' if self.mode.is_unicode() => {
                self.pos += 1;
                let property = self.parse_property(e == 'P')?;
                Ok(ClassAtom::Escape(ClassEscape::Property(property)))
            }
            'B' if self.mode.is_unicode() => Err(self.error(messages::INVALID_CLASS_ESCAPE)),
            _ => self.parse_character_escape(true).map(ClassAtom::Char),
        }
    }

    fn add_atom(&mut self, class: &mut ClassBuilder, atom: ClassAtom) {
        match atom {
            ClassAtom::Char(cp) => self.add_range(class, cp, cp),
            ClassAtom::Escape(ClassEscape::Predefined { set, negated }) => {
                if negated {
                    class.ranges.extend(complement(set));
                } else {
                    class.ranges.extend_from_slice(set);
                }
            }
            ClassAtom::Escape(ClassEscape::Property(p)) => class.properties.push(p),
        }
    }

    fn add_range(&mut self, class: &mut ClassBuilder, lo: u32, hi: u32) {
        if (0xD800..=0xDFFF).contains(&lo) && (0xD800..=0xDFFF).contains(&hi) {
            self.mark_unsupported(messages::UNSUPPORTED_LONE_SURROGATE);
            return;
        }
        class.ranges.push((lo, hi));
    }

    fn render_class(&mut self, class: ClassBuilder, negated: bool) -> String {
        let ranges = normalize(class.ranges);
        if ranges.is_empty() && class.properties.is_empty() {
            return if negated { ANY_CHAR } else { NEVER }.to_string();
        }
        let mut text = String::from("[");
        if negated {
            text.push('^');
        }
        for (lo, hi) in ranges {
            push_escaped(&mut text, self.host_char(lo));
            if hi > lo {
                if hi > lo + 1 {
                    text.push('-');
                }
                push_escaped(&mut text, self.host_char(hi));
            }
        }
        for property in class.properties {
            text.push_str(&property);
        }
        text.push(']');
        text
    }

    // ── Unicode sets (`v` flag) ─────────────────────────────────────────────

    /// Validate a *ClassSetExpression*.  Nothing useful is emitted: `v`
    /// patterns are never converted.
    fn parse_class_set(&mut self) -> Result<Option<u32>, RegExpError> {
        let open = self.pos;
        self.pos += 1;
        self.eat('^');
        // '&' intersection, '-' subtraction, 'u' union
        let mut operator: Option<char> = None;
        let mut operands = 0usize;
        loop {
            let Some(c) = self.peek() else {
                return Err(RegExpError::new(open, messages::UNTERMINATED_CLASS));
            };
            if c == ']' {
                self.pos += 1;
                break;
            }
            if (c == '&' || c == '-') && self.peek_at(1) == Some(c) {
                if operands == 0 || operator.is_some_and(|o| o != c) {
                    return Err(self.error(messages::INVALID_SET_OPERATION));
                }
                operator = Some(c);
                self.pos += 2;
                if (c == '&' && self.peek() == Some('&')) || matches!(self.peek(), Some(']') | None)
                {
                    return Err(self.error(messages::INVALID_SET_OPERATION));
                }
                self.parse_class_set_operand()?;
                operands += 1;
                continue;
            }
            if operator.is_some_and(|o| o != 'u') {
                return Err(self.error(messages::INVALID_SET_OPERATION));
            }
            let operand_pos = self.pos;
            let single = self.parse_class_set_operand()?;
            if let Some(lo) = single
                && self.peek() == Some('-')
                && self.peek_at(1) != Some('-')
            {
                self.pos += 1;
                let hi = self
                    .parse_class_set_operand()?
                    .ok_or_else(|| self.error(messages::INVALID_CHARACTER_CLASS))?;
                if lo > hi {
                    return Err(RegExpError::new(operand_pos, messages::RANGE_OUT_OF_ORDER));
                }
            }
            operands += 1;
            if operands > 1 {
                operator = Some('u');
            }
        }
        Ok(None)
    }

    /// One *ClassSetOperand*; returns the code point when it is a single
    /// character.
    fn parse_class_set_operand(&mut self) -> Result<Option<u32>, RegExpError> {
        let Some(c) = self.peek() else {
            return Err(self.error(messages::UNTERMINATED_CLASS));
        };
        match c {
            '[' => with_stack(|| self.parse_class_set()),
            '\\' => {
                self.pos += 1;
                let Some(e) = self.peek() else {
                    return Err(self.error(messages::INVALID_ESCAPE));
                };
                match e {
                    'q' if self.peek_at(1) == Some('{') => {
                        self.pos += 2;
                        self.parse_class_string_disjunction()?;
                        Ok(None)
                    }
                    'd' | 'D' | 'w' | 'W' | 's' | 'S' => {
                        self.pos += 1;
                        Ok(None)
                    }
                    'p' | 'P' => {
                        self.pos += 1;
                        self.parse_property(e == 'P')?;
                        Ok(None)
                    }
                    'b' => {
                        self.pos += 1;
                        Ok(Some(0x08))
                    }
                    _ if is_class_set_reserved_punctuator(e) => {
                        self.pos += 1;
                        Ok(Some(e as u32))
                    }
                    _ => self.parse_character_escape(true).map(Some),
                }
            }
            _ => {
                if is_class_set_reserved_double_punctuator(c) && self.peek_at(1) == Some(c) {
                    return Err(self.error(messages::INVALID_SET_OPERATION));
                }
                if matches!(c, '(' | ')' | '{' | '}' | '/' | '-' | '|' | ']') {
                    return Err(self.error(messages::INVALID_CLASS_SET_CHARACTER));
                }
                self.pos += 1;
                Ok(Some(c as u32))
            }
        }
    }

    /// Body of `\q{…}` after the brace.
    fn parse_class_string_disjunction(&mut self) -> Result<(), RegExpError> {
        loop {
            match self.peek() {
                None => return Err(self.error(messages::UNTERMINATED_CLASS)),
                Some('}') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some('\\') => {
                    self.pos += 1;
                    if self.peek() == Some('b') {
                        self.pos += 1;
                    } else {
                        self.parse_character_escape(true)?;
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }
}

fn predefined(c: char) -> ClassEscape {
    let set = match c.to_ascii_lowercase() {
        'd' => DIGIT,
        'w' => WORD,
        _ => SPACE,
    };
    ClassEscape::Predefined {
        set,
        negated: c.is_ascii_uppercase(),
    }
}

fn is_class_set_reserved_double_punctuator(c: char) -> bool {
    matches!(
        c,
        '&' | '!'
            | '#'
            | '$'
            | '%'
            | '*'
            | '+'
            | ','
            | '.'
            | ':'
            | ';'
            | '<'
            | '='
            | '>'
            | '?'
            | '@'
            | '^'
            | '`'
            | '~'
    )
}

fn is_class_set_reserved_punctuator(c: char) -> bool {
    matches!(
        c,
        '&' | '-' | '!' | '#' | '%' | ',' | ':' | ';' | '<' | '=' | '>' | '@' | '`' | '~'
    )
}

/// Lookaround form of `\b` / `\B` over the ASCII word set.
fn word_boundary(negated: bool) -> String {
    let w = WORD_CLASS;
    if negated {
        format!("(?:(?<={w})(?={w})|(?<!{w})(?!{w}))")
    } else {
        format!("(?:(?<={w})(?!{w})|(?<!{w})(?={w}))")
    }
}

/// Complement of a sorted range set over all code points.
fn complement(set: &[(u32, u32)]) -> Ranges {
    let mut out = Vec::new();
    let mut next = 0u32;
    for &(lo, hi) in set {
        if lo > next {
            out.push((next, lo - 1));
        }
        next = hi + 1;
    }
    if next <= MAX_CODE_POINT {
        out.push((next, MAX_CODE_POINT));
    }
    out
}

/// Sort, merge and drop the surrogate block.
fn normalize(mut ranges: Ranges) -> Ranges {
    ranges.sort_unstable();
    let mut merged: Ranges = Vec::with_capacity(ranges.len());
    for (lo, hi) in ranges {
        match merged.last_mut() {
            Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    let mut clipped = Vec::with_capacity(merged.len());
    for (lo, hi) in merged {
        if hi < 0xD800 || lo > 0xDFFF {
            clipped.push((lo, hi));
            continue;
        }
        if lo < 0xD800 {
            clipped.push((lo, 0xD7FF));
        }
        if hi > 0xDFFF {
            clipped.push((0xE000, hi));
        }
    }
    clipped
}

/// Append `c`, escaped when the host engine would read it as syntax.
fn push_escaped(out: &mut String, c: char) {
    match c {
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        | '#' | '&' | '-' | '~' => {
            out.push('\\');
            out.push(c);
        }
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c.is_ascii_control() => out.push_str(&format!("\\x{{{:X}}}", c as u32)),
        c => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(pattern: &str, flags: &str) -> TranslateOutput {
        let flags = RegExpFlags::parse(flags).unwrap();
        let chars: Vec<char> = pattern.chars().collect();
        let table = groups::scan_groups(&chars, flags.unicode_sets).unwrap();
        let mode = if flags.unicode_sets {
            Mode::UnicodeSets
        } else if flags.unicode {
            Mode::Unicode
        } else {
            Mode::Legacy
        };
        Translator::new(&chars, &flags, mode, table)
            .translate()
            .unwrap()
    }

    #[test]
    fn test_literal_text_passes_through() {
        assert_eq!(translate("abc", "").pattern, "abc");
    }

    #[test]
    fn test_host_special_characters_escaped() {
        assert_eq!(translate(r"\#", "").pattern, r"\#");
        assert_eq!(translate("a&b", "").pattern, r"a\&b");
    }

    #[test]
    fn test_dot_rewrites() {
        assert_eq!(translate(".", "").pattern, NOT_LINE_TERMINATOR_CLASS);
        assert_eq!(translate(".", "s").pattern, ANY_CHAR);
    }

    #[test]
    fn test_ignore_case_prefix() {
        assert_eq!(translate("a", "i").pattern, "(?i)a");
    }

    #[test]
    fn test_empty_classes() {
        assert_eq!(translate("[]", "").pattern, NEVER);
        assert_eq!(translate("[^]", "").pattern, ANY_CHAR);
    }

    #[test]
    fn test_predefined_escapes() {
        assert_eq!(translate(r"\d", "").pattern, "[0-9]");
        assert_eq!(translate(r"\W", "").pattern, "[^0-9A-Z_a-z]");
    }

    #[test]
    fn test_backreference_wrapped() {
        assert_eq!(translate(r"(a)\1", "").pattern, r"(a)(?:\1)");
    }

    #[test]
    fn test_quantifier_normalized() {
        assert_eq!(translate("a{2,}?", "").pattern, "a{2,}?");
        assert_eq!(translate("a{3}", "").pattern, "a{3}");
    }

    #[test]
    fn test_complement_and_normalize() {
        assert_eq!(complement(DIGIT), vec![(0, 0x2F), (0x3A, MAX_CODE_POINT)]);
        assert_eq!(
            normalize(vec![(5, 9), (1, 3), (4, 4), (0xD000, 0xE100)]),
            vec![(1, 9), (0xD000, 0xD7FF), (0xE000, 0xE100)]
        );
    }

    #[test]
    fn test_name_scopes() {
        let mut scopes = NameScopes::new();
        scopes.push_group();
        assert!(scopes.declare("a"));
        scopes.next_alternative();
        assert!(scopes.declare("a"));
        scopes.pop_group();
        assert!(!scopes.declare("a"));
    }

    #[test]
    fn test_deep_group_nesting_is_not_handed_to_host() {
        let shallow = format!("{}a{}", "(?:".repeat(100), ")".repeat(100));
        assert!(translate(&shallow, "").unsupported.is_none());

        let deep = format!("{}a{}", "(".repeat(20_000), ")".repeat(20_000));
        assert_eq!(
            translate(&deep, "").unsupported,
            Some(messages::UNSUPPORTED_GROUP_NESTING)
        );
    }
}
