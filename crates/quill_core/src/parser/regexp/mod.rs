//! Regular-expression literal processing.
//!
//! A literal's pattern is validated against the ECMAScript grammar (with
//! the Annex B extensions outside unicode mode) and, in
//! [`RegExpMode::Adapt`], rewritten into the dialect understood by
//! [`fancy_regex`] and compiled.
//!
//! Failures come in two flavours:
//!
//! - a [`RegExpError`] means the pattern is not a valid regular expression
//!   and the literal is a syntax error;
//! - a [`Translation`] with `conversion_error` set means the pattern is valid
//!   but the host engine cannot express it (forward references, lone
//!   surrogates, the `v` flag, …).  The literal still parses.

pub mod groups;
pub mod translate;

use fancy_regex::RegexBuilder;
use tracing::debug;

use crate::config::RegExpMode;
use translate::{Mode, Translator};

pub(crate) mod messages {
    pub const INVALID_FLAGS: &str = "Invalid regular expression flags";
    pub const NOTHING_TO_REPEAT: &str = "Nothing to repeat";
    pub const UNTERMINATED_GROUP: &str = "Unterminated group";
    pub const UNMATCHED_PAREN: &str = "Unmatched ')'";
    pub const INVALID_GROUP: &str = "Invalid group";
    pub const UNTERMINATED_CLASS: &str = "Unterminated character class";
    pub const RANGE_OUT_OF_ORDER: &str = "Range out of order in character class";
    pub const QUANTIFIER_OUT_OF_ORDER: &str = "numbers out of order in {} quantifier";
    pub const INCOMPLETE_QUANTIFIER: &str = "Incomplete quantifier";
    pub const LONE_QUANTIFIER_BRACKETS: &str = "Lone quantifier brackets";
    pub const INVALID_ESCAPE: &str = "Invalid escape";
    pub const INVALID_UNICODE_ESCAPE: &str = "Invalid Unicode escape";
    pub const INVALID_DECIMAL_ESCAPE: &str = "Invalid decimal escape";
    pub const INVALID_CLASS_ESCAPE: &str = "Invalid class escape";
    pub const INVALID_NAMED_REFERENCE: &str = "Invalid named reference";
    pub const INVALID_NAMED_CAPTURE_REFERENCED: &str = "Invalid named capture referenced";
    pub const INVALID_GROUP_NAME: &str = "Invalid capture group name";
    pub const DUPLICATE_GROUP_NAME: &str = "Duplicate capture group name";
    pub const INVALID_PROPERTY_NAME: &str = "Invalid property name";
    pub const INVALID_CHARACTER_CLASS: &str = "Invalid character class";
    pub const INVALID_SET_OPERATION: &str = "Invalid set operation in character class";
    pub const INVALID_CLASS_SET_CHARACTER: &str = "Invalid character in character class";

    pub const UNSUPPORTED_FORWARD_REFERENCE: &str =
        "back-reference to a group that has not been closed";
    pub const UNSUPPORTED_DUPLICATE_NAMES: &str = "duplicate group names across alternatives";
    pub const UNSUPPORTED_NAME_COLLISION: &str = "encoded group name collides with another group";
    pub const UNSUPPORTED_LONE_SURROGATE: &str = "lone surrogate";
    pub const UNSUPPORTED_QUANTIFIER_BOUND: &str = "quantifier bound exceeds host range";
    pub const UNSUPPORTED_UNICODE_SETS: &str = "unicode sets mode";
    pub const UNSUPPORTED_GROUP_NESTING: &str = "group nesting exceeds host limit";
}

/// A structurally invalid pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpError {
    /// Character index within the pattern.
    pub offset: usize,
    pub message: &'static str,
}

impl RegExpError {
    pub(crate) fn new(offset: usize, message: &'static str) -> Self {
        Self { offset, message }
    }
}

/// Parsed `d g i m s u v y` flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegExpFlags {
    pub has_indices: bool,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub unicode_sets: bool,
    pub sticky: bool,
}

impl RegExpFlags {
    /// Parse a flag string.  Unknown flags, repeated flags, and `u` together
    /// with `v` are rejected.
    pub fn parse(flags: &str) -> Result<Self, RegExpError> {
        let mut parsed = RegExpFlags::default();
        for (i, c) in flags.chars().enumerate() {
            let slot = match c {
                'd' => &mut parsed.has_indices,
                'g' => &mut parsed.global,
                'i' => &mut parsed.ignore_case,
                'm' => &mut parsed.multiline,
                's' => &mut parsed.dot_all,
                'u' => &mut parsed.unicode,
                'v' => &mut parsed.unicode_sets,
                'y' => &mut parsed.sticky,
                _ => return Err(RegExpError::new(i, messages::INVALID_FLAGS)),
            };
            if *slot {
                return Err(RegExpError::new(i, messages::INVALID_FLAGS));
            }
            *slot = true;
        }
        if parsed.unicode && parsed.unicode_sets {
            return Err(RegExpError::new(0, messages::INVALID_FLAGS));
        }
        Ok(parsed)
    }

    /// `u` or `v`.
    pub fn unicode_mode(&self) -> bool {
        self.unicode || self.unicode_sets
    }
}

/// Result of processing a valid pattern.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    /// Host-dialect pattern (adapt mode, when translatable).
    pub adapted: Option<String>,
    /// Compiled host regex.
    pub regex: Option<fancy_regex::Regex>,
    /// Why no compiled regex is available in adapt mode.
    pub conversion_error: Option<String>,
}

/// Validate and, in adapt mode, translate and compile a pattern.
pub fn process(
    pattern: &str,
    flags: &RegExpFlags,
    mode: RegExpMode,
    backtrack_limit: usize,
) -> Result<Translation, RegExpError> {
    if mode == RegExpMode::Skip {
        return Ok(Translation::default());
    }
    let chars: Vec<char> = pattern.chars().collect();
    let table = groups::scan_groups(&chars, flags.unicode_sets)?;
    let regexp_mode = if flags.unicode_sets {
        Mode::UnicodeSets
    } else if flags.unicode {
        Mode::Unicode
    } else {
        Mode::Legacy
    };
    let output = Translator::new(&chars, flags, regexp_mode, table).translate()?;
    if mode == RegExpMode::Validate {
        return Ok(Translation::default());
    }
    if let Some(reason) = output.unsupported {
        debug!(pattern, reason, "regexp not convertible");
        return Ok(Translation {
            adapted: None,
            regex: None,
            conversion_error: Some(reason.to_string()),
        });
    }
    match RegexBuilder::new(&output.pattern)
        .backtrack_limit(backtrack_limit)
        .build()
    {
        Ok(regex) => Ok(Translation {
            adapted: Some(output.pattern),
            regex: Some(regex),
            conversion_error: None,
        }),
        Err(e) => {
            debug!(pattern, adapted = %output.pattern, error = %e, "host regex rejected pattern");
            Ok(Translation {
                adapted: Some(output.pattern),
                regex: None,
                conversion_error: Some(e.to_string()),
            })
        }
    }
}

/// Encode a group name for the host engine.
///
/// ASCII word names not starting with `Q` pass through.  Anything else
/// becomes `Q` followed by the name with every non-alphanumeric code point
/// written as `_hex_`.
pub fn encode_group_name(name: &str) -> String {
    let is_host_name = name
        .chars()
        .next()
        .is_some_and(|c| (c.is_ascii_alphabetic() && c != 'Q') || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_host_name {
        return name.to_string();
    }
    let mut encoded = String::from("Q");
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            encoded.push(c);
        } else {
            encoded.push_str(&format!("_{:x}_", c as u32));
        }
    }
    encoded
}

/// Invert [`encode_group_name`].
pub fn decode_group_name(encoded: &str) -> Option<String> {
    let Some(body) = encoded.strip_prefix('Q') else {
        return Some(encoded.to_string());
    };
    let mut name = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '_' {
            name.push(c);
            continue;
        }
        let hex: String = chars.by_ref().take_while(|&h| h != '_').collect();
        let value = u32::from_str_radix(&hex, 16).ok()?;
        name.push(char::from_u32(value)?);
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapt(pattern: &str, flags: &str) -> Translation {
        let flags = RegExpFlags::parse(flags).unwrap();
        process(pattern, &flags, RegExpMode::Adapt, 10_000).unwrap()
    }

    fn compiled(pattern: &str, flags: &str) -> fancy_regex::Regex {
        let t = adapt(pattern, flags);
        t.regex
            .unwrap_or_else(|| panic!("{pattern}: {:?} ({:?})", t.conversion_error, t.adapted))
    }

    fn error(pattern: &str, flags: &str) -> &'static str {
        let flags = RegExpFlags::parse(flags).unwrap();
        process(pattern, &flags, RegExpMode::Validate, 10_000)
            .unwrap_err()
            .message
    }

    #[test]
    fn test_flags() {
        let f = RegExpFlags::parse("gimsuyd").unwrap();
        assert!(f.global && f.ignore_case && f.multiline && f.dot_all && f.sticky);
        assert!(f.has_indices && f.unicode_mode());
        assert!(RegExpFlags::parse("gg").is_err());
        assert!(RegExpFlags::parse("uv").is_err());
        assert!(RegExpFlags::parse("x").is_err());
    }

    #[test]
    fn test_empty_negated_class_matches_newline() {
        let re = compiled("[^]", "");
        assert!(re.is_match("\n").unwrap());
        assert!(re.is_match("x").unwrap());
    }

    #[test]
    fn test_empty_class_never_matches() {
        let re = compiled("a[]", "");
        assert!(!re.is_match("a").unwrap());
    }

    #[test]
    fn test_dot_excludes_line_terminators() {
        let re = compiled("^.$", "");
        assert!(re.is_match("x").unwrap());
        assert!(!re.is_match("\n").unwrap());
        assert!(!re.is_match("\u{2028}").unwrap());
        let re = compiled("^.$", "s");
        assert!(re.is_match("\u{2028}").unwrap());
    }

    #[test]
    fn test_multiline_anchors_at_every_line_terminator() {
        let re = compiled("^a$", "m");
        for input in ["a", "x\na", "a\ny", "x\ra\r", "x\u{2028}a\u{2029}"] {
            assert!(re.is_match(input).unwrap(), "{input:?}");
        }
        assert!(!re.is_match("ba").unwrap());
        let re = compiled("^a$", "");
        assert!(!re.is_match("x\na").unwrap());
    }

    #[test]
    fn test_digit_and_word_classes_are_ascii() {
        let re = compiled(r"^\d+$", "");
        assert!(re.is_match("0123").unwrap());
        assert!(!re.is_match("٣").unwrap());
        let re = compiled(r"^\w$", "");
        assert!(!re.is_match("é").unwrap());
        let re = compiled(r"[\W\d]", "");
        assert!(re.is_match("7").unwrap());
        assert!(re.is_match("!").unwrap());
        assert!(!re.is_match("a").unwrap());
    }

    #[test]
    fn test_word_boundary_is_ascii() {
        let re = compiled(r"\bé", "");
        assert!(!re.is_match("é").unwrap());
        let re = compiled(r"a\b", "");
        assert!(re.is_match("a b").unwrap());
        assert!(!re.is_match("ab").unwrap());
    }

    #[test]
    fn test_whitespace_class() {
        let re = compiled(r"^\s$", "");
        assert!(re.is_match("\u{FEFF}").unwrap());
        assert!(re.is_match("\u{3000}").unwrap());
        assert!(!re.is_match("\u{180E}").unwrap());
    }

    #[test]
    fn test_ignore_case() {
        let re = compiled("abc", "i");
        assert!(re.is_match("ABC").unwrap());
    }

    #[test]
    fn test_backreferences() {
        let re = compiled(r"(a)\1", "");
        assert!(re.is_match("aa").unwrap());
        let t = adapt(r"\1(a)", "");
        assert!(t.regex.is_none());
        assert_eq!(
            t.conversion_error.as_deref(),
            Some(messages::UNSUPPORTED_FORWARD_REFERENCE)
        );
        assert!(adapt(r"(a\1)", "").regex.is_none());
    }

    #[test]
    fn test_named_groups_and_references() {
        let re = compiled(r"(?<year>\d{4})-\k<year>", "");
        assert!(re.is_match("2024-2024").unwrap());
        assert!(!re.is_match("2024-2025").unwrap());
        let caps = re.captures("1999-1999").unwrap().unwrap();
        assert_eq!(caps.name("year").map(|m| m.as_str()), Some("1999"));
    }

    #[test]
    fn test_non_ascii_group_name_is_encoded() {
        let t = adapt(r"(?<$π>x)\k<$π>", "");
        let adapted = t.adapted.unwrap();
        let encoded = encode_group_name("$π");
        assert!(adapted.contains(&encoded));
        assert!(t.regex.unwrap().is_match("xx").unwrap());
    }

    #[test]
    fn test_group_name_encoding_reversible() {
        for name in ["plain", "_x1", "$", "a$b", "π_", "Q_24_", "Qabc"] {
            assert_eq!(decode_group_name(&encode_group_name(name)).unwrap(), name);
        }
    }

    #[test]
    fn test_duplicate_names() {
        assert_eq!(error("(?<a>x)(?<a>y)", ""), messages::DUPLICATE_GROUP_NAME);
        assert_eq!(error("(?<a>x)(?:(?<a>y)|z)", ""), messages::DUPLICATE_GROUP_NAME);
        assert_eq!(error("(?:(?<a>x)|(?<a>y))(?<a>z)", ""), messages::DUPLICATE_GROUP_NAME);
        let t = adapt("(?<a>x)|(?<a>y)", "");
        assert_eq!(
            t.conversion_error.as_deref(),
            Some(messages::UNSUPPORTED_DUPLICATE_NAMES)
        );
    }

    #[test]
    fn test_quantifiers() {
        let re = compiled("^a{2,3}$", "");
        assert!(re.is_match("aaa").unwrap());
        assert!(!re.is_match("aaaa").unwrap());
        assert_eq!(error("a{3,2}", ""), messages::QUANTIFIER_OUT_OF_ORDER);
        assert_eq!(error("*a", ""), messages::NOTHING_TO_REPEAT);
        assert_eq!(error("a**", ""), messages::NOTHING_TO_REPEAT);
        assert_eq!(error("^*", ""), messages::NOTHING_TO_REPEAT);
        let t = adapt("a{0,99999999999}", "");
        assert_eq!(
            t.conversion_error.as_deref(),
            Some(messages::UNSUPPORTED_QUANTIFIER_BOUND)
        );
    }

    #[test]
    fn test_lone_braces_legacy_vs_unicode() {
        let re = compiled("^a{,2}$", "");
        assert!(re.is_match("a{,2}").unwrap());
        let re = compiled("^}]$", "");
        assert!(re.is_match("}]").unwrap());
        assert_eq!(error("a{,2}", "u"), messages::INCOMPLETE_QUANTIFIER);
        assert_eq!(error("}", "u"), messages::LONE_QUANTIFIER_BRACKETS);
        assert_eq!(error("{1}", ""), messages::NOTHING_TO_REPEAT);
    }

    #[test]
    fn test_legacy_escapes() {
        let re = compiled(r"^\c$", "");
        assert!(re.is_match("\\c").unwrap());
        let re = compiled(r"^\8\q$", "");
        assert!(re.is_match("8q").unwrap());
        let re = compiled(r"^\101$", "");
        assert!(re.is_match("A").unwrap());
        assert_eq!(error(r"\q", "u"), messages::INVALID_ESCAPE);
        assert_eq!(error(r"\1", "u"), messages::INVALID_ESCAPE);
    }

    #[test]
    fn test_unicode_escapes() {
        let re = compiled(r"^\u{1F600}$", "u");
        assert!(re.is_match("😀").unwrap());
        let re = compiled(r"^😀$", "u");
        assert!(re.is_match("😀").unwrap());
        let re = compiled(r"^\x41B\cJ$", "");
        assert!(re.is_match("AB\n").unwrap());
        let t = adapt(r"\uD800", "u");
        assert_eq!(
            t.conversion_error.as_deref(),
            Some(messages::UNSUPPORTED_LONE_SURROGATE)
        );
    }

    #[test]
    fn test_class_ranges() {
        let re = compiled("^[a-c-]+$", "");
        assert!(re.is_match("ab-c").unwrap());
        assert_eq!(error("[z-a]", ""), messages::RANGE_OUT_OF_ORDER);
        assert_eq!(error(r"[\d-z]", "u"), messages::INVALID_CHARACTER_CLASS);
        let re = compiled(r"^[\d-z]+$", "");
        assert!(re.is_match("1-z").unwrap());
        let re = compiled(r"^[\b]$", "");
        assert!(re.is_match("\u{8}").unwrap());
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let re = compiled(r"^a\.b\$#&~-$", "");
        assert!(re.is_match("a.b$#&~-").unwrap());
        let re = compiled("^[.^&~]+$", "");
        assert!(re.is_match(".^&~").unwrap());
    }

    #[test]
    fn test_lookaround() {
        let re = compiled("a(?=b)", "");
        assert!(re.is_match("ab").unwrap());
        let re = compiled("(?<!x)b", "");
        assert!(!re.is_match("xb").unwrap());
        adapt("(?=a)*b", "");
        assert_eq!(error("(?=a)*", "u"), messages::NOTHING_TO_REPEAT);
        assert_eq!(error("(?<=a)*", ""), messages::NOTHING_TO_REPEAT);
    }

    #[test]
    fn test_modifier_groups() {
        let re = compiled("a(?i:b)c", "");
        assert!(re.is_match("aBc").unwrap());
        assert!(!re.is_match("ABc").unwrap());
        let re = compiled("(?s:.)", "");
        assert!(re.is_match("\n").unwrap());
        assert_eq!(error("(?ii:a)", ""), messages::INVALID_GROUP);
        assert_eq!(error("(?-:a)", ""), messages::INVALID_GROUP);
        assert_eq!(error("(?x:a)", ""), messages::INVALID_GROUP);
    }

    #[test]
    fn test_property_escapes() {
        let re = compiled(r"^\p{Lu}\P{Lu}$", "u");
        assert!(re.is_match("Aa").unwrap());
        let re = compiled(r"^\p$", "");
        assert!(re.is_match("p").unwrap());
        assert_eq!(error(r"\p{", "u"), messages::INVALID_PROPERTY_NAME);
    }

    #[test]
    fn test_unicode_sets_validated_only() {
        let t = adapt(r"[\p{L}--[a-z]]", "v");
        assert!(t.regex.is_none());
        assert_eq!(
            t.conversion_error.as_deref(),
            Some(messages::UNSUPPORTED_UNICODE_SETS)
        );
        assert_eq!(error("[a&&&b]", "v"), messages::INVALID_SET_OPERATION);
        assert_eq!(error("[(]", "v"), messages::INVALID_CLASS_SET_CHARACTER);
        assert!(adapt(r"[\q{abc|d}[x]]", "v").conversion_error.is_some());
    }

    #[test]
    fn test_validate_mode_returns_no_pattern() {
        let flags = RegExpFlags::parse("").unwrap();
        let t = process("a+", &flags, RegExpMode::Validate, 10).unwrap();
        assert!(t.adapted.is_none() && t.regex.is_none() && t.conversion_error.is_none());
    }

    #[test]
    fn test_skip_mode_accepts_anything() {
        let flags = RegExpFlags::parse("").unwrap();
        assert!(process("(", &flags, RegExpMode::Skip, 10).is_ok());
    }
}
