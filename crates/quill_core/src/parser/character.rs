//! Character classification shared by the scanner and the regexp translator.

/// Returns `true` for *LineTerminator* code points.
pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Returns `true` for *WhiteSpace* characters (line terminators excluded).
pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t'                      // CHARACTER TABULATION
        | '\x0B'                  // LINE TABULATION
        | '\x0C'                  // FORM FEED
        | ' '                     // SPACE
        | '\u{00A0}'              // NO-BREAK SPACE
        | '\u{FEFF}'              // ZERO WIDTH NO-BREAK SPACE (BOM)
        | '\u{1680}'              // OGHAM SPACE MARK
        | '\u{2000}'
            ..='\u{200A}' // EN QUAD … HAIR SPACE
        | '\u{202F}'              // NARROW NO-BREAK SPACE
        | '\u{205F}'              // MEDIUM MATHEMATICAL SPACE
        | '\u{3000}'              // IDEOGRAPHIC SPACE
    )
}

/// Returns `true` for characters that may *start* an identifier.
pub fn is_id_start(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphabetic() || c == '$' || c == '_';
    }
    // U+309B and U+309C are Other_ID_Start but not XID_Start.
    c == '\u{309B}' || c == '\u{309C}' || unicode_ident::is_xid_start(c)
}

/// Returns `true` for characters that may *continue* an identifier.
pub fn is_id_continue(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphanumeric() || c == '$' || c == '_';
    }
    c == '\u{200C}'
        || c == '\u{200D}'
        || c == '\u{309B}'
        || c == '\u{309C}'
        || unicode_ident::is_xid_continue(c)
}

/// Value of an ASCII hex digit.
pub fn hex_value(c: char) -> Option<u32> {
    c.to_digit(16)
}

/// Returns `true` for `0`–`7`.
pub fn is_octal_digit(c: char) -> bool {
    matches!(c, '0'..='7')
}

/// Returns `true` for characters in the ES2025 `SyntaxCharacter` production.
pub fn is_syntax_character(c: char) -> bool {
    matches!(
        c,
        '^' | '$' | '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_classes() {
        assert!(is_id_start('a'));
        assert!(is_id_start('$'));
        assert!(is_id_start('λ'));
        assert!(is_id_start('\u{309B}'));
        assert!(!is_id_start('1'));
        assert!(is_id_continue('1'));
        assert!(is_id_continue('\u{200C}'));
        assert!(!is_id_continue('-'));
    }

    #[test]
    fn test_whitespace_excludes_line_terminators() {
        assert!(is_whitespace('\u{FEFF}'));
        assert!(!is_whitespace('\n'));
        assert!(is_line_terminator('\u{2028}'));
    }
}
