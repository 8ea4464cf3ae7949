//! Capture-group pre-scan.
//!
//! Back-references may name a group that appears later in the pattern, so
//! the group table is built before translation starts.  The pre-scan also
//! rejects unbalanced parentheses and unterminated classes early.

use super::{RegExpError, messages};
use crate::parser::character::{hex_value, is_id_continue, is_id_start};

/// What an opening parenthesis introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// `( … )`
    Capturing,
    /// `(?<name> … )`
    NamedCapturing,
    /// `(?: … )`
    NonCapturing,
    /// `(?ims-ims: … )`
    Modifiers,
    /// `(?= … )`
    Lookahead,
    /// `(?! … )`
    NegativeLookahead,
    /// `(?<= … )`
    Lookbehind,
    /// `(?<! … )`
    NegativeLookbehind,
}

impl GroupKind {
    pub fn is_capturing(self) -> bool {
        matches!(self, GroupKind::Capturing | GroupKind::NamedCapturing)
    }
}

/// One capturing group, in pattern order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureGroup {
    /// Character index of the opening `(`.
    pub offset: usize,
    /// Group name, for named groups.
    pub name: Option<String>,
}

/// All capturing groups of a pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTable {
    pub groups: Vec<CaptureGroup>,
}

impl GroupTable {
    /// Number of capturing groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Whether any group is named.
    pub fn has_named_groups(&self) -> bool {
        self.groups.iter().any(|g| g.name.is_some())
    }

    /// 0-based indices of every group called `name`.
    pub fn indices_of(&self, name: &str) -> Vec<usize> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.name.as_deref() == Some(name))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether some name is used by more than one group.
    pub fn has_duplicate_names(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.groups
            .iter()
            .filter_map(|g| g.name.as_deref())
            .any(|name| !seen.insert(name))
    }
}

/// Classify the group opened at `chars[pos] == '('`.
pub fn classify(chars: &[char], pos: usize) -> GroupKind {
    if chars.get(pos + 1) != Some(&'?') {
        return GroupKind::Capturing;
    }
    match (chars.get(pos + 2), chars.get(pos + 3)) {
        (Some(':'), _) => GroupKind::NonCapturing,
        (Some('='), _) => GroupKind::Lookahead,
        (Some('!'), _) => GroupKind::NegativeLookahead,
        (Some('<'), Some('=')) => GroupKind::Lookbehind,
        (Some('<'), Some('!')) => GroupKind::NegativeLookbehind,
        (Some('<'), _) => GroupKind::NamedCapturing,
        _ => GroupKind::Modifiers,
    }
}

/// Build the capture-group table for `chars`.
pub fn scan_groups(chars: &[char], unicode_sets: bool) -> Result<GroupTable, RegExpError> {
    let mut table = GroupTable::default();
    let mut depth = 0usize;
    let mut class_depth = 0usize;
    let mut pos = 0;
    while pos < chars.len() {
        match chars[pos] {
            '\\' => pos += 1,
            '[' if class_depth == 0 || unicode_sets => class_depth += 1,
            ']' if class_depth > 0 => class_depth -= 1,
            _ if class_depth > 0 => {}
            '(' => {
                depth += 1;
                match classify(chars, pos) {
                    GroupKind::Capturing => table.groups.push(CaptureGroup {
                        offset: pos,
                        name: None,
                    }),
                    GroupKind::NamedCapturing => {
                        let (name, end) = parse_group_name(chars, pos + 3)?;
                        table.groups.push(CaptureGroup {
                            offset: pos,
                            name: Some(name),
                        });
                        pos = end - 1;
                    }
                    _ => {}
                }
            }
            ')' => {
                if depth == 0 {
                    return Err(RegExpError::new(pos, messages::UNMATCHED_PAREN));
                }
                depth -= 1;
            }
            _ => {}
        }
        pos += 1;
    }
    if class_depth > 0 {
        return Err(RegExpError::new(chars.len(), messages::UNTERMINATED_CLASS));
    }
    if depth > 0 {
        return Err(RegExpError::new(chars.len(), messages::UNTERMINATED_GROUP));
    }
    Ok(table)
}

/// Parse a *GroupName* body starting at `start` (just after `<`).
///
/// Returns the decoded name and the index just past the closing `>`.
pub fn parse_group_name(chars: &[char], start: usize) -> Result<(String, usize), RegExpError> {
    let mut name = String::new();
    let mut pos = start;
    loop {
        let c = match chars.get(pos) {
            Some('>') => break,
            Some('\\') => {
                let (c, next) = parse_name_escape(chars, pos + 1)
                    .ok_or_else(|| RegExpError::new(pos, messages::INVALID_GROUP_NAME))?;
                pos = next;
                c
            }
            Some(&c) => {
                pos += 1;
                c
            }
            None => return Err(RegExpError::new(pos, messages::INVALID_GROUP_NAME)),
        };
        let valid = if name.is_empty() {
            is_id_start(c)
        } else {
            is_id_continue(c)
        };
        if !valid {
            return Err(RegExpError::new(pos, messages::INVALID_GROUP_NAME));
        }
        name.push(c);
    }
    if name.is_empty() {
        return Err(RegExpError::new(pos, messages::INVALID_GROUP_NAME));
    }
    Ok((name, pos + 1))
}

/// Decode `uXXXX`, a surrogate pair of those, or `u{…}` after a backslash.
fn parse_name_escape(chars: &[char], pos: usize) -> Option<(char, usize)> {
    if chars.get(pos) != Some(&'u') {
        return None;
    }
    if chars.get(pos + 1) == Some(&'{') {
        let mut value = 0u32;
        let mut p = pos + 2;
        while let Some(d) = chars.get(p).and_then(|&c| hex_value(c)) {
            value = value.checked_mul(16)?.checked_add(d)?;
            p += 1;
        }
        if p == pos + 2 || chars.get(p) != Some(&'}') {
            return None;
        }
        return char::from_u32(value).map(|c| (c, p + 1));
    }
    let high = hex4(chars, pos + 1)?;
    if (0xD800..0xDC00).contains(&high)
        && chars.get(pos + 5) == Some(&'\\')
        && chars.get(pos + 6) == Some(&'u')
        && let Some(low) = hex4(chars, pos + 7)
        && (0xDC00..0xE000).contains(&low)
    {
        let c = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        return char::from_u32(c).map(|c| (c, pos + 11));
    }
    char::from_u32(high).map(|c| (c, pos + 5))
}

/// Four hex digits at `pos`.
pub fn hex4(chars: &[char], pos: usize) -> Option<u32> {
    (0..4).try_fold(0u32, |acc, i| {
        chars
            .get(pos + i)
            .and_then(|&c| hex_value(c))
            .map(|d| acc * 16 + d)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(p: &str) -> Result<GroupTable, RegExpError> {
        let chars: Vec<char> = p.chars().collect();
        scan_groups(&chars, false)
    }

    #[test]
    fn test_counts_capturing_groups_only() {
        let table = scan(r"(a)(?:b)(?=c)(?<name>d)(?<!e)").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.groups[0].offset, 0);
        assert_eq!(table.groups[1].name.as_deref(), Some("name"));
    }

    #[test]
    fn test_parens_inside_class_and_escapes_ignored() {
        let table = scan(r"[(]\((a)").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(scan("a)").unwrap_err().message, messages::UNMATCHED_PAREN);
        assert_eq!(scan("(a").unwrap_err().message, messages::UNTERMINATED_GROUP);
        assert_eq!(scan("[a").unwrap_err().message, messages::UNTERMINATED_CLASS);
    }

    #[test]
    fn test_group_name_escapes() {
        let table = scan(r"(?<ab>x)(?<\u{62}>y)").unwrap();
        assert_eq!(table.indices_of("ab"), vec![0]);
        assert_eq!(table.indices_of("b"), vec![1]);
    }

    #[test]
    fn test_invalid_group_name() {
        assert!(scan("(?<1a>x)").is_err());
        assert!(scan("(?<>x)").is_err());
    }

    #[test]
    fn test_duplicate_names_detected() {
        let table = scan("(?<a>x)|(?<a>y)").unwrap();
        assert!(table.has_duplicate_names());
        assert_eq!(table.indices_of("a"), vec![0, 1]);
    }

    #[test]
    fn test_classify() {
        let chars: Vec<char> = "(?<=a)".chars().collect();
        assert_eq!(classify(&chars, 0), GroupKind::Lookbehind);
        let chars: Vec<char> = "(?i:a)".chars().collect();
        assert_eq!(classify(&chars, 0), GroupKind::Modifiers);
    }
}
