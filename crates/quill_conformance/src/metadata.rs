//! Test262-style front matter: the `/*--- … ---*/` block at the top of a
//! test file.
//!
//! Only the keys that decide how a file is parsed are read: the `flags`
//! list and the `phase` of a `negative` expectation.

/// How a conformance file must be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestMetadata {
    /// `Some("parse")` / `Some("resolution")` / `Some("runtime")` for
    /// negative tests.
    pub negative_phase: Option<String>,
    pub module: bool,
    pub only_strict: bool,
    pub no_strict: bool,
    pub raw: bool,
}

/// A parse mode a file is run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sloppy,
    Strict,
    Module,
}

impl TestMetadata {
    /// Extract the metadata from `source`; files without front matter
    /// are plain positive tests.
    pub fn parse(source: &str) -> Self {
        let mut meta = TestMetadata::default();
        let Some(start) = source.find("/*---") else {
            return meta;
        };
        let rest = &source[start + 5..];
        let block = match rest.find("---*/") {
            Some(end) => &rest[..end],
            None => rest,
        };

        let mut in_negative = false;
        let mut in_flag_list = false;
        for line in block.lines() {
            let indented = line.starts_with(' ') || line.starts_with('\t');
            let line = line.trim();
            if !indented {
                in_negative = false;
                in_flag_list = false;
            }
            if in_flag_list {
                if let Some(flag) = line.strip_prefix('-') {
                    meta.set_flag(flag.trim());
                    continue;
                }
            }
            if let Some(value) = line.strip_prefix("flags:") {
                let value = value.trim();
                if let Some(list) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                    for flag in list.split(',') {
                        meta.set_flag(flag.trim());
                    }
                } else {
                    in_flag_list = value.is_empty();
                }
            } else if line.starts_with("negative:") {
                in_negative = true;
            } else if in_negative && let Some(phase) = line.strip_prefix("phase:") {
                meta.negative_phase = Some(phase.trim().to_string());
            }
        }
        meta
    }

    fn set_flag(&mut self, flag: &str) {
        match flag {
            "module" => self.module = true,
            "onlyStrict" => self.only_strict = true,
            "noStrict" => self.no_strict = true,
            "raw" => self.raw = true,
            _ => {}
        }
    }

    /// Whether parsing is expected to fail.
    pub fn expects_parse_error(&self) -> bool {
        self.negative_phase.as_deref() == Some("parse")
    }

    /// The modes this file runs in: modules once, `onlyStrict` strict,
    /// `noStrict`/`raw` sloppy, everything else both.
    pub fn modes(&self) -> Vec<Mode> {
        if self.module {
            vec![Mode::Module]
        } else if self.only_strict {
            vec![Mode::Strict]
        } else if self.no_strict || self.raw {
            vec![Mode::Sloppy]
        } else {
            vec![Mode::Sloppy, Mode::Strict]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_file() {
        let meta = TestMetadata::parse("var x = 1;");
        assert_eq!(meta, TestMetadata::default());
        assert_eq!(meta.modes(), [Mode::Sloppy, Mode::Strict]);
        assert!(!meta.expects_parse_error());
    }

    #[test]
    fn test_negative_parse_with_inline_flags() {
        let source = "/*---\n\
                      description: break outside loop\n\
                      negative:\n  phase: parse\n  type: SyntaxError\n\
                      flags: [onlyStrict]\n\
                      ---*/\n\
                      break;";
        let meta = TestMetadata::parse(source);
        assert!(meta.expects_parse_error());
        assert_eq!(meta.modes(), [Mode::Strict]);
    }

    #[test]
    fn test_block_flag_list() {
        let source = "/*---\nflags:\n  - module\n  - raw\nnegative:\n  phase: runtime\n---*/";
        let meta = TestMetadata::parse(source);
        assert!(meta.module && meta.raw);
        assert!(!meta.expects_parse_error());
        assert_eq!(meta.negative_phase.as_deref(), Some("runtime"));
        assert_eq!(meta.modes(), [Mode::Module]);
    }

    #[test]
    fn test_phase_outside_negative_is_ignored() {
        let meta = TestMetadata::parse("/*---\nphase: parse\n---*/");
        assert!(!meta.expects_parse_error());
    }
}
