//! Grammar context carried by the [`Parser`](super::Parser).
//!
//! The context is split three ways:
//!
//! - [`GrammarFlags`]: a `Copy` record saved and restored wholesale around
//!   every grammar boundary (function bodies, parameter lists, loops, …).
//! - [`CoverState`]: the cover-grammar bookkeeping that decides whether the
//!   expression just parsed may still be reinterpreted as a pattern.
//! - [`LabelSet`]: the labels visible to `break` / `continue`, swapped out
//!   on entry to a function body.

use smallvec::SmallVec;

use crate::parser::ast::Pat;
use crate::parser::token::Position;

/// Grammar parameters of the production being parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrammarFlags {
    /// Strict mode code.
    pub strict: bool,
    /// Module code (always strict; `await` reserved).
    pub is_module: bool,
    /// `in` is a relational operator here (false in `for` heads).
    pub allow_in: bool,
    /// `yield` starts a yield expression (generator bodies).
    pub allow_yield: bool,
    /// `await` starts an await expression (async bodies, module top level).
    pub is_async: bool,
    /// A `"use strict"` directive is legal (simple parameter list).
    pub allow_strict_directive: bool,
    pub in_function_body: bool,
    pub in_iteration: bool,
    pub in_switch: bool,
    pub in_class_body: bool,
    /// Inside a formal parameter list.
    pub in_parameters: bool,
    /// `super(…)` is legal (derived-class constructors).
    pub allow_super_call: bool,
    /// `super.x` / `super[x]` is legal (methods, accessors, fields).
    pub allow_super_property: bool,
    /// `new.target` is legal (non-arrow functions, field initializers).
    pub allow_new_target: bool,
}

impl GrammarFlags {
    /// Flags for the top level of a script or module.
    pub fn top_level(strict: bool, is_module: bool) -> Self {
        Self {
            strict: strict || is_module,
            is_module,
            allow_in: true,
            is_async: is_module,
            allow_strict_directive: true,
            ..Self::default()
        }
    }
}

/// Cover-grammar state of the expression most recently parsed.
#[derive(Debug, Clone)]
pub struct CoverState {
    /// The expression can still become a binding pattern.
    pub is_binding_element: bool,
    /// The expression can still become an assignment target.
    pub is_assignment_target: bool,
    /// Start of the `=` in the first `{ a = 1 }` seen; an error unless the
    /// enclosing literal turns out to be a pattern.
    pub first_cover_initialized_name_error: Option<Position>,
}

impl Default for CoverState {
    fn default() -> Self {
        Self::permissive()
    }
}

impl CoverState {
    /// Everything allowed, nothing deferred.
    pub fn permissive() -> Self {
        Self {
            is_binding_element: true,
            is_assignment_target: true,
            first_cover_initialized_name_error: None,
        }
    }

    /// Mark the current expression as neither a pattern nor a target.
    pub fn reject(&mut self) {
        self.is_binding_element = false;
        self.is_assignment_target = false;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Labels
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Label {
    name: String,
    /// Labels an iteration statement, so `continue label` is legal.
    is_loop: bool,
    /// Offset of the labelled body; chained labels share it.
    body_start: usize,
}

/// The labels enclosing the current statement.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    labels: SmallVec<[Label; 4]>,
}

impl LabelSet {
    pub fn contains(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    /// Whether `continue name` may target this label.
    pub fn is_loop_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name && l.is_loop)
    }

    /// Push a label whose body starts at `body_start`.  When the body is a
    /// loop every label chained onto the same body becomes a loop label.
    pub fn push(&mut self, name: String, body_start: usize, is_loop: bool) {
        if is_loop {
            for label in self.labels.iter_mut().rev() {
                if label.body_start != body_start {
                    break;
                }
                label.is_loop = true;
            }
        }
        self.labels.push(Label {
            name,
            is_loop,
            body_start,
        });
    }

    pub fn pop(&mut self) {
        self.labels.pop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// A violation recorded while strictness was still unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredError {
    /// Start of the offending token.
    pub position: Position,
    pub message: &'static str,
}

/// Result of parsing a formal parameter list.
#[derive(Debug, Clone, Default)]
pub struct ParsedParameters {
    pub params: Vec<Pat>,
    /// Every parameter is a plain identifier.
    pub simple: bool,
    /// Bound names in order of appearance.
    pub param_names: SmallVec<[String; 8]>,
    /// Reported only if the function is strict.
    pub stricted: Option<DeferredError>,
    /// Reported (fatally) only if the function is strict.
    pub first_restricted: Option<DeferredError>,
    /// First repeated name; fatal for arrows, methods, strict code and
    /// non-simple lists.
    pub duplicate: Option<DeferredError>,
}

impl ParsedParameters {
    pub fn new(first_restricted: Option<DeferredError>) -> Self {
        Self {
            simple: true,
            first_restricted,
            ..Self::default()
        }
    }

    /// Record a bound parameter name, classifying it for later strictness
    /// checks.
    pub fn validate_name(&mut self, name: &str, position: Position, strict: bool) {
        use crate::parser::messages;
        use crate::parser::token::{is_restricted_word, is_strict_mode_reserved_word};

        let seen = self.param_names.iter().any(|n| n == name);
        if seen && self.duplicate.is_none() {
            self.duplicate = Some(DeferredError {
                position,
                message: messages::DUPLICATE_PARAMETER,
            });
        }
        if strict {
            if is_restricted_word(name) {
                self.stricted = Some(DeferredError {
                    position,
                    message: messages::STRICT_PARAM_NAME,
                });
            }
            if seen {
                self.stricted = Some(DeferredError {
                    position,
                    message: messages::STRICT_PARAM_DUPE,
                });
            }
        } else if self.first_restricted.is_none() {
            if is_restricted_word(name) {
                self.first_restricted = Some(DeferredError {
                    position,
                    message: messages::STRICT_PARAM_NAME,
                });
            } else if is_strict_mode_reserved_word(name) {
                self.first_restricted = Some(DeferredError {
                    position,
                    message: messages::STRICT_RESERVED_WORD,
                });
            } else if seen && self.stricted.is_none() {
                self.stricted = Some(DeferredError {
                    position,
                    message: messages::STRICT_PARAM_DUPE,
                });
            }
        }
        self.param_names.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::messages;

    fn pos(offset: usize) -> Position {
        Position {
            offset,
            line: 1,
            column: offset as u32 + 1,
        }
    }

    #[test]
    fn test_top_level_flags() {
        let script = GrammarFlags::top_level(false, false);
        assert!(!script.strict && script.allow_in && !script.is_async);
        let module = GrammarFlags::top_level(false, true);
        assert!(module.strict && module.is_async);
    }

    #[test]
    fn test_chained_labels_become_loop_labels() {
        let mut labels = LabelSet::default();
        labels.push("outer".into(), 0, false);
        labels.push("a".into(), 10, false);
        labels.push("b".into(), 10, true);
        assert!(labels.is_loop_label("a"));
        assert!(labels.is_loop_label("b"));
        assert!(!labels.is_loop_label("outer"));
        labels.pop();
        assert!(!labels.contains("b"));
        assert!(labels.contains("a") && labels.contains("outer"));
    }

    #[test]
    fn test_restricted_name_is_deferred_in_sloppy_code() {
        let mut params = ParsedParameters::new(None);
        params.validate_name("eval", pos(11), false);
        let deferred = params.first_restricted.clone().unwrap();
        assert_eq!(deferred.position.offset, 11);
        assert_eq!(deferred.message, messages::STRICT_PARAM_NAME);
        assert!(params.stricted.is_none());
    }

    #[test]
    fn test_duplicate_names() {
        let mut params = ParsedParameters::new(None);
        params.validate_name("a", pos(0), false);
        params.validate_name("a", pos(3), false);
        assert_eq!(params.duplicate.as_ref().map(|d| d.position.offset), Some(3));
        assert_eq!(
            params.stricted.as_ref().map(|d| d.message),
            Some(messages::STRICT_PARAM_DUPE)
        );

        let mut strict = ParsedParameters::new(None);
        strict.validate_name("arguments", pos(0), true);
        assert_eq!(
            strict.stricted.as_ref().map(|d| d.message),
            Some(messages::STRICT_PARAM_NAME)
        );
        assert!(strict.first_restricted.is_none());
    }
}
