//! Cover grammar: parsing an expression first and deciding afterwards
//! whether it was really a pattern.
//!
//! `(a, b)` might be a sequence expression or the parameters of
//! `(a, b) => a + b`; `[a, b]` might be an array literal or the target of
//! `[a, b] = pair`.  The parser always builds the expression, tracking in
//! [`CoverState`] whether it could still be reinterpreted, and converts it
//! with [`TryIntoPattern`] once the following token settles the question.

use crate::error::{ErrorKind, QuillError, QuillResult};
use crate::parser::Parser;
use crate::parser::ast::{
    ArrayPat, AssignOp, AssignPat, AssignPatProp, Expr, KeyValuePatProp, ObjectPat,
    ObjectPatProp, ObjectProp, Pat, PropKey, PropValue, RestElement,
};
use crate::parser::context::{CoverState, ParsedParameters};
use crate::parser::messages;
use crate::parser::parse::with_stack;
use crate::parser::token::Position;

/// Non-mutating reinterpretation of an expression as a pattern.  The new
/// nodes copy the locations of the expressions they replace.
pub trait TryIntoPattern {
    /// The equivalent pattern, or `None` if this expression has no pattern
    /// reading.
    fn try_into_pattern(&self) -> Option<Pat>;
}

impl TryIntoPattern for Expr {
    fn try_into_pattern(&self) -> Option<Pat> {
        with_stack(|| self.expr_into_pattern())
    }
}

impl Expr {
    fn expr_into_pattern(&self) -> Option<Pat> {
        match self {
            Expr::Ident(id) => Some(Pat::Ident(id.clone())),
            Expr::Member(_) => Some(Pat::Expr(Box::new(self.clone()))),
            Expr::Spread(spread) => Some(Pat::Rest(Box::new(RestElement {
                loc: spread.loc,
                argument: Box::new(spread.argument.try_into_pattern()?),
            }))),
            Expr::Array(array) => {
                let last = array.elements.len().saturating_sub(1);
                let mut elements = Vec::with_capacity(array.elements.len());
                for (i, element) in array.elements.iter().enumerate() {
                    match element {
                        None => elements.push(None),
                        Some(Expr::Spread(_)) if i != last => return None,
                        Some(expr) => elements.push(Some(expr.try_into_pattern()?)),
                    }
                }
                Some(Pat::Array(Box::new(ArrayPat {
                    loc: array.loc,
                    elements,
                })))
            }
            Expr::Object(object) => {
                let mut properties = Vec::with_capacity(object.properties.len());
                for property in &object.properties {
                    properties.push(object_prop_into_pattern(property)?);
                }
                Some(Pat::Object(Box::new(ObjectPat {
                    loc: object.loc,
                    properties,
                })))
            }
            Expr::Assign(assign) if assign.op == AssignOp::Assign => {
                Some(Pat::Assign(Box::new(AssignPat {
                    loc: assign.loc,
                    left: Box::new(assign.left.clone()),
                    right: assign.right.clone(),
                })))
            }
            _ => None,
        }
    }
}

fn object_prop_into_pattern(property: &ObjectProp) -> Option<ObjectPatProp> {
    match property {
        ObjectProp::Spread(spread) => Some(ObjectPatProp::Rest(RestElement {
            loc: spread.loc,
            argument: Box::new(spread.argument.try_into_pattern()?),
        })),
        ObjectProp::Finalizer(_) => None,
        ObjectProp::Prop(prop) => match &prop.value {
            PropValue::Value(value) => Some(ObjectPatProp::KeyValue(KeyValuePatProp {
                loc: prop.loc,
                key: prop.key.clone(),
                is_computed: prop.is_computed,
                value: value.try_into_pattern()?,
            })),
            PropValue::Shorthand | PropValue::CoverInitializedName(_) => {
                let PropKey::Ident(key) = &prop.key else {
                    return None;
                };
                let value = match &prop.value {
                    PropValue::CoverInitializedName(init) => Some(init.clone()),
                    _ => None,
                };
                Some(ObjectPatProp::Assign(AssignPatProp {
                    loc: prop.loc,
                    key: key.clone(),
                    value,
                }))
            }
            PropValue::Get(_) | PropValue::Set(_) | PropValue::Method(_) => None,
        },
    }
}

/// `true` when `pat` only binds identifiers (no member targets).
pub fn is_binding_pattern(pat: &Pat) -> bool {
    match pat {
        Pat::Ident(_) => true,
        Pat::Expr(_) => false,
        Pat::Rest(rest) => is_binding_pattern(&rest.argument),
        Pat::Assign(assign) => is_binding_pattern(&assign.left),
        Pat::Array(array) => array.elements.iter().flatten().all(is_binding_pattern),
        Pat::Object(object) => object.properties.iter().all(|p| match p {
            ObjectPatProp::KeyValue(kv) => is_binding_pattern(&kv.value),
            ObjectPatProp::Assign(_) => true,
            ObjectPatProp::Rest(rest) => is_binding_pattern(&rest.argument),
        }),
    }
}

impl<'src> Parser<'src> {
    /// Run `f` with a fresh cover state.  A `{ a = 1 }` left unresolved by
    /// `f` is an error; the outer state is restored afterwards.
    pub(super) fn isolate_cover_grammar<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> QuillResult<T>,
    ) -> QuillResult<T> {
        let saved = std::mem::replace(&mut self.cover, CoverState::permissive());
        let result = f(self)?;
        if let Some(pos) = self.cover.first_cover_initialized_name_error.take() {
            return Err(self.cover_initialized_name_error(pos));
        }
        self.cover = saved;
        Ok(result)
    }

    /// A `{ a = 1 }` at `pos` that never became a pattern.
    pub(super) fn cover_initialized_name_error(&self, pos: Position) -> QuillError {
        self.error_at(pos, &messages::unexpected_token("="), ErrorKind::Syntax)
    }

    /// Run `f` with a fresh cover state, then merge: the flags are ANDed
    /// into the outer ones and the earliest deferred error is kept.
    pub(super) fn inherit_cover_grammar<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> QuillResult<T>,
    ) -> QuillResult<T> {
        let saved = std::mem::replace(&mut self.cover, CoverState::permissive());
        let result = f(self)?;
        self.cover.is_binding_element &= saved.is_binding_element;
        self.cover.is_assignment_target &= saved.is_assignment_target;
        if saved.first_cover_initialized_name_error.is_some() {
            self.cover.first_cover_initialized_name_error =
                saved.first_cover_initialized_name_error;
        }
        Ok(result)
    }

    /// Left-hand side of `=`.  An expression with no pattern reading is
    /// kept as [`Pat::Expr`] after an invalid-target error.
    pub(super) fn reinterpret_as_assignment_target(&mut self, expr: Expr) -> QuillResult<Pat> {
        let pattern = match &expr {
            Expr::Assign(_) | Expr::Spread(_) => None,
            other => other.try_into_pattern(),
        };
        match pattern {
            Some(pattern) => Ok(pattern),
            None => {
                if self.cover.is_assignment_target {
                    self.tolerate_at(
                        expr.loc().start,
                        messages::INVALID_LHS_IN_ASSIGNMENT,
                        ErrorKind::Syntax,
                    )?;
                }
                Ok(Pat::Expr(Box::new(expr)))
            }
        }
    }

    /// Target of a compound assignment or update: identifiers and member
    /// expressions only.
    pub(super) fn simple_assignment_target(expr: Expr) -> Pat {
        match expr {
            Expr::Ident(id) => Pat::Ident(id),
            other => Pat::Expr(Box::new(other)),
        }
    }

    /// Left-hand side of `for-in` / `for-of` / `foreach`, already checked
    /// for validity by the caller.
    pub(super) fn reinterpret_as_for_target(&mut self, expr: Expr) -> Pat {
        self.cover.first_cover_initialized_name_error = None;
        if matches!(expr, Expr::Assign(_)) {
            return Pat::Expr(Box::new(expr));
        }
        match expr.try_into_pattern() {
            Some(pattern) => pattern,
            None => Pat::Expr(Box::new(expr)),
        }
    }

    /// Turn the expressions collected inside `( … )` (or the single
    /// identifier before `=>`) into a formal parameter list.  Anything that
    /// is not a binding pattern is an "Unexpected token" at the lookahead.
    pub(super) fn reinterpret_as_cover_formals_list(
        &mut self,
        candidates: Vec<Expr>,
        is_async: bool,
    ) -> QuillResult<ParsedParameters> {
        let mut params = ParsedParameters::new(None);
        for candidate in candidates {
            if is_async && matches!(&candidate, Expr::Ident(id) if id.name == "await") {
                return Err(self.unexpected(&self.lookahead));
            }
            if self.flags.allow_yield
                && matches!(&candidate, Expr::Assign(a) if matches!(*a.right, Expr::Yield(_)))
            {
                return Err(self.error_at(
                    candidate.loc().start,
                    messages::YIELD_IN_PARAMETERS,
                    ErrorKind::Syntax,
                ));
            }
            let Some(pattern) = candidate.try_into_pattern() else {
                return Err(self.unexpected(&self.lookahead));
            };
            if !is_binding_pattern(&pattern) {
                return Err(self.unexpected(&self.lookahead));
            }
            if let Pat::Rest(rest) = &pattern
                && matches!(*rest.argument, Pat::Assign(_))
            {
                return Err(self.error_at(
                    rest.argument.loc().start,
                    messages::DEFAULT_REST_PARAMETER,
                    ErrorKind::Syntax,
                ));
            }
            let mut names = Vec::new();
            pattern.bound_names(&mut names);
            for name in names {
                params.validate_name(&name.name, name.loc.start, self.flags.strict);
            }
            params.simple &= matches!(pattern, Pat::Ident(_));
            params.params.push(pattern);
        }
        if let Some(duplicate) = &params.duplicate {
            return Err(self.error_at(
                duplicate.position,
                messages::DUPLICATE_PARAMETER,
                ErrorKind::Syntax,
            ));
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserOptions;

    fn expr(source: &str) -> Expr {
        Parser::new(source, ParserOptions::new())
            .parse_expression()
            .unwrap()
    }

    #[test]
    fn test_array_literal_into_pattern() {
        let pattern = expr("[a, , ...rest]").try_into_pattern().unwrap();
        let Pat::Array(array) = &pattern else {
            panic!("expected array pattern, got {pattern:?}");
        };
        assert_eq!(array.elements.len(), 3);
        assert!(array.elements[1].is_none());
        assert!(matches!(array.elements[2], Some(Pat::Rest(_))));
        assert_eq!(array.loc.start.offset, 0);
        assert_eq!(array.loc.end.offset, 14);
    }

    #[test]
    fn test_object_literal_into_pattern() {
        let pattern = expr("{a, b: [c], d: e = 1, ...f}").try_into_pattern().unwrap();
        let mut names = Vec::new();
        pattern.bound_names(&mut names);
        let names: Vec<_> = names.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a", "c", "e", "f"]);
        assert!(is_binding_pattern(&pattern));
    }

    #[test]
    fn test_rest_must_be_last() {
        assert!(expr("[...a, b]").try_into_pattern().is_none());
    }

    #[test]
    fn test_members_are_targets_but_not_bindings() {
        let pattern = expr("[a.b, c[0]]").try_into_pattern().unwrap();
        assert!(!is_binding_pattern(&pattern));
    }

    #[test]
    fn test_non_patterns() {
        for source in ["a + b", "f()", "{ m() {} }", "1", "`t`"] {
            assert!(expr(source).try_into_pattern().is_none(), "{source}");
        }
    }
}
