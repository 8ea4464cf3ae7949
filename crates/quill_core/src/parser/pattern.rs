//! Binding patterns: the targets of declarations, parameters and `catch`.
//!
//! Unlike assignment targets, which go through the cover grammar, binding
//! patterns are known to be patterns from their first token and are parsed
//! directly.

use crate::error::{ErrorKind, QuillResult};
use crate::parser::Parser;
use crate::parser::ast::{
    ArrayPat, AssignPat, AssignPatProp, Ident, KeyValuePatProp, NodeType, ObjectPat,
    ObjectPatProp, Pat, PropKey, RestElement, VarKind,
};
use crate::parser::messages;
use crate::parser::token::{Token, TokenKind, is_restricted_word, is_strict_mode_reserved_word};

impl<'src> Parser<'src> {
    /// `BindingIdentifier | BindingPattern`.  `kind` is the declaration
    /// keyword, or `None` for parameters and `catch`.
    pub(super) fn parse_binding_pattern(&mut self, kind: Option<VarKind>) -> QuillResult<Pat> {
        match self.lookahead.kind {
            TokenKind::LeftBracket => self.descend(|p| p.parse_array_binding_pattern(kind)),
            TokenKind::LeftBrace => self.descend(|p| p.parse_object_binding_pattern(kind)),
            _ => Ok(Pat::Ident(self.parse_binding_identifier(kind)?)),
        }
    }

    /// A binding pattern with an optional `= default`.
    pub(super) fn parse_binding_pattern_with_default(
        &mut self,
        kind: Option<VarKind>,
    ) -> QuillResult<Pat> {
        let start = self.create_node();
        let pattern = self.parse_binding_pattern(kind)?;
        if !self.matches(TokenKind::Equal) {
            return Ok(pattern);
        }
        self.next_token()?;
        let right = self.isolate_cover_grammar(|p| p.parse_assignment_expression())?;
        let loc = self.finalize(start, NodeType::AssignmentPattern);
        Ok(Pat::Assign(Box::new(AssignPat {
            loc,
            left: Box::new(pattern),
            right: Box::new(right),
        })))
    }

    /// `...pattern`; the caller checks that it comes last.
    pub(super) fn parse_binding_rest_element(
        &mut self,
        kind: Option<VarKind>,
    ) -> QuillResult<RestElement> {
        let start = self.create_node();
        self.expect(TokenKind::DotDotDot)?;
        let argument = self.parse_binding_pattern(kind)?;
        let loc = self.finalize(start, NodeType::RestElement);
        Ok(RestElement {
            loc,
            argument: Box::new(argument),
        })
    }

    fn parse_array_binding_pattern(&mut self, kind: Option<VarKind>) -> QuillResult<Pat> {
        let start = self.create_node();
        self.expect(TokenKind::LeftBracket)?;
        let mut elements = Vec::new();
        while !self.matches(TokenKind::RightBracket) {
            if self.matches(TokenKind::Comma) {
                self.next_token()?;
                elements.push(None);
                continue;
            }
            if self.matches(TokenKind::DotDotDot) {
                let rest = self.parse_binding_rest_element(kind)?;
                elements.push(Some(Pat::Rest(Box::new(rest))));
                break;
            }
            elements.push(Some(self.parse_binding_pattern_with_default(kind)?));
            if !self.matches(TokenKind::RightBracket) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightBracket)?;
        let loc = self.finalize(start, NodeType::ArrayPattern);
        Ok(Pat::Array(Box::new(ArrayPat { loc, elements })))
    }

    fn parse_object_binding_pattern(&mut self, kind: Option<VarKind>) -> QuillResult<Pat> {
        let start = self.create_node();
        self.expect(TokenKind::LeftBrace)?;
        let mut properties = Vec::new();
        while !self.matches(TokenKind::RightBrace) {
            if self.matches(TokenKind::DotDotDot) {
                let rest = self.parse_binding_rest_element(kind)?;
                properties.push(ObjectPatProp::Rest(rest));
                break;
            }
            properties.push(self.parse_binding_property(kind)?);
            if !self.matches(TokenKind::RightBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        let loc = self.finalize(start, NodeType::ObjectPattern);
        Ok(Pat::Object(Box::new(ObjectPat { loc, properties })))
    }

    fn parse_binding_property(&mut self, kind: Option<VarKind>) -> QuillResult<ObjectPatProp> {
        let start = self.create_node();
        let token = self.lookahead.clone();
        let (key, is_computed) = self.parse_object_property_key(false)?;

        if !is_computed
            && !self.matches(TokenKind::Colon)
            && let PropKey::Ident(name) = &key
        {
            // Shorthand: `{ a }` or `{ a = 1 }`.
            self.validate_binding_token(&token, kind)?;
            let value = if self.matches(TokenKind::Equal) {
                self.next_token()?;
                Some(Box::new(
                    self.isolate_cover_grammar(|p| p.parse_assignment_expression())?,
                ))
            } else {
                None
            };
            let loc = self.finalize(start, NodeType::Property);
            return Ok(ObjectPatProp::Assign(AssignPatProp {
                loc,
                key: name.clone(),
                value,
            }));
        }

        self.expect(TokenKind::Colon)?;
        let value = self.parse_binding_pattern_with_default(kind)?;
        let loc = self.finalize(start, NodeType::Property);
        Ok(ObjectPatProp::KeyValue(KeyValuePatProp {
            loc,
            key,
            is_computed,
            value,
        }))
    }

    /// A single bound name.
    pub(super) fn parse_binding_identifier(&mut self, kind: Option<VarKind>) -> QuillResult<Ident> {
        let token = self.lookahead.clone();
        self.validate_binding_token(&token, kind)?;
        self.next_token()?;
        Ok(self.finalize_ident(&token))
    }

    /// Whether `token` may be bound here.  Keywords are fatal; strict-mode
    /// and contextual violations are tolerated.
    pub(super) fn validate_binding_token(
        &mut self,
        token: &Token,
        kind: Option<VarKind>,
    ) -> QuillResult<()> {
        match token.kind {
            TokenKind::Identifier => {
                let name = token.str_value();
                if self.flags.strict && is_strict_mode_reserved_word(name) {
                    self.tolerate_at(
                        token.span.start,
                        messages::STRICT_RESERVED_WORD,
                        ErrorKind::Strict,
                    )?;
                } else if self.flags.strict && kind.is_some() && is_restricted_word(name) {
                    self.tolerate_at(
                        token.span.start,
                        messages::STRICT_VAR_NAME,
                        ErrorKind::Strict,
                    )?;
                } else if (self.flags.is_module || self.flags.is_async)
                    && token.is_contextual("await")
                {
                    self.tolerate_unexpected(token)?;
                }
            }
            TokenKind::Yield => {
                if self.flags.strict {
                    self.tolerate_unexpected(token)?;
                } else if self.flags.allow_yield {
                    return Err(self.unexpected(token));
                }
            }
            TokenKind::Let => {
                if self.flags.strict {
                    self.tolerate_unexpected(token)?;
                } else if matches!(kind, Some(VarKind::Let | VarKind::Const)) {
                    self.tolerate_at(
                        token.span.start,
                        messages::LET_IN_LEXICAL_BINDING,
                        ErrorKind::Syntax,
                    )?;
                }
            }
            _ => return Err(self.unexpected(token)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::parser::Parser;
    use crate::parser::ast::{ObjectPatProp, Pat, ProgramItem, Stmt, VarDecl};
    use crate::parser::messages;

    fn declaration(source: &str) -> VarDecl {
        let program = Parser::new(source, ParserOptions::new())
            .parse_script(false)
            .unwrap_or_else(|e| panic!("{source}: {e}"));
        match program.body.into_iter().next() {
            Some(ProgramItem::Stmt(Stmt::VarDecl(decl))) => decl,
            other => panic!("expected a declaration, got {other:?}"),
        }
    }

    fn error(source: &str, strict: bool) -> String {
        let err = Parser::new(source, ParserOptions::new())
            .parse_script(strict)
            .expect_err(source);
        err.as_parse_error().unwrap().description.clone()
    }

    fn names(pat: &Pat) -> Vec<String> {
        let mut out = Vec::new();
        pat.bound_names(&mut out);
        out.iter().map(|i| i.name.clone()).collect()
    }

    #[test]
    fn test_nested_patterns() {
        let decl = declaration("var [a, , [b], {c, d: {e}, ...f}, ...g] = x;");
        let id = &decl.declarators[0].id;
        assert_eq!(names(id), ["a", "b", "c", "e", "f", "g"]);
        let Pat::Array(array) = id else { panic!() };
        assert_eq!(array.elements.len(), 5);
        assert!(array.elements[1].is_none());
    }

    #[test]
    fn test_defaults() {
        let decl = declaration("let {a = 1, b: [c] = [], 'd': e} = x;");
        let Pat::Object(object) = &decl.declarators[0].id else { panic!() };
        let ObjectPatProp::Assign(a) = &object.properties[0] else { panic!() };
        assert!(a.value.is_some());
        let ObjectPatProp::KeyValue(b) = &object.properties[1] else { panic!() };
        assert!(matches!(b.value, Pat::Assign(_)));
        assert_eq!(names(&decl.declarators[0].id), ["a", "c", "e"]);
    }

    #[test]
    fn test_rest_must_be_last() {
        assert_eq!(error("var [...a, b] = x;", false), messages::unexpected_token(","));
        assert_eq!(error("var {...a, b} = x;", false), messages::unexpected_token(","));
    }

    #[test]
    fn test_keywords_cannot_be_bound() {
        assert_eq!(error("var {if} = x;", false), messages::unexpected_token("if"));
        assert_eq!(error("var this = 1;", false), messages::unexpected_token("this"));
        let decl = declaration("var {if: a} = x;");
        assert_eq!(names(&decl.declarators[0].id), ["a"]);
    }

    #[test]
    fn test_strict_binding_names() {
        assert_eq!(error("var eval = 1;", true), messages::STRICT_VAR_NAME);
        assert_eq!(error("var [arguments] = x;", true), messages::STRICT_VAR_NAME);
        assert_eq!(error("var implements;", true), messages::STRICT_RESERVED_WORD);
        assert_eq!(error("let [let] = x;", false), messages::LET_IN_LEXICAL_BINDING);
        assert_eq!(names(&declaration("var yield, let;").declarators[1].id), ["let"]);
    }
}
