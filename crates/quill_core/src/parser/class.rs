//! Class declarations and expressions.
//!
//! Class code is always strict.  A class body holds methods, accessors,
//! fields, `static { … }` blocks and at most one `finally { … }`
//! finalizer.

use crate::error::{ErrorKind, QuillResult};
use crate::parser::Parser;
use crate::parser::ast::{
    Attribute, ClassBody, ClassDecl, ClassExpr, ClassMember, Expr, MethodDef, MethodKind,
    NodeType, PropKey, PropertyDef, StaticBlock,
};
use crate::parser::expression::starts_property_key;
use crate::parser::function::MethodFlavor;
use crate::parser::messages;
use crate::parser::token::{Position, TokenKind};

/// Per-body bookkeeping for the one-of-a-kind members.
#[derive(Debug, Default)]
struct BodyState {
    derived: bool,
    has_constructor: bool,
    has_finalizer: bool,
}

impl<'src> Parser<'src> {
    /// `class Name [extends Expr] { … }`.  The name may be omitted after
    /// `export default`.
    pub(super) fn parse_class_declaration(
        &mut self,
        start: Position,
        identifier_optional: bool,
        attributes: Vec<Attribute>,
    ) -> QuillResult<ClassDecl> {
        self.with_flags(
            |f| f.strict = true,
            |p| {
                p.expect(TokenKind::Class)?;
                let id = if identifier_optional
                    && matches!(p.lookahead.kind, TokenKind::Extends | TokenKind::LeftBrace)
                {
                    None
                } else {
                    Some(p.parse_binding_identifier(None)?)
                };
                let (super_class, body) = p.parse_class_tail()?;
                let loc = p.finalize(start, NodeType::ClassDeclaration);
                Ok(ClassDecl {
                    loc,
                    id,
                    super_class,
                    body,
                    attributes,
                })
            },
        )
    }

    pub(super) fn parse_class_expression(&mut self) -> QuillResult<ClassExpr> {
        let start = self.create_node();
        self.with_flags(
            |f| f.strict = true,
            |p| {
                p.expect(TokenKind::Class)?;
                let id = if p.matches(TokenKind::Extends) || p.matches(TokenKind::LeftBrace) {
                    None
                } else {
                    Some(p.parse_binding_identifier(None)?)
                };
                let (super_class, body) = p.parse_class_tail()?;
                let loc = p.finalize(start, NodeType::ClassExpression);
                Ok(ClassExpr {
                    loc,
                    id,
                    super_class,
                    body,
                })
            },
        )
    }

    fn parse_class_tail(&mut self) -> QuillResult<(Option<Box<Expr>>, ClassBody)> {
        let super_class = if self.matches(TokenKind::Extends) {
            self.next_token()?;
            let heritage = self.descend(|p| {
                p.isolate_cover_grammar(|p| p.parse_lhs_expression_allow_call())
            })?;
            Some(Box::new(heritage))
        } else {
            None
        };
        let derived = super_class.is_some();
        let body = self.with_flags(|f| f.in_class_body = true, |p| p.parse_class_body(derived))?;
        Ok((super_class, body))
    }

    fn parse_class_body(&mut self, derived: bool) -> QuillResult<ClassBody> {
        let start = self.create_node();
        self.expect(TokenKind::LeftBrace)?;
        let mut state = BodyState {
            derived,
            ..BodyState::default()
        };
        let mut body = Vec::new();
        while !self.matches(TokenKind::RightBrace) {
            if self.matches(TokenKind::Semicolon) {
                self.next_token()?;
                continue;
            }
            body.push(self.parse_class_element(&mut state)?);
        }
        self.expect(TokenKind::RightBrace)?;
        let loc = self.finalize(start, NodeType::ClassBody);
        Ok(ClassBody { loc, body })
    }

    fn parse_class_element(&mut self, state: &mut BodyState) -> QuillResult<ClassMember> {
        let start = self.create_node();
        let attributes = self.parse_attributes()?;

        if self.matches(TokenKind::Finally) && self.peek_token()?.kind == TokenKind::LeftBrace {
            self.reject_attributes(&attributes, start)?;
            let block = self.parse_finalizer_block(&mut state.has_finalizer)?;
            return Ok(ClassMember::Finalizer(block));
        }

        let mut is_static = false;
        if self.matches_contextual("static") {
            let next = self.peek_token()?.kind;
            if next == TokenKind::LeftBrace {
                self.reject_attributes(&attributes, start)?;
                return Ok(ClassMember::StaticBlock(self.parse_static_block()?));
            }
            if starts_property_key(next) || next == TokenKind::Star {
                self.next_token()?;
                is_static = true;
            }
        }

        let mut is_async = false;
        if self.matches_contextual("async") {
            let next = self.peek_token()?;
            if !next.had_line_terminator_before
                && (starts_property_key(next.kind) || next.kind == TokenKind::Star)
            {
                self.next_token()?;
                is_async = true;
            }
        }

        let is_generator = self.matches(TokenKind::Star);
        if is_generator {
            self.next_token()?;
        }

        let mut accessor = None;
        if !is_async && !is_generator {
            let flavor = if self.matches_contextual("get") {
                Some(MethodFlavor::Getter)
            } else if self.matches_contextual("set") {
                Some(MethodFlavor::Setter)
            } else {
                None
            };
            if flavor.is_some() && starts_property_key(self.peek_token()?.kind) {
                self.next_token()?;
                accessor = flavor;
            }
        }

        let key_token = self.lookahead.clone();
        let (key, is_computed) = self.parse_object_property_key(true)?;
        if matches!(&key, PropKey::Private(name) if name.name == "constructor") {
            self.tolerate_at(
                key_token.span.start,
                messages::CONSTRUCTOR_IS_PRIVATE,
                ErrorKind::Syntax,
            )?;
        }
        if is_static && !is_computed && key.is_named("prototype") {
            self.tolerate_at(
                key_token.span.start,
                messages::STATIC_PROTOTYPE,
                ErrorKind::Syntax,
            )?;
        }

        let is_method = accessor.is_some()
            || is_async
            || is_generator
            || self.matches(TokenKind::LeftParen);
        if !is_method {
            if !is_computed && key.is_named("constructor") {
                self.tolerate_at(
                    key_token.span.start,
                    messages::CONSTRUCTOR_FIELD,
                    ErrorKind::Syntax,
                )?;
            }
            let value = if self.matches(TokenKind::Equal) {
                self.next_token()?;
                Some(Box::new(self.parse_field_initializer()?))
            } else {
                None
            };
            self.consume_semicolon()?;
            let loc = self.finalize(start, NodeType::PropertyDefinition);
            return Ok(ClassMember::Property(PropertyDef {
                loc,
                is_static,
                key,
                is_computed,
                value,
                attributes,
            }));
        }

        let mut kind = match accessor {
            Some(MethodFlavor::Getter) => MethodKind::Get,
            Some(MethodFlavor::Setter) => MethodKind::Set,
            _ => MethodKind::Method,
        };
        if !is_static && !is_computed && key.is_named("constructor") {
            let message = if accessor.is_some() || is_generator {
                Some(messages::CONSTRUCTOR_SPECIAL_METHOD)
            } else if is_async {
                Some(messages::CONSTRUCTOR_IS_ASYNC)
            } else if state.has_constructor {
                Some(messages::DUPLICATE_CONSTRUCTOR)
            } else {
                None
            };
            if let Some(message) = message {
                self.tolerate_at(key_token.span.start, message, ErrorKind::Syntax)?;
            }
            state.has_constructor = true;
            kind = MethodKind::Constructor;
        }

        let allow_super_call = kind == MethodKind::Constructor && state.derived;
        let value = self.parse_method_function(
            accessor.unwrap_or(MethodFlavor::Method),
            is_async,
            is_generator,
            allow_super_call,
        )?;
        let loc = self.finalize(start, NodeType::MethodDefinition);
        Ok(ClassMember::Method(MethodDef {
            loc,
            is_static,
            kind,
            key,
            is_computed,
            value,
            attributes,
        }))
    }

    /// `= value` of a field: evaluated like a method body, with `this`,
    /// `super.x` and `new.target` available.
    fn parse_field_initializer(&mut self) -> QuillResult<Expr> {
        self.with_flags(
            |f| {
                f.allow_yield = false;
                f.is_async = false;
                f.allow_super_call = false;
                f.allow_super_property = true;
                f.allow_new_target = true;
                f.in_parameters = false;
            },
            |p| p.isolate_cover_grammar(|p| p.parse_assignment_expression()),
        )
    }

    fn parse_static_block(&mut self) -> QuillResult<StaticBlock> {
        let start = self.create_node();
        self.expect_contextual("static")?;
        self.expect(TokenKind::LeftBrace)?;
        let body = self.with_flags(
            |f| {
                f.allow_yield = false;
                f.is_async = false;
                f.allow_super_call = false;
                f.allow_super_property = true;
                f.allow_new_target = true;
                f.in_function_body = false;
                f.in_iteration = false;
                f.in_switch = false;
                f.in_parameters = false;
            },
            |p| {
                p.with_fresh_labels(|p| {
                    let mut body = Vec::new();
                    while !p.matches(TokenKind::RightBrace) {
                        if p.matches(TokenKind::Eof) {
                            return Err(p.unexpected(&p.lookahead));
                        }
                        body.push(p.parse_statement_list_item()?);
                    }
                    Ok(body)
                })
            },
        )?;
        self.expect(TokenKind::RightBrace)?;
        let loc = self.finalize(start, NodeType::StaticBlock);
        Ok(StaticBlock { loc, body })
    }

    /// Attributes are only kept on declarations and on methods and fields.
    fn reject_attributes(&mut self, attributes: &[Attribute], start: Position) -> QuillResult<()> {
        if !attributes.is_empty() {
            self.tolerate_at(start, messages::INVALID_ATTRIBUTE_TARGET, ErrorKind::Syntax)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::parser::Parser;
    use crate::parser::ast::{ClassDecl, ClassMember, MethodKind, ProgramItem, Stmt};
    use crate::parser::messages;

    fn class(source: &str) -> ClassDecl {
        let program = Parser::new(source, ParserOptions::new())
            .parse_script(false)
            .unwrap_or_else(|e| panic!("{source}: {e}"));
        match program.body.into_iter().next() {
            Some(ProgramItem::Stmt(Stmt::ClassDecl(decl))) => *decl,
            other => panic!("expected a class, got {other:?}"),
        }
    }

    fn error(source: &str) -> String {
        let err = Parser::new(source, ParserOptions::new())
            .parse_script(false)
            .expect_err(source);
        err.as_parse_error().unwrap().description.clone()
    }

    #[test]
    fn test_member_kinds() {
        let decl = class(
            "class A extends B {
                constructor() { super(); }
                static create() {}
                get x() { return this.#x; }
                set x(v) { this.#x = v; }
                async *items() {}
                #x = 1;
                static count;
                [key] = 2;
                static { A.count = 0; }
                finally { release(this); }
            }",
        );
        assert!(decl.super_class.is_some());
        let kinds: Vec<_> = decl
            .body
            .body
            .iter()
            .map(|m| match m {
                ClassMember::Method(m) => format!("{:?}", m.kind),
                ClassMember::Property(_) => "Field".into(),
                ClassMember::StaticBlock(_) => "StaticBlock".into(),
                ClassMember::Finalizer(_) => "Finalizer".into(),
            })
            .collect();
        assert_eq!(
            kinds,
            [
                "Constructor", "Method", "Get", "Set", "Method", "Field", "Field", "Field",
                "StaticBlock", "Finalizer"
            ]
        );
    }

    #[test]
    fn test_modifier_words_as_names() {
        let decl =
            class("class A { static() {} get() {} async() {} static static() {} get; set = 1 }");
        let ClassMember::Method(m) = &decl.body.body[3] else { panic!() };
        assert!(m.is_static && m.kind == MethodKind::Method);
        assert_eq!(decl.body.body.len(), 6);
    }

    #[test]
    fn test_constructor_rules() {
        assert_eq!(
            error("class A { constructor() {} constructor() {} }"),
            messages::DUPLICATE_CONSTRUCTOR
        );
        assert_eq!(error("class A { get constructor() {} }"), messages::CONSTRUCTOR_SPECIAL_METHOD);
        assert_eq!(error("class A { async constructor() {} }"), messages::CONSTRUCTOR_IS_ASYNC);
        assert_eq!(error("class A { #constructor() {} }"), messages::CONSTRUCTOR_IS_PRIVATE);
        assert_eq!(error("class A { constructor = 1 }"), messages::CONSTRUCTOR_FIELD);
        assert_eq!(error("class A { static prototype() {} }"), messages::STATIC_PROTOTYPE);
    }

    #[test]
    fn test_super_rules() {
        assert_eq!(error("class A { constructor() { super(); } }"), messages::UNEXPECTED_SUPER);
        assert_eq!(error("function f() { super.x; }"), messages::UNEXPECTED_SUPER);
        class("class A { m() { return super.m(); } }");
    }

    #[test]
    fn test_class_body_is_strict() {
        assert_eq!(error("class A { m() { with (a) {} } }"), messages::STRICT_MODE_WITH);
    }

    #[test]
    fn test_private_names_need_a_class() {
        assert_eq!(error("a.#x;"), messages::PRIVATE_NAME_NOT_ALLOWED);
        class("class A { #x; has(o) { return #x in o; } }");
    }

    #[test]
    fn test_single_finalizer() {
        assert_eq!(
            error("class A { finally {} finally {} }"),
            messages::DUPLICATE_FINALIZER
        );
        let decl = class("class A { finally = 1 }");
        assert!(matches!(decl.body.body[0], ClassMember::Property(_)));
    }
}
