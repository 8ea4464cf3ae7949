//! Functions: declarations, expressions, methods and arrows, and the
//! parameter lists and bodies they share.

use crate::error::{ErrorKind, QuillResult};
use crate::parser::Parser;
use crate::parser::ast::{
    ArrowBody, ArrowExpr, Attribute, BlockStmt, Expr, FnDecl, FnExpr, NodeType, Pat,
};
use crate::parser::context::{CoverState, DeferredError, ParsedParameters};
use crate::parser::messages;
use crate::parser::token::{
    Position, Token, TokenKind, is_restricted_word, is_strict_mode_reserved_word,
};

/// Which kind of method a property or class member defines; getters and
/// setters have fixed arities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MethodFlavor {
    Method,
    Getter,
    Setter,
}

/// Grammar parameters of a function being entered.
#[derive(Debug, Clone, Copy)]
struct FunctionShape {
    is_async: bool,
    is_generator: bool,
    /// `super(…)` is legal in the body (derived constructors).
    allow_super_call: bool,
    /// `super.x` is legal in the body (methods).
    allow_super_property: bool,
    /// Duplicate parameter names are always an error.
    unique_params: bool,
}

impl<'src> Parser<'src> {
    /// `async function` with no line break between the two words.
    pub(super) fn is_async_function_start(&mut self) -> QuillResult<bool> {
        if !self.matches_contextual("async") {
            return Ok(false);
        }
        let next = self.peek_token()?;
        Ok(next.kind == TokenKind::Function && !next.had_line_terminator_before)
    }

    /// `( FormalParameterList )`.  `first_restricted` carries a problem
    /// already found in the function's name.
    pub(super) fn parse_formal_parameters(
        &mut self,
        first_restricted: Option<DeferredError>,
    ) -> QuillResult<ParsedParameters> {
        self.with_flags(
            |f| f.in_parameters = true,
            |p| {
                let mut params = ParsedParameters::new(first_restricted);
                p.expect(TokenKind::LeftParen)?;
                while !p.matches(TokenKind::RightParen) {
                    let pattern = if p.matches(TokenKind::DotDotDot) {
                        let rest = p.parse_binding_rest_element(None)?;
                        if p.matches(TokenKind::Equal) {
                            return Err(p.error_at(
                                p.lookahead.span.start,
                                messages::DEFAULT_REST_PARAMETER,
                                ErrorKind::Syntax,
                            ));
                        }
                        if !p.matches(TokenKind::RightParen) {
                            return Err(p.error_at(
                                p.lookahead.span.start,
                                messages::PARAMETER_AFTER_REST_PARAMETER,
                                ErrorKind::Syntax,
                            ));
                        }
                        Pat::Rest(Box::new(rest))
                    } else {
                        p.parse_binding_pattern_with_default(None)?
                    };

                    let mut names = Vec::new();
                    pattern.bound_names(&mut names);
                    for name in names {
                        params.validate_name(&name.name, name.loc.start, p.flags.strict);
                    }
                    params.simple &= matches!(pattern, Pat::Ident(_));
                    params.params.push(pattern);

                    if !p.matches(TokenKind::RightParen) {
                        p.expect(TokenKind::Comma)?;
                    }
                }
                p.expect(TokenKind::RightParen)?;
                Ok(params)
            },
        )
    }

    /// `{ FunctionBody }` with its directive prologue.  The caller scopes
    /// the grammar flags; the cover state is preserved.
    pub(super) fn parse_function_body(&mut self) -> QuillResult<BlockStmt> {
        let saved_cover = std::mem::replace(&mut self.cover, CoverState::permissive());
        self.flags.in_function_body = true;
        self.flags.in_iteration = false;
        self.flags.in_switch = false;

        let start = self.create_node();
        self.expect(TokenKind::LeftBrace)?;
        let body = self.with_fresh_labels(|p| {
            let mut body = p.parse_directive_prologue()?;
            while !p.matches(TokenKind::RightBrace) {
                if p.matches(TokenKind::Eof) {
                    return Err(p.unexpected(&p.lookahead));
                }
                body.push(p.parse_statement_list_item()?);
            }
            Ok(body)
        })?;
        self.expect(TokenKind::RightBrace)?;
        let loc = self.finalize(start, NodeType::BlockStatement);
        self.cover = saved_cover;
        Ok(BlockStmt { loc, body })
    }

    /// Report the deferred parameter problems once the body's strictness
    /// is known.
    fn check_parameters(&mut self, params: &ParsedParameters, unique: bool) -> QuillResult<()> {
        if self.flags.strict {
            if let Some(restricted) = &params.first_restricted {
                self.tolerate_deferred(restricted, ErrorKind::Strict)?;
            }
            if let Some(stricted) = &params.stricted {
                self.tolerate_deferred(stricted, ErrorKind::Strict)?;
            }
        } else if (unique || !params.simple)
            && let Some(duplicate) = &params.duplicate
        {
            self.tolerate_deferred(duplicate, ErrorKind::Syntax)?;
        }
        Ok(())
    }

    /// Problems with a function's own name.  Strict code reports them now;
    /// sloppy code defers them until the body turns out strict.
    fn classify_function_name(&mut self, token: &Token) -> QuillResult<Option<DeferredError>> {
        let name = token.str_value();
        if self.flags.strict {
            if is_restricted_word(name) {
                self.tolerate_at(
                    token.span.start,
                    messages::STRICT_FUNCTION_NAME,
                    ErrorKind::Strict,
                )?;
            }
            return Ok(None);
        }
        let message = if is_restricted_word(name) {
            messages::STRICT_FUNCTION_NAME
        } else if is_strict_mode_reserved_word(name) {
            messages::STRICT_RESERVED_WORD
        } else {
            return Ok(None);
        };
        Ok(Some(DeferredError {
            position: token.span.start,
            message,
        }))
    }

    /// `[async] function [*] name ( params ) { body }`.  The name may be
    /// omitted after `export default`.
    pub(super) fn parse_function_declaration(
        &mut self,
        start: Position,
        identifier_optional: bool,
        attributes: Vec<Attribute>,
    ) -> QuillResult<FnDecl> {
        let is_async = self.matches_contextual("async");
        if is_async {
            self.next_token()?;
        }
        self.expect(TokenKind::Function)?;
        let is_generator = self.matches(TokenKind::Star);
        if is_generator {
            self.next_token()?;
        }

        let mut id = None;
        let mut first_restricted = None;
        if !(identifier_optional && self.matches(TokenKind::LeftParen)) {
            let token = self.lookahead.clone();
            id = Some(self.parse_binding_identifier(None)?);
            first_restricted = self.classify_function_name(&token)?;
        }

        let shape = FunctionShape {
            is_async,
            is_generator,
            allow_super_call: false,
            allow_super_property: false,
            unique_params: false,
        };
        let (params, body) = self.parse_function_rest(shape, first_restricted)?;
        let loc = self.finalize(start, NodeType::FunctionDeclaration);
        Ok(FnDecl {
            loc,
            id,
            is_async,
            is_generator,
            params,
            body,
            attributes,
        })
    }

    /// `[async] function [*] [name] ( params ) { body }` in expression
    /// position.  The name is bound inside the function, so `yield` and
    /// `await` follow the function's own flavor.
    pub(super) fn parse_function_expression(&mut self) -> QuillResult<Expr> {
        let start = self.create_node();
        let is_async = self.matches_contextual("async");
        if is_async {
            self.next_token()?;
        }
        self.expect(TokenKind::Function)?;
        let is_generator = self.matches(TokenKind::Star);
        if is_generator {
            self.next_token()?;
        }

        let (id, first_restricted) = self.with_flags(
            |f| {
                f.is_async = is_async;
                f.allow_yield = is_generator;
            },
            |p| {
                if p.matches(TokenKind::LeftParen) {
                    return Ok((None, None));
                }
                let token = p.lookahead.clone();
                let id = p.parse_binding_identifier(None)?;
                Ok((Some(id), p.classify_function_name(&token)?))
            },
        )?;

        let shape = FunctionShape {
            is_async,
            is_generator,
            allow_super_call: false,
            allow_super_property: false,
            unique_params: false,
        };
        let (params, body) = self.parse_function_rest(shape, first_restricted)?;
        let loc = self.finalize(start, NodeType::FunctionExpression);
        Ok(Expr::Fn(Box::new(FnExpr {
            loc,
            id,
            is_async,
            is_generator,
            params,
            body,
        })))
    }

    /// Parameters and body of a non-arrow function.
    fn parse_function_rest(
        &mut self,
        shape: FunctionShape,
        first_restricted: Option<DeferredError>,
    ) -> QuillResult<(Vec<Pat>, BlockStmt)> {
        self.with_flags(
            |f| {
                f.is_async = shape.is_async;
                f.allow_yield = shape.is_generator;
                f.allow_super_call = shape.allow_super_call;
                f.allow_super_property = shape.allow_super_property;
                f.allow_new_target = true;
                f.in_parameters = false;
            },
            |p| {
                let params = p.parse_formal_parameters(first_restricted)?;
                p.flags.allow_strict_directive = params.simple;
                let body = p.parse_function_body()?;
                p.check_parameters(&params, shape.unique_params)?;
                Ok((params.params, body))
            },
        )
    }

    /// The function value of a method, getter or setter, starting at `(`.
    pub(super) fn parse_method_function(
        &mut self,
        flavor: MethodFlavor,
        is_async: bool,
        is_generator: bool,
        allow_super_call: bool,
    ) -> QuillResult<FnExpr> {
        let start = self.create_node();
        let shape = FunctionShape {
            is_async,
            is_generator,
            allow_super_call,
            allow_super_property: true,
            unique_params: true,
        };
        let (params, body) = self.with_flags(
            |f| {
                f.is_async = shape.is_async;
                f.allow_yield = shape.is_generator;
                f.allow_super_call = shape.allow_super_call;
                f.allow_super_property = true;
                f.allow_new_target = true;
                f.in_parameters = false;
            },
            |p| {
                let params = p.parse_formal_parameters(None)?;
                match flavor {
                    MethodFlavor::Getter if !params.params.is_empty() => {
                        p.tolerate_at(start, messages::BAD_GETTER_ARITY, ErrorKind::Syntax)?;
                    }
                    MethodFlavor::Setter if params.params.len() != 1 => {
                        p.tolerate_at(start, messages::BAD_SETTER_ARITY, ErrorKind::Syntax)?;
                    }
                    MethodFlavor::Setter if matches!(params.params[0], Pat::Rest(_)) => {
                        p.tolerate_at(
                            start,
                            messages::BAD_SETTER_REST_PARAMETER,
                            ErrorKind::Syntax,
                        )?;
                    }
                    _ => {}
                }
                p.flags.allow_strict_directive = params.simple;
                let body = p.parse_function_body()?;
                p.check_parameters(&params, shape.unique_params)?;
                Ok((params.params, body))
            },
        )?;
        self.cover.reject();
        let loc = self.finalize(start, NodeType::FunctionExpression);
        Ok(FnExpr {
            loc,
            id: None,
            is_async,
            is_generator,
            params,
            body,
        })
    }

    /// Finish an arrow function whose parameters were parsed as `expr`
    /// (a single identifier or a parameter placeholder) starting at
    /// `start`.  The lookahead is `=>`.
    pub(super) fn parse_arrow_function(
        &mut self,
        start: Position,
        expr: Expr,
    ) -> QuillResult<Expr> {
        let (candidates, is_async) = match expr {
            Expr::ArrowParams(placeholder) => (placeholder.params, placeholder.is_async),
            other => (vec![other], false),
        };
        let params = self.reinterpret_as_cover_formals_list(candidates, is_async)?;

        if self.has_line_terminator() {
            let token = self.lookahead.clone();
            self.tolerate_unexpected(&token)?;
        }
        self.cover.first_cover_initialized_name_error = None;
        self.expect(TokenKind::Arrow)?;

        let body = self.with_flags(
            |f| {
                f.allow_strict_directive = params.simple;
                f.allow_yield = false;
                f.is_async = is_async;
                f.in_parameters = false;
            },
            |p| {
                let body = if p.matches(TokenKind::LeftBrace) {
                    ArrowBody::Block(p.parse_function_body()?)
                } else {
                    ArrowBody::Expr(Box::new(
                        p.isolate_cover_grammar(|p| p.parse_assignment_expression())?,
                    ))
                };
                p.check_parameters(&params, true)?;
                Ok(body)
            },
        )?;

        self.cover.reject();
        let loc = self.finalize(start, NodeType::ArrowFunctionExpression);
        Ok(Expr::Arrow(Box::new(ArrowExpr {
            loc,
            is_async,
            params: params.params,
            body,
        })))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::error::ErrorKind;
    use crate::parser::Parser;
    use crate::parser::ast::{ArrowBody, Expr, Pat, ProgramItem, Stmt};
    use crate::parser::messages;

    fn first_statement(source: &str) -> Stmt {
        let program = Parser::new(source, ParserOptions::new())
            .parse_script(false)
            .unwrap_or_else(|e| panic!("{source}: {e}"));
        match program.body.into_iter().next() {
            Some(ProgramItem::Stmt(stmt)) => stmt,
            other => panic!("expected a statement, got {other:?}"),
        }
    }

    fn error(source: &str) -> (String, usize, ErrorKind) {
        let err = Parser::new(source, ParserOptions::new())
            .parse_script(false)
            .expect_err(source);
        let err = err.as_parse_error().unwrap();
        (err.description.clone(), err.index, err.kind)
    }

    #[test]
    fn test_declaration_shapes() {
        let source = "async function* gen(a, [b], {c} = {}, ...d) {}";
        let Stmt::FnDecl(f) = first_statement(source) else {
            panic!()
        };
        assert!(f.is_async && f.is_generator);
        assert_eq!(f.id.as_ref().map(|i| i.name.as_str()), Some("gen"));
        assert_eq!(f.params.len(), 4);
        assert!(matches!(f.params[3], Pat::Rest(_)));
    }

    #[test]
    fn test_rest_parameter_rules() {
        assert_eq!(
            error("function f(...a, b) {}").0,
            messages::PARAMETER_AFTER_REST_PARAMETER
        );
        assert_eq!(error("function f(...a = 1) {}").0, messages::DEFAULT_REST_PARAMETER);
    }

    #[test]
    fn test_strict_body_reports_restricted_parameter_retroactively() {
        let source = "function f(eval) { \"use strict\"; }";
        let (message, index, kind) = error(source);
        assert_eq!(message, messages::STRICT_PARAM_NAME);
        assert_eq!(index, source.find("eval").unwrap());
        assert_eq!(kind, ErrorKind::Strict);
    }

    #[test]
    fn test_strict_body_reports_function_name() {
        let source = "function eval() { 'use strict'; }";
        let (message, index, _) = error(source);
        assert_eq!(message, messages::STRICT_FUNCTION_NAME);
        assert_eq!(index, 9);
    }

    #[test]
    fn test_duplicate_parameters() {
        assert!(matches!(first_statement("function f(a, a) {}"), Stmt::FnDecl(_)));
        assert_eq!(
            error("function f(a, a) { 'use strict'; }").0,
            messages::STRICT_PARAM_DUPE
        );
        assert_eq!(
            error("function f(a, [a]) {}").0,
            messages::DUPLICATE_PARAMETER
        );
    }

    #[test]
    fn test_use_strict_with_non_simple_parameters() {
        assert_eq!(
            error("function f(a = 1) { 'use strict'; }").0,
            messages::ILLEGAL_LANGUAGE_MODE_DIRECTIVE
        );
    }

    #[test]
    fn test_generator_name_and_body_flags() {
        let Stmt::Expr(stmt) = first_statement("(function* g() { yield 1; yield* g(); })") else {
            panic!()
        };
        assert!(matches!(*stmt.expr, Expr::Fn(_)));
        assert_eq!(
            error("(function* yield() {})").0,
            messages::unexpected_token("yield")
        );
        assert!(matches!(first_statement("function* yield() {}"), Stmt::FnDecl(_)));
    }

    #[test]
    fn test_arrow_bodies() {
        let Stmt::Expr(stmt) = first_statement("x => { return x; };") else { panic!() };
        let Expr::Arrow(arrow) = *stmt.expr else { panic!() };
        assert!(matches!(arrow.body, ArrowBody::Block(_)));

        let Stmt::Expr(stmt) = first_statement("(a, b) => a + b;") else { panic!() };
        let Expr::Arrow(arrow) = *stmt.expr else { panic!() };
        assert_eq!(arrow.params.len(), 2);
        assert!(matches!(arrow.body, ArrowBody::Expr(_)));
        assert_eq!((arrow.loc.start.offset, arrow.loc.end.offset), (0, 15));
    }

    #[test]
    fn test_arrow_restrictions() {
        assert_eq!(error("a\n=> 1").0, messages::unexpected_token("=>"));
        assert_eq!(error("async (await) => 1").0, messages::unexpected_token("=>"));
        assert_eq!(error("(eval) => { 'use strict'; }").0, messages::STRICT_PARAM_NAME);
    }

    #[test]
    fn test_labels_do_not_leak_into_functions() {
        assert_eq!(
            error("outer: while (1) { function f() { break outer; } }").0,
            messages::unknown_label("outer")
        );
    }

    #[test]
    fn test_return_only_in_functions() {
        assert_eq!(error("return 1;").0, messages::ILLEGAL_RETURN);
        assert!(matches!(first_statement("function f() { return 1; }"), Stmt::FnDecl(_)));
        let program = Parser::new(
            "return 1;",
            ParserOptions::new().allow_return_outside_function(true),
        )
        .parse_script(false)
        .unwrap();
        assert_eq!(program.body.len(), 1);
    }
}
