//! Statements and declarations.
//!
//! [`parse_statement_list_item`](Parser::parse_statement_list_item) is the
//! entry point for anything that may appear in a block: it accepts
//! declarations and the dialect's `static` locals and `@` attributes, and
//! falls back to [`parse_statement`](Parser::parse_statement) for the
//! single-statement forms.

use crate::error::{ErrorKind, QuillError, QuillResult};
use crate::parser::Parser;
use crate::parser::ast::{
    Attribute, BlockStmt, BreakStmt, CatchClause, ContinueStmt, DebuggerStmt, DoWhileStmt,
    EmptyStmt, Expr, ExprStmt, ForEachStmt, ForInOfLeft, ForInStmt, ForInit, ForOfStmt,
    ForStmt, IfStmt, IncludeKind, IncludeStmt, LabeledStmt, NodeType, Pat, ReturnStmt,
    SequenceExpr, Stmt, SwitchCase, SwitchStmt, ThrowStmt, TryStmt, VarDecl,
    VarDeclarator, VarKind, WhileStmt, WithStmt,
};
use crate::parser::context::CoverState;
use crate::parser::messages;
use crate::parser::token::{Position, TokenKind, is_restricted_word};

/// Which loop a `for`-family head belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopHead {
    ForIn,
    ForOf,
    ForEach,
}

impl LoopHead {
    fn name(self) -> &'static str {
        match self {
            LoopHead::ForIn => "for-in",
            LoopHead::ForOf => "for-of",
            LoopHead::ForEach => "foreach",
        }
    }
}

impl<'src> Parser<'src> {
    // ── Dispatch ────────────────────────────────────────────────────────────

    /// `StatementListItem`: a statement or a declaration.
    pub(super) fn parse_statement_list_item(&mut self) -> QuillResult<Stmt> {
        self.cover = CoverState::permissive();
        let start = self.create_node();
        let kind = self.lookahead.kind;
        match kind {
            TokenKind::At => self.parse_attributed_declaration(),
            TokenKind::Const => Ok(Stmt::VarDecl(self.parse_lexical_declaration(
                start,
                Vec::new(),
                false,
            )?)),
            TokenKind::Let if self.is_lexical_declaration()? => Ok(Stmt::VarDecl(
                self.parse_lexical_declaration(start, Vec::new(), false)?,
            )),
            TokenKind::Function => Ok(Stmt::FnDecl(Box::new(self.parse_function_declaration(
                start,
                false,
                Vec::new(),
            )?))),
            TokenKind::Class => Ok(Stmt::ClassDecl(Box::new(self.parse_class_declaration(
                start,
                false,
                Vec::new(),
            )?))),
            TokenKind::Import if !self.is_import_expression_start()? => {
                Err(self.unexpected(&self.lookahead))
            }
            TokenKind::Export => Err(self.unexpected(&self.lookahead)),
            TokenKind::Identifier if self.is_static_local_start()? => {
                self.parse_static_local(start, Vec::new())
            }
            TokenKind::Identifier if self.is_async_function_start()? => Ok(Stmt::FnDecl(
                Box::new(self.parse_function_declaration(start, false, Vec::new())?),
            )),
            _ => self.parse_statement(),
        }
    }

    /// A single `Statement`, as required by the bodies of `if`, loops,
    /// `with` and labels.
    pub(super) fn parse_statement(&mut self) -> QuillResult<Stmt> {
        self.descend(|p| p.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        let kind = self.lookahead.kind;
        match kind {
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                self.next_token()?;
                let loc = self.finalize(start, NodeType::EmptyStatement);
                Ok(Stmt::Empty(EmptyStmt { loc }))
            }
            TokenKind::Var => Ok(Stmt::VarDecl(self.parse_variable_statement(
                start,
                Vec::new(),
                false,
            )?)),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Foreach => self.parse_foreach_statement(),
            TokenKind::Continue => self.parse_continue_statement(),
            TokenKind::Break => self.parse_break_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::With => self.parse_with_statement(),
            TokenKind::Debugger => {
                self.next_token()?;
                self.consume_semicolon()?;
                let loc = self.finalize(start, NodeType::DebuggerStatement);
                Ok(Stmt::Debugger(DebuggerStmt { loc }))
            }
            TokenKind::Function => Ok(Stmt::FnDecl(Box::new(self.parse_function_declaration(
                start,
                false,
                Vec::new(),
            )?))),
            TokenKind::Class => Err(self.unexpected(&self.lookahead)),
            TokenKind::Let if self.peek_token()?.kind == TokenKind::LeftBracket => {
                Err(self.unexpected(&self.lookahead))
            }
            TokenKind::Identifier if self.is_async_function_start()? => {
                self.tolerate_at(
                    start,
                    messages::ASYNC_FUNCTION_IN_SINGLE_STATEMENT_CONTEXT,
                    ErrorKind::Syntax,
                )?;
                Ok(Stmt::FnDecl(Box::new(self.parse_function_declaration(
                    start,
                    false,
                    Vec::new(),
                )?)))
            }
            TokenKind::Identifier if self.is_include_start()? => self.parse_include_statement(),
            TokenKind::Identifier => self.parse_labelled_or_expression_statement(None),
            _ => self.parse_expression_statement(),
        }
    }

    pub(super) fn parse_block(&mut self) -> QuillResult<BlockStmt> {
        let start = self.create_node();
        self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.matches(TokenKind::RightBrace) {
            if self.matches(TokenKind::Eof) {
                return Err(self.unexpected(&self.lookahead));
            }
            body.push(self.parse_statement_list_item()?);
        }
        self.expect(TokenKind::RightBrace)?;
        let loc = self.finalize(start, NodeType::BlockStatement);
        Ok(BlockStmt { loc, body })
    }

    // ── Expression statements ───────────────────────────────────────────────

    fn parse_expression_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        let expr = self.parse_comma_expression()?;
        self.consume_semicolon()?;
        let loc = self.finalize(start, NodeType::ExpressionStatement);
        Ok(Stmt::Expr(ExprStmt {
            loc,
            expr: Box::new(expr),
            directive: None,
        }))
    }

    /// One entry of a directive prologue.  Only a statement consisting of
    /// the bare string literal is a directive.
    pub(super) fn parse_directive(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        let token = self.lookahead.clone();
        let expr = self.parse_comma_expression()?;
        let directive = match &expr {
            Expr::Str(literal) if literal.loc == token.span => {
                let raw = token.raw(self.source);
                raw.get(1..raw.len().saturating_sub(1)).map(str::to_string)
            }
            _ => None,
        };
        self.consume_semicolon()?;
        let loc = self.finalize(start, NodeType::ExpressionStatement);
        Ok(Stmt::Expr(ExprStmt {
            loc,
            expr: Box::new(expr),
            directive,
        }))
    }

    /// An expression statement, or `label: Statement` when the expression
    /// is a lone identifier followed by `:`.  `chain` is the start offset
    /// of the enclosing label when labels are stacked (`a: b: while …`).
    fn parse_labelled_or_expression_statement(
        &mut self,
        chain: Option<usize>,
    ) -> QuillResult<Stmt> {
        let start = self.create_node();
        let expr = self.parse_comma_expression()?;

        let Expr::Ident(label) = expr else {
            self.consume_semicolon()?;
            let loc = self.finalize(start, NodeType::ExpressionStatement);
            return Ok(Stmt::Expr(ExprStmt {
                loc,
                expr: Box::new(expr),
                directive: None,
            }));
        };
        if !self.matches(TokenKind::Colon) {
            self.consume_semicolon()?;
            let loc = self.finalize(start, NodeType::ExpressionStatement);
            return Ok(Stmt::Expr(ExprStmt {
                loc,
                expr: Box::new(Expr::Ident(label)),
                directive: None,
            }));
        }

        self.next_token()?;
        if self.labels.contains(&label.name) {
            return Err(self.error_at(
                label.loc.start,
                &messages::label_redeclaration(&label.name),
                ErrorKind::Syntax,
            ));
        }

        let chain_start = chain.unwrap_or(start.offset);
        let is_loop = matches!(
            self.lookahead.kind,
            TokenKind::For | TokenKind::Foreach | TokenKind::While | TokenKind::Do
        );
        self.labels.push(label.name.clone(), chain_start, is_loop);

        let body = if self.matches(TokenKind::Class) {
            Err(self.unexpected(&self.lookahead))
        } else if self.matches(TokenKind::Function) {
            if self.flags.strict {
                let position = self.lookahead.span.start;
                self.tolerate_at(position, messages::STRICT_FUNCTION, ErrorKind::Syntax)?;
            }
            let body_start = self.create_node();
            self.parse_function_declaration(body_start, false, Vec::new())
                .map(|f| Stmt::FnDecl(Box::new(f)))
        } else if self.matches(TokenKind::Identifier)
            && self.peek_token()?.kind == TokenKind::Colon
        {
            self.descend(|p| p.parse_labelled_or_expression_statement(Some(chain_start)))
        } else {
            self.parse_statement()
        };
        self.labels.pop();

        let body = body?;
        let loc = self.finalize(start, NodeType::LabeledStatement);
        Ok(Stmt::Labeled(LabeledStmt {
            loc,
            label,
            body: Box::new(body),
        }))
    }

    // ── Declarations ────────────────────────────────────────────────────────

    /// `let` starts a declaration only when a binding follows it.
    fn is_lexical_declaration(&mut self) -> QuillResult<bool> {
        let next = self.peek_token()?;
        Ok(matches!(
            next.kind,
            TokenKind::Identifier
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::Let
                | TokenKind::Yield
        ))
    }

    /// `var` declaration list, starting at `start` (before any attributes
    /// or `static`).
    fn parse_variable_statement(
        &mut self,
        start: Position,
        attributes: Vec<Attribute>,
        is_static: bool,
    ) -> QuillResult<VarDecl> {
        self.expect(TokenKind::Var)?;
        let declarators = self.parse_binding_list(VarKind::Var, false)?;
        self.consume_semicolon()?;
        let loc = self.finalize(start, NodeType::VariableDeclaration);
        Ok(VarDecl {
            loc,
            kind: VarKind::Var,
            declarators,
            is_static,
            attributes,
        })
    }

    /// `let` or `const` declaration list.
    fn parse_lexical_declaration(
        &mut self,
        start: Position,
        attributes: Vec<Attribute>,
        is_static: bool,
    ) -> QuillResult<VarDecl> {
        let kind = match self.next_token()?.kind {
            TokenKind::Let => VarKind::Let,
            TokenKind::Const => VarKind::Const,
            _ => return Err(QuillError::Internal("lexical declaration without keyword".into())),
        };
        let declarators = self.parse_binding_list(kind, false)?;
        self.consume_semicolon()?;
        let loc = self.finalize(start, NodeType::VariableDeclaration);
        Ok(VarDecl {
            loc,
            kind,
            declarators,
            is_static,
            attributes,
        })
    }

    /// Comma-separated declarators.  `in_for` defers the initializer
    /// requirement to the loop head, where `for (const x of …)` needs none.
    fn parse_binding_list(
        &mut self,
        kind: VarKind,
        in_for: bool,
    ) -> QuillResult<Vec<VarDeclarator>> {
        let mut declarators = vec![self.parse_variable_declarator(kind, in_for)?];
        while self.matches(TokenKind::Comma) {
            self.next_token()?;
            declarators.push(self.parse_variable_declarator(kind, in_for)?);
        }
        Ok(declarators)
    }

    fn parse_variable_declarator(
        &mut self,
        kind: VarKind,
        in_for: bool,
    ) -> QuillResult<VarDeclarator> {
        let start = self.create_node();
        let id = self.parse_binding_pattern(Some(kind))?;
        let init = if self.matches(TokenKind::Equal) {
            self.next_token()?;
            Some(Box::new(
                self.isolate_cover_grammar(|p| p.parse_assignment_expression())?,
            ))
        } else {
            None
        };
        let loc = self.finalize(start, NodeType::VariableDeclarator);
        let declarator = VarDeclarator { loc, id, init };
        if !in_for {
            self.check_declarator_initializer(kind, &declarator)?;
        }
        Ok(declarator)
    }

    /// `const` bindings and destructuring declarations need an initializer
    /// outside `for-in`/`for-of` heads.
    fn check_declarator_initializer(
        &self,
        kind: VarKind,
        declarator: &VarDeclarator,
    ) -> QuillResult<()> {
        if declarator.init.is_some() {
            return Ok(());
        }
        let what = if kind == VarKind::Const {
            "const"
        } else if !matches!(declarator.id, Pat::Ident(_)) {
            "destructuring"
        } else {
            return Ok(());
        };
        Err(self.error_at(
            self.last_marker,
            &messages::declaration_missing_initializer(what),
            ErrorKind::Syntax,
        ))
    }

    // ── Dialect declarations ────────────────────────────────────────────────

    /// `static var|let|const` on one line.
    fn is_static_local_start(&mut self) -> QuillResult<bool> {
        if !self.matches_contextual("static") {
            return Ok(false);
        }
        let next = self.peek_token()?;
        Ok(!next.had_line_terminator_before
            && matches!(next.kind, TokenKind::Var | TokenKind::Let | TokenKind::Const))
    }

    /// A function-local declaration whose bindings persist across calls.
    fn parse_static_local(
        &mut self,
        start: Position,
        attributes: Vec<Attribute>,
    ) -> QuillResult<Stmt> {
        let keyword = self.expect_contextual("static")?;
        if !self.flags.in_function_body {
            self.tolerate_at(
                keyword.span.start,
                messages::STATIC_LOCAL_OUTSIDE_FUNCTION,
                ErrorKind::Syntax,
            )?;
        }
        let decl = if self.matches(TokenKind::Var) {
            self.parse_variable_statement(start, attributes, true)?
        } else {
            self.parse_lexical_declaration(start, attributes, true)?
        };
        Ok(Stmt::VarDecl(decl))
    }

    /// Zero or more `@Name`, `@a.b` or `@Name(args)` prefixes.
    pub(super) fn parse_attributes(&mut self) -> QuillResult<Vec<Attribute>> {
        let mut attributes = Vec::new();
        while self.matches(TokenKind::At) {
            let start = self.create_node();
            self.next_token()?;
            let mut path = vec![self.parse_identifier_name()?];
            while self.matches(TokenKind::Dot) {
                self.next_token()?;
                path.push(self.parse_identifier_name()?);
            }
            let arguments = if self.matches(TokenKind::LeftParen) {
                Some(self.parse_arguments()?)
            } else {
                None
            };
            let loc = self.finalize(start, NodeType::Attribute);
            attributes.push(Attribute {
                loc,
                path,
                arguments,
            });
        }
        Ok(attributes)
    }

    /// Attributes followed by the declaration they annotate.
    fn parse_attributed_declaration(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        let attributes = self.parse_attributes()?;
        let kind = self.lookahead.kind;
        match kind {
            TokenKind::Var => Ok(Stmt::VarDecl(self.parse_variable_statement(
                start, attributes, false,
            )?)),
            TokenKind::Const => Ok(Stmt::VarDecl(self.parse_lexical_declaration(
                start, attributes, false,
            )?)),
            TokenKind::Let if self.is_lexical_declaration()? => Ok(Stmt::VarDecl(
                self.parse_lexical_declaration(start, attributes, false)?,
            )),
            TokenKind::Function => Ok(Stmt::FnDecl(Box::new(self.parse_function_declaration(
                start, false, attributes,
            )?))),
            TokenKind::Class => Ok(Stmt::ClassDecl(Box::new(self.parse_class_declaration(
                start, false, attributes,
            )?))),
            TokenKind::Identifier if self.is_async_function_start()? => Ok(Stmt::FnDecl(
                Box::new(self.parse_function_declaration(start, false, attributes)?),
            )),
            TokenKind::Identifier if self.is_static_local_start()? => {
                self.parse_static_local(start, attributes)
            }
            _ => {
                self.tolerate_at(start, messages::INVALID_ATTRIBUTE_TARGET, ErrorKind::Syntax)?;
                self.parse_statement_list_item()
            }
        }
    }

    /// `include`, `require` or `source` followed by a string on the same
    /// line.
    fn is_include_start(&mut self) -> QuillResult<bool> {
        if self.lookahead.escaped || IncludeKind::from_word(self.lookahead.str_value()).is_none() {
            return Ok(false);
        }
        let next = self.peek_token()?;
        Ok(next.kind == TokenKind::StringLiteral && !next.had_line_terminator_before)
    }

    fn parse_include_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        let keyword = self.next_token()?;
        let kind = IncludeKind::from_word(keyword.str_value())
            .ok_or_else(|| QuillError::Internal("include without directive word".into()))?;
        let source = self.parse_string_literal()?;
        self.consume_semicolon()?;
        let loc = self.finalize(start, NodeType::IncludeStatement);
        Ok(Stmt::Include(IncludeStmt { loc, kind, source }))
    }

    // ── Control flow ────────────────────────────────────────────────────────

    /// In tolerant mode a header missing its `)` gets an empty body:
    /// the offending token is consumed and reported.
    fn recover_missing_paren(&mut self) -> QuillResult<Option<Stmt>> {
        if self.matches(TokenKind::RightParen) || !self.is_tolerant() {
            self.expect(TokenKind::RightParen)?;
            return Ok(None);
        }
        let token = self.next_token()?;
        self.tolerate_unexpected(&token)?;
        let at = self.last_marker;
        let loc = self.finalize_between(at, at, NodeType::EmptyStatement);
        Ok(Some(Stmt::Empty(EmptyStmt { loc })))
    }

    fn parse_iteration_body(&mut self) -> QuillResult<Stmt> {
        if let Some(empty) = self.recover_missing_paren()? {
            return Ok(empty);
        }
        self.with_flags(|f| f.in_iteration = true, |p| p.parse_statement())
    }

    fn parse_if_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_comma_expression()?;

        let (consequent, alternate) = match self.recover_missing_paren()? {
            Some(empty) => (empty, None),
            None => {
                let consequent = self.parse_if_clause()?;
                let alternate = if self.matches(TokenKind::Else) {
                    self.next_token()?;
                    Some(Box::new(self.parse_if_clause()?))
                } else {
                    None
                };
                (consequent, alternate)
            }
        };
        let loc = self.finalize(start, NodeType::IfStatement);
        Ok(Stmt::If(IfStmt {
            loc,
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate,
        }))
    }

    /// A branch of `if`.  A sloppy-mode function declaration is accepted
    /// here; a generator is not.
    fn parse_if_clause(&mut self) -> QuillResult<Stmt> {
        if self.matches(TokenKind::Function) {
            let position = self.lookahead.span.start;
            if self.flags.strict {
                self.tolerate_at(position, messages::STRICT_FUNCTION, ErrorKind::Syntax)?;
            } else if self.peek_token()?.kind == TokenKind::Star {
                self.tolerate_at(
                    position,
                    messages::GENERATOR_IN_LEGACY_CONTEXT,
                    ErrorKind::Syntax,
                )?;
            }
        }
        self.parse_statement()
    }

    fn parse_do_while_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        self.expect(TokenKind::Do)?;
        let body = self.with_flags(|f| f.in_iteration = true, |p| p.parse_statement())?;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_comma_expression()?;
        if !self.matches(TokenKind::RightParen) && self.is_tolerant() {
            let token = self.next_token()?;
            self.tolerate_unexpected(&token)?;
        } else {
            self.expect(TokenKind::RightParen)?;
            if self.matches(TokenKind::Semicolon) {
                self.next_token()?;
            }
        }
        let loc = self.finalize(start, NodeType::DoWhileStatement);
        Ok(Stmt::DoWhile(DoWhileStmt {
            loc,
            body: Box::new(body),
            test: Box::new(test),
        }))
    }

    fn parse_while_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_comma_expression()?;
        let body = self.parse_iteration_body()?;
        let loc = self.finalize(start, NodeType::WhileStatement);
        Ok(Stmt::While(WhileStmt {
            loc,
            test: Box::new(test),
            body: Box::new(body),
        }))
    }

    /// `for (;;)`, `for (… in …)`, `for (… of …)` and `for await (… of …)`.
    fn parse_for_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        self.expect(TokenKind::For)?;
        let mut is_await = false;
        if self.matches_contextual("await") {
            if !self.flags.is_async {
                return Err(self.unexpected(&self.lookahead));
            }
            self.next_token()?;
            is_await = true;
        }
        self.expect(TokenKind::LeftParen)?;

        let mut init = None;
        if self.matches(TokenKind::Semicolon) {
            self.next_token()?;
        } else {
            let declaration = self.matches(TokenKind::Var)
                || self.matches(TokenKind::Const)
                || (self.matches(TokenKind::Let) && self.is_lexical_declaration()?);
            if declaration {
                let decl = self.parse_for_declaration()?;
                if let Some(head) = self.loop_head_keyword(&[LoopHead::ForIn, LoopHead::ForOf]) {
                    let left = self.check_loop_declaration(decl, head)?;
                    return self.finish_for_in_of(start, head, is_await, left);
                }
                for declarator in &decl.declarators {
                    self.check_declarator_initializer(decl.kind, declarator)?;
                }
                init = Some(ForInit::VarDecl(decl));
            } else {
                let init_token = self.lookahead.clone();
                let expr = self.with_flags(
                    |f| f.allow_in = false,
                    |p| p.inherit_cover_grammar(|p| p.parse_assignment_expression()),
                )?;
                if let Some(head) = self.loop_head_keyword(&[LoopHead::ForIn, LoopHead::ForOf]) {
                    if head == LoopHead::ForOf
                        && !is_await
                        && init_token.is_contextual("async")
                        && matches!(&expr, Expr::Ident(id) if id.name == "async")
                    {
                        return Err(self.unexpected(&self.lookahead));
                    }
                    let left = self.check_loop_target(expr, head)?;
                    return self.finish_for_in_of(start, head, is_await, left);
                }
                if let Some(pos) = self.cover.first_cover_initialized_name_error.take() {
                    return Err(self.cover_initialized_name_error(pos));
                }
                init = Some(ForInit::Expr(Box::new(self.finish_for_init_sequence(expr)?)));
            }
            self.expect(TokenKind::Semicolon)?;
        }

        if is_await {
            return Err(self.unexpected(&self.lookahead));
        }
        let test = if self.matches(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_comma_expression()?))
        };
        self.expect(TokenKind::Semicolon)?;
        let update = if self.matches(TokenKind::RightParen) {
            None
        } else {
            Some(Box::new(self.parse_comma_expression()?))
        };
        let body = self.parse_iteration_body()?;
        let loc = self.finalize(start, NodeType::ForStatement);
        Ok(Stmt::For(ForStmt {
            loc,
            init,
            test,
            update,
            body: Box::new(body),
        }))
    }

    /// `var`/`let`/`const` declarators in a loop head, parsed with `in`
    /// disabled.
    fn parse_for_declaration(&mut self) -> QuillResult<VarDecl> {
        let start = self.create_node();
        let kind = match self.next_token()?.kind {
            TokenKind::Var => VarKind::Var,
            TokenKind::Let => VarKind::Let,
            _ => VarKind::Const,
        };
        let declarators =
            self.with_flags(|f| f.allow_in = false, |p| p.parse_binding_list(kind, true))?;
        let loc = self.finalize(start, NodeType::VariableDeclaration);
        Ok(VarDecl {
            loc,
            kind,
            declarators,
            is_static: false,
            attributes: Vec::new(),
        })
    }

    /// The `in` / `of` keyword of a loop head, if the lookahead is one of
    /// the accepted heads.
    fn loop_head_keyword(&self, accepted: &[LoopHead]) -> Option<LoopHead> {
        let head = if self.matches(TokenKind::In) {
            if accepted.contains(&LoopHead::ForEach) {
                LoopHead::ForEach
            } else {
                LoopHead::ForIn
            }
        } else if self.matches_contextual("of") {
            LoopHead::ForOf
        } else {
            return None;
        };
        accepted.contains(&head).then_some(head)
    }

    /// A declaration on the left of `in`/`of`: one declarator, and an
    /// initializer only in the sloppy `for (var x = 1 in o)` form.
    fn check_loop_declaration(
        &mut self,
        decl: VarDecl,
        head: LoopHead,
    ) -> QuillResult<ForInOfLeft> {
        if decl.declarators.len() != 1 {
            return Err(self.error_at(
                decl.loc.start,
                &messages::for_in_of_loop_initializer(head.name()),
                ErrorKind::Syntax,
            ));
        }
        let declarator = &decl.declarators[0];
        if declarator.init.is_some() {
            let annex_b = head == LoopHead::ForIn
                && decl.kind == VarKind::Var
                && !self.flags.strict
                && matches!(declarator.id, Pat::Ident(_));
            if !annex_b {
                return Err(self.error_at(
                    decl.loc.start,
                    &messages::for_in_of_loop_initializer(head.name()),
                    ErrorKind::Syntax,
                ));
            }
        }
        Ok(ForInOfLeft::VarDecl(decl))
    }

    /// An expression on the left of `in`/`of`: must be an assignment
    /// target; literals are reinterpreted as patterns.
    fn check_loop_target(&mut self, expr: Expr, head: LoopHead) -> QuillResult<ForInOfLeft> {
        if !self.cover.is_assignment_target || matches!(expr, Expr::Assign(_)) {
            let message = if head == LoopHead::ForIn {
                messages::INVALID_LHS_IN_FOR_IN
            } else {
                messages::INVALID_LHS_IN_FOR_LOOP
            };
            self.tolerate_at(expr.loc().start, message, ErrorKind::Syntax)?;
        }
        Ok(ForInOfLeft::Pat(self.reinterpret_as_for_target(expr)))
    }

    fn finish_for_in_of(
        &mut self,
        start: Position,
        head: LoopHead,
        is_await: bool,
        left: ForInOfLeft,
    ) -> QuillResult<Stmt> {
        self.next_token()?;
        let right = if head == LoopHead::ForOf {
            self.with_flags(
                |f| f.allow_in = true,
                |p| p.isolate_cover_grammar(|p| p.parse_assignment_expression()),
            )?
        } else {
            self.with_flags(|f| f.allow_in = true, |p| p.parse_comma_expression())?
        };
        if is_await && head != LoopHead::ForOf {
            return Err(self.unexpected(&self.lookahead));
        }
        let body = self.parse_iteration_body()?;
        match head {
            LoopHead::ForOf => {
                let loc = self.finalize(start, NodeType::ForOfStatement);
                Ok(Stmt::ForOf(ForOfStmt {
                    loc,
                    is_await,
                    left,
                    right: Box::new(right),
                    body: Box::new(body),
                }))
            }
            LoopHead::ForIn => {
                let loc = self.finalize(start, NodeType::ForInStatement);
                Ok(Stmt::ForIn(ForInStmt {
                    loc,
                    left,
                    right: Box::new(right),
                    body: Box::new(body),
                }))
            }
            LoopHead::ForEach => {
                let loc = self.finalize(start, NodeType::ForEachStatement);
                Ok(Stmt::ForEach(ForEachStmt {
                    loc,
                    left,
                    right: Box::new(right),
                    body: Box::new(body),
                }))
            }
        }
    }

    /// `for (a, b; …)`: the first initializer expression has been parsed
    /// already.
    fn finish_for_init_sequence(&mut self, first: Expr) -> QuillResult<Expr> {
        if !self.matches(TokenKind::Comma) {
            return Ok(first);
        }
        let start = first.loc().start;
        let mut expressions = vec![first];
        while self.matches(TokenKind::Comma) {
            self.next_token()?;
            expressions.push(self.with_flags(
                |f| f.allow_in = false,
                |p| p.isolate_cover_grammar(|p| p.parse_assignment_expression()),
            )?);
        }
        let loc = self.finalize(start, NodeType::SequenceExpression);
        Ok(Expr::Sequence(Box::new(SequenceExpr { loc, expressions })))
    }

    /// `foreach (x in values) body`: iterates the values of `values`.
    fn parse_foreach_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        self.expect(TokenKind::Foreach)?;
        self.expect(TokenKind::LeftParen)?;
        let declaration = self.matches(TokenKind::Var)
            || self.matches(TokenKind::Const)
            || (self.matches(TokenKind::Let) && self.is_lexical_declaration()?);
        let left = if declaration {
            let decl = self.parse_for_declaration()?;
            if self.loop_head_keyword(&[LoopHead::ForEach]).is_none() {
                return Err(self.unexpected(&self.lookahead));
            }
            self.check_loop_declaration(decl, LoopHead::ForEach)?
        } else {
            let expr = self.with_flags(
                |f| f.allow_in = false,
                |p| p.inherit_cover_grammar(|p| p.parse_lhs_expression_allow_call()),
            )?;
            if self.loop_head_keyword(&[LoopHead::ForEach]).is_none() {
                return Err(self.unexpected(&self.lookahead));
            }
            self.check_loop_target(expr, LoopHead::ForEach)?
        };
        self.finish_for_in_of(start, LoopHead::ForEach, false, left)
    }

    fn parse_continue_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        let keyword = self.expect(TokenKind::Continue)?;
        let mut label = None;
        if self.matches(TokenKind::Identifier) && !self.has_line_terminator() {
            let token = self.next_token()?;
            let id = self.finalize_ident(&token);
            if !self.labels.contains(&id.name) {
                return Err(self.error_at(
                    id.loc.start,
                    &messages::unknown_label(&id.name),
                    ErrorKind::Syntax,
                ));
            }
            if !self.labels.is_loop_label(&id.name) {
                return Err(self.error_at(
                    keyword.span.start,
                    messages::ILLEGAL_CONTINUE,
                    ErrorKind::Syntax,
                ));
            }
            label = Some(id);
        }
        if !self.flags.in_iteration {
            return Err(self.error_at(
                keyword.span.start,
                messages::ILLEGAL_CONTINUE,
                ErrorKind::Syntax,
            ));
        }
        self.consume_semicolon()?;
        let loc = self.finalize(start, NodeType::ContinueStatement);
        Ok(Stmt::Continue(ContinueStmt { loc, label }))
    }

    fn parse_break_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        let keyword = self.expect(TokenKind::Break)?;
        let mut label = None;
        if self.matches(TokenKind::Identifier) && !self.has_line_terminator() {
            let token = self.next_token()?;
            let id = self.finalize_ident(&token);
            if !self.labels.contains(&id.name) {
                return Err(self.error_at(
                    id.loc.start,
                    &messages::unknown_label(&id.name),
                    ErrorKind::Syntax,
                ));
            }
            label = Some(id);
        } else if !self.flags.in_iteration && !self.flags.in_switch {
            return Err(self.error_at(
                keyword.span.start,
                messages::ILLEGAL_BREAK,
                ErrorKind::Syntax,
            ));
        }
        self.consume_semicolon()?;
        let loc = self.finalize(start, NodeType::BreakStatement);
        Ok(Stmt::Break(BreakStmt { loc, label }))
    }

    fn parse_return_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        let keyword = self.expect(TokenKind::Return)?;
        if !self.flags.in_function_body && !self.allow_return_outside_function {
            self.tolerate_at(keyword.span.start, messages::ILLEGAL_RETURN, ErrorKind::Syntax)?;
        }
        let has_argument = !self.matches(TokenKind::Semicolon)
            && !self.matches(TokenKind::RightBrace)
            && !self.matches(TokenKind::Eof)
            && !self.has_line_terminator();
        let argument = if has_argument {
            Some(Box::new(self.parse_comma_expression()?))
        } else {
            None
        };
        self.consume_semicolon()?;
        let loc = self.finalize(start, NodeType::ReturnStatement);
        Ok(Stmt::Return(ReturnStmt { loc, argument }))
    }

    fn parse_throw_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        self.expect(TokenKind::Throw)?;
        if self.has_line_terminator() {
            return Err(self.error_at(
                self.last_marker,
                messages::NEWLINE_AFTER_THROW,
                ErrorKind::Syntax,
            ));
        }
        let argument = self.parse_comma_expression()?;
        self.consume_semicolon()?;
        let loc = self.finalize(start, NodeType::ThrowStatement);
        Ok(Stmt::Throw(ThrowStmt {
            loc,
            argument: Box::new(argument),
        }))
    }

    fn parse_switch_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        self.expect(TokenKind::Switch)?;
        self.expect(TokenKind::LeftParen)?;
        let discriminant = self.parse_comma_expression()?;
        self.expect(TokenKind::RightParen)?;
        self.expect(TokenKind::LeftBrace)?;

        let cases = self.with_flags(
            |f| f.in_switch = true,
            |p| {
                let mut cases = Vec::new();
                let mut seen_default = false;
                while !p.matches(TokenKind::RightBrace) {
                    let case = p.parse_switch_case()?;
                    if case.test.is_none() {
                        if seen_default {
                            return Err(p.error_at(
                                case.loc.start,
                                messages::MULTIPLE_DEFAULTS_IN_SWITCH,
                                ErrorKind::Syntax,
                            ));
                        }
                        seen_default = true;
                    }
                    cases.push(case);
                }
                Ok(cases)
            },
        )?;
        self.expect(TokenKind::RightBrace)?;
        let loc = self.finalize(start, NodeType::SwitchStatement);
        Ok(Stmt::Switch(SwitchStmt {
            loc,
            discriminant: Box::new(discriminant),
            cases,
        }))
    }

    fn parse_switch_case(&mut self) -> QuillResult<SwitchCase> {
        let start = self.create_node();
        let test = if self.matches(TokenKind::Default) {
            self.next_token()?;
            None
        } else {
            self.expect(TokenKind::Case)?;
            Some(self.parse_comma_expression()?)
        };
        self.expect(TokenKind::Colon)?;
        let mut consequent = Vec::new();
        while !matches!(
            self.lookahead.kind,
            TokenKind::RightBrace | TokenKind::Case | TokenKind::Default | TokenKind::Eof
        ) {
            consequent.push(self.parse_statement_list_item()?);
        }
        let loc = self.finalize(start, NodeType::SwitchCase);
        Ok(SwitchCase {
            loc,
            test,
            consequent,
        })
    }

    fn parse_try_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        let keyword = self.expect(TokenKind::Try)?;
        let block = self.parse_block()?;
        let handler = if self.matches(TokenKind::Catch) {
            Some(self.parse_catch_clause()?)
        } else {
            None
        };
        let finalizer = if self.matches(TokenKind::Finally) {
            self.next_token()?;
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_at(
                keyword.span.start,
                messages::NO_CATCH_OR_FINALLY,
                ErrorKind::Syntax,
            ));
        }
        let loc = self.finalize(start, NodeType::TryStatement);
        Ok(Stmt::Try(TryStmt {
            loc,
            block,
            handler,
            finalizer,
        }))
    }

    fn parse_catch_clause(&mut self) -> QuillResult<CatchClause> {
        let start = self.create_node();
        self.expect(TokenKind::Catch)?;
        let mut param = None;
        if self.matches(TokenKind::LeftParen) {
            self.next_token()?;
            if self.matches(TokenKind::RightParen) {
                return Err(self.unexpected(&self.lookahead));
            }
            let pattern = self.parse_binding_pattern(None)?;
            let mut names = Vec::new();
            pattern.bound_names(&mut names);
            let mut seen: Vec<&str> = Vec::with_capacity(names.len());
            for name in names {
                if seen.contains(&name.name.as_str()) {
                    self.tolerate_at(
                        name.loc.start,
                        &messages::duplicate_binding(&name.name),
                        ErrorKind::Syntax,
                    )?;
                }
                seen.push(&name.name);
                if self.flags.strict && is_restricted_word(&name.name) {
                    self.tolerate_at(
                        name.loc.start,
                        messages::STRICT_CATCH_VARIABLE,
                        ErrorKind::Strict,
                    )?;
                }
            }
            self.expect(TokenKind::RightParen)?;
            param = Some(pattern);
        }
        let body = self.parse_block()?;
        let loc = self.finalize(start, NodeType::CatchClause);
        Ok(CatchClause { loc, param, body })
    }

    fn parse_with_statement(&mut self) -> QuillResult<Stmt> {
        let start = self.create_node();
        if self.flags.strict {
            self.tolerate_at(start, messages::STRICT_MODE_WITH, ErrorKind::Strict)?;
        }
        self.expect(TokenKind::With)?;
        self.expect(TokenKind::LeftParen)?;
        let object = self.parse_comma_expression()?;
        let body = match self.recover_missing_paren()? {
            Some(empty) => empty,
            None => self.parse_statement()?,
        };
        let loc = self.finalize(start, NodeType::WithStatement);
        Ok(Stmt::With(WithStmt {
            loc,
            object: Box::new(object),
            body: Box::new(body),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::parser::Parser;
    use crate::parser::ast::{
        Expr, ForInOfLeft, ForInit, IncludeKind, Pat, Program, ProgramItem, Stmt, VarKind,
    };
    use crate::parser::messages;

    fn script(source: &str) -> Program {
        Parser::new(source, ParserOptions::new())
            .parse_script(false)
            .unwrap_or_else(|e| panic!("{source}: {e}"))
    }

    fn statements(source: &str) -> Vec<Stmt> {
        script(source)
            .body
            .into_iter()
            .map(|item| match item {
                ProgramItem::Stmt(stmt) => stmt,
                other => panic!("unexpected module item {other:?}"),
            })
            .collect()
    }

    fn error(source: &str) -> String {
        let err = Parser::new(source, ParserOptions::new())
            .parse_script(false)
            .expect_err(source);
        err.as_parse_error().unwrap().description.clone()
    }

    #[test]
    fn test_asi_after_return() {
        let body = statements("function f() { return\na }");
        let Stmt::FnDecl(f) = &body[0] else { panic!() };
        assert_eq!(f.body.body.len(), 2);
        let Stmt::Return(ret) = &f.body.body[0] else { panic!() };
        assert!(ret.argument.is_none());

        let body = statements("function f() { return a }");
        let Stmt::FnDecl(f) = &body[0] else { panic!() };
        assert_eq!(f.body.body.len(), 1);
    }

    #[test]
    fn test_let_is_contextual() {
        let body = statements("let = 1; let x = 2; let\ny = 3;");
        assert!(matches!(body[0], Stmt::Expr(_)));
        let Stmt::VarDecl(decl) = &body[1] else { panic!() };
        assert_eq!(decl.kind, VarKind::Let);
        assert!(matches!(body[2], Stmt::VarDecl(_)));
    }

    #[test]
    fn test_declaration_initializers() {
        assert_eq!(error("const a;"), messages::declaration_missing_initializer("const"));
        assert_eq!(
            error("var [a];"),
            messages::declaration_missing_initializer("destructuring")
        );
        assert_eq!(
            error("for (const a;;) {}"),
            messages::declaration_missing_initializer("const")
        );
        statements("for (const a of b) {} for (const k in o) {}");
    }

    #[test]
    fn test_for_variants() {
        let body = statements(
            "for (var i = 0; i < n; i++) {}
             for (a, b; ;) break;
             for (x in o);
             for ([a, b] of pairs);
             for (let {k} of list);
             for (var j = 0 in o);",
        );
        let Stmt::For(c_style) = &body[0] else { panic!() };
        assert!(matches!(c_style.init, Some(ForInit::VarDecl(_))));
        let Stmt::For(sequence) = &body[1] else { panic!() };
        let Some(ForInit::Expr(init)) = &sequence.init else { panic!() };
        assert!(matches!(**init, Expr::Sequence(_)));
        assert!(matches!(body[2], Stmt::ForIn(_)));
        let Stmt::ForOf(of) = &body[3] else { panic!() };
        assert!(matches!(of.left, ForInOfLeft::Pat(Pat::Array(_))));
        assert!(matches!(body[4], Stmt::ForOf(_)));
        assert!(matches!(body[5], Stmt::ForIn(_)));
    }

    #[test]
    fn test_for_head_errors() {
        assert_eq!(
            error("for (let a = 1 of b);"),
            messages::for_in_of_loop_initializer("for-of")
        );
        assert_eq!(
            error("for (var a, b in o);"),
            messages::for_in_of_loop_initializer("for-in")
        );
        assert_eq!(error("for (a + b in o);"), messages::INVALID_LHS_IN_FOR_IN);
        assert_eq!(error("for (f() of o);"), messages::INVALID_LHS_IN_FOR_LOOP);
        assert_eq!(error("for await (x of y);"), messages::UNEXPECTED_IDENTIFIER);
    }

    #[test]
    fn test_for_await_in_async_function() {
        let body = statements("async function f() { for await (const x of xs) {} }");
        let Stmt::FnDecl(f) = &body[0] else { panic!() };
        let Stmt::ForOf(of) = &f.body.body[0] else { panic!() };
        assert!(of.is_await);
    }

    #[test]
    fn test_foreach() {
        let body = statements("foreach (var v in values) sum += v; foreach (item in list) {}");
        let Stmt::ForEach(each) = &body[0] else { panic!() };
        assert!(matches!(each.left, ForInOfLeft::VarDecl(_)));
        assert!(matches!(body[1], Stmt::ForEach(_)));
        assert_eq!(
            error("foreach (var v = 1 in values);"),
            messages::for_in_of_loop_initializer("foreach")
        );
        assert_eq!(error("foreach (v of values);"), messages::UNEXPECTED_IDENTIFIER);
    }

    #[test]
    fn test_labels() {
        let body = statements("a: b: while (x) { continue a; } c: { break c; }");
        let Stmt::Labeled(a) = &body[0] else { panic!() };
        assert_eq!(a.label.name, "a");
        assert!(matches!(*a.body, Stmt::Labeled(_)));
        assert_eq!(error("a: { continue a; }"), messages::ILLEGAL_CONTINUE);
        assert_eq!(error("a: a: ;"), messages::label_redeclaration("a"));
        assert_eq!(error("while (1) break b;"), messages::unknown_label("b"));
        assert_eq!(error("break;"), messages::ILLEGAL_BREAK);
        assert_eq!(error("continue;"), messages::ILLEGAL_CONTINUE);
    }

    #[test]
    fn test_switch_and_try() {
        let body = statements(
            "switch (x) { case 1: a(); break; default: b(); case 2: }
             try { a(); } catch { b(); } finally { c(); }
             try {} catch ([e, f]) {}",
        );
        let Stmt::Switch(switch) = &body[0] else { panic!() };
        assert_eq!(switch.cases.len(), 3);
        assert!(switch.cases[1].test.is_none());
        let Stmt::Try(t) = &body[1] else { panic!() };
        assert!(t.handler.as_ref().unwrap().param.is_none());
        assert!(t.finalizer.is_some());

        assert_eq!(
            error("switch (x) { default: default: }"),
            messages::MULTIPLE_DEFAULTS_IN_SWITCH
        );
        assert_eq!(error("try {}"), messages::NO_CATCH_OR_FINALLY);
        assert_eq!(error("try {} catch ([e, e]) {}"), messages::duplicate_binding("e"));
        assert_eq!(error("throw\nx;"), messages::NEWLINE_AFTER_THROW);
    }

    #[test]
    fn test_strict_statements() {
        let strict = |source: &str| {
            Parser::new(source, ParserOptions::new())
                .parse_script(true)
                .expect_err(source)
                .as_parse_error()
                .unwrap()
                .description
                .clone()
        };
        assert_eq!(strict("with (o) {}"), messages::STRICT_MODE_WITH);
        assert_eq!(strict("if (x) function f() {}"), messages::STRICT_FUNCTION);
        assert_eq!(strict("try {} catch (eval) {}"), messages::STRICT_CATCH_VARIABLE);
        assert_eq!(error("if (x) function* g() {}"), messages::GENERATOR_IN_LEGACY_CONTEXT);
        assert_eq!(
            error("while (x) async function f() {}"),
            messages::ASYNC_FUNCTION_IN_SINGLE_STATEMENT_CONTEXT
        );
    }

    #[test]
    fn test_directives() {
        let program = script("'use strict'; \"other\"; 'x' + 1;");
        assert!(program.strict);
        let directives: Vec<_> = program
            .body
            .iter()
            .map(|item| match item {
                ProgramItem::Stmt(Stmt::Expr(e)) => e.directive.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(
            directives,
            [Some("use strict".to_string()), Some("other".to_string()), None]
        );
        assert!(!script("('use strict'); with (a) {}").strict);
    }

    #[test]
    fn test_static_locals() {
        let body = statements("function counter() { static let n = 0; return ++n; }");
        let Stmt::FnDecl(f) = &body[0] else { panic!() };
        let Stmt::VarDecl(decl) = &f.body.body[0] else { panic!() };
        assert!(decl.is_static);
        assert_eq!(decl.loc.start.offset, 21);
        assert_eq!(error("static var x;"), messages::STATIC_LOCAL_OUTSIDE_FUNCTION);
        // `static` on its own line is just an identifier.
        assert_eq!(statements("function f() { static\nvar x; }").len(), 1);
    }

    #[test]
    fn test_attributes() {
        let body =
            statements("@Export @meta.tag(1, 'a') function f() {} @Sealed class C { @Inject dep; }");
        let Stmt::FnDecl(f) = &body[0] else { panic!() };
        assert_eq!(f.attributes.len(), 2);
        assert_eq!(f.attributes[1].name(), "meta.tag");
        assert_eq!(f.attributes[1].arguments.as_ref().map(Vec::len), Some(2));
        assert_eq!(f.loc.start.offset, 0);
        let Stmt::ClassDecl(c) = &body[1] else { panic!() };
        assert_eq!(c.attributes[0].name(), "Sealed");
        assert_eq!(error("@Attr x = 1;"), messages::INVALID_ATTRIBUTE_TARGET);
    }

    #[test]
    fn test_include_directives() {
        let body = statements("include \"a.js\"; require 'b'; source \"c\"\nrequire('d');");
        let kinds: Vec<_> = body
            .iter()
            .filter_map(|s| match s {
                Stmt::Include(inc) => Some((inc.kind, inc.source.value.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            [
                (IncludeKind::Include, "a.js".to_string()),
                (IncludeKind::Require, "b".to_string()),
                (IncludeKind::Source, "c".to_string()),
            ]
        );
        assert!(matches!(body[3], Stmt::Expr(_)));
    }

    #[test]
    fn test_tolerant_recovery() {
        let mut parser = Parser::new(
            "x = 1 y = 2\nwhile (z w",
            ParserOptions::new().tolerant(true),
        );
        let program = parser.parse_script(false).unwrap();
        assert_eq!(program.body.len(), 3);
        let ProgramItem::Stmt(Stmt::While(w)) = &program.body[2] else { panic!() };
        assert!(matches!(*w.body, Stmt::Empty(_)));
        let (_, _, errors) = parser.finish();
        assert_eq!(errors.len(), 2);
    }
}
