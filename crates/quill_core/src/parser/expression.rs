//! Expression grammar.
//!
//! One method per precedence level, from [`parse_comma_expression`] down to
//! [`parse_primary_expression`].  Binary operators are folded with an
//! explicit operator stack instead of one method per level.
//!
//! [`parse_comma_expression`]: Parser::parse_comma_expression
//! [`parse_primary_expression`]: Parser::parse_primary_expression

use crate::error::{ErrorKind, QuillError, QuillResult};
use crate::parser::Parser;
use crate::parser::ast::{
    ArrayExpr, ArrowParamsExpr, AssignExpr, AssignOp, AwaitExpr, BigIntLit, BinaryExpr, BinaryOp,
    BoolLit, CallExpr, ChainExpr, ConditionalExpr, Expr, FinalizerBlock, ImportExpr, LogicalExpr,
    LogicalOp, MemberExpr, MemberKind, MemberProp, MetaPropExpr, NewExpr, NodeType, NullLit,
    NumLit, ObjectExpr, ObjectProp, PrivateIdent, Prop, PropKey, PropValue, RegExpLit,
    SequenceExpr, SpreadElement, StringLit, SuperExpr, TaggedTemplateExpr, TemplateElement,
    TemplateLit, ThisExpr, UnaryExpr, UnaryOp, UpdateExpr, UpdateOp, YieldExpr,
};
use crate::parser::function::MethodFlavor;
use crate::parser::messages;
use crate::parser::token::{
    Position, RegExpValue, Span, Token, TokenKind, TokenValue, is_restricted_word,
    is_strict_mode_reserved_word,
};

/// A binary or logical operator together with its binding power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfixOp {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

fn infix_operator(kind: TokenKind, allow_in: bool) -> Option<(InfixOp, u8)> {
    use InfixOp::{Binary, Logical};
    use TokenKind::*;
    let entry = match kind {
        QuestionQuestion => (Logical(LogicalOp::NullishCoalesce), 5),
        PipePipe => (Logical(LogicalOp::Or), 6),
        AmpersandAmpersand => (Logical(LogicalOp::And), 7),
        Pipe => (Binary(BinaryOp::BitOr), 8),
        Caret => (Binary(BinaryOp::BitXor), 9),
        Ampersand => (Binary(BinaryOp::BitAnd), 10),
        EqualEqual => (Binary(BinaryOp::Eq), 11),
        BangEqual => (Binary(BinaryOp::NotEq), 11),
        EqualEqualEqual => (Binary(BinaryOp::StrictEq), 11),
        BangEqualEqual => (Binary(BinaryOp::StrictNotEq), 11),
        Less => (Binary(BinaryOp::Lt), 12),
        Greater => (Binary(BinaryOp::Gt), 12),
        LessEqual => (Binary(BinaryOp::LtEq), 12),
        GreaterEqual => (Binary(BinaryOp::GtEq), 12),
        Instanceof => (Binary(BinaryOp::Instanceof), 12),
        In if allow_in => (Binary(BinaryOp::In), 12),
        LessLess => (Binary(BinaryOp::Shl), 13),
        GreaterGreater => (Binary(BinaryOp::Shr), 13),
        GreaterGreaterGreater => (Binary(BinaryOp::UShr), 13),
        Plus => (Binary(BinaryOp::Add), 14),
        Minus => (Binary(BinaryOp::Sub), 14),
        Star => (Binary(BinaryOp::Mul), 15),
        Slash => (Binary(BinaryOp::Div), 15),
        Percent => (Binary(BinaryOp::Rem), 15),
        _ => return None,
    };
    Some(entry)
}

fn assign_operator(kind: TokenKind) -> Option<AssignOp> {
    use TokenKind::*;
    let op = match kind {
        Equal => AssignOp::Assign,
        PlusEqual => AssignOp::AddAssign,
        MinusEqual => AssignOp::SubAssign,
        StarEqual => AssignOp::MulAssign,
        SlashEqual => AssignOp::DivAssign,
        PercentEqual => AssignOp::RemAssign,
        StarStarEqual => AssignOp::ExpAssign,
        LessLessEqual => AssignOp::ShlAssign,
        GreaterGreaterEqual => AssignOp::ShrAssign,
        GreaterGreaterGreaterEqual => AssignOp::UShrAssign,
        PipeEqual => AssignOp::BitOrAssign,
        CaretEqual => AssignOp::BitXorAssign,
        AmpersandEqual => AssignOp::BitAndAssign,
        AmpersandAmpersandEqual => AssignOp::LogicalAndAssign,
        PipePipeEqual => AssignOp::LogicalOrAssign,
        QuestionQuestionEqual => AssignOp::NullishAssign,
        _ => return None,
    };
    Some(op)
}

fn unary_operator(kind: TokenKind) -> Option<UnaryOp> {
    let op = match kind {
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Delete => UnaryOp::Delete,
        TokenKind::Void => UnaryOp::Void,
        TokenKind::Typeof => UnaryOp::Typeof,
        _ => return None,
    };
    Some(op)
}

/// Operand shapes `++`, `--` and compound assignment accept.
fn is_simple_target(expr: &Expr) -> bool {
    matches!(expr, Expr::Ident(_) | Expr::Member(_))
}

fn is_private_member(expr: &Expr) -> bool {
    match expr {
        Expr::Member(m) => matches!(m.property, MemberProp::Private(_)),
        Expr::Chain(c) => is_private_member(&c.expression),
        _ => false,
    }
}

/// Tokens that may begin a property name in an object literal or class
/// body.
pub(super) fn starts_property_key(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::StringLiteral
            | TokenKind::NumericLiteral
            | TokenKind::BigIntLiteral
            | TokenKind::LeftBracket
            | TokenKind::PrivateIdentifier
    ) || kind.is_identifier_name()
}

impl<'src> Parser<'src> {
    // ── Comma and assignment ────────────────────────────────────────────────

    /// `Expression`: one or more assignment expressions joined by `,`.
    pub(super) fn parse_comma_expression(&mut self) -> QuillResult<Expr> {
        let start = self.create_node();
        let expr = self.isolate_cover_grammar(|p| p.parse_assignment_expression())?;
        if !self.matches(TokenKind::Comma) {
            return Ok(expr);
        }
        let mut expressions = vec![expr];
        while self.matches(TokenKind::Comma) {
            self.next_token()?;
            expressions.push(self.isolate_cover_grammar(|p| p.parse_assignment_expression())?);
        }
        let loc = self.finalize(start, NodeType::SequenceExpression);
        Ok(Expr::Sequence(Box::new(SequenceExpr { loc, expressions })))
    }

    /// `AssignmentExpression`, including arrow functions and `yield`.
    pub(super) fn parse_assignment_expression(&mut self) -> QuillResult<Expr> {
        self.descend(|p| p.parse_assignment_expression_inner())
    }

    fn parse_assignment_expression_inner(&mut self) -> QuillResult<Expr> {
        if self.flags.allow_yield && self.matches(TokenKind::Yield) {
            return self.parse_yield_expression();
        }

        let start_token = self.lookahead.clone();
        let mut expr = self.parse_conditional_expression()?;

        // async x => …
        if start_token.is_contextual("async")
            && matches!(&expr, Expr::Ident(id) if id.loc.end == start_token.span.end)
            && !self.has_line_terminator()
            && matches!(self.lookahead.kind, TokenKind::Identifier | TokenKind::Yield)
        {
            let param = self.parse_primary_expression()?;
            expr = Expr::ArrowParams(Box::new(ArrowParamsExpr {
                loc: Span {
                    start: start_token.span.start,
                    end: self.last_marker,
                },
                params: vec![param],
                is_async: true,
            }));
        }

        if matches!(expr, Expr::ArrowParams(_)) || self.matches(TokenKind::Arrow) {
            return self.parse_arrow_function(start_token.span.start, expr);
        }

        let Some(op) = assign_operator(self.lookahead.kind) else {
            return Ok(expr);
        };

        if !self.cover.is_assignment_target {
            self.tolerate_error(messages::INVALID_LHS_IN_ASSIGNMENT)?;
        }
        if self.flags.strict
            && let Expr::Ident(id) = &expr
        {
            if is_restricted_word(&id.name) {
                self.tolerate_at(
                    start_token.span.start,
                    messages::STRICT_LHS_ASSIGNMENT,
                    ErrorKind::Strict,
                )?;
            }
            if is_strict_mode_reserved_word(&id.name) {
                self.tolerate_at(
                    start_token.span.start,
                    messages::STRICT_RESERVED_WORD,
                    ErrorKind::Strict,
                )?;
            }
        }

        let left = if op == AssignOp::Assign {
            self.reinterpret_as_assignment_target(expr)?
        } else {
            if self.cover.is_assignment_target && !is_simple_target(&expr) {
                self.tolerate_at(
                    expr.loc().start,
                    messages::INVALID_LHS_IN_ASSIGNMENT,
                    ErrorKind::Syntax,
                )?;
            }
            self.cover.reject();
            Self::simple_assignment_target(expr)
        };

        self.next_token()?;
        let right = self.isolate_cover_grammar(|p| p.parse_assignment_expression())?;
        let loc = self.finalize(start_token.span.start, NodeType::AssignmentExpression);
        self.cover.is_assignment_target = false;
        self.cover.first_cover_initialized_name_error = None;
        Ok(Expr::Assign(Box::new(AssignExpr {
            loc,
            op,
            left,
            right: Box::new(right),
        })))
    }

    fn parse_yield_expression(&mut self) -> QuillResult<Expr> {
        let keyword = self.next_token()?;
        if self.flags.in_parameters {
            self.tolerate_at(
                keyword.span.start,
                messages::YIELD_IN_PARAMETERS,
                ErrorKind::Syntax,
            )?;
        }

        let mut delegate = false;
        let mut argument = None;
        if !self.has_line_terminator() {
            if self.matches(TokenKind::Star) {
                self.next_token()?;
                delegate = true;
                argument = Some(Box::new(self.parse_assignment_expression()?));
            } else if self.is_start_of_expression() {
                argument = Some(Box::new(self.parse_assignment_expression()?));
            }
        }
        self.cover.reject();
        let loc = self.finalize(keyword.span.start, NodeType::YieldExpression);
        Ok(Expr::Yield(Box::new(YieldExpr {
            loc,
            delegate,
            argument,
        })))
    }

    /// Whether the lookahead can begin an expression; decides if `yield`
    /// has an operand.
    fn is_start_of_expression(&self) -> bool {
        use TokenKind::*;
        matches!(
            self.lookahead.kind,
            LeftBracket
                | LeftParen
                | LeftBrace
                | Plus
                | Minus
                | Bang
                | Tilde
                | PlusPlus
                | MinusMinus
                | Slash
                | SlashEqual
                | PrivateIdentifier
                | Class
                | Delete
                | Function
                | Let
                | New
                | Super
                | This
                | Typeof
                | Void
                | Yield
                | Import
                | True
                | False
                | Null
                | Identifier
                | NumericLiteral
                | BigIntLiteral
                | StringLiteral
                | NoSubstitutionTemplate
                | TemplateHead
                | RegExpLiteral
        )
    }

    // ── Operators ───────────────────────────────────────────────────────────

    fn parse_conditional_expression(&mut self) -> QuillResult<Expr> {
        let start = self.create_node();
        let test = self.inherit_cover_grammar(|p| p.parse_binary_expression())?;
        if !self.matches(TokenKind::Question) {
            return Ok(test);
        }
        self.next_token()?;
        let consequent = self.with_flags(
            |f| f.allow_in = true,
            |p| p.isolate_cover_grammar(|p| p.parse_assignment_expression()),
        )?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.isolate_cover_grammar(|p| p.parse_assignment_expression())?;
        self.cover.reject();
        let loc = self.finalize(start, NodeType::ConditionalExpression);
        Ok(Expr::Conditional(Box::new(ConditionalExpr {
            loc,
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })))
    }

    /// Binary and logical operators, folded with an operator stack.  `??`
    /// may not share an unparenthesized chain with `&&` or `||`.
    fn parse_binary_expression(&mut self) -> QuillResult<Expr> {
        let start = self.create_node();
        let left = self.inherit_cover_grammar(|p| p.parse_exponentiation_expression())?;
        let Some((op, prec)) = infix_operator(self.lookahead.kind, self.flags.allow_in) else {
            return Ok(left);
        };

        let mut has_nullish = op == InfixOp::Logical(LogicalOp::NullishCoalesce);
        let mut has_and_or = matches!(op, InfixOp::Logical(LogicalOp::And | LogicalOp::Or));
        self.next_token()?;
        self.cover.reject();

        let mut markers = vec![start, self.create_node()];
        let right = self.isolate_cover_grammar(|p| p.parse_exponentiation_expression())?;
        let mut operands = vec![left, right];
        let mut operators = vec![(op, prec)];

        while let Some((op, prec)) = infix_operator(self.lookahead.kind, self.flags.allow_in) {
            let nullish = op == InfixOp::Logical(LogicalOp::NullishCoalesce);
            let and_or = matches!(op, InfixOp::Logical(LogicalOp::And | LogicalOp::Or));
            if (nullish && has_and_or) || (and_or && has_nullish) {
                return Err(self.error_at(
                    self.lookahead.span.start,
                    messages::MIXED_COALESCE,
                    ErrorKind::Syntax,
                ));
            }
            has_nullish |= nullish;
            has_and_or |= and_or;

            while operators.last().is_some_and(|&(_, top)| prec <= top) {
                self.reduce_binary(&mut operands, &mut operators, &mut markers)?;
            }
            self.next_token()?;
            operators.push((op, prec));
            markers.push(self.create_node());
            operands.push(self.isolate_cover_grammar(|p| p.parse_exponentiation_expression())?);
        }

        while !operators.is_empty() {
            self.reduce_binary(&mut operands, &mut operators, &mut markers)?;
        }
        operands
            .pop()
            .ok_or_else(|| QuillError::Internal("empty operand stack".into()))
    }

    fn reduce_binary(
        &mut self,
        operands: &mut Vec<Expr>,
        operators: &mut Vec<(InfixOp, u8)>,
        markers: &mut Vec<Position>,
    ) -> QuillResult<()> {
        let (Some(right), Some(left), Some((op, _))) =
            (operands.pop(), operands.pop(), operators.pop())
        else {
            return Err(QuillError::Internal("unbalanced operator stack".into()));
        };
        markers.pop();
        let start = markers.last().copied().unwrap_or(left.loc().start);
        let end = right.loc().end;
        let node = match op {
            InfixOp::Binary(op) => {
                let loc = self.finalize_between(start, end, NodeType::BinaryExpression);
                Expr::Binary(Box::new(BinaryExpr {
                    loc,
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }
            InfixOp::Logical(op) => {
                let loc = self.finalize_between(start, end, NodeType::LogicalExpression);
                Expr::Logical(Box::new(LogicalExpr {
                    loc,
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }
        };
        operands.push(node);
        Ok(())
    }

    /// `**`, right-associative.  An unparenthesized unary operand is an
    /// error.
    fn parse_exponentiation_expression(&mut self) -> QuillResult<Expr> {
        let start = self.create_node();
        let parenthesized = self.matches(TokenKind::LeftParen);
        let base = self.inherit_cover_grammar(|p| p.parse_unary_expression())?;
        if !self.matches(TokenKind::StarStar) {
            return Ok(base);
        }
        if !parenthesized && matches!(base, Expr::Unary(_) | Expr::Await(_)) {
            return Err(self.error_at(
                self.lookahead.span.start,
                messages::UNARY_BEFORE_EXPONENT,
                ErrorKind::Syntax,
            ));
        }
        self.next_token()?;
        self.cover.reject();
        let exponent = self.isolate_cover_grammar(|p| p.parse_exponentiation_expression())?;
        let loc = self.finalize(start, NodeType::BinaryExpression);
        Ok(Expr::Binary(Box::new(BinaryExpr {
            loc,
            op: BinaryOp::Exp,
            left: Box::new(base),
            right: Box::new(exponent),
        })))
    }

    fn parse_unary_expression(&mut self) -> QuillResult<Expr> {
        if let Some(op) = unary_operator(self.lookahead.kind) {
            let operator = self.next_token()?;
            let argument =
                self.descend(|p| p.inherit_cover_grammar(|p| p.parse_unary_expression()))?;
            if op == UnaryOp::Delete {
                if self.flags.strict && matches!(argument, Expr::Ident(_)) {
                    self.tolerate_at(
                        operator.span.start,
                        messages::STRICT_DELETE,
                        ErrorKind::Strict,
                    )?;
                }
                if is_private_member(&argument) {
                    self.tolerate_at(
                        operator.span.start,
                        messages::DELETE_PRIVATE_FIELD,
                        ErrorKind::Syntax,
                    )?;
                }
            }
            self.cover.reject();
            let loc = self.finalize(operator.span.start, NodeType::UnaryExpression);
            return Ok(Expr::Unary(Box::new(UnaryExpr {
                loc,
                op,
                argument: Box::new(argument),
            })));
        }
        if self.flags.is_async && self.matches_contextual("await") {
            return self.parse_await_expression();
        }
        self.parse_update_expression()
    }

    fn parse_await_expression(&mut self) -> QuillResult<Expr> {
        let keyword = self.next_token()?;
        if self.flags.in_parameters {
            self.tolerate_at(
                keyword.span.start,
                messages::AWAIT_IN_PARAMETERS,
                ErrorKind::Syntax,
            )?;
        }
        let argument = self.descend(|p| p.parse_unary_expression())?;
        self.cover.reject();
        let loc = self.finalize(keyword.span.start, NodeType::AwaitExpression);
        Ok(Expr::Await(Box::new(AwaitExpr {
            loc,
            argument: Box::new(argument),
        })))
    }

    fn parse_update_expression(&mut self) -> QuillResult<Expr> {
        let start = self.lookahead.clone();
        let op_of = |kind| match kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        };

        if let Some(op) = op_of(start.kind) {
            self.next_token()?;
            let argument =
                self.descend(|p| p.inherit_cover_grammar(|p| p.parse_unary_expression()))?;
            self.check_update_target(&argument, messages::STRICT_LHS_PREFIX)?;
            self.cover.reject();
            let loc = self.finalize(start.span.start, NodeType::UpdateExpression);
            return Ok(Expr::Update(Box::new(UpdateExpr {
                loc,
                op,
                prefix: true,
                argument: Box::new(argument),
            })));
        }

        let expr = self.inherit_cover_grammar(|p| p.parse_lhs_expression_allow_call())?;
        if self.has_line_terminator() {
            return Ok(expr);
        }
        let Some(op) = op_of(self.lookahead.kind) else {
            return Ok(expr);
        };
        self.check_update_target(&expr, messages::STRICT_LHS_POSTFIX)?;
        self.cover.reject();
        self.next_token()?;
        let loc = self.finalize(start.span.start, NodeType::UpdateExpression);
        Ok(Expr::Update(Box::new(UpdateExpr {
            loc,
            op,
            prefix: false,
            argument: Box::new(expr),
        })))
    }

    fn check_update_target(&mut self, target: &Expr, strict_message: &str) -> QuillResult<()> {
        if self.flags.strict
            && let Expr::Ident(id) = target
            && is_restricted_word(&id.name)
        {
            self.tolerate_at(id.loc.start, strict_message, ErrorKind::Strict)?;
        }
        if !self.cover.is_assignment_target || !is_simple_target(target) {
            self.tolerate_error(messages::INVALID_LHS_IN_ASSIGNMENT)?;
        }
        Ok(())
    }

    // ── Member access and calls ─────────────────────────────────────────────

    pub(super) fn parse_lhs_expression_allow_call(&mut self) -> QuillResult<Expr> {
        let start = self.lookahead.clone();
        self.with_flags(
            |f| f.allow_in = true,
            |p| {
                let expr = match p.lookahead.kind {
                    TokenKind::Super => p.parse_super()?,
                    TokenKind::New => p.inherit_cover_grammar(|p| p.parse_new_expression())?,
                    _ => p.inherit_cover_grammar(|p| p.parse_primary_expression())?,
                };
                p.parse_call_tail(&start, expr, true)
            },
        )
    }

    /// The callee of `new`: member accesses and tagged templates, no calls.
    fn parse_lhs_expression(&mut self) -> QuillResult<Expr> {
        let start = self.lookahead.clone();
        let expr = match self.lookahead.kind {
            TokenKind::Super => self.parse_super()?,
            TokenKind::New => self.inherit_cover_grammar(|p| p.parse_new_expression())?,
            _ => self.inherit_cover_grammar(|p| p.parse_primary_expression())?,
        };
        self.parse_call_tail(&start, expr, false)
    }

    /// Member, call, optional-chain and tagged-template suffixes of `expr`.
    fn parse_call_tail(
        &mut self,
        start: &Token,
        mut expr: Expr,
        allow_call: bool,
    ) -> QuillResult<Expr> {
        let marker = start.span.start;
        let maybe_async = start.is_contextual("async");
        let mut has_optional = false;

        loop {
            let mut optional = false;
            if self.matches(TokenKind::QuestionDot) {
                if !allow_call {
                    return Err(self.error_at(
                        self.lookahead.span.start,
                        messages::INVALID_OPTIONAL_CHAIN_FROM_NEW,
                        ErrorKind::Syntax,
                    ));
                }
                self.next_token()?;
                optional = true;
                has_optional = true;
            }

            let kind = self.lookahead.kind;
            match kind {
                TokenKind::LeftParen if allow_call => {
                    let async_arrow = maybe_async
                        && !optional
                        && !self.has_line_terminator()
                        && matches!(&expr, Expr::Ident(id) if id.loc.end == start.span.end);
                    if async_arrow {
                        let arguments = self.parse_async_arguments()?;
                        if self.matches(TokenKind::Arrow) {
                            expr = Expr::ArrowParams(Box::new(ArrowParamsExpr {
                                loc: Span {
                                    start: marker,
                                    end: self.last_marker,
                                },
                                params: arguments,
                                is_async: true,
                            }));
                            break;
                        }
                        self.cover.reject();
                        let loc = self.finalize(marker, NodeType::CallExpression);
                        expr = Expr::Call(Box::new(CallExpr {
                            loc,
                            callee: Box::new(expr),
                            arguments,
                            optional,
                        }));
                    } else {
                        let arguments = self.parse_arguments()?;
                        self.cover.reject();
                        let loc = self.finalize(marker, NodeType::CallExpression);
                        expr = Expr::Call(Box::new(CallExpr {
                            loc,
                            callee: Box::new(expr),
                            arguments,
                            optional,
                        }));
                    }
                }
                TokenKind::LeftBracket => {
                    self.cover.is_binding_element = false;
                    self.cover.is_assignment_target = !optional;
                    self.next_token()?;
                    let property = self.isolate_cover_grammar(|p| p.parse_comma_expression())?;
                    self.expect(TokenKind::RightBracket)?;
                    let property = MemberProp::Computed(Box::new(property));
                    expr = self.member(marker, expr, property, MemberKind::Computed, optional);
                }
                TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                    if optional {
                        return Err(self.unexpected(&self.lookahead));
                    }
                    if has_optional {
                        return Err(self.error_at(
                            self.lookahead.span.start,
                            messages::INVALID_TAGGED_TEMPLATE_ON_OPTIONAL_CHAIN,
                            ErrorKind::Syntax,
                        ));
                    }
                    let quasi = self.parse_template_literal(true)?;
                    self.cover.reject();
                    let loc = self.finalize(marker, NodeType::TaggedTemplateExpression);
                    expr = Expr::TaggedTemplate(Box::new(TaggedTemplateExpr {
                        loc,
                        tag: Box::new(expr),
                        quasi,
                    }));
                }
                TokenKind::Dot if !optional => {
                    self.cover.is_binding_element = false;
                    self.cover.is_assignment_target = true;
                    self.next_token()?;
                    let property = self.parse_member_property()?;
                    expr = self.member(marker, expr, property, MemberKind::Dot, false);
                }
                TokenKind::ColonColon if !optional => {
                    self.cover.is_binding_element = false;
                    self.cover.is_assignment_target = true;
                    self.next_token()?;
                    let property = MemberProp::Ident(self.parse_identifier_name()?);
                    expr = self.member(marker, expr, property, MemberKind::Static, false);
                }
                TokenKind::ThinArrow if !optional => {
                    self.cover.is_binding_element = false;
                    self.cover.is_assignment_target = true;
                    self.next_token()?;
                    let property = if self.matches(TokenKind::LeftBracket) {
                        self.next_token()?;
                        let property =
                            self.isolate_cover_grammar(|p| p.parse_comma_expression())?;
                        self.expect(TokenKind::RightBracket)?;
                        MemberProp::Computed(Box::new(property))
                    } else {
                        MemberProp::Ident(self.parse_identifier_name()?)
                    };
                    expr = self.member(marker, expr, property, MemberKind::Selector, false);
                }
                _ if optional => {
                    self.cover.reject();
                    let property = self.parse_member_property()?;
                    expr = self.member(marker, expr, property, MemberKind::Dot, true);
                }
                _ => break,
            }
        }

        if has_optional {
            self.cover.is_assignment_target = false;
            let loc = self.finalize(marker, NodeType::ChainExpression);
            expr = Expr::Chain(Box::new(ChainExpr {
                loc,
                expression: Box::new(expr),
            }));
        }
        Ok(expr)
    }

    fn member(
        &mut self,
        marker: Position,
        object: Expr,
        property: MemberProp,
        kind: MemberKind,
        optional: bool,
    ) -> Expr {
        let loc = self.finalize(marker, NodeType::MemberExpression);
        Expr::Member(Box::new(MemberExpr {
            loc,
            object: Box::new(object),
            property,
            kind,
            optional,
        }))
    }

    /// The name after `.` or `?.`: an *IdentifierName* or a private name.
    fn parse_member_property(&mut self) -> QuillResult<MemberProp> {
        if self.matches(TokenKind::PrivateIdentifier) {
            let token = self.next_token()?;
            if !self.flags.in_class_body {
                self.tolerate_at(
                    token.span.start,
                    messages::PRIVATE_NAME_NOT_ALLOWED,
                    ErrorKind::Syntax,
                )?;
            }
            let loc = self.finalize(token.span.start, NodeType::PrivateIdentifier);
            return Ok(MemberProp::Private(PrivateIdent {
                loc,
                name: token.str_value().to_string(),
            }));
        }
        Ok(MemberProp::Ident(self.parse_identifier_name()?))
    }

    /// Any *IdentifierName*, reserved words included.
    pub(super) fn parse_identifier_name(&mut self) -> QuillResult<crate::parser::ast::Ident> {
        if !self.lookahead.kind.is_identifier_name() {
            return Err(self.unexpected(&self.lookahead));
        }
        let token = self.next_token()?;
        Ok(self.finalize_ident(&token))
    }

    fn parse_super(&mut self) -> QuillResult<Expr> {
        let keyword = self.next_token()?;
        match self.lookahead.kind {
            TokenKind::LeftParen => {
                if !self.flags.allow_super_call {
                    self.tolerate_at(
                        keyword.span.start,
                        messages::UNEXPECTED_SUPER,
                        ErrorKind::Syntax,
                    )?;
                }
            }
            TokenKind::Dot | TokenKind::LeftBracket => {
                if !self.flags.allow_super_property {
                    self.tolerate_at(
                        keyword.span.start,
                        messages::UNEXPECTED_SUPER,
                        ErrorKind::Syntax,
                    )?;
                }
            }
            _ => return Err(self.unexpected(&self.lookahead)),
        }
        let loc = self.finalize(keyword.span.start, NodeType::Super);
        Ok(Expr::Super(SuperExpr { loc }))
    }

    fn parse_new_expression(&mut self) -> QuillResult<Expr> {
        let keyword = self.next_token()?;
        let marker = keyword.span.start;

        if self.matches(TokenKind::Dot) {
            self.next_token()?;
            if !self.matches_contextual("target") {
                return Err(self.unexpected(&self.lookahead));
            }
            let meta = self.finalize_ident(&keyword);
            let target = self.next_token()?;
            let property = self.finalize_ident(&target);
            if !self.flags.allow_new_target {
                self.tolerate_at(marker, messages::UNEXPECTED_NEW_TARGET, ErrorKind::Syntax)?;
            }
            self.cover.reject();
            let loc = self.finalize(marker, NodeType::MetaProperty);
            return Ok(Expr::MetaProp(MetaPropExpr {
                loc,
                meta,
                property,
            }));
        }

        if self.matches(TokenKind::Import) {
            return Err(self.unexpected(&self.lookahead));
        }
        let callee = self.descend(|p| p.isolate_cover_grammar(|p| p.parse_lhs_expression()))?;
        if matches!(callee, Expr::ArrowParams(_)) {
            return Err(self.unexpected(&self.lookahead));
        }
        let arguments = if self.matches(TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        self.cover.reject();
        let loc = self.finalize(marker, NodeType::NewExpression);
        Ok(Expr::New(Box::new(NewExpr {
            loc,
            callee: Box::new(callee),
            arguments,
        })))
    }

    /// `( args )` of a call or `new`.
    pub(super) fn parse_arguments(&mut self) -> QuillResult<Vec<Expr>> {
        self.expect(TokenKind::LeftParen)?;
        let mut arguments = Vec::new();
        while !self.matches(TokenKind::RightParen) {
            let argument = if self.matches(TokenKind::DotDotDot) {
                Expr::Spread(Box::new(self.parse_spread_element()?))
            } else {
                self.isolate_cover_grammar(|p| p.parse_assignment_expression())?
            };
            arguments.push(argument);
            if !self.matches(TokenKind::RightParen) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightParen)?;
        Ok(arguments)
    }

    /// Arguments of `async(…)`, which may still turn into arrow parameters.
    /// A `{ a = 1 }` among them is only an error once no `=>` follows.
    fn parse_async_arguments(&mut self) -> QuillResult<Vec<Expr>> {
        self.expect(TokenKind::LeftParen)?;
        let mut arguments = Vec::new();
        let mut pending: Option<Position> = None;
        while !self.matches(TokenKind::RightParen) {
            let argument = if self.matches(TokenKind::DotDotDot) {
                Expr::Spread(Box::new(self.parse_spread_element()?))
            } else {
                self.parse_assignment_expression()?
            };
            if let Some(pos) = self.cover.first_cover_initialized_name_error.take() {
                pending.get_or_insert(pos);
            }
            arguments.push(argument);
            if !self.matches(TokenKind::RightParen) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightParen)?;
        if let Some(pos) = pending
            && !self.matches(TokenKind::Arrow)
        {
            return Err(self.cover_initialized_name_error(pos));
        }
        Ok(arguments)
    }

    pub(super) fn parse_spread_element(&mut self) -> QuillResult<SpreadElement> {
        let marker = self.create_node();
        self.expect(TokenKind::DotDotDot)?;
        let argument = self.inherit_cover_grammar(|p| p.parse_assignment_expression())?;
        let loc = self.finalize(marker, NodeType::SpreadElement);
        Ok(SpreadElement {
            loc,
            argument: Box::new(argument),
        })
    }

    // ── Primary expressions ─────────────────────────────────────────────────

    pub(super) fn parse_primary_expression(&mut self) -> QuillResult<Expr> {
        let marker = self.create_node();
        let kind = self.lookahead.kind;
        match kind {
            TokenKind::Identifier => {
                if self.is_async_function_start()? {
                    self.cover.reject();
                    return self.parse_function_expression();
                }
                let token = self.next_token()?;
                self.check_identifier_reference(&token)?;
                Ok(Expr::Ident(self.finalize_ident(&token)))
            }
            TokenKind::Yield if !self.flags.strict && !self.flags.allow_yield => {
                let token = self.next_token()?;
                Ok(Expr::Ident(self.finalize_ident(&token)))
            }
            TokenKind::Let if !self.flags.strict => {
                let token = self.next_token()?;
                Ok(Expr::Ident(self.finalize_ident(&token)))
            }
            TokenKind::NumericLiteral | TokenKind::StringLiteral | TokenKind::BigIntLiteral => {
                if self.flags.strict && self.lookahead.octal {
                    let message = self.strict_octal_message(&self.lookahead);
                    self.tolerate_at(marker, message, ErrorKind::Strict)?;
                }
                self.cover.reject();
                let token = self.next_token()?;
                let loc = self.finalize(marker, NodeType::Literal);
                let raw = token.raw(self.source).to_string();
                match token.value {
                    TokenValue::Number(value) => Ok(Expr::Num(NumLit { loc, value, raw })),
                    TokenValue::Str(value) => Ok(Expr::Str(StringLit { loc, value })),
                    TokenValue::BigInt(value) => Ok(Expr::BigInt(BigIntLit { loc, value, raw })),
                    _ => Err(QuillError::Internal("literal token without a value".into())),
                }
            }
            TokenKind::True | TokenKind::False => {
                self.cover.reject();
                self.next_token()?;
                let loc = self.finalize(marker, NodeType::Literal);
                Ok(Expr::Bool(BoolLit {
                    loc,
                    value: kind == TokenKind::True,
                }))
            }
            TokenKind::Null => {
                self.cover.reject();
                self.next_token()?;
                let loc = self.finalize(marker, NodeType::Literal);
                Ok(Expr::Null(NullLit { loc }))
            }
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                self.cover.reject();
                Ok(Expr::Template(Box::new(self.parse_template_literal(false)?)))
            }
            TokenKind::LeftParen => {
                self.cover.is_binding_element = false;
                self.inherit_cover_grammar(|p| p.parse_group_expression())
            }
            TokenKind::LeftBracket => self.inherit_cover_grammar(|p| p.parse_array_initializer()),
            TokenKind::LeftBrace => self.inherit_cover_grammar(|p| p.parse_object_initializer()),
            TokenKind::Slash | TokenKind::SlashEqual => {
                self.cover.reject();
                self.rescan_lookahead_as_regexp()?;
                let token = self.next_token()?;
                let loc = self.finalize(marker, NodeType::Literal);
                let TokenValue::RegExp(value) = token.value else {
                    return Err(QuillError::Internal("regexp token without a value".into()));
                };
                let RegExpValue {
                    pattern,
                    flags,
                    adapted,
                    regex,
                    conversion_error,
                } = *value;
                Ok(Expr::Regexp(Box::new(RegExpLit {
                    loc,
                    pattern,
                    flags,
                    adapted,
                    regex,
                    conversion_error,
                })))
            }
            TokenKind::PrivateIdentifier => {
                // `#x in obj`
                let token = self.next_token()?;
                if !self.matches(TokenKind::In) {
                    return Err(self.unexpected(&token));
                }
                if !self.flags.in_class_body {
                    self.tolerate_at(
                        token.span.start,
                        messages::PRIVATE_NAME_NOT_ALLOWED,
                        ErrorKind::Syntax,
                    )?;
                }
                self.cover.reject();
                let loc = self.finalize(marker, NodeType::PrivateIdentifier);
                Ok(Expr::PrivateName(PrivateIdent {
                    loc,
                    name: token.str_value().to_string(),
                }))
            }
            TokenKind::Function => {
                self.cover.reject();
                self.parse_function_expression()
            }
            TokenKind::This => {
                self.cover.reject();
                self.next_token()?;
                let loc = self.finalize(marker, NodeType::ThisExpression);
                Ok(Expr::This(ThisExpr { loc }))
            }
            TokenKind::Class => {
                self.cover.reject();
                Ok(Expr::Class(Box::new(self.parse_class_expression()?)))
            }
            TokenKind::Import => {
                self.cover.reject();
                self.parse_import_expression()
            }
            _ => Err(self.unexpected(&self.lookahead)),
        }
    }

    /// Strict-mode and `await` restrictions on an identifier used as a
    /// reference.
    pub(super) fn check_identifier_reference(&mut self, token: &Token) -> QuillResult<()> {
        let name = token.str_value();
        if self.flags.strict && is_strict_mode_reserved_word(name) {
            self.tolerate_at(token.span.start, messages::STRICT_RESERVED_WORD, ErrorKind::Strict)?;
        } else if (self.flags.is_module || self.flags.is_async) && token.is_contextual("await") {
            self.tolerate_unexpected(token)?;
        }
        Ok(())
    }

    /// `( … )`: a parenthesized expression, or the parameter list of an
    /// arrow function when `=>` follows.
    fn parse_group_expression(&mut self) -> QuillResult<Expr> {
        let open = self.expect(TokenKind::LeftParen)?;
        let start = open.span.start;

        if self.matches(TokenKind::RightParen) {
            self.next_token()?;
            return self.arrow_params_placeholder(start, Vec::new());
        }

        let first_start = self.create_node();
        let mut expressions = Vec::new();
        let mut saw_rest = false;
        loop {
            if self.matches(TokenKind::DotDotDot) {
                if !self.cover.is_binding_element {
                    return Err(self.unexpected(&self.lookahead));
                }
                expressions.push(Expr::Spread(Box::new(self.parse_spread_element()?)));
                saw_rest = true;
                break;
            }
            expressions.push(self.inherit_cover_grammar(|p| p.parse_assignment_expression())?);
            if !self.matches(TokenKind::Comma) {
                break;
            }
            self.cover.is_assignment_target = false;
            self.next_token()?;
            if self.matches(TokenKind::RightParen) {
                // Trailing comma: only legal in a parameter list.
                self.next_token()?;
                return self.arrow_params_placeholder(start, expressions);
            }
        }

        let inner_end = self.last_marker;
        self.expect(TokenKind::RightParen)?;
        if saw_rest {
            return self.arrow_params_placeholder(start, expressions);
        }
        if self.matches(TokenKind::Arrow) {
            let yield_param = matches!(
                expressions.as_slice(),
                [Expr::Ident(id)] if id.name == "yield"
            );
            if !self.cover.is_binding_element && !yield_param {
                return Err(self.unexpected(&self.lookahead));
            }
            return self.arrow_params_placeholder(start, expressions);
        }

        self.cover.is_binding_element = false;
        if expressions.len() == 1 {
            return expressions
                .pop()
                .ok_or_else(|| QuillError::Internal("empty group".into()));
        }
        let loc = self.finalize_between(first_start, inner_end, NodeType::SequenceExpression);
        Ok(Expr::Sequence(Box::new(SequenceExpr { loc, expressions })))
    }

    /// Parameters collected by a group; `=>` must follow immediately.
    fn arrow_params_placeholder(
        &mut self,
        start: Position,
        params: Vec<Expr>,
    ) -> QuillResult<Expr> {
        if !self.matches(TokenKind::Arrow) {
            return Err(self.unexpected(&self.lookahead));
        }
        Ok(Expr::ArrowParams(Box::new(ArrowParamsExpr {
            loc: Span {
                start,
                end: self.last_marker,
            },
            params,
            is_async: false,
        })))
    }

    fn parse_array_initializer(&mut self) -> QuillResult<Expr> {
        let marker = self.create_node();
        self.expect(TokenKind::LeftBracket)?;
        let mut elements = Vec::new();
        while !self.matches(TokenKind::RightBracket) {
            if self.matches(TokenKind::Comma) {
                self.next_token()?;
                elements.push(None);
                continue;
            }
            if self.matches(TokenKind::DotDotDot) {
                let spread = self.parse_spread_element()?;
                if !self.matches(TokenKind::RightBracket) {
                    self.cover.reject();
                    self.expect(TokenKind::Comma)?;
                }
                elements.push(Some(Expr::Spread(Box::new(spread))));
                continue;
            }
            elements.push(Some(
                self.inherit_cover_grammar(|p| p.parse_assignment_expression())?,
            ));
            if !self.matches(TokenKind::RightBracket) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightBracket)?;
        let loc = self.finalize(marker, NodeType::ArrayExpression);
        Ok(Expr::Array(Box::new(ArrayExpr { loc, elements })))
    }

    // ── Object literals ─────────────────────────────────────────────────────

    fn parse_object_initializer(&mut self) -> QuillResult<Expr> {
        let marker = self.create_node();
        self.expect(TokenKind::LeftBrace)?;
        let mut properties = Vec::new();
        let mut has_proto = false;
        let mut has_finalizer = false;
        while !self.matches(TokenKind::RightBrace) {
            let property = if self.matches(TokenKind::DotDotDot) {
                ObjectProp::Spread(self.parse_spread_element()?)
            } else if self.matches(TokenKind::Finally)
                && self.peek_token()?.kind == TokenKind::LeftBrace
            {
                self.cover.reject();
                ObjectProp::Finalizer(self.parse_finalizer_block(&mut has_finalizer)?)
            } else {
                self.parse_object_property(&mut has_proto)?
            };
            properties.push(property);
            if !self.matches(TokenKind::RightBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        let loc = self.finalize(marker, NodeType::ObjectExpression);
        Ok(Expr::Object(Box::new(ObjectExpr { loc, properties })))
    }

    fn parse_object_property(&mut self, has_proto: &mut bool) -> QuillResult<ObjectProp> {
        let marker = self.create_node();
        let token = self.lookahead.clone();
        let mut is_async = false;
        let mut is_generator = false;
        let mut accessor: Option<MethodFlavor> = None;

        if token.kind == TokenKind::Identifier {
            self.next_token()?;
            let modifier_position = !matches!(
                self.lookahead.kind,
                TokenKind::Colon
                    | TokenKind::LeftParen
                    | TokenKind::Comma
                    | TokenKind::RightBrace
                    | TokenKind::Equal
            );
            if token.is_contextual("async") && modifier_position && !self.has_line_terminator() {
                is_async = true;
                if self.matches(TokenKind::Star) {
                    self.next_token()?;
                    is_generator = true;
                }
            } else if starts_property_key(self.lookahead.kind) {
                if token.is_contextual("get") {
                    accessor = Some(MethodFlavor::Getter);
                } else if token.is_contextual("set") {
                    accessor = Some(MethodFlavor::Setter);
                }
            }
        } else if self.matches(TokenKind::Star) {
            self.next_token()?;
            is_generator = true;
        }

        let plain_ident = token.kind == TokenKind::Identifier && !is_async && accessor.is_none();
        let (key, is_computed) = if plain_ident {
            (PropKey::Ident(self.finalize_ident(&token)), false)
        } else {
            self.parse_object_property_key(false)?
        };

        let value = if let Some(flavor) = accessor {
            let function = self.parse_method_function(flavor, false, false, false)?;
            match flavor {
                MethodFlavor::Getter => PropValue::Get(function),
                _ => PropValue::Set(function),
            }
        } else if is_async || is_generator {
            PropValue::Method(self.parse_method_function(
                MethodFlavor::Method,
                is_async,
                is_generator,
                false,
            )?)
        } else if self.matches(TokenKind::Colon) {
            if !is_computed && key.is_named("__proto__") {
                if *has_proto {
                    self.tolerate_error(messages::DUPLICATE_PROTO_PROPERTY)?;
                }
                *has_proto = true;
            }
            self.next_token()?;
            PropValue::Value(Box::new(
                self.inherit_cover_grammar(|p| p.parse_assignment_expression())?,
            ))
        } else if self.matches(TokenKind::LeftParen) {
            let function =
                self.parse_method_function(MethodFlavor::Method, false, false, false)?;
            PropValue::Method(function)
        } else if plain_ident {
            self.check_identifier_reference(&token)?;
            if self.matches(TokenKind::Equal) {
                let equals = self.lookahead.span.start;
                self.cover.first_cover_initialized_name_error.get_or_insert(equals);
                self.next_token()?;
                let init = self.isolate_cover_grammar(|p| p.parse_assignment_expression())?;
                PropValue::CoverInitializedName(Box::new(init))
            } else {
                PropValue::Shorthand
            }
        } else {
            return Err(self.unexpected(&self.lookahead));
        };

        let loc = self.finalize(marker, NodeType::Property);
        Ok(ObjectProp::Prop(Box::new(Prop {
            loc,
            key,
            is_computed,
            value,
        })))
    }

    /// Property name of an object literal or class member.  Returns the key
    /// and whether it was computed.
    pub(super) fn parse_object_property_key(
        &mut self,
        allow_private: bool,
    ) -> QuillResult<(PropKey, bool)> {
        let token = self.lookahead.clone();
        match token.kind {
            TokenKind::StringLiteral | TokenKind::NumericLiteral | TokenKind::BigIntLiteral => {
                if self.flags.strict && token.octal {
                    let message = self.strict_octal_message(&token);
                    self.tolerate_at(token.span.start, message, ErrorKind::Strict)?;
                }
                let token = self.next_token()?;
                let loc = self.finalize(token.span.start, NodeType::Literal);
                let raw = token.raw(self.source).to_string();
                let key = match token.value {
                    TokenValue::Str(value) => PropKey::Str(StringLit { loc, value }),
                    TokenValue::Number(value) => PropKey::Num(NumLit { loc, value, raw }),
                    TokenValue::BigInt(value) => PropKey::BigInt(BigIntLit { loc, value, raw }),
                    _ => return Err(QuillError::Internal("literal token without a value".into())),
                };
                Ok((key, false))
            }
            TokenKind::PrivateIdentifier if allow_private => {
                self.next_token()?;
                let loc = self.finalize(token.span.start, NodeType::PrivateIdentifier);
                Ok((
                    PropKey::Private(PrivateIdent {
                        loc,
                        name: token.str_value().to_string(),
                    }),
                    false,
                ))
            }
            TokenKind::LeftBracket => {
                self.next_token()?;
                let expr = self.with_flags(
                    |f| f.allow_in = true,
                    |p| p.isolate_cover_grammar(|p| p.parse_assignment_expression()),
                )?;
                self.expect(TokenKind::RightBracket)?;
                Ok((PropKey::Computed(Box::new(expr)), true))
            }
            kind if kind.is_identifier_name() => {
                self.next_token()?;
                Ok((PropKey::Ident(self.finalize_ident(&token)), false))
            }
            _ => Err(self.unexpected(&token)),
        }
    }

    // ── Templates ───────────────────────────────────────────────────────────

    /// A template literal.  Invalid escapes are errors unless the template
    /// is `tagged`, in which case the element's cooked value is `None`.
    pub(super) fn parse_template_literal(&mut self, tagged: bool) -> QuillResult<TemplateLit> {
        let marker = self.create_node();
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        loop {
            let quasi = self.parse_template_element(tagged)?;
            let tail = quasi.tail;
            quasis.push(quasi);
            if tail {
                break;
            }
            expressions.push(self.with_flags(
                |f| f.allow_in = true,
                |p| p.parse_comma_expression(),
            )?);
            if !matches!(
                self.lookahead.kind,
                TokenKind::TemplateMiddle | TokenKind::TemplateTail
            ) {
                return Err(self.unexpected(&self.lookahead));
            }
        }
        let loc = self.finalize(marker, NodeType::TemplateLiteral);
        Ok(TemplateLit {
            loc,
            quasis,
            expressions,
        })
    }

    fn parse_template_element(&mut self, tagged: bool) -> QuillResult<TemplateElement> {
        let token = self.next_token()?;
        let span = token.span;
        let tail = matches!(
            token.kind,
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateTail
        );
        let TokenValue::Template(part) = token.value else {
            return Err(QuillError::Internal("template token without a value".into()));
        };
        if !tagged && let Some(invalid) = &part.invalid_escape {
            return Err(self.error_at(invalid.position, invalid.message, ErrorKind::Lexical));
        }
        let loc = self.finalize(span.start, NodeType::TemplateElement);
        Ok(TemplateElement {
            loc,
            raw: part.raw,
            cooked: part.cooked,
            tail,
        })
    }

    // ── import(…) and import.meta ───────────────────────────────────────────

    fn parse_import_expression(&mut self) -> QuillResult<Expr> {
        let keyword = self.next_token()?;
        let marker = keyword.span.start;

        if self.matches(TokenKind::Dot) {
            self.next_token()?;
            if !self.matches_contextual("meta") {
                return Err(self.unexpected(&self.lookahead));
            }
            let meta = self.finalize_ident(&keyword);
            let name = self.next_token()?;
            let property = self.finalize_ident(&name);
            if !self.flags.is_module {
                self.tolerate_at(marker, messages::UNEXPECTED_IMPORT_META, ErrorKind::Syntax)?;
            }
            let loc = self.finalize(marker, NodeType::MetaProperty);
            return Ok(Expr::MetaProp(MetaPropExpr {
                loc,
                meta,
                property,
            }));
        }

        self.expect(TokenKind::LeftParen)?;
        if self.matches(TokenKind::RightParen) || self.matches(TokenKind::DotDotDot) {
            return Err(self.error_at(
                self.lookahead.span.start,
                messages::BAD_IMPORT_CALL_ARITY,
                ErrorKind::Syntax,
            ));
        }
        let source = self.with_flags(
            |f| f.allow_in = true,
            |p| p.isolate_cover_grammar(|p| p.parse_assignment_expression()),
        )?;
        let mut options = None;
        if self.matches(TokenKind::Comma) {
            self.next_token()?;
            if !self.matches(TokenKind::RightParen) {
                options = Some(Box::new(self.with_flags(
                    |f| f.allow_in = true,
                    |p| p.isolate_cover_grammar(|p| p.parse_assignment_expression()),
                )?));
                if self.matches(TokenKind::Comma) {
                    self.next_token()?;
                }
            }
        }
        if !self.matches(TokenKind::RightParen) {
            return Err(self.error_at(
                self.lookahead.span.start,
                messages::BAD_IMPORT_CALL_ARITY,
                ErrorKind::Syntax,
            ));
        }
        self.next_token()?;
        let loc = self.finalize(marker, NodeType::ImportExpression);
        Ok(Expr::Import(Box::new(ImportExpr {
            loc,
            source: Box::new(source),
            options,
        })))
    }

    /// `finally { … }` inside an object literal or class body.  A second
    /// finalizer for the same owner is reported.
    pub(super) fn parse_finalizer_block(&mut self, seen: &mut bool) -> QuillResult<FinalizerBlock> {
        let keyword = self.expect(TokenKind::Finally)?;
        if *seen {
            self.tolerate_at(
                keyword.span.start,
                messages::DUPLICATE_FINALIZER,
                ErrorKind::Syntax,
            )?;
        }
        *seen = true;
        let body = self.with_flags(
            |f| {
                f.is_async = false;
                f.allow_yield = false;
                f.allow_super_call = false;
                f.allow_super_property = true;
                f.allow_new_target = false;
                f.in_parameters = false;
            },
            |p| p.parse_function_body(),
        )?;
        let loc = self.finalize(keyword.span.start, NodeType::FinalizerBlock);
        Ok(FinalizerBlock { loc, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserOptions;
    use crate::parser::ast::Pat;

    fn expr(source: &str) -> Expr {
        Parser::new(source, ParserOptions::new())
            .parse_expression()
            .unwrap_or_else(|e| panic!("{source}: {e}"))
    }

    fn error(source: &str) -> String {
        let err = Parser::new(source, ParserOptions::new())
            .parse_expression()
            .expect_err(source);
        err.as_parse_error().unwrap().description.clone()
    }

    /// Compact prefix rendering for shape assertions.
    fn sexp(e: &Expr) -> String {
        match e {
            Expr::Ident(i) => i.name.clone(),
            Expr::Num(n) => n.raw.clone(),
            Expr::Binary(b) => format!("({:?} {} {})", b.op, sexp(&b.left), sexp(&b.right)),
            Expr::Logical(l) => format!("({:?} {} {})", l.op, sexp(&l.left), sexp(&l.right)),
            Expr::Unary(u) => format!("({:?} {})", u.op, sexp(&u.argument)),
            Expr::Conditional(c) => format!(
                "(? {} {} {})",
                sexp(&c.test),
                sexp(&c.consequent),
                sexp(&c.alternate)
            ),
            Expr::Member(m) => {
                let property = match &m.property {
                    MemberProp::Ident(i) => i.name.clone(),
                    MemberProp::Private(p) => format!("#{}", p.name),
                    MemberProp::Computed(c) => sexp(c),
                };
                format!("({:?} {} {})", m.kind, sexp(&m.object), property)
            }
            Expr::Call(c) => format!("(call {})", sexp(&c.callee)),
            Expr::Chain(c) => format!("(chain {})", sexp(&c.expression)),
            other => format!("{:?}", other.node_type()),
        }
    }

    #[test]
    fn test_binary_precedence() {
        assert_eq!(sexp(&expr("a + b * c - d")), "(Sub (Add a (Mul b c)) d)");
        assert_eq!(sexp(&expr("a || b && c | d")), "(Or a (And b (BitOr c d)))");
        assert_eq!(sexp(&expr("a < b == c")), "(Eq (Lt a b) c)");
    }

    #[test]
    fn test_binary_locations() {
        let e = expr("a + b * c");
        let Expr::Binary(add) = &e else { panic!() };
        assert_eq!((add.loc.start.offset, add.loc.end.offset), (0, 9));
        assert_eq!(
            (add.right.loc().start.offset, add.right.loc().end.offset),
            (4, 9)
        );
    }

    #[test]
    fn test_exponent_is_right_associative() {
        assert_eq!(sexp(&expr("a ** b ** c")), "(Exp a (Exp b c))");
        assert_eq!(sexp(&expr("(-a) ** b")), "(Exp (Minus a) b)");
        assert_eq!(error("-a ** b"), messages::UNARY_BEFORE_EXPONENT);
    }

    #[test]
    fn test_nullish_mixing() {
        assert_eq!(
            sexp(&expr("a ?? (b || c)")),
            "(NullishCoalesce a (Or b c))"
        );
        assert_eq!(error("a ?? b || c"), messages::MIXED_COALESCE);
        assert_eq!(error("a && b ?? c"), messages::MIXED_COALESCE);
    }

    #[test]
    fn test_conditional_and_assignment() {
        assert_eq!(sexp(&expr("a ? b : c ? d : e")), "(? a b (? c d e))");
        let e = expr("a = b += c");
        let Expr::Assign(outer) = &e else { panic!() };
        assert!(matches!(outer.left, Pat::Ident(_)));
        let Expr::Assign(inner) = outer.right.as_ref() else { panic!() };
        assert_eq!(inner.op, AssignOp::AddAssign);
    }

    #[test]
    fn test_destructuring_assignment() {
        let e = expr("[a, {b, c: d = 1}] = x");
        let Expr::Assign(assign) = &e else { panic!() };
        let mut names = Vec::new();
        assign.left.bound_names(&mut names);
        let names: Vec<_> = names.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "d"]);
    }

    #[test]
    fn test_cover_initialized_name_outside_pattern() {
        assert_eq!(error("({a = 1})"), messages::unexpected_token("="));
        assert!(matches!(expr("({a = 1} = b)"), Expr::Assign(_)));
    }

    #[test]
    fn test_member_chain() {
        assert_eq!(sexp(&expr("a.b[c]::d->e")), "(Selector (Static (Computed (Dot a b) c) d) e)");
        assert_eq!(sexp(&expr("a->[b]")), "(Selector a b)");
        assert_eq!(sexp(&expr("a?.b.c")), "(chain (Dot (Dot a b) c))");
        assert_eq!(sexp(&expr("a?.()")), "(chain (call a))");
    }

    #[test]
    fn test_optional_chain_restrictions() {
        assert_eq!(
            error("a?.b`t`"),
            messages::INVALID_TAGGED_TEMPLATE_ON_OPTIONAL_CHAIN
        );
        assert_eq!(
            error("new a?.b()"),
            messages::INVALID_OPTIONAL_CHAIN_FROM_NEW
        );
    }

    #[test]
    fn test_arrow_functions() {
        for source in [
            "() => 1",
            "a => a",
            "(a, b) => a",
            "(a, ...b) => b",
            "({a}, [b]) => a",
            "async x => x",
            "async (a) => a",
            "(a,) => a",
        ] {
            assert!(matches!(expr(source), Expr::Arrow(_)), "{source}");
        }
        let Expr::Arrow(arrow) = expr("async (a = 1) => { return a; }") else { panic!() };
        assert!(arrow.is_async);
        assert!(matches!(arrow.params[0], Pat::Assign(_)));
    }

    #[test]
    fn test_invalid_arrow_parameters() {
        assert_eq!(error("(a.b) => 1"), messages::unexpected_token("=>"));
        assert_eq!(error("(a + 1) => 1"), messages::unexpected_token("=>"));
        assert_eq!(error("(a, a) => 1"), messages::DUPLICATE_PARAMETER);
        assert!(matches!(expr("(a, b)"), Expr::Sequence(_)));
    }

    #[test]
    fn test_async_call_is_not_arrow() {
        let e = expr("async(a, b)");
        assert_eq!(sexp(&e), "(call async)");
    }

    #[test]
    fn test_templates() {
        let Expr::Template(t) = expr("`a${b}c${d}`") else { panic!() };
        assert_eq!(t.quasis.len(), 3);
        assert_eq!(t.expressions.len(), 2);
        assert!(t.quasis[2].tail);

        let Expr::TaggedTemplate(tagged) = expr(r"tag`\unicode`") else { panic!() };
        assert_eq!(tagged.quasi.quasis[0].cooked, None);
        assert_eq!(tagged.quasi.quasis[0].raw, r"\unicode");
        assert_eq!(error(r"`\unicode`"), messages::INVALID_UNICODE_ESCAPE);
    }

    #[test]
    fn test_object_literal_forms() {
        let source = "{a, b: 1, [c]: 2, get d() { return 1; }, set d(v) {}, m() {}, \
                      async *g() {}, ...e, 'f': 3, 4: 5}";
        let Expr::Object(object) = expr(source) else {
            panic!()
        };
        assert_eq!(object.properties.len(), 10);
        let ObjectProp::Prop(getter) = &object.properties[3] else { panic!() };
        assert!(matches!(getter.value, PropValue::Get(_)));
        let ObjectProp::Prop(generator) = &object.properties[6] else { panic!() };
        let PropValue::Method(f) = &generator.value else { panic!() };
        assert!(f.is_async && f.is_generator);
    }

    #[test]
    fn test_object_finalizer() {
        let Expr::Object(object) = expr("{ x: 1, finally { release(this.x); } }") else {
            panic!()
        };
        assert!(matches!(object.properties[1], ObjectProp::Finalizer(_)));

        let mut p = Parser::new(
            "({ finally {}, finally {} })",
            ParserOptions::new().tolerant(true),
        );
        p.parse_expression().unwrap();
        let (_, _, errors) = p.finish();
        assert_eq!(errors[0].description, messages::DUPLICATE_FINALIZER);
    }

    #[test]
    fn test_accessor_arity() {
        assert_eq!(error("({ get a(x) {} })"), messages::BAD_GETTER_ARITY);
        assert_eq!(error("({ set a() {} })"), messages::BAD_SETTER_ARITY);
        assert_eq!(error("({ set a(...v) {} })"), messages::BAD_SETTER_REST_PARAMETER);
    }

    #[test]
    fn test_new_and_meta_properties() {
        let Expr::New(new) = expr("new a.b(c)") else { panic!() };
        assert_eq!(new.arguments.len(), 1);
        assert_eq!(sexp(&new.callee), "(Dot a b)");
        assert_eq!(sexp(&expr("new a()()")), "(call NewExpression)");
        assert_eq!(error("new.target"), messages::UNEXPECTED_NEW_TARGET);
        assert_eq!(error("import.meta"), messages::UNEXPECTED_IMPORT_META);
    }

    #[test]
    fn test_dynamic_import() {
        let Expr::Import(import) = expr("import('a', { with: { type: 'json' } })") else {
            panic!()
        };
        assert!(import.options.is_some());
        assert_eq!(error("import()"), messages::BAD_IMPORT_CALL_ARITY);
        assert_eq!(error("import(a, b, c)"), messages::BAD_IMPORT_CALL_ARITY);
    }

    #[test]
    fn test_invalid_targets() {
        assert_eq!(error("a + b = c"), messages::INVALID_LHS_IN_ASSIGNMENT);
        assert_eq!(error("f()++"), messages::INVALID_LHS_IN_ASSIGNMENT);
        assert_eq!(error("a?.b = 1"), messages::INVALID_LHS_IN_ASSIGNMENT);
        assert_eq!(error("[a] += 1"), messages::INVALID_LHS_IN_ASSIGNMENT);
    }

    #[test]
    fn test_regexp_literal() {
        let Expr::Regexp(re) = expr("/a+b/gi") else { panic!() };
        assert_eq!((re.pattern.as_str(), re.flags.as_str()), ("a+b", "gi"));
        assert_eq!(sexp(&expr("a / b / c")), "(Div (Div a b) c)");
    }

    #[test]
    fn test_yield_is_identifier_outside_generators() {
        assert_eq!(sexp(&expr("yield + 1")), "(Add yield 1)");
    }
}
