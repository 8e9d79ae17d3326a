// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Sentence and expression parsing for Wollok.
//!
//! This module contains the statement- and expression-level grammar:
//!
//! - Sentences: variables, returns, assignments (plain, compound, lazy),
//!   expression statements
//! - Infix operators: 8-level left-associative precedence climbing, every
//!   application folded into a [`Expression::Send`]
//! - Prefix operators: `! not - +`, right-folded into sends of
//!   `negate`/`invert`/`plus`
//! - Send chains: `.name(args)` and `.name { closure }`
//! - Literals: scalars, collection literals (desugared to `new`), closures
//!   and object literals (anonymous singletons)
//! - `if`, `try`/`catch`/`then always`, `throw`, `new`, `super`

use ecow::EcoString;

use crate::ast::{
    Assignment, Body, CLOSURE_METHOD, Expression, LIST_MODULE, Literal, LiteralValue, Member,
    Method, MethodBody, Parameter, Reference, Return, SET_MODULE, Sentence, Singleton, Variable,
};
use crate::source_analysis::token::{
    ASSIGNMENT_OPERATORS, INFIX_LEVELS, LAZY_OPERATORS, prefix_message,
};
use crate::source_analysis::{Span, TokenKind};

use super::{Parse, Parser};

/// Decodes a number literal's text into a finite double.
pub(super) fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

impl Parser<'_> {
    // ========================================================================
    // Sentences
    // ========================================================================

    /// Parses a braced `{ sentences }` body.
    pub(super) fn parse_block_body(&mut self) -> Parse<Body> {
        let open = self.expect_token(&TokenKind::LeftBrace, "{")?.span();
        let sentences = self.parse_sentences_until_brace()?;
        let close = self.expect_token(&TokenKind::RightBrace, "}")?.span();

        Ok(Body {
            sentences,
            source: self.src(open.merge(close)),
        })
    }

    /// Parses sentences until a closing brace or EOF. Sentences are
    /// separated by whitespace or stray semicolons.
    fn parse_sentences_until_brace(&mut self) -> Parse<Vec<Sentence>> {
        let mut sentences = Vec::new();
        loop {
            while self.match_token(&TokenKind::Semicolon) {}
            if self.is_at_end() || self.check(&TokenKind::RightBrace) {
                break;
            }
            sentences.push(self.parse_sentence()?);
        }
        Ok(sentences)
    }

    /// Parses one sentence: a variable, return, assignment or expression,
    /// tried in that order.
    pub(super) fn parse_sentence(&mut self) -> Parse<Sentence> {
        if self.check_keyword("var") || self.check_keyword("const") {
            return self.parse_variable().map(Sentence::Variable);
        }
        if self.check_keyword("return") {
            return self.parse_return().map(Sentence::Return);
        }
        if matches!(self.current_kind(), TokenKind::Identifier(_))
            && matches!(
                self.peek_at(1),
                Some(TokenKind::Operator(op)) if ASSIGNMENT_OPERATORS.contains(&op.as_str())
            )
        {
            return self.parse_assignment().map(Sentence::Assignment);
        }
        self.parse_expression().map(Sentence::Expression)
    }

    /// Parses a `(var|const) name [= expression]` declaration.
    pub(super) fn parse_variable(&mut self) -> Parse<Variable> {
        let start = self.current_token().span();
        let is_read_only = if self.match_keyword("const") {
            true
        } else if self.match_keyword("var") {
            false
        } else {
            return self.fail("var or const");
        };
        let (name, name_span) = self.parse_name()?;

        let mut end = name_span;
        let value = if self.match_operator("=") {
            let expression = self.parse_expression()?;
            end = expression.source().span();
            Some(expression)
        } else {
            None
        };

        Ok(Variable {
            is_read_only,
            name,
            value,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a `return [expression]` sentence.
    fn parse_return(&mut self) -> Parse<Return> {
        let start = self.expect_keyword("return")?.span();
        let value = self.attempt(Self::parse_expression).ok();
        let end = value
            .as_ref()
            .map_or(start, |expression| expression.source().span());

        Ok(Return {
            value,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses an assignment sentence, desugaring compound operators.
    ///
    /// `x = e` stays a plain assignment. `x op= e` becomes
    /// `x = x.op(e)`, and when `op` is lazy (`||`, `&&`, `or`, `and`) the
    /// right-hand side is wrapped in a zero-parameter closure so its
    /// evaluation can be deferred by the receiver.
    fn parse_assignment(&mut self) -> Parse<Assignment> {
        let variable = self.parse_reference()?;

        let operator = match self.current_kind() {
            TokenKind::Operator(op) if ASSIGNMENT_OPERATORS.contains(&op.as_str()) => op.clone(),
            _ => return self.fail("an assignment operator"),
        };
        self.advance();

        let value = self.parse_expression()?;
        let span = variable.source.span().merge(value.source().span());
        let source = self.src(span);

        if operator == "=" {
            return Ok(Assignment {
                variable,
                value,
                source,
            });
        }

        let message = EcoString::from(&operator[..operator.len() - 1]);
        let argument = if LAZY_OPERATORS.contains(&message.as_str()) {
            self.closure_thunk(value)
        } else {
            value
        };
        // The target reference doubles as the send's receiver; it is cloned
        // so the tree stays a tree.
        let send = Expression::Send {
            receiver: Box::new(Expression::Reference(variable.clone())),
            message,
            args: vec![argument],
            source: source.clone(),
        };

        Ok(Assignment {
            variable,
            value: send,
            source,
        })
    }

    /// Parses an inlineable body: a braced block, or a single sentence
    /// wrapped into a one-sentence body spanning exactly that sentence.
    fn parse_inlineable_body(&mut self) -> Parse<Body> {
        if self.check(&TokenKind::LeftBrace) {
            return self.parse_block_body();
        }
        let sentence = self.parse_sentence()?;
        let source = sentence.source().clone();
        Ok(Body {
            sentences: vec![sentence],
            source,
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Parses any expression.
    ///
    /// Entry point for expression parsing; all precedence levels hang off
    /// it. Uses `stacker::maybe_grow` to extend the stack on the heap when
    /// remaining space runs low, with the nesting-depth guard capping
    /// recursion on pathological inputs.
    pub(super) fn parse_expression(&mut self) -> Parse<Expression> {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            self.enter_nesting()?;
            let result = self.parse_infix(0);
            self.leave_nesting();
            result
        })
    }

    /// Precedence climbing over [`INFIX_LEVELS`]. Level `k` parses
    /// `arg (op arg)*` with arguments at level `k + 1`; past the last
    /// level sits the prefix chain.
    fn parse_infix(&mut self, level: usize) -> Parse<Expression> {
        if level >= INFIX_LEVELS.len() {
            return self.parse_prefix();
        }

        let mut left = self.parse_infix(level + 1)?;

        while let Some(operator) = self.match_infix_operator(level) {
            let right = self.parse_infix(level + 1)?;
            let span = left.source().span().merge(right.source().span());
            let args = if LAZY_OPERATORS.contains(&operator.as_str()) {
                vec![self.closure_thunk(right)]
            } else {
                vec![right]
            };
            left = Expression::Send {
                receiver: Box::new(left),
                message: operator,
                args,
                source: self.src(span),
            };
        }

        Ok(left)
    }

    /// Consumes an operator of the given level, if one is next. Word
    /// operators (`or`, `and`) arrive as identifiers.
    fn match_infix_operator(&mut self, level: usize) -> Option<EcoString> {
        let operators = INFIX_LEVELS[level];
        let operator = match self.current_kind() {
            TokenKind::Operator(op) if operators.contains(&op.as_str()) => op.clone(),
            TokenKind::Identifier(word) if operators.contains(&word.as_str()) => word.clone(),
            _ => return None,
        };
        self.advance();
        Some(operator)
    }

    /// Parses a (possibly stacked) prefix chain over a send chain.
    /// Prefix operators right-fold: `!!x` is `x.negate().negate()` read
    /// inside-out.
    fn parse_prefix(&mut self) -> Parse<Expression> {
        let message = match self.current_kind() {
            TokenKind::Operator(op) => prefix_message(op),
            TokenKind::Identifier(word) if word == "not" => prefix_message("not"),
            _ => None,
        };
        let Some(message) = message else {
            return self.parse_send();
        };

        let start = self.advance().span();
        let operand = self.parse_prefix()?;
        let span = start.merge(operand.source().span());

        Ok(Expression::Send {
            receiver: Box::new(operand),
            message: message.into(),
            args: Vec::new(),
            source: self.src(span),
        })
    }

    /// Parses a primary followed by zero or more send segments, folded
    /// left-associatively.
    fn parse_send(&mut self) -> Parse<Expression> {
        let mut receiver = self.parse_primary()?;

        while self.check(&TokenKind::Dot) {
            match self.attempt(Self::parse_send_segment) {
                Ok((message, args, end)) => {
                    let span = receiver.source().span().merge(end);
                    receiver = Expression::Send {
                        receiver: Box::new(receiver),
                        message,
                        args,
                        source: self.src(span),
                    };
                }
                Err(_) => break,
            }
        }

        Ok(receiver)
    }

    /// Parses one `.name(args)` or `.name { closure }` segment. The
    /// closure form passes the closure as the single argument.
    fn parse_send_segment(&mut self) -> Parse<(EcoString, Vec<Expression>, Span)> {
        self.expect_token(&TokenKind::Dot, ".")?;
        let (message, _) = self.parse_name()?;

        if self.check(&TokenKind::LeftParen) {
            let (args, span) = self.parse_arguments()?;
            Ok((message, args, span))
        } else if self.check(&TokenKind::LeftBrace) {
            let closure = self.parse_closure()?;
            let end = closure.source().span();
            Ok((message, vec![closure], end))
        } else {
            self.fail("arguments")
        }
    }

    /// Parses a parenthesized argument list, positional or named, returning
    /// the arguments and the span of the parens.
    ///
    /// The named form is chosen when the list opens with `name =`; named
    /// arguments become [`Expression::NamedArgument`] nodes.
    pub(super) fn parse_arguments(&mut self) -> Parse<(Vec<Expression>, Span)> {
        let open = self.expect_token(&TokenKind::LeftParen, "(")?.span();
        let mut args = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            let named = matches!(self.current_kind(), TokenKind::Identifier(_))
                && matches!(self.peek_at(1), Some(TokenKind::Operator(op)) if op == "=");
            loop {
                if named {
                    args.push(self.parse_named_argument()?);
                } else {
                    args.push(self.parse_expression()?);
                }
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let close = self.expect_token(&TokenKind::RightParen, ")")?.span();
        Ok((args, open.merge(close)))
    }

    /// Parses one `name = expression` named argument.
    fn parse_named_argument(&mut self) -> Parse<Expression> {
        let (name, name_span) = self.parse_name()?;
        self.expect_operator("=")?;
        let value = self.parse_expression()?;
        let span = name_span.merge(value.source().span());

        Ok(Expression::NamedArgument {
            name,
            value: Box::new(value),
            source: self.src(span),
        })
    }

    // ========================================================================
    // Primaries
    // ========================================================================

    /// Parses a primary expression.
    fn parse_primary(&mut self) -> Parse<Expression> {
        match self.current_kind() {
            TokenKind::Number(_) => self.parse_number_literal(),
            TokenKind::String(_) => self.parse_string_literal(),
            TokenKind::LeftBracket => self.parse_list_literal(),
            TokenKind::SetOpen => self.parse_set_literal(),
            TokenKind::LeftBrace => self.parse_closure(),
            TokenKind::LeftParen => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect_token(&TokenKind::RightParen, ")")?;
                Ok(expression)
            }
            TokenKind::Identifier(_) => self.parse_keyword_primary(),
            _ => self.fail("an expression"),
        }
    }

    /// Parses a primary that starts with an identifier, dispatching on the
    /// keyword text; anything unrecognized is a plain reference.
    fn parse_keyword_primary(&mut self) -> Parse<Expression> {
        let keyword = match self.current_kind() {
            TokenKind::Identifier(word) => word.clone(),
            _ => return self.fail("an expression"),
        };

        match keyword.as_str() {
            "self" => {
                let span = self.advance().span();
                Ok(Expression::SelfRef {
                    source: self.src(span),
                })
            }
            "super" => self.parse_super(),
            "if" => self.parse_if(),
            "new" => self.parse_new(),
            "throw" => self.parse_throw(),
            "try" => self.parse_try(),
            "object" => self.parse_object_literal(),
            "null" => self.parse_scalar(LiteralValue::Null),
            "true" => self.parse_scalar(LiteralValue::Boolean(true)),
            "false" => self.parse_scalar(LiteralValue::Boolean(false)),
            _ => self.parse_reference().map(Expression::Reference),
        }
    }

    /// Consumes the current token as a scalar literal.
    fn parse_scalar(&mut self, value: LiteralValue) -> Parse<Expression> {
        let span = self.advance().span();
        Ok(Expression::Literal(Literal {
            value,
            source: self.src(span),
        }))
    }

    /// Parses a number literal token.
    fn parse_number_literal(&mut self) -> Parse<Expression> {
        let text = match self.current_kind() {
            TokenKind::Number(text) => text.clone(),
            _ => return self.fail("a number"),
        };
        let Some(value) = parse_number(&text) else {
            return self.fail("a finite number");
        };
        self.parse_scalar(LiteralValue::Number(value))
    }

    /// Parses a string literal token (already escape-decoded by the lexer).
    fn parse_string_literal(&mut self) -> Parse<Expression> {
        let value = match self.current_kind() {
            TokenKind::String(value) => value.clone(),
            _ => return self.fail("a string"),
        };
        self.parse_scalar(LiteralValue::String(value))
    }

    /// Parses `[ e, … ]`, desugared to `new wollok.lang.List(e, …)`.
    fn parse_list_literal(&mut self) -> Parse<Expression> {
        let open = self.expect_token(&TokenKind::LeftBracket, "[")?.span();
        let elements = self.parse_collection_elements(&TokenKind::RightBracket)?;
        let close = self
            .expect_token(&TokenKind::RightBracket, "]")?
            .span();
        Ok(self.collection_literal(LIST_MODULE, elements, open.merge(close)))
    }

    /// Parses `#{ e, … }`, desugared to `new wollok.lang.Set(e, …)`.
    fn parse_set_literal(&mut self) -> Parse<Expression> {
        let open = self.expect_token(&TokenKind::SetOpen, "#{")?.span();
        let elements = self.parse_collection_elements(&TokenKind::RightBrace)?;
        let close = self.expect_token(&TokenKind::RightBrace, "}")?.span();
        Ok(self.collection_literal(SET_MODULE, elements, open.merge(close)))
    }

    /// Parses comma-separated expressions up to the closing token.
    fn parse_collection_elements(&mut self, close: &TokenKind) -> Parse<Vec<Expression>> {
        let mut elements = Vec::new();
        if !self.check(close) {
            loop {
                elements.push(self.parse_expression()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(elements)
    }

    /// Builds the `new <collection class>(elements…)` node a collection
    /// literal desugars to. The synthesized reference spans the literal.
    fn collection_literal(
        &self,
        class: &str,
        elements: Vec<Expression>,
        span: Span,
    ) -> Expression {
        let source = self.src(span);
        Expression::New {
            instantiated: Reference {
                name: class.into(),
                source: source.clone(),
            },
            args: elements,
            source,
        }
    }

    /// Parses a `super(args)` call.
    fn parse_super(&mut self) -> Parse<Expression> {
        let start = self.expect_keyword("super")?.span();
        let (args, args_span) = self.parse_arguments()?;
        Ok(Expression::Super {
            args,
            source: self.src(start.merge(args_span)),
        })
    }

    /// Parses an `if (cond) then [else else]` expression with inlineable
    /// branches.
    fn parse_if(&mut self) -> Parse<Expression> {
        let start = self.expect_keyword("if")?.span();
        self.expect_token(&TokenKind::LeftParen, "(")?;
        let condition = Box::new(self.parse_expression()?);
        self.expect_token(&TokenKind::RightParen, ")")?;
        let then_body = self.parse_inlineable_body()?;

        let (else_body, end) = if self.match_keyword("else") {
            let body = self.parse_inlineable_body()?;
            let span = body.source.span();
            (Some(body), span)
        } else {
            (None, then_body.source.span())
        };

        Ok(Expression::If {
            condition,
            then_body,
            else_body,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a `throw expression`.
    fn parse_throw(&mut self) -> Parse<Expression> {
        let start = self.expect_keyword("throw")?.span();
        let exception = Box::new(self.parse_expression()?);
        let span = start.merge(exception.source().span());
        Ok(Expression::Throw {
            exception,
            source: self.src(span),
        })
    }

    /// Parses a `try body catch* [then always body]` expression.
    fn parse_try(&mut self) -> Parse<Expression> {
        let start = self.expect_keyword("try")?.span();
        let body = self.parse_inlineable_body()?;

        let mut catches = Vec::new();
        while self.check_keyword("catch") {
            catches.push(self.parse_catch()?);
        }

        let mut end = catches
            .last()
            .map_or(body.source.span(), |catch| catch.source.span());

        let always = if self.check_keyword("then")
            && matches!(self.peek_at(1), Some(TokenKind::Identifier(word)) if word == "always")
        {
            self.advance(); // then
            self.advance(); // always
            let always_body = self.parse_inlineable_body()?;
            end = always_body.source.span();
            Some(always_body)
        } else {
            None
        };

        Ok(Expression::Try {
            body,
            catches,
            always,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a `catch name [: Type] body` clause.
    fn parse_catch(&mut self) -> Parse<crate::ast::Catch> {
        let start = self.expect_keyword("catch")?.span();
        let parameter = self.parse_parameter()?;
        let parameter_type = if self.match_token(&TokenKind::Colon) {
            Some(self.parse_fq_reference()?)
        } else {
            None
        };
        let body = self.parse_inlineable_body()?;
        let span = start.merge(body.source.span());

        Ok(crate::ast::Catch {
            parameter,
            parameter_type,
            body,
            source: self.src(span),
        })
    }

    /// Parses `new R(args)`, or `new R(args) with M1 with M2`, which
    /// desugars to an anonymous-singleton literal whose mixin list is the
    /// reverse of the `with` order.
    fn parse_new(&mut self) -> Parse<Expression> {
        let start = self.expect_keyword("new")?.span();
        let instantiated = self.parse_fq_reference()?;
        let (args, args_span) = self.parse_arguments()?;
        let mut end = args_span;

        let mut mixins = Vec::new();
        while self.match_keyword("with") {
            let reference = self.parse_fq_reference()?;
            end = reference.source.span();
            mixins.push(reference);
        }

        let source = self.src(start.merge(end));
        if mixins.is_empty() {
            return Ok(Expression::New {
                instantiated,
                args,
                source,
            });
        }

        mixins.reverse();
        Ok(Expression::Literal(Literal {
            value: LiteralValue::Singleton(Box::new(Singleton {
                name: None,
                superclass: Some(instantiated),
                supercall_args: args,
                mixins,
                members: Vec::new(),
                problems: Vec::new(),
                closure_code: None,
                source: source.clone(),
            })),
            source,
        }))
    }

    /// Parses an `object …` literal: an anonymous singleton in expression
    /// position.
    fn parse_object_literal(&mut self) -> Parse<Expression> {
        let start = self.expect_keyword("object")?.span();
        let singleton = self.parse_singleton_rest(start, None)?;
        let source = singleton.source.clone();
        Ok(Expression::Literal(Literal {
            value: LiteralValue::Singleton(Box::new(singleton)),
            source,
        }))
    }

    // ========================================================================
    // Closures
    // ========================================================================

    /// Parses a closure literal `{ [params =>] sentences }`.
    ///
    /// The parameter list is tried first and backtracked when no `=>`
    /// follows, so `{ x }` is a zero-parameter closure returning `x`.
    pub(super) fn parse_closure(&mut self) -> Parse<Expression> {
        let open = self.expect_token(&TokenKind::LeftBrace, "{")?.span();
        let parameters = self
            .attempt(Self::parse_closure_parameters)
            .unwrap_or_default();
        let sentences = self.parse_sentences_until_brace()?;
        let close = self.expect_token(&TokenKind::RightBrace, "}")?.span();

        let span = open.merge(close);
        let code = EcoString::from(self.raw(span));
        Ok(self.closure_literal(parameters, sentences, code, span))
    }

    /// Parses `p1, …, pn =>` at the head of a closure. The parameter list
    /// may be empty (`{ => … }`).
    fn parse_closure_parameters(&mut self) -> Parse<Vec<Parameter>> {
        let mut parameters = Vec::new();
        if matches!(self.current_kind(), TokenKind::Identifier(_)) {
            loop {
                parameters.push(self.parse_parameter()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_token(&TokenKind::FatArrow, "=>")?;
        Ok(parameters)
    }

    /// Wraps an already-parsed expression in a synthesized zero-parameter
    /// closure, used to defer the right-hand side of lazy operators.
    pub(super) fn closure_thunk(&self, expression: Expression) -> Expression {
        let span = expression.source().span();
        let code = EcoString::from(self.raw(span));
        self.closure_literal(
            Vec::new(),
            vec![Sentence::Expression(expression)],
            code,
            span,
        )
    }

    /// Builds a closure literal: an anonymous singleton with one
    /// [`CLOSURE_METHOD`] method holding the parameters and sentences, and
    /// the verbatim source text recorded as `closure_code`.
    fn closure_literal(
        &self,
        parameters: Vec<Parameter>,
        sentences: Vec<Sentence>,
        code: EcoString,
        span: Span,
    ) -> Expression {
        let source = self.src(span);
        let body = Body {
            sentences,
            source: source.clone(),
        };

        Expression::Literal(Literal {
            value: LiteralValue::Singleton(Box::new(Singleton {
                name: None,
                superclass: None,
                supercall_args: Vec::new(),
                mixins: Vec::new(),
                members: vec![Member::Method(Method {
                    is_override: false,
                    name: CLOSURE_METHOD.into(),
                    parameters,
                    body: MethodBody::Block(body),
                    source: source.clone(),
                })],
                problems: Vec::new(),
                closure_code: Some(code),
                source: source.clone(),
            })),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse_ok;
    use super::*;
    use crate::ast::Entity;

    /// Parses sentences through a wrapping program.
    fn parse_sentences(source: &str) -> Vec<Sentence> {
        let package = parse_ok(&format!("program main {{ {source} }}"));
        match package.members.into_iter().next() {
            Some(Entity::Program(program)) => program.body.sentences,
            other => panic!("Expected program, got {other:?}"),
        }
    }

    /// Parses a single expression sentence.
    fn parse_expression_node(source: &str) -> Expression {
        let mut sentences = parse_sentences(source);
        assert_eq!(sentences.len(), 1, "expected one sentence");
        match sentences.pop() {
            Some(Sentence::Expression(expression)) => expression,
            other => panic!("Expected expression sentence, got {other:?}"),
        }
    }

    fn number(expression: &Expression) -> f64 {
        match expression {
            Expression::Literal(Literal {
                value: LiteralValue::Number(n),
                ..
            }) => *n,
            other => panic!("Expected number literal, got {other:?}"),
        }
    }

    #[test]
    fn parse_scalar_literals() {
        assert!(matches!(
            parse_expression_node("null"),
            Expression::Literal(Literal {
                value: LiteralValue::Null,
                ..
            })
        ));
        assert!(matches!(
            parse_expression_node("true"),
            Expression::Literal(Literal {
                value: LiteralValue::Boolean(true),
                ..
            })
        ));
        assert_eq!(number(&parse_expression_node("42")), 42.0);
        assert_eq!(number(&parse_expression_node("3.5")), 3.5);
        assert!(matches!(
            parse_expression_node("\"hola\""),
            Expression::Literal(Literal {
                value: LiteralValue::String(s),
                ..
            }) if s == "hola"
        ));
    }

    #[test]
    fn operator_precedence_matches_the_table() {
        // 1 + 2 * 3 ** 4 == 5 parses as ((1 + (2 * (3 ** 4))) == 5)
        let Expression::Send {
            receiver, message, args, ..
        } = parse_expression_node("1 + 2 * 3 ** 4 == 5")
        else {
            panic!("Expected send");
        };
        assert_eq!(message, "==");
        assert_eq!(number(&args[0]), 5.0);

        let Expression::Send {
            receiver: one,
            message: plus,
            args: plus_args,
            ..
        } = *receiver
        else {
            panic!("Expected send");
        };
        assert_eq!(plus, "+");
        assert_eq!(number(&one), 1.0);

        let Expression::Send {
            receiver: two,
            message: times,
            args: times_args,
            ..
        } = plus_args.into_iter().next().unwrap()
        else {
            panic!("Expected send");
        };
        assert_eq!(times, "*");
        assert_eq!(number(&two), 2.0);

        let Expression::Send {
            receiver: three,
            message: power,
            args: power_args,
            ..
        } = times_args.into_iter().next().unwrap()
        else {
            panic!("Expected send");
        };
        assert_eq!(power, "**");
        assert_eq!(number(&three), 3.0);
        assert_eq!(number(&power_args[0]), 4.0);
    }

    #[test]
    fn infix_operators_are_left_associative() {
        // 10 - 4 - 3 parses as (10 - 4) - 3
        let Expression::Send { receiver, args, .. } = parse_expression_node("10 - 4 - 3") else {
            panic!("Expected send");
        };
        assert_eq!(number(&args[0]), 3.0);
        assert!(matches!(*receiver, Expression::Send { .. }));
    }

    #[test]
    fn parentheses_override_precedence() {
        // (1 + 2) * 3
        let Expression::Send {
            receiver, message, ..
        } = parse_expression_node("(1 + 2) * 3")
        else {
            panic!("Expected send");
        };
        assert_eq!(message, "*");
        let Expression::Send { message: inner, .. } = *receiver else {
            panic!("Expected send");
        };
        assert_eq!(inner, "+");
    }

    #[test]
    fn lazy_operators_thunk_their_right_operand() {
        let Expression::Send { message, args, .. } = parse_expression_node("a or b") else {
            panic!("Expected send");
        };
        assert_eq!(message, "or");
        assert_eq!(args.len(), 1);

        let Expression::Literal(Literal {
            value: LiteralValue::Singleton(closure),
            ..
        }) = &args[0]
        else {
            panic!("Expected closure argument, got {:?}", args[0]);
        };
        assert!(closure.is_closure());
        assert!(closure.closure_parameters().unwrap().is_empty());
        let sentences = closure.closure_sentences().unwrap();
        assert!(
            matches!(&sentences[0], Sentence::Expression(Expression::Reference(r)) if r.name == "b")
        );
    }

    #[test]
    fn eager_operators_pass_their_operand_directly() {
        let Expression::Send { message, args, .. } = parse_expression_node("a == b") else {
            panic!("Expected send");
        };
        assert_eq!(message, "==");
        assert!(matches!(&args[0], Expression::Reference(r) if r.name == "b"));
    }

    #[test]
    fn prefix_operators_stack_and_map_to_messages() {
        let Expression::Send {
            receiver, message, args, ..
        } = parse_expression_node("!!ok")
        else {
            panic!("Expected send");
        };
        assert_eq!(message, "negate");
        assert!(args.is_empty());
        let Expression::Send {
            receiver: inner,
            message: inner_message,
            ..
        } = *receiver
        else {
            panic!("Expected send");
        };
        assert_eq!(inner_message, "negate");
        assert!(matches!(*inner, Expression::Reference(r) if r.name == "ok"));

        let Expression::Send { message, .. } = parse_expression_node("not done") else {
            panic!("Expected send");
        };
        assert_eq!(message, "negate");

        let Expression::Send { message, .. } = parse_expression_node("- (x)") else {
            panic!("Expected send");
        };
        assert_eq!(message, "invert");
    }

    #[test]
    fn negative_number_is_a_literal_not_a_send() {
        assert_eq!(number(&parse_expression_node("-5")), -5.0);
    }

    #[test]
    fn send_chains_fold_left() {
        let Expression::Send {
            receiver, message, ..
        } = parse_expression_node("pepita.fly(10).energy()")
        else {
            panic!("Expected send");
        };
        assert_eq!(message, "energy");
        let Expression::Send {
            receiver: pepita,
            message: fly,
            args,
            ..
        } = *receiver
        else {
            panic!("Expected send");
        };
        assert_eq!(fly, "fly");
        assert_eq!(args.len(), 1);
        assert!(matches!(*pepita, Expression::Reference(r) if r.name == "pepita"));
    }

    #[test]
    fn closure_as_trailing_send_argument() {
        let Expression::Send {
            receiver, message, args, ..
        } = parse_expression_node("xs.map { x => x * 2 }")
        else {
            panic!("Expected send");
        };
        assert_eq!(message, "map");
        assert!(matches!(*receiver, Expression::Reference(r) if r.name == "xs"));
        assert_eq!(args.len(), 1);

        let Expression::Literal(Literal {
            value: LiteralValue::Singleton(closure),
            ..
        }) = &args[0]
        else {
            panic!("Expected closure argument");
        };
        let parameters = closure.closure_parameters().unwrap();
        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters[0].name, "x");
        let sentences = closure.closure_sentences().unwrap();
        assert!(matches!(
            &sentences[0],
            Sentence::Expression(Expression::Send { message, .. }) if message == "*"
        ));
    }

    #[test]
    fn closure_records_its_verbatim_code() {
        let expression = parse_expression_node("{ x => x * 2 }");
        let Expression::Literal(Literal {
            value: LiteralValue::Singleton(closure),
            ..
        }) = expression
        else {
            panic!("Expected closure");
        };
        assert_eq!(closure.closure_code.as_deref(), Some("{ x => x * 2 }"));
        assert_eq!(closure.members.len(), 1);
        let Member::Method(apply) = &closure.members[0] else {
            panic!("Expected method");
        };
        assert_eq!(apply.name, CLOSURE_METHOD);
    }

    #[test]
    fn braced_sentences_without_arrow_are_a_zero_parameter_closure() {
        let expression = parse_expression_node("{ 1 + 2 }");
        let Expression::Literal(Literal {
            value: LiteralValue::Singleton(closure),
            ..
        }) = expression
        else {
            panic!("Expected closure");
        };
        assert!(closure.closure_parameters().unwrap().is_empty());
        assert_eq!(closure.closure_sentences().unwrap().len(), 1);
    }

    #[test]
    fn list_literal_desugars_to_new_list() {
        let Expression::New {
            instantiated, args, ..
        } = parse_expression_node("[1, 2, 3]")
        else {
            panic!("Expected new");
        };
        assert_eq!(instantiated.name, LIST_MODULE);
        assert_eq!(args.len(), 3);
        assert_eq!(number(&args[0]), 1.0);
    }

    #[test]
    fn set_literal_desugars_to_new_set() {
        let Expression::New {
            instantiated, args, ..
        } = parse_expression_node("#{1, 2}")
        else {
            panic!("Expected new");
        };
        assert_eq!(instantiated.name, SET_MODULE);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn new_with_positional_and_named_arguments() {
        let Expression::New { args, .. } = parse_expression_node("new Bird(100)") else {
            panic!("Expected new");
        };
        assert_eq!(args.len(), 1);

        let Expression::New {
            instantiated, args, ..
        } = parse_expression_node("new Bird(energy = 100, name = \"pepita\")")
        else {
            panic!("Expected new");
        };
        assert_eq!(instantiated.name, "Bird");
        assert_eq!(args.len(), 2);
        assert!(matches!(
            &args[0],
            Expression::NamedArgument { name, .. } if name == "energy"
        ));
    }

    #[test]
    fn new_with_mixins_desugars_to_anonymous_singleton() {
        let expression = parse_expression_node("new A(1) with M1 with M2");
        let Expression::Literal(Literal {
            value: LiteralValue::Singleton(singleton),
            ..
        }) = expression
        else {
            panic!("Expected singleton literal, got something else");
        };
        assert_eq!(singleton.name, None);
        assert_eq!(
            singleton.superclass.as_ref().map(|r| r.name.as_str()),
            Some("A")
        );
        assert_eq!(singleton.supercall_args.len(), 1);
        let mixins: Vec<_> = singleton.mixins.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(mixins, vec!["M2", "M1"]);
        assert!(singleton.members.is_empty());
        assert!(!singleton.is_closure());
    }

    #[test]
    fn object_literal_in_expression_position() {
        let mut sentences = parse_sentences("var visitor = object { method visit(x) { } }");
        let Some(Sentence::Variable(variable)) = sentences.pop() else {
            panic!("Expected variable");
        };
        let Some(Expression::Literal(Literal {
            value: LiteralValue::Singleton(singleton),
            ..
        })) = variable.value
        else {
            panic!("Expected singleton literal");
        };
        assert_eq!(singleton.name, None);
        assert_eq!(singleton.members.len(), 1);
    }

    #[test]
    fn parse_if_with_inline_branches() {
        let Expression::If {
            condition,
            then_body,
            else_body,
            ..
        } = parse_expression_node("if (x > 0) x else 0 - x")
        else {
            panic!("Expected if");
        };
        assert!(matches!(*condition, Expression::Send { .. }));
        assert_eq!(then_body.sentences.len(), 1);
        assert_eq!(else_body.unwrap().sentences.len(), 1);
    }

    #[test]
    fn parse_if_without_else() {
        let Expression::If { else_body, .. } = parse_expression_node("if (ready) { go() }")
        else {
            panic!("Expected if");
        };
        assert!(else_body.is_none());
    }

    #[test]
    fn parse_try_catch_always() {
        let Expression::Try {
            body,
            catches,
            always,
            ..
        } = parse_expression_node(
            "try { risky() } catch e : wollok.lang.Exception { handle(e) } then always { cleanup() }",
        )
        else {
            panic!("Expected try");
        };
        assert_eq!(body.sentences.len(), 1);
        assert_eq!(catches.len(), 1);
        assert_eq!(catches[0].parameter.name, "e");
        assert_eq!(
            catches[0].parameter_type.as_ref().map(|r| r.name.as_str()),
            Some("wollok.lang.Exception")
        );
        assert!(always.is_some());
    }

    #[test]
    fn parse_catch_without_type() {
        let Expression::Try { catches, always, .. } =
            parse_expression_node("try 1 catch e 2")
        else {
            panic!("Expected try");
        };
        assert_eq!(catches.len(), 1);
        assert!(catches[0].parameter_type.is_none());
        assert!(always.is_none());
    }

    #[test]
    fn parse_throw() {
        let Expression::Throw { exception, .. } =
            parse_expression_node("throw new Exception(\"boom\")")
        else {
            panic!("Expected throw");
        };
        assert!(matches!(*exception, Expression::New { .. }));
    }

    #[test]
    fn parse_self_and_super() {
        let sentences = parse_sentences("self.fly(1)");
        let Sentence::Expression(Expression::Send { receiver, .. }) = &sentences[0] else {
            panic!("Expected send");
        };
        assert!(matches!(**receiver, Expression::SelfRef { .. }));
    }

    #[test]
    fn compound_assignment_desugars_to_a_send() {
        let mut sentences = parse_sentences("x += 1");
        let Some(Sentence::Assignment(assignment)) = sentences.pop() else {
            panic!("Expected assignment");
        };
        assert_eq!(assignment.variable.name, "x");

        let Expression::Send {
            receiver, message, args, ..
        } = assignment.value
        else {
            panic!("Expected send");
        };
        assert_eq!(message, "+");
        assert!(matches!(*receiver, Expression::Reference(r) if r.name == "x"));
        assert_eq!(number(&args[0]), 1.0);
    }

    #[test]
    fn lazy_compound_assignment_thunks_its_operand() {
        let mut sentences = parse_sentences("x ||= fallback()");
        let Some(Sentence::Assignment(assignment)) = sentences.pop() else {
            panic!("Expected assignment");
        };

        let Expression::Send { message, args, .. } = assignment.value else {
            panic!("Expected send");
        };
        assert_eq!(message, "||");
        assert_eq!(args.len(), 1);
        let Expression::Literal(Literal {
            value: LiteralValue::Singleton(closure),
            ..
        }) = &args[0]
        else {
            panic!("Expected closure argument");
        };
        assert!(closure.is_closure());
        assert!(closure.closure_parameters().unwrap().is_empty());
    }

    #[test]
    fn plain_assignment_is_not_desugared() {
        let mut sentences = parse_sentences("x = 1");
        let Some(Sentence::Assignment(assignment)) = sentences.pop() else {
            panic!("Expected assignment");
        };
        assert_eq!(number(&assignment.value), 1.0);
    }

    #[test]
    fn variable_and_return_sentences() {
        let sentences = parse_sentences("const x = 1 return x");
        assert_eq!(sentences.len(), 2);
        let Sentence::Variable(variable) = &sentences[0] else {
            panic!("Expected variable");
        };
        assert!(variable.is_read_only);
        let Sentence::Return(ret) = &sentences[1] else {
            panic!("Expected return");
        };
        assert!(ret.value.is_some());
    }

    #[test]
    fn bare_return_has_no_value() {
        let sentences = parse_sentences("return");
        let Sentence::Return(ret) = &sentences[0] else {
            panic!("Expected return");
        };
        assert!(ret.value.is_none());
    }

    #[test]
    fn sentences_may_be_separated_by_semicolons() {
        let sentences = parse_sentences("var x = 1; x = 2; x.inspect()");
        assert_eq!(sentences.len(), 3);
    }

    #[test]
    fn range_and_arrow_operators_are_sends() {
        let Expression::Send { message, .. } = parse_expression_node("1 .. 10") else {
            panic!("Expected send");
        };
        assert_eq!(message, "..");

        let Expression::Send { message, .. } = parse_expression_node("\"key\" -> 1") else {
            panic!("Expected send");
        };
        assert_eq!(message, "->");

        let Expression::Send { message, .. } = parse_expression_node("a ?: b") else {
            panic!("Expected send");
        };
        assert_eq!(message, "?:");
    }

    #[test]
    fn deeply_nested_parens_fail_gracefully() {
        let source = format!("program main {{ {}x{} }}", "(".repeat(200), ")".repeat(200));
        let package = super::super::parse_file("test.wlk", &source);
        // The nesting guard trips, the program fails, and file-level
        // recovery turns it into a problem instead of a stack overflow.
        assert!(!package.problems.is_empty() || !package.members.is_empty());
    }

    #[test]
    fn number_decoding() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("-7.5"), Some(-7.5));
        assert_eq!(parse_number("x"), None);
    }
}
