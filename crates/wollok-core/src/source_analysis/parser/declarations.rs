// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Declaration parsing for Wollok.
//!
//! This module handles entities and their members:
//! - Entities: `package`, `class`, `object`, `mixin`, `program`,
//!   `describe`, `test`, and top-level variables
//! - Members: fields, methods (with block, expression, native or absent
//!   bodies), constructors (with `self`/`super` delegation), fixtures
//!
//! Wollok keywords are not reserved, so every production dispatches on the
//! text of a leading identifier token.

use ecow::EcoString;

use crate::ast::{
    BaseCall, Body, Class, Constructor, Describe, Entity, Field, Fixture, Member, Method,
    MethodBody, Mixin, Package, Parameter, Problem, ProblemCode, Program, Reference, Return,
    Sentence, Singleton, Test,
};
use crate::source_analysis::token::is_operator_method_name;
use crate::source_analysis::{Span, TokenKind};

use super::{CLASS_MEMBER_SAFEWORDS, MEMBER_SAFEWORDS, Parse, Parser};

/// Which member alternation a container offers, and which safewords its
/// recovery resynchronizes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MemberContext {
    /// Classes: constructors, fields, methods.
    Class,
    /// Singletons and mixins: fields, methods.
    General,
    /// Describes: variables, fixtures, tests, methods.
    Describe,
}

impl MemberContext {
    fn safewords(self) -> &'static [&'static str] {
        match self {
            Self::Class => CLASS_MEMBER_SAFEWORDS,
            Self::General | Self::Describe => MEMBER_SAFEWORDS,
        }
    }
}

impl Parser<'_> {
    // ========================================================================
    // Entities
    // ========================================================================

    /// Parses one entity, dispatching on the leading keyword.
    pub(super) fn parse_entity(&mut self) -> Parse<Entity> {
        let keyword = match self.current_kind() {
            TokenKind::Identifier(name) => name.clone(),
            _ => return self.fail("an entity"),
        };

        match keyword.as_str() {
            "package" => self.parse_package_entity().map(Entity::Package),
            "class" => self.parse_class().map(Entity::Class),
            "mixin" => self.parse_mixin().map(Entity::Mixin),
            "object" => self.parse_object_entity().map(Entity::Singleton),
            "program" => self.parse_program().map(Entity::Program),
            "describe" => self.parse_describe().map(Entity::Describe),
            "test" | "only" => self.parse_test().map(Entity::Test),
            "var" | "const" => self.parse_variable().map(Entity::Variable),
            _ => self.fail("an entity"),
        }
    }

    /// Parses a nested `package N { imports entities }`.
    fn parse_package_entity(&mut self) -> Parse<Package> {
        let start = self.expect_keyword("package")?.span();
        let (name, _) = self.parse_name()?;
        self.expect_token(&TokenKind::LeftBrace, "{")?;
        let (imports, members, problems) = self.parse_package_contents(true);
        let end = self.expect_token(&TokenKind::RightBrace, "}")?.span();

        Ok(Package {
            name,
            imports,
            members,
            problems,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a `class N [inherits R] [mixed with …] { members }`.
    fn parse_class(&mut self) -> Parse<Class> {
        let start = self.expect_keyword("class")?.span();
        let (name, _) = self.parse_name()?;

        let superclass = if self.match_keyword("inherits") {
            Some(self.parse_fq_reference()?)
        } else {
            None
        };
        let mixins = self.parse_mixed_with()?;

        self.expect_token(&TokenKind::LeftBrace, "{")?;
        let (members, problems) = self.parse_members(MemberContext::Class);
        let end = self.expect_token(&TokenKind::RightBrace, "}")?.span();

        Ok(Class {
            name,
            superclass,
            mixins,
            members,
            problems,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a `mixin N [mixed with …] { members }`.
    fn parse_mixin(&mut self) -> Parse<Mixin> {
        let start = self.expect_keyword("mixin")?.span();
        let (name, _) = self.parse_name()?;
        let mixins = self.parse_mixed_with()?;

        self.expect_token(&TokenKind::LeftBrace, "{")?;
        let (members, problems) = self.parse_members(MemberContext::General);
        let end = self.expect_token(&TokenKind::RightBrace, "}")?.span();

        Ok(Mixin {
            name,
            mixins,
            members,
            problems,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses an `object [N] …` declaration. The name is optional: an
    /// anonymous singleton is legal in entity position too.
    fn parse_object_entity(&mut self) -> Parse<Singleton> {
        let start = self.expect_keyword("object")?.span();

        let has_name = matches!(
            self.current_kind(),
            TokenKind::Identifier(word) if !matches!(word.as_str(), "inherits" | "mixed")
        );
        let name = if has_name {
            Some(self.parse_name()?.0)
        } else {
            None
        };

        self.parse_singleton_rest(start, name)
    }

    /// Parses the common tail of every singleton form:
    /// `[inherits R(args)?] [mixed with …] { members }`.
    ///
    /// Shared between entity declarations (`object pepita { … }`) and the
    /// object-literal expression (`object { … }`).
    pub(super) fn parse_singleton_rest(
        &mut self,
        start: Span,
        name: Option<EcoString>,
    ) -> Parse<Singleton> {
        let (superclass, supercall_args) = if self.match_keyword("inherits") {
            let reference = self.parse_fq_reference()?;
            let args = if self.check(&TokenKind::LeftParen) {
                self.parse_arguments()?.0
            } else {
                Vec::new()
            };
            (Some(reference), args)
        } else {
            (None, Vec::new())
        };
        let mixins = self.parse_mixed_with()?;

        self.expect_token(&TokenKind::LeftBrace, "{")?;
        let (members, problems) = self.parse_members(MemberContext::General);
        let end = self.expect_token(&TokenKind::RightBrace, "}")?.span();

        Ok(Singleton {
            name,
            superclass,
            supercall_args,
            mixins,
            members,
            problems,
            closure_code: None,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a `program N { sentences }`.
    fn parse_program(&mut self) -> Parse<Program> {
        let start = self.expect_keyword("program")?.span();
        let (name, _) = self.parse_name()?;
        let body = self.parse_block_body()?;
        let end = body.source.span();

        Ok(Program {
            name,
            body,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a `describe "name" { members }`.
    fn parse_describe(&mut self) -> Parse<Describe> {
        let start = self.expect_keyword("describe")?.span();
        let (name, _) = self.parse_quoted_name()?;

        self.expect_token(&TokenKind::LeftBrace, "{")?;
        let (members, problems) = self.parse_members(MemberContext::Describe);
        let end = self.expect_token(&TokenKind::RightBrace, "}")?.span();

        Ok(Describe {
            name,
            members,
            problems,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses an `[only] test "name" { sentences }`.
    fn parse_test(&mut self) -> Parse<Test> {
        let start = self.current_token().span();
        let is_only = self.match_keyword("only");
        self.expect_keyword("test")?;
        let (name, _) = self.parse_quoted_name()?;
        let body = self.parse_block_body()?;
        let end = body.source.span();

        Ok(Test {
            is_only,
            name,
            body,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a string token, keeping the surrounding quotes: describe and
    /// test names are stored exactly as written.
    fn parse_quoted_name(&mut self) -> Parse<(EcoString, Span)> {
        match self.current_kind() {
            TokenKind::String(_) => {
                let span = self.current_token().span();
                self.advance();
                Ok((EcoString::from(self.raw(span)), span))
            }
            _ => self.fail("a quoted name"),
        }
    }

    /// Parses the `mixed with R (and R)*` clause, returning the references
    /// in **reverse** surface order (the linearization convention consumed
    /// downstream). Returns an empty list when the clause is absent.
    fn parse_mixed_with(&mut self) -> Parse<Vec<Reference>> {
        let has_clause = self.check_keyword("mixed")
            && matches!(self.peek_at(1), Some(TokenKind::Identifier(word)) if word == "with");
        if !has_clause {
            return Ok(Vec::new());
        }
        self.advance(); // mixed
        self.advance(); // with

        let mut mixins = vec![self.parse_fq_reference()?];
        while self.match_keyword("and") {
            mixins.push(self.parse_fq_reference()?);
        }
        mixins.reverse();
        Ok(mixins)
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Parses a member list up to the closing brace, recovering at member
    /// position with the context's safewords.
    fn parse_members(&mut self, context: MemberContext) -> (Vec<Member>, Vec<Problem>) {
        let mut members = Vec::new();
        let mut problems = Vec::new();

        loop {
            if self.is_at_end() || self.check(&TokenKind::RightBrace) {
                break;
            }
            match self.attempt(|parser| parser.parse_member(context)) {
                Ok(member) => members.push(member),
                Err(_) => {
                    problems.push(self.recover(context.safewords(), ProblemCode::MalformedMember));
                }
            }
        }

        (members, problems)
    }

    /// Parses one member, dispatching on the leading keyword and context.
    fn parse_member(&mut self, context: MemberContext) -> Parse<Member> {
        let keyword = match self.current_kind() {
            TokenKind::Identifier(name) => name.clone(),
            _ => return self.fail("a member"),
        };

        match (context, keyword.as_str()) {
            (MemberContext::Class, "constructor") => {
                self.parse_constructor().map(Member::Constructor)
            }
            (MemberContext::Describe, "var" | "const") => {
                self.parse_variable().map(Member::Variable)
            }
            (MemberContext::Describe, "fixture") => self.parse_fixture().map(Member::Fixture),
            (MemberContext::Describe, "test" | "only") => self.parse_test().map(Member::Test),
            (_, "var" | "const") => self.parse_field().map(Member::Field),
            (_, "method" | "override") => self.parse_method().map(Member::Method),
            _ => self.fail("a member"),
        }
    }

    /// Parses a `(var|const) [property] name [= expression]` field.
    fn parse_field(&mut self) -> Parse<Field> {
        let start = self.current_token().span();
        let is_read_only = if self.match_keyword("const") {
            true
        } else if self.match_keyword("var") {
            false
        } else {
            return self.fail("var or const");
        };
        let is_property = self.match_keyword("property");
        let (name, name_span) = self.parse_name()?;

        let mut end = name_span;
        let value = if self.match_operator("=") {
            let expression = self.parse_expression()?;
            end = expression.source().span();
            Some(expression)
        } else {
            None
        };

        Ok(Field {
            is_read_only,
            is_property,
            name,
            value,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a `[override] method name|op (params) body-spec` declaration.
    ///
    /// The body-spec alternation: `= expression` desugars to a one-sentence
    /// return body spanning exactly the expression; `native` marks a
    /// host-implemented body; a brace block is parsed as-is; and nothing at
    /// all leaves the method abstract.
    fn parse_method(&mut self) -> Parse<Method> {
        let start = self.current_token().span();
        let is_override = self.match_keyword("override");
        self.expect_keyword("method")?;

        let name = match self.current_kind() {
            TokenKind::Identifier(_) => self.parse_name()?.0,
            // Operator-valued method names; the lexer's longest match
            // guarantees `method === (x)` names `===`, not `==`.
            TokenKind::Operator(op) if is_operator_method_name(op) => {
                let op = op.clone();
                self.advance();
                op
            }
            _ => return self.fail("a method name"),
        };

        let (parameters, params_span) = self.parse_parameters()?;

        let (body, end) = if self.match_operator("=") {
            let expression = self.parse_expression()?;
            let span = expression.source().span();
            let source = expression.source().clone();
            let sentences = vec![Sentence::Return(Return {
                value: Some(expression),
                source: source.clone(),
            })];
            (MethodBody::Block(Body { sentences, source }), span)
        } else if self.check_keyword("native") {
            let span = self.advance().span();
            (MethodBody::Native, span)
        } else if self.check(&TokenKind::LeftBrace) {
            let body = self.parse_block_body()?;
            let span = body.source.span();
            (MethodBody::Block(body), span)
        } else {
            (MethodBody::Abstract, params_span)
        };

        Ok(Method {
            is_override,
            name,
            parameters,
            body,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a `constructor (params) [= self|super(args)] [{ … }]`.
    fn parse_constructor(&mut self) -> Parse<Constructor> {
        let start = self.expect_keyword("constructor")?.span();
        let (parameters, params_span) = self.parse_parameters()?;
        let mut end = params_span;

        let base_call = if self.match_operator("=") {
            let calls_super = if self.match_keyword("super") {
                true
            } else if self.match_keyword("self") {
                false
            } else {
                return self.fail("self or super");
            };
            let (args, args_span) = self.parse_arguments()?;
            end = args_span;
            Some(BaseCall { calls_super, args })
        } else {
            None
        };

        let body = if self.check(&TokenKind::LeftBrace) {
            let body = self.parse_block_body()?;
            end = body.source.span();
            body
        } else {
            // A missing body yields an empty one at the declaration's end.
            Body {
                sentences: Vec::new(),
                source: self.src(Span::new(end.end(), end.end())),
            }
        };

        Ok(Constructor {
            parameters,
            base_call,
            body,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a `fixture { sentences }` block.
    fn parse_fixture(&mut self) -> Parse<Fixture> {
        let start = self.expect_keyword("fixture")?.span();
        let body = self.parse_block_body()?;
        let end = body.source.span();

        Ok(Fixture {
            body,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a parenthesized parameter list, returning the parameters and
    /// the span of the parens.
    pub(super) fn parse_parameters(&mut self) -> Parse<(Vec<Parameter>, Span)> {
        let open = self.expect_token(&TokenKind::LeftParen, "(")?.span();
        let mut parameters = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                parameters.push(self.parse_parameter()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let close = self.expect_token(&TokenKind::RightParen, ")")?.span();
        Ok((parameters, open.merge(close)))
    }

    /// Parses one parameter: a name with an optional `...` vararg marker.
    pub(super) fn parse_parameter(&mut self) -> Parse<Parameter> {
        let (name, name_span) = self.parse_name()?;
        let (is_var_arg, span) = if self.check(&TokenKind::Ellipsis) {
            (true, name_span.merge(self.advance().span()))
        } else {
            (false, name_span)
        };

        Ok(Parameter {
            name,
            is_var_arg,
            source: self.src(span),
        })
    }
}
