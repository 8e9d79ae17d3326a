// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Reportable syntax errors.
//!
//! The parser itself never fails: malformed regions are recorded as
//! [`Problem`] nodes on their enclosing recoverable container. This module
//! turns those problems into [`SyntaxError`]s carrying labeled spans, with
//! [`miette`] integration for rendering. The parser produces only codes and
//! spans; message text is the renderer's job.

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{
    Body, Entity, Expression, Literal, LiteralValue, Member, MethodBody, Package, Problem,
    ProblemCode, Sentence, Singleton,
};

use super::Span;

/// A syntax problem extracted from a parsed tree.
///
/// Displays as its diagnostic code (`malformedEntity` or
/// `malformedMember`); the labeled span points at the malformed region.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{code}")]
#[diagnostic()]
pub struct SyntaxError {
    /// The diagnostic code.
    pub code: ProblemCode,
    /// The malformed source region.
    #[label("malformed code")]
    pub span: Span,
}

impl From<&Problem> for SyntaxError {
    fn from(problem: &Problem) -> Self {
        Self {
            code: problem.code,
            span: problem.source.span(),
        }
    }
}

/// Collects every [`Problem`] in the package's subtree as a [`SyntaxError`].
///
/// Problems live on the five recoverable containers (package, class,
/// singleton, mixin, describe); singletons also occur in expression
/// position (object literals), so the walk descends through bodies and
/// expressions.
#[must_use]
pub fn collect_errors(package: &Package) -> Vec<SyntaxError> {
    let mut errors = Vec::new();
    walk_package(package, &mut errors);
    errors
}

fn push_all(problems: &[Problem], errors: &mut Vec<SyntaxError>) {
    errors.extend(problems.iter().map(SyntaxError::from));
}

fn walk_package(package: &Package, errors: &mut Vec<SyntaxError>) {
    push_all(&package.problems, errors);
    for entity in &package.members {
        walk_entity(entity, errors);
    }
}

fn walk_entity(entity: &Entity, errors: &mut Vec<SyntaxError>) {
    match entity {
        Entity::Package(package) => walk_package(package, errors),
        Entity::Class(class) => {
            push_all(&class.problems, errors);
            for member in &class.members {
                walk_member(member, errors);
            }
        }
        Entity::Singleton(singleton) => walk_singleton(singleton, errors),
        Entity::Mixin(mixin) => {
            push_all(&mixin.problems, errors);
            for member in &mixin.members {
                walk_member(member, errors);
            }
        }
        Entity::Describe(describe) => {
            push_all(&describe.problems, errors);
            for member in &describe.members {
                walk_member(member, errors);
            }
        }
        Entity::Program(program) => walk_body(&program.body, errors),
        Entity::Test(test) => walk_body(&test.body, errors),
        Entity::Variable(variable) => {
            if let Some(value) = &variable.value {
                walk_expression(value, errors);
            }
        }
    }
}

fn walk_singleton(singleton: &Singleton, errors: &mut Vec<SyntaxError>) {
    push_all(&singleton.problems, errors);
    for arg in &singleton.supercall_args {
        walk_expression(arg, errors);
    }
    for member in &singleton.members {
        walk_member(member, errors);
    }
}

fn walk_member(member: &Member, errors: &mut Vec<SyntaxError>) {
    match member {
        Member::Field(field) => {
            if let Some(value) = &field.value {
                walk_expression(value, errors);
            }
        }
        Member::Method(method) => {
            if let MethodBody::Block(body) = &method.body {
                walk_body(body, errors);
            }
        }
        Member::Constructor(constructor) => {
            if let Some(base_call) = &constructor.base_call {
                for arg in &base_call.args {
                    walk_expression(arg, errors);
                }
            }
            walk_body(&constructor.body, errors);
        }
        Member::Fixture(fixture) => walk_body(&fixture.body, errors),
        Member::Test(test) => walk_body(&test.body, errors),
        Member::Variable(variable) => {
            if let Some(value) = &variable.value {
                walk_expression(value, errors);
            }
        }
    }
}

fn walk_body(body: &Body, errors: &mut Vec<SyntaxError>) {
    for sentence in &body.sentences {
        match sentence {
            Sentence::Variable(variable) => {
                if let Some(value) = &variable.value {
                    walk_expression(value, errors);
                }
            }
            Sentence::Return(ret) => {
                if let Some(value) = &ret.value {
                    walk_expression(value, errors);
                }
            }
            Sentence::Assignment(assignment) => walk_expression(&assignment.value, errors),
            Sentence::Expression(expression) => walk_expression(expression, errors),
        }
    }
}

fn walk_expression(expression: &Expression, errors: &mut Vec<SyntaxError>) {
    match expression {
        Expression::Literal(Literal {
            value: LiteralValue::Singleton(singleton),
            ..
        }) => walk_singleton(singleton, errors),
        Expression::Literal(_) | Expression::Reference(_) | Expression::SelfRef { .. } => {}
        Expression::Super { args, .. } => {
            for arg in args {
                walk_expression(arg, errors);
            }
        }
        Expression::New { args, .. } => {
            for arg in args {
                walk_expression(arg, errors);
            }
        }
        Expression::If {
            condition,
            then_body,
            else_body,
            ..
        } => {
            walk_expression(condition, errors);
            walk_body(then_body, errors);
            if let Some(else_body) = else_body {
                walk_body(else_body, errors);
            }
        }
        Expression::Throw { exception, .. } => walk_expression(exception, errors),
        Expression::Try {
            body,
            catches,
            always,
            ..
        } => {
            walk_body(body, errors);
            for catch in catches {
                walk_body(&catch.body, errors);
            }
            if let Some(always) = always {
                walk_body(always, errors);
            }
        }
        Expression::Send { receiver, args, .. } => {
            walk_expression(receiver, errors);
            for arg in args {
                walk_expression(arg, errors);
            }
        }
        Expression::NamedArgument { value, .. } => walk_expression(value, errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::parse_file;

    #[test]
    fn syntax_error_display() {
        let package = parse_file("bad.wlk", "class A {} @bogus class B {}");
        let errors = collect_errors(&package);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "malformedEntity");
    }

    #[test]
    fn collects_nested_problems() {
        let source = "object box { var contents = object { trash method empty() { } } }";
        let package = parse_file("nested.wlk", source);
        let errors = collect_errors(&package);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "malformedMember");
    }

    #[test]
    fn well_formed_file_has_no_errors() {
        let package = parse_file("ok.wlk", "class Bird { method fly() { } }");
        assert!(collect_errors(&package).is_empty());
    }
}
