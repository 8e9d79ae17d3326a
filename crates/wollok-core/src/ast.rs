// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract Syntax Tree (AST) definitions for Wollok.
//!
//! These are the **raw** (unlinked) nodes produced by the parser: untyped,
//! with no cross-file references resolved. Every node carries a [`Source`]
//! for error reporting and IDE features.
//!
//! # Design Philosophy
//!
//! - **All nodes have provenance** - [`Source`] spans with file, offset,
//!   line and column
//! - **Error recovery** - recoverable containers carry a `problems` list of
//!   [`Problem`] nodes covering malformed regions, while their `members`
//!   hold only well-formed children
//! - **Canonical shapes** - surface sugar is rewritten at parse time:
//!   operators become [`Expression::Send`]s, collection literals become
//!   [`Expression::New`]s, closures become anonymous [`Singleton`]s with a
//!   single [`CLOSURE_METHOD`] method
//!
//! # Ownership
//!
//! Nodes are built bottom-up, are immutable after construction, and are
//! owned by their parent; a top-level [`Package`] exclusively owns its
//! subtree. The one deliberate duplication is compound assignment: the
//! target [`Reference`] is cloned into the receiver of the desugared send
//! (the tree stays a tree, not a DAG).

use ecow::EcoString;

use crate::source_analysis::Source;

/// Fully-qualified name of the list class that collection literals
/// instantiate: `[1, 2]` desugars to `new wollok.lang.List(1, 2)`.
pub const LIST_MODULE: &str = "wollok.lang.List";

/// Fully-qualified name of the set class that `#{…}` literals instantiate.
pub const SET_MODULE: &str = "wollok.lang.Set";

/// Name of the single method carried by a closure's anonymous singleton.
pub const CLOSURE_METHOD: &str = "apply";

// ============================================================================
// Entities
// ============================================================================

/// A top-level or nested container declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// A nested `package N { … }` declaration.
    Package(Package),
    /// A `class` declaration.
    Class(Class),
    /// An `object` declaration (well-known object).
    Singleton(Singleton),
    /// A `mixin` declaration.
    Mixin(Mixin),
    /// A `program` entry point.
    Program(Program),
    /// A `describe "…"` test suite.
    Describe(Describe),
    /// A free-standing `test "…"`.
    Test(Test),
    /// A top-level `var` or `const`.
    Variable(Variable),
}

impl Entity {
    /// Returns the declared name, if the entity has one (anonymous
    /// singletons do not).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Package(node) => Some(&node.name),
            Self::Class(node) => Some(&node.name),
            Self::Singleton(node) => node.name.as_deref(),
            Self::Mixin(node) => Some(&node.name),
            Self::Program(node) => Some(&node.name),
            Self::Describe(node) => Some(&node.name),
            Self::Test(node) => Some(&node.name),
            Self::Variable(node) => Some(&node.name),
        }
    }

    /// Returns the source region of this entity.
    #[must_use]
    pub fn source(&self) -> &Source {
        match self {
            Self::Package(node) => &node.source,
            Self::Class(node) => &node.source,
            Self::Singleton(node) => &node.source,
            Self::Mixin(node) => &node.source,
            Self::Program(node) => &node.source,
            Self::Describe(node) => &node.source,
            Self::Test(node) => &node.source,
            Self::Variable(node) => &node.source,
        }
    }
}

/// A package: the root node of a parsed file, or a nested `package N { … }`.
///
/// The file-level package's `name` is the file's basename up to its first
/// `.`; its source spans the whole input.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    /// The package name.
    pub name: EcoString,
    /// `import` clauses, in source order.
    pub imports: Vec<Import>,
    /// Well-formed child entities.
    pub members: Vec<Entity>,
    /// Malformed regions recovered at entity position.
    pub problems: Vec<Problem>,
    /// Source region of the package.
    pub source: Source,
}

/// An `import a.b.c` or `import a.b.*` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// The imported entity, as a dotted reference.
    pub entity: Reference,
    /// True for the wildcard form `import a.b.*`.
    pub is_generic: bool,
    /// Source region of the clause.
    pub source: Source,
}

/// A `class` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    /// The class name.
    pub name: EcoString,
    /// `inherits` clause, if present.
    pub superclass: Option<Reference>,
    /// Linearized mixin list: the **reverse** of the surface `mixed with`
    /// order, so the rightmost listed mixin comes first.
    pub mixins: Vec<Reference>,
    /// Well-formed members (fields, methods, constructors).
    pub members: Vec<Member>,
    /// Malformed regions recovered at member position.
    pub problems: Vec<Problem>,
    /// Source region of the declaration.
    pub source: Source,
}

/// An `object` declaration or literal.
///
/// Three surface forms share this node: named well-known objects
/// (`object pepita { … }`), anonymous object literals (`object { … }` and
/// `object inherits A(…) { … }`), and closures (`{ x => … }`, recognizable
/// by `closure_code`).
#[derive(Debug, Clone, PartialEq)]
pub struct Singleton {
    /// The declared name; `None` for anonymous singletons and closures.
    pub name: Option<EcoString>,
    /// `inherits` clause, if present.
    pub superclass: Option<Reference>,
    /// Arguments of the `inherits A(…)` supercall (positional or
    /// [`Expression::NamedArgument`]s).
    pub supercall_args: Vec<Expression>,
    /// Linearized mixin list, reversed from surface order.
    pub mixins: Vec<Reference>,
    /// Well-formed members.
    pub members: Vec<Member>,
    /// Malformed regions recovered at member position.
    pub problems: Vec<Problem>,
    /// For closures: the verbatim source text of the literal, braces
    /// included. `None` for every other singleton.
    pub closure_code: Option<EcoString>,
    /// Source region of the declaration or literal.
    pub source: Source,
}

impl Singleton {
    /// Returns true if this singleton was produced from a closure literal.
    #[must_use]
    pub const fn is_closure(&self) -> bool {
        self.closure_code.is_some()
    }

    /// Returns the closure's parameters, if this singleton is a closure.
    #[must_use]
    pub fn closure_parameters(&self) -> Option<&[Parameter]> {
        if !self.is_closure() {
            return None;
        }
        match self.members.first() {
            Some(Member::Method(method)) => Some(&method.parameters),
            _ => None,
        }
    }

    /// Returns the closure's body sentences, if this singleton is a closure.
    #[must_use]
    pub fn closure_sentences(&self) -> Option<&[Sentence]> {
        if !self.is_closure() {
            return None;
        }
        match self.members.first() {
            Some(Member::Method(Method {
                body: MethodBody::Block(body),
                ..
            })) => Some(&body.sentences),
            _ => None,
        }
    }
}

/// A `mixin` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Mixin {
    /// The mixin name.
    pub name: EcoString,
    /// Linearized mixin list, reversed from surface order.
    pub mixins: Vec<Reference>,
    /// Well-formed members.
    pub members: Vec<Member>,
    /// Malformed regions recovered at member position.
    pub problems: Vec<Problem>,
    /// Source region of the declaration.
    pub source: Source,
}

/// A `program N { … }` entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The program name.
    pub name: EcoString,
    /// The program body.
    pub body: Body,
    /// Source region of the declaration.
    pub source: Source,
}

/// A `describe "…" { … }` test suite.
#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    /// The suite name, **including** its surrounding quotes, exactly as
    /// written in source.
    pub name: EcoString,
    /// Well-formed members (variables, fixtures, tests, methods).
    pub members: Vec<Member>,
    /// Malformed regions recovered at member position.
    pub problems: Vec<Problem>,
    /// Source region of the declaration.
    pub source: Source,
}

/// A `test "…" { … }` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    /// True if the test carries the `only` modifier.
    pub is_only: bool,
    /// The test name, **including** its surrounding quotes.
    pub name: EcoString,
    /// The test body.
    pub body: Body,
    /// Source region of the declaration.
    pub source: Source,
}

/// A `var` or `const` declaration: a sentence, a top-level entity, or a
/// describe member.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// True iff declared with `const`.
    pub is_read_only: bool,
    /// The variable name.
    pub name: EcoString,
    /// Initial value, if present.
    pub value: Option<Expression>,
    /// Source region of the declaration.
    pub source: Source,
}

// ============================================================================
// Members
// ============================================================================

/// A declaration inside an entity body.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// A `var`/`const` field of a class, object or mixin.
    Field(Field),
    /// A `method` declaration.
    Method(Method),
    /// A `constructor` declaration.
    Constructor(Constructor),
    /// A `fixture { … }` block inside a describe.
    Fixture(Fixture),
    /// A `test` inside a describe.
    Test(Test),
    /// A `var`/`const` local to a describe.
    Variable(Variable),
}

impl Member {
    /// Returns the source region of this member.
    #[must_use]
    pub fn source(&self) -> &Source {
        match self {
            Self::Field(node) => &node.source,
            Self::Method(node) => &node.source,
            Self::Constructor(node) => &node.source,
            Self::Fixture(node) => &node.source,
            Self::Test(node) => &node.source,
            Self::Variable(node) => &node.source,
        }
    }
}

/// A `var`/`const` field, optionally exposed as a `property`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// True iff declared with `const`.
    pub is_read_only: bool,
    /// True iff the `property` keyword follows the mutability keyword.
    pub is_property: bool,
    /// The field name.
    pub name: EcoString,
    /// Initial value, if present.
    pub value: Option<Expression>,
    /// Source region of the declaration.
    pub source: Source,
}

/// A `method` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// True iff declared with the `override` modifier.
    pub is_override: bool,
    /// The method name: an identifier or an operator symbol (`+`, `===`, …).
    pub name: EcoString,
    /// Declared parameters.
    pub parameters: Vec<Parameter>,
    /// The method body form.
    pub body: MethodBody,
    /// Source region of the declaration.
    pub source: Source,
}

/// The body of a [`Method`].
#[derive(Debug, Clone, PartialEq)]
pub enum MethodBody {
    /// No body: the method is abstract.
    Abstract,
    /// A `native` marker: the body is host-implemented.
    Native,
    /// A block body. The expression form `method m() = e` arrives here as
    /// a one-sentence body holding `return e`, with both the body and the
    /// return spanning exactly `e`.
    Block(Body),
}

/// A `constructor` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    /// Declared parameters.
    pub parameters: Vec<Parameter>,
    /// Delegation to `self(…)` or `super(…)`, if present.
    pub base_call: Option<BaseCall>,
    /// The constructor body; an omitted body parses as an empty one.
    pub body: Body,
    /// Source region of the declaration.
    pub source: Source,
}

/// Constructor delegation: `constructor(…) = super(…)` or `= self(…)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseCall {
    /// True for `super`, false for `self`.
    pub calls_super: bool,
    /// Delegated arguments.
    pub args: Vec<Expression>,
}

/// A `fixture { … }` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    /// The fixture body.
    pub body: Body,
    /// Source region of the declaration.
    pub source: Source,
}

/// A declared parameter of a method, constructor, closure or catch.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// The parameter name.
    pub name: EcoString,
    /// True for the vararg form `name...`.
    pub is_var_arg: bool,
    /// Source region of the parameter.
    pub source: Source,
}

// ============================================================================
// Sentences
// ============================================================================

/// A statement-level node.
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    /// A local `var`/`const` declaration.
    Variable(Variable),
    /// A `return` statement.
    Return(Return),
    /// An assignment to a reference.
    Assignment(Assignment),
    /// A bare expression in statement position.
    Expression(Expression),
}

impl Sentence {
    /// Returns the source region of this sentence.
    #[must_use]
    pub fn source(&self) -> &Source {
        match self {
            Self::Variable(node) => &node.source,
            Self::Return(node) => &node.source,
            Self::Assignment(node) => &node.source,
            Self::Expression(expression) => expression.source(),
        }
    }
}

/// A `return` statement with an optional value.
#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    /// The returned value, if any.
    pub value: Option<Expression>,
    /// Source region of the statement.
    pub source: Source,
}

/// An assignment `ref = value`.
///
/// Compound forms are canonicalized at parse time: `x += 1` arrives as
/// `Assignment(x, Send(x, "+", [1]))` with the target reference cloned into
/// the send's receiver, and the lazy forms `x ||= e` / `x &&= e` wrap `e`
/// in a zero-parameter closure.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The assigned reference.
    pub variable: Reference,
    /// The assigned value.
    pub value: Expression,
    /// Source region of the assignment.
    pub source: Source,
}

/// A sequence of sentences, as found between braces (or synthesized around
/// a single inline sentence).
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// The sentences, in source order.
    pub sentences: Vec<Sentence>,
    /// Source region of the body.
    pub source: Source,
}

// ============================================================================
// Expressions
// ============================================================================

/// A name referring to a variable, field or entity. Fully-qualified
/// references store their dot-joined path as a single name.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// The referenced name.
    pub name: EcoString,
    /// Source region of the reference.
    pub source: Source,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// The `self` keyword.
    SelfRef {
        /// Source region of the keyword.
        source: Source,
    },

    /// A `super(…)` call delegating to the inherited implementation.
    Super {
        /// Call arguments.
        args: Vec<Expression>,
        /// Source region of the call.
        source: Source,
    },

    /// A `new R(…)` instantiation.
    ///
    /// Collection literals desugar here too: `[1, 2]` becomes
    /// `new wollok.lang.List(1, 2)`. The `new R(…) with M` form does
    /// **not**: it produces an anonymous-singleton [`Expression::Literal`].
    New {
        /// The instantiated class reference.
        instantiated: Reference,
        /// Constructor arguments (positional or named).
        args: Vec<Expression>,
        /// Source region of the expression.
        source: Source,
    },

    /// An `if (…) … else …` expression. Bodies are inlineable: a single
    /// unbraced sentence parses as a one-sentence body.
    If {
        /// The condition.
        condition: Box<Expression>,
        /// The then branch.
        then_body: Body,
        /// The else branch, if present.
        else_body: Option<Body>,
        /// Source region of the expression.
        source: Source,
    },

    /// A `throw e` expression.
    Throw {
        /// The thrown exception.
        exception: Box<Expression>,
        /// Source region of the expression.
        source: Source,
    },

    /// A `try … catch … then always …` expression.
    Try {
        /// The protected body.
        body: Body,
        /// The catch clauses, in source order.
        catches: Vec<Catch>,
        /// The `then always` body, if present.
        always: Option<Body>,
        /// Source region of the expression.
        source: Source,
    },

    /// A literal value.
    Literal(Literal),

    /// A reference in expression position.
    Reference(Reference),

    /// A message send `receiver.message(args)`.
    ///
    /// Every operator application canonicalizes to a send: infix operators
    /// fold their right operand into `args` (lazy operators thunk it in a
    /// zero-parameter closure first), and prefix operators become
    /// zero-argument sends of `negate`/`invert`/`plus`.
    Send {
        /// The receiver.
        receiver: Box<Expression>,
        /// The message name: an identifier or an operator symbol.
        message: EcoString,
        /// The arguments.
        args: Vec<Expression>,
        /// Source region of the send.
        source: Source,
    },

    /// A named argument `name = value` inside an argument list.
    NamedArgument {
        /// The argument name.
        name: EcoString,
        /// The argument value.
        value: Box<Expression>,
        /// Source region of the argument.
        source: Source,
    },
}

impl Expression {
    /// Returns the source region of this expression.
    #[must_use]
    pub fn source(&self) -> &Source {
        match self {
            Self::SelfRef { source }
            | Self::Super { source, .. }
            | Self::New { source, .. }
            | Self::If { source, .. }
            | Self::Throw { source, .. }
            | Self::Try { source, .. }
            | Self::Send { source, .. }
            | Self::NamedArgument { source, .. } => source,
            Self::Literal(literal) => &literal.source,
            Self::Reference(reference) => &reference.source,
        }
    }
}

/// A `catch e : Type { … }` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    /// The bound exception parameter.
    pub parameter: Parameter,
    /// The declared exception type, if present.
    pub parameter_type: Option<Reference>,
    /// The handler body.
    pub body: Body,
    /// Source region of the clause.
    pub source: Source,
}

/// A literal expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    /// The literal value.
    pub value: LiteralValue,
    /// Source region of the literal.
    pub source: Source,
}

/// The value carried by a [`Literal`].
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// The `null` literal.
    Null,
    /// `true` or `false`.
    Boolean(bool),
    /// A number literal, decoded to a finite double.
    Number(f64),
    /// A string literal, escape-decoded.
    String(EcoString),
    /// An anonymous singleton: a closure or an object literal.
    Singleton(Box<Singleton>),
}

// ============================================================================
// Problems
// ============================================================================

/// A recoverable parse problem: a malformed source region skipped by a
/// recoverable container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// The diagnostic code.
    pub code: ProblemCode,
    /// The malformed region.
    pub source: Source,
}

/// Coarse diagnostic codes for recoverable problems. Downstream tooling
/// formats user-facing messages from the code and the source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemCode {
    /// A malformed region at entity position.
    MalformedEntity,
    /// A malformed region at member position.
    MalformedMember,
}

impl std::fmt::Display for ProblemCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedEntity => write!(f, "malformedEntity"),
            Self::MalformedMember => write!(f, "malformedMember"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{Position, Span};

    fn source(start: u32, end: u32) -> Source {
        Source {
            file: "test.wlk".into(),
            start: Position {
                offset: start,
                line: 1,
                column: start + 1,
            },
            end: Position {
                offset: end,
                line: 1,
                column: end + 1,
            },
        }
    }

    #[test]
    fn problem_codes_display() {
        assert_eq!(ProblemCode::MalformedEntity.to_string(), "malformedEntity");
        assert_eq!(ProblemCode::MalformedMember.to_string(), "malformedMember");
    }

    #[test]
    fn entity_names() {
        let class = Entity::Class(Class {
            name: "Bird".into(),
            superclass: None,
            mixins: Vec::new(),
            members: Vec::new(),
            problems: Vec::new(),
            source: source(0, 12),
        });
        assert_eq!(class.name(), Some("Bird"));

        let anonymous = Entity::Singleton(Singleton {
            name: None,
            superclass: None,
            supercall_args: Vec::new(),
            mixins: Vec::new(),
            members: Vec::new(),
            problems: Vec::new(),
            closure_code: None,
            source: source(0, 9),
        });
        assert_eq!(anonymous.name(), None);
    }

    #[test]
    fn closure_accessors() {
        let body = Body {
            sentences: Vec::new(),
            source: source(0, 2),
        };
        let closure = Singleton {
            name: None,
            superclass: None,
            supercall_args: Vec::new(),
            mixins: Vec::new(),
            members: vec![Member::Method(Method {
                is_override: false,
                name: CLOSURE_METHOD.into(),
                parameters: vec![Parameter {
                    name: "x".into(),
                    is_var_arg: false,
                    source: source(1, 2),
                }],
                body: MethodBody::Block(body),
                source: source(0, 2),
            })],
            problems: Vec::new(),
            closure_code: Some("{}".into()),
            source: source(0, 2),
        };
        assert!(closure.is_closure());
        assert_eq!(closure.closure_parameters().unwrap().len(), 1);
        assert!(closure.closure_sentences().unwrap().is_empty());

        let plain = Singleton {
            closure_code: None,
            ..closure
        };
        assert!(!plain.is_closure());
        assert_eq!(plain.closure_parameters(), None);
    }

    #[test]
    fn expression_source_accessor() {
        let literal = Expression::Literal(Literal {
            value: LiteralValue::Number(1.0),
            source: source(3, 4),
        });
        assert_eq!(literal.source().span(), Span::new(3, 4));
    }
}
