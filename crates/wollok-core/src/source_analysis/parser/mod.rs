// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for Wollok source code.
//!
//! This parser builds a raw (unlinked) AST from a stream of tokens. It is
//! designed for tooling use, with error recovery at every container that
//! the grammar allows.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory** - parsing MUST always produce a
//!   [`Package`], even for garbage input
//! - **Ordered alternation** - Wollok keywords are not reserved, so
//!   productions are tried in order with cursor backtracking ([`Parser::attempt`])
//! - **Precise spans** - every node points at its exact source region
//! - **Safeword synchronization** - a failed child parse skips forward to
//!   the next plausible declaration keyword and records the skipped region
//!   as a [`Problem`]
//!
//! # Operator Precedence
//!
//! Infix operators use precedence climbing over the 8-level table in
//! [`INFIX_LEVELS`](crate::source_analysis::token::INFIX_LEVELS); every
//! level is left-associative, and every operator application folds into a
//! [`Send`](crate::ast::Expression::Send), so `1 + 2` and `1.plus(2)` meet
//! in the same canonical shape.
//!
//! # Usage
//!
//! ```
//! use wollok_core::source_analysis::parse_file;
//!
//! let package = parse_file("birds.wlk", "class Bird { var energy = 100 }");
//! assert_eq!(package.name, "birds");
//! assert_eq!(package.members.len(), 1);
//! assert!(package.problems.is_empty());
//! ```

use ecow::EcoString;

use crate::ast::{Entity, Import, Package, Problem, ProblemCode, Reference};
use crate::source_analysis::{Source, SourceLocator, Span, Token, TokenKind, lex_with_eof};

// Grammar layers, each a further impl block on Parser
mod declarations;
mod expressions;


/// Maximum expression nesting depth before the parser gives up on a
/// sub-expression. Keeps pathological inputs (thousands of nested parens)
/// from exhausting the stack; exceeding it fails the enclosing member,
/// which recovery converts into a problem.
const MAX_NESTING_DEPTH: usize = 64;

/// Safewords for resynchronization at entity position.
pub(super) const ENTITY_SAFEWORDS: &[&str] = &[
    "package", "class", "singleton", "mixin", "program", "describe", "test", "var", "const", "}",
];

/// Safewords for member position inside singletons, mixins and describes.
pub(super) const MEMBER_SAFEWORDS: &[&str] =
    &["method", "fixture", "var", "const", "test", "describe", "}"];

/// Safewords for member position inside classes.
pub(super) const CLASS_MEMBER_SAFEWORDS: &[&str] =
    &["method", "constructor", "var", "const", "}"];

/// Parses one file's source text into a [`Package`].
///
/// This is the entry point of the crate. It never fails: malformed regions
/// inside recoverable containers are recorded on the containers' `problems`
/// lists and the rest of the tree is kept. The package's `name` is the
/// file's basename up to its first `.`.
///
/// # Examples
///
/// ```
/// use wollok_core::source_analysis::parse_file;
///
/// let package = parse_file("example/pepita.wlk", "object pepita { }");
/// assert_eq!(package.name, "pepita");
/// ```
#[must_use]
pub fn parse_file(file_name: &str, source_text: &str) -> Package {
    let tokens = lex_with_eof(source_text);
    let mut parser = Parser::new(file_name, source_text, tokens);
    parser.parse_package_file()
}

/// An internal parse failure used for backtracking.
///
/// Not a user-facing diagnostic: failures either cause an alternation to
/// try the next production, or get swallowed by safeword recovery and
/// resurface as [`Problem`] nodes.
#[derive(Debug, Clone, Copy)]
pub(super) struct ParseFailure {
    /// What the failing production expected, for debugging.
    #[allow(dead_code)]
    pub(super) expected: &'static str,
    /// Where it failed.
    #[allow(dead_code)]
    pub(super) span: Span,
}

/// The result of one production.
pub(super) type Parse<T> = Result<T, ParseFailure>;

/// The parser state for one file.
pub(super) struct Parser<'src> {
    /// The raw input, for closure-code capture and quoted-name slicing.
    source: &'src str,
    /// The origin file name, stamped on every node's [`Source`].
    file: EcoString,
    /// The tokens being parsed; `new` guarantees a terminal EOF token.
    tokens: Vec<Token>,
    /// Index of the token under the cursor.
    current: usize,
    /// Offset-to-position index for the input.
    locator: SourceLocator<'src>,
    /// Current expression nesting depth (see [`MAX_NESTING_DEPTH`]).
    nesting_depth: usize,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given tokens.
    ///
    /// The cursor never moves past the last token, and [`Parser::current_token`]
    /// indexes unconditionally; both rely on the stream ending with EOF, so
    /// that token is appended here if the caller's stream lacks one.
    fn new(file_name: &str, source: &'src str, mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|token| token.kind().is_eof()) {
            tokens.push(Token::new(
                TokenKind::Eof,
                Span::from(source.len()..source.len()),
            ));
        }
        Self {
            source,
            file: EcoString::from(file_name),
            tokens,
            current: 0,
            locator: SourceLocator::new(source),
            nesting_depth: 0,
        }
    }

    // ========================================================================
    // Cursor Primitives
    // ========================================================================

    /// The token under the cursor. Always in bounds: the stream ends with
    /// EOF and [`Parser::advance`] refuses to move past it.
    pub(super) fn current_token(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// The kind of the token under the cursor.
    pub(super) fn current_kind(&self) -> &TokenKind {
        self.current_token().kind()
    }

    /// The kind of the token `offset` places past the cursor, if any.
    pub(super) fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.current + offset).map(Token::kind)
    }

    /// Whether the cursor has reached the EOF token.
    pub(super) fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Consumes and returns the token under the cursor. At EOF the cursor
    /// stays put and the EOF token is returned again.
    pub(super) fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !token.kind().is_eof() {
            self.current += 1;
        }
        token
    }

    /// Whether the current token has the given kind (compared by variant;
    /// any payload is ignored). EOF never matches.
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        !self.is_at_end()
            && std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Consumes the current token if it has the given kind.
    pub(super) fn match_token(&mut self, kind: &TokenKind) -> bool {
        let matched = self.check(kind);
        if matched {
            self.advance();
        }
        matched
    }

    /// Expects the current token to match the given kind, advancing if it
    /// does; fails the production otherwise.
    pub(super) fn expect_token(&mut self, kind: &TokenKind, expected: &'static str) -> Parse<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.fail(expected)
        }
    }

    /// Checks whether the current token is the given (unreserved) keyword.
    pub(super) fn check_keyword(&self, keyword: &str) -> bool {
        matches!(self.current_kind(), TokenKind::Identifier(name) if name == keyword)
    }

    /// Consumes the current token if it is the given keyword.
    pub(super) fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the given keyword, advancing past it.
    pub(super) fn expect_keyword(&mut self, keyword: &'static str) -> Parse<Token> {
        if self.check_keyword(keyword) {
            Ok(self.advance())
        } else {
            self.fail(keyword)
        }
    }

    /// Checks whether the current token is the given symbolic operator.
    pub(super) fn check_operator(&self, operator: &str) -> bool {
        matches!(self.current_kind(), TokenKind::Operator(op) if op == operator)
    }

    /// Consumes the current token if it is the given symbolic operator.
    pub(super) fn match_operator(&mut self, operator: &str) -> bool {
        if self.check_operator(operator) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the given symbolic operator, advancing past it.
    pub(super) fn expect_operator(&mut self, operator: &'static str) -> Parse<Token> {
        if self.check_operator(operator) {
            Ok(self.advance())
        } else {
            self.fail(operator)
        }
    }

    /// Parses an identifier, returning its text and span.
    pub(super) fn parse_name(&mut self) -> Parse<(EcoString, Span)> {
        match self.current_kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                Ok((name, self.advance().span()))
            }
            _ => self.fail("a name"),
        }
    }

    /// Fails the current production at the current token.
    pub(super) fn fail<T>(&self, expected: &'static str) -> Parse<T> {
        Err(ParseFailure {
            expected,
            span: self.current_token().span(),
        })
    }

    // ========================================================================
    // Backtracking & Nesting
    // ========================================================================

    /// Runs a production, restoring the cursor on failure.
    ///
    /// This is what makes the grammar's ordered alternation work: a failed
    /// try leaves the token stream exactly where it was.
    pub(super) fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Parse<T>) -> Parse<T> {
        let saved_current = self.current;
        let saved_depth = self.nesting_depth;
        let result = f(self);
        if result.is_err() {
            self.current = saved_current;
            self.nesting_depth = saved_depth;
        }
        result
    }

    /// Enters one level of expression nesting, failing past the limit.
    pub(super) fn enter_nesting(&mut self) -> Parse<()> {
        if self.nesting_depth >= MAX_NESTING_DEPTH {
            return self.fail("shallower nesting");
        }
        self.nesting_depth += 1;
        Ok(())
    }

    /// Leaves one level of expression nesting.
    pub(super) fn leave_nesting(&mut self) {
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
    }

    // ========================================================================
    // Source Attribution
    // ========================================================================

    /// Resolves a byte span to a full [`Source`] for the current file.
    pub(super) fn src(&self, span: Span) -> Source {
        self.locator.source(&self.file, span)
    }

    /// Returns the raw input text covered by a span.
    pub(super) fn raw(&self, span: Span) -> &'src str {
        &self.source[span.as_range()]
    }

    // ========================================================================
    // Error Recovery
    // ========================================================================

    /// Returns true if the current token starts one of the safewords.
    fn at_safeword(&self, safewords: &[&str]) -> bool {
        match self.current_kind() {
            TokenKind::Identifier(name) => safewords.contains(&name.as_str()),
            TokenKind::RightBrace => safewords.contains(&"}"),
            _ => false,
        }
    }

    /// Skips tokens until a safeword is about to match, packaging the
    /// skipped region as a [`Problem`].
    ///
    /// At least one token is always consumed, so a failed alternation that
    /// stopped *on* a safeword still makes progress. Balanced `{ … }`
    /// regions are consumed as a unit so a malformed member cannot derail
    /// the enclosing container's brace tracking.
    pub(super) fn recover(&mut self, safewords: &[&str], code: ProblemCode) -> Problem {
        let start = self.current_token().span();
        let mut end = start;

        while !self.is_at_end() {
            end = self.skip_region();
            if self.is_at_end() || self.at_safeword(safewords) {
                break;
            }
        }

        Problem {
            code,
            source: self.src(start.merge(end)),
        }
    }

    /// Consumes one token, or a whole balanced brace region, returning the
    /// span of the last token consumed.
    fn skip_region(&mut self) -> Span {
        if !matches!(
            self.current_kind(),
            TokenKind::LeftBrace | TokenKind::SetOpen
        ) {
            return self.advance().span();
        }

        let mut depth = 0usize;
        let mut last = self.current_token().span();
        while !self.is_at_end() {
            let token = self.advance();
            last = token.span();
            match token.kind() {
                TokenKind::LeftBrace | TokenKind::SetOpen => depth += 1,
                TokenKind::RightBrace => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        last
    }

    // ========================================================================
    // Package Parsing
    // ========================================================================

    /// Parses the whole file as a package.
    fn parse_package_file(&mut self) -> Package {
        let name = module_name(&self.file);
        let (imports, members, problems) = self.parse_package_contents(false);
        let span = Span::from(0..self.source.len());

        Package {
            name,
            imports,
            members,
            problems,
            source: self.src(span),
        }
    }

    /// Parses imports followed by entities, recovering at entity position.
    ///
    /// `nested` controls whether a `}` terminates the member list (nested
    /// `package N { … }`) or only EOF does (file level).
    pub(super) fn parse_package_contents(
        &mut self,
        nested: bool,
    ) -> (Vec<Import>, Vec<Entity>, Vec<Problem>) {
        let mut imports = Vec::new();
        let mut members = Vec::new();
        let mut problems = Vec::new();

        while self.check_keyword("import") {
            match self.attempt(Self::parse_import) {
                Ok(import) => imports.push(import),
                Err(_) => {
                    problems.push(self.recover(ENTITY_SAFEWORDS, ProblemCode::MalformedEntity));
                }
            }
        }

        loop {
            if self.is_at_end() || (nested && self.check(&TokenKind::RightBrace)) {
                break;
            }
            match self.attempt(Self::parse_entity) {
                Ok(entity) => members.push(entity),
                Err(_) => {
                    problems.push(self.recover(ENTITY_SAFEWORDS, ProblemCode::MalformedEntity));
                }
            }
        }

        (imports, members, problems)
    }

    /// Parses an `import a.b.c` or `import a.b.*` clause.
    fn parse_import(&mut self) -> Parse<Import> {
        let start = self.expect_keyword("import")?.span();
        let entity = self.parse_fq_reference()?;
        let mut end = entity.source.span();

        let mut is_generic = false;
        if self.check(&TokenKind::Dot)
            && matches!(self.peek_at(1), Some(TokenKind::Operator(op)) if op == "*")
        {
            self.advance(); // .
            end = self.advance().span(); // *
            is_generic = true;
        }

        Ok(Import {
            entity,
            is_generic,
            source: self.src(start.merge(end)),
        })
    }

    /// Parses a fully-qualified reference: a dot-joined identifier path,
    /// stored as a single dotted name.
    pub(super) fn parse_fq_reference(&mut self) -> Parse<Reference> {
        let (first, first_span) = self.parse_name()?;
        let mut name = String::from(first.as_str());
        let mut span = first_span;

        while self.check(&TokenKind::Dot)
            && matches!(self.peek_at(1), Some(TokenKind::Identifier(_)))
        {
            self.advance(); // .
            let (part, part_span) = self.parse_name()?;
            name.push('.');
            name.push_str(&part);
            span = span.merge(part_span);
        }

        Ok(Reference {
            name: name.into(),
            source: self.src(span),
        })
    }

    /// Parses a reference in expression position: a single identifier.
    pub(super) fn parse_reference(&mut self) -> Parse<Reference> {
        let (name, span) = self.parse_name()?;
        Ok(Reference {
            name,
            source: self.src(span),
        })
    }
}

/// Derives a package name from a file name: the basename up to its first
/// extension component.
fn module_name(file_name: &str) -> EcoString {
    let basename = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let name = basename.split('.').next().unwrap_or(basename);
    EcoString::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Member;
    use crate::source_analysis::collect_errors;

    /// Helper to parse a file expecting no problems anywhere in the tree.
    pub(super) fn parse_ok(source: &str) -> Package {
        let package = parse_file("test.wlk", source);
        let errors = collect_errors(&package);
        assert!(errors.is_empty(), "Expected no problems, got: {errors:?}");
        package
    }

    #[test]
    fn package_name_strips_directory_and_extension() {
        assert_eq!(module_name("birds.wlk"), "birds");
        assert_eq!(module_name("src/example/birds.wlk"), "birds");
        assert_eq!(module_name("src\\birds.wlk"), "birds");
        assert_eq!(module_name("birds.test.wlk"), "birds");
    }

    #[test]
    fn empty_file_parses_to_empty_package() {
        let package = parse_ok("");
        assert!(package.imports.is_empty());
        assert!(package.members.is_empty());
        assert!(package.problems.is_empty());
    }

    #[test]
    fn package_spans_whole_file() {
        let source = "object pepita { }";
        let package = parse_ok(source);
        assert_eq!(package.source.start.offset, 0);
        assert_eq!(package.source.end.offset, u32::try_from(source.len()).unwrap());
        assert_eq!(package.source.file, "test.wlk");
    }

    #[test]
    fn parse_import() {
        let package = parse_ok("import wollok.game.Position\nobject pepita { }");
        assert_eq!(package.imports.len(), 1);
        assert_eq!(package.imports[0].entity.name, "wollok.game.Position");
        assert!(!package.imports[0].is_generic);
    }

    #[test]
    fn parse_generic_import() {
        let package = parse_ok("import wollok.game.*");
        assert_eq!(package.imports.len(), 1);
        assert_eq!(package.imports[0].entity.name, "wollok.game");
        assert!(package.imports[0].is_generic);
    }

    #[test]
    fn parse_nested_package() {
        let package = parse_ok("package aves { object pepita { } }");
        assert_eq!(package.members.len(), 1);
        match &package.members[0] {
            Entity::Package(nested) => {
                assert_eq!(nested.name, "aves");
                assert_eq!(nested.members.len(), 1);
            }
            other => panic!("Expected nested package, got {other:?}"),
        }
    }

    #[test]
    fn recovery_at_entity_level_preserves_siblings() {
        let source = "class A {} @bogus class B {}";
        let package = parse_file("test.wlk", source);

        assert_eq!(package.members.len(), 2);
        assert_eq!(package.members[0].name(), Some("A"));
        assert_eq!(package.members[1].name(), Some("B"));

        assert_eq!(package.problems.len(), 1);
        let problem = &package.problems[0];
        assert_eq!(problem.code, ProblemCode::MalformedEntity);
        let span = problem.source.span();
        assert_eq!(&source[span.as_range()], "@bogus");
    }

    #[test]
    fn recovery_at_member_level_preserves_siblings() {
        let source = "class C { method ok(){} garbage method ok2(){} }";
        let package = parse_file("test.wlk", source);

        assert_eq!(package.members.len(), 1);
        let Entity::Class(class) = &package.members[0] else {
            panic!("Expected class");
        };
        let method_names: Vec<_> = class
            .members
            .iter()
            .map(|member| match member {
                Member::Method(method) => method.name.as_str(),
                other => panic!("Expected method, got {other:?}"),
            })
            .collect();
        assert_eq!(method_names, vec!["ok", "ok2"]);

        assert_eq!(class.problems.len(), 1);
        assert_eq!(class.problems[0].code, ProblemCode::MalformedMember);
        let span = class.problems[0].source.span();
        assert_eq!(&source[span.as_range()], "garbage");
    }

    #[test]
    fn recovery_consumes_balanced_braces_as_a_unit() {
        // The malformed member drags a braced region with it; the skipper
        // must not leave the class's own closing brace unbalanced.
        let source = "class C { wat { var x } method ok(){} }";
        let package = parse_file("test.wlk", source);

        let Entity::Class(class) = &package.members[0] else {
            panic!("Expected class");
        };
        assert_eq!(class.members.len(), 1);
        assert_eq!(class.problems.len(), 1);
        let span = class.problems[0].source.span();
        assert_eq!(&source[span.as_range()], "wat { var x }");
    }

    #[test]
    fn recovery_consumes_at_least_one_token() {
        // `var 1` fails the variable production while standing on the
        // safeword `var`; recovery must still move forward.
        let source = "var 1 class B {}";
        let package = parse_file("test.wlk", source);
        assert_eq!(package.members.len(), 1);
        assert_eq!(package.members[0].name(), Some("B"));
        assert_eq!(package.problems.len(), 1);
    }

    #[test]
    fn unparseable_input_becomes_a_single_problem() {
        let package = parse_file("test.wlk", "???");
        assert!(package.members.is_empty());
        assert_eq!(package.problems.len(), 1);
        assert_eq!(package.problems[0].code, ProblemCode::MalformedEntity);
    }

    #[test]
    fn import_after_entities_is_malformed() {
        let package = parse_file("test.wlk", "class A {} import wollok.game.*");
        assert_eq!(package.members.len(), 1);
        assert_eq!(package.problems.len(), 1);
    }

    #[test]
    fn problem_positions_carry_line_and_column() {
        let source = "class A {}\n@bogus";
        let package = parse_file("test.wlk", source);
        assert_eq!(package.problems.len(), 1);
        let start = package.problems[0].source.start;
        assert_eq!(start.line, 2);
        assert_eq!(start.column, 1);
    }
}
