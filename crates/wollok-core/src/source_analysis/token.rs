// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types and operator tables for Wollok lexical analysis.
//!
//! A [`Token`] pairs a [`TokenKind`] with its [`Span`] and the
//! [`Trivia`] (whitespace, comments) collected around it. The static
//! operator tables at the top of the module drive both the lexer's
//! longest-match alternation and the parser's precedence climbing, so the
//! two layers cannot drift apart.
//!
//! Keywords are **not** distinguished at this level: `class`, `var`, `if`
//! and friends all lex as [`TokenKind::Identifier`], and the parser
//! disambiguates by ordered alternation on the identifier text. This keeps
//! the lexer oblivious to grammar context, which Wollok needs because its
//! keywords are not reserved.

use ecow::EcoString;

use super::Span;

/// All symbolic operators and operator-like punctuation, sorted by
/// **descending length** so that a first-match scan is a longest-match
/// scan: `===` beats `==` beats `=`, `..<` beats `..` beats `.`.
///
/// Word operators (`or`, `and`, `not`) are absent on purpose; they arrive
/// as identifiers.
pub(crate) const SYMBOLS: &[&str] = &[
    "||=", "&&=", "===", "!==", ">>>", "<<<", "<=>", "..<", ">..", "...", "||", "&&", "==", "!=",
    ">=", "<=", "=>", "?:", ">>", "<<", "<>", "..", "->", "**", "+=", "-=", "*=", "/=", "%=", "=",
    ">", "<", "+", "-", "*", "/", "%", "!", ".",
];

/// Prefix operators, tried in this order before a send chain.
pub const PREFIX_OPERATORS: &[&str] = &["not", "!", "-", "+"];

/// Infix operators by precedence level, lowest binding first. Every level
/// is left-associative; an operand at level `k` is parsed at level `k + 1`,
/// and the operand of the highest level is a prefix chain.
pub const INFIX_LEVELS: &[&[&str]] = &[
    &["||", "or"],
    &["&&", "and"],
    &["===", "==", "!==", "!="],
    &[">=", ">", "<=", "<"],
    &["?:", ">>>", ">>", ">..", "<>", "<=>", "<<<", "<<", "..<", "..", "->"],
    &["-", "+"],
    &["/", "*"],
    &["**", "%"],
];

/// Assignment operators. `=` assigns directly; every other entry `X=`
/// desugars to an assignment of a send of `X` to the target reference.
pub const ASSIGNMENT_OPERATORS: &[&str] = &["=", "||=", "/=", "-=", "+=", "*=", "&&=", "%="];

/// Operators whose right-hand side must be deferred: the parser wraps the
/// RHS in a zero-parameter closure so the receiver can short-circuit.
pub const LAZY_OPERATORS: &[&str] = &["||", "&&", "or", "and"];

/// The message a prefix operator translates to, or `None` for a token that
/// is not a prefix operator.
#[must_use]
pub fn prefix_message(op: &str) -> Option<&'static str> {
    match op {
        "!" | "not" => Some("negate"),
        "-" => Some("invert"),
        "+" => Some("plus"),
        _ => None,
    }
}

/// Returns true if `op` names an operator a method may be declared with
/// (the union of the prefix and infix tables).
#[must_use]
pub fn is_operator_method_name(op: &str) -> bool {
    PREFIX_OPERATORS.contains(&op) || INFIX_LEVELS.iter().any(|level| level.contains(&op))
}

/// The kind of token, not including source location or trivia.
///
/// Tokens are designed to be cheap to clone (using [`EcoString`] for
/// string data).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// An identifier or (unreserved) keyword: `foo`, `class`, `var`
    Identifier(EcoString),

    /// A number literal: `42`, `3.14`, `-7` (raw text, sign included)
    Number(EcoString),

    /// A string literal: `"hello"` or `'hello'`, stored **decoded**
    /// (escape sequences resolved, quotes stripped)
    String(EcoString),

    /// A symbolic operator from [`SYMBOLS`]: `+`, `===`, `||=`, `..<`, …
    Operator(EcoString),

    // === Delimiters ===
    /// `(` — opens parameter, argument and condition lists
    LeftParen,

    /// `)`
    RightParen,

    /// `{` — opens bodies and closure literals
    LeftBrace,

    /// `}`
    RightBrace,

    /// `[` — opens a list literal
    LeftBracket,

    /// `]`
    RightBracket,

    /// `#{` — opens a set literal
    SetOpen,

    // === Punctuation ===
    /// Argument and element separator: `,`
    Comma,

    /// Sentence separator: `;`
    Semicolon,

    /// Message send dot: `.`
    Dot,

    /// Catch parameter type annotation: `:`
    Colon,

    /// Closure parameter arrow: `=>`
    FatArrow,

    /// Vararg marker on a parameter: `...`
    Ellipsis,

    // === Special ===
    /// End of file
    Eof,

    /// Invalid/error token (preserves unlexable text for error recovery)
    Error(EcoString),
}

impl TokenKind {
    /// Whether this token is a scalar literal (number or string).
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Number(_) | Self::String(_))
    }

    /// Whether this token is an identifier (keywords included).
    #[must_use]
    pub const fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }

    /// Whether this is the end-of-file marker.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Whether this token records unlexable input.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The string payload, for the kinds that carry one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Identifier(s)
            | Self::Number(s)
            | Self::String(s)
            | Self::Operator(s)
            | Self::Error(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(s) | Self::Number(s) | Self::Operator(s) => write!(f, "{s}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Error(s) => write!(f, "<invalid {s:?}>"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::SetOpen => write!(f, "#{{"),
            Self::Comma => write!(f, ","),
            Self::Semicolon => write!(f, ";"),
            Self::Dot => write!(f, "."),
            Self::Colon => write!(f, ":"),
            Self::FatArrow => write!(f, "=>"),
            Self::Ellipsis => write!(f, "..."),
            Self::Eof => write!(f, "<eof>"),
        }
    }
}

/// Non-semantic content: whitespace and comments.
///
/// Wollok separates sentences and members by whitespace alone, so trivia
/// never changes what the parser sees; it rides along on tokens for the
/// benefit of tooling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trivia {
    /// Spaces, tabs and newlines.
    Whitespace(EcoString),

    /// A `// …` comment, through the end of its line.
    LineComment(EcoString),

    /// A `/* … */` comment.
    BlockComment(EcoString),
}

impl Trivia {
    /// The raw text of this trivia, delimiters included.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Whitespace(s) | Self::LineComment(s) | Self::BlockComment(s) => s,
        }
    }

    /// Whether this trivia is plain whitespace.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace(_))
    }

    /// Whether this trivia is a line or block comment.
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::LineComment(_) | Self::BlockComment(_))
    }
}

/// One lexical token: a [`TokenKind`] plus where it came from, together
/// with the whitespace and comments around it.
///
/// The span covers the token text only; trivia keeps its own text but is
/// owned by the token it neighbors (leading: everything since the previous
/// token, trailing: same-line whitespace and comment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    span: Span,
    kind: TokenKind,
    leading: Vec<Trivia>,
    trailing: Vec<Trivia>,
}

impl Token {
    /// Builds a bare token with no surrounding trivia.
    #[must_use]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self::with_trivia(kind, span, Vec::new(), Vec::new())
    }

    /// Builds a token carrying its surrounding trivia.
    #[must_use]
    pub fn with_trivia(
        kind: TokenKind,
        span: Span,
        leading: Vec<Trivia>,
        trailing: Vec<Trivia>,
    ) -> Self {
        Self {
            span,
            kind,
            leading,
            trailing,
        }
    }

    /// The token's kind.
    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// The token's byte span in the input (trivia excluded).
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Whitespace and comments between the previous token and this one.
    #[must_use]
    pub fn leading_trivia(&self) -> &[Trivia] {
        &self.leading
    }

    /// Whitespace and comments trailing this token on the same line.
    #[must_use]
    pub fn trailing_trivia(&self) -> &[Trivia] {
        &self.trailing
    }
}
