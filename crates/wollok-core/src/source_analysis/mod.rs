// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The Wollok source-analysis front end: lexer, parser, and everything
//! they need to annotate the AST with provenance. The node types
//! themselves live in [`crate::ast`].
//!
//! The pipeline is two stages. The [`Lexer`] turns text into [`Token`]s —
//! spans, trivia and all — without ever failing (bad input becomes
//! [`TokenKind::Error`] tokens). [`parse_file`] then builds a
//! [`Package`](crate::ast::Package) of raw, unlinked nodes from one file's
//! tokens; syntax errors inside recoverable containers are skipped past
//! and recorded as [`Problem`](crate::ast::Problem) nodes rather than
//! aborting the parse. [`collect_errors`] turns those problems into
//! [`SyntaxError`]s for miette-based reporting.
//!
//! ```
//! use wollok_core::source_analysis::parse_file;
//!
//! let package = parse_file("pepita.wlk", "object pepita { var energy = 100 }");
//! assert_eq!(package.name, "pepita");
//! assert!(package.problems.is_empty());
//! ```
//!
//! Driving the lexer directly is mostly useful for tests and tooling:
//!
//! ```
//! use wollok_core::source_analysis::{lex, TokenKind};
//!
//! let tokens = lex("energy - 10");
//! assert_eq!(tokens.len(), 3);
//! assert!(matches!(tokens[0].kind(), TokenKind::Identifier(_)));
//! ```

mod error;
mod lexer;
mod parser;
mod span;
pub mod token;


pub use error::{SyntaxError, collect_errors};
pub use lexer::{Lexer, lex, lex_with_eof};
pub use parser::parse_file;
pub use span::{Position, Source, SourceLocator, Span};
pub use token::{Token, TokenKind, Trivia};
