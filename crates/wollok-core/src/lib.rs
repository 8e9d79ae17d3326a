// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Wollok parser core.
//!
//! This crate contains the source-analysis front end for the Wollok
//! language:
//! - Lexical analysis (tokenization with trivia and error recovery)
//! - Parsing (construction of the raw, unlinked AST)
//!
//! The parser is a pure function over `(file name, source text)`: it keeps
//! no state between invocations and performs no I/O. Later stages (linking,
//! validation, interpretation) live in other crates and consume the
//! [`ast::Package`] produced here.

pub mod ast;
pub mod source_analysis;
