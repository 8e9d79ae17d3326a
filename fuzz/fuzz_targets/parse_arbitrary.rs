// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Crash-safety fuzzing for `parse_file`.
//!
//! Hands the parser arbitrary byte salad and requires a [`Package`] back
//! for every input: malformed regions must surface as `Problem` nodes on
//! their containers, never as panics. Bytes that aren't valid UTF-8 are
//! decoded lossily, so they reach the lexer as U+FFFD replacement
//! characters instead of being dropped — unusual-codepoint paths get
//! exercised too.
//!
//! The target fails only if parsing aborts the process; diagnostics are
//! expected, not counted.
//!
//! [`Package`]: wollok_core::ast::Package

#![no_main]

use libfuzzer_sys::fuzz_target;
use wollok_core::source_analysis::parse_file;

fuzz_target!(|data: &[u8]| {
    let source = String::from_utf8_lossy(data);
    let package = parse_file("fuzz.wlk", &source);

    // Touch the result so the tree is actually materialized.
    let _ = package.members.len() + package.problems.len();
});
