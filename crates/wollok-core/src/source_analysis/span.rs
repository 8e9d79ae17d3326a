// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Byte-accurate source locations for Wollok nodes.
//!
//! Tokens carry a compact [`Span`] (a pair of byte offsets). When the
//! parser builds an AST node it widens that span into a [`Source`] — the
//! origin file name plus resolved line/column [`Position`]s — through a
//! [`SourceLocator`] built once per input.

use std::ops::Range;

use ecow::EcoString;

/// A half-open byte range `[start, end)` into one source text.
///
/// `Span` is deliberately tiny (two `u32`s, `Copy`): every token carries
/// one, and the parser merges them constantly while folding nodes. The
/// richer [`Source`] form is reserved for the AST.
///
/// # Examples
///
/// ```
/// use wollok_core::source_analysis::Span;
///
/// // In `object pepita { }`, the name sits at bytes 7..13.
/// let name = Span::new(7, 13);
/// assert_eq!(name.len(), 6);
/// assert!(!name.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    /// Builds a span from a start (inclusive) and end (exclusive) offset.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Start offset, inclusive.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// End offset, exclusive.
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    /// Number of bytes covered.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Whether the span covers no bytes at all.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies entirely inside `self` (boundaries included).
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The smallest span covering both `self` and `other`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The span as a `Range<usize>`, ready for slicing source text.
    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<Range<u32>> for Span {
    fn from(Range { start, end }: Range<u32>) -> Self {
        Self { start, end }
    }
}

impl From<Range<usize>> for Span {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "offsets are bounded by the 4 GiB input limit"
    )]
    fn from(range: Range<usize>) -> Self {
        Self {
            start: range.start as u32,
            end: range.end as u32,
        }
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.as_range()
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new((span.start as usize).into(), span.len() as usize)
    }
}

/// A resolved position within a source file.
///
/// `offset` counts **bytes** from the start of the input (0-based). `line`
/// is 1-based. `column` is 1-based and counts **characters** within the
/// line, so multi-byte UTF-8 sequences advance it by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Byte offset from the start of the input.
    pub offset: u32,
    /// 1-based line number.
    pub line: u32,
    /// 1-based character column within the line.
    pub column: u32,
}

/// The provenance of an AST node: a start/end position pair plus the name
/// of the file the node was parsed from.
///
/// Every node of the raw AST carries one of these. The file name is an
/// [`EcoString`], so the per-node clone is a cheap reference-count bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    /// The origin file name, as handed to the parser.
    pub file: EcoString,
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Source {
    /// Returns the byte-offset span of this source region.
    #[must_use]
    pub const fn span(&self) -> Span {
        Span::new(self.start.offset, self.end.offset)
    }

    /// Returns true if `other` is fully contained within `self`.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.span().contains(other.span())
    }
}

/// Maps byte offsets to line/column positions for one source text.
///
/// Line starts are collected once up front; each lookup is a binary search
/// plus a character count over the containing line.
#[derive(Debug)]
pub struct SourceLocator<'src> {
    source: &'src str,
    line_starts: Vec<u32>,
}

impl<'src> SourceLocator<'src> {
    /// Builds the line index for the given source text.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "offsets are bounded by the 4 GiB input limit"
    )]
    pub fn new(source: &'src str) -> Self {
        let mut line_starts = vec![0u32];
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx as u32 + 1);
            }
        }
        Self {
            source,
            line_starts,
        }
    }

    /// Resolves a byte offset to a full [`Position`].
    ///
    /// The offset must lie on a character boundary of the source text; the
    /// lexer only ever produces such offsets.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "offsets are bounded by the 4 GiB input limit"
    )]
    pub fn position(&self, offset: u32) -> Position {
        let line_idx = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line_idx] as usize;
        let column = self
            .source
            .get(line_start..offset as usize)
            .map_or(0, |text| text.chars().count()) as u32;
        Position {
            offset,
            line: line_idx as u32 + 1,
            column: column + 1,
        }
    }

    /// Resolves a byte span to a [`Source`] region for the given file.
    #[must_use]
    pub fn source(&self, file: &EcoString, span: Span) -> Source {
        Source {
            file: file.clone(),
            start: self.position(span.start()),
            end: self.position(span.end()),
        }
    }
}
