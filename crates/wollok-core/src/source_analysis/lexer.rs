// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Wollok source code.
//!
//! The [`Lexer`] walks the input byte-by-byte (tracking a single cursor
//! offset rather than an iterator) and produces [`Token`]s with precise
//! spans and attached trivia. It is hand-written so that error handling
//! stays under our control:
//!
//! - Nothing the user types can make it panic; unlexable input becomes
//!   [`TokenKind::Error`] tokens and the parser's recovery deals with it.
//! - Whitespace and comments are kept as trivia on the neighboring tokens
//!   rather than dropped, for the benefit of tooling.
//!
//! # Example
//!
//! ```
//! use wollok_core::source_analysis::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("energy - 10").collect();
//! assert_eq!(tokens.len(), 3); // energy, -, 10; the iterator stops before EOF
//! ```

use ecow::EcoString;

use super::token::SYMBOLS;
use super::{Span, Token, TokenKind, Trivia};

/// A lexer that tokenizes Wollok source code.
///
/// Implements [`Iterator`]; the stream ends before the EOF token, which
/// [`lex_with_eof`] adds back for the parser's benefit.
pub struct Lexer<'src> {
    /// The full input text.
    source: &'src str,
    /// Byte offset of the next unread character.
    position: usize,
    /// Trivia collected since the last token, waiting to be attached.
    pending_trivia: Vec<Trivia>,
    /// Whether the previously emitted token can end an expression.
    ///
    /// Controls negative-number lexing: `-` directly followed by a digit is
    /// part of a number literal only at expression-start positions, so
    /// `1-2` stays a subtraction while `x = -2` carries a negative literal.
    after_value: bool,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Lexer(at byte {}, {:?} unread)",
            self.position,
            self.rest()
        )
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer over the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            after_value: false,
            position: 0,
            pending_trivia: Vec::new(),
        }
    }

    /// Buffers trivia for attachment to the next token.
    fn remember(&mut self, trivia: Trivia) {
        self.pending_trivia.push(trivia);
    }

    /// The unread tail of the input.
    fn rest(&self) -> &'src str {
        &self.source[self.position..]
    }

    /// Looks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Looks `n` characters past the cursor (`peek_char_n(0)` is the same
    /// as [`Lexer::peek_char`]).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Consumes and returns the next character.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Consumes characters for as long as `keep` accepts them.
    fn advance_while(&mut self, keep: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !keep(c) {
                break;
            }
            self.position += c.len_utf8();
        }
    }

    /// The cursor as a span endpoint.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "offsets are bounded by the 4 GiB input limit"
    )]
    fn offset(&self) -> u32 {
        self.position as u32
    }

    /// Span from `start` up to the cursor.
    fn span_since(&self, start: u32) -> Span {
        Span::new(start, self.offset())
    }

    /// The input text a span covers.
    fn lexeme(&self, span: Span) -> &'src str {
        &self.source[span.as_range()]
    }

    /// Collects whitespace and comments into the pending-trivia buffer
    /// until something token-worthy comes up.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_ascii_whitespace() => {
                    let start = self.offset();
                    self.advance_while(|c| c.is_ascii_whitespace());
                    let text = self.lexeme(self.span_since(start));
                    self.remember(Trivia::Whitespace(EcoString::from(text)));
                }
                Some('/') if self.peek_char_n(1) == Some('/') => {
                    self.take_line_comment();
                }
                Some('/') if self.peek_char_n(1) == Some('*') => {
                    self.take_block_comment();
                }
                _ => break,
            }
        }
    }

    /// Consumes a `//` comment through the end of its line.
    fn take_line_comment(&mut self) {
        let start = self.offset();
        self.position += 2; // the `//` is ASCII, so a byte bump is safe
        self.advance_while(|c| c != '\n');
        let text = self.lexeme(self.span_since(start));
        self.remember(Trivia::LineComment(EcoString::from(text)));
    }

    /// Consumes a `/* … */` comment. Non-nesting: the first `*/` closes
    /// it. An unclosed comment runs to EOF without complaint.
    fn take_block_comment(&mut self) {
        let start = self.offset();
        self.position += 2; // `/*`

        loop {
            match self.peek_char() {
                None => break,
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.position += 2; // `*/`
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }

        let text = self.lexeme(self.span_since(start));
        self.remember(Trivia::BlockComment(EcoString::from(text)));
    }

    /// Produces the next token, EOF included.
    fn lex_token(&mut self) -> Token {
        self.skip_trivia();
        let leading = std::mem::take(&mut self.pending_trivia);

        let start = self.offset();

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => self.lex_token_kind(c, start),
        };

        let span = self.span_since(start);

        self.after_value = matches!(
            kind,
            TokenKind::Identifier(_)
                | TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
        );

        self.take_trailing_trivia();
        let trailing = std::mem::take(&mut self.pending_trivia);

        Token::with_trivia(kind, span, leading, trailing)
    }

    /// Collects the trivia that trails a token on its own line: spaces,
    /// tabs, and at most one `//` comment.
    fn take_trailing_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ' | '\t') => {
                    let start = self.offset();
                    self.advance_while(|c| matches!(c, ' ' | '\t'));
                    let text = self.lexeme(self.span_since(start));
                    self.remember(Trivia::Whitespace(EcoString::from(text)));
                }
                Some('/') if self.peek_char_n(1) == Some('/') => {
                    self.take_line_comment();
                    break;
                }
                _ => break,
            }
        }
    }

    /// Lexes a token kind based on the first character.
    fn lex_token_kind(&mut self, c: char, start: u32) -> TokenKind {
        match c {
            // Identifiers and (unreserved) keywords
            'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier(),

            // Numbers
            '0'..='9' => self.lex_number(start),

            // Negative number literal, only at expression-start positions
            '-' if !self.after_value && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.advance(); // -
                self.lex_number(start)
            }

            // Strings
            '"' | '\'' => self.lex_string(c, start),

            // Set literal opener, `#{`
            '#' => {
                self.advance();
                if self.peek_char() == Some('{') {
                    self.advance();
                    TokenKind::SetOpen
                } else {
                    let text = self.lexeme(self.span_since(start));
                    TokenKind::Error(EcoString::from(text))
                }
            }

            // Single-character tokens
            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            '{' => self.single(TokenKind::LeftBrace),
            '}' => self.single(TokenKind::RightBrace),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            ':' => self.single(TokenKind::Colon),

            // Symbolic operators, longest match
            '|' | '&' | '=' | '!' | '<' | '>' | '?' | '.' | '+' | '-' | '*' | '/' | '%' => {
                self.lex_symbol(start)
            }

            // Unknown character - error recovery
            _ => {
                self.advance();
                let text = self.lexeme(self.span_since(start));
                TokenKind::Error(EcoString::from(text))
            }
        }
    }

    /// Consumes one character and yields the given kind.
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Lexes an identifier: a non-digit word character followed by word
    /// characters.
    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.offset();
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text = self.lexeme(self.span_since(start));
        TokenKind::Identifier(EcoString::from(text))
    }

    /// Lexes a number literal: digits with an optional fractional part.
    ///
    /// The dot is consumed only when a digit follows, so `1..10` and
    /// `1.even()` keep their dots for the parser.
    fn lex_number(&mut self, start: u32) -> TokenKind {
        self.advance_while(|c| c.is_ascii_digit());

        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance(); // .
            self.advance_while(|c| c.is_ascii_digit());
        }

        let text = self.lexeme(self.span_since(start));
        TokenKind::Number(EcoString::from(text))
    }

    /// Lexes a string literal delimited by `quote`, decoding escapes.
    ///
    /// Permitted content: any character except the delimiter and backslash,
    /// the single-character escapes `\b \f \n \r \t \v \" \' \\ \/`, and
    /// `\uXXXX`. Unterminated strings and invalid escapes produce
    /// [`TokenKind::Error`] holding the raw text consumed so far.
    fn lex_string(&mut self, quote: char, start: u32) -> TokenKind {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None => {
                    let text = self.lexeme(self.span_since(start));
                    return TokenKind::Error(EcoString::from(text));
                }
                Some(c) if c == quote => {
                    self.advance();
                    return TokenKind::String(EcoString::from(value));
                }
                Some('\\') => {
                    self.advance(); // backslash
                    match self.decode_escape() {
                        Some(decoded) => value.push(decoded),
                        None => {
                            let text = self.lexeme(self.span_since(start));
                            return TokenKind::Error(EcoString::from(text));
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Decodes the escape sequence following a consumed backslash.
    fn decode_escape(&mut self) -> Option<char> {
        let c = self.advance()?;
        match c {
            'b' => Some('\u{0008}'),
            'f' => Some('\u{000C}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{000B}'),
            '"' => Some('"'),
            '\'' => Some('\''),
            '\\' => Some('\\'),
            '/' => Some('/'),
            'u' => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = self.peek_char()?.to_digit(16)?;
                    self.advance();
                    code = code * 16 + digit;
                }
                char::from_u32(code)
            }
            _ => None,
        }
    }

    /// Lexes a symbolic operator by longest match over [`SYMBOLS`].
    fn lex_symbol(&mut self, start: u32) -> TokenKind {
        for sym in SYMBOLS {
            if self.rest().starts_with(sym) {
                self.position += sym.len(); // symbols are pure ASCII
                return match *sym {
                    "." => TokenKind::Dot,
                    "..." => TokenKind::Ellipsis,
                    "=>" => TokenKind::FatArrow,
                    _ => TokenKind::Operator(EcoString::from(*sym)),
                };
            }
        }

        self.advance();
        let text = self.lexeme(self.span_since(start));
        TokenKind::Error(EcoString::from(text))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.lex_token();
        if token.kind().is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

/// Lexes source text into tokens, excluding the final EOF token.
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Lexes source text into tokens, including the final EOF token.
///
/// The parser requires the EOF token so it can always inspect a "current"
/// token.
#[must_use]
pub fn lex_with_eof(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut stream = Vec::new();
    let eof = loop {
        let token = lexer.lex_token();
        if token.kind().is_eof() {
            break token;
        }
        stream.push(token);
    };
    stream.push(eof);
    stream
}
