//! Mustache scanning.
//!
//! Lexes raw text or attribute-value strings into alternating literal and
//! placeholder-expression tokens. `{{` opens a placeholder unless it is
//! backslash-escaped (the backslash is dropped and the braces become literal
//! text) or a placeholder is already open (no nesting); `}}` closes under the
//! same escaping rule. Placeholder text is trimmed of surrounding whitespace.
//! An unterminated placeholder is not an error: it degrades to literal text.
//!
//! The scanner layers a small state machine over logos core tokens, and is
//! lazy, finite, and restartable: scanning the same string twice yields the
//! same sequence.

use logos::Logos;
use serde::{Deserialize, Serialize};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    #[token("\\{{")]
    EscapedOpen,
    #[token("\\}}")]
    EscapedClose,
    #[token("{{")]
    Open,
    #[token("}}")]
    Close,
    #[regex(r"[^\\{}]+")]
    Chunk,
    #[regex(r"[\\{}]")]
    Stray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Literal,
    Part,
}

/// One scanned token with byte offsets into the source. Literal token text
/// can differ from the source slice when escapes were dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Whether a string contains a binding point worth scanning.
pub fn has_mustache(text: &str) -> bool {
    text.contains("{{")
}

/// Scan a string into literal and part tokens.
pub fn scan(source: &str) -> ScanTokens<'_> {
    ScanTokens {
        source,
        lexer: RawToken::lexer(source),
        literal: String::new(),
        literal_start: 0,
        part: String::new(),
        part_start: 0,
        open: false,
        finished: false,
    }
}

pub struct ScanTokens<'a> {
    source: &'a str,
    lexer: logos::Lexer<'a, RawToken>,
    literal: String,
    literal_start: usize,
    part: String,
    part_start: usize,
    open: bool,
    finished: bool,
}

impl<'a> ScanTokens<'a> {
    fn push_literal(&mut self, start: usize, text: &str) {
        if self.literal.is_empty() {
            self.literal_start = start;
        }
        self.literal.push_str(text);
    }

    fn take_literal(&mut self, end: usize) -> Option<Token> {
        if self.literal.is_empty() {
            return None;
        }
        Some(Token {
            kind: TokenKind::Literal,
            text: std::mem::take(&mut self.literal),
            start: self.literal_start,
            end,
        })
    }
}

impl<'a> Iterator for ScanTokens<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        while let Some(raw) = self.lexer.next() {
            let span = self.lexer.span();
            let slice = &self.source[span.start..span.end];
            if self.open {
                match raw {
                    Ok(RawToken::Close) => {
                        self.open = false;
                        return Some(Token {
                            kind: TokenKind::Part,
                            text: std::mem::take(&mut self.part).trim().to_string(),
                            start: self.part_start,
                            end: span.end,
                        });
                    }
                    Ok(RawToken::EscapedOpen) => self.part.push_str("{{"),
                    Ok(RawToken::EscapedClose) => self.part.push_str("}}"),
                    // No nesting: an inner `{{` is plain expression text.
                    Ok(RawToken::Open) => self.part.push_str("{{"),
                    _ => self.part.push_str(slice),
                }
            } else {
                match raw {
                    Ok(RawToken::Open) => {
                        self.open = true;
                        self.part_start = span.start;
                        self.part.clear();
                        if let Some(token) = self.take_literal(span.start) {
                            return Some(token);
                        }
                    }
                    Ok(RawToken::EscapedOpen) => self.push_literal(span.start, "{{"),
                    Ok(RawToken::EscapedClose) => self.push_literal(span.start, "}}"),
                    Ok(RawToken::Close) => self.push_literal(span.start, "}}"),
                    _ => self.push_literal(span.start, slice),
                }
            }
        }
        self.finished = true;
        if self.open {
            // Unterminated placeholder: flush the raw remainder as a literal.
            self.open = false;
            return Some(Token {
                kind: TokenKind::Literal,
                text: self.source[self.part_start..].to_string(),
                start: self.part_start,
                end: self.source.len(),
            });
        }
        self.take_literal(self.source.len())
    }
}
