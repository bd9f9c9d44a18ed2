//! Errors produced by the expression compiler.

use std::fmt;

/// Errors that can occur while compiling an expression.
///
/// All malformed input errors synchronously; there is no best-effort recovery.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// An opening `(` or `[` without a matching closer, a stray closer, or a
    /// mismatched pair. Position is a byte offset into the hidden source.
    UnterminatedGroup { position: usize },
    /// A binary operator with an empty operand, e.g. a trailing `+`.
    DanglingOperator { operator: String },
    /// An empty expression or empty group in value position.
    Empty,
    /// Leftover text that is neither an identifier, a literal, nor a group.
    InvalidAtom { text: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnterminatedGroup { position } => {
                write!(f, "unterminated group at offset {}", position)
            }
            ParseError::DanglingOperator { operator } => {
                write!(f, "dangling operator `{}`", operator)
            }
            ParseError::Empty => write!(f, "empty expression"),
            ParseError::InvalidAtom { text } => write!(f, "invalid expression atom `{}`", text),
        }
    }
}

impl std::error::Error for ParseError {}
