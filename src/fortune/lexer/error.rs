//! Error types for lexing

use crate::fortune::ast::Position;
use std::fmt;

/// Errors that can occur while tokenizing a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A `{{` or `{{{` tag without its closing delimiter
    UnterminatedTag {
        open: &'static str,
        close: &'static str,
        position: Position,
    },
    /// A `{#` comment without `#}`
    UnterminatedComment { position: Position },
    /// A directive argument list whose parentheses never balance
    UnterminatedArguments { directive: String, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnterminatedTag { position, .. }
            | LexError::UnterminatedComment { position }
            | LexError::UnterminatedArguments { position, .. } => *position,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnterminatedTag {
                open,
                close,
                position,
            } => write!(
                f,
                "Unterminated tag '{}' at {}: expected '{}'",
                open,
                position.human(),
                close
            ),
            LexError::UnterminatedComment { position } => {
                write!(f, "Unterminated comment at {}: expected '#}}'", position.human())
            }
            LexError::UnterminatedArguments {
                directive,
                position,
            } => write!(
                f,
                "Unterminated arguments for directive '@{}' at {}: expected ')'",
                directive,
                position.human()
            ),
        }
    }
}

impl std::error::Error for LexError {}
