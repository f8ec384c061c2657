//! Error types for parsing

use crate::fortune::ast::Position;
use crate::fortune::lexer::TokenKind;
use std::fmt;

/// Errors that can occur while building the AST from tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A block directive still open when the input ended
    UnmatchedDirective {
        name: String,
        opened_at: Position,
        position: Position,
    },
    /// A closer (`@endif`) with no open block
    UnexpectedClose { name: String, position: Position },
    /// A closer that does not match the innermost open block
    MismatchedClose {
        expected: String,
        found: String,
        position: Position,
    },
    /// A continuation (`@else`) outside a block that accepts it
    UnexpectedContinuation { name: String, position: Position },
    /// A closer written with an argument list
    UnexpectedArguments { name: String, position: Position },
    /// The token stream broke the lexer's shape
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        position: Position,
    },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnmatchedDirective { position, .. }
            | ParseError::UnexpectedClose { position, .. }
            | ParseError::MismatchedClose { position, .. }
            | ParseError::UnexpectedContinuation { position, .. }
            | ParseError::UnexpectedArguments { position, .. }
            | ParseError::UnexpectedToken { position, .. } => *position,
        }
    }

    /// Name of the offending construct
    pub fn construct(&self) -> String {
        match self {
            ParseError::UnmatchedDirective { name, .. }
            | ParseError::UnexpectedClose { name, .. }
            | ParseError::UnexpectedContinuation { name, .. }
            | ParseError::UnexpectedArguments { name, .. } => name.clone(),
            ParseError::MismatchedClose { found, .. } => found.clone(),
            ParseError::UnexpectedToken { found, .. } => found.label().to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnmatchedDirective {
                name,
                opened_at,
                position,
            } => write!(
                f,
                "Unmatched directive '@{}' opened at {}: reached {} without '@end{}'",
                name,
                opened_at.human(),
                position.human(),
                name
            ),
            ParseError::UnexpectedClose { name, position } => write!(
                f,
                "Unexpected close '@{}' at {}: no directive is open",
                name,
                position.human()
            ),
            ParseError::MismatchedClose {
                expected,
                found,
                position,
            } => write!(
                f,
                "Mismatched close '@{}' at {}: expected '@{}'",
                found,
                position.human(),
                expected
            ),
            ParseError::UnexpectedContinuation { name, position } => write!(
                f,
                "Unexpected '@{}' at {}: not inside a directive that accepts it",
                name,
                position.human()
            ),
            ParseError::UnexpectedArguments { name, position } => write!(
                f,
                "Unexpected arguments for '@{}' at {}",
                name,
                position.human()
            ),
            ParseError::UnexpectedToken {
                expected,
                found,
                position,
            } => write!(
                f,
                "Unexpected token {} at {}: expected {}",
                found,
                position.human(),
                expected
            ),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_display() {
        let err = ParseError::UnmatchedDirective {
            name: "if".to_string(),
            opened_at: Position::new(0, 0),
            position: Position::new(0, 15),
        };
        assert_eq!(
            err.to_string(),
            "Unmatched directive '@if' opened at line 1, column 1: reached line 1, column 16 without '@endif'"
        );
        assert_eq!(err.construct(), "if");
        assert_eq!(err.position(), Position::new(0, 15));
    }

    #[test]
    fn test_mismatched_display() {
        let err = ParseError::MismatchedClose {
            expected: "endforeach".to_string(),
            found: "endif".to_string(),
            position: Position::new(2, 0),
        };
        assert_eq!(
            err.to_string(),
            "Mismatched close '@endif' at line 3, column 1: expected '@endforeach'"
        );
        assert_eq!(err.construct(), "endif");
    }
}
