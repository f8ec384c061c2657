//! Error types for compilation

use crate::fortune::ast::Position;
use crate::fortune::lexer::LexError;
use crate::fortune::parser::ParseError;
use std::fmt;

/// Errors raised while turning an AST into compiled output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// No transformer is registered under the directive's name
    UnknownDirective { name: String, position: Position },
    /// A tag or directive argument is not a valid expression
    InvalidExpression {
        expression: String,
        message: String,
        position: Position,
    },
    /// A directive's arguments do not have the shape it requires
    InvalidArguments {
        directive: String,
        message: String,
        position: Position,
    },
}

impl CompileError {
    pub fn position(&self) -> Position {
        match self {
            CompileError::UnknownDirective { position, .. }
            | CompileError::InvalidExpression { position, .. }
            | CompileError::InvalidArguments { position, .. } => *position,
        }
    }

    pub fn invalid_arguments(
        directive: impl Into<String>,
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        CompileError::InvalidArguments {
            directive: directive.into(),
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownDirective { name, position } => write!(
                f,
                "Unknown directive '@{}' at {}",
                name,
                position.human()
            ),
            CompileError::InvalidExpression {
                expression,
                message,
                position,
            } => write!(
                f,
                "Invalid expression '{}' at {}: {}",
                expression,
                position.human(),
                message
            ),
            CompileError::InvalidArguments {
                directive,
                message,
                position,
            } => write!(
                f,
                "Invalid arguments for '@{}' at {}: {}",
                directive,
                position.human(),
                message
            ),
        }
    }
}

impl std::error::Error for CompileError {}

/// Errors from registering a directive transformer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Not usable as a directive name in template syntax
    InvalidName(String),
    /// Names of the form `end<name>` close blocks
    ReservedName(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidName(name) => {
                write!(f, "'{}' is not a valid directive name", name)
            }
            RegistryError::ReservedName(name) => write!(
                f,
                "'{}' is reserved: names starting with 'end' close blocks",
                name
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Any failure of the one-call template pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    Lex(LexError),
    Parse(ParseError),
    Compile(CompileError),
}

impl TemplateError {
    pub fn position(&self) -> Position {
        match self {
            TemplateError::Lex(e) => e.position(),
            TemplateError::Parse(e) => e.position(),
            TemplateError::Compile(e) => e.position(),
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Lex(e) => write!(f, "Lexing failed: {}", e),
            TemplateError::Parse(e) => write!(f, "Parsing failed: {}", e),
            TemplateError::Compile(e) => write!(f, "Compilation failed: {}", e),
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Lex(e) => Some(e),
            TemplateError::Parse(e) => Some(e),
            TemplateError::Compile(e) => Some(e),
        }
    }
}

impl From<LexError> for TemplateError {
    fn from(err: LexError) -> Self {
        TemplateError::Lex(err)
    }
}

impl From<ParseError> for TemplateError {
    fn from(err: ParseError) -> Self {
        TemplateError::Parse(err)
    }
}

impl From<CompileError> for TemplateError {
    fn from(err: CompileError) -> Self {
        TemplateError::Compile(err)
    }
}
