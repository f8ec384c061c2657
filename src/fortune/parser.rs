//! Parser for fortune templates
//!
//! Builds an [Ast](crate::fortune::ast::Ast) from the lexer's tokens. Directive
//! nesting is validated here: every block directive must be closed by its
//! `@end<name>` at the same depth, and continuations such as `@else` must sit
//! inside a block that accepts them.

pub mod error;
pub mod parser_impl;
pub mod syntax;

pub use error::ParseError;
pub use parser_impl::{parse, parse_with_syntax};
pub use syntax::{closer_target, DirectiveSyntax};
