//! Expressions inside tags and directive arguments
//!
//! Templates embed a small expression language: literals, variables, member and
//! index access, arithmetic, comparison and logic. The compiler parses every
//! expression, rejects malformed ones, and writes the canonical form into the
//! compiled output.

pub mod ast;
pub mod parser;

pub use ast::{BinaryOp, Expr, Literal, UnaryOp};
pub use parser::{expression, parse_expression, ExpressionError, RESERVED_WORDS};
