//! Lexer for fortune templates
//!
//! Turns raw template text into an ordered sequence of [Token]s. Four syntactic
//! forms are recognised by their delimiters:
//!
//!     {{ expr }}       sanitized tag, escaped on output
//!     {{{ expr }}}     unsanitized tag, emitted raw
//!     @name(args)      directive, arguments optional
//!     {# text #}       comment, dropped from output
//!
//! Everything else accumulates as literal text. `@@` produces a literal `@`, and a
//! backslash before `{{`, `{{{` or `{#` makes the delimiter literal.
//!
//! Delimiters do not nest at this level. Pairing `@if` with `@endif` is the
//! parser's job; the lexer only knows that `@endif` is a directive name.

pub mod error;
pub mod lexer_impl;
pub mod tokens;

pub use error::LexError;
pub use lexer_impl::{lex, TemplateLexer};
pub use tokens::{ScanToken, Token, TokenKind};
