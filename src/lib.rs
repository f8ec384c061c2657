//! # fortune
//!
//! A compiler for the fortune view template language. Templates mix literal text
//! with `{{ }}` tags, `{{{ }}}` raw tags, `{# #}` comments and `@name(args)`
//! directives; the [compiler](fortune::compiler) turns them into output for an
//! external runtime.
//!
//! ```rust,ignore
//! use fortune::fortune::compiler::Compiler;
//!
//! let compiled = Compiler::default().compile("Hi {{ name }}").unwrap();
//! assert_eq!(compiled, "Hi <%= escape_html(name) %>");
//! ```
//!
//! The [testing module](fortune::testing) has a small renderer for checking what
//! compiled output does.

pub mod fortune;
