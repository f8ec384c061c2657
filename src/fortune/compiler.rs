//! Compiler from templates to executable output
//!
//! The compiled form is the template's literal text with two kinds of embedded
//! blocks: `<%= expr %>` writes a value and `<% stmt %>` runs a statement. Tags
//! become output blocks, and directives become whatever their transformer returns.
//! The built-in transformers emit these statements:
//!
//!     <% if EXPR { %>   <% } elseif EXPR { %>   <% } else { %>   <% } %>
//!     <% for NAME in EXPR { %>   <% for KEY, NAME in EXPR { %>
//!     <% include EXPR %>
//!
//! Literal text is copied unchanged, including any `<%` or `<%=` it contains.
//! Those bytes then read as the start of a block, so a template that needs them
//! as text has to produce them from an expression such as `{{{ '<' }}}%`.
//! String literals inside expressions never emit `%>`; a `>` following `%` is
//! written as `\u003E`.
//!
//! Directive transformers live in a [DirectiveRegistry]; the registry also tells
//! the parser which directives open blocks.

pub mod compiler_impl;
pub mod directives;
pub mod error;
pub mod escape;
pub mod registry;

pub use compiler_impl::{Compiler, CompilerOptions};
pub use directives::{ForeachDirective, IfDirective, IncludeDirective, LoopHead, UnlessDirective};
pub use error::{CompileError, RegistryError, TemplateError};
pub use escape::{EscapeContext, UnknownEscapeContext};
pub use registry::{Block, Branch, DirectiveRegistry, Invocation, Transformer};
