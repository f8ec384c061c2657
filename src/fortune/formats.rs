//! Output formats for parsed templates
//!
//! Serializers that make the AST visible for debugging and tests:
//! - `treeviz`: one line per node, drawn as a tree
//! - `tag`: XML-like nesting that mirrors the arena

pub mod registry;
pub mod tag;
pub mod treeviz;

pub use registry::{FormatError, FormatRegistry, Formatter};
pub use tag::{serialize_ast as serialize_ast_tag, TagFormatter};
pub use treeviz::{to_treeviz_str, TreevizFormatter};
