//! AST definitions and utilities for fortune templates
//!
//! ## Modules
//!
//! - `span` - Line/column positions
//! - `position` - Byte offset to line/column conversion
//! - `node` - Node kinds and the per-node record
//! - `tree` - The arena holding a parsed template

pub mod node;
pub mod position;
pub mod span;
pub mod tree;

pub use node::{Node, NodeId, NodeKind};
pub use position::SourceLocation;
pub use span::Position;
pub use tree::{Ancestors, Ast};
