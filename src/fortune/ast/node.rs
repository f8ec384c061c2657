//! AST node type definitions
//!
//! A node is a kind discriminant plus its raw value, its children (owned, in
//! document order) and a back reference to its parent. Nodes live in the
//! [Ast](super::tree::Ast) arena and refer to each other by [NodeId].

use super::span::Position;
use std::fmt;

/// Index of a node in its [Ast](super::tree::Ast)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root is always the first node allocated
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kinds of node a template can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Literal,
    SanitizedTag,
    UnsanitizedTag,
    Directive,
    DirectiveName,
    Expression,
    Comment,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Literal => "literal",
            NodeKind::SanitizedTag => "sanitized-tag",
            NodeKind::UnsanitizedTag => "unsanitized-tag",
            NodeKind::Directive => "directive",
            NodeKind::DirectiveName => "directive-name",
            NodeKind::Expression => "expression",
            NodeKind::Comment => "comment",
        }
    }

    /// Kinds that may own children
    pub fn is_container(&self) -> bool {
        match self {
            NodeKind::Root
            | NodeKind::Directive
            | NodeKind::SanitizedTag
            | NodeKind::UnsanitizedTag => true,
            NodeKind::Literal
            | NodeKind::DirectiveName
            | NodeKind::Expression
            | NodeKind::Comment => false,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single node in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) value: String,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: NodeId,
    pub(crate) position: Position,
    /// Set on directives that continue their parent's block (`@else`, `@elseif`)
    pub(crate) continuation: bool,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, value: String, parent: NodeId, position: Position) -> Self {
        Self {
            kind,
            value,
            children: Vec::new(),
            parent,
            position,
            continuation: false,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_continuation(&self) -> bool {
        self.continuation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [NodeKind; 8] = [
        NodeKind::Root,
        NodeKind::Literal,
        NodeKind::SanitizedTag,
        NodeKind::UnsanitizedTag,
        NodeKind::Directive,
        NodeKind::DirectiveName,
        NodeKind::Expression,
        NodeKind::Comment,
    ];

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<_> = ALL.iter().map(|k| k.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), ALL.len());
    }

    #[test]
    fn test_classification() {
        assert_eq!(ALL.iter().filter(|k| k.is_container()).count(), 4);
        assert!(NodeKind::Root.is_container());
        assert!(NodeKind::Directive.is_container());
        assert!(!NodeKind::DirectiveName.is_container());
        assert!(!NodeKind::Comment.is_container());
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::ROOT.to_string(), "#0");
        assert_eq!(NodeId(7).index(), 7);
    }
}
