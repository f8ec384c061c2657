//! The template syntax tree
//!
//! Nodes are stored in an arena and addressed by [NodeId]. Ownership runs strictly
//! downward through each node's `children`; `parent` is a plain index. The root
//! is its own parent, so walking upward from any node always ends at the root
//! instead of running off the tree.

use super::node::{Node, NodeId, NodeKind};
use super::span::Position;

/// A parsed template
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    /// Create a tree holding only the root
    pub fn new() -> Self {
        let root = Node::new(
            NodeKind::Root,
            String::new(),
            NodeId::ROOT,
            Position::default(),
        );
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn value(&self, id: NodeId) -> &str {
        &self.node(id).value
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// The enclosing node; the root returns itself
    pub fn parent(&self, id: NodeId) -> NodeId {
        self.node(id).parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(NodeId::ROOT).is_empty()
    }

    /// Append a new node as the last child of `parent`
    ///
    /// Panics if `parent` is a leaf kind; the parser never asks for that.
    pub fn append(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        value: impl Into<String>,
        position: Position,
    ) -> NodeId {
        assert!(
            self.kind(parent).is_container(),
            "{} nodes cannot own children",
            self.kind(parent)
        );
        assert!(kind != NodeKind::Root, "a tree has exactly one root");

        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Node::new(kind, value.into(), parent, position));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn mark_continuation(&mut self, id: NodeId) {
        self.nodes[id.0].continuation = true;
    }

    /// Iterate from `id`'s parent up to and including the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            ast: self,
            current: id,
            done: id == NodeId::ROOT,
        }
    }

    /// Number of edges between `id` and the root
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// All nodes below `id` in document (pre-)order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        result
    }

    /// Identifier of a directive, read from its `DirectiveName` leaf
    pub fn directive_name(&self, id: NodeId) -> Option<&str> {
        self.children(id)
            .iter()
            .find(|c| self.kind(**c) == NodeKind::DirectiveName)
            .map(|c| self.value(*c))
    }

    /// Raw argument source of a directive, if it was written with `(...)`
    pub fn directive_arguments(&self, id: NodeId) -> Option<&str> {
        self.children(id)
            .iter()
            .find(|c| self.kind(**c) == NodeKind::Expression)
            .map(|c| self.value(*c))
    }

    /// Expression source of a sanitized or unsanitized tag
    pub fn tag_expression(&self, id: NodeId) -> Option<&str> {
        self.directive_arguments(id)
    }

    /// Body nodes of a directive: everything but its name, arguments and continuations
    pub fn directive_body(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| {
                let node = self.node(*c);
                !matches!(node.kind, NodeKind::DirectiveName | NodeKind::Expression)
                    && !node.continuation
            })
            .collect()
    }

    /// Continuation directives (`@else`, ...) attached to a block, in order
    pub fn continuations(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.node(*c).continuation)
            .collect()
    }

    /// Count nodes of each kind, useful for quick structural checks
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

/// Upward walk produced by [Ast::ancestors]
pub struct Ancestors<'a> {
    ast: &'a Ast,
    current: NodeId,
    done: bool,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.done {
            return None;
        }
        let parent = self.ast.parent(self.current);
        self.current = parent;
        self.done = parent == NodeId::ROOT;
        Some(parent)
    }
}
