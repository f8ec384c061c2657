//! Treeviz formatter for parsed templates
//!
//! One line per node, drawn as a tree below the (hidden) root:
//!
//! ```text
//! ├─ ¶ literal: "Hi "
//! └─ ◇ sanitized-tag: name
//!   └─ ƒ expression: name
//! ```

use crate::fortune::ast::{Ast, NodeId, NodeKind};
use crate::fortune::formats::registry::Formatter;

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

fn icon(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Root => "⧉",
        NodeKind::Literal => "¶",
        NodeKind::SanitizedTag => "◇",
        NodeKind::UnsanitizedTag => "◆",
        NodeKind::Directive => "@",
        NodeKind::DirectiveName => "≡",
        NodeKind::Expression => "ƒ",
        NodeKind::Comment => "#",
    }
}

fn display_label(ast: &Ast, id: NodeId) -> String {
    let node = ast.node(id);
    match node.kind() {
        NodeKind::Literal | NodeKind::Comment => format!("{:?}", node.value()),
        NodeKind::Directive => match ast.directive_arguments(id) {
            Some(arguments) => format!("@{}({})", node.value(), arguments),
            None => format!("@{}", node.value()),
        },
        _ => node.value().to_string(),
    }
}

pub fn to_treeviz_str(ast: &Ast) -> String {
    let mut result = String::new();
    append_children(&mut result, ast, ast.root(), "");
    result
}

fn append_children(result: &mut String, ast: &Ast, id: NodeId, prefix: &str) {
    let children = ast.children(id);
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        append_node(result, ast, *child, prefix, is_last);
    }
}

fn append_node(result: &mut String, ast: &Ast, id: NodeId, prefix: &str, is_last: bool) {
    let connector = if is_last { "└─" } else { "├─" };
    let kind = ast.kind(id);
    result.push_str(&format!(
        "{}{} {} {}: {}\n",
        prefix,
        connector,
        icon(kind),
        kind,
        truncate(&display_label(ast, id), 30)
    ));

    let new_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    append_children(result, ast, id, &new_prefix);
}

pub struct TreevizFormatter;

impl Formatter for TreevizFormatter {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn serialize(&self, ast: &Ast) -> String {
        to_treeviz_str(ast)
    }

    fn description(&self) -> &str {
        "Indented tree with one line per node"
    }
}
