//! XML-like tag serialization of parsed templates
//!
//! - Node kind → tag name
//! - Node value → text content
//! - Children → nested in a `<children>` tag
//!
//! ```text
//! <template>
//!   <literal>Hi </literal>
//!   <sanitized-tag>name<children>
//!     <expression>name</expression>
//!   </children></sanitized-tag>
//! </template>
//! ```

use crate::fortune::ast::{Ast, NodeId};
use crate::fortune::formats::registry::Formatter;

pub fn serialize_ast(ast: &Ast) -> String {
    let mut result = String::new();
    result.push_str("<template>\n");
    for child in ast.children(ast.root()) {
        serialize_node(ast, *child, 1, &mut result);
    }
    result.push_str("</template>");
    result
}

fn serialize_node(ast: &Ast, id: NodeId, indent_level: usize, output: &mut String) {
    let indent = "  ".repeat(indent_level);
    let node = ast.node(id);
    let tag = node.kind().label();

    output.push_str(&format!("{}<{}>{}", indent, tag, escape_xml(node.value())));
    if node.children().is_empty() {
        output.push_str(&format!("</{}>\n", tag));
        return;
    }

    output.push_str("<children>\n");
    for child in node.children() {
        serialize_node(ast, *child, indent_level + 1, output);
    }
    output.push_str(&format!("{}</children></{}>\n", indent, tag));
}

fn escape_xml(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

pub struct TagFormatter;

impl Formatter for TagFormatter {
    fn name(&self) -> &str {
        "tag"
    }

    fn serialize(&self, ast: &Ast) -> String {
        serialize_ast(ast)
    }

    fn description(&self) -> &str {
        "XML-like tags mirroring the AST"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fortune::lexer::lex;
    use crate::fortune::parser::parse;

    fn tag(source: &str) -> String {
        serialize_ast(&parse(&lex(source).unwrap()).unwrap())
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(tag(""), "<template>\n</template>");
    }

    #[test]
    fn test_nested_structure() {
        assert_eq!(
            tag("Hi {{ name }}{# note #}"),
            concat!(
                "<template>\n",
                "  <literal>Hi </literal>\n",
                "  <sanitized-tag>name<children>\n",
                "    <expression>name</expression>\n",
                "  </children></sanitized-tag>\n",
                "  <comment>note</comment>\n",
                "</template>",
            )
        );
    }

    #[test]
    fn test_xml_escaping() {
        let output = tag("<b> & \"quotes\"");
        assert!(output.contains("<literal>&lt;b&gt; &amp; &quot;quotes&quot;</literal>"));
    }
}
