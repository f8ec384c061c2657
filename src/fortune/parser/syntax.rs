//! Block syntax for directives
//!
//! The parser needs to know which directives open a block and which names may
//! continue a block (`@else` inside `@if`). That knowledge lives in the directive
//! registry; [DirectiveSyntax] is the plain-data view of it handed to the parser.
//!
//! Names the syntax does not know are still parsed: such a directive opens a block
//! if a balancing `@end<name>` follows it. Names starting with `end` are reserved
//! for closers.

use std::collections::{HashMap, HashSet};

/// Which directives open blocks, and which continuations each block accepts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectiveSyntax {
    blocks: HashMap<String, Vec<String>>,
    inline: HashSet<String>,
}

impl DirectiveSyntax {
    /// Create an empty syntax (every directive is resolved by lookahead)
    pub fn new() -> Self {
        Self::default()
    }

    /// Syntax of the built-in directives
    pub fn builtin() -> Self {
        let mut syntax = Self::new();
        syntax.add_block("if", ["elseif", "else"]);
        syntax.add_block("unless", ["else"]);
        syntax.add_block("foreach", Vec::<String>::new());
        syntax.add_inline("include");
        syntax
    }

    /// Declare a block directive and the continuation names it accepts
    pub fn add_block<I, S>(&mut self, name: impl Into<String>, continuations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        self.inline.remove(&name);
        self.blocks
            .insert(name, continuations.into_iter().map(Into::into).collect());
    }

    /// Declare a directive that never opens a block
    pub fn add_inline(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.blocks.remove(&name);
        self.inline.insert(name);
    }

    /// `Some(true)` for blocks, `Some(false)` for inline directives, `None` if unknown
    pub fn is_block(&self, name: &str) -> Option<bool> {
        if self.blocks.contains_key(name) {
            Some(true)
        } else if self.inline.contains(name) {
            Some(false)
        } else {
            None
        }
    }

    /// Whether any block accepts `name` as a continuation
    pub fn is_continuation(&self, name: &str) -> bool {
        self.blocks
            .values()
            .any(|continuations| continuations.iter().any(|c| c == name))
    }

    /// Whether `block` accepts `continuation`
    pub fn accepts(&self, block: &str, continuation: &str) -> bool {
        self.blocks
            .get(block)
            .is_some_and(|continuations| continuations.iter().any(|c| c == continuation))
    }
}

/// The block a closer ends: `endif` → `if`
pub fn closer_target(name: &str) -> Option<&str> {
    name.strip_prefix("end").filter(|target| !target.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_syntax() {
        let syntax = DirectiveSyntax::builtin();
        assert_eq!(syntax.is_block("if"), Some(true));
        assert_eq!(syntax.is_block("foreach"), Some(true));
        assert_eq!(syntax.is_block("include"), Some(false));
        assert_eq!(syntax.is_block("bogus"), None);

        assert!(syntax.is_continuation("else"));
        assert!(syntax.is_continuation("elseif"));
        assert!(!syntax.is_continuation("if"));

        assert!(syntax.accepts("if", "elseif"));
        assert!(syntax.accepts("unless", "else"));
        assert!(!syntax.accepts("unless", "elseif"));
        assert!(!syntax.accepts("foreach", "else"));
    }

    #[test]
    fn test_redeclaring_switches_kind() {
        let mut syntax = DirectiveSyntax::new();
        syntax.add_inline("x");
        syntax.add_block("x", ["y"]);
        assert_eq!(syntax.is_block("x"), Some(true));
        syntax.add_inline("x");
        assert_eq!(syntax.is_block("x"), Some(false));
        assert!(!syntax.accepts("x", "y"));
    }

    #[test]
    fn test_closer_target() {
        assert_eq!(closer_target("endif"), Some("if"));
        assert_eq!(closer_target("endforeach"), Some("foreach"));
        assert_eq!(closer_target("end"), None);
        assert_eq!(closer_target("if"), None);
    }
}
