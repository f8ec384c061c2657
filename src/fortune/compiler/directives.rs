//! Built-in directives
//!
//! - `@if(cond) ... @elseif(cond) ... @else ... @endif`
//! - `@unless(cond) ... @else ... @endunless`
//! - `@foreach(items as item) ... @endforeach`, or `items as key => item`
//! - `@include(name)`

use crate::fortune::compiler::error::{CompileError, RegistryError};
use crate::fortune::compiler::registry::{Branch, DirectiveRegistry, Invocation, Transformer};
use crate::fortune::expression::{parse_expression, Expr, UnaryOp, RESERVED_WORDS};
use once_cell::sync::Lazy;
use regex::Regex;

static FOREACH_ARGUMENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<collection>.+?)\s+as\s+(?:(?P<key>[A-Za-z_][A-Za-z0-9_]*)\s*=>\s*)?(?P<item>[A-Za-z_][A-Za-z0-9_]*)\s*$",
    )
    .unwrap()
});

pub(crate) fn register_builtins(registry: &mut DirectiveRegistry) -> Result<(), RegistryError> {
    registry.register("if", IfDirective)?;
    registry.register("unless", UnlessDirective)?;
    registry.register("foreach", ForeachDirective)?;
    registry.register("include", IncludeDirective)
}

fn open_statement(statement: &str) -> String {
    format!("<% {} %>", statement)
}

fn else_branch(branch: &Branch<'_>, index: usize, count: usize) -> Result<String, CompileError> {
    branch.reject_arguments()?;
    if index + 1 != count {
        return Err(CompileError::invalid_arguments(
            branch.name,
            "must be the last branch",
            branch.position,
        ));
    }
    Ok(format!("{}{}", open_statement("} else {"), branch.body))
}

fn unexpected_branch(invocation: &Invocation<'_>, branch: &Branch<'_>) -> CompileError {
    CompileError::invalid_arguments(
        branch.name,
        format!("'@{}' cannot continue '@{}'", branch.name, invocation.name),
        branch.position,
    )
}

/// Conditional with any number of `@elseif` branches and an optional final `@else`
pub struct IfDirective;

impl Transformer for IfDirective {
    fn transform(&self, invocation: &Invocation<'_>) -> Result<String, CompileError> {
        let condition = invocation.expression()?;
        let mut out = open_statement(&format!("if {} {{", condition));
        out.push_str(&invocation.body);

        let count = invocation.branches.len();
        for (index, branch) in invocation.branches.iter().enumerate() {
            match branch.name {
                "elseif" => {
                    let condition = branch.expression()?;
                    out.push_str(&open_statement(&format!("}} elseif {} {{", condition)));
                    out.push_str(&branch.body);
                }
                "else" => out.push_str(&else_branch(branch, index, count)?),
                _ => return Err(unexpected_branch(invocation, branch)),
            }
        }

        out.push_str(&open_statement("}"));
        Ok(out)
    }

    fn is_block(&self) -> bool {
        true
    }

    fn continuations(&self) -> &[&'static str] {
        &["elseif", "else"]
    }
}

/// Negated conditional with an optional `@else`
pub struct UnlessDirective;

impl Transformer for UnlessDirective {
    fn transform(&self, invocation: &Invocation<'_>) -> Result<String, CompileError> {
        let condition = Expr::Unary(UnaryOp::Not, Box::new(invocation.expression()?));
        let mut out = open_statement(&format!("if {} {{", condition));
        out.push_str(&invocation.body);

        let count = invocation.branches.len();
        for (index, branch) in invocation.branches.iter().enumerate() {
            match branch.name {
                "else" => out.push_str(&else_branch(branch, index, count)?),
                _ => return Err(unexpected_branch(invocation, branch)),
            }
        }

        out.push_str(&open_statement("}"));
        Ok(out)
    }

    fn is_block(&self) -> bool {
        true
    }

    fn continuations(&self) -> &[&'static str] {
        &["else"]
    }
}

/// Loop over a collection, binding each item (and optionally its key)
pub struct ForeachDirective;

/// The parts of `items as key => item`
#[derive(Debug, Clone, PartialEq)]
pub struct LoopHead {
    pub collection: Expr,
    pub key: Option<String>,
    pub item: String,
}

impl LoopHead {
    pub fn parse(invocation: &Invocation<'_>) -> Result<Self, CompileError> {
        let arguments = invocation.require_arguments()?;
        let captures = FOREACH_ARGUMENTS.captures(arguments).ok_or_else(|| {
            CompileError::invalid_arguments(
                invocation.name,
                "expected 'EXPR as NAME' or 'EXPR as KEY => NAME'",
                invocation.position,
            )
        })?;

        let source = &captures["collection"];
        let collection = parse_expression(source).map_err(|e| CompileError::InvalidExpression {
            expression: source.trim().to_string(),
            message: e.to_string(),
            position: invocation.position,
        })?;
        let key = captures.name("key").map(|m| m.as_str().to_string());
        let item = captures["item"].to_string();

        for name in key.iter().chain(std::iter::once(&item)) {
            if RESERVED_WORDS.contains(&name.as_str()) {
                return Err(CompileError::invalid_arguments(
                    invocation.name,
                    format!("'{}' is a reserved word", name),
                    invocation.position,
                ));
            }
        }
        if key.as_deref() == Some(item.as_str()) {
            return Err(CompileError::invalid_arguments(
                invocation.name,
                "key and item need different names",
                invocation.position,
            ));
        }

        Ok(Self {
            collection,
            key,
            item,
        })
    }
}

impl Transformer for ForeachDirective {
    fn transform(&self, invocation: &Invocation<'_>) -> Result<String, CompileError> {
        let head = LoopHead::parse(invocation)?;
        let statement = match &head.key {
            Some(key) => format!("for {}, {} in {} {{", key, head.item, head.collection),
            None => format!("for {} in {} {{", head.item, head.collection),
        };
        if let Some(branch) = invocation.branches.first() {
            return Err(unexpected_branch(invocation, branch));
        }
        Ok(format!(
            "{}{}{}",
            open_statement(&statement),
            invocation.body,
            open_statement("}")
        ))
    }

    fn is_block(&self) -> bool {
        true
    }
}

/// Splice another template in at this point
pub struct IncludeDirective;

impl Transformer for IncludeDirective {
    fn transform(&self, invocation: &Invocation<'_>) -> Result<String, CompileError> {
        let target = invocation.expression()?;
        Ok(open_statement(&format!("include {}", target)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fortune::ast::Position;
    use crate::fortune::compiler::escape::EscapeContext;

    fn invocation<'a>(name: &'a str, arguments: Option<&'a str>, body: &str) -> Invocation<'a> {
        Invocation {
            name,
            arguments,
            body: body.to_string(),
            branches: Vec::new(),
            position: Position::new(0, 0),
            escape: EscapeContext::Html,
        }
    }

    fn branch<'a>(name: &'a str, arguments: Option<&'a str>, body: &str) -> Branch<'a> {
        Branch {
            name,
            arguments,
            body: body.to_string(),
            position: Position::new(0, 5),
        }
    }

    #[test]
    fn test_register_builtins() {
        let mut registry = DirectiveRegistry::new();
        assert_eq!(register_builtins(&mut registry), Ok(()));
        assert_eq!(registry.list(), vec!["foreach", "if", "include", "unless"]);
        assert!(registry.resolve("foreach").is_some_and(|t| t.is_block()));
        assert!(registry.resolve("include").is_some_and(|t| !t.is_block()));
    }

    #[test]
    fn test_if_with_branches() {
        let mut inv = invocation("if", Some("a > 1"), "A");
        inv.branches.push(branch("elseif", Some("b"), "B"));
        inv.branches.push(branch("else", None, "C"));

        assert_eq!(
            IfDirective.transform(&inv).unwrap(),
            "<% if a > 1 { %>A<% } elseif b { %>B<% } else { %>C<% } %>"
        );
    }

    #[test]
    fn test_if_rejects_else_before_elseif() {
        let mut inv = invocation("if", Some("a"), "");
        inv.branches.push(branch("else", None, ""));
        inv.branches.push(branch("elseif", Some("b"), ""));

        let err = IfDirective.transform(&inv).unwrap_err();
        assert!(matches!(err, CompileError::InvalidArguments { ref directive, .. } if directive == "else"));
    }

    #[test]
    fn test_if_requires_condition() {
        let inv = invocation("if", None, "");
        assert!(matches!(
            IfDirective.transform(&inv),
            Err(CompileError::InvalidArguments { .. })
        ));

        let inv = invocation("if", Some("a =="), "");
        assert!(matches!(
            IfDirective.transform(&inv),
            Err(CompileError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_else_with_arguments() {
        let mut inv = invocation("if", Some("a"), "");
        inv.branches.push(branch("else", Some("b"), ""));
        assert!(IfDirective.transform(&inv).is_err());
    }

    #[test]
    fn test_unless_negates() {
        let mut inv = invocation("unless", Some("a && b"), "X");
        inv.branches.push(branch("else", None, "Y"));
        assert_eq!(
            UnlessDirective.transform(&inv).unwrap(),
            "<% if !(a && b) { %>X<% } else { %>Y<% } %>"
        );
    }

    #[test]
    fn test_foreach_forms() {
        let inv = invocation("foreach", Some("items as item"), "[x]");
        assert_eq!(
            ForeachDirective.transform(&inv).unwrap(),
            "<% for item in items { %>[x]<% } %>"
        );

        let inv = invocation("foreach", Some(" user.roles  as  i=>role "), "");
        assert_eq!(
            ForeachDirective.transform(&inv).unwrap(),
            "<% for i, role in user.roles { %><% } %>"
        );

        let inv = invocation("foreach", Some("[1, 2] as n"), "");
        assert_eq!(
            ForeachDirective.transform(&inv).unwrap(),
            "<% for n in [1, 2] { %><% } %>"
        );
    }

    #[test]
    fn test_foreach_bad_arguments() {
        for arguments in ["items", "items as", "as item", "items as 1x", "items as k => k", "items as not"] {
            let inv = invocation("foreach", Some(arguments), "");
            assert!(
                ForeachDirective.transform(&inv).is_err(),
                "{:?} should be rejected",
                arguments
            );
        }
    }

    #[test]
    fn test_include() {
        let inv = invocation("include", Some("'partials/header'"), "");
        assert_eq!(
            IncludeDirective.transform(&inv).unwrap(),
            "<% include \"partials/header\" %>"
        );
        assert!(!IncludeDirective.is_block());
    }
}
