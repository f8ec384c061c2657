//! Directive registry
//!
//! Directives are compiled by transformers looked up by name. Each transformer
//! implements [Transformer] and is registered with [DirectiveRegistry]; closures
//! with the right signature are transformers too. The registry is filled during
//! setup and only read while compiling, so a built registry can be shared freely.

use crate::fortune::ast::Position;
use crate::fortune::compiler::error::{CompileError, RegistryError};
use crate::fortune::compiler::escape::EscapeContext;
use crate::fortune::expression::{parse_expression, Expr};
use crate::fortune::parser::{closer_target, DirectiveSyntax};
use std::collections::HashMap;

/// A continuation of a block directive, such as `@elseif(x)` or `@else`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch<'a> {
    pub name: &'a str,
    pub arguments: Option<&'a str>,
    /// Compiled body following the continuation
    pub body: String,
    pub position: Position,
}

impl Branch<'_> {
    pub fn expression(&self) -> Result<Expr, CompileError> {
        argument_expression(self.name, self.arguments, self.position)
    }

    pub fn reject_arguments(&self) -> Result<(), CompileError> {
        match self.arguments {
            Some(_) => Err(CompileError::invalid_arguments(
                self.name,
                "takes no arguments",
                self.position,
            )),
            None => Ok(()),
        }
    }
}

/// Everything a transformer sees of one directive occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    pub name: &'a str,
    /// Raw text between the parentheses, if any
    pub arguments: Option<&'a str>,
    /// Compiled body up to the first continuation or the closer
    pub body: String,
    pub branches: Vec<Branch<'a>>,
    pub position: Position,
    pub escape: EscapeContext,
}

impl Invocation<'_> {
    /// The arguments parsed as one expression
    pub fn expression(&self) -> Result<Expr, CompileError> {
        argument_expression(self.name, self.arguments, self.position)
    }

    pub fn require_arguments(&self) -> Result<&str, CompileError> {
        self.arguments
            .ok_or_else(|| CompileError::invalid_arguments(self.name, "expects arguments", self.position))
    }
}

fn argument_expression(
    directive: &str,
    arguments: Option<&str>,
    position: Position,
) -> Result<Expr, CompileError> {
    let source = arguments
        .ok_or_else(|| CompileError::invalid_arguments(directive, "expects an expression", position))?;
    parse_expression(source).map_err(|e| CompileError::InvalidExpression {
        expression: source.trim().to_string(),
        message: e.to_string(),
        position,
    })
}

/// Compiles one directive name
///
/// Block directives also declare which continuation names they accept; the parser
/// uses that to build the tree before any transformer runs.
pub trait Transformer: Send + Sync {
    fn transform(&self, invocation: &Invocation<'_>) -> Result<String, CompileError>;

    /// Whether the directive encloses a body ended by `@end<name>`
    fn is_block(&self) -> bool {
        false
    }

    fn continuations(&self) -> &[&'static str] {
        &[]
    }
}

impl<F> Transformer for F
where
    F: Fn(&Invocation<'_>) -> Result<String, CompileError> + Send + Sync,
{
    fn transform(&self, invocation: &Invocation<'_>) -> Result<String, CompileError> {
        self(invocation)
    }
}

/// Wraps a transformer so that it opens a block
pub struct Block<T> {
    transformer: T,
    continuations: &'static [&'static str],
}

impl<T: Transformer> Block<T> {
    pub fn new(transformer: T) -> Self {
        Self {
            transformer,
            continuations: &[],
        }
    }

    pub fn with_continuations(transformer: T, continuations: &'static [&'static str]) -> Self {
        Self {
            transformer,
            continuations,
        }
    }
}

impl<T: Transformer> Transformer for Block<T> {
    fn transform(&self, invocation: &Invocation<'_>) -> Result<String, CompileError> {
        self.transformer.transform(invocation)
    }

    fn is_block(&self) -> bool {
        true
    }

    fn continuations(&self) -> &[&'static str] {
        self.continuations
    }
}

/// Registry of directive transformers
pub struct DirectiveRegistry {
    transformers: HashMap<String, Box<dyn Transformer>>,
}

impl DirectiveRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        DirectiveRegistry {
            transformers: HashMap::new(),
        }
    }

    /// Register a transformer under `name`, replacing any previous one
    pub fn register<T: Transformer + 'static>(
        &mut self,
        name: impl Into<String>,
        transformer: T,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        validate_name(&name)?;
        tracing::debug!(directive = %name, block = transformer.is_block(), "registering directive");
        self.transformers.insert(name, Box::new(transformer));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<&dyn Transformer> {
        self.transformers.get(name).map(|t| t.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.transformers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<_> = self.transformers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// The block structure the parser should enforce
    pub fn syntax(&self) -> DirectiveSyntax {
        let mut syntax = DirectiveSyntax::new();
        for (name, transformer) in &self.transformers {
            if transformer.is_block() {
                syntax.add_block(name.as_str(), transformer.continuations().iter().copied());
            } else {
                syntax.add_inline(name.as_str());
            }
        }
        syntax
    }

    /// A registry holding `if`, `unless`, `foreach` and `include`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let registered = super::directives::register_builtins(&mut registry);
        debug_assert!(registered.is_ok(), "built-in directive rejected: {:?}", registered);
        registry
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_well || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    if closer_target(name).is_some() {
        return Err(RegistryError::ReservedName(name.to_string()));
    }
    Ok(())
}
