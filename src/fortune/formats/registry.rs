//! Named views of a parsed template
//!
//! The `ast-*` processing stages look their serializer up here by the part
//! after the dash: `ast-treeviz` → `treeviz`, `ast-tag` → `tag`.

use crate::fortune::ast::Ast;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    UnknownFormat { name: String, available: Vec<String> },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::UnknownFormat { name, available } => write!(
                f,
                "Unknown AST format '{name}' (expected one of: {})",
                available.join(", ")
            ),
        }
    }
}

impl std::error::Error for FormatError {}

/// Renders an [Ast] as text
///
/// Serializers walk the arena from the root and never fail on a tree the
/// parser produced.
pub trait Formatter: Send + Sync {
    /// Lookup key, e.g. "treeviz"
    fn name(&self) -> &str;

    fn serialize(&self, ast: &Ast) -> String;

    fn description(&self) -> &str {
        ""
    }
}

pub struct FormatRegistry {
    formatters: BTreeMap<String, Box<dyn Formatter>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formatters: BTreeMap::new(),
        }
    }

    /// Add a view, replacing one with the same name
    pub fn register<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn serialize(&self, ast: &Ast, format: &str) -> Result<String, FormatError> {
        let formatter = self.get(format).ok_or_else(|| FormatError::UnknownFormat {
            name: format.to_string(),
            available: self.list_formats(),
        })?;
        tracing::trace!(format, nodes = ast.len(), "serializing ast");
        Ok(formatter.serialize(ast))
    }

    pub fn list_formats(&self) -> Vec<String> {
        self.formatters.keys().cloned().collect()
    }

    /// `treeviz` and `tag`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(super::TreevizFormatter);
        registry.register(super::TagFormatter);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
