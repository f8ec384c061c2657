//! Views: template text plus the variables it will be rendered with
//!
//! A view carries data only. Compiling it is the [Compiler](crate::fortune::compiler::Compiler)'s
//! job, and rendering the compiled output is left to the runtime.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Contents that are not text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Raw bytes that are not valid UTF-8; `valid_up_to` is the byte offset of the first bad sequence
    NotUtf8 { valid_up_to: usize },
    /// A JSON value other than a string, named by its type
    NotText { found: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NotUtf8 { valid_up_to } => write!(
                f,
                "View contents must be text: invalid UTF-8 after byte {}",
                valid_up_to
            ),
            ValidationError::NotText { found } => {
                write!(f, "View contents must be a string, found {}", found)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    contents: String,
    vars: HashMap<String, Value>,
}

impl View {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            vars: HashMap::new(),
        }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn set_contents(&mut self, contents: impl Into<String>) {
        self.contents = contents.into();
    }

    /// Replace the contents with raw bytes, which must be UTF-8
    pub fn try_set_contents(&mut self, bytes: &[u8]) -> Result<(), ValidationError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ValidationError::NotUtf8 {
            valid_up_to: e.valid_up_to(),
        })?;
        self.contents = text.to_string();
        Ok(())
    }

    /// Value bound to `name`, if any
    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Bind `name`, replacing any previous value
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn vars(&self) -> &HashMap<String, Value> {
        &self.vars
    }

    /// Bind every pair in order; later pairs win
    pub fn set_vars<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in vars {
            self.set_var(name, value);
        }
    }
}

impl TryFrom<Value> for View {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(contents) => Ok(View::new(contents)),
            other => Err(ValidationError::NotText {
                found: json_type_name(&other),
            }),
        }
    }
}

impl From<&str> for View {
    fn from(contents: &str) -> Self {
        View::new(contents)
    }
}
