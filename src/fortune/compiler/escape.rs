//! Output escaping contexts
//!
//! A sanitized tag compiles to a call of its context's escape function, for example
//! `<%= escape_html(name) %>`. The functions here are the reference behaviour a
//! runtime must provide under those names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where sanitized output will land in the rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeContext {
    /// Element content
    #[default]
    Html,
    /// Double-quoted attribute values
    Attribute,
    /// A URL component
    Url,
    /// A JavaScript string literal
    Js,
}

impl EscapeContext {
    pub const ALL: [EscapeContext; 4] = [
        EscapeContext::Html,
        EscapeContext::Attribute,
        EscapeContext::Url,
        EscapeContext::Js,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EscapeContext::Html => "html",
            EscapeContext::Attribute => "attribute",
            EscapeContext::Url => "url",
            EscapeContext::Js => "js",
        }
    }

    /// Name of the function sanitized tags are compiled to
    pub fn function_name(&self) -> &'static str {
        match self {
            EscapeContext::Html => "escape_html",
            EscapeContext::Attribute => "escape_attribute",
            EscapeContext::Url => "escape_url",
            EscapeContext::Js => "escape_js",
        }
    }

    pub fn from_function_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.function_name() == name)
    }

    pub fn escape(&self, input: &str) -> String {
        match self {
            EscapeContext::Html => escape_html(input),
            EscapeContext::Attribute => escape_attribute(input),
            EscapeContext::Url => escape_url(input),
            EscapeContext::Js => escape_js(input),
        }
    }
}

impl fmt::Display for EscapeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An escape context name that is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEscapeContext(pub String);

impl fmt::Display for UnknownEscapeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown escape context '{}'. Available: html, attribute, url, js",
            self.0
        )
    }
}

impl std::error::Error for UnknownEscapeContext {}

impl FromStr for EscapeContext {
    type Err = UnknownEscapeContext;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(EscapeContext::Html),
            "attribute" | "attr" => Ok(EscapeContext::Attribute),
            "url" => Ok(EscapeContext::Url),
            "js" => Ok(EscapeContext::Js),
            other => Err(UnknownEscapeContext(other.to_string())),
        }
    }
}

/// Entity-encode text for element content
pub fn escape_html(input: &str) -> String {
    html_escape::encode_safe(input).into_owned()
}

/// Entity-encode text for a double-quoted attribute value
pub fn escape_attribute(input: &str) -> String {
    html_escape::encode_double_quoted_attribute(input).into_owned()
}

/// Percent-encode every byte outside the unreserved set
pub fn escape_url(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Backslash-escape for embedding inside a quoted script string
pub fn escape_js(input: &str) -> String {
    html_escape::encode_script_quoted_text(input)
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
