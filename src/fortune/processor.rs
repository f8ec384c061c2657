//! Processing API for fortune templates
//!
//! Runs a template through the pipeline up to a chosen stage and renders that
//! stage's result in a chosen format:
//!
//!     token-simple    one token per line
//!     token-json      tokens as pretty JSON
//!     ast-treeviz     tree drawing of the AST
//!     ast-tag         XML-like AST
//!     compiled        compiler output

use crate::fortune::compiler::{Compiler, TemplateError};
use crate::fortune::formats::FormatRegistry;
use crate::fortune::lexer::{lex, Token};
use crate::fortune::parser::parse_with_syntax;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Token,
    Ast,
    Compiled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Simple,
    Json,
    AstTag,
    AstTreeviz,
    Compiled,
}

/// A stage plus the format to render it in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingSpec {
    pub stage: ProcessingStage,
    pub format: OutputFormat,
}

impl ProcessingSpec {
    /// Parse a format string like "token-simple" or "compiled"
    pub fn from_string(format_str: &str) -> Result<Self, ProcessingError> {
        if format_str == "compiled" {
            return Ok(ProcessingSpec {
                stage: ProcessingStage::Compiled,
                format: OutputFormat::Compiled,
            });
        }

        let (stage, format) = format_str
            .split_once('-')
            .ok_or_else(|| ProcessingError::InvalidFormat(format_str.to_string()))?;

        let stage = match stage {
            "token" => ProcessingStage::Token,
            "ast" => ProcessingStage::Ast,
            other => return Err(ProcessingError::InvalidStage(other.to_string())),
        };

        let format = match (stage, format) {
            (ProcessingStage::Token, "simple") => OutputFormat::Simple,
            (ProcessingStage::Token, "json") => OutputFormat::Json,
            (ProcessingStage::Ast, "tag") => OutputFormat::AstTag,
            (ProcessingStage::Ast, "treeviz") => OutputFormat::AstTreeviz,
            (ProcessingStage::Token, "tag" | "treeviz") => {
                return Err(ProcessingError::InvalidFormatType(format!(
                    "Format '{}' only works with AST stage",
                    format
                )))
            }
            (ProcessingStage::Ast, "simple" | "json") => {
                return Err(ProcessingError::InvalidFormatType(format!(
                    "Format '{}' not supported for AST stage (only 'tag' and 'treeviz' are supported)",
                    format
                )))
            }
            (_, other) => return Err(ProcessingError::InvalidFormatType(other.to_string())),
        };

        Ok(ProcessingSpec { stage, format })
    }

    pub fn available_specs() -> Vec<ProcessingSpec> {
        vec![
            ProcessingSpec {
                stage: ProcessingStage::Token,
                format: OutputFormat::Simple,
            },
            ProcessingSpec {
                stage: ProcessingStage::Token,
                format: OutputFormat::Json,
            },
            ProcessingSpec {
                stage: ProcessingStage::Ast,
                format: OutputFormat::AstTag,
            },
            ProcessingSpec {
                stage: ProcessingStage::Ast,
                format: OutputFormat::AstTreeviz,
            },
            ProcessingSpec {
                stage: ProcessingStage::Compiled,
                format: OutputFormat::Compiled,
            },
        ]
    }

    pub fn name(&self) -> &'static str {
        match self.format {
            OutputFormat::Simple => "token-simple",
            OutputFormat::Json => "token-json",
            OutputFormat::AstTag => "ast-tag",
            OutputFormat::AstTreeviz => "ast-treeviz",
            OutputFormat::Compiled => "compiled",
        }
    }
}

impl fmt::Display for ProcessingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingError {
    InvalidFormat(String),
    InvalidStage(String),
    InvalidFormatType(String),
    IoError(String),
    Template(TemplateError),
}

impl std::error::Error for ProcessingError {}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingError::InvalidFormat(format) => write!(f, "Invalid format: {}", format),
            ProcessingError::InvalidStage(stage) => write!(f, "Invalid stage: {}", stage),
            ProcessingError::InvalidFormatType(format_type) => {
                write!(f, "Invalid format type: {}", format_type)
            }
            ProcessingError::IoError(msg) => write!(f, "IO error: {}", msg),
            ProcessingError::Template(err) => write!(f, "{}", err),
        }
    }
}

impl From<TemplateError> for ProcessingError {
    fn from(err: TemplateError) -> Self {
        ProcessingError::Template(err)
    }
}

/// Process template text with the default compiler
pub fn process_source(source: &str, spec: &ProcessingSpec) -> Result<String, ProcessingError> {
    process_source_with(source, spec, &Compiler::default())
}

/// Process template text; the compiler's registry decides the directive syntax
pub fn process_source_with(
    source: &str,
    spec: &ProcessingSpec,
    compiler: &Compiler,
) -> Result<String, ProcessingError> {
    tracing::debug!(spec = %spec, bytes = source.len(), "processing template");
    match spec.stage {
        ProcessingStage::Token => {
            let tokens = lex(source).map_err(TemplateError::from)?;
            format_tokens(&tokens, spec.format)
        }
        ProcessingStage::Ast => {
            let tokens = lex(source).map_err(TemplateError::from)?;
            let ast = parse_with_syntax(&tokens, &compiler.registry().syntax())
                .map_err(TemplateError::from)?;
            let format = match spec.format {
                OutputFormat::AstTag => "tag",
                _ => "treeviz",
            };
            FormatRegistry::with_defaults()
                .serialize(&ast, format)
                .map_err(|e| ProcessingError::InvalidFormatType(e.to_string()))
        }
        ProcessingStage::Compiled => Ok(compiler.compile(source)?),
    }
}

/// Read a template file and process it with the default compiler
pub fn process_file<P: AsRef<Path>>(
    file_path: P,
    spec: &ProcessingSpec,
) -> Result<String, ProcessingError> {
    process_file_with(file_path, spec, &Compiler::default())
}

pub fn process_file_with<P: AsRef<Path>>(
    file_path: P,
    spec: &ProcessingSpec,
    compiler: &Compiler,
) -> Result<String, ProcessingError> {
    let content = fs::read_to_string(file_path.as_ref())
        .map_err(|e| ProcessingError::IoError(e.to_string()))?;
    process_source_with(&content, spec, compiler)
}

fn format_tokens(tokens: &[Token], format: OutputFormat) -> Result<String, ProcessingError> {
    match format {
        OutputFormat::Simple => {
            let mut result = String::new();
            for token in tokens {
                result.push_str(&token.to_string());
                result.push('\n');
            }
            Ok(result)
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(tokens).map_err(|e| ProcessingError::IoError(e.to_string()))
        }
        other => Err(ProcessingError::InvalidFormatType(format!(
            "{:?} format only works with ast stage",
            other
        ))),
    }
}

/// Every accepted format string
pub fn available_formats() -> Vec<String> {
    ProcessingSpec::available_specs()
        .into_iter()
        .map(|spec| spec.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string() {
        let spec = ProcessingSpec::from_string("token-simple").unwrap();
        assert_eq!(spec.stage, ProcessingStage::Token);
        assert_eq!(spec.format, OutputFormat::Simple);

        let spec = ProcessingSpec::from_string("ast-treeviz").unwrap();
        assert_eq!(spec.format, OutputFormat::AstTreeviz);

        let spec = ProcessingSpec::from_string("compiled").unwrap();
        assert_eq!(spec.stage, ProcessingStage::Compiled);
    }

    #[test]
    fn test_from_string_errors() {
        assert_eq!(
            ProcessingSpec::from_string("token"),
            Err(ProcessingError::InvalidFormat("token".to_string()))
        );
        assert_eq!(
            ProcessingSpec::from_string("html-simple"),
            Err(ProcessingError::InvalidStage("html".to_string()))
        );
        assert!(matches!(
            ProcessingSpec::from_string("token-tag"),
            Err(ProcessingError::InvalidFormatType(_))
        ));
        assert!(matches!(
            ProcessingSpec::from_string("ast-json"),
            Err(ProcessingError::InvalidFormatType(_))
        ));
        assert!(matches!(
            ProcessingSpec::from_string("ast-xml"),
            Err(ProcessingError::InvalidFormatType(_))
        ));
    }

    #[test]
    fn test_names_round_trip() {
        for name in available_formats() {
            let spec = ProcessingSpec::from_string(&name).unwrap();
            assert_eq!(spec.to_string(), name);
        }
        assert_eq!(available_formats().len(), 5);
    }

    #[test]
    fn test_token_simple() {
        let spec = ProcessingSpec::from_string("token-simple").unwrap();
        let output = process_source("a{{ b }}", &spec).unwrap();
        assert_eq!(
            output,
            concat!(
                "<literal-text>(\"a\")\n",
                "<sanitized-tag-open>\n",
                "<expression>(\"b\")\n",
                "<sanitized-tag-close>\n",
                "<end-of-input>\n",
            )
        );
    }

    #[test]
    fn test_token_json() {
        let spec = ProcessingSpec::from_string("token-json").unwrap();
        let output = process_source("hi", &spec).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["kind"], "literal-text");
        assert_eq!(value[0]["value"], "hi");
        assert_eq!(value[1]["kind"], "end-of-input");
    }

    #[test]
    fn test_compiled_and_errors() {
        let spec = ProcessingSpec::from_string("compiled").unwrap();
        assert_eq!(
            process_source("{{{ x }}}", &spec).unwrap(),
            "<%= x %>"
        );
        assert!(matches!(
            process_source("@if(x)", &spec),
            Err(ProcessingError::Template(TemplateError::Parse(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        let spec = ProcessingSpec::from_string("compiled").unwrap();
        assert!(matches!(
            process_file("/nonexistent/template.fortune", &spec),
            Err(ProcessingError::IoError(_))
        ));
    }
}
