//! Token definitions for fortune templates
//!
//! Two layers of tokens live here:
//!
//!     Scanner tokens ([ScanToken]) are produced by logos while the lexer is in text
//!     mode. They only recognise delimiters, escapes and runs of plain text.
//!
//!     Template tokens ([Token]) are what the parser consumes. They carry their kind,
//!     the raw value, the byte span and the line/column of the construct. The lexer
//!     builds them from scanner tokens, switching to a raw scan for the inside of
//!     tags, comments and directive arguments.
use crate::fortune::ast::Position;
use logos::Logos;
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Text-mode scanner tokens
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum ScanToken {
    #[token("{{{")]
    UnsanitizedOpen,

    #[token("{{")]
    SanitizedOpen,

    #[token("{#")]
    CommentOpen,

    // Escaped delimiters: the backslash is dropped and the delimiter is literal
    #[token("\\{{{")]
    EscapedUnsanitizedOpen,
    #[token("\\{{")]
    EscapedSanitizedOpen,
    #[token("\\{#")]
    EscapedCommentOpen,

    #[token("@@")]
    EscapedAt,

    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    Directive,

    // Introducing characters that did not start a delimiter
    #[token("@")]
    At,
    #[token("{")]
    Brace,
    #[token("\\")]
    Backslash,

    // Text content (catch-all for non-special characters)
    #[regex(r"[^@{\\]+")]
    Text,
}

/// Kinds of template tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    LiteralText,
    SanitizedTagOpen,
    SanitizedTagClose,
    UnsanitizedTagOpen,
    UnsanitizedTagClose,
    /// Body of a tag or the arguments of a directive
    Expression,
    DirectiveName,
    DirectiveArgsStart,
    DirectiveArgsEnd,
    CommentOpen,
    CommentText,
    CommentClose,
    EndOfInput,
}

impl TokenKind {
    pub fn label(&self) -> &'static str {
        match self {
            TokenKind::LiteralText => "literal-text",
            TokenKind::SanitizedTagOpen => "sanitized-tag-open",
            TokenKind::SanitizedTagClose => "sanitized-tag-close",
            TokenKind::UnsanitizedTagOpen => "unsanitized-tag-open",
            TokenKind::UnsanitizedTagClose => "unsanitized-tag-close",
            TokenKind::Expression => "expression",
            TokenKind::DirectiveName => "directive-name",
            TokenKind::DirectiveArgsStart => "directive-args-start",
            TokenKind::DirectiveArgsEnd => "directive-args-end",
            TokenKind::CommentOpen => "comment-open",
            TokenKind::CommentText => "comment-text",
            TokenKind::CommentClose => "comment-close",
            TokenKind::EndOfInput => "end-of-input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.label())
    }
}

/// A template token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw value: literal text (escapes resolved), expression source, directive name
    pub value: String,
    /// Byte range in the template source
    pub span: Range<usize>,
    pub position: Position,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        value: impl Into<String>,
        span: Range<usize>,
        position: Position,
    ) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
            position,
        }
    }

    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}({:?})", self.kind, self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<ScanToken> {
        ScanToken::lexer(source)
            .filter_map(|result| result.ok())
            .collect()
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(scan("{{"), vec![ScanToken::SanitizedOpen]);
        assert_eq!(scan("{{{"), vec![ScanToken::UnsanitizedOpen]);
        assert_eq!(scan("{#"), vec![ScanToken::CommentOpen]);
        assert_eq!(scan("@if"), vec![ScanToken::Directive]);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(scan("@@"), vec![ScanToken::EscapedAt]);
        assert_eq!(scan("\\{{"), vec![ScanToken::EscapedSanitizedOpen]);
        assert_eq!(scan("\\{{{"), vec![ScanToken::EscapedUnsanitizedOpen]);
        assert_eq!(scan("\\{#"), vec![ScanToken::EscapedCommentOpen]);
    }

    #[test]
    fn test_plain_text_and_strays() {
        assert_eq!(
            scan("a { b \\ c @ d"),
            vec![
                ScanToken::Text,
                ScanToken::Brace,
                ScanToken::Text,
                ScanToken::Backslash,
                ScanToken::Text,
                ScanToken::At,
                ScanToken::Text
            ]
        );
    }

    #[test]
    fn test_closing_braces_are_text() {
        assert_eq!(scan("}} #}"), vec![ScanToken::Text]);
    }

    #[test]
    fn test_token_display() {
        let token = Token::new(TokenKind::DirectiveName, "if", 0..3, Position::new(0, 0));
        assert_eq!(token.to_string(), "<directive-name>(\"if\")");

        let end = Token::new(TokenKind::EndOfInput, "", 3..3, Position::new(0, 3));
        assert_eq!(end.to_string(), "<end-of-input>");
        assert!(end.is_end());
    }
}
