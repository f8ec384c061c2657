//! Implementation of the template lexer
//!
//! Text mode is handled by the logos scanner. When the scanner hits an opening
//! delimiter the lexer looks ahead in the raw source for the matching close,
//! emits the open/body/close tokens in one go and bumps the scanner past them.
//! Nothing already emitted is ever revisited.

use crate::fortune::ast::{Position, SourceLocation};
use crate::fortune::lexer::error::LexError;
use crate::fortune::lexer::tokens::{ScanToken, Token, TokenKind};
use logos::Logos;
use std::ops::Range;

/// Tokenize a template into template tokens, ending with a single `EndOfInput`
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let tokens = TemplateLexer::new(source).run()?;
    tracing::trace!(tokens = tokens.len(), bytes = source.len(), "lexed template");
    Ok(tokens)
}

/// Single-pass lexer state
pub struct TemplateLexer<'source> {
    source: &'source str,
    scanner: logos::Lexer<'source, ScanToken>,
    locator: SourceLocation,
    tokens: Vec<Token>,
    text: String,
    text_span: Range<usize>,
}

impl<'source> TemplateLexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            scanner: ScanToken::lexer(source),
            locator: SourceLocation::new(source),
            tokens: Vec::new(),
            text: String::new(),
            text_span: 0..0,
        }
    }

    pub fn run(mut self) -> Result<Vec<Token>, LexError> {
        let source = self.source;

        while let Some(result) = self.scanner.next() {
            let span = self.scanner.span();
            match result {
                Ok(ScanToken::SanitizedOpen) => self.tag(
                    span,
                    (TokenKind::SanitizedTagOpen, "{{"),
                    (TokenKind::SanitizedTagClose, "}}"),
                )?,
                Ok(ScanToken::UnsanitizedOpen) => self.tag(
                    span,
                    (TokenKind::UnsanitizedTagOpen, "{{{"),
                    (TokenKind::UnsanitizedTagClose, "}}}"),
                )?,
                Ok(ScanToken::CommentOpen) => self.comment(span)?,
                Ok(ScanToken::EscapedSanitizedOpen) => self.push_text(span, "{{"),
                Ok(ScanToken::EscapedUnsanitizedOpen) => self.push_text(span, "{{{"),
                Ok(ScanToken::EscapedCommentOpen) => self.push_text(span, "{#"),
                Ok(ScanToken::EscapedAt) => self.push_text(span, "@"),
                Ok(ScanToken::Directive) if !self.follows_word(span.start) => {
                    self.directive(span)?
                }
                _ => self.push_text(span.clone(), &source[span]),
            }
        }

        self.flush_text();
        let end = source.len();
        self.emit(TokenKind::EndOfInput, "", end..end);
        Ok(self.tokens)
    }

    fn position(&self, offset: usize) -> Position {
        self.locator.byte_to_position(offset)
    }

    /// `a@b` is an address, not a directive
    fn follows_word(&self, offset: usize) -> bool {
        self.source[..offset]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    fn emit(&mut self, kind: TokenKind, value: &str, span: Range<usize>) {
        let position = self.position(span.start);
        self.tokens.push(Token::new(kind, value, span, position));
    }

    fn push_text(&mut self, span: Range<usize>, text: &str) {
        if self.text.is_empty() {
            self.text_span = span.clone();
        }
        self.text_span.end = span.end;
        self.text.push_str(text);
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        let span = self.text_span.clone();
        self.emit(TokenKind::LiteralText, &text, span);
    }

    fn tag(
        &mut self,
        open_span: Range<usize>,
        (open_kind, open): (TokenKind, &'static str),
        (close_kind, close): (TokenKind, &'static str),
    ) -> Result<(), LexError> {
        self.flush_text();
        let source = self.source;
        let body_start = open_span.end;
        let offset = source[body_start..]
            .find(close)
            .ok_or_else(|| LexError::UnterminatedTag {
                open,
                close,
                position: self.position(open_span.start),
            })?;
        let body_end = body_start + offset;

        self.emit(open_kind, "", open_span);
        self.emit(
            TokenKind::Expression,
            source[body_start..body_end].trim(),
            body_start..body_end,
        );
        self.emit(close_kind, "", body_end..body_end + close.len());
        self.scanner.bump(offset + close.len());
        Ok(())
    }

    fn comment(&mut self, open_span: Range<usize>) -> Result<(), LexError> {
        self.flush_text();
        let source = self.source;
        let body_start = open_span.end;
        let offset =
            source[body_start..]
                .find("#}")
                .ok_or_else(|| LexError::UnterminatedComment {
                    position: self.position(open_span.start),
                })?;
        let body_end = body_start + offset;

        self.emit(TokenKind::CommentOpen, "", open_span);
        self.emit(
            TokenKind::CommentText,
            source[body_start..body_end].trim(),
            body_start..body_end,
        );
        self.emit(TokenKind::CommentClose, "", body_end..body_end + 2);
        self.scanner.bump(offset + 2);
        Ok(())
    }

    fn directive(&mut self, span: Range<usize>) -> Result<(), LexError> {
        self.flush_text();
        let source = self.source;
        let name = &source[span.start + 1..span.end];
        self.emit(TokenKind::DirectiveName, name, span.clone());

        let rest = &source[span.end..];
        if !rest.starts_with('(') {
            return Ok(());
        }

        let close = matching_paren(rest).ok_or_else(|| LexError::UnterminatedArguments {
            directive: name.to_string(),
            position: self.position(span.end),
        })?;
        let args_start = span.end + 1;
        let args_end = span.end + close;

        self.emit(TokenKind::DirectiveArgsStart, "", span.end..args_start);
        self.emit(
            TokenKind::Expression,
            source[args_start..args_end].trim(),
            args_start..args_end,
        );
        self.emit(TokenKind::DirectiveArgsEnd, "", args_end..args_end + 1);
        self.scanner.bump(close + 1);
        Ok(())
    }
}

/// Byte offset of the `)` matching the `(` that starts `text`
///
/// Parentheses inside quoted strings do not count.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("template to lex")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn values(source: &str) -> Vec<String> {
        lex(source)
            .expect("template to lex")
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::EndOfInput]);
    }

    #[test]
    fn test_literal_only() {
        let tokens = lex("Hello, world").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::LiteralText);
        assert_eq!(tokens[0].value, "Hello, world");
        assert_eq!(tokens[0].span, 0..12);
        assert_eq!(tokens[1].span, 12..12);
    }

    #[test]
    fn test_sanitized_tag() {
        assert_eq!(
            kinds("Hello {{ name }}!"),
            vec![
                TokenKind::LiteralText,
                TokenKind::SanitizedTagOpen,
                TokenKind::Expression,
                TokenKind::SanitizedTagClose,
                TokenKind::LiteralText,
                TokenKind::EndOfInput
            ]
        );
        assert_eq!(values("Hello {{ name }}!")[2], "name");
    }

    #[test]
    fn test_unsanitized_tag() {
        assert_eq!(
            kinds("{{{ raw }}}"),
            vec![
                TokenKind::UnsanitizedTagOpen,
                TokenKind::Expression,
                TokenKind::UnsanitizedTagClose,
                TokenKind::EndOfInput
            ]
        );
        assert_eq!(values("{{{ raw }}}")[1], "raw");
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            kinds("{# note #}Visible"),
            vec![
                TokenKind::CommentOpen,
                TokenKind::CommentText,
                TokenKind::CommentClose,
                TokenKind::LiteralText,
                TokenKind::EndOfInput
            ]
        );
        assert_eq!(values("{# note #}Visible")[1], "note");
    }

    #[test]
    fn test_directive_with_arguments() {
        let tokens = lex("@if(a == (b))x").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::DirectiveName,
                TokenKind::DirectiveArgsStart,
                TokenKind::Expression,
                TokenKind::DirectiveArgsEnd,
                TokenKind::LiteralText,
                TokenKind::EndOfInput
            ]
        );
        assert_eq!(tokens[0].value, "if");
        assert_eq!(tokens[2].value, "a == (b)");
        assert_eq!(tokens[4].value, "x");
    }

    #[test]
    fn test_directive_without_arguments() {
        let tokens = lex("@else B @endif").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::DirectiveName);
        assert_eq!(tokens[0].value, "else");
        assert_eq!(tokens[1].value, " B ");
        assert_eq!(tokens[2].value, "endif");
    }

    #[test]
    fn test_parenthesis_inside_string_argument() {
        let tokens = lex("@include(\"a)b\")").unwrap();
        assert_eq!(tokens[2].value, "\"a)b\"");
        assert_eq!(tokens[3].kind, TokenKind::DirectiveArgsEnd);
    }

    #[test]
    fn test_escaped_at() {
        let tokens = lex("mail @@home").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].value, "mail @home");
    }

    #[test]
    fn test_at_inside_word_is_literal() {
        let tokens = lex("user@example.com").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::LiteralText);
        assert_eq!(tokens[0].value, "user@example.com");
    }

    #[test]
    fn test_lone_at_is_literal() {
        assert_eq!(values("a @ b"), vec!["a @ b".to_string(), String::new()]);
    }

    #[test]
    fn test_escaped_tags_are_literal() {
        let tokens = lex("\\{{ name }} and \\{{{ raw }}} and \\{# c #}").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].value, "{{ name }} and {{{ raw }}} and {# c #}");
    }

    #[test]
    fn test_unterminated_tag() {
        let err = lex("Hello {{ name").unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedTag {
                open: "{{",
                close: "}}",
                position: Position::new(0, 6)
            }
        );
    }

    #[test]
    fn test_unterminated_unsanitized_tag() {
        let err = lex("{{{ raw }}").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedTag { open: "{{{", .. }));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = lex("a\n{# note").unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedComment {
                position: Position::new(1, 0)
            }
        );
    }

    #[test]
    fn test_unterminated_arguments() {
        let err = lex("@if(a").unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedArguments {
                directive: "if".to_string(),
                position: Position::new(0, 3)
            }
        );
    }

    #[test]
    fn test_positions() {
        let tokens = lex("line one\n  {{ x }}").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::SanitizedTagOpen);
        assert_eq!(tokens[1].position, Position::new(1, 2));
        assert_eq!(tokens[2].position, Position::new(1, 4));
    }

    #[test]
    fn test_matching_paren() {
        assert_eq!(matching_paren("()"), Some(1));
        assert_eq!(matching_paren("(a(b)c)d"), Some(6));
        assert_eq!(matching_paren("('(')"), Some(4));
        assert_eq!(matching_paren("(\"\\\")\")"), Some(6));
        assert_eq!(matching_paren("(("), None);
    }
}
