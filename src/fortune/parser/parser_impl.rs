//! Recursive-descent parser from template tokens to an [Ast]
//!
//! Leaves (literal text, tags, comments) are appended to the current node. Block
//! directives push a frame onto an explicit stack; continuations move the frame's
//! insertion point to a fresh continuation node; closers pop the frame. Whatever
//! is left on the stack at end of input is an unmatched directive.

use crate::fortune::ast::{Ast, NodeId, NodeKind, Position};
use crate::fortune::lexer::{Token, TokenKind};
use crate::fortune::parser::error::ParseError;
use crate::fortune::parser::syntax::{closer_target, DirectiveSyntax};

/// Parse tokens using the built-in directive syntax
pub fn parse(tokens: &[Token]) -> Result<Ast, ParseError> {
    parse_with_syntax(tokens, &DirectiveSyntax::builtin())
}

/// Parse tokens using an explicit directive syntax
pub fn parse_with_syntax(tokens: &[Token], syntax: &DirectiveSyntax) -> Result<Ast, ParseError> {
    let ast = Parser::new(tokens, syntax).run()?;
    tracing::trace!(nodes = ast.len(), "parsed template");
    Ok(ast)
}

/// An open block directive
#[derive(Debug)]
struct Frame {
    name: String,
    /// Where body nodes go: the directive itself, or its latest continuation
    insertion: NodeId,
    block: NodeId,
    opened_at: Position,
}

struct Parser<'a> {
    tokens: &'a [Token],
    cursor: usize,
    syntax: &'a DirectiveSyntax,
    ast: Ast,
    stack: Vec<Frame>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], syntax: &'a DirectiveSyntax) -> Self {
        Self {
            tokens,
            cursor: 0,
            syntax,
            ast: Ast::new(),
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Ast, ParseError> {
        let end_position = loop {
            let Some(token) = self.advance() else {
                break self.tokens.last().map(|t| t.position).unwrap_or_default();
            };
            match token.kind {
                TokenKind::LiteralText => {
                    let parent = self.insertion_point();
                    self.ast
                        .append(parent, NodeKind::Literal, token.value.as_str(), token.position);
                }
                TokenKind::SanitizedTagOpen => {
                    self.tag(token, NodeKind::SanitizedTag, TokenKind::SanitizedTagClose)?
                }
                TokenKind::UnsanitizedTagOpen => {
                    self.tag(token, NodeKind::UnsanitizedTag, TokenKind::UnsanitizedTagClose)?
                }
                TokenKind::CommentOpen => self.comment(token)?,
                TokenKind::DirectiveName => self.directive(token)?,
                TokenKind::EndOfInput => break token.position,
                other => {
                    return Err(ParseError::UnexpectedToken {
                        expected: TokenKind::LiteralText,
                        found: other,
                        position: token.position,
                    })
                }
            }
        };

        if let Some(frame) = self.stack.pop() {
            return Err(ParseError::UnmatchedDirective {
                name: frame.name,
                opened_at: frame.opened_at,
                position: end_position,
            });
        }

        Ok(self.ast)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.cursor)?;
        self.cursor += 1;
        Some(token)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.cursor).map(|t| t.kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'a Token, ParseError> {
        match self.tokens.get(self.cursor) {
            Some(token) if token.kind == kind => {
                self.cursor += 1;
                Ok(token)
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: kind,
                found: token.kind,
                position: token.position,
            }),
            None => Err(ParseError::UnexpectedToken {
                expected: kind,
                found: TokenKind::EndOfInput,
                position: self.tokens.last().map(|t| t.position).unwrap_or_default(),
            }),
        }
    }

    fn insertion_point(&self) -> NodeId {
        self.stack
            .last()
            .map(|frame| frame.insertion)
            .unwrap_or(NodeId::ROOT)
    }

    fn tag(&mut self, open: &Token, kind: NodeKind, close: TokenKind) -> Result<(), ParseError> {
        let expression = self.expect(TokenKind::Expression)?;
        self.expect(close)?;

        let parent = self.insertion_point();
        let tag = self
            .ast
            .append(parent, kind, expression.value.as_str(), open.position);
        self.ast.append(
            tag,
            NodeKind::Expression,
            expression.value.as_str(),
            expression.position,
        );
        Ok(())
    }

    fn comment(&mut self, open: &Token) -> Result<(), ParseError> {
        let text = self.expect(TokenKind::CommentText)?;
        self.expect(TokenKind::CommentClose)?;

        let parent = self.insertion_point();
        self.ast
            .append(parent, NodeKind::Comment, text.value.as_str(), open.position);
        Ok(())
    }

    /// Optional `(args)` following a directive name
    fn arguments(&mut self) -> Result<Option<&'a Token>, ParseError> {
        if self.peek_kind() != Some(TokenKind::DirectiveArgsStart) {
            return Ok(None);
        }
        self.cursor += 1;
        let expression = self.expect(TokenKind::Expression)?;
        self.expect(TokenKind::DirectiveArgsEnd)?;
        Ok(Some(expression))
    }

    fn directive(&mut self, name_token: &'a Token) -> Result<(), ParseError> {
        let name = name_token.value.as_str();
        let position = name_token.position;
        let arguments = self.arguments()?;

        if let Some(target) = closer_target(name) {
            if arguments.is_some() {
                return Err(ParseError::UnexpectedArguments {
                    name: name.to_string(),
                    position,
                });
            }
            return self.close(name, target, position);
        }

        if self.syntax.is_continuation(name) {
            return self.continuation(name, arguments, position);
        }

        let parent = self.insertion_point();
        let directive = self.build_directive(parent, name, arguments, position);

        let opens_block = match self.syntax.is_block(name) {
            Some(known) => known,
            None => self.closer_ahead(name),
        };
        if opens_block {
            self.stack.push(Frame {
                name: name.to_string(),
                insertion: directive,
                block: directive,
                opened_at: position,
            });
        }
        Ok(())
    }

    fn build_directive(
        &mut self,
        parent: NodeId,
        name: &str,
        arguments: Option<&Token>,
        position: Position,
    ) -> NodeId {
        let directive = self.ast.append(parent, NodeKind::Directive, name, position);
        self.ast
            .append(directive, NodeKind::DirectiveName, name, position);
        if let Some(arguments) = arguments {
            self.ast.append(
                directive,
                NodeKind::Expression,
                arguments.value.as_str(),
                arguments.position,
            );
        }
        directive
    }

    fn continuation(
        &mut self,
        name: &str,
        arguments: Option<&Token>,
        position: Position,
    ) -> Result<(), ParseError> {
        let block = match self.stack.last() {
            Some(frame) if self.syntax.accepts(&frame.name, name) => frame.block,
            _ => {
                return Err(ParseError::UnexpectedContinuation {
                    name: name.to_string(),
                    position,
                })
            }
        };

        let node = self.build_directive(block, name, arguments, position);
        self.ast.mark_continuation(node);
        if let Some(frame) = self.stack.last_mut() {
            frame.insertion = node;
        }
        Ok(())
    }

    fn close(&mut self, name: &str, target: &str, position: Position) -> Result<(), ParseError> {
        match self.stack.last() {
            None => Err(ParseError::UnexpectedClose {
                name: name.to_string(),
                position,
            }),
            Some(frame) if frame.name != target => Err(ParseError::MismatchedClose {
                expected: format!("end{}", frame.name),
                found: name.to_string(),
                position,
            }),
            Some(_) => {
                self.stack.pop();
                Ok(())
            }
        }
    }

    /// Whether a balancing `@end<name>` follows the current position
    fn closer_ahead(&self, name: &str) -> bool {
        let mut depth = 0usize;
        for token in &self.tokens[self.cursor..] {
            if token.kind != TokenKind::DirectiveName {
                continue;
            }
            if token.value == name {
                depth += 1;
            } else if closer_target(&token.value) == Some(name) {
                if depth == 0 {
                    return true;
                }
                depth -= 1;
            }
        }
        false
    }
}
