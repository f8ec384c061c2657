//! AST to compiled output
//!
//! The compiler walks the tree depth first and writes each node's output into one
//! buffer. Literal text is copied, comments vanish, tags become output blocks and
//! directives are handed to their registered transformer after their bodies have
//! been compiled. The first error stops the walk; no partial output is returned.

use crate::fortune::ast::{Ast, NodeId, NodeKind};
use crate::fortune::compiler::error::{CompileError, TemplateError};
use crate::fortune::compiler::escape::EscapeContext;
use crate::fortune::compiler::registry::{Branch, DirectiveRegistry, Invocation};
use crate::fortune::config::CompilerConfig;
use crate::fortune::expression::{parse_expression, Expr};
use crate::fortune::lexer::lex;
use crate::fortune::parser::parse_with_syntax;
use crate::fortune::view::View;

/// Options that change compiled output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompilerOptions {
    /// Escape function used for `{{ }}` tags
    pub escape: EscapeContext,
}

/// Compiles templates using a directive registry
pub struct Compiler {
    registry: DirectiveRegistry,
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(registry: DirectiveRegistry) -> Self {
        Self::with_options(registry, CompilerOptions::default())
    }

    pub fn with_options(registry: DirectiveRegistry, options: CompilerOptions) -> Self {
        Self { registry, options }
    }

    /// Build a compiler as described by configuration
    pub fn from_config(config: &CompilerConfig) -> Self {
        let registry = if config.builtins {
            DirectiveRegistry::with_builtins()
        } else {
            DirectiveRegistry::new()
        };
        Self::with_options(
            registry,
            CompilerOptions {
                escape: config.escape,
            },
        )
    }

    pub fn registry(&self) -> &DirectiveRegistry {
        &self.registry
    }

    /// Mutable access for registering directives during setup
    pub fn registry_mut(&mut self) -> &mut DirectiveRegistry {
        &mut self.registry
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Lex, parse and compile template text
    pub fn compile(&self, template: &str) -> Result<String, TemplateError> {
        let tokens = lex(template)?;
        let ast = parse_with_syntax(&tokens, &self.registry.syntax())?;
        Ok(self.compile_ast(&ast)?)
    }

    /// Compile the contents of a view
    pub fn compile_view(&self, view: &View) -> Result<String, TemplateError> {
        self.compile(view.contents())
    }

    /// Compile an already parsed template
    pub fn compile_ast(&self, ast: &Ast) -> Result<String, CompileError> {
        let mut out = String::new();
        self.compile_node(ast, ast.root(), &mut out)?;
        tracing::debug!(
            nodes = ast.len(),
            directives = ast.count_kind(NodeKind::Directive),
            bytes = out.len(),
            "compiled template"
        );
        Ok(out)
    }

    fn compile_node(&self, ast: &Ast, id: NodeId, out: &mut String) -> Result<(), CompileError> {
        match ast.kind(id) {
            NodeKind::Root => {
                for child in ast.children(id) {
                    self.compile_node(ast, *child, out)?;
                }
            }
            NodeKind::Literal => out.push_str(ast.value(id)),
            NodeKind::SanitizedTag => {
                let expression = self.tag_expression(ast, id)?;
                out.push_str(&format!(
                    "<%= {}({}) %>",
                    self.options.escape.function_name(),
                    expression
                ));
            }
            NodeKind::UnsanitizedTag => {
                let expression = self.tag_expression(ast, id)?;
                out.push_str(&format!("<%= {} %>", expression));
            }
            NodeKind::Directive => self.compile_directive(ast, id, out)?,
            // Comments produce nothing; names and expressions are read by their parent
            NodeKind::Comment | NodeKind::DirectiveName | NodeKind::Expression => {}
        }
        Ok(())
    }

    fn tag_expression(&self, ast: &Ast, id: NodeId) -> Result<Expr, CompileError> {
        let source = ast.tag_expression(id).unwrap_or_else(|| ast.value(id));
        parse_expression(source).map_err(|e| CompileError::InvalidExpression {
            expression: source.trim().to_string(),
            message: e.to_string(),
            position: ast.node(id).position(),
        })
    }

    fn compile_body(&self, ast: &Ast, id: NodeId) -> Result<String, CompileError> {
        let mut body = String::new();
        for child in ast.directive_body(id) {
            self.compile_node(ast, child, &mut body)?;
        }
        Ok(body)
    }

    fn compile_directive(&self, ast: &Ast, id: NodeId, out: &mut String) -> Result<(), CompileError> {
        let node = ast.node(id);
        let unknown = |name: &str| CompileError::UnknownDirective {
            name: name.to_string(),
            position: node.position(),
        };
        // Dispatch on the DirectiveName leaf, not the directive's own value
        let name = ast.directive_name(id).ok_or_else(|| unknown(node.value()))?;
        let transformer = self.registry.resolve(name).ok_or_else(|| unknown(name))?;

        let body = self.compile_body(ast, id)?;
        let branches = ast
            .continuations(id)
            .into_iter()
            .map(|branch| {
                Ok(Branch {
                    name: ast.directive_name(branch).unwrap_or_else(|| ast.value(branch)),
                    arguments: ast.directive_arguments(branch),
                    body: self.compile_body(ast, branch)?,
                    position: ast.node(branch).position(),
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        let invocation = Invocation {
            name,
            arguments: ast.directive_arguments(id),
            body,
            branches,
            position: node.position(),
            escape: self.options.escape,
        };
        tracing::trace!(directive = name, branches = invocation.branches.len(), "transforming directive");
        out.push_str(&transformer.transform(&invocation)?);
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(DirectiveRegistry::with_builtins())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fortune::ast::Position;
    use crate::fortune::compiler::registry::Block;
    use crate::fortune::lexer::lex;
    use crate::fortune::parser::parse;

    fn compile(template: &str) -> Result<String, TemplateError> {
        Compiler::default().compile(template)
    }

    #[test]
    fn test_literal_passthrough() {
        assert_eq!(compile("Hello, world").unwrap(), "Hello, world");
        assert_eq!(compile("").unwrap(), "");
    }

    #[test]
    fn test_literal_block_opener_passes_through() {
        assert_eq!(compile("50 <% off").unwrap(), "50 <% off");
        assert_eq!(compile("{{{ '<' }}}% off").unwrap(), "<%= \"<\" %>% off");
    }

    #[test]
    fn test_tags() {
        assert_eq!(
            compile("Hi {{ user.name }}!").unwrap(),
            "Hi <%= escape_html(user.name) %>!"
        );
        assert_eq!(compile("{{{ raw }}}").unwrap(), "<%= raw %>");
        assert_eq!(compile("{{a+b*2}}").unwrap(), "<%= escape_html(a + b * 2) %>");
    }

    #[test]
    fn test_comment_elided() {
        assert_eq!(compile("a{# hidden #}b").unwrap(), "ab");
    }

    #[test]
    fn test_escape_context_option() {
        let compiler = Compiler::with_options(
            DirectiveRegistry::with_builtins(),
            CompilerOptions {
                escape: EscapeContext::Url,
            },
        );
        assert_eq!(compiler.compile("{{ q }}").unwrap(), "<%= escape_url(q) %>");
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            compile("@if(cond) A @else B @endif").unwrap(),
            "<% if cond { %> A <% } else { %> B <% } %>"
        );
    }

    #[test]
    fn test_nested_directives() {
        assert_eq!(
            compile("@foreach(xs as x)@if(x > 1){{ x }}@endif @endforeach").unwrap(),
            "<% for x in xs { %><% if x > 1 { %><%= escape_html(x) %><% } %> <% } %>"
        );
    }

    #[test]
    fn test_unknown_directive() {
        let err = compile("@bogus(x) @endbogus").unwrap_err();
        assert_eq!(
            err,
            TemplateError::Compile(CompileError::UnknownDirective {
                name: "bogus".to_string(),
                position: Position::new(0, 0),
            })
        );
    }

    #[test]
    fn test_invalid_tag_expression() {
        let err = compile("line\n  {{ a + }}").unwrap_err();
        match err {
            TemplateError::Compile(CompileError::InvalidExpression {
                expression,
                position,
                ..
            }) => {
                assert_eq!(expression, "a +");
                assert_eq!(position, Position::new(1, 2));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_errors_are_wrapped() {
        assert!(matches!(compile("{{ open"), Err(TemplateError::Lex(_))));
        assert!(matches!(compile("@if(x) no endif"), Err(TemplateError::Parse(_))));
    }

    #[test]
    fn test_custom_inline_directive() {
        let mut compiler = Compiler::default();
        compiler
            .registry_mut()
            .register("csrf", |_: &Invocation<'_>| {
                Ok::<_, CompileError>("<input type=\"hidden\" name=\"_token\">".to_string())
            })
            .unwrap();
        assert_eq!(
            compiler.compile("<form>@csrf</form>").unwrap(),
            "<form><input type=\"hidden\" name=\"_token\"></form>"
        );
    }

    #[test]
    fn test_custom_block_directive_sees_compiled_body() {
        fn section(invocation: &Invocation<'_>) -> Result<String, CompileError> {
            let name = invocation.expression()?;
            Ok(format!("<% section {} %>{}<% endsection %>", name, invocation.body))
        }

        let mut compiler = Compiler::default();
        compiler
            .registry_mut()
            .register("section", Block::new(section))
            .unwrap();
        assert_eq!(
            compiler.compile("@section('main'){{ x }}@endsection").unwrap(),
            "<% section \"main\" %><%= escape_html(x) %><% endsection %>"
        );
    }

    #[test]
    fn test_compile_ast_directly() {
        let ast = parse(&lex("a{{ b }}").unwrap()).unwrap();
        let compiler = Compiler::default();
        assert_eq!(compiler.compile_ast(&ast).unwrap(), "a<%= escape_html(b) %>");
    }

    #[test]
    fn test_dispatch_uses_directive_name_leaf() {
        let mut ast = Ast::new();
        let at = Position::new(0, 0);
        let directive = ast.append(ast.root(), NodeKind::Directive, "bogus", at);
        ast.append(directive, NodeKind::DirectiveName, "include", at);
        ast.append(directive, NodeKind::Expression, "'nav'", at);

        let compiler = Compiler::default();
        assert_eq!(compiler.compile_ast(&ast).unwrap(), "<% include \"nav\" %>");
    }

    #[test]
    fn test_directive_without_name_leaf() {
        let mut ast = Ast::new();
        let directive = ast.append(ast.root(), NodeKind::Directive, "include", Position::new(2, 4));
        ast.append(directive, NodeKind::Expression, "'nav'", Position::new(2, 13));

        assert_eq!(
            Compiler::default().compile_ast(&ast),
            Err(CompileError::UnknownDirective {
                name: "include".to_string(),
                position: Position::new(2, 4),
            })
        );
    }

    #[test]
    fn test_empty_registry_rejects_builtin_names() {
        let compiler = Compiler::new(DirectiveRegistry::new());
        let err = compiler.compile("@include('x')").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::Compile(CompileError::UnknownDirective { ref name, .. }) if name == "include"
        ));
    }
}
