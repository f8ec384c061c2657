//! Behavioural properties of compiled templates
//!
//! Templates are compiled with the default registry and rendered with the
//! reference renderer from `fortune::testing`, so each case checks what the
//! output does rather than how it is spelled.

use fortune::fortune::ast::{NodeId, NodeKind, Position};
use fortune::fortune::compiler::{Compiler, CompileError, TemplateError};
use fortune::fortune::lexer::lex;
use fortune::fortune::parser::{parse, ParseError};
use fortune::fortune::testing::{render_template, RenderError};
use rstest::rstest;
use serde_json::{json, Value};

fn render(template: &str, vars: Value) -> Result<String, RenderError> {
    let pairs = match vars {
        Value::Object(map) => map.into_iter().collect::<Vec<_>>(),
        _ => Vec::new(),
    };
    render_template(template, pairs)
}

#[rstest]
#[case::sanitized_round_trip("Hello {{ name }}!", json!({"name": "<script>"}), "Hello &lt;script&gt;!")]
#[case::unsanitized_passthrough("{{{ raw }}}", json!({"raw": "<b>x</b>"}), "<b>x</b>")]
#[case::comment_elision("{# note #}Visible", json!({}), "Visible")]
#[case::branch_taken("@if(cond) A @else B @endif", json!({"cond": true}), " A ")]
#[case::branch_not_taken("@if(cond) A @else B @endif", json!({"cond": false}), " B ")]
#[case::missing_is_falsy("@if(cond) A @else B @endif", json!({}), " B ")]
#[case::iteration("@foreach(items as item) {{ item }} @endforeach", json!({"items": [1, 2, 3]}), " 1  2  3 ")]
#[case::keyed_iteration(
    "@foreach(prices as fruit => price){{ fruit }}={{ price }};@endforeach",
    json!({"prices": {"apple": 2, "pear": 3}}),
    "apple=2;pear=3;"
)]
#[case::elseif_chain(
    "@if(n > 10) big @elseif(n > 0) small @else none @endif",
    json!({"n": 4}),
    " small "
)]
#[case::unless("@unless(admin) guest @endunless", json!({"admin": false}), " guest ")]
#[case::block_terminator_in_tag("{{ 'a%>b' }}", json!({}), "a%&gt;b")]
#[case::block_terminator_in_directive("@if(x == '%>') yes @endif", json!({"x": "%>"}), " yes ")]
#[case::block_opener_from_expression("{{{ '<' }}}% off", json!({}), "<% off")]
#[case::escaped_at("mail me @@ home", json!({}), "mail me @ home")]
#[case::nested(
    "@foreach(users as u)@if(u.active){{ u.name }},@endif @endforeach",
    json!({"users": [{"name": "Ada", "active": true}, {"name": "Bob", "active": false}]}),
    "Ada,  "
)]
fn rendered_output(#[case] template: &str, #[case] vars: Value, #[case] expected: &str) {
    assert_eq!(render(template, vars).unwrap(), expected);
}

#[rstest]
#[case("plain text")]
#[case("{{ a }}{{{ b }}}{# c #}")]
#[case("@if(a) @foreach(xs as x) @if(x) deep @endif @endforeach @endif")]
#[case(" @unless(a) x @else y @endunless ")]
fn root_is_its_own_parent(#[case] template: &str) {
    let ast = parse(&lex(template).unwrap()).unwrap();
    assert_eq!(ast.parent(NodeId::ROOT), NodeId::ROOT);
    assert_eq!(ast.kind(ast.root()), NodeKind::Root);

    for id in ast.descendants(ast.root()) {
        let last = ast.ancestors(id).last();
        assert_eq!(last, Some(NodeId::ROOT), "node {:?} does not reach the root", id);
        assert_eq!(ast.parent(ast.root()), ast.root());
    }
}

#[test]
fn string_literals_never_close_a_compiled_block() {
    let compiled = Compiler::default().compile("{{{ '%>' }}}@include('a%>b')").unwrap();
    assert_eq!(
        compiled,
        "<%= \"%\\u003E\" %><% include \"a%\\u003Eb\" %>"
    );
}

#[test]
fn unknown_directive_is_a_compile_error() {
    let err = Compiler::default().compile("@bogus(x) @endbogus").unwrap_err();
    match err {
        TemplateError::Compile(CompileError::UnknownDirective { name, .. }) => {
            assert_eq!(name, "bogus")
        }
        other => panic!("expected an unknown directive error, got {:?}", other),
    }
}

#[test]
fn unmatched_if_is_a_parse_error_at_end_of_input() {
    let err = Compiler::default().compile("@if(x) no endif").unwrap_err();
    assert_eq!(
        err,
        TemplateError::Parse(ParseError::UnmatchedDirective {
            name: "if".to_string(),
            opened_at: Position::new(0, 0),
            position: Position::new(0, 15),
        })
    );
    assert_eq!(err.position(), Position::new(0, 15));
}

#[rstest]
#[case("Hello {{ name }}!")]
#[case("@if(a) A @elseif(b) B @else C @endif")]
#[case("@foreach(xs as k => v){{ k }}{{{ v }}}@endforeach")]
fn compiling_twice_gives_identical_output(#[case] template: &str) {
    let compiler = Compiler::default();
    let first = compiler.compile(template).unwrap();
    let second = compiler.compile(template).unwrap();
    assert_eq!(first, second);
}

#[test]
fn custom_directives_render_through_the_same_pipeline() {
    use fortune::fortune::compiler::Invocation;
    use fortune::fortune::testing::Renderer;
    use std::collections::HashMap;

    let mut compiler = Compiler::default();
    compiler
        .registry_mut()
        .register(
            "shout",
            |invocation: &Invocation<'_>| -> Result<String, CompileError> {
                let expr = invocation.expression()?;
                Ok(format!(
                    "<%= {}({} + \"!\") %>",
                    invocation.escape.function_name(),
                    expr
                ))
            },
        )
        .unwrap();

    let compiled = compiler.compile("@shout(word)").unwrap();
    let vars: HashMap<String, Value> = [("word".to_string(), json!("hi<"))].into_iter().collect();
    assert_eq!(Renderer::new().render(&compiled, &vars).unwrap(), "hi&lt;!");
}
