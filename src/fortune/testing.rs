//! Testing utilities: a reference renderer for compiled templates
//!
//! Compiled output is meant for an external runtime. Tests still need to check
//! what a compiled template *does*, so this module interprets the compiled form
//! against JSON variables. It understands exactly the statements the built-in
//! directives emit and nothing more.
//!
//! ```rust,ignore
//! use fortune::fortune::testing::render_template;
//! use serde_json::json;
//!
//! let html = render_template("{{ name }}", [("name", json!("<b>"))]).unwrap();
//! assert_eq!(html, "&lt;b&gt;");
//! ```
//!
//! Value rules:
//! - Missing variables, members and indexes are `null`
//! - `null`, `false`, `0`, `""`, `[]` and `{}` are falsy
//! - Output of `null` is empty; other scalars print as usual, arrays and objects as JSON

use crate::fortune::compiler::{Compiler, EscapeContext, TemplateError};
use crate::fortune::expression::{parse_expression, BinaryOp, Expr, Literal, UnaryOp};
use crate::fortune::view::View;
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::fmt;

const MAX_INCLUDE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Compiled text that is not well formed
    Syntax(String),
    /// An expression that cannot be evaluated with the given values
    Eval(String),
    MissingPartial(String),
    Template(TemplateError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Syntax(msg) => write!(f, "Malformed compiled template: {}", msg),
            RenderError::Eval(msg) => write!(f, "Evaluation error: {}", msg),
            RenderError::MissingPartial(name) => write!(f, "No partial named '{}'", name),
            RenderError::Template(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<TemplateError> for RenderError {
    fn from(err: TemplateError) -> Self {
        RenderError::Template(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Instr {
    Text(String),
    Output {
        expr: Expr,
        escape: Option<EscapeContext>,
    },
    If {
        branches: Vec<(Option<Expr>, Vec<Instr>)>,
    },
    For {
        key: Option<String>,
        item: String,
        collection: Expr,
        body: Vec<Instr>,
    },
    Include(Expr),
}

enum OpenKind {
    If {
        done: Vec<(Option<Expr>, Vec<Instr>)>,
        condition: Option<Expr>,
    },
    For {
        key: Option<String>,
        item: String,
        collection: Expr,
    },
}

struct Open {
    kind: OpenKind,
    outer: Vec<Instr>,
}

fn expr(source: &str) -> Result<Expr, RenderError> {
    parse_expression(source).map_err(|e| RenderError::Syntax(format!("'{}': {}", source, e)))
}

fn parse_output(content: &str) -> Result<Instr, RenderError> {
    if let Some((name, rest)) = content.split_once('(') {
        if let (Some(escape), Some(inner)) = (
            EscapeContext::from_function_name(name.trim()),
            rest.strip_suffix(')'),
        ) {
            return Ok(Instr::Output {
                expr: expr(inner)?,
                escape: Some(escape),
            });
        }
    }
    Ok(Instr::Output {
        expr: expr(content)?,
        escape: None,
    })
}

fn parse_program(compiled: &str) -> Result<Vec<Instr>, RenderError> {
    let mut stack: Vec<Open> = Vec::new();
    let mut current: Vec<Instr> = Vec::new();
    let mut rest = compiled;

    while let Some(start) = rest.find("<%") {
        if start > 0 {
            current.push(Instr::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = after
            .find("%>")
            .ok_or_else(|| RenderError::Syntax("unterminated '<%'".to_string()))?;
        let inner = &after[..end];
        rest = &after[end + 2..];

        match inner.strip_prefix('=') {
            Some(output) => current.push(parse_output(output.trim())?),
            None => statement(inner.trim(), &mut stack, &mut current)?,
        }
    }
    if !rest.is_empty() {
        current.push(Instr::Text(rest.to_string()));
    }
    if !stack.is_empty() {
        return Err(RenderError::Syntax("unclosed block".to_string()));
    }
    Ok(current)
}

fn statement(
    stmt: &str,
    stack: &mut Vec<Open>,
    current: &mut Vec<Instr>,
) -> Result<(), RenderError> {
    if stmt == "}" {
        let open = stack
            .pop()
            .ok_or_else(|| RenderError::Syntax("'}' without open block".to_string()))?;
        let body = std::mem::replace(current, open.outer);
        let instr = match open.kind {
            OpenKind::If {
                mut done,
                condition,
            } => {
                done.push((condition, body));
                Instr::If { branches: done }
            }
            OpenKind::For {
                key,
                item,
                collection,
            } => Instr::For {
                key,
                item,
                collection,
                body,
            },
        };
        current.push(instr);
        return Ok(());
    }

    if stmt == "} else {" || stmt.starts_with("} elseif ") {
        let condition = match stmt.strip_prefix("} elseif ") {
            Some(rest) => Some(expr(rest.strip_suffix('{').unwrap_or(rest))?),
            None => None,
        };
        return match stack.last_mut() {
            Some(Open {
                kind: OpenKind::If { done, condition: pending },
                ..
            }) => {
                done.push((pending.take(), std::mem::take(current)));
                *pending = condition;
                Ok(())
            }
            _ => Err(RenderError::Syntax(format!("'{}' outside if", stmt))),
        };
    }

    if let Some(rest) = stmt.strip_prefix("if ") {
        let condition = expr(rest.strip_suffix('{').unwrap_or(rest))?;
        stack.push(Open {
            kind: OpenKind::If {
                done: Vec::new(),
                condition: Some(condition),
            },
            outer: std::mem::take(current),
        });
        return Ok(());
    }

    if let Some(rest) = stmt.strip_prefix("for ") {
        let rest = rest.strip_suffix('{').unwrap_or(rest);
        let (head, collection) = rest
            .split_once(" in ")
            .ok_or_else(|| RenderError::Syntax(format!("bad loop '{}'", stmt)))?;
        let (key, item) = match head.split_once(',') {
            Some((key, item)) => (Some(key.trim().to_string()), item.trim().to_string()),
            None => (None, head.trim().to_string()),
        };
        stack.push(Open {
            kind: OpenKind::For {
                key,
                item,
                collection: expr(collection)?,
            },
            outer: std::mem::take(current),
        });
        return Ok(());
    }

    if let Some(rest) = stmt.strip_prefix("include ") {
        current.push(Instr::Include(expr(rest)?));
        return Ok(());
    }

    Err(RenderError::Syntax(format!("unknown statement '{}'", stmt)))
}

/// Whether a value counts as true in conditions
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Text written for a value by an output block
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct Scope<'a> {
    globals: &'a HashMap<String, Value>,
    locals: Vec<(String, Value)>,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Value {
        self.locals
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, value)| value.clone())
            .or_else(|| self.globals.get(name).cloned())
            .unwrap_or(Value::Null)
    }
}

fn literal(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::from(*i),
        Literal::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Literal::Str(s) => Value::String(s.clone()),
    }
}

fn float(value: f64) -> Result<Value, RenderError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| RenderError::Eval("result is not a finite number".to_string()))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RenderError> {
    if op == BinaryOp::Add {
        if let (Value::String(_), _) | (_, Value::String(_)) = (left, right) {
            return Ok(Value::String(format!("{}{}", stringify(left), stringify(right))));
        }
    }
    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(RenderError::Eval(format!(
            "'{}' needs numbers, got {} and {}",
            op.symbol(),
            left,
            right
        )));
    };

    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div if b == 0 => return Err(RenderError::Eval("division by zero".to_string())),
            BinaryOp::Div if a % b != 0 => return float(a as f64 / b as f64),
            BinaryOp::Div => a.checked_div(b),
            BinaryOp::Rem if b == 0 => return Err(RenderError::Eval("division by zero".to_string())),
            BinaryOp::Rem => a.checked_rem(b),
            _ => None,
        };
        return result
            .map(Value::from)
            .ok_or_else(|| RenderError::Eval("integer overflow".to_string()));
    }

    let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
    match op {
        BinaryOp::Add => float(a + b),
        BinaryOp::Sub => float(a - b),
        BinaryOp::Mul => float(a * b),
        BinaryOp::Div => float(a / b),
        BinaryOp::Rem => float(a % b),
        _ => Err(RenderError::Eval(format!("'{}' is not arithmetic", op.symbol()))),
    }
}

fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RenderError> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64().partial_cmp(&b.as_f64()),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
    .ok_or_else(|| RenderError::Eval(format!("cannot compare {} and {}", left, right)))?;

    Ok(Value::Bool(match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    }))
}

fn evaluate(expr: &Expr, scope: &Scope<'_>) -> Result<Value, RenderError> {
    match expr {
        Expr::Literal(lit) => Ok(literal(lit)),
        Expr::Ident(name) => Ok(scope.lookup(name)),
        Expr::Array(items) => items
            .iter()
            .map(|item| evaluate(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Member(target, name) => Ok(evaluate(target, scope)?
            .get(name)
            .cloned()
            .unwrap_or(Value::Null)),
        Expr::Index(target, index) => {
            let target = evaluate(target, scope)?;
            let index = evaluate(index, scope)?;
            let found = match &index {
                Value::Number(n) => n.as_u64().and_then(|i| target.get(i as usize)),
                Value::String(key) => target.get(key.as_str()),
                _ => None,
            };
            Ok(found.cloned().unwrap_or(Value::Null))
        }
        Expr::Unary(UnaryOp::Not, operand) => Ok(Value::Bool(!truthy(&evaluate(operand, scope)?))),
        Expr::Unary(UnaryOp::Neg, operand) => match evaluate(operand, scope)? {
            Value::Number(n) => match n.as_i64() {
                Some(i) => i
                    .checked_neg()
                    .map(Value::from)
                    .ok_or_else(|| RenderError::Eval("integer overflow".to_string())),
                None => float(-n.as_f64().unwrap_or(f64::NAN)),
            },
            other => Err(RenderError::Eval(format!("cannot negate {}", other))),
        },
        Expr::Binary(left, op, right) => {
            let left = evaluate(left, scope)?;
            match op {
                BinaryOp::And if !truthy(&left) => return Ok(Value::Bool(false)),
                BinaryOp::Or if truthy(&left) => return Ok(Value::Bool(true)),
                _ => {}
            }
            let right = evaluate(right, scope)?;
            match op {
                BinaryOp::And | BinaryOp::Or => Ok(Value::Bool(truthy(&right))),
                BinaryOp::Eq => Ok(Value::Bool(equal(&left, &right))),
                BinaryOp::NotEq => Ok(Value::Bool(!equal(&left, &right))),
                BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                    compare(*op, &left, &right)
                }
                _ => arithmetic(*op, &left, &right),
            }
        }
    }
}

fn entries(collection: Value) -> Result<Vec<(Value, Value)>, RenderError> {
    match collection {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (Value::from(i), item))
            .collect()),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, item)| (Value::String(key), item))
            .collect()),
        other => Err(RenderError::Eval(format!("cannot iterate over {}", other))),
    }
}

/// Interprets compiled templates, resolving `include` against registered partials
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    partials: HashMap<String, String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a compiled template available to `include`
    pub fn with_partial(mut self, name: impl Into<String>, compiled: impl Into<String>) -> Self {
        self.partials.insert(name.into(), compiled.into());
        self
    }

    pub fn render(
        &self,
        compiled: &str,
        vars: &HashMap<String, Value>,
    ) -> Result<String, RenderError> {
        let mut scope = Scope {
            globals: vars,
            locals: Vec::new(),
        };
        let mut out = String::new();
        self.render_into(compiled, &mut scope, &mut out, 0)?;
        Ok(out)
    }

    fn render_into(
        &self,
        compiled: &str,
        scope: &mut Scope<'_>,
        out: &mut String,
        depth: usize,
    ) -> Result<(), RenderError> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(RenderError::Eval("includes nested too deeply".to_string()));
        }
        let program = parse_program(compiled)?;
        self.run(&program, scope, out, depth)
    }

    fn run(
        &self,
        program: &[Instr],
        scope: &mut Scope<'_>,
        out: &mut String,
        depth: usize,
    ) -> Result<(), RenderError> {
        for instr in program {
            match instr {
                Instr::Text(text) => out.push_str(text),
                Instr::Output { expr, escape } => {
                    let text = stringify(&evaluate(expr, scope)?);
                    match escape {
                        Some(context) => out.push_str(&context.escape(&text)),
                        None => out.push_str(&text),
                    }
                }
                Instr::If { branches } => {
                    for (condition, body) in branches {
                        let taken = match condition {
                            Some(condition) => truthy(&evaluate(condition, scope)?),
                            None => true,
                        };
                        if taken {
                            self.run(body, scope, out, depth)?;
                            break;
                        }
                    }
                }
                Instr::For {
                    key,
                    item,
                    collection,
                    body,
                } => {
                    for (k, v) in entries(evaluate(collection, scope)?)? {
                        let mark = scope.locals.len();
                        if let Some(key) = key {
                            scope.locals.push((key.clone(), k));
                        }
                        scope.locals.push((item.clone(), v));
                        let result = self.run(body, scope, out, depth);
                        scope.locals.truncate(mark);
                        result?;
                    }
                }
                Instr::Include(target) => {
                    let name = stringify(&evaluate(target, scope)?);
                    let partial = self
                        .partials
                        .get(&name)
                        .ok_or_else(|| RenderError::MissingPartial(name.clone()))?;
                    self.render_into(partial, scope, out, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

/// Render compiled output with no partials
pub fn render(compiled: &str, vars: &HashMap<String, Value>) -> Result<String, RenderError> {
    Renderer::new().render(compiled, vars)
}

/// Compile a view with `compiler` and render it with the view's variables
pub fn render_view(compiler: &Compiler, view: &View) -> Result<String, RenderError> {
    let compiled = compiler.compile_view(view)?;
    render(&compiled, view.vars())
}

/// Compile with the default compiler and render with the given variables
pub fn render_template<I, K>(template: &str, vars: I) -> Result<String, RenderError>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    let mut view = View::new(template);
    view.set_vars(vars);
    render_view(&Compiler::default(), &view)
}

/// A JSON object as a variable map
pub fn vars_from_json(value: Value) -> HashMap<String, Value> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}
