//! Expression evaluator
//!
//! Evaluates parsed actions against a JSON data context.

use serde_json::Value;

use super::ast::{Expr, Spanned};
use super::functions::FunctionTable;
use crate::error::EvalError;

/// Evaluates expressions with a data context and two function layers
pub struct Evaluator<'a> {
    root: &'a Value,
    global: &'a FunctionTable,
    local: &'a FunctionTable,
}

impl<'a> Evaluator<'a> {
    /// `root` is what `$` refers to; `local` functions shadow `global` ones
    pub fn new(root: &'a Value, global: &'a FunctionTable, local: &'a FunctionTable) -> Self {
        Self {
            root,
            global,
            local,
        }
    }

    /// Evaluate an expression with `.` bound to `dot`
    pub fn eval(&self, expr: &Spanned<Expr>, dot: &Value) -> Result<Value, EvalError> {
        match &expr.node {
            Expr::Field(path) => lookup(dot, path).cloned(),
            Expr::Root(path) => lookup(self.root, path).cloned(),
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Call { name, args } => {
                let f = self
                    .local
                    .get(name)
                    .or_else(|| self.global.get(name))
                    .ok_or_else(|| EvalError::UnknownFunction { name: name.clone() })?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, dot))
                    .collect::<Result<Vec<_>, _>>()?;
                f(&args).map_err(|source| EvalError::Function {
                    name: name.clone(),
                    source,
                })
            }
        }
    }

    pub fn root(&self) -> &'a Value {
        self.root
    }
}

/// Walk a field path
///
/// Object segments are keys; array segments are decimal positions.
fn lookup<'v>(start: &'v Value, path: &[String]) -> Result<&'v Value, EvalError> {
    let mut current = start;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            other => {
                return Err(EvalError::NotAContainer {
                    field: segment.clone(),
                    found: type_name(other),
                })
            }
        }
        .ok_or_else(|| EvalError::MissingField {
            field: segment.clone(),
        })?;
    }
    Ok(current)
}

/// `false`, `0`, `nil` and empty strings, arrays and objects are false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Text written for a value; `nil` renders empty, containers as compact JSON
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        container => container.to_string(),
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
