//! Template executor for `{{ ... }}` actions
//!
//! Runs after directive resolution. Actions are Go-template flavoured:
//!
//! ```text
//! {{ .Name }}                   field of the current value
//! {{ .User.Address.City }}      nested field
//! {{ $.Site.Title }}            field of the render data, even inside blocks
//! {{ upper .Name }}             function call
//! {{ .Name | printf "%s!" }}    pipeline, value passed as last argument
//! {{ if .A }}..{{ else if .B }}..{{ else }}..{{ end }}
//! {{ range .Items }}{{ . }}{{ else }}empty{{ end }}
//! {{ with .User }}{{ .Name }}{{ end }}
//! {{- .Name -}}                 trim surrounding whitespace
//! {{/* comment */}}
//! ```
//!
//! `range` and `with` rebind `.` inside their body.

mod ast;
mod eval;
mod functions;
mod grammar;
pub mod lexer;
mod template;

pub use ast::{Action, Branch, Expr, Node};
pub use eval::{escape_html, is_truthy, render_value, type_name, Evaluator};
pub use functions::{Function, FunctionError, FunctionTable};
pub use grammar::{parse, parse_action};
pub use template::compile;

use std::borrow::Cow;

use serde_json::Value;

use crate::error::{EvalError, Span, ViewError};

/// Executes composed text against a data context
#[derive(Debug, Clone, Copy)]
pub struct Executor<'a> {
    functions: &'a FunctionTable,
    escape_html: bool,
}

/// State of one `execute` call
struct Run<'r> {
    template: &'r str,
    text: &'r str,
    evaluator: Evaluator<'r>,
}

impl Run<'_> {
    fn eval(&self, expr: &ast::Spanned<Expr>, source: &Span, dot: &Value) -> Result<Value, ViewError> {
        self.evaluator
            .eval(expr, dot)
            .map_err(|error| self.fail(source, error))
    }

    fn fail(&self, source: &Span, error: EvalError) -> ViewError {
        ViewError::Eval {
            template: self.template.to_string(),
            expression: self.text[source.clone()].trim().to_string(),
            error,
        }
    }
}

impl<'a> Executor<'a> {
    pub fn new(functions: &'a FunctionTable, escape_html: bool) -> Self {
        Self {
            functions,
            escape_html,
        }
    }

    /// Substitute every action in `text`; `template` names it in errors
    ///
    /// `local` functions take precedence over the executor's own table.
    pub fn execute(
        &self,
        template: &str,
        text: &str,
        data: &Value,
        local: &FunctionTable,
    ) -> Result<String, ViewError> {
        let nodes = compile(text).map_err(|error| ViewError::Syntax {
            template: template.to_string(),
            text: text.to_string(),
            error,
        })?;

        let run = Run {
            template,
            text,
            evaluator: Evaluator::new(data, self.functions, local),
        };
        let mut out = String::with_capacity(text.len());
        self.write_nodes(&run, &nodes, data, &mut out)?;
        Ok(out)
    }

    fn write_nodes(
        &self,
        run: &Run<'_>,
        nodes: &[Node],
        dot: &Value,
        out: &mut String,
    ) -> Result<(), ViewError> {
        for node in nodes {
            match node {
                Node::Text(span) => out.push_str(&run.text[span.clone()]),
                Node::Output { expr, source } => {
                    let value = run.eval(expr, source, dot)?;
                    self.write_value(&value, out);
                }
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let mut chosen = otherwise;
                    for branch in branches {
                        if is_truthy(&run.eval(&branch.expr, &branch.source, dot)?) {
                            chosen = &branch.body;
                            break;
                        }
                    }
                    self.write_nodes(run, chosen, dot, out)?;
                }
                Node::With { branch, otherwise } => {
                    let value = run.eval(&branch.expr, &branch.source, dot)?;
                    if is_truthy(&value) {
                        self.write_nodes(run, &branch.body, &value, out)?;
                    } else {
                        self.write_nodes(run, otherwise, dot, out)?;
                    }
                }
                Node::Range { branch, otherwise } => {
                    let value = run.eval(&branch.expr, &branch.source, dot)?;
                    let items: Vec<Cow<'_, Value>> = match &value {
                        Value::Array(items) => items.iter().map(Cow::Borrowed).collect(),
                        Value::Object(map) => map.values().map(Cow::Borrowed).collect(),
                        Value::Null => Vec::new(),
                        Value::Number(n) if n.as_u64().is_some() => (0..n.as_u64().unwrap_or(0))
                            .map(|i| Cow::Owned(Value::from(i)))
                            .collect(),
                        other => {
                            return Err(run.fail(
                                &branch.source,
                                EvalError::NotIterable {
                                    found: type_name(other),
                                },
                            ))
                        }
                    };
                    if items.is_empty() {
                        self.write_nodes(run, otherwise, dot, out)?;
                    }
                    for item in &items {
                        self.write_nodes(run, &branch.body, item, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_value(&self, value: &Value, out: &mut String) {
        let rendered = render_value(value);
        if self.escape_html {
            out.push_str(&escape_html(&rendered));
        } else {
            out.push_str(&rendered);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn execute(text: &str, data: Value) -> Result<String, ViewError> {
        let functions = FunctionTable::with_builtins();
        Executor::new(&functions, true).execute("test.html", text, &data, &FunctionTable::new())
    }

    #[test]
    fn test_variable_substitution() {
        assert_eq!(
            execute("Hello {{ .Name }}!", json!({"Name": "Saeed"})).unwrap(),
            "Hello Saeed!"
        );
    }

    #[test]
    fn test_no_actions_with_null_data() {
        assert_eq!(
            execute("Test View Content", Value::Null).unwrap(),
            "Test View Content"
        );
    }

    #[test]
    fn test_values_are_escaped() {
        assert_eq!(
            execute("<p>{{ .Bio }}</p>", json!({"Bio": "<b>hi</b>"})).unwrap(),
            "<p>&lt;b&gt;hi&lt;/b&gt;</p>"
        );
    }

    #[test]
    fn test_escaping_disabled() {
        let functions = FunctionTable::new();
        let out = Executor::new(&functions, false)
            .execute(
                "t",
                "<p>{{ .Bio }}</p>",
                &json!({"Bio": "<b>hi</b>"}),
                &FunctionTable::new(),
            )
            .unwrap();
        assert_eq!(out, "<p><b>hi</b></p>");
    }

    #[test]
    fn test_pipeline_with_local_function() {
        let functions = FunctionTable::with_builtins();
        let local = FunctionTable::new().with("upper", |args| match args {
            [Value::String(s)] => Ok(Value::String(s.to_uppercase())),
            _ => Err(FunctionError::new("upper expects a string")),
        });
        let out = Executor::new(&functions, true)
            .execute("t", "{{ .Name | upper }}", &json!({"Name": "ada"}), &local)
            .unwrap();
        assert_eq!(out, "ADA");
    }

    #[test]
    fn test_syntax_error_keeps_template_name() {
        let err = execute("{{ .Name | }}", json!({})).unwrap_err();
        match err {
            ViewError::Syntax { template, .. } => assert_eq!(template, "test.html"),
            other => panic!("Expected Syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_eval_error_keeps_expression() {
        let err = execute("Hi {{ .Missing }}", json!({})).unwrap_err();
        match err {
            ViewError::Eval {
                expression, error, ..
            } => {
                assert_eq!(expression, ".Missing");
                assert!(matches!(error, EvalError::MissingField { .. }));
            }
            other => panic!("Expected Eval error, got {:?}", other),
        }
    }

    #[test]
    fn test_range_and_if() {
        assert_eq!(
            execute(
                "{{ range .Items }}<li>{{ . }}</li>{{ end }}{{ if .On }}on{{ end }}",
                json!({"Items": [1, 2], "On": true})
            )
            .unwrap(),
            "<li>1</li><li>2</li>on"
        );
    }

    #[test]
    fn test_if_else_chain() {
        let text = "{{ if .A }}a{{ else if .B }}b{{ else }}none{{ end }}";
        assert_eq!(execute(text, json!({"A": 1, "B": true})).unwrap(), "a");
        assert_eq!(execute(text, json!({"A": 0, "B": true})).unwrap(), "b");
        assert_eq!(execute(text, json!({"A": "", "B": []})).unwrap(), "none");
    }

    #[test]
    fn test_range_rebinds_dot_and_keeps_root() {
        let data = json!({
            "Site": "docs",
            "Users": [{"Name": "Ada"}, {"Name": "Linus"}]
        });
        assert_eq!(
            execute(
                "{{ range .Users }}{{ .Name }}@{{ $.Site }} {{ end }}",
                data
            )
            .unwrap(),
            "Ada@docs Linus@docs "
        );
    }

    #[test]
    fn test_range_over_object_and_number() {
        assert_eq!(
            execute("{{ range .M }}{{ . }}{{ end }}", json!({"M": {"b": 2, "a": 1}})).unwrap(),
            "12"
        );
        assert_eq!(execute("{{ range 3 }}{{ . }}{{ end }}", json!({})).unwrap(), "012");
    }

    #[test]
    fn test_range_else_on_empty_or_nil() {
        let text = "{{ range .Items }}x{{ else }}empty{{ end }}";
        assert_eq!(execute(text, json!({"Items": []})).unwrap(), "empty");
        assert_eq!(execute(text, json!({"Items": null})).unwrap(), "empty");
    }

    #[test]
    fn test_range_over_scalar_is_error() {
        let err = execute("{{ range .Name }}x{{ end }}", json!({"Name": "Ada"})).unwrap_err();
        match err {
            ViewError::Eval {
                expression, error, ..
            } => {
                assert_eq!(expression, "range .Name");
                assert!(matches!(error, EvalError::NotIterable { found: "string" }));
            }
            other => panic!("Expected Eval error, got {:?}", other),
        }
    }

    #[test]
    fn test_with_rebinds_dot() {
        let text = "{{ with .User }}{{ .Name }}{{ else }}anonymous{{ end }}";
        assert_eq!(execute(text, json!({"User": {"Name": "Ada"}})).unwrap(), "Ada");
        assert_eq!(execute(text, json!({"User": null})).unwrap(), "anonymous");
    }

    #[test]
    fn test_comparison_in_condition() {
        let text = "{{ range .Items }}{{ if gt . 1 }}{{ . }}{{ end }}{{ end }}";
        assert_eq!(execute(text, json!({"Items": [1, 2, 3]})).unwrap(), "23");
        assert_eq!(
            execute("{{ if and .A (not .B) }}yes{{ end }}", json!({"A": 1, "B": false})).unwrap(),
            "yes"
        );
    }

    #[test]
    fn test_untaken_branch_is_not_evaluated() {
        assert_eq!(
            execute("{{ if .Off }}{{ .Missing }}{{ end }}ok", json!({"Off": false})).unwrap(),
            "ok"
        );
    }

    #[test]
    fn test_unbalanced_blocks_are_syntax_errors() {
        assert!(matches!(
            execute("{{ if .A }}x", json!({})),
            Err(ViewError::Syntax { .. })
        ));
        assert!(matches!(
            execute("x{{ end }}", json!({})),
            Err(ViewError::Syntax { .. })
        ));
    }

    #[test]
    fn test_function_error_propagates() {
        let functions = FunctionTable::new().with("fail", |_| Err(FunctionError::new("nope")));
        let err = Executor::new(&functions, true)
            .execute("t", "{{ fail }}", &json!({}), &FunctionTable::new())
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
