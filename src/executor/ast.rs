//! Expression and block trees for `{{ ... }}` actions

use serde_json::Value;

pub use crate::directive::Spanned;
use crate::error::Span;

/// A parsed action expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Field path from the current value; empty for `.`
    Field(Vec<String>),
    /// Field path from the render data; empty for `$`
    Root(Vec<String>),
    /// String, number, boolean or `nil` literal
    Literal(Value),
    /// Function call; a pipeline stage receives the piped value as last argument
    Call {
        name: String,
        args: Vec<Spanned<Expr>>,
    },
}

/// What a single `{{ ... }}` action says
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Output the value of a pipeline
    Output(Spanned<Expr>),
    If(Spanned<Expr>),
    ElseIf(Spanned<Expr>),
    Else,
    Range(Spanned<Expr>),
    With(Spanned<Expr>),
    End,
}

/// A condition or subject together with the block it controls
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub expr: Spanned<Expr>,
    /// Action text span, used to name the action in errors
    pub source: Span,
    pub body: Vec<Node>,
}

/// Compiled template tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, already trimmed by any `{{-`/`-}}` markers
    Text(Span),
    /// `{{ pipeline }}`; `source` is the expression text span
    Output { expr: Spanned<Expr>, source: Span },
    /// `{{ if }}` with its `{{ else if }}` branches and optional `{{ else }}`
    If {
        branches: Vec<Branch>,
        otherwise: Vec<Node>,
    },
    /// `{{ range }}`; the body runs once per element with `.` bound to it
    Range { branch: Branch, otherwise: Vec<Node> },
    /// `{{ with }}`; the body runs with `.` bound to a non-empty value
    With { branch: Branch, otherwise: Vec<Node> },
}
