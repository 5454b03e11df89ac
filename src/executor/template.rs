//! Compiles composed text into a tree of literal text, actions and blocks

use std::vec::IntoIter;

use super::ast::{Action, Branch, Expr, Node, Spanned};
use super::grammar::parse_action;
use crate::error::{ParseError, Span};

/// One literal run or `{{ ... }}` action, before blocks are paired
enum Piece {
    Text(Span),
    Action {
        action: Action,
        /// Expression text between the delimiters
        source: Span,
        /// Whole `{{ ... }}` including delimiters
        outer: Span,
    },
}

/// How a block body ended
enum Terminator {
    Eof,
    End(Span),
    Else(Span),
    ElseIf {
        expr: Spanned<Expr>,
        source: Span,
        outer: Span,
    },
}

/// Compile composed text into a node tree
///
/// `{{- ` trims whitespace before the action and ` -}}` trims whitespace
/// after it. `{{/* ... */}}` is a comment. `if`, `range` and `with` open
/// blocks closed by `{{ end }}`, each with an optional `{{ else }}` part;
/// `if` also takes `{{ else if ... }}` branches.
pub fn compile(text: &str) -> Result<Vec<Node>, ParseError> {
    let mut pieces = split(text)?.into_iter();
    let (nodes, terminator) = block(&mut pieces)?;
    match terminator {
        Terminator::Eof => Ok(nodes),
        Terminator::End(outer) => Err(ParseError::syntax(outer, "unexpected {{end}}")),
        Terminator::Else(outer) | Terminator::ElseIf { outer, .. } => {
            Err(ParseError::syntax(outer, "unexpected {{else}}"))
        }
    }
}

/// Nodes up to the next `end`, `else` or the end of input
fn block(pieces: &mut IntoIter<Piece>) -> Result<(Vec<Node>, Terminator), ParseError> {
    let mut nodes = Vec::new();
    while let Some(piece) = pieces.next() {
        let (action, source, outer) = match piece {
            Piece::Text(span) => {
                nodes.push(Node::Text(span));
                continue;
            }
            Piece::Action {
                action,
                source,
                outer,
            } => (action, source, outer),
        };
        match action {
            Action::Output(expr) => nodes.push(Node::Output { expr, source }),
            Action::End => return Ok((nodes, Terminator::End(outer))),
            Action::Else => return Ok((nodes, Terminator::Else(outer))),
            Action::ElseIf(expr) => {
                return Ok((
                    nodes,
                    Terminator::ElseIf {
                        expr,
                        source,
                        outer,
                    },
                ))
            }
            Action::If(expr) => nodes.push(if_block(pieces, expr, source, outer)?),
            Action::Range(expr) => {
                let (branch, otherwise) = scoped_block(pieces, expr, source, &outer, "range")?;
                nodes.push(Node::Range { branch, otherwise });
            }
            Action::With(expr) => {
                let (branch, otherwise) = scoped_block(pieces, expr, source, &outer, "with")?;
                nodes.push(Node::With { branch, otherwise });
            }
        }
    }
    Ok((nodes, Terminator::Eof))
}

fn if_block(
    pieces: &mut IntoIter<Piece>,
    expr: Spanned<Expr>,
    source: Span,
    outer: Span,
) -> Result<Node, ParseError> {
    let mut branches = Vec::new();
    let mut current = (expr, source);
    let otherwise = loop {
        let (body, next) = block(pieces)?;
        let (expr, source) = current;
        branches.push(Branch { expr, source, body });
        match next {
            Terminator::End(_) => break Vec::new(),
            Terminator::Else(_) => break else_block(pieces, &outer, "if")?,
            Terminator::ElseIf { expr, source, .. } => current = (expr, source),
            Terminator::Eof => return Err(unclosed(&outer, "if")),
        }
    };
    Ok(Node::If {
        branches,
        otherwise,
    })
}

/// Body and `else` part of `range` or `with`
fn scoped_block(
    pieces: &mut IntoIter<Piece>,
    expr: Spanned<Expr>,
    source: Span,
    outer: &Span,
    keyword: &str,
) -> Result<(Branch, Vec<Node>), ParseError> {
    let (body, next) = block(pieces)?;
    let otherwise = match next {
        Terminator::End(_) => Vec::new(),
        Terminator::Else(_) => else_block(pieces, outer, keyword)?,
        Terminator::ElseIf { outer, .. } => {
            return Err(ParseError::syntax(
                outer,
                format!("'else if' is not allowed in {}", keyword),
            ))
        }
        Terminator::Eof => return Err(unclosed(outer, keyword)),
    };
    Ok((Branch { expr, source, body }, otherwise))
}

/// The `{{ else }}` part, which only `{{ end }}` may close
fn else_block(
    pieces: &mut IntoIter<Piece>,
    opener: &Span,
    keyword: &str,
) -> Result<Vec<Node>, ParseError> {
    let (body, next) = block(pieces)?;
    match next {
        Terminator::End(_) => Ok(body),
        Terminator::Eof => Err(unclosed(opener, keyword)),
        Terminator::Else(outer) | Terminator::ElseIf { outer, .. } => Err(ParseError::syntax(
            outer,
            format!("expected {{{{end}}}} after {{{{else}}}} in {}", keyword),
        )),
    }
}

fn unclosed(opener: &Span, keyword: &str) -> ParseError {
    ParseError::syntax(opener.clone(), format!("unclosed {} block", keyword))
}

/// Flat list of text runs and parsed actions
fn split(text: &str) -> Result<Vec<Piece>, ParseError> {
    let mut pieces = Vec::new();
    let mut cursor = 0;
    let mut trim_next = false;

    while let Some(found) = text[cursor..].find("{{") {
        let open = cursor + found;
        let mut inner_start = open + 2;
        let trim_left = has_trim_marker(&text[inner_start..]);
        if trim_left {
            inner_start += 1;
        }

        let close = find_close(text, inner_start)
            .ok_or_else(|| ParseError::syntax(open..open + 2, "unclosed action"))?;
        let mut inner_end = close;
        let trim_right = inner_end > inner_start + 1
            && text[..inner_end].ends_with('-')
            && text[..inner_end - 1].ends_with(char::is_whitespace);
        if trim_right {
            inner_end -= 1;
        }

        let mut start = cursor;
        if trim_next {
            start = open - text[cursor..open].trim_start().len();
        }
        let mut end = open;
        if trim_left {
            end = start + text[start..open].trim_end().len();
        }
        if start < end {
            pieces.push(Piece::Text(start..end));
        }

        let inner = text[inner_start..inner_end].trim();
        if inner.starts_with("/*") && inner.ends_with("*/") && inner.len() >= 4 {
            // comment
        } else if inner.is_empty() {
            return Err(ParseError::syntax(open..close + 2, "missing value in action"));
        } else {
            let action = parse_action(&text[inner_start..inner_end]).map_err(|errs| {
                errs.into_iter()
                    .next()
                    .unwrap_or_else(|| ParseError::syntax(0..0, "invalid action"))
                    .offset(inner_start)
            })?;
            pieces.push(Piece::Action {
                action,
                source: inner_start..inner_end,
                outer: open..close + 2,
            });
        }

        cursor = close + 2;
        trim_next = trim_right;
    }

    let start = if trim_next {
        text.len() - text[cursor..].trim_start().len()
    } else {
        cursor
    };
    if start < text.len() {
        pieces.push(Piece::Text(start..text.len()));
    }
    Ok(pieces)
}

/// `-` followed by whitespace right after `{{`
fn has_trim_marker(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

/// Position of the `}}` ending an action, skipping string literals
fn find_close(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'`' => quote = Some(b),
            None if b == b'}' && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}
