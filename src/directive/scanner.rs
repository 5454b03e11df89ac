//! Pairs directive tokens into structured occurrences

use super::ast::{Component, Directive, Section, Span, Spanned};
use super::lexer::{lex, Token};

/// Token view of one template text
///
/// Each accessor answers one question the resolver asks about the text, so
/// a pass only sees the directive kind it expands and everything else stays
/// literal.
#[derive(Debug, Clone)]
pub struct DirectiveScanner<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
}

impl<'a> DirectiveScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: lex(source).filter(|(t, _)| *t != Token::Text).collect(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Source text covered by a span
    pub fn slice(&self, span: &Span) -> &'a str {
        &self.source[span.clone()]
    }

    /// First `@layout(...)`; later ones are ignored
    pub fn layout(&self) -> Option<Spanned<String>> {
        self.tokens.iter().find_map(|(tok, span)| match tok {
            Token::Layout(name) => Some(Spanned::new(name.clone(), span.clone())),
            _ => None,
        })
    }

    /// Every `@child(...)` placeholder in order
    pub fn children(&self) -> Vec<Spanned<String>> {
        self.tokens
            .iter()
            .filter_map(|(tok, span)| match tok {
                Token::Child(name) => Some(Spanned::new(name.clone(), span.clone())),
                _ => None,
            })
            .collect()
    }

    /// Every `@include(...)` in order
    pub fn includes(&self) -> Vec<Spanned<String>> {
        self.tokens
            .iter()
            .filter_map(|(tok, span)| match tok {
                Token::Include(name) => Some(Spanned::new(name.clone(), span.clone())),
                _ => None,
            })
            .collect()
    }

    /// Body of the first `@section(name)`, closed by the next `@end`
    ///
    /// Sections are looked up independently, so a section opened inside
    /// another section's body is still found.
    pub fn section(&self, name: &str) -> Option<&'a str> {
        let open = self
            .tokens
            .iter()
            .position(|(tok, _)| matches!(tok, Token::Section(n) if n == name))?;
        let end = self.tokens[open + 1..]
            .iter()
            .find(|(tok, _)| *tok == Token::End)?;
        Some(&self.source[self.tokens[open].1.end..end.1.start])
    }

    /// Non-overlapping `<x-NAME>...</x-NAME>` pairs, leftmost first
    ///
    /// The body ends at the first closing tag with the same name. An opening
    /// tag without one is left as text and scanning continues after it.
    pub fn components(&self) -> Vec<Spanned<Component>> {
        let mut components = Vec::new();
        let mut i = 0;
        while i < self.tokens.len() {
            let (Token::ComponentOpen(tag), open) = &self.tokens[i] else {
                i += 1;
                continue;
            };
            let close = self.tokens[i + 1..]
                .iter()
                .position(|(tok, _)| matches!(tok, Token::ComponentClose(n) if *n == tag.name));
            match close {
                Some(offset) => {
                    let j = i + 1 + offset;
                    let close = &self.tokens[j].1;
                    components.push(Spanned::new(
                        Component {
                            name: tag.name.clone(),
                            raw_attributes: tag.attributes.clone(),
                            body: open.end..close.start,
                        },
                        open.start..close.end,
                    ));
                    i = j + 1;
                }
                None => i += 1,
            }
        }
        components
    }

    /// All directives in document order, without overlaps
    ///
    /// Sections pair with the next `@end` and components with their closing
    /// tag; directives inside a paired body are not listed separately.
    pub fn directives(&self) -> Vec<Spanned<Directive>> {
        let components = self.components();
        let mut directives = Vec::new();
        let mut i = 0;
        while i < self.tokens.len() {
            let (tok, span) = &self.tokens[i];
            if let Some(component) = components.iter().find(|c| c.span.start == span.start) {
                directives.push(Spanned::new(
                    Directive::Component(component.node.clone()),
                    component.span.clone(),
                ));
                while i < self.tokens.len() && self.tokens[i].1.start < component.span.end {
                    i += 1;
                }
                continue;
            }
            match tok {
                Token::Layout(name) => directives.push(Spanned::new(
                    Directive::Layout { name: name.clone() },
                    span.clone(),
                )),
                Token::Child(name) => directives.push(Spanned::new(
                    Directive::Child { name: name.clone() },
                    span.clone(),
                )),
                Token::Include(name) => directives.push(Spanned::new(
                    Directive::Include { name: name.clone() },
                    span.clone(),
                )),
                Token::Section(name) => {
                    let end = self.tokens[i + 1..]
                        .iter()
                        .position(|(tok, _)| *tok == Token::End);
                    if let Some(offset) = end {
                        let j = i + 1 + offset;
                        directives.push(Spanned::new(
                            Directive::Section(Section {
                                name: name.clone(),
                                body: span.end..self.tokens[j].1.start,
                            }),
                            span.start..self.tokens[j].1.end,
                        ));
                        i = j + 1;
                        continue;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        directives
    }
}
