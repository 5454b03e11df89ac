//! Lexer for view directives using logos
//!
//! Anything that is not a directive is a `Text` token, so the token spans
//! always tile the whole input.

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Opening `<x-NAME attrs>` tag of a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentTag {
    pub name: String,
    /// Attribute text of the opening tag, trimmed, unparsed
    pub attributes: String,
}

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // Quoted-argument directives; the quote style must match on both sides
    #[regex(r#"@layout\(("[^"\n]+"|'[^'\n]+')\)"#, quoted_argument)]
    Layout(String),
    #[regex(r#"@section\(("[^"\n]+"|'[^'\n]+')\)"#, quoted_argument)]
    Section(String),
    #[regex(r#"@child\(("[^"\n]+"|'[^'\n]+')\)"#, quoted_argument)]
    Child(String),
    #[regex(r#"@include\(("[^"\n]+"|'[^'\n]+')\)"#, quoted_argument)]
    Include(String),
    #[token("@end")]
    End,

    // Component tags
    #[regex(r"<x-[^>\s]+[^>]*>", component_open)]
    ComponentOpen(ComponentTag),
    #[regex(r"</x-[^>\s]+>", component_close)]
    ComponentClose(String),

    // Literal text, including a lone `@` or `<`
    #[regex(r"[^@<]+")]
    #[token("@")]
    #[token("<")]
    Text,
}

/// Argument between the quotes of `@directive("arg")`
fn quoted_argument(lex: &mut logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    let start = slice.find('(').map_or(0, |i| i + 2);
    slice[start..slice.len() - 2].to_string()
}

fn component_open(lex: &mut logos::Lexer<Token>) -> ComponentTag {
    let slice = lex.slice();
    let inner = &slice[3..slice.len() - 1];
    let name_end = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    ComponentTag {
        name: inner[..name_end].to_string(),
        attributes: inner[name_end..].trim().to_string(),
    }
}

fn component_close(lex: &mut logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    slice[4..slice.len() - 1].to_string()
}

/// Lex template text into directive tokens with spans
///
/// Input the lexer cannot classify is returned as `Text`; malformed
/// directives are never an error.
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| (tok.unwrap_or(Token::Text), span))
}
