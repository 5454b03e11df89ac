//! Source-order lexing of an HTML opening tag
//!
//! The parsed document keeps only the first of duplicate attributes, so the
//! attribute list is read again from the tag text itself.

use std::borrow::Cow;

use logos::{Lexer, Logos};

/// Coarse markup tokens, enough to count opening tags
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
enum Markup {
    #[token("<!--", skip_comment)]
    Comment,
    #[regex(r"</[^>]*>")]
    EndTag,
    /// `<name`, lowercased; the attributes follow
    #[regex(r"<[a-zA-Z][^\s/>]*", tag_name)]
    StartTag(String),
    #[regex(r"[^<]+")]
    #[token("<")]
    Text,
}

/// Tokens inside an opening tag
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"\s+")]
enum Attr {
    #[regex(r#"[^\s"'<>/=]+"#, |lex| lex.slice().to_string())]
    Name(String),
    #[token("=")]
    Eq,
    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r"'[^']*'", unquote)]
    Quoted(String),
    #[token("/")]
    Slash,
    #[token(">")]
    Close,
}

fn skip_comment(lex: &mut Lexer<Markup>) {
    let rest = lex.remainder();
    lex.bump(rest.find("-->").map_or(rest.len(), |i| i + 3));
}

fn tag_name(lex: &mut Lexer<Markup>) -> String {
    lex.slice()[1..].to_ascii_lowercase()
}

fn unquote(lex: &mut Lexer<Attr>) -> String {
    let slice = lex.slice();
    slice[1..slice.len() - 1].to_string()
}

/// Attributes of the `ordinal`-th `<name ...>` opening tag, in source order
///
/// Names are lowercased and values have character references decoded.
/// Returns `None` when the markup has no such tag.
pub fn tag_attributes(markup: &str, name: &str, ordinal: usize) -> Option<Vec<(String, String)>> {
    let mut lexer = Markup::lexer(markup);
    let mut seen = 0;
    while let Some(token) = lexer.next() {
        let Ok(Markup::StartTag(tag)) = token else {
            continue;
        };
        if tag != name {
            continue;
        }
        if seen == ordinal {
            return Some(attributes(lexer.morph()));
        }
        seen += 1;
    }
    None
}

fn attributes(mut lexer: Lexer<Attr>) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut awaiting_value = false;
    while let Some(token) = lexer.next() {
        match token {
            Ok(Attr::Name(value) | Attr::Quoted(value)) if awaiting_value => {
                if let Some((_, slot)) = attrs.last_mut() {
                    *slot = decode_entities(&value).into_owned();
                }
                awaiting_value = false;
            }
            Ok(Attr::Name(name)) => attrs.push((name.to_ascii_lowercase(), String::new())),
            Ok(Attr::Eq) => awaiting_value = !attrs.is_empty(),
            Ok(Attr::Close) => break,
            Ok(Attr::Quoted(_) | Attr::Slash) | Err(_) => awaiting_value = false,
        }
    }
    attrs
}

/// Decode named (`&amp;` `&lt;` `&gt;` `&quot;` `&apos;`) and numeric references
pub fn decode_entities(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = match name.strip_prefix('#')? {
                hex if hex.starts_with(['x', 'X']) => u32::from_str_radix(&hex[1..], 16).ok()?,
                dec => dec.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
