//! Lexer for `{{ ... }}` expressions using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("range")]
    Range,
    #[token("with")]
    With,
    #[token("end")]
    End,

    // `.` and `.A.B` start from the current value, which `range` and `with` rebind
    #[token(".", empty_path)]
    #[regex(r"(\.[a-zA-Z0-9_]+)+", field_path)]
    Field(Vec<String>),

    // `$` and `$.A.B` always start from the data passed to the render
    #[token("$", empty_path)]
    #[regex(r"\$(\.[a-zA-Z0-9_]+)+", field_path)]
    Root(Vec<String>),

    // Operators and delimiters
    #[token("|")]
    Pipe,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"`[^`]*`", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    Str(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    /// Input the lexer could not classify
    Error,
}

impl Token {
    /// Human-readable form for error messages
    pub fn describe(&self) -> String {
        match self {
            Token::True => "keyword 'true'".to_string(),
            Token::False => "keyword 'false'".to_string(),
            Token::Nil => "keyword 'nil'".to_string(),
            Token::If => "keyword 'if'".to_string(),
            Token::Else => "keyword 'else'".to_string(),
            Token::Range => "keyword 'range'".to_string(),
            Token::With => "keyword 'with'".to_string(),
            Token::End => "keyword 'end'".to_string(),
            Token::Field(path) if path.is_empty() => "'.'".to_string(),
            Token::Field(path) => format!("field '.{}'", path.join(".")),
            Token::Root(path) if path.is_empty() => "'$'".to_string(),
            Token::Root(path) => format!("field '$.{}'", path.join(".")),
            Token::Pipe => "'|'".to_string(),
            Token::ParenOpen => "'('".to_string(),
            Token::ParenClose => "')'".to_string(),
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::Str(s) => format!("string \"{}\"", s),
            Token::Int(n) => format!("number {}", n),
            Token::Float(n) => format!("number {}", n),
            Token::Error => "invalid token".to_string(),
        }
    }
}

fn empty_path(_: &mut logos::Lexer<Token>) -> Vec<String> {
    Vec::new()
}

fn field_path(lex: &mut logos::Lexer<Token>) -> Vec<String> {
    lex.slice()
        .trim_start_matches('$')
        .split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strip the quotes of a double-quoted literal and resolve escapes
fn unescape(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Lex an expression into tokens with spans
///
/// Unrecognized input becomes [`Token::Error`] so the parser reports it.
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| (tok.unwrap_or(Token::Error), span))
}
