//! Expression parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use serde_json::Value;

use crate::executor::ast::{Action, Expr, Spanned};
use crate::executor::lexer::Token;

/// Parse a bare pipeline such as `.Name | upper`
pub fn parse(input: &str) -> Result<Spanned<Expr>, Vec<crate::ParseError>> {
    let len = input.len();

    let token_iter = crate::executor::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Split (Token, SimpleSpan) into token and span parts
    let token_stream =
        Stream::from_iter(token_iter).map((len..len).into(), |(t, s): (_, _)| (t, s));

    expression_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Parse the inside of a `{{ ... }}` action, control keywords included
pub fn parse_action(input: &str) -> Result<Action, Vec<crate::ParseError>> {
    let len = input.len();
    let token_iter = crate::executor::lexer::lex(input).map(|(tok, span)| (tok, span.into()));
    let token_stream =
        Stream::from_iter(token_iter).map((len..len).into(), |(t, s): (_, _)| (t, s));

    action_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn action_parser<'a, I>() -> impl Parser<'a, I, Action, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let pipeline = expression_parser();

    choice((
        just(Token::If)
            .ignore_then(pipeline.clone())
            .map(Action::If),
        just(Token::Else)
            .ignore_then(just(Token::If))
            .ignore_then(pipeline.clone())
            .map(Action::ElseIf),
        just(Token::Else).to(Action::Else),
        just(Token::Range)
            .ignore_then(pipeline.clone())
            .map(Action::Range),
        just(Token::With)
            .ignore_then(pipeline.clone())
            .map(Action::With),
        just(Token::End).to(Action::End),
        pipeline.map(Action::Output),
    ))
    .then_ignore(end())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn float_value(n: f64) -> Value {
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

fn expression_parser<'a, I>() -> impl Parser<'a, I, Spanned<Expr>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(name) => name,
    };

    let pipeline = recursive(|pipeline| {
        // A single argument; a bare identifier is a call without arguments
        let term = select! {
            Token::Field(path) => Expr::Field(path),
            Token::Root(path) => Expr::Root(path),
            Token::Str(s) => Expr::Literal(Value::String(s)),
            Token::Int(n) => Expr::Literal(Value::from(n)),
            Token::Float(n) => Expr::Literal(float_value(n)),
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::Nil => Expr::Literal(Value::Null),
            Token::Ident(name) => Expr::Call { name, args: Vec::new() },
        }
        .map_with(|expr, e| Spanned::new(expr, span_range(&e.span())));

        let operand = term.or(pipeline.delimited_by(just(Token::ParenOpen), just(Token::ParenClose)));

        // `name arg arg ...`
        let call = identifier
            .clone()
            .then(operand.clone().repeated().at_least(1).collect::<Vec<_>>())
            .map_with(|(name, args), e| {
                Spanned::new(Expr::Call { name, args }, span_range(&e.span()))
            });

        let command = call.or(operand.clone());

        // `| name arg ...`
        let stage = just(Token::Pipe)
            .ignore_then(identifier.clone().then(operand.repeated().collect::<Vec<_>>()))
            .map_with(|(name, args), e| (name, args, span_range(&e.span())));

        command.foldl(stage.repeated(), |input, (name, mut args, span)| {
            let span = input.span.start..span.end;
            args.push(input);
            Spanned::new(Expr::Call { name, args }, span)
        })
    });

    pipeline
}
