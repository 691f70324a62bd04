use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{char, digit1},
    combinator::{map, map_res, recognize, value},
    error::context,
    multi::many0,
    sequence::{delimited, preceded, tuple},
};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_escape(input: &str) -> ParserResult<&str> {
    context(
        "escape sequence",
        preceded(
            char('\\'),
            alt((
                value("\\", char('\\')),
                value("\"", char('"')),
                value("'", char('\'')),
                value("\n", char('n')),
                value("\t", char('t')),
            )),
        ),
    )(input)
}

fn collect_parts(parts: Vec<&str>) -> Literal {
    Literal::String(parts.concat())
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_double_quoted(input: &str) -> ParserResult<Literal> {
    context(
        "double quoted string",
        map(
            delimited(
                char('"'),
                many0(alt((parse_escape, is_not("\\\"")))),
                char('"'),
            ),
            collect_parts,
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_single_quoted(input: &str) -> ParserResult<Literal> {
    context(
        "single quoted string",
        map(
            delimited(
                char('\''),
                many0(alt((parse_escape, is_not("\\'")))),
                char('\''),
            ),
            collect_parts,
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    context(
        "string literal",
        alt((parse_double_quoted, parse_single_quoted)),
    )(input)
}

// Signs are left to the parser so that `2-1` reads as a subtraction.
#[tracing::instrument(level = "debug", skip(input))]
fn parse_float_literal(input: &str) -> ParserResult<Literal> {
    context(
        "float literal",
        map_res(recognize(tuple((digit1, tag("."), digit1))), |s: &str| {
            s.parse::<f64>().map(Literal::Float)
        }),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_integer_literal(input: &str) -> ParserResult<Literal> {
    context(
        "integer literal",
        map_res(digit1, |s: &str| s.parse::<i64>().map(Literal::Integer)),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((
                parse_string_literal,
                parse_float_literal,
                parse_integer_literal,
            )),
            Token::Literal,
        ),
    )(input)
}
