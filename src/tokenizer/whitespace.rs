use nom::{bytes::complete::take_while1, combinator::map, error::context};

use super::token::{ParserResult, Token};

/// Parses a run of spaces and tabs into a single [`Token::Whitespace`].
///
/// ```
/// # use recipe_engine::tokenizer::whitespace::parse_whitespace;
/// # use recipe_engine::tokenizer::token::Token;
/// let (rest, token) = parse_whitespace("  \tx").unwrap();
/// assert_eq!(token, Token::Whitespace("  \t".to_string()));
/// assert_eq!(rest, "x");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<Token> {
    context(
        "whitespace expected",
        map(take_while1(|c| c == ' ' || c == '\t'), |ws: &str| {
            Token::Whitespace(ws.to_string())
        }),
    )(input)
}
