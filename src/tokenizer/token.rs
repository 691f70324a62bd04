use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    combinator::recognize,
    error::{context, VerboseError},
    sequence::pair,
    IResult,
};
use thiserror::Error;

use super::{
    keyword::Keyword,
    literal::{parse_literal, Literal},
    symbol::{parse_delimiter, parse_operator, Delimiter, Operator},
    whitespace::parse_whitespace,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Identifier(String),
    Operator(Operator),
    Delimiter(Delimiter),
    Literal(Literal),
    Whitespace(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword(kw) => write!(f, "{}", kw),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Delimiter(d) => write!(f, "{}", d),
            Token::Literal(Literal::String(s)) => write!(f, "{:?}", s),
            Token::Literal(Literal::Integer(i)) => write!(f, "{}", i),
            Token::Literal(Literal::Float(x)) => write!(f, "{}", x),
            Token::Whitespace(ws) => write!(f, "{}", ws),
        }
    }
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    current_position: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(level = "debug", skip(input))]
    pub fn tokenize(&mut self, input: &str) -> TokenizerResult<Vec<TokenSpan>> {
        let mut tokens = Vec::new();
        let mut remaining = input;

        while !remaining.is_empty() {
            let start_position = self.current_position;

            let result = alt((
                parse_whitespace,
                parse_literal,
                parse_operator,
                parse_delimiter,
                parse_identifier,
            ))(remaining);

            match result {
                Ok((new_remaining, token)) => {
                    self.current_position += remaining.len() - new_remaining.len();
                    tokens.push(TokenSpan {
                        token,
                        span: Span {
                            start: start_position,
                            end: self.current_position,
                        },
                    });
                    remaining = new_remaining;
                }
                Err(e) => {
                    let found = remaining.chars().take(20).collect::<String>();
                    let span = Span {
                        start: self.current_position,
                        end: self.current_position + 1,
                    };
                    let error = match e {
                        nom::Err::Incomplete(e) => TokenizerError::ParseError {
                            message: format!("Incomplete input, {:?}", e),
                            found,
                            span,
                        },
                        nom::Err::Error(e) | nom::Err::Failure(e) => TokenizerError::ParseError {
                            message: nom::error::convert_error(remaining, e),
                            found,
                            span,
                        },
                    };
                    tracing::debug!("{}", error);
                    return Err(error);
                }
            }
        }

        Ok(tokens)
    }
}

#[derive(Debug, Clone)]
pub struct TokenSpan {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_identifier(input: &str) -> ParserResult<Token> {
    let (input, id) = context(
        "identifier",
        recognize(pair(
            take_while1(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
            take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
        )),
    )(input)?;

    if let Ok(kw) = Keyword::try_from(id) {
        return Ok((input, Token::Keyword(kw)));
    }

    Ok((input, Token::Identifier(id.to_string())))
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub type TokenizerResult<T> = Result<T, TokenizerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizerError {
    #[error("Parse error: {message} at position {span}")]
    ParseError {
        message: String,
        found: String,
        span: Span,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(input: &str) -> Vec<Token> {
        Tokenizer::new()
            .tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !t.is_trivia())
            .collect()
    }

    #[test]
    fn test_identifier_for_keyword() {
        let (rest, token) = parse_identifier("null").unwrap();
        assert_eq!(token, Token::Keyword(Keyword::Null));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_identifier_with_keyword_prefix() {
        let (rest, token) = parse_identifier("inner other").unwrap();
        assert_eq!(token, Token::Identifier("inner".to_string()));
        assert_eq!(rest, " other");
    }

    #[test]
    fn test_tokenizer_spans() {
        let tokens = Tokenizer::new().tokenize("ab == 'c'").unwrap();
        assert_eq!(tokens[0].span, Span { start: 0, end: 2 });
        assert_eq!(tokens[2].span, Span { start: 3, end: 5 });
        assert_eq!(tokens[4].span, Span { start: 6, end: 9 });
    }

    #[test]
    fn test_filter_expression() {
        let tokens = significant("normandy.country in ['US', 'CA'] && !normandy.isDefault");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("normandy".to_string()),
                Token::Operator(Operator::Dot),
                Token::Identifier("country".to_string()),
                Token::Keyword(Keyword::In),
                Token::Delimiter(Delimiter::OpenBracket),
                Token::Literal(Literal::String("US".to_string())),
                Token::Delimiter(Delimiter::Comma),
                Token::Literal(Literal::String("CA".to_string())),
                Token::Delimiter(Delimiter::CloseBracket),
                Token::Operator(Operator::And),
                Token::Operator(Operator::Not),
                Token::Identifier("normandy".to_string()),
                Token::Operator(Operator::Dot),
                Token::Identifier("isDefault".to_string()),
            ]
        );
    }

    #[test]
    fn test_transform_pipe() {
        let tokens = significant("[userId, 'exp']|stableSample(0.5)");
        assert!(tokens.contains(&Token::Operator(Operator::Pipe)));
        assert!(tokens.contains(&Token::Identifier("stableSample".to_string())));
        assert!(tokens.contains(&Token::Literal(Literal::Float(0.5))));
    }

    #[test]
    fn test_unknown_character() {
        let err = Tokenizer::new().tokenize("a # b").unwrap_err();
        match err {
            TokenizerError::ParseError { found, span, .. } => {
                assert_eq!(found, "# b");
                assert_eq!(span.start, 2);
            }
        }
    }
}
