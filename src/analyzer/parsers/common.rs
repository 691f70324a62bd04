use super::super::{core::*, prelude::*};
use crate::ast;
use crate::tokenizer::{
    keyword::Keyword,
    literal::Literal,
    symbol::{Delimiter, Operator},
    token::Token,
};

pub fn parse_identifier() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Identifier(s) => Some(s.clone()),
            _ => None,
        }),
        "identifier",
    )
}

pub fn parse_literal() -> impl Parser<Token, ast::Literal> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Literal(Literal::Integer(i)) => Some(ast::Literal::Integer(*i)),
            Token::Literal(Literal::Float(f)) => Some(ast::Literal::Float(*f)),
            Token::Literal(Literal::String(s)) => Some(ast::Literal::String(s.clone())),
            Token::Keyword(Keyword::True) => Some(ast::Literal::Boolean(true)),
            Token::Keyword(Keyword::False) => Some(ast::Literal::Boolean(false)),
            Token::Keyword(Keyword::Null) => Some(ast::Literal::Null),
            _ => None,
        }),
        "literal",
    )
}

/// Map keys may be bare identifiers or quoted strings.
pub fn parse_map_key() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Identifier(s) | Token::Literal(Literal::String(s)) => Some(s.clone()),
            _ => None,
        }),
        "map key",
    )
}

pub fn parse_comma() -> impl Parser<Token, Token> {
    with_context(equal(Token::Delimiter(Delimiter::Comma)), "comma")
}

pub fn parse_colon() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::Colon))
}

pub fn parse_open_paren() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::OpenParen))
}

pub fn parse_close_paren() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::CloseParen))
}

pub fn parse_open_bracket() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::OpenBracket))
}

pub fn parse_close_bracket() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::CloseBracket))
}

pub fn parse_open_brace() -> impl Parser<Token, Token> {
    with_context(equal(Token::Delimiter(Delimiter::OpenBrace)), "open brace")
}

pub fn parse_close_brace() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::CloseBrace))
}

pub fn parse_dot() -> impl Parser<Token, Token> {
    with_context(equal(Token::Operator(Operator::Dot)), "dot")
}

pub fn parse_pipe() -> impl Parser<Token, Token> {
    with_context(equal(Token::Operator(Operator::Pipe)), "pipe")
}

pub fn parse_question() -> impl Parser<Token, Token> {
    equal(Token::Operator(Operator::Question))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_keywords() {
        let input = vec![
            Token::Keyword(Keyword::True),
            Token::Keyword(Keyword::Null),
            Token::Keyword(Keyword::In),
        ];
        assert_eq!(
            parse_literal().parse(&input, 0),
            Ok((1, ast::Literal::Boolean(true)))
        );
        assert_eq!(parse_literal().parse(&input, 1), Ok((2, ast::Literal::Null)));
        assert!(parse_literal().parse(&input, 2).is_err());
    }

    #[test]
    fn test_parse_map_key() {
        let input = vec![
            Token::Identifier("plain".to_string()),
            Token::Literal(Literal::String("quoted key".to_string())),
        ];
        assert_eq!(
            parse_map_key().parse(&input, 0),
            Ok((1, "plain".to_string()))
        );
        assert_eq!(
            parse_map_key().parse(&input, 1),
            Ok((2, "quoted key".to_string()))
        );
    }
}
