pub mod common;
pub use common::*;

pub mod expression;

use super::core::{ParseError, Parser};
use crate::ast::Expression;
use crate::tokenizer::token::Token;

/// Parses a complete filter. Every token must be consumed.
pub fn parse_filter(tokens: &[Token]) -> Result<Expression, ParseError> {
    let (pos, expr) = expression::parse_expression().parse(tokens, 0)?;
    match tokens.get(pos) {
        None => Ok(expr),
        Some(token) => Err(ParseError::UnexpectedToken {
            found: token.to_string(),
            position: pos,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{literal::Literal, symbol::Operator};

    #[test]
    fn test_trailing_tokens_are_rejected() {
        let tokens = vec![
            Token::Literal(Literal::Integer(1)),
            Token::Operator(Operator::Plus),
        ];
        assert_eq!(
            parse_filter(&tokens),
            Err(ParseError::UnexpectedToken {
                found: "+".to_string(),
                position: 1
            })
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = parse_filter(&[]).unwrap_err();
        assert_eq!(err.root_cause(), &ParseError::EOF);
    }
}
