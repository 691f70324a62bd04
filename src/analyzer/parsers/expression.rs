//! Filter expression grammar.
//!
//! Precedence, loosest first: conditional, `||`, `&&`, comparison and `in`,
//! additive, multiplicative, unary, postfix (member, index, transform pipe),
//! primary.

use super::{
    super::{core::*, prelude::*},
    *,
};
use crate::ast::{self, BinaryOperator, Expression, UnaryOperator};
use crate::tokenizer::{keyword::Keyword, symbol::Operator, token::Token};

pub fn parse_expression() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![Box::new(lazy(parse_conditional))]),
        "expression",
    )
}

fn parse_conditional() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_logical_or(),
                optional(tuple2(
                    preceded(as_unit(parse_question()), lazy(parse_expression)),
                    preceded(as_unit(parse_colon()), lazy(parse_expression)),
                )),
            ),
            |(condition, branches)| match branches {
                Some((then_branch, else_branch)) => Expression::Conditional {
                    condition: Box::new(condition),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                },
                None => condition,
            },
        ),
        "conditional",
    )
}

fn fold_binary(first: Expression, rest: Vec<(BinaryOperator, Expression)>) -> Expression {
    rest.into_iter()
        .fold(first, |left, (op, right)| Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
}

fn parse_logical_or() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_logical_and(),
                many(tuple2(
                    binary_operator(Token::Operator(Operator::Or), BinaryOperator::Or),
                    parse_logical_and(),
                )),
            ),
            |(first, rest)| fold_binary(first, rest),
        ),
        "logical or",
    )
}

fn parse_logical_and() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_comparison(),
                many(tuple2(
                    binary_operator(Token::Operator(Operator::And), BinaryOperator::And),
                    parse_comparison(),
                )),
            ),
            |(first, rest)| fold_binary(first, rest),
        ),
        "logical and",
    )
}

fn parse_comparison() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_additive(),
                many(tuple2(parse_operator_comparison(), parse_additive())),
            ),
            |(first, rest)| fold_binary(first, rest),
        ),
        "comparison",
    )
}

fn parse_operator_comparison() -> impl Parser<Token, BinaryOperator> {
    with_context(
        choice(vec![
            Box::new(binary_operator(
                Token::Operator(Operator::EqualEqual),
                BinaryOperator::Equal,
            )),
            Box::new(binary_operator(
                Token::Operator(Operator::NotEqual),
                BinaryOperator::NotEqual,
            )),
            Box::new(binary_operator(
                Token::Operator(Operator::GreaterEqual),
                BinaryOperator::GreaterThanEqual,
            )),
            Box::new(binary_operator(
                Token::Operator(Operator::Greater),
                BinaryOperator::GreaterThan,
            )),
            Box::new(binary_operator(
                Token::Operator(Operator::LessEqual),
                BinaryOperator::LessThanEqual,
            )),
            Box::new(binary_operator(
                Token::Operator(Operator::Less),
                BinaryOperator::LessThan,
            )),
            Box::new(binary_operator(
                Token::Keyword(Keyword::In),
                BinaryOperator::In,
            )),
        ]),
        "comparison operator",
    )
}

fn parse_additive() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_multiplicative(),
                many(tuple2(
                    choice(vec![
                        Box::new(binary_operator(
                            Token::Operator(Operator::Plus),
                            BinaryOperator::Add,
                        )),
                        Box::new(binary_operator(
                            Token::Operator(Operator::Minus),
                            BinaryOperator::Subtract,
                        )),
                    ]),
                    parse_multiplicative(),
                )),
            ),
            |(first, rest)| fold_binary(first, rest),
        ),
        "additive",
    )
}

fn parse_multiplicative() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_unary(),
                many(tuple2(
                    choice(vec![
                        Box::new(binary_operator(
                            Token::Operator(Operator::Multiply),
                            BinaryOperator::Multiply,
                        )),
                        Box::new(binary_operator(
                            Token::Operator(Operator::Divide),
                            BinaryOperator::Divide,
                        )),
                        Box::new(binary_operator(
                            Token::Operator(Operator::Modulo),
                            BinaryOperator::Modulo,
                        )),
                    ]),
                    parse_unary(),
                )),
            ),
            |(first, rest)| fold_binary(first, rest),
        ),
        "multiplicative",
    )
}

fn binary_operator(token: Token, op: BinaryOperator) -> impl Parser<Token, BinaryOperator> {
    map(equal(token), move |_| op)
}

fn parse_unary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(
                preceded(
                    as_unit(equal(Token::Operator(Operator::Not))),
                    lazy(parse_unary),
                ),
                |operand| Expression::UnaryOp {
                    op: UnaryOperator::Not,
                    operand: Box::new(operand),
                },
            )),
            Box::new(map(
                preceded(
                    as_unit(equal(Token::Operator(Operator::Minus))),
                    lazy(parse_unary),
                ),
                |operand| Expression::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                },
            )),
            Box::new(parse_postfix()),
        ]),
        "unary",
    )
}

enum Postfix {
    Member(String),
    Index(Expression),
    Transform {
        name: String,
        arguments: Vec<Expression>,
    },
}

fn parse_postfix() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(parse_primary(), many(parse_postfix_operation())),
            |(first, operations)| {
                operations
                    .into_iter()
                    .fold(first, |target, operation| match operation {
                        Postfix::Member(property) => Expression::Member {
                            target: Box::new(target),
                            property,
                        },
                        Postfix::Index(index) => Expression::Index {
                            target: Box::new(target),
                            index: Box::new(index),
                        },
                        Postfix::Transform { name, arguments } => Expression::OperatorCall {
                            name,
                            arguments: std::iter::once(target).chain(arguments).collect(),
                        },
                    })
            },
        ),
        "postfix",
    )
}

fn parse_postfix_operation() -> impl Parser<Token, Postfix> {
    choice(vec![
        Box::new(map(
            preceded(as_unit(parse_dot()), parse_identifier()),
            Postfix::Member,
        )),
        Box::new(map(
            delimited(
                as_unit(parse_open_bracket()),
                lazy(parse_expression),
                as_unit(parse_close_bracket()),
            ),
            Postfix::Index,
        )),
        Box::new(map(
            preceded(
                as_unit(parse_pipe()),
                tuple2(parse_identifier(), optional(parse_call_arguments())),
            ),
            |(name, arguments)| Postfix::Transform {
                name,
                arguments: arguments.unwrap_or_default(),
            },
        )),
    ])
}

fn parse_call_arguments() -> impl Parser<Token, Vec<Expression>> {
    with_context(
        delimited(
            as_unit(parse_open_paren()),
            separated_list(lazy(parse_expression), as_unit(parse_comma())),
            as_unit(parse_close_paren()),
        ),
        "arguments",
    )
}

fn parse_primary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(parse_group()),
            Box::new(parse_list()),
            Box::new(parse_map()),
            Box::new(parse_operator_call()),
            Box::new(map(parse_literal(), Expression::Literal)),
            Box::new(map(parse_identifier(), Expression::Identifier)),
        ]),
        "primary",
    )
}

fn parse_group() -> impl Parser<Token, Expression> {
    delimited(
        as_unit(parse_open_paren()),
        lazy(parse_expression),
        as_unit(parse_close_paren()),
    )
}

fn parse_list() -> impl Parser<Token, Expression> {
    with_context(
        map(
            delimited(
                as_unit(parse_open_bracket()),
                separated_list(lazy(parse_expression), as_unit(parse_comma())),
                as_unit(parse_close_bracket()),
            ),
            Expression::List,
        ),
        "list",
    )
}

fn parse_map() -> impl Parser<Token, Expression> {
    with_context(
        map(
            delimited(
                as_unit(parse_open_brace()),
                separated_list(parse_map_entry(), as_unit(parse_comma())),
                as_unit(parse_close_brace()),
            ),
            Expression::Map,
        ),
        "map",
    )
}

fn parse_map_entry() -> impl Parser<Token, (String, Expression)> {
    with_context(
        map(
            tuple3(
                parse_map_key(),
                as_unit(parse_colon()),
                lazy(parse_expression),
            ),
            |(key, _, value)| (key, value),
        ),
        "map entry",
    )
}

fn parse_operator_call() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(parse_identifier(), parse_call_arguments()),
            |(name, arguments)| Expression::OperatorCall { name, arguments },
        ),
        "operator call",
    )
}
