use recipe_engine::{
    analyzer::parse_filter,
    ast::{BinaryOperator, Expression, Literal},
    preprocessor::Preprocessor,
    tokenizer::token::Tokenizer,
    Context, ContextBuilder, ExpressionError, ExpressionEvaluator, Value,
};

extern crate recipe_engine;

fn parse(input: &str) -> Expression {
    let preprocessor = Preprocessor::new();
    let tokens = Tokenizer::new()
        .tokenize(&preprocessor.normalize(input))
        .unwrap();
    parse_filter(&preprocessor.strip_trivia(tokens)).unwrap()
}

#[test]
fn it_parses_arithmetic_comparison() {
    assert_eq!(
        parse("2 + 2 == 4"),
        Expression::BinaryOp {
            op: BinaryOperator::Equal,
            left: Box::new(Expression::BinaryOp {
                op: BinaryOperator::Add,
                left: Box::new(Expression::Literal(Literal::Integer(2))),
                right: Box::new(Expression::Literal(Literal::Integer(2))),
            }),
            right: Box::new(Expression::Literal(Literal::Integer(4))),
        }
    );
}

#[test]
fn it_parses_a_multiline_targeting_filter() {
    let input = r#"
        client.channel in ["beta", "release"]
        && client.country == 'DE'
        && [client.userId, "exp-14"]|bucketSample([0, 49], 1000)
        && client.request_time > "2020-01-01"|date
    "#;
    let expr = parse(input);
    assert!(matches!(
        expr,
        Expression::BinaryOp {
            op: BinaryOperator::And,
            ..
        }
    ));
}

#[test]
fn always_true_filter_matches_empty_context() {
    let value = ExpressionEvaluator::new()
        .evaluate("2 + 2 == 4", &Context::new())
        .unwrap();
    assert_eq!(value, Value::Boolean(true));
}

#[test]
fn unknown_identifier_is_an_error() {
    let result = ExpressionEvaluator::new().evaluate("fooBarBaz", &Context::new());
    assert_eq!(
        result,
        Err(ExpressionError::UnknownIdentifier("fooBarBaz".to_string()))
    );
}

#[test]
fn date_operator_orders_dates() {
    let evaluator = ExpressionEvaluator::new();
    let context = Context::new();
    assert_eq!(
        evaluator.evaluate("date('2020-01-01') < date('2021-01-01')", &context),
        Ok(Value::Boolean(true))
    );
    assert_eq!(
        evaluator.evaluate("'2021-01-01'|date < '2020-01-01'|date", &context),
        Ok(Value::Boolean(false))
    );
}

#[test]
fn filters_see_builder_facts() {
    let now = chrono::DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let context = ContextBuilder::new()
        .client_id("abc")
        .channel("release")
        .country("DE")
        .request_time(now)
        .build()
        .unwrap();

    let value = ExpressionEvaluator::new()
        .evaluate(
            "client.channel in ['beta', 'release'] && client.request_time > '2020-01-01'|date",
            &context,
        )
        .unwrap();
    assert_eq!(value, Value::Boolean(true));
}

#[test]
fn syntax_errors_are_reported() {
    let evaluator = ExpressionEvaluator::new();
    for input in ["(1 + 2", "client.", "[1, 2", "a ? b", "1 2"] {
        assert!(
            matches!(
                evaluator.evaluate(input, &Context::new()),
                Err(ExpressionError::Syntax(_))
            ),
            "{} should not parse",
            input
        );
    }
}

#[test]
fn conditionals_nest_through_the_expression_entry_point() {
    let value = ExpressionEvaluator::new()
        .evaluate("false ? 1 : (true ? 3 : 4)", &Context::new())
        .unwrap();
    assert_eq!(value, Value::Integer(3));
}
