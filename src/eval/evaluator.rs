use std::cmp::Ordering;
use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use super::operators;
use super::value::Value;
use crate::analyzer::{parse_filter, ParseError};
use crate::ast::{BinaryOperator, Expression, Literal, OperatorKind, UnaryOperator};
use crate::context::Context;
use crate::preprocessor::Preprocessor;
use crate::sampling::SamplingError;
use crate::tokenizer::token::{Tokenizer, TokenizerError};

pub type EvalResult<T> = Result<T, ExpressionError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Filter text that does not tokenize
    #[error("Tokenize error: {0}")]
    Tokenize(#[from] TokenizerError),

    /// Tokens that do not form an expression
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),

    /// Root name missing from the context
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Operator name outside the supported set
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Operator {operator} takes {expected} arguments, got {found}")]
    Arity {
        operator: OperatorKind,
        expected: usize,
        found: usize,
    },

    #[error("Invalid argument to {operator}: {message}")]
    InvalidArgument {
        operator: OperatorKind,
        message: String,
    },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Sampling error: {0}")]
    Sampling(#[from] SamplingError),

    /// Filter nested deeper than the evaluator accepts
    #[error("Expression nested {depth} levels deep, limit is {limit}")]
    TooDeep { depth: usize, limit: usize },
}

/// Deepest bracket, prefix and conditional nesting the parser will accept.
pub const MAX_NESTING_DEPTH: usize = 32;
/// Tallest expression tree the evaluator will walk.
pub const MAX_EXPRESSION_DEPTH: usize = 256;

fn check_depth(depth: usize, limit: usize) -> EvalResult<()> {
    if depth > limit {
        return Err(ExpressionError::TooDeep { depth, limit });
    }
    Ok(())
}

fn mismatch(op: impl std::fmt::Display, left: &Value, right: &Value) -> ExpressionError {
    ExpressionError::TypeMismatch(format!(
        "{} {} {}",
        left.type_name(),
        op,
        right.type_name()
    ))
}

/// Compiles filter text and evaluates the result against a [`Context`].
pub struct ExpressionEvaluator {
    preprocessor: Preprocessor,
}

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self {
            preprocessor: Preprocessor::new(),
        }
    }

    /// Parses filter text into an expression tree.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn compile(&self, source: &str) -> EvalResult<Expression> {
        let normalized = self.preprocessor.normalize(source);
        let spans = Tokenizer::new().tokenize(&normalized)?;
        let tokens = self.preprocessor.strip_trivia(spans);
        check_depth(self.preprocessor.nesting_depth(&tokens), MAX_NESTING_DEPTH)?;
        debug!("Parsing {} tokens", tokens.len());
        let expression = parse_filter(&tokens)?;
        check_depth(expression.depth(), MAX_EXPRESSION_DEPTH)?;
        Ok(expression)
    }

    pub fn evaluate(&self, source: &str, context: &Context) -> EvalResult<Value> {
        let expression = self.compile(source)?;
        self.eval_expression(&expression, context)
    }

    pub fn eval_expression(&self, expr: &Expression, context: &Context) -> EvalResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(Self::eval_literal(lit)),
            Expression::Identifier(name) => context
                .get(name)
                .cloned()
                .ok_or_else(|| ExpressionError::UnknownIdentifier(name.clone())),
            Expression::List(items) => items
                .iter()
                .map(|item| self.eval_expression(item, context))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::List),
            Expression::Map(entries) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval_expression(value, context)?);
                }
                Ok(Value::Map(map))
            }
            Expression::Member { target, property } => {
                let target = self.eval_expression(target, context)?;
                Self::eval_member(&target, property)
            }
            Expression::Index { target, index } => {
                let target = self.eval_expression(target, context)?;
                let index = self.eval_expression(index, context)?;
                Self::eval_index(&target, &index)
            }
            Expression::UnaryOp { op, operand } => {
                let operand = self.eval_expression(operand, context)?;
                Self::eval_unary_op(*op, &operand)
            }
            Expression::BinaryOp { op, left, right } => {
                self.eval_binary_op(*op, left, right, context)
            }
            Expression::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_expression(condition, context)?.is_truthy() {
                    self.eval_expression(then_branch, context)
                } else {
                    self.eval_expression(else_branch, context)
                }
            }
            Expression::OperatorCall { name, arguments } => {
                self.eval_operator_call(name, arguments, context)
            }
        }
    }

    fn eval_literal(lit: &Literal) -> Value {
        match lit {
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Null => Value::Null,
        }
    }

    fn eval_member(target: &Value, property: &str) -> EvalResult<Value> {
        match (target, property) {
            // Missing keys and absent parents read as null so optional
            // fields can be tested for without failing the whole filter.
            (Value::Map(map), _) => Ok(map.get(property).cloned().unwrap_or_default()),
            (Value::Null, _) => Ok(Value::Null),
            (Value::List(items), "length") => Ok(Value::Integer(items.len() as i64)),
            (Value::String(s), "length") => Ok(Value::Integer(s.chars().count() as i64)),
            _ => Err(ExpressionError::TypeMismatch(format!(
                "{} has no property {}",
                target.type_name(),
                property
            ))),
        }
    }

    fn eval_index(target: &Value, index: &Value) -> EvalResult<Value> {
        match (target, index) {
            (Value::List(items), Value::Integer(i)) => Ok(usize::try_from(*i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or_default()),
            (Value::Map(map), Value::String(key)) => {
                Ok(map.get(key).cloned().unwrap_or_default())
            }
            (Value::Null, _) => Ok(Value::Null),
            _ => Err(ExpressionError::TypeMismatch(format!(
                "cannot index {} with {}",
                target.type_name(),
                index.type_name()
            ))),
        }
    }

    fn eval_unary_op(op: UnaryOperator, operand: &Value) -> EvalResult<Value> {
        match (op, operand) {
            (UnaryOperator::Not, value) => Ok(Value::Boolean(!value.is_truthy())),
            (UnaryOperator::Negate, Value::Integer(i)) => Ok(i
                .checked_neg()
                .map(Value::Integer)
                .unwrap_or(Value::Float(-(*i as f64)))),
            (UnaryOperator::Negate, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnaryOperator::Negate, other) => Err(ExpressionError::TypeMismatch(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        }
    }

    fn eval_binary_op(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        context: &Context,
    ) -> EvalResult<Value> {
        let left_val = self.eval_expression(left, context)?;

        // Logical operators short-circuit.
        match op {
            BinaryOperator::And if !left_val.is_truthy() => return Ok(Value::Boolean(false)),
            BinaryOperator::Or if left_val.is_truthy() => return Ok(Value::Boolean(true)),
            _ => {}
        }

        let right_val = self.eval_expression(right, context)?;

        match op {
            BinaryOperator::Add => self.eval_add(&left_val, &right_val),
            BinaryOperator::Subtract => self.eval_subtract(&left_val, &right_val),
            BinaryOperator::Multiply => self.eval_multiply(&left_val, &right_val),
            BinaryOperator::Divide => self.eval_divide(&left_val, &right_val),
            BinaryOperator::Modulo => self.eval_modulo(&left_val, &right_val),
            BinaryOperator::Equal => Ok(Value::Boolean(loose_equals(&left_val, &right_val))),
            BinaryOperator::NotEqual => Ok(Value::Boolean(!loose_equals(&left_val, &right_val))),
            BinaryOperator::LessThan => {
                self.compare_values(op, &left_val, &right_val, Ordering::is_lt)
            }
            BinaryOperator::LessThanEqual => {
                self.compare_values(op, &left_val, &right_val, Ordering::is_le)
            }
            BinaryOperator::GreaterThan => {
                self.compare_values(op, &left_val, &right_val, Ordering::is_gt)
            }
            BinaryOperator::GreaterThanEqual => {
                self.compare_values(op, &left_val, &right_val, Ordering::is_ge)
            }
            BinaryOperator::In => self.eval_in(&left_val, &right_val),
            BinaryOperator::And | BinaryOperator::Or => Ok(Value::Boolean(right_val.is_truthy())),
        }
    }

    fn eval_operator_call(
        &self,
        name: &str,
        arguments: &[Expression],
        context: &Context,
    ) -> EvalResult<Value> {
        let kind = name
            .parse::<OperatorKind>()
            .map_err(|_| ExpressionError::UnknownOperator(name.to_string()))?;
        let args = arguments
            .iter()
            .map(|arg| self.eval_expression(arg, context))
            .collect::<EvalResult<Vec<_>>>()?;
        operators::apply(kind, &args)
    }

    fn eval_add(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        match (left, right) {
            (Value::String(l), r) => Ok(Value::String(format!("{}{}", l, r))),
            (l, Value::String(r)) => Ok(Value::String(format!("{}{}", l, r))),
            _ => arithmetic(BinaryOperator::Add, left, right, i64::checked_add, |l, r| l + r),
        }
    }

    fn eval_subtract(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        arithmetic(
            BinaryOperator::Subtract,
            left,
            right,
            i64::checked_sub,
            |l, r| l - r,
        )
    }

    fn eval_multiply(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        arithmetic(
            BinaryOperator::Multiply,
            left,
            right,
            i64::checked_mul,
            |l, r| l * r,
        )
    }

    fn eval_divide(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        if right.as_f64() == Some(0.0) {
            return Err(ExpressionError::DivisionByZero);
        }
        match (left, right) {
            (Value::Integer(l), Value::Integer(r)) if l.checked_rem(*r) == Some(0) => {
                Ok(Value::Integer(l / r))
            }
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(l), Some(r)) => Ok(Value::Float(l / r)),
                _ => Err(mismatch(BinaryOperator::Divide, left, right)),
            },
        }
    }

    fn eval_modulo(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        if right.as_f64() == Some(0.0) {
            return Err(ExpressionError::DivisionByZero);
        }
        arithmetic(
            BinaryOperator::Modulo,
            left,
            right,
            i64::checked_rem,
            |l, r| l % r,
        )
    }

    fn eval_in(&self, needle: &Value, haystack: &Value) -> EvalResult<Value> {
        match (needle, haystack) {
            (Value::String(n), Value::String(h)) => Ok(Value::Boolean(h.contains(n.as_str()))),
            (n, Value::List(items)) => Ok(Value::Boolean(
                items.iter().any(|item| loose_equals(n, item)),
            )),
            (Value::String(key), Value::Map(map)) => Ok(Value::Boolean(map.contains_key(key))),
            _ => Err(mismatch(BinaryOperator::In, needle, haystack)),
        }
    }

    fn compare_values<F>(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
        compare: F,
    ) -> EvalResult<Value>
    where
        F: Fn(Ordering) -> bool,
    {
        let ordering = match (left, right) {
            (Value::Integer(l), Value::Integer(r)) => Some(l.cmp(r)),
            (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
            (Value::Date(l), Value::Date(r)) => Some(l.cmp(r)),
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(l), Some(r)) => l.partial_cmp(&r),
                _ => return Err(mismatch(op, left, right)),
            },
        };
        // NaN compares false with everything.
        Ok(Value::Boolean(ordering.is_some_and(compare)))
    }
}

/// Integer arithmetic that widens to float on overflow, float otherwise.
fn arithmetic(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult<Value> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => Ok(int_op(*l, *r)
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Float(float_op(*l as f64, *r as f64)))),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => Ok(Value::Float(float_op(l, r))),
            _ => Err(mismatch(op, left, right)),
        },
    }
}

/// Equality that treats integers and floats of the same magnitude as equal.
fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => l == r,
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            left.as_f64() == right.as_f64()
        }
        (Value::List(l), Value::List(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| loose_equals(l, r))
        }
        (Value::Map(l), Value::Map(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, value)| r.get(key).is_some_and(|other| loose_equals(value, other)))
        }
        _ => left == right,
    }
}
