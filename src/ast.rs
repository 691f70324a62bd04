//! Abstract syntax tree for filter expressions.

use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    /// A root name looked up in the context, e.g. `normandy`.
    Identifier(String),
    List(Vec<Expression>),
    Map(Vec<(String, Expression)>),
    /// `target.property`
    Member {
        target: Box<Expression>,
        property: String,
    },
    /// `target[index]`
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    /// An operator invocation, written either as `name(args)` or as the
    /// transform `args[0]|name(args[1..])`. The name is resolved at
    /// evaluation time so unknown names surface as evaluation errors.
    OperatorCall {
        name: String,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    /// Height of the tree, computed without recursion.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((expr, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            let next = depth + 1;
            match expr {
                Expression::Literal(_) | Expression::Identifier(_) => {}
                Expression::List(items) | Expression::OperatorCall {
                    arguments: items, ..
                } => pending.extend(items.iter().map(|item| (item, next))),
                Expression::Map(entries) => {
                    pending.extend(entries.iter().map(|(_, value)| (value, next)))
                }
                Expression::Member { target, .. } => pending.push((target, next)),
                Expression::Index { target, index } => {
                    pending.push((target, next));
                    pending.push((index, next));
                }
                Expression::UnaryOp { operand, .. } => pending.push((operand, next)),
                Expression::BinaryOp { left, right, .. } => {
                    pending.push((left, next));
                    pending.push((right, next));
                }
                Expression::Conditional {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    pending.push((condition, next));
                    pending.push((then_branch, next));
                    pending.push((else_branch, next));
                }
            }
        }
        deepest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulo,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = "<=")]
    LessThanEqual,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = ">=")]
    GreaterThanEqual,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
}

/// The closed set of operators filters may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
pub enum OperatorKind {
    #[strum(serialize = "date")]
    Date,
    #[strum(serialize = "stableSample")]
    StableSample,
    #[strum(serialize = "bucketSample")]
    BucketSample,
}

impl OperatorKind {
    /// Number of arguments the operator takes, including a piped value.
    pub fn arity(&self) -> usize {
        match self {
            OperatorKind::Date => 1,
            OperatorKind::StableSample => 2,
            OperatorKind::BucketSample => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_kind_from_name() {
        assert_eq!("date".parse::<OperatorKind>().unwrap(), OperatorKind::Date);
        assert_eq!(
            "stableSample".parse::<OperatorKind>().unwrap(),
            OperatorKind::StableSample
        );
        assert_eq!(
            "bucketSample".parse::<OperatorKind>().unwrap(),
            OperatorKind::BucketSample
        );
        assert!("StableSample".parse::<OperatorKind>().is_err());
        assert!("eval".parse::<OperatorKind>().is_err());
    }

    #[test]
    fn test_depth() {
        let leaf = Expression::Literal(Literal::Integer(1));
        assert_eq!(leaf.depth(), 1);

        let sum = Expression::BinaryOp {
            op: BinaryOperator::Add,
            left: Box::new(Expression::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(leaf.clone()),
            }),
            right: Box::new(leaf.clone()),
        };
        assert_eq!(sum.depth(), 3);
        assert_eq!(Expression::List(vec![sum, leaf]).depth(), 4);
    }

    #[test]
    fn test_binary_operator_display() {
        assert_eq!(BinaryOperator::GreaterThanEqual.to_string(), ">=");
        assert_eq!(BinaryOperator::In.to_string(), "in");
    }
}
