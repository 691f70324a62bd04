//! The custom operators filters may call, by name or as pipe transforms.
//!
//! | Operator | Arguments | Result |
//! |---|---|---|
//! | `date` | string or epoch milliseconds | date |
//! | `stableSample` | seed, rate | boolean |
//! | `bucketSample` | seed, `[low, high]`, total | boolean |

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::evaluator::{EvalResult, ExpressionError};
use super::value::Value;
use crate::ast::OperatorKind;
use crate::sampling::{self, BucketRange};

/// Applies an operator to already evaluated arguments.
pub fn apply(kind: OperatorKind, args: &[Value]) -> EvalResult<Value> {
    if args.len() != kind.arity() {
        return Err(ExpressionError::Arity {
            operator: kind,
            expected: kind.arity(),
            found: args.len(),
        });
    }

    match kind {
        OperatorKind::Date => to_date(&args[0]).map(Value::Date),
        OperatorKind::StableSample => {
            let rate = args[1].as_f64().ok_or_else(|| ExpressionError::InvalidArgument {
                operator: kind,
                message: format!("rate must be a number, got {}", args[1].type_name()),
            })?;
            Ok(Value::Boolean(sampling::stable_sample(
                &args[0].seed_text(),
                rate,
            )?))
        }
        OperatorKind::BucketSample => {
            let range = bucket_range(&args[1])?;
            let total = count(kind, &args[2], "total")?;
            Ok(Value::Boolean(sampling::bucket_sample(
                &args[0].seed_text(),
                range,
                total,
            )?))
        }
    }
}

fn to_date(value: &Value) -> EvalResult<DateTime<Utc>> {
    match value {
        Value::Date(date) => Ok(*date),
        Value::String(text) => parse_date(text),
        Value::Integer(millis) => DateTime::from_timestamp_millis(*millis)
            .ok_or_else(|| ExpressionError::InvalidDate(millis.to_string())),
        Value::Float(millis) if millis.is_finite() => {
            DateTime::from_timestamp_millis(*millis as i64)
                .ok_or_else(|| ExpressionError::InvalidDate(millis.to_string()))
        }
        other => Err(ExpressionError::InvalidDate(other.to_string())),
    }
}

fn parse_date(text: &str) -> EvalResult<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Ok(date.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
        .ok_or_else(|| ExpressionError::InvalidDate(text.to_string()))
}

fn bucket_range(value: &Value) -> EvalResult<BucketRange> {
    let operator = OperatorKind::BucketSample;
    match value {
        Value::List(bounds) if bounds.len() == 2 => Ok(BucketRange::new(
            count(operator, &bounds[0], "range start")?,
            count(operator, &bounds[1], "range end")?,
        )),
        other => Err(ExpressionError::InvalidArgument {
            operator,
            message: format!("bucket range must be a [low, high] list, got {}", other),
        }),
    }
}

fn count(operator: OperatorKind, value: &Value, what: &str) -> EvalResult<u64> {
    let invalid = || ExpressionError::InvalidArgument {
        operator,
        message: format!("{} must be a non-negative integer, got {}", what, value),
    };
    match value {
        Value::Integer(i) => u64::try_from(*i).map_err(|_| invalid()),
        Value::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Ok(*f as u64),
        _ => Err(invalid()),
    }
}
