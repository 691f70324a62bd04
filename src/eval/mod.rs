//! Filter expression evaluation.
//!
//! A filter is compiled once into an [`Expression`](crate::ast::Expression)
//! and then evaluated against a [`Context`](crate::context::Context):
//!
//! ```text
//! Filter text → Preprocessor → Tokenizer → Parser → Evaluator → Value
//! ```
//!
//! Evaluation is synchronous and never mutates the context. The custom
//! operators (`date`, `stableSample`, `bucketSample`) live in [`operators`].

pub mod evaluator;
pub mod operators;
pub mod value;

pub use evaluator::{EvalResult, ExpressionError, ExpressionEvaluator};
pub use value::Value;
