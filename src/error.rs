use thiserror::Error;

use crate::action::{ActionError, UnknownActionError};
use crate::client::RunError;
use crate::config::ConfigError;
use crate::context::ContextError;
use crate::eval::ExpressionError;
use crate::sampling::SamplingError;
use crate::source::SourceError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),
    #[error("Sampling error: {0}")]
    Sampling(#[from] SamplingError),
    #[error("Context error: {0}")]
    Context(#[from] ContextError),
    #[error("{0}")]
    UnknownAction(#[from] UnknownActionError),
    #[error("Action error: {0}")]
    Action(#[from] ActionError),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Run error: {0}")]
    Run(#[from] RunError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(source: &str) -> InternalResult<bool> {
        let context = crate::context::Context::new();
        let value = crate::eval::ExpressionEvaluator::new().evaluate(source, &context)?;
        Ok(value.is_truthy())
    }

    #[test]
    fn test_conversions() {
        assert!(evaluate("1 < 2").unwrap());
        let err = evaluate("nope").unwrap_err();
        assert!(matches!(err, Error::Expression(_)));
        assert_eq!(err.to_string(), "Expression error: Unknown identifier: nope");

        let err: Error = UnknownActionError {
            name: "x".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Unknown action: x");
    }
}
