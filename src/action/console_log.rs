use std::sync::Arc;

use async_trait::async_trait;

use super::{Action, ActionError};
use crate::driver::{Driver, LogLevel};
use crate::recipe::Recipe;

pub const CONSOLE_LOG: &str = "console-log";

/// Writes the recipe's `message` argument to the driver log.
pub struct ConsoleLogAction {
    driver: Arc<dyn Driver>,
    recipe: Arc<Recipe>,
}

impl ConsoleLogAction {
    pub fn new(driver: Arc<dyn Driver>, recipe: Arc<Recipe>) -> Self {
        Self { driver, recipe }
    }
}

#[async_trait]
impl Action for ConsoleLogAction {
    async fn execute(&self) -> Result<(), ActionError> {
        let message =
            self.recipe
                .argument_str("message")
                .ok_or_else(|| ActionError::InvalidArguments {
                    action: CONSOLE_LOG.to_string(),
                    message: "`message` must be a string".to_string(),
                })?;
        self.driver.log(message, LogLevel::Info);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_logs_message() {
        let mut driver = MockDriver::new();
        driver
            .expect_log()
            .with(eq("hello"), eq(LogLevel::Info))
            .times(1)
            .return_const(());

        let recipe = Recipe::new(1, "true", CONSOLE_LOG).with_argument("message", "hello");
        let action = ConsoleLogAction::new(Arc::new(driver), Arc::new(recipe));
        assert_eq!(action.execute().await, Ok(()));
    }

    #[tokio::test]
    async fn test_missing_message() {
        let mut driver = MockDriver::new();
        driver.expect_log().never();

        let recipe = Recipe::new(1, "true", CONSOLE_LOG).with_argument("message", 42);
        let action = ConsoleLogAction::new(Arc::new(driver), Arc::new(recipe));
        assert!(matches!(
            action.execute().await,
            Err(ActionError::InvalidArguments { .. })
        ));
    }
}
