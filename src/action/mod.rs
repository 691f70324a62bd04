//! Actions are the code a matching recipe runs.
//!
//! An action is built per run by an [`ActionFactory`] from the host
//! [`Driver`] and the recipe that selected it, then executed exactly once.

pub mod console_log;
pub mod registry;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::driver::Driver;
use crate::recipe::Recipe;

pub use console_log::{ConsoleLogAction, CONSOLE_LOG};
pub use registry::{register_builtin_actions, ActionRegistry};

#[async_trait]
pub trait Action: Send + Sync {
    async fn execute(&self) -> Result<(), ActionError>;
}

pub type ActionFactory = Arc<dyn Fn(Arc<dyn Driver>, Arc<Recipe>) -> Box<dyn Action> + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Invalid arguments for {action}: {message}")]
    InvalidArguments { action: String, message: String },

    #[error("Action failed: {0}")]
    Failed(String),

    /// The host refused or failed a driver call
    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Action panicked: {0}")]
    Panicked(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown action: {name}")]
pub struct UnknownActionError {
    pub name: String,
}
