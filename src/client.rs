//! The periodic client: fetch, match, dispatch, sleep, repeat.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::action::ActionRegistry;
use crate::config::ClientConfig;
use crate::driver::Driver;
use crate::recipe::Recipe;
use crate::runner::{Dispatched, RunPhase, Runner};
use crate::source::{ContextSource, RecipeSource, SourceError};

/// Failures that abort a whole run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to fetch recipes: {0}")]
    Recipes(#[source] SourceError),
    #[error("Failed to fetch context: {0}")]
    Context(#[source] SourceError),
}

pub struct RecipeClient {
    config: ClientConfig,
    runner: Runner,
    recipes: Arc<dyn RecipeSource>,
    context: Arc<dyn ContextSource>,
    driver: Arc<dyn Driver>,
}

impl RecipeClient {
    pub fn new(
        config: ClientConfig,
        registry: ActionRegistry,
        recipes: Arc<dyn RecipeSource>,
        context: Arc<dyn ContextSource>,
        driver: Arc<dyn Driver>,
    ) -> Self {
        let runner = Runner::new(registry).log_actions(config.log_actions);
        Self {
            config,
            runner,
            recipes,
            context,
            driver,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// One complete pass. Only a failed fetch is reported as an error;
    /// per-recipe failures are logged and contained.
    pub async fn run_once(&self) -> Result<Dispatched, RunError> {
        debug!("Run phase: {}", RunPhase::Fetching);
        let recipes: Vec<Arc<Recipe>> = self
            .recipes
            .fetch_recipes()
            .await
            .map_err(RunError::Recipes)?
            .into_iter()
            .map(Arc::new)
            .collect();

        let mut context = self
            .context
            .fetch_context()
            .await
            .map_err(RunError::Context)?;
        self.context
            .resolve_late(&mut context)
            .await
            .map_err(RunError::Context)?;

        Ok(self.runner.run(&recipes, &context, self.driver.clone()))
    }

    /// Runs every `run_interval` until `run_limit` runs have happened or
    /// `shutdown` fires. Returns the number of runs.
    ///
    /// Dropping the shutdown sender also stops the loop.
    pub async fn start(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        if !self.config.enabled {
            info!("Recipe client disabled");
            return 0;
        }
        if let Err(e) = self.config.validate() {
            error!("Recipe client not started: {}", e);
            return 0;
        }

        tokio::select! {
            _ = tokio::time::sleep(self.config.startup_delay) => {}
            _ = shutdown.changed() => {
                info!("Recipe client stopped before the first run");
                return 0;
            }
        }

        let mut interval = tokio::time::interval(self.config.run_interval);
        let mut runs = 0;
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => break,
            }

            match self.run_once().await {
                Ok(dispatched) => info!("Run {} dispatched {} actions", runs + 1, dispatched.len()),
                Err(e) => error!("Run {} failed: {}", runs + 1, e),
            }
            runs += 1;

            if self.config.run_limit.is_some_and(|limit| runs >= limit) {
                break;
            }
        }
        info!("Recipe client stopped after {} runs", runs);
        runs
    }
}
