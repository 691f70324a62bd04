//! Matches recipes and dispatches their actions.
//!
//! A run moves through [`RunPhase`]s. Matching is sequential, dispatching
//! spawns one task per matched recipe. Each task builds and executes its
//! action and catches any error or panic, so a broken recipe never stops
//! its siblings.
//! [`Runner::run`] returns once every task is spawned; it does not wait
//! for the actions to finish.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use strum::Display;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::action::{ActionError, ActionFactory, ActionRegistry};
use crate::context::Context;
use crate::driver::{Driver, LogLevel};
use crate::matcher::{MatchResult, RecipeMatcher};
use crate::recipe::Recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RunPhase {
    Fetching,
    Matching,
    Dispatching,
    Done,
}

/// How one dispatched action ended.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub recipe: Arc<Recipe>,
    pub result: Result<(), ActionError>,
}

/// The actions one run started.
#[derive(Debug, Default)]
pub struct Dispatched {
    matches: Vec<MatchResult>,
    skipped: Vec<Arc<Recipe>>,
    tasks: Vec<(Arc<Recipe>, JoinHandle<Result<(), ActionError>>)>,
}

impl Dispatched {
    /// Verdicts for every recipe of the run, in input order.
    pub fn matches(&self) -> &[MatchResult] {
        &self.matches
    }

    /// Matched recipes whose action is not registered.
    pub fn skipped(&self) -> &[Arc<Recipe>] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every dispatched action.
    pub async fn wait(self) -> Vec<ActionOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (recipe, handle) in self.tasks {
            let result = match handle.await {
                Ok(result) => result,
                // Panics are caught inside the task; this is cancellation.
                Err(e) => Err(ActionError::Failed(e.to_string())),
            };
            outcomes.push(ActionOutcome { recipe, result });
        }
        outcomes
    }
}

pub struct Runner {
    registry: ActionRegistry,
    matcher: Arc<RecipeMatcher>,
    log_actions: bool,
}

impl Runner {
    pub fn new(registry: ActionRegistry) -> Self {
        Self {
            registry,
            matcher: Arc::new(RecipeMatcher::new()),
            log_actions: true,
        }
    }

    /// Echo dispatch failures through the driver log as well as `tracing`.
    pub fn log_actions(mut self, enabled: bool) -> Self {
        self.log_actions = enabled;
        self
    }

    pub fn matcher(&self) -> &RecipeMatcher {
        &self.matcher
    }

    /// Matches `recipes` against `context` and spawns the matching actions.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(
        &self,
        recipes: &[Arc<Recipe>],
        context: &Context,
        driver: Arc<dyn Driver>,
    ) -> Dispatched {
        enter(RunPhase::Matching);
        let matches = self.matcher.match_recipes(recipes, context);

        enter(RunPhase::Dispatching);
        let mut dispatched = Dispatched::default();
        for result in matches.iter().filter(|r| r.matched) {
            let recipe = result.recipe.clone();
            let factory = match self.registry.resolve(&recipe.action) {
                Ok(factory) => factory,
                Err(e) => {
                    warn!(recipe_id = recipe.id, "Skipping recipe: {}", e);
                    if self.log_actions {
                        driver.log(
                            &format!("Skipping recipe {}: {}", recipe.id, e),
                            LogLevel::Warn,
                        );
                    }
                    dispatched.skipped.push(recipe);
                    continue;
                }
            };

            let handle = tokio::spawn(execute_isolated(
                factory,
                recipe.clone(),
                driver.clone(),
                self.log_actions,
            ));
            dispatched.tasks.push((recipe, handle));
        }

        info!(
            "Dispatched {} actions for {} recipes ({} skipped)",
            dispatched.tasks.len(),
            recipes.len(),
            dispatched.skipped.len()
        );
        dispatched.matches = matches;
        enter(RunPhase::Done);
        dispatched
    }
}

fn enter(phase: RunPhase) {
    debug!("Run phase: {}", phase);
}

async fn execute_isolated(
    factory: ActionFactory,
    recipe: Arc<Recipe>,
    driver: Arc<dyn Driver>,
    log_actions: bool,
) -> Result<(), ActionError> {
    let built = std::panic::catch_unwind(AssertUnwindSafe(|| {
        factory(driver.clone(), recipe.clone())
    }));
    let result = match built {
        Ok(action) => match AssertUnwindSafe(action.execute()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(ActionError::Panicked(panic_message(panic.as_ref()))),
        },
        Err(panic) => Err(ActionError::Panicked(panic_message(panic.as_ref()))),
    };

    match &result {
        Ok(()) => debug!(recipe_id = recipe.id, "Action {} finished", recipe.action),
        Err(e) => {
            error!(recipe_id = recipe.id, "Action {} failed: {}", recipe.action, e);
            if log_actions {
                driver.log(
                    &format!("Recipe {} action {} failed: {}", recipe.id, recipe.action, e),
                    LogLevel::Error,
                );
            }
        }
    }
    result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
