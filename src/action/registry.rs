use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::{Action, ActionFactory, ConsoleLogAction, UnknownActionError, CONSOLE_LOG};
use crate::driver::Driver;
use crate::recipe::Recipe;

/// Maps action names to factories.
///
/// Populated once at start-up and only read afterwards. Clones share the
/// same table.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    factories: Arc<DashMap<String, ActionFactory>>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`. A second registration of the same
    /// name replaces the first.
    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn(Arc<dyn Driver>, Arc<Recipe>) -> Box<dyn Action> + Send + Sync + 'static,
    {
        if self
            .factories
            .insert(name.to_string(), Arc::new(factory))
            .is_some()
        {
            warn!("Action {} registered twice, replacing the earlier factory", name);
        } else {
            debug!("Registered action {}", name);
        }
    }

    /// Looks up a factory by exact, case-sensitive name.
    pub fn resolve(&self, name: &str) -> Result<ActionFactory, UnknownActionError> {
        self.factories
            .get(name)
            .map(|factory| factory.value().clone())
            .ok_or_else(|| UnknownActionError {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Installs the actions every host gets.
pub fn register_builtin_actions(registry: &ActionRegistry) {
    registry.register(CONSOLE_LOG, |driver, recipe| -> Box<dyn Action> {
        Box::new(ConsoleLogAction::new(driver, recipe))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionError;
    use crate::driver::TracingDriver;
    use async_trait::async_trait;

    struct Fixed(Result<(), ActionError>);

    #[async_trait]
    impl Action for Fixed {
        async fn execute(&self) -> Result<(), ActionError> {
            self.0.clone()
        }
    }

    fn build(registry: &ActionRegistry, name: &str) -> Box<dyn Action> {
        let factory = registry.resolve(name).unwrap();
        factory(
            Arc::new(TracingDriver::new()),
            Arc::new(Recipe::new(1, "true", name)),
        )
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let registry = ActionRegistry::new();
        registry.register("show", |_, _| -> Box<dyn Action> { Box::new(Fixed(Ok(()))) });
        registry.register("show", |_, _| -> Box<dyn Action> {
            Box::new(Fixed(Err(ActionError::Failed("second".to_string()))))
        });

        assert_eq!(registry.len(), 1);
        assert_eq!(
            build(&registry, "show").execute().await,
            Err(ActionError::Failed("second".to_string()))
        );
    }

    #[test]
    fn test_resolve_is_exact() {
        let registry = ActionRegistry::new();
        register_builtin_actions(&registry);

        assert!(registry.resolve("console-log").is_ok());
        assert_eq!(
            registry.resolve("Console-Log").err(),
            Some(UnknownActionError {
                name: "Console-Log".to_string()
            })
        );
        assert!(registry.resolve("console-log ").is_err());
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = ActionRegistry::new();
        registry.register("zeta", |_, _| -> Box<dyn Action> { Box::new(Fixed(Ok(()))) });
        register_builtin_actions(&registry);
        registry.register("alpha", |_, _| -> Box<dyn Action> { Box::new(Fixed(Ok(()))) });

        assert_eq!(registry.names(), vec!["alpha", "console-log", "zeta"]);
    }

    #[test]
    fn test_clones_share_the_table() {
        let registry = ActionRegistry::new();
        let clone = registry.clone();
        register_builtin_actions(&clone);
        assert!(!registry.is_empty());
    }
}
