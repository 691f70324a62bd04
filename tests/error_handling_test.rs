use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use recipe_engine::{
    action::register_builtin_actions, driver::MockDriver, Action, ActionError, ActionRegistry,
    Context, LogLevel, Recipe, Runner, TracingDriver,
};

struct Counting(Arc<AtomicUsize>);

#[async_trait]
impl Action for Counting {
    async fn execute(&self) -> Result<(), ActionError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Failing;

#[async_trait]
impl Action for Failing {
    async fn execute(&self) -> Result<(), ActionError> {
        Err(ActionError::Failed("disk full".to_string()))
    }
}

fn registry(counter: Arc<AtomicUsize>) -> ActionRegistry {
    let registry = ActionRegistry::new();
    register_builtin_actions(&registry);
    registry.register("count", move |_, _| -> Box<dyn Action> {
        Box::new(Counting(counter.clone()))
    });
    registry.register("fail", |_, _| -> Box<dyn Action> { Box::new(Failing) });
    registry
}

fn recipe(id: u64, filter: &str, action: &str) -> Arc<Recipe> {
    Arc::new(Recipe::new(id, filter, action))
}

#[tokio::test]
async fn test_failing_action_does_not_affect_sibling() {
    let counter = Arc::new(AtomicUsize::new(0));
    let runner = Runner::new(registry(counter.clone()));

    let dispatched = runner.run(
        &[recipe(1, "true", "fail"), recipe(2, "true", "count")],
        &Context::new(),
        Arc::new(TracingDriver::new()),
    );
    let outcomes = dispatched.wait().await;

    assert_eq!(
        outcomes[0].result,
        Err(ActionError::Failed("disk full".to_string()))
    );
    assert_eq!(outcomes[1].result, Ok(()));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_action_is_skipped_and_reported() {
    let counter = Arc::new(AtomicUsize::new(0));
    let runner = Runner::new(registry(counter.clone()));

    let mut driver = MockDriver::new();
    driver
        .expect_log()
        .withf(|message, level| *level == LogLevel::Warn && message.contains("nonexistent"))
        .times(1)
        .return_const(());

    let dispatched = runner.run(
        &[recipe(1, "true", "nonexistent"), recipe(2, "true", "count")],
        &Context::new(),
        Arc::new(driver),
    );

    assert_eq!(dispatched.skipped().len(), 1);
    let outcomes = dispatched.wait().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].recipe.id, 2);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_broken_filters_do_not_stop_the_run() {
    let counter = Arc::new(AtomicUsize::new(0));
    let runner = Runner::new(registry(counter.clone()));
    let deeply_nested = format!("{}true{}", "(".repeat(500), ")".repeat(500));

    let dispatched = runner.run(
        &[
            recipe(1, "fooBarBaz", "count"),
            recipe(7, &deeply_nested, "count"),
            recipe(2, "1 / 0", "count"),
            recipe(3, "stableSample('x', 7)", "count"),
            recipe(4, "unknownOp(1)", "count"),
            recipe(5, "((", "count"),
            recipe(6, "2 + 2 == 4", "count"),
        ],
        &Context::new(),
        Arc::new(TracingDriver::new()),
    );

    let errors = dispatched
        .matches()
        .iter()
        .filter(|m| m.error.is_some())
        .count();
    assert_eq!(errors, 6);
    dispatched.wait().await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_each_matched_recipe_runs_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let runner = Runner::new(registry(counter.clone()));
    let recipes: Vec<Arc<Recipe>> = (0..20)
        .map(|id| recipe(id, "true", "count"))
        .collect();

    let outcomes = runner
        .run(&recipes, &Context::new(), Arc::new(TracingDriver::new()))
        .wait()
        .await;

    assert_eq!(outcomes.len(), 20);
    assert_eq!(counter.load(Ordering::SeqCst), 20);
}
