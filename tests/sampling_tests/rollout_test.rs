use proptest::prelude::*;
use recipe_engine::{ast::Expression, ContextBuilder, ExpressionEvaluator, Value};

struct Filter {
    evaluator: ExpressionEvaluator,
    expression: Expression,
}

impl Filter {
    fn new(source: &str) -> Self {
        let evaluator = ExpressionEvaluator::new();
        let expression = evaluator.compile(source).unwrap();
        Self {
            evaluator,
            expression,
        }
    }

    fn selects(&self, client_id: &str) -> bool {
        let context = ContextBuilder::new().client_id(client_id).build().unwrap();
        self.evaluator
            .eval_expression(&self.expression, &context)
            .unwrap()
            .is_truthy()
    }
}

fn share(filter: &str, clients: usize) -> f64 {
    let filter = Filter::new(filter);
    let hits = (0..clients)
        .filter(|i| filter.selects(&format!("client-{}", i)))
        .count();
    hits as f64 / clients as f64
}

#[test]
fn test_rollout_rate_converges() {
    for rate in [0.05, 0.3, 0.75] {
        let filter = format!("[client.userId, 'rollout']|stableSample({})", rate);
        let observed = share(&filter, 20_000);
        assert!(
            (observed - rate).abs() < 0.015,
            "rate {} observed {}",
            rate,
            observed
        );
    }
}

#[test]
fn test_full_bucket_range_selects_everyone() {
    assert_eq!(
        share("client.userId|bucketSample([0, 9999], 10000)", 2_000),
        1.0
    );
}

#[test]
fn test_bucket_prefix_agrees_with_rate() {
    let bucket = Filter::new("bucketSample(client.userId, [0, 24], 100)");
    let stable = Filter::new("stableSample(client.userId, 0.25)");
    for i in 0..2_000 {
        let id = format!("client-{}", i);
        assert_eq!(
            bucket.selects(&id),
            stable.selects(&id),
            "client {}",
            id
        );
    }
}

#[test]
fn test_experiments_are_independent() {
    // Different seed material should not select the same population.
    let first = Filter::new("[client.userId, 'a']|stableSample(0.5)");
    let second = Filter::new("[client.userId, 'b']|stableSample(0.5)");
    let mut both = 0;
    let clients = 10_000;
    for i in 0..clients {
        let id = format!("client-{}", i);
        if first.selects(&id) && second.selects(&id) {
            both += 1;
        }
    }
    let overlap = both as f64 / clients as f64;
    assert!((overlap - 0.25).abs() < 0.02, "overlap {}", overlap);
}

proptest! {
    #[test]
    fn sampling_is_deterministic_across_evaluators(id in "[a-z0-9-]{1,32}", rate in 0.0f64..=1.0) {
        let filter = format!("stableSample(client.userId, {:.4})", rate);
        let context = ContextBuilder::new().client_id(id).build().unwrap();
        let first = ExpressionEvaluator::new().evaluate(&filter, &context).unwrap();
        let second = ExpressionEvaluator::new().evaluate(&filter, &context).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(matches!(first, Value::Boolean(_)));
    }
}
