use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recipe_engine::{sampling, ContextBuilder, ExpressionEvaluator, Recipe, RecipeMatcher};

const FILTER: &str = "client.country in ['DE', 'FR'] && \
    [client.userId, 'rollout']|stableSample(0.25) && \
    date('2020-01-01') < date('2021-01-01')";

fn bench_evaluate(c: &mut Criterion) {
    let context = ContextBuilder::new()
        .client_id("0b2f6c1e")
        .country("DE")
        .build()
        .unwrap();
    let evaluator = ExpressionEvaluator::new();

    c.bench_function("compile and evaluate filter", |b| {
        b.iter(|| evaluator.evaluate(black_box(FILTER), &context))
    });

    let compiled = evaluator.compile(FILTER).unwrap();
    c.bench_function("evaluate compiled filter", |b| {
        b.iter(|| evaluator.eval_expression(black_box(&compiled), &context))
    });

    let matcher = RecipeMatcher::new();
    let recipes: Vec<Arc<Recipe>> = (0..100)
        .map(|id| Arc::new(Recipe::new(id, FILTER, "console-log")))
        .collect();
    c.bench_function("match 100 cached recipes", |b| {
        b.iter(|| matcher.match_recipes(black_box(&recipes), &context))
    });
}

fn bench_sampling(c: &mut Criterion) {
    c.bench_function("stable sample", |b| {
        b.iter(|| sampling::stable_sample(black_box("rollout-0b2f6c1e"), 0.5))
    });
    c.bench_function("bucket index", |b| {
        b.iter(|| sampling::bucket_index(black_box("rollout-0b2f6c1e"), 10_000))
    });
}

criterion_group!(benches, bench_evaluate, bench_sampling);
criterion_main!(benches);
