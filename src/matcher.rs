//! Decides which recipes apply to the current client.
//!
//! Every recipe is judged on its own: a filter that fails to parse or
//! evaluate makes that recipe non-matching and is logged, the remaining
//! recipes are still evaluated.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::ast::Expression;
use crate::context::Context;
use crate::eval::{EvalResult, ExpressionError, ExpressionEvaluator};
use crate::recipe::{Recipe, RecipeId};

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub recipe: Arc<Recipe>,
    pub matched: bool,
    /// Why the filter could not be evaluated, if it could not.
    pub error: Option<ExpressionError>,
}

pub struct RecipeMatcher {
    evaluator: ExpressionEvaluator,
    compiled: DashMap<(RecipeId, String), Arc<Expression>>,
}

impl Default for RecipeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeMatcher {
    pub fn new() -> Self {
        Self {
            evaluator: ExpressionEvaluator::new(),
            compiled: DashMap::new(),
        }
    }

    /// Results are returned in input order.
    pub fn match_recipes(&self, recipes: &[Arc<Recipe>], context: &Context) -> Vec<MatchResult> {
        let results: Vec<MatchResult> = recipes
            .iter()
            .map(|recipe| self.match_recipe(recipe.clone(), context))
            .collect();
        debug!(
            "Matched {} of {} recipes",
            results.iter().filter(|r| r.matched).count(),
            results.len()
        );
        results
    }

    pub fn match_recipe(&self, recipe: Arc<Recipe>, context: &Context) -> MatchResult {
        let verdict = self
            .filter_for(&recipe)
            .and_then(|filter| self.evaluator.eval_expression(&filter, context));

        match verdict {
            Ok(value) => MatchResult {
                matched: value.is_truthy(),
                recipe,
                error: None,
            },
            Err(e) => {
                warn!(
                    recipe_id = recipe.id,
                    "Filter `{}` failed: {}", recipe.filter_expression, e
                );
                MatchResult {
                    recipe,
                    matched: false,
                    error: Some(e),
                }
            }
        }
    }

    /// Number of parsed filters currently cached.
    pub fn cached_filters(&self) -> usize {
        self.compiled.len()
    }

    fn filter_for(&self, recipe: &Recipe) -> EvalResult<Arc<Expression>> {
        let key = (recipe.id, recipe.filter_expression.clone());
        if let Some(filter) = self.compiled.get(&key) {
            return Ok(filter.clone());
        }

        let filter = Arc::new(self.evaluator.compile(&recipe.filter_expression)?);
        // An edited filter replaces whatever was cached for the recipe.
        self.compiled.retain(|(id, _), _| *id != recipe.id);
        self.compiled.insert(key, filter.clone());
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextBuilder;

    fn recipes(filters: &[&str]) -> Vec<Arc<Recipe>> {
        filters
            .iter()
            .enumerate()
            .map(|(i, filter)| Arc::new(Recipe::new(i as u64, filter, "console-log")))
            .collect()
    }

    #[test]
    fn test_match_in_input_order() {
        let context = ContextBuilder::new().country("DE").build().unwrap();
        let matcher = RecipeMatcher::new();
        let results = matcher.match_recipes(
            &recipes(&[
                "2 + 2 == 4",
                "client.country == 'US'",
                "fooBarBaz",
                "client.country",
                "2 +",
            ]),
            &context,
        );

        let verdicts: Vec<(u64, bool)> = results.iter().map(|r| (r.recipe.id, r.matched)).collect();
        assert_eq!(
            verdicts,
            vec![(0, true), (1, false), (2, false), (3, true), (4, false)]
        );
        assert!(results[0].error.is_none());
        assert!(results[1].error.is_none());
        assert_eq!(
            results[2].error,
            Some(ExpressionError::UnknownIdentifier("fooBarBaz".to_string()))
        );
        assert!(matches!(
            results[4].error,
            Some(ExpressionError::Syntax(_))
        ));
    }

    #[test]
    fn test_matches_regardless_of_context() {
        let matcher = RecipeMatcher::new();
        let result = matcher.match_recipe(
            Arc::new(Recipe::new(1, "2 + 2 == 4", "console-log")),
            &Context::new(),
        );
        assert!(result.matched);
    }

    #[test]
    fn test_filters_are_cached_per_filter_text() {
        let matcher = RecipeMatcher::new();
        let context = Context::new();
        let first = Arc::new(Recipe::new(1, "true", "console-log").with_revision("a"));

        matcher.match_recipe(first.clone(), &context);
        matcher.match_recipe(first, &context);
        assert_eq!(matcher.cached_filters(), 1);

        let edited = Arc::new(Recipe::new(1, "false", "console-log").with_revision("b"));
        let result = matcher.match_recipe(edited, &context);
        assert!(!result.matched);
        assert_eq!(matcher.cached_filters(), 1);
    }

    #[test]
    fn test_edited_filter_without_revision_is_reparsed() {
        let matcher = RecipeMatcher::new();
        let context = Context::new();

        let first = matcher.match_recipe(Arc::new(Recipe::new(1, "true", "console-log")), &context);
        assert!(first.matched);

        let edited =
            matcher.match_recipe(Arc::new(Recipe::new(1, "false", "console-log")), &context);
        assert!(!edited.matched);
        assert_eq!(matcher.cached_filters(), 1);
    }
}
