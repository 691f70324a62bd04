use serde::{Deserialize, Serialize};

pub type RecipeId = u64;

/// A server-delivered unit of work: run `action` with `arguments` when
/// `filter_expression` holds for the current client.
///
/// Recipes are immutable once fetched and shared as `Arc<Recipe>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,

    #[serde(default)]
    pub name: String,

    /// Changes whenever the server edits the recipe.
    #[serde(default)]
    pub revision_id: String,

    pub filter_expression: String,

    pub action: String,

    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl Recipe {
    pub fn new(id: RecipeId, filter_expression: &str, action: &str) -> Self {
        Self {
            id,
            name: String::new(),
            revision_id: String::new(),
            filter_expression: filter_expression.to_string(),
            action: action.to_string(),
            arguments: serde_json::Map::new(),
        }
    }

    pub fn with_argument(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }

    pub fn with_revision(mut self, revision_id: &str) -> Self {
        self.revision_id = revision_id.to_string();
        self
    }

    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_with_defaults() {
        let recipe: Recipe = serde_json::from_value(json!({
            "id": 7,
            "filter_expression": "2 + 2 == 4",
            "action": "console-log"
        }))
        .unwrap();

        assert_eq!(recipe, Recipe::new(7, "2 + 2 == 4", "console-log"));
        assert!(recipe.arguments.is_empty());
    }

    #[test]
    fn test_arguments() {
        let recipe = Recipe::new(1, "true", "console-log")
            .with_argument("message", "hello")
            .with_argument("count", 3);
        assert_eq!(recipe.argument_str("message"), Some("hello"));
        assert_eq!(recipe.argument_str("count"), None);
        assert_eq!(recipe.arguments["count"], json!(3));
    }
}
