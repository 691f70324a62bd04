//! Where recipes and the context come from.
//!
//! Sources are the only run-fatal dependencies of a run: if either cannot
//! deliver, nothing is matched or dispatched.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::context::{Context, ContextError};
use crate::eval::Value;
use crate::recipe::Recipe;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Context error: {0}")]
    Context(#[from] ContextError),
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

#[mockall::automock]
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, SourceError>;
}

#[mockall::automock]
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn fetch_context(&self) -> Result<Context, SourceError>;

    /// Applies the single late patch a context may receive before
    /// matching, e.g. a location resolved after start-up.
    async fn resolve_late(&self, _context: &mut Context) -> Result<(), SourceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticRecipeSource {
    recipes: Vec<Recipe>,
}

impl StaticRecipeSource {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }
}

#[async_trait]
impl RecipeSource for StaticRecipeSource {
    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, SourceError> {
        Ok(self.recipes.clone())
    }
}

/// Accepts a bare list of recipes or a paged API response.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecipeDocument {
    List(Vec<Recipe>),
    Page { results: Vec<Recipe> },
}

#[derive(Debug, Clone)]
pub struct JsonFileRecipeSource {
    path: PathBuf,
}

impl JsonFileRecipeSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl RecipeSource for JsonFileRecipeSource {
    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, SourceError> {
        let document: RecipeDocument = read_json(&self.path).await?;
        let recipes = match document {
            RecipeDocument::List(recipes) => recipes,
            RecipeDocument::Page { results } => results,
        };
        tracing::debug!("Loaded {} recipes from {}", recipes.len(), self.path.display());
        Ok(recipes)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticContextSource {
    context: Context,
    late_field: Option<(String, Value)>,
}

impl StaticContextSource {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            late_field: None,
        }
    }

    /// A field that only becomes known after the context was fetched.
    pub fn with_late_field(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.late_field = Some((path.to_string(), value.into()));
        self
    }
}

#[async_trait]
impl ContextSource for StaticContextSource {
    async fn fetch_context(&self) -> Result<Context, SourceError> {
        Ok(self.context.clone())
    }

    async fn resolve_late(&self, context: &mut Context) -> Result<(), SourceError> {
        if let Some((path, value)) = &self.late_field {
            context.patch(path, value.clone())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileContextSource {
    path: PathBuf,
}

impl JsonFileContextSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ContextSource for JsonFileContextSource {
    async fn fetch_context(&self) -> Result<Context, SourceError> {
        let json: serde_json::Value = read_json(&self.path).await?;
        Ok(Context::from_json(json)?)
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, SourceError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| SourceError::Format {
        path: path.to_path_buf(),
        source,
    })
}
