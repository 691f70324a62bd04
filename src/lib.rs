//! # Recipe Engine: client-side targeting and execution
//!
//! A host receives *recipes* from a server: a filter expression, the name of
//! an action, and the action's arguments. The engine decides which recipes
//! apply to the current client and runs their actions, keeping each recipe's
//! failures to itself.
//!
//! ## Filter Pipeline
//!
//! ```text
//! Filter text → Preprocessor → Tokenizer → Parser → Evaluator → verdict
//! ```
//!
//! - The [`preprocessor`] folds multi-line filters into one line.
//! - The [`tokenizer`] turns text into tokens with `nom`.
//! - The [`analyzer`] builds an [`ast::Expression`] with token-level parser
//!   combinators.
//! - The [`eval`] module walks the tree against a [`context::Context`],
//!   including the `date`, `stableSample` and `bucketSample` operators backed
//!   by [`sampling`].
//!
//! ## Run Pipeline
//!
//! ```text
//! sources → Context + recipes → RecipeMatcher → Runner → ActionRegistry → Action
//! ```
//!
//! - [`source`] fetches recipes and the context, the only run-fatal step.
//! - [`matcher`] evaluates each filter; errors make a recipe non-matching.
//! - [`runner`] resolves each match in the [`action::ActionRegistry`] and
//!   spawns its action on its own task.
//! - [`client`] repeats the run on an interval configured by [`config`].
//!
//! Actions reach the host only through the [`driver::Driver`] they are
//! built with.

pub mod action;
pub mod analyzer;
pub mod ast;
pub mod client;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod eval;
pub mod matcher;
pub mod preprocessor;
pub mod recipe;
pub mod runner;
pub mod sampling;
pub mod source;
pub mod tokenizer;

// Re-exports
pub use action::{Action, ActionError, ActionFactory, ActionRegistry, UnknownActionError};
pub use client::{RecipeClient, RunError};
pub use context::{Context, ContextBuilder};
pub use driver::{Driver, LogLevel, TracingDriver};
pub use error::*;
pub use eval::{ExpressionError, ExpressionEvaluator, Value};
pub use matcher::{MatchResult, RecipeMatcher};
pub use recipe::Recipe;
pub use runner::{ActionOutcome, Dispatched, RunPhase, Runner};
