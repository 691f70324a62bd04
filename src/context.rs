//! The read-only fact base filters are evaluated against.
//!
//! A [`Context`] is a tree of named values addressed by dotted paths
//! (`client.country`). It is assembled once per run, usually through
//! [`ContextBuilder`], and may receive exactly one late in-place
//! [`patch`](Context::patch) before matching, e.g. a geolocation that
//! resolves after the rest of the context was built.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::eval::Value;

/// Namespace the builder's typed helpers write into.
pub const CLIENT_NAMESPACE: &str = "client";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    #[error("Context was already patched at `{path}`")]
    AlreadyPatched { path: String },
    #[error("Cannot descend into `{path}`: not a map")]
    NotAMap { path: String },
    #[error("Empty context path")]
    EmptyPath,
    #[error("Context root must be a JSON object, got {0}")]
    InvalidRoot(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: BTreeMap<String, Value>,
    patched_path: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: serde_json::Value) -> Result<Self, ContextError> {
        match Value::from(json) {
            Value::Map(values) => Ok(Self {
                values,
                patched_path: None,
            }),
            other => Err(ContextError::InvalidRoot(other.type_name().to_string())),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        Value::Map(self.values.clone()).to_json()
    }

    /// A top-level entry.
    pub fn get(&self, root: &str) -> Option<&Value> {
        self.values.get(root)
    }

    /// Resolves a dotted path, `None` if any segment is missing.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            match current {
                Value::Map(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Sets the value at a dotted path, creating intermediate maps.
    pub fn insert(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ContextError> {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(ContextError::EmptyPath);
        };
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(ContextError::EmptyPath);
        }

        let mut current = &mut self.values;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Map(BTreeMap::new()));
            current = match entry {
                Value::Map(map) => map,
                _ => {
                    return Err(ContextError::NotAMap {
                        path: parents[..=depth].join("."),
                    })
                }
            };
        }
        current.insert(last.to_string(), value.into());
        Ok(())
    }

    /// The single late write a context accepts after it was built.
    pub fn patch(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ContextError> {
        if let Some(patched) = &self.patched_path {
            return Err(ContextError::AlreadyPatched {
                path: patched.clone(),
            });
        }
        self.insert(path, value)?;
        tracing::debug!("Context patched at {}", path);
        self.patched_path = Some(path.to_string());
        Ok(())
    }

    pub fn is_patched(&self) -> bool {
        self.patched_path.is_some()
    }
}

/// Assembles a [`Context`] from host facts.
#[derive(Debug, Default)]
pub struct ContextBuilder {
    entries: Vec<(String, Value)>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.entries.push((path.to_string(), value.into()));
        self
    }

    fn with_client(self, key: &str, value: impl Into<Value>) -> Self {
        let path = format!("{}.{}", CLIENT_NAMESPACE, key);
        self.with(&path, value)
    }

    /// Stable identifier, typically used as sampling seed material.
    pub fn client_id(self, id: impl Into<String>) -> Self {
        self.with_client("userId", id.into())
    }

    pub fn country(self, country: impl Into<String>) -> Self {
        self.with_client("country", country.into())
    }

    pub fn locale(self, locale: impl Into<String>) -> Self {
        self.with_client("locale", locale.into())
    }

    pub fn channel(self, channel: impl Into<String>) -> Self {
        self.with_client("channel", channel.into())
    }

    pub fn version(self, version: impl Into<String>) -> Self {
        self.with_client("version", version.into())
    }

    pub fn request_time(self, time: DateTime<Utc>) -> Self {
        self.with_client("request_time", time)
    }

    pub fn build(self) -> Result<Context, ContextError> {
        let mut context = Context::new();
        for (path, value) in self.entries {
            context.insert(&path, value)?;
        }
        Ok(context)
    }
}
