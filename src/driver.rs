//! The host capability surface handed to every action.
//!
//! Actions never reach the host directly; they log, read the client's
//! location and keep small amounts of state only through a [`Driver`].

use std::sync::Arc;

use dashmap::DashMap;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[mockall::automock]
pub trait Driver: Send + Sync {
    fn log(&self, message: &str, level: LogLevel);

    /// Country code of the client, once it is known.
    fn location(&self) -> Option<String>;

    fn is_testing(&self) -> bool;

    /// Key-value storage namespaced by `prefix`.
    fn storage(&self, prefix: &str) -> ActionStorage;
}

/// A view of the driver's store restricted to one key prefix.
#[derive(Debug, Clone, Default)]
pub struct ActionStorage {
    prefix: String,
    entries: Arc<DashMap<String, serde_json::Value>>,
}

impl ActionStorage {
    pub fn new(prefix: &str, entries: Arc<DashMap<String, serde_json::Value>>) -> Self {
        Self {
            prefix: prefix.to_string(),
            entries,
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}/{}", self.prefix, key)
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.get(&self.key(key)).map(|v| v.value().clone())
    }

    pub fn set(&self, key: &str, value: serde_json::Value) {
        self.entries.insert(self.key(key), value);
    }

    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.remove(&self.key(key)).map(|(_, v)| v)
    }

    /// Keys under this prefix, without the prefix.
    pub fn keys(&self) -> Vec<String> {
        let scope = format!("{}/", self.prefix);
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| entry.key().strip_prefix(&scope).map(str::to_string))
            .collect();
        keys.sort();
        keys
    }
}

/// Driver that logs through `tracing` and keeps storage in memory.
#[derive(Debug, Clone, Default)]
pub struct TracingDriver {
    location: Option<String>,
    testing: bool,
    entries: Arc<DashMap<String, serde_json::Value>>,
}

impl TracingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, country: &str) -> Self {
        self.location = Some(country.to_string());
        self
    }

    pub fn testing(mut self, testing: bool) -> Self {
        self.testing = testing;
        self
    }
}

impl Driver for TracingDriver {
    fn log(&self, message: &str, level: LogLevel) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "recipe_engine::action", "{}", message),
            LogLevel::Info => tracing::info!(target: "recipe_engine::action", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "recipe_engine::action", "{}", message),
            LogLevel::Error => tracing::error!(target: "recipe_engine::action", "{}", message),
        }
    }

    fn location(&self) -> Option<String> {
        self.location.clone()
    }

    fn is_testing(&self) -> bool {
        self.testing
    }

    fn storage(&self, prefix: &str) -> ActionStorage {
        ActionStorage::new(prefix, self.entries.clone())
    }
}
