use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("run_interval must be greater than 0")]
    ZeroRunInterval,
}

/// Settings of the periodic recipe client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Delay before the first run.
    #[serde(default, with = "duration_ms")]
    pub startup_delay: Duration,

    #[serde(default = "default_run_interval", with = "duration_ms")]
    pub run_interval: Duration,

    /// Number of periodic runs before the client stops; unlimited if unset.
    #[serde(default)]
    pub run_limit: Option<u64>,

    /// Echo dispatch failures through the driver log.
    #[serde(default = "default_true")]
    pub log_actions: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            startup_delay: Duration::ZERO,
            run_interval: default_run_interval(),
            run_limit: None,
            log_actions: default_true(),
        }
    }
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: Self = from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run_interval.is_zero() {
            return Err(ConfigError::ZeroRunInterval);
        }
        Ok(())
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, ConfigError> {
    Ok(serde_json::from_str(s)?)
}

fn default_true() -> bool {
    true
}

fn default_run_interval() -> Duration {
    Duration::from_secs(6 * 60 * 60)
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
