use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone)]
pub struct TesseraConfig {
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default = "defaults::capacity")]
    pub capacity: usize,
    #[serde(default = "defaults::lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default)]
    pub serialize_writers: bool,
    #[serde(default = "defaults::run_secs")]
    pub run_secs: u64,
    #[serde(default = "defaults::render_interval_ms")]
    pub render_interval_ms: u64,
    #[serde(default)]
    pub producer: ProducerConfig,
    #[serde(default = "defaults::consumers")]
    pub consumers: Vec<ConsumerConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProducerConfig {
    /// How long the write guard is held per frame.
    #[serde(default = "defaults::producer_hold_ms")]
    pub hold_ms: u64,
    /// Pause between releasing a slot and requesting the next one.
    #[serde(default)]
    pub idle_ms: u64,
    #[serde(default = "defaults::sensor_id")]
    pub sensor_id: u16,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub kind: ConsumerKind,
    pub hold_ms: u64,
    #[serde(default)]
    pub idle_ms: u64,
}

/// How a consumer thread takes data out of the ring.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerKind {
    /// Drains slots oldest first, consuming them.
    Consume,
    /// Peeks at the most recently produced slot without consuming it.
    Newest,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

mod defaults {
    use super::{ConsumerConfig, ConsumerKind};

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn capacity() -> usize {
        10
    }

    pub fn lock_timeout_ms() -> u64 {
        1_000
    }

    pub fn run_secs() -> u64 {
        15
    }

    pub fn render_interval_ms() -> u64 {
        100
    }

    pub fn producer_hold_ms() -> u64 {
        500
    }

    pub fn sensor_id() -> u16 {
        1
    }

    pub fn consumers() -> Vec<ConsumerConfig> {
        vec![
            ConsumerConfig {
                kind: ConsumerKind::Consume,
                hold_ms: 2_000,
                idle_ms: 0,
            },
            ConsumerConfig {
                kind: ConsumerKind::Newest,
                hold_ms: 600,
                idle_ms: 0,
            },
        ]
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            hold_ms: defaults::producer_hold_ms(),
            idle_ms: 0,
            sensor_id: defaults::sensor_id(),
        }
    }
}

impl Default for TesseraConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level(),
            capacity: defaults::capacity(),
            lock_timeout_ms: defaults::lock_timeout_ms(),
            serialize_writers: false,
            run_secs: defaults::run_secs(),
            render_interval_ms: defaults::render_interval_ms(),
            producer: ProducerConfig::default(),
            consumers: defaults::consumers(),
        }
    }
}

impl TesseraConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&toml_to_str)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let tessera_config: TesseraConfig = toml::from_str(s)?;
        tessera_config.validate()?;
        Ok(tessera_config)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be non-zero".into()));
        }
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid("lock_timeout_ms must be non-zero".into()));
        }
        Ok(())
    }
}
