mod config;

pub use config::{ConfigError, ConsumerConfig, ConsumerKind, ProducerConfig, TesseraConfig};
