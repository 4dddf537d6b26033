//! Configuration for the docvoice worker
//!
//! Settings are layered: built-in defaults, then `config/default.yaml`,
//! then `config/{env}.yaml`, then `DOCVOICE__*` environment variables.

mod settings;

pub use settings::{
    load_settings, IndexConfig, ObservabilityConfig, ProviderConfig, RuntimeEnvironment,
    SessionConfig, Settings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Config load error: {0}")]
    Load(#[from] config::ConfigError),
}
