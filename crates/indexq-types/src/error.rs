//! Error types shared across the indexq crates.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying loader failure (file parse, env var coercion)
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    /// A loaded value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
