//! Error types for configuration loading.

use thiserror::Error;

/// Errors that can occur while loading configuration.
///
/// Callers that want the daemon-safe behavior use
/// `Config::load_or_default`, which maps any of these to built-in
/// defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
