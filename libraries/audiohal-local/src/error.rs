/// Local adapter errors
use thiserror::Error;

/// Result type for device configuration
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Device configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Sources could not be read or deserialized
    #[error("Failed to load device config: {0}")]
    Load(#[from] config::ConfigError),

    /// Loaded values are unusable
    #[error("Invalid device config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
