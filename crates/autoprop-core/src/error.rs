use thiserror::Error;

/// Top-level error type for the autoprop host.
///
/// Library crates define their own error types for their subsystem; this one
/// covers configuration, I/O and serialization at the composition root.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AutopropError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AutopropError {
    fn from(err: toml::de::Error) -> Self {
        AutopropError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AutopropError {
    fn from(err: toml::ser::Error) -> Self {
        AutopropError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AutopropError {
    fn from(err: serde_json::Error) -> Self {
        AutopropError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for autoprop host operations.
pub type Result<T> = std::result::Result<T, AutopropError>;
