use thiserror::Error;

/// Error turning a configuration file into a middleware configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid YAML or does not match [`Settings`](crate::Settings).
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    /// The settings were rejected by [`prerender::ConfigBuilder::build`].
    #[error(transparent)]
    Invalid(#[from] prerender::ConfigError),
    /// The selected backend is not compiled in.
    #[error("backend not available: {0}")]
    BackendNotAvailable(String),
}
