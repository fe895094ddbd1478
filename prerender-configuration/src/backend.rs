use std::sync::Arc;

use prerender_backend::{Backend as BackendTrait, NoCache};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// In-memory store settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Moka {
    /// Maximum number of cached pages.
    pub max_entries: u64,
    /// Optional label for this backend (used in tracing).
    #[serde(default)]
    pub label: Option<String>,
}

/// Redis store settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Redis {
    pub connection_string: String,
    /// Key prefix, `ssr:` when omitted.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Optional label for this backend (used in tracing).
    #[serde(default)]
    pub label: Option<String>,
}

/// Cache store selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Backend {
    /// Nothing is cached.
    #[default]
    None,
    Moka(Moka),
    Redis(Redis),
}

impl Backend {
    pub fn into_backend(self) -> Result<Arc<dyn BackendTrait + Send + 'static>, ConfigError> {
        match self {
            Backend::None => Ok(Arc::new(NoCache)),
            #[cfg(feature = "moka")]
            Backend::Moka(config) => {
                use prerender_moka::MokaBackend;

                let mut builder = MokaBackend::builder(config.max_entries);
                if let Some(label) = config.label {
                    builder = builder.name(label);
                }
                Ok(Arc::new(builder.build()))
            }
            #[cfg(not(feature = "moka"))]
            Backend::Moka(_) => Err(ConfigError::BackendNotAvailable("Moka".to_string())),
            #[cfg(feature = "redis")]
            Backend::Redis(config) => {
                use prerender_redis::RedisBackend;

                let mut builder = RedisBackend::builder().server(config.connection_string);
                if let Some(prefix) = config.prefix {
                    builder = builder.prefix(prefix);
                }
                if let Some(label) = config.label {
                    builder = builder.name(label);
                }
                let backend = builder
                    .build()
                    .map_err(|e| ConfigError::BackendNotAvailable(format!("Redis: {}", e)))?;
                Ok(Arc::new(backend))
            }
            #[cfg(not(feature = "redis"))]
            Backend::Redis(_) => Err(ConfigError::BackendNotAvailable("Redis".to_string())),
        }
    }
}
