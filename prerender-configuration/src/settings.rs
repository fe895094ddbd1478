use std::path::Path;
use std::time::Duration;

use prerender::Config;
use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::ConfigError;

/// Serializable middleware settings.
///
/// Every field except `renderer` is optional; omitted fields keep the
/// defaults of [`prerender::ConfigBuilder`]. Durations use humantime syntax
/// (`500ms`, `30s`, `24h`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Base address of the rendering service.
    pub renderer: String,
    /// User agent families that get rendered pages.
    #[serde(default)]
    pub user_agents: Option<Vec<String>>,
    #[serde(default)]
    pub headless_param: Option<String>,
    /// An empty string disables the override parameter.
    #[serde(default)]
    pub override_param: Option<String>,
    /// Lifetime of a cached page (e.g., "1h").
    #[serde(default, with = "humantime_serde")]
    pub ttl: Option<Duration>,
    /// Deadline for one render call (e.g., "30s").
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Deadline for one cache read or write (e.g., "1s").
    #[serde(default, with = "humantime_serde")]
    pub cache_timeout: Option<Duration>,
    #[serde(default)]
    pub verbose: bool,
    /// Fixed `scheme://host[:port]` of the public site.
    #[serde(default)]
    pub public_origin: Option<String>,
    /// Honor `X-Forwarded-Host` and `X-Forwarded-Proto`.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
    /// Host names a request-derived origin must match.
    #[serde(default)]
    pub allowed_hosts: Option<Vec<String>>,
    #[serde(default)]
    pub backend: Backend,
}

impl Settings {
    /// Parses settings from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads and parses a YAML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Builds the middleware configuration, creating the selected backend.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let mut builder = Config::builder(self.renderer)
            .shared_backend(self.backend.into_backend()?)
            .verbose(self.verbose)
            .trust_forwarded_headers(self.trust_forwarded_headers);

        if let Some(user_agents) = self.user_agents {
            builder = builder.user_agents(user_agents);
        }
        if let Some(param) = self.headless_param {
            builder = builder.headless_param(param);
        }
        if let Some(param) = self.override_param {
            builder = builder.override_param(param);
        }
        if let Some(ttl) = self.ttl {
            builder = builder.ttl(ttl);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.cache_timeout {
            builder = builder.cache_timeout(timeout);
        }
        if let Some(origin) = self.public_origin {
            builder = builder.public_origin(origin);
        }
        if let Some(hosts) = self.allowed_hosts {
            builder = builder.allowed_hosts(hosts);
        }

        Ok(builder.build()?)
    }
}
