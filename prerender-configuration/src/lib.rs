//! YAML configuration for the prerender middleware.
//!
//! [`Settings`] mirrors [`prerender::Config`] in a serializable form so the
//! middleware can be set up from a configuration file:
//!
//! ```
//! use prerender_configuration::Settings;
//!
//! let settings = Settings::from_yaml(r#"
//! renderer: "http://localhost:3000"
//! user_agents: [Googlebot, bingbot]
//! override_param: ""
//! ttl: 24h
//! timeout: 10s
//! backend:
//!   type: None
//! "#).unwrap();
//!
//! let config = settings.into_config().unwrap();
//! assert_eq!(config.detector().override_param(), None);
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `moka` | `type: Moka` in-memory backend |
//! | `redis` | `type: Redis` backend |
//!
//! Selecting a backend whose feature is disabled fails with
//! [`ConfigError::BackendNotAvailable`].

pub mod backend;
pub mod error;
pub mod settings;

pub use backend::{Backend, Moka, Redis};
pub use error::ConfigError;
pub use settings::Settings;
