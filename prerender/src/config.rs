//! Middleware configuration.
//!
//! A [`Config`] is assembled once at startup through [`ConfigBuilder`] and is
//! read-only afterwards. Cloning is cheap; every component is shared behind an
//! `Arc`, so one configuration can serve any number of concurrent requests.

use std::sync::Arc;
use std::time::Duration;

use http::Uri;
use prerender_backend::{Backend, NoCache};
use thiserror::Error;

use crate::classifier::{CrawlerClassifier, UserAgentClassifier};
use crate::detector::Detector;
use crate::renderer::{HttpRenderer, Renderer};
use crate::request::OriginPolicy;

/// Crawler families rendered when no list is configured.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "W3C_Validator",
    "baiduspider",
    "bingbot",
    "facebookexternalhit",
    "LinkedInBot",
    "Pinterest",
    "Slackbot-LinkExpanding",
    "TwitterBot",
    "Googlebot",
    "Mediapartners-Google",
];

/// Default name of the query parameter marking a request from the renderer.
pub const DEFAULT_HEADLESS_PARAM: &str = "headless";
/// Default name of the query parameter forcing a render.
pub const DEFAULT_OVERRIDE_PARAM: &str = "ssr";
/// Default lifetime of a cached page.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
/// Default deadline for a render call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default deadline for a single cache read or write.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(1);

/// Invalid configuration detected by [`ConfigBuilder::build`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The rendering service address is not an absolute http(s) URL.
    #[error("invalid renderer address {0:?}: expected an absolute http or https URL")]
    InvalidRenderer(String),
    /// The public origin is not of the form `scheme://authority`.
    #[error("invalid public origin {0:?}: expected scheme://host[:port]")]
    InvalidPublicOrigin(String),
    /// The headless marker must have a name.
    #[error("headless parameter name must not be empty")]
    EmptyHeadlessParam,
    /// Using one name for both parameters would make rendered requests loop.
    #[error("override parameter must differ from the headless parameter {0:?}")]
    ConflictingParams(String),
    /// The HTTP client for the rendering service could not be created.
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Immutable middleware configuration.
///
/// Use [`Config::builder`] to create one.
#[derive(Clone)]
pub struct Config {
    renderer_address: String,
    renderer: Arc<dyn Renderer>,
    detector: Detector,
    backend: Arc<dyn Backend + Send + 'static>,
    ttl: Duration,
    timeout: Duration,
    cache_timeout: Duration,
    verbose: bool,
    origin: OriginPolicy,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("renderer_address", &self.renderer_address)
            .field("detector", &self.detector)
            .field("backend", &self.backend.name())
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .field("cache_timeout", &self.cache_timeout)
            .field("verbose", &self.verbose)
            .field("origin", &self.origin)
            .finish()
    }
}

impl Config {
    /// Creates a builder for a rendering service reachable at `renderer_address`.
    pub fn builder(renderer_address: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(renderer_address)
    }

    /// Base address of the rendering service.
    pub fn renderer_address(&self) -> &str {
        &self.renderer_address
    }

    /// Rendering service client.
    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// Routing decisions for incoming requests.
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Cache store for rendered pages.
    pub fn backend(&self) -> &(dyn Backend + Send + 'static) {
        self.backend.as_ref()
    }

    /// Lifetime of a cached page.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Deadline for one render call, body included.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deadline for one cache read or write.
    pub fn cache_timeout(&self) -> Duration {
        self.cache_timeout
    }

    /// Whether request-level events are logged.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Origin used to build absolute page URLs, if fixed.
    pub fn public_origin(&self) -> Option<&str> {
        self.origin.public_origin()
    }

    /// Whether `X-Forwarded-*` headers may supply the page origin.
    pub fn trust_forwarded_headers(&self) -> bool {
        self.origin.trust_forwarded_headers()
    }

    /// Host names accepted when the origin is derived from the request.
    pub fn allowed_hosts(&self) -> &[String] {
        self.origin.allowed_hosts()
    }

    /// Rules for building absolute page URLs.
    pub fn origin_policy(&self) -> &OriginPolicy {
        &self.origin
    }
}

/// Builder for [`Config`].
///
/// Every setter is optional; unset values fall back to the defaults in this
/// module.
///
/// ```
/// use std::time::Duration;
/// use prerender::{Config, NoCache};
///
/// let config = Config::builder("http://renderer:3000")
///     .user_agents(["Googlebot"])
///     .override_param("")
///     .backend(NoCache)
///     .timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// assert_eq!(config.detector().override_param(), None);
/// ```
pub struct ConfigBuilder {
    renderer_address: String,
    renderer: Option<Arc<dyn Renderer>>,
    user_agents: Vec<String>,
    classifier: Arc<dyn UserAgentClassifier>,
    headless_param: String,
    override_param: String,
    backend: Arc<dyn Backend + Send + 'static>,
    ttl: Duration,
    timeout: Duration,
    cache_timeout: Duration,
    verbose: bool,
    public_origin: Option<String>,
    trust_forwarded_headers: bool,
    allowed_hosts: Vec<String>,
}

impl ConfigBuilder {
    /// Creates a builder with default settings.
    pub fn new(renderer_address: impl Into<String>) -> Self {
        Self {
            renderer_address: renderer_address.into(),
            renderer: None,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| (*ua).to_owned()).collect(),
            classifier: Arc::new(CrawlerClassifier::new()),
            headless_param: DEFAULT_HEADLESS_PARAM.to_owned(),
            override_param: DEFAULT_OVERRIDE_PARAM.to_owned(),
            backend: Arc::new(NoCache),
            ttl: DEFAULT_TTL,
            timeout: DEFAULT_TIMEOUT,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            verbose: false,
            public_origin: None,
            trust_forwarded_headers: false,
            allowed_hosts: Vec::new(),
        }
    }

    /// Replaces the list of user agent families that get rendered pages.
    pub fn user_agents<I, S>(mut self, user_agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_agents = user_agents.into_iter().map(Into::into).collect();
        self
    }

    /// Uses a non-default user agent classifier.
    pub fn classifier(mut self, classifier: impl UserAgentClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Sets the query parameter that marks requests issued by the renderer.
    pub fn headless_param(mut self, name: impl Into<String>) -> Self {
        self.headless_param = name.into();
        self
    }

    /// Sets the query parameter that forces rendering. An empty name disables it.
    pub fn override_param(mut self, name: impl Into<String>) -> Self {
        self.override_param = name.into();
        self
    }

    /// Sets the cache store. [`NoCache`] by default.
    pub fn backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backend = Arc::new(backend);
        self
    }

    /// Sets an already shared cache store.
    pub fn shared_backend(mut self, backend: Arc<dyn Backend + Send + 'static>) -> Self {
        self.backend = backend;
        self
    }

    /// Sets how long rendered pages stay cached.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the deadline for one render call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the deadline for one cache read or write.
    pub fn cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    /// Enables request-level logging.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Fixes the origin (`scheme://host[:port]`) of rendered page URLs instead
    /// of deriving it from request headers.
    pub fn public_origin(mut self, origin: impl Into<String>) -> Self {
        self.public_origin = Some(origin.into());
        self
    }

    /// Honors `X-Forwarded-Host` and `X-Forwarded-Proto` when deriving the
    /// page origin. Only enable this behind a proxy that overwrites them.
    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }

    /// Restricts origins derived from the request to these host names.
    /// Requests for any other host are keyed and rendered by their relative
    /// target.
    pub fn allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Uses a custom rendering service client instead of [`HttpRenderer`].
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Validates the settings and builds the [`Config`].
    pub fn build(self) -> Result<Config, ConfigError> {
        let renderer_address = self.renderer_address.trim_end_matches('/').to_owned();
        if !is_http_origin(&renderer_address, true) {
            return Err(ConfigError::InvalidRenderer(self.renderer_address));
        }
        if self.headless_param.is_empty() {
            return Err(ConfigError::EmptyHeadlessParam);
        }
        if self.override_param == self.headless_param {
            return Err(ConfigError::ConflictingParams(self.override_param));
        }
        let public_origin = match self.public_origin {
            Some(origin) => {
                let trimmed = origin.trim_end_matches('/');
                if !is_http_origin(trimmed, false) {
                    return Err(ConfigError::InvalidPublicOrigin(origin));
                }
                Some(trimmed.to_owned())
            }
            None => None,
        };

        let renderer = match self.renderer {
            Some(renderer) => renderer,
            None => Arc::new(HttpRenderer::new(renderer_address.clone())?),
        };
        let override_param = (!self.override_param.is_empty()).then_some(self.override_param);

        Ok(Config {
            renderer_address,
            renderer,
            detector: Detector::new(
                self.user_agents,
                self.headless_param,
                override_param,
                self.classifier,
            ),
            backend: self.backend,
            ttl: self.ttl,
            timeout: self.timeout,
            cache_timeout: self.cache_timeout,
            verbose: self.verbose,
            origin: OriginPolicy::new(
                public_origin,
                self.trust_forwarded_headers,
                self.allowed_hosts,
            ),
        })
    }
}

/// Checks for `http(s)://authority`, optionally followed by a path.
fn is_http_origin(value: &str, allow_path: bool) -> bool {
    let Ok(uri) = value.parse::<Uri>() else {
        return false;
    };
    let scheme_ok = matches!(uri.scheme_str(), Some("http") | Some("https"));
    let path_ok = allow_path
        || uri
            .path_and_query()
            .is_none_or(|pq| pq.as_str().is_empty() || pq.as_str() == "/");
    scheme_ok && uri.authority().is_some() && path_ok
}
