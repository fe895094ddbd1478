//! Decides which requests are served a rendered page.

use std::sync::Arc;

use http::{HeaderMap, Uri, header::USER_AGENT};

use crate::classifier::UserAgentClassifier;
use crate::request::has_param;

/// Routing decision for incoming requests.
///
/// A request is rendered when it does not carry the headless marker and
/// either carries the override parameter or comes from a configured bot
/// family. The headless check wins, so requests issued by the renderer never
/// loop back into it.
#[derive(Clone)]
pub struct Detector {
    user_agents: Arc<[String]>,
    headless_param: String,
    override_param: Option<String>,
    classifier: Arc<dyn UserAgentClassifier>,
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("user_agents", &self.user_agents)
            .field("headless_param", &self.headless_param)
            .field("override_param", &self.override_param)
            .finish_non_exhaustive()
    }
}

impl Detector {
    /// Creates a detector. `override_param` of `None` disables forced rendering.
    pub fn new(
        user_agents: Vec<String>,
        headless_param: String,
        override_param: Option<String>,
        classifier: Arc<dyn UserAgentClassifier>,
    ) -> Self {
        Self {
            user_agents: user_agents.into(),
            headless_param,
            override_param,
            classifier,
        }
    }

    /// User agent families that get rendered pages.
    pub fn user_agents(&self) -> &[String] {
        &self.user_agents
    }

    /// Name of the headless marker parameter.
    pub fn headless_param(&self) -> &str {
        &self.headless_param
    }

    /// Name of the override parameter, if enabled.
    pub fn override_param(&self) -> Option<&str> {
        self.override_param.as_deref()
    }

    /// True if the query carries the headless marker, whatever its value.
    pub fn is_headless(&self, uri: &Uri) -> bool {
        has_param(uri, &self.headless_param)
    }

    /// True if the request is forced by the override parameter or its user
    /// agent family is one of the configured bots.
    pub fn is_bot(&self, uri: &Uri, headers: &HeaderMap) -> bool {
        if let Some(param) = &self.override_param
            && has_param(uri, param)
        {
            return true;
        }

        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let family = self.classifier.classify(user_agent);
        self.user_agents.iter().any(|bot| *bot == family)
    }

    /// True if the request should be answered by the render proxy.
    pub fn should_render(&self, uri: &Uri, headers: &HeaderMap) -> bool {
        !self.is_headless(uri) && self.is_bot(uri, headers)
    }
}
