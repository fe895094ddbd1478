//! Maps raw `User-Agent` strings to family labels such as `Googlebot` or
//! `Chrome`.
//!
//! Labels follow the naming used by the ua-parser project, so a bot list
//! written for one classifier works with the other.

use lazy_static::lazy_static;
use regex::Regex;

/// Family reported when no rule matches.
pub const OTHER_FAMILY: &str = "Other";

/// Classifies a user agent string into a family label.
///
/// Implementations must accept any input, including the empty string, and
/// must be safe to share between threads.
pub trait UserAgentClassifier: Send + Sync {
    /// Returns the family label for `user_agent`.
    fn classify(&self, user_agent: &str) -> String;
}

impl<T> UserAgentClassifier for std::sync::Arc<T>
where
    T: UserAgentClassifier + ?Sized,
{
    fn classify(&self, user_agent: &str) -> String {
        (**self).classify(user_agent)
    }
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    family: String,
}

impl Rule {
    fn new(pattern: &str, family: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            family: family.to_owned(),
        })
    }
}

lazy_static! {
    // Order matters: the first matching rule wins.
    static ref DEFAULT_RULES: Vec<Rule> = [
        (r"W3C_Validator|W3C_CSS_Validator|W3C-checklink", "W3C_Validator"),
        (r"(?i)baiduspider", "baiduspider"),
        (r"(?i)bingbot", "bingbot"),
        (r"facebookexternalhit|facebookcatalog", "facebookexternalhit"),
        (r"LinkedInBot", "LinkedInBot"),
        (r"(?i)pinterest(?:bot)?/", "Pinterest"),
        (r"Slackbot-LinkExpanding", "Slackbot-LinkExpanding"),
        (r"Slackbot", "Slackbot"),
        (r"(?i)twitterbot", "TwitterBot"),
        (r"Mediapartners-Google", "Mediapartners-Google"),
        (r"Googlebot-Image", "Googlebot-Image"),
        (r"Googlebot", "Googlebot"),
        (r"DuckDuckBot", "DuckDuckBot"),
        (r"YandexBot", "YandexBot"),
        (r"Applebot", "Applebot"),
        (r"HeadlessChrome/", "HeadlessChrome"),
        (r"Edg(?:e|A|iOS)?/", "Edge"),
        (r"OPR/|Opera", "Opera"),
        (r"Chrome/|CriOS/", "Chrome"),
        (r"Firefox/|FxiOS/", "Firefox"),
        (r"Version/[\d.]+.*Safari/", "Safari"),
    ]
    .iter()
    .map(|(pattern, family)| Rule::new(pattern, family).expect("built-in rule must compile"))
    .collect();
}

/// Built-in classifier covering common crawlers and browsers.
///
/// Rules are regular expressions tried in order; the first match decides the
/// family. Anything unrecognised, including an empty string, is
/// [`OTHER_FAMILY`].
///
/// ```
/// use prerender::{CrawlerClassifier, UserAgentClassifier};
///
/// let classifier = CrawlerClassifier::new();
/// let ua = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
/// assert_eq!(classifier.classify(ua), "Googlebot");
/// assert_eq!(classifier.classify(""), "Other");
/// ```
#[derive(Debug, Clone)]
pub struct CrawlerClassifier {
    rules: Vec<Rule>,
}

impl CrawlerClassifier {
    /// Creates a classifier with the built-in rules.
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
        }
    }

    /// Adds a rule that takes precedence over every existing one.
    pub fn with_rule(mut self, pattern: &str, family: &str) -> Result<Self, regex::Error> {
        self.rules.insert(0, Rule::new(pattern, family)?);
        Ok(self)
    }
}

impl Default for CrawlerClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentClassifier for CrawlerClassifier {
    fn classify(&self, user_agent: &str) -> String {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(user_agent))
            .map_or_else(|| OTHER_FAMILY.to_owned(), |rule| rule.family.clone())
    }
}

/// Classifier backed by a ua-parser `regexes.yaml` database.
#[cfg(feature = "uap")]
#[cfg_attr(docsrs, doc(cfg(feature = "uap")))]
pub struct UapClassifier {
    parser: uaparser::UserAgentParser,
}

/// The ua-parser database could not be loaded.
#[cfg(feature = "uap")]
#[derive(Debug, thiserror::Error)]
#[error("failed to load user agent database: {0}")]
pub struct LoadError(String);

#[cfg(feature = "uap")]
impl UapClassifier {
    /// Loads the database from a `regexes.yaml` file.
    pub fn from_yaml(path: &str) -> Result<Self, LoadError> {
        let parser = uaparser::UserAgentParser::from_yaml(path)
            .map_err(|err| LoadError(format!("{err:?}")))?;
        Ok(Self { parser })
    }

    /// Loads the database from the contents of a `regexes.yaml` file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let parser = uaparser::UserAgentParser::from_bytes(bytes)
            .map_err(|err| LoadError(format!("{err:?}")))?;
        Ok(Self { parser })
    }
}

#[cfg(feature = "uap")]
impl UserAgentClassifier for UapClassifier {
    fn classify(&self, user_agent: &str) -> String {
        use uaparser::Parser;
        self.parser.parse_user_agent(user_agent).family.into_owned()
    }
}
