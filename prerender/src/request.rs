//! Helpers for turning an incoming request into the page URL handed to the
//! renderer.

use std::collections::BTreeMap;

use http::{HeaderMap, HeaderName, Uri, header::HOST, request::Parts, uri::Authority};

const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Decodes a query string into its key/value pairs, in order.
///
/// Malformed input never fails; undecodable pieces are replaced the way
/// `application/x-www-form-urlencoded` parsers do.
pub fn query_pairs(query: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(query).unwrap_or_default()
}

/// True if `name` appears in the query of `uri`, with or without a value.
pub fn has_param(uri: &Uri, name: &str) -> bool {
    uri.query()
        .is_some_and(|query| query_pairs(query).iter().any(|(key, _)| key == name))
}

/// Rules for deciding which origin a page URL may be built from.
///
/// Request headers are supplied by the client, so by default only the
/// request's own authority (absolute target or `Host`) is considered and
/// `X-Forwarded-*` headers are ignored. A fixed `public_origin` overrides
/// everything. When `allowed_hosts` is not empty, a derived host must be one
/// of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginPolicy {
    public_origin: Option<String>,
    trust_forwarded_headers: bool,
    allowed_hosts: Vec<String>,
}

impl OriginPolicy {
    /// Creates a policy. Host names are compared case-insensitively and
    /// without the port.
    pub fn new(
        public_origin: Option<String>,
        trust_forwarded_headers: bool,
        allowed_hosts: Vec<String>,
    ) -> Self {
        Self {
            public_origin,
            trust_forwarded_headers,
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|host| host.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Fixed origin of page URLs.
    pub fn public_origin(&self) -> Option<&str> {
        self.public_origin.as_deref()
    }

    /// Whether `X-Forwarded-Proto` and `X-Forwarded-Host` are honored.
    pub fn trust_forwarded_headers(&self) -> bool {
        self.trust_forwarded_headers
    }

    /// Host names a derived origin must match. Empty accepts any host.
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    fn allows(&self, authority: &Authority) -> bool {
        self.allowed_hosts.is_empty()
            || self
                .allowed_hosts
                .iter()
                .any(|host| authority.host().eq_ignore_ascii_case(host))
    }
}

/// Rebuilds the absolute URL of the page a request asked for.
///
/// The configured public origin always wins. Otherwise the origin comes from
/// the absolute request target or the `Host` header, or from
/// `X-Forwarded-Host` / `X-Forwarded-Proto` when the policy trusts them. A
/// missing, malformed or disallowed host yields the origin-relative target.
pub fn absolute_url(parts: &Parts, policy: &OriginPolicy) -> String {
    let uri = &parts.uri;
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    if let Some(origin) = policy.public_origin() {
        return format!("{origin}{path_and_query}");
    }

    let forwarded = policy.trust_forwarded_headers();
    let authority = forwarded
        .then(|| first_forwarded(&parts.headers, &X_FORWARDED_HOST))
        .flatten()
        .or_else(|| uri.authority().map(Authority::as_str))
        .or_else(|| header_value(&parts.headers, &HOST))
        .and_then(|value| value.parse::<Authority>().ok());

    match authority {
        Some(authority) if policy.allows(&authority) => {
            let scheme = scheme(parts, forwarded);
            format!("{scheme}://{authority}{path_and_query}")
        }
        _ => path_and_query.to_owned(),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn first_forwarded<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    header_value(headers, name)?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn scheme(parts: &Parts, forwarded: bool) -> String {
    let scheme = match parts.uri.scheme_str() {
        Some(scheme) => Some(scheme.to_ascii_lowercase()),
        None if forwarded => {
            first_forwarded(&parts.headers, &X_FORWARDED_PROTO).map(str::to_ascii_lowercase)
        }
        None => None,
    };
    match scheme.as_deref() {
        Some("https") => "https".to_owned(),
        _ => "http".to_owned(),
    }
}

/// Returns `url` with the headless marker set to an empty value and the
/// override parameter removed.
///
/// The rewritten query is ordered by key; repeated values of one key keep
/// their relative order.
pub fn headless_url(url: &str, headless_param: &str, override_param: Option<&str>) -> String {
    let (base, query) = url.split_once('?').unwrap_or((url, ""));

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in query_pairs(query) {
        params.entry(key).or_default().push(value);
    }
    if let Some(param) = override_param {
        params.remove(param);
    }
    params.insert(headless_param.to_owned(), vec![String::new()]);

    let pairs: Vec<(&str, &str)> = params
        .iter()
        .flat_map(|(key, values)| values.iter().map(move |value| (key.as_str(), value.as_str())))
        .collect();
    // Serializing string pairs cannot fail.
    let query = serde_urlencoded::to_string(pairs).unwrap_or_default();
    format!("{base}?{query}")
}
