//! Rendered page envelope.
//!
//! The cache stores more than the body: a [`CachedPage`] also keeps the
//! status code and the few response headers that matter to crawlers, so a
//! cache hit answers exactly like the render that produced it.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode, header};
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Response header reporting whether a rendered page came from the cache.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-prerender-cache");

/// Response headers of the rendering service that are kept and replayed.
pub const PERSISTED_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CONTENT_LANGUAGE,
    header::LINK,
    HeaderName::from_static("x-robots-tag"),
];

const FORMAT_VERSION: u8 = 1;

/// Where a rendered response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the cache store.
    Hit,
    /// Rendered for this request.
    Miss,
}

impl CacheStatus {
    /// Header value for [`CACHE_STATUS_HEADER`].
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// A stored entry could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a bincode-encoded page.
    #[error("malformed cache entry: {0}")]
    Malformed(#[from] bincode::error::DecodeError),
    /// The entry was written by an incompatible version.
    #[error("unsupported cache entry version {0}")]
    Version(u8),
}

/// Status, selected headers and body of a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPage {
    version: u8,
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl CachedPage {
    /// Creates a page, keeping only the [`PERSISTED_HEADERS`] from `headers`.
    pub fn new(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        let headers = PERSISTED_HEADERS
            .iter()
            .flat_map(|name| {
                headers.get_all(name).iter().filter_map(move |value| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_owned(), value.to_owned()))
                })
            })
            .collect();
        Self {
            version: FORMAT_VERSION,
            status: status.as_u16(),
            headers,
            body,
        }
    }

    /// Status code of the rendered page.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK)
    }

    /// Persisted response headers, in storage order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Page body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Serializes the page for the cache store.
    pub fn encode(&self) -> Result<Bytes, bincode::error::EncodeError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard()).map(Bytes::from)
    }

    /// Reads a page written by [`CachedPage::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (page, _): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        if page.version != FORMAT_VERSION {
            return Err(DecodeError::Version(page.version));
        }
        Ok(page)
    }

    /// Builds the response sent to the client.
    pub fn into_response(self, cache_status: CacheStatus) -> Response<Full<Bytes>> {
        let status = self.status();
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = status;
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                headers.append(name, value);
            }
        }
        headers.insert(
            CACHE_STATUS_HEADER,
            HeaderValue::from_static(cache_status.as_str()),
        );
        response
    }
}
