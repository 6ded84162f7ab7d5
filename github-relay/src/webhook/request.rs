//! Transport-neutral view of an inbound webhook request.

use std::collections::HashMap;

use axum::http::HeaderMap;

/// Event kind header, e.g. `push`.
pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// Unique id of one delivery; redeliveries reuse it.
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// HMAC-SHA256 signature header. Preferred.
pub const SHA256_SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Legacy HMAC-SHA1 signature header.
pub const SHA1_SIGNATURE_HEADER: &str = "X-Hub-Signature";

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// A webhook request as handed over by a transport adapter.
///
/// Header names are stored lowercased so lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    headers: HashMap<String, String>,
    body: Vec<u8>,
    is_base64_encoded: bool,
}

impl RawRequest {
    pub fn new<I, K, V>(headers: I, body: impl Into<Vec<u8>>, is_base64_encoded: bool) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
            body: body.into(),
            is_base64_encoded,
        }
    }

    /// Build from an axum header map and raw body.
    ///
    /// Headers that are not valid visible ASCII are dropped.
    pub fn from_http(headers: &HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?.to_string())));
        Self::new(headers, body, false)
    }

    /// Case-insensitive header lookup. Empty values count as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_base64_encoded(&self) -> bool {
        self.is_base64_encoded
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE_HEADER)
    }

    pub fn event_type(&self) -> Option<&str> {
        self.header(EVENT_HEADER)
    }

    pub fn delivery_id(&self) -> Option<&str> {
        self.header(DELIVERY_HEADER)
    }
}
