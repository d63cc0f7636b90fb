//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde_json::Value;
use thiserror::Error;

/// Why [`Request::json`] could not produce a value.
///
/// The `Display` form is what clients see in a validation error list, so the
/// wording stays close to the underlying failure.
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("attempt to decode JSON with unexpected content type: {0}")]
    ContentType(String),

    #[error("JSON decode error: {0}")]
    Syntax(#[from] serde_json::Error),
}

/// An incoming HTTP request with its body already read.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        parts: http::request::Parts,
        body: Bytes,
        params: HashMap<String, String>,
    ) -> Self {
        Self { method: parts.method, uri: parts.uri, headers: parts.headers, body, params }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Returns the first value when the header
    /// is repeated, and `None` when it is absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// All path parameters captured by the matched route.
    pub fn params(&self) -> &HashMap<String, String> { &self.params }

    /// The raw, still percent-encoded query string (without the `?`).
    pub fn query(&self) -> Option<&str> { self.uri.query() }

    /// Decoded query pairs in request order. Repeated keys are kept.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self.uri.query() {
            Some(q) => url::form_urlencoded::parse(q.as_bytes()).into_owned().collect(),
            None => Vec::new(),
        }
    }

    /// Parses the body as JSON.
    ///
    /// The `content-type` must be `application/json` or end in `+json`
    /// (parameters such as `charset` are ignored). An empty body is a
    /// [`JsonError::Syntax`].
    pub fn json(&self) -> Result<Value, JsonError> {
        let content_type = self.header("content-type").unwrap_or("application/octet-stream");
        if !is_json_media_type(content_type) {
            return Err(JsonError::ContentType(content_type.to_owned()));
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json")
        || essence.to_ascii_lowercase().ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, content_type: Option<&str>, body: &'static [u8]) -> Request {
        let mut builder = http::Request::builder().uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        Request::new(parts, Bytes::from_static(body), HashMap::new())
    }

    #[test]
    fn query_pairs_decode_and_keep_duplicates() {
        let req = request("/search?q=a%20b&q=c&tag=x+y", None, b"");
        assert_eq!(
            req.query_pairs(),
            vec![
                ("q".to_owned(), "a b".to_owned()),
                ("q".to_owned(), "c".to_owned()),
                ("tag".to_owned(), "x y".to_owned()),
            ]
        );
    }

    #[test]
    fn query_pairs_empty_without_query() {
        assert!(request("/search", None, b"").query_pairs().is_empty());
    }

    #[test]
    fn json_accepts_json_media_types() {
        let req = request("/", Some("application/json; charset=utf-8"), br#"{"a":1}"#);
        assert_eq!(req.json().unwrap(), serde_json::json!({"a": 1}));

        let req = request("/", Some("application/merge-patch+json"), b"[]");
        assert_eq!(req.json().unwrap(), serde_json::json!([]));
    }

    #[test]
    fn json_rejects_other_content_types() {
        let err = request("/", Some("text/plain"), b"{}").json().unwrap_err();
        assert!(matches!(err, JsonError::ContentType(ref ct) if ct == "text/plain"));

        let err = request("/", None, b"{}").json().unwrap_err();
        assert!(matches!(err, JsonError::ContentType(_)));
    }

    #[test]
    fn json_empty_body_is_a_syntax_error() {
        let err = request("/", Some("application/json"), b"").json().unwrap_err();
        assert!(matches!(err, JsonError::Syntax(_)));
        assert!(err.to_string().starts_with("JSON decode error: EOF"));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = request("/", Some("application/json"), b"");
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("x-missing"), None);
    }
}
