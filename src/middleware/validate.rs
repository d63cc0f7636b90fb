//! Declarative request validation.
//!
//! A [`Validate`] holds up to four schemas, one per request part:
//!
//! | Part | Value handed to the schema |
//! |---|---|
//! | `segments` | path parameters of the matched route, as a JSON object of strings |
//! | `params` | query parameters, as a JSON object of strings |
//! | `headers` | request headers, as a JSON object of strings, names lower-cased |
//! | `json` | the request body parsed as JSON |
//!
//! Every configured part is checked on every request, always in that order,
//! and the violations are collected into one list. If the list is empty the
//! wrapped handler runs and its response is returned untouched. Otherwise the
//! handler is skipped and the client gets:
//!
//! ```text
//! 400 Bad Request
//! content-type: application/json
//!
//! {"errors": ["/user_id: \"user\" does not match \"^[0-9]+$\""]}
//! ```
//!
//! # Repeated query parameters and headers
//!
//! Query strings and headers may repeat a key. Schemas see a single-valued
//! object and the **first** value wins; later values are not validated.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use tollgate::{Request, Router, StatusCode};
//! use tollgate::middleware::Validate;
//!
//! # fn main() -> Result<(), tollgate::Error> {
//! let user_id = Validate::builder()
//!     .segments(json!({
//!         "type": "object",
//!         "properties": { "user_id": { "type": "string", "pattern": "^[0-9]+$" } }
//!     }))
//!     .build()?;
//!
//! let app = Router::new().get("/users/{user_id}", user_id.wrap(get_user));
//! # Ok(())
//! # }
//!
//! async fn get_user(_req: Request) -> StatusCode { StatusCode::NO_CONTENT }
//! ```

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;
use crate::schema::{JsonSchema, Schema};

/// Builds the response sent when validation fails.
pub type Responder = Arc<dyn Fn(&Request, Vec<String>) -> Response + Send + Sync + 'static>;

/// A request part a [`Validate`] can check.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Part {
    Segments,
    Params,
    Headers,
    Json,
}

impl Part {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Segments => "segments",
            Self::Params   => "params",
            Self::Headers  => "headers",
            Self::Json     => "json",
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Schemas for [`Validate::new`], for callers bringing their own [`Schema`]
/// implementations.
///
/// Header schemas receive lower-cased header names; a custom header schema
/// must match keys in lower case.
#[derive(Clone, Default)]
pub struct ValidateConfig {
    pub segments: Option<Arc<dyn Schema>>,
    pub params: Option<Arc<dyn Schema>>,
    pub headers: Option<Arc<dyn Schema>>,
    pub json: Option<Arc<dyn Schema>>,
    /// Replaces the default `400 {"errors": [...]}` response.
    pub responder: Option<Responder>,
}

/// Builds a [`Validate`] from JSON Schema documents.
///
/// Obtain via [`Validate::builder()`]. Documents are compiled in
/// [`build`](ValidateBuilder::build); the header document's property names
/// are lower-cased first so header matching ignores case.
#[derive(Default)]
pub struct ValidateBuilder {
    segments: Option<Value>,
    params: Option<Value>,
    headers: Option<Value>,
    json: Option<Value>,
    responder: Option<Responder>,
}

impl ValidateBuilder {
    pub fn segments(mut self, document: Value) -> Self {
        self.segments = Some(document);
        self
    }

    pub fn params(mut self, document: Value) -> Self {
        self.params = Some(document);
        self
    }

    pub fn headers(mut self, document: Value) -> Self {
        self.headers = Some(document);
        self
    }

    pub fn json(mut self, document: Value) -> Self {
        self.json = Some(document);
        self
    }

    /// Overrides how a failed request is answered. `f` receives the request
    /// and the collected error strings.
    pub fn error_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, Vec<String>) -> Response + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(f));
        self
    }

    /// Compiles the documents.
    ///
    /// # Errors
    ///
    /// [`Error::NoSchemas`] if no document was given, [`Error::InvalidSchema`]
    /// for the first document that does not compile.
    pub fn build(self) -> Result<Validate, Error> {
        let config = ValidateConfig {
            segments: compile(Part::Segments, self.segments, JsonSchema::compile)?,
            params: compile(Part::Params, self.params, JsonSchema::compile)?,
            headers: compile(Part::Headers, self.headers, JsonSchema::compile_case_insensitive)?,
            json: compile(Part::Json, self.json, JsonSchema::compile)?,
            responder: self.responder,
        };
        Validate::new(config)
    }
}

fn compile(
    part: Part,
    document: Option<Value>,
    compiler: fn(&Value) -> Result<JsonSchema, String>,
) -> Result<Option<Arc<dyn Schema>>, Error> {
    let Some(document) = document else { return Ok(None) };
    let schema = compiler(&document).map_err(|reason| Error::InvalidSchema { part, reason })?;
    Ok(Some(Arc::new(schema)))
}

// ── Validate ──────────────────────────────────────────────────────────────────

/// Request-validation middleware.
///
/// Immutable once built and cheap to clone; one instance can wrap any number
/// of handlers and serve concurrent requests.
#[derive(Clone)]
pub struct Validate {
    inner: Arc<Inner>,
}

struct Inner {
    segments: Option<Arc<dyn Schema>>,
    params: Option<Arc<dyn Schema>>,
    headers: Option<Arc<dyn Schema>>,
    json: Option<Arc<dyn Schema>>,
    responder: Responder,
}

impl Validate {
    /// # Errors
    ///
    /// [`Error::NoSchemas`] if all four schemas are `None`. A responder on
    /// its own does not count.
    pub fn new(config: ValidateConfig) -> Result<Self, Error> {
        let ValidateConfig { segments, params, headers, json, responder } = config;
        if segments.is_none() && params.is_none() && headers.is_none() && json.is_none() {
            return Err(Error::NoSchemas);
        }
        let responder: Responder = match responder {
            Some(responder) => responder,
            None => Arc::new(error_response),
        };
        Ok(Self { inner: Arc::new(Inner { segments, params, headers, json, responder }) })
    }

    pub fn builder() -> ValidateBuilder {
        ValidateBuilder::default()
    }

    /// The parts this validator checks, in checking order.
    pub fn parts(&self) -> Vec<Part> {
        let inner = &self.inner;
        [
            (Part::Segments, inner.segments.is_some()),
            (Part::Params, inner.params.is_some()),
            (Part::Headers, inner.headers.is_some()),
            (Part::Json, inner.json.is_some()),
        ]
        .into_iter()
        .filter_map(|(part, configured)| configured.then_some(part))
        .collect()
    }

    /// Runs every configured check against `req` and returns the violations
    /// in part order. Empty means the request is valid.
    ///
    /// A body that is not JSON yields exactly one error for the `json` part
    /// and its schema is not consulted.
    pub fn check(&self, req: &Request) -> Vec<String> {
        let inner = &self.inner;
        let mut errors = Vec::new();

        if let Some(schema) = &inner.segments {
            let segments = req.params().iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            errors.extend(schema.validate(&Value::Object(segments)));
        }
        if let Some(schema) = &inner.params {
            errors.extend(schema.validate(&first_values(req.query_pairs())));
        }
        if let Some(schema) = &inner.headers {
            errors.extend(schema.validate(&header_values(req.headers())));
        }
        if let Some(schema) = &inner.json {
            match req.json() {
                Ok(payload) => errors.extend(schema.validate(&payload)),
                Err(e) => errors.push(e.to_string()),
            }
        }

        errors
    }

    /// Wraps `handler` so it only runs for requests that pass [`check`](Self::check).
    pub fn wrap<H: Handler>(&self, handler: H) -> impl Handler + use<H> {
        let validate = self.clone();
        let handler = handler.into_boxed_handler();
        move |req: Request| {
            let validate = validate.clone();
            let handler = Arc::clone(&handler);
            async move { validate.run(req, handler).await }
        }
    }

    async fn run(&self, req: Request, handler: BoxedHandler) -> Response {
        let errors = self.check(&req);
        if errors.is_empty() {
            return handler.call(req).await;
        }
        debug!(
            method = %req.method(),
            path = req.path(),
            errors = errors.len(),
            "request rejected by validator"
        );
        (self.inner.responder)(&req, errors)
    }
}

impl fmt::Debug for Validate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validate").field("parts", &self.parts()).finish()
    }
}

// ── Error response ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    errors: Vec<String>,
}

/// The default failure response: `400` with `{"errors": [...]}`.
pub fn error_response(_req: &Request, errors: Vec<String>) -> Response {
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .json_value(&ErrorBody { errors })
}

// ── Multi-value collapsing ────────────────────────────────────────────────────

/// First value wins for repeated keys.
fn first_values(pairs: impl IntoIterator<Item = (String, String)>) -> Value {
    let mut map = Map::new();
    for (key, value) in pairs {
        map.entry(key).or_insert(Value::String(value));
    }
    Value::Object(map)
}

/// Header names arrive lower-cased from `http`. Values that are not visible
/// ASCII are decoded lossily rather than dropped.
fn header_values(headers: &HeaderMap) -> Value {
    first_values(headers.iter().map(|(name, value)| {
        let value = match value.to_str() {
            Ok(s) => s.to_owned(),
            Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        (name.as_str().to_owned(), value)
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;

    fn request(uri: &str, headers: &[(&str, &str)], body: &'static [u8]) -> Request {
        let mut builder = http::Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        Request::new(parts, Bytes::from_static(body), HashMap::new())
    }

    fn reject_all(label: &'static str) -> Arc<dyn Schema> {
        Arc::new(move |_: &Value| vec![label.to_owned()])
    }

    #[test]
    fn no_schemas_is_a_configuration_error() {
        assert!(matches!(Validate::builder().build(), Err(Error::NoSchemas)));
        assert!(matches!(Validate::new(ValidateConfig::default()), Err(Error::NoSchemas)));

        let responder_only = Validate::builder().error_response(error_response).build();
        assert!(matches!(responder_only, Err(Error::NoSchemas)));
    }

    #[test]
    fn invalid_document_names_its_part() {
        let err = Validate::builder()
            .params(json!({"type": "object"}))
            .headers(json!({"type": 42}))
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::InvalidSchema { part: Part::Headers, .. }));
        assert!(err.to_string().starts_with("invalid headers schema: "));
    }

    #[test]
    fn header_names_colliding_when_lowercased_are_rejected() {
        let err = Validate::builder()
            .headers(json!({
                "properties": {
                    "User-Agent": { "type": "string" },
                    "user-agent": { "minLength": 1 }
                }
            }))
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::InvalidSchema { part: Part::Headers, .. }));
        assert!(err.to_string().contains("`user-agent`"), "{err}");
    }

    #[test]
    fn parts_reflect_configuration() {
        let v = Validate::builder()
            .json(json!({}))
            .segments(json!({}))
            .build()
            .unwrap();
        assert_eq!(v.parts(), vec![Part::Segments, Part::Json]);
    }

    #[test]
    fn errors_accumulate_in_part_order() {
        let v = Validate::new(ValidateConfig {
            json: Some(reject_all("json")),
            headers: Some(reject_all("headers")),
            params: Some(reject_all("params")),
            segments: Some(reject_all("segments")),
            responder: None,
        })
        .unwrap();

        let req = request("/", &[("content-type", "application/json")], b"{}");
        assert_eq!(v.check(&req), vec!["segments", "params", "headers", "json"]);
    }

    #[test]
    fn unparseable_body_skips_json_schema() {
        let v = Validate::new(ValidateConfig {
            json: Some(reject_all("schema consulted")),
            ..ValidateConfig::default()
        })
        .unwrap();

        let errors = v.check(&request("/", &[("content-type", "application/json")], b"{"));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("JSON decode error: "), "{errors:?}");

        let errors = v.check(&request("/", &[("content-type", "text/plain")], b"{}"));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("unexpected content type"), "{errors:?}");
    }

    #[test]
    fn first_value_wins() {
        let collapsed = first_values(vec![
            ("q".to_owned(), "first".to_owned()),
            ("p".to_owned(), "1".to_owned()),
            ("q".to_owned(), "second".to_owned()),
        ]);
        assert_eq!(collapsed, json!({"q": "first", "p": "1"}));
    }

    #[test]
    fn headers_collapse_to_lowercase_first_value() {
        let req = request("/", &[("X-Tag", "a"), ("x-tag", "b"), ("User-Agent", "curl")], b"");
        assert_eq!(header_values(req.headers()), json!({"x-tag": "a", "user-agent": "curl"}));
    }

    #[test]
    fn default_error_response_shape() {
        let req = request("/", &[], b"");
        let res = error_response(&req, vec!["a".to_owned(), "b".to_owned()]);

        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(res.headers()["content-type"], "application/json");
        assert_eq!(res.body(), br#"{"errors":["a","b"]}"#);
    }
}
