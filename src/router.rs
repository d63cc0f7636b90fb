//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Register a path, get a
//! handler; wrap the handler first if the route needs validation.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use percent_encoding::percent_decode_str;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use tollgate::{Method, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Routes one fully-read request and produces its response.
    ///
    /// This is what the [`Server`](crate::Server) runs per request; it is
    /// public so a router can be driven in-process without a socket.
    pub async fn dispatch(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();
        let route = self.lookup(&parts.method, parts.uri.path());
        match route {
            Some((handler, params)) => handler.call(Request::new(parts, body, params)).await,
            None => Response::status(StatusCode::NOT_FOUND),
        }
    }

    /// Captured params are percent-decoded; a segment that does not decode to
    /// UTF-8 has the offending bytes replaced with U+FFFD.
    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), percent_decode_str(v).decode_utf8_lossy().into_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::get(uri).body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn dispatches_with_path_params() {
        let router = Router::new().get("/users/{id}", |req: Request| async move {
            format!("user {}", req.param("id").unwrap_or_default())
        });

        let res = router.dispatch(get("/users/42")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"user 42");
    }

    #[tokio::test]
    async fn path_params_are_percent_decoded() {
        let router = Router::new().get("/files/{name}", |req: Request| async move {
            req.param("name").unwrap_or_default().to_owned()
        });

        let res = router.dispatch(get("/files/a%20b%2Fc")).await;
        assert_eq!(res.body(), b"a b/c");

        let res = router.dispatch(get("/files/%FFx")).await;
        assert_eq!(res.body(), "\u{FFFD}x".as_bytes());
    }

    #[tokio::test]
    async fn unknown_route_or_method_is_not_found() {
        let router = Router::new().get("/users", |_req: Request| async { "list" });

        assert_eq!(router.dispatch(get("/nope")).await.status_code(), StatusCode::NOT_FOUND);

        let post = http::Request::post("/users").body(Bytes::new()).unwrap();
        assert_eq!(router.dispatch(post).await.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        async fn h(_req: Request) -> StatusCode { StatusCode::OK }
        let _ = Router::new().get("/a/{x}", h).get("/a/{y}", h);
    }
}
