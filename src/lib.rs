//! # tollgate
//!
//! A minimal HTTP framework whose routes can declare what a valid request
//! looks like. Requests that do not match never reach the handler.
//!
//! ## The contract
//!
//! A route handler is an `async fn(Request) -> impl IntoResponse`. Wrap it in
//! a [`middleware::Validate`] built from JSON Schema documents for any of the
//! four request parts (path segments, query parameters, headers, JSON body)
//! and it only ever sees requests that conform. Everything else is answered
//! with:
//!
//! ```text
//! 400 Bad Request
//! content-type: application/json
//!
//! {"errors": ["...", "..."]}
//! ```
//!
//! Errors from all configured parts are collected, in the fixed order
//! segments → params → headers → json, before the request is rejected.
//!
//! Underneath:
//!
//! - Radix-tree routing — O(path-length) lookup via [`matchit`]
//! - HTTP/1.1 and HTTP/2 via hyper, on tokio
//! - Schema checks via the [`jsonschema`] crate, behind the [`Schema`] trait
//! - Graceful shutdown — SIGTERM / Ctrl-C, drains in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use tollgate::{Request, Response, Router, Server, StatusCode};
//! use tollgate::middleware::Validate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tollgate::Error> {
//!     let new_user = Validate::builder()
//!         .json(json!({
//!             "type": "object",
//!             "properties": {
//!                 "id":   { "type": "integer", "minimum": 1 },
//!                 "name": { "type": "string", "minLength": 1 }
//!             },
//!             "required": ["id", "name"]
//!         }))
//!         .build()?;
//!
//!     let app = Router::new().post("/users", new_user.wrap(create_user));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     // The body is known to be a JSON object with `id` and `name`.
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .json(req.body().to_vec())
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;
pub mod schema;

pub use error::Error;
pub use handler::Handler;
pub use http::{Method, StatusCode};
pub use request::{JsonError, Request};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use schema::{JsonSchema, Schema};
pub use server::{DEFAULT_MAX_BODY_SIZE, Server};
