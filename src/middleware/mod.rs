//! Middleware layer.
//!
//! Middleware wraps a [`Handler`](crate::Handler) and yields another handler
//! with the same contract, so wrapped and unwrapped routes register the same
//! way.
//!
//! - [`validate`] — declarative request validation against schemas for path
//!   segments, query parameters, headers and JSON body.

pub mod validate;

pub use validate::{Part, Validate, ValidateBuilder, ValidateConfig};
