//! Unified error type.

use thiserror::Error;

use crate::middleware::validate::Part;

/// The error type returned by tollgate's fallible operations.
///
/// Application-level errors (400, 404, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. A request that fails
/// validation is answered with a `400`, never with an `Error`. This type
/// surfaces setup failures (a validator with nothing to check, a schema that
/// does not compile) and infrastructure failures (binding to a port).
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A validator was built without any schema.
    #[error("at least one of segments, params, headers or json must be provided")]
    NoSchemas,

    /// A JSON Schema document was rejected by the schema compiler.
    #[error("invalid {part} schema: {reason}")]
    InvalidSchema { part: Part, reason: String },
}
