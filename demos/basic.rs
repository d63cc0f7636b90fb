//! Minimal tollgate example — validated JSON endpoints.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i http://localhost:3000/users/alice            # 400, bad segment
//!   curl -i 'http://localhost:3000/users?q=al'
//!   curl -i 'http://localhost:3000/users?q='             # 400, empty query
//!   curl -i -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"id":1,"name":"alice"}'
//!   curl -i -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"id":"1"}'                                  # 400, two errors

use serde_json::json;
use tollgate::middleware::Validate;
use tollgate::{Request, Response, Router, Server, StatusCode};

#[tokio::main]
async fn main() -> Result<(), tollgate::Error> {
    tracing_subscriber::fmt::init();

    let user_id = Validate::builder()
        .segments(json!({
            "type": "object",
            "properties": { "id": { "type": "string", "pattern": "^[0-9]+$" } }
        }))
        .build()?;

    let search = Validate::builder()
        .params(json!({
            "type": "object",
            "properties": { "q": { "type": "string", "minLength": 1 } },
            "required": ["q"]
        }))
        .build()?;

    let new_user = Validate::builder()
        .headers(json!({
            "type": "object",
            "properties": { "Content-Type": { "type": "string" } },
            "required": ["Content-Type"]
        }))
        .json(json!({
            "type": "object",
            "properties": {
                "id":   { "type": "integer", "minimum": 1 },
                "name": { "type": "string", "minLength": 1 }
            },
            "required": ["id", "name"]
        }))
        .build()?;

    let app = Router::new()
        .get("/users/{id}",    user_id.wrap(get_user))
        .delete("/users/{id}", user_id.wrap(delete_user))
        .get("/users",         search.wrap(search_users))
        .post("/users",        new_user.wrap(create_user));

    Server::bind("0.0.0.0:3000").serve(app).await
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or_default();
    Response::json(format!(r#"{{"id":{id},"name":"alice"}}"#).into_bytes())
}

// GET /users?q=...
async fn search_users(req: Request) -> Response {
    let q = req.query_pairs().into_iter()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v)
        .unwrap_or_default();
    Response::builder().json_value(&json!([{ "id": 1, "name": q }]))
}

// POST /users — the body is already known to match the schema.
async fn create_user(req: Request) -> Response {
    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(req.body().to_vec())
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}
