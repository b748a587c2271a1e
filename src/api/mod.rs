//! API Module
//!
//! HTTP handlers and routing for the state store REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a JSON value
//! - `GET /get/:key` - Retrieve a value by key
//! - `GET /meta/:key` - Entry metadata
//! - `GET /list` - List live entries
//! - `DELETE /del/:key` - Delete a key
//! - `DELETE /clear` - Delete every entry
//! - `POST /tool` - State tool call
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
