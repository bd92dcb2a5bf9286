//! API Module
//!
//! Operator admin surface over a cache registry. Values are never read or
//! written over HTTP; the registry itself is consumed in-process.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Statistics of every cache plus totals
//! - `GET /stats/:name` - Statistics of one cache
//! - `DELETE /caches/:name` - Clear a cache, or one key with `?key=`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
