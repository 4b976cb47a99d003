//! HTTP server for jotter.
//!
//! Exposes posts, comments and the profile as JSON over HTTP. Every request
//! goes through the shared [`Store`](jotter_store::Store), which snapshots
//! the full state to disk after each successful call. On SIGINT or SIGTERM
//! the server drains in-flight requests and writes one final snapshot.

pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod router;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ServerError, ServerResult};
pub use router::build_router;
pub use server::JotterServer;
