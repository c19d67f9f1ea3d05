//! HTTP server wiring for the identity-mapping API.

mod config;
mod server;

pub use config::HttpServerConfig;
pub use server::{AppState, HttpServer};
