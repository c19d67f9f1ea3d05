//! HTTP server
//!
//! Builds the router over an explicit application state and runs it until a
//! termination signal arrives. The state owns the record store; handlers
//! reach it only through the state they are given, never through globals.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use crate::account::RecordStore;
use crate::api::{health_handler, mutate_identity};
use crate::observability::Logger;

use super::config::HttpServerConfig;

/// Shared application state handed to every request handler.
pub struct AppState {
    /// The record store backend.
    pub store: Arc<dyn RecordStore>,
    /// Logger handle.
    pub logger: Logger,
}

/// HTTP server for the identity-mapping API.
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Creates a server with default configuration.
    pub fn new(state: Arc<AppState>) -> Self {
        Self::with_config(HttpServerConfig::default(), state)
    }

    /// Creates a server with custom configuration.
    pub fn with_config(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = Self::build_router(state);
        Self { config, router }
    }

    /// Builds the API router over the given state.
    pub fn build_router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/", post(mutate_identity))
            .route("/health", get(health_handler))
            .with_state(state)
    }

    /// Returns the configured socket address.
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Returns the router (for testing).
    pub fn router(self) -> Router {
        self.router
    }

    /// Binds the listener and serves until SIGINT or SIGTERM.
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid listen address {:?}: {}", self.config.socket_addr(), err),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

/// Resolves when the process receives SIGINT or SIGTERM.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = terminate.recv() => {}
            }
        }
        Err(_) => {
            let _ = ctrl_c.await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::MemoryStore;
    use crate::observability::Severity;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            store: Arc::new(MemoryStore::new()),
            logger: Logger::with_writer(Severity::Fatal, Box::new(io::sink())),
        })
    }

    #[test]
    fn test_server_default_addr() {
        let server = HttpServer::new(test_state());
        assert_eq!(server.socket_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_server_with_custom_config() {
        let config = HttpServerConfig::new("127.0.0.1", 9000);
        let server = HttpServer::with_config(config, test_state());
        assert_eq!(server.socket_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_router_builds() {
        let _router = HttpServer::new(test_state()).router();
    }
}
