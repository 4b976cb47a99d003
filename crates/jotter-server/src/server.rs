use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use jotter_store::{JsonFileSnapshot, Store};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::shutdown;

/// The jotter HTTP server.
pub struct JotterServer {
    config: ServerConfig,
    store: Arc<Store>,
}

impl JotterServer {
    /// Create a server whose store snapshots to `config.snapshot_path`.
    pub fn new(config: ServerConfig) -> Self {
        let snapshot = JsonFileSnapshot::new(&config.snapshot_path);
        let store = Arc::new(Store::new(snapshot, config.store_options()));
        Self { config, store }
    }

    /// Create a server around an existing store.
    pub fn with_store(config: ServerConfig, store: Arc<Store>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.store())
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(shutdown::signal()).await
    }

    /// Bind `config.bind_addr` and serve until `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.run(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// In-flight requests finish before the final snapshot is written, so
    /// the file reflects every response that was sent.
    pub async fn run<F>(self, listener: TcpListener, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.config.restore_on_start {
            let store = self.store();
            tokio::task::spawn_blocking(move || store.restore())
                .await
                .map_err(|e| ServerError::Internal(e.to_string()))??;
        }

        let addr = listener.local_addr()?;
        let options = self.store.options();
        info!(
            addr = %addr,
            snapshot = %self.store.snapshot_location(),
            policy = ?options.policy,
            cascade_post_delete = options.cascade_post_delete,
            "jotter server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await?;

        info!("shutting down server");
        let store = self.store();
        match tokio::task::spawn_blocking(move || store.flush()).await {
            Ok(Ok(())) => info!(snapshot = %self.store.snapshot_location(), "final snapshot written"),
            Ok(Err(e)) => error!(error = %e, "final snapshot failed"),
            Err(e) => error!(error = %e, "final snapshot task failed"),
        }
        info!("server has been shut down");
        Ok(())
    }
}

impl std::fmt::Debug for JotterServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JotterServer")
            .field("bind_addr", &self.config.bind_addr)
            .field("store", &self.store)
            .finish()
    }
}
