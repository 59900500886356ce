use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// msglog HTTP server.
pub struct MsglogServer {
    state: AppState,
}

impl MsglogServer {
    /// Load the message log from `config.data_dir`.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        Ok(Self {
            state: AppState::open(config)?,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        self.state.config()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let bind_addr = self.config().bind_addr;
        let listener = TcpListener::bind(bind_addr).await?;
        tracing::info!("msglog server listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        tracing::info!("msglog server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
