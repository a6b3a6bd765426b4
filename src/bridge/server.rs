//! Bridge server — binds the router to a TCP listener with graceful
//! shutdown (spec §6). Grounded in the teacher's `gateway::server::Gateway`.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use super::router::{AppState, create_router};
use crate::error::Error;
use crate::manager::RegistryManager;

/// Owns the bound listener and router for one bridge instance.
pub struct Bridge {
    manager: Arc<RegistryManager>,
    host: String,
    port: u16,
}

impl Bridge {
    /// Wrap a started [`RegistryManager`] for HTTP exposure.
    #[must_use]
    pub fn new(manager: Arc<RegistryManager>, host: impl Into<String>, port: u16) -> Self {
        Self {
            manager,
            host: host.into(),
            port,
        }
    }

    /// Bind and serve until ctrl-c, then drain and shut the manager down.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host fails to parse, or
    /// [`Error::Io`] if the listener cannot bind.
    pub async fn run(self) -> Result<(), Error> {
        let addr = SocketAddr::new(
            self.host.parse().map_err(|e| Error::Config(format!("invalid host: {e}")))?,
            self.port,
        );

        let state = Arc::new(AppState { manager: Arc::clone(&self.manager) });
        let router = create_router(state);

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "bridge listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.manager.stop().await;
        info!("bridge shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
