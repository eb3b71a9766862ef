//! Server lifecycle: connect the store, bind, serve, and shut down.
//!
//! [`start`] returns a [`ServerHandle`]; there is no process-wide server
//! state. Tests start as many servers as they like on ephemeral ports.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use inkpost_infra::{Settings, Stores};

use crate::app::{self, services::AppServices};

/// A running server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    stores: Option<Stores>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

/// Connect to the configured store, then bind and start serving.
pub async fn start(settings: &Settings) -> anyhow::Result<ServerHandle> {
    let stores = Stores::connect(settings)
        .await
        .context("failed to connect to the database")?;
    start_with_stores(settings, stores).await
}

/// Bind and start serving on top of already-open stores.
///
/// If binding fails the stores are closed before the error is returned.
pub async fn start_with_stores(settings: &Settings, stores: Stores) -> anyhow::Result<ServerHandle> {
    let listener = match bind(settings).await {
        Ok(listener) => listener,
        Err(e) => {
            stores.close().await;
            return Err(e);
        }
    };
    let local_addr = listener.local_addr().context("listener has no local address")?;

    let router = app::build_app(AppServices::new(stores.clone()));
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tracing::info!("listening on {local_addr}");

    Ok(ServerHandle {
        local_addr,
        stores: Some(stores),
        shutdown: Some(shutdown_tx),
        task: Some(task),
    })
}

async fn bind(settings: &Settings) -> anyhow::Result<TcpListener> {
    let addr = settings.bind_addr()?;
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}

impl ServerHandle {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Close the store connection, then stop accepting connections and wait
    /// for in-flight requests to drain. Calling `stop` again is a no-op.
    pub async fn stop(&mut self) -> anyhow::Result<()> {
        let Some(stores) = self.stores.take() else {
            return Ok(());
        };

        stores.close().await;
        tracing::info!("shutting down server");

        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.await
                .context("server task panicked")?
                .context("server terminated with an error")?;
        }
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
