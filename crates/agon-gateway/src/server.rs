//! Gateway server lifecycle.
//!
//! The listener is bound before startup is reported, so a busy port fails
//! fast instead of surfacing on the first request. Shutdown drains
//! spectator connections before the listener stops accepting.

use crate::api::{create_router, AppState};
use crate::bridge::{RealtimeBridge, ShutdownReport};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A running gateway server.
pub struct Gateway {
    local_addr: SocketAddr,
    bridge: Arc<RealtimeBridge>,
    shutdown_tx: oneshot::Sender<()>,
    serve_task: JoinHandle<()>,
}

impl Gateway {
    /// Bind the configured address and start serving.
    pub async fn serve(config: &GatewayConfig, bridge: Arc<RealtimeBridge>) -> Result<Gateway> {
        let listener = tokio::net::TcpListener::bind(config.listen_addr)
            .await
            .map_err(|source| GatewayError::Bind {
                addr: config.listen_addr,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| GatewayError::Bind {
            addr: config.listen_addr,
            source,
        })?;

        let router = create_router(AppState {
            bridge: bridge.clone(),
        });

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let server = axum::serve(listener, router);
        let serve_task = tokio::spawn(async move {
            tokio::select! {
                result = server.into_future() => {
                    if let Err(e) = result {
                        error!(error = %e, "Server error");
                    }
                }
                _ = &mut shutdown_rx => {
                    debug!("Listener stopping");
                }
            }
        });

        info!(addr = %local_addr, "Gateway listening");
        Ok(Gateway {
            local_addr,
            bridge,
            shutdown_tx,
            serve_task,
        })
    }

    /// Address the gateway is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The bridge this server fans events out through.
    pub fn bridge(&self) -> &Arc<RealtimeBridge> {
        &self.bridge
    }

    /// Gracefully stop the gateway.
    ///
    /// Connections are closed first and the listener second, so every
    /// client sees a close frame rather than a reset. Returns the
    /// per-connection close outcome.
    pub async fn shutdown(self) -> ShutdownReport {
        let report = self.bridge.disconnect_all();

        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.serve_task.await {
            error!(error = %e, "Serve task failed during shutdown");
        }

        info!(
            closed = report.closed,
            failures = report.failures.len(),
            "Gateway stopped"
        );
        report
    }
}
