//! UDP relay server.
//!
//! Wires the pieces together:
//! - binds the datagram socket
//! - spawns the registry actor and the broadcast engine
//! - runs the ingress loop until the CancellationToken fires
//! - closes the broadcast queue and waits for the engine to drain
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Startup failures are returned as `ServerError`

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::broadcast::{BroadcastEngine, BroadcastStats};
use crate::config::RelayConfig;
use crate::ingress::{IngressError, IngressHandler};
use crate::registry::spawn_registry;
use crate::transport::Transport;

/// The relay server over some datagram transport.
pub struct RelayServer<T: Transport = UdpSocket> {
    transport: Arc<T>,
    queue_capacity: usize,
    cancel_token: CancellationToken,
}

impl RelayServer<UdpSocket> {
    /// Binds a UDP socket per `config`.
    ///
    /// # Errors
    ///
    /// `ServerError::Bind` if the address cannot be bound.
    pub async fn bind(
        config: &RelayConfig,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let addr = config.listen_addr();
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self::with_transport(
            Arc::new(socket),
            config.queue_capacity,
            cancel_token,
        ))
    }
}

impl<T: Transport> RelayServer<T> {
    /// Creates a server over an already-bound transport.
    pub fn with_transport(
        transport: Arc<T>,
        queue_capacity: usize,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            transport,
            queue_capacity: queue_capacity.max(1),
            cancel_token,
        }
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.transport.local_addr().map_err(ServerError::LocalAddr)
    }

    /// Runs until the cancellation token is triggered.
    ///
    /// Messages already queued when ingress stops are still broadcast.
    pub async fn run(self) -> Result<BroadcastStats, ServerError> {
        if let Ok(addr) = self.transport.local_addr() {
            info!(%addr, "Relay server listening");
        }

        let registry = spawn_registry();
        let (broadcast_tx, broadcast_rx) = mpsc::channel(self.queue_capacity);

        let engine = BroadcastEngine::new(
            broadcast_rx,
            registry.clone(),
            Arc::clone(&self.transport),
        );
        let engine_task = tokio::spawn(engine.run());

        let ingress = IngressHandler::new(
            Arc::clone(&self.transport),
            registry,
            broadcast_tx,
            self.cancel_token.clone(),
        );
        let ingress_result = ingress.run().await;

        let stats = match engine_task.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "Broadcast engine task failed");
                BroadcastStats::default()
            }
        };

        ingress_result?;
        info!("Relay server stopped");
        Ok(stats)
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("Failed to read local address: {0}")]
    LocalAddr(io::Error),

    #[error("Ingress stopped: {0}")]
    Ingress(#[from] IngressError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_server_error_display() {
        let err = ServerError::Bind {
            addr: SocketAddr::from(([127, 0, 0, 1], 9001)),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        assert!(err.to_string().contains("127.0.0.1:9001"));
        assert!(err.to_string().contains("address in use"));
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let config = RelayConfig {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            ..RelayConfig::default()
        };
        let server = RelayServer::bind(&config, CancellationToken::new()).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let taken = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = RelayConfig {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: taken.local_addr().unwrap().port(),
            ..RelayConfig::default()
        };

        let result = RelayServer::bind(&config, CancellationToken::new()).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let token = CancellationToken::new();
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server = RelayServer::with_transport(Arc::new(socket), 4, token.clone());

        let task = tokio::spawn(server.run());
        token.cancel();

        let stats = task.await.unwrap().unwrap();
        assert_eq!(stats, BroadcastStats::default());
    }
}
