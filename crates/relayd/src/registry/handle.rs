//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending
//! commands to the registry actor. The ingress loop and the broadcast engine
//! each hold a clone.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `RegistryError::ChannelClosed`

use std::net::SocketAddr;
use std::sync::Arc;

use relay_core::{AttributedMessage, ClientId, DisplayName, SessionView};
use tokio::sync::{mpsc, oneshot};

use super::commands::{RegistryCommand, RegistryError};
use crate::broadcast::Flush;

/// Handle for interacting with the registry actor.
///
/// All methods are async and communicate with the actor via channels.
///
/// # Usage
///
/// ```ignore
/// let handle = spawn_registry();
///
/// let id = handle.register(addr, name, 0).await?;
/// let sender = handle.lookup(id).await?;
/// let flushes = handle.fan_out(message).await?;
/// ```
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Create a new registry handle.
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Register a client and return its assigned identity.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn register(
        &self,
        address: SocketAddr,
        name: DisplayName,
        throttle: u64,
    ) -> Result<ClientId, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.request(RegistryCommand::Register {
            address,
            name,
            throttle,
            respond_to: tx,
        })
        .await?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Look up a registered client.
    ///
    /// Returns `Ok(None)` for an id that was never assigned.
    pub async fn lookup(
        &self,
        client_id: ClientId,
    ) -> Result<Option<SessionView>, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.request(RegistryCommand::Lookup {
            client_id,
            respond_to: tx,
        })
        .await?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Queue a message for every client except its sender.
    ///
    /// Returns the batches that reached their recipient's threshold.
    pub async fn fan_out(
        &self,
        message: Arc<AttributedMessage>,
    ) -> Result<Vec<Flush>, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.request(RegistryCommand::FanOut {
            message,
            respond_to: tx,
        })
        .await?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Number of registered clients.
    ///
    /// Returns 0 if communication with the actor fails.
    pub async fn session_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        if self
            .request(RegistryCommand::SessionCount { respond_to: tx })
            .await
            .is_err()
        {
            return 0;
        }

        rx.await.unwrap_or_default()
    }

    async fn request(&self, cmd: RegistryCommand) -> Result<(), RegistryError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RegistryError::ChannelClosed)
    }
}
