//! Registry actor commands and errors.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Errors that can occur during registry operations
//!
//! All types are designed for async message passing and follow the panic-free policy.

use std::net::SocketAddr;
use std::sync::Arc;

use relay_core::{AttributedMessage, ClientId, DisplayName, SessionView};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::broadcast::Flush;

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Each command carries a oneshot channel for the response, enabling
/// request-response patterns in async code without blocking.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Admit a new client and assign it the next identity.
    ///
    /// Always succeeds.
    Register {
        /// Reply and broadcast destination
        address: SocketAddr,
        /// Display name exactly as received
        name: DisplayName,
        /// Requested throttle (0 is stored as 1)
        throttle: u64,
        /// Channel to send the assigned identity
        respond_to: oneshot::Sender<ClientId>,
    },

    /// Look up a session by identity.
    ///
    /// Returns `None` if no client was ever assigned this id.
    Lookup {
        client_id: ClientId,
        respond_to: oneshot::Sender<Option<SessionView>>,
    },

    /// Queue a message for every session except its sender.
    ///
    /// Responds with the batches that reached their threshold and must be
    /// sent now.
    FanOut {
        message: Arc<AttributedMessage>,
        respond_to: oneshot::Sender<Vec<Flush>>,
    },

    /// Number of registered sessions.
    SessionCount { respond_to: oneshot::Sender<usize> },
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The command or response channel was closed.
    ///
    /// This typically indicates the actor was shut down.
    #[error("registry channel closed")]
    ChannelClosed,
}
