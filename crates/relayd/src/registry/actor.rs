//! Registry actor - owns all session state and processes commands.
//!
//! The RegistryActor is the single owner of the session map. Registration,
//! lookup, and pending-queue mutation all run inside its task, one command
//! at a time, so no reader can observe a half-inserted session.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Response send failures are ignored (the requester went away)

use std::net::SocketAddr;
use std::sync::Arc;

use relay_core::{AttributedMessage, ClientId, DisplayName, SessionView};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::commands::RegistryCommand;
use super::sessions::SessionRegistry;
use crate::broadcast::{fan_out, Flush};

// ============================================================================
// Registry Actor
// ============================================================================

/// The registry actor - owns all session state.
///
/// Implements the actor pattern: receives commands via mpsc channel and
/// processes them sequentially.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// Session map and identity counter
    sessions: SessionRegistry,
}

impl RegistryActor {
    /// Creates a new registry actor with an empty session map.
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>) -> Self {
        Self {
            receiver,
            sessions: SessionRegistry::new(),
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all handles dropped).
    pub async fn run(mut self) {
        info!("Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(sessions = self.sessions.len(), "Registry actor stopped");
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Register {
                address,
                name,
                throttle,
                respond_to,
            } => {
                let id = self.handle_register(address, name, throttle);
                let _ = respond_to.send(id);
            }
            RegistryCommand::Lookup {
                client_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_lookup(client_id));
            }
            RegistryCommand::FanOut {
                message,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_fan_out(&message));
            }
            RegistryCommand::SessionCount { respond_to } => {
                let _ = respond_to.send(self.sessions.len());
            }
        }
    }

    fn handle_register(
        &mut self,
        address: SocketAddr,
        name: DisplayName,
        throttle: u64,
    ) -> ClientId {
        let id = self.sessions.register(address, name, throttle);

        info!(
            client_id = %id,
            name = %name,
            %address,
            requested_throttle = throttle,
            "Client registered"
        );

        id
    }

    fn handle_lookup(&self, client_id: ClientId) -> Option<SessionView> {
        self.sessions.lookup(client_id).map(SessionView::from_session)
    }

    fn handle_fan_out(&mut self, message: &Arc<AttributedMessage>) -> Vec<Flush> {
        let flushes = fan_out(&mut self.sessions, message);

        debug!(
            sender = %message.sender_id,
            flushes = flushes.len(),
            "Message fanned out"
        );

        flushes
    }
}
