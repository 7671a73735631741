//! Session registry using Actor pattern.
//!
//! The registry maps assigned identities to client sessions. A single
//! actor task owns the map; every read and write is a command on its mpsc
//! channel, answered over a oneshot.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐  Register/Lookup   ┌─────────────────┐
//! │ IngressHandler  │───────────────────▶│  RegistryActor  │
//! └─────────────────┘                    │                 │
//!                                        │ SessionRegistry │
//! ┌─────────────────┐  FanOut            │ (id → session)  │
//! │ BroadcastEngine │───────────────────▶│                 │
//! └─────────────────┘   ◀── Vec<Flush>   └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - Channel operations handle closure gracefully

use tokio::sync::mpsc;

mod actor;
mod commands;
mod handle;
mod sessions;

pub use actor::RegistryActor;
pub use commands::{RegistryCommand, RegistryError};
pub use handle::RegistryHandle;
pub use sessions::SessionRegistry;

/// Command channel buffer size
const COMMAND_BUFFER: usize = 100;

/// Spawn the registry actor and return a handle for interaction.
///
/// The actor stops once every clone of the handle has been dropped.
///
/// # Example
///
/// ```no_run
/// use relayd::registry::spawn_registry;
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_registry();
///     assert_eq!(handle.session_count().await, 0);
/// }
/// ```
pub fn spawn_registry() -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

    let actor = RegistryActor::new(cmd_rx);
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx)
}
