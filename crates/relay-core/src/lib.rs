//! Relay Core - Shared types for the chat relay
//!
//! This crate provides the domain types shared between the relay
//! server (relayd), the wire protocol, and the client.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod identity;
pub mod message;
pub mod session;

// Re-exports for convenience
pub use error::{DomainError, DomainResult};
pub use identity::{ClientId, DisplayName, Throttle};
pub use message::AttributedMessage;
pub use session::{ClientSession, SessionView};

/// Exact byte length of a display name on the wire.
pub const USERNAME_LENGTH: usize = 5;

/// Maximum chat text length in bytes.
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Largest throttle a client is allowed to request.
///
/// Enforced by the client CLI only. The server stores any non-zero value.
pub const MAX_THROTTLE: u64 = 50;

/// Default UDP port the server listens on.
pub const DEFAULT_PORT: u16 = 9001;
