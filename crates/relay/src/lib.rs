//! Relay Client - Library for talking to a chat relay server
//!
//! A client registers once to obtain its numeric identity, then sends chat
//! frames tagged with that identity and receives other clients' messages as
//! plain-text datagrams, batched by the throttle it asked for.
//!
//! Delivery is best-effort in both directions: nothing is acknowledged and
//! nothing is retried.

pub mod client;
pub mod error;

// Re-export commonly used types
pub use client::{ClientConfig, RelayClient, DEFAULT_REGISTRATION_TIMEOUT};
pub use error::{ClientError, Result};
pub use relay_protocol::Broadcast;
