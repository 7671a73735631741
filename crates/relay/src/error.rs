//! Error types for the relay client.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::io;
use std::time::Duration;

use relay_protocol::{FrameError, FrameKind};
use thiserror::Error;

/// Client errors.
///
/// Startup errors (resolve, bind, registration) are fatal for the `relay`
/// binary. Send errors end the input loop.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server address could not be resolved.
    #[error("couldn't resolve server address {addr}: {reason}")]
    Resolve { addr: String, reason: String },

    /// Socket setup or I/O failure.
    #[error("udp socket error: {0}")]
    Io(#[from] io::Error),

    /// No registration response arrived in time.
    #[error("no registration response within {0:?}")]
    RegistrationTimeout(Duration),

    /// The server answered registration with the wrong frame kind.
    #[error("incorrect response type: {0}")]
    UnexpectedResponse(FrameKind),

    /// A frame could not be built or decoded.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// A received datagram is not a `"{name}: {text}"` delivery.
    #[error("malformed broadcast ({len} bytes)")]
    MalformedBroadcast { len: usize },
}

/// Result type alias using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;
