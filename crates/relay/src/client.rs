//! UDP client for the chat relay.
//!
//! This module provides the `RelayClient` which handles:
//! - Resolving the server and "connecting" an ephemeral UDP socket
//! - The registration exchange that yields the client's identity
//! - Sending chat frames and receiving plain-text broadcasts
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use relay_core::{ClientId, DisplayName};
use relay_protocol::{
    parse_broadcast, Broadcast, ChatMessage, Frame, RegisterRequest, REGISTER_RESPONSE_LEN,
};
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// How long to wait for the server's registration response.
pub const DEFAULT_REGISTRATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Receive buffer for broadcasts: name, separator, and up to 500 bytes of text.
const BROADCAST_BUFFER_SIZE: usize = 512;

// ============================================================================
// Configuration
// ============================================================================

/// Settings for one chat session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address as `host:port`.
    pub server: String,

    /// Display name sent at registration.
    pub name: DisplayName,

    /// Requested delivery threshold (0 means immediate).
    pub throttle: u64,

    /// How long to wait for the registration response.
    pub registration_timeout: Duration,
}

impl ClientConfig {
    pub fn new(server: impl Into<String>, name: DisplayName, throttle: u64) -> Self {
        Self {
            server: server.into(),
            name,
            throttle,
            registration_timeout: DEFAULT_REGISTRATION_TIMEOUT,
        }
    }
}

// ============================================================================
// Relay Client
// ============================================================================

/// A UDP socket connected to one relay server.
///
/// All methods take `&self`, so one client can be shared between a
/// receive task and a send loop.
#[derive(Debug)]
pub struct RelayClient {
    socket: UdpSocket,
    server: SocketAddr,
    registration_timeout: Duration,
}

impl RelayClient {
    /// Resolves `server` and connects an ephemeral socket to it.
    pub async fn connect(server: &str) -> Result<Self> {
        let addr = lookup_host(server)
            .await
            .map_err(|e| ClientError::Resolve {
                addr: server.to_string(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| ClientError::Resolve {
                addr: server.to_string(),
                reason: "no addresses found".to_string(),
            })?;

        let local = match addr.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;
        debug!(server = %addr, local = ?socket.local_addr().ok(), "Socket connected");

        Ok(Self {
            socket,
            server: addr,
            registration_timeout: DEFAULT_REGISTRATION_TIMEOUT,
        })
    }

    /// Connects using a full client configuration.
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::connect(&config.server)
            .await?
            .with_registration_timeout(config.registration_timeout))
    }

    #[must_use]
    pub fn with_registration_timeout(mut self, registration_timeout: Duration) -> Self {
        self.registration_timeout = registration_timeout;
        self
    }

    /// Registers with the server and returns the assigned identity.
    ///
    /// Reads exactly one reply; anything but a RegisterResponse is an error.
    pub async fn register(&self, name: DisplayName, throttle: u64) -> Result<ClientId> {
        let request = Frame::from(RegisterRequest { name, throttle }).encode();
        self.socket.send(&request).await?;

        let mut buf = [0u8; REGISTER_RESPONSE_LEN];
        let len = timeout(self.registration_timeout, self.socket.recv(&mut buf))
            .await
            .map_err(|_| ClientError::RegistrationTimeout(self.registration_timeout))??;

        let reply = buf.get(..len).unwrap_or_default();
        match Frame::decode(reply)? {
            Frame::RegisterResponse(resp) => {
                info!(
                    client_id = %resp.client_id,
                    name = %name,
                    server = %self.server,
                    "Registered with server"
                );
                Ok(resp.client_id)
            }
            other => Err(ClientError::UnexpectedResponse(other.kind())),
        }
    }

    /// Sends one chat message tagged with `id`.
    ///
    /// Delivery is not acknowledged.
    pub async fn send_text(&self, id: ClientId, text: &str) -> Result<()> {
        let frame = Frame::from(ChatMessage::new(id, text)?).encode();
        self.socket.send(&frame).await?;
        Ok(())
    }

    /// Waits for the next broadcast datagram and splits it into sender
    /// name and text.
    pub async fn recv_broadcast(&self) -> Result<Broadcast> {
        let mut buf = [0u8; BROADCAST_BUFFER_SIZE];
        let len = self.socket.recv(&mut buf).await?;
        let datagram = buf.get(..len).unwrap_or_default();
        parse_broadcast(datagram).ok_or(ClientError::MalformedBroadcast { len })
    }
}
