//! Relay Daemon - Session registry and throttled broadcast server
//!
//! This crate provides the server side of the chat relay:
//! - `registry` - Session registry actor mapping identities to clients
//! - `ingress` - Receive loop decoding and dispatching frames
//! - `broadcast` - Fan-out engine with per-client delivery thresholds
//! - `transport` - Datagram send/receive seam
//! - `server` - Wiring and lifecycle
//! - `config` - Layered configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        relayd                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐  register/lookup  ┌─────────────────┐  │
//! │  │ IngressHandler  │──────────────────▶│  RegistryActor  │  │
//! │  │ (receive loop)  │                   │ (session owner) │  │
//! │  └────────┬────────┘                   └────────▲────────┘  │
//! │           │ mpsc<AttributedMessage>             │ fan-out   │
//! │           ▼                                     │           │
//! │  ┌─────────────────┐                            │           │
//! │  │ BroadcastEngine │────────────────────────────┘           │
//! │  │ (single worker) │──▶ UDP datagrams to recipients         │
//! │  └─────────────────┘                                        │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod broadcast;
pub mod config;
pub mod ingress;
pub mod registry;
pub mod server;
pub mod transport;
