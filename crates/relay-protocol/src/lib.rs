//! Relay Protocol - Datagram frames for the chat relay
//!
//! Every frame starts with a one-byte [`FrameKind`] followed by fixed-offset,
//! big-endian fields:
//!
//! ```text
//! RegisterRequest   [0][name:5][throttle:8]          14 bytes
//! RegisterResponse  [1][assigned_id:8]                9 bytes
//! ChatMessage       [2][sender_id:8][text:<=500]    <=509 bytes, NUL-padded
//! ```
//!
//! Broadcast deliveries from the server are NOT framed: they are plain
//! `"{name}: {text}"` datagrams carrying the raw text bytes (see [`payload`]).

pub mod frame;
pub mod kind;
pub mod payload;

pub use frame::{
    ChatMessage, Frame, FrameError, RegisterRequest, RegisterResponse, CHAT_HEADER_LEN,
    CHAT_MESSAGE_MAX_LEN, REGISTER_REQUEST_LEN, REGISTER_RESPONSE_LEN,
};
pub use kind::FrameKind;
pub use payload::{encode_broadcast, parse_broadcast, Broadcast};
