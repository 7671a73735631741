//! Length-checked encoding and decoding of the three frame kinds.
//!
//! Decoding validates lengths before reading any field, so a short or
//! oversized datagram becomes a [`FrameError`] instead of a panic.

use relay_core::{ClientId, DisplayName, MAX_MESSAGE_LENGTH, USERNAME_LENGTH};
use thiserror::Error;

use crate::kind::FrameKind;

/// Total length of a RegisterRequest frame.
pub const REGISTER_REQUEST_LEN: usize = 1 + USERNAME_LENGTH + 8;

/// Total length of a RegisterResponse frame.
pub const REGISTER_RESPONSE_LEN: usize = 1 + 8;

/// Kind byte plus sender id, the part of a ChatMessage before the text.
pub const CHAT_HEADER_LEN: usize = 1 + 8;

/// Largest legal ChatMessage frame.
pub const CHAT_MESSAGE_MAX_LEN: usize = CHAT_HEADER_LEN + MAX_MESSAGE_LENGTH;

const NAME_OFFSET: usize = 1;
const THROTTLE_OFFSET: usize = NAME_OFFSET + USERNAME_LENGTH;
const ID_OFFSET: usize = 1;

// ============================================================================
// Errors
// ============================================================================

/// Reasons a buffer is not a valid frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,

    #[error("unknown frame kind: {0}")]
    UnknownKind(u8),

    #[error("{kind} frame truncated: {actual} bytes (need {expected})")]
    Truncated {
        kind: FrameKind,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} frame oversized: {actual} bytes (max {max})")]
    Oversized {
        kind: FrameKind,
        max: usize,
        actual: usize,
    },

    #[error("message text too long: {len} bytes (max {max})")]
    TextTooLong { len: usize, max: usize },
}

// ============================================================================
// Frame Types
// ============================================================================

/// Client asks to join, giving a display name and a requested throttle.
///
/// The throttle is carried exactly as requested; substituting 1 for 0 is
/// the registry's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRequest {
    pub name: DisplayName,
    pub throttle: u64,
}

/// Server reply carrying the identity assigned to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterResponse {
    pub client_id: ClientId,
}

/// Chat text tagged with the sender's claimed identity.
///
/// The text is raw bytes; the relay forwards whatever the sender wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    sender: ClientId,
    text: Vec<u8>,
}

impl ChatMessage {
    /// Creates a chat message, rejecting text that does not fit the frame.
    pub fn new(sender: ClientId, text: impl Into<Vec<u8>>) -> Result<Self, FrameError> {
        let text = text.into();
        if text.len() > MAX_MESSAGE_LENGTH {
            return Err(FrameError::TextTooLong {
                len: text.len(),
                max: MAX_MESSAGE_LENGTH,
            });
        }
        Ok(Self { sender, text })
    }

    pub fn sender(&self) -> ClientId {
        self.sender
    }

    /// Text with trailing NUL padding removed. May be empty.
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn into_text(self) -> Vec<u8> {
        self.text
    }
}

/// Any decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    RegisterRequest(RegisterRequest),
    RegisterResponse(RegisterResponse),
    ChatMessage(ChatMessage),
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::RegisterRequest(_) => FrameKind::RegisterRequest,
            Self::RegisterResponse(_) => FrameKind::RegisterResponse,
            Self::ChatMessage(_) => FrameKind::ChatMessage,
        }
    }

    /// Decodes one datagram.
    ///
    /// Trailing bytes after the fixed-size register frames are ignored.
    pub fn decode(buf: &[u8]) -> Result<Frame, FrameError> {
        let kind_byte = *buf.first().ok_or(FrameError::Empty)?;
        let kind = FrameKind::from_byte(kind_byte).ok_or(FrameError::UnknownKind(kind_byte))?;

        match kind {
            FrameKind::RegisterRequest => {
                require_len(kind, buf, REGISTER_REQUEST_LEN)?;
                let name: [u8; USERNAME_LENGTH] = field(kind, buf, NAME_OFFSET)?;
                let throttle = u64::from_be_bytes(field(kind, buf, THROTTLE_OFFSET)?);
                Ok(Frame::RegisterRequest(RegisterRequest {
                    name: DisplayName::from_wire(name),
                    throttle,
                }))
            }
            FrameKind::RegisterResponse => {
                require_len(kind, buf, REGISTER_RESPONSE_LEN)?;
                let id = u64::from_be_bytes(field(kind, buf, ID_OFFSET)?);
                Ok(Frame::RegisterResponse(RegisterResponse {
                    client_id: ClientId::new(id),
                }))
            }
            FrameKind::ChatMessage => {
                require_len(kind, buf, CHAT_HEADER_LEN)?;
                if buf.len() > CHAT_MESSAGE_MAX_LEN {
                    return Err(FrameError::Oversized {
                        kind,
                        max: CHAT_MESSAGE_MAX_LEN,
                        actual: buf.len(),
                    });
                }
                let sender = ClientId::new(u64::from_be_bytes(field(kind, buf, ID_OFFSET)?));
                let raw = buf.get(CHAT_HEADER_LEN..).unwrap_or_default();
                Ok(Frame::ChatMessage(ChatMessage {
                    sender,
                    text: trim_padding(raw),
                }))
            }
        }
    }

    /// Encodes the frame. ChatMessage frames are always padded to
    /// [`CHAT_MESSAGE_MAX_LEN`].
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::RegisterRequest(req) => {
                let mut buf = Vec::with_capacity(REGISTER_REQUEST_LEN);
                buf.push(FrameKind::RegisterRequest.as_byte());
                buf.extend_from_slice(req.name.as_bytes());
                buf.extend_from_slice(&req.throttle.to_be_bytes());
                buf
            }
            Self::RegisterResponse(resp) => {
                let mut buf = Vec::with_capacity(REGISTER_RESPONSE_LEN);
                buf.push(FrameKind::RegisterResponse.as_byte());
                buf.extend_from_slice(&resp.client_id.as_u64().to_be_bytes());
                buf
            }
            Self::ChatMessage(msg) => {
                let mut buf = Vec::with_capacity(CHAT_MESSAGE_MAX_LEN);
                buf.push(FrameKind::ChatMessage.as_byte());
                buf.extend_from_slice(&msg.sender.as_u64().to_be_bytes());
                buf.extend_from_slice(&msg.text);
                buf.resize(CHAT_MESSAGE_MAX_LEN, 0);
                buf
            }
        }
    }
}

impl From<RegisterRequest> for Frame {
    fn from(req: RegisterRequest) -> Self {
        Self::RegisterRequest(req)
    }
}

impl From<RegisterResponse> for Frame {
    fn from(resp: RegisterResponse) -> Self {
        Self::RegisterResponse(resp)
    }
}

impl From<ChatMessage> for Frame {
    fn from(msg: ChatMessage) -> Self {
        Self::ChatMessage(msg)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn require_len(kind: FrameKind, buf: &[u8], expected: usize) -> Result<(), FrameError> {
    if buf.len() < expected {
        return Err(FrameError::Truncated {
            kind,
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Copies a fixed-size field starting at `offset`.
fn field<const N: usize>(
    kind: FrameKind,
    buf: &[u8],
    offset: usize,
) -> Result<[u8; N], FrameError> {
    buf.get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(FrameError::Truncated {
            kind,
            expected: offset + N,
            actual: buf.len(),
        })
}

/// Strips trailing NUL padding.
fn trim_padding(raw: &[u8]) -> Vec<u8> {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    raw.get(..end).unwrap_or_default().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> DisplayName {
        DisplayName::parse(s).unwrap()
    }

    #[test]
    fn test_register_request_layout() {
        let frame = Frame::from(RegisterRequest {
            name: name("alice"),
            throttle: 258,
        });
        let bytes = frame.encode();
        assert_eq!(bytes.len(), REGISTER_REQUEST_LEN);
        assert_eq!(bytes[0], 0);
        assert_eq!(&bytes[1..6], b"alice");
        assert_eq!(&bytes[6..14], &[0, 0, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_register_request_round_trip() {
        let req = RegisterRequest {
            name: name("bobby"),
            throttle: 0,
        };
        let decoded = Frame::decode(&Frame::from(req).encode()).unwrap();
        assert_eq!(decoded, Frame::RegisterRequest(req));
    }

    #[test]
    fn test_register_response_round_trip() {
        let resp = RegisterResponse {
            client_id: ClientId::new(u64::MAX - 1),
        };
        let bytes = Frame::from(resp).encode();
        assert_eq!(bytes.len(), REGISTER_RESPONSE_LEN);
        assert_eq!(bytes[0], 1);
        assert_eq!(Frame::decode(&bytes).unwrap(), Frame::RegisterResponse(resp));
    }

    #[test]
    fn test_chat_message_round_trip_strips_padding() {
        let msg = ChatMessage::new(ClientId::new(7), "hello").unwrap();
        let bytes = Frame::from(msg.clone()).encode();
        assert_eq!(bytes.len(), CHAT_MESSAGE_MAX_LEN);
        assert_eq!(bytes[0], 2);
        assert!(bytes[14..].iter().all(|&b| b == 0));

        match Frame::decode(&bytes).unwrap() {
            Frame::ChatMessage(decoded) => {
                assert_eq!(decoded.sender(), ClientId::new(7));
                assert_eq!(decoded.text(), b"hello");
                assert_eq!(decoded, msg);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_chat_message_unpadded_and_header_only() {
        let mut bytes = vec![2, 0, 0, 0, 0, 0, 0, 0, 3];
        let Frame::ChatMessage(empty) = Frame::decode(&bytes).unwrap() else {
            panic!("expected chat message");
        };
        assert!(empty.text().is_empty());

        bytes.extend_from_slice(b"yo");
        let Frame::ChatMessage(short) = Frame::decode(&bytes).unwrap() else {
            panic!("expected chat message");
        };
        assert_eq!(short.sender(), ClientId::new(3));
        assert_eq!(short.text(), b"yo");
    }

    #[test]
    fn test_chat_message_keeps_interior_nul() {
        let mut bytes = vec![2, 0, 0, 0, 0, 0, 0, 0, 0];
        bytes.extend_from_slice(b"a\0b\0\0");
        let Frame::ChatMessage(msg) = Frame::decode(&bytes).unwrap() else {
            panic!("expected chat message");
        };
        assert_eq!(msg.text(), b"a\0b");
    }

    #[test]
    fn test_chat_message_preserves_invalid_utf8() {
        let mut bytes = vec![2, 0, 0, 0, 0, 0, 0, 0, 1];
        bytes.extend_from_slice(&[0xFF; MAX_MESSAGE_LENGTH]);
        let Frame::ChatMessage(msg) = Frame::decode(&bytes).unwrap() else {
            panic!("expected chat message");
        };
        assert_eq!(msg.text(), &[0xFF; MAX_MESSAGE_LENGTH][..]);

        // Re-encoding yields the same frame, nothing cut or expanded.
        assert_eq!(Frame::from(msg).encode(), bytes);
    }

    #[test]
    fn test_chat_message_text_limit() {
        let max = "x".repeat(MAX_MESSAGE_LENGTH);
        assert!(ChatMessage::new(ClientId::new(0), max).is_ok());

        let over = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert_eq!(
            ChatMessage::new(ClientId::new(0), over),
            Err(FrameError::TextTooLong {
                len: MAX_MESSAGE_LENGTH + 1,
                max: MAX_MESSAGE_LENGTH,
            })
        );
    }

    #[test]
    fn test_decode_empty_and_unknown_kind() {
        assert_eq!(Frame::decode(&[]), Err(FrameError::Empty));
        assert_eq!(Frame::decode(&[9, 1, 2, 3]), Err(FrameError::UnknownKind(9)));
    }

    #[test]
    fn test_decode_truncated_frames() {
        assert_eq!(
            Frame::decode(&[0, b'a', b'b']),
            Err(FrameError::Truncated {
                kind: FrameKind::RegisterRequest,
                expected: REGISTER_REQUEST_LEN,
                actual: 3,
            })
        );
        assert!(matches!(
            Frame::decode(&[1, 0, 0]),
            Err(FrameError::Truncated { kind: FrameKind::RegisterResponse, .. })
        ));
        assert!(matches!(
            Frame::decode(&[2, 0, 0, 0, 0, 0, 0, 0]),
            Err(FrameError::Truncated { kind: FrameKind::ChatMessage, .. })
        ));
    }

    #[test]
    fn test_decode_oversized_chat_message() {
        let bytes = vec![2; CHAT_MESSAGE_MAX_LEN + 1];
        assert!(matches!(
            Frame::decode(&bytes),
            Err(FrameError::Oversized { max: CHAT_MESSAGE_MAX_LEN, .. })
        ));
    }

    #[test]
    fn test_register_request_ignores_trailing_bytes() {
        let mut bytes = Frame::from(RegisterRequest {
            name: name("carol"),
            throttle: 4,
        })
        .encode();
        bytes.extend_from_slice(&[0xaa; 20]);

        let Frame::RegisterRequest(req) = Frame::decode(&bytes).unwrap() else {
            panic!("expected register request");
        };
        assert_eq!(req.throttle, 4);
        assert_eq!(req.name, name("carol"));
    }
}
