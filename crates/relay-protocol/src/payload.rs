//! Broadcast payloads delivered to recipients.
//!
//! Deliveries are not framed: a datagram is the sender's name, `": "`, and
//! the sender's text bytes exactly as they arrived.

use std::borrow::Cow;
use std::fmt;

use relay_core::DisplayName;

/// Separator between the sender name and the text.
pub const SEPARATOR: &[u8] = b": ";

/// Builds the datagram delivered for one message.
pub fn encode_broadcast(name: &DisplayName, text: &[u8]) -> Vec<u8> {
    let name = name.as_bytes();
    let mut buf = Vec::with_capacity(name.len() + SEPARATOR.len() + text.len());
    buf.extend_from_slice(name);
    buf.extend_from_slice(SEPARATOR);
    buf.extend_from_slice(text);
    buf
}

/// One received delivery, split at the first separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub name: Vec<u8>,
    pub text: Vec<u8>,
}

impl Broadcast {
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }
}

impl fmt::Display for Broadcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name_lossy(), self.text_lossy())
    }
}

/// Splits a delivery datagram into name and text.
///
/// Returns `None` when the datagram has no separator.
pub fn parse_broadcast(datagram: &[u8]) -> Option<Broadcast> {
    let at = datagram
        .windows(SEPARATOR.len())
        .position(|w| w == SEPARATOR)?;
    let name = datagram.get(..at)?;
    let text = datagram.get(at + SEPARATOR.len()..)?;
    Some(Broadcast {
        name: name.to_vec(),
        text: text.to_vec(),
    })
}
