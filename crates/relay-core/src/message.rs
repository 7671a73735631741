//! Chat messages attributed to a registered sender.

use std::borrow::Cow;

use crate::identity::{ClientId, DisplayName};

/// A chat message plus its resolved sender.
///
/// The sender's display name is resolved from the registry when the
/// message is submitted, not when it is delivered. The text is kept as the
/// raw bytes received; nothing requires it to be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedMessage {
    pub sender_id: ClientId,
    pub sender_name: DisplayName,
    pub text: Vec<u8>,
}

impl AttributedMessage {
    pub fn new(sender_id: ClientId, sender_name: DisplayName, text: impl Into<Vec<u8>>) -> Self {
        Self {
            sender_id,
            sender_name,
            text: text.into(),
        }
    }

    /// Text for logs and consoles. Invalid UTF-8 is replaced.
    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }
}
