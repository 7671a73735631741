//! Leading kind byte of every frame.

use std::fmt;

/// Closed set of frame kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    RegisterRequest = 0,
    RegisterResponse = 1,
    ChatMessage = 2,
}

impl FrameKind {
    /// Parses a kind byte. Returns `None` for values outside the enumeration.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::RegisterRequest),
            1 => Some(Self::RegisterResponse),
            2 => Some(Self::ChatMessage),
            _ => None,
        }
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegisterRequest => write!(f, "register request"),
            Self::RegisterResponse => write!(f, "register response"),
            Self::ChatMessage => write!(f, "chat message"),
        }
    }
}
