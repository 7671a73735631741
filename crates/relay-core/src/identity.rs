//! Client identity value objects: assigned id, display name, throttle.

use std::fmt;
use std::num::NonZeroU64;

use crate::error::{DomainError, DomainResult};
use crate::USERNAME_LENGTH;

// ============================================================================
// Client Identity
// ============================================================================

/// Numeric identity assigned by the server at registration.
///
/// Ids start at 0 and increase by one per registration. They are never
/// reused for the lifetime of a server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ClientId(u64);

impl ClientId {
    /// Creates a ClientId from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the id that follows this one.
    ///
    /// Saturates at `u64::MAX` rather than wrapping back to an old id.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ClientId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ============================================================================
// Display Name
// ============================================================================

/// Fixed-width display name, exactly [`USERNAME_LENGTH`] raw bytes.
///
/// Names are not unique. The server keeps the bytes exactly as received;
/// rendering is lossy UTF-8 with no trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayName([u8; USERNAME_LENGTH]);

impl DisplayName {
    /// Wraps the raw name bytes taken from a frame.
    pub const fn from_wire(bytes: [u8; USERNAME_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parses a user-supplied name, which must be exactly
    /// [`USERNAME_LENGTH`] bytes long.
    pub fn parse(name: &str) -> DomainResult<Self> {
        let bytes: [u8; USERNAME_LENGTH] = name.as_bytes().try_into().map_err(|_| {
            DomainError::InvalidDisplayName {
                len: name.len(),
                expected: USERNAME_LENGTH,
            }
        })?;
        Ok(Self(bytes))
    }

    /// Returns the raw name bytes.
    pub const fn as_bytes(&self) -> &[u8; USERNAME_LENGTH] {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

// ============================================================================
// Throttle
// ============================================================================

/// Number of pending messages that must accumulate before a flush.
///
/// Always at least 1: a requested throttle of 0 means immediate delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Throttle(NonZeroU64);

impl Throttle {
    /// Immediate delivery, one datagram per incoming message.
    pub const IMMEDIATE: Throttle = Throttle(NonZeroU64::MIN);

    /// Creates a throttle from the requested value, substituting 1 for 0.
    pub fn new(requested: u64) -> Self {
        NonZeroU64::new(requested).map_or(Self::IMMEDIATE, Self)
    }

    /// Returns the threshold as a plain count.
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::IMMEDIATE
    }
}

impl fmt::Display for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
