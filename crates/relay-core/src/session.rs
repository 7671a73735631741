//! Per-client session state held by the server registry.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::identity::{ClientId, DisplayName, Throttle};
use crate::message::AttributedMessage;

/// Upper bound on the pending queue's preallocated capacity.
///
/// The throttle is client-controlled, so it is only used as a hint.
const MAX_QUEUE_CAPACITY_HINT: usize = 64;

/// One registered client.
///
/// Sessions are created on registration and live for the lifetime of the
/// server process. The pending queue never holds more than `throttle`
/// messages: reaching the threshold drains it.
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub id: ClientId,
    pub address: SocketAddr,
    pub name: DisplayName,
    pub throttle: Throttle,
    pending: Vec<Arc<AttributedMessage>>,
}

impl ClientSession {
    /// Creates a session with an empty pending queue.
    pub fn new(id: ClientId, address: SocketAddr, name: DisplayName, throttle: Throttle) -> Self {
        Self {
            id,
            address,
            name,
            throttle,
            pending: empty_queue(throttle),
        }
    }

    /// Appends a message to the pending queue.
    ///
    /// Returns the whole batch, in arrival order, once the queue reaches the
    /// throttle. The queue is empty again afterwards.
    pub fn enqueue(
        &mut self,
        message: Arc<AttributedMessage>,
    ) -> Option<Vec<Arc<AttributedMessage>>> {
        self.pending.push(message);

        if self.pending.len() as u64 >= self.throttle.get() {
            Some(std::mem::replace(&mut self.pending, empty_queue(self.throttle)))
        } else {
            None
        }
    }

    /// Number of messages waiting for the threshold.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn empty_queue(throttle: Throttle) -> Vec<Arc<AttributedMessage>> {
    let hint = usize::try_from(throttle.get())
        .unwrap_or(MAX_QUEUE_CAPACITY_HINT)
        .min(MAX_QUEUE_CAPACITY_HINT);
    Vec::with_capacity(hint)
}

/// Read-only snapshot of a session, safe to hand out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub id: ClientId,
    pub address: SocketAddr,
    pub name: DisplayName,
    pub throttle: Throttle,
    pub pending: usize,
}

impl SessionView {
    pub fn from_session(session: &ClientSession) -> Self {
        Self {
            id: session.id,
            address: session.address,
            name: session.name,
            throttle: session.throttle,
            pending: session.pending_len(),
        }
    }
}
