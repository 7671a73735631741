//! Owned session map plus the identity counter.

use std::collections::HashMap;
use std::net::SocketAddr;

use relay_core::{ClientId, ClientSession, DisplayName, Throttle};

/// All registered clients, keyed by assigned identity.
///
/// Append-only: sessions are never removed, and ids are handed out from a
/// counter that only moves forward.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ClientId, ClientSession>,
    next_id: ClientId,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a client and returns its new identity.
    ///
    /// Never fails. Names need not be unique, and a requested throttle of 0
    /// is stored as 1.
    pub fn register(&mut self, address: SocketAddr, name: DisplayName, throttle: u64) -> ClientId {
        let id = self.next_id;
        self.next_id = id.next();

        let session = ClientSession::new(id, address, name, Throttle::new(throttle));
        self.sessions.insert(id, session);
        id
    }

    pub fn lookup(&self, id: ClientId) -> Option<&ClientSession> {
        self.sessions.get(&id)
    }

    /// Visits every session except `id`, in no particular order.
    pub fn for_each_except<F>(&mut self, id: ClientId, mut visit: F)
    where
        F: FnMut(&mut ClientSession),
    {
        self.sessions
            .iter_mut()
            .filter(|(session_id, _)| **session_id != id)
            .for_each(|(_, session)| visit(session));
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
