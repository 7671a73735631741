//! Broadcast engine - fans chat messages out to every other client.
//!
//! Each recipient has a pending queue and a throttle. A message is appended
//! to every queue except the sender's; a queue that reaches its throttle is
//! flushed as one plain-text datagram per queued message, oldest first.
//! There is no timer: a queue below its threshold simply waits.
//!
//! ```text
//!  ingress ──mpsc<AttributedMessage>──▶ BroadcastEngine ──FanOut──▶ RegistryActor
//!                                             │          ◀─Vec<Flush>─┘
//!                                             ▼
//!                                      transport.send_to()
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use relay_core::{AttributedMessage, ClientId};
use relay_protocol::encode_broadcast;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::registry::{RegistryError, RegistryHandle, SessionRegistry};
use crate::transport::Transport;

/// A batch that reached its recipient's threshold and must be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flush {
    pub recipient: ClientId,
    pub address: SocketAddr,
    /// Encoded `"{name}: {text}"` payloads, in submission order.
    pub payloads: Vec<Vec<u8>>,
}

/// Appends `message` to every pending queue except the sender's and
/// collects the queues that hit their threshold.
///
/// Runs inside the registry actor, which owns the sessions.
pub fn fan_out(sessions: &mut SessionRegistry, message: &Arc<AttributedMessage>) -> Vec<Flush> {
    let mut flushes = Vec::new();

    sessions.for_each_except(message.sender_id, |session| {
        if let Some(batch) = session.enqueue(Arc::clone(message)) {
            flushes.push(Flush {
                recipient: session.id,
                address: session.address,
                payloads: batch
                    .iter()
                    .map(|m| encode_broadcast(&m.sender_name, &m.text))
                    .collect(),
            });
        }
    });

    flushes
}

/// Totals reported when the engine stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    /// Messages taken off the queue
    pub messages: u64,
    /// Datagrams successfully handed to the transport
    pub datagrams: u64,
}

/// Single consumer of the broadcast queue.
pub struct BroadcastEngine<T: Transport> {
    receiver: mpsc::Receiver<AttributedMessage>,
    registry: RegistryHandle,
    transport: Arc<T>,
}

impl<T: Transport> BroadcastEngine<T> {
    pub fn new(
        receiver: mpsc::Receiver<AttributedMessage>,
        registry: RegistryHandle,
        transport: Arc<T>,
    ) -> Self {
        Self {
            receiver,
            registry,
            transport,
        }
    }

    /// Processes messages in submission order until the queue is closed
    /// (every sender dropped) or the registry goes away.
    pub async fn run(mut self) -> BroadcastStats {
        info!("Broadcast engine starting");
        let mut stats = BroadcastStats::default();

        while let Some(message) = self.receiver.recv().await {
            stats.messages += 1;

            match self.broadcast(message).await {
                Ok(sent) => stats.datagrams += sent,
                Err(RegistryError::ChannelClosed) => {
                    warn!("Registry closed, broadcast engine stopping");
                    break;
                }
            }
        }

        info!(
            messages = stats.messages,
            datagrams = stats.datagrams,
            "Broadcast engine stopped"
        );
        stats
    }

    /// Fans one message out and sends whatever batches it completed.
    ///
    /// Returns the number of datagrams sent.
    async fn broadcast(&self, message: AttributedMessage) -> Result<u64, RegistryError> {
        let flushes = self.registry.fan_out(Arc::new(message)).await?;
        let mut sent = 0;

        for flush in flushes {
            debug!(
                recipient = %flush.recipient,
                address = %flush.address,
                count = flush.payloads.len(),
                "Flushing pending messages"
            );

            for payload in &flush.payloads {
                match self.transport.send_to(payload, flush.address).await {
                    Ok(_) => sent += 1,
                    Err(e) => {
                        warn!(
                            recipient = %flush.recipient,
                            address = %flush.address,
                            error = %e,
                            "Failed to deliver message"
                        );
                    }
                }
            }
        }

        Ok(sent)
    }
}
