//! Ingress handler - the server's receive loop.
//!
//! Reads one datagram at a time, decodes it, and dispatches by kind:
//! registrations go to the registry and get a response frame, chat messages
//! are attributed and queued for the broadcast engine. Anything invalid is
//! dropped without telling the sender.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use relay_core::{AttributedMessage, ClientId};
use relay_protocol::{ChatMessage, Frame, FrameError, FrameKind, RegisterRequest, RegisterResponse};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{RegistryError, RegistryHandle};
use crate::transport::Transport;

/// Receive buffer size. The largest legal frame is 509 bytes.
pub const RECV_BUFFER_SIZE: usize = 512;

/// Pause after a failed receive so a persistently failing socket does not
/// spin.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// What happened to one inbound datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A client was admitted and sent its identity.
    Registered(ClientId),
    /// A chat message was queued for broadcast.
    Submitted,
    /// The datagram was silently discarded.
    Dropped(DropReason),
}

/// Why a datagram was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Malformed(FrameError),
    UnexpectedKind(FrameKind),
    EmptyText,
    UnknownSender(ClientId),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed frame: {e}"),
            Self::UnexpectedKind(kind) => write!(f, "unexpected {kind} frame"),
            Self::EmptyText => write!(f, "empty message text"),
            Self::UnknownSender(id) => write!(f, "unknown sender {id}"),
        }
    }
}

/// Conditions that stop the receive loop.
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("registry unavailable: {0}")]
    Registry(#[from] RegistryError),

    #[error("broadcast queue closed")]
    QueueClosed,
}

/// Single-threaded receive loop feeding the registry and the broadcast queue.
pub struct IngressHandler<T: Transport> {
    transport: Arc<T>,
    registry: RegistryHandle,
    broadcast_tx: mpsc::Sender<AttributedMessage>,
    cancel_token: CancellationToken,
}

impl<T: Transport> IngressHandler<T> {
    pub fn new(
        transport: Arc<T>,
        registry: RegistryHandle,
        broadcast_tx: mpsc::Sender<AttributedMessage>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            transport,
            registry,
            broadcast_tx,
            cancel_token,
        }
    }

    /// Receives datagrams until cancelled.
    ///
    /// Read errors abandon that one receive and the loop keeps waiting.
    /// Consuming `self` closes the broadcast queue on return.
    pub async fn run(self) -> Result<(), IngressError> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        loop {
            let received = tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Ingress shutdown requested");
                    return Ok(());
                }
                result = self.transport.recv_from(&mut buf) => result,
            };

            let (len, source) = match received {
                Ok(r) => r,
                Err(e) => {
                    debug!(error = %e, "Receive failed, waiting for next datagram");
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                    continue;
                }
            };

            let datagram = buf.get(..len).unwrap_or_default();
            if let Dispatch::Dropped(reason) = self.handle_datagram(datagram, source).await? {
                debug!(%source, %reason, "Datagram dropped");
            }
        }
    }

    /// Decodes and dispatches one datagram.
    ///
    /// Only a closed registry or broadcast queue is an error; every
    /// per-datagram problem becomes `Dispatch::Dropped`.
    pub async fn handle_datagram(
        &self,
        datagram: &[u8],
        source: SocketAddr,
    ) -> Result<Dispatch, IngressError> {
        let frame = match Frame::decode(datagram) {
            Ok(frame) => frame,
            Err(e) => return Ok(Dispatch::Dropped(DropReason::Malformed(e))),
        };

        match frame {
            Frame::RegisterRequest(req) => self.handle_register(req, source).await,
            Frame::ChatMessage(msg) => self.handle_chat(msg).await,
            Frame::RegisterResponse(_) => Ok(Dispatch::Dropped(DropReason::UnexpectedKind(
                FrameKind::RegisterResponse,
            ))),
        }
    }

    async fn handle_register(
        &self,
        req: RegisterRequest,
        source: SocketAddr,
    ) -> Result<Dispatch, IngressError> {
        let client_id = self.registry.register(source, req.name, req.throttle).await?;

        let response = Frame::from(RegisterResponse { client_id }).encode();
        if let Err(e) = self.transport.send_to(&response, source).await {
            warn!(
                client_id = %client_id,
                %source,
                error = %e,
                "Failed to send register response"
            );
        }

        Ok(Dispatch::Registered(client_id))
    }

    async fn handle_chat(&self, msg: ChatMessage) -> Result<Dispatch, IngressError> {
        if msg.text().is_empty() {
            return Ok(Dispatch::Dropped(DropReason::EmptyText));
        }

        let sender_id = msg.sender();
        let Some(sender) = self.registry.lookup(sender_id).await? else {
            return Ok(Dispatch::Dropped(DropReason::UnknownSender(sender_id)));
        };

        let message = AttributedMessage::new(sender_id, sender.name, msg.into_text());
        debug!(
            sender = %sender_id,
            len = message.text.len(),
            text = %message.text_lossy(),
            "Message queued for broadcast"
        );
        self.broadcast_tx
            .send(message)
            .await
            .map_err(|_| IngressError::QueueClosed)?;

        Ok(Dispatch::Submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::spawn_registry;
    use crate::transport::recording::RecordingTransport;
    use relay_core::DisplayName;
    use std::io;

    struct Harness {
        ingress: IngressHandler<RecordingTransport>,
        transport: Arc<RecordingTransport>,
        registry: RegistryHandle,
        queue: mpsc::Receiver<AttributedMessage>,
    }

    fn harness() -> Harness {
        let transport = Arc::new(RecordingTransport::default());
        let registry = spawn_registry();
        let (tx, queue) = mpsc::channel(16);
        let ingress = IngressHandler::new(
            Arc::clone(&transport),
            registry.clone(),
            tx,
            CancellationToken::new(),
        );
        Harness {
            ingress,
            transport,
            registry,
            queue,
        }
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn register_frame(name: &str, throttle: u64) -> Vec<u8> {
        Frame::from(RegisterRequest {
            name: DisplayName::parse(name).unwrap(),
            throttle,
        })
        .encode()
    }

    fn chat_frame(sender: u64, text: &str) -> Vec<u8> {
        Frame::from(ChatMessage::new(ClientId::new(sender), text).unwrap()).encode()
    }

    #[tokio::test]
    async fn test_register_replies_with_assigned_id() {
        let h = harness();

        let first = h.ingress.handle_datagram(&register_frame("alice", 0), addr(4000)).await;
        let second = h.ingress.handle_datagram(&register_frame("bobby", 2), addr(4001)).await;
        assert_eq!(first.unwrap(), Dispatch::Registered(ClientId::new(0)));
        assert_eq!(second.unwrap(), Dispatch::Registered(ClientId::new(1)));

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], (addr(4000), vec![1, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(sent[1], (addr(4001), vec![1, 0, 0, 0, 0, 0, 0, 0, 1]));

        let view = h.registry.lookup(ClientId::new(0)).await.unwrap().unwrap();
        assert_eq!(view.throttle.get(), 1);
    }

    #[tokio::test]
    async fn test_register_stands_when_response_send_fails() {
        let transport = Arc::new(RecordingTransport::failing_for(addr(4000)));
        let registry = spawn_registry();
        let (tx, _queue) = mpsc::channel(4);
        let ingress = IngressHandler::new(
            Arc::clone(&transport),
            registry.clone(),
            tx,
            CancellationToken::new(),
        );

        let result = ingress.handle_datagram(&register_frame("alice", 1), addr(4000)).await;
        assert_eq!(result.unwrap(), Dispatch::Registered(ClientId::new(0)));
        assert_eq!(registry.session_count().await, 1);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_run_survives_receive_error() {
        let transport = Arc::new(RecordingTransport::scripted(vec![
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok((register_frame("alice", 1), addr(4000))),
        ]));
        let token = CancellationToken::new();
        let (tx, _queue) = mpsc::channel(4);
        let ingress = IngressHandler::new(
            Arc::clone(&transport),
            spawn_registry(),
            tx,
            token.clone(),
        );
        let task = tokio::spawn(ingress.run());

        let mut replies = Vec::new();
        for _ in 0..100 {
            replies = transport.sent_to(addr(4000));
            if !replies.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(replies, vec![vec![1, 0, 0, 0, 0, 0, 0, 0, 0]]);

        token.cancel();
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_chat_from_registered_sender_is_attributed() {
        let mut h = harness();
        h.ingress
            .handle_datagram(&register_frame("alice", 1), addr(4000))
            .await
            .unwrap();

        let result = h.ingress.handle_datagram(&chat_frame(0, "hi"), addr(4000)).await;
        assert_eq!(result.unwrap(), Dispatch::Submitted);

        let queued = h.queue.try_recv().unwrap();
        assert_eq!(queued.sender_id, ClientId::new(0));
        assert_eq!(queued.sender_name.to_string(), "alice");
        assert_eq!(queued.text, b"hi");
    }

    #[tokio::test]
    async fn test_unknown_sender_dropped_without_reply() {
        let mut h = harness();

        let result = h.ingress.handle_datagram(&chat_frame(7, "hi"), addr(4000)).await;
        assert_eq!(
            result.unwrap(),
            Dispatch::Dropped(DropReason::UnknownSender(ClientId::new(7)))
        );
        assert!(h.queue.try_recv().is_err());
        assert!(h.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_dropped() {
        let mut h = harness();
        h.ingress
            .handle_datagram(&register_frame("alice", 1), addr(4000))
            .await
            .unwrap();

        let result = h.ingress.handle_datagram(&chat_frame(0, ""), addr(4000)).await;
        assert_eq!(result.unwrap(), Dispatch::Dropped(DropReason::EmptyText));
        assert!(h.queue.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_and_unexpected_frames_dropped() {
        let h = harness();

        let empty = h.ingress.handle_datagram(&[], addr(4000)).await.unwrap();
        assert_eq!(empty, Dispatch::Dropped(DropReason::Malformed(FrameError::Empty)));

        let unknown = h.ingress.handle_datagram(&[7, 1, 2], addr(4000)).await.unwrap();
        assert_eq!(
            unknown,
            Dispatch::Dropped(DropReason::Malformed(FrameError::UnknownKind(7)))
        );

        let short = h.ingress.handle_datagram(&[0, b'a'], addr(4000)).await.unwrap();
        assert!(matches!(
            short,
            Dispatch::Dropped(DropReason::Malformed(FrameError::Truncated { .. }))
        ));

        let response = Frame::from(RegisterResponse {
            client_id: ClientId::new(0),
        })
        .encode();
        let unexpected = h.ingress.handle_datagram(&response, addr(4000)).await.unwrap();
        assert_eq!(
            unexpected,
            Dispatch::Dropped(DropReason::UnexpectedKind(FrameKind::RegisterResponse))
        );

        assert!(h.transport.sent().is_empty());
        assert_eq!(h.registry.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_closed_queue_stops_ingress() {
        let h = harness();
        h.ingress
            .handle_datagram(&register_frame("alice", 1), addr(4000))
            .await
            .unwrap();
        drop(h.queue);

        let result = h.ingress.handle_datagram(&chat_frame(0, "hi"), addr(4000)).await;
        assert!(matches!(result, Err(IngressError::QueueClosed)));
    }

    #[tokio::test]
    async fn test_run_returns_on_cancel() {
        let h = harness();
        let token = h.ingress.cancel_token.clone();
        let task = tokio::spawn(h.ingress.run());

        token.cancel();
        assert!(task.await.unwrap().is_ok());
    }

    #[test]
    fn test_drop_reason_display() {
        assert_eq!(DropReason::EmptyText.to_string(), "empty message text");
        assert_eq!(
            DropReason::UnknownSender(ClientId::new(3)).to_string(),
            "unknown sender 3"
        );
        assert_eq!(
            DropReason::Malformed(FrameError::UnknownKind(9)).to_string(),
            "malformed frame: unknown frame kind: 9"
        );
    }
}
