//! Datagram transport seam.
//!
//! The relay core only needs two fire-and-forget primitives: send a
//! datagram to an address, and receive one datagram with its source.
//! Production uses a tokio `UdpSocket`; tests plug in recorders.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::UdpSocket;

/// Best-effort datagram channel. No delivery, ordering, or duplication
/// guarantees.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends one datagram to `target`.
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> io::Result<usize>;

    /// Waits for the next datagram, writing it into `buf`.
    ///
    /// Datagrams larger than `buf` are truncated.
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Address this transport is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl Transport for UdpSocket {
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, payload, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}
