//! UDP transport
//!
//! One tokio socket is shared by the receive loop and every sender. tokio's
//! `UdpSocket` takes `&self` for both `send_to` and `recv_from`, so sends
//! never interfere with a pending receive.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// Destination for encoded datagrams
#[async_trait]
pub trait DatagramSink: Send + Sync {
    /// Transmit one datagram
    async fn send(&self, datagram: Bytes) -> Result<()>;
}

/// Bound UDP socket
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
}

impl UdpTransport {
    /// Bind to a local address
    pub async fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;

        info!("UDP bound to {}", socket.local_addr()?);

        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// Get local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Shared handle for the receive loop
    pub fn socket(&self) -> Arc<UdpSocket> {
        self.socket.clone()
    }

    /// Create a sender for a specific remote address
    pub fn sender_to(&self, remote: SocketAddr) -> UdpSender {
        UdpSender {
            socket: self.socket.clone(),
            remote,
        }
    }
}

/// UDP sender (to a specific remote)
pub struct UdpSender {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
}

impl UdpSender {
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }
}

#[async_trait]
impl DatagramSink for UdpSender {
    async fn send(&self, datagram: Bytes) -> Result<()> {
        self.socket
            .send_to(&datagram, self.remote)
            .await
            .map_err(|e| {
                ClientError::SendFailed(format!(
                    "{} bytes to {}: {}",
                    datagram.len(),
                    self.remote,
                    e
                ))
            })?;
        debug!(
            "sent {} bytes ({}) to {}",
            datagram.len(),
            String::from_utf8_lossy(&datagram[..datagram.len().min(4)]),
            self.remote
        );
        Ok(())
    }
}
