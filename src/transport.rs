//! UDP transport: bind, blocking receive, fire-and-forget send.
//!
//! Kept deliberately thin: a wrapper around `std::net::UdpSocket` that
//! pins down the datagram ceiling and the error taxonomy, so the
//! listener doesn't have to know about socket options.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Maximum SNMP datagram size this agent will read. Larger datagrams are
/// truncated by the OS and then rejected by the PDU decoder.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind UDP socket: {0}")]
    BindFailed(#[source] std::io::Error),
    #[error("failed to receive datagram: {0}")]
    ReceiveFailed(#[source] std::io::Error),
    #[error("failed to send datagram: {0}")]
    SendFailed(#[source] std::io::Error),
    #[error("transport closed")]
    Closed,
}

/// A bound UDP socket plus the shutdown bookkeeping `receive` needs.
///
/// Unlike TCP, a UDP socket has no `shutdown()` that interrupts a
/// blocking `recv_from`. Instead `shutdown()` here flips a flag and sends
/// a zero-length datagram to the socket's own address to unblock the
/// pending read; `receive` notices the flag and reports `Closed` instead
/// of handing the wakeup datagram to the caller.
pub struct UdpTransport {
    socket: UdpSocket,
    closed: AtomicBool,
}

impl UdpTransport {
    /// Binds the wildcard address at `addr`. Fails with `BindFailed` if
    /// the port is in use or permissions are insufficient.
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).map_err(TransportError::BindFailed)?;
        Ok(UdpTransport {
            socket,
            closed: AtomicBool::new(false),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Blocks until a datagram arrives or the socket is shut down.
    pub fn receive(
        &self,
        buf: &mut [u8; MAX_DATAGRAM_SIZE],
    ) -> Result<(Vec<u8>, SocketAddr), TransportError> {
        match self.socket.recv_from(buf) {
            Ok((len, addr)) => {
                if self.closed.load(Ordering::SeqCst) {
                    return Err(TransportError::Closed);
                }
                Ok((buf[..len].to_vec(), addr))
            }
            Err(e) => {
                if self.closed.load(Ordering::SeqCst) {
                    Err(TransportError::Closed)
                } else {
                    Err(TransportError::ReceiveFailed(e))
                }
            }
        }
    }

    /// Fire-and-forget send. Failures are returned so the caller can log
    /// them, but this agent never retries: SNMPv1 clients retransmit.
    pub fn send(&self, bytes: &[u8], to: SocketAddr) -> Result<(), TransportError> {
        self.socket
            .send_to(bytes, to)
            .map(|_| ())
            .map_err(TransportError::SendFailed)
    }

    /// Marks the transport closed and nudges a thread parked in
    /// `receive` so it observes the flag instead of blocking forever.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(local) = self.socket.local_addr() {
            let _ = self.socket.send_to(&[], local);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_send_round_trip() {
        let server = UdpTransport::bind("127.0.0.1:0").unwrap();
        let client = UdpTransport::bind("127.0.0.1:0").unwrap();
        let server_addr = server.local_addr().unwrap();

        client.send(b"hello", server_addr).unwrap();

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let (data, _from) = server.receive(&mut buf).unwrap();
        assert_eq!(data, b"hello");
    }

    #[test]
    fn bind_failure_on_port_in_use() {
        let first = UdpTransport::bind("127.0.0.1:0").unwrap();
        let addr = first.local_addr().unwrap();
        let result = UdpTransport::bind(addr);
        assert!(result.is_err());
    }

    #[test]
    fn shutdown_unblocks_receive_with_closed() {
        use std::sync::Arc;
        use std::thread;

        let server = Arc::new(UdpTransport::bind("127.0.0.1:0").unwrap());
        let reader = server.clone();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; MAX_DATAGRAM_SIZE];
            reader.receive(&mut buf)
        });

        thread::sleep(std::time::Duration::from_millis(50));
        server.shutdown();

        let result = handle.join().unwrap();
        assert!(matches!(result, Err(TransportError::Closed)));
    }
}
