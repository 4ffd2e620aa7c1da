//! TCP socket wrapper for ADB server connections.
//!
//! The ADB host server listens on TCP only (default `127.0.0.1:5037`), so
//! this is a thin wrapper around [`TcpStream`] that records the peer address
//! for logging and disables Nagle's algorithm. Command/response exchanges are
//! small and latency-bound, so `TCP_NODELAY` matters more than batching.

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

/// TCP connection to the ADB host server.
///
/// # Examples
///
/// ```no_run
/// use adb_protocol::TcpSocket;
///
/// # async fn example() -> std::io::Result<()> {
/// let socket = TcpSocket::connect("127.0.0.1", 5037).await?;
/// println!("connected to {}", socket.peer_endpoint());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TcpSocket {
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl TcpSocket {
    /// Connect to the ADB server.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; callers inspect
    /// [`std::io::ErrorKind::ConnectionRefused`] to decide whether the server
    /// needs to be started.
    pub async fn connect(host: &str, port: u16) -> std::io::Result<Self> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr).await?;
        let peer_addr = stream.peer_addr()?;

        // Command exchanges are a handful of bytes each way; don't batch them.
        stream.set_nodelay(true)?;

        Ok(Self { stream, peer_addr })
    }

    /// Peer endpoint as `address:port`.
    pub fn peer_endpoint(&self) -> String {
        self.peer_addr.to_string()
    }

    /// Consume the wrapper and return the underlying stream.
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

impl AsyncRead for TcpSocket {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for TcpSocket {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_and_peer_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (_socket, _addr) = listener.accept().await.unwrap();
        });

        let socket = TcpSocket::connect("127.0.0.1", addr.port()).await.unwrap();
        assert!(socket.peer_endpoint().starts_with("127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_connection_refused_kind() {
        // Port 1 should not be listening.
        let err = TcpSocket::connect("127.0.0.1", 1).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionRefused);
    }

    #[tokio::test]
    async fn test_nodelay_is_set() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (_socket, _addr) = listener.accept().await.unwrap();
        });

        let socket = TcpSocket::connect("127.0.0.1", addr.port()).await.unwrap();
        assert!(socket.into_inner().nodelay().unwrap());
    }
}
