//! Connection state machine for one session with the ADB server.
//!
//! A [`Connection`] owns exactly one TCP socket and sequences the
//! command/response exchange: write a framed command, read the 4-byte status
//! token, then read whichever response shape the command calls for. The
//! protocol is strictly request/response on a single connection, so callers
//! needing concurrency open one connection per operation, which is what
//! [`AndroidDebugBridge`](crate::AndroidDebugBridge) and
//! [`Device`](crate::Device) do.
//!
//! # Server recovery
//!
//! If the very first connect attempt is refused, the server is assumed to be
//! down: the configured [`ServerLauncher`] runs `adb start-server` and the
//! connect is retried exactly once with recovery disabled. A refusal on the
//! retry, or a failed launch, is [`AdbClientError::ServerUnavailable`].
//!
//! # Disposal and cancellation
//!
//! [`dispose`](Connection::dispose) is idempotent and closes the socket. A
//! [`DisposeHandle`] taken beforehand can abort in-flight I/O from another
//! task; the interrupted call fails with [`AdbClientError::Cancelled`].

use crate::config::AdbConfig;
use crate::errors::AdbClientError;
use crate::server::ServerLauncher;
use adb_protocol::{AdbInStream, AdbOutStream, Framebuffer, ProtocolError, TcpSocket};
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::io::{ReadHalf, WriteHalf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created but not yet connected.
    Unconnected,
    /// Connect (possibly including server start) in progress.
    Connecting,
    /// Socket established; commands may be issued.
    Connected,
    /// Disposed; every further operation fails.
    Disposed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconnected => write!(f, "Unconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disposed => write!(f, "Disposed"),
        }
    }
}

/// Cross-task handle that disposes a connection's in-flight I/O.
///
/// Cancelling does not close the socket by itself; it makes the owning
/// task's current call return [`AdbClientError::Cancelled`], after which the
/// owner disposes the connection (the per-operation wrappers in this crate
/// do so on every exit path).
#[derive(Clone)]
pub struct DisposeHandle {
    cancel: CancellationToken,
}

impl DisposeHandle {
    /// Abort the connection's in-flight and future I/O.
    pub fn dispose(&self) {
        self.cancel.cancel();
    }
}

type Instream = AdbInStream<ReadHalf<TcpSocket>>;
type Outstream = AdbOutStream<WriteHalf<TcpSocket>>;

/// One session with the ADB server.
///
/// Not reusable after [`dispose`](Self::dispose); create a fresh connection
/// for every logical operation.
pub struct Connection {
    config: AdbConfig,
    launcher: Arc<dyn ServerLauncher>,
    instream: Option<Instream>,
    outstream: Option<Outstream>,
    state: ConnectionState,
    cancel: CancellationToken,
    peer: String,
}

impl Connection {
    /// Create an unconnected session.
    pub fn new(config: AdbConfig, launcher: Arc<dyn ServerLauncher>) -> Self {
        Self {
            config,
            launcher,
            instream: None,
            outstream: None,
            state: ConnectionState::Unconnected,
            cancel: CancellationToken::new(),
            peer: String::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Handle for disposing this connection from another task.
    pub fn dispose_handle(&self) -> DisposeHandle {
        DisposeHandle {
            cancel: self.cancel.clone(),
        }
    }

    /// Open the TCP socket, starting the server and retrying once if the
    /// first attempt is refused.
    ///
    /// # Errors
    ///
    /// - [`AdbClientError::ServerUnavailable`] if the server could not be
    ///   started or still refuses after a successful start.
    /// - [`AdbClientError::ConnectionFailed`] for any other socket error.
    /// - [`AdbClientError::AlreadyConnected`] / [`AdbClientError::Disposed`]
    ///   when called in the wrong state.
    pub async fn connect(&mut self) -> Result<(), AdbClientError> {
        self.check_disposed()?;
        if self.state != ConnectionState::Unconnected {
            return Err(AdbClientError::AlreadyConnected);
        }

        self.state = ConnectionState::Connecting;
        match self.connect_with_recovery().await {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Unconnected;
                Err(e)
            }
        }
    }

    async fn connect_with_recovery(&mut self) -> Result<(), AdbClientError> {
        // One recovery attempt only: refused -> start server -> retry.
        let mut allow_start_server = true;
        loop {
            let cancel = self.cancel.clone();
            let attempt = TcpSocket::connect(&self.config.host, self.config.port);
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(AdbClientError::Cancelled),
                r = attempt => r,
            };

            match result {
                Ok(socket) => {
                    self.peer = socket.peer_endpoint();
                    let (reader, writer) = tokio::io::split(socket);
                    self.instream = Some(AdbInStream::new(reader));
                    self.outstream = Some(AdbOutStream::new(writer));
                    debug!(peer = %self.peer, "connected to adb server");
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                    if !allow_start_server {
                        return Err(AdbClientError::ServerUnavailable(
                            "server refused the connection after start-server".to_string(),
                        ));
                    }
                    allow_start_server = false;
                    info!("adb server not running, starting it");
                    self.launcher.start_server().await?;
                }
                Err(e) => return Err(AdbClientError::ConnectionFailed(e)),
            }
        }
    }

    /// Send a command and read its status token.
    ///
    /// Returns `true` for `OKAY` and `false` for `FAIL`.
    ///
    /// # Errors
    ///
    /// Any token other than those two, including a short read, is a
    /// protocol error.
    pub async fn execute_command(&mut self, command: &str) -> Result<bool, AdbClientError> {
        debug!(command, "executing command");
        let cancel = self.cancel.clone();
        let (instream, outstream) = self.streams()?;

        let exchange = async {
            outstream.write_command(command)?;
            outstream.flush().await.map_err(ProtocolError::from)?;
            instream.read_okay_fail().await
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(AdbClientError::Cancelled),
            r = exchange => r.map_err(AdbClientError::from),
        }
    }

    /// Read one length-prefixed text response.
    ///
    /// Returns `None` when the server closes the stream cleanly before the
    /// next response, which for `host:track-devices` signals that the server
    /// stopped tracking.
    pub async fn read_response_with_length(&mut self) -> Result<Option<String>, AdbClientError> {
        let cancel = self.cancel.clone();
        let (instream, _) = self.streams()?;

        tokio::select! {
            _ = cancel.cancelled() => Err(AdbClientError::Cancelled),
            r = instream.read_length_prefixed() => r.map_err(AdbClientError::from),
        }
    }

    /// Read an unframed response until the server closes the stream.
    ///
    /// Returns `None` on an immediate zero-byte read.
    pub async fn read_response_streaming(&mut self) -> Result<Option<String>, AdbClientError> {
        let cancel = self.cancel.clone();
        let (instream, _) = self.streams()?;

        tokio::select! {
            _ = cancel.cancelled() => Err(AdbClientError::Cancelled),
            r = instream.read_to_eof() => r.map_err(AdbClientError::from),
        }
    }

    /// Decode the binary framebuffer that follows an accepted
    /// `framebuffer:` command.
    pub async fn read_framebuffer(&mut self) -> Result<Framebuffer, AdbClientError> {
        let cancel = self.cancel.clone();
        let (instream, _) = self.streams()?;

        tokio::select! {
            _ = cancel.cancelled() => Err(AdbClientError::Cancelled),
            r = Framebuffer::decode(instream) => r.map_err(AdbClientError::from),
        }
    }

    /// Dispose the connection: cancel in-flight I/O and close the socket.
    ///
    /// Idempotent. Every later operation fails with
    /// [`AdbClientError::Disposed`].
    pub fn dispose(&mut self) {
        if self.state == ConnectionState::Disposed {
            return;
        }
        self.state = ConnectionState::Disposed;
        self.cancel.cancel();
        // Dropping the halves closes the socket.
        self.instream = None;
        self.outstream = None;
        debug!(peer = %self.peer, "connection disposed");
    }

    fn check_disposed(&self) -> Result<(), AdbClientError> {
        if self.state == ConnectionState::Disposed {
            return Err(AdbClientError::Disposed);
        }
        Ok(())
    }

    fn streams(&mut self) -> Result<(&mut Instream, &mut Outstream), AdbClientError> {
        if self.state == ConnectionState::Disposed {
            return Err(AdbClientError::Disposed);
        }
        match (self.instream.as_mut(), self.outstream.as_mut()) {
            (Some(instream), Some(outstream)) => Ok((instream, outstream)),
            _ => Err(AdbClientError::ConnectionFailed(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection is not established",
            ))),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Launcher for tests against an already-listening fake server.
    struct NoLauncher;

    impl ServerLauncher for NoLauncher {
        fn start_server(&self) -> futures::future::BoxFuture<'_, Result<(), AdbClientError>> {
            Box::pin(async {
                Err(AdbClientError::ServerUnavailable(
                    "no launcher in this test".to_string(),
                ))
            })
        }
    }

    /// Launcher that "starts the server" by binding a listener on the
    /// expected port, mimicking a successful `adb start-server`.
    struct BindingLauncher {
        port: u16,
        invocations: AtomicUsize,
    }

    impl ServerLauncher for BindingLauncher {
        fn start_server(&self) -> futures::future::BoxFuture<'_, Result<(), AdbClientError>> {
            Box::pin(async {
                self.invocations.fetch_add(1, Ordering::SeqCst);
                let listener = TcpListener::bind(("127.0.0.1", self.port))
                    .await
                    .map_err(|e| AdbClientError::ServerUnavailable(e.to_string()))?;
                tokio::spawn(async move {
                    while let Ok((_socket, _addr)) = listener.accept().await {
                        // Hold accepted sockets open until the test ends.
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                });
                Ok(())
            })
        }
    }

    /// Spawn a one-connection fake server, returning its port.
    async fn spawn_server<F, Fut>(handler: F) -> u16
    where
        F: FnOnce(TcpStream) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (socket, _addr) = listener.accept().await.unwrap();
            handler(socket).await;
        });
        port
    }

    fn test_config(port: u16) -> AdbConfig {
        AdbConfig::builder().port(port).build().unwrap()
    }

    async fn connected(port: u16) -> Connection {
        let mut conn = Connection::new(test_config(port), Arc::new(NoLauncher));
        conn.connect().await.unwrap();
        conn
    }

    /// Read one framed command from the fake server side.
    async fn read_command(socket: &mut TcpStream) -> String {
        let mut prefix = [0u8; 4];
        socket.read_exact(&mut prefix).await.unwrap();
        let len = usize::from_str_radix(std::str::from_utf8(&prefix).unwrap(), 16).unwrap();
        let mut body = vec![0u8; len];
        socket.read_exact(&mut body).await.unwrap();
        String::from_utf8(body).unwrap()
    }

    #[tokio::test]
    async fn test_connect_and_state() {
        let port = spawn_server(|_socket| async move {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        })
        .await;

        let mut conn = Connection::new(test_config(port), Arc::new(NoLauncher));
        assert_eq!(conn.state(), ConnectionState::Unconnected);
        conn.connect().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Connected);

        assert!(matches!(
            conn.connect().await,
            Err(AdbClientError::AlreadyConnected)
        ));

        conn.dispose();
        assert_eq!(conn.state(), ConnectionState::Disposed);
        conn.dispose(); // idempotent
        assert!(matches!(conn.connect().await, Err(AdbClientError::Disposed)));
    }

    #[tokio::test]
    async fn test_execute_command_okay() {
        let port = spawn_server(|mut socket| async move {
            let command = read_command(&mut socket).await;
            assert_eq!(command, "host:version");
            socket.write_all(b"OKAY").await.unwrap();
        })
        .await;

        let mut conn = connected(port).await;
        assert!(conn.execute_command("host:version").await.unwrap());
    }

    #[tokio::test]
    async fn test_execute_command_fail_returns_false() {
        let port = spawn_server(|mut socket| async move {
            let _ = read_command(&mut socket).await;
            socket.write_all(b"FAIL").await.unwrap();
        })
        .await;

        let mut conn = connected(port).await;
        assert!(!conn.execute_command("host:version").await.unwrap());
    }

    #[tokio::test]
    async fn test_execute_command_garbage_status() {
        let port = spawn_server(|mut socket| async move {
            let _ = read_command(&mut socket).await;
            socket.write_all(b"HUH?").await.unwrap();
        })
        .await;

        let mut conn = connected(port).await;
        assert!(matches!(
            conn.execute_command("host:version").await,
            Err(AdbClientError::Protocol(ProtocolError::InvalidResponse(_)))
        ));
    }

    #[tokio::test]
    async fn test_read_response_with_length() {
        let port = spawn_server(|mut socket| async move {
            socket.write_all(b"0004002E").await.unwrap();
        })
        .await;

        let mut conn = connected(port).await;
        let response = conn.read_response_with_length().await.unwrap();
        assert_eq!(response.as_deref(), Some("002E"));
    }

    #[tokio::test]
    async fn test_read_response_truncated_body() {
        let port = spawn_server(|mut socket| async move {
            socket.write_all(b"0010short").await.unwrap();
            // Close without completing the declared 16 bytes.
        })
        .await;

        let mut conn = connected(port).await;
        assert!(matches!(
            conn.read_response_with_length().await,
            Err(AdbClientError::Protocol(ProtocolError::InvalidResponse(_)))
        ));
    }

    #[tokio::test]
    async fn test_read_response_streaming() {
        let port = spawn_server(|mut socket| async move {
            socket.write_all(b"line one\nline two\n").await.unwrap();
        })
        .await;

        let mut conn = connected(port).await;
        let response = conn.read_response_streaming().await.unwrap();
        assert_eq!(response.as_deref(), Some("line one\nline two\n"));
    }

    #[tokio::test]
    async fn test_read_response_streaming_empty() {
        let port = spawn_server(|socket| async move {
            drop(socket);
        })
        .await;

        let mut conn = connected(port).await;
        assert!(conn.read_response_streaming().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dispose_handle_cancels_in_flight_read() {
        let port = spawn_server(|_socket| async move {
            // Never write anything; hold the connection open. The socket
            // must move into this block or it drops as soon as the closure
            // returns the future, which the peer would see as EOF.
            let _socket = _socket;
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        })
        .await;

        let mut conn = connected(port).await;
        let handle = conn.dispose_handle();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            handle.dispose();
        });

        assert!(matches!(
            conn.read_response_with_length().await,
            Err(AdbClientError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_refused_then_started_then_connected() {
        // Reserve a free port, then release it so nothing is listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let launcher = Arc::new(BindingLauncher {
            port,
            invocations: AtomicUsize::new(0),
        });
        let mut conn = Connection::new(test_config(port), launcher.clone());

        conn.connect().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Connected);
        assert_eq!(launcher.invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_server_failure_is_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut conn = Connection::new(test_config(port), Arc::new(NoLauncher));
        assert!(matches!(
            conn.connect().await,
            Err(AdbClientError::ServerUnavailable(_))
        ));
        assert_eq!(conn.state(), ConnectionState::Unconnected);
    }
}
