//! Error types for the ADB client.

use adb_protocol::ProtocolError;
use std::io;
use thiserror::Error;

/// Errors that can occur while talking to the ADB server.
#[derive(Debug, Error)]
pub enum AdbClientError {
    /// Socket-level failure (connect, read, write).
    #[error("connection failed: {0}")]
    ConnectionFailed(#[source] io::Error),

    /// The server was not running and could not be started, or refused the
    /// connection again after a successful start.
    #[error("adb server unavailable: {0}")]
    ServerUnavailable(String),

    /// The configured adb executable does not exist.
    #[error("adb executable not found: {0}")]
    AdbNotFound(String),

    /// Wire protocol violation (framing, status token, framebuffer decode).
    #[error("protocol error: {0}")]
    Protocol(#[source] ProtocolError),

    /// The server answered FAIL to a host command.
    #[error("adb server rejected command {0:?}")]
    CommandRejected(String),

    /// The `host:transport:<id>` handshake was refused.
    #[error("transport connect failed for device {0:?}")]
    TransportConnectFailed(String),

    /// Operation attempted on a disposed connection.
    #[error("connection has been disposed")]
    Disposed,

    /// A connection was asked to connect twice.
    #[error("connection is already established")]
    AlreadyConnected,

    /// The operation was cancelled mid-I/O.
    #[error("operation cancelled")]
    Cancelled,

    /// The server closed the track-devices stream.
    #[error("adb server stopped tracking events")]
    MonitorTerminated,

    /// The server refused the track-devices subscription.
    #[error("failed to start device tracking")]
    TrackingStartFailed,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// No devices attached when at least one was expected.
    #[error("no devices attached")]
    NoDevices,

    /// More than one device attached when exactly one was expected.
    #[error("{0} devices attached, expected exactly one")]
    UnexpectedDeviceCount(usize),

    /// The requested device id is not attached.
    #[error("device not found: {0:?}")]
    DeviceNotFound(String),
}

impl From<ProtocolError> for AdbClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            // I/O failures surface as connection errors; everything else is
            // a protocol violation.
            ProtocolError::Transport(e) => Self::ConnectionFailed(e),
            other => Self::Protocol(other),
        }
    }
}

impl AdbClientError {
    /// Returns true if retrying the operation on a fresh connection could
    /// plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::ServerUnavailable(_) | Self::MonitorTerminated
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_map_to_connection_failed() {
        let err: AdbClientError =
            ProtocolError::Transport(io::Error::from(io::ErrorKind::ConnectionReset)).into();
        assert!(matches!(err, AdbClientError::ConnectionFailed(_)));
    }

    #[test]
    fn test_framing_errors_map_to_protocol() {
        let err: AdbClientError = ProtocolError::InvalidResponse("bad token".to_string()).into();
        assert!(matches!(err, AdbClientError::Protocol(_)));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AdbClientError::MonitorTerminated.is_retryable());
        assert!(
            AdbClientError::ConnectionFailed(io::Error::from(io::ErrorKind::ConnectionReset))
                .is_retryable()
        );
        assert!(!AdbClientError::Disposed.is_retryable());
        assert!(!AdbClientError::TransportConnectFailed("x".to_string()).is_retryable());
    }
}
