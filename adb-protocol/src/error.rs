//! Error types for the protocol layer.

use std::io;
use thiserror::Error;

/// Errors raised by the wire codec and stream readers.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Transport-level I/O failure (socket read/write).
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// A command string that cannot be framed (empty, or longer than the
    /// 4-hex-digit length prefix can express).
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The server violated the protocol framing: bad status token, short
    /// length prefix, truncated body, or non-UTF-8 text.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The framebuffer header declared a version this client does not speak.
    #[error("unsupported framebuffer version {0}")]
    UnsupportedFramebufferVersion(u32),

    /// The framebuffer stream ended before the declared pixel count.
    #[error("incomplete framebuffer: expected {expected} bytes, got {actual}")]
    IncompleteFramebuffer {
        /// Byte count declared by the header.
        expected: usize,
        /// Bytes actually read before the stream ended.
        actual: usize,
    },
}
