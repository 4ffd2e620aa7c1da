//! Buffered I/O streams for ADB protocol communication.
//!
//! [`AdbInStream`] wraps a reader with an internal buffer and exposes the
//! exact read shapes the protocol needs: the 4-byte status token, the
//! 4-hex-digit length-prefixed text response, read-until-EOF for unframed
//! shell output, and little-endian integers for the binary framebuffer
//! header. Every exact read loops over short reads; a stream that ends early
//! is an error, never a silent truncation.
//!
//! [`AdbOutStream`] buffers writes and sends them on [`flush`](AdbOutStream::flush).
//!
//! # Examples
//!
//! ```no_run
//! use adb_protocol::{commands, AdbInStream, AdbOutStream, TcpSocket};
//!
//! # async fn example() -> Result<(), adb_protocol::ProtocolError> {
//! let socket = TcpSocket::connect("127.0.0.1", 5037).await?;
//! let (reader, writer) = tokio::io::split(socket);
//!
//! let mut output = AdbOutStream::new(writer);
//! output.write_command(commands::host::DEVICES)?;
//! output.flush().await?;
//!
//! let mut input = AdbInStream::new(reader);
//! let ok = input.read_okay_fail().await?;
//! # Ok(())
//! # }
//! ```

use crate::commands::{decode_text, encode_command};
use crate::error::ProtocolError;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Status token sent by the server after every command.
const STATUS_OKAY: &[u8; 4] = b"OKAY";
/// Failure status token.
const STATUS_FAIL: &[u8; 4] = b"FAIL";

/// Buffered input stream for reading ADB protocol data.
pub struct AdbInStream<R> {
    reader: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> AdbInStream<R> {
    /// Create a new input stream with the default buffer size (8KB).
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, 8192)
    }

    /// Create a new input stream with the given buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Ensure at least `n` bytes are buffered, reading as needed.
    ///
    /// Returns `UnexpectedEof` if the stream ends before `n` bytes are
    /// available.
    async fn ensure_bytes(&mut self, n: usize) -> std::io::Result<()> {
        while self.buffer.len() < n {
            let bytes_read = self.reader.read_buf(&mut self.buffer).await?;
            if bytes_read == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("expected {} bytes, got {}", n, self.buffer.len()),
                ));
            }
        }
        Ok(())
    }

    /// Read a 32-bit unsigned integer in little-endian byte order.
    ///
    /// The framebuffer header is the only little-endian portion of the
    /// protocol; everything else is ASCII text.
    ///
    /// # Errors
    ///
    /// Returns an error if EOF is reached or an I/O error occurs.
    pub async fn read_u32_le(&mut self) -> std::io::Result<u32> {
        self.ensure_bytes(4).await?;
        Ok(self.buffer.get_u32_le())
    }

    /// Read exactly `buf.len()` bytes into the provided buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if EOF is reached before the buffer is filled.
    pub async fn read_bytes(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.ensure_bytes(buf.len()).await?;
        self.buffer.copy_to_slice(buf);
        Ok(())
    }

    /// Fill as much of `buf` as the stream allows, returning the number of
    /// bytes actually read. Stops early only at EOF.
    pub async fn read_up_to(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.buffer.is_empty() {
                let bytes_read = self.reader.read_buf(&mut self.buffer).await?;
                if bytes_read == 0 {
                    break;
                }
            }
            let take = self.buffer.len().min(buf.len() - filled);
            self.buffer.copy_to_slice(&mut buf[filled..filled + take]);
            filled += take;
        }
        Ok(filled)
    }

    /// Read the 4-byte status token that follows every command.
    ///
    /// Returns `true` for `OKAY` and `false` for `FAIL`.
    ///
    /// # Errors
    ///
    /// Any other token, or a stream that ends before 4 bytes arrive, is
    /// [`ProtocolError::InvalidResponse`].
    pub async fn read_okay_fail(&mut self) -> Result<bool, ProtocolError> {
        let mut token = [0u8; 4];
        let filled = self.read_up_to(&mut token).await?;
        if filled < 4 {
            return Err(ProtocolError::InvalidResponse(format!(
                "status token was {} bytes, expected 4",
                filled
            )));
        }

        match &token {
            STATUS_OKAY => Ok(true),
            STATUS_FAIL => Ok(false),
            other => Err(ProtocolError::InvalidResponse(format!(
                "unknown status token {:?}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Read one length-prefixed text response: 4 ASCII hex digits giving the
    /// body length, then exactly that many bytes.
    ///
    /// Returns `None` when the stream ends cleanly before any prefix byte,
    /// which is how the server terminates a `host:track-devices`
    /// subscription.
    ///
    /// # Errors
    ///
    /// A prefix cut short (1-3 bytes), a non-hex prefix, or a body shorter
    /// than declared is [`ProtocolError::InvalidResponse`].
    pub async fn read_length_prefixed(&mut self) -> Result<Option<String>, ProtocolError> {
        let mut prefix = [0u8; 4];
        let filled = self.read_up_to(&mut prefix).await?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < 4 {
            return Err(ProtocolError::InvalidResponse(format!(
                "length prefix was {} bytes, expected 4",
                filled
            )));
        }

        let prefix_text = decode_text(&prefix)?;
        let length = usize::from_str_radix(prefix_text, 16).map_err(|_| {
            ProtocolError::InvalidResponse(format!("length prefix {:?} is not hex", prefix_text))
        })?;

        let mut body = vec![0u8; length];
        let filled = self.read_up_to(&mut body).await?;
        if filled < length {
            return Err(ProtocolError::InvalidResponse(format!(
                "response truncated: expected {} bytes, got {}",
                length, filled
            )));
        }

        Ok(Some(decode_text(&body)?.to_owned()))
    }

    /// Read until EOF, decoding the accumulated bytes as text.
    ///
    /// Used for responses with no length prefix, such as shell output.
    /// Returns `None` if the stream yields no bytes at all.
    pub async fn read_to_eof(&mut self) -> Result<Option<String>, ProtocolError> {
        let mut collected = Vec::new();
        loop {
            if !self.buffer.is_empty() {
                collected.extend_from_slice(&self.buffer);
                self.buffer.clear();
            }
            let bytes_read = self.reader.read_buf(&mut self.buffer).await?;
            if bytes_read == 0 {
                break;
            }
        }

        if collected.is_empty() {
            return Ok(None);
        }
        Ok(Some(decode_text(&collected)?.to_owned()))
    }

    /// Number of bytes currently buffered.
    pub fn available(&self) -> usize {
        self.buffer.len()
    }

    /// Consume the stream and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Buffered output stream for writing ADB protocol data.
///
/// Writes are buffered; call [`flush`](Self::flush) to send them.
pub struct AdbOutStream<W> {
    writer: W,
    buffer: BytesMut,
}

impl<W: AsyncWrite + Unpin> AdbOutStream<W> {
    /// Create a new output stream.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: BytesMut::with_capacity(256),
        }
    }

    /// Frame a command (see [`encode_command`]) and buffer it for sending.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidCommand`] for an unframeable command.
    pub fn write_command(&mut self, command: &str) -> Result<(), ProtocolError> {
        let frame = encode_command(command)?;
        self.buffer.extend_from_slice(&frame);
        Ok(())
    }

    /// Buffer raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Flush all buffered data to the underlying writer.
    pub async fn flush(&mut self) -> std::io::Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer).await?;
            self.buffer.clear();
        }
        self.writer.flush().await
    }

    /// Consume the stream and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
