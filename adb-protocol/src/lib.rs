//! ADB host protocol implementation.
//!
//! This crate provides the wire-level layer for talking to a local ADB
//! (Android Debug Bridge) server over TCP. It handles the length-prefixed
//! ASCII command framing, status tokens, buffered stream I/O, and the binary
//! framebuffer format.
//!
//! # Modules
//!
//! - [`commands`] - Command strings and the request codec
//! - [`io`] - Buffered I/O streams (`AdbInStream`, `AdbOutStream`)
//! - [`socket`] - TCP socket wrapper for the host server connection
//! - [`framebuffer`] - Binary framebuffer header and payload decoding
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
//! output.write_command(commands::host::VERSION)?;
//! output.flush().await?;
//!
//! let mut input = AdbInStream::new(reader);
//! if input.read_okay_fail().await? {
//!     let version = input.read_length_prefixed().await?;
//!     println!("server version: {:?}", version);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod commands;
pub mod error;
pub mod framebuffer;
pub mod io;
pub mod socket;

// Re-export commonly used types
pub use commands::{decode_text, encode_command};
pub use error::ProtocolError;
pub use framebuffer::{Framebuffer, FramebufferHeader};
pub use io::{AdbInStream, AdbOutStream};
pub use socket::TcpSocket;
