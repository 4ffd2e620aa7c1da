//! Binary framebuffer decoding.
//!
//! After an accepted `framebuffer:` command the device sends a fixed-layout
//! binary header followed by raw pixel memory. The header is thirteen
//! little-endian 32-bit integers: a version word, then (for version 1) the
//! bits-per-pixel, total payload size, width, height, and bit offset/length
//! pairs for the red, blue, green and alpha channels, in that order.
//!
//! Decoding is all-or-nothing: a [`Framebuffer`] is only constructed once
//! the header and every declared payload byte have been read. Interpreting
//! the pixel packing is left to consumers; this module does not convert
//! pixels to a displayable format.

use crate::error::ProtocolError;
use crate::io::AdbInStream;
use tokio::io::AsyncRead;
use tracing::debug;

/// The only framebuffer header version this client understands.
pub const SUPPORTED_VERSION: u32 = 1;

/// Fixed-layout framebuffer header, 13 x 4 bytes on the wire.
///
/// Field order matches the wire order exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferHeader {
    /// Header version; always 1 for decoded headers.
    pub version: u32,
    /// Bits per pixel.
    pub bpp: u32,
    /// Total pixel payload size in bytes.
    pub size: u32,
    /// Screen width in pixels.
    pub width: u32,
    /// Screen height in pixels.
    pub height: u32,
    /// Bit offset of the red channel within a pixel.
    pub red_offset: u32,
    /// Bit length of the red channel.
    pub red_length: u32,
    /// Bit offset of the blue channel.
    pub blue_offset: u32,
    /// Bit length of the blue channel.
    pub blue_length: u32,
    /// Bit offset of the green channel.
    pub green_offset: u32,
    /// Bit length of the green channel.
    pub green_length: u32,
    /// Bit offset of the alpha channel.
    pub alpha_offset: u32,
    /// Bit length of the alpha channel.
    pub alpha_length: u32,
}

/// A decoded screen capture: header plus exactly `header.size` pixel bytes.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    header: FramebufferHeader,
    data: Vec<u8>,
}

impl Framebuffer {
    /// Decode a framebuffer from the given stream.
    ///
    /// Reads the version word, rejects anything but version 1, reads the
    /// remaining twelve header fields, then reads exactly `size` payload
    /// bytes, looping over short reads.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::UnsupportedFramebufferVersion`] for a version
    ///   other than 1.
    /// - [`ProtocolError::IncompleteFramebuffer`] if the stream ends before
    ///   the declared payload size.
    /// - [`ProtocolError::Transport`] for I/O failures, including a stream
    ///   that ends inside the header.
    pub async fn decode<R: AsyncRead + Unpin>(
        stream: &mut AdbInStream<R>,
    ) -> Result<Self, ProtocolError> {
        let version = stream.read_u32_le().await?;
        if version != SUPPORTED_VERSION {
            return Err(ProtocolError::UnsupportedFramebufferVersion(version));
        }

        let header = FramebufferHeader {
            version,
            bpp: stream.read_u32_le().await?,
            size: stream.read_u32_le().await?,
            width: stream.read_u32_le().await?,
            height: stream.read_u32_le().await?,
            red_offset: stream.read_u32_le().await?,
            red_length: stream.read_u32_le().await?,
            blue_offset: stream.read_u32_le().await?,
            blue_length: stream.read_u32_le().await?,
            green_offset: stream.read_u32_le().await?,
            green_length: stream.read_u32_le().await?,
            alpha_offset: stream.read_u32_le().await?,
            alpha_length: stream.read_u32_le().await?,
        };
        debug!(
            width = header.width,
            height = header.height,
            bpp = header.bpp,
            size = header.size,
            "framebuffer header decoded"
        );

        let expected = header.size as usize;
        let mut data = vec![0u8; expected];
        let actual = stream.read_up_to(&mut data).await?;
        if actual < expected {
            return Err(ProtocolError::IncompleteFramebuffer { expected, actual });
        }

        Ok(Self { header, data })
    }

    /// The decoded header.
    pub fn header(&self) -> &FramebufferHeader {
        &self.header
    }

    /// The raw pixel payload, exactly `header().size` bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
