//! ADB command strings and the request codec.
//!
//! Every request to the ADB server is the UTF-8 text of the command prefixed
//! with its byte length as exactly four uppercase hexadecimal ASCII digits:
//! `"host:version"` (12 bytes) goes on the wire as `"000Chost:version"`.
//!
//! # Examples
//!
//! ```
//! use adb_protocol::commands;
//!
//! let frame = commands::encode_command(commands::host::VERSION).unwrap();
//! assert_eq!(&frame[..4], b"000C");
//! assert_eq!(&frame[4..], b"host:version");
//! ```

use crate::error::ProtocolError;

/// Commands addressed to the host server itself.
pub mod host {
    /// Ask the server for its internal version number.
    pub const VERSION: &str = "host:version";

    /// Ask the server for the current device list.
    pub const DEVICES: &str = "host:devices";

    /// Subscribe to device-list snapshots for the lifetime of the connection.
    pub const TRACK_DEVICES: &str = "host:track-devices";

    /// Prefix for switching the connection to a device transport.
    pub const TRANSPORT_PREFIX: &str = "host:transport:";
}

/// Commands routed to a device once the connection is in transport mode.
pub mod device {
    /// Request a raw framebuffer capture.
    pub const FRAMEBUFFER: &str = "framebuffer:";

    /// Key event 82 (menu) wakes and unlocks the screen.
    pub const UNLOCK: &str = "shell:input keyevent 82";

    /// Build a tap input command for the given screen coordinates.
    pub fn input_tap(x: u32, y: u32) -> String {
        format!("shell:input tap {} {}", x, y)
    }

    /// Build a `getprop` command. With no name, the device dumps every
    /// property in `[name]: [value]` form.
    pub fn getprop(name: Option<&str>) -> String {
        match name {
            Some(name) => format!("shell:getprop {}", name),
            None => "shell:getprop".to_string(),
        }
    }

    /// Build a raw shell passthrough command.
    pub fn shell(command: &str) -> String {
        format!("shell:{}", command)
    }
}

/// Build the transport command that binds a connection to one device.
pub fn transport(device_id: &str) -> String {
    format!("{}{}", host::TRANSPORT_PREFIX, device_id)
}

/// Frame a command for the wire: 4 uppercase hex digits of the byte length,
/// then the command text, all UTF-8 without a BOM.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidCommand`] if the command is empty or its
/// length does not fit in four hex digits.
pub fn encode_command(command: &str) -> Result<Vec<u8>, ProtocolError> {
    if command.is_empty() {
        return Err(ProtocolError::InvalidCommand(
            "command cannot be empty".to_string(),
        ));
    }

    let len = command.len();
    if len > 0xFFFF {
        return Err(ProtocolError::InvalidCommand(format!(
            "command is {} bytes, limit is 65535",
            len
        )));
    }

    let mut frame = Vec::with_capacity(4 + len);
    frame.extend_from_slice(format!("{:04X}", len).as_bytes());
    frame.extend_from_slice(command.as_bytes());
    Ok(frame)
}

/// Decode a response byte range as UTF-8 text.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidResponse`] if the bytes are not valid
/// UTF-8.
pub fn decode_text(data: &[u8]) -> Result<&str, ProtocolError> {
    std::str::from_utf8(data)
        .map_err(|e| ProtocolError::InvalidResponse(format!("response is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            encode_command(""),
            Err(ProtocolError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_oversized_command_rejected() {
        let command = "x".repeat(0x10000);
        assert!(matches!(
            encode_command(&command),
            Err(ProtocolError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_encode_known_vector() {
        // 26 characters -> "001A" prefix, 30 bytes total.
        let cmd = "qwertyuiopasdfghjklzxcvbnm";
        let frame = encode_command(cmd).unwrap();

        assert_eq!(frame.len(), 30);
        assert_eq!(&frame[..4], b"001A");
        assert_eq!(&frame[4..], cmd.as_bytes());
    }

    #[test]
    fn test_encode_host_version() {
        let frame = encode_command(host::VERSION).unwrap();
        assert_eq!(&frame[..4], b"000C");
        assert_eq!(decode_text(&frame[4..]).unwrap(), "host:version");
    }

    #[test]
    fn test_prefix_is_uppercase_hex() {
        let cmd = "x".repeat(0xAB);
        let frame = encode_command(&cmd).unwrap();
        assert_eq!(&frame[..4], b"00AB");
    }

    #[test]
    fn test_command_builders() {
        assert_eq!(transport("emulator-5554"), "host:transport:emulator-5554");
        assert_eq!(device::input_tap(120, 450), "shell:input tap 120 450");
        assert_eq!(device::getprop(None), "shell:getprop");
        assert_eq!(
            device::getprop(Some("ro.build.version.sdk")),
            "shell:getprop ro.build.version.sdk"
        );
        assert_eq!(device::shell("ls /sdcard"), "shell:ls /sdcard");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(matches!(
            decode_text(&[0xFF, 0xFE]),
            Err(ProtocolError::InvalidResponse(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_round_trip(cmd in "[ -~]{1,512}") {
            let frame = encode_command(&cmd).unwrap();
            let len = usize::from_str_radix(
                std::str::from_utf8(&frame[..4]).unwrap(),
                16,
            )
            .unwrap();
            prop_assert_eq!(len, cmd.len());
            prop_assert_eq!(decode_text(&frame[4..]).unwrap(), cmd.as_str());
        }
    }
}
