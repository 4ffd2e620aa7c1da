//! Device list parsing.
//!
//! `host:devices` and each `host:track-devices` snapshot carry the same text
//! shape: one device per line, the serial and its state separated by a tab,
//! e.g. `emulator-5554\tdevice`.

use tracing::warn;

/// One attached device as reported by the server.
///
/// `state` is the server's own wording: `"device"`, `"offline"`,
/// `"unauthorized"` and friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device serial / identifier.
    pub device_id: String,
    /// Connection state as reported by the server.
    pub state: String,
}

/// Parse a device list into structured records.
///
/// Empty lines are ignored. A line that does not yield exactly two
/// tab-separated fields is logged and skipped; it never fails the whole
/// parse. Output order matches input order.
///
/// # Examples
///
/// ```
/// use adb_client::parse_device_list;
///
/// let devices = parse_device_list("emulator-5554\tdevice\n");
/// assert_eq!(devices.len(), 1);
/// assert_eq!(devices[0].device_id, "emulator-5554");
/// assert_eq!(devices[0].state, "device");
/// ```
pub fn parse_device_list(text: &str) -> Vec<DeviceInfo> {
    let mut devices = Vec::new();
    for line in text.split('\n').filter(|line| !line.is_empty()) {
        let fields: Vec<&str> = line.split('\t').filter(|field| !field.is_empty()).collect();
        if let [device_id, state] = fields[..] {
            devices.push(DeviceInfo {
                device_id: device_id.to_string(),
                state: state.to_string(),
            });
        } else {
            warn!(line, "skipping malformed device list line");
        }
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_device() {
        let devices = parse_device_list("ro.xapd\tdevice\n");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device_id, "ro.xapd");
        assert_eq!(devices[0].state, "device");
    }

    #[test]
    fn test_multiple_devices_keep_order() {
        let devices = parse_device_list("a\tdevice\nb\toffline\nc\tunauthorized\n");
        let ids: Vec<&str> = devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(devices[1].state, "offline");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        // Zero fields, one field, and three fields are all dropped.
        let devices = parse_device_list("\nonly-serial\nx\ty\tz\ngood\tdevice\n");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device_id, "good");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_device_list("").is_empty());
    }

    #[test]
    fn test_no_trailing_newline() {
        let devices = parse_device_list("serial\tdevice");
        assert_eq!(devices.len(), 1);
    }
}
