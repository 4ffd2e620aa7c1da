//! High-level client for the Android Debug Bridge server.
//!
//! This crate layers device management on top of the wire protocol in
//! [`adb_protocol`]: it finds and starts the local ADB server, lists and
//! tracks attached devices, and runs per-device operations such as shell
//! commands and screen capture.
//!
//! # Architecture
//!
//! - [`AndroidDebugBridge`] is the entry point: host-level queries and
//!   device discovery.
//! - [`Device`] runs transport-scoped operations; every call opens and
//!   disposes its own connection.
//! - [`DeviceMonitor`] follows `host:track-devices` on a background task
//!   and reports snapshots through callbacks.
//! - [`Connection`] is the underlying per-session state machine, exposed
//!   for callers that need raw command exchange.
//!
//! # Example
//!
//! ```no_run
//! use adb_client::AndroidDebugBridge;
//!
//! # async fn example() -> Result<(), adb_client::AdbClientError> {
//! let adb = AndroidDebugBridge::with_defaults();
//! let device = adb.default_device().await?;
//! let sdk = device.get_property(Some("ro.build.version.sdk")).await?;
//! println!("sdk: {:?}", sdk);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod bridge;
pub mod config;
pub mod connection;
pub mod device;
pub mod devices;
pub mod errors;
pub mod monitor;
pub mod properties;
pub mod server;

pub use bridge::AndroidDebugBridge;
pub use config::{AdbConfig, AdbConfigBuilder, DEFAULT_SERVER_PORT};
pub use connection::{Connection, ConnectionState, DisposeHandle};
pub use device::Device;
pub use devices::{parse_device_list, DeviceInfo};
pub use errors::AdbClientError;
pub use monitor::{DeviceMonitor, DevicesChangedCallback, MonitorState, StoppedCallback};
pub use properties::{parse_properties, parse_property_names, DeviceProperty};
pub use server::{AdbServerLauncher, ServerLauncher};

// The framebuffer types cross the crate boundary, so re-export them for
// callers that only depend on adb-client.
pub use adb_protocol::{Framebuffer, FramebufferHeader};
