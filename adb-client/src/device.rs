//! Per-device operations.
//!
//! Every operation opens its own [`Connection`], switches it into transport
//! mode with `host:transport:<id>`, runs exactly one command, and disposes
//! the connection on every exit path. The ADB shell service closes the
//! stream when the command finishes, so the connection is single-use by
//! construction.

use crate::config::AdbConfig;
use crate::connection::Connection;
use crate::devices::DeviceInfo;
use crate::errors::AdbClientError;
use crate::server::ServerLauncher;
use adb_protocol::{commands, Framebuffer};
use std::sync::Arc;
use tracing::debug;

/// An attached device and the operations it supports.
///
/// Obtained from [`AndroidDebugBridge::devices`](crate::AndroidDebugBridge::devices)
/// and friends. Holds no open connection; each call opens and closes its
/// own.
///
/// # Examples
///
/// ```no_run
/// use adb_client::AndroidDebugBridge;
///
/// # async fn example() -> Result<(), adb_client::AdbClientError> {
/// let adb = AndroidDebugBridge::with_defaults();
/// let device = adb.default_device().await?;
/// device.send_tap(540, 960).await?;
/// # Ok(())
/// # }
/// ```
pub struct Device {
    config: AdbConfig,
    launcher: Arc<dyn ServerLauncher>,
    info: DeviceInfo,
}

impl Device {
    pub(crate) fn new(
        config: AdbConfig,
        launcher: Arc<dyn ServerLauncher>,
        info: DeviceInfo,
    ) -> Self {
        Self {
            config,
            launcher,
            info,
        }
    }

    /// Device serial / identifier.
    pub fn device_id(&self) -> &str {
        &self.info.device_id
    }

    /// Connection state as reported by the server (`"device"`, `"offline"`,
    /// `"unauthorized"`, ...).
    pub fn state(&self) -> &str {
        &self.info.state
    }

    /// The underlying device record.
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Wake and unlock the screen (key event 82).
    pub async fn unlock(&self) -> Result<(), AdbClientError> {
        self.shell_exchange(commands::device::UNLOCK).await?;
        Ok(())
    }

    /// Tap the screen at the given coordinates.
    pub async fn send_tap(&self, x: u32, y: u32) -> Result<(), AdbClientError> {
        self.shell_exchange(&commands::device::input_tap(x, y))
            .await?;
        Ok(())
    }

    /// Read a device property, or the full `[name]: [value]` dump when no
    /// name is given.
    ///
    /// The response text is returned as-is; use
    /// [`parse_properties`](crate::parse_properties) to structure a full
    /// dump.
    pub async fn get_property(&self, name: Option<&str>) -> Result<Option<String>, AdbClientError> {
        self.shell_exchange(&commands::device::getprop(name)).await
    }

    /// Run an arbitrary shell command and return its streamed output.
    pub async fn execute_shell(&self, command: &str) -> Result<Option<String>, AdbClientError> {
        self.shell_exchange(&commands::device::shell(command)).await
    }

    /// Capture the device screen.
    ///
    /// Returns `Ok(None)` when the device reports that no framebuffer is
    /// available (FAIL status); that is not an error.
    pub async fn framebuffer(&self) -> Result<Option<Framebuffer>, AdbClientError> {
        let mut conn = self.connect_transport().await?;
        let result = async {
            if conn.execute_command(commands::device::FRAMEBUFFER).await? {
                conn.read_framebuffer().await.map(Some)
            } else {
                debug!(device_id = %self.info.device_id, "no framebuffer available");
                Ok(None)
            }
        }
        .await;
        conn.dispose();
        result
    }

    /// Open a connection and bind it to this device's transport.
    async fn connect_transport(&self) -> Result<Connection, AdbClientError> {
        let mut conn = Connection::new(self.config.clone(), self.launcher.clone());
        conn.connect().await?;

        let accepted = match conn
            .execute_command(&commands::transport(&self.info.device_id))
            .await
        {
            Ok(accepted) => accepted,
            Err(e) => {
                conn.dispose();
                return Err(e);
            }
        };
        if !accepted {
            conn.dispose();
            return Err(AdbClientError::TransportConnectFailed(
                self.info.device_id.clone(),
            ));
        }
        Ok(conn)
    }

    /// One transport-mode command: send it, drain the response, dispose.
    async fn shell_exchange(&self, command: &str) -> Result<Option<String>, AdbClientError> {
        let mut conn = self.connect_transport().await?;
        let result = async {
            conn.execute_command(command).await?;
            conn.read_response_streaming().await
        }
        .await;
        conn.dispose();
        result
    }
}
