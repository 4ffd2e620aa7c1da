//! Entry point for talking to an ADB server.
//!
//! [`AndroidDebugBridge`] is a cheap, stateless facade: every operation
//! opens its own [`Connection`], runs one host command, and disposes the
//! connection before returning. The bridge itself holds only the
//! configuration and the server launcher, so it can be cloned freely and
//! shared across tasks.

use crate::config::AdbConfig;
use crate::connection::Connection;
use crate::device::Device;
use crate::devices::{parse_device_list, DeviceInfo};
use crate::errors::AdbClientError;
use crate::monitor::{DeviceMonitor, DevicesChangedCallback, StoppedCallback};
use crate::server::{AdbServerLauncher, ServerLauncher};
use adb_protocol::{commands, ProtocolError};
use std::sync::Arc;
use tracing::{debug, info};

/// Client facade for an ADB server.
///
/// # Examples
///
/// ```no_run
/// use adb_client::AndroidDebugBridge;
///
/// # async fn example() -> Result<(), adb_client::AdbClientError> {
/// let adb = AndroidDebugBridge::with_defaults();
/// println!("server version {}", adb.server_version().await?);
/// for device in adb.devices().await? {
///     println!("{} ({})", device.device_id(), device.state());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AndroidDebugBridge {
    config: AdbConfig,
    launcher: Arc<dyn ServerLauncher>,
}

impl AndroidDebugBridge {
    /// Build a bridge from a validated configuration.
    pub fn new(config: AdbConfig) -> Result<Self, AdbClientError> {
        config.validate()?;
        let launcher = Arc::new(AdbServerLauncher::new(&config));
        Ok(Self { config, launcher })
    }

    /// Build a bridge with the stock configuration (`adb` on `$PATH`,
    /// server at `127.0.0.1:5037`).
    pub fn with_defaults() -> Self {
        let config = AdbConfig::default();
        let launcher = Arc::new(AdbServerLauncher::new(&config));
        Self { config, launcher }
    }

    /// Build a bridge with a caller-supplied server launcher.
    pub fn with_launcher(
        config: AdbConfig,
        launcher: Arc<dyn ServerLauncher>,
    ) -> Result<Self, AdbClientError> {
        config.validate()?;
        Ok(Self { config, launcher })
    }

    /// The configuration this bridge was built with.
    pub fn config(&self) -> &AdbConfig {
        &self.config
    }

    /// Run `adb start-server` without opening a connection.
    pub async fn start_server(&self) -> Result<(), AdbClientError> {
        self.launcher.start_server().await
    }

    /// Query the server's internal version (`host:version`).
    pub async fn server_version(&self) -> Result<u32, AdbClientError> {
        let text = self.host_query(commands::host::VERSION).await?;
        let version = u32::from_str_radix(&text, 16).map_err(|_| {
            AdbClientError::Protocol(ProtocolError::InvalidResponse(format!(
                "version is not a hex number: {text:?}"
            )))
        })?;
        debug!(version, "queried server version");
        Ok(version)
    }

    /// List the attached devices (`host:devices`).
    pub async fn devices(&self) -> Result<Vec<Device>, AdbClientError> {
        let text = self.host_query(commands::host::DEVICES).await?;
        let devices = parse_device_list(&text)
            .into_iter()
            .map(|info| self.device(info))
            .collect::<Vec<_>>();
        info!(count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// Return the single attached device.
    ///
    /// # Errors
    ///
    /// [`AdbClientError::NoDevices`] when none are attached and
    /// [`AdbClientError::UnexpectedDeviceCount`] when more than one is.
    pub async fn default_device(&self) -> Result<Device, AdbClientError> {
        let mut devices = self.devices().await?;
        match devices.len() {
            0 => Err(AdbClientError::NoDevices),
            1 => Ok(devices.remove(0)),
            n => Err(AdbClientError::UnexpectedDeviceCount(n)),
        }
    }

    /// Return the attached device with the given serial.
    pub async fn device_by_id(&self, device_id: &str) -> Result<Device, AdbClientError> {
        let mut devices = self.devices().await?;
        match devices.iter().position(|d| d.device_id() == device_id) {
            Some(index) => Ok(devices.remove(index)),
            None => Err(AdbClientError::DeviceNotFound(device_id.to_string())),
        }
    }

    /// Start tracking device-list changes (`host:track-devices`).
    ///
    /// `devices_changed` fires for every snapshot the server pushes,
    /// including the initial one; `stopped` fires exactly once when the
    /// monitor ends, carrying the terminal error or `None` after
    /// [`DeviceMonitor::dispose`].
    pub fn track_devices(
        &self,
        devices_changed: DevicesChangedCallback,
        stopped: StoppedCallback,
    ) -> DeviceMonitor {
        DeviceMonitor::new(
            self.config.clone(),
            self.launcher.clone(),
            devices_changed,
            stopped,
        )
    }

    fn device(&self, info: DeviceInfo) -> Device {
        Device::new(self.config.clone(), self.launcher.clone(), info)
    }

    /// One host command returning a length-prefixed response, on a fresh
    /// connection disposed on every exit path.
    async fn host_query(&self, command: &str) -> Result<String, AdbClientError> {
        let mut conn = Connection::new(self.config.clone(), self.launcher.clone());
        let result = async {
            conn.connect().await?;
            if !conn.execute_command(command).await? {
                return Err(AdbClientError::CommandRejected(command.to_string()));
            }
            match conn.read_response_with_length().await? {
                Some(text) => Ok(text),
                None => Err(AdbClientError::Protocol(ProtocolError::InvalidResponse(
                    format!("server closed the stream before answering {command:?}"),
                ))),
            }
        }
        .await;
        conn.dispose();
        result
    }
}
