//! Background device tracking via `host:track-devices`.
//!
//! A [`DeviceMonitor`] owns one long-lived [`Connection`] and a dedicated
//! tokio task that reads device-list snapshots for as long as the server
//! keeps the stream open. Callbacks run on the monitor task, strictly one at
//! a time and in order; the stopped callback fires at most once and is
//! always the last callback the monitor issues.
//!
//! The two ways the stream can end are observably different:
//!
//! - the server closing the stream reports
//!   [`AdbClientError::MonitorTerminated`] through the stopped callback, so
//!   the caller may build a new monitor to reconnect;
//! - the caller disposing the monitor reports a stopped callback with no
//!   error.

use crate::config::AdbConfig;
use crate::connection::{Connection, DisposeHandle};
use crate::devices::{parse_device_list, DeviceInfo};
use crate::errors::AdbClientError;
use crate::server::ServerLauncher;
use adb_protocol::commands;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// Callback invoked with every parsed device-list snapshot.
pub type DevicesChangedCallback = Box<dyn FnMut(Vec<DeviceInfo>) + Send>;

/// Callback invoked exactly once when the monitor stops.
///
/// Carries the terminal error, or `None` for a voluntary
/// [`dispose`](DeviceMonitor::dispose).
pub type StoppedCallback = Box<dyn FnOnce(Option<AdbClientError>) + Send>;

/// Lifecycle state of a [`DeviceMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Task spawned, connection not yet attempted.
    Created,
    /// Connecting and subscribing to track-devices.
    Connecting,
    /// Receiving snapshots.
    Tracking,
    /// Stopped by the caller.
    Stopped,
    /// Stopped by an error or by the server closing the stream.
    Failed,
}

/// Tracks device-list changes until disposed or the server stops.
///
/// Dropping the monitor disposes it.
pub struct DeviceMonitor {
    handle: DisposeHandle,
    state: Arc<Mutex<MonitorState>>,
}

impl DeviceMonitor {
    /// Create a monitor and start its tracking task.
    pub fn new(
        config: AdbConfig,
        launcher: Arc<dyn ServerLauncher>,
        devices_changed: DevicesChangedCallback,
        stopped: StoppedCallback,
    ) -> Self {
        let connection = Connection::new(config, launcher);
        let handle = connection.dispose_handle();
        let state = Arc::new(Mutex::new(MonitorState::Created));

        let task_state = state.clone();
        tokio::spawn(async move {
            run_monitor(connection, task_state, devices_changed, stopped).await;
        });

        Self { handle, state }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        *self.state.lock().expect("monitor state lock poisoned")
    }

    /// Stop tracking. Idempotent; the stopped callback (if not yet fired)
    /// is invoked with no error.
    pub fn dispose(&self) {
        self.handle.dispose();
    }
}

impl Drop for DeviceMonitor {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn run_monitor(
    mut connection: Connection,
    state: Arc<Mutex<MonitorState>>,
    mut devices_changed: DevicesChangedCallback,
    stopped: StoppedCallback,
) {
    let set_state = |s: MonitorState| {
        *state.lock().expect("monitor state lock poisoned") = s;
    };

    info!("device monitor starting");
    set_state(MonitorState::Connecting);

    if let Err(e) = subscribe(&mut connection).await {
        let terminal = match e {
            // Disposed before the subscription completed: a voluntary stop.
            AdbClientError::Cancelled | AdbClientError::Disposed => None,
            other => Some(other),
        };
        finish(connection, &set_state, stopped, terminal);
        return;
    }

    set_state(MonitorState::Tracking);
    let terminal = loop {
        match connection.read_response_with_length().await {
            Ok(Some(snapshot)) => {
                debug!(snapshot = %snapshot, "devices changed");
                devices_changed(parse_device_list(&snapshot));
            }
            // Clean end of stream: the server stopped tracking.
            Ok(None) => break Some(AdbClientError::MonitorTerminated),
            Err(AdbClientError::Cancelled) | Err(AdbClientError::Disposed) => break None,
            Err(e) => break Some(e),
        }
    };

    finish(connection, &set_state, stopped, terminal);
}

async fn subscribe(connection: &mut Connection) -> Result<(), AdbClientError> {
    connection.connect().await?;
    if !connection
        .execute_command(commands::host::TRACK_DEVICES)
        .await?
    {
        return Err(AdbClientError::TrackingStartFailed);
    }
    Ok(())
}

fn finish(
    mut connection: Connection,
    set_state: &impl Fn(MonitorState),
    stopped: StoppedCallback,
    terminal: Option<AdbClientError>,
) {
    connection.dispose();
    match &terminal {
        Some(e) => {
            error!(error = %e, "device monitor failed");
            set_state(MonitorState::Failed);
        }
        None => {
            info!("device monitor stopped");
            set_state(MonitorState::Stopped);
        }
    }
    stopped(terminal);
}
