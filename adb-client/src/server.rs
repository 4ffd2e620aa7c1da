//! Starting the external ADB server process.
//!
//! When a connection attempt is refused, the client spawns
//! `<executable> start-server` and retries. The launcher is a trait so that
//! connection recovery can be exercised in tests without a real adb binary.

use crate::config::AdbConfig;
use crate::errors::AdbClientError;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Collaborator that can start the ADB server.
pub trait ServerLauncher: Send + Sync {
    /// Launch the server and resolve once startup has completed.
    fn start_server(&self) -> BoxFuture<'_, Result<(), AdbClientError>>;
}

/// Launches the real adb executable with `start-server`.
///
/// Stdout is captured and logged; the exit code is the sole success signal.
pub struct AdbServerLauncher {
    executable: PathBuf,
}

impl AdbServerLauncher {
    /// Create a launcher for the configured executable.
    pub fn new(config: &AdbConfig) -> Self {
        Self {
            executable: config.executable.clone(),
        }
    }
}

impl ServerLauncher for AdbServerLauncher {
    fn start_server(&self) -> BoxFuture<'_, Result<(), AdbClientError>> {
        Box::pin(async move {
            info!(executable = %self.executable.display(), "starting adb server");

            let output = Command::new(&self.executable)
                .arg("start-server")
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        AdbClientError::AdbNotFound(self.executable.display().to_string())
                    } else {
                        AdbClientError::ServerUnavailable(format!("cannot spawn adb: {}", e))
                    }
                })?;

            for line in String::from_utf8_lossy(&output.stdout).lines() {
                debug!(target: "adb_client::server", "adb: {}", line);
            }

            if output.status.success() {
                Ok(())
            } else {
                Err(AdbClientError::ServerUnavailable(format!(
                    "start-server exited with {}",
                    output.status
                )))
            }
        })
    }
}
