//! Headless device tracker example - list devices and follow changes.
//!
//! Usage:
//!   cargo run --example track_devices -- [host:port]
//!
//! This example demonstrates:
//! - Creating a client configuration
//! - Querying the server version and device list
//! - Tracking device-list changes until Ctrl-C
//! - Graceful shutdown

use adb_client::{AdbConfig, AndroidDebugBridge, DEFAULT_SERVER_PORT};
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let (host, port) = match args.get(1) {
        Some(server) => parse_server_address(server)?,
        None => ("127.0.0.1".to_string(), DEFAULT_SERVER_PORT),
    };

    let config = AdbConfig::builder().host(&host).port(port).build()?;
    let adb = AndroidDebugBridge::new(config)?;

    match adb.server_version().await {
        Ok(version) => info!("adb server version {}", version),
        Err(e) => {
            error!("Failed to reach adb server: {}", e);
            return Err(e.into());
        }
    }

    for device in adb.devices().await? {
        info!("{} ({})", device.device_id(), device.state());
    }

    info!("Tracking device changes, press Ctrl-C to stop");
    let (stopped_tx, stopped_rx) = tokio::sync::oneshot::channel();
    let monitor = adb.track_devices(
        Box::new(|devices| {
            info!("Device list changed ({} devices):", devices.len());
            for device in devices {
                info!("  {} ({})", device.device_id, device.state);
            }
        }),
        Box::new(move |error| {
            let _ = stopped_tx.send(error);
        }),
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping monitor");
            monitor.dispose();
        }
        result = stopped_rx => {
            if let Ok(Some(e)) = result {
                error!("Monitor stopped: {}", e);
            }
        }
    }

    Ok(())
}

fn parse_server_address(server: &str) -> anyhow::Result<(String, u16)> {
    match server.split_once(':') {
        Some((host, port)) => Ok((host.to_string(), port.parse()?)),
        None => Ok((server.to_string(), DEFAULT_SERVER_PORT)),
    }
}
