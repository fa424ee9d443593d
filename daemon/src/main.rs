// This file is part of pwmd, an application to drive the PWM custom IP core of an FPGA through its memory-mapped register.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// pwmd is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// pwmd is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

//! PWM daemon (pwmd) - System service driving the PWM custom IP core of an FPGA.
//!
//! This is the main entry point for the pwmd daemon. At startup the daemon:
//! 1. Reads its configuration from `/etc/pwmd/config.toml`, falling back to defaults
//! 2. Connects to the system DBus and claims `com.canonical.pwmd`
//! 3. Loads the driver: finds the PWM core in the device tree, maps its duty cycle register
//!    and publishes the `pwm_c2` device node
//! 4. Serves the status interface until it receives `SIGINT` or `SIGTERM`
//! 5. Unloads the driver, which unpublishes the node and releases the register
//!
//! # DBus Service
//!
//! - **Service Name**: `com.canonical.pwmd`
//! - **Status Interface**: `/com/canonical/pwmd/status` - Read-only driver state
//! - **Channel Interface**: `/com/canonical/pwmd/pwm_c2` - The device node's command channel
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (`trace`, `debug`, `info`, `warn`, `error`
//!   or `off`). Defaults to `info`

use log::info;
use pwmd::binding::mapper::{DevMemMapper, RegisterMapper, SimulatedMapper};
use pwmd::comm::dbus::DbusNodePublisher;
use pwmd::comm::dbus::status_interface::StatusInterface;
use pwmd::config::{self, RegisterBackend, SystemConfig};
use pwmd::driver::PwmDriver;
use pwmd::platforms::device_tree::DeviceTreeBus;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use zbus::{Connection, connection};

fn register_mapper(config: &SystemConfig) -> Arc<dyn RegisterMapper> {
    match config.register_backend {
        RegisterBackend::Devmem => Arc::new(DevMemMapper::new(&config.mem_device)),
        RegisterBackend::Simulated => {
            info!("Using simulated registers, no hardware will be touched");
            Arc::new(SimulatedMapper::new())
        }
    }
}

/// Main entry point for the pwmd daemon.
///
/// # Returns: `Result<(), Box<dyn Error>>`
/// * `Ok(())` - The daemon was asked to stop and unloaded cleanly
/// * `Err(Box<dyn Error>)` - The DBus connection or the driver load failed
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let system_config = config::load_system_config(Path::new(config::CONFIG_FILE));

    let conn = connection::Builder::system()?
        .name(config::DBUS_SERVICE)?
        .build()
        .await?;

    let bus = DeviceTreeBus::new(&system_config.device_tree_dir);
    let driver = PwmDriver::load(
        &bus,
        register_mapper(&system_config),
        DbusNodePublisher::new(conn.clone()),
    )
    .await?;

    let served = serve(&conn, &driver).await;
    driver.unload().await;
    served
}

/// Serve the status interface for `driver` until the daemon is asked to stop.
async fn serve(
    conn: &Connection,
    driver: &PwmDriver<DbusNodePublisher>,
) -> Result<(), Box<dyn Error>> {
    conn.object_server()
        .at(
            config::DBUS_STATUS_PATH,
            StatusInterface::new(driver.binding().clone(), driver.node().clone()),
        )
        .await?;
    info!("Started {} dbus service", config::DBUS_SERVICE);

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        _ = terminate.recv() => info!("Terminated"),
    }

    conn.object_server()
        .remove::<StatusInterface, _>(config::DBUS_STATUS_PATH)
        .await?;
    Ok(())
}
