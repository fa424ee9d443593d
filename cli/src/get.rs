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

//! Get command implementation for the pwmd CLI.

use crate::proxies::channel_proxy::channel_proxy;
use zbus::Connection;

/// Main handler for the get command. Reads the one byte status of the node, which is the duty
/// cycle as a percentage of full scale.
///
/// # Returns: `Result<String, zbus::Error>`
/// * `Ok(String)` - The status, e.g. `pwm_c2: 7%`
/// * `Err(zbus::Error)` - DBus communication error or PwmdError reported by the daemon
pub async fn get_handler(node: &str) -> Result<String, zbus::Error> {
    let connection = Connection::system().await?;
    let proxy = channel_proxy(&connection, node).await?;

    proxy.open().await?;
    let status = proxy.read(1).await;
    proxy.close().await?;
    match status?.first() {
        Some(percent) => Ok(format!("{node}: {percent}%")),
        None => Err(zbus::Error::Failure(format!("{node} reported no status"))),
    }
}
