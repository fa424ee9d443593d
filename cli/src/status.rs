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

//! Status command implementation for the pwmd CLI.

use crate::proxies::channel_proxy::channel_proxy;
use crate::proxies::status_proxy::StatusProxy;
use zbus::Connection;

/// Main handler for the status command. Reports the driver's binding and, when the node is
/// published, how many callers have it open.
///
/// # Returns: `Result<String, zbus::Error>`
/// * `Ok(String)` - An ascii table describing the driver
/// * `Err(zbus::Error)` - DBus communication error or PwmdError reported by the daemon
pub async fn status_handler(node: &str) -> Result<String, zbus::Error> {
    let connection = Connection::system().await?;
    let status = StatusProxy::new(&connection).await?;

    let state = status.get_binding_state().await?;
    let window = status
        .get_register_window()
        .await
        .unwrap_or_else(|_| "-".to_string());
    let duty = status
        .get_duty_cycle()
        .await
        .map_or_else(|_| "-".to_string(), |duty| duty.to_string());
    let published = status.get_node().await?;
    let open_count = channel_proxy(&connection, node).await?.open_count().await?;

    Ok(format!(
        "---- DRIVER ----\n\
        | state | window | duty |\n\
        | {state} | {window} | {duty} |\n\
        \n---- NODE ----\n\
        | node | open |\n\
        | {published} | {open_count} |\n"
    ))
}
