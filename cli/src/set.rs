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

//! Set command implementation for the pwmd CLI.
//!
//! Writes a duty cycle to a device node the same way any other caller of the node would:
//! open the channel, write the duty as four ASCII digits, close the channel.

use crate::proxies::channel_proxy::channel_proxy;
use log::debug;
use zbus::Connection;

/// The command bytes for `duty`, zero padded to four digits.
pub fn duty_command(duty: u32) -> Vec<u8> {
    format!("{duty:04}").into_bytes()
}

/// Main handler for the set command.
///
/// # Returns: `Result<String, zbus::Error>`
/// * `Ok(String)` - Confirmation of the duty cycle written
/// * `Err(zbus::Error)` - DBus communication error or PwmdError reported by the daemon
///
/// # Examples
///
/// ```bash
/// pwmd_cli set 750
/// pwmd_cli --node=pwm_c2 set 9999
/// ```
pub async fn set_handler(node: &str, duty: u32) -> Result<String, zbus::Error> {
    let command = duty_command(duty);
    let connection = Connection::system().await?;
    let proxy = channel_proxy(&connection, node).await?;

    proxy.open().await?;
    let written = proxy.write(&command, command.len() as u32).await;
    // close even when the write failed
    proxy.close().await?;
    let written = written?;
    debug!("daemon accepted {written} bytes");
    Ok(format!("Duty cycle of {node} set to {duty}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use rstest::*;

    #[gtest]
    #[rstest]
    #[case::zero(0, b"0000")]
    #[case::padded(750, b"0750")]
    #[case::full(9999, b"9999")]
    fn duty_is_four_digits(#[case] duty: u32, #[case] expected: &[u8]) {
        expect_that!(duty_command(duty), eq(&expected.to_vec()));
    }
}
