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

use zbus::{Connection, Result, proxy};

#[proxy(
    default_service = "com.canonical.pwmd",
    interface = "com.canonical.pwmd.channel"
)]
pub trait Channel {
    async fn open(&self) -> Result<()>;
    async fn close(&self) -> Result<()>;
    async fn write(&self, data: &[u8], length: u32) -> Result<u32>;
    async fn read(&self, length: u32) -> Result<Vec<u8>>;

    #[zbus(property)]
    fn major(&self) -> Result<u32>;
    #[zbus(property)]
    fn minor(&self) -> Result<u32>;
    #[zbus(property)]
    fn open_count(&self) -> Result<u32>;
}

pub fn channel_path(node: &str) -> String {
    format!("/com/canonical/pwmd/{node}")
}

/// Connect to the command channel of the device node called `node`.
pub async fn channel_proxy<'a>(connection: &Connection, node: &str) -> Result<ChannelProxy<'a>> {
    ChannelProxy::builder(connection)
        .path(channel_path(node))?
        .build()
        .await
}
