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

use crate::channel::CommandChannel;
use crate::node::NodeId;
use log::info;
use std::sync::Arc;
use zbus::{fdo, interface};

/// The command channel of a published device node.
pub struct ChannelInterface {
    channel: Arc<CommandChannel>,
    id: NodeId,
}

impl ChannelInterface {
    pub fn new(channel: Arc<CommandChannel>, id: NodeId) -> Self {
        ChannelInterface { channel, id }
    }
}

#[interface(name = "com.canonical.pwmd.channel")]
impl ChannelInterface {
    async fn open(&self) {
        info!("open called on {}", self.id);
        self.channel.open();
    }

    async fn close(&self) {
        info!("close called on {}", self.id);
        self.channel.close();
    }

    /// Apply the duty cycle in the first `length` bytes of `data`. Returns `length`.
    async fn write(&self, data: Vec<u8>, length: u32) -> Result<u32, fdo::Error> {
        info!("write called with {} bytes, length {length}", data.len());
        self.channel.write(&data, length as usize)?;
        Ok(length)
    }

    /// Read the one byte duty cycle status. A `length` of 0 returns nothing, any other
    /// `length` returns the single status byte.
    async fn read(&self, length: u32) -> Result<Vec<u8>, fdo::Error> {
        info!("read called with length {length}");
        let mut buffer = vec![0u8; (length as usize).min(1)];
        let reported = self.channel.read(&mut buffer, length as usize)?;
        buffer.truncate(reported);
        Ok(buffer)
    }

    #[zbus(property)]
    async fn major(&self) -> u32 {
        self.id.major
    }

    #[zbus(property)]
    async fn minor(&self) -> u32 {
        self.id.minor
    }

    #[zbus(property)]
    async fn open_count(&self) -> u32 {
        u32::try_from(self.channel.open_count()).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingManager;
    use crate::binding::mapper::SimulatedMapper;
    use crate::platforms::platform::{PlatformDevice, RegisterWindow};
    use googletest::prelude::*;
    use std::path::PathBuf;

    fn interface() -> ChannelInterface {
        let binding = BindingManager::new(Arc::new(SimulatedMapper::new()));
        binding
            .bind(&PlatformDevice {
                name: "my_pwm_ip_c2@43c00000".into(),
                of_node: PathBuf::new(),
                compatible: vec!["xlnx,my-pwm-ip-c2-1.0".into()],
                mem_resources: vec![RegisterWindow::new(0x43c0_0000, 0x1_0000)],
            })
            .expect("bind failed");
        ChannelInterface::new(
            Arc::new(CommandChannel::new(Arc::new(binding))),
            NodeId { major: 254, minor: 0 },
        )
    }

    #[gtest]
    #[tokio::test]
    async fn write_then_read_reports_status() {
        let interface = interface();
        interface.open().await;
        expect_that!(interface.open_count().await, eq(1));

        assert_that!(interface.write(b"5000".to_vec(), 4).await, ok(eq(&4)));
        assert_that!(interface.read(8).await, ok(elements_are![eq(&50)]));

        interface.close().await;
        expect_that!(interface.open_count().await, eq(0));
    }

    #[gtest]
    #[tokio::test]
    async fn read_of_zero_length_returns_nothing() {
        let interface = interface();
        assert_that!(interface.read(0).await, ok(is_empty()));
    }

    #[gtest]
    #[tokio::test]
    async fn huge_read_length_returns_one_byte() {
        let interface = interface();
        interface.write(b"9999".to_vec(), 4).await.expect("write failed");
        assert_that!(interface.read(u32::MAX).await, ok(elements_are![eq(&100)]));
    }

    #[gtest]
    #[tokio::test]
    async fn reports_node_identity() {
        let interface = interface();
        expect_that!(interface.major().await, eq(254));
        expect_that!(interface.minor().await, eq(0));
    }
}
