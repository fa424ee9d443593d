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

use crate::binding::BindingManager;
use crate::error::PwmdError;
use crate::node::DeviceNode;
use log::info;
use std::sync::Arc;
use zbus::{fdo, interface};

/// Read-only view of the driver's binding and node.
pub struct StatusInterface {
    binding: Arc<BindingManager>,
    node: DeviceNode,
}

impl StatusInterface {
    pub fn new(binding: Arc<BindingManager>, node: DeviceNode) -> Self {
        StatusInterface { binding, node }
    }
}

#[interface(name = "com.canonical.pwmd.status")]
impl StatusInterface {
    async fn get_binding_state(&self) -> String {
        info!("get_binding_state called");
        self.binding.state().to_string()
    }

    async fn get_register_window(&self) -> Result<String, fdo::Error> {
        info!("get_register_window called");
        let window = self.binding.window().ok_or(PwmdError::NotBound)?;
        Ok(window.to_string())
    }

    /// The raw value of the duty cycle register.
    async fn get_duty_cycle(&self) -> Result<u32, fdo::Error> {
        info!("get_duty_cycle called");
        Ok(self.binding.read_register()?)
    }

    async fn get_node(&self) -> String {
        info!("get_node called");
        self.node.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::mapper::SimulatedMapper;
    use crate::node::NodeId;
    use crate::platforms::platform::{PlatformDevice, RegisterWindow};
    use googletest::prelude::*;
    use std::path::PathBuf;

    fn status(bound: bool) -> StatusInterface {
        let binding = Arc::new(BindingManager::new(Arc::new(SimulatedMapper::new())));
        if bound {
            binding
                .bind(&PlatformDevice {
                    name: "my_pwm_ip_c2@43c00000".into(),
                    of_node: PathBuf::new(),
                    compatible: vec!["xlnx,my-pwm-ip-c2-1.0".into()],
                    mem_resources: vec![RegisterWindow::new(0x43c0_0000, 0x1_0000)],
                })
                .expect("bind failed");
        }
        StatusInterface::new(
            binding,
            DeviceNode {
                name: "pwm_c2".into(),
                class: "pwm_class".into(),
                id: NodeId { major: 254, minor: 0 },
            },
        )
    }

    #[gtest]
    #[tokio::test]
    async fn bound_status() {
        let status = status(true);
        status.binding.write_register(750).expect("write failed");

        expect_that!(status.get_binding_state().await, eq("bound"));
        expect_that!(
            status.get_register_window().await,
            ok(eq("0x43c00000-0x43c0ffff"))
        );
        expect_that!(status.get_duty_cycle().await, ok(eq(&750)));
        expect_that!(status.get_node().await, eq("pwm_c2 254:0"));
    }

    #[gtest]
    #[tokio::test]
    async fn unbound_status() {
        let status = status(false);
        expect_that!(status.get_binding_state().await, eq("unbound"));
        expect_that!(
            status.get_register_window().await,
            err(displays_as(contains_substring("PwmdError::NotBound")))
        );
        expect_that!(
            status.get_duty_cycle().await,
            err(displays_as(contains_substring("PwmdError::NotBound")))
        );
    }
}
