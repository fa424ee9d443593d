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

use pwmd::binding::mapper::SimulatedMapper;
use pwmd::channel::CommandChannel;
use pwmd::error::PwmdError;
use pwmd::node::{DeviceNode, NodePublisher};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub static PWM_COMPATIBLE: &str = "xlnx,my-pwm-ip-c2-1.0";

fn cells(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

fn node(root: &Path, path: &str, properties: &[(&str, &[u8])]) {
    let dir = root.join(path);
    fs::create_dir_all(&dir).expect("failed to create node");
    for (name, value) in properties {
        fs::write(dir.join(name), value).expect("failed to write property");
    }
}

/// A Zynq-7000 style device tree holding one PWM core. `reg` is left out when `None`.
pub fn device_tree(reg: Option<&[u32]>) -> TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let root = dir.path();
    node(
        root,
        "amba_pl@0",
        &[
            ("#address-cells", &cells(&[1])),
            ("#size-cells", &cells(&[1])),
            ("compatible", b"simple-bus\0"),
        ],
    );
    let compatible = format!("{PWM_COMPATIBLE}\0");
    let reg = reg.map(cells);
    let mut properties: Vec<(&str, &[u8])> = vec![("compatible", compatible.as_bytes())];
    if let Some(reg) = reg.as_deref() {
        properties.push(("reg", reg));
    }
    node(root, "amba_pl@0/my_pwm_ip_c2@43c00000", &properties);
    dir
}

/// Something that happened to a published node, with the number of register mappings
/// alive at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishEvent {
    Published { node: String, live_mappings: usize },
    Unpublished { node: String, live_mappings: usize },
}

/// Keeps published channels in memory so tests can drive them like a caller would.
#[derive(Debug)]
pub struct RecordingPublisher {
    mapper: Arc<SimulatedMapper>,
    refuse: bool,
    events: Mutex<Vec<PublishEvent>>,
    channel: Mutex<Option<Arc<CommandChannel>>>,
}

impl RecordingPublisher {
    pub fn new(mapper: Arc<SimulatedMapper>) -> Self {
        RecordingPublisher {
            mapper,
            refuse: false,
            events: Mutex::new(Vec::new()),
            channel: Mutex::new(None),
        }
    }

    pub fn refusing(mapper: Arc<SimulatedMapper>) -> Self {
        RecordingPublisher {
            refuse: true,
            ..Self::new(mapper)
        }
    }

    pub fn events(&self) -> Vec<PublishEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn channel(&self) -> Arc<CommandChannel> {
        self.channel
            .lock()
            .unwrap()
            .clone()
            .expect("no channel published")
    }
}

impl NodePublisher for RecordingPublisher {
    async fn publish(
        &self,
        node: &DeviceNode,
        channel: Arc<CommandChannel>,
    ) -> Result<(), PwmdError> {
        if self.refuse {
            return Err(PwmdError::NodeCreate {
                node: node.name.clone(),
                reason: "refused by test".into(),
            });
        }
        self.events.lock().unwrap().push(PublishEvent::Published {
            node: node.name.clone(),
            live_mappings: self.mapper.live_mappings(),
        });
        *self.channel.lock().unwrap() = Some(channel);
        Ok(())
    }

    async fn unpublish(&self, node: &DeviceNode) {
        self.events.lock().unwrap().push(PublishEvent::Unpublished {
            node: node.name.clone(),
            live_mappings: self.mapper.live_mappings(),
        });
        self.channel.lock().unwrap().take();
    }
}
