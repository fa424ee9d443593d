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

//! Load and unload of the PWM driver.
//!
//! [`PwmDriver::load`] brings the driver up in three steps and undoes whatever already
//! succeeded, newest first, when a later step fails:
//! 1. probe the platform bus for the PWM core and bind its register window
//! 2. reserve a node region for the device node
//! 3. publish the device node with its command channel
//!
//! [`PwmDriver::unload`] tears the same three steps down in reverse order.

use crate::binding::BindingManager;
use crate::binding::mapper::RegisterMapper;
use crate::channel::CommandChannel;
use crate::config;
use crate::error::PwmdError;
use crate::node::{DeviceNode, MajorPool, NodePublisher, NodeRegion};
use crate::platforms::platform::{PlatformBus, find_compatible};
use log::{error, info};
use std::sync::Arc;

#[derive(Debug)]
pub struct PwmDriver<P: NodePublisher> {
    binding: Arc<BindingManager>,
    channel: Arc<CommandChannel>,
    region: NodeRegion,
    node: DeviceNode,
    publisher: P,
}

impl<P: NodePublisher> PwmDriver<P> {
    /// Find the PWM core on `bus`, bind it with `mapper` and publish its node with
    /// `publisher`.
    ///
    /// # Returns: `Result<PwmDriver<P>, PwmdError>`
    /// * `Ok(PwmDriver)` - The driver is bound and its node is published
    /// * `Err(PwmdError::NoDevice)` - No device on `bus` is compatible with the PWM core
    /// * `Err(PwmdError::ResourceMissing)` - The device has no register window
    /// * `Err(PwmdError::MapFailed)` - The register window could not be mapped
    /// * `Err(PwmdError::NodeRegion)` - No node identity is left
    /// * `Err(PwmdError::NodeCreate)` - The publisher refused the node
    pub async fn load(
        bus: &dyn PlatformBus,
        mapper: Arc<dyn RegisterMapper>,
        publisher: P,
    ) -> Result<PwmDriver<P>, PwmdError> {
        Self::load_with_pool(bus, mapper, publisher, MajorPool::global()).await
    }

    /// Same as [`PwmDriver::load`], reserving the node's major from `pool`.
    pub async fn load_with_pool(
        bus: &dyn PlatformBus,
        mapper: Arc<dyn RegisterMapper>,
        publisher: P,
        pool: Arc<MajorPool>,
    ) -> Result<PwmDriver<P>, PwmdError> {
        let device = find_compatible(bus, config::PWM_COMPATIBLE)?;
        let binding = Arc::new(BindingManager::new(mapper));
        binding.bind(&device)?;

        let region = match NodeRegion::alloc_from(pool, config::REGION_NAME, 1) {
            Ok(region) => region,
            Err(e) => {
                error!("Cannot allocate major number for device");
                binding.unbind();
                return Err(e);
            }
        };
        let id = region.first();
        info!("Major = {} Minor = {}", id.major, id.minor);

        let node = DeviceNode {
            name: config::NODE_NAME.to_string(),
            class: config::NODE_CLASS.to_string(),
            id,
        };
        let channel = Arc::new(CommandChannel::new(binding.clone()));
        if let Err(e) = publisher.publish(&node, channel.clone()).await {
            error!("Cannot create the Device {}", node.name);
            region.release();
            binding.unbind();
            return Err(e);
        }

        info!("Device Driver Insert...Done!!!");
        Ok(PwmDriver {
            binding,
            channel,
            region,
            node,
            publisher,
        })
    }

    pub async fn unload(self) {
        self.publisher.unpublish(&self.node).await;
        self.region.release();
        self.binding.unbind();
        info!("Device Driver Remove...Done!!!");
    }

    pub fn binding(&self) -> &Arc<BindingManager> {
        &self.binding
    }

    pub fn channel(&self) -> &Arc<CommandChannel> {
        &self.channel
    }

    pub fn node(&self) -> &DeviceNode {
        &self.node
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}
