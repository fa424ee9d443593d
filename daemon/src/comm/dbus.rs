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

pub mod channel_interface;
pub mod status_interface;

use crate::channel::CommandChannel;
use crate::comm::dbus::channel_interface::ChannelInterface;
use crate::config;
use crate::error::PwmdError;
use crate::node::{DeviceNode, NodePublisher};
use log::{error, info, trace};
use std::sync::Arc;
use zbus::Connection;
use zbus::zvariant::ObjectPath;

/// Object path a device node is published at: `/com/canonical/pwmd/<node name>`.
pub fn node_path(node: &DeviceNode) -> Result<ObjectPath<'static>, PwmdError> {
    let path = format!("{}/{}", config::DBUS_NODE_PREFIX, node.name);
    ObjectPath::try_from(path.clone())
        .map_err(|e| PwmdError::NodeCreate {
            node: node.name.clone(),
            reason: format!("{path} is not a valid object path: {e}"),
        })
}

/// Publishes device nodes as [`ChannelInterface`] objects on a D-Bus connection.
#[derive(Debug, Clone)]
pub struct DbusNodePublisher {
    connection: Connection,
}

impl DbusNodePublisher {
    pub fn new(connection: Connection) -> Self {
        DbusNodePublisher { connection }
    }
}

impl NodePublisher for DbusNodePublisher {
    async fn publish(&self, node: &DeviceNode, channel: Arc<CommandChannel>) -> Result<(), PwmdError> {
        let path = node_path(node)?;
        trace!("Publishing {node} at {path}");
        let added = self
            .connection
            .object_server()
            .at(path.clone(), ChannelInterface::new(channel, node.id))
            .await
            .map_err(|e| PwmdError::NodeCreate {
                node: node.name.clone(),
                reason: e.to_string(),
            })?;
        if !added {
            return Err(PwmdError::NodeCreate {
                node: node.name.clone(),
                reason: format!("{path} is already published"),
            });
        }
        info!("Published {node} at {path}");
        Ok(())
    }

    async fn unpublish(&self, node: &DeviceNode) {
        let path = match node_path(node) {
            Ok(path) => path,
            Err(e) => {
                error!("{e}");
                return;
            }
        };
        match self
            .connection
            .object_server()
            .remove::<ChannelInterface, _>(path.clone())
            .await
        {
            Ok(true) => info!("Removed {node} from {path}"),
            Ok(false) => error!("{node} was not published at {path}"),
            Err(e) => error!("Failed to remove {node} from {path}: {e}"),
        }
    }
}
