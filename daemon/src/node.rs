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

//! Identity and publication of the PWM device node.
//!
//! A node is identified by a `major:minor` pair. Majors come from a [`MajorPool`] covering the
//! dynamic range, searched from the top down, and stay reserved for as long as the owning
//! [`NodeRegion`] lives. Making the node reachable by callers is the job of a
//! [`NodePublisher`].

use crate::channel::CommandChannel;
use crate::error::PwmdError;
use log::{info, trace};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Majors handed out dynamically, highest first.
pub const DYNAMIC_MAJORS: RangeInclusive<u32> = 234..=254;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// The set of majors currently reserved.
#[derive(Debug, Default)]
pub struct MajorPool {
    taken: Mutex<BTreeSet<u32>>,
}

impl MajorPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pool shared by everything in this process.
    pub fn global() -> Arc<MajorPool> {
        static GLOBAL: OnceLock<Arc<MajorPool>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(MajorPool::new())).clone()
    }

    fn reserve(&self) -> Option<u32> {
        let mut taken = self.taken.lock().unwrap_or_else(PoisonError::into_inner);
        let major = DYNAMIC_MAJORS.rev().find(|major| !taken.contains(major))?;
        taken.insert(major);
        Some(major)
    }

    fn free(&self, major: u32) {
        self.taken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&major);
    }

    pub fn is_reserved(&self, major: u32) -> bool {
        self.taken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&major)
    }
}

/// A reserved major with `count` minors starting at 0. The major returns to its pool when the
/// region is released or dropped.
#[derive(Debug)]
pub struct NodeRegion {
    name: String,
    first: NodeId,
    count: u32,
    pool: Arc<MajorPool>,
}

impl NodeRegion {
    /// Reserve a region from the process-wide pool.
    ///
    /// # Returns: `Result<NodeRegion, PwmdError>`
    /// * `Ok(NodeRegion)` - The reserved region
    /// * `Err(PwmdError::NodeRegion)` - Every dynamic major is taken, or `count` is 0
    pub fn alloc(name: &str, count: u32) -> Result<NodeRegion, PwmdError> {
        Self::alloc_from(MajorPool::global(), name, count)
    }

    pub fn alloc_from(pool: Arc<MajorPool>, name: &str, count: u32) -> Result<NodeRegion, PwmdError> {
        if count == 0 {
            return Err(PwmdError::NodeRegion(format!("{name} (no minors requested)")));
        }
        let major = pool
            .reserve()
            .ok_or_else(|| PwmdError::NodeRegion(name.to_string()))?;
        trace!("Reserved major {major} for {name}");
        Ok(NodeRegion {
            name: name.to_string(),
            first: NodeId { major, minor: 0 },
            count,
            pool,
        })
    }

    pub fn first(&self) -> NodeId {
        self.first
    }

    pub fn release(self) {
        info!(
            "Releasing node region {} ({} minors) of {}",
            self.first, self.count, self.name
        );
    }
}

impl Drop for NodeRegion {
    fn drop(&mut self) {
        self.pool.free(self.first.major);
    }
}

/// A device node as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNode {
    pub name: String,
    pub class: String,
    pub id: NodeId,
}

impl fmt::Display for DeviceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.id)
    }
}

/// Makes a device node reachable and takes it down again.
#[allow(async_fn_in_trait)]
pub trait NodePublisher {
    /// Expose `channel` to callers under `node`.
    ///
    /// # Returns: `Result<(), PwmdError>`
    /// * `Ok(())` - The node is reachable
    /// * `Err(PwmdError::NodeCreate)` - The node could not be created
    async fn publish(&self, node: &DeviceNode, channel: Arc<CommandChannel>) -> Result<(), PwmdError>;

    /// Remove a node previously published. Failure is logged, never returned.
    async fn unpublish(&self, node: &DeviceNode);
}

impl<T: NodePublisher> NodePublisher for &T {
    async fn publish(&self, node: &DeviceNode, channel: Arc<CommandChannel>) -> Result<(), PwmdError> {
        (**self).publish(node, channel).await
    }

    async fn unpublish(&self, node: &DeviceNode) {
        (**self).unpublish(node).await
    }
}
