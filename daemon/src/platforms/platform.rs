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

//! Platform device model and compatible-string matching.
//!
//! A [`PlatformBus`] enumerates the devices described by platform firmware data, each
//! one a [`PlatformDevice`] carrying its compatible strings and memory resources. The
//! driver looks up the one device it supports with [`find_compatible`] and hands it to
//! the [`BindingManager`](crate::binding::BindingManager).
//!
//! # Examples
//!
//! ```rust,no_run
//! # use pwmd::platforms::device_tree::DeviceTreeBus;
//! # use pwmd::platforms::platform::find_compatible;
//! # fn example() -> Result<(), pwmd::error::PwmdError> {
//! let bus = DeviceTreeBus::new("/proc/device-tree");
//! let device = find_compatible(&bus, "xlnx,my-pwm-ip-c2-1.0")?;
//! println!("{} at {:?}", device.name, device.mem_resource(0));
//! # Ok(())
//! # }
//! ```

use crate::error::PwmdError;
use log::trace;
use std::fmt;
use std::path::PathBuf;

/// A physical address range exposing a memory-mapped register block.
///
/// `len` is in bytes and is never zero for windows produced by a [`PlatformBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterWindow {
    pub start: u64,
    pub len: u64,
}

impl RegisterWindow {
    pub fn new(start: u64, len: u64) -> Self {
        RegisterWindow { start, len }
    }

    /// Last address inside the window (inclusive).
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.len.saturating_sub(1))
    }
}

impl fmt::Display for RegisterWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}-{:#010x}", self.start, self.end())
    }
}

/// A device described by platform firmware data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDevice {
    /// Node name, e.g. `my_pwm_ip_c2@43c00000`
    pub name: String,
    /// Where the description was found. Empty for devices not backed by firmware data.
    pub of_node: PathBuf,
    pub compatible: Vec<String>,
    pub mem_resources: Vec<RegisterWindow>,
}

impl PlatformDevice {
    /// Get the `index`th memory resource of the device, if it has one.
    pub fn mem_resource(&self, index: usize) -> Option<RegisterWindow> {
        self.mem_resources.get(index).copied()
    }

    /// Whether `compat` is one of the device's compatible entries.
    ///
    /// Entries are compared whole and case-sensitively, the way the kernel matches an
    /// `of_device_id` table.
    pub fn is_compatible(&self, compat: &str) -> bool {
        self.compatible.iter().any(|c| c == compat)
    }
}

/// Enumerates platform devices.
pub trait PlatformBus {
    /// List every enabled device the platform describes.
    ///
    /// # Returns: `Result<Vec<PlatformDevice>, PwmdError>`
    /// * `Ok(Vec<PlatformDevice>)` - Devices in discovery order
    /// * `Err(PwmdError::IOReadDir)` / `Err(PwmdError::IORead)` - The description could not be read
    fn devices(&self) -> Result<Vec<PlatformDevice>, PwmdError>;
}

/// A fixed list of devices, for boards without firmware data and for tests.
impl PlatformBus for Vec<PlatformDevice> {
    fn devices(&self) -> Result<Vec<PlatformDevice>, PwmdError> {
        Ok(self.clone())
    }
}

/// Find the first device compatible with `compat`.
///
/// # Returns: `Result<PlatformDevice, PwmdError>`
/// * `Ok(PlatformDevice)` - The first matching device
/// * `Err(PwmdError::NoDevice)` - No device matches
/// * `Err(PwmdError)` - The bus could not be enumerated
pub fn find_compatible(bus: &dyn PlatformBus, compat: &str) -> Result<PlatformDevice, PwmdError> {
    let device = bus
        .devices()?
        .into_iter()
        .find(|device| device.is_compatible(compat))
        .ok_or_else(|| PwmdError::NoDevice(compat.to_string()))?;
    trace!("{compat} matched {} at {:?}", device.name, device.of_node);
    Ok(device)
}
