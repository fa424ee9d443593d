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

//! Ownership of the PWM core's register window.
//!
//! The [`BindingManager`] is the only holder of the [`MappedRegister`]. It maps the first
//! memory resource of a probed device on [`BindingManager::bind`] and hands the mapping back
//! to its [`RegisterMapper`] exactly once, either on [`BindingManager::unbind`] or when it is
//! dropped while still bound. Every register access goes through the manager's lock.

pub mod mapper;

use crate::binding::mapper::{MappedRegister, RegisterMapper};
use crate::error::PwmdError;
use crate::platforms::platform::{PlatformDevice, RegisterWindow};
use log::{error, info, trace};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    Bound,
}

impl fmt::Display for BindingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingState::Unbound => write!(f, "unbound"),
            BindingState::Bound => write!(f, "bound"),
        }
    }
}

pub struct BindingManager {
    mapper: Arc<dyn RegisterMapper>,
    register: Mutex<Option<MappedRegister>>,
}

impl fmt::Debug for BindingManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingManager")
            .field("register", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl BindingManager {
    pub fn new(mapper: Arc<dyn RegisterMapper>) -> Self {
        BindingManager {
            mapper,
            register: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<MappedRegister>> {
        // a panic mid-access cannot leave the handle half-written
        self.register.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Map the first memory resource of `device` and take ownership of it.
    ///
    /// # Returns: `Result<RegisterWindow, PwmdError>`
    /// * `Ok(RegisterWindow)` - The window now mapped
    /// * `Err(PwmdError::AlreadyBound)` - A window is already held by this manager
    /// * `Err(PwmdError::ResourceMissing)` - `device` has no memory resource
    /// * `Err(PwmdError::MapFailed)` - The mapper could not map the window
    pub fn bind(&self, device: &PlatformDevice) -> Result<RegisterWindow, PwmdError> {
        info!("Device Tree Probing: {}", device.name);
        let mut register = self.lock();
        if let Some(held) = register.as_ref() {
            return Err(PwmdError::AlreadyBound(held.window().to_string()));
        }
        let window = device
            .mem_resource(0)
            .ok_or_else(|| PwmdError::ResourceMissing {
                device: device.name.clone(),
            })?;
        let mapped = self.mapper.map(&window)?;
        info!(
            "{} at {:#x} (end {:#x}) mapped at {:p}",
            device.name,
            window.start,
            window.end(),
            mapped.as_ptr()
        );
        *register = Some(mapped);
        Ok(window)
    }

    /// Release the mapping. Calling this while unbound is a caller bug: it is logged and
    /// nothing else happens.
    pub fn unbind(&self) {
        match self.lock().take() {
            Some(mapped) => {
                let window = mapped.window();
                self.mapper.unmap(mapped);
                info!("Released register window {window}");
            }
            None => error!("unbind called without a bound register window"),
        }
    }

    pub fn state(&self) -> BindingState {
        match *self.lock() {
            Some(_) => BindingState::Bound,
            None => BindingState::Unbound,
        }
    }

    /// The bound window, if any.
    pub fn window(&self) -> Option<RegisterWindow> {
        self.lock().as_ref().map(MappedRegister::window)
    }

    pub fn write_register(&self, value: u32) -> Result<(), PwmdError> {
        let register = self.lock();
        let mapped = register.as_ref().ok_or(PwmdError::NotBound)?;
        trace!("Writing {value} to the duty cycle register at {:p}", mapped.as_ptr());
        mapped.write(value);
        Ok(())
    }

    pub fn read_register(&self) -> Result<u32, PwmdError> {
        let register = self.lock();
        let mapped = register.as_ref().ok_or(PwmdError::NotBound)?;
        let value = mapped.read();
        trace!("Read {value} from the duty cycle register at {:p}", mapped.as_ptr());
        Ok(value)
    }
}

impl Drop for BindingManager {
    fn drop(&mut self) {
        let mapped = self
            .register
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mapped) = mapped {
            trace!("Dropping a bound manager, releasing {}", mapped.window());
            self.mapper.unmap(mapped);
        }
    }
}
