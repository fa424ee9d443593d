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

//! Mapping of register windows into the daemon's address space.
//!
//! A [`RegisterMapper`] turns a physical [`RegisterWindow`] into a [`MappedRegister`]
//! and later releases it. Two backends exist:
//! - [`DevMemMapper`] maps the real window through `/dev/mem`
//! - [`SimulatedMapper`] backs the window with heap memory and records every call

use crate::error::PwmdError;
use crate::platforms::platform::RegisterWindow;
use log::{error, info, trace};
use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap};
use std::ffi::c_void;
use std::fs::OpenOptions;
use std::num::NonZeroUsize;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::ptr::{self, NonNull};
use std::sync::{Mutex, PoisonError};

/// Width of the duty cycle register in bytes.
pub const REGISTER_BYTES: u64 = 4;

/// The process-addressable view of a register window.
///
/// Only the mapper that produced it may release it, through [`RegisterMapper::unmap`].
/// Dropping it without doing so leaks the mapping.
#[derive(Debug)]
pub struct MappedRegister {
    window: RegisterWindow,
    mapping: NonNull<c_void>,
    mapping_len: usize,
    register: NonNull<u32>,
}

// The mapping is plain memory owned by this handle; access is serialised by the owner.
unsafe impl Send for MappedRegister {}

impl MappedRegister {
    /// Wrap a live mapping.
    ///
    /// # Safety
    ///
    /// `mapping` must be valid for reads and writes of `mapping_len` bytes until it is
    /// handed back to the mapper, and `mapping + offset` must be a 4-byte aligned
    /// address with at least [`REGISTER_BYTES`] bytes left in the mapping.
    pub unsafe fn from_raw_parts(
        window: RegisterWindow,
        mapping: NonNull<c_void>,
        mapping_len: usize,
        offset: usize,
    ) -> Self {
        // SAFETY: the caller guarantees offset stays within the mapping.
        let register = unsafe { mapping.cast::<u8>().add(offset).cast::<u32>() };
        MappedRegister {
            window,
            mapping,
            mapping_len,
            register,
        }
    }

    pub fn window(&self) -> RegisterWindow {
        self.window
    }

    /// The whole mapping as handed out by the mapper: base address and length.
    pub fn mapping(&self) -> (NonNull<c_void>, usize) {
        (self.mapping, self.mapping_len)
    }

    /// Address of the duty cycle register, for diagnostics.
    pub fn as_ptr(&self) -> *const u32 {
        self.register.as_ptr()
    }

    pub fn write(&self, value: u32) {
        // SAFETY: valid and aligned per from_raw_parts.
        unsafe { ptr::write_volatile(self.register.as_ptr(), value) }
    }

    pub fn read(&self) -> u32 {
        // SAFETY: valid and aligned per from_raw_parts.
        unsafe { ptr::read_volatile(self.register.as_ptr()) }
    }
}

/// Maps and unmaps register windows.
pub trait RegisterMapper: Send + Sync {
    /// Map `window` into the process.
    ///
    /// # Returns: `Result<MappedRegister, PwmdError>`
    /// * `Ok(MappedRegister)` - The mapped register, owned by the caller
    /// * `Err(PwmdError::MapFailed)` - The window cannot be mapped
    fn map(&self, window: &RegisterWindow) -> Result<MappedRegister, PwmdError>;

    /// Release a register previously returned by [`RegisterMapper::map`] on this mapper.
    fn unmap(&self, register: MappedRegister);
}

fn check_window(window: &RegisterWindow) -> Result<(), PwmdError> {
    if window.len < REGISTER_BYTES {
        return Err(PwmdError::MapFailed {
            start: window.start,
            reason: format!(
                "window of {} bytes cannot hold a {REGISTER_BYTES} byte register",
                window.len
            ),
        });
    }
    if window.start % REGISTER_BYTES != 0 {
        return Err(PwmdError::MapFailed {
            start: window.start,
            reason: "register is not 32-bit aligned".to_string(),
        });
    }
    Ok(())
}

fn page_size() -> u64 {
    // SAFETY: sysconf has no preconditions.
    match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
        n if n > 0 => n as u64,
        _ => 4096,
    }
}

/// Maps physical memory through a memory character device, normally `/dev/mem`.
#[derive(Debug)]
pub struct DevMemMapper {
    mem_device: PathBuf,
}

impl DevMemMapper {
    pub fn new(mem_device: impl Into<PathBuf>) -> Self {
        DevMemMapper {
            mem_device: mem_device.into(),
        }
    }
}

impl RegisterMapper for DevMemMapper {
    fn map(&self, window: &RegisterWindow) -> Result<MappedRegister, PwmdError> {
        check_window(window)?;
        let map_failed = |reason: String| PwmdError::MapFailed {
            start: window.start,
            reason,
        };

        trace!("Opening {:?} to map {window}", self.mem_device);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&self.mem_device)
            .map_err(|e| map_failed(format!("cannot open {:?}: {e}", self.mem_device)))?;

        // only the register at offset 0 is accessed, the rest of the window stays unmapped
        let page_offset = window.start % page_size();
        let aligned_base = window.start - page_offset;
        let length = page_offset
            .checked_add(REGISTER_BYTES)
            .and_then(|len| usize::try_from(len).ok())
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| map_failed(format!("page offset {page_offset:#x} does not fit")))?;
        let offset = libc::off_t::try_from(aligned_base)
            .map_err(|_| map_failed(format!("{aligned_base:#x} is not a valid file offset")))?;

        // SAFETY: a fresh shared mapping, nothing else in the process aliases it.
        let mapping = unsafe {
            mmap(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &file,
                offset,
            )
        }
        .map_err(|e| map_failed(format!("mmap failed: {e}")))?;

        // SAFETY: the mapping covers page_offset + REGISTER_BYTES bytes, and check_window
        // guarantees the register is aligned.
        Ok(unsafe {
            MappedRegister::from_raw_parts(*window, mapping, length.get(), page_offset as usize)
        })
    }

    fn unmap(&self, register: MappedRegister) {
        let (mapping, len) = register.mapping();
        // SAFETY: the mapping came from mmap in map() and is released exactly once here.
        if let Err(e) = unsafe { munmap(mapping, len) } {
            error!("munmap failed for {}: {e}", register.window());
        }
    }
}

/// A map or unmap call seen by a [`SimulatedMapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    Mapped { window: RegisterWindow, base: usize },
    Unmapped { window: RegisterWindow, base: usize },
}

/// Backs register windows with zeroed heap memory.
///
/// Used when no hardware is present, and to check that every mapping handed out is
/// released exactly once. Windows at refused start addresses fail to map as if they
/// were already claimed elsewhere.
#[derive(Debug, Default)]
pub struct SimulatedMapper {
    events: Mutex<Vec<MapEvent>>,
    refused: Mutex<Vec<u64>>,
}

impl SimulatedMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later map of a window starting at `start` fail.
    pub fn refuse(&self, start: u64) {
        self.refused
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(start);
    }

    /// Every map and unmap so far, oldest first.
    pub fn events(&self) -> Vec<MapEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of mappings handed out and not yet released.
    pub fn live_mappings(&self) -> usize {
        self.events().iter().fold(0, |live, event| match event {
            MapEvent::Mapped { .. } => live + 1,
            MapEvent::Unmapped { .. } => live - 1,
        })
    }

    fn record(&self, event: MapEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl RegisterMapper for SimulatedMapper {
    fn map(&self, window: &RegisterWindow) -> Result<MappedRegister, PwmdError> {
        check_window(window)?;
        if self
            .refused
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&window.start)
        {
            return Err(PwmdError::MapFailed {
                start: window.start,
                reason: "window is already mapped elsewhere".to_string(),
            });
        }
        // the register lives at offset 0, one word is enough to back it
        let words: Box<[u32]> = vec![0u32; 1].into_boxed_slice();
        let len = words.len() * size_of::<u32>();
        let base = NonNull::from(Box::leak(words)).cast::<c_void>();
        self.record(MapEvent::Mapped {
            window: *window,
            base: base.as_ptr() as usize,
        });
        info!("Simulating {window} at {base:p}");
        // SAFETY: base owns len bytes of leaked, aligned u32 memory until unmap.
        Ok(unsafe { MappedRegister::from_raw_parts(*window, base, len, 0) })
    }

    fn unmap(&self, register: MappedRegister) {
        let (base, len) = register.mapping();
        self.record(MapEvent::Unmapped {
            window: register.window(),
            base: base.as_ptr() as usize,
        });
        let words = ptr::slice_from_raw_parts_mut(base.cast::<u32>().as_ptr(), len / size_of::<u32>());
        // SAFETY: produced by Box::leak in map() with the same length, released once.
        drop(unsafe { Box::from_raw(words) });
    }
}
