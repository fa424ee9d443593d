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

//! Error wrapping file system read helpers.
//!
//! Thin wrappers around the standard library which convert failures into
//! [`PwmdError`] values carrying the offending path, and trace every access.
//! The device tree walker and the config loader read everything through here.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use pwmd::system_io::{fs_read, fs_read_bytes};
//! # use std::path::Path;
//! # fn example() -> Result<(), pwmd::error::PwmdError> {
//! let model = fs_read(Path::new("/proc/device-tree/model"))?;
//! let reg = fs_read_bytes(Path::new("/proc/device-tree/amba_pl/pwm@43c00000/reg"))?;
//! # Ok(())
//! # }
//! ```

use crate::error::PwmdError;
use log::trace;
use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;

/// Read the contents of a file to a String.
///
/// # Returns: `Result<String, PwmdError>`
/// * `Ok(String)` - The complete contents of the file
/// * `Err(PwmdError::IORead)` - If the file cannot be read or is not valid UTF-8
pub fn fs_read(file_path: &Path) -> Result<String, PwmdError> {
    trace!("Attempting to read from {file_path:?}");
    let mut buf: String = String::new();
    let result = OpenOptions::new()
        .read(true)
        .open(file_path)
        .and_then(|mut f| f.read_to_string(&mut buf));

    match result {
        Ok(_) => {
            trace!("Reading done");
            Ok(buf)
        }
        Err(e) => Err(PwmdError::IORead {
            file: file_path.into(),
            e,
        }),
    }
}

/// Read the raw contents of a file.
///
/// Device tree properties are binary blobs (big-endian cells, NUL separated string
/// lists), so most of the firmware description is read with this rather than [`fs_read`].
///
/// # Returns: `Result<Vec<u8>, PwmdError>`
/// * `Ok(Vec<u8>)` - The complete contents of the file
/// * `Err(PwmdError::IORead)` - If the file cannot be read
pub fn fs_read_bytes(file_path: &Path) -> Result<Vec<u8>, PwmdError> {
    trace!("Attempting to read bytes from {file_path:?}");
    let mut buf: Vec<u8> = Vec::new();
    let result = OpenOptions::new()
        .read(true)
        .open(file_path)
        .and_then(|mut f| f.read_to_end(&mut buf));

    match result {
        Ok(n) => {
            trace!("Read {n} bytes");
            Ok(buf)
        }
        Err(e) => Err(PwmdError::IORead {
            file: file_path.into(),
            e,
        }),
    }
}

/// Read the contents of a directory and return entry names.
///
/// Entries that cannot be read are silently skipped. The names are sorted so that
/// walks over the device tree are deterministic.
///
/// # Returns: `Result<Vec<String>, PwmdError>`
/// * `Ok(Vec<String>)` - Entry names in the directory (files and subdirectories)
/// * `Err(PwmdError::IOReadDir)` - If the directory cannot be read
pub fn fs_read_dir(dir: &Path) -> Result<Vec<String>, PwmdError> {
    trace!("Attempting to read directory '{dir:?}'");
    std::fs::read_dir(dir).map_or_else(
        |e| {
            Err(PwmdError::IOReadDir {
                dir: dir.to_owned(),
                e,
            })
        },
        |iter| {
            let mut ret: Vec<String> = iter
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            ret.sort();
            trace!("Dir reading done.");
            Ok(ret)
        },
    )
}
