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

use log::error;
use std::path::PathBuf;
use zbus::fdo;

#[derive(Debug, thiserror::Error)]
pub enum PwmdError {
    #[error("PwmdError::NoDevice: No platform device is compatible with {0:?}")]
    NoDevice(String),
    #[error("PwmdError::ResourceMissing: {device} has no IO memory resource")]
    ResourceMissing { device: String },
    #[error("PwmdError::MapFailed: Could not remap memory at {start:#x}: {reason}")]
    MapFailed { start: u64, reason: String },
    #[error("PwmdError::AlreadyBound: The register window {0} is already bound")]
    AlreadyBound(String),
    #[error("PwmdError::NotBound: No register window is bound")]
    NotBound,
    #[error(
        "PwmdError::TransferIncomplete: Not all the bytes have been copied {direction}: \
        {copied} of {requested}"
    )]
    TransferIncomplete {
        direction: &'static str,
        copied: usize,
        requested: usize,
    },
    #[error("PwmdError::NodeRegion: Cannot allocate a node region for {0}")]
    NodeRegion(String),
    #[error("PwmdError::NodeCreate: Cannot create the device node {node}: {reason}")]
    NodeCreate { node: String, reason: String },
    #[error("PwmdError::IORead: An IO error occurred when reading from {file:?}: {e}")]
    IORead { file: PathBuf, e: std::io::Error },
    #[error("PwmdError::IOReadDir: An IO error occurred when reading directory {dir:?}: {e}")]
    IOReadDir { dir: PathBuf, e: std::io::Error },
    #[error("PwmdError::Config: Failed to parse {file:?}: {e}")]
    Config { file: PathBuf, e: toml::de::Error },
    #[error("PwmdError::Internal: An Internal error occurred: {0}")]
    Internal(String),
}

impl From<PwmdError> for fdo::Error {
    fn from(err: PwmdError) -> Self {
        error!("{err}");
        match err {
            PwmdError::IORead { .. } => fdo::Error::IOError(err.to_string()),
            PwmdError::IOReadDir { .. } => fdo::Error::IOError(err.to_string()),
            PwmdError::MapFailed { .. } => fdo::Error::IOError(err.to_string()),
            _ => fdo::Error::Failed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    fn map_failure_maps_to_io_error() {
        let err: fdo::Error = PwmdError::MapFailed {
            start: 0x43c0_0000,
            reason: "busy".into(),
        }
        .into();
        assert!(matches!(err, fdo::Error::IOError(_)));
        expect_that!(err.to_string(), contains_substring("0x43c00000"));
    }

    #[gtest]
    fn binding_errors_map_to_failed() {
        let err: fdo::Error = PwmdError::NotBound.into();
        assert!(matches!(err, fdo::Error::Failed(_)));
        expect_that!(err.to_string(), contains_substring("PwmdError::NotBound"));
    }
}
