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

//! Static names and paths used by the daemon, plus the optional config file override.
//!
//! The hardcoded values are always available. A `[defaults]` section in
//! [`CONFIG_FILE`] may override the filesystem locations and the register backend;
//! if the file is missing or broken the daemon warns and keeps the hardcoded values.

use crate::error::PwmdError;
use crate::system_io::fs_read;
use log::{trace, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The device tree compatible string of the PWM custom IP core this daemon binds to.
pub static PWM_COMPATIBLE: &str = "xlnx,my-pwm-ip-c2-1.0";

/// The flattened device tree as exposed by the kernel. Typically `/proc/device-tree/`,
/// which links to `/sys/firmware/devicetree/base/`.
pub static DEVICE_TREE_DIR: &str = "/proc/device-tree/";

/// The character device giving access to physical memory.
pub static MEM_DEVICE: &str = "/dev/mem";

/// Location of the optional configuration file.
pub static CONFIG_FILE: &str = "/etc/pwmd/config.toml";

/// Name under which the node identity region is allocated.
pub static REGION_NAME: &str = "pwm_Dev";

/// Class the device node is published under.
pub static NODE_CLASS: &str = "pwm_class";

/// Symbolic name of the published device node.
pub static NODE_NAME: &str = "pwm_c2";

pub static DBUS_SERVICE: &str = "com.canonical.pwmd";
pub static DBUS_STATUS_PATH: &str = "/com/canonical/pwmd/status";
/// Device nodes are served below this object path, one child per node name.
pub static DBUS_NODE_PREFIX: &str = "/com/canonical/pwmd";

/// Which [`RegisterMapper`](crate::binding::mapper::RegisterMapper) backs the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterBackend {
    /// Map the physical window through [`MEM_DEVICE`].
    Devmem,
    /// Back the window with heap memory, for development without hardware.
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    pub device_tree_dir: PathBuf,
    pub mem_device: PathBuf,
    pub register_backend: RegisterBackend,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            device_tree_dir: PathBuf::from(DEVICE_TREE_DIR),
            mem_device: PathBuf::from(MEM_DEVICE),
            register_backend: RegisterBackend::Devmem,
        }
    }
}

/// This is the top level struct which holds all sections
#[derive(Debug, Deserialize)]
struct TomlConfig {
    defaults: Option<DefaultsToml>,
}

/// This is the "defaults" struct
#[derive(Debug, Deserialize)]
struct DefaultsToml {
    device_tree_dir: Option<PathBuf>,
    mem_device: Option<PathBuf>,
    register_backend: Option<RegisterBackend>,
}

impl From<DefaultsToml> for SystemConfig {
    fn from(value: DefaultsToml) -> Self {
        trace!("User provided config: {value:?}");
        SystemConfig {
            device_tree_dir: value.device_tree_dir.unwrap_or_else(|| {
                trace!("No device_tree_dir provided. Using hardcoded value.");
                PathBuf::from(DEVICE_TREE_DIR)
            }),
            mem_device: value.mem_device.unwrap_or_else(|| {
                trace!("No mem_device provided. Using hardcoded value.");
                PathBuf::from(MEM_DEVICE)
            }),
            register_backend: value.register_backend.unwrap_or_else(|| {
                trace!("No register_backend provided. Using devmem.");
                RegisterBackend::Devmem
            }),
        }
    }
}

fn parse_config(config_path: &Path, toml_string: &str) -> Result<SystemConfig, PwmdError> {
    let config: TomlConfig = toml::from_str(toml_string).map_err(|e| PwmdError::Config {
        file: config_path.to_owned(),
        e,
    })?;
    match config.defaults {
        Some(defaults_toml) => Ok(defaults_toml.into()),
        None => Err(PwmdError::Internal(
            "config file did not contain a `[defaults]` section.".to_string(),
        )),
    }
}

fn config_from_file(config_path: &Path) -> Result<SystemConfig, PwmdError> {
    if !config_path.is_file() {
        return Err(PwmdError::Internal(format!(
            "Config file not found in {config_path:?}."
        )));
    }
    let toml_string = fs_read(config_path)?;
    parse_config(config_path, &toml_string)
}

/// Load the configuration from `config_path`, falling back to the hardcoded defaults.
pub fn load_system_config(config_path: &Path) -> SystemConfig {
    match config_from_file(config_path) {
        Ok(config) => {
            trace!("Successfully loaded config: {config:?}");
            config
        }
        Err(e) => {
            warn!("Using hardcoded paths because failed to load config: {e}");
            SystemConfig::default()
        }
    }
}
