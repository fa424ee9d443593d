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

//! pwmd - register driver for the PWM custom IP core of Zynq FPGA boards.
//!
//! The library holds everything the `pwmd` daemon is made of, so that each layer can be
//! driven on its own, with or without hardware:
//! - [`platforms`] discovers the PWM core in the device tree
//! - [`binding`] maps its register window and owns the mapping
//! - [`codec`] translates ASCII duty cycle commands and register values
//! - [`channel`] is the file-like command channel of the device node
//! - [`node`] gives the node its identity and defines how it is published
//! - [`driver`] ties the above together into load and unload
//! - [`comm`] serves the node and the driver status over D-Bus

pub mod binding;
pub mod channel;
pub mod codec;
pub mod comm;
pub mod config;
pub mod driver;
pub mod error;
pub mod node;
pub mod platforms;
pub mod system_io;
