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

//! DBus proxy interfaces for the pwmd daemon.
//!
//! # DBus Service Information
//!
//! - **Service Name**: `com.canonical.pwmd`
//! - **Status Interface**: `com.canonical.pwmd.status` at `/com/canonical/pwmd/status`
//! - **Channel Interface**: `com.canonical.pwmd.channel` at `/com/canonical/pwmd/<node>`
//!
//! The channel has no default path since it lives at the path of the node it belongs to, see
//! [`channel_proxy::channel_path`].

pub mod channel_proxy;
pub mod status_proxy;
