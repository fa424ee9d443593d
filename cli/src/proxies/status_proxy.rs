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

use zbus::{Result, proxy};
#[proxy(
    default_service = "com.canonical.pwmd",
    interface = "com.canonical.pwmd.status",
    default_path = "/com/canonical/pwmd/status"
)]
pub trait Status {
    async fn get_binding_state(&self) -> Result<String>;
    async fn get_register_window(&self) -> Result<String>;
    async fn get_duty_cycle(&self) -> Result<u32>;
    async fn get_node(&self) -> Result<String>;
}
