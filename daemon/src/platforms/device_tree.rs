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

//! A [`PlatformBus`] backed by the kernel's view of the flattened device tree.
//!
//! Every directory below the device tree root is a node and every file a property.
//! Below is the part of a Zynq-7000 tree this bus cares about:
//! ```text
//! /proc/device-tree
//! ├── #address-cells
//! ├── #size-cells
//! └── amba_pl@0
//!     ├── #address-cells          <- 00 00 00 01
//!     ├── #size-cells             <- 00 00 00 01
//!     ├── compatible              <- "simple-bus\0"
//!     └── my_pwm_ip_c2@43c00000
//!         ├── compatible          <- "xlnx,my-pwm-ip-c2-1.0\0"
//!         ├── name
//!         └── reg                 <- 43 c0 00 00 00 01 00 00
//! ```
//! Only nodes with a `compatible` property become devices, and nodes whose `status` is
//! not `okay` are skipped along with their children.
//!
//! `reg` is decoded with the parent's `#address-cells` and `#size-cells`. Bus address
//! translation through `ranges` is not performed; the programmable logic buses on Zynq
//! boards map one to one.

use crate::error::PwmdError;
use crate::platforms::platform::{PlatformBus, PlatformDevice, RegisterWindow};
use crate::system_io::{fs_read_bytes, fs_read_dir};
use log::{trace, warn};
use std::path::{Path, PathBuf};

/// Cell counts a node imposes on the `reg` of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellSizes {
    address: usize,
    size: usize,
}

impl Default for CellSizes {
    /// The values the device tree specification mandates when the properties are absent.
    fn default() -> Self {
        CellSizes {
            address: 2,
            size: 1,
        }
    }
}

#[derive(Debug)]
pub struct DeviceTreeBus {
    root: PathBuf,
}

impl DeviceTreeBus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DeviceTreeBus { root: root.into() }
    }

    fn walk(
        &self,
        node: &Path,
        parent_cells: CellSizes,
        devices: &mut Vec<PlatformDevice>,
    ) -> Result<(), PwmdError> {
        let entries = fs_read_dir(node)?;
        let has = |property: &str| entries.iter().any(|e| e == property);

        if has("status") && !is_okay(&fs_read_bytes(&node.join("status"))?) {
            trace!("Skipping disabled node {node:?}");
            return Ok(());
        }

        if node != self.root && has("compatible") {
            devices.push(self.read_device(node, parent_cells, has("reg"))?);
        }

        let cells = CellSizes {
            address: read_cells(node, "#address-cells", &entries)
                .unwrap_or(CellSizes::default().address),
            size: read_cells(node, "#size-cells", &entries).unwrap_or(CellSizes::default().size),
        };
        for entry in entries.iter() {
            let child = node.join(entry);
            if child.is_dir() {
                self.walk(&child, cells, devices)?;
            }
        }
        Ok(())
    }

    fn read_device(
        &self,
        node: &Path,
        parent_cells: CellSizes,
        has_reg: bool,
    ) -> Result<PlatformDevice, PwmdError> {
        let name = node
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let compatible = parse_string_list(&fs_read_bytes(&node.join("compatible"))?);
        let mem_resources = if has_reg {
            let reg = fs_read_bytes(&node.join("reg"))?;
            parse_reg(&reg, parent_cells).unwrap_or_else(|| {
                warn!(
                    "{name}: ignoring malformed reg of {} bytes for {parent_cells:?}",
                    reg.len()
                );
                Vec::new()
            })
        } else {
            Vec::new()
        };
        trace!("Found {name}: {compatible:?} {mem_resources:?}");
        Ok(PlatformDevice {
            name,
            of_node: node.to_owned(),
            compatible,
            mem_resources,
        })
    }
}

impl PlatformBus for DeviceTreeBus {
    fn devices(&self) -> Result<Vec<PlatformDevice>, PwmdError> {
        let mut devices = Vec::new();
        self.walk(&self.root, CellSizes::default(), &mut devices)?;
        Ok(devices)
    }
}

/// Split a property holding NUL separated strings.
fn parse_string_list(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|&b| b == 0)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

fn is_okay(status: &[u8]) -> bool {
    matches!(parse_string_list(status).first().map(String::as_str), Some("okay" | "ok"))
}

fn read_cells(node: &Path, property: &str, entries: &[String]) -> Option<usize> {
    if !entries.iter().any(|e| e == property) {
        return None;
    }
    match fs_read_bytes(&node.join(property)) {
        Ok(bytes) => match <[u8; 4]>::try_from(bytes.as_slice()) {
            Ok(cell) => Some(u32::from_be_bytes(cell) as usize),
            Err(_) => {
                warn!("{node:?}/{property} is not a single cell, using the default");
                None
            }
        },
        Err(e) => {
            warn!("{e}, using the default");
            None
        }
    }
}

/// Decode a `reg` property into register windows.
///
/// Returns `None` when the property is not a whole number of `(address, size)` tuples or
/// uses more than two cells for either half. Zero sized entries are dropped.
fn parse_reg(reg: &[u8], cells: CellSizes) -> Option<Vec<RegisterWindow>> {
    let tuple_cells = cells.address + cells.size;
    if tuple_cells == 0 || cells.address > 2 || cells.size > 2 {
        return None;
    }
    if reg.len() % (tuple_cells * 4) != 0 {
        return None;
    }
    let words: Vec<u64> = reg
        .chunks_exact(4)
        .map(|c| u64::from(u32::from_be_bytes([c[0], c[1], c[2], c[3]])))
        .collect();
    let combine = |cells: &[u64]| cells.iter().fold(0u64, |acc, &c| (acc << 32) | c);

    Some(
        words
            .chunks_exact(tuple_cells)
            .map(|tuple| {
                let (address, size) = tuple.split_at(cells.address);
                RegisterWindow::new(combine(address), combine(size))
            })
            .filter(|window| window.len > 0)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use rstest::*;
    use std::fs;
    use tempfile::TempDir;

    fn cells(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    fn node(root: &Path, rel: &str, properties: &[(&str, &[u8])]) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).expect("failed to create node");
        for (name, value) in properties {
            fs::write(dir.join(name), value).expect("failed to write property");
        }
    }

    /// A Zynq-7000 style tree with one PWM core and a few distractions, plus a
    /// ZynqMP style bus using two address cells.
    #[fixture]
    fn tree() -> TempDir {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = dir.path();
        node(
            root,
            "",
            &[
                ("#address-cells", &cells(&[1])),
                ("#size-cells", &cells(&[1])),
                ("compatible", b"xlnx,zynq-7000\0"),
            ],
        );
        node(
            root,
            "amba_pl@0",
            &[
                ("#address-cells", &cells(&[1])),
                ("#size-cells", &cells(&[1])),
                ("compatible", b"simple-bus\0"),
            ],
        );
        node(
            root,
            "amba_pl@0/my_pwm_ip_c2@43c00000",
            &[
                ("compatible", b"xlnx,my-pwm-ip-c2-1.0\0"),
                ("reg", &cells(&[0x43c0_0000, 0x1_0000])),
            ],
        );
        node(
            root,
            "amba_pl@0/gpio@41200000",
            &[
                ("compatible", b"xlnx,axi-gpio-2.0\0xlnx,xps-gpio-1.00.a\0"),
                ("reg", &cells(&[0x4120_0000, 0x1_0000])),
                ("status", b"disabled\0"),
            ],
        );
        node(
            root,
            "axi",
            &[
                ("#address-cells", &cells(&[2])),
                ("#size-cells", &cells(&[2])),
                ("compatible", b"simple-bus\0"),
            ],
        );
        node(
            root,
            "axi/pwm@a0000000",
            &[
                ("compatible", b"xlnx,my-pwm-ip-c2-1.0\0"),
                ("reg", &cells(&[0, 0xa000_0000, 0, 0x1000])),
                ("status", b"okay\0"),
            ],
        );
        node(root, "chosen", &[("bootargs", b"console=ttyPS0\0")]);
        dir
    }

    #[gtest]
    #[rstest]
    fn finds_compatible_nodes_only(tree: TempDir) {
        let bus = DeviceTreeBus::new(tree.path());
        let names: Vec<String> = bus
            .devices()
            .expect("failed to walk tree")
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_that!(
            names,
            unordered_elements_are![
                eq("amba_pl@0"),
                eq("my_pwm_ip_c2@43c00000"),
                eq("axi"),
                eq("pwm@a0000000"),
            ]
        );
    }

    #[gtest]
    #[rstest]
    fn decodes_one_cell_reg(tree: TempDir) {
        let bus = DeviceTreeBus::new(tree.path());
        let device = bus
            .devices()
            .expect("failed to walk tree")
            .into_iter()
            .find(|d| d.name == "my_pwm_ip_c2@43c00000")
            .expect("pwm node missing");
        expect_that!(device.compatible, elements_are![eq("xlnx,my-pwm-ip-c2-1.0")]);
        expect_that!(
            device.mem_resource(0),
            some(eq(RegisterWindow::new(0x43c0_0000, 0x1_0000)))
        );
        expect_that!(
            device.of_node,
            eq(&tree.path().join("amba_pl@0/my_pwm_ip_c2@43c00000"))
        );
    }

    #[gtest]
    #[rstest]
    fn decodes_two_cell_reg(tree: TempDir) {
        let bus = DeviceTreeBus::new(tree.path());
        let device = bus
            .devices()
            .expect("failed to walk tree")
            .into_iter()
            .find(|d| d.name == "pwm@a0000000")
            .expect("pwm node missing");
        assert_that!(
            device.mem_resources,
            elements_are![eq(&RegisterWindow::new(0xa000_0000, 0x1000))]
        );
    }

    #[gtest]
    fn missing_root_is_an_error() {
        let bus = DeviceTreeBus::new("/this/dir/does/not/exist");
        assert_that!(bus.devices(), err(displays_as(starts_with("PwmdError::IOReadDir"))));
    }

    #[gtest]
    #[rstest]
    #[case::one_one(&[0x43c0_0000, 0x1_0000], CellSizes { address: 1, size: 1 }, vec![RegisterWindow::new(0x43c0_0000, 0x1_0000)])]
    #[case::two_one(&[0x1, 0x0, 0x100], CellSizes::default(), vec![RegisterWindow::new(0x1_0000_0000, 0x100)])]
    #[case::two_entries(
        &[0x43c0_0000, 0x1000, 0x43c1_0000, 0x1000],
        CellSizes { address: 1, size: 1 },
        vec![RegisterWindow::new(0x43c0_0000, 0x1000), RegisterWindow::new(0x43c1_0000, 0x1000)]
    )]
    #[case::zero_size_dropped(&[0x43c0_0000, 0], CellSizes { address: 1, size: 1 }, vec![])]
    fn should_parse_reg(
        #[case] reg: &[u32],
        #[case] cell_sizes: CellSizes,
        #[case] expected: Vec<RegisterWindow>,
    ) {
        assert_that!(parse_reg(&cells(reg), cell_sizes), some(eq(&expected)));
    }

    #[gtest]
    #[rstest]
    #[case::truncated(&[0x43c0_0000], CellSizes { address: 1, size: 1 })]
    #[case::no_cells(&[0x43c0_0000], CellSizes { address: 0, size: 0 })]
    #[case::three_address_cells(&[0, 0, 0, 1], CellSizes { address: 3, size: 1 })]
    fn should_reject_reg(#[case] reg: &[u32], #[case] cell_sizes: CellSizes) {
        assert_that!(parse_reg(&cells(reg), cell_sizes), none());
    }

    #[gtest]
    fn malformed_reg_leaves_device_without_resource() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        node(
            dir.path(),
            "pwm@43c00000",
            &[
                ("compatible", b"xlnx,my-pwm-ip-c2-1.0\0"),
                ("reg", &[0x43, 0xc0, 0x00]),
            ],
        );
        let devices = DeviceTreeBus::new(dir.path())
            .devices()
            .expect("failed to walk tree");
        assert_that!(devices.len(), eq(1));
        expect_that!(devices[0].mem_resource(0), none());
    }

    #[gtest]
    #[rstest]
    #[case::okay(b"okay\0", true)]
    #[case::ok(b"ok\0", true)]
    #[case::disabled(b"disabled\0", false)]
    #[case::fail(b"fail\0", false)]
    #[case::empty(b"", false)]
    fn status(#[case] value: &[u8], #[case] expected: bool) {
        assert_that!(is_okay(value), eq(expected));
    }
}
