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

//! The file-like command channel of the PWM device node.
//!
//! Callers [`open`](CommandChannel::open) the channel, [`write`](CommandChannel::write) an
//! ASCII duty cycle such as `"0750"` and may [`read`](CommandChannel::read) back a one byte
//! status. Writes are decoded with [`decode_duty`] and stored in the duty cycle register held
//! by the [`BindingManager`]; reads report [`encode_status`] of the register's current value.
//!
//! The register receives the fully decoded duty value, so writing `"0750XYZ"` stores `750`
//! rather than the code of the first character.

use crate::binding::BindingManager;
use crate::codec::{decode_duty, encode_status};
use crate::error::PwmdError;
use log::{info, trace, warn};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Size of the scratch buffer a single write is copied into.
pub const COMMAND_BUFFER_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Open,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Closed => write!(f, "closed"),
            ChannelState::Open => write!(f, "open"),
        }
    }
}

#[derive(Debug)]
pub struct CommandChannel {
    binding: Arc<BindingManager>,
    buffer: Mutex<[u8; COMMAND_BUFFER_LEN]>,
    opens: AtomicUsize,
}

impl CommandChannel {
    pub fn new(binding: Arc<BindingManager>) -> Self {
        CommandChannel {
            binding,
            buffer: Mutex::new([0; COMMAND_BUFFER_LEN]),
            opens: AtomicUsize::new(0),
        }
    }

    pub fn binding(&self) -> &Arc<BindingManager> {
        &self.binding
    }

    pub fn open(&self) {
        let opens = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Device File Opened...!!! ({opens} open)");
    }

    /// Closing a channel that is not open is logged and ignored.
    pub fn close(&self) {
        let closed = self
            .opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match closed {
            Ok(previous) => info!("Device File Closed...!!! ({} open)", previous - 1),
            Err(_) => warn!("Device File Closed while not open"),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ChannelState {
        match self.open_count() {
            0 => ChannelState::Closed,
            _ => ChannelState::Open,
        }
    }

    /// Apply a duty cycle command.
    ///
    /// Up to `length` bytes of `src`, capped at [`COMMAND_BUFFER_LEN`], are copied into the
    /// cleared command buffer, decoded and written to the duty cycle register. A short copy
    /// is logged as [`PwmdError::TransferIncomplete`] and the command is applied with what
    /// was copied.
    ///
    /// # Returns: `Result<usize, PwmdError>`
    /// * `Ok(usize)` - Always `length`, whatever was actually copied
    /// * `Err(PwmdError::NotBound)` - There is no register to write to
    pub fn write(&self, src: &[u8], length: usize) -> Result<usize, PwmdError> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.fill(0);

        if length > COMMAND_BUFFER_LEN {
            warn!(
                "Command of {length} bytes truncated to {COMMAND_BUFFER_LEN}, {} bytes ignored",
                length - COMMAND_BUFFER_LEN
            );
        }
        let wanted = length.min(COMMAND_BUFFER_LEN);
        let copied = wanted.min(src.len());
        buffer[..copied].copy_from_slice(&src[..copied]);
        if copied < wanted {
            warn!(
                "{}",
                PwmdError::TransferIncomplete {
                    direction: "from user",
                    copied,
                    requested: wanted,
                }
            );
        }

        let duty = decode_duty(&buffer[..]);
        trace!("Decoded {:?} as duty {duty}", &buffer[..copied]);
        self.binding.write_register(duty)?;
        info!("Data Write : Done!");
        Ok(length)
    }

    /// Report the duty cycle status.
    ///
    /// Exactly one byte is produced, the status of the register's current value. It is
    /// copied to `dst[0]` when `dst` has room, otherwise the incomplete transfer is logged.
    /// `length` does not change what is reported.
    ///
    /// # Returns: `Result<usize, PwmdError>`
    /// * `Ok(1)` - The number of bytes reported
    /// * `Err(PwmdError::NotBound)` - There is no register to read from
    pub fn read(&self, dst: &mut [u8], length: usize) -> Result<usize, PwmdError> {
        let raw = self.binding.read_register()?;
        let status = encode_status(raw);
        trace!("Read of {length} bytes, register {raw} reports status {status}");
        match dst.first_mut() {
            Some(byte) => *byte = status,
            None => warn!(
                "{}",
                PwmdError::TransferIncomplete {
                    direction: "to user",
                    copied: 0,
                    requested: 1,
                }
            ),
        }
        info!("Data Read : Done!");
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::mapper::SimulatedMapper;
    use crate::platforms::platform::{PlatformDevice, RegisterWindow};
    use googletest::prelude::*;
    use rstest::*;
    use std::path::PathBuf;

    #[fixture]
    fn channel() -> CommandChannel {
        let binding = BindingManager::new(Arc::new(SimulatedMapper::new()));
        binding
            .bind(&PlatformDevice {
                name: "my_pwm_ip_c2@43c00000".into(),
                of_node: PathBuf::new(),
                compatible: vec!["xlnx,my-pwm-ip-c2-1.0".into()],
                mem_resources: vec![RegisterWindow::new(0x43c0_0000, 0x1_0000)],
            })
            .expect("bind failed");
        CommandChannel::new(Arc::new(binding))
    }

    #[gtest]
    #[rstest]
    fn write_returns_requested_length(channel: CommandChannel) {
        let command = b"0750XYZabc";
        for length in 0..=COMMAND_BUFFER_LEN {
            expect_that!(channel.write(command, length), ok(eq(&length)));
        }
    }

    /// The register holds the decoded duty, not the first byte of the command.
    #[gtest]
    #[rstest]
    fn open_write_close_stores_decoded_duty(channel: CommandChannel) {
        channel.open();
        expect_that!(channel.state(), eq(ChannelState::Open));

        assert_that!(channel.write(b"0750XYZ", 7), ok(eq(&7)));
        expect_that!(channel.binding().read_register(), ok(eq(&750)));

        channel.close();
        expect_that!(channel.state(), eq(ChannelState::Closed));
    }

    #[gtest]
    #[rstest]
    #[case::full(b"1234", 4, 1234)]
    #[case::partial_length(b"1234", 2, 1200)]
    #[case::short_source(b"12", 4, 1200)]
    #[case::nothing(b"", 0, 0)]
    #[case::oversized(b"98765432109876", 14, 9876)]
    fn write_decodes_what_was_copied(
        channel: CommandChannel,
        #[case] src: &[u8],
        #[case] length: usize,
        #[case] expected: u32,
    ) {
        assert_that!(channel.write(src, length), ok(eq(&length)));
        expect_that!(channel.binding().read_register(), ok(eq(&expected)));
    }

    #[gtest]
    #[rstest]
    fn write_clears_previous_command(channel: CommandChannel) {
        channel.write(b"9999", 4).expect("write failed");
        channel.write(b"5", 1).expect("write failed");
        expect_that!(channel.binding().read_register(), ok(eq(&5000)));
    }

    #[gtest]
    #[rstest]
    #[case::zero(b"0000", 0)]
    #[case::half(b"5000", 50)]
    #[case::full(b"9999", 100)]
    fn read_reports_one_status_byte(
        channel: CommandChannel,
        #[case] command: &[u8],
        #[case] status: u8,
    ) {
        channel.write(command, command.len()).expect("write failed");
        let mut dst = [0xffu8; 4];
        let len = dst.len();
        assert_that!(channel.read(&mut dst, len), ok(eq(&1)));
        expect_that!(dst.to_vec(), elements_are![eq(&status), eq(&0xff), eq(&0xff), eq(&0xff)]);
    }

    #[gtest]
    #[rstest]
    fn read_into_empty_buffer_still_reports_one(channel: CommandChannel) {
        assert_that!(channel.read(&mut [], 1), ok(eq(&1)));
    }

    #[gtest]
    #[rstest]
    fn open_and_close_are_counted(channel: CommandChannel) {
        channel.open();
        channel.open();
        channel.close();
        expect_that!(channel.open_count(), eq(1));
        expect_that!(channel.state(), eq(ChannelState::Open));
        channel.close();
        channel.close();
        expect_that!(channel.open_count(), eq(0));
        expect_that!(channel.state(), eq(ChannelState::Closed));
    }

    #[gtest]
    fn unbound_channel_reports_not_bound() {
        let channel = CommandChannel::new(Arc::new(BindingManager::new(Arc::new(
            SimulatedMapper::new(),
        ))));
        assert_that!(
            channel.write(b"0750", 4),
            err(displays_as(starts_with("PwmdError::NotBound")))
        );
        assert_that!(
            channel.read(&mut [0u8; 1], 1),
            err(displays_as(starts_with("PwmdError::NotBound")))
        );
    }
}
