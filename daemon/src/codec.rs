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

//! Duty-cycle text codec.
//!
//! Callers send the duty cycle as four ASCII decimal digits (`"0750"`), and read back a
//! single status byte. Both translations are pure and never fail.

/// Number of leading bytes of a command that carry the duty cycle.
pub const DUTY_DIGITS: usize = 4;

/// Largest duty cycle value four decimal digits can express.
pub const MAX_DUTY: u32 = 9999;

/// Decode the duty cycle from the first [`DUTY_DIGITS`] bytes of `bytes`.
///
/// Every byte outside `'0'..='9'` counts as the digit `0`, and so does every missing
/// byte, so `"12"` decodes the same as `"1200"`. The result is always in `0..=MAX_DUTY`.
///
/// # Examples
///
/// ```
/// use pwmd::codec::decode_duty;
///
/// assert_eq!(decode_duty(b"1234"), 1234);
/// assert_eq!(decode_duty(b"1a34"), 1034);
/// assert_eq!(decode_duty(b"0750XYZ"), 750);
/// ```
pub fn decode_duty(bytes: &[u8]) -> u32 {
    (0..DUTY_DIGITS)
        .map(|i| bytes.get(i).map_or(0, |&b| decode_digit(b)))
        .fold(0, |acc, d| acc * 10 + d)
}

fn decode_digit(byte: u8) -> u32 {
    match byte {
        b'0'..=b'9' => u32::from(byte - b'0'),
        _ => 0,
    }
}

/// Encode a raw duty register value into the one byte status returned by reads.
///
/// The status is the duty cycle as a whole percentage of [`MAX_DUTY`], rounded down.
/// Register values above [`MAX_DUTY`] (which the codec never produces, but the hardware
/// may hold after reset) report as 100.
pub fn encode_status(raw: u32) -> u8 {
    let percent = u64::from(raw.min(MAX_DUTY)) * 100 / u64::from(MAX_DUTY);
    // bounded by 100 above
    percent as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use rstest::*;

    #[gtest]
    #[rstest]
    #[case::all_digits(b"1234", 1234)]
    #[case::leading_zero(b"0750", 750)]
    #[case::max(b"9999", 9999)]
    #[case::zero(b"0000", 0)]
    #[case::letter_in_hundreds(b"1a34", 1034)]
    #[case::all_letters(b"abcd", 0)]
    #[case::just_below_zero(b"/123", 123)]
    #[case::just_above_nine(b":123", 123)]
    #[case::trailing_bytes_ignored(b"0750XYZ", 750)]
    #[case::newline_terminated(b"0042\n", 42)]
    #[case::short_input(b"12", 1200)]
    #[case::empty(b"", 0)]
    #[case::nul_padding(b"5\0\0\0\0\0\0\0\0\0", 5000)]
    fn decodes(#[case] bytes: &[u8], #[case] expected: u32) {
        assert_that!(decode_duty(bytes), eq(expected));
    }

    #[gtest]
    fn decode_is_positional_for_every_digit() {
        for d0 in 0..10u8 {
            for d3 in 0..10u8 {
                let bytes = [b'0' + d0, b'5', b'x', b'0' + d3];
                expect_that!(
                    decode_duty(&bytes),
                    eq(u32::from(d0) * 1000 + 500 + u32::from(d3))
                );
            }
        }
    }

    #[gtest]
    #[rstest]
    #[case::zero(0, 0)]
    #[case::seven_percent(750, 7)]
    #[case::half(5000, 50)]
    #[case::full(MAX_DUTY, 100)]
    #[case::out_of_range(u32::MAX, 100)]
    fn encodes_status(#[case] raw: u32, #[case] expected: u8) {
        assert_that!(encode_status(raw), eq(expected));
    }
}
