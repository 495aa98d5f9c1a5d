// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Part cooling fan speed.

use std::fmt;

use crate::error::ValueError;

/// Part cooling fan speed as a percentage (0-100), kept to a tenth of a
/// percent.
///
/// The printer expects an 8-bit PWM value; [`device_value`](Self::device_value)
/// performs the conversion.
///
/// # Examples
///
/// ```
/// use printwatch::types::FanSpeed;
///
/// let full = FanSpeed::new(100).unwrap();
/// assert_eq!(full.device_value(), 255);
///
/// let half = FanSpeed::new(50).unwrap();
/// assert_eq!(half.device_value(), 128);
///
/// let third = FanSpeed::from_f64(33.3).unwrap();
/// assert_eq!(third.device_value(), 85);
///
/// assert!(FanSpeed::new(101).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FanSpeed(u16);

const TENTHS_FULL: u16 = 1000;

impl FanSpeed {
    /// Fan off.
    pub const OFF: Self = Self(0);

    /// Fan at full speed.
    pub const FULL: Self = Self(TENTHS_FULL);

    /// Creates a new fan speed from a whole percentage.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `percent` exceeds 100.
    pub fn new(percent: u8) -> Result<Self, ValueError> {
        if percent > 100 {
            return Err(out_of_range(i64::from(percent)));
        }
        Ok(Self(u16::from(percent) * 10))
    }

    /// Creates a fan speed from an arbitrary integer, as found in request bodies.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `percent` is outside [0, 100].
    pub fn from_i64(percent: i64) -> Result<Self, ValueError> {
        u8::try_from(percent)
            .map_err(|_| out_of_range(percent))
            .and_then(Self::new)
    }

    /// Creates a fan speed from a possibly fractional percentage, rounded to
    /// the nearest tenth.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `percent` is outside [0, 100] or
    /// not finite.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_f64(percent: f64) -> Result<Self, ValueError> {
        if !(0.0..=100.0).contains(&percent) {
            // `actual` stays outside [0, 100].
            let actual = if percent > 100.0 { percent.ceil() } else { percent.floor() };
            return Err(out_of_range(actual as i64));
        }
        // In range: the product lies in [0, 1000].
        Ok(Self((percent * 10.0).round() as u16))
    }

    /// Returns the percentage.
    #[must_use]
    pub fn percent(&self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// Returns the 8-bit value sent to the printer: `round(percent * 2.55)`.
    #[must_use]
    pub fn device_value(&self) -> u8 {
        let scaled = (u32::from(self.0) * 255 + u32::from(TENTHS_FULL / 2)) / u32::from(TENTHS_FULL);
        u8::try_from(scaled).unwrap_or(u8::MAX)
    }
}

fn out_of_range(actual: i64) -> ValueError {
    ValueError::OutOfRange {
        field: "percent",
        min: 0,
        max: 100,
        actual,
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 % 10 {
            0 => write!(f, "{}%", self.0 / 10),
            tenth => write!(f, "{}.{tenth}%", self.0 / 10),
        }
    }
}

impl TryFrom<u8> for FanSpeed {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_value_bounds() {
        assert_eq!(FanSpeed::OFF.device_value(), 0);
        assert_eq!(FanSpeed::FULL.device_value(), 255);
    }

    #[test]
    fn device_value_rounds() {
        // 1 * 2.55 = 2.55 -> 3
        assert_eq!(FanSpeed::new(1).unwrap().device_value(), 3);
        // 40 * 2.55 = 102.0
        assert_eq!(FanSpeed::new(40).unwrap().device_value(), 102);
    }

    #[test]
    fn rejects_above_hundred() {
        let err = FanSpeed::new(101).unwrap_err();
        assert!(matches!(err, ValueError::OutOfRange { actual: 101, .. }));
    }

    #[test]
    fn from_i64_rejects_negative() {
        assert!(FanSpeed::from_i64(-1).is_err());
        assert!(FanSpeed::from_i64(1000).is_err());
        assert_eq!(FanSpeed::from_i64(75).unwrap(), FanSpeed::new(75).unwrap());
    }

    #[test]
    fn fractional_percent_keeps_a_tenth() {
        let fan = FanSpeed::from_f64(33.3).unwrap();
        assert!((fan.percent() - 33.3).abs() < 1e-9);
        // 33.3 * 2.55 = 84.915 -> 85
        assert_eq!(fan.device_value(), 85);
        assert_eq!(FanSpeed::from_f64(100.0).unwrap(), FanSpeed::FULL);
        assert_eq!(FanSpeed::from_f64(0.04).unwrap(), FanSpeed::OFF);
    }

    #[test]
    fn fractional_out_of_range_reports_outside_value() {
        assert!(matches!(
            FanSpeed::from_f64(100.2),
            Err(ValueError::OutOfRange { actual: 101, .. })
        ));
        assert!(matches!(
            FanSpeed::from_f64(-0.5),
            Err(ValueError::OutOfRange { actual: -1, .. })
        ));
        assert!(FanSpeed::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(FanSpeed::new(42).unwrap().to_string(), "42%");
        assert_eq!(FanSpeed::from_f64(12.5).unwrap().to_string(), "12.5%");
    }
}
