// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heater target temperatures.

use std::fmt;

use crate::error::ValueError;

macro_rules! bounded_temperature {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u16);

        impl $name {
            /// Maximum accepted target in degrees Celsius.
            pub const MAX: u16 = $max;

            /// Creates a target temperature in degrees Celsius.
            ///
            /// # Errors
            ///
            /// Returns `ValueError::OutOfRange` if the value is negative or
            /// above [`Self::MAX`].
            pub fn new(celsius: i64) -> Result<Self, ValueError> {
                match u16::try_from(celsius) {
                    Ok(c) if c <= Self::MAX => Ok(Self(c)),
                    _ => Err(ValueError::OutOfRange {
                        field: $field,
                        min: 0,
                        max: i64::from(Self::MAX),
                        actual: celsius,
                    }),
                }
            }

            /// Creates a target from a possibly fractional value, rounded to
            /// the nearest whole degree.
            ///
            /// # Errors
            ///
            /// Returns `ValueError::OutOfRange` if the rounded value is
            /// outside `[0, MAX]`, or `ValueError::InvalidParameter` if it
            /// is not finite.
            #[allow(clippy::cast_possible_truncation)]
            pub fn from_f64(celsius: f64) -> Result<Self, ValueError> {
                if !celsius.is_finite() {
                    return Err(ValueError::InvalidParameter {
                        name: $field,
                        expected: "a finite number",
                        found: celsius.to_string(),
                    });
                }
                // Saturating cast.
                Self::new(celsius.round() as i64)
            }

            /// Returns the target in degrees Celsius.
            #[must_use]
            pub const fn celsius(&self) -> u16 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}°C", self.0)
            }
        }
    };
}

bounded_temperature!(
    /// Nozzle target temperature (0-300 °C). Zero turns the heater off.
    NozzleTemperature,
    "nozzle_temp",
    300
);

bounded_temperature!(
    /// Heated bed target temperature (0-120 °C). Zero turns the heater off.
    BedTemperature,
    "bed_temp",
    120
);
