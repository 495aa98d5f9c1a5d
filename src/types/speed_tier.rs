// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Print speed profile.

use std::fmt;

use crate::error::ValueError;

/// One of the four print speed profiles (1-4).
///
/// | Tier | Profile | Speed |
/// |------|---------|-------|
/// | 1 | Silent | 50% |
/// | 2 | Standard | 100% |
/// | 3 | Sport | 124% |
/// | 4 | Ludicrous | 166% |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrintSpeedTier(u8);

impl PrintSpeedTier {
    /// Silent profile.
    pub const SILENT: Self = Self(1);
    /// Standard profile.
    pub const STANDARD: Self = Self(2);
    /// Sport profile.
    pub const SPORT: Self = Self(3);
    /// Ludicrous profile.
    pub const LUDICROUS: Self = Self(4);

    /// Creates a speed tier.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `tier` is outside [1, 4].
    pub fn new(tier: i64) -> Result<Self, ValueError> {
        match u8::try_from(tier) {
            Ok(t @ 1..=4) => Ok(Self(t)),
            _ => Err(ValueError::OutOfRange {
                field: "tier",
                min: 1,
                max: 4,
                actual: tier,
            }),
        }
    }

    /// Returns the tier number.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns the profile name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self.0 {
            1 => "silent",
            2 => "standard",
            3 => "sport",
            _ => "ludicrous",
        }
    }
}

impl Default for PrintSpeedTier {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl fmt::Display for PrintSpeedTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
