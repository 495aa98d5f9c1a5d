// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light control modes.
//!
//! The printer exposes two LED nodes. The chamber light only switches on and
//! off; the work light can also flash.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// A controllable LED node on the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightNode {
    /// The chamber illumination.
    Chamber,
    /// The toolhead work light.
    Work,
}

impl LightNode {
    /// Returns the `led_node` value used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chamber => "chamber_light",
            Self::Work => "work_light",
        }
    }
}

impl fmt::Display for LightNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode for the chamber light.
///
/// # Examples
///
/// ```
/// use printwatch::types::ChamberLightMode;
///
/// let mode: ChamberLightMode = "on".parse().unwrap();
/// assert_eq!(mode, ChamberLightMode::On);
/// assert!("flashing".parse::<ChamberLightMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChamberLightMode {
    /// Light on.
    On,
    /// Light off.
    Off,
}

impl ChamberLightMode {
    /// Returns the `led_mode` value used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl FromStr for ChamberLightMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            _ => Err(ValueError::InvalidLightMode {
                node: LightNode::Chamber.as_str(),
                mode: s.to_string(),
            }),
        }
    }
}

/// Mode for the work light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkLightMode {
    /// Light on.
    On,
    /// Light off.
    Off,
    /// Light blinking for a few cycles.
    Flashing,
}

impl WorkLightMode {
    /// Returns the `led_mode` value used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Flashing => "flashing",
        }
    }

    /// Returns the `loop_times` value: 3 cycles when flashing, 1 otherwise.
    #[must_use]
    pub const fn loop_times(&self) -> u32 {
        match self {
            Self::Flashing => 3,
            Self::On | Self::Off => 1,
        }
    }
}

impl FromStr for WorkLightMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "flashing" => Ok(Self::Flashing),
            _ => Err(ValueError::InvalidLightMode {
                node: LightNode::Work.as_str(),
                mode: s.to_string(),
            }),
        }
    }
}
