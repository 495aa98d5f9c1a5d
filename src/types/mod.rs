// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validated value types used by printer commands.
//!
//! Every type here can only be constructed from an in-range value, so a
//! [`CommandRequest`](crate::command::CommandRequest) holding one is always
//! renderable.

mod fan_speed;
mod light;
mod speed_tier;
mod temperature;

pub use fan_speed::FanSpeed;
pub use light::{ChamberLightMode, LightNode, WorkLightMode};
pub use speed_tier::PrintSpeedTier;
pub use temperature::{BedTemperature, NozzleTemperature};
