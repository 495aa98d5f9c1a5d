// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Printer command definitions and rendering.
//!
//! A [`CommandRequest`] is a validated, closed set of operations. The
//! [`CommandDispatcher`] turns one into wire messages addressed to the
//! device request topic, stamping each with a fresh sequence id.
//!
//! # Available Commands
//!
//! | Request | Wire command | Notes |
//! |---------|--------------|-------|
//! | `RawGcodeLine` | `print/gcode_line` | line must not be blank |
//! | `SetNozzleTemperature` | `print/gcode_line` | `M104 S<c>`, 0-300 °C |
//! | `SetBedTemperature` | `print/gcode_line` | `M140 S<c>`, 0-120 °C |
//! | `SetPartFan` | `print/gcode_line` | `M106 P1 S<0-255>` |
//! | `SetChamberLight` | `system/ledctrl` | on / off |
//! | `SetWorkLight` | `system/ledctrl` | on / off / flashing |
//! | `PauseJob`, `ResumeJob`, `StopJob` | `print/pause` ... | no parameters |
//! | `SetPrintSpeedTier` | `print/print_speed` | tier 1-4 |
//! | `RequestFullStatus` | `pushing/pushall` | |
//! | `RequestUsageStats` | four queries | one message each |
//!
//! # Examples
//!
//! ```
//! use printwatch::command::{CommandDispatcher, CommandRequest};
//! use printwatch::sequence::SequenceGenerator;
//! use printwatch::types::FanSpeed;
//!
//! let dispatcher = CommandDispatcher::new(
//!     "device/01S00A000000000/request",
//!     SequenceGenerator::starting_at(10),
//! );
//!
//! let messages = dispatcher
//!     .dispatch(&CommandRequest::SetPartFan(FanSpeed::new(50).unwrap()))
//!     .unwrap();
//!
//! assert_eq!(messages.len(), 1);
//! assert_eq!(messages[0].payload()["print"]["param"], "M106 P1 S128\n");
//! assert_eq!(messages[0].payload()["print"]["sequence_id"], "10");
//! ```

mod dispatcher;
mod message;
mod request;

pub use dispatcher::CommandDispatcher;
pub use message::OutboundMessage;
pub use request::CommandRequest;
