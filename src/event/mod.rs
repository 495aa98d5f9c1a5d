// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Print job events.
//!
//! Events are derived by comparing the print section before and after each
//! merge ([`detect_transitions`]) and broadcast to in-process listeners
//! through an [`EventBus`].
//!
//! # Examples
//!
//! ```
//! use printwatch::event::{EventBus, PrintEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(PrintEvent::job_started("benchy.gcode"));
//! ```

mod detector;
mod event_bus;
mod print_event;

pub use detector::{UNNAMED_JOB, detect_transitions};
pub use event_bus::EventBus;
pub use print_event::{JobOutcome, PrintEvent};
