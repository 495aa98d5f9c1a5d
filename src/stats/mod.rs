// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifetime usage counters.
//!
//! Printers report total print hours, job count and power-on hours under
//! different paths depending on firmware. Each known layout is a strategy;
//! [`extract_usage`] runs them in order and keeps the first value found for
//! each counter. The result is forwarded to a [`UsageSink`] as a sparse
//! [`UsagePatch`].
//!
//! | Order | Path | Print time unit |
//! |-------|------|-----------------|
//! | 1 | `print.statistics` | seconds |
//! | 2 | `print.print_job` | seconds |
//! | 3 | `print.stats` (`get_print_stats` reply) | hours |
//! | 4 | `info.module[printer].statistics` (`get_version` reply) | hours |
//! | 5 | `system.printer.total_usage` (`get_printer_info` reply) | hours |
//! | 6 | `pushing.print_stats` | seconds |
//!
//! # Examples
//!
//! ```
//! use printwatch::stats::extract_usage;
//! use serde_json::json;
//!
//! let msg = json!({"print": {"statistics": {"total_time": 7200, "total_prints": "31"}}});
//! let usage = extract_usage(msg.as_object().unwrap());
//!
//! assert_eq!(usage.print_hours, Some(2.0));
//! assert_eq!(usage.total_prints, Some(31));
//! assert_eq!(usage.power_on_hours, None);
//! ```

mod patch;
mod sink;
mod strategy;

pub use patch::{UsageFields, UsagePatch, UsageTotals};
pub use sink::{MemoryUsageSink, UsageSink};
pub use strategy::{extract_usage, strategy_names};
