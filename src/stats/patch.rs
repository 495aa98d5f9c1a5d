// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Usage values and patches.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::extract_usage;

/// The three usage counters, each optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageFields {
    /// Total print time in hours.
    pub print_hours: Option<f64>,
    /// Total number of print jobs.
    pub total_prints: Option<u64>,
    /// Total power-on time in hours.
    pub power_on_hours: Option<f64>,
}

impl UsageFields {
    /// Returns `true` if no counter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.print_hours.is_none() && self.total_prints.is_none() && self.power_on_hours.is_none()
    }

    /// Keeps every counter already set and fills the rest from `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            print_hours: self.print_hours.or(other.print_hours),
            total_prints: self.total_prints.or(other.total_prints),
            power_on_hours: self.power_on_hours.or(other.power_on_hours),
        }
    }
}

/// A sparse update for the usage store: only counters actually reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsagePatch {
    /// The reported counters.
    #[serde(flatten)]
    pub fields: UsageFields,
    /// When the message carrying them was received.
    pub observed_at: DateTime<Utc>,
}

impl UsagePatch {
    /// Extracts a patch from an inbound message.
    ///
    /// Returns `None` when the message carries no usage counter.
    #[must_use]
    pub fn from_message(message: &Map<String, Value>, observed_at: DateTime<Utc>) -> Option<Self> {
        let fields = extract_usage(message);
        (!fields.is_empty()).then_some(Self {
            fields,
            observed_at,
        })
    }
}

/// Accumulated usage as last reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageTotals {
    /// Latest known counters.
    #[serde(flatten)]
    pub fields: UsageFields,
    /// Time of the last applied patch.
    pub updated_at: Option<DateTime<Utc>>,
}

impl UsageTotals {
    /// Overwrites every counter present in the patch.
    pub fn apply(&mut self, patch: &UsagePatch) {
        self.fields = patch.fields.or(self.fields);
        self.updated_at = Some(patch.observed_at);
    }
}
