// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Usage persistence collaborator.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::Result;

use super::{UsagePatch, UsageTotals};

/// Receives usage patches. Implementations store them durably; this crate
/// never reads them back.
pub trait UsageSink {
    /// Applies a sparse patch. Absent counters must be left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch cannot be stored.
    fn update_totals(&self, patch: &UsagePatch) -> Result<()>;
}

/// Sink that folds patches into in-memory [`UsageTotals`].
#[derive(Debug, Default)]
pub struct MemoryUsageSink {
    totals: Mutex<UsageTotals>,
    updates: AtomicU64,
}

impl MemoryUsageSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current totals.
    #[must_use]
    pub fn totals(&self) -> UsageTotals {
        *self.totals.lock()
    }

    /// Returns how many patches were applied.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }
}

impl UsageSink for MemoryUsageSink {
    fn update_totals(&self, patch: &UsagePatch) -> Result<()> {
        self.totals.lock().apply(patch);
        self.updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
