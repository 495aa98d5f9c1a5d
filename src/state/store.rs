// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lock-guarded owner of the state document.

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::event::{PrintEvent, detect_transitions};

use super::{PrintStatus, StateDocument};

/// Result of folding one inbound message into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Job events derived from the print section before and after the merge.
    pub events: Vec<PrintEvent>,
    /// Print section reading before the merge (`None` before the first message).
    pub previous: Option<PrintStatus>,
    /// Print section reading after the merge.
    pub current: PrintStatus,
}

#[derive(Debug, Default)]
struct StoreInner {
    document: StateDocument,
    last_print: Option<PrintStatus>,
}

/// Sole owner of the canonical state document.
///
/// The document and the last observed print status are mutated together in
/// one critical section per message, so event detection always compares two
/// consecutive states. Readers get copies; the lock is never held across
/// serialization or I/O.
///
/// # Examples
///
/// ```
/// use printwatch::state::StateStore;
/// use printwatch::event::PrintEvent;
/// use serde_json::json;
///
/// let store = StateStore::new();
/// let msg = json!({"print": {"gcode_state": "RUNNING", "gcode_file": "cube.gcode"}});
/// let outcome = store.apply(msg.as_object().unwrap().clone());
///
/// assert_eq!(outcome.events, vec![PrintEvent::job_started("cube.gcode")]);
/// assert_eq!(store.snapshot().to_value(), msg);
/// ```
#[derive(Debug, Default)]
pub struct StateStore {
    inner: Mutex<StoreInner>,
}

impl StateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a message and detects job transitions.
    ///
    /// The post-merge print status is recorded unconditionally so the file
    /// name used for the next comparison is always current.
    pub fn apply(&self, incoming: Map<String, Value>) -> MergeOutcome {
        let mut inner = self.inner.lock();
        inner.document.merge(incoming);

        let current = inner.document.print_status();
        let previous = inner.last_print.replace(current.clone());
        let events = detect_transitions(previous.as_ref(), &current);

        MergeOutcome {
            events,
            previous,
            current,
        }
    }

    /// Returns a copy of the current document.
    #[must_use]
    pub fn snapshot(&self) -> StateDocument {
        self.inner.lock().document.clone()
    }

    /// Returns a copy of the current document as JSON.
    #[must_use]
    pub fn snapshot_value(&self) -> Value {
        let document = self.snapshot();
        document.to_value()
    }

    /// Returns the last observed print status, if any message was merged.
    #[must_use]
    pub fn print_status(&self) -> Option<PrintStatus> {
        self.inner.lock().last_print.clone()
    }

    /// Discards all state, as if no message had been received.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.document.clear();
        inner.last_print = None;
    }
}
