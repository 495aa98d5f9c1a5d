// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command correlation identifiers.
//!
//! Every outbound command carries a `sequence_id`. The printer remembers
//! recently seen ids, so the counter is seeded from the wall clock at start
//! instead of zero: a restarted process never reuses an id from its previous
//! run. Ids may have gaps (a command that was built but never published
//! still consumed its id).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Serialize, Serializer};

/// A command correlation identifier, serialized as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceId(u64);

impl SequenceId {
    /// Returns the raw value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SequenceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

/// Process-wide monotonically increasing sequence id source.
///
/// # Examples
///
/// ```
/// use printwatch::sequence::SequenceGenerator;
///
/// let generator = SequenceGenerator::starting_at(100);
/// assert_eq!(generator.next().value(), 100);
/// assert_eq!(generator.next().value(), 101);
/// ```
#[derive(Debug)]
pub struct SequenceGenerator {
    next: AtomicU64,
}

impl SequenceGenerator {
    /// Creates a generator seeded from the current Unix time in milliseconds.
    #[must_use]
    pub fn new() -> Self {
        let seed = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(1);
        Self::starting_at(seed)
    }

    /// Creates a generator whose first id is `seed`.
    #[must_use]
    pub fn starting_at(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    /// Mints a fresh id. Each call consumes exactly one value.
    pub fn next(&self) -> SequenceId {
        SequenceId(self.next.fetch_add(1, Ordering::AcqRel))
    }

    /// Returns the id the next call to [`next`](Self::next) will return.
    #[must_use]
    pub fn peek(&self) -> SequenceId {
        SequenceId(self.next.load(Ordering::Acquire))
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn ids_increase_by_one() {
        let generator = SequenceGenerator::starting_at(7);
        let a = generator.next();
        let b = generator.next();
        assert_eq!(b.value(), a.value() + 1);
        assert_eq!(generator.peek().value(), 9);
    }

    #[test]
    fn seeded_from_wall_clock() {
        let before = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap();
        let generator = SequenceGenerator::new();
        assert!(generator.next().value() >= before);
    }

    #[test]
    fn serializes_as_string() {
        let id = SequenceGenerator::starting_at(42).next();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }

    #[test]
    fn concurrent_ids_are_unique() {
        let generator = Arc::new(SequenceGenerator::starting_at(1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || (0..500).map(|_| generator.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let ids = handle.join().unwrap();
            // Ids drawn by one thread are strictly increasing.
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            for id in ids {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 4000);
    }
}
