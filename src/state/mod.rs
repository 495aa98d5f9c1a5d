// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical printer state.
//!
//! The printer reports its status as partial JSON documents. [`StateDocument`]
//! folds them into one view, [`PrintStatus`] is a typed reading of its
//! `print` section, and [`StateStore`] owns the document behind a lock so the
//! ingest path and any number of readers can share it.
//!
//! # Examples
//!
//! ```
//! use printwatch::state::StateDocument;
//! use serde_json::json;
//!
//! let mut doc = StateDocument::new();
//! doc.merge(json!({"print": {"nozzle_temper": 210.0}}).as_object().unwrap().clone());
//! doc.merge(json!({"print": {"bed_temper": 60.0}}).as_object().unwrap().clone());
//!
//! assert_eq!(
//!     doc.to_value(),
//!     json!({"print": {"nozzle_temper": 210.0, "bed_temper": 60.0}})
//! );
//! ```

mod document;
mod print_status;
mod store;

pub(crate) use document::json_kind;
pub use document::{StateDocument, decode_message};
pub use print_status::{JobStage, PrintStatus};
pub use store::{MergeOutcome, StateStore};
