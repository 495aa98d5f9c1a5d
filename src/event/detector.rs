// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge detection on the print stage.

use crate::state::PrintStatus;

use super::{JobOutcome, PrintEvent};

/// Label used when the printer reports no file name for a job.
pub const UNNAMED_JOB: &str = "unnamed job";

/// Compares two consecutive print statuses and returns the job events the
/// change implies.
///
/// At most one event is produced: `JobStarted` on a non-printing to printing
/// edge, `JobFinished` on a printing to non-printing edge. A missing
/// `before` (first message after start) reads as "not printing, no file".
///
/// ```
/// use printwatch::event::{JobOutcome, PrintEvent, detect_transitions};
/// use printwatch::state::{JobStage, PrintStatus};
///
/// let printing = PrintStatus::new(Some(JobStage::Printing), Some("a.gcode".into()), None);
/// let done = PrintStatus::new(Some(JobStage::Finished), None, Some(0));
///
/// assert_eq!(
///     detect_transitions(Some(&printing), &done),
///     vec![PrintEvent::job_finished("a.gcode", JobOutcome::Success)]
/// );
/// assert!(detect_transitions(Some(&printing), &printing).is_empty());
/// ```
#[must_use]
pub fn detect_transitions(before: Option<&PrintStatus>, after: &PrintStatus) -> Vec<PrintEvent> {
    let was_printing = before.is_some_and(PrintStatus::is_printing);
    let is_printing = after.is_printing();

    match (was_printing, is_printing) {
        (false, true) => {
            let filename = label(after.file());
            tracing::debug!(filename = %filename, "job started");
            vec![PrintEvent::job_started(filename)]
        }
        (true, false) => {
            let filename = label(before.and_then(PrintStatus::file));
            let outcome = JobOutcome::from_result_code(after.result_code());
            tracing::debug!(filename = %filename, outcome = %outcome, "job finished");
            vec![PrintEvent::job_finished(filename, outcome)]
        }
        _ => Vec::new(),
    }
}

fn label(file: Option<&str>) -> String {
    file.map_or_else(|| UNNAMED_JOB.to_string(), str::to_string)
}
