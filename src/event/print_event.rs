// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Print job event types.

use std::fmt;

/// Result code reported for a job that completed normally.
pub const RESULT_SUCCESS: i64 = 0;
/// Result code reported for a job the user cancelled.
pub const RESULT_USER_STOPPED: i64 = 4;

/// How a print job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The job completed.
    Success,
    /// The user stopped the job.
    UserStopped,
    /// The job failed. Carries the reported result code, if any.
    Failed(Option<i64>),
}

impl JobOutcome {
    /// Maps a result code to an outcome.
    ///
    /// ```
    /// use printwatch::event::JobOutcome;
    ///
    /// assert_eq!(JobOutcome::from_result_code(Some(0)), JobOutcome::Success);
    /// assert_eq!(JobOutcome::from_result_code(Some(4)), JobOutcome::UserStopped);
    /// assert_eq!(JobOutcome::from_result_code(None), JobOutcome::Failed(None));
    /// ```
    #[must_use]
    pub fn from_result_code(code: Option<i64>) -> Self {
        match code {
            Some(RESULT_SUCCESS) => Self::Success,
            Some(RESULT_USER_STOPPED) => Self::UserStopped,
            other => Self::Failed(other),
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::UserStopped => f.write_str("stopped by user"),
            Self::Failed(Some(code)) => write!(f, "failed (code {code})"),
            Self::Failed(None) => f.write_str("failed (no code)"),
        }
    }
}

/// A job lifecycle edge observed on the printer.
///
/// Events are transient: they exist only long enough to be broadcast and
/// turned into notifications.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrintEvent {
    /// The printer entered the printing stage.
    JobStarted {
        /// The job that started.
        filename: String,
    },

    /// The printer left the printing stage.
    JobFinished {
        /// The job that was printing.
        filename: String,
        /// How it ended.
        outcome: JobOutcome,
    },
}

impl PrintEvent {
    /// Creates a `JobStarted` event.
    #[must_use]
    pub fn job_started(filename: impl Into<String>) -> Self {
        Self::JobStarted {
            filename: filename.into(),
        }
    }

    /// Creates a `JobFinished` event.
    #[must_use]
    pub fn job_finished(filename: impl Into<String>, outcome: JobOutcome) -> Self {
        Self::JobFinished {
            filename: filename.into(),
            outcome,
        }
    }

    /// Returns the job file name.
    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            Self::JobStarted { filename } | Self::JobFinished { filename, .. } => filename,
        }
    }

    /// Returns the outcome for finish events.
    #[must_use]
    pub fn outcome(&self) -> Option<JobOutcome> {
        match self {
            Self::JobStarted { .. } => None,
            Self::JobFinished { outcome, .. } => Some(*outcome),
        }
    }
}
