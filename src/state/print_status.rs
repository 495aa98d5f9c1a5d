// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed view of the `print` section.

use std::fmt;

use serde_json::Value;

/// Field carrying the job lifecycle stage.
const STAGE_FIELD: &str = "gcode_state";
/// Field carrying the active job file.
const FILE_FIELD: &str = "gcode_file";
/// Fallback job name used by some firmware when `gcode_file` is blank.
const SUBTASK_FIELD: &str = "subtask_name";
/// Field carrying the job result code.
const RESULT_FIELD: &str = "print_error";

/// Lifecycle stage of the current job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub enum JobStage {
    /// No job loaded.
    Idle,
    /// Heating, levelling or otherwise getting ready.
    Prepare,
    /// Actively printing.
    Printing,
    /// Paused by the user or by the printer.
    Paused,
    /// Job finished.
    Finished,
    /// Job failed.
    Failed,
    /// A stage string this library does not know.
    Other(String),
}

impl JobStage {
    /// Parses a stage string as reported by the printer.
    ///
    /// Firmware reports an active job as `RUNNING`; `PRINTING` is accepted as
    /// a synonym.
    #[must_use]
    pub fn parse(stage: &str) -> Self {
        match stage.to_ascii_uppercase().as_str() {
            "IDLE" => Self::Idle,
            "PREPARE" | "SLICING" => Self::Prepare,
            "RUNNING" | "PRINTING" => Self::Printing,
            "PAUSE" | "PAUSED" => Self::Paused,
            "FINISH" | "FINISHED" => Self::Finished,
            "FAILED" => Self::Failed,
            _ => Self::Other(stage.to_string()),
        }
    }

    /// Returns `true` for the printing stage.
    #[must_use]
    pub fn is_printing(&self) -> bool {
        matches!(self, Self::Printing)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("IDLE"),
            Self::Prepare => f.write_str("PREPARE"),
            Self::Printing => f.write_str("PRINTING"),
            Self::Paused => f.write_str("PAUSE"),
            Self::Finished => f.write_str("FINISH"),
            Self::Failed => f.write_str("FAILED"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// The fields of the `print` section that drive job event detection.
///
/// Every field is optional: the printer sends partial updates and a field
/// absent from the merged document is simply unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PrintStatus {
    stage: Option<JobStage>,
    file: Option<String>,
    result_code: Option<i64>,
}

impl PrintStatus {
    /// Creates a status from its parts.
    #[must_use]
    pub fn new(stage: Option<JobStage>, file: Option<String>, result_code: Option<i64>) -> Self {
        Self {
            stage,
            file,
            result_code,
        }
    }

    /// Reads a `print` section. Anything other than an object reads as empty.
    #[must_use]
    pub fn from_section(section: Option<&Value>) -> Self {
        let Some(Value::Object(fields)) = section else {
            return Self::default();
        };

        let stage = fields
            .get(STAGE_FIELD)
            .and_then(Value::as_str)
            .map(JobStage::parse);

        let file = [FILE_FIELD, SUBTASK_FIELD]
            .iter()
            .filter_map(|key| fields.get(*key).and_then(Value::as_str))
            .find(|name| !name.trim().is_empty())
            .map(str::to_string);

        let result_code = fields.get(RESULT_FIELD).and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        Self {
            stage,
            file,
            result_code,
        }
    }

    /// Returns the lifecycle stage, if reported.
    #[must_use]
    pub fn stage(&self) -> Option<&JobStage> {
        self.stage.as_ref()
    }

    /// Returns the active job file name, if reported and non-blank.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Returns the job result code, if reported.
    #[must_use]
    pub fn result_code(&self) -> Option<i64> {
        self.result_code
    }

    /// Returns `true` if the printer reports an active job.
    #[must_use]
    pub fn is_printing(&self) -> bool {
        self.stage.as_ref().is_some_and(JobStage::is_printing)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn stage_synonyms() {
        assert_eq!(JobStage::parse("RUNNING"), JobStage::Printing);
        assert_eq!(JobStage::parse("printing"), JobStage::Printing);
        assert_eq!(JobStage::parse("FINISH"), JobStage::Finished);
        assert_eq!(
            JobStage::parse("CALIBRATING"),
            JobStage::Other("CALIBRATING".into())
        );
    }

    #[test]
    fn reads_print_section() {
        let section = json!({
            "gcode_state": "RUNNING",
            "gcode_file": "benchy.gcode",
            "print_error": 0,
            "mc_percent": 12
        });
        let status = PrintStatus::from_section(Some(&section));
        assert!(status.is_printing());
        assert_eq!(status.file(), Some("benchy.gcode"));
        assert_eq!(status.result_code(), Some(0));
    }

    #[test]
    fn blank_file_falls_back_to_subtask() {
        let section = json!({"gcode_file": "", "subtask_name": "plate_1"});
        let status = PrintStatus::from_section(Some(&section));
        assert_eq!(status.file(), Some("plate_1"));
    }

    #[test]
    fn result_code_as_string() {
        let section = json!({"print_error": "4"});
        assert_eq!(PrintStatus::from_section(Some(&section)).result_code(), Some(4));
    }

    #[test]
    fn missing_or_scalar_section_is_empty() {
        assert_eq!(PrintStatus::from_section(None), PrintStatus::default());
        let scalar = json!("paused");
        assert_eq!(
            PrintStatus::from_section(Some(&scalar)),
            PrintStatus::default()
        );
        assert!(!PrintStatus::default().is_printing());
    }
}
