// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command requests and their wire rendering.

use serde_json::Value;

use crate::error::{Error, ParseError, ValueError};
use crate::state::decode_message;
use crate::types::{
    BedTemperature, ChamberLightMode, FanSpeed, LightNode, NozzleTemperature, PrintSpeedTier,
    WorkLightMode,
};

use super::message::Envelope;

/// LED on/off phase duration in milliseconds.
const LED_PHASE_MS: u32 = 500;
/// Pause between LED loops in milliseconds.
const LED_INTERVAL_MS: u32 = 1000;

/// An operation to perform on the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    /// Send one raw G-code line.
    RawGcodeLine {
        /// The G-code, without trailing newline.
        line: String,
    },
    /// Set the chamber light.
    SetChamberLight(ChamberLightMode),
    /// Set the work light.
    SetWorkLight(WorkLightMode),
    /// Set the part cooling fan.
    SetPartFan(FanSpeed),
    /// Pause the current job.
    PauseJob,
    /// Resume a paused job.
    ResumeJob,
    /// Stop the current job.
    StopJob,
    /// Select a print speed profile.
    SetPrintSpeedTier(PrintSpeedTier),
    /// Set the nozzle target temperature.
    SetNozzleTemperature(NozzleTemperature),
    /// Set the bed target temperature.
    SetBedTemperature(BedTemperature),
    /// Ask the printer to push its full status.
    RequestFullStatus,
    /// Ask the printer for lifetime usage counters.
    RequestUsageStats,
}

impl CommandRequest {
    /// Creates a raw G-code request.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::EmptyGcode` if the line is blank.
    pub fn gcode(line: impl Into<String>) -> Result<Self, ValueError> {
        let line = line.into();
        validate_gcode(&line)?;
        Ok(Self::RawGcodeLine { line })
    }

    /// Returns the API name of this request.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RawGcodeLine { .. } => "gcode",
            Self::SetChamberLight(_) => "set_chamber_light",
            Self::SetWorkLight(_) => "set_work_light",
            Self::SetPartFan(_) => "set_part_fan",
            Self::PauseJob => "pause",
            Self::ResumeJob => "resume",
            Self::StopJob => "stop",
            Self::SetPrintSpeedTier(_) => "set_print_speed",
            Self::SetNozzleTemperature(_) => "set_nozzle_temp",
            Self::SetBedTemperature(_) => "set_bed_temp",
            Self::RequestFullStatus => "pushall",
            Self::RequestUsageStats => "request_stats",
        }
    }

    /// Parses a command submit body such as
    /// `{"command": "set_part_fan", "value": 80}`.
    ///
    /// Numeric parameters may be JSON integers or decimal strings.
    ///
    /// # Errors
    ///
    /// - `Error::Parse` if the body is not an object or lacks `command`
    /// - `Error::UnknownCommand` for an unrecognised command name
    /// - `Error::Value` if a parameter is missing or out of range
    ///
    /// # Examples
    ///
    /// ```
    /// use printwatch::command::CommandRequest;
    /// use serde_json::json;
    ///
    /// let req = CommandRequest::from_json(&json!({"command": "set_bed_temp", "value": "60"})).unwrap();
    /// assert_eq!(req.name(), "set_bed_temp");
    ///
    /// let err = CommandRequest::from_json(&json!({"command": "set_bed_temp", "value": 500})).unwrap_err();
    /// assert_eq!(err.http_status(), 400);
    /// ```
    pub fn from_json(body: &Value) -> Result<Self, Error> {
        let Value::Object(fields) = body else {
            return Err(ParseError::NotAnObject(crate::state::json_kind(body)).into());
        };
        let name = fields
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::MissingField("command".into()))?;

        let request = match name {
            "gcode" => {
                let line = str_param(body, "line")?;
                Self::gcode(line)?
            }
            "set_chamber_light" => Self::SetChamberLight(str_param(body, "mode")?.parse()?),
            "set_work_light" => Self::SetWorkLight(str_param(body, "mode")?.parse()?),
            "set_part_fan" => Self::SetPartFan(FanSpeed::from_f64(number_param(body, "value")?)?),
            "pause" => Self::PauseJob,
            "resume" => Self::ResumeJob,
            "stop" => Self::StopJob,
            "set_print_speed" => {
                Self::SetPrintSpeedTier(PrintSpeedTier::new(int_param(body, "tier")?)?)
            }
            "set_nozzle_temp" => {
                Self::SetNozzleTemperature(NozzleTemperature::from_f64(number_param(body, "value")?)?)
            }
            "set_bed_temp" => {
                Self::SetBedTemperature(BedTemperature::from_f64(number_param(body, "value")?)?)
            }
            "pushall" => Self::RequestFullStatus,
            "request_stats" => Self::RequestUsageStats,
            other => return Err(Error::UnknownCommand(other.to_string())),
        };
        Ok(request)
    }

    /// Parses a raw command submit body.
    ///
    /// # Errors
    ///
    /// Same as [`from_json`](Self::from_json), plus `Error::Parse` for
    /// undecodable bytes.
    pub fn from_slice(body: &[u8]) -> Result<Self, Error> {
        let fields = decode_message(body)?;
        Self::from_json(&Value::Object(fields))
    }

    /// Checks every parameter without rendering.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if a parameter is invalid.
    pub fn validate(&self) -> Result<(), ValueError> {
        match self {
            Self::RawGcodeLine { line } => validate_gcode(line),
            _ => Ok(()),
        }
    }

    /// Renders the unstamped wire bodies, in publish order.
    pub(crate) fn envelopes(&self) -> Result<Vec<Envelope>, ValueError> {
        let envelopes = match self {
            Self::RawGcodeLine { line } => {
                self.validate()?;
                vec![gcode_line(line)]
            }
            Self::SetNozzleTemperature(t) => vec![gcode_line(&format!("M104 S{}", t.celsius()))],
            Self::SetBedTemperature(t) => vec![gcode_line(&format!("M140 S{}", t.celsius()))],
            Self::SetPartFan(speed) => {
                vec![gcode_line(&format!("M106 P1 S{}", speed.device_value()))]
            }
            Self::SetChamberLight(mode) => {
                vec![led_control(LightNode::Chamber, mode.as_str(), 1)]
            }
            Self::SetWorkLight(mode) => {
                vec![led_control(LightNode::Work, mode.as_str(), mode.loop_times())]
            }
            Self::PauseJob => vec![Envelope::new("print", "pause").with_param("")],
            Self::ResumeJob => vec![Envelope::new("print", "resume").with_param("")],
            Self::StopJob => vec![Envelope::new("print", "stop").with_param("")],
            Self::SetPrintSpeedTier(tier) => {
                vec![Envelope::new("print", "print_speed").with_param(tier.value().to_string())]
            }
            Self::RequestFullStatus => vec![Envelope::new("pushing", "pushall")],
            Self::RequestUsageStats => vec![
                Envelope::new("pushing", "pushall"),
                Envelope::new("info", "get_version"),
                Envelope::new("system", "get_printer_info"),
                Envelope::new("print", "get_print_stats"),
            ],
        };
        Ok(envelopes)
    }
}

fn validate_gcode(line: &str) -> Result<(), ValueError> {
    if line.trim().is_empty() {
        return Err(ValueError::EmptyGcode);
    }
    Ok(())
}

fn gcode_line(line: &str) -> Envelope {
    let line = line.trim_end_matches(['\r', '\n']);
    Envelope::new("print", "gcode_line").with_param(format!("{line}\n"))
}

fn led_control(node: LightNode, mode: &str, loop_times: u32) -> Envelope {
    Envelope::new("system", "ledctrl")
        .with_field("led_node", node.as_str())
        .with_field("led_mode", mode)
        .with_field("led_on_time", LED_PHASE_MS)
        .with_field("led_off_time", LED_PHASE_MS)
        .with_field("loop_times", loop_times)
        .with_field("interval_time", LED_INTERVAL_MS)
}

fn required<'a>(body: &'a Value, name: &'static str) -> Result<&'a Value, ValueError> {
    match body.get(name) {
        None | Some(Value::Null) => Err(ValueError::MissingParameter(name)),
        Some(value) => Ok(value),
    }
}

fn invalid(name: &'static str, expected: &'static str, value: &Value) -> ValueError {
    let found = match value {
        Value::String(s) => format!("{s:?}"),
        Value::Number(n) => n.to_string(),
        other => crate::state::json_kind(other).to_string(),
    };
    ValueError::InvalidParameter {
        name,
        expected,
        found,
    }
}

fn str_param<'a>(body: &'a Value, name: &'static str) -> Result<&'a str, ValueError> {
    let value = required(body, name)?;
    value.as_str().ok_or_else(|| invalid(name, "a string", value))
}

/// Integer or float, also as a numeric string.
fn number_param(body: &Value, name: &'static str) -> Result<f64, ValueError> {
    let value = required(body, name)?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number
        .filter(|n: &f64| n.is_finite())
        .ok_or_else(|| invalid(name, "a number", value))
}

fn int_param(body: &Value, name: &'static str) -> Result<i64, ValueError> {
    let value = required(body, name)?;
    let number = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.ok_or_else(|| invalid(name, "a whole number", value))
}
