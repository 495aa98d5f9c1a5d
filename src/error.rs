// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `printwatch` library.
//!
//! The hierarchy separates the four ways a printer interaction can fail:
//! a rejected command parameter ([`ValueError`]), an undecodable inbound
//! payload ([`ParseError`]), a transport that cannot carry the command
//! ([`ProtocolError`]) and a push notification that could not be handed to
//! one subscriber ([`DeliveryError`]). None of them is fatal to the process.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A command parameter failed validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// An inbound payload or request body could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The command could not be handed to the transport.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A push notification could not be delivered.
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// The configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The command name in a request is not recognised.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl Error {
    /// Returns the HTTP status a web layer should answer with for this error.
    ///
    /// Validation, decoding and unknown commands are the caller's fault
    /// (400). A transport that is down or refused the publish is reported as
    /// 503 so the caller can retry later. Anything else is a 500.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Value(_) | Self::Parse(_) | Self::UnknownCommand(_) => 400,
            Self::Protocol(_) => 503,
            Self::Delivery(_) | Self::Config(_) => 500,
        }
    }

    /// Returns `true` if this error was caused by a disconnected transport.
    #[must_use]
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::NotConnected))
    }
}

/// Errors related to command parameter validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("{field} value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// The parameter that was rejected.
        field: &'static str,
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// A required parameter is absent or null.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// A parameter is present but not of the expected kind.
    #[error("parameter {name} must be {expected}, got {found}")]
    InvalidParameter {
        /// The parameter that was rejected.
        name: &'static str,
        /// What the parameter should have been.
        expected: &'static str,
        /// What was actually provided.
        found: String,
    },

    /// A G-code line was empty.
    #[error("G-code line must not be empty")]
    EmptyGcode,

    /// A light mode string is not valid for the targeted light.
    #[error("invalid light mode for {node}: {mode}")]
    InvalidLightMode {
        /// The light node the mode was meant for.
        node: &'static str,
        /// The rejected mode string.
        mode: String,
    },
}

/// Errors related to decoding inbound payloads and request bodies.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// The top-level JSON value is not an object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// An expected field is missing.
    #[error("missing field: {0}")]
    MissingField(String),
}

/// Errors related to the publish/subscribe transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The topic client is not connected to the broker.
    #[error("not connected to the printer")]
    NotConnected,

    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The outbound message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    /// The broker connection could not be set up.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

/// Errors reported by a push delivery attempt to one subscriber.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The endpoint no longer exists and the subscriber should be pruned.
    #[error("endpoint is gone (HTTP {0})")]
    Gone(u16),

    /// The push service rejected the message.
    #[error("push service rejected the message with HTTP {0}")]
    Rejected(u16),

    /// The request did not reach the push service.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Returns `true` if the endpoint is permanently invalid.
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone(_))
    }
}

/// Errors related to loading configuration and file-backed stores.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The file does not contain valid JSON for the expected shape.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// The file involved.
        path: String,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// Required keys are missing or empty.
    #[error("missing or empty required keys: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
