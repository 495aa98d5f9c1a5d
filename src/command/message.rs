// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound wire message.

use serde_json::{Map, Value};

use crate::error::ProtocolError;
use crate::sequence::SequenceId;

/// Unstamped command body: `{section: {command, ...fields}}`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Envelope {
    pub(crate) section: &'static str,
    pub(crate) command: &'static str,
    pub(crate) fields: Map<String, Value>,
}

impl Envelope {
    pub(crate) fn new(section: &'static str, command: &'static str) -> Self {
        Self {
            section,
            command,
            fields: Map::new(),
        }
    }

    #[must_use]
    pub(crate) fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub(crate) fn with_param(self, param: impl Into<String>) -> Self {
        self.with_field("param", param.into())
    }

    /// Builds the JSON body with the given sequence id stamped in.
    pub(crate) fn stamp(self, sequence_id: SequenceId) -> Value {
        let mut body = Map::new();
        body.insert("sequence_id".into(), Value::String(sequence_id.to_string()));
        body.insert("command".into(), Value::String(self.command.to_string()));
        body.extend(self.fields);

        let mut root = Map::new();
        root.insert(self.section.to_string(), Value::Object(body));
        Value::Object(root)
    }
}

/// A command ready to be published.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    topic: String,
    sequence_id: SequenceId,
    payload: Value,
}

impl OutboundMessage {
    pub(crate) fn new(topic: impl Into<String>, sequence_id: SequenceId, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            sequence_id,
            payload,
        }
    }

    /// Returns the destination topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the sequence id stamped into the payload.
    #[must_use]
    pub fn sequence_id(&self) -> SequenceId {
        self.sequence_id
    }

    /// Returns the JSON payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Serializes the payload for the transport.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Encode` if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(&self.payload)?)
    }
}
