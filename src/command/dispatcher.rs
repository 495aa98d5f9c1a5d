// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command dispatcher.

use crate::error::ValueError;
use crate::sequence::SequenceGenerator;

use super::{CommandRequest, OutboundMessage};

/// Renders command requests into stamped messages for the request topic.
///
/// The dispatcher does not publish. Validation happens before any sequence
/// id is drawn, so a rejected request never consumes an id.
#[derive(Debug)]
pub struct CommandDispatcher {
    request_topic: String,
    sequence: SequenceGenerator,
}

impl CommandDispatcher {
    /// Creates a dispatcher targeting `request_topic`.
    #[must_use]
    pub fn new(request_topic: impl Into<String>, sequence: SequenceGenerator) -> Self {
        Self {
            request_topic: request_topic.into(),
            sequence,
        }
    }

    /// Returns the topic messages are addressed to.
    #[must_use]
    pub fn request_topic(&self) -> &str {
        &self.request_topic
    }

    /// Returns the sequence generator.
    #[must_use]
    pub fn sequence(&self) -> &SequenceGenerator {
        &self.sequence
    }

    /// Renders a request into messages, one fresh sequence id each.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if the request carries an invalid parameter.
    pub fn dispatch(&self, request: &CommandRequest) -> Result<Vec<OutboundMessage>, ValueError> {
        let envelopes = request.envelopes()?;
        let messages: Vec<_> = envelopes
            .into_iter()
            .map(|envelope| {
                let id = self.sequence.next();
                OutboundMessage::new(self.request_topic.clone(), id, envelope.stamp(id))
            })
            .collect();
        tracing::debug!(
            command = request.name(),
            count = messages.len(),
            "rendered command"
        );
        Ok(messages)
    }
}
