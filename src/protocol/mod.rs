// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Publish/subscribe transport to the printer.
//!
//! The [`TopicClient`] trait is the only thing the monitor needs from a
//! transport: a connection flag and a fail-fast publish. Inbound traffic
//! flows the other way as [`TransportEvent`]s on a channel.
//!
//! With the `mqtt` feature, [`MqttTopicClient`] implements both sides on
//! top of rumqttc.

#[cfg(feature = "mqtt")]
mod mqtt;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttTopicClient, MqttTopicClientBuilder};

use std::future::Future;

use crate::command::OutboundMessage;
use crate::error::ProtocolError;

/// Something that happened on the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The broker accepted the connection (first connect or reconnect).
    Connected,
    /// The connection was lost.
    Disconnected,
    /// A message arrived on a subscribed topic.
    Message {
        /// Topic the message was published on.
        topic: String,
        /// Raw payload.
        payload: Vec<u8>,
    },
}

/// Outbound side of the transport.
pub trait TopicClient {
    /// Returns `true` while the broker connection is up.
    fn is_connected(&self) -> bool;

    /// Publishes a message.
    ///
    /// Must fail with [`ProtocolError::NotConnected`] instead of queueing
    /// when disconnected.
    fn publish(
        &self,
        message: &OutboundMessage,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}
