// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel for print events.

use tokio::sync::broadcast;

use super::PrintEvent;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fan-out of print events to in-process listeners.
///
/// Each subscriber gets its own copy of every event published after it
/// subscribed. A subscriber that falls more than the channel capacity behind
/// receives `RecvError::Lagged` and skips the oldest events; the publisher
/// is never blocked.
///
/// ```
/// use printwatch::event::{EventBus, PrintEvent};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
/// assert_eq!(bus.publish_counted(PrintEvent::job_started("a.gcode")), 1);
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PrintEvent>,
}

impl EventBus {
    /// Creates an event bus with the default capacity of 256.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates an event bus buffering up to `capacity` events per receiver.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PrintEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// Without subscribers the event is dropped.
    pub fn publish(&self, event: PrintEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("print event dropped, no listeners");
        }
    }

    /// Publishes an event and returns how many receivers got it.
    #[must_use]
    pub fn publish_counted(&self, event: PrintEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
