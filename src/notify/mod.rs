// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push notification fanout.
//!
//! Job events are rendered into a [`Notification`] and delivered to every
//! registered [`Subscriber`] through a [`PushDelivery`] implementation.
//! Endpoints the push service reports as gone are pruned from the
//! [`SubscriberRegistry`] after each round.
//!
//! | Type | Role |
//! |------|------|
//! | [`NotificationFanout`] | Renders, delivers, prunes |
//! | [`MemoryRegistry`] | In-process subscriber list |
//! | [`JsonFileRegistry`] | Subscriber list persisted as a JSON array |
//! | [`HttpPushDelivery`] | Posts the payload to the endpoint (feature `http`) |

mod delivery;
mod fanout;
mod notification;
mod registry;

#[cfg(feature = "http")]
pub use delivery::HttpPushDelivery;
pub use delivery::PushDelivery;
pub use fanout::{FanoutReport, NotificationFanout};
pub use notification::Notification;
pub use registry::{JsonFileRegistry, MemoryRegistry, Subscriber, SubscriberKeys, SubscriberRegistry};
