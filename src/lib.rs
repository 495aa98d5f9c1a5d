// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `printwatch` - A Rust library to monitor and command a networked 3D printer.
//!
//! The printer publishes partial status reports on an MQTT topic and accepts
//! JSON commands on another. This library keeps a merged view of those
//! reports, notices when a print job starts or ends, pushes notifications to
//! registered web-push endpoints and sends validated commands back.
//!
//! # Features
//!
//! - **State merging**: partial reports folded into one document
//! - **Job events**: `JobStarted` / `JobFinished` edges with outcome
//! - **Notifications**: fanout to push endpoints, gone endpoints pruned
//! - **Commands**: validated, rendered and stamped with sequence ids
//! - **Usage counters**: print hours and job counts from several firmware shapes
//!
//! # Cargo features
//!
//! - `mqtt` (default): [`protocol::MqttTopicClient`] on top of rumqttc
//! - `http` (default): [`notify::HttpPushDelivery`] on top of reqwest
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use printwatch::notify::{HttpPushDelivery, JsonFileRegistry, NotificationFanout};
//! use printwatch::protocol::MqttTopicClient;
//! use printwatch::stats::MemoryUsageSink;
//! use printwatch::{CommandRequest, MonitorConfig, PrinterMonitor};
//!
//! #[tokio::main]
//! async fn main() -> printwatch::Result<()> {
//!     let config = MonitorConfig::from_file("config.json")?;
//!     let (client, inbound) = MqttTopicClient::builder(&config).connect().await?;
//!
//!     let fanout = NotificationFanout::new(
//!         JsonFileRegistry::new("subscriptions.json"),
//!         HttpPushDelivery::new()?,
//!     );
//!     let monitor = Arc::new(PrinterMonitor::new(
//!         &config,
//!         client,
//!         fanout,
//!         MemoryUsageSink::new(),
//!     ));
//!
//!     let runner = Arc::clone(&monitor);
//!     tokio::spawn(async move { runner.run(inbound).await });
//!
//!     let receipt = monitor.dispatch(&CommandRequest::gcode("G28")?).await?;
//!     println!("homing sent as {:?}", receipt.last());
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod monitor;
pub mod notify;
pub mod protocol;
pub mod sequence;
pub mod state;
pub mod stats;
pub mod types;

pub use command::{CommandDispatcher, CommandRequest, OutboundMessage};
pub use config::MonitorConfig;
pub use error::{
    ConfigError, DeliveryError, Error, ParseError, ProtocolError, Result, ValueError,
};
pub use event::{EventBus, JobOutcome, PrintEvent};
pub use monitor::{CommandReceipt, MonitorCounters, PrinterMonitor};
pub use protocol::{TopicClient, TransportEvent};
pub use sequence::{SequenceGenerator, SequenceId};
pub use state::{JobStage, PrintStatus, StateDocument, StateStore};
pub use types::{
    BedTemperature, ChamberLightMode, FanSpeed, LightNode, NozzleTemperature, PrintSpeedTier,
    WorkLightMode,
};
