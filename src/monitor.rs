// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The printer monitor.
//!
//! [`PrinterMonitor`] owns every piece of per-printer state and is the one
//! handle the rest of an application holds. It consumes transport events,
//! keeps the merged state current, turns job edges into notifications and
//! forwards usage counters, and sends commands back to the printer.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use printwatch::config::MonitorConfig;
//! use printwatch::monitor::PrinterMonitor;
//! use printwatch::notify::{HttpPushDelivery, JsonFileRegistry, NotificationFanout};
//! use printwatch::protocol::MqttTopicClient;
//! use printwatch::stats::MemoryUsageSink;
//!
//! # async fn example() -> printwatch::Result<()> {
//! let config = MonitorConfig::from_file("config.json")?;
//! let (client, inbound) = MqttTopicClient::builder(&config).spawn()?;
//! let fanout = NotificationFanout::new(
//!     JsonFileRegistry::new("subscriptions.json"),
//!     HttpPushDelivery::new()?,
//! );
//!
//! let monitor = Arc::new(PrinterMonitor::new(&config, client, fanout, MemoryUsageSink::new()));
//! let _poller = monitor.spawn_stats_poller(config.stats_poll_interval());
//!
//! let mut events = monitor.subscribe_events();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//! });
//!
//! monitor.run(inbound).await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::command::{CommandDispatcher, CommandRequest};
use crate::config::MonitorConfig;
use crate::error::{ProtocolError, Result};
use crate::event::{EventBus, PrintEvent};
use crate::notify::{NotificationFanout, PushDelivery, SubscriberRegistry};
use crate::protocol::{TopicClient, TransportEvent};
use crate::sequence::{SequenceGenerator, SequenceId};
use crate::state::{PrintStatus, StateDocument, StateStore, decode_message};
use crate::stats::{UsagePatch, UsageSink};

/// Result of a successfully published command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReceipt {
    /// Ids stamped into the published messages, in publish order.
    pub sequence_ids: Vec<SequenceId>,
}

impl CommandReceipt {
    /// Returns the last id, the one a single-message command consumed.
    #[must_use]
    pub fn last(&self) -> Option<SequenceId> {
        self.sequence_ids.last().copied()
    }
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorCounters {
    /// Report messages merged.
    pub messages_merged: u64,
    /// Report messages dropped as undecodable.
    pub messages_dropped: u64,
    /// Job events emitted.
    pub events_emitted: u64,
    /// Command messages published.
    pub commands_published: u64,
}

#[derive(Debug, Default)]
struct Counters {
    merged: AtomicU64,
    dropped: AtomicU64,
    events: AtomicU64,
    published: AtomicU64,
}

/// Work queued by the ingest path for the follow-up worker.
#[derive(Debug)]
enum Followup {
    Usage(UsagePatch),
    Notify(PrintEvent),
    Flush(oneshot::Sender<()>),
}

/// Per-printer composition root.
///
/// Lock discipline: the state store has its own lock, taken once per
/// message for merge and detection. Sequence ids come from an atomic that
/// is never touched under that lock.
///
/// Ingest never waits on I/O. Push delivery and usage persistence are queued
/// to a follow-up worker task, started by [`run`](Self::run) or
/// [`spawn_followup_worker`](Self::spawn_followup_worker), which handles
/// them in arrival order. Blocking registry and sink calls run on the
/// blocking pool.
#[derive(Debug)]
pub struct PrinterMonitor<C, R, D, S> {
    store: StateStore,
    dispatcher: CommandDispatcher,
    fanout: Arc<NotificationFanout<R, D>>,
    events: EventBus,
    usage: Arc<S>,
    client: C,
    report_topic: String,
    counters: Counters,
    followups: mpsc::UnboundedSender<Followup>,
    idle_worker: Mutex<Option<mpsc::UnboundedReceiver<Followup>>>,
}

impl<C, R, D, S> PrinterMonitor<C, R, D, S>
where
    C: TopicClient,
    R: SubscriberRegistry,
    D: PushDelivery,
    S: UsageSink,
{
    /// Creates a monitor for the printer described by `config`.
    ///
    /// The fanout's switch is set from `notifications_enabled`.
    #[must_use]
    pub fn new(
        config: &MonitorConfig,
        client: C,
        fanout: NotificationFanout<R, D>,
        usage: S,
    ) -> Self {
        fanout.set_enabled(config.notifications_enabled());
        let (followups, inbox) = mpsc::unbounded_channel();
        Self {
            store: StateStore::new(),
            dispatcher: CommandDispatcher::new(config.request_topic(), SequenceGenerator::new()),
            fanout: Arc::new(fanout),
            events: EventBus::new(),
            usage: Arc::new(usage),
            client,
            report_topic: config.report_topic(),
            counters: Counters::default(),
            followups,
            idle_worker: Mutex::new(Some(inbox)),
        }
    }

    /// Replaces the sequence generator.
    #[must_use]
    pub fn with_sequence(mut self, sequence: SequenceGenerator) -> Self {
        let topic = self.dispatcher.request_topic().to_string();
        self.dispatcher = CommandDispatcher::new(topic, sequence);
        self
    }

    /// Replaces the event bus, e.g. to share one across monitors.
    #[must_use]
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Processes one inbound message.
    ///
    /// Messages on topics other than the report topic are ignored. Usage
    /// counters are read from the raw message before it is merged. Job
    /// events go to the event bus at once; their notifications and the usage
    /// update are queued for the follow-up worker.
    ///
    /// Returns the job events the message caused.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for an undecodable payload; the state is left
    /// unchanged.
    pub fn handle_message(&self, topic: &str, payload: &[u8]) -> Result<Vec<PrintEvent>> {
        if topic != self.report_topic {
            tracing::trace!(topic = %topic, "ignoring message on unrelated topic");
            return Ok(Vec::new());
        }

        let message = match decode_message(payload) {
            Ok(message) => message,
            Err(e) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(topic = %topic, error = %e, "dropping undecodable report");
                return Err(e.into());
            }
        };

        let patch = UsagePatch::from_message(&message, chrono::Utc::now());
        let outcome = self.store.apply(message);
        self.counters.merged.fetch_add(1, Ordering::Relaxed);

        if let Some(patch) = patch {
            self.enqueue(Followup::Usage(patch));
        }

        for event in &outcome.events {
            tracing::info!(event = ?event, "print job event");
            self.counters.events.fetch_add(1, Ordering::Relaxed);
            self.events.publish(event.clone());
            self.enqueue(Followup::Notify(event.clone()));
        }

        Ok(outcome.events)
    }

    fn enqueue(&self, job: Followup) {
        if self.followups.send(job).is_err() {
            tracing::warn!("follow-up worker has stopped, dropping queued work");
        }
    }

    /// Processes one transport event.
    ///
    /// A (re)connect triggers a full status request so the state is
    /// rebuilt from a complete report.
    pub async fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                tracing::info!(topic = %self.report_topic, "printer connected");
                if let Err(e) = self.dispatch(&CommandRequest::RequestFullStatus).await {
                    tracing::warn!(error = %e, "full status request failed");
                }
            }
            TransportEvent::Disconnected => {
                tracing::warn!(topic = %self.report_topic, "printer disconnected");
            }
            TransportEvent::Message { topic, payload } => {
                // Errors are logged in handle_message.
                let _ = self.handle_message(&topic, &payload);
            }
        }
    }

    /// Returns a copy of the merged state.
    #[must_use]
    pub fn status_snapshot(&self) -> StateDocument {
        self.store.snapshot()
    }

    /// Returns a copy of the `print` section, if reported.
    #[must_use]
    pub fn print_snapshot(&self) -> Option<Value> {
        self.store.snapshot().section("print").cloned()
    }

    /// Returns the last typed print status, if any report was merged.
    #[must_use]
    pub fn print_status(&self) -> Option<PrintStatus> {
        self.store.print_status()
    }

    /// Validates, renders and publishes a command.
    ///
    /// Fails fast without drawing a sequence id if the request is invalid
    /// or the transport is down. A publish failure after rendering leaves a
    /// gap in the id sequence.
    ///
    /// # Errors
    ///
    /// - `Error::Value` for an invalid parameter
    /// - `Error::Protocol` if not connected or the publish fails
    pub async fn dispatch(&self, request: &CommandRequest) -> Result<CommandReceipt> {
        request.validate()?;
        if !self.client.is_connected() {
            tracing::debug!(command = request.name(), "rejecting command, not connected");
            return Err(ProtocolError::NotConnected.into());
        }

        let messages = self.dispatcher.dispatch(request)?;
        let mut sequence_ids = Vec::with_capacity(messages.len());
        for message in &messages {
            self.client.publish(message).await?;
            self.counters.published.fetch_add(1, Ordering::Relaxed);
            sequence_ids.push(message.sequence_id());
        }

        tracing::info!(command = request.name(), ids = ?sequence_ids, "command sent");
        Ok(CommandReceipt { sequence_ids })
    }

    /// Parses a command submit body and dispatches it.
    ///
    /// # Errors
    ///
    /// Returns the parse, validation or transport error; map it with
    /// [`Error::http_status`](crate::Error::http_status).
    pub async fn submit(&self, body: &Value) -> Result<CommandReceipt> {
        let request = CommandRequest::from_json(body)?;
        self.dispatch(&request).await
    }

    /// Parses a raw command submit body and dispatches it.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn submit_bytes(&self, body: &[u8]) -> Result<CommandReceipt> {
        let request = CommandRequest::from_slice(body)?;
        self.dispatch(&request).await
    }

    /// Subscribes to job events.
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<PrintEvent> {
        self.events.subscribe()
    }

    /// Returns the notification fanout.
    #[must_use]
    pub fn fanout(&self) -> &NotificationFanout<R, D> {
        self.fanout.as_ref()
    }

    /// Returns the usage sink.
    #[must_use]
    pub fn usage_sink(&self) -> &S {
        self.usage.as_ref()
    }

    /// Returns the topic client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the report topic this monitor listens on.
    #[must_use]
    pub fn report_topic(&self) -> &str {
        &self.report_topic
    }

    /// Returns the next sequence id without consuming it.
    #[must_use]
    pub fn next_sequence_id(&self) -> SequenceId {
        self.dispatcher.sequence().peek()
    }

    /// Returns a snapshot of the running counters.
    #[must_use]
    pub fn counters(&self) -> MonitorCounters {
        MonitorCounters {
            messages_merged: self.counters.merged.load(Ordering::Relaxed),
            messages_dropped: self.counters.dropped.load(Ordering::Relaxed),
            events_emitted: self.counters.events.load(Ordering::Relaxed),
            commands_published: self.counters.published.load(Ordering::Relaxed),
        }
    }

    /// Discards the merged state, e.g. before requesting a full report.
    pub fn reset_state(&self) {
        self.store.reset();
    }
}

impl<C, R, D, S> PrinterMonitor<C, R, D, S>
where
    C: TopicClient + Send + Sync + 'static,
    R: SubscriberRegistry + Send + Sync + 'static,
    D: PushDelivery + Send + Sync + 'static,
    S: UsageSink + Send + Sync + 'static,
{
    /// Consumes transport events until the channel closes.
    ///
    /// Starts the follow-up worker if it is not running yet.
    pub async fn run(&self, mut inbound: mpsc::Receiver<TransportEvent>) {
        if self.spawn_followup_worker().is_some() {
            tracing::debug!("follow-up worker started");
        }
        while let Some(event) = inbound.recv().await {
            self.handle_transport_event(event).await;
        }
        tracing::info!("transport closed, monitor stopping");
    }

    /// Starts the task that delivers notifications and stores usage
    /// counters queued by [`handle_message`](Self::handle_message).
    ///
    /// Returns `None` if the worker was already started. The worker stops
    /// once the monitor is dropped and the queue is drained.
    pub fn spawn_followup_worker(&self) -> Option<JoinHandle<()>> {
        let inbox = self.idle_worker.lock().take()?;
        Some(tokio::spawn(run_followups(
            inbox,
            Arc::clone(&self.fanout),
            Arc::clone(&self.usage),
        )))
    }

    /// Waits until all follow-up work queued so far has been handled,
    /// starting the worker if needed.
    pub async fn flush(&self) {
        let _ = self.spawn_followup_worker();
        let (done, finished) = oneshot::channel();
        if self.followups.send(Followup::Flush(done)).is_ok() {
            let _ = finished.await;
        }
    }

    /// Requests usage counters every `interval`, starting one interval from
    /// now. Ticks while disconnected are skipped.
    #[must_use]
    pub fn spawn_stats_poller(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !monitor.client.is_connected() {
                    tracing::debug!("skipping usage poll, not connected");
                    continue;
                }
                if let Err(e) = monitor.dispatch(&CommandRequest::RequestUsageStats).await {
                    tracing::warn!(error = %e, "usage poll failed");
                }
            }
        })
    }
}

async fn run_followups<R, D, S>(
    mut inbox: mpsc::UnboundedReceiver<Followup>,
    fanout: Arc<NotificationFanout<R, D>>,
    usage: Arc<S>,
) where
    R: SubscriberRegistry + Send + Sync + 'static,
    D: PushDelivery + Send + Sync + 'static,
    S: UsageSink + Send + Sync + 'static,
{
    while let Some(job) = inbox.recv().await {
        match job {
            Followup::Notify(event) => {
                fanout.notify(&event).await;
            }
            Followup::Usage(patch) => store_usage(&usage, patch).await,
            Followup::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("follow-up worker stopped");
}

async fn store_usage<S>(usage: &Arc<S>, patch: UsagePatch)
where
    S: UsageSink + Send + Sync + 'static,
{
    let sink = Arc::clone(usage);
    match tokio::task::spawn_blocking(move || sink.update_totals(&patch)).await {
        Ok(Ok(())) => tracing::info!(
            print_hours = ?patch.fields.print_hours,
            total_prints = ?patch.fields.total_prints,
            power_on_hours = ?patch.fields.power_on_hours,
            "usage counters updated"
        ),
        Ok(Err(e)) => tracing::warn!(error = %e, "failed to store usage counters"),
        Err(e) => tracing::warn!(error = %e, "usage update aborted"),
    }
}
