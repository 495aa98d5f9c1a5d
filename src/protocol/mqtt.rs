// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT transport for the printer's local broker.
//!
//! # Examples
//!
//! ```no_run
//! use printwatch::config::MonitorConfig;
//! use printwatch::protocol::{MqttTopicClient, TopicClient};
//!
//! # async fn example() -> Result<(), printwatch::error::ProtocolError> {
//! let config = MonitorConfig::new("192.168.1.40", "12345678", "01S00A000000000")
//!     .with_ca_certificate("/etc/printwatch/printer-ca.pem");
//!
//! let (client, mut inbound) = MqttTopicClient::builder(&config).connect().await?;
//! assert!(client.is_connected());
//!
//! while let Some(event) = inbound.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, TlsConfiguration,
    Transport,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::command::OutboundMessage;
use crate::config::MonitorConfig;
use crate::error::ProtocolError;

use super::{TopicClient, TransportEvent};

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Largest packet accepted or sent. Full status reports exceed rumqttc's
/// 10 KiB default.
const MAX_PACKET_SIZE: usize = 256 * 1024;

/// Requests buffered between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 32;

/// Options for an MQTT connection to one printer.
#[derive(Debug, Clone)]
struct MqttSettings {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    report_topic: String,
    use_tls: bool,
    ca_certificate: Option<PathBuf>,
    keep_alive: Duration,
    connection_timeout: Duration,
    reconnect_delay: Duration,
    inbound_capacity: usize,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8883,
            credentials: None,
            report_topic: String::new(),
            use_tls: true,
            ca_certificate: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
            inbound_capacity: 64,
        }
    }
}

/// MQTT topic client.
///
/// Cheap to clone. A background task polls the rumqttc event loop, and on
/// every (re)connect subscribes to the report topic and emits
/// [`TransportEvent::Connected`]. Connection errors mark the client
/// disconnected; polling resumes after a short delay, which makes rumqttc
/// reconnect. The task ends when the inbound receiver is dropped or after
/// [`disconnect`](Self::disconnect).
#[derive(Clone)]
pub struct MqttTopicClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    client: AsyncClient,
    connected: AtomicBool,
    report_topic: String,
    host: String,
    port: u16,
}

impl MqttTopicClient {
    /// Creates a builder preloaded from a monitor configuration.
    #[must_use]
    pub fn builder(config: &MonitorConfig) -> MqttTopicClientBuilder {
        let mut builder = MqttTopicClientBuilder::default()
            .host(config.printer_ip())
            .port(config.mqtt_port())
            .credentials(config.mqtt_username(), config.access_code())
            .report_topic(config.report_topic())
            .use_tls(config.use_tls())
            .keep_alive(config.keep_alive());
        if let Some(ca) = config.ca_certificate() {
            builder = builder.ca_certificate(ca);
        }
        builder
    }

    /// Returns the topic subscribed on every connect.
    #[must_use]
    pub fn report_topic(&self) -> &str {
        &self.inner.report_topic
    }

    /// Disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.host,
            port = %self.inner.port,
            "Disconnecting from printer broker"
        );
        self.inner.connected.store(false, Ordering::Release);
        self.inner.client.disconnect().await?;
        Ok(())
    }

    fn set_connected(&self, connected: bool) -> bool {
        self.inner.connected.swap(connected, Ordering::AcqRel)
    }
}

impl TopicClient for MqttTopicClient {
    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    async fn publish(&self, message: &OutboundMessage) -> Result<(), ProtocolError> {
        if !self.is_connected() {
            return Err(ProtocolError::NotConnected);
        }
        let payload = message.to_bytes()?;
        self.inner
            .client
            .publish(message.topic(), QoS::AtMostOnce, false, payload)
            .await?;
        tracing::debug!(
            topic = %message.topic(),
            sequence_id = %message.sequence_id(),
            "Command published"
        );
        Ok(())
    }
}

impl std::fmt::Debug for MqttTopicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTopicClient")
            .field("host", &self.inner.host)
            .field("port", &self.inner.port)
            .field("report_topic", &self.inner.report_topic)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builder for [`MqttTopicClient`].
#[derive(Debug, Default)]
pub struct MqttTopicClientBuilder {
    settings: MqttSettings,
}

impl MqttTopicClientBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.settings.host = host.into();
        self
    }

    /// Sets the broker port (default: 8883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.settings.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.settings.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the topic to subscribe on connect.
    #[must_use]
    pub fn report_topic(mut self, topic: impl Into<String>) -> Self {
        self.settings.report_topic = topic.into();
        self
    }

    /// Enables or disables TLS (default: enabled).
    #[must_use]
    pub fn use_tls(mut self, use_tls: bool) -> Self {
        self.settings.use_tls = use_tls;
        self
    }

    /// Sets the PEM file used to verify the broker certificate.
    ///
    /// Without one, TLS verifies against the platform roots.
    #[must_use]
    pub fn ca_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.ca_certificate = Some(path.into());
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.settings.keep_alive = duration;
        self
    }

    /// Sets how long [`connect`](Self::connect) waits for the first
    /// acknowledgement (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.settings.connection_timeout = duration;
        self
    }

    /// Sets the pause after a connection error (default: 5 seconds).
    #[must_use]
    pub fn reconnect_delay(mut self, duration: Duration) -> Self {
        self.settings.reconnect_delay = duration;
        self
    }

    /// Sets the inbound channel capacity (default: 64).
    #[must_use]
    pub fn inbound_capacity(mut self, capacity: usize) -> Self {
        self.settings.inbound_capacity = capacity.max(1);
        self
    }

    fn mqtt_options(&self) -> Result<MqttOptions, ProtocolError> {
        let s = &self.settings;
        if s.host.is_empty() {
            return Err(ProtocolError::ConnectionFailed(
                "printer host is required".to_string(),
            ));
        }
        if s.report_topic.is_empty() {
            return Err(ProtocolError::ConnectionFailed(
                "report topic is required".to_string(),
            ));
        }

        let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("printwatch_{}_{}", std::process::id(), counter);

        let mut options = MqttOptions::new(client_id, &s.host, s.port);
        options.set_keep_alive(s.keep_alive);
        options.set_clean_session(true);
        options.set_max_packet_size(MAX_PACKET_SIZE, MAX_PACKET_SIZE);

        if let Some((username, password)) = &s.credentials {
            options.set_credentials(username, password);
        }

        if s.use_tls {
            let transport = match &s.ca_certificate {
                Some(path) => {
                    let ca = std::fs::read(path).map_err(|e| {
                        ProtocolError::ConnectionFailed(format!(
                            "cannot read CA certificate {}: {e}",
                            path.display()
                        ))
                    })?;
                    Transport::Tls(TlsConfiguration::Simple {
                        ca,
                        alpn: None,
                        client_auth: None,
                    })
                }
                None => Transport::tls_with_default_config(),
            };
            options.set_transport(transport);
        }

        Ok(options)
    }

    /// Starts the client without waiting for the broker.
    ///
    /// The returned receiver yields inbound events; the first is
    /// [`TransportEvent::Connected`] once the broker answers.
    ///
    /// # Errors
    ///
    /// Returns error if the host or report topic is missing or the CA
    /// certificate cannot be read.
    pub fn spawn(self) -> Result<(MqttTopicClient, mpsc::Receiver<TransportEvent>), ProtocolError> {
        let (client, inbound, _, _) = self.start(None)?;
        Ok((client, inbound))
    }

    /// Starts the client and waits for the first connection acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns error if the options are invalid, or if the broker does not
    /// answer within the connection timeout.
    pub async fn connect(
        self,
    ) -> Result<(MqttTopicClient, mpsc::Receiver<TransportEvent>), ProtocolError> {
        let timeout = self.settings.connection_timeout;
        let (connack_tx, connack_rx) = oneshot::channel();
        let (client, inbound, task, settings) = self.start(Some(connack_tx))?;

        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %settings.host,
                    port = %settings.port,
                    "Connected to printer broker"
                );
                Ok((client, inbound))
            }
            Ok(Err(_)) => {
                task.abort();
                Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ))
            }
            Err(_) => {
                task.abort();
                Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )))
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn start(
        self,
        connack_tx: Option<oneshot::Sender<()>>,
    ) -> Result<
        (
            MqttTopicClient,
            mpsc::Receiver<TransportEvent>,
            JoinHandle<()>,
            MqttSettings,
        ),
        ProtocolError,
    > {
        let options = self.mqtt_options()?;
        let settings = self.settings;
        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(settings.inbound_capacity);

        let handle = MqttTopicClient {
            inner: Arc::new(ClientInner {
                client,
                connected: AtomicBool::new(false),
                report_topic: settings.report_topic.clone(),
                host: settings.host.clone(),
                port: settings.port,
            }),
        };

        let task = tokio::spawn(handle_broker_events(
            event_loop,
            handle.clone(),
            inbound_tx,
            connack_tx,
            settings.reconnect_delay,
        ));

        Ok((handle, inbound_rx, task, settings))
    }
}

/// Polls the event loop until the inbound receiver goes away.
async fn handle_broker_events(
    mut event_loop: EventLoop,
    client: MqttTopicClient,
    inbound: mpsc::Sender<TransportEvent>,
    connack_tx: Option<oneshot::Sender<()>>,
    reconnect_delay: Duration,
) {
    let mut connack_tx = connack_tx;

    loop {
        let event = match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "Printer broker connected");
                client.set_connected(true);
                // try_subscribe: awaiting here would block the loop that drains the request queue
                if let Err(e) = client
                    .inner
                    .client
                    .try_subscribe(client.report_topic(), QoS::AtMostOnce)
                {
                    tracing::warn!(topic = %client.report_topic(), error = %e, "Failed to subscribe to report topic");
                }
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
                Some(TransportEvent::Connected)
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "Subscription acknowledged");
                None
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                tracing::debug!(
                    topic = %publish.topic,
                    bytes = publish.payload.len(),
                    "Message received"
                );
                Some(TransportEvent::Message {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                })
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("Printer broker sent disconnect");
                client
                    .set_connected(false)
                    .then_some(TransportEvent::Disconnected)
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("Disconnect sent, stopping event loop");
                if client.set_connected(false) {
                    let _ = inbound.send(TransportEvent::Disconnected).await;
                }
                break;
            }
            Ok(_) => None,
            Err(e) => {
                let was_connected = client.set_connected(false);
                tracing::error!(error = %e, "Printer broker event loop error");
                if was_connected
                    && inbound.send(TransportEvent::Disconnected).await.is_err()
                {
                    break;
                }
                tokio::time::sleep(reconnect_delay).await;
                None
            }
        };

        if let Some(event) = event
            && inbound.send(event).await.is_err()
        {
            tracing::debug!("Inbound receiver dropped, stopping event loop");
            break;
        }
    }

    client.set_connected(false);
}
