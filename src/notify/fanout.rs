// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Best-effort delivery to every subscriber.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;
use crate::event::PrintEvent;

use super::{Notification, PushDelivery, Subscriber, SubscriberRegistry};

/// Default URL opened when a notification is clicked.
const DEFAULT_CLICK_URL: &str = "/";

/// Counts from one fanout round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Deliveries the push service accepted.
    pub delivered: usize,
    /// Deliveries that failed for any reason, gone endpoints included.
    pub failed: usize,
    /// Subscribers removed because their endpoint is gone.
    pub pruned: usize,
}

/// Sends each job event to all registered subscribers.
///
/// Delivery is at-most-once with no retry. One subscriber failing never
/// affects the others. Endpoints reported gone are collected during the
/// round and removed from the registry in one batch afterwards. Registry
/// reads and writes made by [`notify`](Self::notify) run on the blocking
/// pool.
///
/// # Examples
///
/// ```
/// use printwatch::error::DeliveryError;
/// use printwatch::event::PrintEvent;
/// use printwatch::notify::{
///     MemoryRegistry, Notification, NotificationFanout, PushDelivery, Subscriber,
/// };
///
/// struct AlwaysGone;
///
/// impl PushDelivery for AlwaysGone {
///     async fn deliver(&self, _: &Subscriber, _: &Notification) -> Result<(), DeliveryError> {
///         Err(DeliveryError::Gone(410))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fanout = NotificationFanout::new(MemoryRegistry::new(), AlwaysGone);
/// fanout.register(Subscriber::new("https://push/a")).unwrap();
///
/// let report = fanout.notify(&PrintEvent::job_started("cube.gcode")).await;
/// assert_eq!(report.pruned, 1);
/// assert!(fanout.registry().is_empty());
/// # }
/// ```
#[derive(Debug)]
pub struct NotificationFanout<R, D> {
    registry: Arc<R>,
    delivery: D,
    enabled: AtomicBool,
    click_url: String,
    icon: Option<String>,
}

impl<R, D> NotificationFanout<R, D>
where
    R: SubscriberRegistry,
    D: PushDelivery,
{
    /// Creates an enabled fanout.
    #[must_use]
    pub fn new(registry: R, delivery: D) -> Self {
        Self {
            registry: Arc::new(registry),
            delivery,
            enabled: AtomicBool::new(true),
            click_url: DEFAULT_CLICK_URL.to_string(),
            icon: None,
        }
    }

    /// Sets the initial administrative switch.
    #[must_use]
    pub fn with_enabled(self, enabled: bool) -> Self {
        self.enabled.store(enabled, Ordering::Release);
        self
    }

    /// Sets the URL opened when a notification is clicked.
    #[must_use]
    pub fn with_click_url(mut self, url: impl Into<String>) -> Self {
        self.click_url = url.into();
        self
    }

    /// Sets the icon attached to every notification.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Turns notifications on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        tracing::info!(enabled, "push notifications toggled");
    }

    /// Returns the administrative switch.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Returns the subscriber registry.
    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Returns the delivery transport.
    #[must_use]
    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Adds or replaces a subscriber, stamping it as seen now.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be written.
    pub fn register(&self, subscriber: Subscriber) -> Result<bool> {
        let added = self.registry.upsert(subscriber.seen_at(chrono::Utc::now()))?;
        tracing::debug!(added, "subscriber registered");
        Ok(added)
    }

    /// Removes a subscriber by endpoint. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be written.
    pub fn unregister(&self, endpoint: &str) -> Result<bool> {
        Ok(self.registry.remove(&[endpoint.to_string()])? > 0)
    }

    /// Renders the notification for an event.
    #[must_use]
    pub fn render(&self, event: &PrintEvent) -> Notification {
        let notification = Notification::for_event(event, self.click_url.as_str());
        match &self.icon {
            Some(icon) => notification.with_icon(icon.as_str()),
            None => notification,
        }
    }
}

impl<R, D> NotificationFanout<R, D>
where
    R: SubscriberRegistry + Send + Sync + 'static,
    D: PushDelivery,
{
    /// Delivers an event to every subscriber and prunes gone endpoints.
    ///
    /// Does nothing, not even a registry read, when disabled.
    pub async fn notify(&self, event: &PrintEvent) -> FanoutReport {
        let mut report = FanoutReport::default();
        if !self.is_enabled() {
            tracing::trace!("push notifications disabled, skipping");
            return report;
        }

        let registry = Arc::clone(&self.registry);
        let subscribers = match tokio::task::spawn_blocking(move || registry.get_all()).await {
            Ok(Ok(list)) => list,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "cannot read subscriber registry");
                return report;
            }
            Err(e) => {
                tracing::warn!(error = %e, "subscriber registry read aborted");
                return report;
            }
        };
        if subscribers.is_empty() {
            return report;
        }

        let notification = self.render(event);
        let mut gone = Vec::new();
        for subscriber in &subscribers {
            match self.delivery.deliver(subscriber, &notification).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    if e.is_gone() {
                        tracing::info!(endpoint = %subscriber.endpoint, error = %e, "subscriber gone");
                        gone.push(subscriber.endpoint.clone());
                    } else {
                        tracing::warn!(endpoint = %subscriber.endpoint, error = %e, "push delivery failed");
                    }
                }
            }
        }

        if !gone.is_empty() {
            let registry = Arc::clone(&self.registry);
            match tokio::task::spawn_blocking(move || registry.remove(&gone)).await {
                Ok(Ok(n)) => report.pruned = n,
                Ok(Err(e)) => tracing::warn!(error = %e, "cannot prune gone subscribers"),
                Err(e) => tracing::warn!(error = %e, "subscriber prune aborted"),
            }
        }

        tracing::debug!(
            delivered = report.delivered,
            failed = report.failed,
            pruned = report.pruned,
            "notification fanout complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;
    use crate::error::DeliveryError;
    use crate::event::JobOutcome;
    use crate::notify::MemoryRegistry;

    /// Scripted delivery: per-endpoint outcome, records every attempt.
    #[derive(Default)]
    struct ScriptedDelivery {
        outcomes: HashMap<String, u16>,
        attempts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedDelivery {
        fn with(mut self, endpoint: &str, status: u16) -> Self {
            self.outcomes.insert(endpoint.to_string(), status);
            self
        }

        fn attempts(&self) -> Vec<(String, String)> {
            self.attempts.lock().clone()
        }
    }

    impl PushDelivery for ScriptedDelivery {
        async fn deliver(
            &self,
            subscriber: &Subscriber,
            notification: &Notification,
        ) -> std::result::Result<(), DeliveryError> {
            self.attempts
                .lock()
                .push((subscriber.endpoint.clone(), notification.title().to_string()));
            match self.outcomes.get(&subscriber.endpoint) {
                None => Ok(()),
                Some(404 | 410) => Err(DeliveryError::Gone(410)),
                Some(0) => Err(DeliveryError::Transport("connection refused".into())),
                Some(&s) => Err(DeliveryError::Rejected(s)),
            }
        }
    }

    /// Registry that fails every call, used to prove the disabled path never reads it.
    struct PoisonRegistry;

    impl SubscriberRegistry for PoisonRegistry {
        fn get_all(&self) -> Result<Vec<Subscriber>> {
            panic!("registry read while disabled")
        }
        fn remove(&self, _: &[String]) -> Result<usize> {
            panic!("registry write while disabled")
        }
        fn upsert(&self, _: Subscriber) -> Result<bool> {
            panic!("registry write while disabled")
        }
    }

    fn fanout(
        delivery: ScriptedDelivery,
        endpoints: &[&str],
    ) -> NotificationFanout<MemoryRegistry, ScriptedDelivery> {
        let f = NotificationFanout::new(MemoryRegistry::new(), delivery);
        for e in endpoints {
            f.register(Subscriber::new(*e)).unwrap();
        }
        f
    }

    #[tokio::test]
    async fn gone_endpoint_pruned_others_delivered() {
        let f = fanout(ScriptedDelivery::default().with("b", 410), &["a", "b", "c"]);
        let report = f
            .notify(&PrintEvent::job_finished("x", JobOutcome::Success))
            .await;

        assert_eq!(
            report,
            FanoutReport {
                delivered: 2,
                failed: 1,
                pruned: 1
            }
        );
        let left: Vec<_> = f
            .registry()
            .get_all()
            .unwrap()
            .into_iter()
            .map(|s| s.endpoint)
            .collect();
        assert_eq!(left, vec!["a", "c"]);
        assert_eq!(f.delivery().attempts().len(), 3);
    }

    #[tokio::test]
    async fn transient_failures_keep_subscriber() {
        let delivery = ScriptedDelivery::default().with("a", 500).with("b", 0);
        let f = fanout(delivery, &["a", "b"]);
        let report = f.notify(&PrintEvent::job_started("x")).await;
        assert_eq!(report.failed, 2);
        assert_eq!(report.pruned, 0);
        assert_eq!(f.registry().len(), 2);
    }

    #[tokio::test]
    async fn disabled_skips_registry_entirely() {
        let f = NotificationFanout::new(PoisonRegistry, ScriptedDelivery::default())
            .with_enabled(false);
        let report = f.notify(&PrintEvent::job_started("x")).await;
        assert_eq!(report, FanoutReport::default());
        assert!(f.delivery().attempts().is_empty());
    }

    #[tokio::test]
    async fn toggle_at_runtime() {
        let f = fanout(ScriptedDelivery::default(), &["a"]);
        f.set_enabled(false);
        assert_eq!(f.notify(&PrintEvent::job_started("x")).await.delivered, 0);
        f.set_enabled(true);
        assert_eq!(f.notify(&PrintEvent::job_started("x")).await.delivered, 1);
    }

    #[tokio::test]
    async fn no_subscribers_no_delivery() {
        let f = fanout(ScriptedDelivery::default(), &[]);
        let report = f.notify(&PrintEvent::job_started("x")).await;
        assert_eq!(report, FanoutReport::default());
        assert!(f.delivery().attempts().is_empty());
    }

    #[tokio::test]
    async fn rendered_copy_reaches_delivery() {
        let f = fanout(ScriptedDelivery::default(), &["a"]).with_icon("/icon.png");
        f.notify(&PrintEvent::job_finished("x", JobOutcome::UserStopped))
            .await;
        assert_eq!(f.delivery().attempts()[0].1, "Print stopped");
        assert_eq!(
            f.render(&PrintEvent::job_started("x")).icon(),
            Some("/icon.png")
        );
    }

    #[test]
    fn unregister_reports_presence() {
        let f = fanout(ScriptedDelivery::default(), &["a"]);
        assert!(f.unregister("a").unwrap());
        assert!(!f.unregister("a").unwrap());
    }

    #[test]
    fn register_stamps_last_seen() {
        let before = chrono::Utc::now();
        let f = fanout(ScriptedDelivery::default(), &["a"]);
        let stored = f.registry().get_all().unwrap();
        assert!(stored[0].last_seen.is_some_and(|t| t >= before));
    }
}
