// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end monitor behaviour with in-memory collaborators.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use printwatch::notify::{
    MemoryRegistry, Notification, NotificationFanout, PushDelivery, Subscriber,
    SubscriberRegistry,
};
use printwatch::stats::MemoryUsageSink;
use printwatch::{
    CommandRequest, DeliveryError, JobOutcome, MonitorConfig, OutboundMessage, PrintEvent,
    PrinterMonitor, ProtocolError, TopicClient, TransportEvent,
};
use serde_json::{Value, json};

const REPORT: &str = "device/01P00A000000001/report";

#[derive(Default)]
struct FakeClient {
    connected: AtomicBool,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl TopicClient for FakeClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn publish(&self, message: &OutboundMessage) -> Result<(), ProtocolError> {
        if !self.is_connected() {
            return Err(ProtocolError::NotConnected);
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

/// Endpoints containing "gone" answer 410, "down" answers 500.
#[derive(Default)]
struct FakePush {
    attempts: Mutex<Vec<String>>,
}

impl PushDelivery for FakePush {
    async fn deliver(&self, subscriber: &Subscriber, _: &Notification) -> Result<(), DeliveryError> {
        self.attempts.lock().push(subscriber.endpoint.clone());
        if subscriber.endpoint.contains("gone") {
            Err(DeliveryError::Gone(410))
        } else if subscriber.endpoint.contains("down") {
            Err(DeliveryError::Rejected(500))
        } else {
            Ok(())
        }
    }
}

type Monitor = PrinterMonitor<FakeClient, MemoryRegistry, FakePush, MemoryUsageSink>;

fn monitor(connected: bool, endpoints: &[&str]) -> Monitor {
    let config = MonitorConfig::new("192.168.1.20", "12345678", "01P00A000000001");
    let client = FakeClient::default();
    client.connected.store(connected, Ordering::Release);
    let fanout = NotificationFanout::new(MemoryRegistry::new(), FakePush::default());
    for endpoint in endpoints {
        fanout.register(Subscriber::new(*endpoint)).unwrap();
    }
    PrinterMonitor::new(&config, client, fanout, MemoryUsageSink::new())
}

fn bytes(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

fn feed_stage(m: &Monitor, stage: &str, extra: Value) -> Vec<PrintEvent> {
    let mut print = json!({"gcode_state": stage});
    if let (Some(print), Some(extra)) = (print.as_object_mut(), extra.as_object()) {
        print.extend(extra.clone());
    }
    m.handle_message(REPORT, &bytes(&json!({ "print": print })))
        .unwrap()
}

// ============================================================================
// State merging
// ============================================================================

mod merging {
    use super::*;

    #[test]
    fn partial_reports_accumulate() {
        let m = monitor(true, &[]);
        m.handle_message(REPORT, &bytes(&json!({"print": {"a": 1}})))
            .unwrap();
        m.handle_message(REPORT, &bytes(&json!({"print": {"b": 2}})))
            .unwrap();
        assert_eq!(m.print_snapshot(), Some(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn repeated_message_is_idempotent() {
        let m = monitor(true, &[]);
        let msg = bytes(&json!({"print": {"nozzle_temper": 210}, "system": {"led": "on"}}));
        m.handle_message(REPORT, &msg).unwrap();
        let once = m.status_snapshot();
        m.handle_message(REPORT, &msg).unwrap();
        assert_eq!(m.status_snapshot(), once);
    }

    #[test]
    fn scalar_replaces_section() {
        let m = monitor(true, &[]);
        m.handle_message(REPORT, &bytes(&json!({"print": {"a": 1}})))
            .unwrap();
        m.handle_message(REPORT, &bytes(&json!({"print": "paused"})))
            .unwrap();
        assert_eq!(m.status_snapshot().to_value(), json!({"print": "paused"}));
    }

    #[test]
    fn garbage_payload_leaves_state_alone() {
        let m = monitor(true, &[]);
        m.handle_message(REPORT, &bytes(&json!({"print": {"a": 1}})))
            .unwrap();
        assert!(m.handle_message(REPORT, b"not json").is_err());
        assert!(m.handle_message(REPORT, b"[1, 2]").is_err());
        assert_eq!(m.print_snapshot(), Some(json!({"a": 1})));
    }
}

// ============================================================================
// Job events and notifications
// ============================================================================

mod job_events {
    use super::*;

    #[tokio::test]
    async fn idle_printing_printing_finished_yields_two_events() {
        let m = monitor(true, &["https://push/a"]);
        let mut all = Vec::new();
        all.extend(feed_stage(&m, "IDLE", json!({})));
        all.extend(feed_stage(&m, "PRINTING", json!({"gcode_file": "benchy.gcode"})));
        all.extend(feed_stage(&m, "PRINTING", json!({})));
        all.extend(feed_stage(&m, "FINISHED", json!({"print_error": 0})));

        assert_eq!(
            all,
            vec![
                PrintEvent::job_started("benchy.gcode"),
                PrintEvent::job_finished("benchy.gcode", JobOutcome::Success),
            ]
        );
        m.flush().await;
        assert_eq!(m.fanout().delivery().attempts.lock().len(), 2);
    }

    #[test]
    fn failed_job_carries_code() {
        let m = monitor(true, &[]);
        feed_stage(&m, "RUNNING", json!({"subtask_name": "plate_1"}));
        let events = feed_stage(&m, "FAILED", json!({"print_error": 50348044}));
        assert_eq!(
            events,
            vec![PrintEvent::job_finished(
                "plate_1",
                JobOutcome::Failed(Some(50_348_044))
            )]
        );
    }

    #[tokio::test]
    async fn gone_endpoint_is_pruned_others_kept() {
        let m = monitor(
            true,
            &["https://push/a", "https://push/gone", "https://push/down"],
        );
        feed_stage(&m, "IDLE", json!({}));
        feed_stage(&m, "PRINTING", json!({"gcode_file": "x.gcode"}));
        m.flush().await;

        let endpoints: Vec<String> = m
            .fanout()
            .registry()
            .get_all()
            .unwrap()
            .into_iter()
            .map(|s| s.endpoint)
            .collect();
        assert_eq!(endpoints, vec!["https://push/a", "https://push/down"]);

        // Pruned endpoints are not tried again.
        feed_stage(&m, "FINISH", json!({"print_error": 0}));
        m.flush().await;
        let attempts = m.fanout().delivery().attempts.lock().clone();
        assert_eq!(
            attempts.iter().filter(|e| e.contains("gone")).count(),
            1
        );
        assert_eq!(attempts.len(), 5);
    }

    #[tokio::test]
    async fn event_bus_sees_same_events() {
        let m = monitor(true, &[]);
        let mut rx = m.subscribe_events();
        feed_stage(&m, "PRINTING", json!({"gcode_file": "a.gcode"}));
        assert_eq!(rx.recv().await.unwrap(), PrintEvent::job_started("a.gcode"));
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn fan_percent_maps_to_device_range() {
        let m = monitor(true, &[]);
        m.submit(&json!({"command": "set_part_fan", "value": 100}))
            .await
            .unwrap();
        m.submit(&json!({"command": "set_part_fan", "value": 0}))
            .await
            .unwrap();
        let err = m
            .submit(&json!({"command": "set_part_fan", "value": 101}))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);

        let params: Vec<Value> = m
            .client()
            .sent
            .lock()
            .iter()
            .map(|msg| msg.payload()["print"]["param"].clone())
            .collect();
        assert_eq!(params, vec![json!("M106 P1 S255\n"), json!("M106 P1 S0\n")]);
    }

    #[tokio::test]
    async fn disconnected_dispatch_produces_nothing() {
        let m = monitor(false, &[]);
        let err = m.dispatch(&CommandRequest::PauseJob).await.unwrap_err();
        assert!(err.is_not_connected());
        assert_eq!(err.http_status(), 503);
        assert!(m.client().sent.lock().is_empty());
    }

    #[tokio::test]
    async fn unknown_command_is_bad_request() {
        let m = monitor(true, &[]);
        let err = m.submit(&json!({"command": "levitate"})).await.unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_dispatch_ids_are_unique() {
        let m = Arc::new(monitor(true, &[]));
        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let m = Arc::clone(&m);
                tokio::spawn(async move { m.dispatch(&CommandRequest::ResumeJob).await })
            })
            .collect();

        let mut ids = HashSet::new();
        for task in tasks {
            let receipt = task.await.unwrap().unwrap();
            assert!(ids.insert(receipt.last().unwrap()));
        }
        assert_eq!(ids.len(), 32);

        let wire: Vec<u64> = m
            .client()
            .sent
            .lock()
            .iter()
            .map(|msg| msg.sequence_id().value())
            .collect();
        let min = *wire.iter().min().unwrap();
        let mut sorted = wire.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (min..min + 32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn usage_request_fans_out_four_messages() {
        let m = monitor(true, &[]);
        let receipt = m.dispatch(&CommandRequest::RequestUsageStats).await.unwrap();
        assert_eq!(receipt.sequence_ids.len(), 4);
        assert!(receipt.sequence_ids.windows(2).all(|w| w[0] < w[1]));

        let sections: Vec<String> = m
            .client()
            .sent
            .lock()
            .iter()
            .map(|msg| {
                let (section, body) = msg.payload().as_object().unwrap().iter().next().unwrap();
                format!("{section}/{}", body["command"].as_str().unwrap())
            })
            .collect();
        assert_eq!(
            sections,
            vec![
                "pushing/pushall",
                "info/get_version",
                "system/get_printer_info",
                "print/get_print_stats",
            ]
        );
    }
}

// ============================================================================
// Usage counters
// ============================================================================

mod usage {
    use super::*;

    #[tokio::test]
    async fn replies_from_each_firmware_shape_update_totals() {
        let m = monitor(true, &[]);
        m.handle_message(
            REPORT,
            &bytes(&json!({"info": {"command": "get_version", "module": [
                {"name": "ota"},
                {"name": "printer", "statistics": {
                    "print_time": 120.5, "print_count": 42, "power_on_time": 300.0
                }}
            ]}})),
        )
        .unwrap();
        m.flush().await;
        let totals = m.usage_sink().totals();
        assert_eq!(totals.fields.print_hours, Some(120.5));
        assert_eq!(totals.fields.total_prints, Some(42));
        assert_eq!(totals.fields.power_on_hours, Some(300.0));

        m.handle_message(
            REPORT,
            &bytes(&json!({"pushing": {"print_stats": {"accumulated_time": 7200, "total_jobs": "43"}}})),
        )
        .unwrap();
        m.flush().await;
        let totals = m.usage_sink().totals();
        assert_eq!(totals.fields.print_hours, Some(2.0));
        assert_eq!(totals.fields.total_prints, Some(43));
        assert_eq!(totals.fields.power_on_hours, Some(300.0));
    }

    #[tokio::test]
    async fn reconnect_requests_full_status() {
        let m = monitor(true, &[]);
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        tx.send(TransportEvent::Connected).await.unwrap();
        tx.send(TransportEvent::Disconnected).await.unwrap();
        tx.send(TransportEvent::Connected).await.unwrap();
        drop(tx);
        m.run(rx).await;

        let sent = m.client().sent.lock();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|msg| msg.payload()["pushing"]["command"] == "pushall"));
    }
}
