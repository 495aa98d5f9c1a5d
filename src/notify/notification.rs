// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notification rendering.

use serde::Serialize;

use crate::event::{JobOutcome, PrintEvent};

/// A rendered push notification.
///
/// Serializes to the payload the web client's service worker expects:
///
/// ```json
/// {"title": "...", "body": "...", "icon": "...", "data": {"url": "/"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    title: String,
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct NotificationData {
    url: String,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: None,
            data: NotificationData { url: url.into() },
        }
    }

    /// Renders the notification for a job event.
    ///
    /// ```
    /// use printwatch::event::{JobOutcome, PrintEvent};
    /// use printwatch::notify::Notification;
    ///
    /// let n = Notification::for_event(
    ///     &PrintEvent::job_finished("cube.gcode", JobOutcome::Failed(Some(7))),
    ///     "/",
    /// );
    /// assert_eq!(n.title(), "Print failed");
    /// assert!(n.body().contains("code 7"));
    /// ```
    #[must_use]
    pub fn for_event(event: &PrintEvent, url: impl Into<String>) -> Self {
        let (title, body) = match event {
            PrintEvent::JobStarted { filename } => {
                ("Print started".to_string(), format!("Now printing {filename}."))
            }
            PrintEvent::JobFinished { filename, outcome } => match outcome {
                JobOutcome::Success => (
                    "Print finished".to_string(),
                    format!("{filename} completed successfully."),
                ),
                JobOutcome::UserStopped => (
                    "Print stopped".to_string(),
                    format!("{filename} was stopped by the user."),
                ),
                JobOutcome::Failed(Some(code)) => (
                    "Print failed".to_string(),
                    format!("{filename} failed with error code {code}."),
                ),
                JobOutcome::Failed(None) => (
                    "Print failed".to_string(),
                    format!("{filename} failed without an error code."),
                ),
            },
        };
        Self::new(title, body, url)
    }

    /// Sets the icon shown by the client.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the icon, if any.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Returns the URL opened when the notification is clicked.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.data.url
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn distinct_copy_per_outcome() {
        let outcomes = [
            PrintEvent::job_started("a"),
            PrintEvent::job_finished("a", JobOutcome::Success),
            PrintEvent::job_finished("a", JobOutcome::UserStopped),
            PrintEvent::job_finished("a", JobOutcome::Failed(Some(3))),
        ];
        let titles: std::collections::HashSet<_> = outcomes
            .iter()
            .map(|e| Notification::for_event(e, "/").title().to_string())
            .collect();
        assert_eq!(titles.len(), 4);
    }

    #[test]
    fn body_names_the_file() {
        let n = Notification::for_event(&PrintEvent::job_started("benchy.gcode"), "/");
        assert!(n.body().contains("benchy.gcode"));
    }

    #[test]
    fn serializes_for_service_worker() {
        let n = Notification::new("T", "B", "/status").with_icon("/static/icon.png");
        assert_eq!(
            serde_json::to_value(&n).unwrap(),
            json!({"title": "T", "body": "B", "icon": "/static/icon.png", "data": {"url": "/status"}})
        );
        let plain = Notification::new("T", "B", "/");
        assert!(serde_json::to_value(&plain).unwrap().get("icon").is_none());
    }
}
