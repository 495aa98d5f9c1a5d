// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Printer connection settings.
//!
//! # Examples
//!
//! ```
//! use printwatch::config::MonitorConfig;
//!
//! let config = MonitorConfig::new("192.168.1.40", "12345678", "01S00A000000000")
//!     .with_notifications_enabled(false);
//!
//! assert_eq!(config.mqtt_port(), 8883);
//! assert_eq!(config.report_topic(), "device/01S00A000000000/report");
//! assert_eq!(config.request_topic(), "device/01S00A000000000/request");
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_MQTT_PORT: u16 = 8883;
const DEFAULT_MQTT_USERNAME: &str = "bblp";
const DEFAULT_STATS_POLL_SECS: u64 = 30 * 60;
const DEFAULT_KEEP_ALIVE_SECS: u64 = 30;

/// Settings for monitoring one printer.
///
/// Deserializes from JSON. Keys are snake case; the upper-case names
/// `PRINTER_IP`, `ACCESS_CODE` and `DEVICE_ID` are accepted as aliases.
/// Every field except the three required ones has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    #[serde(alias = "PRINTER_IP")]
    printer_ip: String,
    #[serde(alias = "ACCESS_CODE")]
    access_code: String,
    #[serde(alias = "DEVICE_ID")]
    device_id: String,
    mqtt_port: u16,
    mqtt_username: String,
    ca_certificate: Option<PathBuf>,
    use_tls: bool,
    notifications_enabled: bool,
    stats_poll_interval_secs: u64,
    keep_alive_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            printer_ip: String::new(),
            access_code: String::new(),
            device_id: String::new(),
            mqtt_port: DEFAULT_MQTT_PORT,
            mqtt_username: DEFAULT_MQTT_USERNAME.to_string(),
            ca_certificate: None,
            use_tls: true,
            notifications_enabled: true,
            stats_poll_interval_secs: DEFAULT_STATS_POLL_SECS,
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
        }
    }
}

impl MonitorConfig {
    /// Creates a configuration with defaults for everything but the
    /// required keys.
    #[must_use]
    pub fn new(
        printer_ip: impl Into<String>,
        access_code: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            printer_ip: printer_ip.into(),
            access_code: access_code.into(),
            device_id: device_id.into(),
            ..Self::default()
        }
    }

    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, is not valid JSON,
    /// or lacks a required key.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), device = %config.device_id, "configuration loaded");
        Ok(config)
    }

    /// Checks that the required keys are present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKeys` listing every missing key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = [
            ("printer_ip", &self.printer_ip),
            ("access_code", &self.access_code),
            ("device_id", &self.device_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys(missing))
        }
    }

    /// Sets the MQTT port.
    #[must_use]
    pub fn with_mqtt_port(mut self, port: u16) -> Self {
        self.mqtt_port = port;
        self
    }

    /// Sets the MQTT user name.
    #[must_use]
    pub fn with_mqtt_username(mut self, username: impl Into<String>) -> Self {
        self.mqtt_username = username.into();
        self
    }

    /// Sets the PEM file used to verify the printer certificate.
    #[must_use]
    pub fn with_ca_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_certificate = Some(path.into());
        self
    }

    /// Enables or disables TLS.
    #[must_use]
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Sets the initial push notification switch.
    #[must_use]
    pub fn with_notifications_enabled(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }

    /// Sets the usage counter polling interval.
    #[must_use]
    pub fn with_stats_poll_interval(mut self, interval: Duration) -> Self {
        self.stats_poll_interval_secs = interval.as_secs();
        self
    }

    /// Sets the MQTT keep-alive.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive_secs = keep_alive.as_secs();
        self
    }

    /// Returns the printer address.
    #[must_use]
    pub fn printer_ip(&self) -> &str {
        &self.printer_ip
    }

    /// Returns the LAN access code, used as the MQTT password.
    #[must_use]
    pub fn access_code(&self) -> &str {
        &self.access_code
    }

    /// Returns the printer serial number.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns the MQTT port.
    #[must_use]
    pub fn mqtt_port(&self) -> u16 {
        self.mqtt_port
    }

    /// Returns the MQTT user name.
    #[must_use]
    pub fn mqtt_username(&self) -> &str {
        &self.mqtt_username
    }

    /// Returns the CA certificate path, if set.
    #[must_use]
    pub fn ca_certificate(&self) -> Option<&Path> {
        self.ca_certificate.as_deref()
    }

    /// Returns whether TLS is used.
    #[must_use]
    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// Returns the initial push notification switch.
    #[must_use]
    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    /// Returns the usage counter polling interval.
    #[must_use]
    pub fn stats_poll_interval(&self) -> Duration {
        Duration::from_secs(self.stats_poll_interval_secs)
    }

    /// Returns the MQTT keep-alive.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Returns the topic the printer publishes status on.
    #[must_use]
    pub fn report_topic(&self) -> String {
        format!("device/{}/report", self.device_id)
    }

    /// Returns the topic the printer accepts commands on.
    #[must_use]
    pub fn request_topic(&self) -> String {
        format!("device/{}/request", self.device_id)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn defaults() {
        let config = MonitorConfig::new("10.0.0.2", "code", "SN1");
        assert_eq!(config.mqtt_username(), "bblp");
        assert!(config.use_tls());
        assert!(config.notifications_enabled());
        assert_eq!(config.stats_poll_interval(), Duration::from_secs(1800));
        assert_eq!(config.keep_alive(), Duration::from_secs(30));
        assert!(config.ca_certificate().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let config = MonitorConfig::new("10.0.0.2", "code", "SN1")
            .with_mqtt_port(1883)
            .with_tls(false)
            .with_ca_certificate("/etc/printer-ca.pem")
            .with_stats_poll_interval(Duration::from_secs(60));
        assert_eq!(config.mqtt_port(), 1883);
        assert!(!config.use_tls());
        assert_eq!(
            config.ca_certificate(),
            Some(Path::new("/etc/printer-ca.pem"))
        );
        assert_eq!(config.stats_poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn validate_lists_every_missing_key() {
        let err = MonitorConfig::new("", "code", " ").validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingKeys(ref keys) if keys == &["printer_ip", "device_id"]
        ));
    }

    #[test]
    fn load_from_file_with_upper_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"PRINTER_IP": "192.168.1.40", "ACCESS_CODE": "abc", "DEVICE_ID": "SN9", "mqtt_port": 1883}"#,
        )
        .unwrap();
        let config = MonitorConfig::from_file(&path).unwrap();
        assert_eq!(config.printer_ip(), "192.168.1.40");
        assert_eq!(config.mqtt_port(), 1883);
        assert_eq!(config.request_topic(), "device/SN9/request");
    }

    #[test]
    fn load_rejects_missing_required() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"printer_ip": "1.2.3.4"}"#).unwrap();
        let err = MonitorConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKeys(ref k) if k.len() == 2));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = MonitorConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_reports_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(
            MonitorConfig::from_file(&path),
            Err(ConfigError::Json { .. })
        ));
    }
}
