// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push subscriber storage.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Encryption keys sent by the browser with a push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberKeys {
    /// Client public key.
    pub p256dh: String,
    /// Authentication secret.
    pub auth: String,
}

/// A push subscription, identified by its endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscriber {
    /// Push service endpoint.
    pub endpoint: String,
    /// Keys, when the browser supplied them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<SubscriberKeys>,
    /// Last time the browser (re)registered this endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Subscriber {
    /// Creates a subscriber without keys.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys: None,
            last_seen: None,
        }
    }

    /// Attaches browser keys.
    #[must_use]
    pub fn with_keys(mut self, p256dh: impl Into<String>, auth: impl Into<String>) -> Self {
        self.keys = Some(SubscriberKeys {
            p256dh: p256dh.into(),
            auth: auth.into(),
        });
        self
    }

    /// Sets the last-seen time.
    #[must_use]
    pub fn seen_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_seen = Some(at);
        self
    }
}

/// Storage for push subscribers.
///
/// Endpoints are unique: `upsert` replaces an existing entry with the same
/// endpoint.
pub trait SubscriberRegistry {
    /// Returns every registered subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get_all(&self) -> Result<Vec<Subscriber>>;

    /// Removes the given endpoints in one batch and returns how many were
    /// present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, endpoints: &[String]) -> Result<usize>;

    /// Adds or replaces a subscriber. Returns `true` if it was new.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn upsert(&self, subscriber: Subscriber) -> Result<bool>;
}

fn upsert_into(list: &mut Vec<Subscriber>, subscriber: Subscriber) -> bool {
    if let Some(existing) = list.iter_mut().find(|s| s.endpoint == subscriber.endpoint) {
        *existing = subscriber;
        false
    } else {
        list.push(subscriber);
        true
    }
}

fn remove_from(list: &mut Vec<Subscriber>, endpoints: &[String]) -> usize {
    let before = list.len();
    list.retain(|s| !endpoints.contains(&s.endpoint));
    before - list.len()
}

/// In-memory registry.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Returns `true` if no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }
}

impl SubscriberRegistry for MemoryRegistry {
    fn get_all(&self) -> Result<Vec<Subscriber>> {
        Ok(self.subscribers.lock().clone())
    }

    fn remove(&self, endpoints: &[String]) -> Result<usize> {
        Ok(remove_from(&mut self.subscribers.lock(), endpoints))
    }

    fn upsert(&self, subscriber: Subscriber) -> Result<bool> {
        Ok(upsert_into(&mut self.subscribers.lock(), subscriber))
    }
}

/// Registry persisted as a JSON array, written through on every change.
///
/// A missing file reads as an empty registry and is created on first write.
#[derive(Debug)]
pub struct JsonFileRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRegistry {
    /// Creates a registry backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Subscriber>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(source).into()),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|source| {
            ConfigError::Json {
                path: self.path.display().to_string(),
                source,
            }
            .into()
        })
    }

    fn store(&self, subscribers: &[Subscriber]) -> Result<()> {
        let text = serde_json::to_string_pretty(subscribers).map_err(|source| ConfigError::Json {
            path: self.path.display().to_string(),
            source,
        })?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SubscriberRegistry for JsonFileRegistry {
    fn get_all(&self) -> Result<Vec<Subscriber>> {
        let _guard = self.lock.lock();
        self.load()
    }

    fn remove(&self, endpoints: &[String]) -> Result<usize> {
        let _guard = self.lock.lock();
        let mut list = self.load()?;
        let removed = remove_from(&mut list, endpoints);
        if removed > 0 {
            self.store(&list)?;
        }
        Ok(removed)
    }

    fn upsert(&self, subscriber: Subscriber) -> Result<bool> {
        let _guard = self.lock.lock();
        let mut list = self.load()?;
        let added = upsert_into(&mut list, subscriber);
        self.store(&list)?;
        Ok(added)
    }
}
