//! Environment propagation between pipeline stages.
//!
//! Every stage reads and writes the same [`EnvStore`]. Values computed by an
//! earlier stage (image name, app name, version) must never be clobbered by a
//! later-loaded properties file, so all file-sourced merges go through the
//! absent-only policy.

use serde::Serialize;

/// Well-known environment keys shared across stages and templates.
pub struct EnvKeys;

impl EnvKeys {
    pub const IMAGE: &'static str = "IMAGE";
    pub const REGISTRY: &'static str = "REGISTRY";
    pub const APP_NAME: &'static str = "APP_NAME";
    pub const VERSION: &'static str = "VERSION";
    pub const JAVA_HOME: &'static str = "JAVA_HOME";
    pub const JAVA_OPTS: &'static str = "JAVA_OPTS";
    pub const NAMESPACE: &'static str = "NAMESPACE";
    pub const PORT: &'static str = "PORT";
    pub const REPLICAS: &'static str = "REPLICAS";
    pub const MEMORY: &'static str = "MEMORY";
    pub const NODE_POOL: &'static str = "NODE_POOL";
}

/// Write policy for [`EnvStore::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Always write, replacing any existing value.
    Overwrite,
    /// Write only when the key is missing or blank ("first wins").
    IfAbsent,
}

/// Ordered string-keyed variable map. Insertion order is preserved so the
/// run log stays reproducible; maps are small, so lookup is a linear scan.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct EnvStore {
    entries: Vec<(String, String)>,
}

impl EnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the value for `key`, inserting it when missing.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Write only when `key` is missing or holds a blank value.
    pub fn set_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => {
                if entry.1.trim().is_empty() {
                    entry.1 = value.into();
                }
            }
            None => self.entries.push((key, value.into())),
        }
    }

    /// Lookup that never fails: absent keys read as the empty string so
    /// template rendering stays total.
    pub fn get(&self, key: &str) -> &str {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Apply a batch of pairs under one policy.
    pub fn merge<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>, policy: MergePolicy)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            match policy {
                MergePolicy::Overwrite => self.set(key, value),
                MergePolicy::IfAbsent => self.set_if_absent(key, value),
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
