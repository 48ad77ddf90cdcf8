//! Key-value storage for the host application.
//!
//! Calculator pages keep drafts and recently shared links in a small local
//! store. The engine and the share codec never touch it; callers own the
//! store's whole lifecycle through [`KeyValueStore`].

use std::collections::BTreeMap;

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub trait KeyValueStore {
    /// Prepares the store for use. Calling it again keeps existing entries.
    fn init(&mut self) -> anyhow::Result<()>;
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: String) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> Option<String>;
    fn clear(&mut self);
}

/// In-process store backed by an ordered map.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    initialized: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn init(&mut self) -> anyhow::Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: String) -> anyhow::Result<()> {
        if !self.initialized {
            anyhow::bail!("store written before init");
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Stores `value` as JSON under `key`.
pub fn save_json<S, T>(store: &mut S, key: &str, value: &T) -> anyhow::Result<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    let json = serde_json::to_string(value).with_context(|| format!("serializing {key}"))?;
    store.write(key, json)
}

/// Reads the JSON value under `key`, `Ok(None)` when nothing is stored.
pub fn load_json<S, T>(store: &S, key: &str) -> anyhow::Result<Option<T>>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    store
        .read(key)
        .map(|json| serde_json::from_str(&json).with_context(|| format!("parsing {key}")))
        .transpose()
}
