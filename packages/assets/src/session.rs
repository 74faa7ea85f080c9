//! Injected storage backends: keyed string persistence for tree snapshots
//! and a session byte store for uploaded payloads.
//!
//! Both traits model browser-style storage: infallible from the caller's
//! side, string keys, string values. The in-memory implementations back
//! tests and headless hosts; clones share one map so a test can keep a
//! handle to the storage it hands the store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Durable string records, read at store construction and written on every
/// structural mutation.
pub trait Persistence: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str);
}

/// Session-scoped payload storage mapping asset keys to data-URL strings.
/// The folder tree holds keys, never bytes.
pub trait ByteStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

type SharedMap = Arc<Mutex<HashMap<String, String>>>;

fn read(map: &SharedMap, key: &str) -> Option<String> {
    map.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned()
}

fn write(map: &SharedMap, key: &str, value: &str) {
    map.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key.to_owned(), value.to_owned());
}

/// In-memory [`Persistence`]; clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    records: SharedMap,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, key: &str) -> Option<String> {
        read(&self.records, key)
    }

    fn save(&self, key: &str, value: &str) {
        write(&self.records, key, value);
    }
}

/// In-memory [`ByteStore`]; clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryByteStore {
    entries: SharedMap,
}

impl MemoryByteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteStore for MemoryByteStore {
    fn get(&self, key: &str) -> Option<String> {
        read(&self.entries, key)
    }

    fn put(&self, key: &str, value: &str) {
        write(&self.entries, key, value);
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
