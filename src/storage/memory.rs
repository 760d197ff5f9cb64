//! In-memory store implementation.

use super::{Store, StoreStats, Values};
use crate::error::Result;
use bytes::Bytes;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

struct Inner {
    data: FxHashMap<Vec<u8>, Values>,
    operations_count: u64,
}

/// Process-local store backed by a hash map behind a read-write lock.
///
/// Share it between index handles with `Arc<MemoryStore>`.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with initial capacity hint
    pub fn with_capacity(capacity: usize) -> Self {
        let mut data = FxHashMap::default();
        data.reserve(capacity);
        Self {
            inner: RwLock::new(Inner {
                data,
                operations_count: 0,
            }),
        }
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        StoreStats {
            key_count: inner.data.len(),
            size_bytes: inner
                .data
                .iter()
                .map(|(k, v)| k.len() + v.iter().map(Bytes::len).sum::<usize>())
                .sum(),
            operations_count: inner.operations_count,
        }
    }

    /// Sorted copy of every entry.
    pub fn entries(&self) -> BTreeMap<Bytes, Values> {
        self.inner
            .read()
            .data
            .iter()
            .map(|(k, v)| (Bytes::copy_from_slice(k), v.clone()))
            .collect()
    }

    /// Replaces the whole content, e.g. when loading a snapshot.
    pub fn replace_all(&self, entries: impl IntoIterator<Item = (Bytes, Values)>) {
        let mut inner = self.inner.write();
        inner.data = entries.into_iter().map(|(k, v)| (k.to_vec(), v)).collect();
        inner.operations_count += 1;
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.data.clear();
        inner.operations_count += 1;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.inner.read().data.contains_key(key))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Values>> {
        Ok(self.inner.read().data.get(key).cloned())
    }

    fn set(&self, key: &[u8], values: Values) -> Result<()> {
        let mut inner = self.inner.write();
        inner.data.insert(key.to_vec(), values);
        inner.operations_count += 1;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<Option<Values>> {
        let mut inner = self.inner.write();
        let old = inner.data.remove(key);
        inner.operations_count += 1;
        Ok(old)
    }

    fn keys(&self) -> Result<Vec<Bytes>> {
        Ok(self
            .inner
            .read()
            .data
            .keys()
            .map(|k| Bytes::copy_from_slice(k))
            .collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.inner.read().data.len())
    }

    fn get_many(&self, keys: &[Bytes]) -> Result<Vec<Option<Values>>> {
        let inner = self.inner.read();
        Ok(keys
            .iter()
            .map(|key| inner.data.get(key.as_ref()).cloned())
            .collect())
    }

    fn set_many(&self, entries: Vec<(Bytes, Values)>) -> Result<()> {
        let mut inner = self.inner.write();
        for (key, values) in entries {
            inner.data.insert(key.to_vec(), values);
            inner.operations_count += 1;
        }
        Ok(())
    }
}
