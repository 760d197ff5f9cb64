//! Storage abstraction for the geohash index.
//!
//! The index only needs a narrow mapping contract from its backend; any
//! process-local table, file-backed table or networked store can serve as
//! long as it implements [`Store`].

use crate::error::Result;
use bytes::Bytes;

mod memory;
#[cfg(feature = "snapshot")]
pub mod snapshot;

pub use memory::MemoryStore;
#[cfg(feature = "snapshot")]
pub use snapshot::{SnapshotConfig, SnapshotStore};

/// Sequence of opaque values stored under one key.
///
/// `update` leaves a single element, `extend` appends.
pub type Values = Vec<Bytes>;

/// Mapping contract consumed by [`GeohashIndex`](crate::GeohashIndex).
///
/// Methods take `&self`: implementations own their interior locking so that
/// several index handles can share one store behind an `Arc`. A store only
/// promises single-key atomicity; write serialization across keys is the job
/// of the [`Synchronizer`](crate::sync::Synchronizer).
pub trait Store: Send + Sync {
    /// Check if a key exists
    fn contains(&self, key: &[u8]) -> Result<bool>;

    /// Get the values stored under a key
    fn get(&self, key: &[u8]) -> Result<Option<Values>>;

    /// Insert or overwrite the values stored under a key
    fn set(&self, key: &[u8], values: Values) -> Result<()>;

    /// Delete a key and return its values if it existed
    fn delete(&self, key: &[u8]) -> Result<Option<Values>>;

    /// Get all keys, in no particular order
    fn keys(&self) -> Result<Vec<Bytes>>;

    /// Get the total number of keys
    fn len(&self) -> Result<usize>;

    /// Check if the store is empty
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Batched lookup; the result is aligned with `keys`.
    fn get_many(&self, keys: &[Bytes]) -> Result<Vec<Option<Values>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Batched overwrite.
    fn set_many(&self, entries: Vec<(Bytes, Values)>) -> Result<()> {
        for (key, values) in entries {
            self.set(&key, values)?;
        }
        Ok(())
    }
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of keys
    pub key_count: usize,
    /// Approximate payload size in bytes (keys plus values)
    pub size_bytes: usize,
    /// Number of mutating operations performed
    pub operations_count: u64,
}
