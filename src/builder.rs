//! Index builder for flexible configuration
//!
//! Collects the store, the precision and the write synchronizer before
//! creating or opening a [`GeohashIndex`].

use crate::compute::geohash::Precision;
use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::GeohashIndex;
use crate::storage::Store;
use crate::sync::{PuppetSynchronizer, Synchronizer, ThreadSynchronizer};
use std::sync::Arc;

/// Builder for index handles over a shared store.
///
/// Without an explicit synchronizer, a configured lock timeout selects the
/// [`ThreadSynchronizer`] of the store's lock domain, shared by every
/// builder-made handle over the same store. With no timeout the handle gets a
/// [`PuppetSynchronizer`], which is only correct for a single writer; inject a
/// shared synchronizer to serialize writers in that case, or when the store is
/// shared across processes.
pub struct IndexBuilder<S: Store + ?Sized> {
    store: Arc<S>,
    config: IndexConfig,
    synchronizer: Option<Arc<dyn Synchronizer>>,
}

impl<S: Store + ?Sized> IndexBuilder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: IndexConfig::default(),
            synchronizer: None,
        }
    }

    /// Precision written by [`IndexBuilder::create`].
    pub fn precision(mut self, precision: Precision) -> Self {
        self.config.precision = precision;
        self
    }

    pub fn config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    pub fn synchronizer(mut self, synchronizer: Arc<dyn Synchronizer>) -> Self {
        self.synchronizer = Some(synchronizer);
        self
    }

    /// Initializes a new index in the store.
    pub fn create(self) -> Result<GeohashIndex<S>> {
        self.config.validate()?;
        let precision = self.config.precision;
        let synchronizer = self.resolve_synchronizer();
        GeohashIndex::initialize_with(self.store, precision, synchronizer)
    }

    /// Opens the index already present in the store. The configured precision
    /// is ignored in favor of the persisted one.
    pub fn open(self) -> Result<GeohashIndex<S>> {
        self.config.validate()?;
        let synchronizer = self.resolve_synchronizer();
        GeohashIndex::open_with(self.store, synchronizer)
    }

    fn resolve_synchronizer(&self) -> Arc<dyn Synchronizer> {
        if let Some(synchronizer) = &self.synchronizer {
            return Arc::clone(synchronizer);
        }
        match self.config.lock_timeout() {
            Some(timeout) => {
                Arc::new(ThreadSynchronizer::for_store(&self.store, Some(timeout)))
            }
            None => Arc::new(PuppetSynchronizer),
        }
    }
}
