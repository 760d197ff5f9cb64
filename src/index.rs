//! Geographic index over a pluggable key/value store.
//!
//! Values are filed under the geohash of their position. Writes go through a
//! [`Synchronizer`]; reads hit the store directly and never cache, so two
//! handles over the same store see each other's committed writes.
//!
//! ```rust
//! use spatio_geohash::{BoundingBox, GeohashIndex, MemoryStore, Precision};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let index = GeohashIndex::initialize(store, Precision::new(3)?)?;
//!
//! let codes = index.encode(&[2.349, -74.006], &[48.864, 40.7128], true)?;
//! index.update(vec![
//!     (codes[0].clone(), "Paris"),
//!     (codes[1].clone(), "New York"),
//! ])?;
//!
//! let europe = BoundingBox::new(-10.0, 35.0, 30.0, 60.0);
//! let found = index.query_box(&europe)?;
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0][0].as_ref(), b"Paris");
//! # Ok::<(), spatio_geohash::GeohashError>(())
//! ```

use crate::compute::geohash::{self, Geohash, Precision, bounding_boxes, runs::Ranges};
use crate::error::{GeohashError, Result};
use crate::storage::{Store, Values};
use crate::sync::{PuppetSynchronizer, SyncGuard, Synchronizer};
use crate::types::{BoundingBox, PROPERTIES_KEY, Properties};
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Handle over an initialized geohash index.
///
/// The handle is a thin façade: it holds the store, the synchronizer and the
/// precision read at creation or open time, nothing else.
pub struct GeohashIndex<S: Store + ?Sized> {
    store: Arc<S>,
    precision: Precision,
    synchronizer: Arc<dyn Synchronizer>,
}

impl<S: Store + ?Sized> GeohashIndex<S> {
    /// Creates a new index in `store`, writing its properties record.
    ///
    /// Fails with [`GeohashError::AlreadyInitialized`] if the store already
    /// holds one; the store is left untouched in that case.
    pub fn initialize(store: Arc<S>, precision: Precision) -> Result<Self> {
        Self::initialize_with(store, precision, Arc::new(PuppetSynchronizer))
    }

    pub fn initialize_with(
        store: Arc<S>,
        precision: Precision,
        synchronizer: Arc<dyn Synchronizer>,
    ) -> Result<Self> {
        let record = serde_json::to_vec(&Properties { precision })?;
        {
            let guard = SyncGuard::acquire(&*synchronizer)?;
            if store.contains(PROPERTIES_KEY)? {
                return Err(GeohashError::AlreadyInitialized);
            }
            store.set(PROPERTIES_KEY, vec![Bytes::from(record)])?;
            guard.release()?;
        }

        log::debug!("Initialized geohash index with precision {}", precision);
        Ok(Self {
            store,
            precision,
            synchronizer,
        })
    }

    /// Opens an index previously created by [`GeohashIndex::initialize`].
    pub fn open(store: Arc<S>) -> Result<Self> {
        Self::open_with(store, Arc::new(PuppetSynchronizer))
    }

    pub fn open_with(store: Arc<S>, synchronizer: Arc<dyn Synchronizer>) -> Result<Self> {
        let properties = read_properties(&*store)?;
        log::debug!(
            "Opened geohash index with precision {}",
            properties.precision
        );
        Ok(Self {
            store,
            precision: properties.precision,
            synchronizer,
        })
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn synchronizer(&self) -> &Arc<dyn Synchronizer> {
        &self.synchronizer
    }

    /// Encodes positions at the index precision.
    ///
    /// With `normalize`, longitudes are first wrapped into [-180, 180).
    pub fn encode(&self, lons: &[f64], lats: &[f64], normalize: bool) -> Result<Vec<Geohash>> {
        geohash::encode_many(lons, lats, self.precision, normalize)
    }

    /// Cell centers of `codes`, as longitude and latitude vectors.
    pub fn decode(&self, codes: &[Geohash]) -> (Vec<f64>, Vec<f64>) {
        codes.iter().map(geohash::decode).unzip()
    }

    /// Stores each value under its code, replacing what was there.
    ///
    /// The whole batch runs under the synchronizer. Entries are written in
    /// order; if the store fails midway, earlier entries stay committed.
    pub fn update<I, V>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (Geohash, V)>,
        V: Into<Bytes>,
    {
        let entries = pairs
            .into_iter()
            .map(|(code, value)| {
                self.check_code(&code)?;
                Ok((Bytes::copy_from_slice(code.as_bytes()), vec![value.into()]))
            })
            .collect::<Result<Vec<(Bytes, Values)>>>()?;

        let count = entries.len();
        let guard = SyncGuard::acquire(&*self.synchronizer)?;
        self.store.set_many(entries)?;
        guard.release()?;

        log::trace!("Updated {} geohash entries", count);
        Ok(())
    }

    /// Appends each value to the sequence stored under its code.
    ///
    /// The read and the write of every code happen under the same
    /// acquisition, so concurrent appends through a shared synchronizer are
    /// never lost.
    pub fn extend<I, V>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (Geohash, V)>,
        V: Into<Bytes>,
    {
        let mut grouped: BTreeMap<Geohash, Values> = BTreeMap::new();
        for (code, value) in pairs {
            self.check_code(&code)?;
            grouped.entry(code).or_default().push(value.into());
        }

        let keys: Vec<Bytes> = grouped
            .keys()
            .map(|code| Bytes::copy_from_slice(code.as_bytes()))
            .collect();
        let count = keys.len();

        let guard = SyncGuard::acquire(&*self.synchronizer)?;
        let current = self.store.get_many(&keys)?;
        let entries = keys
            .into_iter()
            .zip(current)
            .zip(grouped.into_values())
            .map(|((key, existing), appended)| {
                let mut values = existing.unwrap_or_default();
                values.extend(appended);
                (key, values)
            })
            .collect();
        self.store.set_many(entries)?;
        guard.release()?;

        log::trace!("Extended {} geohash entries", count);
        Ok(())
    }

    /// Returns the stored codes, optionally restricted to those whose cells
    /// intersect `bbox`. Never returns a code absent from the store.
    pub fn keys(&self, bbox: Option<&BoundingBox>) -> Result<BTreeSet<Geohash>> {
        let stored = self
            .store
            .keys()?
            .into_iter()
            .filter(|key| key.as_ref() != PROPERTIES_KEY)
            .map(Geohash::parse)
            .collect::<Result<BTreeSet<Geohash>>>()?;

        let Some(bbox) = bbox else {
            return Ok(stored);
        };

        let candidates = bounding_boxes(Some(bbox), self.precision)?;
        Ok(stored.intersection(&candidates).cloned().collect())
    }

    /// Values stored under `keys` (all stored codes when `None`), aligned with
    /// the keys. Missing and empty entries both come back as empty vectors.
    pub fn values(&self, keys: Option<&[Geohash]>) -> Result<Vec<Values>> {
        Ok(self.items(keys)?.into_iter().map(|(_, values)| values).collect())
    }

    /// `(code, values)` pairs for `keys` (all stored codes when `None`).
    pub fn items(&self, keys: Option<&[Geohash]>) -> Result<Vec<(Geohash, Values)>> {
        let codes: Vec<Geohash> = match keys {
            Some(keys) => keys.to_vec(),
            None => self.keys(None)?.into_iter().collect(),
        };

        let raw: Vec<Bytes> = codes
            .iter()
            .map(|code| Bytes::copy_from_slice(code.as_bytes()))
            .collect();
        let fetched = self.store.get_many(&raw)?;

        Ok(codes
            .into_iter()
            .zip(fetched)
            .map(|(code, values)| (code, values.unwrap_or_default()))
            .collect())
    }

    /// Every non-empty value sequence stored in cells intersecting `bbox`.
    pub fn query_box(&self, bbox: &BoundingBox) -> Result<Vec<Values>> {
        let keys: Vec<Geohash> = self.keys(Some(bbox))?.into_iter().collect();
        Ok(self
            .values(Some(&keys))?
            .into_iter()
            .filter(|values| !values.is_empty())
            .collect())
    }

    /// Number of stored codes, not counting the properties record.
    pub fn len(&self) -> Result<usize> {
        let total = self.store.len()?;
        let reserved = usize::from(self.store.contains(PROPERTIES_KEY)?);
        Ok(total.saturating_sub(reserved))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Start and end indexes of each code's runs in `codes`.
    ///
    /// See [`geohash::runs`].
    pub fn runs(codes: &[Geohash]) -> BTreeMap<Geohash, Ranges> {
        geohash::runs(codes)
    }

    fn check_code(&self, code: &Geohash) -> Result<()> {
        if code.precision() != self.precision {
            return Err(GeohashError::InvalidCode(format!(
                "{} has precision {}, index precision is {}",
                code,
                code.precision(),
                self.precision
            )));
        }
        Ok(())
    }
}

/// Reads the properties record without opening an index.
pub fn read_properties<S: Store + ?Sized>(store: &S) -> Result<Properties> {
    let record = store
        .get(PROPERTIES_KEY)?
        .ok_or(GeohashError::NotInitialized)?;
    let raw = record
        .first()
        .ok_or_else(|| GeohashError::InvalidProperties("empty properties record".into()))?;
    serde_json::from_slice(raw).map_err(|e| GeohashError::InvalidProperties(e.to_string()))
}

impl<S: Store + ?Sized> Clone for GeohashIndex<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            precision: self.precision,
            synchronizer: Arc::clone(&self.synchronizer),
        }
    }
}

impl<S: Store + ?Sized> fmt::Debug for GeohashIndex<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<GeohashIndex precision={}>", self.precision)
    }
}
