//! Geohash codec and geographic index over pluggable key/value stores.
//!
//! ```rust
//! use spatio_geohash::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let index = IndexBuilder::new(store)
//!     .precision(Precision::new(4)?)
//!     .create()?;
//!
//! let codes = index.encode(&[-74.006], &[40.7128], true)?;
//! index.extend(vec![(codes[0].clone(), "NYC")])?;
//!
//! let nearby = index.query_box(&BoundingBox::new(-75.0, 40.0, -73.0, 41.0))?;
//! assert_eq!(nearby[0][0].as_ref(), b"NYC");
//! # Ok::<(), spatio_geohash::GeohashError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod index;
pub mod storage;
pub mod sync;
pub mod types;

pub use builder::IndexBuilder;
pub use config::IndexConfig;
pub use error::{GeohashError, Result};
pub use index::{GeohashIndex, read_properties};

pub use compute::geohash::{
    Direction, Geohash, MAX_PRECISION, MIN_PRECISION, Precision, bounding_boxes, cell_bounds,
    decode, decode_many, encode, encode_many, grid_extents, neighbor, neighbors,
    normalize_longitude, runs,
};

pub use types::{BoundingBox, Cell, PROPERTIES_KEY, Properties};

pub use storage::{MemoryStore, Store, StoreStats, Values};

#[cfg(feature = "snapshot")]
pub use storage::{SnapshotConfig, SnapshotStore};

pub use sync::{PuppetSynchronizer, SyncGuard, Synchronizer, ThreadSynchronizer};

pub use geo::Rect;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeohashError, GeohashIndex, IndexBuilder, IndexConfig, Result};

    pub use crate::{BoundingBox, Cell, Geohash, Precision};

    pub use crate::{bounding_boxes, decode, encode, neighbors, runs};

    pub use crate::{MemoryStore, Store};

    #[cfg(feature = "snapshot")]
    pub use crate::SnapshotStore;

    pub use crate::{PuppetSynchronizer, Synchronizer, ThreadSynchronizer};
}
