//! Error types for the geohash index.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the codec, the box decomposer and the index layer.
#[derive(Error, Debug)]
pub enum GeohashError {
    /// Precision outside the supported `1..=12` range.
    #[error("Invalid geohash precision {0}: expected a value in [1, 12]")]
    InvalidPrecision(usize),

    /// Malformed code: symbol outside the alphabet or unexpected length.
    #[error("Invalid geohash code: {0}")]
    InvalidCode(String),

    /// `initialize` found the properties record already present.
    #[error("Index already initialized")]
    AlreadyInitialized,

    /// `open` found no properties record in the store.
    #[error("Index not initialized")]
    NotInitialized,

    /// The synchronizer could not be acquired before its deadline.
    #[error("Timed out after {0:?} waiting for the write synchronizer")]
    LockTimeout(Duration),

    /// The synchronizer refused acquisition or release.
    #[error("Synchronizer failure: {0}")]
    LockFailure(String),

    /// Batch coordinate vectors of unequal length.
    #[error("Coordinate arrays could not be broadcast together: {lons} longitudes, {lats} latitudes")]
    ShapeMismatch { lons: usize, lats: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The persisted properties record could not be interpreted.
    #[error("Invalid index properties: {0}")]
    InvalidProperties(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unrecognised snapshot header.
    #[error("Invalid snapshot format")]
    InvalidFormat,

    #[cfg(feature = "snapshot")]
    #[error("Snapshot encoding error: {0}")]
    Snapshot(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, GeohashError>;
