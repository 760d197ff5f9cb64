//! Compute layer for the geohash index.
//!
//! This module separates the pure numeric work from storage concerns.
//! It provides:
//! - The geohash codec, cell geometry, box decomposition and run detection
//! - Coordinate validation shared by the codec and the index
//!
//! Nothing here holds state; every function is safe to call from any thread.

pub mod geohash;
pub mod validation;
