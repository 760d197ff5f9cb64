//! Cell geometry: bounds of a code and its adjacent cells.

use super::{Geohash, Precision, deinterleave, interleave};
use crate::types::Cell;

/// Compass direction of an adjacent cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// All directions, clockwise from north. [`neighbors`] uses this order.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Step in (longitude, latitude) cells.
    const fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, -1),
            Direction::South => (0, -1),
            Direction::SouthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, 1),
        }
    }
}

/// Returns the exact rectangle covered by `code`.
///
/// # Examples
///
/// ```
/// use spatio_geohash::{Geohash, compute::geohash::cell_bounds};
///
/// let cell = cell_bounds(&Geohash::parse("s").unwrap());
/// assert_eq!((cell.lon_min, cell.lon_max), (0.0, 45.0));
/// assert_eq!((cell.lat_min, cell.lat_max), (0.0, 45.0));
/// ```
pub fn cell_bounds(code: &Geohash) -> Cell {
    let precision = code.precision();
    let (lon_q, lat_q) = deinterleave(code.to_bits(), precision);
    let (lon_step, lat_step) = precision.cell_size();

    Cell {
        lon_min: -180.0 + lon_q as f64 * lon_step,
        lon_max: -180.0 + (lon_q + 1) as f64 * lon_step,
        lat_min: -90.0 + lat_q as f64 * lat_step,
        lat_max: -90.0 + (lat_q + 1) as f64 * lat_step,
    }
}

/// Returns the adjacent cell in `direction`.
///
/// Longitude wraps at ±180°. Latitude does not wrap: stepping past a pole
/// returns the pole row itself, so polar cells repeat among their neighbors.
pub fn neighbor(code: &Geohash, direction: Direction) -> Geohash {
    let precision = code.precision();
    let (lon_q, lat_q) = deinterleave(code.to_bits(), precision);
    let (dlon, dlat) = direction.offset();

    let lon_steps = 1_i64 << precision.lon_bits();
    let lat_steps = 1_i64 << precision.lat_bits();

    let lon_q = (lon_q as i64 + dlon).rem_euclid(lon_steps) as u64;
    let lat_q = (lat_q as i64 + dlat).clamp(0, lat_steps - 1) as u64;

    from_indices(lon_q, lat_q, precision)
}

/// Returns the eight adjacent cells in [`Direction::ALL`] order.
///
/// Duplicates (and the code itself) may appear for polar cells.
///
/// # Examples
///
/// ```
/// use spatio_geohash::{Geohash, compute::geohash::neighbors};
///
/// let around = neighbors(&Geohash::parse("ezs42").unwrap());
/// assert_eq!(around[0].as_str(), "ezs48"); // north
/// assert_eq!(around[2].as_str(), "ezs43"); // east
/// ```
pub fn neighbors(code: &Geohash) -> [Geohash; 8] {
    Direction::ALL.map(|direction| neighbor(code, direction))
}

fn from_indices(lon_q: u64, lat_q: u64, precision: Precision) -> Geohash {
    Geohash::from_bits(interleave(lon_q, lat_q, precision), precision)
}
