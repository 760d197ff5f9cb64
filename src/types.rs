//! Geometry and metadata types shared by the codec and the index.

use crate::compute::geohash::{Precision, normalize_longitude};
use geo::Rect;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Geographic bounding box in degrees.
///
/// Unlike `geo::Rect`, the corners are kept as given: a box whose `lon_min` is
/// greater than its `lon_max` crosses the anti-meridian.
///
/// # Examples
///
/// ```
/// use spatio_geohash::BoundingBox;
///
/// let pacific = BoundingBox::new(170.0, -10.0, -170.0, 10.0);
/// assert!(pacific.crosses_antimeridian());
/// assert!(pacific.contains_point(179.5, 0.0));
/// assert!(!pacific.contains_point(0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its south-west and north-east corners.
    pub fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        }
    }

    /// Returns the box covering the whole earth.
    pub fn whole_earth() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.lon_min > self.lon_max
    }

    /// Longitudinal extent in degrees, accounting for wraparound.
    pub fn width(&self) -> f64 {
        if self.crosses_antimeridian() {
            360.0 - (self.lon_min - self.lon_max)
        } else {
            self.lon_max - self.lon_min
        }
    }

    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Get the center point of the bounding box as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        let lon = self.lon_min + self.width() / 2.0;
        let lon = if lon >= 180.0 { normalize_longitude(lon) } else { lon };
        (lon, (self.lat_min + self.lat_max) / 2.0)
    }

    /// Test if the point is inside or on the border of this box.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        if lat < self.lat_min || lat > self.lat_max {
            return false;
        }
        self.normalized_parts()
            .iter()
            .any(|part| lon >= part.lon_min && lon <= part.lon_max)
    }

    /// Whether a cell, taken as `[min, max)` on each axis, overlaps this box.
    ///
    /// Expects a box that does not cross the anti-meridian (see
    /// [`BoundingBox::normalized_parts`]). A cell whose lower edge lies on the
    /// box's upper edge counts, since points on that edge encode into it.
    pub fn intersects_cell(&self, cell: &Cell) -> bool {
        cell.lon_min <= self.lon_max
            && self.lon_min < cell.lon_max
            && cell.lat_min <= self.lat_max
            && self.lat_min < cell.lat_max
    }

    /// Splits the box into at most two boxes that do not cross the
    /// anti-meridian, with longitudes in [-180, 180] and latitudes clamped to
    /// [-90, 90]. Parts of zero area are dropped.
    ///
    /// Longitudes outside [-180, 180] are wrapped first; a box spanning 360°
    /// or more covers every longitude. A box narrower than that whose edges
    /// wrap onto the same longitude, such as `170..-190`, has no width and
    /// yields no parts.
    pub fn normalized_parts(&self) -> SmallVec<[BoundingBox; 2]> {
        let mut parts = SmallVec::new();

        let lat_min = self.lat_min.clamp(-90.0, 90.0);
        let lat_max = self.lat_max.clamp(-90.0, 90.0);
        if lat_max <= lat_min {
            return parts;
        }

        if self.lon_max - self.lon_min >= 360.0 {
            parts.push(Self::new(-180.0, lat_min, 180.0, lat_max));
            return parts;
        }

        let lon_min = wrap_edge(self.lon_min);
        let lon_max = wrap_edge(self.lon_max);

        if lon_min < lon_max {
            parts.push(Self::new(lon_min, lat_min, lon_max, lat_max));
        } else if lon_min > lon_max {
            parts.push(Self::new(lon_min, lat_min, 180.0, lat_max));
            parts.push(Self::new(-180.0, lat_min, lon_max, lat_max));
        }

        parts.retain(|part: &mut BoundingBox| part.lon_max > part.lon_min);
        parts
    }

    /// Converts into a `geo::Rect`. Only meaningful when the box does not
    /// cross the anti-meridian, since `Rect` reorders its corners.
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            geo::coord! { x: self.lon_min, y: self.lat_min },
            geo::coord! { x: self.lon_max, y: self.lat_max },
        )
    }
}

impl From<Rect> for BoundingBox {
    fn from(rect: Rect) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

/// Keeps edges already in range so that `180.0` stays the east edge.
fn wrap_edge(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        normalize_longitude(lon)
    }
}

/// Rectangle of the sphere represented by one geohash code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Cell {
    /// Center of the cell as `(lon, lat)`; this is what decoding returns.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lon_min + self.lon_max) / 2.0,
            (self.lat_min + self.lat_max) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Test if the point is inside or on the border of the cell.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(
            geo::coord! { x: self.lon_min, y: self.lat_min },
            geo::coord! { x: self.lon_max, y: self.lat_max },
        )
    }
}

/// Index-wide metadata, persisted once under [`PROPERTIES_KEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Properties {
    pub precision: Precision,
}

/// Reserved store key holding the [`Properties`] record.
///
/// `.` is not a geohash symbol, so this key can never collide with a code.
pub const PROPERTIES_KEY: &[u8] = b".properties";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Geohash;

    #[test]
    fn test_properties_key_is_not_a_code() {
        assert!(Geohash::parse(PROPERTIES_KEY).is_err());
    }

    #[test]
    fn test_properties_json_round_trip() {
        let props = Properties {
            precision: Precision::new(5).unwrap(),
        };
        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(json, r#"{"precision":5}"#);
        assert_eq!(serde_json::from_str::<Properties>(&json).unwrap(), props);
        assert!(serde_json::from_str::<Properties>(r#"{"precision":0}"#).is_err());
    }

    #[test]
    fn test_plain_box_is_single_part() {
        let parts = BoundingBox::new(-10.0, -5.0, 10.0, 5.0).normalized_parts();
        assert_eq!(parts.as_slice(), &[BoundingBox::new(-10.0, -5.0, 10.0, 5.0)]);
    }

    #[test]
    fn test_wrapping_box_splits() {
        let parts = BoundingBox::new(170.0, -5.0, -170.0, 5.0).normalized_parts();
        assert_eq!(
            parts.as_slice(),
            &[
                BoundingBox::new(170.0, -5.0, 180.0, 5.0),
                BoundingBox::new(-180.0, -5.0, -170.0, 5.0),
            ]
        );
    }

    #[test]
    fn test_box_touching_antimeridian_is_not_split() {
        let parts = BoundingBox::new(170.0, -5.0, 180.0, 5.0).normalized_parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].lon_max, 180.0);
    }

    #[test]
    fn test_latitude_is_clamped() {
        let parts = BoundingBox::new(0.0, -100.0, 10.0, 100.0).normalized_parts();
        assert_eq!(parts[0].lat_min, -90.0);
        assert_eq!(parts[0].lat_max, 90.0);

        assert!(BoundingBox::new(0.0, 95.0, 10.0, 99.0)
            .normalized_parts()
            .is_empty());
    }

    #[test]
    fn test_wide_box_covers_all_longitudes() {
        let parts = BoundingBox::new(-200.0, 0.0, 300.0, 10.0).normalized_parts();
        assert_eq!(parts.as_slice(), &[BoundingBox::new(-180.0, 0.0, 180.0, 10.0)]);
    }

    #[test]
    fn test_edges_wrapping_to_same_longitude_yield_nothing() {
        assert!(BoundingBox::new(170.0, -5.0, -190.0, 5.0)
            .normalized_parts()
            .is_empty());
        assert!(BoundingBox::new(190.0, -5.0, -170.0, 5.0)
            .normalized_parts()
            .is_empty());
    }

    #[test]
    fn test_width_and_center_across_antimeridian() {
        let bbox = BoundingBox::new(170.0, -10.0, -170.0, 10.0);
        assert_eq!(bbox.width(), 20.0);
        assert_eq!(bbox.center(), (-180.0, 0.0));
    }

    #[test]
    fn test_cell_geometry() {
        let cell = Cell {
            lon_min: 0.0,
            lon_max: 45.0,
            lat_min: 0.0,
            lat_max: 45.0,
        };
        assert_eq!(cell.center(), (22.5, 22.5));
        assert!(cell.contains(45.0, 0.0));
        assert!(!cell.contains(45.1, 0.0));
        assert_eq!(BoundingBox::from(cell.to_rect()), BoundingBox::new(0.0, 0.0, 45.0, 45.0));
    }
}
