//! Decomposition of a bounding box into the geohash cells covering it.

use super::{Geohash, Precision, cell_bounds, encode, neighbors};
use crate::compute::validation::validate_finite;
use crate::error::Result;
use crate::types::BoundingBox;
use rustc_hash::FxHashSet;
use std::collections::{BTreeSet, VecDeque};

/// Returns the codes of `precision` whose cells intersect `bbox`.
///
/// With no box, every code of the precision is returned once, which tiles the
/// sphere; that is `32^precision` codes, so keep the precision small.
///
/// A box whose `lon_min` is greater than its `lon_max` crosses the
/// anti-meridian: it is split at ±180° and both halves are covered. A box with
/// zero area yields an empty set.
///
/// # Examples
///
/// ```
/// use spatio_geohash::{BoundingBox, Precision, compute::geohash::bounding_boxes};
///
/// let codes = bounding_boxes(Some(&BoundingBox::new(-1.0, -1.0, 1.0, 1.0)), Precision::new(1)?)?;
/// let codes: Vec<&str> = codes.iter().map(|c| c.as_str()).collect();
/// assert_eq!(codes, vec!["7", "e", "k", "s"]);
/// # Ok::<(), spatio_geohash::GeohashError>(())
/// ```
pub fn bounding_boxes(bbox: Option<&BoundingBox>, precision: Precision) -> Result<BTreeSet<Geohash>> {
    let Some(bbox) = bbox else {
        return Ok(whole_grid(precision));
    };

    validate_finite(bbox.lon_min, bbox.lat_min)?;
    validate_finite(bbox.lon_max, bbox.lat_max)?;

    let mut result = BTreeSet::new();
    for part in bbox.normalized_parts() {
        cover(&part, precision, &mut result)?;
    }
    Ok(result)
}

fn whole_grid(precision: Precision) -> BTreeSet<Geohash> {
    if precision.get() > 4 {
        log::warn!(
            "Enumerating all {} cells at precision {}",
            precision.cell_count(),
            precision
        );
    }
    (0..precision.cell_count())
        .map(|bits| Geohash::from_bits(bits, precision))
        .collect()
}

/// Breadth-first expansion from the south-west corner of a box that does not
/// cross the anti-meridian. Only cells intersecting the box are expanded.
fn cover(bbox: &BoundingBox, precision: Precision, result: &mut BTreeSet<Geohash>) -> Result<()> {
    let start = encode(bbox.lon_min, bbox.lat_min, precision)?;

    let mut visited = FxHashSet::default();
    let mut queue = VecDeque::new();
    visited.insert(start.clone());
    queue.push_back(start);

    while let Some(code) = queue.pop_front() {
        for next in neighbors(&code) {
            if visited.contains(&next) {
                continue;
            }
            visited.insert(next.clone());
            if bbox.intersects_cell(&cell_bounds(&next)) {
                queue.push_back(next);
            }
        }
        result.insert(code);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeohashError;

    fn p(precision: usize) -> Precision {
        Precision::new(precision).unwrap()
    }

    fn strings(codes: &BTreeSet<Geohash>) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_unit_box_around_origin() {
        let bbox = BoundingBox::new(-1.0, -1.0, 1.0, 1.0);
        let codes = bounding_boxes(Some(&bbox), p(1)).unwrap();
        assert_eq!(strings(&codes), vec!["7", "e", "k", "s"]);
    }

    #[test]
    fn test_whole_grid_partitions_sphere() {
        let codes = bounding_boxes(None, p(2)).unwrap();
        assert_eq!(codes.len(), 1024);

        let area: f64 = codes
            .iter()
            .map(|c| {
                let cell = cell_bounds(c);
                cell.width() * cell.height()
            })
            .sum();
        assert!((area - 360.0 * 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_covering_is_exact_for_aligned_box() {
        // Exactly the four precision-2 cells of the "s0" .. "s3" block.
        let cell = cell_bounds(&Geohash::parse("s0").unwrap());
        let bbox = BoundingBox::new(
            cell.lon_min + 0.1,
            cell.lat_min + 0.1,
            cell.lon_max + 1.0,
            cell.lat_max + 1.0,
        );
        let codes = bounding_boxes(Some(&bbox), p(2)).unwrap();
        assert_eq!(strings(&codes), vec!["s0", "s1", "s2", "s3"]);
    }

    #[test]
    fn test_every_code_intersects_box() {
        let bbox = BoundingBox::new(2.0, 48.0, 3.5, 49.5);
        let codes = bounding_boxes(Some(&bbox), p(4)).unwrap();
        assert!(!codes.is_empty());
        for code in &codes {
            assert!(bbox.intersects_cell(&cell_bounds(code)), "{code} is disjoint");
        }
    }

    #[test]
    fn test_grid_points_are_covered() {
        let bbox = BoundingBox::new(-10.0, 35.0, 5.0, 44.0);
        let precision = p(3);
        let codes = bounding_boxes(Some(&bbox), precision).unwrap();

        for i in 0..=30 {
            for j in 0..=18 {
                let lon = -10.0 + i as f64 * 0.5;
                let lat = 35.0 + j as f64 * 0.5;
                let code = encode(lon, lat, precision).unwrap();
                assert!(codes.contains(&code), "{lon},{lat} -> {code} missing");
            }
        }
    }

    #[test]
    fn test_antimeridian_box_wraps() {
        let bbox = BoundingBox::new(170.0, -5.0, -170.0, 5.0);
        let codes = bounding_boxes(Some(&bbox), p(2)).unwrap();

        let east = encode(175.0, 0.0, p(2)).unwrap();
        let west = encode(-175.0, 0.0, p(2)).unwrap();
        let far = encode(0.0, 0.0, p(2)).unwrap();
        assert!(codes.contains(&east));
        assert!(codes.contains(&west));
        assert!(!codes.contains(&far));

        for code in &codes {
            let cell = cell_bounds(code);
            assert!(cell.lon_min >= 157.5 || cell.lon_max <= -157.5, "{code}");
        }
    }

    #[test]
    fn test_non_wrapping_box_stays_in_range() {
        let bbox = BoundingBox::new(-170.0, -5.0, 170.0, 5.0);
        let codes = bounding_boxes(Some(&bbox), p(1)).unwrap();
        // Spans every longitude column of precision 1.
        assert_eq!(codes.len(), 16);
    }

    #[test]
    fn test_out_of_range_longitudes_are_normalized() {
        let shifted = BoundingBox::new(190.0, 10.0, 200.0, 20.0);
        let plain = BoundingBox::new(-170.0, 10.0, -160.0, 20.0);
        assert_eq!(
            bounding_boxes(Some(&shifted), p(3)).unwrap(),
            bounding_boxes(Some(&plain), p(3)).unwrap()
        );
    }

    #[test]
    fn test_zero_area_box_is_empty() {
        let flat = BoundingBox::new(10.0, 20.0, 15.0, 20.0);
        assert!(bounding_boxes(Some(&flat), p(3)).unwrap().is_empty());

        let line = BoundingBox::new(10.0, 20.0, 10.0, 25.0);
        assert!(bounding_boxes(Some(&line), p(3)).unwrap().is_empty());
    }

    #[test]
    fn test_whole_earth_box_matches_grid() {
        let bbox = BoundingBox::whole_earth();
        assert_eq!(
            bounding_boxes(Some(&bbox), p(2)).unwrap(),
            bounding_boxes(None, p(2)).unwrap()
        );
    }

    #[test]
    fn test_rejects_non_finite_box() {
        let bbox = BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0);
        assert!(matches!(
            bounding_boxes(Some(&bbox), p(2)),
            Err(GeohashError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let bbox = BoundingBox::new(-3.0, 50.0, 2.0, 53.0);
        let first = bounding_boxes(Some(&bbox), p(4)).unwrap();
        assert_eq!(first, bounding_boxes(Some(&bbox), p(4)).unwrap());
    }

    #[test]
    fn test_edges_wrapping_together_cover_nothing() {
        let bbox = BoundingBox::new(170.0, -5.0, -190.0, 5.0);
        assert!(bounding_boxes(Some(&bbox), p(2)).unwrap().is_empty());
    }
}
