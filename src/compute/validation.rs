//! Validation for geographic coordinates and batch inputs.

use crate::error::{GeohashError, Result};

/// Validates that a coordinate pair is finite.
///
/// Latitudes outside [-90, 90] are not rejected here: the codec clamps them.
///
/// # Examples
///
/// ```
/// use spatio_geohash::compute::validation::validate_finite;
///
/// assert!(validate_finite(2.349, 48.864).is_ok());
/// assert!(validate_finite(f64::NAN, 48.864).is_err());
/// ```
pub fn validate_finite(lon: f64, lat: f64) -> Result<()> {
    if !lon.is_finite() {
        return Err(GeohashError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            lon
        )));
    }

    if !lat.is_finite() {
        return Err(GeohashError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    Ok(())
}

/// Validates a longitude that is expected to already lie in [-180, 180].
pub fn validate_longitude(lon: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeohashError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lon
        )));
    }
    Ok(())
}

/// Validates a pair of coordinate vectors before batch encoding.
///
/// # Examples
///
/// ```
/// use spatio_geohash::compute::validation::validate_coordinates;
/// use spatio_geohash::GeohashError;
///
/// let err = validate_coordinates(&[0.0, 1.0], &[0.0]).unwrap_err();
/// assert!(matches!(err, GeohashError::ShapeMismatch { lons: 2, lats: 1 }));
/// ```
pub fn validate_coordinates(lons: &[f64], lats: &[f64]) -> Result<()> {
    if lons.len() != lats.len() {
        return Err(GeohashError::ShapeMismatch {
            lons: lons.len(),
            lats: lats.len(),
        });
    }

    for (idx, (&lon, &lat)) in lons.iter().zip(lats).enumerate() {
        validate_finite(lon, lat)
            .map_err(|e| GeohashError::InvalidInput(format!("Point at index {}: {}", idx, e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_coordinates() {
        assert!(validate_finite(-74.0060, 40.7128).is_ok());
        assert!(validate_finite(180.0, 90.0).is_ok());
        // Clamped later by the codec, not rejected.
        assert!(validate_finite(0.0, 95.0).is_ok());

        assert!(validate_finite(f64::INFINITY, 0.0).is_err());
        assert!(validate_finite(0.0, f64::NEG_INFINITY).is_err());
        assert!(validate_finite(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_longitude_range() {
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(180.5).is_err());
        assert!(validate_longitude(-200.0).is_err());
    }

    #[test]
    fn test_batch_reports_offending_index() {
        let err = validate_coordinates(&[0.0, 1.0, f64::NAN], &[0.0, 1.0, 2.0]).unwrap_err();
        match err {
            GeohashError::InvalidInput(msg) => assert!(msg.contains("index 2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_batch_shape_mismatch() {
        let err = validate_coordinates(&[0.0], &[]).unwrap_err();
        assert!(matches!(
            err,
            GeohashError::ShapeMismatch { lons: 1, lats: 0 }
        ));
    }
}
