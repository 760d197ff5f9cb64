//! Geohash codec.
//!
//! A geohash of precision `p` is `5 * p` bits obtained by interleaving a
//! quantized longitude and a quantized latitude, longitude first (the most
//! significant bit is a longitude bit). The bits are then written five at a
//! time through the 32-symbol alphabet `0123456789bcdefghjkmnpqrstuvwxyz`.
//!
//! | precision | lon/lat at the equator (km) | cells         |
//! |-----------|-----------------------------|---------------|
//! | 1         | 4950 / 4950                 | 32            |
//! | 2         | 618.75 / 1237.50            | 1024          |
//! | 3         | 154.69 / 154.69             | 32768         |
//! | 4         | 19.34 / 38.67               | 1048576       |
//! | 5         | 4.83 / 4.83                 | 33554432      |
//! | 6         | 0.60 / 1.21                 | 1073741824    |

pub mod cell;
pub mod coverage;
pub mod runs;

pub use cell::{Direction, cell_bounds, neighbor, neighbors};
pub use coverage::bounding_boxes;
pub use runs::{GridExtent, IndexRange, grid_extents, runs};

use crate::compute::validation::{validate_coordinates, validate_finite, validate_longitude};
use crate::error::{GeohashError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Smallest supported precision.
pub const MIN_PRECISION: usize = 1;

/// Largest supported precision (60 bits).
pub const MAX_PRECISION: usize = 12;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Reverse lookup from ASCII byte to 5-bit symbol value, `0xff` when invalid.
static DECODE_TABLE: Lazy<[u8; 256]> = Lazy::new(|| {
    let mut table = [0xff_u8; 256];
    for (value, &symbol) in BASE32.iter().enumerate() {
        table[symbol as usize] = value as u8;
    }
    table
});

/// Number of symbols in a geohash code.
///
/// Always within `1..=12`; construction is the only place
/// [`GeohashError::InvalidPrecision`] is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Precision(u8);

impl Precision {
    /// Precision used when none is configured (~154 km cells).
    pub const DEFAULT: Precision = Precision(3);

    /// Validates and wraps a precision.
    ///
    /// # Examples
    ///
    /// ```
    /// use spatio_geohash::Precision;
    ///
    /// assert_eq!(Precision::new(5).unwrap().get(), 5);
    /// assert!(Precision::new(0).is_err());
    /// assert!(Precision::new(13).is_err());
    /// ```
    pub fn new(precision: usize) -> Result<Self> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(GeohashError::InvalidPrecision(precision));
        }
        Ok(Self(precision as u8))
    }

    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// Total number of interleaved bits.
    pub const fn bits(self) -> u32 {
        5 * self.0 as u32
    }

    /// Bits allotted to longitude (the extra bit when the total is odd).
    pub const fn lon_bits(self) -> u32 {
        self.bits().div_ceil(2)
    }

    pub const fn lat_bits(self) -> u32 {
        self.bits() / 2
    }

    /// Number of distinct codes, `32^precision`.
    pub const fn cell_count(self) -> u64 {
        1_u64 << self.bits()
    }

    /// Width and height of a cell in degrees.
    pub fn cell_size(self) -> (f64, f64) {
        (
            360.0 / (1_u64 << self.lon_bits()) as f64,
            180.0 / (1_u64 << self.lat_bits()) as f64,
        )
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for Precision {
    type Error = GeohashError;

    fn try_from(value: usize) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Precision> for usize {
    fn from(precision: Precision) -> Self {
        precision.get()
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated geohash code.
///
/// Codes compare and hash by their symbols, so `"u09"` and `"u09t"` are
/// unrelated keys even though one cell contains the other.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Geohash(SmallVec<[u8; MAX_PRECISION]>);

impl Geohash {
    /// Parses a code of any supported length.
    ///
    /// # Examples
    ///
    /// ```
    /// use spatio_geohash::Geohash;
    ///
    /// let code = Geohash::parse("u09tv").unwrap();
    /// assert_eq!(code.precision().get(), 5);
    ///
    /// // 'a' is not part of the alphabet
    /// assert!(Geohash::parse("u09ta").is_err());
    /// ```
    pub fn parse(code: impl AsRef<[u8]>) -> Result<Self> {
        let code = code.as_ref();
        if code.is_empty() || code.len() > MAX_PRECISION {
            return Err(GeohashError::InvalidCode(format!(
                "length {} is outside [{}, {}]",
                code.len(),
                MIN_PRECISION,
                MAX_PRECISION
            )));
        }

        if let Some(pos) = code.iter().position(|&b| DECODE_TABLE[b as usize] == 0xff) {
            return Err(GeohashError::InvalidCode(format!(
                "{:?} contains invalid symbol at position {}",
                String::from_utf8_lossy(code),
                pos
            )));
        }

        Ok(Self(SmallVec::from_slice(code)))
    }

    /// Parses a code that must have exactly `precision` symbols.
    pub fn parse_with_precision(code: impl AsRef<[u8]>, precision: Precision) -> Result<Self> {
        let parsed = Self::parse(code)?;
        if parsed.len() != precision.get() {
            return Err(GeohashError::InvalidCode(format!(
                "{:?} has length {}, expected {}",
                parsed.as_str(),
                parsed.len(),
                precision
            )));
        }
        Ok(parsed)
    }

    /// Writes the low `5 * precision` bits of `bits` as symbols.
    pub(crate) fn from_bits(bits: u64, precision: Precision) -> Self {
        let len = precision.get();
        let mut symbols = SmallVec::with_capacity(len);
        for i in (0..len).rev() {
            let index = (bits >> (5 * i)) & 0x1f;
            symbols.push(BASE32[index as usize]);
        }
        Self(symbols)
    }

    /// Integer value of the code, `5 * len` bits wide.
    pub fn to_bits(&self) -> u64 {
        self.0
            .iter()
            .fold(0_u64, |acc, &b| (acc << 5) | DECODE_TABLE[b as usize] as u64)
    }

    pub fn precision(&self) -> Precision {
        Precision(self.0.len() as u8)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: codes hold at least one symbol.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Symbols come from BASE32, which is ASCII.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for Geohash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Geohash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Geohash({})", self.as_str())
    }
}

impl FromStr for Geohash {
    type Err = GeohashError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Geohash {
    type Error = GeohashError;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<[u8]> for Geohash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Geohash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Geohash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Geohash::parse(&code).map_err(serde::de::Error::custom)
    }
}

/// Wraps a longitude into `[-180, 180)`.
///
/// # Examples
///
/// ```
/// use spatio_geohash::compute::geohash::normalize_longitude;
///
/// assert_eq!(normalize_longitude(190.0), -170.0);
/// assert_eq!(normalize_longitude(180.0), -180.0);
/// assert_eq!(normalize_longitude(-540.0), -180.0);
/// ```
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Encodes a position into a geohash.
///
/// The longitude must already lie in [-180, 180] (see
/// [`normalize_longitude`]); the latitude is clamped to [-90, 90].
///
/// # Examples
///
/// ```
/// use spatio_geohash::{Precision, compute::geohash::encode};
///
/// let code = encode(-5.6, 42.6, Precision::new(5)?)?;
/// assert_eq!(code.as_str(), "ezs42");
/// # Ok::<(), spatio_geohash::GeohashError>(())
/// ```
pub fn encode(lon: f64, lat: f64, precision: Precision) -> Result<Geohash> {
    validate_finite(lon, lat)?;
    validate_longitude(lon)?;
    let lat = lat.clamp(-90.0, 90.0);

    let lon_q = quantize(lon + 180.0, 360.0, precision.lon_bits());
    let lat_q = quantize(lat + 90.0, 180.0, precision.lat_bits());

    Ok(Geohash::from_bits(interleave(lon_q, lat_q, precision), precision))
}

/// Encodes a batch of positions, optionally wrapping longitudes first.
pub fn encode_many(
    lons: &[f64],
    lats: &[f64],
    precision: Precision,
    normalize: bool,
) -> Result<Vec<Geohash>> {
    validate_coordinates(lons, lats)?;

    lons.iter()
        .zip(lats)
        .map(|(&lon, &lat)| {
            let lon = if normalize { normalize_longitude(lon) } else { lon };
            encode(lon, lat, precision)
        })
        .collect()
}

/// Returns the center `(lon, lat)` of the code's cell.
pub fn decode(code: &Geohash) -> (f64, f64) {
    cell_bounds(code).center()
}

/// Parses and decodes a batch of codes into longitude and latitude vectors.
pub fn decode_many<C: AsRef<[u8]>>(codes: &[C]) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut lons = Vec::with_capacity(codes.len());
    let mut lats = Vec::with_capacity(codes.len());
    for code in codes {
        let (lon, lat) = decode(&Geohash::parse(code)?);
        lons.push(lon);
        lats.push(lat);
    }
    Ok((lons, lats))
}

/// Maps an offset within `[0, range]` onto `2^bits` equal steps.
fn quantize(offset: f64, range: f64, bits: u32) -> u64 {
    let steps = 1_u64 << bits;
    let q = (offset / range * steps as f64).floor() as u64;
    q.min(steps - 1)
}

/// Interleaves longitude and latitude bits, longitude first.
pub(crate) fn interleave(lon_q: u64, lat_q: u64, precision: Precision) -> u64 {
    let mut lon_shift = precision.lon_bits();
    let mut lat_shift = precision.lat_bits();
    let mut bits = 0_u64;
    for i in 0..precision.bits() {
        bits <<= 1;
        if i % 2 == 0 {
            lon_shift -= 1;
            bits |= (lon_q >> lon_shift) & 1;
        } else {
            lat_shift -= 1;
            bits |= (lat_q >> lat_shift) & 1;
        }
    }
    bits
}

/// Splits interleaved bits back into `(lon_q, lat_q)`.
pub(crate) fn deinterleave(bits: u64, precision: Precision) -> (u64, u64) {
    let total = precision.bits();
    let mut lon_q = 0_u64;
    let mut lat_q = 0_u64;
    for i in 0..total {
        let bit = (bits >> (total - 1 - i)) & 1;
        if i % 2 == 0 {
            lon_q = (lon_q << 1) | bit;
        } else {
            lat_q = (lat_q << 1) | bit;
        }
    }
    (lon_q, lat_q)
}
