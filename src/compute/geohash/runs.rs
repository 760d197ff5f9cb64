//! Run detection over ordered code sequences.
//!
//! Codes produced by encoding a regular grid come out in contiguous blocks.
//! These helpers recover, for every distinct code, the index ranges it
//! occupies so the grid can be rebuilt without decoding every element.

use crate::error::{GeohashError, Result};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Half-open `[start, end)` index range.
pub type IndexRange = (usize, usize);

/// Ranges occupied by one code. Usually one; two when the code straddles the
/// end and the start of a circular axis.
pub type Ranges = SmallVec<[IndexRange; 2]>;

/// Returns, for each distinct value, the maximal runs of consecutive equal
/// elements in `codes`.
///
/// Superimposing every returned range covers `[0, codes.len())` exactly once.
///
/// # Examples
///
/// ```
/// use spatio_geohash::compute::geohash::runs;
///
/// let ranges = runs(&["abc", "abc", "xyz", "abc"]);
/// assert_eq!(ranges["abc"].as_slice(), &[(0, 2), (3, 4)]);
/// assert_eq!(ranges["xyz"].as_slice(), &[(2, 3)]);
/// ```
pub fn runs<T: Ord + Clone>(codes: &[T]) -> BTreeMap<T, Ranges> {
    let mut result: BTreeMap<T, Ranges> = BTreeMap::new();
    let mut start = 0;

    for end in 1..=codes.len() {
        if end == codes.len() || codes[end] != codes[start] {
            result
                .entry(codes[start].clone())
                .or_default()
                .push((start, end));
            start = end;
        }
    }

    result
}

/// Row and column ranges a code occupies in a row-major grid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GridExtent {
    pub rows: Ranges,
    pub cols: Ranges,
}

/// Two-dimensional variant of [`runs`] for a row-major `rows x cols` grid.
///
/// For each code, returns the contiguous row spans and column spans that
/// contain it. On a longitude axis that wraps, a cell cut by the grid seam
/// reports two column ranges, one at each end.
pub fn grid_extents<T: Ord + Clone>(
    codes: &[T],
    rows: usize,
    cols: usize,
) -> Result<BTreeMap<T, GridExtent>> {
    if rows.checked_mul(cols) != Some(codes.len()) {
        return Err(GeohashError::InvalidInput(format!(
            "grid of {} x {} does not match {} codes",
            rows,
            cols,
            codes.len()
        )));
    }

    let mut seen: BTreeMap<T, (Vec<bool>, Vec<bool>)> = BTreeMap::new();
    for (idx, code) in codes.iter().enumerate() {
        let (row_hits, col_hits) = seen
            .entry(code.clone())
            .or_insert_with(|| (vec![false; rows], vec![false; cols]));
        row_hits[idx / cols] = true;
        col_hits[idx % cols] = true;
    }

    Ok(seen
        .into_iter()
        .map(|(code, (row_hits, col_hits))| {
            let extent = GridExtent {
                rows: spans(&row_hits),
                cols: spans(&col_hits),
            };
            (code, extent)
        })
        .collect())
}

/// Contiguous spans of `true` flags.
fn spans(flags: &[bool]) -> Ranges {
    let mut out = Ranges::new();
    let mut start = None;
    for (idx, &hit) in flags.iter().enumerate() {
        match (hit, start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                out.push((s, idx));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, flags.len()));
    }
    out
}
