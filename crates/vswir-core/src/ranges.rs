//! Pixel-id range compression.
//!
//! Extraction jobs are scoped by pixel id. Sending every id is wasteful, so a
//! sorted id set is shrunk into closed intervals before submission.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::row::RawRow;

/// Column holding the per-row pixel id arrays.
pub const PIXEL_IDS_COLUMN: &str = "pixel_ids";

/// Closed interval `[start, end]`, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[i64; 2]", into = "[i64; 2]")]
pub struct PixelRange {
    pub start: i64,
    pub end: i64,
}

impl PixelRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Number of ids in the interval, zero for an inverted one. Saturates
    /// at `u64::MAX` for the full `i64` span.
    pub fn count(&self) -> u64 {
        if self.start > self.end {
            return 0;
        }
        self.end.abs_diff(self.start).saturating_add(1)
    }
}

impl TryFrom<[i64; 2]> for PixelRange {
    type Error = Error;

    fn try_from([start, end]: [i64; 2]) -> Result<Self> {
        if start > end {
            return Err(Error::Invariant(format!(
                "pixel range start {start} is past its end {end}"
            )));
        }
        Ok(Self { start, end })
    }
}

impl From<PixelRange> for [i64; 2] {
    fn from(r: PixelRange) -> Self {
        [r.start, r.end]
    }
}

/// Ascending, non-overlapping, maximally merged intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeList(Vec<PixelRange>);

impl RangeList {
    pub fn ranges(&self) -> &[PixelRange] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of ids covered by all intervals.
    pub fn covered(&self) -> u64 {
        self.0.iter().map(PixelRange::count).sum()
    }

    /// Expand back into the sorted id list.
    pub fn flatten(&self) -> Vec<i64> {
        self.0.iter().flat_map(|r| r.start..=r.end).collect()
    }
}

/// Compress a sorted, deduplicated id list into a [`RangeList`].
///
/// Runs are extended while the next value is `prev + 1`. Empty input is
/// rejected with [`Error::EmptyInput`]; unsorted or duplicated input is a
/// caller bug and is reported as [`Error::Invariant`].
pub fn to_ranges(sorted: &[i64]) -> Result<RangeList> {
    let (&first, rest) = sorted.split_first().ok_or(Error::EmptyInput)?;

    let mut out = Vec::new();
    let mut start = first;
    let mut prev = first;
    for &val in rest {
        if val <= prev {
            return Err(Error::Invariant(format!(
                "pixel ids must be strictly ascending (saw {val} after {prev})"
            )));
        }
        if val == prev + 1 {
            prev = val;
        } else {
            out.push(PixelRange::new(start, prev));
            start = val;
            prev = val;
        }
    }
    out.push(PixelRange::new(start, prev));
    Ok(RangeList(out))
}

/// Collect the sorted, deduplicated pixel ids of an (unpaged) result set.
///
/// Reads the `pixel_ids` column by position. Returns an empty list when the
/// view has no such column; non-array cells are skipped.
pub fn extract_pixel_ids(rows: &[RawRow], select_columns: &[String]) -> Vec<i64> {
    let Some(idx) = select_columns.iter().position(|c| c == PIXEL_IDS_COLUMN) else {
        return Vec::new();
    };

    let mut ids = BTreeSet::new();
    for row in rows {
        let Some(Value::Array(items)) = row.get(idx) else {
            continue;
        };
        for item in items {
            match item.as_i64() {
                Some(id) => {
                    ids.insert(id);
                }
                None => tracing::debug!(value = %item, "skipping non-integer pixel id"),
            }
        }
    }
    ids.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(list: &RangeList) -> Vec<[i64; 2]> {
        list.ranges().iter().map(|r| [r.start, r.end]).collect()
    }

    #[test]
    fn single_value_is_one_range() {
        let r = to_ranges(&[5]).unwrap();
        assert_eq!(pairs(&r), vec![[5, 5]]);
    }

    #[test]
    fn gaps_split_runs() {
        let r = to_ranges(&[1, 2, 3, 7, 8, 10]).unwrap();
        assert_eq!(pairs(&r), vec![[1, 3], [7, 8], [10, 10]]);
        assert_eq!(r.covered(), 6);
    }

    #[test]
    fn empty_input_fails_fast() {
        assert!(matches!(to_ranges(&[]), Err(Error::EmptyInput)));
    }

    #[test]
    fn unsorted_input_is_rejected() {
        assert!(matches!(to_ranges(&[3, 1]), Err(Error::Invariant(_))));
        assert!(matches!(to_ranges(&[1, 1]), Err(Error::Invariant(_))));
    }

    #[test]
    fn negative_ids_merge() {
        let r = to_ranges(&[-3, -2, -1, 0, 4]).unwrap();
        assert_eq!(pairs(&r), vec![[-3, 0], [4, 4]]);
    }

    #[test]
    fn serializes_as_nested_arrays() {
        let r = to_ranges(&[1, 2, 9]).unwrap();
        assert_eq!(serde_json::to_value(&r).unwrap(), json!([[1, 2], [9, 9]]));
    }

    #[test]
    fn inverted_range_is_rejected_on_decode() {
        assert!(serde_json::from_str::<RangeList>("[[5,4]]").is_err());
        let ok: RangeList = serde_json::from_str("[[4,5],[9,9]]").unwrap();
        assert_eq!(ok.covered(), 3);
    }

    #[test]
    fn count_does_not_overflow() {
        assert_eq!(PixelRange::new(5, 4).count(), 0);
        assert_eq!(PixelRange::new(i64::MIN, i64::MAX).count(), u64::MAX);
        assert_eq!(PixelRange::new(-1, 1).count(), 3);
    }

    #[test]
    fn pixel_ids_are_deduplicated_and_sorted() {
        let cols = vec!["plot_name".to_string(), "pixel_ids".to_string()];
        let rows = vec![
            vec![json!("a"), json!([9, 3, 4])],
            vec![json!("b"), json!(null)],
            vec![json!("c"), json!([4, 5, "x"])],
        ];
        assert_eq!(extract_pixel_ids(&rows, &cols), vec![3, 4, 5, 9]);
    }

    #[test]
    fn missing_pixel_column_yields_nothing() {
        let cols = vec!["plot_name".to_string()];
        let rows = vec![vec![json!("a")]];
        assert!(extract_pixel_ids(&rows, &cols).is_empty());
    }
}
