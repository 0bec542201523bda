use serde::{Deserialize, Serialize};

use crate::core::DataPoint;

/// Lookup mode for [`binary_search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SearchType {
    #[default]
    Nearest,
    /// Last sample with `x <= target`.
    Before,
    /// First sample with `x >= target`.
    After,
}

/// Finds a sample index by x value in an ascending sequence.
///
/// Duplicate x values resolve to the last duplicate for `Before` and the
/// first for `After`. `Nearest` picks the closer of the two candidates and
/// prefers the `Before` side on ties.
#[must_use]
pub fn binary_search(points: &[DataPoint], x: f64, search: SearchType) -> Option<usize> {
    if points.is_empty() || x.is_nan() {
        return None;
    }

    let before = points.partition_point(|point| point.x <= x).checked_sub(1);
    let after_index = points.partition_point(|point| point.x < x);
    let after = (after_index < points.len()).then_some(after_index);

    match search {
        SearchType::Before => before,
        SearchType::After => after,
        SearchType::Nearest => match (before, after) {
            (Some(b), Some(a)) => {
                let before_distance = x - points[b].x;
                let after_distance = points[a].x - x;
                if after_distance < before_distance {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        },
    }
}

/// Like [`binary_search`] but returns the sample together with its index.
#[must_use]
pub fn binary_search_point(
    points: &[DataPoint],
    x: f64,
    search: SearchType,
) -> Option<(usize, DataPoint)> {
    binary_search(points, x, search).map(|index| (index, points[index]))
}

/// Nearest sample to `x` whose y is defined and finite.
///
/// Walks outwards from the nearest hit in both directions; on equal x
/// distance the earlier sample wins.
#[must_use]
pub fn find_nearest_defined(points: &[DataPoint], x: f64) -> Option<usize> {
    let start = binary_search(points, x, SearchType::Nearest)?;
    if points[start].finite_y().is_some() {
        return Some(start);
    }

    let left = points[..start]
        .iter()
        .rposition(|point| point.finite_y().is_some());
    let right = points[start + 1..]
        .iter()
        .position(|point| point.finite_y().is_some())
        .map(|offset| start + 1 + offset);

    match (left, right) {
        (Some(l), Some(r)) => {
            if points[r].x - x < x - points[l].x {
                Some(r)
            } else {
                Some(l)
            }
        }
        (l, r) => l.or(r),
    }
}
