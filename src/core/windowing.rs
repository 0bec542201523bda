//! Data space -> selected space.
//!
//! A selected space is the slice of a sorted data space that lies strictly
//! inside `(min_x, max_x)`, framed by exactly one boundary point per edge.
//! Boundaries are verbatim samples when one sits on the edge and are
//! interpolated otherwise.
//!
//! Results carry a [`WindowState`] so the next frame can pass them back as a
//! swap and only pay for the index ranges that entered or left the window.
//! Scratch and incremental computation produce identical values.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::DataPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WindowOptions {
    /// Drops gap samples and interpolates across them.
    pub ignore_discontinuities: bool,
    /// Step interpolation: an edge takes the preceding sample's y.
    pub square: bool,
}

/// Bookkeeping recorded with each selected space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    /// First data index strictly inside the window.
    pub before_index: usize,
    /// One past the last data index strictly inside the window.
    pub after_index: usize,
    pub min_x: f64,
    pub max_x: f64,
    /// Left boundary was synthesized rather than copied from a sample.
    pub first_added: bool,
    /// Right boundary was synthesized rather than copied from a sample.
    pub last_added: bool,
    pub ignore_discontinuities: bool,
    pub square: bool,
    /// Data length the indices refer to.
    pub data_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedSpace {
    points: VecDeque<DataPoint>,
    state: WindowState,
}

impl SelectedSpace {
    #[must_use]
    pub fn points(&self) -> &VecDeque<DataPoint> {
        &self.points
    }

    /// Contiguous view of the points, rotating the ring buffer if needed.
    pub fn as_slice(&mut self) -> &[DataPoint] {
        self.points.make_contiguous()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<DataPoint> {
        self.points.iter().copied().collect()
    }

    #[must_use]
    pub fn state(&self) -> &WindowState {
        &self.state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Interior samples only, boundaries excluded.
    pub fn interior(&self) -> impl Iterator<Item = &DataPoint> {
        let len = self.points.len();
        self.points.iter().skip(1).take(len.saturating_sub(2))
    }

    fn can_swap(&self, data_len: usize, options: WindowOptions) -> bool {
        self.points.len() >= 2
            && self.state.data_len <= data_len
            && self.state.ignore_discontinuities == options.ignore_discontinuities
            && self.state.square == options.square
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Left,
    Right,
}

/// Clips `points` to `[min_x, max_x]` with one boundary point per edge.
///
/// `swap` is the previous result for the same series. It is only valid when
/// `points` is the previous data with samples appended at the end; callers
/// drop it after replacing data.
#[must_use]
pub fn data_space_to_selected_space(
    points: &[DataPoint],
    min_x: f64,
    max_x: f64,
    options: WindowOptions,
    swap: Option<SelectedSpace>,
) -> SelectedSpace {
    let (min_x, max_x) = if min_x <= max_x {
        (min_x, max_x)
    } else {
        (max_x, min_x)
    };

    let before_index = points.partition_point(|point| point.x <= min_x);
    let after_index = points
        .partition_point(|point| point.x < max_x)
        .max(before_index);
    let ignore = options.ignore_discontinuities;

    let mut inner = match swap.filter(|previous| previous.can_swap(points.len(), options)) {
        Some(previous) => splice_interior(previous, points, before_index, after_index, ignore),
        None => {
            let mut inner = VecDeque::with_capacity(after_index - before_index + 2);
            extend_back(&mut inner, &points[before_index..after_index], ignore);
            inner
        }
    };

    let (left, first_added) = edge_point(points, min_x, Edge::Left, options);
    let (right, last_added) = edge_point(points, max_x, Edge::Right, options);
    inner.push_front(left);
    inner.push_back(right);

    SelectedSpace {
        points: inner,
        state: WindowState {
            before_index,
            after_index,
            min_x,
            max_x,
            first_added,
            last_added,
            ignore_discontinuities: ignore,
            square: options.square,
            data_len: points.len(),
        },
    }
}

fn splice_interior(
    previous: SelectedSpace,
    points: &[DataPoint],
    before_index: usize,
    after_index: usize,
    ignore: bool,
) -> VecDeque<DataPoint> {
    let old_before = previous.state.before_index;
    let old_after = previous.state.after_index;
    let mut inner = previous.points;
    inner.pop_front();
    inner.pop_back();

    if after_index <= old_before || before_index >= old_after {
        trace!(
            old_before,
            old_after,
            before_index,
            after_index,
            "window jumped, rebuilding interior"
        );
        inner.clear();
        extend_back(&mut inner, &points[before_index..after_index], ignore);
        return inner;
    }

    if before_index < old_before {
        for point in points[before_index..old_before].iter().rev() {
            if keeps(point, ignore) {
                inner.push_front(*point);
            }
        }
    } else if before_index > old_before {
        for _ in 0..kept_count(&points[old_before..before_index], ignore) {
            inner.pop_front();
        }
    }

    if after_index > old_after {
        extend_back(&mut inner, &points[old_after..after_index], ignore);
    } else if after_index < old_after {
        for _ in 0..kept_count(&points[after_index..old_after], ignore) {
            inner.pop_back();
        }
    }

    inner
}

fn keeps(point: &DataPoint, ignore: bool) -> bool {
    !(ignore && point.is_gap())
}

fn kept_count(points: &[DataPoint], ignore: bool) -> usize {
    if ignore {
        points.iter().filter(|point| !point.is_gap()).count()
    } else {
        points.len()
    }
}

fn extend_back(target: &mut VecDeque<DataPoint>, points: &[DataPoint], ignore: bool) {
    target.extend(points.iter().copied().filter(|point| keeps(point, ignore)));
}

/// Boundary sample for one edge and whether it was synthesized.
fn edge_point(
    points: &[DataPoint],
    edge_x: f64,
    edge: Edge,
    options: WindowOptions,
) -> (DataPoint, bool) {
    let ignore = options.ignore_discontinuities;
    // Last sample at or before the edge, first sample at or after it.
    let low = points
        .partition_point(|point| point.x <= edge_x)
        .checked_sub(1);
    let high_index = points.partition_point(|point| point.x < edge_x);
    let high = (high_index < points.len()).then_some(high_index);

    let exact = match edge {
        Edge::Left => low.filter(|&i| points[i].x == edge_x),
        Edge::Right => high.filter(|&i| points[i].x == edge_x),
    };
    if let Some(index) = exact {
        let sample = points[index];
        if !(ignore && sample.is_gap()) {
            return (sample, false);
        }
    }

    let (previous, next) = if ignore {
        (
            low.and_then(|i| points[..=i].iter().rposition(|p| !p.is_gap())),
            high.and_then(|i| {
                points[i..]
                    .iter()
                    .position(|p| !p.is_gap())
                    .map(|offset| i + offset)
            }),
        )
    } else {
        (low, high)
    };

    let y = match (previous, next) {
        (Some(p), Some(n)) => interpolate(points[p], points[n], edge_x, options.square),
        _ => None,
    };
    (DataPoint::with_y(edge_x, y), true)
}

fn interpolate(previous: DataPoint, next: DataPoint, x: f64, square: bool) -> Option<f64> {
    let previous_y = previous.y?;
    if square {
        return Some(previous_y);
    }
    let next_y = next.y?;
    let span = next.x - previous.x;
    if span == 0.0 {
        return Some(previous_y);
    }
    Some(previous_y + (next_y - previous_y) * (x - previous.x) / span)
}
