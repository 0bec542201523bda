//! Numeric aggregation over data-space tuples.
//!
//! [`calculate_data_bounds`] is the single pass every auto-scaling decision
//! starts from; the other helpers combine, pad and re-project its output.

use serde::{Deserialize, Serialize};

use crate::core::{AxisScale, DataPoint};

/// Relative Y padding applied by [`expand_bounds`].
pub const EXPAND_Y_RATIO: f64 = 0.05;

/// Decades kept below the maximum on a log axis without positive minimum.
const LOG_FALLBACK_DECADES: f64 = 3.0;

/// Raw extents of one series. `initial` marks "no data yet".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataBounds {
    pub min_x: Option<f64>,
    pub max_x: Option<f64>,
    pub min_y: Option<f64>,
    pub max_y: Option<f64>,
    pub min_positive_y: Option<f64>,
    pub closest_spacing: Option<f64>,
    pub initial: bool,
}

impl DataBounds {
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            min_x: None,
            max_x: None,
            min_y: None,
            max_y: None,
            min_positive_y: None,
            closest_spacing: None,
            initial: true,
        }
    }
}

impl Default for DataBounds {
    fn default() -> Self {
        Self::initial()
    }
}

/// Resolved window extents with every axis defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    #[serde(default)]
    pub min_positive_y: Option<f64>,
    /// Smallest positive x delta, `0.0` when unknown.
    #[serde(default)]
    pub closest_spacing: f64,
    #[serde(default)]
    pub dates: bool,
}

impl Bounds {
    #[must_use]
    pub fn x_range(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn y_range(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Options for [`calculate_data_bounds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsOptions<'a> {
    /// Share of ranked y values kept, `100` keeps everything.
    pub percentile: f64,
    /// Shifts the kept window up (positive) or down (negative), in percent.
    pub percentile_asymmetry: f64,
    /// Extra y values that take part in Y bounds (range series extremes).
    pub range_values: &'a [f64],
}

impl Default for BoundsOptions<'_> {
    fn default() -> Self {
        Self {
            percentile: 100.0,
            percentile_asymmetry: 0.0,
            range_values: &[],
        }
    }
}

/// Computes x/y extents and the closest x spacing in one pass.
#[must_use]
pub fn calculate_data_bounds(points: &[DataPoint], options: &BoundsOptions<'_>) -> DataBounds {
    if points.is_empty() && options.range_values.is_empty() {
        return DataBounds::initial();
    }

    let use_percentile = options.percentile.is_finite() && options.percentile < 100.0;
    let mut ranked = if use_percentile {
        Vec::with_capacity(points.len() + options.range_values.len())
    } else {
        Vec::new()
    };

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut min_positive_y = f64::INFINITY;
    let mut closest_spacing = f64::INFINITY;
    let mut previous_x: Option<f64> = None;

    let mut accept_y = |y: f64| {
        if use_percentile {
            ranked.push(y);
        } else {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        if y > 0.0 {
            min_positive_y = min_positive_y.min(y);
        }
    };

    for point in points {
        if point.x.is_finite() {
            min_x = min_x.min(point.x);
            max_x = max_x.max(point.x);
            if let Some(previous) = previous_x {
                let delta = point.x - previous;
                if delta > 0.0 && delta < closest_spacing {
                    closest_spacing = delta;
                }
            }
            previous_x = Some(point.x);
        }
        if let Some(y) = point.finite_y() {
            accept_y(y);
        }
    }
    for &value in options.range_values {
        if value.is_finite() {
            accept_y(value);
        }
    }

    if use_percentile && !ranked.is_empty() {
        ranked.sort_unstable_by(f64::total_cmp);
        let (low, high) = percentile_ranks(
            ranked.len(),
            options.percentile,
            options.percentile_asymmetry,
        );
        min_y = ranked[low];
        max_y = ranked[high];
    }

    DataBounds {
        min_x: finite(min_x),
        max_x: finite(max_x),
        min_y: finite(min_y),
        max_y: finite(max_y),
        min_positive_y: finite(min_positive_y),
        closest_spacing: finite(closest_spacing),
        initial: false,
    }
}

/// Folds the extents of appended samples into `bounds`.
///
/// `tail` must be computed from the new samples plus the last sample already
/// covered by `bounds`, so the spacing across the seam is measured. Only valid
/// for untrimmed bounds (`percentile == 100`).
#[must_use]
pub fn extend_data_bounds(bounds: DataBounds, tail: DataBounds) -> DataBounds {
    if bounds.initial {
        return tail;
    }
    if tail.initial {
        return bounds;
    }
    DataBounds {
        min_x: combine(bounds.min_x, tail.min_x, f64::min),
        max_x: combine(bounds.max_x, tail.max_x, f64::max),
        min_y: combine(bounds.min_y, tail.min_y, f64::min),
        max_y: combine(bounds.max_y, tail.max_y, f64::max),
        min_positive_y: combine(bounds.min_positive_y, tail.min_positive_y, f64::min),
        closest_spacing: combine(bounds.closest_spacing, tail.closest_spacing, f64::min),
        initial: false,
    }
}

fn combine(a: Option<f64>, b: Option<f64>, op: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(op(a, b)),
        (a, b) => a.or(b),
    }
}

/// Rank indices of the lower and upper percentile cut for `len` sorted values.
#[must_use]
pub fn percentile_ranks(len: usize, percentile: f64, asymmetry: f64) -> (usize, usize) {
    if len == 0 {
        return (0, 0);
    }
    let percentile = percentile.clamp(0.0, 100.0);
    let tail = (100.0 - percentile) / 2.0;
    let asymmetry = if asymmetry.is_finite() {
        asymmetry.clamp(-tail, tail)
    } else {
        0.0
    };
    let low_pct = tail + asymmetry;
    let high_pct = 100.0 - (tail - asymmetry);

    let n = len as f64;
    let last = len - 1;
    let low = ((n * low_pct / 100.0).floor() as usize).min(last);
    let high = ((n * high_pct / 100.0).ceil() as usize)
        .saturating_sub(1)
        .min(last);
    (low, high.max(low))
}

/// Union of all non-initial entries; every axis is `0` when none remain.
#[must_use]
pub fn merge_bounds<'a, I>(entries: I) -> Bounds
where
    I: IntoIterator<Item = &'a DataBounds>,
{
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut min_positive_y = f64::INFINITY;
    let mut closest_spacing = f64::INFINITY;

    for entry in entries.into_iter().filter(|entry| !entry.initial) {
        fold(&mut min_x, entry.min_x, f64::min);
        fold(&mut max_x, entry.max_x, f64::max);
        fold(&mut min_y, entry.min_y, f64::min);
        fold(&mut max_y, entry.max_y, f64::max);
        fold(&mut min_positive_y, entry.min_positive_y, f64::min);
        fold(&mut closest_spacing, entry.closest_spacing, f64::min);
    }

    Bounds {
        min_x: finite(min_x).unwrap_or(0.0),
        max_x: finite(max_x).unwrap_or(0.0),
        min_y: finite(min_y).unwrap_or(0.0),
        max_y: finite(max_y).unwrap_or(0.0),
        min_positive_y: finite(min_positive_y),
        closest_spacing: finite(closest_spacing).unwrap_or(0.0),
        dates: false,
    }
}

/// Options for [`expand_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpandOptions<'a> {
    /// Values the Y range must contain (e.g. `0.0` for bar baselines).
    pub expand_y_with: &'a [f64],
    /// Widens X by half a bar on each side when bars are drawn.
    pub extend_x_for_n_bars: Option<usize>,
}

/// Pads bounds so the drawn extremes do not touch the plot edges.
#[must_use]
pub fn expand_bounds(bounds: &Bounds, options: &ExpandOptions<'_>) -> Bounds {
    let mut expanded = *bounds;

    for &value in options.expand_y_with {
        if value.is_finite() {
            expanded.min_y = expanded.min_y.min(value);
            expanded.max_y = expanded.max_y.max(value);
        }
    }

    let range = expanded.max_y - expanded.min_y;
    if range == 0.0 {
        if expanded.min_y == 0.0 {
            expanded.min_y = -1.0;
            expanded.max_y = 1.0;
        } else {
            let pad = expanded.min_y.abs() * EXPAND_Y_RATIO;
            expanded.min_y -= pad;
            expanded.max_y += pad;
        }
    } else if range.is_finite() {
        let middle = expanded.min_y + range / 2.0;
        let half = range * (1.0 + EXPAND_Y_RATIO) / 2.0;
        expanded.min_y = middle - half;
        expanded.max_y = middle + half;
    }

    if let Some(bars) = options.extend_x_for_n_bars {
        let bar_width = if expanded.closest_spacing > 0.0 {
            expanded.closest_spacing
        } else if bars > 0 {
            expanded.x_range() / bars as f64
        } else {
            0.0
        };
        if bar_width.is_finite() {
            expanded.min_x -= bar_width / 2.0;
            expanded.max_x += bar_width / 2.0;
        }
    }

    expanded
}

/// Re-expresses Y bounds in the scale space of `scale`.
#[must_use]
pub fn scale_bounds(bounds: &Bounds, scale: AxisScale) -> Bounds {
    match scale {
        AxisScale::Linear => *bounds,
        AxisScale::Log => {
            let mut scaled = *bounds;
            if bounds.max_y <= 0.0 || !bounds.max_y.is_finite() {
                scaled.min_y = 0.0;
                scaled.max_y = 1.0;
                return scaled;
            }
            scaled.max_y = bounds.max_y.log10();
            scaled.min_y = if bounds.min_y > 0.0 {
                bounds.min_y.log10()
            } else {
                match bounds.min_positive_y {
                    Some(positive) if positive < bounds.max_y => positive.log10(),
                    _ => scaled.max_y - LOG_FALLBACK_DECADES,
                }
            };
            scaled
        }
    }
}

fn fold(target: &mut f64, value: Option<f64>, op: fn(f64, f64) -> f64) {
    if let Some(value) = value.filter(|v| v.is_finite()) {
        *target = op(*target, value);
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
