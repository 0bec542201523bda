//! Cursor tooltips.
//!
//! Lookups run on data space, never on render space, so the picked sample
//! does not depend on condensation. Distances are in CSS pixels.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{DataPoint, LinearScale, ValueScale, find_nearest_defined};

use super::SeriesId;

pub const DEFAULT_TOOLTIP_THRESHOLD_PX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TooltipConfig {
    /// Max distance in x, in y and combined.
    #[serde(default = "default_threshold")]
    pub threshold_px: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_TOOLTIP_THRESHOLD_PX
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            threshold_px: DEFAULT_TOOLTIP_THRESHOLD_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub pixel_x: f64,
    pub pixel_y: f64,
}

impl Cursor {
    #[must_use]
    pub const fn new(pixel_x: f64, pixel_y: f64) -> Self {
        Self { pixel_x, pixel_y }
    }
}

/// Hit area of a bar series: bars span from the zero line to their value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarTarget {
    pub half_width_px: f64,
    pub zero_px: f64,
}

/// One visible series offered to [`calculate_tooltip_state`].
#[derive(Debug, Clone, Copy)]
pub struct TooltipCandidate<'a> {
    pub series: SeriesId,
    pub name: &'a str,
    pub color: Option<&'a str>,
    pub points: &'a [DataPoint],
    pub x_scale: LinearScale,
    pub y_scale: ValueScale,
    pub always_tooltipped: bool,
    pub bar: Option<BarTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub series: SeriesId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub pixel_x: f64,
    pub pixel_y: f64,
    pub color: Option<String>,
    /// Distance to the cursor in pixels.
    pub distance: f64,
    pub saved: bool,
}

impl Tooltip {
    fn same_sample(&self, other: &Self) -> bool {
        self.series == other.series && self.x.to_bits() == other.x.to_bits()
    }
}

struct Hit {
    tooltip: Tooltip,
    always: bool,
}

/// Tooltips to show: saved ones repositioned, then the live ones.
///
/// A live candidate is admitted when it is within the threshold in x, in y
/// and in combined distance; `always_tooltipped` series skip both y checks.
/// Of the admitted ordinary candidates only those at the minimum distance
/// are kept, ties included.
#[must_use]
pub fn calculate_tooltip_state(
    cursor: Option<Cursor>,
    candidates: &[TooltipCandidate<'_>],
    saved: &[Tooltip],
    config: &TooltipConfig,
) -> Vec<Tooltip> {
    let mut tooltips: Vec<Tooltip> = saved
        .iter()
        .filter_map(|tooltip| reposition(tooltip, candidates, cursor))
        .collect();

    let Some(cursor) = cursor else {
        return tooltips;
    };

    let hits: SmallVec<[Hit; 8]> = candidates
        .iter()
        .filter_map(|candidate| admit(candidate, cursor, config.threshold_px))
        .collect();

    let closest = hits
        .iter()
        .filter(|hit| !hit.always)
        .map(|hit| OrderedFloat(hit.tooltip.distance))
        .min();

    for hit in hits {
        let keep = hit.always || Some(OrderedFloat(hit.tooltip.distance)) == closest;
        if keep && !tooltips.iter().any(|shown| shown.same_sample(&hit.tooltip)) {
            tooltips.push(hit.tooltip);
        }
    }
    tooltips
}

/// Pins live tooltips and unpins saved ones under the cursor.
pub fn toggle_saved(saved: &mut Vec<Tooltip>, current: &[Tooltip], threshold_px: f64) {
    for tooltip in current {
        if tooltip.saved {
            if tooltip.distance <= threshold_px {
                saved.retain(|pinned| !pinned.same_sample(tooltip));
            }
        } else if !saved.iter().any(|pinned| pinned.same_sample(tooltip)) {
            saved.push(Tooltip {
                saved: true,
                ..tooltip.clone()
            });
        }
    }
}

fn reposition(
    tooltip: &Tooltip,
    candidates: &[TooltipCandidate<'_>],
    cursor: Option<Cursor>,
) -> Option<Tooltip> {
    let candidate = candidates
        .iter()
        .find(|candidate| candidate.series == tooltip.series)?;
    let pixel_x = candidate.x_scale.domain_to_pixel(tooltip.x);
    let pixel_y = candidate.y_scale.value_to_pixel(tooltip.y)?;
    let distance = cursor.map_or(f64::INFINITY, |cursor| {
        (pixel_x - cursor.pixel_x).hypot(pixel_y - cursor.pixel_y)
    });
    Some(Tooltip {
        pixel_x,
        pixel_y,
        distance,
        saved: true,
        ..tooltip.clone()
    })
}

fn admit(candidate: &TooltipCandidate<'_>, cursor: Cursor, threshold: f64) -> Option<Hit> {
    let target_x = candidate.x_scale.pixel_to_domain(cursor.pixel_x);
    let index = find_nearest_defined(candidate.points, target_x)?;
    let point = candidate.points[index];
    let y = point.finite_y()?;
    let pixel_x = candidate.x_scale.domain_to_pixel(point.x);
    let pixel_y = candidate.y_scale.value_to_pixel(y)?;

    let dx = (pixel_x - cursor.pixel_x).abs();
    let dy = (pixel_y - cursor.pixel_y).abs();
    let euclidean = dx.hypot(dy);

    let distance = match candidate.bar {
        Some(bar) => {
            if dx > threshold.max(bar.half_width_px) {
                return None;
            }
            let top = pixel_y.min(bar.zero_px) - threshold;
            let bottom = pixel_y.max(bar.zero_px) + threshold;
            let inside = (top..=bottom).contains(&cursor.pixel_y);
            if !inside && !candidate.always_tooltipped {
                return None;
            }
            if inside { dx } else { euclidean }
        }
        None => {
            if dx > threshold {
                return None;
            }
            if !candidate.always_tooltipped && (dy > threshold || euclidean > threshold) {
                return None;
            }
            euclidean
        }
    };

    Some(Hit {
        tooltip: Tooltip {
            series: candidate.series,
            name: candidate.name.to_owned(),
            x: point.x,
            y,
            pixel_x,
            pixel_y,
            color: candidate.color.map(str::to_owned),
            distance,
            saved: false,
        },
        always: candidate.always_tooltipped,
    })
}
