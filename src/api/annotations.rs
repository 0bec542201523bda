use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{DataPoint, LinearScale};

use super::SeriesId;

/// Vertical marker (`x_end == None`) or shaded x span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub x: f64,
    #[serde(default)]
    pub x_end: Option<f64>,
    #[serde(default)]
    pub label: String,
    /// Restricts the annotation to graphs showing this series name.
    #[serde(default)]
    pub series: Option<String>,
}

impl Annotation {
    #[must_use]
    pub fn marker(x: f64, label: impl Into<String>) -> Self {
        Self {
            x,
            x_end: None,
            label: label.into(),
            series: None,
        }
    }

    #[must_use]
    pub fn span(x: f64, x_end: f64, label: impl Into<String>) -> Self {
        Self {
            x_end: Some(x_end),
            ..Self::marker(x, label)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPlacement {
    pub index: usize,
    pub label: String,
    pub pixel_x: f64,
    pub pixel_width: f64,
    pub visible: bool,
}

/// Places annotations on a horizontal pixel scale; off-screen ones are kept
/// with `visible == false` so indices stay stable.
#[must_use]
pub fn place_annotations(annotations: &[Annotation], x_scale: LinearScale) -> Vec<AnnotationPlacement> {
    let width = x_scale.pixels();
    annotations
        .iter()
        .enumerate()
        .map(|(index, annotation)| {
            let start = x_scale.domain_to_pixel(annotation.x);
            let end = annotation
                .x_end
                .map_or(start, |x_end| x_scale.domain_to_pixel(x_end));
            let (left, right) = (start.min(end), start.max(end));
            AnnotationPlacement {
                index,
                label: annotation.label.clone(),
                pixel_x: left,
                pixel_width: right - left,
                visible: left.is_finite() && right >= 0.0 && left <= width,
            }
        })
        .collect()
}

/// Right-click menu anchored at a pixel, with the data values under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContextMenuState {
    pub open: bool,
    pub pixel_x: f64,
    pub pixel_y: f64,
    /// Data x under the anchor.
    pub x: Option<f64>,
    /// Raw y under the anchor, per axis id.
    pub values: IndexMap<String, f64>,
}

/// Shaded pixel span of a background series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundRange {
    pub series: SeriesId,
    pub start_px: f64,
    pub end_px: f64,
}

/// Pixel spans where a background series is truthy (defined and non-zero).
/// A span runs from its first truthy sample to the next falsy one.
#[must_use]
pub fn background_ranges(
    series: SeriesId,
    points: &[DataPoint],
    x_scale: LinearScale,
) -> Vec<BackgroundRange> {
    let mut ranges = Vec::new();
    let mut open: Option<f64> = None;
    for point in points {
        let truthy = point.finite_y().is_some_and(|y| y != 0.0);
        match (open, truthy) {
            (None, true) => open = Some(point.x),
            (Some(start), false) => {
                ranges.push(span(series, start, point.x, x_scale));
                open = None;
            }
            _ => {}
        }
    }
    if let (Some(start), Some(last)) = (open, points.last()) {
        ranges.push(span(series, start, last.x, x_scale));
    }
    ranges
}

fn span(series: SeriesId, start: f64, end: f64, x_scale: LinearScale) -> BackgroundRange {
    BackgroundRange {
        series,
        start_px: x_scale.domain_to_pixel(start),
        end_px: x_scale.domain_to_pixel(end),
    }
}
