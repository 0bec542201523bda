use serde::{Deserialize, Serialize};

use crate::core::{AxisScale, Bounds, ValueScale};
use crate::error::ChartResult;

use super::SeriesId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AxisSide {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AxisOptions {
    #[serde(default)]
    pub scale: AxisScale,
    #[serde(default)]
    pub side: AxisSide,
}

impl AxisOptions {
    #[must_use]
    pub fn with_scale(mut self, scale: AxisScale) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: AxisSide) -> Self {
        self.side = side;
        self
    }
}

/// Series sharing one y scale.
///
/// `selected_data_bounds` is the merged raw extent of the windowed samples;
/// `current_bounds` is what gets drawn: padded, overridden and converted to
/// scale space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub id: String,
    pub options: AxisOptions,
    pub series: Vec<SeriesId>,
    pub selected_data_bounds: Bounds,
    pub current_bounds: Bounds,
}

impl Axis {
    #[must_use]
    pub fn new(id: impl Into<String>, options: AxisOptions) -> Self {
        Self {
            id: id.into(),
            options,
            series: Vec::new(),
            selected_data_bounds: Bounds::default(),
            current_bounds: Bounds::default(),
        }
    }

    #[must_use]
    pub fn scale(&self) -> AxisScale {
        self.options.scale
    }

    /// Vertical mapping for a plot `height` pixels tall.
    pub fn value_scale(&self, height: f64) -> ChartResult<ValueScale> {
        ValueScale::new(
            self.options.scale,
            self.current_bounds.min_y,
            self.current_bounds.max_y,
            height,
        )
    }
}
