use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Plot area size in CSS pixels plus the device pixel ratio.
///
/// Render-space buffers are sized in device pixels, see [`Viewport::render_width`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f64,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    #[must_use]
    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0 && self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0
    }

    /// Number of pixel columns in render space.
    #[must_use]
    pub fn render_width(self) -> usize {
        (f64::from(self.width) * self.pixel_ratio).round().max(0.0) as usize
    }

    #[must_use]
    pub fn render_height(self) -> f64 {
        f64::from(self.height) * self.pixel_ratio
    }
}

/// One data-space sample. `y == None` marks a discontinuity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: Option<f64>,
}

impl DataPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y: Some(y) }
    }

    #[must_use]
    pub const fn gap(x: f64) -> Self {
        Self { x, y: None }
    }

    #[must_use]
    pub const fn with_y(x: f64, y: Option<f64>) -> Self {
        Self { x, y }
    }

    /// The y value when it is present and finite.
    #[must_use]
    pub fn finite_y(self) -> Option<f64> {
        self.y.filter(|y| y.is_finite())
    }

    #[must_use]
    pub fn is_gap(self) -> bool {
        self.y.is_none()
    }

    /// Bitwise comparison, so `-0.0 != 0.0` and NaN equals itself.
    #[must_use]
    pub fn same_bits(self, other: Self) -> bool {
        self.x.to_bits() == other.x.to_bits()
            && match (self.y, other.y) {
                (Some(a), Some(b)) => a.to_bits() == b.to_bits(),
                (None, None) => true,
                _ => false,
            }
    }
}

#[must_use]
pub fn datetime_to_epoch_millis(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64
}
