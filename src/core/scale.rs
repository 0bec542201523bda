use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Y-axis mapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AxisScale {
    #[default]
    Linear,
    /// Base-10 logarithmic spacing; non-positive values are not plottable.
    Log,
}

impl AxisScale {
    /// Maps a raw value into the scale's linear working space.
    ///
    /// Returns NaN for values the scale cannot represent.
    #[must_use]
    pub fn to_scale_space(self, value: f64) -> f64 {
        match self {
            Self::Linear => value,
            Self::Log if value > 0.0 => value.log10(),
            Self::Log => f64::NAN,
        }
    }

    #[must_use]
    pub fn from_scale_space(self, value: f64) -> f64 {
        match self {
            Self::Linear => value,
            Self::Log => 10f64.powf(value),
        }
    }
}

/// Affine mapping between a scale-space domain and a pixel span.
///
/// Pixel zero is the left edge for x and the top edge for y, so a vertical
/// scale is built with `inverted = true`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    pixels: f64,
    inverted: bool,
}

impl LinearScale {
    pub fn new(domain_start: f64, domain_end: f64, pixels: f64) -> ChartResult<Self> {
        if !domain_start.is_finite() || !domain_end.is_finite() {
            return Err(ChartError::InvalidData(
                "scale domain must be finite".to_owned(),
            ));
        }
        if !pixels.is_finite() || pixels < 0.0 {
            return Err(ChartError::InvalidData(
                "scale pixel span must be finite and >= 0".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
            pixels,
            inverted: false,
        })
    }

    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    #[must_use]
    pub fn pixels(self) -> f64 {
        self.pixels
    }

    /// Maps a domain value to pixels. A zero-width domain maps to the middle.
    #[must_use]
    pub fn domain_to_pixel(self, value: f64) -> f64 {
        let span = self.domain_end - self.domain_start;
        let normalized = if span == 0.0 {
            0.5
        } else {
            (value - self.domain_start) / span
        };
        if self.inverted {
            self.pixels * (1.0 - normalized)
        } else {
            self.pixels * normalized
        }
    }

    #[must_use]
    pub fn pixel_to_domain(self, pixel: f64) -> f64 {
        if self.pixels == 0.0 {
            return self.domain_start;
        }
        let mut normalized = pixel / self.pixels;
        if self.inverted {
            normalized = 1.0 - normalized;
        }
        self.domain_start + normalized * (self.domain_end - self.domain_start)
    }
}

/// Vertical mapping for one axis: raw value -> scale space -> pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueScale {
    pub scale: AxisScale,
    linear: LinearScale,
}

impl ValueScale {
    /// `min`/`max` are already in scale space (see `scale_bounds`).
    pub fn new(scale: AxisScale, min: f64, max: f64, height: f64) -> ChartResult<Self> {
        Ok(Self {
            scale,
            linear: LinearScale::new(min, max, height)?.inverted(),
        })
    }

    /// Pixel y for a raw value, or `None` when it is not plottable.
    #[must_use]
    pub fn value_to_pixel(self, value: f64) -> Option<f64> {
        let pixel = self
            .linear
            .domain_to_pixel(self.scale.to_scale_space(value));
        pixel.is_finite().then_some(pixel)
    }

    #[must_use]
    pub fn pixel_to_value(self, pixel: f64) -> f64 {
        self.scale
            .from_scale_space(self.linear.pixel_to_domain(pixel))
    }

    #[must_use]
    pub fn height(self) -> f64 {
        self.linear.pixels()
    }
}
