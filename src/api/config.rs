use serde::{Deserialize, Serialize};

use crate::core::{ProjectorPreference, Viewport};
use crate::error::{ChartError, ChartResult};

use super::TooltipConfig;

pub const DEFAULT_HISTORY_DEBOUNCE_MS: f64 = 300.0;

/// Controller bootstrap configuration.
///
/// Serializable so hosts can persist chart setup next to their own state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub tooltip: TooltipConfig,
    #[serde(default)]
    pub projector: ProjectorPreference,
    /// Pan/zoom steps closer together than this collapse into one history
    /// entry.
    #[serde(default = "default_history_debounce_ms")]
    pub history_debounce_ms: f64,
    /// Keeps zero inside the y range of axes that draw bars.
    #[serde(default = "default_true")]
    pub bar_baseline: bool,
    /// Smallest x span `zoom_at_pixel` may reach, in data units.
    #[serde(default)]
    pub min_zoom_span: f64,
}

fn default_history_debounce_ms() -> f64 {
    DEFAULT_HISTORY_DEBOUNCE_MS
}

fn default_true() -> bool {
    true
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl ViewportConfig {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            tooltip: TooltipConfig::default(),
            projector: ProjectorPreference::default(),
            history_debounce_ms: DEFAULT_HISTORY_DEBOUNCE_MS,
            bar_baseline: true,
            min_zoom_span: 0.0,
        }
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    #[must_use]
    pub fn with_tooltip_threshold(mut self, threshold_px: f64) -> Self {
        self.tooltip.threshold_px = threshold_px;
        self
    }

    #[must_use]
    pub fn with_projector(mut self, projector: ProjectorPreference) -> Self {
        self.projector = projector;
        self
    }

    #[must_use]
    pub fn with_history_debounce_ms(mut self, debounce_ms: f64) -> Self {
        self.history_debounce_ms = debounce_ms;
        self
    }

    #[must_use]
    pub fn with_bar_baseline(mut self, enabled: bool) -> Self {
        self.bar_baseline = enabled;
        self
    }

    #[must_use]
    pub fn with_min_zoom_span(mut self, span: f64) -> Self {
        self.min_zoom_span = span;
        self
    }

    /// A zero-sized viewport is allowed (not laid out yet); anything
    /// non-finite or negative is not.
    pub fn validate(&self) -> ChartResult<()> {
        let ratio = self.viewport.pixel_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ChartError::InvalidConfig(format!(
                "pixel ratio must be finite and > 0, got {ratio}"
            )));
        }
        let threshold = self.tooltip.threshold_px;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ChartError::InvalidConfig(format!(
                "tooltip threshold must be finite and >= 0, got {threshold}"
            )));
        }
        if !self.history_debounce_ms.is_finite() || self.history_debounce_ms < 0.0 {
            return Err(ChartError::InvalidConfig(format!(
                "history debounce must be finite and >= 0, got {}",
                self.history_debounce_ms
            )));
        }
        if !self.min_zoom_span.is_finite() || self.min_zoom_span < 0.0 {
            return Err(ChartError::InvalidConfig(format!(
                "minimum zoom span must be finite and >= 0, got {}",
                self.min_zoom_span
            )));
        }
        Ok(())
    }

    pub fn to_json_pretty(self) -> ChartResult<String> {
        serde_json::to_string_pretty(&self)
            .map_err(|e| ChartError::InvalidData(format!("failed to serialize config: {e}")))
    }

    /// Parses and validates.
    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| ChartError::InvalidData(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
