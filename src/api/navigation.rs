use tracing::debug;

use crate::error::{ChartError, ChartResult};
use crate::render::Renderer;

use super::{
    BoundsCalculator, BoundsHistory, InvalidationTopic, ViewportController,
    fixed_window, show_all,
};

/// Smallest x span reachable by zooming when no minimum is configured.
const MIN_SPAN_ABSOLUTE: f64 = 1e-9;

impl<R: Renderer> ViewportController<R> {
    #[must_use]
    pub fn bounds_history(&self) -> &BoundsHistory {
        &self.history
    }

    /// Pushes `calculator` as a new history entry.
    pub fn set_bounds_calculator(&mut self, calculator: BoundsCalculator) {
        self.history.push(calculator);
        self.mark_navigation();
    }

    /// Pushes `calculator`, folding it into the previous entry when that one
    /// was also debounced less than the configured window ago.
    pub fn set_bounds_calculator_debounced(&mut self, calculator: BoundsCalculator, now_ms: f64) {
        let created = self.history.push_debounced(calculator, now_ms);
        debug!(created, position = self.history.position(), "debounced bounds push");
        self.mark_navigation();
    }

    /// Steps back in the bounds history. Every series is rewindowed from
    /// scratch.
    pub fn back(&mut self) -> bool {
        if !self.history.back() {
            return false;
        }
        self.rebuild_all();
        self.mark_navigation();
        true
    }

    pub fn forward(&mut self) -> bool {
        if !self.history.forward() {
            return false;
        }
        self.rebuild_all();
        self.mark_navigation();
        true
    }

    /// Shows exactly `[min_x, max_x]`.
    pub fn zoom_to(&mut self, min_x: f64, max_x: f64) -> ChartResult<()> {
        if !min_x.is_finite() || !max_x.is_finite() || min_x >= max_x {
            return Err(ChartError::InvalidData(format!(
                "zoom window must be finite and increasing, got [{min_x}, {max_x}]"
            )));
        }
        self.set_bounds_calculator(fixed_window(min_x, max_x));
        Ok(())
    }

    /// Drags the window by `delta_px` CSS pixels; dragging right reveals
    /// earlier data.
    pub fn pan_by_pixels(&mut self, delta_px: f64, now_ms: f64) -> ChartResult<()> {
        let width = self.navigation_width()?;
        if !delta_px.is_finite() {
            return Err(ChartError::InvalidData(format!(
                "pan delta must be finite, got {delta_px}"
            )));
        }
        let (min_x, max_x) = self.requested_window();
        let shift = -delta_px * (max_x - min_x) / width;
        if shift == 0.0 {
            return Ok(());
        }
        self.set_bounds_calculator_debounced(fixed_window(min_x + shift, max_x + shift), now_ms);
        Ok(())
    }

    /// Zooms by `factor` (> 1 zooms in) keeping the x under `anchor_px`
    /// fixed.
    pub fn zoom_at_pixel(&mut self, anchor_px: f64, factor: f64, now_ms: f64) -> ChartResult<()> {
        let width = self.navigation_width()?;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ChartError::InvalidData(format!(
                "zoom factor must be finite and > 0, got {factor}"
            )));
        }
        let (min_x, max_x) = self.requested_window();
        let span = (max_x - min_x).max(MIN_SPAN_ABSOLUTE);
        let target_span = (span / factor).max(self.config.min_zoom_span.max(MIN_SPAN_ABSOLUTE));

        let ratio = anchor_px.clamp(0.0, width) / width;
        let anchor = min_x + ratio * span;
        let target_min = anchor - ratio * target_span;
        self.set_bounds_calculator_debounced(
            fixed_window(target_min, target_min + target_span),
            now_ms,
        );
        Ok(())
    }

    /// Returns to showing all data, as a new history entry.
    pub fn reset_zoom(&mut self) {
        self.set_bounds_calculator(show_all());
    }

    /// Window the current calculator asks for, including pushes not yet
    /// processed by a frame.
    fn requested_window(&self) -> (f64, f64) {
        let global = self.global_bounds;
        let calculator = self.history.current();
        let partial = calculator(&global).unwrap_or_default();
        (
            partial.min_x.unwrap_or(global.min_x),
            partial.max_x.unwrap_or(global.max_x),
        )
    }

    fn navigation_width(&self) -> ChartResult<f64> {
        let width = f64::from(self.viewport.width);
        if width <= 0.0 {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        Ok(width)
    }

    fn rebuild_all(&mut self) {
        for record in self.records.values_mut() {
            record.needs_rebuild = true;
        }
    }

    fn mark_navigation(&mut self) {
        self.mark(InvalidationTopic::Selection);
        self.mark(InvalidationTopic::History);
    }
}
