use crate::api::{AnnotationPlacement, BackgroundRange, SeriesId, Tooltip};
use crate::core::{RenderSpace, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::series::RenderMode;

/// One projected series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesLayer<'a> {
    pub id: SeriesId,
    pub name: &'a str,
    pub mode: RenderMode,
    pub color: Option<&'a str>,
    pub axis: &'a str,
    pub space: &'a RenderSpace,
}

/// Everything a backend needs for one draw pass, borrowed from the
/// controller.
#[derive(Debug, Clone)]
pub struct RenderFrame<'a> {
    pub viewport: Viewport,
    pub series: Vec<SeriesLayer<'a>>,
    /// Device-pixel spans of background series.
    pub backgrounds: Vec<BackgroundRange>,
    pub annotations: &'a [AnnotationPlacement],
    pub tooltips: &'a [Tooltip],
}

impl<'a> RenderFrame<'a> {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            series: Vec::new(),
            backgrounds: Vec::new(),
            annotations: &[],
            tooltips: &[],
        }
    }

    #[must_use]
    pub fn with_series(mut self, layer: SeriesLayer<'a>) -> Self {
        self.series.push(layer);
        self
    }

    /// Checks the viewport and that every layer has one column per device
    /// pixel.
    pub fn validate(&self) -> ChartResult<()> {
        if !self.viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }

        let width = self.viewport.render_width();
        for layer in &self.series {
            if layer.space.width() != width {
                return Err(ChartError::InvalidData(format!(
                    "render space of `{}` has {} columns, viewport needs {width}",
                    layer.name,
                    layer.space.width()
                )));
            }
        }
        for range in &self.backgrounds {
            if !range.start_px.is_finite() || !range.end_px.is_finite() {
                return Err(ChartError::InvalidData(format!(
                    "background range of {} is not finite",
                    range.series
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.backgrounds.is_empty()
    }
}
