use crate::error::ChartResult;
use crate::render::{RenderFrame, Renderer};

/// Renderer for tests and headless use.
///
/// It still validates frame content, so tests catch malformed render spaces
/// without a drawing backend.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames: usize,
    pub last_series_count: usize,
    pub last_background_count: usize,
    pub last_tooltip_count: usize,
    /// Columns whose main value is null, summed over all layers.
    pub last_null_columns: usize,
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &RenderFrame<'_>) -> ChartResult<()> {
        frame.validate()?;
        self.frames += 1;
        self.last_series_count = frame.series.len();
        self.last_background_count = frame.backgrounds.len();
        self.last_tooltip_count = frame.tooltips.len();
        self.last_null_columns = frame
            .series
            .iter()
            .map(|layer| {
                (0..layer.space.width())
                    .filter(|&column| layer.space.value(column).is_none())
                    .count()
            })
            .sum();
        Ok(())
    }
}
