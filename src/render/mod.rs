mod frame;
mod null_renderer;

pub use frame::{RenderFrame, SeriesLayer};
pub use null_renderer::NullRenderer;

use crate::error::ChartResult;

/// Contract implemented by any drawing backend.
///
/// Backends receive borrowed, fully projected render spaces and must not
/// mutate them; everything domain-specific already happened upstream.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame<'_>) -> ChartResult<()>;
}
