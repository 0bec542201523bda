//! chart-viewport: the data pipeline behind interactive time-series charts.
//!
//! Raw series are normalized into a sorted data space, windowed to the
//! visible x range (incrementally, reusing the previous frame), condensed to
//! a bounded number of points and projected into per-pixel-column render
//! buffers. [`api::ViewportController`] drives the pipeline once per frame;
//! [`api::MultigraphController`] routes series across stacked charts.

pub mod api;
pub mod core;
pub mod error;
pub mod render;
pub mod series;
pub mod telemetry;

pub use api::{MultigraphController, ViewportConfig, ViewportController};
pub use error::{ChartError, ChartResult};
