//! Selected/condensed space -> render space.
//!
//! Render space is a set of parallel per-column arrays sized to the device
//! pixel width. Every column is computed by [`project_column`] alone, which
//! keeps the sequential and parallel projectors bit-for-bit identical.

use serde::{Deserialize, Serialize};
use tracing::warn;

#[cfg(feature = "parallel-projection")]
use rayon::prelude::*;

use crate::core::{DataPoint, ValueScale};
use crate::error::ChartResult;

/// Column has no main value.
pub const NULL_VALUE: u8 = 1 << 0;
/// Column has no local minimum.
pub const NULL_MIN: u8 = 1 << 1;
/// Column has no local maximum.
pub const NULL_MAX: u8 = 1 << 2;

/// Per-column buffers handed to the renderer. Pixel values are in device
/// pixels with y growing downwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderSpace {
    pub values: Vec<f64>,
    pub mins: Vec<f64>,
    pub maxes: Vec<f64>,
    pub nulls: Vec<u8>,
}

impl RenderSpace {
    #[must_use]
    pub fn with_width(width: usize) -> Self {
        let mut space = Self::default();
        space.resize(width);
        space
    }

    /// Resizes in place, keeping the allocations when the width is unchanged.
    pub fn resize(&mut self, width: usize) {
        self.values.resize(width, 0.0);
        self.mins.resize(width, 0.0);
        self.maxes.resize(width, 0.0);
        self.nulls.resize(width, NULL_VALUE | NULL_MIN | NULL_MAX);
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.values.len()
    }

    /// Main pixel value of a column, `None` when the column is a gap.
    #[must_use]
    pub fn value(&self, column: usize) -> Option<f64> {
        (self.nulls.get(column)? & NULL_VALUE == 0).then(|| self.values[column])
    }

    #[must_use]
    pub fn min(&self, column: usize) -> Option<f64> {
        (self.nulls.get(column)? & NULL_MIN == 0).then(|| self.mins[column])
    }

    #[must_use]
    pub fn max(&self, column: usize) -> Option<f64> {
        (self.nulls.get(column)? & NULL_MAX == 0).then(|| self.maxes[column])
    }

    fn write(&mut self, column: usize, projected: Column) {
        self.values[column] = projected.value;
        self.mins[column] = projected.min;
        self.maxes[column] = projected.max;
        self.nulls[column] = projected.nulls;
    }
}

/// Geometry of one projection pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParams {
    pub render_width: usize,
    pub min_x: f64,
    pub max_x: f64,
    pub y: ValueScale,
}

impl ProjectionParams {
    /// Data-space x of a column center.
    #[must_use]
    pub fn column_x(&self, column: usize) -> f64 {
        if self.render_width <= 1 {
            return self.min_x;
        }
        if column + 1 == self.render_width {
            return self.max_x;
        }
        self.min_x + column as f64 * self.column_width()
    }

    #[must_use]
    pub fn column_width(&self) -> f64 {
        if self.render_width <= 1 {
            self.max_x - self.min_x
        } else {
            (self.max_x - self.min_x) / (self.render_width - 1) as f64
        }
    }
}

/// Result of projecting a single column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub nulls: u8,
}

impl Column {
    const EMPTY: Self = Self {
        value: 0.0,
        min: 0.0,
        max: 0.0,
        nulls: NULL_VALUE | NULL_MIN | NULL_MAX,
    };
}

/// Computes one render column from sorted points.
#[must_use]
pub fn project_column(points: &[DataPoint], params: &ProjectionParams, column: usize) -> Column {
    if points.is_empty() || !params.min_x.is_finite() || !params.max_x.is_finite() {
        return Column::EMPTY;
    }

    let mut projected = Column::EMPTY;
    let x = params.column_x(column);
    let dx = params.column_width();

    if let Some(y) = column_value(points, x, dx).and_then(|y| params.y.value_to_pixel(y)) {
        projected.value = y;
        projected.nulls &= !NULL_VALUE;
    }

    let (start, end) = if params.render_width <= 1 {
        (
            points.partition_point(|point| point.x < params.min_x),
            points.partition_point(|point| point.x <= params.max_x),
        )
    } else {
        let half = dx / 2.0;
        (
            points.partition_point(|point| point.x < x - half),
            points.partition_point(|point| point.x < x + half),
        )
    };
    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;
    for y in points[start..end.max(start)]
        .iter()
        .filter_map(|point| point.finite_y())
    {
        low = low.min(y);
        high = high.max(y);
    }
    if let Some(pixel) = extreme_to_pixel(low, params) {
        projected.min = pixel;
        projected.nulls &= !NULL_MIN;
    }
    if let Some(pixel) = extreme_to_pixel(high, params) {
        projected.max = pixel;
        projected.nulls &= !NULL_MAX;
    }

    projected
}

fn extreme_to_pixel(value: f64, params: &ProjectionParams) -> Option<f64> {
    if value.is_finite() {
        params.y.value_to_pixel(value)
    } else {
        None
    }
}

/// Data-space y at `x`, snapping to a turning sample right after it.
fn column_value(points: &[DataPoint], x: f64, dx: f64) -> Option<f64> {
    let next = points.partition_point(|point| point.x < x);
    if next < points.len() && points[next].x == x {
        return points[next].finite_y();
    }
    let previous = next.checked_sub(1)?;
    if next >= points.len() {
        return None;
    }

    let left = points[previous];
    let right = points[next];
    let (left_y, right_y) = (left.finite_y()?, right.finite_y()?);

    if x - dx < left.x && is_turning_point(points, previous) {
        return Some(left_y);
    }

    let span = right.x - left.x;
    if span == 0.0 {
        return Some(left_y);
    }
    Some(left_y + (right_y - left_y) * (x - left.x) / span)
}

fn is_turning_point(points: &[DataPoint], index: usize) -> bool {
    if index == 0 || index + 1 >= points.len() {
        return false;
    }
    match (
        points[index - 1].finite_y(),
        points[index].finite_y(),
        points[index + 1].finite_y(),
    ) {
        (Some(before), Some(at), Some(after)) => (at - before) * (after - at) < 0.0,
        _ => false,
    }
}

/// Strategy that fills a [`RenderSpace`]; see [`select_projector`].
pub trait Projector {
    fn name(&self) -> &'static str;

    /// Overwrites `out`, resizing it to `params.render_width`.
    fn project(
        &self,
        points: &[DataPoint],
        params: &ProjectionParams,
        out: &mut RenderSpace,
    ) -> ChartResult<()>;
}

/// Sequential projector, always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceProjector;

impl Projector for ReferenceProjector {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn project(
        &self,
        points: &[DataPoint],
        params: &ProjectionParams,
        out: &mut RenderSpace,
    ) -> ChartResult<()> {
        out.resize(params.render_width);
        for column in 0..params.render_width {
            out.write(column, project_column(points, params, column));
        }
        Ok(())
    }
}

/// Column-parallel projector on a dedicated rayon pool.
#[cfg(feature = "parallel-projection")]
pub struct ParallelProjector {
    pool: rayon::ThreadPool,
}

#[cfg(feature = "parallel-projection")]
impl ParallelProjector {
    pub fn new() -> ChartResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .thread_name(|index| format!("chart-viewport-projection-{index}"))
            .build()
            .map_err(|err| crate::error::ChartError::Projection(err.to_string()))?;
        Ok(Self { pool })
    }
}

#[cfg(feature = "parallel-projection")]
impl Projector for ParallelProjector {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn project(
        &self,
        points: &[DataPoint],
        params: &ProjectionParams,
        out: &mut RenderSpace,
    ) -> ChartResult<()> {
        let columns: Vec<Column> = self.pool.install(|| {
            (0..params.render_width)
                .into_par_iter()
                .map(|column| project_column(points, params, column))
                .collect()
        });
        out.resize(params.render_width);
        for (column, projected) in columns.into_iter().enumerate() {
            out.write(column, projected);
        }
        Ok(())
    }
}

/// Projector requested by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProjectorPreference {
    #[default]
    Reference,
    /// Uses the parallel projector when compiled in, reference otherwise.
    Accelerated,
}

/// Picks the projector once at startup.
#[must_use]
pub fn select_projector(preference: ProjectorPreference) -> Box<dyn Projector> {
    match preference {
        ProjectorPreference::Reference => Box::new(ReferenceProjector),
        ProjectorPreference::Accelerated => accelerated_or_reference(),
    }
}

#[cfg(feature = "parallel-projection")]
fn accelerated_or_reference() -> Box<dyn Projector> {
    match ParallelProjector::new() {
        Ok(projector) => Box::new(projector),
        Err(err) => {
            warn!(error = %err, "parallel projector unavailable, using reference");
            Box::new(ReferenceProjector)
        }
    }
}

#[cfg(not(feature = "parallel-projection"))]
fn accelerated_or_reference() -> Box<dyn Projector> {
    tracing::debug!("parallel-projection feature disabled, using reference projector");
    Box::new(ReferenceProjector)
}

/// Projects with `projector`, falling back to [`ReferenceProjector`] on error.
pub fn selected_space_to_render_space(
    projector: &dyn Projector,
    points: &[DataPoint],
    params: &ProjectionParams,
    out: &mut RenderSpace,
) {
    if let Err(err) = projector.project(points, params, out) {
        warn!(
            projector = projector.name(),
            error = %err,
            "projector failed, falling back to reference"
        );
        // The reference projector is infallible.
        let _ = ReferenceProjector.project(points, params, out);
    }
}
