//! Selected space -> condensed space.
//!
//! Min/max bucketing: the x range is cut into `2 * render_width` equal
//! buckets and each bucket keeps its lowest and highest sample, plus its
//! first gap, in original order. Spikes survive where stride decimation would
//! drop them. The first and last input points are always kept verbatim.

use smallvec::SmallVec;
use tracing::trace;

use crate::core::DataPoint;

/// Buckets per render pixel column.
pub const BUCKETS_PER_PIXEL: usize = 2;

/// Inputs shorter than `bucket_count * CONDENSE_THRESHOLD_FACTOR` pass through.
pub const CONDENSE_THRESHOLD_FACTOR: usize = 2;

#[must_use]
pub fn bucket_count(render_width: usize) -> usize {
    render_width.max(1) * BUCKETS_PER_PIXEL
}

#[must_use]
pub fn needs_condensing(len: usize, render_width: usize) -> bool {
    len >= bucket_count(render_width) * CONDENSE_THRESHOLD_FACTOR
}

/// Where the last open bucket started, so a swap can resume there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CondenseState {
    pub render_width: usize,
    pub first: DataPoint,
    pub last_x: f64,
    pub resume_index: usize,
    pub resume_point: DataPoint,
    pub output_prefix_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondensedSpace {
    points: Vec<DataPoint>,
    state: CondenseState,
}

impl CondensedSpace {
    #[must_use]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    #[must_use]
    pub fn state(&self) -> &CondenseState {
        &self.state
    }

    fn can_resume(&self, points: &[DataPoint], render_width: usize) -> bool {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return false;
        };
        self.state.render_width == render_width
            && self.state.first.same_bits(*first)
            && self.state.last_x.to_bits() == last.x.to_bits()
            && self.state.resume_index < points.len() - 1
            && points[self.state.resume_index].same_bits(self.state.resume_point)
    }
}

#[derive(Default)]
struct Bucket {
    id: Option<usize>,
    min: Option<(usize, f64)>,
    max: Option<(usize, f64)>,
    first_gap: Option<usize>,
}

impl Bucket {
    fn open(id: usize) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    fn add(&mut self, index: usize, point: DataPoint) {
        match point.y {
            None => {
                self.first_gap.get_or_insert(index);
            }
            Some(y) if y.is_finite() => {
                if self.min.is_none_or(|(_, min)| y < min) {
                    self.min = Some((index, y));
                }
                if self.max.is_none_or(|(_, max)| y > max) {
                    self.max = Some((index, y));
                }
            }
            Some(_) => {}
        }
    }

    fn flush(&self, points: &[DataPoint], output: &mut Vec<DataPoint>) {
        let mut kept: SmallVec<[usize; 3]> = SmallVec::new();
        kept.extend(self.min.map(|(index, _)| index));
        kept.extend(self.max.map(|(index, _)| index));
        kept.extend(self.first_gap);
        kept.sort_unstable();
        kept.dedup();
        output.extend(kept.into_iter().map(|index| points[index]));
    }
}

/// Downsamples `points` for a `render_width` pixel wide plot.
///
/// Returns `None` when the input is small enough to draw as is. `swap` is the
/// previous result for the same window; it is reused when the first point,
/// last x and width are unchanged and samples were only added at the end.
#[must_use]
pub fn condense_data_space(
    points: &[DataPoint],
    render_width: usize,
    swap: Option<CondensedSpace>,
) -> Option<CondensedSpace> {
    if !needs_condensing(points.len(), render_width) {
        return None;
    }

    let first = points[0];
    let last = points[points.len() - 1];
    let buckets = bucket_count(render_width);
    let bucket_width = (last.x - first.x) / buckets as f64;
    let bucket_of = |x: f64| -> usize {
        if bucket_width > 0.0 && bucket_width.is_finite() {
            let raw = ((x - first.x) / bucket_width).floor();
            if raw <= 0.0 {
                0
            } else {
                (raw as usize).min(buckets - 1)
            }
        } else {
            0
        }
    };

    let (mut output, start) = match swap.filter(|previous| previous.can_resume(points, render_width)) {
        Some(previous) => {
            let resume_index = previous.state.resume_index;
            let mut output = previous.points;
            output.truncate(previous.state.output_prefix_len);
            trace!(resume_index, "resuming condensation");
            (output, resume_index)
        }
        None => {
            let mut output = Vec::with_capacity(buckets * 2 + 2);
            output.push(first);
            (output, 1)
        }
    };

    let mut bucket = Bucket::default();
    let mut resume_index = start;
    let mut output_prefix_len = output.len();
    for (index, point) in points
        .iter()
        .enumerate()
        .take(points.len() - 1)
        .skip(start)
    {
        let id = bucket_of(point.x);
        if bucket.id != Some(id) {
            bucket.flush(points, &mut output);
            bucket = Bucket::open(id);
            resume_index = index;
            output_prefix_len = output.len();
        }
        bucket.add(index, *point);
    }
    bucket.flush(points, &mut output);
    output.push(last);

    Some(CondensedSpace {
        points: output,
        state: CondenseState {
            render_width,
            first,
            last_x: last.x,
            resume_index,
            resume_point: points[resume_index],
            output_prefix_len,
        },
    })
}
