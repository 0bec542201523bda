use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::core::{DataPoint, datetime_to_epoch_millis};
use crate::error::{ChartError, ChartResult};

use super::binary::BinaryField;
use super::{
    BinaryObjects, Series, SeriesData, SeriesOptions, SeriesShape, ValueKind, infer_series_shape,
};

/// Enum label -> numeric value, in first-seen order.
pub type EnumMap = IndexMap<String, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSample {
    pub x: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorSample {
    pub x: f64,
    pub speed: Option<f64>,
    /// Degrees, as supplied.
    pub direction: Option<f64>,
}

/// Compound values kept next to the drawn points, sorted by x.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SeriesAux {
    #[default]
    None,
    Ranges(Vec<RangeSample>),
    Vectors(Vec<VectorSample>),
}

/// Canonical sorted samples of one series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSpace {
    pub points: Vec<DataPoint>,
    pub dates: bool,
    pub aux: SeriesAux,
}

impl DataSpace {
    /// Range extremes, fed to bounds so whiskers are never clipped.
    #[must_use]
    pub fn range_values(&self) -> Vec<f64> {
        self.range_values_from(0)
    }

    /// Range extremes of the range samples from index `start` on.
    #[must_use]
    pub fn range_values_from(&self, start: usize) -> Vec<f64> {
        match &self.aux {
            SeriesAux::Ranges(ranges) => ranges
                .get(start..)
                .unwrap_or_default()
                .iter()
                .flat_map(|range| [range.min, range.max])
                .flatten()
                .collect(),
            SeriesAux::None | SeriesAux::Vectors(_) => Vec::new(),
        }
    }

    /// Number of range samples.
    #[must_use]
    pub fn range_count(&self) -> usize {
        match &self.aux {
            SeriesAux::Ranges(ranges) => ranges.len(),
            SeriesAux::None | SeriesAux::Vectors(_) => 0,
        }
    }

    /// Appends a later batch. Returns `false` when the batch went back in
    /// time and the whole space had to be re-sorted.
    pub fn append(&mut self, mut batch: DataSpace, square: bool) -> bool {
        self.dates |= batch.dates;
        let in_order = match (self.points.last(), batch.points.first()) {
            (Some(last), Some(first)) => last.x <= first.x,
            _ => true,
        };

        if in_order {
            if square {
                let step = match (self.points.last(), batch.points.first()) {
                    (Some(last), Some(first)) => step_point(*last, *first),
                    _ => None,
                };
                self.points.extend(step);
            }
            self.points.append(&mut batch.points);
        } else {
            self.points.append(&mut batch.points);
            self.points.sort_by(|a, b| a.x.total_cmp(&b.x));
        }

        match (&mut self.aux, batch.aux) {
            (SeriesAux::Ranges(existing), SeriesAux::Ranges(mut more)) => {
                existing.append(&mut more);
                if !in_order {
                    existing.sort_by(|a, b| a.x.total_cmp(&b.x));
                }
            }
            (SeriesAux::Vectors(existing), SeriesAux::Vectors(mut more)) => {
                existing.append(&mut more);
                if !in_order {
                    existing.sort_by(|a, b| a.x.total_cmp(&b.x));
                }
            }
            (aux @ SeriesAux::None, more) => *aux = more,
            _ => {}
        }
        in_order
    }
}

/// Converts a series with inline or binary data into data space.
///
/// Push and pull series start empty; their batches go through the same
/// normalization when they arrive.
pub fn simple_series_to_data_space(series: &Series, enums: &mut EnumMap) -> ChartResult<DataSpace> {
    let shape = infer_series_shape(&series.name, &series.data)?;
    let space = match &series.data {
        SeriesData::Inline(values) => {
            normalize_inline(&series.name, &series.options, shape, values, enums, 0)?
        }
        SeriesData::Binary(objects) => normalize_binary(&series.name, &series.options, objects)?,
        SeriesData::Push(_) | SeriesData::Pull(_) => DataSpace::default(),
    };
    debug!(
        series = %series.name,
        ?shape,
        points = space.points.len(),
        dates = space.dates,
        "normalized series"
    );
    Ok(space)
}

#[derive(Debug, Clone, Copy)]
enum Compound {
    Scalar(Option<f64>),
    Range(Option<f64>, Option<f64>),
    Vector(Option<f64>, Option<f64>),
}

impl Compound {
    fn drawn(self) -> Option<f64> {
        match self {
            Self::Scalar(y) => y,
            Self::Range(Some(min), Some(max)) => Some((min + max) / 2.0),
            Self::Range(..) => None,
            Self::Vector(speed, _) => speed,
        }
    }
}

struct Sample {
    x: f64,
    value: Compound,
}

/// Normalizes inline values; `index_offset` continues implicit x across batches.
pub(crate) fn normalize_inline(
    name: &str,
    options: &SeriesOptions,
    shape: SeriesShape,
    values: &[Value],
    enums: &mut EnumMap,
    index_offset: usize,
) -> ChartResult<DataSpace> {
    seed_enums(options, enums);
    let mut samples = Vec::with_capacity(values.len());
    let mut dates = false;
    let mut skipped = 0usize;

    match shape {
        SeriesShape::Empty => {}
        SeriesShape::Values => {
            for (index, value) in values.iter().enumerate() {
                let x = (index_offset + index) as f64 + options.x_shift;
                let value = parse_compound(value, None, options, enums);
                samples.push(Sample { x, value });
            }
        }
        SeriesShape::Tuples => {
            for value in values {
                let Some(items) = value.as_array() else {
                    skipped += 1;
                    continue;
                };
                let Some((x, is_date)) = items.first().and_then(parse_x) else {
                    skipped += 1;
                    continue;
                };
                dates |= is_date;
                let compound = parse_compound(
                    items.get(1).unwrap_or(&Value::Null),
                    items.get(2),
                    options,
                    enums,
                );
                samples.push(Sample {
                    x: x + options.x_shift,
                    value: compound,
                });
            }
        }
        SeriesShape::Objects => {
            let x_key = required_key(name, options.x_key.as_deref(), "x_key")?;
            let y_key = required_key(name, options.y_key.as_deref(), "y_key")?;
            for value in values {
                let Some(object) = value.as_object() else {
                    skipped += 1;
                    continue;
                };
                let Some((x, is_date)) = object.get(x_key).and_then(parse_x) else {
                    skipped += 1;
                    continue;
                };
                dates |= is_date;
                let compound = parse_object_value(object, y_key, options, enums);
                samples.push(Sample {
                    x: x + options.x_shift,
                    value: compound,
                });
            }
        }
        SeriesShape::Binary | SeriesShape::Push | SeriesShape::Pull => {
            return Err(ChartError::invalid_series(
                name,
                format!("{shape:?} data cannot be normalized as inline values"),
            ));
        }
    }

    if skipped > 0 {
        trace!(series = name, skipped, "skipped samples without usable x");
    }
    Ok(finish(samples, dates, options))
}

pub(crate) fn normalize_binary(
    name: &str,
    options: &SeriesOptions,
    objects: &BinaryObjects,
) -> ChartResult<DataSpace> {
    let x_key = options.x_key.as_deref().unwrap_or("x");
    let y_key = options.y_key.as_deref().unwrap_or("y");
    let x_channel = objects
        .channel_index(x_key)
        .ok_or_else(|| missing_key(name, x_key))?;
    let y_channel = objects
        .channel_index(y_key)
        .ok_or_else(|| missing_key(name, y_key))?;

    let mut samples = Vec::with_capacity(objects.len());
    let mut dates = false;
    for record in 0..objects.len() {
        let x_field = objects.field(record, x_channel)?;
        let Some(x) = x_field.as_f64().filter(|x| x.is_finite()) else {
            continue;
        };
        dates |= matches!(x_field, BinaryField::DateMillis(_));
        let y = objects
            .field(record, y_channel)?
            .as_f64()
            .map(|y| y * options.y_multiplier)
            .filter(|y| y.is_finite());
        samples.push(Sample {
            x: x + options.x_shift,
            value: Compound::Scalar(y),
        });
    }
    Ok(finish(samples, dates, options))
}

fn finish(mut samples: Vec<Sample>, dates: bool, options: &SeriesOptions) -> DataSpace {
    if !samples.windows(2).all(|pair| pair[0].x <= pair[1].x) {
        samples.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    }

    let mut points = Vec::with_capacity(if options.square {
        samples.len() * 2
    } else {
        samples.len()
    });
    for sample in &samples {
        let point = DataPoint::with_y(sample.x, sample.value.drawn());
        if options.square {
            let step = points
                .last()
                .and_then(|previous: &DataPoint| step_point(*previous, point));
            points.extend(step);
        }
        points.push(point);
    }

    let aux = match options.value_kind {
        ValueKind::Scalar => SeriesAux::None,
        ValueKind::Range => SeriesAux::Ranges(
            samples
                .iter()
                .map(|sample| match sample.value {
                    Compound::Range(min, max) => RangeSample {
                        x: sample.x,
                        min,
                        max,
                    },
                    _ => RangeSample {
                        x: sample.x,
                        min: None,
                        max: None,
                    },
                })
                .collect(),
        ),
        ValueKind::Vector => SeriesAux::Vectors(
            samples
                .iter()
                .map(|sample| match sample.value {
                    Compound::Vector(speed, direction) => VectorSample {
                        x: sample.x,
                        speed,
                        direction,
                    },
                    _ => VectorSample {
                        x: sample.x,
                        speed: None,
                        direction: None,
                    },
                })
                .collect(),
        ),
    };

    DataSpace { points, dates, aux }
}

/// Corner `(next.x, previous.y)` inserted between two defined samples whose
/// values differ, so a square series steps instead of sloping.
fn step_point(previous: DataPoint, next: DataPoint) -> Option<DataPoint> {
    let (previous_y, next_y) = (previous.y?, next.y?);
    (previous.x < next.x && previous_y != next_y).then(|| DataPoint::new(next.x, previous_y))
}

fn seed_enums(options: &SeriesOptions, enums: &mut EnumMap) {
    if !options.is_enum {
        return;
    }
    for label in &options.enum_values {
        let next = enums.len();
        enums.entry(label.clone()).or_insert(next);
    }
}

fn required_key<'a>(name: &str, key: Option<&'a str>, accessor: &str) -> ChartResult<&'a str> {
    key.ok_or_else(|| missing_key(name, accessor))
}

fn missing_key(name: &str, key: &str) -> ChartError {
    ChartError::MissingKeyAccessor {
        series: name.to_owned(),
        key: key.to_owned(),
    }
}

/// Parses an x value. Strings are tried as numbers, RFC 3339 timestamps and
/// plain `YYYY-MM-DD` dates; dates become millisecond epochs.
fn parse_x(value: &Value) -> Option<(f64, bool)> {
    match value {
        Value::Number(number) => number.as_f64().filter(|x| x.is_finite()).map(|x| (x, false)),
        Value::String(text) => {
            if let Ok(x) = text.trim().parse::<f64>() {
                return x.is_finite().then_some((x, false));
            }
            if let Ok(time) = DateTime::parse_from_rfc3339(text.trim()) {
                return Some((datetime_to_epoch_millis(time.with_timezone(&Utc)), true));
            }
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|time| (datetime_to_epoch_millis(time.and_utc()), true))
        }
        _ => None,
    }
}

fn parse_scalar(value: &Value, options: &SeriesOptions, enums: &mut EnumMap) -> Option<f64> {
    let raw = match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(text) if options.is_enum => {
            let next = enums.len();
            return Some(*enums.entry(text.clone()).or_insert(next) as f64);
        }
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }?;
    let scaled = raw * options.y_multiplier;
    scaled.is_finite().then_some(scaled)
}

fn parse_compound(
    value: &Value,
    extra: Option<&Value>,
    options: &SeriesOptions,
    enums: &mut EnumMap,
) -> Compound {
    match options.value_kind {
        ValueKind::Scalar => Compound::Scalar(parse_scalar(value, options, enums)),
        ValueKind::Range => match (value, extra) {
            (Value::Array(pair), _) if pair.len() >= 2 => Compound::Range(
                parse_scalar(&pair[0], options, enums),
                parse_scalar(&pair[1], options, enums),
            ),
            (Value::Object(object), _) => Compound::Range(
                object
                    .get("min")
                    .and_then(|v| parse_scalar(v, options, enums)),
                object
                    .get("max")
                    .and_then(|v| parse_scalar(v, options, enums)),
            ),
            (min, Some(max)) => Compound::Range(
                parse_scalar(min, options, enums),
                parse_scalar(max, options, enums),
            ),
            _ => Compound::Range(None, None),
        },
        ValueKind::Vector => match value {
            Value::Object(object) => Compound::Vector(
                object
                    .get("speed")
                    .and_then(|v| parse_scalar(v, options, enums)),
                object.get("direction").and_then(Value::as_f64),
            ),
            Value::Array(pair) if pair.len() >= 2 => Compound::Vector(
                parse_scalar(&pair[0], options, enums),
                pair[1].as_f64(),
            ),
            _ => Compound::Vector(None, None),
        },
    }
}

fn parse_object_value(
    object: &Map<String, Value>,
    y_key: &str,
    options: &SeriesOptions,
    enums: &mut EnumMap,
) -> Compound {
    match object.get(y_key) {
        Some(value) => parse_compound(value, None, options, enums),
        None => parse_compound(&Value::Null, None, options, enums),
    }
}
