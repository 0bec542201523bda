//! Series description and conversion into data space.

mod binary;
mod inference;
mod normalize;
mod source;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use binary::{BINARY_FIELD_WIDTH, BinaryField, BinaryObjects, FIELD_DATE_MILLIS, FIELD_FLOAT64};
pub use inference::{SeriesShape, infer_inline_shape, infer_series_shape};
pub use normalize::{
    DataSpace, EnumMap, RangeSample, SeriesAux, VectorSample, simple_series_to_data_space,
};
pub(crate) use normalize::{normalize_binary, normalize_inline};
pub use source::{
    PullReply, PullRequest, PullSource, PushSink, PushSource, SourceHub, SourceInbox,
    Subscription,
};

/// How a series is drawn; only bar and background change pipeline behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RenderMode {
    #[default]
    Line,
    Bar,
    Area,
    /// Shades x ranges where the value is truthy.
    Background,
}

/// Shape of each y value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ValueKind {
    #[default]
    Scalar,
    /// `[min, max]` or `{min, max}`; the drawn value is the midpoint.
    Range,
    /// `{speed, direction}`; the drawn value is the speed.
    Vector,
}

/// Per-series options. Everything except the data itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesOptions {
    #[serde(default)]
    pub x_key: Option<String>,
    #[serde(default)]
    pub y_key: Option<String>,
    #[serde(default)]
    pub render_mode: RenderMode,
    #[serde(default)]
    pub value_kind: ValueKind,
    #[serde(default = "default_axis")]
    pub axis: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_percentile")]
    pub percentile: f64,
    #[serde(default)]
    pub percentile_asymmetry: f64,
    #[serde(default)]
    pub ignore_discontinuities: bool,
    #[serde(default)]
    pub square: bool,
    #[serde(default)]
    pub is_enum: bool,
    /// Fixed enum ordering; unknown labels are appended after these.
    #[serde(default)]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub always_tooltipped: bool,
    /// Added to every x after date parsing.
    #[serde(default)]
    pub x_shift: f64,
    /// Multiplies every y (unit conversion).
    #[serde(default = "default_multiplier")]
    pub y_multiplier: f64,
    /// Graph index used by the multigraph router.
    #[serde(default)]
    pub graph: Option<usize>,
    #[serde(default)]
    pub hidden: bool,
}

fn default_axis() -> String {
    "y".to_owned()
}

fn default_percentile() -> f64 {
    100.0
}

fn default_multiplier() -> f64 {
    1.0
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            x_key: None,
            y_key: None,
            render_mode: RenderMode::default(),
            value_kind: ValueKind::default(),
            axis: default_axis(),
            color: None,
            percentile: default_percentile(),
            percentile_asymmetry: 0.0,
            ignore_discontinuities: false,
            square: false,
            is_enum: false,
            enum_values: Vec::new(),
            always_tooltipped: false,
            x_shift: 0.0,
            y_multiplier: default_multiplier(),
            graph: None,
            hidden: false,
        }
    }
}

/// Raw data of a series.
#[derive(Clone)]
pub enum SeriesData {
    /// JSON-like array: values, `[x, y]` tuples or objects.
    Inline(Vec<Value>),
    Binary(BinaryObjects),
    Push(Rc<RefCell<dyn PushSource>>),
    Pull(Rc<RefCell<dyn PullSource>>),
}

impl fmt::Debug for SeriesData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(values) => f.debug_tuple("Inline").field(&values.len()).finish(),
            Self::Binary(objects) => f.debug_tuple("Binary").field(&objects.len()).finish(),
            Self::Push(_) => f.write_str("Push(..)"),
            Self::Pull(_) => f.write_str("Pull(..)"),
        }
    }
}

/// One named data source. Controllers identify series by `Rc` allocation.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub data: SeriesData,
    pub options: SeriesOptions,
}

impl Series {
    #[must_use]
    pub fn new(name: impl Into<String>, data: SeriesData) -> Self {
        Self {
            name: name.into(),
            data,
            options: SeriesOptions::default(),
        }
    }

    /// Plain values with implicit integer x.
    #[must_use]
    pub fn from_values(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(
            name,
            SeriesData::Inline(values.iter().map(|value| Value::from(*value)).collect()),
        )
    }

    /// `[x, y]` tuples.
    #[must_use]
    pub fn from_tuples(name: impl Into<String>, tuples: &[(f64, f64)]) -> Self {
        Self::new(
            name,
            SeriesData::Inline(
                tuples
                    .iter()
                    .map(|(x, y)| Value::from(vec![*x, *y]))
                    .collect(),
            ),
        )
    }

    /// Any JSON array accepted by type inference.
    pub fn from_json(name: impl Into<String>, data: Value) -> crate::error::ChartResult<Self> {
        let name = name.into();
        match data {
            Value::Array(values) => Ok(Self::new(name, SeriesData::Inline(values))),
            other => Err(crate::error::ChartError::invalid_series(
                &name,
                format!("expected a JSON array, got {}", json_type_name(&other)),
            )),
        }
    }

    #[must_use]
    pub fn push(name: impl Into<String>, source: Rc<RefCell<dyn PushSource>>) -> Self {
        Self::new(name, SeriesData::Push(source))
    }

    #[must_use]
    pub fn pull(name: impl Into<String>, source: Rc<RefCell<dyn PullSource>>) -> Self {
        Self::new(name, SeriesData::Pull(source))
    }

    #[must_use]
    pub fn with_options(mut self, options: SeriesOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_keys(mut self, x_key: impl Into<String>, y_key: impl Into<String>) -> Self {
        self.options.x_key = Some(x_key.into());
        self.options.y_key = Some(y_key.into());
        self
    }

    #[must_use]
    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.options.render_mode = render_mode;
        self
    }

    #[must_use]
    pub fn with_axis(mut self, axis: impl Into<String>) -> Self {
        self.options.axis = axis.into();
        self
    }

    #[must_use]
    pub fn with_graph(mut self, graph: usize) -> Self {
        self.options.graph = Some(graph);
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.options.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_percentile(mut self, percentile: f64, asymmetry: f64) -> Self {
        self.options.percentile = percentile;
        self.options.percentile_asymmetry = asymmetry;
        self
    }

    #[must_use]
    pub fn always_tooltipped(mut self) -> Self {
        self.options.always_tooltipped = true;
        self
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
