use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChartError, ChartResult};

use super::{SeriesData, json_type_name};

/// Data shape resolved once per series (or per push stream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesShape {
    /// No samples yet; any later batch decides the shape.
    Empty,
    /// Values with implicit integer x.
    Values,
    /// `[x, y, ...]` arrays.
    Tuples,
    /// Objects read through key accessors.
    Objects,
    Binary,
    Push,
    Pull,
}

pub fn infer_series_shape(name: &str, data: &SeriesData) -> ChartResult<SeriesShape> {
    match data {
        SeriesData::Inline(values) => infer_inline_shape(name, values),
        SeriesData::Binary(_) => Ok(SeriesShape::Binary),
        SeriesData::Push(_) => Ok(SeriesShape::Push),
        SeriesData::Pull(_) => Ok(SeriesShape::Pull),
    }
}

/// Classifies an inline array by its first non-null element.
pub fn infer_inline_shape(name: &str, values: &[Value]) -> ChartResult<SeriesShape> {
    let Some(first) = values.iter().find(|value| !value.is_null()) else {
        return Ok(SeriesShape::Empty);
    };

    match first {
        Value::Number(_) | Value::String(_) | Value::Bool(_) => Ok(SeriesShape::Values),
        Value::Array(items) if items.len() >= 2 => Ok(SeriesShape::Tuples),
        Value::Object(_) => Ok(SeriesShape::Objects),
        other => Err(ChartError::invalid_series(
            name,
            format!(
                "unrecognized data form: first element is {}",
                describe(other)
            ),
        )),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("an array of length {}", items.len()),
        other => format!("a {}", json_type_name(other)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn leading_nulls_are_skipped() {
        let values = vec![Value::Null, json!([1, 2])];
        assert_eq!(
            infer_inline_shape("s", &values).expect("shape"),
            SeriesShape::Tuples
        );
    }

    #[test]
    fn single_element_tuple_is_rejected() {
        let values = vec![json!([1])];
        assert!(infer_inline_shape("s", &values).is_err());
    }
}
