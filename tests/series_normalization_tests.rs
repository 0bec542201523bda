use chart_viewport::core::{DataPoint, datetime_to_epoch_millis};
use chart_viewport::error::ChartError;
use chart_viewport::series::{
    BinaryObjects, DataSpace, EnumMap, FIELD_DATE_MILLIS, FIELD_FLOAT64, RangeSample, Series,
    SeriesAux, SeriesData, SeriesOptions, SeriesShape, ValueKind, VectorSample, infer_inline_shape,
    simple_series_to_data_space,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn normalize(series: &Series) -> DataSpace {
    simple_series_to_data_space(series, &mut EnumMap::new()).expect("normalizes")
}

fn json_series(data: serde_json::Value) -> Series {
    Series::from_json("test", data).expect("json array")
}

#[test]
fn shapes_are_inferred_from_the_first_defined_element() {
    let cases = [
        (json!([]), SeriesShape::Empty),
        (json!([null, null]), SeriesShape::Empty),
        (json!([1, 2, 3]), SeriesShape::Values),
        (json!([null, "4"]), SeriesShape::Values),
        (json!([[0, 1], [1, 2]]), SeriesShape::Tuples),
        (json!([{"t": 0, "v": 1}]), SeriesShape::Objects),
    ];
    for (data, expected) in cases {
        let values = data.as_array().expect("array").clone();
        assert_eq!(infer_inline_shape("s", &values).expect("shape"), expected);
    }
}

#[test]
fn nested_array_without_pair_is_rejected() {
    let values = json!([[[1]]]).as_array().expect("array").clone();
    let err = infer_inline_shape("nested", &values).expect_err("unrecognized");
    assert!(matches!(err, ChartError::InvalidSeries { ref series, .. } if series == "nested"));
}

#[test]
fn non_array_json_is_rejected() {
    assert!(Series::from_json("obj", json!({"x": 1})).is_err());
}

#[test]
fn plain_values_get_index_x() {
    let space = normalize(&Series::from_values("v", &[5.0, 6.0, 7.0]));
    assert_eq!(
        space.points,
        vec![
            DataPoint::new(0.0, 5.0),
            DataPoint::new(1.0, 6.0),
            DataPoint::new(2.0, 7.0),
        ]
    );
    assert!(!space.dates);
}

#[test]
fn tuples_are_sorted_by_x() {
    let space = normalize(&Series::from_tuples("t", &[(3.0, 1.0), (1.0, 2.0), (2.0, 3.0)]));
    let xs: Vec<f64> = space.points.iter().map(|point| point.x).collect();
    assert_eq!(xs, vec![1.0, 2.0, 3.0]);
}

#[test]
fn null_and_non_numeric_y_become_gaps() {
    let space = normalize(&json_series(json!([[0, 1], [1, null], [2, "abc"], [3, "4.5"]])));
    assert_eq!(
        space.points,
        vec![
            DataPoint::new(0.0, 1.0),
            DataPoint::gap(1.0),
            DataPoint::gap(2.0),
            DataPoint::new(3.0, 4.5),
        ]
    );
}

#[test]
fn booleans_map_to_one_and_zero() {
    let space = normalize(&json_series(json!([true, false, true])));
    let ys: Vec<Option<f64>> = space.points.iter().map(|point| point.y).collect();
    assert_eq!(ys, vec![Some(1.0), Some(0.0), Some(1.0)]);
}

#[test]
fn objects_need_both_accessors() {
    let series = json_series(json!([{"t": 0, "v": 1}]));
    let err = simple_series_to_data_space(&series, &mut EnumMap::new()).expect_err("missing keys");
    assert!(matches!(err, ChartError::MissingKeyAccessor { ref key, .. } if key == "x_key"));
}

#[test]
fn objects_are_read_through_accessors() {
    let series = json_series(json!([
        {"t": 2, "v": 20},
        {"t": 1, "v": 10},
        {"v": 99},
        {"t": 3}
    ]))
    .with_keys("t", "v");
    let space = normalize(&series);
    assert_eq!(
        space.points,
        vec![
            DataPoint::new(1.0, 10.0),
            DataPoint::new(2.0, 20.0),
            DataPoint::gap(3.0),
        ]
    );
}

#[test]
fn date_strings_become_epoch_millis() {
    let space = normalize(&json_series(json!([
        ["2024-01-01", 1],
        ["2024-01-02T00:00:00Z", 2],
        ["2024-01-03T02:00:00+02:00", 3]
    ])));
    assert!(space.dates);
    let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid date");
    assert_eq!(space.points[0].x, datetime_to_epoch_millis(midnight));
    assert_eq!(space.points[0].x, 1_704_067_200_000.0);
    assert_eq!(space.points[1].x - space.points[0].x, 86_400_000.0);
    assert_eq!(space.points[2].x - space.points[1].x, 86_400_000.0);
}

#[test]
fn enum_labels_map_in_first_seen_order_after_seeds() {
    let options = SeriesOptions {
        is_enum: true,
        enum_values: vec!["off".to_owned()],
        ..SeriesOptions::default()
    };
    let series = json_series(json!(["on", "off", "fault", "on"])).with_options(options);
    let mut enums = EnumMap::new();
    let space = simple_series_to_data_space(&series, &mut enums).expect("enum series");
    let ys: Vec<Option<f64>> = space.points.iter().map(|point| point.y).collect();
    assert_eq!(ys, vec![Some(1.0), Some(0.0), Some(2.0), Some(1.0)]);
    assert_eq!(
        enums.keys().cloned().collect::<Vec<_>>(),
        vec!["off".to_owned(), "on".to_owned(), "fault".to_owned()]
    );
}

#[test]
fn square_series_insert_step_corners() {
    let options = SeriesOptions {
        square: true,
        ..SeriesOptions::default()
    };
    let series = Series::from_tuples("sq", &[(0.0, 1.0), (1.0, 1.0), (2.0, 3.0)]).with_options(options);
    let space = normalize(&series);
    assert_eq!(
        space.points,
        vec![
            DataPoint::new(0.0, 1.0),
            DataPoint::new(1.0, 1.0),
            DataPoint::new(2.0, 1.0),
            DataPoint::new(2.0, 3.0),
        ]
    );
}

#[test]
fn range_values_draw_the_midpoint_and_keep_extremes() {
    let options = SeriesOptions {
        value_kind: ValueKind::Range,
        ..SeriesOptions::default()
    };
    let series = json_series(json!([[0, [1, 3]], [1, {"min": 2, "max": 6}], [2, [null, 4]]]))
        .with_options(options);
    let space = normalize(&series);
    assert_eq!(
        space.points,
        vec![DataPoint::new(0.0, 2.0), DataPoint::new(1.0, 4.0), DataPoint::gap(2.0)]
    );
    assert_eq!(
        space.aux,
        SeriesAux::Ranges(vec![
            RangeSample { x: 0.0, min: Some(1.0), max: Some(3.0) },
            RangeSample { x: 1.0, min: Some(2.0), max: Some(6.0) },
            RangeSample { x: 2.0, min: None, max: Some(4.0) },
        ])
    );
    assert_eq!(space.range_values(), vec![1.0, 3.0, 2.0, 6.0, 4.0]);
}

#[test]
fn vectors_draw_their_speed_and_keep_direction() {
    let options = SeriesOptions {
        value_kind: ValueKind::Vector,
        ..SeriesOptions::default()
    };
    let series = json_series(json!([
        [1, {"speed": 4, "direction": 90}],
        [0, [2.5, 180]],
        [2, "calm"]
    ]))
    .with_options(options);
    let space = normalize(&series);
    assert_eq!(
        space.points,
        vec![DataPoint::new(0.0, 2.5), DataPoint::new(1.0, 4.0), DataPoint::gap(2.0)]
    );
    assert_eq!(
        space.aux,
        SeriesAux::Vectors(vec![
            VectorSample { x: 0.0, speed: Some(2.5), direction: Some(180.0) },
            VectorSample { x: 1.0, speed: Some(4.0), direction: Some(90.0) },
            VectorSample { x: 2.0, speed: None, direction: None },
        ])
    );
    assert!(space.range_values().is_empty());
}

#[test]
fn shift_and_multiplier_are_applied() {
    let options = SeriesOptions {
        x_shift: 10.0,
        y_multiplier: 2.0,
        ..SeriesOptions::default()
    };
    let space = normalize(&Series::from_values("m", &[1.0, 2.0]).with_options(options));
    assert_eq!(
        space.points,
        vec![DataPoint::new(10.0, 2.0), DataPoint::new(11.0, 4.0)]
    );
}

#[test]
fn binary_objects_decode_floats_dates_and_unknown_tags() {
    let objects = BinaryObjects::encode(
        &["x", "y"],
        &[
            vec![(FIELD_DATE_MILLIS, 2_000.0), (FIELD_FLOAT64, 5.0)],
            vec![(FIELD_DATE_MILLIS, 1_000.0), (7, 9.0)],
            vec![(2, 3_000.0), (FIELD_FLOAT64, 1.0)],
        ],
    );
    let space = normalize(&Series::new("bin", SeriesData::Binary(objects)));
    assert!(space.dates);
    // The record with an unknown x tag has no x and is dropped.
    assert_eq!(
        space.points,
        vec![DataPoint::gap(1_000.0), DataPoint::new(2_000.0, 5.0)]
    );
}

#[test]
fn binary_objects_report_missing_channels() {
    let objects = BinaryObjects::encode(&["time", "value"], &[vec![(0, 0.0), (0, 1.0)]]);
    let series = Series::new("bin", SeriesData::Binary(objects));
    let err = simple_series_to_data_space(&series, &mut EnumMap::new()).expect_err("no x channel");
    assert!(matches!(err, ChartError::MissingKeyAccessor { ref key, .. } if key == "x"));

    let objects = BinaryObjects::encode(&["time", "value"], &[vec![(0, 0.0), (0, 1.0)]]);
    let series = Series::new("bin", SeriesData::Binary(objects)).with_keys("time", "value");
    assert_eq!(normalize(&series).points, vec![DataPoint::new(0.0, 1.0)]);
}

#[test]
fn appended_batches_keep_order_or_resort() {
    let mut space = normalize(&Series::from_tuples("a", &[(0.0, 1.0), (1.0, 2.0)]));
    let later = normalize(&Series::from_tuples("b", &[(2.0, 3.0)]));
    assert!(space.append(later, false));

    let earlier = normalize(&Series::from_tuples("c", &[(0.5, 9.0)]));
    assert!(!space.append(earlier, false));
    let xs: Vec<f64> = space.points.iter().map(|point| point.x).collect();
    assert_eq!(xs, vec![0.0, 0.5, 1.0, 2.0]);
}
