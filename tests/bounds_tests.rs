use approx::assert_abs_diff_eq;
use chart_viewport::core::{
    AxisScale, Bounds, BoundsOptions, DataBounds, DataPoint, ExpandOptions, calculate_data_bounds,
    expand_bounds, merge_bounds, percentile_ranks, scale_bounds,
};

fn ramp(count: u32) -> Vec<DataPoint> {
    (1..=count)
        .map(|i| DataPoint::new(f64::from(i), f64::from(i)))
        .collect()
}

fn bounds(min_y: f64, max_y: f64) -> Bounds {
    Bounds {
        min_x: 0.0,
        max_x: 10.0,
        min_y,
        max_y,
        ..Bounds::default()
    }
}

#[test]
fn full_percentile_takes_true_extremes() {
    let data = vec![
        DataPoint::new(0.0, 3.0),
        DataPoint::gap(1.0),
        DataPoint::new(4.0, -2.0),
        DataPoint::new(4.5, 8.0),
    ];
    let bounds = calculate_data_bounds(&data, &BoundsOptions::default());
    assert!(!bounds.initial);
    assert_eq!(bounds.min_x, Some(0.0));
    assert_eq!(bounds.max_x, Some(4.5));
    assert_eq!(bounds.min_y, Some(-2.0));
    assert_eq!(bounds.max_y, Some(8.0));
    assert_eq!(bounds.min_positive_y, Some(3.0));
    assert_eq!(bounds.closest_spacing, Some(0.5));
}

#[test]
fn empty_input_is_initial() {
    let bounds = calculate_data_bounds(&[], &BoundsOptions::default());
    assert!(bounds.initial);
    assert_eq!(bounds, DataBounds::initial());
}

#[test]
fn all_gaps_leave_y_undefined() {
    let data = vec![DataPoint::gap(0.0), DataPoint::gap(1.0)];
    let bounds = calculate_data_bounds(&data, &BoundsOptions::default());
    assert!(!bounds.initial);
    assert_eq!(bounds.min_x, Some(0.0));
    assert_eq!(bounds.min_y, None);
    assert_eq!(bounds.max_y, None);
}

#[test]
fn eightieth_percentile_drops_tenth_of_each_tail() {
    let options = BoundsOptions {
        percentile: 80.0,
        ..BoundsOptions::default()
    };
    let bounds = calculate_data_bounds(&ramp(100), &options);
    assert_eq!(bounds.min_y, Some(11.0));
    assert_eq!(bounds.max_y, Some(90.0));
    // X is never trimmed.
    assert_eq!(bounds.min_x, Some(1.0));
    assert_eq!(bounds.max_x, Some(100.0));
}

#[test]
fn asymmetry_shifts_the_kept_window() {
    let options = BoundsOptions {
        percentile: 80.0,
        percentile_asymmetry: 5.0,
        ..BoundsOptions::default()
    };
    let bounds = calculate_data_bounds(&ramp(100), &options);
    assert_eq!(bounds.min_y, Some(16.0));
    assert_eq!(bounds.max_y, Some(95.0));
}

#[test]
fn percentile_ranks_stay_ordered_for_extreme_asymmetry() {
    for len in [1, 2, 3, 10, 101] {
        for percentile in [0.0, 1.0, 50.0, 99.0, 100.0] {
            for asymmetry in [-100.0, -3.0, 0.0, 3.0, 100.0, f64::NAN] {
                let (low, high) = percentile_ranks(len, percentile, asymmetry);
                assert!(low <= high, "len={len} p={percentile} a={asymmetry}");
                assert!(high < len);
            }
        }
    }
}

#[test]
fn range_values_widen_y_bounds() {
    let data = vec![DataPoint::new(0.0, 1.0), DataPoint::new(1.0, 2.0)];
    let options = BoundsOptions {
        range_values: &[-4.0, 9.0],
        ..BoundsOptions::default()
    };
    let bounds = calculate_data_bounds(&data, &options);
    assert_eq!(bounds.min_y, Some(-4.0));
    assert_eq!(bounds.max_y, Some(9.0));
}

#[test]
fn merge_ignores_initial_entries() {
    let a = calculate_data_bounds(&ramp(5), &BoundsOptions::default());
    let b = calculate_data_bounds(
        &[DataPoint::new(-3.0, 40.0), DataPoint::new(-1.0, 0.5)],
        &BoundsOptions::default(),
    );
    let merged = merge_bounds([&a, &DataBounds::initial(), &b]);
    assert_eq!(merged.min_x, -3.0);
    assert_eq!(merged.max_x, 5.0);
    assert_eq!(merged.min_y, 0.5);
    assert_eq!(merged.max_y, 40.0);
    assert_eq!(merged.closest_spacing, 1.0);
}

#[test]
fn merge_of_nothing_is_zero() {
    let merged = merge_bounds([&DataBounds::initial(), &DataBounds::initial()]);
    assert_eq!(merged, Bounds::default());
}

#[test]
fn expand_pads_five_percent_around_the_middle() {
    let expanded = expand_bounds(&bounds(0.0, 100.0), &ExpandOptions::default());
    assert_abs_diff_eq!(expanded.min_y, -2.5, epsilon = 1e-9);
    assert_abs_diff_eq!(expanded.max_y, 102.5, epsilon = 1e-9);
    assert_eq!(expanded.min_x, 0.0);
    assert_eq!(expanded.max_x, 10.0);
}

#[test]
fn expand_opens_a_flat_zero_range() {
    let expanded = expand_bounds(&bounds(0.0, 0.0), &ExpandOptions::default());
    assert_eq!((expanded.min_y, expanded.max_y), (-1.0, 1.0));
}

#[test]
fn expand_opens_a_flat_range_proportionally() {
    let expanded = expand_bounds(&bounds(-20.0, -20.0), &ExpandOptions::default());
    assert_abs_diff_eq!(expanded.min_y, -21.0, epsilon = 1e-9);
    assert_abs_diff_eq!(expanded.max_y, -19.0, epsilon = 1e-9);
}

#[test]
fn expand_includes_bar_baseline() {
    let options = ExpandOptions {
        expand_y_with: &[0.0],
        extend_x_for_n_bars: None,
    };
    let expanded = expand_bounds(&bounds(10.0, 20.0), &options);
    assert!(expanded.min_y < 0.0);
    assert!(expanded.max_y > 20.0);
}

#[test]
fn expand_widens_x_by_half_a_bar() {
    let mut input = bounds(1.0, 2.0);
    input.closest_spacing = 2.0;
    let options = ExpandOptions {
        expand_y_with: &[],
        extend_x_for_n_bars: Some(6),
    };
    let expanded = expand_bounds(&input, &options);
    assert_eq!(expanded.min_x, -1.0);
    assert_eq!(expanded.max_x, 11.0);
}

#[test]
fn log_scale_uses_smallest_positive_value() {
    let mut input = bounds(-5.0, 1000.0);
    input.min_positive_y = Some(0.1);
    let scaled = scale_bounds(&input, AxisScale::Log);
    assert_abs_diff_eq!(scaled.min_y, -1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(scaled.max_y, 3.0, epsilon = 1e-12);
}

#[test]
fn log_scale_without_positive_values_falls_back_to_unit_range() {
    let scaled = scale_bounds(&bounds(-5.0, -1.0), AxisScale::Log);
    assert_eq!((scaled.min_y, scaled.max_y), (0.0, 1.0));
}
