use chart_viewport::core::{BoundsOptions, DataPoint, calculate_data_bounds, extend_data_bounds};
use proptest::prelude::*;

fn stream(samples: &[(u8, Option<i16>)]) -> Vec<DataPoint> {
    let mut x = 0.0;
    samples
        .iter()
        .map(|(step, y)| {
            x += f64::from(*step) / 4.0;
            DataPoint::with_y(x, y.map(|y| f64::from(y) / 8.0))
        })
        .collect()
}

fn with_ranges(range_values: &[f64]) -> BoundsOptions<'_> {
    BoundsOptions {
        range_values,
        ..BoundsOptions::default()
    }
}

proptest! {
    #[test]
    fn appended_bounds_equal_a_full_pass(
        samples in prop::collection::vec(
            (0u8..8, prop::option::weighted(0.8, -400i16..400)),
            2..200
        ),
        split in 1usize..200
    ) {
        let points = stream(&samples);
        let split = split.min(points.len() - 1);
        let options = BoundsOptions::default();

        let head = calculate_data_bounds(&points[..split], &options);
        let tail = calculate_data_bounds(&points[split - 1..], &options);
        let folded = extend_data_bounds(head, tail);

        prop_assert_eq!(folded, calculate_data_bounds(&points, &options));
    }

    #[test]
    fn range_extremes_can_be_folded_in_later(
        ys in prop::collection::vec(-100i16..100, 1..50),
        early in prop::collection::vec(-500i16..500, 0..10),
        late in prop::collection::vec(-500i16..500, 0..10)
    ) {
        let points: Vec<DataPoint> = ys
            .iter()
            .enumerate()
            .map(|(i, y)| DataPoint::new(i as f64, f64::from(*y)))
            .collect();
        let early: Vec<f64> = early.into_iter().map(f64::from).collect();
        let late: Vec<f64> = late.into_iter().map(f64::from).collect();
        let all: Vec<f64> = early.iter().chain(&late).copied().collect();

        let head = calculate_data_bounds(&points, &with_ranges(&early));
        let tail = calculate_data_bounds(&points[points.len() - 1..], &with_ranges(&late));

        prop_assert_eq!(
            extend_data_bounds(head, tail),
            calculate_data_bounds(&points, &with_ranges(&all))
        );
    }
}
