use chart_viewport::core::{DataPoint, SearchType, binary_search};
use proptest::prelude::*;

fn sorted_points(mut xs: Vec<i32>) -> Vec<DataPoint> {
    xs.sort_unstable();
    xs.into_iter()
        .map(|x| DataPoint::new(f64::from(x), 0.0))
        .collect()
}

fn linear_before(points: &[DataPoint], x: f64) -> Option<usize> {
    points.iter().rposition(|point| point.x <= x)
}

fn linear_after(points: &[DataPoint], x: f64) -> Option<usize> {
    points.iter().position(|point| point.x >= x)
}

proptest! {
    #[test]
    fn before_and_after_match_linear_scan(
        xs in prop::collection::vec(-50i32..50, 0..64),
        target in -60i32..60,
        half in any::<bool>()
    ) {
        let points = sorted_points(xs);
        let x = f64::from(target) + if half { 0.5 } else { 0.0 };

        prop_assert_eq!(binary_search(&points, x, SearchType::Before), linear_before(&points, x));
        prop_assert_eq!(binary_search(&points, x, SearchType::After), linear_after(&points, x));
    }

    #[test]
    fn nearest_matches_linear_scan_distance(
        xs in prop::collection::vec(-50i32..50, 1..64),
        target in -60i32..60,
        half in any::<bool>()
    ) {
        let points = sorted_points(xs);
        let x = f64::from(target) + if half { 0.5 } else { 0.0 };

        let best = points
            .iter()
            .map(|point| (point.x - x).abs())
            .fold(f64::INFINITY, f64::min);
        let index = binary_search(&points, x, SearchType::Nearest).expect("non-empty input");
        prop_assert_eq!((points[index].x - x).abs(), best);

        // Ties go to the sample before the target.
        let before = linear_before(&points, x);
        if let Some(before) = before {
            if (points[before].x - x).abs() == best {
                prop_assert_eq!(index, before);
            }
        }
    }
}
