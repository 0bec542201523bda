use chart_viewport::core::{DataPoint, SelectedSpace, WindowOptions, data_space_to_selected_space};
use proptest::prelude::*;

fn build_points(xs: Vec<i16>, ys: &[Option<i16>]) -> Vec<DataPoint> {
    let mut xs = xs;
    xs.sort_unstable();
    xs.into_iter()
        .zip(ys.iter().cycle())
        .map(|(x, y)| DataPoint::with_y(f64::from(x) / 2.0, y.map(f64::from)))
        .collect()
}

fn window(a: i16, b: i16) -> (f64, f64) {
    let (a, b) = (f64::from(a) / 2.0, f64::from(b) / 2.0);
    if a <= b { (a, b) } else { (b, a) }
}

proptest! {
    #[test]
    fn incremental_windows_equal_scratch_windows(
        xs in prop::collection::vec(-200i16..200, 0..80),
        ys in prop::collection::vec(prop::option::weighted(0.85, -100i16..100), 1..16),
        windows in prop::collection::vec((-220i16..220, -220i16..220), 1..12),
        ignore_discontinuities in any::<bool>(),
        square in any::<bool>()
    ) {
        let points = build_points(xs, &ys);
        let options = WindowOptions { ignore_discontinuities, square };

        let mut swap: Option<SelectedSpace> = None;
        for (a, b) in windows {
            let (min_x, max_x) = window(a, b);
            let incremental = data_space_to_selected_space(&points, min_x, max_x, options, swap.take());
            let scratch = data_space_to_selected_space(&points, min_x, max_x, options, None);
            prop_assert_eq!(&incremental, &scratch);
            swap = Some(incremental);
        }
    }

    #[test]
    fn incremental_windows_survive_appends(
        xs in prop::collection::vec(-200i16..200, 1..80),
        ys in prop::collection::vec(prop::option::weighted(0.85, -100i16..100), 1..16),
        steps in prop::collection::vec((0usize..100, -220i16..220, -220i16..220), 1..10)
    ) {
        let points = build_points(xs, &ys);
        let options = WindowOptions::default();

        let mut visible = 0usize;
        let mut swap: Option<SelectedSpace> = None;
        for (grow, a, b) in steps {
            visible = (visible + grow % 16).min(points.len());
            let data = &points[..visible];
            let (min_x, max_x) = window(a, b);
            let incremental = data_space_to_selected_space(data, min_x, max_x, options, swap.take());
            let scratch = data_space_to_selected_space(data, min_x, max_x, options, None);
            prop_assert_eq!(&incremental, &scratch);
            swap = Some(incremental);
        }
    }

    #[test]
    fn selection_is_framed_by_the_window_edges(
        xs in prop::collection::vec(-200i16..200, 0..80),
        ys in prop::collection::vec(prop::option::weighted(0.85, -100i16..100), 1..16),
        a in -220i16..220,
        b in -220i16..220
    ) {
        let points = build_points(xs, &ys);
        let (min_x, max_x) = window(a, b);
        let selected = data_space_to_selected_space(&points, min_x, max_x, WindowOptions::default(), None);

        let all = selected.to_vec();
        prop_assert!(all.len() >= 2);
        prop_assert_eq!(all[0].x, min_x);
        prop_assert_eq!(all[all.len() - 1].x, max_x);
        prop_assert!(selected.interior().all(|point| point.x > min_x && point.x < max_x));
        prop_assert!(all.windows(2).all(|pair| pair[0].x <= pair[1].x));
    }
}
