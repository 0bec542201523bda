use chart_viewport::api::{
    BarTarget, Cursor, SeriesId, Tooltip, TooltipCandidate, TooltipConfig,
    calculate_tooltip_state, toggle_saved,
};
use chart_viewport::core::{AxisScale, DataPoint, LinearScale, ValueScale};

const RISING: SeriesId = SeriesId::from_raw(1);
const FALLING: SeriesId = SeriesId::from_raw(2);

fn rising() -> Vec<DataPoint> {
    (0..=10)
        .map(|i| DataPoint::new(f64::from(i), f64::from(i) * 10.0))
        .collect()
}

fn falling() -> Vec<DataPoint> {
    (0..=10)
        .map(|i| DataPoint::new(f64::from(i), 100.0 - f64::from(i) * 10.0))
        .collect()
}

fn candidate<'a>(series: SeriesId, name: &'a str, points: &'a [DataPoint]) -> TooltipCandidate<'a> {
    TooltipCandidate {
        series,
        name,
        color: None,
        points,
        x_scale: LinearScale::new(0.0, 10.0, 100.0).expect("x scale"),
        y_scale: ValueScale::new(AxisScale::Linear, 0.0, 100.0, 100.0).expect("y scale"),
        always_tooltipped: false,
        bar: None,
    }
}

fn names(tooltips: &[Tooltip]) -> Vec<&str> {
    tooltips.iter().map(|tooltip| tooltip.name.as_str()).collect()
}

#[test]
fn no_cursor_no_tooltips() {
    let (a, b) = (rising(), falling());
    let candidates = [candidate(RISING, "a", &a), candidate(FALLING, "b", &b)];
    assert!(calculate_tooltip_state(None, &candidates, &[], &TooltipConfig::default()).is_empty());
}

#[test]
fn picks_the_series_under_the_cursor() {
    let (a, b) = (rising(), falling());
    let candidates = [candidate(RISING, "a", &a), candidate(FALLING, "b", &b)];
    let tooltips = calculate_tooltip_state(
        Some(Cursor::new(20.0, 78.0)),
        &candidates,
        &[],
        &TooltipConfig::default(),
    );
    assert_eq!(names(&tooltips), vec!["a"]);
    let tooltip = &tooltips[0];
    assert_eq!((tooltip.x, tooltip.y), (2.0, 20.0));
    assert!((tooltip.pixel_y - 80.0).abs() <= 1e-9);
    assert!((tooltip.distance - 2.0).abs() <= 1e-9);
    assert!(!tooltip.saved);
}

#[test]
fn equal_distances_show_every_tied_series() {
    let (a, b) = (rising(), falling());
    let candidates = [candidate(RISING, "a", &a), candidate(FALLING, "b", &b)];
    let tooltips = calculate_tooltip_state(
        Some(Cursor::new(50.0, 50.0)),
        &candidates,
        &[],
        &TooltipConfig::default(),
    );
    assert_eq!(names(&tooltips), vec!["a", "b"]);
}

#[test]
fn cursor_far_from_every_line_shows_nothing() {
    let (a, b) = (rising(), falling());
    let candidates = [candidate(RISING, "a", &a), candidate(FALLING, "b", &b)];
    let tooltips = calculate_tooltip_state(
        Some(Cursor::new(20.0, 50.0)),
        &candidates,
        &[],
        &TooltipConfig::default(),
    );
    assert!(tooltips.is_empty());
}

#[test]
fn always_tooltipped_series_ignore_vertical_distance() {
    let (a, b) = (rising(), falling());
    let mut always = candidate(FALLING, "b", &b);
    always.always_tooltipped = true;
    let candidates = [candidate(RISING, "a", &a), always];
    let tooltips = calculate_tooltip_state(
        Some(Cursor::new(20.0, 78.0)),
        &candidates,
        &[],
        &TooltipConfig::default(),
    );
    assert_eq!(names(&tooltips), vec!["a", "b"]);
}

#[test]
fn gaps_are_skipped_when_looking_for_the_nearest_sample() {
    let mut a = rising();
    a[2] = DataPoint::gap(2.0);
    let candidates = [candidate(RISING, "a", &a)];
    let tooltips = calculate_tooltip_state(
        Some(Cursor::new(21.0, 70.0)),
        &candidates,
        &[],
        &TooltipConfig::default(),
    );
    assert_eq!(tooltips.len(), 1);
    assert_eq!(tooltips[0].x, 3.0);
}

#[test]
fn bars_are_hit_anywhere_between_zero_and_value() {
    let bars = vec![DataPoint::new(5.0, 30.0)];
    let mut target = candidate(RISING, "bars", &bars);
    target.bar = Some(BarTarget {
        half_width_px: 15.0,
        zero_px: 100.0,
    });
    let candidates = [target];
    let config = TooltipConfig::default();

    let inside = calculate_tooltip_state(Some(Cursor::new(60.0, 95.0)), &candidates, &[], &config);
    assert_eq!(inside.len(), 1);
    assert!((inside[0].distance - 10.0).abs() <= 1e-9);

    let beside = calculate_tooltip_state(Some(Cursor::new(90.0, 95.0)), &candidates, &[], &config);
    assert!(beside.is_empty());

    let above = calculate_tooltip_state(Some(Cursor::new(50.0, 10.0)), &candidates, &[], &config);
    assert!(above.is_empty());
}

#[test]
fn toggling_pins_then_unpins() {
    let (a, b) = (rising(), falling());
    let candidates = [candidate(RISING, "a", &a), candidate(FALLING, "b", &b)];
    let config = TooltipConfig::default();
    let cursor = Some(Cursor::new(20.0, 78.0));

    let live = calculate_tooltip_state(cursor, &candidates, &[], &config);
    let mut saved = Vec::new();
    toggle_saved(&mut saved, &live, config.threshold_px);
    assert_eq!(saved.len(), 1);
    assert!(saved[0].saved);

    // A pinned tooltip stays when the cursor leaves and is not duplicated.
    let away = calculate_tooltip_state(Some(Cursor::new(90.0, 50.0)), &candidates, &saved, &config);
    assert_eq!(away.iter().filter(|tooltip| tooltip.saved).count(), 1);
    assert_eq!(away.len(), 1);
    let back = calculate_tooltip_state(cursor, &candidates, &saved, &config);
    assert_eq!(back.len(), 1);
    assert!(back[0].saved);

    toggle_saved(&mut saved, &back, config.threshold_px);
    assert!(saved.is_empty());
}

#[test]
fn saved_tooltips_of_removed_series_disappear() {
    let a = rising();
    let config = TooltipConfig::default();
    let live = calculate_tooltip_state(
        Some(Cursor::new(20.0, 78.0)),
        &[candidate(RISING, "a", &a)],
        &[],
        &config,
    );
    let mut saved = Vec::new();
    toggle_saved(&mut saved, &live, config.threshold_px);

    let b = falling();
    let shown = calculate_tooltip_state(None, &[candidate(FALLING, "b", &b)], &saved, &config);
    assert!(shown.is_empty());
}
