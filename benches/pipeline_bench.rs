use std::hint::black_box;
use std::rc::Rc;

use chart_viewport::api::{ManualScheduler, ViewportConfig, ViewportController};
use chart_viewport::core::{
    AxisScale, DataPoint, ProjectionParams, Projector, ReferenceProjector, RenderSpace,
    ValueScale, Viewport, WindowOptions, condense_data_space, data_space_to_selected_space,
};
use chart_viewport::render::NullRenderer;
use chart_viewport::series::Series;
use criterion::{Criterion, criterion_group, criterion_main};

fn wave(len: usize) -> Vec<DataPoint> {
    (0..len)
        .map(|i| {
            let x = i as f64;
            DataPoint::new(x, (x * 0.01).sin() * 100.0 + (i % 7) as f64)
        })
        .collect()
}

fn bench_window_scratch_100k(c: &mut Criterion) {
    let points = wave(100_000);
    c.bench_function("window_scratch_100k", |b| {
        b.iter(|| {
            let _ = data_space_to_selected_space(
                black_box(&points),
                black_box(20_000.5),
                black_box(80_000.5),
                WindowOptions::default(),
                None,
            );
        })
    });
}

fn bench_window_pan_100k(c: &mut Criterion) {
    let points = wave(100_000);
    let start = data_space_to_selected_space(&points, 20_000.5, 80_000.5, WindowOptions::default(), None);

    c.bench_function("window_pan_100k", |b| {
        b.iter(|| {
            let _ = data_space_to_selected_space(
                black_box(&points),
                black_box(20_100.5),
                black_box(80_100.5),
                WindowOptions::default(),
                Some(start.clone()),
            );
        })
    });
}

fn bench_condense_100k_into_1920(c: &mut Criterion) {
    let points = wave(100_000);
    c.bench_function("condense_100k_into_1920", |b| {
        b.iter(|| {
            let condensed = condense_data_space(black_box(&points), black_box(1920), None)
                .expect("input is large enough to condense");
            black_box(condensed.points().len());
        })
    });
}

fn bench_projection_1920_columns(c: &mut Criterion) {
    let points = wave(20_000);
    let params = ProjectionParams {
        render_width: 1920,
        min_x: 0.0,
        max_x: 19_999.0,
        y: ValueScale::new(AxisScale::Linear, -120.0, 120.0, 1080.0).expect("valid value scale"),
    };
    let mut out = RenderSpace::with_width(1920);

    c.bench_function("projection_1920_columns", |b| {
        b.iter(|| {
            ReferenceProjector
                .project(black_box(&points), black_box(&params), &mut out)
                .expect("reference projection never fails");
        })
    });
}

fn bench_controller_zoom_frame_50k(c: &mut Criterion) {
    let config = ViewportConfig::new(Viewport::new(1600, 900));
    let mut controller = ViewportController::new(NullRenderer::default(), config, ManualScheduler::new())
        .expect("controller init");
    let values: Vec<f64> = wave(50_000).into_iter().filter_map(|point| point.y).collect();
    controller
        .set_series(vec![Rc::new(Series::from_values("wave", &values))])
        .expect("valid series");
    controller.process_frame().expect("first frame");

    let mut shift = 0.0;
    c.bench_function("controller_zoom_frame_50k", |b| {
        b.iter(|| {
            shift = (shift + 10.0) % 1_000.0;
            controller
                .zoom_to(10_000.0 + shift, 40_000.0 + shift)
                .expect("valid zoom");
            controller.process_frame().expect("frame should succeed");
        })
    });
}

criterion_group!(
    benches,
    bench_window_scratch_100k,
    bench_window_pan_100k,
    bench_condense_100k_into_1920,
    bench_projection_1920_columns,
    bench_controller_zoom_frame_50k
);
criterion_main!(benches);
