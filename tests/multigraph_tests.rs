use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chart_viewport::api::{ManualScheduler, MultigraphController, ViewportConfig, fixed_window};
use chart_viewport::core::Viewport;
use chart_viewport::error::ChartError;
use chart_viewport::render::NullRenderer;
use chart_viewport::series::{PushSink, PushSource, Series, Subscription};
use serde_json::json;

fn multigraph() -> MultigraphController<NullRenderer> {
    let config = ViewportConfig::new(Viewport::new(120, 40));
    MultigraphController::new(
        config,
        ManualScheduler::new(),
        Box::new(|_| NullRenderer::default()),
    )
    .expect("multigraph init")
}

fn line(name: &str) -> Series {
    Series::from_tuples(name, &[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)])
}

#[derive(Default)]
struct CountingPush {
    sink: Option<PushSink>,
    observed: usize,
    unsubscribed: Rc<Cell<usize>>,
}

struct CountingSubscription(Rc<Cell<usize>>);

impl Subscription for CountingSubscription {
    fn unsubscribe(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

impl PushSource for CountingPush {
    fn observe(&mut self, sink: PushSink) -> Box<dyn Subscription> {
        self.observed += 1;
        self.sink = Some(sink);
        Box::new(CountingSubscription(Rc::clone(&self.unsubscribed)))
    }
}

#[test]
fn starts_with_one_empty_graph() {
    let graphs = multigraph();
    assert_eq!(graphs.graph_count(), 1);
    assert!(!graphs.needs_frame());
    assert!(graphs.cache().is_empty());
}

#[test]
fn series_are_routed_by_their_graph_option() {
    let mut graphs = multigraph();
    let a = Rc::new(line("a"));
    let b = Rc::new(line("b").with_graph(1));
    graphs
        .set_series(vec![Rc::clone(&a), Rc::clone(&b)])
        .expect("route");

    assert_eq!(graphs.graph_count(), 2);
    assert_eq!(graphs.graph_of(&a), Some(0));
    assert_eq!(graphs.graph_of(&b), Some(1));
    assert_eq!(graphs.process_frame().expect("frame"), 2);
    assert!(graphs.graphs().all(|graph| graph.renderer().last_series_count == 1));
    assert_eq!(graphs.process_frame().expect("idle frame"), 0);
}

#[test]
fn moving_a_series_keeps_its_cache_entry() {
    let mut graphs = multigraph();
    let a = Rc::new(line("a"));
    let b = Rc::new(line("b"));
    graphs
        .set_series(vec![Rc::clone(&a), Rc::clone(&b)])
        .expect("route");
    graphs.process_frame().expect("frame");
    let version = graphs.cache().version(&a);

    graphs.move_series(&a, 1).expect("move to a new graph");
    assert_eq!(graphs.graph_count(), 2);
    assert_eq!(graphs.graph_of(&a), Some(1));
    assert_eq!(graphs.graph_of(&b), Some(0));
    assert_eq!(graphs.cache().users(&a), 1);
    assert_eq!(graphs.cache().version(&a), version);
    assert_eq!(graphs.cache().len(), 2);

    graphs.process_frame().expect("frame after move");
    let first = graphs.graph(0).expect("graph 0");
    assert_eq!(first.series_ids().len(), 1);
}

#[test]
fn moves_win_over_options_until_the_series_leaves() {
    let mut graphs = multigraph();
    let a = Rc::new(line("a").with_graph(1));
    graphs.set_series(vec![Rc::clone(&a)]).expect("route");
    graphs.move_series(&a, 0).expect("move back");
    assert_eq!(graphs.graph_of(&a), Some(0));

    graphs.set_series(Vec::new()).expect("clear");
    assert!(graphs.cache().is_empty());
    graphs.set_series(vec![Rc::clone(&a)]).expect("route again");
    assert_eq!(graphs.graph_of(&a), Some(1));
}

#[test]
fn trailing_graphs_emptied_by_a_move_are_removed() {
    let mut graphs = multigraph();
    let a = Rc::new(line("a"));
    let b = Rc::new(line("b"));
    let c = Rc::new(line("c"));
    graphs
        .set_series(vec![Rc::clone(&a), Rc::clone(&b), Rc::clone(&c)])
        .expect("route");
    graphs.move_series(&b, 1).expect("open graph 1");
    graphs.move_series(&c, 2).expect("open graph 2");
    assert_eq!(graphs.graph_count(), 3);

    graphs.move_series(&b, 0).expect("empty the middle graph");
    assert_eq!(graphs.graph_count(), 3);
    assert_eq!(graphs.graph(1).map(|graph| graph.series_ids().len()), Some(0));

    graphs.move_series(&c, 0).expect("empty the last graph");
    assert_eq!(graphs.graph_count(), 1);
    assert_eq!(graphs.graph_of(&c), Some(0));
    assert_eq!(graphs.cache().users(&c), 1);
    assert_eq!(graphs.process_frame().expect("frame"), 1);
    assert_eq!(graphs.graph(0).expect("graph 0").renderer().last_series_count, 3);
}

#[test]
fn invalid_moves_are_reported() {
    let mut graphs = multigraph();
    let a = Rc::new(line("a"));
    graphs.set_series(vec![Rc::clone(&a)]).expect("route");

    let err = graphs.move_series(&a, 5).expect_err("out of range");
    assert!(matches!(err, ChartError::UnknownGraph { index: 5, count: 1 }));

    let stranger = Rc::new(line("stranger"));
    let err = graphs.move_series(&stranger, 0).expect_err("not routed");
    assert!(matches!(err, ChartError::InvalidSeries { .. }));
}

#[test]
fn push_sources_survive_moves_with_one_subscription() {
    let mut graphs = multigraph();
    let source = Rc::new(RefCell::new(CountingPush::default()));
    let unsubscribed = Rc::clone(&source.borrow().unsubscribed);
    let live = Rc::new(Series::push("live", source.clone()));
    graphs.set_series(vec![Rc::clone(&live)]).expect("route");

    graphs.move_series(&live, 1).expect("move");
    graphs.move_series(&live, 2).expect("move again");
    assert_eq!(source.borrow().observed, 1);
    assert_eq!(unsubscribed.get(), 0);

    let sink = source.borrow().sink.clone().expect("observed");
    assert!(sink.push(vec![json!([0, 1]), json!([1, 4])]));
    assert!(graphs.graph(2).expect("graph 2").needs_frame());
    graphs.process_frame().expect("frame");
    let graph = graphs.graph(2).expect("graph 2");
    let id = graph.series_id(&live).expect("id");
    assert_eq!(graph.data_points(id).map(|points| points.len()), Some(2));

    graphs.dispose();
    assert_eq!(unsubscribed.get(), 1);
    assert!(!sink.is_connected());
}

#[test]
fn linked_bounds_apply_to_every_graph() {
    let mut graphs = multigraph();
    let a = Rc::new(line("a"));
    let b = Rc::new(line("b"));
    graphs
        .set_series(vec![Rc::clone(&a), Rc::clone(&b)])
        .expect("route");
    graphs.set_bounds_calculator(fixed_window(0.5, 1.5));
    graphs.move_series(&b, 1).expect("move");
    graphs.process_frame().expect("frame");

    for graph in graphs.graphs() {
        assert_eq!(graph.view_x(), (0.5, 1.5));
    }

    graphs.unlink();
    graphs.move_series(&b, 2).expect("move to a fresh graph");
    graphs.process_frame().expect("frame");
    assert_eq!(graphs.graph(2).expect("graph 2").view_x(), (0.0, 2.0));
}
