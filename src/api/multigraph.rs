//! Routes one flat series list across several stacked controllers.
//!
//! All graphs share one [`DataCache`], so a series shown in two graphs (or
//! moved between them) is normalized and subscribed once.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ChartError, ChartResult};
use crate::render::Renderer;
use crate::series::Series;

use super::data_cache::{SeriesKey, series_key};
use super::{BoundsCalculator, DataCache, FrameScheduler, FrameSignal, ViewportConfig, ViewportController};

pub type RendererFactory<R> = Box<dyn FnMut(usize) -> R>;

pub struct MultigraphController<R: Renderer> {
    graphs: Vec<ViewportController<R>>,
    cache: Rc<DataCache>,
    scheduler: Rc<dyn FrameScheduler>,
    config: ViewportConfig,
    renderer_factory: RendererFactory<R>,
    /// Graph chosen by dragging, wins over `SeriesOptions::graph`.
    overrides: IndexMap<SeriesKey, usize>,
    series: Vec<Rc<Series>>,
    linked: Option<BoundsCalculator>,
}

impl<R: Renderer> MultigraphController<R> {
    /// Starts with a single empty graph.
    pub fn new(
        config: ViewportConfig,
        scheduler: Rc<dyn FrameScheduler>,
        renderer_factory: RendererFactory<R>,
    ) -> ChartResult<Self> {
        config.validate()?;
        let mut controller = Self {
            graphs: Vec::new(),
            cache: DataCache::new(),
            scheduler,
            config,
            renderer_factory,
            overrides: IndexMap::new(),
            series: Vec::new(),
            linked: None,
        };
        controller.ensure_graphs(1)?;
        Ok(controller)
    }

    #[must_use]
    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    #[must_use]
    pub fn graph(&self, index: usize) -> Option<&ViewportController<R>> {
        self.graphs.get(index)
    }

    pub fn graph_mut(&mut self, index: usize) -> Option<&mut ViewportController<R>> {
        self.graphs.get_mut(index)
    }

    pub fn graphs(&self) -> impl Iterator<Item = &ViewportController<R>> {
        self.graphs.iter()
    }

    #[must_use]
    pub fn cache(&self) -> &Rc<DataCache> {
        &self.cache
    }

    /// Index of the graph currently showing `series`.
    #[must_use]
    pub fn graph_of(&self, series: &Rc<Series>) -> Option<usize> {
        self.graphs
            .iter()
            .position(|graph| graph.series_id(series).is_some())
    }

    /// Replaces the routed series. Drag overrides of series no longer
    /// present are forgotten.
    pub fn set_series(&mut self, series: Vec<Rc<Series>>) -> ChartResult<()> {
        let keys: Vec<SeriesKey> = series.iter().map(series_key).collect();
        self.overrides.retain(|key, _| keys.contains(key));
        self.series = series;
        self.reroute()
    }

    /// Moves `series` to `to_graph`; `to_graph == graph_count()` opens a new
    /// graph below the others. Trailing graphs left empty are removed, empty
    /// graphs between occupied ones are kept.
    pub fn move_series(&mut self, series: &Rc<Series>, to_graph: usize) -> ChartResult<()> {
        let key = series_key(series);
        if !self.series.iter().any(|item| series_key(item) == key) {
            return Err(ChartError::invalid_series(
                &series.name,
                "not routed by this multigraph controller",
            ));
        }
        if to_graph > self.graphs.len() {
            return Err(ChartError::UnknownGraph {
                index: to_graph,
                count: self.graphs.len(),
            });
        }
        debug!(series = %series.name, to_graph, "series moved");
        self.overrides.insert(key, to_graph);
        self.reroute()
    }

    /// Applies one bounds calculator to every graph, including graphs
    /// created later.
    pub fn set_bounds_calculator(&mut self, calculator: BoundsCalculator) {
        for graph in &mut self.graphs {
            graph.set_bounds_calculator(Rc::clone(&calculator));
        }
        self.linked = Some(calculator);
    }

    /// Stops applying the linked calculator to new graphs.
    pub fn unlink(&mut self) {
        self.linked = None;
    }

    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.graphs.iter().any(ViewportController::needs_frame)
    }

    /// Runs a frame on every graph that asked for one. Returns how many ran.
    pub fn process_frame(&mut self) -> ChartResult<usize> {
        let mut processed = 0;
        for graph in &mut self.graphs {
            if graph.needs_frame() {
                graph.process_frame()?;
                processed += 1;
            }
        }
        Ok(processed)
    }

    pub fn dispose(&mut self) {
        for graph in &mut self.graphs {
            graph.dispose();
        }
        self.overrides.clear();
        self.series.clear();
    }

    fn route(&self, series: &Rc<Series>) -> usize {
        self.overrides
            .get(&series_key(series))
            .copied()
            .or(series.options.graph)
            .unwrap_or(0)
    }

    fn ensure_graphs(&mut self, count: usize) -> ChartResult<()> {
        while self.graphs.len() < count {
            let index = self.graphs.len();
            let renderer = (self.renderer_factory)(index);
            let mut graph = ViewportController::with_cache(
                renderer,
                self.config,
                Rc::clone(&self.scheduler),
                Rc::clone(&self.cache),
            )?;
            if let Some(calculator) = &self.linked {
                graph.set_bounds_calculator(Rc::clone(calculator));
            }
            debug!(index, "graph created");
            self.graphs.push(graph);
        }
        Ok(())
    }

    fn reroute(&mut self) -> ChartResult<()> {
        let needed = self
            .series
            .iter()
            .map(|series| self.route(series) + 1)
            .max()
            .unwrap_or(1);
        self.ensure_graphs(needed)?;

        let mut partitions: Vec<Vec<Rc<Series>>> = vec![Vec::new(); self.graphs.len()];
        for series in &self.series {
            partitions[self.route(series)].push(Rc::clone(series));
        }

        // Pin every series while graphs swap them, so a series leaving one
        // graph for another keeps its cache entry and subscription.
        let pin = FrameSignal::new(Rc::clone(&self.scheduler));
        let mut pinned = Vec::with_capacity(self.series.len());
        let mut result = Ok(());
        for series in &self.series {
            match self.cache.acquire(series, &pin) {
                Ok(_) => pinned.push(series_key(series)),
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        if result.is_ok() {
            for (graph, partition) in self.graphs.iter_mut().zip(partitions) {
                if let Err(err) = graph.set_series(partition) {
                    result = Err(err);
                    break;
                }
            }
        }
        if result.is_ok() {
            // Graphs past the last routed one are empty now.
            while self.graphs.len() > needed {
                if let Some(mut graph) = self.graphs.pop() {
                    graph.dispose();
                    debug!(index = self.graphs.len(), "empty graph removed");
                }
            }
        }

        let weak = Rc::downgrade(&pin);
        for key in pinned {
            self.cache.release(key, &weak);
        }
        result
    }
}
