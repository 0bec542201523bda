use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{
    Bounds, CondensedSpace, DataBounds, DataPoint, Projector, RenderSpace, SelectedSpace,
    Viewport, select_projector,
};
use crate::error::{ChartError, ChartResult};
use crate::render::Renderer;
use crate::series::{DataSpace, EnumMap, PullRequest, PullSource, Series, SeriesData, SeriesShape, SourceInbox};

use super::data_cache::{CacheVersion, SeriesKey, series_key};
use super::{
    Annotation, AnnotationPlacement, Axis, AxisOptions, BackgroundRange, BoundsHistory,
    ContextMenuState, Cursor, DataCache, EventDispatcher, EventKind, EventListener, FrameScheduler,
    FrameSignal, FrameState, InvalidationTopic, InvalidationTopics, ListenerId, PartialBounds,
    Tooltip, ViewportConfig, show_all, toggle_saved,
};

/// Stable arena key of a series inside one controller. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesId(u64);

impl SeriesId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "series#{}", self.0)
    }
}

pub(super) struct PullState {
    pub(super) source: Rc<RefCell<dyn PullSource>>,
    pub(super) latest_ticket: u64,
    pub(super) last_request: Option<PullRequest>,
    pub(super) space: DataSpace,
    pub(super) enums: EnumMap,
}

/// Derived state of one series.
pub(super) struct SeriesRecord {
    pub(super) id: SeriesId,
    pub(super) series: Rc<Series>,
    pub(super) key: SeriesKey,
    pub(super) shape: SeriesShape,
    pub(super) version: CacheVersion,
    pub(super) pull: Option<PullState>,
    /// Extent of the whole data space.
    pub(super) data_bounds: DataBounds,
    /// Data points and range samples already folded into `data_bounds`.
    pub(super) bounded_len: usize,
    pub(super) bounded_ranges: usize,
    /// Extent of the selected space, percentile-trimmed.
    pub(super) selected_bounds: DataBounds,
    pub(super) selected: Option<SelectedSpace>,
    pub(super) condensed: Option<CondensedSpace>,
    pub(super) render: RenderSpace,
    pub(super) backgrounds: Vec<BackgroundRange>,
    /// Data was replaced: swaps are invalid.
    pub(super) needs_rebuild: bool,
    /// Data was appended: swaps stay valid.
    pub(super) needs_window: bool,
}

impl SeriesRecord {
    pub(super) fn visible(&self) -> bool {
        !self.series.options.hidden
    }
}

/// Orchestrates the viewport pipeline for one chart.
///
/// Mutating calls only mark invalidation topics and request a frame; the
/// work happens in [`ViewportController::process_frame`], once per frame no
/// matter how many mutations preceded it.
pub struct ViewportController<R: Renderer> {
    pub(super) renderer: R,
    pub(super) config: ViewportConfig,
    pub(super) viewport: Viewport,
    pub(super) signal: Rc<FrameSignal>,
    pub(super) inbox: Rc<SourceInbox>,
    pub(super) cache: Rc<DataCache>,
    pub(super) projector: Box<dyn Projector>,
    pub(super) records: IndexMap<SeriesId, SeriesRecord>,
    pub(super) next_series_id: u64,
    pub(super) axes: IndexMap<String, Axis>,
    pub(super) axis_options: IndexMap<String, AxisOptions>,
    pub(super) history: BoundsHistory,
    pub(super) global_bounds: Bounds,
    pub(super) selection: Bounds,
    pub(super) partial: Option<PartialBounds>,
    /// Drawn x range: the selection, widened for bars.
    pub(super) view_x: (f64, f64),
    pub(super) cursor: Option<Cursor>,
    pub(super) tooltips: Vec<Tooltip>,
    pub(super) saved_tooltips: Vec<Tooltip>,
    pub(super) annotations: Vec<Annotation>,
    pub(super) annotation_placements: Vec<AnnotationPlacement>,
    pub(super) context_menu: ContextMenuState,
    pub(super) dirty: InvalidationTopics,
    pub(super) events: EventDispatcher,
    pub(super) frames_processed: u64,
    pub(super) disposed: bool,
}

impl<R: Renderer> ViewportController<R> {
    pub fn new(
        renderer: R,
        config: ViewportConfig,
        scheduler: Rc<dyn FrameScheduler>,
    ) -> ChartResult<Self> {
        Self::with_cache(renderer, config, scheduler, DataCache::new())
    }

    /// Controller sharing `cache` with other controllers.
    pub fn with_cache(
        renderer: R,
        config: ViewportConfig,
        scheduler: Rc<dyn FrameScheduler>,
        cache: Rc<DataCache>,
    ) -> ChartResult<Self> {
        config.validate()?;
        let signal = FrameSignal::new(scheduler);
        let inbox = SourceInbox::new(&signal);
        Ok(Self {
            renderer,
            config,
            viewport: config.viewport,
            signal,
            inbox,
            cache,
            projector: select_projector(config.projector),
            records: IndexMap::new(),
            next_series_id: 0,
            axes: IndexMap::new(),
            axis_options: IndexMap::new(),
            history: BoundsHistory::new(show_all(), config.history_debounce_ms),
            global_bounds: Bounds::default(),
            selection: Bounds::default(),
            partial: None,
            view_x: (0.0, 0.0),
            cursor: None,
            tooltips: Vec::new(),
            saved_tooltips: Vec::new(),
            annotations: Vec::new(),
            annotation_placements: Vec::new(),
            context_menu: ContextMenuState::default(),
            dirty: InvalidationTopics::none(),
            events: EventDispatcher::new(),
            frames_processed: 0,
            disposed: false,
        })
    }

    /// Replaces the projection strategy.
    #[must_use]
    pub fn with_projector(mut self, projector: Box<dyn Projector>) -> Self {
        self.set_projector(projector);
        self
    }

    pub fn set_projector(&mut self, projector: Box<dyn Projector>) {
        debug!(projector = projector.name(), "projector replaced");
        self.projector = projector;
        self.mark(InvalidationTopic::Size);
    }

    #[must_use]
    pub fn projector_name(&self) -> &'static str {
        self.projector.name()
    }

    #[must_use]
    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn frame_state(&self) -> FrameState {
        self.signal.state()
    }

    #[must_use]
    pub fn dirty_topics(&self) -> InvalidationTopics {
        self.dirty
    }

    #[must_use]
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[must_use]
    pub fn cache(&self) -> &Rc<DataCache> {
        &self.cache
    }

    /// Replaces the displayed series.
    ///
    /// Series are matched by `Rc` identity: a series already shown keeps its
    /// id and derived state, anything new is normalized now, so malformed
    /// data is reported here and leaves the controller unchanged.
    pub fn set_series(&mut self, series: Vec<Rc<Series>>) -> ChartResult<()> {
        if self.disposed {
            return Ok(());
        }

        let mut incoming: IndexMap<SeriesKey, Rc<Series>> = IndexMap::with_capacity(series.len());
        for item in series {
            let key = series_key(&item);
            if incoming.insert(key, item).is_some() {
                warn!("series passed twice to set_series, keeping one");
            }
        }

        let existing: IndexMap<SeriesKey, SeriesId> = self
            .records
            .values()
            .map(|record| (record.key, record.id))
            .collect();

        let mut acquired: Vec<(Rc<Series>, SeriesShape)> = Vec::new();
        for item in incoming.values() {
            if existing.contains_key(&series_key(item)) {
                continue;
            }
            match self.cache.acquire(item, &self.signal) {
                Ok(shape) => acquired.push((Rc::clone(item), shape)),
                Err(err) => {
                    let weak = Rc::downgrade(&self.signal);
                    for (done, _) in &acquired {
                        self.cache.release(series_key(done), &weak);
                    }
                    return Err(err);
                }
            }
        }

        let unchanged = acquired.is_empty()
            && incoming.len() == existing.len()
            && incoming.keys().zip(existing.keys()).all(|(a, b)| a == b);
        if unchanged {
            return Ok(());
        }

        let mut previous = std::mem::take(&mut self.records);
        let mut shapes: IndexMap<SeriesKey, SeriesShape> = acquired
            .into_iter()
            .map(|(item, shape)| (series_key(&item), shape))
            .collect();
        for (key, item) in incoming {
            let record = match existing.get(&key) {
                Some(id) => previous.shift_remove(id),
                None => None,
            };
            let record = match record {
                Some(record) => record,
                None => {
                    let shape = shapes.shift_remove(&key).unwrap_or(SeriesShape::Empty);
                    self.new_record(item, key, shape)
                }
            };
            self.records.insert(record.id, record);
        }

        let weak = Rc::downgrade(&self.signal);
        for record in previous.into_values() {
            debug!(series = %record.series.name, id = %record.id, "series removed");
            self.cache.release(record.key, &weak);
        }
        let live: Vec<SeriesId> = self.records.keys().copied().collect();
        self.saved_tooltips.retain(|tooltip| live.contains(&tooltip.series));

        self.mark(InvalidationTopic::Series);
        Ok(())
    }

    fn new_record(&mut self, series: Rc<Series>, key: SeriesKey, shape: SeriesShape) -> SeriesRecord {
        self.next_series_id += 1;
        let id = SeriesId(self.next_series_id);
        let pull = match &series.data {
            SeriesData::Pull(source) => Some(PullState {
                source: Rc::clone(source),
                latest_ticket: 0,
                last_request: None,
                space: DataSpace::default(),
                enums: EnumMap::new(),
            }),
            _ => None,
        };
        debug!(series = %series.name, %id, ?shape, "series added");
        SeriesRecord {
            id,
            version: self.cache.version_of(key).unwrap_or_default(),
            series,
            key,
            shape,
            pull,
            data_bounds: DataBounds::initial(),
            bounded_len: 0,
            bounded_ranges: 0,
            selected_bounds: DataBounds::initial(),
            selected: None,
            condensed: None,
            render: RenderSpace::default(),
            backgrounds: Vec::new(),
            needs_rebuild: true,
            needs_window: false,
        }
    }

    #[must_use]
    pub fn series_ids(&self) -> Vec<SeriesId> {
        self.records.keys().copied().collect()
    }

    #[must_use]
    pub fn series_id(&self, series: &Rc<Series>) -> Option<SeriesId> {
        let key = series_key(series);
        self.records
            .values()
            .find(|record| record.key == key)
            .map(|record| record.id)
    }

    #[must_use]
    pub fn series(&self, id: SeriesId) -> Option<&Rc<Series>> {
        self.records.get(&id).map(|record| &record.series)
    }

    #[must_use]
    pub fn series_shape(&self, id: SeriesId) -> Option<SeriesShape> {
        self.records.get(&id).map(|record| record.shape)
    }

    /// Copy of the data space of a series.
    #[must_use]
    pub fn data_points(&self, id: SeriesId) -> Option<Vec<DataPoint>> {
        let record = self.records.get(&id)?;
        Some(match &record.pull {
            Some(pull) => pull.space.points.clone(),
            None => self
                .cache
                .with_space(record.key, |space| space.points.clone()),
        })
    }

    #[must_use]
    pub fn selected_points(&self, id: SeriesId) -> Option<Vec<DataPoint>> {
        self.records.get(&id)?.selected.as_ref().map(SelectedSpace::to_vec)
    }

    /// Condensed points, `None` when the selection was small enough to pass
    /// through unchanged.
    #[must_use]
    pub fn condensed_points(&self, id: SeriesId) -> Option<&[DataPoint]> {
        self.records.get(&id)?.condensed.as_ref().map(CondensedSpace::points)
    }

    #[must_use]
    pub fn render_space(&self, id: SeriesId) -> Option<&RenderSpace> {
        self.records.get(&id).map(|record| &record.render)
    }

    #[must_use]
    pub fn background_ranges(&self) -> Vec<BackgroundRange> {
        self.records
            .values()
            .flat_map(|record| record.backgrounds.iter().copied())
            .collect()
    }

    #[must_use]
    pub fn global_bounds(&self) -> Bounds {
        self.global_bounds
    }

    #[must_use]
    pub fn selection(&self) -> Bounds {
        self.selection
    }

    #[must_use]
    pub fn view_x(&self) -> (f64, f64) {
        self.view_x
    }

    #[must_use]
    pub fn axes(&self) -> &IndexMap<String, Axis> {
        &self.axes
    }

    #[must_use]
    pub fn axis(&self, id: &str) -> Option<&Axis> {
        self.axes.get(id)
    }

    /// Sets scale and side of an axis, before or after series use it.
    pub fn configure_axis(&mut self, id: impl Into<String>, options: AxisOptions) {
        let id = id.into();
        if let Some(axis) = self.axes.get_mut(&id) {
            axis.options = options;
        }
        self.axis_options.insert(id, options);
        self.mark(InvalidationTopic::Axes);
    }

    pub fn set_size(&mut self, viewport: Viewport) -> ChartResult<()> {
        let ratio = viewport.pixel_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ChartError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        if viewport != self.viewport {
            self.viewport = viewport;
            self.mark(InvalidationTopic::Size);
        }
        Ok(())
    }

    pub fn set_cursor(&mut self, cursor: Option<Cursor>) {
        if cursor != self.cursor {
            self.cursor = cursor;
            self.mark(InvalidationTopic::Tooltip);
        }
    }

    #[must_use]
    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    #[must_use]
    pub fn tooltips(&self) -> &[Tooltip] {
        &self.tooltips
    }

    #[must_use]
    pub fn saved_tooltips(&self) -> &[Tooltip] {
        &self.saved_tooltips
    }

    /// Pins the live tooltips, or unpins saved ones under the cursor.
    pub fn toggle_saved_tooltips(&mut self) {
        toggle_saved(
            &mut self.saved_tooltips,
            &self.tooltips,
            self.config.tooltip.threshold_px,
        );
        self.mark(InvalidationTopic::Tooltip);
    }

    pub fn clear_saved_tooltips(&mut self) {
        if !self.saved_tooltips.is_empty() {
            self.saved_tooltips.clear();
            self.mark(InvalidationTopic::Tooltip);
        }
    }

    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
        self.mark(InvalidationTopic::Annotations);
    }

    #[must_use]
    pub fn annotation_placements(&self) -> &[AnnotationPlacement] {
        &self.annotation_placements
    }

    pub fn open_context_menu(&mut self, pixel_x: f64, pixel_y: f64) {
        self.context_menu = ContextMenuState {
            open: true,
            pixel_x,
            pixel_y,
            ..ContextMenuState::default()
        };
        self.mark(InvalidationTopic::ContextMenu);
    }

    pub fn close_context_menu(&mut self) {
        if self.context_menu.open {
            self.context_menu = ContextMenuState::default();
            self.mark(InvalidationTopic::ContextMenu);
        }
    }

    #[must_use]
    pub fn context_menu(&self) -> &ContextMenuState {
        &self.context_menu
    }

    /// Forces a redraw without recomputing anything else.
    pub fn request_render(&mut self) {
        self.mark(InvalidationTopic::Render);
    }

    pub fn on(&mut self, kind: EventKind, listener: EventListener) -> ListenerId {
        self.events.on(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Unsubscribes push sources, drops in-flight pull replies and clears
    /// listeners. Later calls are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.inbox.close();
        let weak = Rc::downgrade(&self.signal);
        for record in std::mem::take(&mut self.records).into_values() {
            self.cache.release(record.key, &weak);
        }
        self.events.clear();
        self.dirty = InvalidationTopics::none();
        debug!("viewport controller disposed");
    }

    pub(super) fn mark(&mut self, topic: InvalidationTopic) {
        if self.disposed {
            return;
        }
        self.dirty.insert(topic);
        self.signal.request();
    }
}

impl<R: Renderer> Drop for ViewportController<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}
