mod annotations;
mod axis;
mod bounds_history;
mod config;
mod controller;
mod data_cache;
mod events;
mod frame;
mod invalidation;
mod multigraph;
mod navigation;
mod snapshot;
mod tooltip;
mod viewport_cycle;

pub use annotations::{
    Annotation, AnnotationPlacement, BackgroundRange, ContextMenuState, background_ranges,
    place_annotations,
};
pub use axis::{Axis, AxisOptions, AxisSide};
pub use bounds_history::{
    AxisRange, BoundsCalculator, BoundsHistory, PartialBounds, fixed_window, last_span, show_all,
};
pub use config::{DEFAULT_HISTORY_DEBOUNCE_MS, ViewportConfig};
pub use controller::{SeriesId, ViewportController};
pub use data_cache::{CacheVersion, DataCache};
pub use events::{EventDispatcher, EventKind, EventListener, ListenerId, ViewportEvent};
pub use frame::{FrameScheduler, FrameSignal, FrameState, ManualScheduler};
pub use invalidation::{InvalidationTopic, InvalidationTopics};
pub use multigraph::{MultigraphController, RendererFactory};
pub use snapshot::{
    AxisSnapshot, SeriesSnapshot, VIEWPORT_SNAPSHOT_JSON_SCHEMA_V1, ViewportSnapshot,
    ViewportSnapshotJsonContractV1,
};
pub use tooltip::{
    BarTarget, Cursor, DEFAULT_TOOLTIP_THRESHOLD_PX, Tooltip, TooltipCandidate, TooltipConfig,
    calculate_tooltip_state, toggle_saved,
};
