pub mod bounds;
pub mod condense;
pub mod projection;
pub mod scale;
pub mod search;
pub mod types;
pub mod windowing;

pub use bounds::{
    Bounds, BoundsOptions, DataBounds, EXPAND_Y_RATIO, ExpandOptions, calculate_data_bounds,
    expand_bounds, extend_data_bounds, merge_bounds, percentile_ranks, scale_bounds,
};
pub use condense::{CondenseState, CondensedSpace, bucket_count, condense_data_space, needs_condensing};
pub use projection::{
    NULL_MAX, NULL_MIN, NULL_VALUE, ProjectionParams, Projector, ProjectorPreference,
    ReferenceProjector, RenderSpace, project_column, select_projector,
    selected_space_to_render_space,
};
#[cfg(feature = "parallel-projection")]
pub use projection::ParallelProjector;
pub use scale::{AxisScale, LinearScale, ValueScale};
pub use search::{SearchType, binary_search, binary_search_point, find_nearest_defined};
pub use types::{DataPoint, Viewport, datetime_to_epoch_millis};
pub use windowing::{SelectedSpace, WindowOptions, WindowState, data_space_to_selected_space};
