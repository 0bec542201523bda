use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{Bounds, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::render::Renderer;
use crate::series::{RenderMode, SeriesShape};

use super::{
    AnnotationPlacement, Axis, ContextMenuState, SeriesId, Tooltip, ViewportController,
};

pub const VIEWPORT_SNAPSHOT_JSON_SCHEMA_V1: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    pub id: SeriesId,
    pub name: String,
    pub shape: SeriesShape,
    pub render_mode: RenderMode,
    pub axis: String,
    pub hidden: bool,
    pub data_len: usize,
    pub selected_len: usize,
    /// `None` when the selection was not condensed.
    pub condensed_len: Option<usize>,
    pub render_width: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSnapshot {
    pub id: String,
    pub series: Vec<SeriesId>,
    pub selected_data_bounds: Bounds,
    pub current_bounds: Bounds,
}

impl From<&Axis> for AxisSnapshot {
    fn from(axis: &Axis) -> Self {
        Self {
            id: axis.id.clone(),
            series: axis.series.clone(),
            selected_data_bounds: axis.selected_data_bounds,
            current_bounds: axis.current_bounds,
        }
    }
}

/// Serializable derived state, used by regression tests and debugging
/// tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSnapshot {
    pub viewport: Viewport,
    pub frames_processed: u64,
    pub global_bounds: Bounds,
    pub selection: Bounds,
    pub view_x: (f64, f64),
    pub history_position: usize,
    pub history_len: usize,
    pub series: Vec<SeriesSnapshot>,
    pub axes: IndexMap<String, AxisSnapshot>,
    pub tooltips: Vec<Tooltip>,
    pub saved_tooltips: Vec<Tooltip>,
    pub annotations: Vec<AnnotationPlacement>,
    pub context_menu: ContextMenuState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSnapshotJsonContractV1 {
    pub schema_version: u32,
    pub snapshot: ViewportSnapshot,
}

impl ViewportSnapshot {
    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChartError::InvalidData(format!("failed to serialize snapshot: {e}")))
    }

    pub fn to_json_contract_v1_pretty(&self) -> ChartResult<String> {
        let payload = ViewportSnapshotJsonContractV1 {
            schema_version: VIEWPORT_SNAPSHOT_JSON_SCHEMA_V1,
            snapshot: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            ChartError::InvalidData(format!("failed to serialize snapshot contract v1: {e}"))
        })
    }

    /// Accepts both the bare snapshot and the versioned contract.
    pub fn from_json_compat_str(input: &str) -> ChartResult<Self> {
        if let Ok(snapshot) = serde_json::from_str::<ViewportSnapshot>(input) {
            return Ok(snapshot);
        }
        let payload: ViewportSnapshotJsonContractV1 = serde_json::from_str(input).map_err(|e| {
            ChartError::InvalidData(format!("failed to parse snapshot json payload: {e}"))
        })?;
        if payload.schema_version != VIEWPORT_SNAPSHOT_JSON_SCHEMA_V1 {
            return Err(ChartError::InvalidData(format!(
                "unsupported snapshot schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.snapshot)
    }
}

impl<R: Renderer> ViewportController<R> {
    #[must_use]
    pub fn snapshot(&self) -> ViewportSnapshot {
        let series = self
            .records
            .values()
            .map(|record| {
                let options = &record.series.options;
                let data_len = match &record.pull {
                    Some(pull) => pull.space.points.len(),
                    None => self.cache.with_space(record.key, |space| space.points.len()),
                };
                SeriesSnapshot {
                    id: record.id,
                    name: record.series.name.clone(),
                    shape: record.shape,
                    render_mode: options.render_mode,
                    axis: options.axis.clone(),
                    hidden: options.hidden,
                    data_len,
                    selected_len: record.selected.as_ref().map_or(0, |selected| selected.len()),
                    condensed_len: record.condensed.as_ref().map(|condensed| condensed.points().len()),
                    render_width: record.render.width(),
                }
            })
            .collect();

        ViewportSnapshot {
            viewport: self.viewport,
            frames_processed: self.frames_processed,
            global_bounds: self.global_bounds,
            selection: self.selection,
            view_x: self.view_x,
            history_position: self.history.position(),
            history_len: self.history.len(),
            series,
            axes: self
                .axes
                .iter()
                .map(|(id, axis)| (id.clone(), AxisSnapshot::from(axis)))
                .collect(),
            tooltips: self.tooltips.clone(),
            saved_tooltips: self.saved_tooltips.clone(),
            annotations: self.annotation_placements.clone(),
            context_menu: self.context_menu.clone(),
        }
    }

    pub fn snapshot_json_contract_v1_pretty(&self) -> ChartResult<String> {
        self.snapshot().to_json_contract_v1_pretty()
    }
}
