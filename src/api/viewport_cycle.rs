//! One coalesced recomputation pass.
//!
//! Stage order: pull replies and push batches, data bounds, selection,
//! windowing, axes, condensation and projection, pull requests, tooltips,
//! context menu, annotations, render, events. Each stage only runs when one
//! of its inputs changed.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::core::{
    BoundsOptions, DataPoint, ExpandOptions, LinearScale, ProjectionParams, WindowOptions,
    calculate_data_bounds, condense_data_space, data_space_to_selected_space, expand_bounds,
    extend_data_bounds, merge_bounds, scale_bounds, selected_space_to_render_space,
};
use crate::error::{ChartError, ChartResult};
use crate::render::{RenderFrame, Renderer, SeriesLayer};
use crate::series::{
    DataSpace, PullReply, PullRequest, RenderMode, SeriesAux, SeriesData, infer_inline_shape,
    normalize_binary, normalize_inline,
};

use super::controller::{PullState, SeriesId};
use super::data_cache::{SeriesKey, SpaceView};
use super::invalidation::{PROJECTION_TOPICS, WINDOW_TOPICS};
use super::{
    Axis, AxisRange, BarTarget, ContextMenuState, FrameState, InvalidationTopic,
    InvalidationTopics, TooltipCandidate, ViewportController, ViewportEvent, background_ranges,
    calculate_tooltip_state, place_annotations,
};

fn space_of<'a>(
    pull: &'a Option<PullState>,
    key: SeriesKey,
    spaces: &'a SpaceView<'_>,
) -> &'a DataSpace {
    match pull {
        Some(pull) => &pull.space,
        None => spaces.get(key),
    }
}

/// Range extremes with x inside `[min_x, max_x]`.
fn window_range_values(aux: &SeriesAux, min_x: f64, max_x: f64) -> Vec<f64> {
    match aux {
        SeriesAux::Ranges(ranges) => ranges
            .iter()
            .filter(|range| range.x >= min_x && range.x <= max_x)
            .flat_map(|range| [range.min, range.max])
            .flatten()
            .collect(),
        SeriesAux::None | SeriesAux::Vectors(_) => Vec::new(),
    }
}

impl<R: Renderer> ViewportController<R> {
    /// Whether a frame was requested or topics are dirty.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        !self.disposed
            && (self.signal.state() == FrameState::FrameRequested || !self.dirty.is_none())
    }

    /// Runs one cycle and delivers the coalesced events.
    pub fn process_frame(&mut self) -> ChartResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.signal.begin();
        let result = self.run_cycle();
        let delivered = self.events.flush();
        trace!(delivered, "frame events flushed");
        self.signal.finish();
        result
    }

    fn run_cycle(&mut self) -> ChartResult<()> {
        self.apply_pull_replies();
        self.sync_sources();

        let dirty = self.dirty.take();
        if dirty.is_none() {
            return Ok(());
        }
        self.frames_processed += 1;
        trace!(frame = self.frames_processed, ?dirty, "processing frame");

        let data_changed = self.refresh_data_bounds(dirty);
        let selection_moved =
            (data_changed || dirty.intersects(WINDOW_TOPICS)) && self.update_selection();
        let windowed = self.update_windows(selection_moved);

        let axes_changed = (windowed
            || dirty.intersects(
                InvalidationTopics::from_topic(InvalidationTopic::Axes)
                    .with_topic(InvalidationTopic::Series),
            ))
            && self.update_axes();

        let projected = windowed || axes_changed || dirty.intersects(PROJECTION_TOPICS);
        if projected {
            self.project_all();
        }

        if data_changed || dirty.intersects(WINDOW_TOPICS.with_topic(InvalidationTopic::Size)) {
            self.issue_pull_requests();
        }

        let tooltips_changed =
            (projected || dirty.contains_topic(InvalidationTopic::Tooltip)) && self.update_tooltips();
        let menu_changed = (dirty.contains_topic(InvalidationTopic::ContextMenu)
            || (projected && self.context_menu.open))
            && self.update_context_menu(dirty.contains_topic(InvalidationTopic::ContextMenu));
        let annotations_changed = (projected
            || dirty.contains_topic(InvalidationTopic::Annotations))
            && self.update_annotations();

        if dirty.contains_topic(InvalidationTopic::History) {
            self.events.emit(ViewportEvent::BoundHistoryChanged {
                position: self.history.position(),
                len: self.history.len(),
            });
        }
        if dirty.contains_topic(InvalidationTopic::Size) {
            self.events.emit(ViewportEvent::SizeChanged {
                viewport: self.viewport,
            });
        }
        if dirty.contains_topic(InvalidationTopic::Series) {
            self.events.emit(ViewportEvent::SeriesChanged {
                series: self.records.keys().copied().collect(),
            });
        }

        if projected
            || tooltips_changed
            || menu_changed
            || annotations_changed
            || dirty.contains_topic(InvalidationTopic::Render)
        {
            self.render()?;
        }
        Ok(())
    }

    fn apply_pull_replies(&mut self) {
        for delivery in self.inbox.take() {
            let id = SeriesId::from_raw(delivery.series);
            let Some(record) = self.records.get_mut(&id) else {
                trace!(%id, "pull reply for removed series, dropping");
                continue;
            };
            let Some(pull) = record.pull.as_mut() else {
                continue;
            };
            if delivery.ticket < pull.latest_ticket {
                trace!(
                    %id,
                    ticket = delivery.ticket,
                    latest = pull.latest_ticket,
                    "discarding stale pull reply"
                );
                continue;
            }

            let name = &record.series.name;
            let options = &record.series.options;
            let normalized = match &delivery.data {
                SeriesData::Inline(values) => infer_inline_shape(name, values).and_then(|shape| {
                    normalize_inline(name, options, shape, values, &mut pull.enums, 0)
                }),
                SeriesData::Binary(objects) => normalize_binary(name, options, objects),
                SeriesData::Push(_) | SeriesData::Pull(_) => Err(ChartError::invalid_series(
                    name,
                    "pull replies must carry inline or binary data",
                )),
            };
            match normalized {
                Ok(space) => {
                    debug!(%id, points = space.points.len(), "pull reply applied");
                    pull.space = space;
                    record.needs_rebuild = true;
                    self.dirty.insert(InvalidationTopic::Data);
                }
                Err(err) => warn!(%id, error = %err, "ignoring malformed pull reply"),
            }
        }
    }

    fn sync_sources(&mut self) {
        let mut changed = false;
        for record in self.records.values_mut() {
            if record.pull.is_some() {
                continue;
            }
            let Some(version) = self.cache.sync(record.key) else {
                continue;
            };
            if version.generation != record.version.generation {
                record.needs_rebuild = true;
                changed = true;
            } else if version.len != record.version.len {
                record.needs_window = true;
                changed = true;
            }
            record.version = version;
        }
        if changed {
            self.dirty.insert(InvalidationTopic::Data);
        }
    }

    /// Recomputes whole-data extents of changed series and the global
    /// bounds. Returns whether any series changed.
    fn refresh_data_bounds(&mut self, dirty: InvalidationTopics) -> bool {
        let cache = Rc::clone(&self.cache);
        let spaces = cache.view();
        let mut changed = false;
        for record in self.records.values_mut() {
            if !(record.needs_rebuild || record.needs_window) {
                continue;
            }
            changed = true;
            let space = space_of(&record.pull, record.key, &spaces);
            let appended = !record.needs_rebuild
                && record.bounded_len > 0
                && record.bounded_len <= space.points.len()
                && record.bounded_ranges <= space.range_count();
            if appended {
                // Start at the last bounded sample so the seam spacing counts.
                let range_values = space.range_values_from(record.bounded_ranges);
                let tail = calculate_data_bounds(
                    &space.points[record.bounded_len - 1..],
                    &BoundsOptions {
                        range_values: &range_values,
                        ..BoundsOptions::default()
                    },
                );
                record.data_bounds = extend_data_bounds(record.data_bounds, tail);
            } else {
                let range_values = space.range_values();
                record.data_bounds = calculate_data_bounds(
                    &space.points,
                    &BoundsOptions {
                        range_values: &range_values,
                        ..BoundsOptions::default()
                    },
                );
            }
            record.bounded_len = space.points.len();
            record.bounded_ranges = space.range_count();
        }

        if changed || dirty.contains_topic(InvalidationTopic::Series) {
            let visible = self.records.values().filter(|record| record.visible());
            let mut global = merge_bounds(visible.clone().map(|record| &record.data_bounds));
            global.dates = visible
                .clone()
                .any(|record| space_of(&record.pull, record.key, &spaces).dates);
            self.global_bounds = global;
        }
        changed
    }

    /// Applies the current bounds calculator. Returns whether the drawn x
    /// range moved.
    fn update_selection(&mut self) -> bool {
        let calculator = self.history.current();
        let partial = calculator(&self.global_bounds);

        let mut selection = self.global_bounds;
        if let Some(partial) = &partial {
            let finite = |value: Option<f64>| value.filter(|v| v.is_finite());
            if let Some(min_x) = finite(partial.min_x) {
                selection.min_x = min_x;
            }
            if let Some(max_x) = finite(partial.max_x) {
                selection.max_x = max_x;
            }
            if let Some(min_y) = finite(partial.min_y) {
                selection.min_y = min_y;
            }
            if let Some(max_y) = finite(partial.max_y) {
                selection.max_y = max_y;
            }
        }
        if selection.min_x > selection.max_x {
            std::mem::swap(&mut selection.min_x, &mut selection.max_x);
        }

        let cache = Rc::clone(&self.cache);
        let spaces = cache.view();
        let bar_points: usize = self
            .records
            .values()
            .filter(|record| record.visible() && record.series.options.render_mode == RenderMode::Bar)
            .map(|record| space_of(&record.pull, record.key, &spaces).points.len())
            .sum();
        drop(spaces);

        let view_x = if bar_points > 0 {
            let widened = expand_bounds(
                &selection,
                &ExpandOptions {
                    expand_y_with: &[],
                    extend_x_for_n_bars: Some(bar_points),
                },
            );
            (widened.min_x, widened.max_x)
        } else {
            (selection.min_x, selection.max_x)
        };

        self.partial = partial;
        if selection != self.selection {
            self.selection = selection;
            self.events
                .emit(ViewportEvent::SelectionChanged { selection });
        }

        let moved = view_x.0.to_bits() != self.view_x.0.to_bits()
            || view_x.1.to_bits() != self.view_x.1.to_bits();
        self.view_x = view_x;
        moved
    }

    /// Windows every series whose data or window changed. Returns whether
    /// anything was recomputed.
    fn update_windows(&mut self, selection_moved: bool) -> bool {
        let cache = Rc::clone(&self.cache);
        let spaces = cache.view();
        let (min_x, max_x) = self.view_x;
        let mut any = false;

        for record in self.records.values_mut() {
            let stale = record.needs_rebuild || record.needs_window;
            if !record.visible() {
                record.needs_rebuild = false;
                record.needs_window = false;
                continue;
            }
            if !(selection_moved || stale || record.selected.is_none()) {
                continue;
            }
            any = true;

            let space = space_of(&record.pull, record.key, &spaces);
            let options = WindowOptions {
                ignore_discontinuities: record.series.options.ignore_discontinuities,
                square: record.series.options.square,
            };
            let swap = if record.needs_rebuild {
                record.condensed = None;
                None
            } else {
                record.selected.take()
            };
            let mut selected =
                data_space_to_selected_space(&space.points, min_x, max_x, options, swap);

            let range_values = window_range_values(&space.aux, min_x, max_x);
            record.selected_bounds = calculate_data_bounds(
                selected.as_slice(),
                &BoundsOptions {
                    percentile: record.series.options.percentile,
                    percentile_asymmetry: record.series.options.percentile_asymmetry,
                    range_values: &range_values,
                },
            );
            record.selected = Some(selected);
            record.needs_rebuild = false;
            record.needs_window = false;
        }
        any
    }

    /// Regroups series by axis and recomputes each axis' bounds. Returns
    /// whether the axis set or any current bounds changed.
    fn update_axes(&mut self) -> bool {
        let mut groups: IndexMap<String, Vec<SeriesId>> = IndexMap::new();
        for record in self.records.values().filter(|record| record.visible()) {
            groups
                .entry(record.series.options.axis.clone())
                .or_default()
                .push(record.id);
        }

        let previous_ids: Vec<String> = self.axes.keys().cloned().collect();
        let previous_bounds: IndexMap<String, _> = self
            .axes
            .iter()
            .map(|(id, axis)| (id.clone(), axis.current_bounds))
            .collect();

        let mut axes = IndexMap::with_capacity(groups.len());
        for (axis_id, series) in groups {
            let options = self.axis_options.get(&axis_id).copied().unwrap_or_default();
            let mut axis = self
                .axes
                .shift_remove(&axis_id)
                .unwrap_or_else(|| Axis::new(axis_id.clone(), options));

            let members = series.iter().filter_map(|id| self.records.get(id));
            let mut selected = merge_bounds(members.clone().map(|record| &record.selected_bounds));
            selected.dates = self.selection.dates;

            let has_bars = members
                .clone()
                .any(|record| record.series.options.render_mode == RenderMode::Bar);
            let baseline: &[f64] = if has_bars && self.config.bar_baseline {
                &[0.0]
            } else {
                &[]
            };
            let mut current = expand_bounds(
                &selected,
                &ExpandOptions {
                    expand_y_with: baseline,
                    extend_x_for_n_bars: None,
                },
            );
            let AxisRange { min_y, max_y } = self
                .partial
                .as_ref()
                .map(|partial| partial.axis_range(&axis_id))
                .unwrap_or_default();
            if let Some(min_y) = min_y.filter(|v| v.is_finite()) {
                current.min_y = min_y;
            }
            if let Some(max_y) = max_y.filter(|v| v.is_finite()) {
                current.max_y = max_y;
            }
            current.min_x = self.view_x.0;
            current.max_x = self.view_x.1;

            axis.options = options;
            axis.series = series;
            axis.selected_data_bounds = selected;
            axis.current_bounds = scale_bounds(&current, options.scale);
            axes.insert(axis_id, axis);
        }
        self.axes = axes;

        let ids_changed = !self.axes.keys().eq(previous_ids.iter());
        if ids_changed {
            self.events.emit(ViewportEvent::AxesChanged {
                axes: self.axes.keys().cloned().collect(),
            });
        }
        let bounds_changed = ids_changed
            || self
                .axes
                .iter()
                .any(|(id, axis)| previous_bounds.get(id) != Some(&axis.current_bounds));
        if bounds_changed {
            self.events.emit(ViewportEvent::AxisBoundsChanged {
                bounds: self
                    .axes
                    .iter()
                    .map(|(id, axis)| (id.clone(), axis.current_bounds))
                    .collect(),
            });
        }
        bounds_changed
    }

    /// Condenses and projects every visible series into render space.
    fn project_all(&mut self) {
        let render_width = self.viewport.render_width();
        let height = self.viewport.render_height();
        let (min_x, max_x) = self.view_x;
        let x_scale = LinearScale::new(min_x, max_x, render_width as f64).ok();
        let projector = &*self.projector;

        for record in self.records.values_mut() {
            record.backgrounds.clear();
            let visible = record.visible();
            let selected = match record.selected.as_mut() {
                Some(selected) if visible && render_width > 0 => selected,
                _ => {
                    record.render.resize(0);
                    continue;
                }
            };

            if record.series.options.render_mode == RenderMode::Background {
                if let Some(x_scale) = x_scale {
                    record.backgrounds = background_ranges(record.id, selected.as_slice(), x_scale);
                }
                record.render.resize(0);
                continue;
            }

            let Some(axis) = self.axes.get(&record.series.options.axis) else {
                record.render.resize(0);
                continue;
            };
            let y = match axis.value_scale(height) {
                Ok(y) => y,
                Err(err) => {
                    warn!(id = %record.id, error = %err, "axis not projectable");
                    record.render.resize(0);
                    continue;
                }
            };
            let params = ProjectionParams {
                render_width,
                min_x,
                max_x,
                y,
            };

            let points = selected.as_slice();
            let swap = record.condensed.take();
            record.condensed = condense_data_space(points, render_width, swap);
            let input: &[DataPoint] = match &record.condensed {
                Some(condensed) => condensed.points(),
                None => points,
            };
            selected_space_to_render_space(projector, input, &params, &mut record.render);
        }
    }

    /// Asks pull sources for data when their `(window, width)` changed.
    fn issue_pull_requests(&mut self) {
        let render_width = self.viewport.render_width();
        let (min_x, max_x) = self
            .partial
            .as_ref()
            .map_or((None, None), |partial| (partial.min_x, partial.max_x));

        let mut fetches = Vec::new();
        for record in self.records.values_mut() {
            if !record.visible() {
                continue;
            }
            let Some(pull) = record.pull.as_mut() else {
                continue;
            };
            let request = PullRequest {
                min_x,
                max_x,
                render_width,
            };
            if pull
                .last_request
                .is_some_and(|last| last.same_as(&request))
            {
                continue;
            }
            pull.latest_ticket += 1;
            pull.last_request = Some(request);
            let reply = PullReply::new(&self.inbox, record.id.raw(), pull.latest_ticket);
            fetches.push((Rc::clone(&pull.source), request, reply));
        }

        for (source, request, reply) in fetches {
            trace!(ticket = reply.ticket(), ?request, "fetching from pull source");
            source.borrow_mut().fetch(request, reply);
        }
    }

    fn update_tooltips(&mut self) -> bool {
        let width = f64::from(self.viewport.width);
        let height = f64::from(self.viewport.height);
        let Ok(x_scale) = LinearScale::new(self.view_x.0, self.view_x.1, width) else {
            return false;
        };
        let cache = Rc::clone(&self.cache);
        let spaces = cache.view();
        let span = self.view_x.1 - self.view_x.0;

        let mut candidates = Vec::with_capacity(self.records.len());
        for record in self.records.values() {
            let options = &record.series.options;
            if !record.visible() || options.render_mode == RenderMode::Background {
                continue;
            }
            let Some(axis) = self.axes.get(&options.axis) else {
                continue;
            };
            let Ok(y_scale) = axis.value_scale(height) else {
                continue;
            };
            let bar = (options.render_mode == RenderMode::Bar).then(|| {
                let spacing = record
                    .data_bounds
                    .closest_spacing
                    .unwrap_or(self.global_bounds.closest_spacing);
                let half_width_px = if span > 0.0 {
                    spacing / 2.0 * width / span
                } else {
                    0.0
                };
                BarTarget {
                    half_width_px,
                    zero_px: y_scale.value_to_pixel(0.0).unwrap_or(height),
                }
            });
            candidates.push(TooltipCandidate {
                series: record.id,
                name: &record.series.name,
                color: options.color.as_deref(),
                points: &space_of(&record.pull, record.key, &spaces).points,
                x_scale,
                y_scale,
                always_tooltipped: options.always_tooltipped,
                bar,
            });
        }

        let tooltips = calculate_tooltip_state(
            self.cursor,
            &candidates,
            &self.saved_tooltips,
            &self.config.tooltip,
        );
        drop(candidates);
        if tooltips == self.tooltips {
            return false;
        }
        self.tooltips = tooltips;
        self.events.emit(ViewportEvent::TooltipsChanged {
            tooltips: self.tooltips.clone(),
        });
        true
    }

    fn update_context_menu(&mut self, force_emit: bool) -> bool {
        let menu = if self.context_menu.open {
            let width = f64::from(self.viewport.width);
            let height = f64::from(self.viewport.height);
            let x = LinearScale::new(self.view_x.0, self.view_x.1, width)
                .ok()
                .map(|scale| scale.pixel_to_domain(self.context_menu.pixel_x));
            let values = self
                .axes
                .iter()
                .filter_map(|(id, axis)| {
                    let scale = axis.value_scale(height).ok()?;
                    Some((id.clone(), scale.pixel_to_value(self.context_menu.pixel_y)))
                })
                .collect();
            ContextMenuState {
                open: true,
                pixel_x: self.context_menu.pixel_x,
                pixel_y: self.context_menu.pixel_y,
                x,
                values,
            }
        } else {
            ContextMenuState::default()
        };

        if menu == self.context_menu && !force_emit {
            return false;
        }
        self.context_menu = menu;
        self.events.emit(ViewportEvent::ContextMenuChanged {
            menu: self.context_menu.clone(),
        });
        true
    }

    fn update_annotations(&mut self) -> bool {
        let width = f64::from(self.viewport.width);
        let Ok(x_scale) = LinearScale::new(self.view_x.0, self.view_x.1, width) else {
            return false;
        };
        let mut placements = place_annotations(&self.annotations, x_scale);
        for placement in &mut placements {
            let shown_series = self.annotations[placement.index].series.as_deref();
            if let Some(name) = shown_series {
                let present = self
                    .records
                    .values()
                    .any(|record| record.visible() && record.series.name == name);
                placement.visible &= present;
            }
        }

        if placements == self.annotation_placements {
            return false;
        }
        self.annotation_placements = placements;
        self.events.emit(ViewportEvent::AnnotationsChanged {
            placements: self.annotation_placements.clone(),
        });
        true
    }

    fn render(&mut self) -> ChartResult<()> {
        if !self.viewport.is_valid() {
            trace!("viewport not laid out, skipping render");
            return Ok(());
        }
        let render_width = self.viewport.render_width();
        let mut frame = RenderFrame::new(self.viewport);
        for record in self.records.values().filter(|record| record.visible()) {
            let options = &record.series.options;
            if options.render_mode == RenderMode::Background {
                frame.backgrounds.extend(record.backgrounds.iter().copied());
                continue;
            }
            if record.render.width() != render_width {
                continue;
            }
            frame.series.push(SeriesLayer {
                id: record.id,
                name: &record.series.name,
                mode: options.render_mode,
                color: options.color.as_deref(),
                axis: &options.axis,
                space: &record.render,
            });
        }
        frame.annotations = &self.annotation_placements;
        frame.tooltips = &self.tooltips;
        self.renderer.render(&frame)
    }
}
