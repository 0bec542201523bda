//! Data spaces shared by every controller that shows the same series.
//!
//! Entries are keyed by the series' `Rc` allocation and hold a clone of that
//! `Rc`, so a key cannot be reused while its entry exists. Within a cycle an
//! entry only grows at the end; anything else (out-of-order batches) bumps
//! the generation, which tells controllers their window swaps are invalid.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::ChartResult;
use crate::series::{
    DataSpace, EnumMap, PushSink, Series, SeriesAux, SeriesData, SeriesShape, SourceHub,
    Subscription, infer_inline_shape, infer_series_shape, normalize_inline,
    simple_series_to_data_space,
};

use super::FrameSignal;

pub(crate) type SeriesKey = usize;

pub(crate) fn series_key(series: &Rc<Series>) -> SeriesKey {
    Rc::as_ptr(series) as *const () as usize
}

static EMPTY_SPACE: DataSpace = DataSpace {
    points: Vec::new(),
    dates: false,
    aux: SeriesAux::None,
};

/// Change marker of one entry: `len` grows on appends, `generation` changes
/// on anything that invalidates previously derived spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheVersion {
    pub generation: u64,
    pub len: usize,
}

struct CacheEntry {
    series: Rc<Series>,
    shape: SeriesShape,
    /// Shape of push batches, fixed by the first non-empty batch.
    batch_shape: Option<SeriesShape>,
    space: DataSpace,
    generation: u64,
    users: usize,
    enums: EnumMap,
    implicit_index: usize,
    hub: Option<Rc<SourceHub>>,
    subscription: Option<Box<dyn Subscription>>,
}

impl CacheEntry {
    fn version(&self) -> CacheVersion {
        CacheVersion {
            generation: self.generation,
            len: self.space.points.len(),
        }
    }
}

#[derive(Default)]
pub struct DataCache {
    entries: RefCell<IndexMap<SeriesKey, CacheEntry>>,
}

impl DataCache {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    #[must_use]
    pub fn contains(&self, series: &Rc<Series>) -> bool {
        self.entries.borrow().contains_key(&series_key(series))
    }

    /// Number of controllers currently using `series`.
    #[must_use]
    pub fn users(&self, series: &Rc<Series>) -> usize {
        self.entries
            .borrow()
            .get(&series_key(series))
            .map_or(0, |entry| entry.users)
    }

    #[must_use]
    pub fn version(&self, series: &Rc<Series>) -> Option<CacheVersion> {
        self.version_of(series_key(series))
    }

    pub(crate) fn version_of(&self, key: SeriesKey) -> Option<CacheVersion> {
        self.entries.borrow().get(&key).map(CacheEntry::version)
    }

    /// Registers one more user of `series`, normalizing it on first use and
    /// subscribing to push sources exactly once.
    pub(crate) fn acquire(
        &self,
        series: &Rc<Series>,
        signal: &Rc<FrameSignal>,
    ) -> ChartResult<SeriesShape> {
        let key = series_key(series);
        if let Some(entry) = self.entries.borrow_mut().get_mut(&key) {
            entry.users += 1;
            if let Some(hub) = &entry.hub {
                hub.add_listener(Rc::downgrade(signal));
            }
            return Ok(entry.shape);
        }

        let shape = infer_series_shape(&series.name, &series.data)?;
        let mut enums = EnumMap::new();
        let space = simple_series_to_data_space(series, &mut enums)?;
        let implicit_index = match &series.data {
            SeriesData::Inline(values) => values.len(),
            _ => 0,
        };

        let hub = matches!(shape, SeriesShape::Push).then(|| {
            let hub = SourceHub::new();
            hub.add_listener(Rc::downgrade(signal));
            hub
        });

        self.entries.borrow_mut().insert(
            key,
            CacheEntry {
                series: Rc::clone(series),
                shape,
                batch_shape: None,
                space,
                generation: 0,
                users: 1,
                enums,
                implicit_index,
                hub: hub.clone(),
                subscription: None,
            },
        );

        // Observe outside the borrow: sources may push synchronously.
        if let (SeriesData::Push(source), Some(hub)) = (&series.data, hub) {
            let subscription = source.borrow_mut().observe(PushSink::new(&hub));
            if let Some(entry) = self.entries.borrow_mut().get_mut(&key) {
                entry.subscription = Some(subscription);
            }
            debug!(series = %series.name, "subscribed to push source");
        }
        Ok(shape)
    }

    /// Drops one user; the last one unsubscribes and evicts the entry.
    pub(crate) fn release(&self, key: SeriesKey, signal: &Weak<FrameSignal>) {
        let evicted = {
            let mut entries = self.entries.borrow_mut();
            let Some(entry) = entries.get_mut(&key) else {
                return;
            };
            if let Some(hub) = &entry.hub {
                hub.remove_listener(signal);
            }
            entry.users = entry.users.saturating_sub(1);
            if entry.users == 0 {
                entries.shift_remove(&key)
            } else {
                None
            }
        };

        if let Some(mut entry) = evicted {
            if let Some(mut subscription) = entry.subscription.take() {
                subscription.unsubscribe();
                debug!(series = %entry.series.name, "unsubscribed from push source");
            }
            if let Some(hub) = entry.hub.take() {
                hub.close();
            }
        }
    }

    /// Applies queued push batches and returns the resulting version.
    pub(crate) fn sync(&self, key: SeriesKey) -> Option<CacheVersion> {
        let mut entries = self.entries.borrow_mut();
        let entry = entries.get_mut(&key)?;
        let batches = entry
            .hub
            .as_ref()
            .map(|hub| hub.take_pending())
            .unwrap_or_default();

        for batch in batches {
            let shape = match entry.batch_shape {
                Some(shape) => shape,
                None => match infer_inline_shape(&entry.series.name, &batch) {
                    Ok(SeriesShape::Empty) => continue,
                    Ok(shape) => {
                        entry.batch_shape = Some(shape);
                        shape
                    }
                    Err(err) => {
                        warn!(series = %entry.series.name, error = %err, "dropping push batch");
                        continue;
                    }
                },
            };
            let normalized = normalize_inline(
                &entry.series.name,
                &entry.series.options,
                shape,
                &batch,
                &mut entry.enums,
                entry.implicit_index,
            );
            match normalized {
                Ok(space) => {
                    entry.implicit_index += batch.len();
                    if !entry.space.append(space, entry.series.options.square) {
                        entry.generation += 1;
                        debug!(
                            series = %entry.series.name,
                            generation = entry.generation,
                            "out-of-order push batch, data space re-sorted"
                        );
                    }
                }
                Err(err) => {
                    warn!(series = %entry.series.name, error = %err, "dropping push batch");
                }
            }
        }
        Some(entry.version())
    }

    /// Read-only view over every entry, held for the read stages of a frame.
    pub(crate) fn view(&self) -> SpaceView<'_> {
        SpaceView {
            entries: self.entries.borrow(),
        }
    }

    /// Runs `f` on the data space of `key` (empty when unknown).
    pub(crate) fn with_space<T>(&self, key: SeriesKey, f: impl FnOnce(&DataSpace) -> T) -> T {
        let entries = self.entries.borrow();
        match entries.get(&key) {
            Some(entry) => f(&entry.space),
            None => f(&EMPTY_SPACE),
        }
    }
}

pub(crate) struct SpaceView<'a> {
    entries: Ref<'a, IndexMap<SeriesKey, CacheEntry>>,
}

impl SpaceView<'_> {
    pub(crate) fn get(&self, key: SeriesKey) -> &DataSpace {
        self.entries
            .get(&key)
            .map_or(&EMPTY_SPACE, |entry| &entry.space)
    }
}
