use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{Bounds, Viewport};

use super::{AnnotationPlacement, ContextMenuState, SeriesId, Tooltip};

/// Names of the notifications a controller emits, at most once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    SeriesChanged,
    AxesChanged,
    SelectionChanged,
    AxisBoundsChanged,
    TooltipsChanged,
    AnnotationsChanged,
    BoundHistoryChanged,
    SizeChanged,
    ContextMenuChanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewportEvent {
    SeriesChanged {
        series: Vec<SeriesId>,
    },
    AxesChanged {
        axes: Vec<String>,
    },
    /// Global selection after applying the bounds calculator.
    SelectionChanged {
        selection: Bounds,
    },
    /// Current (expanded, scaled) bounds per axis id.
    AxisBoundsChanged {
        bounds: IndexMap<String, Bounds>,
    },
    TooltipsChanged {
        tooltips: Vec<Tooltip>,
    },
    AnnotationsChanged {
        placements: Vec<AnnotationPlacement>,
    },
    BoundHistoryChanged {
        position: usize,
        len: usize,
    },
    SizeChanged {
        viewport: Viewport,
    },
    ContextMenuChanged {
        menu: ContextMenuState,
    },
}

impl ViewportEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::SeriesChanged { .. } => EventKind::SeriesChanged,
            Self::AxesChanged { .. } => EventKind::AxesChanged,
            Self::SelectionChanged { .. } => EventKind::SelectionChanged,
            Self::AxisBoundsChanged { .. } => EventKind::AxisBoundsChanged,
            Self::TooltipsChanged { .. } => EventKind::TooltipsChanged,
            Self::AnnotationsChanged { .. } => EventKind::AnnotationsChanged,
            Self::BoundHistoryChanged { .. } => EventKind::BoundHistoryChanged,
            Self::SizeChanged { .. } => EventKind::SizeChanged,
            Self::ContextMenuChanged { .. } => EventKind::ContextMenuChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(u64);

impl ListenerId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

pub type EventListener = Box<dyn FnMut(&ViewportEvent)>;

/// Typed listener registry with deferred, per-kind coalesced delivery.
///
/// `emit` only queues; a later event of the same kind replaces the queued
/// one. `flush` delivers in first-emitted order.
#[derive(Default)]
pub struct EventDispatcher {
    next_id: u64,
    listeners: IndexMap<ListenerId, (EventKind, EventListener)>,
    pending: IndexMap<EventKind, ViewportEvent>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: EventKind, listener: EventListener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.insert(id, (kind, listener));
        id
    }

    /// Removes a listener; returns `false` when it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.shift_remove(&id).is_some()
    }

    pub fn emit(&mut self, event: ViewportEvent) {
        self.pending.insert(event.kind(), event);
    }

    /// Delivers every queued event; returns how many were queued.
    pub fn flush(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for (kind, event) in pending {
            for (listener_kind, listener) in self.listeners.values_mut() {
                if *listener_kind == kind {
                    listener(&event);
                }
            }
        }
        count
    }

    #[must_use]
    pub fn pending_kinds(&self) -> Vec<EventKind> {
        self.pending.keys().copied().collect()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drops listeners and queued events.
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.pending.clear();
    }
}
