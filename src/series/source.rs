//! Push and pull data sources.
//!
//! Both kinds deliver out of band: a push batch or a pull reply only lands in
//! a queue and wakes the owning controller, which applies it on its next
//! frame. Every handle given to a source is weak, so sources outliving a
//! controller cannot reach into it.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::api::FrameSignal;

use super::SeriesData;

/// Observable data stream.
pub trait PushSource {
    /// Starts delivering batches to `sink`. Called once per shared cache
    /// entry, no matter how many controllers display the series.
    fn observe(&mut self, sink: PushSink) -> Box<dyn Subscription>;
}

/// Handle returned by [`PushSource::observe`].
pub trait Subscription {
    fn unsubscribe(&mut self);
}

/// On-demand source, asked again for every distinct `(window, width)`.
pub trait PullSource {
    /// Answer now or later through `reply`. Dropping `reply` is allowed.
    fn fetch(&mut self, request: PullRequest, reply: PullReply);
}

/// Window a pull source is asked to fill. `None` bounds are unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub min_x: Option<f64>,
    pub max_x: Option<f64>,
    pub render_width: usize,
}

impl PullRequest {
    /// Bit-exact comparison used to decide whether a new fetch is needed.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        let bits = |value: Option<f64>| value.map(f64::to_bits);
        bits(self.min_x) == bits(other.min_x)
            && bits(self.max_x) == bits(other.max_x)
            && self.render_width == other.render_width
    }
}

/// Shared state behind every [`PushSink`] of one push source.
#[derive(Default)]
pub struct SourceHub {
    pending: RefCell<Vec<Vec<Value>>>,
    listeners: RefCell<Vec<Weak<FrameSignal>>>,
    closed: Cell<bool>,
}

impl SourceHub {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub(crate) fn add_listener(&self, signal: Weak<FrameSignal>) {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|listener| listener.strong_count() > 0);
        if !listeners.iter().any(|listener| listener.ptr_eq(&signal)) {
            listeners.push(signal);
        }
    }

    pub(crate) fn remove_listener(&self, signal: &Weak<FrameSignal>) {
        self.listeners
            .borrow_mut()
            .retain(|listener| !listener.ptr_eq(signal) && listener.strong_count() > 0);
    }

    pub(crate) fn take_pending(&self) -> Vec<Vec<Value>> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    pub(crate) fn close(&self) {
        self.closed.set(true);
        self.pending.borrow_mut().clear();
        self.listeners.borrow_mut().clear();
    }

    fn deliver(&self, batch: Vec<Value>) -> bool {
        if self.closed.get() {
            return false;
        }
        self.pending.borrow_mut().push(batch);
        // Collect first: a scheduler may re-enter and register listeners.
        let signals: Vec<Rc<FrameSignal>> = self
            .listeners
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for signal in signals {
            signal.request();
        }
        true
    }
}

/// Write end handed to [`PushSource::observe`].
#[derive(Clone)]
pub struct PushSink {
    hub: Weak<SourceHub>,
}

impl PushSink {
    pub(crate) fn new(hub: &Rc<SourceHub>) -> Self {
        Self {
            hub: Rc::downgrade(hub),
        }
    }

    /// Queues a batch of inline values (same shapes as inline series data).
    ///
    /// Returns `false` once every controller using the source is gone.
    pub fn push(&self, batch: Vec<Value>) -> bool {
        match self.hub.upgrade() {
            Some(hub) => hub.deliver(batch),
            None => {
                trace!("push after source was released, dropping batch");
                false
            }
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.hub
            .upgrade()
            .is_some_and(|hub| !hub.is_closed())
    }
}

/// Pull reply queued for a controller.
pub(crate) struct PullDelivery {
    pub series: u64,
    pub ticket: u64,
    pub data: SeriesData,
}

/// Per-controller queue of pull replies.
pub struct SourceInbox {
    replies: RefCell<Vec<PullDelivery>>,
    signal: Weak<FrameSignal>,
    closed: Cell<bool>,
}

impl SourceInbox {
    pub(crate) fn new(signal: &Rc<FrameSignal>) -> Rc<Self> {
        Rc::new(Self {
            replies: RefCell::new(Vec::new()),
            signal: Rc::downgrade(signal),
            closed: Cell::new(false),
        })
    }

    pub(crate) fn take(&self) -> Vec<PullDelivery> {
        std::mem::take(&mut *self.replies.borrow_mut())
    }

    pub(crate) fn close(&self) {
        self.closed.set(true);
        self.replies.borrow_mut().clear();
    }
}

/// One-shot answer handle for a [`PullRequest`].
pub struct PullReply {
    inbox: Weak<SourceInbox>,
    series: u64,
    ticket: u64,
}

impl PullReply {
    pub(crate) fn new(inbox: &Rc<SourceInbox>, series: u64, ticket: u64) -> Self {
        Self {
            inbox: Rc::downgrade(inbox),
            series,
            ticket,
        }
    }

    #[must_use]
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Delivers the fetched data. Returns `false` when the controller was
    /// disposed; newer requests make this reply stale, which is only
    /// detected when the controller applies it.
    pub fn resolve(self, data: SeriesData) -> bool {
        let Some(inbox) = self.inbox.upgrade() else {
            trace!(ticket = self.ticket, "pull reply after dispose, dropping");
            return false;
        };
        if inbox.closed.get() {
            return false;
        }
        inbox.replies.borrow_mut().push(PullDelivery {
            series: self.series,
            ticket: self.ticket,
            data,
        });
        if let Some(signal) = inbox.signal.upgrade() {
            signal.request();
        }
        true
    }
}
