use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// One dirty-frame cycle: `Idle -> FrameRequested -> Processing -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FrameState {
    #[default]
    Idle,
    FrameRequested,
    Processing,
}

/// Host hook that arranges for `process_frame` to run on the next display
/// frame. Called at most once per pending frame.
pub trait FrameScheduler {
    fn request_frame(&self);
}

/// Scheduler that only records requests. Hosts and tests call
/// `process_frame` themselves.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    requests: Cell<usize>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

/// Frame-state cell shared between a controller and its data sources.
///
/// Sources hold it weakly, so a disposed controller simply stops receiving
/// wake-ups.
pub struct FrameSignal {
    state: Cell<FrameState>,
    requested_while_processing: Cell<bool>,
    scheduler: Rc<dyn FrameScheduler>,
}

impl FrameSignal {
    #[must_use]
    pub fn new(scheduler: Rc<dyn FrameScheduler>) -> Rc<Self> {
        Rc::new(Self {
            state: Cell::new(FrameState::Idle),
            requested_while_processing: Cell::new(false),
            scheduler,
        })
    }

    #[must_use]
    pub fn state(&self) -> FrameState {
        self.state.get()
    }

    /// Requests a frame. Returns `true` when the scheduler was invoked;
    /// further requests collapse into the pending one.
    pub fn request(&self) -> bool {
        match self.state.get() {
            FrameState::Idle => {
                self.state.set(FrameState::FrameRequested);
                self.scheduler.request_frame();
                true
            }
            FrameState::FrameRequested => false,
            FrameState::Processing => {
                self.requested_while_processing.set(true);
                false
            }
        }
    }

    pub(crate) fn begin(&self) {
        self.state.set(FrameState::Processing);
    }

    /// Ends the cycle, re-requesting when something arrived mid-cycle.
    pub(crate) fn finish(&self) {
        self.state.set(FrameState::Idle);
        if self.requested_while_processing.replace(false) {
            self.request();
        }
    }
}
