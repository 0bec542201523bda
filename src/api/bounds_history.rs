use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::Bounds;

/// Y override for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct AxisRange {
    pub min_y: Option<f64>,
    pub max_y: Option<f64>,
}

/// Constraint returned by a bounds calculator; unset fields follow the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PartialBounds {
    pub min_x: Option<f64>,
    pub max_x: Option<f64>,
    pub min_y: Option<f64>,
    pub max_y: Option<f64>,
    #[serde(default)]
    pub by_axis: IndexMap<String, AxisRange>,
}

impl PartialBounds {
    #[must_use]
    pub fn x_range(min_x: f64, max_x: f64) -> Self {
        Self {
            min_x: Some(min_x),
            max_x: Some(max_x),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_axis(mut self, axis: impl Into<String>, range: AxisRange) -> Self {
        self.by_axis.insert(axis.into(), range);
        self
    }

    /// Y override for `axis`: the per-axis entry wins over the global fields.
    #[must_use]
    pub fn axis_range(&self, axis: &str) -> AxisRange {
        let specific = self.by_axis.get(axis).copied().unwrap_or_default();
        AxisRange {
            min_y: specific.min_y.or(self.min_y),
            max_y: specific.max_y.or(self.max_y),
        }
    }
}

/// Maps the global data extent to the desired window. `None` shows all data.
pub type BoundsCalculator = Rc<dyn Fn(&Bounds) -> Option<PartialBounds>>;

/// Shows every sample.
#[must_use]
pub fn show_all() -> BoundsCalculator {
    Rc::new(|_: &Bounds| None)
}

/// Fixed x window.
#[must_use]
pub fn fixed_window(min_x: f64, max_x: f64) -> BoundsCalculator {
    Rc::new(move |_: &Bounds| Some(PartialBounds::x_range(min_x, max_x)))
}

/// Live tail: the last `span` x units, following appended data.
#[must_use]
pub fn last_span(span: f64) -> BoundsCalculator {
    Rc::new(move |global: &Bounds| Some(PartialBounds::x_range(global.max_x - span, global.max_x)))
}

#[derive(Clone)]
struct HistoryEntry {
    calculator: BoundsCalculator,
    /// Host time of a debounced push, `None` for explicit pushes.
    debounced_at: Option<f64>,
}

/// Linear undo/redo stack of bounds calculators.
#[derive(Clone)]
pub struct BoundsHistory {
    entries: Vec<HistoryEntry>,
    position: usize,
    debounce_ms: f64,
}

impl fmt::Debug for BoundsHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundsHistory")
            .field("len", &self.entries.len())
            .field("position", &self.position)
            .field("debounce_ms", &self.debounce_ms)
            .finish()
    }
}

impl BoundsHistory {
    #[must_use]
    pub fn new(initial: BoundsCalculator, debounce_ms: f64) -> Self {
        Self {
            entries: vec![HistoryEntry {
                calculator: initial,
                debounced_at: None,
            }],
            position: 0,
            debounce_ms,
        }
    }

    #[must_use]
    pub fn current(&self) -> BoundsCalculator {
        Rc::clone(&self.entries[self.position].calculator)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.position > 0
    }

    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        self.position + 1 < self.entries.len()
    }

    /// Pushes a new entry after the current one, discarding forward entries.
    pub fn push(&mut self, calculator: BoundsCalculator) {
        self.entries.truncate(self.position + 1);
        self.entries.push(HistoryEntry {
            calculator,
            debounced_at: None,
        });
        self.position = self.entries.len() - 1;
    }

    /// Like [`Self::push`], but replaces the tip when it is itself a debounced
    /// push made less than the debounce window before `now_ms`. Continuous
    /// drags therefore leave one history entry.
    ///
    /// Returns `true` when a new entry was created.
    pub fn push_debounced(&mut self, calculator: BoundsCalculator, now_ms: f64) -> bool {
        let at_tip = self.position + 1 == self.entries.len();
        let replace = at_tip
            && self.position > 0
            && self.entries[self.position]
                .debounced_at
                .is_some_and(|at| now_ms - at < self.debounce_ms);

        if replace {
            self.entries[self.position] = HistoryEntry {
                calculator,
                debounced_at: Some(now_ms),
            };
            return false;
        }

        self.push(calculator);
        self.entries[self.position].debounced_at = Some(now_ms);
        true
    }

    pub fn back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.position -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.position += 1;
        true
    }
}

impl Default for BoundsHistory {
    fn default() -> Self {
        Self::new(show_all(), 0.0)
    }
}
