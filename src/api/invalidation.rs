use serde::{Deserialize, Serialize};

/// Subsystem marked dirty by a mutation; each gates one stage of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationTopic {
    /// Series set or identity changed: full data-space rebuild.
    Series,
    /// Samples appended to existing series.
    Data,
    /// Bounds calculator or history position changed.
    Selection,
    Size,
    Axes,
    Tooltip,
    ContextMenu,
    Annotations,
    History,
    Render,
}

impl InvalidationTopic {
    const fn bit(self) -> u16 {
        match self {
            Self::Series => 1 << 0,
            Self::Data => 1 << 1,
            Self::Selection => 1 << 2,
            Self::Size => 1 << 3,
            Self::Axes => 1 << 4,
            Self::Tooltip => 1 << 5,
            Self::ContextMenu => 1 << 6,
            Self::Annotations => 1 << 7,
            Self::History => 1 << 8,
            Self::Render => 1 << 9,
        }
    }
}

/// Bitmask of dirty topics accumulated between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InvalidationTopics {
    bits: u16,
}

impl InvalidationTopics {
    const ALL_BITS: u16 = InvalidationTopic::Series.bit()
        | InvalidationTopic::Data.bit()
        | InvalidationTopic::Selection.bit()
        | InvalidationTopic::Size.bit()
        | InvalidationTopic::Axes.bit()
        | InvalidationTopic::Tooltip.bit()
        | InvalidationTopic::ContextMenu.bit()
        | InvalidationTopic::Annotations.bit()
        | InvalidationTopic::History.bit()
        | InvalidationTopic::Render.bit();

    #[must_use]
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    #[must_use]
    pub const fn all() -> Self {
        Self {
            bits: Self::ALL_BITS,
        }
    }

    #[must_use]
    pub const fn from_topic(topic: InvalidationTopic) -> Self {
        Self { bits: topic.bit() }
    }

    #[must_use]
    pub const fn with_topic(self, topic: InvalidationTopic) -> Self {
        Self {
            bits: self.bits | topic.bit(),
        }
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.bits & other.bits) != 0
    }

    #[must_use]
    pub const fn contains_topic(self, topic: InvalidationTopic) -> bool {
        self.intersects(Self::from_topic(topic))
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.bits == 0
    }

    pub fn insert(&mut self, topic: InvalidationTopic) {
        self.bits |= topic.bit();
    }

    /// Returns the current set and clears it.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl From<InvalidationTopic> for InvalidationTopics {
    fn from(topic: InvalidationTopic) -> Self {
        Self::from_topic(topic)
    }
}

/// Topics whose change means every selected space must be recomputed.
pub(crate) const WINDOW_TOPICS: InvalidationTopics = InvalidationTopics::from_topic(
    InvalidationTopic::Series,
)
.with_topic(InvalidationTopic::Data)
.with_topic(InvalidationTopic::Selection);

/// Topics that require re-projection into render space.
pub(crate) const PROJECTION_TOPICS: InvalidationTopics = WINDOW_TOPICS
    .with_topic(InvalidationTopic::Size)
    .with_topic(InvalidationTopic::Axes);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_topics_cover_window_topics() {
        assert!(PROJECTION_TOPICS.contains_topic(InvalidationTopic::Data));
        assert!(PROJECTION_TOPICS.contains_topic(InvalidationTopic::Size));
        assert!(!WINDOW_TOPICS.contains_topic(InvalidationTopic::Tooltip));
    }

    #[test]
    fn take_clears_the_mask() {
        let mut topics = InvalidationTopics::none();
        topics.insert(InvalidationTopic::Tooltip);
        let taken = topics.take();
        assert!(taken.contains_topic(InvalidationTopic::Tooltip));
        assert!(topics.is_none());
    }
}
