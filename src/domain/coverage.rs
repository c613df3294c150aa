// Coverage windows - which stretch of map time an entity has predictions for
use super::satellite::TrackedEntity;
use super::time::{MapDuration, MapInstant};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoverageWindow {
    start: MapInstant,
    end: MapInstant,
}

impl CoverageWindow {
    /// `None` when `start` is after `end`.
    pub fn new(start: MapInstant, end: MapInstant) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn starting_at(start: MapInstant, length: MapDuration) -> Self {
        Self {
            start,
            end: start + length,
        }
    }

    pub fn ending_at(end: MapInstant, length: MapDuration) -> Self {
        Self {
            start: end - length,
            end,
        }
    }

    pub fn centered_on(center: MapInstant, half_width: MapDuration) -> Self {
        Self {
            start: center - half_width,
            end: center + half_width,
        }
    }

    pub fn start(&self) -> MapInstant {
        self.start
    }

    pub fn end(&self) -> MapInstant {
        self.end
    }

    pub fn contains(&self, other: &CoverageWindow) -> bool {
        self.start <= other.start && self.end >= other.end
    }
}

impl fmt::Display for CoverageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Whether the entity's cached predictions fully contain `window`.
///
/// Partial overlap counts as not covered: the scheduler then re-fetches a whole chunk
/// instead of patching the edges.
pub fn covers(entity: &TrackedEntity, window: &CoverageWindow) -> bool {
    entity
        .coverage
        .as_ref()
        .is_some_and(|cached| cached.contains(window))
}
