// Capability trait for reading the map clock
use crate::domain::time::{MapInstant, TimeScale};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    #[error("map clock unavailable: {0}")]
    Unavailable(String),
}

pub trait MapClock: Send + Sync {
    fn current_map_instant(&self) -> Result<MapInstant, ClockError>;

    fn current_time_scale(&self) -> Result<TimeScale, ClockError>;
}
