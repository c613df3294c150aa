// Dashboard domain model
use super::location::Location;
use super::satellite::{Satellite, TrackedEntity};

/// What is currently being presented: the satellites to track and the locations to mark.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub id: i64,
    pub name: String,
    pub satellites: Vec<Satellite>,
    pub locations: Vec<Location>,
}

impl Dashboard {
    pub fn new(id: i64, name: String, satellites: Vec<Satellite>, locations: Vec<Location>) -> Self {
        Self {
            id,
            name,
            satellites,
            locations,
        }
    }

    /// Fresh tracked entities for every satellite, with nothing cached yet.
    pub fn tracked_entities(&self) -> Vec<TrackedEntity> {
        self.satellites
            .iter()
            .cloned()
            .map(TrackedEntity::new)
            .collect()
    }
}
