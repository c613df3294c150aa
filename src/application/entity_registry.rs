// Entity registry - the single owner of every tracked entity
use crate::domain::prediction::PredictedPath;
use crate::domain::satellite::TrackedEntity;
use crate::error::StaleEntityError;
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

struct Entry {
    generation: u64,
    fetch_in_flight: bool,
    entity: TrackedEntity,
}

#[derive(Default)]
struct Entries {
    entries: Vec<Entry>,
    next_generation: u64,
}

impl Entries {
    fn position(&self, id: Uuid) -> Option<usize> {
        self.entries.iter().position(|e| e.entity.id() == id)
    }

    fn entry_mut(&mut self, id: Uuid, generation: u64) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|e| e.entity.id() == id && e.generation == generation)
    }

    fn new_entry(&mut self, entity: TrackedEntity) -> Entry {
        self.next_generation += 1;
        Entry {
            generation: self.next_generation,
            fetch_in_flight: false,
            entity,
        }
    }
}

/// Outcome of asking for permission to fetch an entity's predictions.
pub enum FetchSlot {
    Acquired(FetchLease),
    InFlight,
    Missing,
}

/// Exclusive right to write one entity's predictions. Releases the in-flight flag on drop,
/// whether or not the fetch succeeded.
pub struct FetchLease {
    registry: Arc<EntityRegistry>,
    entity_id: Uuid,
    generation: u64,
}

impl FetchLease {
    pub fn entity_id(&self) -> Uuid {
        self.entity_id
    }

    /// Replace the entity's coverage and samples with `path`.
    ///
    /// Fails when the entity was removed (or removed and added again) after the lease was taken.
    pub fn apply(&self, path: &PredictedPath) -> Result<TrackedEntity, StaleEntityError> {
        let mut guard = self.registry.inner.write();
        let entry = guard
            .entry_mut(self.entity_id, self.generation)
            .ok_or(StaleEntityError {
                entity_id: self.entity_id,
            })?;

        entry
            .entity
            .replace_predictions(path.window, Arc::clone(&path.samples));
        Ok(entry.entity.clone())
    }
}

impl Drop for FetchLease {
    fn drop(&mut self) {
        let mut guard = self.registry.inner.write();
        if let Some(entry) = guard.entry_mut(self.entity_id, self.generation) {
            entry.fetch_in_flight = false;
        }
    }
}

#[derive(Default)]
pub struct EntityRegistry {
    inner: RwLock<Entries>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity`. An entity with the same id is replaced in place and loses its cache.
    pub fn add(&self, entity: TrackedEntity) {
        let mut guard = self.inner.write();
        let entry = guard.new_entry(entity);
        match guard.position(entry.entity.id()) {
            Some(index) => guard.entries[index] = entry,
            None => guard.entries.push(entry),
        }
    }

    pub fn remove(&self, id: Uuid) -> Option<TrackedEntity> {
        let mut guard = self.inner.write();
        let index = guard.position(id)?;
        Some(guard.entries.remove(index).entity)
    }

    pub fn replace_all(&self, entities: Vec<TrackedEntity>) {
        let mut guard = self.inner.write();
        guard.entries.clear();
        for entity in entities {
            let entry = guard.new_entry(entity);
            guard.entries.push(entry);
        }
    }

    /// Snapshot of every entity in registration order. Later changes don't affect it.
    pub fn list(&self) -> Vec<TrackedEntity> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|e| e.entity.clone())
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Option<TrackedEntity> {
        let guard = self.inner.read();
        guard
            .entries
            .iter()
            .find(|e| e.entity.id() == id)
            .map(|e| e.entity.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn is_fetch_in_flight(&self, id: Uuid) -> bool {
        self.inner
            .read()
            .entries
            .iter()
            .any(|e| e.entity.id() == id && e.fetch_in_flight)
    }

    pub fn try_begin_fetch(self: &Arc<Self>, id: Uuid) -> FetchSlot {
        let mut guard = self.inner.write();
        let Some(index) = guard.position(id) else {
            return FetchSlot::Missing;
        };

        let entry = &mut guard.entries[index];
        if entry.fetch_in_flight {
            return FetchSlot::InFlight;
        }
        entry.fetch_in_flight = true;

        FetchSlot::Acquired(FetchLease {
            registry: Arc::clone(self),
            entity_id: id,
            generation: entry.generation,
        })
    }
}
