use std::sync::{Arc, Mutex};

use tracing::debug;

use super::{lock, Entity, EntityId, LifecycleListener};

/// The live entity set and the pending-destroy queue owned by the main loop.
///
/// Construction and destroy requests may arrive from any thread. Commits are
/// only performed by the loop through [`EntityStore::flush_pending_destroys`].
#[derive(Default)]
pub struct EntityStore {
    live: Mutex<Vec<Arc<Entity>>>,
    pending_destroy: Mutex<Vec<Arc<Entity>>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs an entity and admits it into the live set.
    pub fn construct(self: &Arc<Self>, name: impl Into<String>) -> Arc<Entity> {
        Entity::spawn(self, name)
    }

    /// Requests destruction of a live entity by id.
    ///
    /// Returns `false` when the id is unknown or destruction was already requested.
    pub fn request_destroy(&self, id: EntityId) -> bool {
        match self.get(id) {
            Some(entity) => entity.request_destroy(),
            None => false,
        }
    }

    /// Requests destruction of every entity currently in the live set.
    pub fn request_destroy_all(&self) -> usize {
        self.live_entities()
            .iter()
            .filter(|entity| entity.request_destroy())
            .count()
    }

    pub fn get(&self, id: EntityId) -> Option<Arc<Entity>> {
        lock(&self.live)
            .iter()
            .find(|entity| entity.id() == id)
            .cloned()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        lock(&self.live).iter().any(|entity| entity.id() == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<Entity>> {
        lock(&self.live)
            .iter()
            .find(|entity| entity.name() == name)
            .cloned()
    }

    /// Snapshot of the live set in construction order.
    pub fn live_entities(&self) -> Vec<Arc<Entity>> {
        lock(&self.live).clone()
    }

    pub fn live_count(&self) -> usize {
        lock(&self.live).len()
    }

    pub fn pending_destroy_count(&self) -> usize {
        lock(&self.pending_destroy).len()
    }

    /// Commits every queued destruction and returns how many were committed.
    ///
    /// Requests raised while committing (e.g. from a component's release hook)
    /// stay queued for the next flush.
    pub(crate) fn flush_pending_destroys(&self) -> usize {
        let pending = std::mem::take(&mut *lock(&self.pending_destroy));
        let committed = pending
            .iter()
            .filter(|entity| entity.commit_destroy())
            .count();
        if committed > 0 {
            debug!(target: "framecore", committed, "committed entity destructions");
        }
        committed
    }
}

impl LifecycleListener for EntityStore {
    fn on_constructed(&self, entity: &Arc<Entity>) {
        let mut live = lock(&self.live);
        if entity.admit() {
            live.push(Arc::clone(entity));
        }
    }

    fn on_destroy_requested(&self, entity: &Arc<Entity>) {
        lock(&self.pending_destroy).push(Arc::clone(entity));
    }

    fn on_destroy_committed(&self, entity: &Arc<Entity>) {
        lock(&self.live).retain(|live| live.id() != entity.id());
    }
}
