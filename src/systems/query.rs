use std::any::Any;
use std::sync::Arc;

use anyhow::Result;

use crate::{
    entity::{Entity, EntityId, EntityStore},
    system::{FrameContext, System},
};

/// Read access to the live entity set for systems that look it up by kind.
pub struct EntityQuerySystem {
    store: Arc<EntityStore>,
}

impl EntityQuerySystem {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    pub fn live_entities(&self) -> Vec<Arc<Entity>> {
        self.store.live_entities()
    }

    pub fn live_count(&self) -> usize {
        self.store.live_count()
    }

    pub fn find(&self, id: EntityId) -> Option<Arc<Entity>> {
        self.store.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<Entity>> {
        self.store.find_by_name(name)
    }
}

impl System for EntityQuerySystem {
    fn name(&self) -> &str {
        "entity_query"
    }

    fn update(&mut self, _ctx: &FrameContext<'_>, _delta_seconds: f32) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
