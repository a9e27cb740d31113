use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    entity::Entity,
    system::{FrameContext, System},
};

/// Seeded workload that keeps the entity set moving.
///
/// Every frame it spawns `spawn_per_frame` entities and asks each entity it
/// owns to die with probability `destroy_chance`.
pub struct EntityChurnSystem {
    rng: ChaCha8Rng,
    spawn_per_frame: usize,
    destroy_chance: f64,
    owned: Vec<Arc<Entity>>,
    spawned: u64,
    requested: u64,
}

impl EntityChurnSystem {
    pub fn new(seed: u64, spawn_per_frame: usize, destroy_chance: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            spawn_per_frame,
            destroy_chance: destroy_chance.clamp(0.0, 1.0),
            owned: Vec::new(),
            spawned: 0,
            requested: 0,
        }
    }

    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn destroy_requests(&self) -> u64 {
        self.requested
    }
}

impl System for EntityChurnSystem {
    fn name(&self) -> &str {
        "entity_churn"
    }

    fn update(&mut self, ctx: &FrameContext<'_>, _delta_seconds: f32) -> Result<()> {
        self.owned.retain(|entity| entity.is_live());
        for entity in &self.owned {
            if self.rng.gen_bool(self.destroy_chance) && entity.request_destroy() {
                self.requested += 1;
            }
        }

        for _ in 0..self.spawn_per_frame {
            self.spawned += 1;
            let entity = ctx
                .entities()
                .construct(format!("churn-{}", self.spawned));
            self.owned.push(entity);
        }
        Ok(())
    }

    fn on_new_scene_loaded(&mut self) -> Result<()> {
        self.owned.clear();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
