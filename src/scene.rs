use std::sync::Arc;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::entity::{Component, Entity, EntityStore};

/// Something that can describe the entity set of a newly active scene.
///
/// `populate` only stages entities. Nothing reaches the live set unless the
/// whole scene populated successfully.
pub trait Scene {
    fn name(&self) -> &str;
    fn populate(&self, scene: &mut SceneBuilder) -> Result<()>;
}

/// Picks the next scene to load.
///
/// Registered under the `dyn SceneLoader` kind. After every frame's dispatch
/// the loop takes the pending scene, if any, and loads it with
/// [`Game::load_scene`](crate::Game::load_scene).
pub trait SceneLoader {
    fn take_pending_scene(&mut self) -> Option<Box<dyn Scene>>;
}

/// An entity waiting to be constructed when its scene is committed.
pub struct StagedEntity {
    name: String,
    components: Vec<Box<dyn Component>>,
}

impl StagedEntity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_component(&mut self, component: impl Component + 'static) -> &mut Self {
        self.components.push(Box::new(component));
        self
    }
}

/// Entities staged by [`Scene::populate`].
#[derive(Default)]
pub struct SceneBuilder {
    staged: Vec<StagedEntity>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, name: impl Into<String>) -> &mut StagedEntity {
        let index = self.staged.len();
        self.staged.push(StagedEntity {
            name: name.into(),
            components: Vec::new(),
        });
        &mut self.staged[index]
    }

    pub fn staged(&self) -> impl Iterator<Item = &StagedEntity> {
        self.staged.iter()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Constructs every staged entity in staging order.
    pub(crate) fn commit(self, entities: &Arc<EntityStore>) -> Vec<Arc<Entity>> {
        self.staged
            .into_iter()
            .map(|staged| {
                let entity = entities.construct(staged.name);
                for component in staged.components {
                    entity.add_boxed_component(component);
                }
                entity
            })
            .collect()
    }
}

/// Declarative scene: a named list of entities to construct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<SceneEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntity {
    pub name: String,
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    1
}

impl SceneDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    pub fn with_entity(mut self, name: impl Into<String>, count: usize) -> Self {
        self.entities.push(SceneEntity {
            name: name.into(),
            count,
        });
        self
    }

    pub fn entity_count(&self) -> usize {
        self.entities.iter().map(|entity| entity.count).sum()
    }
}

impl Scene for SceneDescription {
    fn name(&self) -> &str {
        &self.name
    }

    fn populate(&self, scene: &mut SceneBuilder) -> Result<()> {
        for entity in &self.entities {
            ensure!(
                !entity.name.is_empty(),
                "scene '{}' has an entity without a name",
                self.name
            );
            if entity.count == 1 {
                scene.spawn(entity.name.clone());
            } else {
                for index in 0..entity.count {
                    scene.spawn(format!("{}-{index}", entity.name));
                }
            }
        }
        Ok(())
    }
}
