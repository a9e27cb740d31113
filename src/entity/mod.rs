//! Scene entities and their lifecycle notifications
//!
//! An entity is constructed through a [`LifecycleListener`] (normally the
//! loop's [`EntityStore`]), may be asked to die from any thread, and is only
//! finalized when the listener's owner commits the destroy queue.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tracing::trace;

mod store;

pub use store::EntityStore;

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique entity identifier. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(u64);

impl EntityId {
    fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic lifecycle of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum LifecycleState {
    Constructed = 0,
    Live = 1,
    PendingDestroy = 2,
    Destroyed = 3,
}

impl LifecycleState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => LifecycleState::Constructed,
            1 => LifecycleState::Live,
            2 => LifecycleState::PendingDestroy,
            _ => LifecycleState::Destroyed,
        }
    }
}

/// Receives the three lifecycle notifications an entity raises.
pub trait LifecycleListener: Send + Sync {
    fn on_constructed(&self, entity: &Arc<Entity>);
    fn on_destroy_requested(&self, entity: &Arc<Entity>);
    fn on_destroy_committed(&self, entity: &Arc<Entity>);
}

/// A resource owned by an entity and released when its destruction commits.
pub trait Component: Send {
    fn on_destroy(&mut self, entity: EntityId);
}

pub struct Entity {
    id: EntityId,
    name: String,
    state: AtomicU8,
    listener: Weak<dyn LifecycleListener>,
    components: Mutex<Vec<Box<dyn Component>>>,
}

impl Entity {
    /// Creates an entity and synchronously notifies `listener` of its construction.
    pub fn spawn<L>(listener: &Arc<L>, name: impl Into<String>) -> Arc<Entity>
    where
        L: LifecycleListener + 'static,
    {
        let weak = Arc::downgrade(listener);
        let weak: Weak<dyn LifecycleListener> = weak;
        let entity = Arc::new(Entity {
            id: EntityId::next(),
            name: name.into(),
            state: AtomicU8::new(LifecycleState::Constructed as u8),
            listener: weak,
            components: Mutex::new(Vec::new()),
        });
        listener.on_constructed(&entity);
        entity
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_live(&self) -> bool {
        self.state() == LifecycleState::Live
    }

    /// Attaches a component. Refused once destruction has been requested.
    pub fn add_component(&self, component: impl Component + 'static) -> bool {
        self.add_boxed_component(Box::new(component))
    }

    /// Attaches a component unless destruction was already requested.
    pub fn add_boxed_component(&self, component: Box<dyn Component>) -> bool {
        let mut components = lock(&self.components);
        if self.state() >= LifecycleState::PendingDestroy {
            return false;
        }
        components.push(component);
        true
    }

    pub fn component_count(&self) -> usize {
        lock(&self.components).len()
    }

    /// Marks the entity for destruction.
    ///
    /// Returns `false` if destruction was already requested; in that case the
    /// listener is not notified again.
    pub fn request_destroy(self: &Arc<Self>) -> bool {
        let pending = LifecycleState::PendingDestroy as u8;
        let transitioned = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                (raw < pending).then_some(pending)
            })
            .is_ok();
        if !transitioned {
            trace!(target: "framecore", entity = %self.id, "destroy already requested");
            return false;
        }
        if let Some(listener) = self.listener.upgrade() {
            listener.on_destroy_requested(self);
        }
        true
    }

    /// Moves a freshly constructed entity into the live state.
    pub(crate) fn admit(&self) -> bool {
        self.state
            .compare_exchange(
                LifecycleState::Constructed as u8,
                LifecycleState::Live as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Finalizes a pending destruction: releases components, then notifies
    /// the listener. Does nothing unless the entity is `PendingDestroy`.
    pub(crate) fn commit_destroy(self: &Arc<Self>) -> bool {
        let committed = self
            .state
            .compare_exchange(
                LifecycleState::PendingDestroy as u8,
                LifecycleState::Destroyed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if !committed {
            return false;
        }

        let components = std::mem::take(&mut *lock(&self.components));
        for mut component in components {
            component.on_destroy(self.id);
        }

        if let Some(listener) = self.listener.upgrade() {
            listener.on_destroy_committed(self);
        }
        true
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
