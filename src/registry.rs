//! Ordered storage of one system instance per kind

use std::any::{type_name, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::system::System;

/// Shared handle to a registered system.
pub type SystemHandle = Rc<RefCell<dyn System>>;

/// The key a system is registered under.
///
/// Usually the system's own type, but any `'static` type (including a trait
/// object such as `dyn SceneLoader`) may serve as a supertype kind.
#[derive(Clone, Copy)]
pub struct SystemKind {
    id: TypeId,
    name: &'static str,
}

impl SystemKind {
    pub fn of<K: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<K>(),
            name: type_name::<K>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for SystemKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SystemKind {}

impl Hash for SystemKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemKind({})", self.name)
    }
}

struct SystemEntry {
    kind: SystemKind,
    system: SystemHandle,
}

/// Systems in registration order.
///
/// Registering a kind that is already present swaps the instance in place:
/// the replacement keeps the original slot in dispatch order.
#[derive(Default)]
pub struct SystemRegistry {
    entries: Vec<SystemEntry>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `system` under its own type. Returns the replaced instance, if any.
    pub fn register<S: System>(&mut self, system: S) -> Option<SystemHandle> {
        self.register_as::<S, S>(system)
    }

    /// Registers `system` under kind `K`. Returns the replaced instance, if any.
    pub fn register_as<K, S>(&mut self, system: S) -> Option<SystemHandle>
    where
        K: ?Sized + 'static,
        S: System,
    {
        let handle: SystemHandle = Rc::new(RefCell::new(system));
        self.register_handle(SystemKind::of::<K>(), handle)
    }

    pub fn register_handle(
        &mut self,
        kind: SystemKind,
        handle: SystemHandle,
    ) -> Option<SystemHandle> {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.kind == kind) {
            warn!(target: "framecore", kind = kind.name(), "replacing registered system");
            return Some(std::mem::replace(&mut entry.system, handle));
        }
        debug!(
            target: "framecore",
            kind = kind.name(),
            slot = self.entries.len(),
            "registered system"
        );
        self.entries.push(SystemEntry {
            kind,
            system: handle,
        });
        None
    }

    /// Looks up a system by concrete type.
    ///
    /// Returns `None` when no such system is registered, or when it is
    /// currently mutably borrowed (a system cannot look itself up while updating).
    pub fn get<S: System>(&self) -> Option<Ref<'_, S>> {
        self.entries.iter().find_map(|entry| {
            let system = entry.system.try_borrow().ok()?;
            Ref::filter_map(system, |system| system.as_any().downcast_ref::<S>()).ok()
        })
    }

    pub fn get_mut<S: System>(&self) -> Option<RefMut<'_, S>> {
        self.entries.iter().find_map(|entry| {
            let system = entry.system.try_borrow_mut().ok()?;
            RefMut::filter_map(system, |system| system.as_any_mut().downcast_mut::<S>()).ok()
        })
    }

    /// Looks up the instance registered under kind `K`.
    pub fn get_kind<K: ?Sized + 'static>(&self) -> Option<SystemHandle> {
        let kind = SystemKind::of::<K>();
        self.entries
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| Rc::clone(&entry.system))
    }

    pub fn contains<K: ?Sized + 'static>(&self) -> bool {
        let kind = SystemKind::of::<K>();
        self.entries.iter().any(|entry| entry.kind == kind)
    }

    /// Ordered snapshot of `(kind, instance)` pairs.
    pub fn systems(&self) -> Vec<(SystemKind, SystemHandle)> {
        self.entries
            .iter()
            .map(|entry| (entry.kind, Rc::clone(&entry.system)))
            .collect()
    }

    pub fn kinds(&self) -> Vec<SystemKind> {
        self.entries.iter().map(|entry| entry.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::FrameContext;
    use anyhow::Result;
    use std::any::Any;

    struct Named {
        name: &'static str,
        value: u32,
    }

    impl System for Named {
        fn name(&self) -> &str {
            self.name
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

    macro_rules! marker_system {
        ($name:ident) => {
            struct $name;

            impl System for $name {
                fn name(&self) -> &str {
                    stringify!($name)
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
        };
    }

    marker_system!(Alpha);
    marker_system!(Beta);
    marker_system!(Gamma);

    trait Loader {}

    fn names(registry: &SystemRegistry) -> Vec<String> {
        registry
            .systems()
            .iter()
            .map(|(_, system)| system.borrow().name().to_string())
            .collect()
    }

    #[test]
    fn iteration_follows_registration_order() {
        let mut registry = SystemRegistry::new();
        registry.register(Alpha);
        registry.register(Beta);
        registry.register(Gamma);

        assert_eq!(names(&registry), vec!["Alpha", "Beta", "Gamma"]);
        assert_eq!(
            registry.kinds(),
            vec![
                SystemKind::of::<Alpha>(),
                SystemKind::of::<Beta>(),
                SystemKind::of::<Gamma>()
            ]
        );
    }

    #[test]
    fn replacement_keeps_original_slot() {
        let mut registry = SystemRegistry::new();
        registry.register(Named {
            name: "first",
            value: 1,
        });
        registry.register(Beta);

        let replaced = registry.register(Named {
            name: "second",
            value: 2,
        });

        assert!(replaced.is_some());
        assert_eq!(registry.len(), 2);
        assert_eq!(names(&registry), vec!["second", "Beta"]);
        assert_eq!(registry.get::<Named>().map(|n| n.value), Some(2));
    }

    #[test]
    fn missing_system_is_none() {
        let mut registry = SystemRegistry::new();
        registry.register(Alpha);

        assert!(registry.get::<Beta>().is_none());
        assert!(registry.get_kind::<Beta>().is_none());
        assert!(!registry.contains::<Beta>());
    }

    #[test]
    fn supertype_kind_replaces_by_kind() {
        let mut registry = SystemRegistry::new();
        registry.register_as::<dyn Loader, _>(Alpha);
        registry.register(Gamma);
        registry.register_as::<dyn Loader, _>(Beta);

        assert!(registry.contains::<dyn Loader>());
        assert!(!registry.contains::<Beta>());
        assert!(registry.get::<Alpha>().is_none());
        assert!(registry.get::<Beta>().is_some());
        assert_eq!(names(&registry), vec!["Beta", "Gamma"]);

        let loader = registry.get_kind::<dyn Loader>().unwrap();
        assert_eq!(loader.borrow().name(), "Beta");
    }

    #[test]
    fn get_mut_allows_mutation() {
        let mut registry = SystemRegistry::new();
        registry.register(Named {
            name: "counter",
            value: 0,
        });

        if let Some(mut named) = registry.get_mut::<Named>() {
            named.value = 42;
        }
        assert_eq!(registry.get::<Named>().map(|n| n.value), Some(42));
    }

    #[test]
    fn borrowed_system_is_not_returned() {
        let mut registry = SystemRegistry::new();
        registry.register(Alpha);

        let handle = registry.get_kind::<Alpha>().unwrap();
        let _guard = handle.borrow_mut();
        assert!(registry.get::<Alpha>().is_none());
        assert!(registry.get_mut::<Alpha>().is_none());
    }
}
