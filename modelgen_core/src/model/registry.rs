//! Insertion ordered registries of model entities, keyed by their ids
//!
//! Generation only ever adds entities, so the index of an entity never changes once it has
//! been registered. [`Handle`]s rely on this to stay valid for the life of the registry.
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use indexmap::IndexMap;
use thiserror::Error;

/// Implemented by everything stored in a [`Registry`]
pub trait Entity {
    /// Category name used in error messages, e.g. `"species"`
    const KIND: &'static str;

    fn id(&self) -> &str;
}

/// Stable reference to an entity in a [`Registry`]
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: usize) -> Self {
        Handle {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state)
    }
}

impl<T> Debug for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

/// Registry of entities of a single category
#[derive(Clone, Debug)]
pub struct Registry<T> {
    entries: IndexMap<String, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            entries: IndexMap::new(),
        }
    }
}

impl<T: Entity> Registry<T> {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Get the entity with `id`, creating it with `constructor` if it doesn't exist yet
    ///
    /// Interning is idempotent: the constructor only runs the first time an id is seen.
    ///
    /// # Examples
    /// ```rust
    /// use modelgen_core::model::registry::Registry;
    /// use modelgen_core::model::reaction::Submodel;
    /// let mut submodels: Registry<Submodel> = Registry::new();
    /// submodels.intern("transcription", || Submodel::new("transcription"));
    /// submodels.intern("transcription", || Submodel::new("transcription"));
    /// assert_eq!(submodels.len(), 1);
    /// ```
    pub fn intern<F: FnOnce() -> T>(&mut self, id: &str, constructor: F) -> &mut T {
        self.entries
            .entry(id.to_string())
            .or_insert_with(constructor)
    }

    /// Like [`Registry::intern`], but returns a handle and whether the entity was created
    pub fn intern_handle<F: FnOnce() -> T>(&mut self, id: &str, constructor: F) -> (Handle<T>, bool) {
        if let Some(index) = self.entries.get_index_of(id) {
            return (Handle::new(index), false);
        }
        let (index, _) = self.entries.insert_full(id.to_string(), constructor());
        (Handle::new(index), true)
    }

    /// Add a new entity, failing if one with the same id is already registered
    pub fn create(&mut self, entity: T) -> Result<Handle<T>, RegistryError> {
        if self.entries.contains_key(entity.id()) {
            return Err(RegistryError::DuplicateId {
                kind: T::KIND,
                id: entity.id().to_string(),
            });
        }
        let (index, _) = self.entries.insert_full(entity.id().to_string(), entity);
        Ok(Handle::new(index))
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    /// Get an entity, or a [`RegistryError::Missing`] error naming it
    pub fn require(&self, id: &str) -> Result<&T, RegistryError> {
        self.entries.get(id).ok_or_else(|| RegistryError::Missing {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    pub fn require_mut(&mut self, id: &str) -> Result<&mut T, RegistryError> {
        self.entries.get_mut(id).ok_or_else(|| RegistryError::Missing {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    pub fn handle(&self, id: &str) -> Option<Handle<T>> {
        self.entries.get_index_of(id).map(Handle::new)
    }

    pub fn resolve(&self, handle: Handle<T>) -> &T {
        &self.entries[handle.index]
    }

    pub fn resolve_mut(&mut self, handle: Handle<T>) -> &mut T {
        &mut self.entries[handle.index]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("A {kind} with id `{id}` already exists")]
    DuplicateId { kind: &'static str, id: String },
    #[error("No {kind} with id `{id}` exists")]
    Missing { kind: &'static str, id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Thing {
        id: String,
        value: u32,
    }

    impl Entity for Thing {
        const KIND: &'static str = "thing";

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn thing(id: &str, value: u32) -> Thing {
        Thing {
            id: id.to_string(),
            value,
        }
    }

    #[test]
    fn intern_is_idempotent() {
        let mut registry = Registry::new();
        registry.intern("a", || thing("a", 1));
        let second = registry.intern("a", || thing("a", 2));
        assert_eq!(second.value, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn handles_are_stable() {
        let mut registry = Registry::new();
        let (a, created) = registry.intern_handle("a", || thing("a", 1));
        assert!(created);
        registry.intern("b", || thing("b", 2));
        registry.intern("c", || thing("c", 3));
        let (again, created) = registry.intern_handle("a", || thing("a", 4));
        assert!(!created);
        assert_eq!(a, again);
        assert_eq!(registry.resolve(a).value, 1);
        assert_eq!(registry.handle("c").unwrap().index(), 2);
    }

    #[test]
    fn create_rejects_duplicates() {
        let mut registry = Registry::new();
        registry.create(thing("a", 1)).unwrap();
        let err = registry.create(thing("a", 2)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateId {
                kind: "thing",
                id: "a".to_string()
            }
        );
        assert!(matches!(
            registry.require("b"),
            Err(RegistryError::Missing { .. })
        ));
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut registry = Registry::new();
        for id in ["z", "a", "m"] {
            registry.intern(id, || thing(id, 0));
        }
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }
}
