//! Entity stores.
//!
//! Each store holds a snapshot behind an [`Arc`]. Readers clone the `Arc`
//! and keep a consistent view; writers go through [`Arc::make_mut`], which
//! copies the collection if any reader still holds the old snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use shelf_model::{Entity, Taxonomy, move_to_target};
use tracing::error;

use crate::error::StateError;

// =============================================================================
// PHASE
// =============================================================================

/// Load lifecycle of a collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never loaded. Only `load` is meaningful.
    #[default]
    Uninitialized,
    /// A fetch is in flight. The previous snapshot, if any, stays readable.
    Loading,
    Ready,
}

#[derive(Debug, Default, Clone, Copy)]
struct Lifecycle {
    phase: Phase,
    loaded_once: bool,
}

impl Lifecycle {
    fn begin_load(&mut self) {
        self.phase = Phase::Loading;
    }

    fn finish_load(&mut self) {
        self.phase = Phase::Ready;
        self.loaded_once = true;
    }

    fn fail_load(&mut self) {
        self.phase = if self.loaded_once {
            Phase::Ready
        } else {
            Phase::Uninitialized
        };
    }

    fn check<E: Entity>(&self) -> Result<(), StateError> {
        if self.loaded_once {
            Ok(())
        } else {
            Err(StateError::Uninitialized(E::KIND))
        }
    }
}

fn missing<E: Entity>(id: E::Id) -> StateError {
    let id: i64 = id.into();
    error!(kind = %E::KIND, id, "entity missing from local state");
    StateError::not_found(E::KIND, id)
}

// =============================================================================
// KEYED STORE
// =============================================================================

/// Id-keyed collection, used for works and creators.
#[derive(Debug, Clone)]
pub struct KeyedStore<E: Entity> {
    lifecycle: Lifecycle,
    items: Arc<BTreeMap<E::Id, E>>,
}

impl<E: Entity> Default for KeyedStore<E> {
    fn default() -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            items: Arc::new(BTreeMap::new()),
        }
    }
}

impl<E: Entity> KeyedStore<E> {
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase
    }

    /// Fail with [`StateError::Uninitialized`] until the first load lands.
    pub fn ensure_loaded(&self) -> Result<(), StateError> {
        self.lifecycle.check::<E>()
    }

    pub fn begin_load(&mut self) {
        self.lifecycle.begin_load();
    }

    /// Replace the whole collection with a fresh backend snapshot.
    pub fn replace(&mut self, items: Vec<E>) {
        self.items = Arc::new(items.into_iter().map(|item| (item.id(), item)).collect());
        self.lifecycle.finish_load();
    }

    /// Keep the previous snapshot after a failed fetch.
    pub fn fail_load(&mut self) {
        self.lifecycle.fail_load();
    }

    /// Drop everything and return to [`Phase::Uninitialized`].
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<BTreeMap<E::Id, E>> {
        Arc::clone(&self.items)
    }

    /// Look up an entity that must exist. A miss is logged as an error.
    pub fn get(&self, id: E::Id) -> Result<&E, StateError> {
        self.items.get(&id).ok_or_else(|| missing::<E>(id))
    }

    pub fn find(&self, id: E::Id) -> Option<&E> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: E::Id) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.items.values()
    }

    pub fn insert(&mut self, item: E) {
        Arc::make_mut(&mut self.items).insert(item.id(), item);
    }

    pub fn remove(&mut self, id: E::Id) -> Option<E> {
        if !self.items.contains_key(&id) {
            return None;
        }
        Arc::make_mut(&mut self.items).remove(&id)
    }

    /// Mutate one entity in place.
    pub fn update<T>(&mut self, id: E::Id, f: impl FnOnce(&mut E) -> T) -> Result<T, StateError> {
        if !self.items.contains_key(&id) {
            return Err(missing::<E>(id));
        }
        Arc::make_mut(&mut self.items)
            .get_mut(&id)
            .map(f)
            .ok_or_else(|| missing::<E>(id))
    }

    /// Move an entity from `old` to `new`, updating its own id field.
    /// Returns false if `old` is not present.
    pub fn rekey(&mut self, old: E::Id, new: E::Id) -> bool {
        let Some(mut item) = self.remove(old) else {
            return false;
        };
        item.set_id(new);
        self.insert(item);
        true
    }
}

// =============================================================================
// ORDERED STORE
// =============================================================================

/// Display-ordered collection, used for statuses, types and formats.
#[derive(Debug, Clone)]
pub struct OrderedStore<T: Taxonomy> {
    lifecycle: Lifecycle,
    items: Arc<Vec<T>>,
}

impl<T: Taxonomy> Default for OrderedStore<T> {
    fn default() -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            items: Arc::new(Vec::new()),
        }
    }
}

impl<T: Taxonomy> OrderedStore<T> {
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase
    }

    pub fn ensure_loaded(&self) -> Result<(), StateError> {
        self.lifecycle.check::<T>()
    }

    pub fn begin_load(&mut self) {
        self.lifecycle.begin_load();
    }

    pub fn replace(&mut self, items: Vec<T>) {
        self.items = Arc::new(items);
        self.lifecycle.finish_load();
    }

    pub fn fail_load(&mut self) {
        self.lifecycle.fail_load();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.items)
    }

    /// Entries in display order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: T::Id) -> Result<&T, StateError> {
        self.find(id).ok_or_else(|| missing::<T>(id))
    }

    pub fn find(&self, id: T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Display position of `id`.
    pub fn position(&self, id: T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append at the end of the display order.
    pub fn push(&mut self, item: T) {
        Arc::make_mut(&mut self.items).push(item);
    }

    pub fn remove(&mut self, id: T::Id) -> Option<T> {
        let index = self.position(id)?;
        Some(Arc::make_mut(&mut self.items).remove(index))
    }

    pub fn update<R>(&mut self, id: T::Id, f: impl FnOnce(&mut T) -> R) -> Result<R, StateError> {
        let index = self.position(id).ok_or_else(|| missing::<T>(id))?;
        Ok(f(&mut Arc::make_mut(&mut self.items)[index]))
    }

    /// Move `moved` to the current index of `target`.
    pub fn reorder(&mut self, moved: T::Id, target: T::Id) -> Result<(), StateError> {
        if !self.contains(moved) {
            return Err(missing::<T>(moved));
        }
        if !self.contains(target) {
            return Err(missing::<T>(target));
        }
        move_to_target(
            Arc::make_mut(&mut self.items),
            |item: &T| item.id(),
            &moved,
            &target,
        );
        Ok(())
    }

    pub fn rekey(&mut self, old: T::Id, new: T::Id) -> bool {
        self.update(old, |item| item.set_id(new)).is_ok()
    }
}
