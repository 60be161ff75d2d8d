//! Session-scoped state cells.
//!
//! Filters, sort orders, form drafts and the navigation history survive
//! screen changes but belong to the open database: every key is dropped when
//! a different database is opened. Values are stored as JSON strings in an
//! injectable [`SessionStorage`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

// =============================================================================
// STORAGE
// =============================================================================

/// Key-value backing store for session cells.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    fn remove(&self, key: &str);

    /// Drop every key.
    fn clear(&self);
}

/// Process-local [`SessionStorage`].
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.lock().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn clear(&self) {
        self.lock().clear();
    }
}

// =============================================================================
// KEYS
// =============================================================================

/// Session keys used by the library screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    MainTab,
    HomeTab,
    ConfigurationTab,
    UpdateFilter,
    LibraryNavigation,
    LibraryWorksFilter,
    LibraryWorksSort,
    LibraryCreatorsFilter,
    LibraryCreatorsSort,
    AddWorkFormData,
    AddWorkCreatorsFilter,
    AddWorkCreatorsSort,
    AddCreatorFormData,
    AddCreatorWorksFilter,
    AddCreatorWorksSort,
}

impl StorageKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MainTab => "main-tab",
            Self::HomeTab => "home-tab",
            Self::ConfigurationTab => "configuration-tab",
            Self::UpdateFilter => "update-filter",
            Self::LibraryNavigation => "library-navigation",
            Self::LibraryWorksFilter => "library-works-filter",
            Self::LibraryWorksSort => "library-works-sort",
            Self::LibraryCreatorsFilter => "library-creators-filter",
            Self::LibraryCreatorsSort => "library-creators-sort",
            Self::AddWorkFormData => "add-work-form-data",
            Self::AddWorkCreatorsFilter => "add-work-creators-filter",
            Self::AddWorkCreatorsSort => "add-work-creators-sort",
            Self::AddCreatorFormData => "add-creator-form-data",
            Self::AddCreatorWorksFilter => "add-creator-works-filter",
            Self::AddCreatorWorksSort => "add-creator-works-sort",
        }
    }

    pub const fn all() -> &'static [StorageKey] {
        &[
            Self::MainTab,
            Self::HomeTab,
            Self::ConfigurationTab,
            Self::UpdateFilter,
            Self::LibraryNavigation,
            Self::LibraryWorksFilter,
            Self::LibraryWorksSort,
            Self::LibraryCreatorsFilter,
            Self::LibraryCreatorsSort,
            Self::AddWorkFormData,
            Self::AddWorkCreatorsFilter,
            Self::AddWorkCreatorsSort,
            Self::AddCreatorFormData,
            Self::AddCreatorWorksFilter,
            Self::AddCreatorWorksSort,
        ]
    }

    /// Keys whose values can name a status, type or format.
    pub const fn taxonomy_dependent() -> &'static [StorageKey] {
        &[
            Self::LibraryWorksFilter,
            Self::AddWorkFormData,
            Self::UpdateFilter,
        ]
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CELLS
// =============================================================================

/// One persisted value. Read once on creation, written on every change.
pub struct SessionCell<T> {
    key: String,
    default: T,
    value: T,
    storage: Arc<dyn SessionStorage>,
}

impl<T: fmt::Debug> fmt::Debug for SessionCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCell")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl<T> SessionCell<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Open the cell at `key`, falling back to `default` when the stored
    /// value is absent or does not parse.
    pub fn new(storage: Arc<dyn SessionStorage>, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let value = read(storage.as_ref(), &key).unwrap_or_else(|| default.clone());
        Self {
            key,
            default,
            value,
            storage,
        }
    }

    pub fn for_key(storage: Arc<dyn SessionStorage>, key: StorageKey, default: T) -> Self {
        Self::new(storage, key.as_str(), default)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.write();
    }

    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.value);
        self.write();
    }

    /// Forget the in-memory value and re-read storage.
    pub fn refresh(&mut self) {
        self.value = read(self.storage.as_ref(), &self.key).unwrap_or_else(|| self.default.clone());
    }

    fn write(&self) {
        match serde_json::to_string(&self.value) {
            Ok(json) => self.storage.set(&self.key, json),
            Err(error) => warn!(key = %self.key, %error, "failed to serialize session value"),
        }
    }
}

fn read<T: DeserializeOwned>(storage: &dyn SessionStorage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(key, %error, "discarding unreadable session value");
            None
        }
    }
}

/// A session cell driven by a pure reducer. The new state is written after
/// every dispatched action.
pub struct SessionReducer<S, A> {
    cell: SessionCell<S>,
    reduce: fn(S, A) -> S,
}

impl<S: fmt::Debug, A> fmt::Debug for SessionReducer<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionReducer")
            .field("cell", &self.cell)
            .finish_non_exhaustive()
    }
}

impl<S, A> SessionReducer<S, A>
where
    S: Serialize + DeserializeOwned + Clone,
{
    pub fn new(cell: SessionCell<S>, reduce: fn(S, A) -> S) -> Self {
        Self { cell, reduce }
    }

    pub fn state(&self) -> &S {
        self.cell.get()
    }

    pub fn dispatch(&mut self, action: A) {
        let next = (self.reduce)(self.cell.get().clone(), action);
        self.cell.set(next);
    }

    pub fn refresh(&mut self) {
        self.cell.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> Arc<MemorySessionStorage> {
        Arc::new(MemorySessionStorage::new())
    }

    #[test]
    fn test_cell_reads_default_then_persists() {
        let storage = storage();
        let mut cell = SessionCell::new(storage.clone(), "filter", String::from("all"));
        assert_eq!(cell.get(), "all");
        cell.set("manga".into());
        assert_eq!(storage.get("filter").as_deref(), Some("\"manga\""));

        let reopened = SessionCell::new(storage, "filter", String::from("all"));
        assert_eq!(reopened.get(), "manga");
    }

    #[test]
    fn test_unparseable_value_falls_back() {
        let storage = storage();
        storage.set("count", "not json".into());
        let cell = SessionCell::new(storage, "count", 3_u32);
        assert_eq!(*cell.get(), 3);
    }

    #[test]
    fn test_refresh_after_clear_restores_default() {
        let storage = storage();
        let mut cell = SessionCell::for_key(storage.clone(), StorageKey::HomeTab, 0_usize);
        cell.set(2);
        storage.clear();
        cell.refresh();
        assert_eq!(*cell.get(), 0);
    }

    #[test]
    fn test_reducer_writes_after_dispatch() {
        fn add(state: i32, action: i32) -> i32 {
            state + action
        }
        let storage = storage();
        let cell = SessionCell::new(storage.clone(), "sum", 0);
        let mut reducer = SessionReducer::new(cell, add);
        reducer.dispatch(4);
        reducer.dispatch(6);
        assert_eq!(*reducer.state(), 10);
        assert_eq!(storage.get("sum").as_deref(), Some("10"));
    }

    #[test]
    fn test_add_form_sorts_have_their_own_cells() {
        use shelf_model::{CreatorColumn, SortOrder, WorkColumn};

        let storage = storage();
        let mut creators = SessionCell::for_key(
            storage.clone(),
            StorageKey::AddWorkCreatorsSort,
            SortOrder::<CreatorColumn>::default(),
        );
        let mut works = SessionCell::for_key(
            storage.clone(),
            StorageKey::AddCreatorWorksSort,
            SortOrder::<WorkColumn>::default(),
        );
        creators.set(SortOrder::descending(CreatorColumn::Works));
        works.set(SortOrder::ascending(WorkColumn::Updated));
        assert!(storage.contains("add-work-creators-sort"));
        assert!(storage.contains("add-creator-works-sort"));

        let reopened = SessionCell::for_key(
            storage.clone(),
            StorageKey::AddWorkCreatorsSort,
            SortOrder::<CreatorColumn>::default(),
        );
        assert_eq!(*reopened.get(), SortOrder::descending(CreatorColumn::Works));
        assert!(!StorageKey::taxonomy_dependent().contains(&StorageKey::AddCreatorWorksSort));
    }

    #[test]
    fn test_storage_keys_are_unique() {
        let mut names: Vec<_> = StorageKey::all().iter().map(StorageKey::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StorageKey::all().len());
    }
}
