//! A blocking shell around [`App`] for one command invocation.
//!
//! Opens the database, waits for every collection to load, runs one
//! mutation to completion and turns queued notices into errors.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use shelf_backend::{Gateway, SqliteGateway};
use shelf_model::{Creator, CreatorId, Entity, Taxonomy, Work, WorkId};
use shelf_state::{
    App, Catalog, CatalogMessage, CatalogTaxonomy, KeyedStore, MemorySessionStorage, Message,
    OrderedStore, StateError, Task,
};
use tokio::runtime::Runtime;
use tracing::debug;

/// An open database plus the runtime that drives its requests.
pub struct Shell {
    runtime: Runtime,
    app: App,
}

impl Shell {
    /// Open (or create) the SQLite database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(Arc::new(SqliteGateway::new()), path)
    }

    /// Open `path` through an arbitrary gateway.
    pub fn open_with(gateway: Arc<dyn Gateway>, path: &Path) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        let app = App::new(gateway, Arc::new(MemorySessionStorage::new()));
        let mut shell = Self { runtime, app };

        let task = shell.app.open(path);
        shell.run(task)?;
        if shell.app.connection().is_none() {
            bail!("Database {} did not open", path.display());
        }
        debug!(path = %path.display(), "shell ready");
        Ok(shell)
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn catalog(&self) -> &Catalog {
        self.app.catalog()
    }

    /// Drive `task` to completion. Any notice it raised becomes the error.
    pub fn run(&mut self, task: Task<Message>) -> Result<()> {
        let handled = self.runtime.block_on(self.app.settle(task));
        debug!(handled, "settled");
        self.take_notices()
    }

    /// Apply an app-level mutation and wait for the backend.
    pub fn apply(
        &mut self,
        mutate: impl FnOnce(&mut App) -> Result<Task<Message>, StateError>,
    ) -> Result<()> {
        let task = mutate(&mut self.app)?;
        self.run(task)
    }

    /// Apply a catalog mutation and wait for the backend.
    pub fn mutate(
        &mut self,
        mutate: impl FnOnce(&mut Catalog) -> Result<Task<CatalogMessage>, StateError>,
    ) -> Result<()> {
        let task = mutate(self.app.catalog_mut())?;
        self.run(task.map(Message::Catalog))
    }

    /// Create a work and return its backend id.
    pub fn add_work(&mut self, draft: Work) -> Result<WorkId> {
        let (provisional, task) = self.app.catalog_mut().add_work(draft)?;
        self.run(task.map(Message::Catalog))?;
        self.resolved::<Work>(provisional)
    }

    /// Create a creator and return its backend id.
    pub fn add_creator(&mut self, draft: Creator) -> Result<CreatorId> {
        let (provisional, task) = self.app.catalog_mut().add_creator(draft)?;
        self.run(task.map(Message::Catalog))?;
        self.resolved::<Creator>(provisional)
    }

    /// Create a status, type or format and return its backend id.
    pub fn add_taxonomy<T: CatalogTaxonomy>(&mut self, name: &str) -> Result<T::Id> {
        let (provisional, task) = self.app.catalog_mut().add_taxonomy::<T>(name)?;
        self.run(task.map(Message::Catalog))?;
        self.resolved::<T>(provisional)
    }

    fn resolved<E: Entity>(&self, provisional: E::Id) -> Result<E::Id> {
        self.catalog()
            .resolve::<E>(provisional)
            .ok_or_else(|| anyhow!("{} was not saved", E::KIND))
    }

    fn take_notices(&mut self) -> Result<()> {
        let notices = self.app.catalog_mut().notices_mut();
        if notices.is_empty() {
            return Ok(());
        }
        let message = notices
            .iter()
            .map(|notice| format!("{} {}", notice.title, notice.detail))
            .collect::<Vec<_>>()
            .join("\n");
        notices.clear();
        Err(anyhow!(message))
    }
}

// =============================================================================
// LOOKUPS
// =============================================================================

/// Resolve a taxonomy entry by numeric id or case-insensitive name.
pub fn find_taxonomy<T: Taxonomy>(store: &OrderedStore<T>, key: &str) -> Result<T::Id> {
    if let Ok(raw) = key.parse::<i64>() {
        let id = T::Id::from(raw);
        if store.contains(id) {
            return Ok(id);
        }
    }
    store
        .as_slice()
        .iter()
        .find(|entry| entry.name().eq_ignore_ascii_case(key))
        .map(Entity::id)
        .ok_or_else(|| anyhow!("No {} matches '{key}'", T::KIND))
}

fn find_named<E: Entity>(
    store: &KeyedStore<E>,
    key: &str,
    name: impl Fn(&E) -> &str,
) -> Result<E::Id> {
    if let Ok(raw) = key.parse::<i64>() {
        let id = E::Id::from(raw);
        if store.contains(id) {
            return Ok(id);
        }
    }
    let matches: Vec<_> = store
        .iter()
        .filter(|entry| name(entry).eq_ignore_ascii_case(key))
        .map(Entity::id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("No {} matches '{key}'", E::KIND),
        _ => bail!(
            "{} {} are named '{key}', use an id instead",
            matches.len(),
            E::KIND.plural()
        ),
    }
}

/// Resolve a work by numeric id or unique case-insensitive name.
pub fn find_work(catalog: &Catalog, key: &str) -> Result<WorkId> {
    find_named(catalog.works(), key, |work: &Work| work.name.as_str())
}

/// Resolve a creator by numeric id or unique case-insensitive name.
pub fn find_creator(catalog: &Catalog, key: &str) -> Result<CreatorId> {
    find_named(catalog.creators(), key, |creator: &Creator| {
        creator.name.as_str()
    })
}
