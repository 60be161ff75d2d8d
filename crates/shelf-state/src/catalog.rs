//! The catalog: every entity store plus the rules that keep them in step
//! with the backend.
//!
//! Mutators apply their change locally first and return a [`Task`] that
//! carries the backend request. The confirmation comes back as a
//! [`CatalogMessage`] through [`Catalog::update`]. A rejection queues a
//! [`Notice`] and reloads whatever collections the mutation touched.
//!
//! Messages are stamped with the connection epoch that issued them. After
//! [`Catalog::reset`] (a different database was opened) older messages are
//! dropped unseen.

use std::collections::HashMap;
use std::sync::Arc;

use shelf_backend::{BackendError, Endpoint, Gateway, TaxonomyEndpoints, now_millis};
use shelf_model::{
    Creator, CreatorColumn, CreatorId, CreatorsFilter, DisplayOrder, Entity, EntityKind, Format,
    FormatId, SortOrder, Status, StatusId, Work, WorkColumn, WorkId, WorkType,
    WorkTypeId, WorksFilter, sort_creators, sort_works, update_queue,
};
use tracing::{debug, warn};

use crate::error::StateError;
use crate::notice::{Notice, Notices};
use crate::relationship;
use crate::store::{KeyedStore, OrderedStore, Phase};
use crate::task::Task;

type BackendResult<T> = Result<T, BackendError>;

// =============================================================================
// MESSAGES
// =============================================================================

/// A backend response routed back into the catalog.
#[derive(Debug)]
pub struct CatalogMessage {
    epoch: u64,
    event: CatalogEvent,
}

impl CatalogMessage {
    /// Connection epoch the originating request was issued under.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn event(&self) -> &CatalogEvent {
        &self.event
    }
}

/// Backend response payloads.
#[derive(Debug)]
pub enum CatalogEvent {
    WorksLoaded(BackendResult<Vec<Work>>),
    CreatorsLoaded(BackendResult<Vec<Creator>>),
    StatusesLoaded(BackendResult<Vec<Status>>),
    TypesLoaded(BackendResult<Vec<WorkType>>),
    FormatsLoaded(BackendResult<Vec<Format>>),
    WorkAdded {
        provisional: WorkId,
        creators: Vec<CreatorId>,
        result: BackendResult<WorkId>,
    },
    CreatorAdded {
        provisional: CreatorId,
        works: Vec<WorkId>,
        result: BackendResult<CreatorId>,
    },
    TaxonomyAdded {
        kind: EntityKind,
        provisional: i64,
        result: BackendResult<i64>,
    },
    /// Outcome of a fire-and-forget update. On failure the listed
    /// collections are reloaded.
    Confirmed {
        endpoint: Endpoint,
        reload: Vec<EntityKind>,
        result: BackendResult<()>,
    },
}

// =============================================================================
// TAXONOMY DISPATCH
// =============================================================================

/// Gives the generic taxonomy operations access to the matching store.
pub trait CatalogTaxonomy: TaxonomyEndpoints {
    fn store(catalog: &Catalog) -> &OrderedStore<Self>;

    fn store_mut(catalog: &mut Catalog) -> &mut OrderedStore<Self>;

    fn loaded(result: BackendResult<Vec<Self>>) -> CatalogEvent;
}

impl CatalogTaxonomy for Status {
    fn store(catalog: &Catalog) -> &OrderedStore<Self> {
        &catalog.statuses
    }

    fn store_mut(catalog: &mut Catalog) -> &mut OrderedStore<Self> {
        &mut catalog.statuses
    }

    fn loaded(result: BackendResult<Vec<Self>>) -> CatalogEvent {
        CatalogEvent::StatusesLoaded(result)
    }
}

impl CatalogTaxonomy for WorkType {
    fn store(catalog: &Catalog) -> &OrderedStore<Self> {
        &catalog.types
    }

    fn store_mut(catalog: &mut Catalog) -> &mut OrderedStore<Self> {
        &mut catalog.types
    }

    fn loaded(result: BackendResult<Vec<Self>>) -> CatalogEvent {
        CatalogEvent::TypesLoaded(result)
    }
}

impl CatalogTaxonomy for Format {
    fn store(catalog: &Catalog) -> &OrderedStore<Self> {
        &catalog.formats
    }

    fn store_mut(catalog: &mut Catalog) -> &mut OrderedStore<Self> {
        &mut catalog.formats
    }

    fn loaded(result: BackendResult<Vec<Self>>) -> CatalogEvent {
        CatalogEvent::FormatsLoaded(result)
    }
}

/// Reject ids that the backend has not confirmed yet.
fn persisted<E: Entity>(id: E::Id) -> Result<(), StateError> {
    let raw: i64 = id.into();
    if raw > 0 {
        Ok(())
    } else {
        Err(StateError::provisional(E::KIND, raw))
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Local mirror of one backend connection.
pub struct Catalog {
    gateway: Arc<dyn Gateway>,
    epoch: u64,
    last_provisional: i64,
    /// Provisional id to backend id, for entries confirmed this epoch.
    resolved: HashMap<i64, i64>,
    /// Set while a reload issued to repair cross-references is in flight.
    repairing: bool,
    works: KeyedStore<Work>,
    creators: KeyedStore<Creator>,
    statuses: OrderedStore<Status>,
    types: OrderedStore<WorkType>,
    formats: OrderedStore<Format>,
    notices: Notices,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("epoch", &self.epoch)
            .field("works", &self.works.len())
            .field("creators", &self.creators.len())
            .field("statuses", &self.statuses.len())
            .field("types", &self.types.len())
            .field("formats", &self.formats.len())
            .field("notices", &self.notices.len())
            .finish()
    }
}

impl Catalog {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            epoch: 0,
            last_provisional: 0,
            resolved: HashMap::new(),
            repairing: false,
            works: KeyedStore::default(),
            creators: KeyedStore::default(),
            statuses: OrderedStore::default(),
            types: OrderedStore::default(),
            formats: OrderedStore::default(),
            notices: Notices::default(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Forget all local state and start a new connection epoch. Responses
    /// to requests issued before the reset are ignored.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.resolved.clear();
        self.repairing = false;
        self.works.reset();
        self.creators.reset();
        self.statuses.reset();
        self.types.reset();
        self.formats.reset();
        self.notices.clear();
        debug!(epoch = self.epoch, "catalog reset");
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn works(&self) -> &KeyedStore<Work> {
        &self.works
    }

    pub fn creators(&self) -> &KeyedStore<Creator> {
        &self.creators
    }

    pub fn statuses(&self) -> &OrderedStore<Status> {
        &self.statuses
    }

    pub fn types(&self) -> &OrderedStore<WorkType> {
        &self.types
    }

    pub fn formats(&self) -> &OrderedStore<Format> {
        &self.formats
    }

    pub fn work(&self, id: WorkId) -> Result<&Work, StateError> {
        self.works.get(id)
    }

    pub fn creator(&self, id: CreatorId) -> Result<&Creator, StateError> {
        self.creators.get(id)
    }

    /// Backend id assigned to a confirmed provisional entry.
    pub fn resolve<E: Entity>(&self, provisional: E::Id) -> Option<E::Id> {
        let raw: i64 = provisional.into();
        if raw > 0 {
            return Some(provisional);
        }
        self.resolved.get(&raw).copied().map(E::Id::from)
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    /// Taxonomy display positions for sorting.
    pub fn display_order(&self) -> DisplayOrder {
        DisplayOrder::new(
            self.statuses.as_slice(),
            self.types.as_slice(),
            self.formats.as_slice(),
        )
    }

    /// Works passing `filter`, sorted for the library table.
    pub fn sorted_works(&self, filter: &WorksFilter, order: SortOrder<WorkColumn>) -> Vec<&Work> {
        let ranks = self.display_order();
        sort_works(
            self.works.iter().filter(|work| filter.matches(work)),
            order,
            &ranks,
        )
    }

    /// Creators passing `filter`, sorted for the library table.
    pub fn sorted_creators(
        &self,
        filter: &CreatorsFilter,
        order: SortOrder<CreatorColumn>,
    ) -> Vec<&Creator> {
        sort_creators(
            self.creators.iter().filter(|creator| filter.matches(creator)),
            order,
        )
    }

    /// Works in the update triage view.
    pub fn update_queue(&self, filter: &WorksFilter) -> Vec<&Work> {
        update_queue(self.works.iter(), self.statuses.as_slice(), filter)
    }

    /// Work/creator pairs recorded on one side only. Empty when the
    /// cross-references are consistent.
    pub fn audit(&self) -> Vec<(WorkId, CreatorId)> {
        relationship::audit(&self.works, &self.creators)
    }

    // =========================================================================
    // REQUEST PLUMBING
    // =========================================================================

    fn next_provisional(&mut self) -> i64 {
        self.last_provisional -= 1;
        self.last_provisional
    }

    /// Run `call` on a blocking thread and wrap the outcome in a message.
    fn request<T, F, W>(&self, call: F, wrap: W) -> Task<CatalogMessage>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Gateway) -> BackendResult<T> + Send + 'static,
        W: FnOnce(BackendResult<T>) -> CatalogEvent + Send + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        let epoch = self.epoch;
        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || call(gateway.as_ref()))
                    .await
                    .unwrap_or_else(|error| {
                        Err(BackendError::Rejected(format!("Backend task failed: {error}")))
                    })
            },
            move |result| CatalogMessage {
                epoch,
                event: wrap(result),
            },
        )
    }

    /// Fire-and-forget request whose failure reloads `reload`.
    fn confirm<F>(
        &self,
        endpoint: Endpoint,
        reload: Vec<EntityKind>,
        call: F,
    ) -> Task<CatalogMessage>
    where
        F: FnOnce(&dyn Gateway) -> BackendResult<()> + Send + 'static,
    {
        self.request(call, move |result| CatalogEvent::Confirmed {
            endpoint,
            reload,
            result,
        })
    }

    fn reject(&mut self, endpoint: Endpoint, error: &BackendError) {
        warn!(%endpoint, %error, "backend rejected request");
        self.notices.push(Notice::rejected(endpoint, error));
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Fetch one collection, replacing local state when it arrives.
    pub fn load(&mut self, kind: EntityKind) -> Task<CatalogMessage> {
        match kind {
            EntityKind::Work => {
                self.works.begin_load();
                self.request(|gateway| gateway.get_works(), CatalogEvent::WorksLoaded)
            }
            EntityKind::Creator => {
                self.creators.begin_load();
                self.request(|gateway| gateway.get_creators(), CatalogEvent::CreatorsLoaded)
            }
            EntityKind::Status => self.load_taxonomy::<Status>(),
            EntityKind::Type => self.load_taxonomy::<WorkType>(),
            EntityKind::Format => self.load_taxonomy::<Format>(),
        }
    }

    /// Fetch every collection.
    pub fn load_all(&mut self) -> Task<CatalogMessage> {
        Task::batch(EntityKind::all().iter().map(|kind| self.load(*kind)).collect::<Vec<_>>())
    }

    fn load_taxonomy<T: CatalogTaxonomy>(&mut self) -> Task<CatalogMessage> {
        T::store_mut(self).begin_load();
        self.request(|gateway| T::fetch(gateway), T::loaded)
    }

    // =========================================================================
    // WORKS
    // =========================================================================

    /// Insert `draft` under a provisional id and request its creation.
    /// Creators listed on the draft are attached once the backend has
    /// assigned the real id. Repeated creators are attached once.
    pub fn add_work(&mut self, draft: Work) -> Result<(WorkId, Task<CatalogMessage>), StateError> {
        let listed = draft.creators.clone();
        let draft = draft.with_creators(listed);
        self.works.ensure_loaded()?;
        self.creators.ensure_loaded()?;
        self.check_taxonomies(draft.status, draft.work_type, draft.format)?;
        for creator in &draft.creators {
            persisted::<Creator>(*creator)?;
            self.creators.get(*creator)?;
        }

        let provisional = WorkId(self.next_provisional());
        let now = now_millis();
        let mut local = draft.clone();
        local.id = provisional;
        local.added = now;
        local.updated = now;
        local.creators.clear();
        self.works.insert(local);
        debug!(%provisional, name = %draft.name, "added provisional work");

        let creators = draft.creators.clone();
        let task = self.request(
            move |gateway| gateway.add_work(&draft),
            move |result| CatalogEvent::WorkAdded {
                provisional,
                creators,
                result,
            },
        );
        Ok((provisional, task))
    }

    fn check_taxonomies(
        &self,
        status: StatusId,
        work_type: WorkTypeId,
        format: FormatId,
    ) -> Result<(), StateError> {
        persisted::<Status>(status)?;
        persisted::<WorkType>(work_type)?;
        persisted::<Format>(format)?;
        self.statuses.get(status)?;
        self.types.get(work_type)?;
        self.formats.get(format)?;
        Ok(())
    }

    fn update_work_field<F>(
        &mut self,
        id: WorkId,
        endpoint: Endpoint,
        apply: impl FnOnce(&mut Work),
        call: F,
    ) -> Result<Task<CatalogMessage>, StateError>
    where
        F: FnOnce(&dyn Gateway) -> BackendResult<()> + Send + 'static,
    {
        self.works.ensure_loaded()?;
        persisted::<Work>(id)?;
        self.works.update(id, apply)?;
        debug!(%endpoint, %id, "applied optimistic update");
        Ok(self.confirm(endpoint, vec![EntityKind::Work], call))
    }

    pub fn update_work_name(
        &mut self,
        id: WorkId,
        name: impl Into<String>,
    ) -> Result<Task<CatalogMessage>, StateError> {
        let name = name.into();
        let local = name.clone();
        self.update_work_field(
            id,
            Endpoint::UpdateWorkName,
            |work| work.name = local,
            move |gateway| gateway.update_work_name(id, &name),
        )
    }

    /// Set progress and stamp `updated` with the current time.
    pub fn update_work_progress(
        &mut self,
        id: WorkId,
        progress: impl Into<String>,
    ) -> Result<Task<CatalogMessage>, StateError> {
        let progress = progress.into();
        let local = progress.clone();
        let now = now_millis();
        self.update_work_field(
            id,
            Endpoint::UpdateWorkProgress,
            |work| {
                work.progress = local;
                work.updated = now;
            },
            move |gateway| gateway.update_work_progress(id, &progress, now),
        )
    }

    /// Set status and stamp `updated` with the current time.
    pub fn update_work_status(
        &mut self,
        id: WorkId,
        status: StatusId,
    ) -> Result<Task<CatalogMessage>, StateError> {
        persisted::<Status>(status)?;
        self.statuses.get(status)?;
        let now = now_millis();
        self.update_work_field(
            id,
            Endpoint::UpdateWorkStatus,
            |work| {
                work.status = status;
                work.updated = now;
            },
            move |gateway| gateway.update_work_status(id, status, now),
        )
    }

    pub fn update_work_type(
        &mut self,
        id: WorkId,
        work_type: WorkTypeId,
    ) -> Result<Task<CatalogMessage>, StateError> {
        persisted::<WorkType>(work_type)?;
        self.types.get(work_type)?;
        self.update_work_field(
            id,
            Endpoint::UpdateWorkType,
            |work| work.work_type = work_type,
            move |gateway| gateway.update_work_type(id, work_type),
        )
    }

    pub fn update_work_format(
        &mut self,
        id: WorkId,
        format: FormatId,
    ) -> Result<Task<CatalogMessage>, StateError> {
        persisted::<Format>(format)?;
        self.formats.get(format)?;
        self.update_work_field(
            id,
            Endpoint::UpdateWorkFormat,
            |work| work.format = format,
            move |gateway| gateway.update_work_format(id, format),
        )
    }

    /// Detach the work from all its creators, then remove it.
    pub fn remove_work(&mut self, id: WorkId) -> Result<Task<CatalogMessage>, StateError> {
        self.works.ensure_loaded()?;
        self.creators.ensure_loaded()?;
        persisted::<Work>(id)?;
        let detached = relationship::sever_work(&mut self.works, &mut self.creators, id)?;
        self.works.remove(id);
        debug!(%id, creators = detached.len(), "removed work locally");
        Ok(self.confirm(
            Endpoint::RemoveWork,
            vec![EntityKind::Work, EntityKind::Creator],
            move |gateway| gateway.remove_work(id),
        ))
    }

    // =========================================================================
    // CREATORS
    // =========================================================================

    /// Insert `draft` under a provisional id and request its creation.
    /// Works listed on the draft are attached once the real id is known.
    /// Repeated works are attached once.
    pub fn add_creator(
        &mut self,
        draft: Creator,
    ) -> Result<(CreatorId, Task<CatalogMessage>), StateError> {
        let listed = draft.works.clone();
        let draft = draft.with_works(listed);
        self.works.ensure_loaded()?;
        self.creators.ensure_loaded()?;
        for work in &draft.works {
            persisted::<Work>(*work)?;
            self.works.get(*work)?;
        }

        let provisional = CreatorId(self.next_provisional());
        self.creators.insert(Creator {
            id: provisional,
            name: draft.name.clone(),
            works: Vec::new(),
        });
        debug!(%provisional, name = %draft.name, "added provisional creator");

        let works = draft.works.clone();
        let task = self.request(
            move |gateway| gateway.add_creator(&draft),
            move |result| CatalogEvent::CreatorAdded {
                provisional,
                works,
                result,
            },
        );
        Ok((provisional, task))
    }

    pub fn update_creator_name(
        &mut self,
        id: CreatorId,
        name: impl Into<String>,
    ) -> Result<Task<CatalogMessage>, StateError> {
        self.creators.ensure_loaded()?;
        persisted::<Creator>(id)?;
        let name = name.into();
        let local = name.clone();
        self.creators.update(id, |creator| creator.name = local)?;
        Ok(self.confirm(
            Endpoint::UpdateCreatorName,
            vec![EntityKind::Creator],
            move |gateway| gateway.update_creator_name(id, &name),
        ))
    }

    /// Detach the creator from all its works, then remove it.
    pub fn remove_creator(&mut self, id: CreatorId) -> Result<Task<CatalogMessage>, StateError> {
        self.works.ensure_loaded()?;
        self.creators.ensure_loaded()?;
        persisted::<Creator>(id)?;
        let detached = relationship::sever_creator(&mut self.works, &mut self.creators, id)?;
        self.creators.remove(id);
        debug!(%id, works = detached.len(), "removed creator locally");
        Ok(self.confirm(
            Endpoint::RemoveCreator,
            vec![EntityKind::Work, EntityKind::Creator],
            move |gateway| gateway.remove_creator(id),
        ))
    }

    // =========================================================================
    // RELATIONSHIPS
    // =========================================================================

    fn check_pair(&self, work: WorkId, creator: CreatorId) -> Result<(), StateError> {
        self.works.ensure_loaded()?;
        self.creators.ensure_loaded()?;
        persisted::<Work>(work)?;
        persisted::<Creator>(creator)?;
        self.works.get(work)?;
        self.creators.get(creator)?;
        Ok(())
    }

    /// Relate a work and a creator. Already-related pairs are left alone
    /// and no request is sent.
    pub fn attach(
        &mut self,
        work: WorkId,
        creator: CreatorId,
    ) -> Result<Task<CatalogMessage>, StateError> {
        self.check_pair(work, creator)?;
        if relationship::is_linked(&self.works, &self.creators, work, creator) {
            debug!(%work, %creator, "already attached");
            return Ok(Task::none());
        }
        relationship::link(&mut self.works, &mut self.creators, work, creator)?;
        Ok(self.confirm(
            Endpoint::Attach,
            vec![EntityKind::Work, EntityKind::Creator],
            move |gateway| gateway.attach(work, creator),
        ))
    }

    /// Unrelate a work and a creator. Unrelated pairs are left alone.
    pub fn detach(
        &mut self,
        work: WorkId,
        creator: CreatorId,
    ) -> Result<Task<CatalogMessage>, StateError> {
        self.check_pair(work, creator)?;
        if !relationship::unlink(&mut self.works, &mut self.creators, work, creator)? {
            debug!(%work, %creator, "already detached");
            return Ok(Task::none());
        }
        Ok(self.confirm(
            Endpoint::Detach,
            vec![EntityKind::Work, EntityKind::Creator],
            move |gateway| gateway.detach(work, creator),
        ))
    }

    // =========================================================================
    // TAXONOMIES
    // =========================================================================

    /// Append a taxonomy entry under a provisional id.
    pub fn add_taxonomy<T: CatalogTaxonomy>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<(T::Id, Task<CatalogMessage>), StateError> {
        T::store(self).ensure_loaded()?;
        let name = name.into();
        let raw = self.next_provisional();
        let provisional = T::Id::from(raw);
        T::store_mut(self).push(T::create(provisional, name.clone()));
        debug!(kind = %T::KIND, id = raw, %name, "added provisional entry");
        let task = self.request(
            move |gateway| T::add(gateway, &name).map(Into::into),
            move |result| CatalogEvent::TaxonomyAdded {
                kind: T::KIND,
                provisional: raw,
                result,
            },
        );
        Ok((provisional, task))
    }

    /// Remove a taxonomy entry. The backend refuses entries still used by
    /// a work; the store is then reloaded.
    pub fn remove_taxonomy<T: CatalogTaxonomy>(
        &mut self,
        id: T::Id,
    ) -> Result<Task<CatalogMessage>, StateError> {
        T::store(self).ensure_loaded()?;
        persisted::<T>(id)?;
        T::store(self).get(id)?;
        T::store_mut(self).remove(id);
        Ok(self.confirm(T::REMOVE, vec![T::KIND], move |gateway| {
            T::remove(gateway, id)
        }))
    }

    pub fn rename_taxonomy<T: CatalogTaxonomy>(
        &mut self,
        id: T::Id,
        name: impl Into<String>,
    ) -> Result<Task<CatalogMessage>, StateError> {
        T::store(self).ensure_loaded()?;
        persisted::<T>(id)?;
        let name = name.into();
        let local = name.clone();
        T::store_mut(self).update(id, |entry| entry.set_name(local))?;
        Ok(self.confirm(T::RENAME, vec![T::KIND], move |gateway| {
            T::rename(gateway, id, &name)
        }))
    }

    /// Move `moved` to the display position of `target`.
    pub fn reorder_taxonomy<T: CatalogTaxonomy>(
        &mut self,
        moved: T::Id,
        target: T::Id,
    ) -> Result<Task<CatalogMessage>, StateError> {
        T::store(self).ensure_loaded()?;
        persisted::<T>(moved)?;
        persisted::<T>(target)?;
        if moved == target {
            return Ok(Task::none());
        }
        T::store_mut(self).reorder(moved, target)?;
        Ok(self.confirm(T::REORDER, vec![T::KIND], move |gateway| {
            T::reorder(gateway, moved, target)
        }))
    }

    pub fn add_status(
        &mut self,
        name: impl Into<String>,
    ) -> Result<(StatusId, Task<CatalogMessage>), StateError> {
        self.add_taxonomy::<Status>(name)
    }

    pub fn remove_status(&mut self, id: StatusId) -> Result<Task<CatalogMessage>, StateError> {
        self.remove_taxonomy::<Status>(id)
    }

    pub fn rename_status(
        &mut self,
        id: StatusId,
        name: impl Into<String>,
    ) -> Result<Task<CatalogMessage>, StateError> {
        self.rename_taxonomy::<Status>(id, name)
    }

    pub fn reorder_statuses(
        &mut self,
        moved: StatusId,
        target: StatusId,
    ) -> Result<Task<CatalogMessage>, StateError> {
        self.reorder_taxonomy::<Status>(moved, target)
    }

    /// Flag or unflag a status for the update view.
    pub fn set_status_update(
        &mut self,
        id: StatusId,
        is_update: bool,
    ) -> Result<Task<CatalogMessage>, StateError> {
        self.statuses.ensure_loaded()?;
        persisted::<Status>(id)?;
        self.statuses.update(id, |status| status.is_update = is_update)?;
        Ok(self.confirm(
            Endpoint::UpdateStatus,
            vec![EntityKind::Status],
            move |gateway| gateway.update_status(id, is_update),
        ))
    }

    pub fn add_type(
        &mut self,
        name: impl Into<String>,
    ) -> Result<(WorkTypeId, Task<CatalogMessage>), StateError> {
        self.add_taxonomy::<WorkType>(name)
    }

    pub fn remove_type(&mut self, id: WorkTypeId) -> Result<Task<CatalogMessage>, StateError> {
        self.remove_taxonomy::<WorkType>(id)
    }

    pub fn rename_type(
        &mut self,
        id: WorkTypeId,
        name: impl Into<String>,
    ) -> Result<Task<CatalogMessage>, StateError> {
        self.rename_taxonomy::<WorkType>(id, name)
    }

    pub fn reorder_types(
        &mut self,
        moved: WorkTypeId,
        target: WorkTypeId,
    ) -> Result<Task<CatalogMessage>, StateError> {
        self.reorder_taxonomy::<WorkType>(moved, target)
    }

    pub fn add_format(
        &mut self,
        name: impl Into<String>,
    ) -> Result<(FormatId, Task<CatalogMessage>), StateError> {
        self.add_taxonomy::<Format>(name)
    }

    pub fn remove_format(&mut self, id: FormatId) -> Result<Task<CatalogMessage>, StateError> {
        self.remove_taxonomy::<Format>(id)
    }

    pub fn rename_format(
        &mut self,
        id: FormatId,
        name: impl Into<String>,
    ) -> Result<Task<CatalogMessage>, StateError> {
        self.rename_taxonomy::<Format>(id, name)
    }

    pub fn reorder_formats(
        &mut self,
        moved: FormatId,
        target: FormatId,
    ) -> Result<Task<CatalogMessage>, StateError> {
        self.reorder_taxonomy::<Format>(moved, target)
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Apply one backend response.
    pub fn update(&mut self, message: CatalogMessage) -> Task<CatalogMessage> {
        if message.epoch != self.epoch {
            debug!(
                message_epoch = message.epoch,
                epoch = self.epoch,
                "dropping response from a previous connection"
            );
            return Task::none();
        }

        match message.event {
            CatalogEvent::WorksLoaded(Ok(works)) => {
                self.works.replace(works);
                self.repair_after_reload(EntityKind::Creator)
            }
            CatalogEvent::WorksLoaded(Err(error)) => {
                self.works.fail_load();
                self.reject(Endpoint::GetWorks, &error);
                Task::none()
            }
            CatalogEvent::CreatorsLoaded(Ok(creators)) => {
                self.creators.replace(creators);
                self.repair_after_reload(EntityKind::Work)
            }
            CatalogEvent::CreatorsLoaded(Err(error)) => {
                self.creators.fail_load();
                self.reject(Endpoint::GetCreators, &error);
                Task::none()
            }
            CatalogEvent::StatusesLoaded(result) => self.taxonomy_loaded(result),
            CatalogEvent::TypesLoaded(result) => self.taxonomy_loaded(result),
            CatalogEvent::FormatsLoaded(result) => self.taxonomy_loaded(result),
            CatalogEvent::WorkAdded {
                provisional,
                creators,
                result,
            } => self.work_added(provisional, creators, result),
            CatalogEvent::CreatorAdded {
                provisional,
                works,
                result,
            } => self.creator_added(provisional, works, result),
            CatalogEvent::TaxonomyAdded {
                kind,
                provisional,
                result,
            } => match kind {
                EntityKind::Status => self.taxonomy_added::<Status>(provisional, result),
                EntityKind::Type => self.taxonomy_added::<WorkType>(provisional, result),
                EntityKind::Format => self.taxonomy_added::<Format>(provisional, result),
                EntityKind::Work | EntityKind::Creator => {
                    warn!(%kind, "taxonomy confirmation for a non-taxonomy kind");
                    Task::none()
                }
            },
            CatalogEvent::Confirmed {
                endpoint,
                reload,
                result,
            } => match result {
                Ok(()) => {
                    debug!(%endpoint, "backend confirmed");
                    Task::none()
                }
                Err(error) => {
                    self.reject(endpoint, &error);
                    let reloads: Vec<_> = reload.into_iter().map(|kind| self.load(kind)).collect();
                    Task::batch(reloads)
                }
            },
        }
    }

    /// After one side was replaced, refetch `stale` if the two snapshots
    /// disagree. A second disagreement right after a repair is only logged.
    fn repair_after_reload(&mut self, stale: EntityKind) -> Task<CatalogMessage> {
        if self.works.phase() != Phase::Ready || self.creators.phase() != Phase::Ready {
            return Task::none();
        }
        let broken = self.audit();
        if broken.is_empty() {
            self.repairing = false;
            return Task::none();
        }
        if std::mem::replace(&mut self.repairing, false) {
            warn!(pairs = broken.len(), "cross-references still differ after reload");
            return Task::none();
        }
        debug!(pairs = broken.len(), %stale, "cross-references differ, reloading");
        self.repairing = true;
        self.load(stale)
    }

    fn taxonomy_loaded<T: CatalogTaxonomy>(
        &mut self,
        result: BackendResult<Vec<T>>,
    ) -> Task<CatalogMessage> {
        match result {
            Ok(entries) => T::store_mut(self).replace(entries),
            Err(error) => {
                T::store_mut(self).fail_load();
                self.reject(T::FETCH, &error);
            }
        }
        Task::none()
    }

    fn work_added(
        &mut self,
        provisional: WorkId,
        creators: Vec<CreatorId>,
        result: BackendResult<WorkId>,
    ) -> Task<CatalogMessage> {
        match result {
            Ok(id) => {
                self.resolved.insert(provisional.get(), id.get());
                if !self.works.rekey(provisional, id) {
                    // A reload replaced the store while the request was in
                    // flight. Either side may predate the commit.
                    return Task::batch([
                        self.load(EntityKind::Work),
                        self.load(EntityKind::Creator),
                    ]);
                }
                debug!(%provisional, %id, "work confirmed");
                for creator in creators {
                    // Misses are logged by the store and skipped.
                    let _ = relationship::link(&mut self.works, &mut self.creators, id, creator);
                }
                Task::none()
            }
            Err(error) => {
                self.works.remove(provisional);
                self.reject(Endpoint::AddWork, &error);
                Task::none()
            }
        }
    }

    fn creator_added(
        &mut self,
        provisional: CreatorId,
        works: Vec<WorkId>,
        result: BackendResult<CreatorId>,
    ) -> Task<CatalogMessage> {
        match result {
            Ok(id) => {
                self.resolved.insert(provisional.get(), id.get());
                if !self.creators.rekey(provisional, id) {
                    return Task::batch([
                        self.load(EntityKind::Work),
                        self.load(EntityKind::Creator),
                    ]);
                }
                debug!(%provisional, %id, "creator confirmed");
                for work in works {
                    let _ = relationship::link(&mut self.works, &mut self.creators, work, id);
                }
                Task::none()
            }
            Err(error) => {
                self.creators.remove(provisional);
                self.reject(Endpoint::AddCreator, &error);
                Task::none()
            }
        }
    }

    fn taxonomy_added<T: CatalogTaxonomy>(
        &mut self,
        provisional: i64,
        result: BackendResult<i64>,
    ) -> Task<CatalogMessage> {
        let raw = provisional;
        let provisional = T::Id::from(provisional);
        match result {
            Ok(id) => {
                self.resolved.insert(raw, id);
                let id = T::Id::from(id);
                if T::store_mut(self).rekey(provisional, id) || T::store(self).contains(id) {
                    return Task::none();
                }
                self.load(T::KIND)
            }
            Err(error) => {
                T::store_mut(self).remove(provisional);
                self.reject(T::ADD, &error);
                Task::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_backend::MemoryGateway;

    #[test]
    fn test_persisted_rejects_unsaved_and_provisional_ids() {
        assert!(persisted::<Work>(WorkId(4)).is_ok());
        assert_eq!(
            persisted::<Work>(WorkId(-2)),
            Err(StateError::provisional(EntityKind::Work, -2))
        );
        assert!(persisted::<Status>(StatusId::UNSAVED).is_err());
    }

    #[test]
    fn test_resolve_passes_persisted_ids_through() {
        let catalog = Catalog::new(Arc::new(MemoryGateway::new()));
        assert_eq!(catalog.resolve::<Creator>(CreatorId(3)), Some(CreatorId(3)));
        assert_eq!(catalog.resolve::<Creator>(CreatorId(-1)), None);
    }

    #[test]
    fn test_mutators_wait_for_first_load() {
        let mut catalog = Catalog::new(Arc::new(MemoryGateway::opened("db")));
        assert_eq!(
            catalog.add_status("Reading").map(|(id, _)| id),
            Err(StateError::Uninitialized(EntityKind::Status))
        );
        assert_eq!(
            catalog.attach(WorkId(1), CreatorId(1)).map(|task| task.len()),
            Err(StateError::Uninitialized(EntityKind::Work))
        );
    }
}
