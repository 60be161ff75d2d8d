//! In-memory gateway.
//!
//! Keeps one dataset per opened path for the life of the process. Mirrors
//! the SQLite engine's rules (taxonomy references, in-use checks, duplicate
//! attachments) and supports failure injection so client code can be tested
//! against rejected requests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use shelf_model::{
    Creator, CreatorId, Entity, EntityKind, Format, FormatId, Status, StatusId, Taxonomy, Work,
    WorkId, WorkType, WorkTypeId, move_to_target,
};
use tokio::sync::broadcast;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{BackendError, Result};
use crate::gateway::{BackendEvent, EVENT_CAPACITY, Gateway, now_millis};
use crate::{DEFAULT_FORMATS, DEFAULT_TYPES};

#[derive(Debug, Default)]
struct Dataset {
    works: BTreeMap<WorkId, Work>,
    creators: BTreeMap<CreatorId, Creator>,
    statuses: Vec<Status>,
    types: Vec<WorkType>,
    formats: Vec<Format>,
    last_id: i64,
}

impl Dataset {
    fn seeded() -> Self {
        let mut dataset = Self::default();
        for name in DEFAULT_TYPES {
            let id = dataset.next_id();
            add_entry(&mut dataset.types, id, name);
        }
        for name in DEFAULT_FORMATS {
            let id = dataset.next_id();
            add_entry(&mut dataset.formats, id, name);
        }
        dataset
    }

    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn work_mut(&mut self, id: WorkId) -> Result<&mut Work> {
        self.works
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found(EntityKind::Work, id))
    }

    fn creator_mut(&mut self, id: CreatorId) -> Result<&mut Creator> {
        self.creators
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found(EntityKind::Creator, id))
    }

    fn check_references(
        &self,
        status: StatusId,
        work_type: WorkTypeId,
        format: FormatId,
    ) -> Result<()> {
        let valid = self.statuses.iter().any(|s| s.id == status)
            && self.types.iter().any(|t| t.id == work_type)
            && self.formats.iter().any(|f| f.id == format);
        if valid {
            Ok(())
        } else {
            Err(BackendError::Constraint("Invalid work".into()))
        }
    }

    fn attach(&mut self, work: WorkId, creator: CreatorId) -> Result<()> {
        if !self.creators.contains_key(&creator) {
            return Err(BackendError::not_found(EntityKind::Creator, creator));
        }
        if !self.work_mut(work)?.add_creator(creator) {
            return Err(BackendError::Constraint(format!(
                "Work [{work}] is already attached to Creator [{creator}]"
            )));
        }
        self.creator_mut(creator)?.add_work(work);
        Ok(())
    }

    fn detach(&mut self, work: WorkId, creator: CreatorId) -> Result<()> {
        let removed = self.work_mut(work)?.remove_creator(creator);
        if !removed {
            return Err(BackendError::Rejected("Expected to detach 1 item not 0".into()));
        }
        self.creator_mut(creator)?.remove_work(work);
        Ok(())
    }
}

fn add_entry<T: Taxonomy>(list: &mut Vec<T>, id: i64, name: &str) -> T::Id {
    let id = T::Id::from(id);
    list.push(T::create(id, name.to_string()));
    id
}

fn entry_mut<T: Taxonomy>(list: &mut [T], id: T::Id) -> Result<&mut T> {
    list.iter_mut()
        .find(|entry| entry.id() == id)
        .ok_or_else(|| BackendError::not_found(T::KIND, id))
}

fn remove_entry<T: Taxonomy>(list: &mut Vec<T>, id: T::Id, in_use: bool) -> Result<()> {
    let index = list
        .iter()
        .position(|entry| entry.id() == id)
        .ok_or_else(|| BackendError::not_found(T::KIND, id))?;
    if in_use {
        return Err(BackendError::Constraint(format!("{} still in use", T::KIND.label())));
    }
    list.remove(index);
    Ok(())
}

fn reorder_entries<T: Taxonomy>(list: &mut Vec<T>, moved: T::Id, target: T::Id) -> Result<()> {
    if move_to_target(list, |entry: &T| entry.id(), &moved, &target) {
        Ok(())
    } else {
        Err(BackendError::Rejected(format!(
            "Cannot reorder {} [{}] onto [{}]",
            T::KIND.plural(),
            Into::<i64>::into(moved),
            Into::<i64>::into(target)
        )))
    }
}

#[derive(Debug, Default)]
struct Failures {
    once: HashMap<Endpoint, VecDeque<String>>,
    always: HashMap<Endpoint, String>,
}

impl Failures {
    fn take(&mut self, endpoint: Endpoint) -> Option<String> {
        if let Some(reason) = self.once.get_mut(&endpoint).and_then(VecDeque::pop_front) {
            return Some(reason);
        }
        self.always.get(&endpoint).cloned()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    databases: HashMap<String, Dataset>,
    current: Option<String>,
    failures: Failures,
    calls: Vec<Endpoint>,
}

/// Process-local gateway backed by plain collections.
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
    events: broadcast::Sender<BackendEvent>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    /// Create a gateway with no database open.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            events,
        }
    }

    /// Create a gateway with the dataset `name` already open.
    pub fn opened(name: &str) -> Self {
        let gateway = Self::new();
        {
            let mut state = gateway.lock();
            state.databases.insert(name.to_string(), Dataset::seeded());
            state.current = Some(name.to_string());
        }
        gateway
    }

    /// Reject the next call to `endpoint` with `reason`.
    pub fn fail_next(&self, endpoint: Endpoint, reason: impl Into<String>) {
        self.lock()
            .failures
            .once
            .entry(endpoint)
            .or_default()
            .push_back(reason.into());
    }

    /// Reject every call to `endpoint` until [`clear_failures`](Self::clear_failures).
    pub fn fail_always(&self, endpoint: Endpoint, reason: impl Into<String>) {
        self.lock().failures.always.insert(endpoint, reason.into());
    }

    pub fn clear_failures(&self) {
        self.lock().failures = Failures::default();
    }

    /// Endpoints called so far, in call order.
    pub fn calls(&self) -> Vec<Endpoint> {
        self.lock().calls.clone()
    }

    /// Number of calls made to `endpoint`.
    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.iter().filter(|call| **call == endpoint).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_data<T>(
        &self,
        endpoint: Endpoint,
        f: impl FnOnce(&mut Dataset) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.calls.push(endpoint);
        if let Some(reason) = state.failures.take(endpoint) {
            debug!(%endpoint, %reason, "injected failure");
            return Err(BackendError::Rejected(reason));
        }
        let current = state.current.as_ref().ok_or(BackendError::NoConnection)?;
        let dataset = state
            .databases
            .get_mut(current)
            .ok_or(BackendError::NoConnection)?;
        f(dataset)
    }
}

impl Gateway for MemoryGateway {
    fn open(&self, path: &Path) -> Result<()> {
        let name = path.display().to_string();
        {
            let mut state = self.lock();
            state.calls.push(Endpoint::Open);
            if let Some(reason) = state.failures.take(Endpoint::Open) {
                return Err(BackendError::Rejected(reason));
            }
            state
                .databases
                .entry(name.clone())
                .or_insert_with(Dataset::seeded);
            state.current = Some(name.clone());
        }
        // No subscribers is not an error.
        let _ = self.events.send(BackendEvent::Opened(name));
        Ok(())
    }

    fn close(&self) -> Result<()> {
        {
            let mut state = self.lock();
            state.calls.push(Endpoint::Close);
            if state.current.take().is_none() {
                return Err(BackendError::NoConnection);
            }
        }
        let _ = self.events.send(BackendEvent::Closed);
        Ok(())
    }

    fn database_path(&self) -> Option<String> {
        self.lock().current.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<BackendEvent> {
        self.events.subscribe()
    }

    fn get_works(&self) -> Result<Vec<Work>> {
        self.with_data(Endpoint::GetWorks, |data| Ok(data.works.values().cloned().collect()))
    }

    fn get_work(&self, id: WorkId) -> Result<Work> {
        self.with_data(Endpoint::GetWork, |data| data.work_mut(id).map(|work| work.clone()))
    }

    fn add_work(&self, work: &Work) -> Result<WorkId> {
        self.with_data(Endpoint::AddWork, |data| {
            data.check_references(work.status, work.work_type, work.format)?;
            if let Some(missing) = work.creators.iter().find(|c| !data.creators.contains_key(*c)) {
                return Err(BackendError::not_found(EntityKind::Creator, *missing));
            }
            let id = WorkId(data.next_id());
            let now = now_millis();
            let mut stored = work.clone();
            stored.id = id;
            stored.added = now;
            stored.updated = now;
            stored.creators.clear();
            data.works.insert(id, stored);
            for creator in &work.creators {
                if !data.work_mut(id)?.has_creator(*creator) {
                    data.attach(id, *creator)?;
                }
            }
            Ok(id)
        })
    }

    fn update_work_name(&self, id: WorkId, name: &str) -> Result<()> {
        self.with_data(Endpoint::UpdateWorkName, |data| {
            data.work_mut(id)?.name = name.to_string();
            Ok(())
        })
    }

    fn update_work_progress(&self, id: WorkId, progress: &str, timestamp: i64) -> Result<()> {
        self.with_data(Endpoint::UpdateWorkProgress, |data| {
            let work = data.work_mut(id)?;
            work.progress = progress.to_string();
            work.updated = timestamp;
            Ok(())
        })
    }

    fn update_work_status(&self, id: WorkId, status: StatusId, timestamp: i64) -> Result<()> {
        self.with_data(Endpoint::UpdateWorkStatus, |data| {
            if !data.statuses.iter().any(|s| s.id == status) {
                return Err(BackendError::Constraint("Invalid work update value".into()));
            }
            let work = data.work_mut(id)?;
            work.status = status;
            work.updated = timestamp;
            Ok(())
        })
    }

    fn update_work_type(&self, id: WorkId, work_type: WorkTypeId) -> Result<()> {
        self.with_data(Endpoint::UpdateWorkType, |data| {
            if !data.types.iter().any(|t| t.id == work_type) {
                return Err(BackendError::Constraint("Invalid work update value".into()));
            }
            data.work_mut(id)?.work_type = work_type;
            Ok(())
        })
    }

    fn update_work_format(&self, id: WorkId, format: FormatId) -> Result<()> {
        self.with_data(Endpoint::UpdateWorkFormat, |data| {
            if !data.formats.iter().any(|f| f.id == format) {
                return Err(BackendError::Constraint("Invalid work update value".into()));
            }
            data.work_mut(id)?.format = format;
            Ok(())
        })
    }

    fn remove_work(&self, id: WorkId) -> Result<()> {
        self.with_data(Endpoint::RemoveWork, |data| {
            let work = data
                .works
                .remove(&id)
                .ok_or_else(|| BackendError::not_found(EntityKind::Work, id))?;
            for creator in work.creators {
                if let Some(creator) = data.creators.get_mut(&creator) {
                    creator.remove_work(id);
                }
            }
            Ok(())
        })
    }

    fn get_creators(&self) -> Result<Vec<Creator>> {
        self.with_data(Endpoint::GetCreators, |data| Ok(data.creators.values().cloned().collect()))
    }

    fn get_creator(&self, id: CreatorId) -> Result<Creator> {
        self.with_data(Endpoint::GetCreator, |data| data.creator_mut(id).map(|c| c.clone()))
    }

    fn add_creator(&self, creator: &Creator) -> Result<CreatorId> {
        self.with_data(Endpoint::AddCreator, |data| {
            if let Some(missing) = creator.works.iter().find(|w| !data.works.contains_key(*w)) {
                return Err(BackendError::not_found(EntityKind::Work, *missing));
            }
            let id = CreatorId(data.next_id());
            data.creators.insert(
                id,
                Creator {
                    id,
                    name: creator.name.clone(),
                    works: Vec::new(),
                },
            );
            for work in &creator.works {
                if !data.creator_mut(id)?.has_work(*work) {
                    data.attach(*work, id)?;
                }
            }
            Ok(id)
        })
    }

    fn update_creator_name(&self, id: CreatorId, name: &str) -> Result<()> {
        self.with_data(Endpoint::UpdateCreatorName, |data| {
            data.creator_mut(id)?.name = name.to_string();
            Ok(())
        })
    }

    fn remove_creator(&self, id: CreatorId) -> Result<()> {
        self.with_data(Endpoint::RemoveCreator, |data| {
            let creator = data
                .creators
                .remove(&id)
                .ok_or_else(|| BackendError::not_found(EntityKind::Creator, id))?;
            for work in creator.works {
                if let Some(work) = data.works.get_mut(&work) {
                    work.remove_creator(id);
                }
            }
            Ok(())
        })
    }

    fn attach(&self, work: WorkId, creator: CreatorId) -> Result<()> {
        self.with_data(Endpoint::Attach, |data| data.attach(work, creator))
    }

    fn detach(&self, work: WorkId, creator: CreatorId) -> Result<()> {
        self.with_data(Endpoint::Detach, |data| data.detach(work, creator))
    }

    fn get_statuses(&self) -> Result<Vec<Status>> {
        self.with_data(Endpoint::GetStatuses, |data| Ok(data.statuses.clone()))
    }

    fn add_status(&self, name: &str) -> Result<StatusId> {
        self.with_data(Endpoint::AddStatus, |data| {
            let id = data.next_id();
            Ok(add_entry(&mut data.statuses, id, name))
        })
    }

    fn remove_status(&self, id: StatusId) -> Result<()> {
        self.with_data(Endpoint::RemoveStatus, |data| {
            let in_use = data.works.values().any(|w| w.status == id);
            remove_entry(&mut data.statuses, id, in_use)
        })
    }

    fn rename_status(&self, id: StatusId, name: &str) -> Result<()> {
        self.with_data(Endpoint::RenameStatus, |data| {
            entry_mut(&mut data.statuses, id)?.set_name(name.to_string());
            Ok(())
        })
    }

    fn update_status(&self, id: StatusId, is_update: bool) -> Result<()> {
        self.with_data(Endpoint::UpdateStatus, |data| {
            entry_mut(&mut data.statuses, id)?.is_update = is_update;
            Ok(())
        })
    }

    fn reorder_statuses(&self, moved: StatusId, target: StatusId) -> Result<()> {
        self.with_data(Endpoint::ReorderStatuses, |data| {
            reorder_entries(&mut data.statuses, moved, target)
        })
    }

    fn get_types(&self) -> Result<Vec<WorkType>> {
        self.with_data(Endpoint::GetTypes, |data| Ok(data.types.clone()))
    }

    fn add_type(&self, name: &str) -> Result<WorkTypeId> {
        self.with_data(Endpoint::AddType, |data| {
            let id = data.next_id();
            Ok(add_entry(&mut data.types, id, name))
        })
    }

    fn remove_type(&self, id: WorkTypeId) -> Result<()> {
        self.with_data(Endpoint::RemoveType, |data| {
            let in_use = data.works.values().any(|w| w.work_type == id);
            remove_entry(&mut data.types, id, in_use)
        })
    }

    fn rename_type(&self, id: WorkTypeId, name: &str) -> Result<()> {
        self.with_data(Endpoint::RenameType, |data| {
            entry_mut(&mut data.types, id)?.set_name(name.to_string());
            Ok(())
        })
    }

    fn reorder_types(&self, moved: WorkTypeId, target: WorkTypeId) -> Result<()> {
        self.with_data(Endpoint::ReorderTypes, |data| {
            reorder_entries(&mut data.types, moved, target)
        })
    }

    fn get_formats(&self) -> Result<Vec<Format>> {
        self.with_data(Endpoint::GetFormats, |data| Ok(data.formats.clone()))
    }

    fn add_format(&self, name: &str) -> Result<FormatId> {
        self.with_data(Endpoint::AddFormat, |data| {
            let id = data.next_id();
            Ok(add_entry(&mut data.formats, id, name))
        })
    }

    fn remove_format(&self, id: FormatId) -> Result<()> {
        self.with_data(Endpoint::RemoveFormat, |data| {
            let in_use = data.works.values().any(|w| w.format == id);
            remove_entry(&mut data.formats, id, in_use)
        })
    }

    fn rename_format(&self, id: FormatId, name: &str) -> Result<()> {
        self.with_data(Endpoint::RenameFormat, |data| {
            entry_mut(&mut data.formats, id)?.set_name(name.to_string());
            Ok(())
        })
    }

    fn reorder_formats(&self, moved: FormatId, target: FormatId) -> Result<()> {
        self.with_data(Endpoint::ReorderFormats, |data| {
            reorder_entries(&mut data.formats, moved, target)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_gateway_has_no_connection() {
        let gateway = MemoryGateway::new();
        assert!(gateway.database_path().is_none());
        assert!(matches!(gateway.get_works(), Err(BackendError::NoConnection)));
    }

    #[test]
    fn test_opened_dataset_is_seeded() {
        let gateway = MemoryGateway::opened("library");
        assert_eq!(gateway.get_types().unwrap().len(), DEFAULT_TYPES.len());
        assert_eq!(gateway.get_formats().unwrap().len(), DEFAULT_FORMATS.len());
        assert!(gateway.get_statuses().unwrap().is_empty());
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let gateway = MemoryGateway::opened("library");
        gateway.fail_next(Endpoint::GetStatuses, "boom");
        let error = gateway.get_statuses().unwrap_err();
        assert_eq!(error.to_string(), "boom");
        assert!(gateway.get_statuses().is_ok());
        assert_eq!(gateway.call_count(Endpoint::GetStatuses), 2);
    }

    #[test]
    fn test_reopening_keeps_dataset() {
        let gateway = MemoryGateway::opened("a");
        gateway.add_status("Reading").unwrap();
        gateway.open(Path::new("b")).unwrap();
        assert!(gateway.get_statuses().unwrap().is_empty());
        gateway.open(Path::new("a")).unwrap();
        assert_eq!(gateway.get_statuses().unwrap().len(), 1);
    }
}
