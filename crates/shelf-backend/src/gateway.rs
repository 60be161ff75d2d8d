//! The request/response contract consumed by the client state layer.
//!
//! Gateway calls are synchronous: the storage engines are local and cheap,
//! and the client moves each call onto a blocking thread so the event loop
//! never waits on one.

use std::path::Path;

use shelf_model::{
    Creator, CreatorId, Format, FormatId, Status, StatusId, Taxonomy, Work, WorkId, WorkType,
    WorkTypeId,
};
use tokio::sync::broadcast;

use crate::endpoint::Endpoint;
use crate::error::Result;

/// Lifecycle notification pushed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// A database was opened. Payload identifies the new connection.
    Opened(String),
    /// The open database was closed.
    Closed,
}

/// Capacity of the lifecycle event channel.
pub const EVENT_CAPACITY: usize = 16;

/// Storage engine contract.
pub trait Gateway: Send + Sync {
    // =========================================================================
    // CONNECTION
    // =========================================================================

    /// Open (or create) the database at `path`, replacing any open one.
    /// Emits [`BackendEvent::Opened`].
    fn open(&self, path: &Path) -> Result<()>;

    /// Close the open database. Emits [`BackendEvent::Closed`].
    fn close(&self) -> Result<()>;

    /// Identifier of the open database, `None` when nothing is open.
    fn database_path(&self) -> Option<String>;

    /// Subscribe to lifecycle notifications.
    fn subscribe(&self) -> broadcast::Receiver<BackendEvent>;

    // =========================================================================
    // WORKS
    // =========================================================================

    fn get_works(&self) -> Result<Vec<Work>>;

    fn get_work(&self, id: WorkId) -> Result<Work>;

    /// Insert a work and attach `work.creators`. Returns the assigned id.
    fn add_work(&self, work: &Work) -> Result<WorkId>;

    fn update_work_name(&self, id: WorkId, name: &str) -> Result<()>;

    fn update_work_progress(&self, id: WorkId, progress: &str, timestamp: i64) -> Result<()>;

    fn update_work_status(&self, id: WorkId, status: StatusId, timestamp: i64) -> Result<()>;

    fn update_work_type(&self, id: WorkId, work_type: WorkTypeId) -> Result<()>;

    fn update_work_format(&self, id: WorkId, format: FormatId) -> Result<()>;

    fn remove_work(&self, id: WorkId) -> Result<()>;

    // =========================================================================
    // CREATORS
    // =========================================================================

    fn get_creators(&self) -> Result<Vec<Creator>>;

    fn get_creator(&self, id: CreatorId) -> Result<Creator>;

    /// Insert a creator and attach `creator.works`. Returns the assigned id.
    fn add_creator(&self, creator: &Creator) -> Result<CreatorId>;

    fn update_creator_name(&self, id: CreatorId, name: &str) -> Result<()>;

    fn remove_creator(&self, id: CreatorId) -> Result<()>;

    // =========================================================================
    // RELATIONSHIPS
    // =========================================================================

    fn attach(&self, work: WorkId, creator: CreatorId) -> Result<()>;

    fn detach(&self, work: WorkId, creator: CreatorId) -> Result<()>;

    // =========================================================================
    // TAXONOMIES
    // =========================================================================

    /// Statuses in display order.
    fn get_statuses(&self) -> Result<Vec<Status>>;

    fn add_status(&self, name: &str) -> Result<StatusId>;

    fn remove_status(&self, id: StatusId) -> Result<()>;

    fn rename_status(&self, id: StatusId, name: &str) -> Result<()>;

    /// Set the update-view flag of a status.
    fn update_status(&self, id: StatusId, is_update: bool) -> Result<()>;

    fn reorder_statuses(&self, moved: StatusId, target: StatusId) -> Result<()>;

    /// Types in display order.
    fn get_types(&self) -> Result<Vec<WorkType>>;

    fn add_type(&self, name: &str) -> Result<WorkTypeId>;

    fn remove_type(&self, id: WorkTypeId) -> Result<()>;

    fn rename_type(&self, id: WorkTypeId, name: &str) -> Result<()>;

    fn reorder_types(&self, moved: WorkTypeId, target: WorkTypeId) -> Result<()>;

    /// Formats in display order.
    fn get_formats(&self) -> Result<Vec<Format>>;

    fn add_format(&self, name: &str) -> Result<FormatId>;

    fn remove_format(&self, id: FormatId) -> Result<()>;

    fn rename_format(&self, id: FormatId, name: &str) -> Result<()>;

    fn reorder_formats(&self, moved: FormatId, target: FormatId) -> Result<()>;
}

/// Per-taxonomy dispatch onto the gateway, so ordered stores can be generic
/// over statuses, types and formats.
pub trait TaxonomyEndpoints: Taxonomy {
    const FETCH: Endpoint;
    const ADD: Endpoint;
    const REMOVE: Endpoint;
    const RENAME: Endpoint;
    const REORDER: Endpoint;

    fn fetch(gateway: &dyn Gateway) -> Result<Vec<Self>>;

    fn add(gateway: &dyn Gateway, name: &str) -> Result<Self::Id>;

    fn remove(gateway: &dyn Gateway, id: Self::Id) -> Result<()>;

    fn rename(gateway: &dyn Gateway, id: Self::Id, name: &str) -> Result<()>;

    fn reorder(gateway: &dyn Gateway, moved: Self::Id, target: Self::Id) -> Result<()>;
}

macro_rules! taxonomy_endpoints {
    (
        $ty:ty, $id:ty,
        [$fetch_ep:ident, $add_ep:ident, $remove_ep:ident, $rename_ep:ident, $reorder_ep:ident],
        [$fetch:ident, $add:ident, $remove:ident, $rename:ident, $reorder:ident]
    ) => {
        impl TaxonomyEndpoints for $ty {
            const FETCH: Endpoint = Endpoint::$fetch_ep;
            const ADD: Endpoint = Endpoint::$add_ep;
            const REMOVE: Endpoint = Endpoint::$remove_ep;
            const RENAME: Endpoint = Endpoint::$rename_ep;
            const REORDER: Endpoint = Endpoint::$reorder_ep;

            fn fetch(gateway: &dyn Gateway) -> Result<Vec<Self>> {
                gateway.$fetch()
            }

            fn add(gateway: &dyn Gateway, name: &str) -> Result<$id> {
                gateway.$add(name)
            }

            fn remove(gateway: &dyn Gateway, id: $id) -> Result<()> {
                gateway.$remove(id)
            }

            fn rename(gateway: &dyn Gateway, id: $id, name: &str) -> Result<()> {
                gateway.$rename(id, name)
            }

            fn reorder(gateway: &dyn Gateway, moved: $id, target: $id) -> Result<()> {
                gateway.$reorder(moved, target)
            }
        }
    };
}

taxonomy_endpoints!(
    Status,
    StatusId,
    [GetStatuses, AddStatus, RemoveStatus, RenameStatus, ReorderStatuses],
    [get_statuses, add_status, remove_status, rename_status, reorder_statuses]
);
taxonomy_endpoints!(
    WorkType,
    WorkTypeId,
    [GetTypes, AddType, RemoveType, RenameType, ReorderTypes],
    [get_types, add_type, remove_type, rename_type, reorder_types]
);
taxonomy_endpoints!(
    Format,
    FormatId,
    [GetFormats, AddFormat, RemoveFormat, RenameFormat, ReorderFormats],
    [get_formats, add_format, remove_format, rename_format, reorder_formats]
);

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
