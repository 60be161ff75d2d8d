//! SQLite storage engine.
//!
//! One database file per library. Opening a file that already exists first
//! copies it to `<stem>-backup.db` next to the original. Taxonomy references
//! and in-use checks are enforced by triggers, so every client sees the same
//! rejection text.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, DatabaseName, OptionalExtension, Transaction, named_params};
use shelf_model::{
    Creator, CreatorId, EntityKind, Format, FormatId, Status, StatusId, Work, WorkId, WorkType,
    WorkTypeId, move_to_target,
};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::endpoint::Endpoint;
use crate::error::{BackendError, Result};
use crate::gateway::{BackendEvent, EVENT_CAPACITY, Gateway, now_millis};
use crate::{DEFAULT_FORMATS, DEFAULT_TYPES};

/// Current schema version, stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS statuses (
        id        INTEGER PRIMARY KEY,
        name      TEXT NOT NULL,
        is_update INTEGER DEFAULT 0 NOT NULL,
        position  INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS types (
        id       INTEGER PRIMARY KEY,
        name     TEXT NOT NULL,
        position INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS formats (
        id       INTEGER PRIMARY KEY,
        name     TEXT NOT NULL,
        position INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS works (
        id       INTEGER PRIMARY KEY,
        name     TEXT NOT NULL,
        progress TEXT NOT NULL,
        status   INTEGER NOT NULL,
        type     INTEGER NOT NULL,
        format   INTEGER NOT NULL,
        updated  INTEGER NOT NULL,
        added    INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS creators (
        id   INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS work_creator (
        work_id    INTEGER NOT NULL,
        creator_id INTEGER NOT NULL,
        PRIMARY KEY (work_id, creator_id),
        FOREIGN KEY (work_id)    REFERENCES works    (id) ON DELETE CASCADE,
        FOREIGN KEY (creator_id) REFERENCES creators (id) ON DELETE CASCADE
    );

    CREATE TRIGGER IF NOT EXISTS check_work_insert
        BEFORE INSERT ON works
        WHEN NEW.status NOT IN (SELECT id FROM statuses) OR
             NEW.type   NOT IN (SELECT id FROM types) OR
             NEW.format NOT IN (SELECT id FROM formats)
    BEGIN
        SELECT RAISE(ABORT, 'Invalid work');
    END;

    CREATE TRIGGER IF NOT EXISTS check_work_update
        BEFORE UPDATE OF status, type, format ON works
        WHEN NEW.status NOT IN (SELECT id FROM statuses) OR
             NEW.type   NOT IN (SELECT id FROM types) OR
             NEW.format NOT IN (SELECT id FROM formats)
    BEGIN
        SELECT RAISE(ABORT, 'Invalid work update value');
    END;

    CREATE TRIGGER IF NOT EXISTS delete_status
        BEFORE DELETE ON statuses
        WHEN EXISTS (SELECT 1 FROM works WHERE status = OLD.id)
    BEGIN
        SELECT RAISE(ABORT, 'Status still in use');
    END;

    CREATE TRIGGER IF NOT EXISTS delete_type
        BEFORE DELETE ON types
        WHEN EXISTS (SELECT 1 FROM works WHERE type = OLD.id)
    BEGIN
        SELECT RAISE(ABORT, 'Type still in use');
    END;

    CREATE TRIGGER IF NOT EXISTS delete_format
        BEFORE DELETE ON formats
        WHEN EXISTS (SELECT 1 FROM works WHERE format = OLD.id)
    BEGIN
        SELECT RAISE(ABORT, 'Format still in use');
    END;
";

/// Taxonomy table names. Never built from user input.
#[derive(Debug, Clone, Copy)]
enum Table {
    Statuses,
    Types,
    Formats,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Self::Statuses => "statuses",
            Self::Types => "types",
            Self::Formats => "formats",
        }
    }

    fn kind(self) -> EntityKind {
        match self {
            Self::Statuses => EntityKind::Status,
            Self::Types => EntityKind::Type,
            Self::Formats => EntityKind::Format,
        }
    }
}

struct OpenDatabase {
    path: PathBuf,
    conn: Connection,
}

/// Gateway over a single SQLite file at a time.
pub struct SqliteGateway {
    database: Mutex<Option<OpenDatabase>>,
    events: broadcast::Sender<BackendEvent>,
}

impl Default for SqliteGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteGateway {
    /// Create a gateway with no database open.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            database: Mutex::new(None),
            events,
        }
    }

    /// Path of the backup written when `path` is opened.
    pub fn backup_path(path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!("{stem}-backup.db"))
    }

    fn lock(&self) -> MutexGuard<'_, Option<OpenDatabase>> {
        self.database.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_conn<T>(
        &self,
        endpoint: Endpoint,
        f: impl FnOnce(&mut Connection) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.lock();
        let database = guard.as_mut().ok_or(BackendError::NoConnection)?;
        trace!(%endpoint, "sqlite request");
        let result = f(&mut database.conn);
        if let Err(error) = &result {
            debug!(%endpoint, %error, "sqlite request failed");
        }
        result
    }
}

fn initialize(conn: &mut Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA)?;
    for name in DEFAULT_TYPES {
        insert_entry(&tx, Table::Types, name)?;
    }
    for name in DEFAULT_FORMATS {
        insert_entry(&tx, Table::Formats, name)?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    info!(version = SCHEMA_VERSION, "initialized database schema");
    Ok(())
}

fn expect_one(rows: usize, kind: EntityKind, id: i64) -> Result<()> {
    if rows == 1 {
        Ok(())
    } else {
        Err(BackendError::not_found(kind, id))
    }
}

// =============================================================================
// TAXONOMY HELPERS
// =============================================================================

fn insert_entry(conn: &Connection, table: Table, name: &str) -> Result<i64> {
    let sql = format!(
        "INSERT INTO {0} (name, position)
         VALUES (:name, (SELECT COALESCE(MAX(position) + 1, 0) FROM {0}))",
        table.name()
    );
    conn.prepare_cached(&sql)?
        .execute(named_params! { ":name": name })?;
    Ok(conn.last_insert_rowid())
}

fn delete_entry(conn: &Connection, table: Table, id: i64) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = :id", table.name());
    let rows = conn.prepare_cached(&sql)?.execute(named_params! { ":id": id })?;
    expect_one(rows, table.kind(), id)
}

fn rename_entry(conn: &Connection, table: Table, id: i64, name: &str) -> Result<()> {
    let sql = format!("UPDATE {} SET name = :name WHERE id = :id", table.name());
    let rows = conn
        .prepare_cached(&sql)?
        .execute(named_params! { ":name": name, ":id": id })?;
    expect_one(rows, table.kind(), id)
}

fn reorder_entries(conn: &mut Connection, table: Table, moved: i64, target: i64) -> Result<()> {
    let tx: Transaction<'_> = conn.transaction()?;
    let mut ids: Vec<i64> = {
        let sql = format!("SELECT id FROM {} ORDER BY position, id", table.name());
        let mut stmt = tx.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };
    if !move_to_target(&mut ids, |id| *id, &moved, &target) {
        let missing = if ids.contains(&moved) { target } else { moved };
        return Err(BackendError::not_found(table.kind(), missing));
    }
    {
        let sql = format!("UPDATE {} SET position = :position WHERE id = :id", table.name());
        let mut stmt = tx.prepare(&sql)?;
        for (position, id) in ids.iter().enumerate() {
            stmt.execute(named_params! { ":position": position as i64, ":id": id })?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn named_entries<T>(
    conn: &Connection,
    table: Table,
    build: impl Fn(i64, String) -> T,
) -> Result<Vec<T>> {
    let sql = format!("SELECT id, name FROM {} ORDER BY position, id", table.name());
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], |row| Ok(build(row.get(0)?, row.get(1)?)))?;
    Ok(rows.collect::<rusqlite::Result<_>>()?)
}

// =============================================================================
// RELATION HELPERS
// =============================================================================

/// All attachments in attachment order.
fn relations(conn: &Connection) -> Result<Vec<(WorkId, CreatorId)>> {
    let mut stmt =
        conn.prepare_cached("SELECT work_id, creator_id FROM work_creator ORDER BY rowid")?;
    let rows = stmt.query_map([], |row| {
        Ok((WorkId(row.get(0)?), CreatorId(row.get(1)?)))
    })?;
    Ok(rows.collect::<rusqlite::Result<_>>()?)
}

fn insert_relation(conn: &Connection, work: i64, creator: i64) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO work_creator (work_id, creator_id) VALUES (:work_id, :creator_id)",
    )?
    .execute(named_params! { ":work_id": work, ":creator_id": creator })?;
    Ok(())
}

/// Insert a pair listed on a new work or creator. Repeats are skipped.
fn insert_listed_relation(conn: &Connection, work: i64, creator: i64) -> Result<()> {
    conn.prepare_cached(
        "INSERT OR IGNORE INTO work_creator (work_id, creator_id) VALUES (:work_id, :creator_id)",
    )?
    .execute(named_params! { ":work_id": work, ":creator_id": creator })?;
    Ok(())
}

fn exists(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {table} WHERE id = :id");
    let found = conn
        .prepare_cached(&sql)?
        .query_row(named_params! { ":id": id }, |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn row_to_work(row: &rusqlite::Row<'_>) -> rusqlite::Result<Work> {
    Ok(Work {
        id: WorkId(row.get("id")?),
        name: row.get("name")?,
        progress: row.get("progress")?,
        status: StatusId(row.get("status")?),
        work_type: WorkTypeId(row.get("type")?),
        format: FormatId(row.get("format")?),
        updated: row.get("updated")?,
        added: row.get("added")?,
        creators: Vec::new(),
    })
}

const WORK_COLUMNS: &str = "id, name, progress, status, type, format, updated, added";

impl Gateway for SqliteGateway {
    fn open(&self, path: &Path) -> Result<()> {
        let existed = path.exists();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| BackendError::Io {
                operation: "create",
                path: path.to_path_buf(),
                source,
            })?;
        }

        let mut conn = Connection::open(path)?;
        if existed {
            let backup = Self::backup_path(path);
            conn.backup(DatabaseName::Main, &backup, None)?;
            debug!(backup = %backup.display(), "wrote database backup");
        }
        initialize(&mut conn)?;

        let name = path.display().to_string();
        {
            let mut guard = self.lock();
            if let Some(previous) = guard.replace(OpenDatabase {
                path: path.to_path_buf(),
                conn,
            }) {
                debug!(path = %previous.path.display(), "replaced open database");
            }
        }
        info!(path = %name, "opened database");
        let _ = self.events.send(BackendEvent::Opened(name));
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let database = self.lock().take().ok_or(BackendError::NoConnection)?;
        if let Err((_, error)) = database.conn.close() {
            warn!(%error, "database did not close cleanly");
        }
        info!(path = %database.path.display(), "closed database");
        let _ = self.events.send(BackendEvent::Closed);
        Ok(())
    }

    fn database_path(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .map(|database| database.path.display().to_string())
    }

    fn subscribe(&self) -> broadcast::Receiver<BackendEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // WORKS
    // =========================================================================

    fn get_works(&self) -> Result<Vec<Work>> {
        self.with_conn(Endpoint::GetWorks, |conn| {
            let sql = format!("SELECT {WORK_COLUMNS} FROM works ORDER BY id");
            let mut stmt = conn.prepare_cached(&sql)?;
            let mut works: Vec<Work> = stmt
                .query_map([], row_to_work)?
                .collect::<rusqlite::Result<_>>()?;
            let index: HashMap<WorkId, usize> =
                works.iter().enumerate().map(|(i, w)| (w.id, i)).collect();
            for (work, creator) in relations(conn)? {
                if let Some(&i) = index.get(&work) {
                    works[i].creators.push(creator);
                }
            }
            Ok(works)
        })
    }

    fn get_work(&self, id: WorkId) -> Result<Work> {
        self.with_conn(Endpoint::GetWork, |conn| {
            let sql = format!("SELECT {WORK_COLUMNS} FROM works WHERE id = :id");
            let mut work = conn
                .prepare_cached(&sql)?
                .query_row(named_params! { ":id": id.get() }, row_to_work)
                .optional()?
                .ok_or_else(|| BackendError::not_found(EntityKind::Work, id))?;
            let mut stmt = conn.prepare_cached(
                "SELECT creator_id FROM work_creator WHERE work_id = :id ORDER BY rowid",
            )?;
            work.creators = stmt
                .query_map(named_params! { ":id": id.get() }, |row| {
                    Ok(CreatorId(row.get(0)?))
                })?
                .collect::<rusqlite::Result<_>>()?;
            Ok(work)
        })
    }

    fn add_work(&self, work: &Work) -> Result<WorkId> {
        self.with_conn(Endpoint::AddWork, |conn| {
            let tx = conn.transaction()?;
            let now = now_millis();
            tx.prepare_cached(
                "INSERT INTO works (name, progress, status, type, format, updated, added)
                 VALUES (:name, :progress, :status, :type, :format, :now, :now)",
            )?
            .execute(named_params! {
                ":name": work.name,
                ":progress": work.progress,
                ":status": work.status.get(),
                ":type": work.work_type.get(),
                ":format": work.format.get(),
                ":now": now,
            })?;
            let id = tx.last_insert_rowid();
            for creator in &work.creators {
                if !exists(&tx, "creators", creator.get())? {
                    return Err(BackendError::not_found(EntityKind::Creator, *creator));
                }
                insert_listed_relation(&tx, id, creator.get())?;
            }
            tx.commit()?;
            Ok(WorkId(id))
        })
    }

    fn update_work_name(&self, id: WorkId, name: &str) -> Result<()> {
        self.with_conn(Endpoint::UpdateWorkName, |conn| {
            let rows = conn
                .prepare_cached("UPDATE works SET name = :name WHERE id = :id")?
                .execute(named_params! { ":name": name, ":id": id.get() })?;
            expect_one(rows, EntityKind::Work, id.get())
        })
    }

    fn update_work_progress(&self, id: WorkId, progress: &str, timestamp: i64) -> Result<()> {
        self.with_conn(Endpoint::UpdateWorkProgress, |conn| {
            let rows = conn
                .prepare_cached(
                    "UPDATE works SET progress = :progress, updated = :updated WHERE id = :id",
                )?
                .execute(named_params! {
                    ":progress": progress,
                    ":updated": timestamp,
                    ":id": id.get(),
                })?;
            expect_one(rows, EntityKind::Work, id.get())
        })
    }

    fn update_work_status(&self, id: WorkId, status: StatusId, timestamp: i64) -> Result<()> {
        self.with_conn(Endpoint::UpdateWorkStatus, |conn| {
            let rows = conn
                .prepare_cached(
                    "UPDATE works SET status = :status, updated = :updated WHERE id = :id",
                )?
                .execute(named_params! {
                    ":status": status.get(),
                    ":updated": timestamp,
                    ":id": id.get(),
                })?;
            expect_one(rows, EntityKind::Work, id.get())
        })
    }

    fn update_work_type(&self, id: WorkId, work_type: WorkTypeId) -> Result<()> {
        self.with_conn(Endpoint::UpdateWorkType, |conn| {
            let rows = conn
                .prepare_cached("UPDATE works SET type = :type WHERE id = :id")?
                .execute(named_params! { ":type": work_type.get(), ":id": id.get() })?;
            expect_one(rows, EntityKind::Work, id.get())
        })
    }

    fn update_work_format(&self, id: WorkId, format: FormatId) -> Result<()> {
        self.with_conn(Endpoint::UpdateWorkFormat, |conn| {
            let rows = conn
                .prepare_cached("UPDATE works SET format = :format WHERE id = :id")?
                .execute(named_params! { ":format": format.get(), ":id": id.get() })?;
            expect_one(rows, EntityKind::Work, id.get())
        })
    }

    fn remove_work(&self, id: WorkId) -> Result<()> {
        self.with_conn(Endpoint::RemoveWork, |conn| {
            let rows = conn
                .prepare_cached("DELETE FROM works WHERE id = :id")?
                .execute(named_params! { ":id": id.get() })?;
            expect_one(rows, EntityKind::Work, id.get())
        })
    }

    // =========================================================================
    // CREATORS
    // =========================================================================

    fn get_creators(&self) -> Result<Vec<Creator>> {
        self.with_conn(Endpoint::GetCreators, |conn| {
            let mut stmt = conn.prepare_cached("SELECT id, name FROM creators ORDER BY id")?;
            let mut creators: Vec<Creator> = stmt
                .query_map([], |row| {
                    Ok(Creator {
                        id: CreatorId(row.get(0)?),
                        name: row.get(1)?,
                        works: Vec::new(),
                    })
                })?
                .collect::<rusqlite::Result<_>>()?;
            let index: HashMap<CreatorId, usize> =
                creators.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
            for (work, creator) in relations(conn)? {
                if let Some(&i) = index.get(&creator) {
                    creators[i].works.push(work);
                }
            }
            Ok(creators)
        })
    }

    fn get_creator(&self, id: CreatorId) -> Result<Creator> {
        self.with_conn(Endpoint::GetCreator, |conn| {
            let name: String = conn
                .prepare_cached("SELECT name FROM creators WHERE id = :id")?
                .query_row(named_params! { ":id": id.get() }, |row| row.get(0))
                .optional()?
                .ok_or_else(|| BackendError::not_found(EntityKind::Creator, id))?;
            let mut stmt = conn.prepare_cached(
                "SELECT work_id FROM work_creator WHERE creator_id = :id ORDER BY rowid",
            )?;
            let works = stmt
                .query_map(named_params! { ":id": id.get() }, |row| Ok(WorkId(row.get(0)?)))?
                .collect::<rusqlite::Result<_>>()?;
            Ok(Creator { id, name, works })
        })
    }

    fn add_creator(&self, creator: &Creator) -> Result<CreatorId> {
        self.with_conn(Endpoint::AddCreator, |conn| {
            let tx = conn.transaction()?;
            tx.prepare_cached("INSERT INTO creators (name) VALUES (:name)")?
                .execute(named_params! { ":name": creator.name })?;
            let id = tx.last_insert_rowid();
            for work in &creator.works {
                if !exists(&tx, "works", work.get())? {
                    return Err(BackendError::not_found(EntityKind::Work, *work));
                }
                insert_listed_relation(&tx, work.get(), id)?;
            }
            tx.commit()?;
            Ok(CreatorId(id))
        })
    }

    fn update_creator_name(&self, id: CreatorId, name: &str) -> Result<()> {
        self.with_conn(Endpoint::UpdateCreatorName, |conn| {
            let rows = conn
                .prepare_cached("UPDATE creators SET name = :name WHERE id = :id")?
                .execute(named_params! { ":name": name, ":id": id.get() })?;
            expect_one(rows, EntityKind::Creator, id.get())
        })
    }

    fn remove_creator(&self, id: CreatorId) -> Result<()> {
        self.with_conn(Endpoint::RemoveCreator, |conn| {
            let rows = conn
                .prepare_cached("DELETE FROM creators WHERE id = :id")?
                .execute(named_params! { ":id": id.get() })?;
            expect_one(rows, EntityKind::Creator, id.get())
        })
    }

    // =========================================================================
    // RELATIONSHIPS
    // =========================================================================

    fn attach(&self, work: WorkId, creator: CreatorId) -> Result<()> {
        self.with_conn(Endpoint::Attach, |conn| {
            if !exists(conn, "works", work.get())? {
                return Err(BackendError::not_found(EntityKind::Work, work));
            }
            if !exists(conn, "creators", creator.get())? {
                return Err(BackendError::not_found(EntityKind::Creator, creator));
            }
            insert_relation(conn, work.get(), creator.get())
        })
    }

    fn detach(&self, work: WorkId, creator: CreatorId) -> Result<()> {
        self.with_conn(Endpoint::Detach, |conn| {
            let rows = conn
                .prepare_cached(
                    "DELETE FROM work_creator WHERE work_id = :work_id AND creator_id = :creator_id",
                )?
                .execute(named_params! { ":work_id": work.get(), ":creator_id": creator.get() })?;
            if rows != 1 {
                return Err(BackendError::Rejected(format!(
                    "Expected to detach 1 item not {rows}"
                )));
            }
            Ok(())
        })
    }

    // =========================================================================
    // STATUSES
    // =========================================================================

    fn get_statuses(&self) -> Result<Vec<Status>> {
        self.with_conn(Endpoint::GetStatuses, |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, name, is_update FROM statuses ORDER BY position, id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Status {
                    id: StatusId(row.get(0)?),
                    name: row.get(1)?,
                    is_update: row.get(2)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<_>>()?)
        })
    }

    fn add_status(&self, name: &str) -> Result<StatusId> {
        self.with_conn(Endpoint::AddStatus, |conn| {
            insert_entry(conn, Table::Statuses, name).map(StatusId)
        })
    }

    fn remove_status(&self, id: StatusId) -> Result<()> {
        self.with_conn(Endpoint::RemoveStatus, |conn| {
            delete_entry(conn, Table::Statuses, id.get())
        })
    }

    fn rename_status(&self, id: StatusId, name: &str) -> Result<()> {
        self.with_conn(Endpoint::RenameStatus, |conn| {
            rename_entry(conn, Table::Statuses, id.get(), name)
        })
    }

    fn update_status(&self, id: StatusId, is_update: bool) -> Result<()> {
        self.with_conn(Endpoint::UpdateStatus, |conn| {
            let rows = conn
                .prepare_cached("UPDATE statuses SET is_update = :is_update WHERE id = :id")?
                .execute(named_params! { ":is_update": is_update, ":id": id.get() })?;
            expect_one(rows, EntityKind::Status, id.get())
        })
    }

    fn reorder_statuses(&self, moved: StatusId, target: StatusId) -> Result<()> {
        self.with_conn(Endpoint::ReorderStatuses, |conn| {
            reorder_entries(conn, Table::Statuses, moved.get(), target.get())
        })
    }

    // =========================================================================
    // TYPES
    // =========================================================================

    fn get_types(&self) -> Result<Vec<WorkType>> {
        self.with_conn(Endpoint::GetTypes, |conn| {
            named_entries(conn, Table::Types, |id, name| WorkType {
                id: WorkTypeId(id),
                name,
            })
        })
    }

    fn add_type(&self, name: &str) -> Result<WorkTypeId> {
        self.with_conn(Endpoint::AddType, |conn| {
            insert_entry(conn, Table::Types, name).map(WorkTypeId)
        })
    }

    fn remove_type(&self, id: WorkTypeId) -> Result<()> {
        self.with_conn(Endpoint::RemoveType, |conn| {
            delete_entry(conn, Table::Types, id.get())
        })
    }

    fn rename_type(&self, id: WorkTypeId, name: &str) -> Result<()> {
        self.with_conn(Endpoint::RenameType, |conn| {
            rename_entry(conn, Table::Types, id.get(), name)
        })
    }

    fn reorder_types(&self, moved: WorkTypeId, target: WorkTypeId) -> Result<()> {
        self.with_conn(Endpoint::ReorderTypes, |conn| {
            reorder_entries(conn, Table::Types, moved.get(), target.get())
        })
    }

    // =========================================================================
    // FORMATS
    // =========================================================================

    fn get_formats(&self) -> Result<Vec<Format>> {
        self.with_conn(Endpoint::GetFormats, |conn| {
            named_entries(conn, Table::Formats, |id, name| Format {
                id: FormatId(id),
                name,
            })
        })
    }

    fn add_format(&self, name: &str) -> Result<FormatId> {
        self.with_conn(Endpoint::AddFormat, |conn| {
            insert_entry(conn, Table::Formats, name).map(FormatId)
        })
    }

    fn remove_format(&self, id: FormatId) -> Result<()> {
        self.with_conn(Endpoint::RemoveFormat, |conn| {
            delete_entry(conn, Table::Formats, id.get())
        })
    }

    fn rename_format(&self, id: FormatId, name: &str) -> Result<()> {
        self.with_conn(Endpoint::RenameFormat, |conn| {
            rename_entry(conn, Table::Formats, id.get(), name)
        })
    }

    fn reorder_formats(&self, moved: FormatId, target: FormatId) -> Result<()> {
        self.with_conn(Endpoint::ReorderFormats, |conn| {
            reorder_entries(conn, Table::Formats, moved.get(), target.get())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_sits_next_to_database() {
        let path = Path::new("/data/library.db");
        assert_eq!(
            SqliteGateway::backup_path(path),
            PathBuf::from("/data/library-backup.db")
        );
    }

    #[test]
    fn test_expect_one() {
        assert!(expect_one(1, EntityKind::Work, 3).is_ok());
        assert!(matches!(
            expect_one(0, EntityKind::Status, 3),
            Err(BackendError::NotFound {
                entity: EntityKind::Status,
                id: 3
            })
        ));
    }
}
