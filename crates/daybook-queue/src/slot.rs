use daybook_core::{DaybookError, DbResult};
use rusqlite::{Connection, Error as SqlError, ErrorCode, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One named storage slot holding the whole queue blob. Injected into
/// `QueueStore` so the queue logic never touches a concrete backend.
pub trait SlotStorage {
    fn read(&self) -> DbResult<Option<String>>;
    fn write(&self, blob: &str) -> DbResult<()>;
    fn clear(&self) -> DbResult<()>;
}

/// Production backend: a single row in a `slots` table. Last writer wins
/// across processes; in-process interleaving is prevented by the sync
/// engine's single-flight guard, not here.
#[derive(Debug, Clone)]
pub struct SqliteSlot {
    db_path: PathBuf,
    name: String,
}

impl SqliteSlot {
    pub fn open(db_path: impl Into<PathBuf>, name: impl Into<String>) -> DbResult<Self> {
        let slot = Self {
            db_path: db_path.into(),
            name: name.into(),
        };

        let conn = slot.connection()?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             CREATE TABLE IF NOT EXISTS slots (
                 name TEXT PRIMARY KEY,
                 blob TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             );",
        )
        .map_err(|err| sqlite_error("initialize slot schema", &slot.db_path, err))?;

        Ok(slot)
    }

    fn connection(&self) -> DbResult<Connection> {
        Connection::open(&self.db_path)
            .map_err(|err| sqlite_error("open slot database", &self.db_path, err))
    }
}

impl SlotStorage for SqliteSlot {
    fn read(&self) -> DbResult<Option<String>> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT blob FROM slots WHERE name = ?1",
            params![self.name],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|err| sqlite_error("read slot", &self.db_path, err))
    }

    fn write(&self, blob: &str) -> DbResult<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO slots (name, blob, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET blob = excluded.blob, updated_at = excluded.updated_at",
            params![self.name, blob, chrono::Utc::now().to_rfc3339()],
        )
        .map_err(|err| sqlite_error("write slot", &self.db_path, err))?;

        Ok(())
    }

    fn clear(&self) -> DbResult<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM slots WHERE name = ?1", params![self.name])
            .map_err(|err| sqlite_error("clear slot", &self.db_path, err))?;

        Ok(())
    }
}

/// In-memory backend for tests and hosts without durable storage.
#[derive(Debug, Default, Clone)]
pub struct MemorySlot {
    value: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the slot with a raw blob, bypassing the codec. Used to simulate
    /// legacy or corrupted storage contents.
    pub fn seed(&self, blob: impl Into<String>) {
        *self.value.lock().expect("slot lock") = Some(blob.into());
    }

    pub fn raw(&self) -> Option<String> {
        self.value.lock().expect("slot lock").clone()
    }
}

impl SlotStorage for MemorySlot {
    fn read(&self) -> DbResult<Option<String>> {
        Ok(self.value.lock().expect("slot lock").clone())
    }

    fn write(&self, blob: &str) -> DbResult<()> {
        *self.value.lock().expect("slot lock") = Some(blob.to_string());
        Ok(())
    }

    fn clear(&self) -> DbResult<()> {
        *self.value.lock().expect("slot lock") = None;
        Ok(())
    }
}

fn sqlite_error(action: &str, db_path: &Path, err: SqlError) -> DaybookError {
    if let SqlError::SqliteFailure(code, message) = &err
        && (code.code == ErrorCode::DatabaseCorrupt || code.code == ErrorCode::NotADatabase)
    {
        let detail = message.as_deref().unwrap_or("sqlite reported corruption");
        return DaybookError::io(format!(
            "failed to {action}: slot database '{}' is corrupted ({detail}); remove it to rebuild the offline queue",
            db_path.display()
        ));
    }

    DaybookError::io(format!(
        "failed to {action} using slot database '{}': {}",
        db_path.display(),
        err
    ))
}
