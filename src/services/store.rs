//! SQLite persistence layer for trackers, entries, clients, and the
//! conflict log.
//!
//! One `Mutex<Connection>` serializes every access; the sync engine holds
//! the lock only for the duration of the entities it touches within a
//! single call, never across a whole HTTP request.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Map;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::types::{Client, ConflictRecord, Entry, Resolution, Tracker, TrackerType};

pub struct SyncStore {
    conn: Mutex<Connection>,
    pub db_path: String,
}

impl SyncStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let db_path = path.as_ref().to_string_lossy().to_string();
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        store.init_schema()?;
        info!("sync store initialized at {}", store.db_path);
        Ok(store)
    }

    pub fn new_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: ":memory:".to_string(),
        };
        store.init_schema()?;
        debug!("in-memory sync store initialized");
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                first_seen_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS meta_sync (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_modified TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS trackers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                type TEXT NOT NULL DEFAULT 'simple',
                meta_json TEXT NOT NULL DEFAULT '{}',
                version INTEGER NOT NULL DEFAULT 1,
                last_modified_by TEXT NOT NULL DEFAULT '',
                last_modified_at TEXT NOT NULL DEFAULT '',
                deleted INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        let _ = conn.execute("ALTER TABLE trackers ADD COLUMN meta_json TEXT NOT NULL DEFAULT '{}'", []);

        conn.execute(
            "CREATE TABLE IF NOT EXISTS entries (
                date TEXT NOT NULL,
                tracker_id TEXT NOT NULL,
                value REAL,
                completed INTEGER,
                version INTEGER NOT NULL DEFAULT 1,
                last_modified_by TEXT NOT NULL DEFAULT '',
                last_modified_at TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (date, tracker_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sync_conflicts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_type TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                resolution TEXT NOT NULL,
                client_id TEXT NOT NULL,
                resolved_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_trackers_name ON trackers(name)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_trackers_modified ON trackers(last_modified_at)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entries_modified ON entries(last_modified_at)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_conflicts_resolved ON sync_conflicts(resolved_at)",
            [],
        )?;

        info!("sync schema initialized");
        Ok(())
    }

    // ========== Trackers ==========

    pub fn get_tracker(&self, id: &str) -> Result<Option<Tracker>, AppError> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                "SELECT id, name, category, type, meta_json, version, last_modified_by, last_modified_at, deleted
                 FROM trackers WHERE id = ?1",
                params![id],
                row_to_tracker,
            )
            .optional()?;
        Ok(result)
    }

    pub fn put_tracker(&self, tracker: &Tracker) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        let meta_json = serde_json::to_string(&tracker.metadata).unwrap_or_else(|_| "{}".into());
        conn.execute(
            "INSERT INTO trackers (id, name, category, type, meta_json, version, last_modified_by, last_modified_at, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                type = excluded.type,
                meta_json = excluded.meta_json,
                version = excluded.version,
                last_modified_by = excluded.last_modified_by,
                last_modified_at = excluded.last_modified_at,
                deleted = excluded.deleted",
            params![
                tracker.id,
                tracker.name,
                tracker.category,
                tracker.tracker_type.as_str(),
                meta_json,
                tracker.version,
                tracker.last_modified_by,
                tracker.last_modified_at,
                tracker.deleted as i64,
            ],
        )?;
        debug!("put tracker {}", tracker.id);
        Ok(())
    }

    /// `includeDeleted = false` omits tombstones. `since` filters to
    /// `lastModifiedAt > since` when present.
    pub fn list_trackers(&self, include_deleted: bool, since: Option<&str>) -> Result<Vec<Tracker>, AppError> {
        let conn = self.conn.lock().unwrap();
        let sql = match (include_deleted, since.is_some()) {
            (false, false) => "SELECT id, name, category, type, meta_json, version, last_modified_by, last_modified_at, deleted FROM trackers WHERE deleted = 0",
            (false, true) => "SELECT id, name, category, type, meta_json, version, last_modified_by, last_modified_at, deleted FROM trackers WHERE deleted = 0 AND last_modified_at > ?1",
            (true, false) => "SELECT id, name, category, type, meta_json, version, last_modified_by, last_modified_at, deleted FROM trackers",
            (true, true) => "SELECT id, name, category, type, meta_json, version, last_modified_by, last_modified_at, deleted FROM trackers WHERE last_modified_at > ?1",
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = if let Some(since) = since {
            stmt.query_map(params![since], row_to_tracker)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map([], row_to_tracker)?
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    pub fn list_deleted_tracker_ids_since(&self, since: &str) -> Result<Vec<String>, AppError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id FROM trackers WHERE deleted = 1 AND last_modified_at > ?1",
        )?;
        let ids = stmt
            .query_map(params![since], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // ========== Entries ==========

    pub fn get_entry(&self, date: &str, tracker_id: &str) -> Result<Option<Entry>, AppError> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                "SELECT date, tracker_id, value, completed, version, last_modified_by, last_modified_at
                 FROM entries WHERE date = ?1 AND tracker_id = ?2",
                params![date, tracker_id],
                row_to_entry,
            )
            .optional()?;
        Ok(result)
    }

    pub fn put_entry(&self, entry: &Entry) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO entries (date, tracker_id, value, completed, version, last_modified_by, last_modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(date, tracker_id) DO UPDATE SET
                value = excluded.value,
                completed = excluded.completed,
                version = excluded.version,
                last_modified_by = excluded.last_modified_by,
                last_modified_at = excluded.last_modified_at",
            params![
                entry.date,
                entry.tracker_id,
                entry.value,
                entry.completed.map(|b| b as i64),
                entry.version,
                entry.last_modified_by,
                entry.last_modified_at,
            ],
        )?;
        debug!("put entry {}|{}", entry.date, entry.tracker_id);
        Ok(())
    }

    /// `date_lower_bound` enforces the rolling window (§4.6); `since`
    /// additionally filters to `lastModifiedAt > since` when present.
    pub fn list_entries(&self, date_lower_bound: &str, since: Option<&str>) -> Result<Vec<Entry>, AppError> {
        let conn = self.conn.lock().unwrap();
        let rows = if let Some(since) = since {
            let mut stmt = conn.prepare(
                "SELECT date, tracker_id, value, completed, version, last_modified_by, last_modified_at
                 FROM entries WHERE date >= ?1 AND last_modified_at > ?2",
            )?;
            stmt.query_map(params![date_lower_bound, since], row_to_entry)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = conn.prepare(
                "SELECT date, tracker_id, value, completed, version, last_modified_by, last_modified_at
                 FROM entries WHERE date >= ?1",
            )?;
            stmt.query_map(params![date_lower_bound], row_to_entry)?
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    // ========== Sync metadata ==========

    pub fn get_sync_metadata(&self) -> Result<Option<String>, AppError> {
        let conn = self.conn.lock().unwrap();
        let result: Option<Option<String>> = conn
            .query_row("SELECT last_modified FROM meta_sync WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        Ok(result.flatten())
    }

    pub fn set_sync_metadata(&self, timestamp: &str) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO meta_sync (id, last_modified) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET last_modified = excluded.last_modified",
            params![timestamp],
        )?;
        Ok(())
    }

    // ========== Clients ==========

    pub fn upsert_client(&self, id: &str, name: &str, now: &str) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO clients (id, name, first_seen_at, last_seen_at) VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(id) DO UPDATE SET last_seen_at = excluded.last_seen_at",
            params![id, name, now],
        )?;
        Ok(())
    }

    pub fn get_client(&self, id: &str) -> Result<Option<Client>, AppError> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                "SELECT id, name, first_seen_at, last_seen_at FROM clients WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Client {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        first_seen_at: row.get(2)?,
                        last_seen_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    // ========== Conflicts ==========

    pub fn append_conflict_record(&self, record: &ConflictRecord) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sync_conflicts (entity_type, entity_id, resolution, client_id, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.entity_type.as_str(),
                record.entity_id,
                record.resolution.as_str(),
                record.client_id,
                record.resolved_at,
            ],
        )?;
        Ok(())
    }

    /// Rows with no `resolved_at`. The schema always sets `resolved_at` at
    /// insert time (§9: conflicts are only logged upon resolution), so this
    /// is structurally always empty; kept for interface completeness.
    pub fn list_unresolved_conflicts(&self, _client_id: &str) -> Result<Vec<ConflictRecord>, AppError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT entity_type, entity_id, resolution, client_id, resolved_at
             FROM sync_conflicts WHERE resolved_at IS NULL OR resolved_at = ''",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let entity_type: String = row.get(0)?;
                let resolution: String = row.get(2)?;
                Ok(ConflictRecord {
                    entity_type: crate::types::EntityType::parse(&entity_type).unwrap_or(crate::types::EntityType::Tracker),
                    entity_id: row.get(1)?,
                    resolution: Resolution::parse(&resolution).unwrap_or(Resolution::Server),
                    client_id: row.get(3)?,
                    resolved_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_tracker(row: &rusqlite::Row) -> rusqlite::Result<Tracker> {
    let meta_json: String = row.get(4)?;
    let metadata: Map<String, serde_json::Value> = serde_json::from_str(&meta_json).unwrap_or_default();
    let tracker_type_str: String = row.get(3)?;
    let tracker_type = TrackerType::parse(&tracker_type_str).unwrap_or(TrackerType::Simple);
    Ok(Tracker {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        tracker_type,
        metadata,
        version: row.get(5)?,
        last_modified_by: row.get(6)?,
        last_modified_at: row.get(7)?,
        deleted: row.get::<_, i64>(8)? != 0,
    })
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
    Ok(Entry {
        date: row.get(0)?,
        tracker_id: row.get(1)?,
        value: row.get(2)?,
        completed: row.get::<_, Option<i64>>(3)?.map(|v| v != 0),
        version: row.get(4)?,
        last_modified_by: row.get(5)?,
        last_modified_at: row.get(6)?,
    })
}
