//! SQLite-backed primary and dead-letter stores.
//!
//! One database file holds two tables with the same layout:
//!
//! ```text
//! events / dlq
//!   id          TEXT PRIMARY KEY
//!   body        TEXT NOT NULL
//!   headers     TEXT NOT NULL   -- JSON object, name -> value
//!   received_at TEXT NOT NULL   -- RFC 3339, UTC
//! ```
//!
//! Both stores share a single connection behind a mutex.

use crate::domain::error::StoreError;
use crate::domain::event::{parse_received_at, Event, EventId, HeaderMap};
use crate::ports::outbound::EventStore;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS events (
        id TEXT PRIMARY KEY,
        body TEXT NOT NULL,
        headers TEXT NOT NULL,
        received_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS dlq (
        id TEXT PRIMARY KEY,
        body TEXT NOT NULL,
        headers TEXT NOT NULL,
        received_at TEXT NOT NULL
    );
";

/// Which of the two tables a store handle writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Events,
    Dlq,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Events => "events",
            Table::Dlq => "dlq",
        }
    }
}

fn db_err(err: rusqlite::Error) -> StoreError {
    StoreError::backend(err.to_string())
}

/// An open database with the schema in place.
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(StoreError::backend(format!(
                "database path {} is a directory",
                path.display()
            )));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(db_err)?;

        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(db_err)?;
        debug!(journal_mode = %mode, "SQLite journal mode set");

        conn.busy_timeout(busy_timeout).map_err(db_err)?;

        let db = Self::bootstrap(conn)?;
        info!(path = %path.display(), "Opened webhook database");
        Ok(db)
    }

    /// Private in-memory database, gone when the last handle drops.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Primary store handle.
    pub fn events(&self) -> SqliteEventStore {
        self.store(Table::Events)
    }

    /// Dead-letter store handle.
    pub fn dlq(&self) -> SqliteEventStore {
        self.store(Table::Dlq)
    }

    fn store(&self, table: Table) -> SqliteEventStore {
        SqliteEventStore {
            conn: Arc::clone(&self.conn),
            table,
        }
    }
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase").finish_non_exhaustive()
    }
}

/// One table of a [`SqliteDatabase`] as an [`EventStore`].
#[derive(Clone)]
pub struct SqliteEventStore {
    conn: Arc<Mutex<Connection>>,
    table: Table,
}

impl SqliteEventStore {
    pub fn table(&self) -> Table {
        self.table
    }
}

impl std::fmt::Debug for SqliteEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEventStore")
            .field("table", &self.table.name())
            .finish()
    }
}

/// Raw column values before decoding.
struct RawRow {
    id: String,
    body: String,
    headers: String,
    received_at: String,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            body: row.get(1)?,
            headers: row.get(2)?,
            received_at: row.get(3)?,
        })
    }

    fn decode(self) -> Result<Event, StoreError> {
        let headers: HeaderMap =
            serde_json::from_str(&self.headers).map_err(|e| StoreError::Corrupt {
                id: self.id.clone(),
                reason: format!("headers: {}", e),
            })?;
        let received_at = parse_received_at(&self.received_at).map_err(|e| StoreError::Corrupt {
            id: self.id.clone(),
            reason: format!("received_at: {}", e),
        })?;
        Ok(Event::from_parts(
            EventId::from(self.id),
            self.body,
            headers,
            received_at,
        ))
    }
}

impl EventStore for SqliteEventStore {
    fn put(&self, event: &Event) -> Result<(), StoreError> {
        let headers = serde_json::to_string(event.headers()).map_err(|e| StoreError::Corrupt {
            id: event.id().to_string(),
            reason: format!("headers: {}", e),
        })?;
        let sql = format!(
            "INSERT OR REPLACE INTO {} (id, body, headers, received_at) VALUES (?1, ?2, ?3, ?4)",
            self.table.name()
        );

        let conn = self.conn.lock();
        conn.execute(
            &sql,
            params![
                event.id().as_str(),
                event.body(),
                headers,
                event.received_at_rfc3339()
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn get(&self, id: &EventId) -> Result<Event, StoreError> {
        let sql = format!(
            "SELECT id, body, headers, received_at FROM {} WHERE id = ?1",
            self.table.name()
        );

        let raw = {
            let conn = self.conn.lock();
            conn.query_row(&sql, params![id.as_str()], RawRow::read)
                .optional()
                .map_err(db_err)?
        };

        raw.ok_or_else(|| StoreError::NotFound { id: id.clone() })?
            .decode()
    }

    fn list_all(&self) -> Result<Vec<Event>, StoreError> {
        let sql = format!(
            "SELECT id, body, headers, received_at FROM {}",
            self.table.name()
        );

        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare_cached(&sql).map_err(db_err)?;
            let rows = stmt
                .query_map([], RawRow::read)
                .map_err(db_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err)?;
            rows
        };

        rows.into_iter().map(RawRow::decode).collect()
    }
}
