use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, EventMode, NormalizedEvent};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: an event with slug `{slug}` already exists")]
    DuplicateKey { slug: String },
    #[error("event not found: {id}")]
    NotFound { id: String },
    #[error("event slug is empty; the title has no letters or digits")]
    MissingSlug,
    #[error("payload error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const SELECT_COLUMNS: &str = "SELECT id, payload, created_at_utc, updated_at_utc FROM events";
const ORDERING: &str = "ORDER BY date ASC, time ASC, slug ASC";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!("opened event store at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS events(
                id TEXT PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                mode TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at_utc TEXT NOT NULL,
                updated_at_utc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_date_mode ON events(date, mode);",
        )?;
        Ok(())
    }

    /// Inserts a new record, assigning its id and both timestamps.
    pub fn create(&self, record: &NormalizedEvent) -> StoreResult<Event> {
        ensure_slug(record)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let payload = serde_json::to_string(record)?;

        self.conn
            .execute(
                "INSERT INTO events (id, slug, date, time, mode, payload, created_at_utc, updated_at_utc)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    id,
                    record.slug,
                    record.date,
                    record.time,
                    record.mode.as_str(),
                    payload,
                    now
                ],
            )
            .map_err(|err| write_error(err, &record.slug))?;

        info!("created event {} ({})", record.slug, id);
        Ok(Event {
            id,
            record: record.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the stored record for `id`, keeping its creation time.
    pub fn update(&self, id: &str, record: &NormalizedEvent) -> StoreResult<Event> {
        ensure_slug(record)?;
        let now = Utc::now();
        let payload = serde_json::to_string(record)?;

        let changed = self
            .conn
            .execute(
                "UPDATE events
                 SET slug = ?2, date = ?3, time = ?4, mode = ?5, payload = ?6, updated_at_utc = ?7
                 WHERE id = ?1",
                params![
                    id,
                    record.slug,
                    record.date,
                    record.time,
                    record.mode.as_str(),
                    payload,
                    now
                ],
            )
            .map_err(|err| write_error(err, &record.slug))?;

        if changed == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }

        info!("updated event {} ({})", record.slug, id);
        self.get_event(id)
    }

    pub fn get_event(&self, id: &str) -> StoreResult<Event> {
        self.conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                read_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    pub fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Event>> {
        let event = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE slug = ?1"),
                params![slug],
                read_row,
            )
            .optional()?;
        Ok(event)
    }

    pub fn list_events(&self) -> StoreResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_COLUMNS} {ORDERING}"))?;
        let rows = stmt.query_map([], read_row)?;
        collect_rows(rows)
    }

    /// Events on or after `from_date` (`YYYY-MM-DD`), soonest first.
    pub fn list_upcoming(&self, from_date: &str, limit: usize) -> StoreResult<Vec<Event>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE date >= ?1 {ORDERING} LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![from_date, limit], read_row)?;
        collect_rows(rows)
    }

    pub fn list_by_mode(&self, mode: EventMode) -> StoreResult<Vec<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE mode = ?1 {ORDERING}"))?;
        let rows = stmt.query_map(params![mode.as_str()], read_row)?;
        collect_rows(rows)
    }

    pub fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn ensure_slug(record: &NormalizedEvent) -> StoreResult<()> {
    if record.slug.is_empty() {
        warn!("rejected write of `{}`: empty slug", record.title);
        return Err(StoreError::MissingSlug);
    }
    Ok(())
}

fn write_error(err: rusqlite::Error, slug: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            warn!("rejected write: slug `{slug}` already taken");
            StoreError::DuplicateKey {
                slug: slug.to_string(),
            }
        }
        other => StoreError::Sqlite(other),
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    let id: String = row.get(0)?;
    let payload: String = row.get(1)?;
    let created_at: DateTime<Utc> = row.get(2)?;
    let updated_at: DateTime<Utc> = row.get(3)?;
    let record: NormalizedEvent = serde_json::from_str(&payload).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            payload.len(),
            rusqlite::types::Type::Text,
            Box::new(err),
        )
    })?;
    Ok(Event {
        id,
        record,
        created_at,
        updated_at,
    })
}

fn collect_rows<I>(rows: I) -> StoreResult<Vec<Event>>
where
    I: Iterator<Item = rusqlite::Result<Event>>,
{
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
