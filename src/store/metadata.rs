//! SQLite-backed metadata store.

use super::StoreError;
use crate::service::FileRecord;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, ffi, params};
use std::path::Path;
use std::sync::Arc;

/// Keyed store of [`FileRecord`]s with unique file names.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Look up the record carrying `file_name`, if any.
    async fn find_by_name(&self, file_name: &str) -> Result<Option<FileRecord>, StoreError>;

    /// Persist a new record. Fails with [`StoreError::DuplicateName`] when the name is taken.
    async fn insert(&self, record: &FileRecord) -> Result<(), StoreError>;

    /// Fetch a record by id.
    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>, StoreError>;

    /// All known file ids in store iteration order.
    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Whether a record exists for `file_id`.
    async fn contains(&self, file_id: &str) -> Result<bool, StoreError> {
        Ok(self.get(file_id).await?.is_some())
    }
}

/// Metadata store over a single SQLite connection.
///
/// Statements run on the blocking pool; the connection mutex serializes them.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMetadataStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;",
        )?;
        Self::with_connection(conn)
    }

    /// Private in-memory database, used by tests and throwaway runs.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS files (
                file_id       TEXT PRIMARY KEY,
                file_name     TEXT NOT NULL UNIQUE,
                file_summary  TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            operation(&guard)
        })
        .await?
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
        Ok(FileRecord {
            file_id: row.get(0)?,
            file_name: row.get(1)?,
            file_summary: row.get(2)?,
        })
    }
}

/// A UNIQUE violation on `files.file_name`. Other constraint failures stay database errors.
fn is_name_conflict(error: &ffi::Error, message: &str) -> bool {
    error.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE && message.contains("files.file_name")
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn find_by_name(&self, file_name: &str) -> Result<Option<FileRecord>, StoreError> {
        let file_name = file_name.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT file_id, file_name, file_summary FROM files WHERE file_name = ?1",
                    params![file_name],
                    Self::row_to_record,
                )
                .optional()?)
        })
        .await
    }

    async fn insert(&self, record: &FileRecord) -> Result<(), StoreError> {
        let record = record.clone();
        self.run(move |conn| {
            let result = conn.execute(
                "INSERT INTO files (file_id, file_name, file_summary) VALUES (?1, ?2, ?3)",
                params![record.file_id, record.file_name, record.file_summary],
            );
            match result {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(error, Some(message)))
                    if is_name_conflict(&error, &message) =>
                {
                    Err(StoreError::DuplicateName(record.file_name))
                }
                Err(error) => Err(error.into()),
            }
        })
        .await
    }

    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>, StoreError> {
        let file_id = file_id.to_string();
        self.run(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT file_id, file_name, file_summary FROM files WHERE file_id = ?1",
                    params![file_id],
                    Self::row_to_record,
                )
                .optional()?)
        })
        .await
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT file_id FROM files")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
        .await
    }
}
