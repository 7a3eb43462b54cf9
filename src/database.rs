use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// A JSON document stored under a collection path
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub collection: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

/// Hierarchical document store backed by SQLite
///
/// Collections are addressed by slash separated paths; a document at
/// `series/<id>` owns the sub-collection `series/<id>/seasons`, and so on.
/// Documents are only ever added; this store has no update or delete path.
pub struct DocumentStore {
    conn: Mutex<Connection>,
}

impl DocumentStore {
    /// Create or open the store at `path`
    pub fn open(path: &Path) -> StoreResult<Self> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        info!("Opened document store at {:?}", path);
        Self::from_connection(conn)
    }

    /// Fresh store that lives only as long as the process
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        let store = DocumentStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn initialize_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT NOT NULL,
                collection TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
            [],
        )?;

        debug!("Document store schema initialized");
        Ok(())
    }

    /// Add a document to `collection`, returning its freshly minted id
    pub fn add_document(&self, collection: &str, data: &Value) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO documents (id, collection, data, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                collection,
                serde_json::to_string(data)?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!("Added document {}/{}", collection, id);
        Ok(id)
    }

    /// All documents in a collection, in insertion order
    pub fn get_collection(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, collection, data, created_at
             FROM documents
             WHERE collection = ?1
             ORDER BY rowid",
        )?;

        let documents = stmt
            .query_map([collection], row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    pub fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let conn = self.conn()?;
        let document = conn
            .query_row(
                "SELECT id, collection, data, created_at
                 FROM documents
                 WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                row_to_document,
            )
            .optional()?;

        Ok(document)
    }

    /// Total number of documents across all collections
    pub fn document_count(&self) -> StoreResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn row_to_document(row: &Row) -> rusqlite::Result<Document> {
    let data: String = row.get(2)?;
    let created_at: String = row.get(3)?;

    Ok(Document {
        id: row.get(0)?,
        collection: row.get(1)?,
        data: serde_json::from_str(&data).map_err(|e| conversion_error(2, e))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| conversion_error(3, e))?
            .with_timezone(&Utc),
    })
}
