//! SQLite-backed document store.
//!
//! Holds the same per-user collections as the hosted store. The CLI uses it
//! as its durable remote; tests use it through an in-memory connection.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::sync::store::RemoteStore;
use crate::sync::types::{Collection, Document, SyncError};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store.
    pub fn open_memory() -> Result<Self, SyncError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, SyncError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                user_id     TEXT NOT NULL,
                collection  TEXT NOT NULL,
                doc_id      TEXT NOT NULL,
                data        TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                PRIMARY KEY (user_id, collection, doc_id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(user_id, collection);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, SyncError> {
        self.conn
            .lock()
            .map_err(|_| SyncError::Unavailable("sqlite store lock poisoned".into()))
    }
}

/// Fixed-width UTC timestamps so SQLite string comparison orders them.
fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_document(id: String, data: String, updated_at: String) -> Result<Document, SyncError> {
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| SyncError::Unavailable(format!("invalid timestamp '{updated_at}': {e}")))?
        .with_timezone(&Utc);
    Ok(Document {
        id,
        data: serde_json::from_str(&data)?,
        updated_at,
    })
}

impl RemoteStore for SqliteStore {
    fn list(&self, user: &str, collection: Collection) -> Result<Vec<Document>, SyncError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT doc_id, data, updated_at FROM documents
             WHERE user_id = ?1 AND collection = ?2
             ORDER BY doc_id",
        )?;
        let rows = stmt.query_map(params![user, collection.name()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, data, updated_at) = row?;
            documents.push(row_to_document(id, data, updated_at)?);
        }
        Ok(documents)
    }

    fn get(&self, user: &str, collection: Collection, id: &str) -> Result<Option<Document>, SyncError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT doc_id, data, updated_at FROM documents
                 WHERE user_id = ?1 AND collection = ?2 AND doc_id = ?3",
                params![user, collection.name(), id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(id, data, updated_at)| row_to_document(id, data, updated_at))
            .transpose()
    }

    fn put(&self, user: &str, collection: Collection, document: Document) -> Result<(), SyncError> {
        let data = serde_json::to_string(&document.data)?;
        self.conn()?.execute(
            "INSERT INTO documents (user_id, collection, doc_id, data, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, collection, doc_id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at
             WHERE excluded.updated_at >= documents.updated_at",
            params![user, collection.name(), document.id, data, stamp(document.updated_at)],
        )?;
        Ok(())
    }

    fn delete(&self, user: &str, collection: Collection, id: &str) -> Result<(), SyncError> {
        self.conn()?.execute(
            "DELETE FROM documents WHERE user_id = ?1 AND collection = ?2 AND doc_id = ?3",
            params![user, collection.name(), id],
        )?;
        Ok(())
    }

    fn delete_collection(&self, user: &str, collection: Collection) -> Result<(), SyncError> {
        self.conn()?.execute(
            "DELETE FROM documents WHERE user_id = ?1 AND collection = ?2",
            params![user, collection.name()],
        )?;
        Ok(())
    }
}
