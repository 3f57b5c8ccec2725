use crate::sync::types::{Collection, Document, SyncError};

/// Durable per-user document storage.
///
/// Calls block; the economy runs them on tokio's blocking pool. There are no
/// transactions across collections. `put` is last-write-wins on
/// [`Document::updated_at`]: an older document never replaces a newer one.
pub trait RemoteStore: Send + Sync {
    fn list(&self, user: &str, collection: Collection) -> Result<Vec<Document>, SyncError>;

    fn get(&self, user: &str, collection: Collection, id: &str) -> Result<Option<Document>, SyncError>;

    fn put(&self, user: &str, collection: Collection, document: Document) -> Result<(), SyncError>;

    fn delete(&self, user: &str, collection: Collection, id: &str) -> Result<(), SyncError>;

    /// Remove every document in `collection` for `user`.
    fn delete_collection(&self, user: &str, collection: Collection) -> Result<(), SyncError>;
}
