//! Core types for remote synchronization.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Document id used by single-record collections.
pub const SINGLETON_ID: &str = "current";

/// Remote collection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Habits,
    Entries,
    Wallet,
    Settings,
    Inventory,
    Wagers,
    OwnedFlameColors,
    UnlockedBadges,
    OwnedThemes,
    PurchasedItems,
}

impl Collection {
    pub const ALL: [Collection; 10] = [
        Collection::Habits,
        Collection::Entries,
        Collection::Wallet,
        Collection::Settings,
        Collection::Inventory,
        Collection::Wagers,
        Collection::OwnedFlameColors,
        Collection::UnlockedBadges,
        Collection::OwnedThemes,
        Collection::PurchasedItems,
    ];

    /// Collection name in the remote namespace.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Habits => "habits",
            Collection::Entries => "entries",
            Collection::Wallet => "wallet",
            Collection::Settings => "settings",
            Collection::Inventory => "inventory",
            Collection::Wagers => "wagers",
            Collection::OwnedFlameColors => "owned_flame_colors",
            Collection::UnlockedBadges => "unlocked_badges",
            Collection::OwnedThemes => "owned_themes",
            Collection::PurchasedItems => "purchased_items",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|collection| collection.name() == name)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// JSON serialized record.
    pub data: serde_json::Value,
    /// Last-write-wins timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn encode<T: Serialize>(id: impl Into<String>, value: &T, updated_at: DateTime<Utc>) -> Result<Self, SyncError> {
        Ok(Self {
            id: id.into(),
            data: serde_json::to_value(value)?,
            updated_at,
        })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, SyncError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// The authenticated user whose namespace is read and written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

/// A single pending remote mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    Put { collection: Collection, document: Document },
    Delete { collection: Collection, id: String },
}

impl WriteOp {
    pub fn put<T: Serialize>(
        collection: Collection,
        id: impl Into<String>,
        value: &T,
        at: DateTime<Utc>,
    ) -> Result<Self, SyncError> {
        Ok(WriteOp::Put {
            collection,
            document: Document::encode(id, value, at)?,
        })
    }

    pub fn delete(collection: Collection, id: impl Into<String>) -> Self {
        WriteOp::Delete {
            collection,
            id: id.into(),
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            WriteOp::Put { collection, .. } | WriteOp::Delete { collection, .. } => *collection,
        }
    }

    pub fn document_id(&self) -> &str {
        match self {
            WriteOp::Put { document, .. } => &document.id,
            WriteOp::Delete { id, .. } => id,
        }
    }

    /// `collection/id`; later ops on the same key supersede earlier ones.
    pub fn key(&self) -> String {
        format!("{}/{}", self.collection().name(), self.document_id())
    }
}

/// What to do with a remote write that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Log and drop.
    #[default]
    BestEffort,
    /// Queue for a later `flush_outbox`.
    Outbox,
}

/// Sync error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied for {0}")]
    PermissionDenied(Collection),

    #[error("No signed-in identity")]
    NotSignedIn,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Account deletion incomplete; failed collections: {failed:?}")]
    PartialDelete { failed: Vec<Collection> },
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        SyncError::Task(err.to_string())
    }
}
