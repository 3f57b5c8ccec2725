//! Remote persistence.
//!
//! The remote is a per-user document store addressed by collection. Writes
//! leave the economy through a [`RemoteWriter`] so they reach the store in
//! the order they were made; reads go through [`RemoteSyncGateway`].

pub mod gateway;
pub mod memory;
pub mod outbox;
pub mod sqlite;
pub mod store;
pub mod types;
pub mod writer;

pub use gateway::{OwnedKey, RemoteSyncGateway};
pub use memory::MemoryStore;
pub use outbox::{Outbox, PendingWrite};
pub use sqlite::SqliteStore;
pub use store::RemoteStore;
pub use types::{Collection, Document, SyncError, SyncPolicy, UserIdentity, WriteOp, SINGLETON_ID};
pub use writer::RemoteWriter;
