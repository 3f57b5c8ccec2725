//! Queue of remote writes that failed and are waiting to be replayed.
//!
//! Writes are keyed by `collection/id`, so a newer write for the same
//! document replaces an older queued one. Draining hands ops back in the
//! order they were first queued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::sync::types::{SyncError, WriteOp};

/// A queued write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub op: WriteOp,
    /// How many times this key has been queued.
    pub attempts: u32,
    pub queued_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OutboxFile {
    next_seq: u64,
    pending: HashMap<String, PendingWrite>,
}

/// Pending writes, optionally persisted to a JSON file.
#[derive(Debug, Default)]
pub struct Outbox {
    state: OutboxFile,
    path: Option<PathBuf>,
}

impl Outbox {
    /// In-memory outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Outbox backed by `path`; call [`Outbox::load`] to pick up earlier contents.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            state: OutboxFile::default(),
            path: Some(path.into()),
        }
    }

    pub fn enqueue(&mut self, op: WriteOp, now: DateTime<Utc>) {
        let key = op.key();
        let seq = self.state.next_seq;
        self.state.next_seq += 1;

        let attempts = self
            .state
            .pending
            .get(&key)
            .map_or(1, |previous| previous.attempts.saturating_add(1));
        self.state.pending.insert(
            key,
            PendingWrite {
                op,
                attempts,
                queued_at: now,
                seq,
            },
        );
    }

    /// Put back a write that failed again, unless a newer write for the same
    /// document was queued in the meantime.
    pub fn requeue(&mut self, pending: PendingWrite) {
        let key = pending.op.key();
        if self.state.pending.contains_key(&key) {
            return;
        }
        let seq = self.state.next_seq;
        self.state.next_seq += 1;
        self.state.pending.insert(
            key,
            PendingWrite {
                attempts: pending.attempts.saturating_add(1),
                seq,
                ..pending
            },
        );
    }

    /// Drop the queued write for `key`, if any. Called once a newer write for
    /// the same document has reached the remote, so the stale one is never replayed.
    pub fn discard(&mut self, key: &str) -> bool {
        self.state.pending.remove(key).is_some()
    }

    pub fn contains(&self, op: &WriteOp) -> bool {
        self.state.pending.contains_key(&op.key())
    }

    /// Remove and return up to `n` writes, oldest first.
    pub fn drain_up_to(&mut self, n: usize) -> Vec<PendingWrite> {
        let mut keys: Vec<(u64, String)> = self
            .state
            .pending
            .iter()
            .map(|(key, pending)| (pending.seq, key.clone()))
            .collect();
        keys.sort();

        keys.into_iter()
            .take(n)
            .filter_map(|(_, key)| self.state.pending.remove(&key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.pending.is_empty()
    }

    /// Write the queue to its file. No-op for in-memory outboxes.
    pub fn persist(&self) -> Result<(), SyncError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Replace the in-memory queue with the file's contents, if the file exists.
    pub fn load(&mut self) -> Result<(), SyncError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(path)?;
        self.state = serde_json::from_str(&content)?;
        Ok(())
    }
}
