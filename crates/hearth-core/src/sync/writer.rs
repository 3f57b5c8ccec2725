//! Background task that applies remote writes in submission order.

use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::sync::gateway::RemoteSyncGateway;
use crate::sync::outbox::Outbox;
use crate::sync::types::{SyncPolicy, WriteOp};

enum WriterMsg {
    Batch(Vec<WriteOp>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. Dropping every handle stops the task once its
/// queue is empty.
#[derive(Clone)]
pub struct RemoteWriter {
    tx: mpsc::UnboundedSender<WriterMsg>,
}

impl RemoteWriter {
    /// Spawn the writer on `handle`.
    ///
    /// Batches run one at a time on the blocking pool. Failed ops are logged
    /// and, under [`SyncPolicy::Outbox`], queued in `outbox`.
    pub fn spawn(
        handle: &Handle,
        gateway: RemoteSyncGateway,
        policy: SyncPolicy,
        outbox: Arc<Mutex<Outbox>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriterMsg>();
        let blocking = handle.clone();

        handle.spawn(async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    WriterMsg::Batch(ops) => {
                        let gw = gateway.clone();
                        let applied = blocking
                            .spawn_blocking(move || {
                                let mut written = Vec::new();
                                let mut failed = Vec::new();
                                for op in ops {
                                    match gw.apply(&op) {
                                        Ok(()) => written.push(op.key()),
                                        Err(e) => {
                                            warn!(key = %op.key(), error = %e, "remote write failed");
                                            failed.push(op);
                                        }
                                    }
                                }
                                (written, failed)
                            })
                            .await;

                        match applied {
                            Ok((written, failed)) => {
                                if policy == SyncPolicy::Outbox {
                                    reconcile(&written, failed, &outbox, clock.as_ref());
                                } else if !failed.is_empty() {
                                    debug!(dropped = failed.len(), "best-effort writes dropped");
                                }
                            }
                            Err(e) => warn!(error = %e, "remote write task panicked"),
                        }
                    }
                    WriterMsg::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("remote writer stopped");
        });

        Self { tx }
    }

    /// Queue `ops` for the remote. Never blocks.
    pub fn submit(&self, ops: Vec<WriteOp>) {
        if ops.is_empty() {
            return;
        }
        if self.tx.send(WriterMsg::Batch(ops)).is_err() {
            warn!("remote writer is gone, dropping writes");
        }
    }

    /// Wait until everything submitted so far has been attempted.
    pub async fn settle(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(WriterMsg::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

/// Bring the outbox in line with a finished batch: documents written now
/// supersede anything queued for them, and failures are queued.
fn reconcile(written: &[String], failed: Vec<WriteOp>, outbox: &Mutex<Outbox>, clock: &dyn Clock) {
    let Ok(mut outbox) = outbox.lock() else {
        warn!("outbox lock poisoned, dropping writes");
        return;
    };
    let mut changed = !failed.is_empty();
    for key in written {
        if outbox.discard(key) {
            debug!(%key, "queued write superseded");
            changed = true;
        }
    }
    let now = clock.now();
    for op in failed {
        outbox.enqueue(op, now);
    }
    if changed {
        if let Err(e) = outbox.persist() {
            warn!(error = %e, "failed to persist outbox");
        }
    }
}
