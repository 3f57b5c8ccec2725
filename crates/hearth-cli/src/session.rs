//! Composition root: wires the engine to on-disk storage for one CLI invocation.

use std::sync::Arc;

use hearth_core::{
    data_dir, Economy, EngineConfig, LocalMirror, Outbox, RemoteSyncGateway, SqliteStore, SystemClock,
    UserIdentity,
};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

const DEFAULT_USER: &str = "local";

pub struct Session {
    pub runtime: Runtime,
    pub economy: Economy,
}

impl Session {
    /// Open the stores under the data dir and load the user's state.
    ///
    /// `store.db` stands in for the hosted document store, `mirror.db` is the
    /// local fallback and `outbox.json` holds writes queued under the outbox
    /// policy.
    pub fn open(user: Option<String>) -> hearth_core::Result<Self> {
        let config = EngineConfig::load()?;
        let dir = data_dir()?;
        let user = user
            .or_else(|| std::env::var("HEARTH_USER").ok())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());

        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        let store = SqliteStore::open(dir.join("store.db"))?;
        let gateway = RemoteSyncGateway::new(Arc::new(store), UserIdentity::new(user.as_str()));
        let mut outbox = Outbox::with_path(dir.join("outbox.json"));
        outbox.load()?;
        let mirror = LocalMirror::open(dir.join("mirror.db"))?;

        let mut economy = Economy::new(config, Arc::new(SystemClock), runtime.handle().clone())
            .with_outbox(outbox)
            .with_gateway(gateway)
            .with_mirror(mirror);
        let report = runtime.block_on(economy.load_all());
        if !report.is_complete() {
            warn!(degraded = ?report.degraded, "some collections failed to load");
        }
        debug!(%user, dir = %dir.display(), "session open");
        Ok(Self { runtime, economy })
    }

    /// Wait for every write issued during the command.
    pub fn close(self) {
        self.runtime.block_on(self.economy.settle_writes());
    }
}
