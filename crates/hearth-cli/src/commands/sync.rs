use clap::Subcommand;
use serde_json::json;

use super::{print_json, CmdResult};
use crate::session::Session;

#[derive(Subcommand)]
pub enum SyncAction {
    /// Show the sync policy and queued writes
    Status,
    /// Retry every queued write once
    Flush,
}

pub fn run(action: SyncAction, session: &mut Session) -> CmdResult {
    match action {
        SyncAction::Status => print_json(&json!({
            "policy": session.economy.config().sync.policy,
            "signed_in": session.economy.is_signed_in(),
            "pending": session.economy.pending_outbox(),
        })),
        SyncAction::Flush => {
            let flushed = session.runtime.block_on(session.economy.flush_outbox())?;
            print_json(&flushed)
        }
    }
}
