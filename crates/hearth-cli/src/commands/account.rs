use clap::Subcommand;

use super::CmdResult;
use crate::session::Session;

#[derive(Subcommand)]
pub enum AccountAction {
    /// Delete every remote document for this account and reset local state
    Delete {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: AccountAction, session: &mut Session) -> CmdResult {
    match action {
        AccountAction::Delete { yes } => {
            if !yes {
                return Err("refusing to delete the account without --yes".into());
            }
            session.runtime.block_on(session.economy.delete_account())?;
            println!("account deleted");
        }
    }
    Ok(())
}
