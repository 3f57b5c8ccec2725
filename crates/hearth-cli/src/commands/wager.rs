use clap::Subcommand;

use super::{print_json, CmdResult};
use crate::session::Session;

#[derive(Subcommand)]
pub enum WagerAction {
    /// Stake coins on completing every active habit each day
    Place {
        /// Coins to stake
        amount: u64,
        /// Length of the run in days
        days: u32,
    },
    /// List wagers, newest first
    List {
        /// Only running wagers
        #[arg(long)]
        active: bool,
    },
    /// Settle running wagers against recorded check-ins
    Settle,
}

pub fn run(action: WagerAction, session: &mut Session) -> CmdResult {
    let economy = &mut session.economy;
    match action {
        WagerAction::Place { amount, days } => {
            let wager = economy.place_wager(amount, days)?;
            print_json(&wager)
        }
        WagerAction::List { active } => {
            let wagers: Vec<_> = economy
                .cache()
                .wagers()
                .iter()
                .filter(|wager| !active || wager.is_active)
                .collect();
            print_json(&wagers)
        }
        WagerAction::Settle => {
            let verdicts = economy.settle_wagers_for_today();
            print_json(&verdicts)
        }
    }
}
