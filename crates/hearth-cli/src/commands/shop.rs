//! Shop and inventory-use commands.

use clap::{Args, Subcommand, ValueEnum};
use hearth_core::model::MultiplierTier;
use hearth_core::UseItem;
use serde_json::json;

use super::{print_json, resolve_habit, CmdResult};
use crate::session::Session;

#[derive(Subcommand)]
pub enum ShopAction {
    /// List catalog items with prices and ownership
    List,
    /// Buy an item by id (see `shop list`)
    Buy {
        /// Catalog item id
        item: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum UsableItem {
    #[value(name = "multiplier_24h")]
    Multiplier24h,
    #[value(name = "multiplier_7d")]
    Multiplier7d,
    #[value(name = "mega_multiplier")]
    MegaMultiplier,
    #[value(name = "streak_recovery")]
    StreakRecovery,
    #[value(name = "auto_complete_pass")]
    AutoCompletePass,
}

#[derive(Args)]
pub struct UseArgs {
    /// Item to spend
    item: UsableItem,
    /// Target habit (streak_recovery only)
    #[arg(long)]
    habit: Option<String>,
}

pub fn run(action: ShopAction, session: &mut Session) -> CmdResult {
    let economy = &mut session.economy;
    match action {
        ShopAction::List => {
            let items: Vec<_> = economy
                .catalog()
                .items()
                .iter()
                .map(|item| {
                    let owned = item.cosmetic().map(|cosmetic| economy.owns(&cosmetic));
                    json!({
                        "id": item.id,
                        "name": item.name,
                        "kind": item.kind,
                        "price": item.price,
                        "quantity": item.quantity,
                        "owned": owned,
                    })
                })
                .collect();
            print_json(&json!({
                "balance": economy.cache().wallet().balance,
                "items": items,
            }))
        }
        ShopAction::Buy { item } => {
            let receipt = economy.purchase(&item)?;
            print_json(&receipt)
        }
    }
}

pub fn use_item(args: UseArgs, session: &mut Session) -> CmdResult {
    let economy = &mut session.economy;
    let item = match args.item {
        UsableItem::Multiplier24h => UseItem::Multiplier {
            tier: MultiplierTier::Day,
        },
        UsableItem::Multiplier7d => UseItem::Multiplier {
            tier: MultiplierTier::Week,
        },
        UsableItem::MegaMultiplier => UseItem::Multiplier {
            tier: MultiplierTier::Mega,
        },
        UsableItem::StreakRecovery => {
            let habit = args.habit.ok_or("streak_recovery needs --habit")?;
            UseItem::StreakRecovery {
                habit_id: resolve_habit(economy, &habit)?,
            }
        }
        UsableItem::AutoCompletePass => UseItem::AutoCompletePass,
    };
    let effect = economy.use_inventory_item(item)?;
    print_json(&effect)
}
