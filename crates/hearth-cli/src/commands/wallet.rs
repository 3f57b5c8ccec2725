//! Read-only views of the wallet and inventory.

use super::{print_json, CmdResult};
use crate::session::Session;

pub fn wallet(session: &mut Session) -> CmdResult {
    print_json(session.economy.cache().wallet())
}

pub fn inventory(session: &mut Session) -> CmdResult {
    let economy = &session.economy;
    let inventory = economy.cache().inventory();
    print_json(&serde_json::json!({
        "counts": inventory.counts,
        "live_multiplier": inventory.live_multiplier(economy.now()),
        "owned_flame_colors": inventory.owned_flame_colors,
        "owned_themes": inventory.owned_themes,
        "unlocked_badges": inventory.unlocked_badges,
        "purchased_items": inventory.purchased_items,
    }))
}
