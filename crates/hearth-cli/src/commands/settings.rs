use clap::Subcommand;

use super::{print_json, CmdResult};
use crate::session::Session;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Switch to an owned theme
    Theme {
        /// Theme key
        key: String,
    },
    /// Configure the daily reminder
    Notify {
        /// Turn reminders off
        #[arg(long)]
        off: bool,
        /// Hour of day (0-23)
        #[arg(long)]
        hour: Option<u32>,
        /// Minute (0-59)
        #[arg(long)]
        minute: Option<u32>,
    },
    /// Set the default flame color, or reset it when no color is given
    Flame {
        /// Owned flame color key
        color: Option<String>,
    },
}

pub fn run(action: Option<SettingsAction>, session: &mut Session) -> CmdResult {
    let economy = &mut session.economy;
    match action {
        None => {}
        Some(SettingsAction::Theme { key }) => economy.set_theme(&key)?,
        Some(SettingsAction::Notify { off, hour, minute }) => {
            let current = economy.cache().settings().clone();
            economy.set_notifications(
                !off,
                hour.unwrap_or(current.notification_hour),
                minute.unwrap_or(current.notification_minute),
            )?;
        }
        Some(SettingsAction::Flame { color }) => economy.set_active_flame_color(color.as_deref())?,
    }
    print_json(economy.cache().settings())
}
