//! Habit management commands for CLI.

use clap::Subcommand;
use serde_json::json;

use super::{print_json, resolve_habit, CmdResult};
use crate::session::Session;

#[derive(Subcommand)]
pub enum HabitAction {
    /// Light a new habit
    Add {
        /// Habit name
        name: String,
        /// Icon identifier
        #[arg(long, default_value = "flame")]
        icon: String,
    },
    /// List habits
    List {
        /// Include extinguished habits
        #[arg(long)]
        all: bool,
    },
    /// Show a habit with its entries and the reward for completing it today
    Show {
        /// Habit name or id
        habit: String,
    },
    /// Extinguish a habit; its history is kept
    Extinguish {
        /// Habit name or id
        habit: String,
    },
    /// Delete a habit and every entry recorded for it
    Remove {
        /// Habit name or id
        habit: String,
    },
    /// Set a habit's flame color, or clear it when no color is given
    Color {
        /// Habit name or id
        habit: String,
        /// Owned flame color key
        color: Option<String>,
    },
}

pub fn run(action: HabitAction, session: &mut Session) -> CmdResult {
    let economy = &mut session.economy;
    match action {
        HabitAction::Add { name, icon } => {
            let habit = economy.create_habit(&name, &icon)?;
            print_json(&habit)?;
        }
        HabitAction::List { all } => {
            let habits: Vec<_> = economy
                .cache()
                .habits()
                .iter()
                .filter(|habit| all || habit.is_active())
                .collect();
            print_json(&habits)?;
        }
        HabitAction::Show { habit } => {
            let id = resolve_habit(economy, &habit)?;
            let cache = economy.cache();
            let entries: Vec<_> = cache.entries_for(id).collect();
            print_json(&json!({
                "habit": cache.habit(id),
                "entries": entries,
                "reward_today": economy.estimate_reward(id).ok(),
            }))?;
        }
        HabitAction::Extinguish { habit } => {
            let id = resolve_habit(economy, &habit)?;
            economy.extinguish_habit(id)?;
            println!("extinguished {id}");
        }
        HabitAction::Remove { habit } => {
            let id = resolve_habit(economy, &habit)?;
            economy.delete_habit(id)?;
            println!("deleted {id}");
        }
        HabitAction::Color { habit, color } => {
            let id = resolve_habit(economy, &habit)?;
            let habit = economy.assign_flame_color(id, color.as_deref())?;
            print_json(&habit)?;
        }
    }
    Ok(())
}
