pub mod account;
pub mod checkin;
pub mod config;
pub mod habit;
pub mod settings;
pub mod shop;
pub mod sync;
pub mod wager;
pub mod wallet;

use hearth_core::model::Habit;
use hearth_core::Economy;
use serde::Serialize;
use uuid::Uuid;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Find a habit by id, id prefix or case-insensitive name.
///
/// Active habits win when a name is shared with extinguished ones.
pub fn resolve_habit(economy: &Economy, query: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    let habits = economy.cache().habits();
    if let Ok(id) = Uuid::parse_str(query) {
        if habits.iter().any(|habit| habit.id == id) {
            return Ok(id);
        }
    }

    let mut matches: Vec<&Habit> = habits
        .iter()
        .filter(|habit| habit.name.eq_ignore_ascii_case(query))
        .collect();
    if matches.len() > 1 {
        matches.retain(|habit| habit.is_active());
    }
    if matches.is_empty() && !query.is_empty() {
        matches = habits
            .iter()
            .filter(|habit| habit.id.to_string().starts_with(query))
            .collect();
    }

    match matches.as_slice() {
        [habit] => Ok(habit.id),
        [] => Err(format!("no habit matches '{query}'").into()),
        many => Err(format!("'{query}' matches {} habits, use the id", many.len()).into()),
    }
}
