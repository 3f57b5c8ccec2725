//! Check-in and note commands.

use chrono::NaiveDate;
use clap::Args;

use super::{print_json, resolve_habit, CmdResult};
use crate::session::Session;

#[derive(Args)]
pub struct CheckinArgs {
    /// Habit name or id
    habit: String,
    /// Record a miss instead of a completion
    #[arg(long)]
    missed: bool,
    /// Day to record (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Args)]
pub struct NoteArgs {
    /// Habit name or id
    habit: String,
    /// Note text; omit to clear the note
    text: Option<String>,
    /// Measured value for the day (distance, pages, minutes)
    #[arg(long)]
    value: Option<f64>,
    /// Day of the entry (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,
}

pub fn run(args: CheckinArgs, session: &mut Session) -> CmdResult {
    let economy = &mut session.economy;
    let id = resolve_habit(economy, &args.habit)?;
    let day = args.date.unwrap_or_else(|| economy.today());
    let outcome = economy.check_in_on(id, !args.missed, day)?;
    print_json(&outcome)
}

pub fn note(args: NoteArgs, session: &mut Session) -> CmdResult {
    let economy = &mut session.economy;
    let id = resolve_habit(economy, &args.habit)?;
    let day = args.date.unwrap_or_else(|| economy.today());
    let entry = economy.save_note(id, day, args.text, args.value)?;
    print_json(&entry)
}
