//! `done` / `undo`: record or clear a day's completion.

use chrono::{Local, NaiveDate};
use clap::Args;
use habitrack_core::calendar::parse_date;
use habitrack_core::ledger::Ledger;
use habitrack_core::{Completion, Config};

use super::{load_habit, open_store, print_json, today};

#[derive(Args)]
pub struct MarkArgs {
    /// Habit ID
    pub id: String,
    /// Day to record (default: today)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
    /// Record the day as missed (or relapsed) instead
    #[arg(long)]
    pub missed: bool,
}

#[derive(Args)]
pub struct UndoArgs {
    /// Habit ID
    pub id: String,
    /// Day to clear (default: today)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

pub fn mark(args: MarkArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let habit = load_habit(&store, &args.id)?;

    let now = Local::now().naive_local();
    let date = args.date.unwrap_or_else(today);
    // Past days are stamped at midnight.
    let recorded_at = if date == now.date() {
        now
    } else {
        date.and_time(chrono::NaiveTime::MIN)
    };
    store.set_completion(&Completion::new(&habit.id, recorded_at, !args.missed))?;

    let habit = load_habit(&store, &args.id)?;
    let ledger = Ledger::new(&habit);
    print_json(&serde_json::json!({
        "habit_id": habit.id,
        "date": date,
        "completed": ledger.is_completed(date),
        "outcome": ledger.outcome(date),
        "streak": ledger.streak(date),
    }))
}

pub fn undo(args: UndoArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let habit = load_habit(&store, &args.id)?;

    let date = args.date.unwrap_or_else(today);
    let cleared = store.clear_completion(&habit.id, date)?;
    print_json(&serde_json::json!({
        "habit_id": habit.id,
        "date": date,
        "cleared": cleared,
    }))
}
