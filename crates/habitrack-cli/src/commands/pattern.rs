//! Repeat pattern commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use habitrack_core::calendar::parse_date;
use habitrack_core::{Config, RepeatPattern};

use super::{load_habit, open_store, print_json, today, CadenceArgs};

#[derive(Subcommand)]
pub enum PatternAction {
    /// Change a habit's schedule from a given day on
    Add {
        /// Habit ID
        habit_id: String,
        /// First day the pattern applies (default: today)
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,
        /// Keep counting from the previous pattern's anchor
        #[arg(long)]
        follow_up: bool,
        #[command(flatten)]
        cadence: CadenceArgs,
    },
    /// List a habit's patterns in insertion order
    List {
        /// Habit ID
        habit_id: String,
    },
}

pub fn run(action: PatternAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = open_store(&config)?;

    match action {
        PatternAction::Add {
            habit_id,
            from,
            follow_up,
            cadence,
        } => {
            let from = from.unwrap_or_else(today);
            let cadence = cadence.cadence()?;
            let pattern = if follow_up {
                RepeatPattern::follow_up(from, cadence)
            } else {
                RepeatPattern::new(from, cadence)
            };
            store.add_pattern(&habit_id, &pattern)?;
            print_json(&pattern)?;
        }
        PatternAction::List { habit_id } => {
            let habit = load_habit(&store, &habit_id)?;
            print_json(&habit.patterns)?;
        }
    }
    Ok(())
}
