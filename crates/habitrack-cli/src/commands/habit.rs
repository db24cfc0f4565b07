//! Habit management commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use habitrack_core::calendar::parse_date;
use habitrack_core::ledger::Ledger;
use habitrack_core::{
    Config, DatabaseError, Habit, HabitKind, HabitStore, Intensity, Outcome, RepeatPattern,
    ValidationError,
};
use serde::Serialize;

use super::{load_habit, open_store, print_json, today, CadenceArgs};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit with its first repeat pattern
    Create {
        /// Habit name
        name: String,
        /// Habit kind: positive (good) or avoidance (bad)
        #[arg(long, default_value = "positive", value_parser = parse_kind)]
        kind: HabitKind,
        /// Intensity 1 (light) to 4 (extreme)
        #[arg(long, default_value = "2", value_parser = parse_intensity)]
        intensity: Intensity,
        /// First tracked day (default: today)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        /// List ID
        #[arg(long)]
        list: Option<String>,
        /// Category ID
        #[arg(long)]
        category: Option<String>,
        #[command(flatten)]
        cadence: CadenceArgs,
    },
    /// List habits
    List {
        /// Include archived habits
        #[arg(long)]
        all: bool,
    },
    /// Get habit details
    Get {
        /// Habit ID
        id: String,
    },
    /// Update a habit
    Update {
        /// Habit ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New kind
        #[arg(long, value_parser = parse_kind)]
        kind: Option<HabitKind>,
        /// New intensity
        #[arg(long, value_parser = parse_intensity)]
        intensity: Option<Intensity>,
        /// New list ID
        #[arg(long, conflicts_with = "unlist")]
        list: Option<String>,
        /// Remove the habit from its list
        #[arg(long)]
        unlist: bool,
        /// New category ID
        #[arg(long)]
        category: Option<String>,
    },
    /// Archive a habit (hidden, detached from its list)
    Archive {
        /// Habit ID
        id: String,
    },
    /// Delete a habit and its records
    Delete {
        /// Habit ID
        id: String,
    },
    /// Whether a habit is scheduled and completed on a day
    Status {
        /// Habit ID
        id: String,
        /// Day to check (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

fn parse_kind(s: &str) -> Result<HabitKind, ValidationError> {
    HabitKind::parse(s).ok_or_else(|| ValidationError::InvalidValue {
        field: "kind".to_string(),
        message: format!("expected positive or avoidance, got '{s}'"),
    })
}

fn parse_intensity(s: &str) -> Result<Intensity, ValidationError> {
    let level: u8 = s.parse().map_err(|_| ValidationError::InvalidValue {
        field: "intensity".to_string(),
        message: format!("expected a number from 1 to 4, got '{s}'"),
    })?;
    Intensity::try_from(level)
}

/// Reject list or category ids that do not exist in the store.
fn check_references(
    store: &HabitStore,
    list: Option<&str>,
    category: Option<&str>,
) -> Result<(), DatabaseError> {
    if let Some(id) = list {
        if store.get_list(id)?.is_none() {
            return Err(DatabaseError::NotFound {
                entity: "list",
                id: id.to_string(),
            });
        }
    }
    if let Some(id) = category {
        if store.get_category(id)?.is_none() {
            return Err(DatabaseError::NotFound {
                entity: "category",
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct HabitStatus {
    habit_id: String,
    date: NaiveDate,
    active: bool,
    completed: bool,
    outcome: Option<Outcome>,
    streak: u32,
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = open_store(&config)?;

    match action {
        HabitAction::Create {
            name,
            kind,
            intensity,
            start,
            list,
            category,
            cadence,
        } => {
            check_references(&store, list.as_deref(), category.as_deref())?;
            let start = start.unwrap_or_else(today);
            let mut habit = Habit::new(&name, kind, start)
                .with_pattern(RepeatPattern::new(start, cadence.cadence()?));
            habit.intensity = intensity;
            habit.list_id = list;
            habit.category_id = category;
            store.create_habit(&habit)?;
            print_json(&habit)?;
        }
        HabitAction::List { all } => {
            let habits = store.list_habits(all)?;
            print_json(&habits)?;
        }
        HabitAction::Get { id } => {
            let habit = load_habit(&store, &id)?;
            print_json(&habit)?;
        }
        HabitAction::Update {
            id,
            name,
            kind,
            intensity,
            list,
            unlist,
            category,
        } => {
            let mut habit = load_habit(&store, &id)?;
            check_references(&store, list.as_deref(), category.as_deref())?;
            if let Some(name) = name {
                habit.name = name;
            }
            if let Some(kind) = kind {
                habit.kind = kind;
            }
            if let Some(intensity) = intensity {
                habit.intensity = intensity;
            }
            if unlist {
                habit.list_id = None;
            } else if list.is_some() {
                habit.list_id = list;
            }
            if category.is_some() {
                habit.category_id = category;
            }
            store.update_habit(&habit)?;
            print_json(&habit)?;
        }
        HabitAction::Archive { id } => {
            store.archive_habit(&id)?;
            print_json(&load_habit(&store, &id)?)?;
        }
        HabitAction::Delete { id } => {
            store.delete_habit(&id)?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        HabitAction::Status { id, date } => {
            let habit = load_habit(&store, &id)?;
            let date = date.unwrap_or_else(today);
            let ledger = Ledger::new(&habit);
            let status = ledger.status(date);
            print_json(&HabitStatus {
                habit_id: habit.id.clone(),
                date,
                active: status.active,
                completed: status.completed,
                outcome: ledger.outcome(date),
                streak: ledger.streak(date),
            })?;
        }
    }
    Ok(())
}
