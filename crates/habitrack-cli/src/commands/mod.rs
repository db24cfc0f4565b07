//! Subcommand implementations.
//!
//! Every command prints JSON on stdout; errors bubble up to `main`.

pub mod category;
pub mod completion;
pub mod config;
pub mod habit;
pub mod list;
pub mod pattern;
pub mod stats;

use std::error::Error;

use chrono::{Local, NaiveDate};
use clap::Args;
use habitrack_core::{Cadence, Config, DatabaseError, Habit, HabitStore, ValidationError};
use serde::Serialize;

/// Open the configured store, seeding preset categories on first use.
pub(crate) fn open_store(config: &Config) -> Result<HabitStore, Box<dyn Error>> {
    let store = HabitStore::open_default(config)?;
    store.seed_default_categories()?;
    Ok(store)
}

pub(crate) fn load_habit(store: &HabitStore, id: &str) -> Result<Habit, Box<dyn Error>> {
    store.get_habit(id)?.ok_or_else(|| {
        DatabaseError::NotFound {
            entity: "habit",
            id: id.to_string(),
        }
        .into()
    })
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Schedule flags shared by `habit create` and `pattern add`.
#[derive(Args, Debug, Default)]
pub struct CadenceArgs {
    /// Repeat every N days
    #[arg(long, conflicts_with_all = ["weekdays", "month_days"])]
    pub every: Option<u32>,
    /// Comma-separated weekdays, e.g. mon,wed,fri
    #[arg(long, value_delimiter = ',', conflicts_with = "month_days")]
    pub weekdays: Vec<chrono::Weekday>,
    /// With --weekdays: repeat every N weeks
    #[arg(long, default_value_t = 1)]
    pub every_weeks: u32,
    /// Comma-separated days of the month, e.g. 1,15
    #[arg(long, value_delimiter = ',')]
    pub month_days: Vec<u32>,
}

impl CadenceArgs {
    /// The requested cadence; every day when no flag is given.
    pub fn cadence(&self) -> Result<Cadence, ValidationError> {
        let invalid = |field: &str, message: &str| ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.to_string(),
        };

        if let Some(days) = self.every {
            if days == 0 {
                return Err(invalid("every", "must be at least 1"));
            }
            return Ok(Cadence::DaysInterval { days });
        }
        if !self.weekdays.is_empty() {
            if self.every_weeks == 0 {
                return Err(invalid("every-weeks", "must be at least 1"));
            }
            return Ok(Cadence::Weekdays {
                days: self.weekdays.clone(),
                every_weeks: self.every_weeks,
            });
        }
        if !self.month_days.is_empty() {
            if self.month_days.iter().any(|d| !(1..=31).contains(d)) {
                return Err(invalid("month-days", "days must be between 1 and 31"));
            }
            return Ok(Cadence::MonthDays {
                days: self.month_days.clone(),
            });
        }
        Ok(Cadence::EveryDay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cadence_is_every_day() {
        assert_eq!(CadenceArgs::default().cadence().unwrap(), Cadence::EveryDay);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let args = CadenceArgs {
            every: Some(0),
            ..CadenceArgs::default()
        };
        assert!(args.cadence().is_err());
    }

    #[test]
    fn weekdays_carry_week_interval() {
        let args = CadenceArgs {
            weekdays: vec![chrono::Weekday::Tue],
            every_weeks: 2,
            ..CadenceArgs::default()
        };
        assert_eq!(
            args.cadence().unwrap(),
            Cadence::Weekdays {
                days: vec![chrono::Weekday::Tue],
                every_weeks: 2
            }
        );
    }

    #[test]
    fn month_days_are_range_checked() {
        let args = CadenceArgs {
            month_days: vec![1, 32],
            ..CadenceArgs::default()
        };
        assert!(args.cadence().is_err());
    }
}
