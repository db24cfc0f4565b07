//! Analytics commands for CLI.

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use habitrack_core::analytics::{
    category_performance, completion_rates, habit_summary, intensity_distribution, label_groups,
    list_performance, overview, streak_series, weekly_pattern, WEEKLY_PLACEHOLDER,
};
use habitrack_core::calendar::parse_date;
use habitrack_core::{
    CacheWarmer, Config, DateRange, DayStatusCache, GroupKey, ValidationError, WeekStart,
};
use serde::Serialize;

use super::{load_habit, open_store, print_json, today};

/// Reporting window; defaults to the configured number of days ending today.
#[derive(Args)]
pub struct RangeArgs {
    /// First day (inclusive)
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,
    /// Last day (inclusive, default: today)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,
}

impl RangeArgs {
    fn resolve(&self, config: &Config) -> Result<DateRange, ValidationError> {
        let end = self.to.unwrap_or_else(today);
        match self.from {
            Some(start) => DateRange::new(start, end),
            None => Ok(DateRange::trailing(end, config.analytics.default_range_days)),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GroupBy {
    Weekday,
    List,
    Category,
    Intensity,
    Kind,
}

#[derive(Subcommand)]
pub enum StatsAction {
    /// Headline numbers for all active habits
    Overview {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Completion rate per day of week
    Weekly {
        #[command(flatten)]
        range: RangeArgs,
        /// First day of the week: monday or sunday (default: from config)
        #[arg(long, value_parser = parse_week_start)]
        week_start: Option<WeekStart>,
    },
    /// Completion rates grouped by a dimension
    Rates {
        /// Grouping dimension
        #[arg(long, value_enum, default_value = "weekday")]
        by: GroupBy,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Completion rate per list
    Lists {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Completion rate per category
    Categories {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Number of habits per intensity level
    Intensity,
    /// Streaks and rate for one habit
    Habit {
        /// Habit ID
        id: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Streak value for each day of the range
    Streaks {
        /// Habit ID
        id: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Day-by-day status of every habit for a month
    Month {
        /// Any day in the month (default: today)
        #[arg(long, value_parser = parse_date)]
        month: Option<NaiveDate>,
    },
}

fn parse_week_start(s: &str) -> Result<WeekStart, ValidationError> {
    match s.to_ascii_lowercase().as_str() {
        "monday" | "mon" => Ok(WeekStart::Monday),
        "sunday" | "sun" => Ok(WeekStart::Sunday),
        _ => Err(ValidationError::InvalidValue {
            field: "week-start".to_string(),
            message: format!("expected monday or sunday, got '{s}'"),
        }),
    }
}

#[derive(Serialize)]
struct DayCell {
    date: NaiveDate,
    active: bool,
    completed: bool,
}

#[derive(Serialize)]
struct MonthRow {
    habit_id: String,
    name: String,
    days: Vec<DayCell>,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = open_store(&config)?;

    match action {
        StatsAction::Overview { range } => {
            let range = range.resolve(&config)?;
            let habits = store.list_habits(false)?;
            print_json(&overview(&habits, range, range.end))?;
        }
        StatsAction::Weekly { range, week_start } => {
            let range = range.resolve(&config)?;
            let habits = store.list_habits(false)?;
            let week_start = week_start.unwrap_or(config.analytics.week_start);
            let mut series = weekly_pattern(&habits, range, week_start);
            if config.analytics.placeholder_when_empty {
                series = series.with_placeholder(&WEEKLY_PLACEHOLDER);
            }
            print_json(&series)?;
        }
        StatsAction::Rates { by, range } => {
            let range = range.resolve(&config)?;
            let habits = store.list_habits(false)?;
            let key = match by {
                GroupBy::Weekday => GroupKey::Weekday(config.analytics.week_start),
                GroupBy::List => GroupKey::List,
                GroupBy::Category => GroupKey::Category,
                GroupBy::Intensity => GroupKey::Intensity,
                GroupBy::Kind => GroupKey::Kind,
            };
            let rates = completion_rates(&habits, range, key);
            let rates = match by {
                GroupBy::List => {
                    let lists = store.list_lists()?;
                    let names: Vec<(&str, &str)> =
                        lists.iter().map(|l| (l.id.as_str(), l.name.as_str())).collect();
                    label_groups(rates, &names)
                }
                GroupBy::Category => {
                    let categories = store.list_categories()?;
                    let names: Vec<(&str, &str)> = categories
                        .iter()
                        .map(|c| (c.id.as_str(), c.name.as_str()))
                        .collect();
                    label_groups(rates, &names)
                }
                _ => rates,
            };
            print_json(&rates)?;
        }
        StatsAction::Lists { range } => {
            let range = range.resolve(&config)?;
            let habits = store.list_habits(false)?;
            print_json(&list_performance(&habits, &store.list_lists()?, range))?;
        }
        StatsAction::Categories { range } => {
            let range = range.resolve(&config)?;
            let habits = store.list_habits(false)?;
            print_json(&category_performance(
                &habits,
                &store.list_categories()?,
                range,
            ))?;
        }
        StatsAction::Intensity => {
            print_json(&intensity_distribution(&store.list_habits(false)?))?;
        }
        StatsAction::Habit { id, range } => {
            let range = range.resolve(&config)?;
            let habit = load_habit(&store, &id)?;
            print_json(&habit_summary(&habit, range, range.end))?;
        }
        StatsAction::Streaks { id, range } => {
            let range = range.resolve(&config)?;
            let habit = load_habit(&store, &id)?;
            print_json(&streak_series(&habit, range))?;
        }
        StatsAction::Month { month } => {
            let habits = Arc::new(store.list_habits(false)?);
            let range = DateRange::month_of(month.unwrap_or_else(today));
            let warmer = CacheWarmer::new(Arc::new(DayStatusCache::new()));

            let runtime = tokio::runtime::Runtime::new()?;
            let outcome = runtime.block_on(async {
                warmer.warm(Arc::clone(&habits), range).wait().await
            });
            tracing::debug!(?outcome, "month warm-up finished");

            let cache = warmer.cache();
            let rows: Vec<MonthRow> = habits
                .iter()
                .map(|habit| MonthRow {
                    habit_id: habit.id.clone(),
                    name: habit.name.clone(),
                    days: range
                        .days()
                        .map(|date| {
                            let status = cache.get_or_compute(habit, date);
                            DayCell {
                                date,
                                active: status.active,
                                completed: status.completed,
                            }
                        })
                        .collect(),
                })
                .collect();
            print_json(&rows)?;
        }
    }
    Ok(())
}
