//! # Habitrack Core Library
//!
//! This library provides the core logic for the Habitrack habit tracker. All
//! operations are available through the standalone `habitrack` CLI, which is
//! a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Evaluator**: decides whether a habit is scheduled on a calendar day
//!   from its start date and its history of repeat patterns
//! - **Ledger**: completion lookup per day and streaks
//! - **Analytics**: completion rates grouped by weekday, list, category,
//!   intensity or kind, plus summaries and chart series
//! - **Cache**: memoised day statuses with a cancellable month warm-up
//! - **Storage**: SQLite entity store and TOML configuration
//!
//! Evaluation never fails. Missing records read as "not completed" and
//! unusable schedules read as "not active".
//!
//! ## Key Components
//!
//! - [`is_active`]: the schedule contract
//! - [`calculate_streak`]: consecutive completed scheduled days
//! - [`HabitStore`]: persistence
//! - [`Config`]: application configuration

pub mod analytics;
pub mod cache;
pub mod calendar;
pub mod error;
pub mod evaluator;
pub mod habit;
pub mod ledger;
pub mod storage;

pub use analytics::{GroupKey, GroupRate, Series, SeriesPoint};
pub use cache::{CacheWarmer, DayStatusCache, WarmupOutcome};
pub use calendar::{DateRange, WeekStart};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use evaluator::is_active;
pub use habit::{
    Cadence, Completion, Habit, HabitCategory, HabitKind, HabitList, Intensity, Outcome,
    RepeatPattern,
};
pub use ledger::{calculate_streak, is_completed, DayStatus, Ledger};
pub use storage::{Config, HabitStore};
