//! Repeat patterns and their cadences.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How often a habit recurs while a pattern is in effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cadence {
    /// Every calendar day.
    EveryDay,
    /// Every `days` days counted from the pattern anchor.
    DaysInterval { days: u32 },
    /// On the listed weekdays, every `every_weeks` weeks.
    Weekdays {
        days: Vec<Weekday>,
        #[serde(default = "default_every_weeks")]
        every_weeks: u32,
    },
    /// On the listed days of the month (1..=31).
    MonthDays { days: Vec<u32> },
}

fn default_every_weeks() -> u32 {
    1
}

impl Cadence {
    /// Whether the cadence can ever be active.
    ///
    /// Ill-formed cadences are kept as data but never schedule a day.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Cadence::EveryDay => true,
            Cadence::DaysInterval { days } => *days >= 1,
            Cadence::Weekdays { days, every_weeks } => !days.is_empty() && *every_weeks >= 1,
            Cadence::MonthDays { days } => days.iter().any(|d| (1..=31).contains(d)),
        }
    }

    /// Decode a stored cadence. Anything unrecognised decodes to `None`.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn to_json(&self) -> String {
        // A plain enum of integers and weekdays always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}

/// A schedule valid from `effective_from` until the next pattern takes over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatPattern {
    pub id: String,
    pub effective_from: NaiveDate,
    /// Continue the previous pattern's phase instead of restarting at
    /// `effective_from`.
    #[serde(default)]
    pub follow_up: bool,
    /// `None` when the stored cadence is missing or unreadable.
    pub cadence: Option<Cadence>,
}

impl RepeatPattern {
    pub fn new(effective_from: NaiveDate, cadence: Cadence) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            effective_from,
            follow_up: false,
            cadence: Some(cadence),
        }
    }

    /// Same as [`RepeatPattern::new`] with `follow_up` set.
    pub fn follow_up(effective_from: NaiveDate, cadence: Cadence) -> Self {
        Self {
            follow_up: true,
            ..Self::new(effective_from, cadence)
        }
    }
}
