//! Habit domain types.
//!
//! A [`Habit`] owns its repeat patterns and completion records. Lists and
//! categories are organisational metadata referenced by id.

mod pattern;

pub use pattern::{Cadence, RepeatPattern};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Whether a habit is built up or avoided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitKind {
    /// "Completed" means the habit was done.
    #[default]
    Positive,
    /// "Completed" means the habit was successfully avoided.
    Avoidance,
}

/// What a stored completion flag means for a given habit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Done,
    Missed,
    Avoided,
    Relapsed,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Done | Outcome::Avoided)
    }
}

impl HabitKind {
    /// Interpret the stored completion flag.
    pub fn interpret(self, completed: bool) -> Outcome {
        match (self, completed) {
            (HabitKind::Positive, true) => Outcome::Done,
            (HabitKind::Positive, false) => Outcome::Missed,
            (HabitKind::Avoidance, true) => Outcome::Avoided,
            (HabitKind::Avoidance, false) => Outcome::Relapsed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HabitKind::Positive => "Good habits",
            HabitKind::Avoidance => "Bad habits",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "positive" | "good" => Some(HabitKind::Positive),
            "avoidance" | "bad" => Some(HabitKind::Avoidance),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HabitKind::Positive => "positive",
            HabitKind::Avoidance => "avoidance",
        }
    }
}

/// Ordinal effort level, 1 (light) to 4 (extreme).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Intensity {
    Light = 1,
    #[default]
    Moderate = 2,
    High = 3,
    Extreme = 4,
}

impl Intensity {
    pub const ALL: [Intensity; 4] = [
        Intensity::Light,
        Intensity::Moderate,
        Intensity::High,
        Intensity::Extreme,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Intensity::Light => "Light",
            Intensity::Moderate => "Moderate",
            Intensity::High => "High",
            Intensity::Extreme => "Extreme",
        }
    }
}

impl TryFrom<u8> for Intensity {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Intensity::Light),
            2 => Ok(Intensity::Moderate),
            3 => Ok(Intensity::High),
            4 => Ok(Intensity::Extreme),
            other => Err(ValidationError::IntensityOutOfRange(other)),
        }
    }
}

impl From<Intensity> for u8 {
    fn from(value: Intensity) -> Self {
        value.level()
    }
}

/// A stored user action for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub id: String,
    pub habit_id: String,
    /// Local wall-clock time the record was made for.
    pub recorded_at: NaiveDateTime,
    pub completed: bool,
}

impl Completion {
    pub fn new(habit_id: &str, recorded_at: NaiveDateTime, completed: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            habit_id: habit_id.to_string(),
            recorded_at,
            completed,
        }
    }

    /// Record for a whole day, stamped at midnight.
    pub fn on_day(habit_id: &str, day: NaiveDate, completed: bool) -> Self {
        Self::new(habit_id, day.and_time(chrono::NaiveTime::MIN), completed)
    }

    pub fn day(&self) -> NaiveDate {
        self.recorded_at.date()
    }
}

/// A tracked habit and the records it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: HabitKind,
    #[serde(default)]
    pub intensity: Intensity,
    pub start_date: NaiveDate,
    pub list_id: Option<String>,
    pub category_id: Option<String>,
    /// Ordered by insertion; the evaluator picks by `effective_from`.
    #[serde(default)]
    pub patterns: Vec<RepeatPattern>,
    #[serde(default)]
    pub completions: Vec<Completion>,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// A new, unlisted habit with no patterns.
    pub fn new(name: &str, kind: HabitKind, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            kind,
            intensity: Intensity::default(),
            start_date,
            list_id: None,
            category_id: None,
            patterns: Vec::new(),
            completions: Vec::new(),
            is_archived: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_pattern(mut self, pattern: RepeatPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Append a completion record for `day`.
    pub fn record(&mut self, day: NaiveDate, completed: bool) {
        let completion = Completion::on_day(&self.id, day, completed);
        self.completions.push(completion);
    }

    /// Soft delete: hide the habit and detach it from its list.
    pub fn archive(&mut self) {
        self.is_archived = true;
        self.list_id = None;
    }
}

/// A user-defined list grouping habits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitList {
    pub id: String,
    pub name: String,
    pub icon: String,
    /// Opaque color, passed through to presentation.
    pub color: String,
    pub order: i32,
}

impl HabitList {
    pub fn new(name: &str, icon: &str, color: &str, order: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            order,
        }
    }
}

/// Organisational category; a fixed preset set is seeded on first run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitCategory {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub order: i32,
    pub is_default: bool,
}

impl HabitCategory {
    /// A user-created (non-preset) category.
    pub fn new(name: &str, icon: &str, color: &str, order: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            order,
            is_default: false,
        }
    }
}
