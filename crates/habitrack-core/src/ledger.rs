//! Completion ledger and streaks.
//!
//! The ledger reports the stored completion flag for a calendar day. It does
//! not interpret it: for an avoidance habit a `true` record means the habit
//! was avoided, and callers use [`HabitKind::interpret`] for that.
//!
//! When several records fall on the same day, the one with the latest
//! `recorded_at` wins; equal timestamps resolve to the record stored later.
//!
//! [`HabitKind::interpret`]: crate::habit::HabitKind::interpret

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::calendar::DateRange;
use crate::evaluator::{is_active, schedule_floor};
use crate::habit::{Completion, Habit, Outcome};

/// What happened on one day for one habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DayStatus {
    pub active: bool,
    pub completed: bool,
}

impl DayStatus {
    /// Active and completed.
    pub fn counts(self) -> bool {
        self.active && self.completed
    }
}

/// Per-day index over a habit's completion records.
///
/// Build once per habit when evaluating many days.
pub struct Ledger<'a> {
    habit: &'a Habit,
    by_day: HashMap<NaiveDate, &'a Completion>,
}

impl<'a> Ledger<'a> {
    pub fn new(habit: &'a Habit) -> Self {
        let mut by_day: HashMap<NaiveDate, &'a Completion> = HashMap::new();
        for completion in &habit.completions {
            by_day
                .entry(completion.day())
                .and_modify(|current| {
                    if completion.recorded_at >= current.recorded_at {
                        *current = completion;
                    }
                })
                .or_insert(completion);
        }
        Self { habit, by_day }
    }

    pub fn habit(&self) -> &'a Habit {
        self.habit
    }

    /// The record that applies to `date`, if any.
    pub fn record_on(&self, date: NaiveDate) -> Option<&'a Completion> {
        self.by_day.get(&date).copied()
    }

    pub fn is_completed(&self, date: NaiveDate) -> bool {
        self.record_on(date).map(|c| c.completed).unwrap_or(false)
    }

    pub fn status(&self, date: NaiveDate) -> DayStatus {
        DayStatus {
            active: is_active(self.habit, date),
            completed: self.is_completed(date),
        }
    }

    /// Interpreted outcome for `date`, `None` when nothing was recorded.
    pub fn outcome(&self, date: NaiveDate) -> Option<Outcome> {
        self.record_on(date)
            .map(|c| self.habit.kind.interpret(c.completed))
    }

    /// Streak ending at `as_of`, walking backwards.
    ///
    /// Inactive days are skipped. The first active day without a completion
    /// ends the walk, except `as_of` itself, which is still open and is
    /// skipped instead. The walk stops at the habit's schedule floor.
    pub fn streak(&self, as_of: NaiveDate) -> u32 {
        let Some(floor) = schedule_floor(self.habit) else {
            return 0;
        };

        let mut streak = 0;
        let mut day = as_of;
        while day >= floor {
            let status = self.status(day);
            if status.active {
                if status.completed {
                    streak += 1;
                } else if day != as_of {
                    break;
                }
            }
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        streak
    }

    /// Longest run of completed active days inside `range`.
    pub fn best_streak(&self, range: DateRange) -> u32 {
        let mut best = 0;
        let mut run = 0;
        for day in range.days() {
            let status = self.status(day);
            if !status.active {
                continue;
            }
            if status.completed {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
        }
        best
    }

    /// Streak as of every day in `range`, in one forward pass.
    ///
    /// Agrees with [`Ledger::streak`] evaluated day by day.
    pub fn streaks_over(&self, range: DateRange) -> Vec<(NaiveDate, u32)> {
        let Some(floor) = schedule_floor(self.habit) else {
            return range.days().map(|d| (d, 0)).collect();
        };

        // `closed` is the streak through the end of the previous day, with
        // every active day treated as final.
        let mut closed = 0u32;
        let mut out = Vec::with_capacity(range.len() as usize);
        let warmup_start = floor.min(range.start);
        let full = DateRange {
            start: warmup_start,
            end: range.end,
        };
        for day in full.days() {
            let status = if day < floor {
                DayStatus::default()
            } else {
                self.status(day)
            };
            let as_of_today = match (status.active, status.completed) {
                (true, true) => closed + 1,
                (true, false) => closed,
                (false, _) => closed,
            };
            closed = match (status.active, status.completed) {
                (true, true) => closed + 1,
                (true, false) => 0,
                (false, _) => closed,
            };
            if range.contains(day) {
                out.push((day, as_of_today));
            }
        }
        out
    }
}

/// Whether `habit` has a completed record on the calendar day of `date`.
pub fn is_completed(habit: &Habit, date: NaiveDate) -> bool {
    latest_record(habit, date)
        .map(|c| c.completed)
        .unwrap_or(false)
}

/// Same as [`is_completed`] for a timestamp; only its calendar day matters.
pub fn is_completed_at(habit: &Habit, timestamp: NaiveDateTime) -> bool {
    is_completed(habit, timestamp.date())
}

/// Consecutive completed active days ending at `as_of`.
pub fn calculate_streak(habit: &Habit, as_of: NaiveDate) -> u32 {
    Ledger::new(habit).streak(as_of)
}

/// Longest streak inside `range`.
pub fn best_streak(habit: &Habit, range: DateRange) -> u32 {
    Ledger::new(habit).best_streak(range)
}

fn latest_record(habit: &Habit, date: NaiveDate) -> Option<&Completion> {
    // max_by_key keeps the last of equal maxima.
    habit
        .completions
        .iter()
        .filter(|c| c.day() == date)
        .max_by_key(|c| c.recorded_at)
}
