//! Per-habit summaries, streak series and collection overviews.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{RateCounter, Series};
use crate::calendar::DateRange;
use crate::habit::{Habit, HabitKind, Intensity, Outcome};
use crate::ledger::Ledger;

/// Streak and rate figures for one habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitSummary {
    pub habit_id: String,
    pub name: String,
    pub kind: HabitKind,
    pub current_streak: u32,
    pub best_streak: u32,
    pub active_days: u64,
    pub completed_days: u64,
    pub rate: f64,
    /// Interpreted record for `as_of`, if one exists.
    pub today: Option<Outcome>,
}

/// Summarise `habit` over `range`, with the current streak taken at `as_of`.
pub fn habit_summary(habit: &Habit, range: DateRange, as_of: NaiveDate) -> HabitSummary {
    let ledger = Ledger::new(habit);
    let mut counter = RateCounter::default();
    for day in range.days() {
        counter.record(ledger.status(day));
    }

    HabitSummary {
        habit_id: habit.id.clone(),
        name: habit.name.clone(),
        kind: habit.kind,
        current_streak: ledger.streak(as_of),
        best_streak: ledger.best_streak(range),
        active_days: counter.active_days,
        completed_days: counter.completed_days,
        rate: counter.rate(),
        today: ledger.outcome(as_of),
    }
}

/// Streak value as of each day in `range`, labelled `YYYY-MM-DD`.
pub fn streak_series(habit: &Habit, range: DateRange) -> Series {
    Series::from_points(
        Ledger::new(habit)
            .streaks_over(range)
            .into_iter()
            .map(|(day, streak)| (day.format("%Y-%m-%d").to_string(), f64::from(streak))),
    )
}

/// Number of non-archived habits at each intensity level; always four points.
pub fn intensity_distribution(habits: &[Habit]) -> Series {
    let mut counts = [0u32; 4];
    for habit in habits.iter().filter(|h| !h.is_archived) {
        counts[usize::from(habit.intensity.level() - 1)] += 1;
    }
    Series::from_points(
        Intensity::ALL
            .iter()
            .zip(counts)
            .map(|(intensity, count)| (intensity.label(), f64::from(count))),
    )
}

/// Headline numbers for a habit collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_habits: usize,
    pub scheduled_today: usize,
    pub completed_today: usize,
    pub completion_rate: f64,
    pub avoidance_rate: f64,
    pub longest_current_streak: u32,
}

/// Overview of non-archived `habits` over `range`, with "today" = `today`.
pub fn overview(habits: &[Habit], range: DateRange, today: NaiveDate) -> Overview {
    let live: Vec<&Habit> = habits.iter().filter(|h| !h.is_archived).collect();

    let mut counter = RateCounter::default();
    let mut avoided = RateCounter::default();
    let mut scheduled_today = 0;
    let mut completed_today = 0;
    let mut longest_current_streak = 0;
    for habit in &live {
        let ledger = Ledger::new(habit);
        for day in range.days() {
            let status = ledger.status(day);
            counter.record(status);
            if habit.kind == HabitKind::Avoidance {
                avoided.record(status);
            }
        }
        let status = ledger.status(today);
        if status.active {
            scheduled_today += 1;
            if status.completed {
                completed_today += 1;
            }
        }
        longest_current_streak = longest_current_streak.max(ledger.streak(today));
    }

    Overview {
        total_habits: live.len(),
        scheduled_today,
        completed_today,
        completion_rate: counter.rate(),
        avoidance_rate: avoided.rate(),
        longest_current_streak,
    }
}
