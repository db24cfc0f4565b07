//! Repeat-pattern evaluation.
//!
//! Answers "is this habit scheduled on day D". The answer depends only on the
//! habit's start date and its patterns, so it is deterministic for a given
//! habit and day, and it never fails: a day with no applicable pattern, or a
//! pattern whose cadence is missing or ill-formed, is simply not active.
//!
//! Pattern selection: the pattern with the latest `effective_from` not after
//! D wins; equal dates resolve to the pattern stored later. A selected pattern
//! counts its cadence from its anchor, which is its own `effective_from`
//! unless it is a follow-up, in which case it inherits the anchor of the
//! pattern it follows.

use chrono::{Datelike, NaiveDate};

use crate::calendar::{days_in_month, week_monday, DateRange};
use crate::habit::{Cadence, Habit, RepeatPattern};

/// Whether `habit` is scheduled on `date`.
pub fn is_active(habit: &Habit, date: NaiveDate) -> bool {
    if date < habit.start_date {
        return false;
    }

    let Some(index) = effective_pattern_index(&habit.patterns, date) else {
        return false;
    };
    let pattern = &habit.patterns[index];

    match pattern.cadence.as_ref() {
        Some(cadence) if cadence.is_well_formed() => {
            let anchor = pattern_anchor(&habit.patterns, index);
            cadence_matches(cadence, anchor, date)
        }
        _ => {
            tracing::trace!(
                habit_id = %habit.id,
                pattern_id = %pattern.id,
                %date,
                "pattern has no usable cadence, treating day as inactive"
            );
            false
        }
    }
}

/// Every scheduled day of `habit` inside `range`.
pub fn scheduled_days(habit: &Habit, range: DateRange) -> Vec<NaiveDate> {
    range.days().filter(|d| is_active(habit, *d)).collect()
}

/// Earliest day on which `habit` could possibly be active.
///
/// `None` when the habit has no patterns at all.
pub fn schedule_floor(habit: &Habit) -> Option<NaiveDate> {
    habit
        .patterns
        .iter()
        .map(|p| p.effective_from)
        .min()
        .map(|first| first.max(habit.start_date))
}

fn effective_pattern_index(patterns: &[RepeatPattern], date: NaiveDate) -> Option<usize> {
    // max_by_key keeps the last of equal maxima, so later patterns win ties.
    patterns
        .iter()
        .enumerate()
        .filter(|(_, p)| p.effective_from <= date)
        .max_by_key(|(_, p)| p.effective_from)
        .map(|(i, _)| i)
}

/// Resolve where `patterns[index]` starts counting from.
fn pattern_anchor(patterns: &[RepeatPattern], index: usize) -> NaiveDate {
    let mut current = index;
    while patterns[current].follow_up {
        match predecessor(patterns, current) {
            Some(prev) => current = prev,
            None => break,
        }
    }
    patterns[current].effective_from
}

/// The pattern ordered immediately before `patterns[index]` by
/// `(effective_from, position)`.
fn predecessor(patterns: &[RepeatPattern], index: usize) -> Option<usize> {
    let key = (patterns[index].effective_from, index);
    patterns
        .iter()
        .enumerate()
        .map(|(i, p)| (p.effective_from, i))
        .filter(|candidate| *candidate < key)
        .max()
        .map(|(_, i)| i)
}

fn cadence_matches(cadence: &Cadence, anchor: NaiveDate, date: NaiveDate) -> bool {
    if date < anchor {
        return false;
    }
    match cadence {
        Cadence::EveryDay => true,
        Cadence::DaysInterval { days } => {
            let elapsed = (date - anchor).num_days();
            elapsed % i64::from(*days) == 0
        }
        Cadence::Weekdays { days, every_weeks } => {
            if !days.contains(&date.weekday()) {
                return false;
            }
            let weeks = (week_monday(date) - week_monday(anchor)).num_days() / 7;
            weeks % i64::from(*every_weeks) == 0
        }
        Cadence::MonthDays { days } => {
            let last = days_in_month(date);
            days.iter()
                .filter(|d| (1..=31).contains(*d))
                .any(|d| (*d).min(last) == date.day())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::HabitKind;
    use chrono::Weekday;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit_with(patterns: Vec<RepeatPattern>) -> Habit {
        let mut habit = Habit::new("Stretch", HabitKind::Positive, date(2024, 1, 1));
        habit.patterns = patterns;
        habit
    }

    #[test]
    fn every_other_day_skips_odd_offsets() {
        let habit = habit_with(vec![RepeatPattern::new(
            date(2024, 1, 1),
            Cadence::DaysInterval { days: 2 },
        )]);
        assert!(is_active(&habit, date(2024, 1, 1)));
        assert!(!is_active(&habit, date(2024, 1, 2)));
        assert!(is_active(&habit, date(2024, 1, 3)));
        assert!(is_active(&habit, date(2024, 1, 7)));
    }

    #[test]
    fn nothing_is_active_before_start_date() {
        let mut habit = habit_with(vec![RepeatPattern::new(date(2023, 12, 1), Cadence::EveryDay)]);
        habit.start_date = date(2024, 1, 10);
        assert!(!is_active(&habit, date(2024, 1, 9)));
        assert!(is_active(&habit, date(2024, 1, 10)));
    }

    #[test]
    fn no_pattern_means_inactive() {
        let habit = habit_with(vec![]);
        assert!(!is_active(&habit, date(2024, 1, 5)));
        assert_eq!(schedule_floor(&habit), None);
    }

    #[test]
    fn missing_or_broken_cadence_fails_closed() {
        let mut broken = RepeatPattern::new(date(2024, 1, 1), Cadence::EveryDay);
        broken.cadence = None;
        assert!(!is_active(&habit_with(vec![broken]), date(2024, 1, 3)));

        let zero = RepeatPattern::new(date(2024, 1, 1), Cadence::DaysInterval { days: 0 });
        assert!(!is_active(&habit_with(vec![zero]), date(2024, 1, 1)));
    }

    #[test]
    fn latest_pattern_takes_over() {
        let habit = habit_with(vec![
            RepeatPattern::new(date(2024, 1, 1), Cadence::EveryDay),
            RepeatPattern::new(date(2024, 1, 10), Cadence::DaysInterval { days: 3 }),
        ]);
        assert!(is_active(&habit, date(2024, 1, 9)));
        assert!(is_active(&habit, date(2024, 1, 10)));
        assert!(!is_active(&habit, date(2024, 1, 11)));
        assert!(is_active(&habit, date(2024, 1, 13)));
    }

    #[test]
    fn pattern_order_in_storage_does_not_matter() {
        let habit = habit_with(vec![
            RepeatPattern::new(date(2024, 1, 10), Cadence::DaysInterval { days: 3 }),
            RepeatPattern::new(date(2024, 1, 1), Cadence::EveryDay),
        ]);
        assert!(is_active(&habit, date(2024, 1, 9)));
        assert!(!is_active(&habit, date(2024, 1, 11)));
    }

    #[test]
    fn same_day_patterns_resolve_to_later_entry() {
        let habit = habit_with(vec![
            RepeatPattern::new(date(2024, 1, 1), Cadence::EveryDay),
            RepeatPattern::new(date(2024, 1, 1), Cadence::DaysInterval { days: 4 }),
        ]);
        assert!(!is_active(&habit, date(2024, 1, 2)));
        assert!(is_active(&habit, date(2024, 1, 5)));
    }

    #[test]
    fn follow_up_keeps_previous_phase() {
        let reset = habit_with(vec![
            RepeatPattern::new(date(2024, 1, 1), Cadence::DaysInterval { days: 2 }),
            RepeatPattern::new(date(2024, 1, 4), Cadence::DaysInterval { days: 2 }),
        ]);
        let chained = habit_with(vec![
            RepeatPattern::new(date(2024, 1, 1), Cadence::DaysInterval { days: 2 }),
            RepeatPattern::follow_up(date(2024, 1, 4), Cadence::DaysInterval { days: 2 }),
        ]);
        // A fresh pattern restarts on its own first day.
        assert!(is_active(&reset, date(2024, 1, 4)));
        assert!(!is_active(&reset, date(2024, 1, 5)));
        // A follow-up stays on the odd days counted from Jan 1.
        assert!(!is_active(&chained, date(2024, 1, 4)));
        assert!(is_active(&chained, date(2024, 1, 5)));
    }

    #[test]
    fn follow_up_chain_reaches_first_fresh_pattern() {
        let habit = habit_with(vec![
            RepeatPattern::new(date(2024, 1, 1), Cadence::EveryDay),
            RepeatPattern::new(date(2024, 1, 2), Cadence::DaysInterval { days: 5 }),
            RepeatPattern::follow_up(date(2024, 1, 5), Cadence::DaysInterval { days: 5 }),
            RepeatPattern::follow_up(date(2024, 1, 9), Cadence::DaysInterval { days: 5 }),
        ]);
        // Anchor is Jan 2, so Jan 12 and Jan 17 are scheduled.
        assert!(is_active(&habit, date(2024, 1, 12)));
        assert!(!is_active(&habit, date(2024, 1, 9)));
        assert!(is_active(&habit, date(2024, 1, 7)));
    }

    #[test]
    fn weekdays_every_other_week() {
        // 2024-01-01 is a Monday.
        let habit = habit_with(vec![RepeatPattern::new(
            date(2024, 1, 1),
            Cadence::Weekdays {
                days: vec![Weekday::Mon, Weekday::Fri],
                every_weeks: 2,
            },
        )]);
        assert!(is_active(&habit, date(2024, 1, 1)));
        assert!(is_active(&habit, date(2024, 1, 5)));
        assert!(!is_active(&habit, date(2024, 1, 8)));
        assert!(!is_active(&habit, date(2024, 1, 12)));
        assert!(is_active(&habit, date(2024, 1, 15)));
        assert!(!is_active(&habit, date(2024, 1, 16)));
    }

    #[test]
    fn weekday_pattern_starting_midweek_counts_its_own_week() {
        // Starts Wednesday 2024-01-03; Monday of that week is before the anchor.
        let habit = habit_with(vec![RepeatPattern::new(
            date(2024, 1, 3),
            Cadence::Weekdays {
                days: vec![Weekday::Mon, Weekday::Thu],
                every_weeks: 2,
            },
        )]);
        assert!(!is_active(&habit, date(2024, 1, 1)));
        assert!(is_active(&habit, date(2024, 1, 4)));
        assert!(!is_active(&habit, date(2024, 1, 8)));
        assert!(is_active(&habit, date(2024, 1, 15)));
    }

    #[test]
    fn month_days_clamp_to_short_months() {
        let habit = habit_with(vec![RepeatPattern::new(
            date(2024, 1, 1),
            Cadence::MonthDays { days: vec![31] },
        )]);
        assert!(is_active(&habit, date(2024, 1, 31)));
        assert!(is_active(&habit, date(2024, 2, 29)));
        assert!(!is_active(&habit, date(2024, 2, 28)));
        assert!(is_active(&habit, date(2024, 4, 30)));
    }

    #[test]
    fn scheduled_days_lists_active_days() {
        let habit = habit_with(vec![RepeatPattern::new(
            date(2024, 1, 1),
            Cadence::DaysInterval { days: 3 },
        )]);
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 10)).unwrap();
        assert_eq!(
            scheduled_days(&habit, range),
            vec![date(2024, 1, 1), date(2024, 1, 4), date(2024, 1, 7), date(2024, 1, 10)]
        );
    }

    proptest! {
        #[test]
        fn interval_matches_modulo_rule(n in 1u32..30, offset in -60i64..400) {
            let from = date(2024, 3, 1);
            let habit = habit_with(vec![RepeatPattern::new(from, Cadence::DaysInterval { days: n })]);
            let target = from + chrono::Duration::days(offset);
            let expected = offset >= 0 && offset % i64::from(n) == 0;
            prop_assert_eq!(is_active(&habit, target), expected);
            // Idempotent.
            prop_assert_eq!(is_active(&habit, target), is_active(&habit, target));
        }

        #[test]
        fn never_active_before_start(before in 1i64..500, n in 1u32..10) {
            let mut habit = habit_with(vec![RepeatPattern::new(date(2020, 1, 1), Cadence::DaysInterval { days: n })]);
            habit.start_date = date(2024, 6, 1);
            let target = habit.start_date - chrono::Duration::days(before);
            prop_assert!(!is_active(&habit, target));
        }
    }
}
