//! Grouped completion rates.

use std::collections::BTreeMap;

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

use super::{RateCounter, Series};
use crate::calendar::{weekday_label, DateRange, WeekStart};
use crate::habit::{Habit, HabitCategory, HabitKind, HabitList, Intensity};
use crate::ledger::Ledger;

const UNLISTED: &str = "Unlisted";
const UNCATEGORISED: &str = "Uncategorised";

/// Dimension to group completion rates by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// Day of week, ordered from the given first day.
    Weekday(WeekStart),
    List,
    Category,
    Intensity,
    Kind,
}

/// Completion rate of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRate {
    /// Stable identifier: list/category id, weekday, intensity level or kind.
    /// Empty for the unlisted / uncategorised bucket.
    pub key: String,
    /// Display label. For list and category groups this is the id until
    /// resolved with [`label_groups`].
    pub label: String,
    pub active_days: u64,
    pub completed_days: u64,
    pub rate: f64,
}

/// Sort position of a group: rank first, then identifier.
type Slot = (u32, String);

struct Groups {
    slots: BTreeMap<Slot, (String, RateCounter)>,
}

impl Groups {
    fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    fn ensure(&mut self, slot: Slot, label: &str) -> &mut RateCounter {
        &mut self
            .slots
            .entry(slot)
            .or_insert_with(|| (label.to_string(), RateCounter::default()))
            .1
    }

    fn into_rates(self) -> Vec<GroupRate> {
        self.slots
            .into_iter()
            .map(|((_, key), (label, counter))| GroupRate {
                key,
                label,
                active_days: counter.active_days,
                completed_days: counter.completed_days,
                rate: counter.rate(),
            })
            .collect()
    }
}

fn weekday_slot(week_start: WeekStart, weekday: Weekday) -> Slot {
    (
        week_start.index_of(weekday) as u32,
        weekday_label(weekday).to_ascii_lowercase(),
    )
}

fn optional_slot(id: Option<&str>) -> Slot {
    match id {
        Some(id) => (0, id.to_string()),
        None => (1, String::new()),
    }
}

/// Slot and label of `habit` for habit-level keys.
fn habit_slot(key: GroupKey, habit: &Habit) -> Option<(Slot, String)> {
    match key {
        GroupKey::Weekday(_) => None,
        GroupKey::List => {
            let label = habit.list_id.clone().unwrap_or_else(|| UNLISTED.to_string());
            Some((optional_slot(habit.list_id.as_deref()), label))
        }
        GroupKey::Category => {
            let label = habit
                .category_id
                .clone()
                .unwrap_or_else(|| UNCATEGORISED.to_string());
            Some((optional_slot(habit.category_id.as_deref()), label))
        }
        GroupKey::Intensity => Some((
            (u32::from(habit.intensity.level()), habit.intensity.level().to_string()),
            habit.intensity.label().to_string(),
        )),
        GroupKey::Kind => Some((
            (kind_rank(habit.kind), habit.kind.as_str().to_string()),
            habit.kind.label().to_string(),
        )),
    }
}

fn kind_rank(kind: HabitKind) -> u32 {
    match kind {
        HabitKind::Positive => 0,
        HabitKind::Avoidance => 1,
    }
}

/// Completion rate per group over `range`.
///
/// Weekday, intensity and kind groupings always emit every group (zeros
/// included) in their natural order. List and category groupings emit the
/// groups that occur, ordered by id, with the unassigned bucket last.
pub fn completion_rates(habits: &[Habit], range: DateRange, key: GroupKey) -> Vec<GroupRate> {
    let mut groups = Groups::new();

    match key {
        GroupKey::Weekday(week_start) => {
            for weekday in week_start.ordered_weekdays() {
                groups.ensure(weekday_slot(week_start, weekday), weekday_label(weekday));
            }
        }
        GroupKey::Intensity => {
            for intensity in Intensity::ALL {
                groups.ensure(
                    (u32::from(intensity.level()), intensity.level().to_string()),
                    intensity.label(),
                );
            }
        }
        GroupKey::Kind => {
            for kind in [HabitKind::Positive, HabitKind::Avoidance] {
                groups.ensure((kind_rank(kind), kind.as_str().to_string()), kind.label());
            }
        }
        GroupKey::List | GroupKey::Category => {}
    }

    for habit in habits {
        let ledger = Ledger::new(habit);
        let fixed = habit_slot(key, habit);
        if let Some((slot, label)) = &fixed {
            // Habits with no active day still show up as a zero group.
            groups.ensure(slot.clone(), label);
        }

        for day in range.days() {
            let status = ledger.status(day);
            if !status.active {
                continue;
            }
            let counter = match (&fixed, key) {
                (Some((slot, label)), _) => groups.ensure(slot.clone(), label),
                (None, GroupKey::Weekday(week_start)) => {
                    let weekday = day.weekday();
                    groups.ensure(weekday_slot(week_start, weekday), weekday_label(weekday))
                }
                (None, _) => continue,
            };
            counter.record(status);
        }
    }

    groups.into_rates()
}

/// Seven-point series of completion rate by day of week.
pub fn weekly_pattern(habits: &[Habit], range: DateRange, week_start: WeekStart) -> Series {
    Series::from_points(
        completion_rates(habits, range, GroupKey::Weekday(week_start))
            .into_iter()
            .map(|g| (g.label, g.rate)),
    )
}

/// Completion rate per list, in list order, plus an "Unlisted" point when
/// any unlisted habit exists.
pub fn list_performance(habits: &[Habit], lists: &[HabitList], range: DateRange) -> Series {
    let mut ordered: Vec<&HabitList> = lists.iter().collect();
    ordered.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
    let named = ordered
        .into_iter()
        .map(|l| (l.id.as_str(), l.name.as_str()))
        .collect::<Vec<_>>();
    named_performance(habits, range, GroupKey::List, &named, UNLISTED)
}

/// Completion rate per category, in category order, plus an
/// "Uncategorised" point when needed.
pub fn category_performance(
    habits: &[Habit],
    categories: &[HabitCategory],
    range: DateRange,
) -> Series {
    let mut ordered: Vec<&HabitCategory> = categories.iter().collect();
    ordered.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
    let named = ordered
        .into_iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect::<Vec<_>>();
    named_performance(habits, range, GroupKey::Category, &named, UNCATEGORISED)
}

fn named_performance(
    habits: &[Habit],
    range: DateRange,
    key: GroupKey,
    named: &[(&str, &str)],
    unassigned_label: &str,
) -> Series {
    let rates = completion_rates(habits, range, key);
    let rate_of = |id: &str| {
        rates
            .iter()
            .find(|g| g.key == id)
            .map(|g| g.rate)
            .unwrap_or(0.0)
    };

    let mut points: Vec<(String, f64)> = named
        .iter()
        .map(|(id, name)| (name.to_string(), rate_of(id)))
        .collect();

    // Habits pointing at an id that no longer exists count as unassigned.
    let mut unassigned: Option<RateCounter> = None;
    for group in rates
        .iter()
        .filter(|g| g.key.is_empty() || !named.iter().any(|(id, _)| *id == g.key))
    {
        unassigned.get_or_insert_with(RateCounter::default).merge(RateCounter {
            active_days: group.active_days,
            completed_days: group.completed_days,
        });
    }
    if let Some(counter) = unassigned {
        points.push((unassigned_label.to_string(), counter.rate()));
    }
    Series::from_points(points)
}

/// Replace id labels of list or category groups with display names.
///
/// [`completion_rates`] labels those groups by id since it only sees habits.
/// Groups whose id is not in `names` keep it as their label.
pub fn label_groups(rates: Vec<GroupRate>, names: &[(&str, &str)]) -> Vec<GroupRate> {
    rates
        .into_iter()
        .map(|mut group| {
            if let Some((_, name)) = names.iter().find(|(id, _)| *id == group.key) {
                group.label = name.to_string();
            }
            group
        })
        .collect()
}

/// Share of active days on which avoidance habits were avoided.
pub fn avoidance_rate(habits: &[Habit], range: DateRange) -> f64 {
    let mut counter = RateCounter::default();
    for habit in habits.iter().filter(|h| h.kind == HabitKind::Avoidance) {
        let ledger = Ledger::new(habit);
        for day in range.days() {
            counter.record(ledger.status(day));
        }
    }
    counter.rate()
}
