//! Analytics over habit collections.
//!
//! Everything here composes the evaluator and the ledger over a set of habits
//! and an inclusive date range, and produces chart-ready series: ordered
//! `(label, value)` points whose values are always finite.
//!
//! Rates are `completed active days / active days` with integer counting, so
//! results do not depend on the order habits or days are visited in. A group
//! with no active days has rate 0.

mod rates;
mod summary;

pub use rates::{
    avoidance_rate, category_performance, completion_rates, label_groups, list_performance,
    weekly_pattern, GroupKey, GroupRate,
};
pub use summary::{
    habit_summary, intensity_distribution, overview, streak_series, HabitSummary, Overview,
};

use serde::{Deserialize, Serialize};

use crate::ledger::DayStatus;

/// Placeholder weekly values shown when every real value is zero.
pub const WEEKLY_PLACEHOLDER: [f64; 7] = [0.72, 0.65, 0.80, 0.58, 0.69, 0.45, 0.52];

/// One labelled value of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Ordered chart data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Series {
    pub points: Vec<SeriesPoint>,
}

impl Series {
    /// Build a series; non-finite values are replaced by 0.
    pub fn from_points<I, L>(points: I) -> Self
    where
        I: IntoIterator<Item = (L, f64)>,
        L: Into<String>,
    {
        Self {
            points: points
                .into_iter()
                .map(|(label, value)| SeriesPoint {
                    label: label.into(),
                    value: if value.is_finite() { value } else { 0.0 },
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// True when every value is zero (or there are no points).
    pub fn is_flat_zero(&self) -> bool {
        self.points.iter().all(|p| p.value == 0.0)
    }

    /// Presentation helper: swap in `placeholder` values when there is no
    /// real signal.
    ///
    /// Leaves the series untouched when any value is non-zero or when the
    /// placeholder does not have one value per point.
    pub fn with_placeholder(&self, placeholder: &[f64]) -> Series {
        if !self.is_flat_zero() || placeholder.len() != self.points.len() {
            return self.clone();
        }
        Series::from_points(
            self.points
                .iter()
                .zip(placeholder)
                .map(|(p, v)| (p.label.clone(), *v)),
        )
    }
}

/// Integer accumulator for a completion rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateCounter {
    pub active_days: u64,
    pub completed_days: u64,
}

impl RateCounter {
    pub fn record(&mut self, status: DayStatus) {
        if status.active {
            self.active_days += 1;
            if status.completed {
                self.completed_days += 1;
            }
        }
    }

    pub fn merge(&mut self, other: RateCounter) {
        self.active_days += other.active_days;
        self.completed_days += other.completed_days;
    }

    /// Completed share of active days, 0 when nothing was active.
    pub fn rate(&self) -> f64 {
        if self.active_days == 0 {
            return 0.0;
        }
        self.completed_days as f64 / self.active_days as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_rate_is_zero_without_active_days() {
        let mut counter = RateCounter::default();
        counter.record(DayStatus {
            active: false,
            completed: true,
        });
        assert_eq!(counter.rate(), 0.0);
        assert_eq!(counter.completed_days, 0);
    }

    #[test]
    fn counter_merges() {
        let mut a = RateCounter {
            active_days: 3,
            completed_days: 1,
        };
        a.merge(RateCounter {
            active_days: 1,
            completed_days: 1,
        });
        assert_eq!(a.rate(), 0.5);
    }

    #[test]
    fn non_finite_values_are_zeroed() {
        let series = Series::from_points(vec![("a", f64::NAN), ("b", f64::INFINITY), ("c", 0.5)]);
        assert_eq!(series.values(), vec![0.0, 0.0, 0.5]);
    }

    #[test]
    fn placeholder_only_replaces_flat_zero() {
        let zero = Series::from_points(vec![("a", 0.0), ("b", 0.0)]);
        assert_eq!(zero.with_placeholder(&[0.3, 0.4]).values(), vec![0.3, 0.4]);

        let real = Series::from_points(vec![("a", 0.0), ("b", 0.2)]);
        assert_eq!(real.with_placeholder(&[0.3, 0.4]), real);

        // Mismatched length leaves the data alone.
        assert_eq!(zero.with_placeholder(&[0.3]), zero);
    }
}
