//! Day-status cache and background warm-up.
//!
//! [`DayStatusCache`] memoises `(habit id, day) -> DayStatus` with at most one
//! computation in flight per key: concurrent callers for the same key wait on
//! the same cell instead of recomputing.
//!
//! [`CacheWarmer`] fills the cache for a whole range (typically the displayed
//! month) on a blocking worker. Each request takes a new generation number;
//! a warm-up stages its results privately and publishes them in one step only
//! if no newer request has been made, so readers never see a half-filled
//! range from a superseded request.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::NaiveDate;
use tokio::task::JoinHandle;

use crate::calendar::DateRange;
use crate::habit::Habit;
use crate::ledger::{DayStatus, Ledger};

type Key = (String, NaiveDate);
type Cell = Arc<OnceLock<DayStatus>>;

/// Memoised day statuses keyed by habit id and day.
#[derive(Default)]
pub struct DayStatusCache {
    entries: Mutex<HashMap<Key, Cell>>,
    computed: AtomicU64,
}

impl DayStatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, Cell>> {
        // Cells are only ever replaced whole, so a poisoned map is still usable.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached status, computing it if absent.
    pub fn get_or_compute(&self, habit: &Habit, date: NaiveDate) -> DayStatus {
        let cell = {
            let mut entries = self.lock();
            entries
                .entry((habit.id.clone(), date))
                .or_insert_with(|| Arc::new(OnceLock::new()))
                .clone()
        };
        *cell.get_or_init(|| {
            self.computed.fetch_add(1, Ordering::Relaxed);
            Ledger::new(habit).status(date)
        })
    }

    /// Cached status without computing.
    pub fn get(&self, habit_id: &str, date: NaiveDate) -> Option<DayStatus> {
        self.lock()
            .get(&(habit_id.to_string(), date))
            .and_then(|cell| cell.get().copied())
    }

    /// Drop every entry for `habit_id`, e.g. after its completions changed.
    pub fn invalidate_habit(&self, habit_id: &str) {
        self.lock().retain(|(id, _), _| id != habit_id);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many statuses were computed on demand.
    pub fn computations(&self) -> u64 {
        self.computed.load(Ordering::Relaxed)
    }

    /// Insert a whole batch under one lock if `still_current` holds.
    ///
    /// Keys that already have a cell keep it; a batch never replaces a
    /// status computed after the batch's snapshot was taken.
    fn publish_if<F>(&self, still_current: F, batch: HashMap<Key, DayStatus>) -> bool
    where
        F: FnOnce() -> bool,
    {
        let mut entries = self.lock();
        if !still_current() {
            return false;
        }
        for (key, status) in batch {
            entries.entry(key).or_insert_with(|| {
                let cell = OnceLock::new();
                let _ = cell.set(status);
                Arc::new(cell)
            });
        }
        true
    }
}

/// Result of one warm-up request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupOutcome {
    /// All entries for the range were published.
    Published { entries: usize },
    /// A newer request superseded this one; nothing was published.
    Discarded,
}

/// A running warm-up.
pub struct WarmupHandle {
    generation: u64,
    task: JoinHandle<WarmupOutcome>,
}

impl WarmupHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the warm-up to finish.
    pub async fn wait(self) -> WarmupOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(generation = self.generation, error = %err, "cache warm-up task failed");
                WarmupOutcome::Discarded
            }
        }
    }
}

/// Fills a [`DayStatusCache`] in the background.
#[derive(Clone)]
pub struct CacheWarmer {
    cache: Arc<DayStatusCache>,
    generation: Arc<AtomicU64>,
}

impl CacheWarmer {
    pub fn new(cache: Arc<DayStatusCache>) -> Self {
        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn cache(&self) -> &Arc<DayStatusCache> {
        &self.cache
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidate any running warm-up without starting a new one.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop cached statuses for `habit_id` after its records changed.
    ///
    /// Running warm-ups were computed from the old records, so they are
    /// cancelled first.
    pub fn invalidate_habit(&self, habit_id: &str) {
        self.cancel();
        self.cache.invalidate_habit(habit_id);
        tracing::debug!(habit_id, generation = self.current_generation(), "habit invalidated");
    }

    /// Warm every day of the month containing `day`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn warm_month(&self, habits: Arc<Vec<Habit>>, day: NaiveDate) -> WarmupHandle {
        self.warm(habits, DateRange::month_of(day))
    }

    /// Warm every day of `range`, superseding earlier requests.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn warm(&self, habits: Arc<Vec<Habit>>, range: DateRange) -> WarmupHandle {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cache = Arc::clone(&self.cache);
        let counter = Arc::clone(&self.generation);
        tracing::debug!(generation, start = %range.start, end = %range.end, "starting cache warm-up");

        let task = tokio::task::spawn_blocking(move || {
            warm_range(&cache, &counter, generation, &habits, range)
        });
        WarmupHandle { generation, task }
    }
}

/// Compute statuses for `range` and publish them if `generation` is still
/// the latest request.
fn warm_range(
    cache: &DayStatusCache,
    counter: &AtomicU64,
    generation: u64,
    habits: &[Habit],
    range: DateRange,
) -> WarmupOutcome {
    let is_current = || counter.load(Ordering::SeqCst) == generation;
    let ledgers: Vec<Ledger<'_>> = habits.iter().map(Ledger::new).collect();
    let mut staged = HashMap::with_capacity(habits.len() * range.len() as usize);

    for day in range.days() {
        if !is_current() {
            tracing::info!(generation, "cache warm-up superseded, discarding");
            return WarmupOutcome::Discarded;
        }
        for ledger in &ledgers {
            staged.insert((ledger.habit().id.clone(), day), ledger.status(day));
        }
    }

    let entries = staged.len();
    if cache.publish_if(is_current, staged) {
        tracing::info!(generation, entries, "cache warm-up published");
        WarmupOutcome::Published { entries }
    } else {
        tracing::info!(generation, "cache warm-up superseded before publish, discarding");
        WarmupOutcome::Discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::{Cadence, HabitKind, RepeatPattern};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn every_other_day() -> Habit {
        let mut habit = Habit::new("Swim", HabitKind::Positive, date(2024, 1, 1)).with_pattern(
            RepeatPattern::new(date(2024, 1, 1), Cadence::DaysInterval { days: 2 }),
        );
        habit.record(date(2024, 1, 3), true);
        habit
    }

    #[test]
    fn computes_each_key_once() {
        let cache = DayStatusCache::new();
        let habit = every_other_day();
        let first = cache.get_or_compute(&habit, date(2024, 1, 3));
        let second = cache.get_or_compute(&habit, date(2024, 1, 3));
        assert_eq!(first, second);
        assert!(first.active && first.completed);
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn concurrent_callers_share_one_computation() {
        let cache = Arc::new(DayStatusCache::new());
        let habit = Arc::new(every_other_day());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let habit = Arc::clone(&habit);
                std::thread::spawn(move || cache.get_or_compute(&habit, date(2024, 1, 5)))
            })
            .collect();
        for t in threads {
            assert!(t.join().unwrap().active);
        }
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn invalidate_drops_only_that_habit() {
        let cache = DayStatusCache::new();
        let a = every_other_day();
        let b = every_other_day();
        cache.get_or_compute(&a, date(2024, 1, 1));
        cache.get_or_compute(&b, date(2024, 1, 1));
        cache.invalidate_habit(&a.id);
        assert!(cache.get(&a.id, date(2024, 1, 1)).is_none());
        assert!(cache.get(&b.id, date(2024, 1, 1)).is_some());
    }

    #[test]
    fn stale_generation_publishes_nothing() {
        let cache = DayStatusCache::new();
        let counter = AtomicU64::new(2);
        let habits = vec![every_other_day()];
        let outcome = warm_range(&cache, &counter, 1, &habits, DateRange::month_of(date(2024, 1, 1)));
        assert_eq!(outcome, WarmupOutcome::Discarded);
        assert!(cache.is_empty());
    }

    #[test]
    fn publish_keeps_entries_computed_after_snapshot() {
        let cache = DayStatusCache::new();
        let old = every_other_day();
        let mut fresh = old.clone();
        fresh.record(date(2024, 1, 5), true);

        assert!(cache.get_or_compute(&fresh, date(2024, 1, 5)).completed);
        let counter = AtomicU64::new(1);
        let outcome = warm_range(&cache, &counter, 1, &[old], DateRange::month_of(date(2024, 1, 1)));

        assert_eq!(outcome, WarmupOutcome::Published { entries: 31 });
        assert!(cache.get(&fresh.id, date(2024, 1, 5)).unwrap().completed);
    }

    #[test]
    fn invalidating_a_habit_discards_running_warmup() {
        let warmer = CacheWarmer::new(Arc::new(DayStatusCache::new()));
        let old = every_other_day();
        // Generation a warm-up started before the change would hold.
        let generation = warmer.generation.fetch_add(1, Ordering::SeqCst) + 1;

        warmer.invalidate_habit(&old.id);
        assert!(warmer.current_generation() > generation);

        let outcome = warm_range(
            warmer.cache(),
            &warmer.generation,
            generation,
            &[old],
            DateRange::month_of(date(2024, 1, 1)),
        );
        assert_eq!(outcome, WarmupOutcome::Discarded);
        assert!(warmer.cache().is_empty());
    }

    #[tokio::test]
    async fn warm_month_fills_every_day() {
        let warmer = CacheWarmer::new(Arc::new(DayStatusCache::new()));
        let habits = Arc::new(vec![every_other_day()]);
        let id = habits[0].id.clone();

        let outcome = warmer.warm_month(Arc::clone(&habits), date(2024, 2, 10)).wait().await;
        assert_eq!(outcome, WarmupOutcome::Published { entries: 29 });
        let status = warmer.cache().get(&id, date(2024, 2, 29)).unwrap();
        assert_eq!(status.active, (date(2024, 2, 29) - date(2024, 1, 1)).num_days() % 2 == 0);
        assert_eq!(warmer.cache().computations(), 0);
    }

    #[tokio::test]
    async fn newer_request_wins() {
        let warmer = CacheWarmer::new(Arc::new(DayStatusCache::new()));
        let habits = Arc::new(vec![every_other_day()]);
        let id = habits[0].id.clone();

        let january = warmer.warm_month(Arc::clone(&habits), date(2024, 1, 1));
        let march = warmer.warm_month(Arc::clone(&habits), date(2024, 3, 1));
        assert!(march.generation() > january.generation());

        let first = january.wait().await;
        assert_eq!(march.wait().await, WarmupOutcome::Published { entries: 31 });
        for day in DateRange::month_of(date(2024, 3, 1)).days() {
            assert!(warmer.cache().get(&id, day).is_some());
        }
        // January either finished before March was requested or left no trace.
        let january_entries = DateRange::month_of(date(2024, 1, 1))
            .days()
            .filter(|d| warmer.cache().get(&id, *d).is_some())
            .count();
        match first {
            WarmupOutcome::Published { entries } => assert_eq!(january_entries, entries),
            WarmupOutcome::Discarded => assert_eq!(january_entries, 0),
        }
    }

    #[tokio::test]
    async fn cancel_discards_running_warmup() {
        let warmer = CacheWarmer::new(Arc::new(DayStatusCache::new()));
        let habits = Arc::new(vec![every_other_day()]);
        let handle = warmer.warm(
            habits,
            DateRange::new(date(2024, 1, 1), date(2024, 12, 31)).unwrap(),
        );
        warmer.cancel();
        match handle.wait().await {
            WarmupOutcome::Discarded => assert!(warmer.cache().is_empty()),
            WarmupOutcome::Published { entries } => assert_eq!(warmer.cache().len(), entries),
        }
    }
}
