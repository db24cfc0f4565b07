//! SQLite-based storage for habits, repeat patterns, completions, lists and
//! categories.
//!
//! Cadences are stored as JSON. A cadence that no longer decodes loads as
//! `None`, which the evaluator treats as never active.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations, presets, Config};
use crate::error::{CoreError, DatabaseError};
use crate::habit::{
    Cadence, Completion, Habit, HabitCategory, HabitKind, HabitList, Intensity, RepeatPattern,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const HABIT_COLUMNS: &str =
    "id, name, kind, intensity, start_date, list_id, category_id, is_archived, created_at";

// === Helper Functions ===

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(column: &'static str, raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| DatabaseError::Corrupt {
        column,
        message: format!("'{raw}': {e}"),
    })
}

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(column: &'static str, raw: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| DatabaseError::Corrupt {
        column,
        message: format!("'{raw}': {e}"),
    })
}

/// Parse habit kind from database string, defaulting to positive.
fn parse_kind(raw: &str) -> HabitKind {
    HabitKind::parse(raw).unwrap_or_default()
}

/// Parse intensity level, defaulting to moderate when out of range.
fn parse_intensity(level: i64) -> Intensity {
    u8::try_from(level)
        .ok()
        .and_then(|l| Intensity::try_from(l).ok())
        .unwrap_or_default()
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_cadence(pattern_id: &str, raw: Option<&str>) -> Option<Cadence> {
    let raw = raw?;
    let cadence = Cadence::from_json(raw);
    if cadence.is_none() {
        tracing::trace!(pattern_id, raw, "stored cadence did not decode");
    }
    cadence
}

struct HabitRow {
    id: String,
    name: String,
    kind: String,
    intensity: i64,
    start_date: String,
    list_id: Option<String>,
    category_id: Option<String>,
    is_archived: bool,
    created_at: String,
}

fn read_habit_row(row: &rusqlite::Row) -> Result<HabitRow, rusqlite::Error> {
    Ok(HabitRow {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        intensity: row.get(3)?,
        start_date: row.get(4)?,
        list_id: row.get(5)?,
        category_id: row.get(6)?,
        is_archived: row.get::<_, i32>(7)? != 0,
        created_at: row.get(8)?,
    })
}

/// SQLite store for the habit entity graph.
///
/// Construct one explicitly and pass it to whoever needs it.
pub struct HabitStore {
    conn: Connection,
}

impl HabitStore {
    /// Open (or create) the store at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        tracing::debug!(path = %path.display(), "habit store opened");
        Ok(store)
    }

    /// Open the store named by `config.storage.db_file` in the data directory.
    pub fn open_default(config: &Config) -> Result<Self, CoreError> {
        let path = data_dir()?.join(&config.storage.db_file);
        Ok(Self::open(path)?)
    }

    /// Open an in-memory store.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        migrations::migrate(&self.conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    pub fn schema_version(&self) -> i32 {
        migrations::get_schema_version(&self.conn)
    }

    /// Run `f` in a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// Nested calls join the outer transaction.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        if !self.conn.is_autocommit() {
            return f(self);
        }

        self.conn
            .execute_batch("BEGIN IMMEDIATE TRANSACTION;")
            .map_err(DatabaseError::from)?;
        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT;")
                    .map_err(DatabaseError::from)?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                tracing::debug!("transaction rolled back");
                Err(err)
            }
        }
    }

    // === Habit CRUD ===

    /// Insert a habit together with its patterns and completions.
    pub fn create_habit(&self, habit: &Habit) -> Result<(), DatabaseError> {
        self.transaction(|store| -> Result<(), DatabaseError> {
            store.conn.execute(
                "INSERT INTO habits (id, name, kind, intensity, start_date, list_id, category_id, is_archived, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    habit.id,
                    habit.name,
                    habit.kind.as_str(),
                    habit.intensity.level(),
                    format_date(habit.start_date),
                    habit.list_id,
                    habit.category_id,
                    if habit.is_archived { 1 } else { 0 },
                    habit.created_at.to_rfc3339(),
                ],
            )?;
            for (position, pattern) in habit.patterns.iter().enumerate() {
                store.insert_pattern(&habit.id, position as i64, pattern)?;
            }
            // One row per day survives; upserting oldest first leaves the
            // latest record of each day, as the ledger reads it.
            let mut completions: Vec<&Completion> = habit.completions.iter().collect();
            completions.sort_by_key(|c| c.recorded_at);
            for completion in completions {
                store.upsert_completion(completion)?;
            }
            Ok(())
        })?;
        tracing::debug!(habit_id = %habit.id, name = %habit.name, "habit created");
        Ok(())
    }

    /// Get a habit with its patterns and completions.
    pub fn get_habit(&self, id: &str) -> Result<Option<Habit>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                params![id],
                read_habit_row,
            )
            .optional()?;
        row.map(|row| self.hydrate(row)).transpose()
    }

    /// List habits, oldest first.
    pub fn list_habits(&self, include_archived: bool) -> Result<Vec<Habit>, DatabaseError> {
        let filter = if include_archived {
            ""
        } else {
            "WHERE is_archived = 0"
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits {filter} ORDER BY created_at ASC, name ASC"
        ))?;
        let rows = stmt
            .query_map([], read_habit_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    /// Update a habit's own fields. Patterns and completions are untouched.
    pub fn update_habit(&self, habit: &Habit) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET name = ?1, kind = ?2, intensity = ?3, start_date = ?4,
                 list_id = ?5, category_id = ?6, is_archived = ?7
             WHERE id = ?8",
            params![
                habit.name,
                habit.kind.as_str(),
                habit.intensity.level(),
                format_date(habit.start_date),
                habit.list_id,
                habit.category_id,
                if habit.is_archived { 1 } else { 0 },
                habit.id,
            ],
        )?;
        if changed == 0 {
            return Err(not_found("habit", &habit.id));
        }
        tracing::debug!(habit_id = %habit.id, "habit updated");
        Ok(())
    }

    /// Soft delete: hide the habit and detach it from its list.
    pub fn archive_habit(&self, id: &str) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE habits SET is_archived = 1, list_id = NULL WHERE id = ?1",
            params![id],
        )?;
        if changed == 0 {
            return Err(not_found("habit", id));
        }
        tracing::debug!(habit_id = id, "habit archived");
        Ok(())
    }

    /// Delete a habit and everything it owns.
    pub fn delete_habit(&self, id: &str) -> Result<(), DatabaseError> {
        self.transaction(|store| -> Result<(), DatabaseError> {
            store
                .conn
                .execute("DELETE FROM completions WHERE habit_id = ?1", params![id])?;
            store
                .conn
                .execute("DELETE FROM repeat_patterns WHERE habit_id = ?1", params![id])?;
            let deleted = store
                .conn
                .execute("DELETE FROM habits WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(not_found("habit", id));
            }
            Ok(())
        })?;
        tracing::debug!(habit_id = id, "habit deleted");
        Ok(())
    }

    fn require_habit(&self, id: &str) -> Result<(), DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM habits WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Err(not_found("habit", id));
        }
        Ok(())
    }

    fn hydrate(&self, row: HabitRow) -> Result<Habit, DatabaseError> {
        let patterns = self.list_patterns(&row.id)?;
        let completions = self.list_completions(&row.id)?;
        Ok(Habit {
            start_date: parse_date("habits.start_date", &row.start_date)?,
            kind: parse_kind(&row.kind),
            intensity: parse_intensity(row.intensity),
            created_at: parse_datetime_fallback(&row.created_at),
            id: row.id,
            name: row.name,
            list_id: row.list_id,
            category_id: row.category_id,
            patterns,
            completions,
            is_archived: row.is_archived,
        })
    }

    // === Repeat patterns ===

    /// Append a pattern to a habit's history.
    pub fn add_pattern(&self, habit_id: &str, pattern: &RepeatPattern) -> Result<(), DatabaseError> {
        self.require_habit(habit_id)?;
        let position: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM repeat_patterns WHERE habit_id = ?1",
            params![habit_id],
            |row| row.get(0),
        )?;
        self.insert_pattern(habit_id, position, pattern)?;
        tracing::debug!(habit_id, pattern_id = %pattern.id, position, "pattern added");
        Ok(())
    }

    fn insert_pattern(
        &self,
        habit_id: &str,
        position: i64,
        pattern: &RepeatPattern,
    ) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO repeat_patterns (id, habit_id, position, effective_from, follow_up, cadence)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                pattern.id,
                habit_id,
                position,
                format_date(pattern.effective_from),
                if pattern.follow_up { 1 } else { 0 },
                pattern.cadence.as_ref().map(Cadence::to_json),
            ],
        )?;
        Ok(())
    }

    /// A habit's patterns in insertion order.
    pub fn list_patterns(&self, habit_id: &str) -> Result<Vec<RepeatPattern>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, effective_from, follow_up, cadence
             FROM repeat_patterns
             WHERE habit_id = ?1
             ORDER BY position ASC",
        )?;
        let rows = stmt
            .query_map(params![habit_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i32>(2)? != 0,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, effective_from, follow_up, cadence)| {
                Ok(RepeatPattern {
                    effective_from: parse_date("repeat_patterns.effective_from", &effective_from)?,
                    cadence: parse_cadence(&id, cadence.as_deref()),
                    follow_up,
                    id,
                })
            })
            .collect()
    }

    // === Completions ===

    /// Record a completion, replacing the habit's record for that day.
    pub fn set_completion(&self, completion: &Completion) -> Result<(), DatabaseError> {
        self.require_habit(&completion.habit_id)?;
        self.upsert_completion(completion)?;
        tracing::debug!(
            habit_id = %completion.habit_id,
            day = %completion.day(),
            completed = completion.completed,
            "completion recorded"
        );
        Ok(())
    }

    fn upsert_completion(&self, completion: &Completion) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO completions (id, habit_id, day, recorded_at, completed)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (habit_id, day) DO UPDATE
             SET recorded_at = excluded.recorded_at,
                 completed = excluded.completed",
            params![
                completion.id,
                completion.habit_id,
                format_date(completion.day()),
                format_timestamp(completion.recorded_at),
                if completion.completed { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }

    /// Remove the record for `day`. Returns whether one existed.
    pub fn clear_completion(&self, habit_id: &str, day: NaiveDate) -> Result<bool, DatabaseError> {
        let deleted = self.conn.execute(
            "DELETE FROM completions WHERE habit_id = ?1 AND day = ?2",
            params![habit_id, format_date(day)],
        )?;
        tracing::debug!(habit_id, %day, deleted, "completion cleared");
        Ok(deleted > 0)
    }

    /// A habit's completion records, by day.
    pub fn list_completions(&self, habit_id: &str) -> Result<Vec<Completion>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recorded_at, completed
             FROM completions
             WHERE habit_id = ?1
             ORDER BY day ASC",
        )?;
        let rows = stmt
            .query_map(params![habit_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i32>(2)? != 0,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, recorded_at, completed)| {
                Ok(Completion {
                    id,
                    habit_id: habit_id.to_string(),
                    recorded_at: parse_timestamp("completions.recorded_at", &recorded_at)?,
                    completed,
                })
            })
            .collect()
    }

    // === Lists ===

    pub fn create_list(&self, list: &HabitList) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO habit_lists (id, name, icon, color, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![list.id, list.name, list.icon, list.color, list.order],
        )?;
        tracing::debug!(list_id = %list.id, name = %list.name, "list created");
        Ok(())
    }

    pub fn get_list(&self, id: &str) -> Result<Option<HabitList>, DatabaseError> {
        let list = self
            .conn
            .query_row(
                "SELECT id, name, icon, color, sort_order FROM habit_lists WHERE id = ?1",
                params![id],
                |row| {
                    Ok(HabitList {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        icon: row.get(2)?,
                        color: row.get(3)?,
                        order: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(list)
    }

    /// All lists in display order.
    pub fn list_lists(&self) -> Result<Vec<HabitList>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, icon, color, sort_order FROM habit_lists ORDER BY sort_order ASC, name ASC",
        )?;
        let lists = stmt
            .query_map([], |row| {
                Ok(HabitList {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    icon: row.get(2)?,
                    color: row.get(3)?,
                    order: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    /// Delete a list; its habits become unlisted. Returns how many were
    /// detached.
    pub fn delete_list(&self, id: &str) -> Result<usize, DatabaseError> {
        let detached = self.transaction(|store| -> Result<usize, DatabaseError> {
            let detached = store.conn.execute(
                "UPDATE habits SET list_id = NULL WHERE list_id = ?1",
                params![id],
            )?;
            let deleted = store
                .conn
                .execute("DELETE FROM habit_lists WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(not_found("list", id));
            }
            Ok(detached)
        })?;
        tracing::debug!(list_id = id, detached, "list deleted");
        Ok(detached)
    }

    // === Categories ===

    pub fn create_category(&self, category: &HabitCategory) -> Result<(), DatabaseError> {
        self.insert_category(category)?;
        tracing::debug!(category_id = %category.id, name = %category.name, "category created");
        Ok(())
    }

    fn insert_category(&self, category: &HabitCategory) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO habit_categories (id, name, icon, color, sort_order, is_default)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                category.id,
                category.name,
                category.icon,
                category.color,
                category.order,
                if category.is_default { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }

    pub fn get_category(&self, id: &str) -> Result<Option<HabitCategory>, DatabaseError> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name, icon, color, sort_order, is_default
                 FROM habit_categories WHERE id = ?1",
                params![id],
                |row| {
                    Ok(HabitCategory {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        icon: row.get(2)?,
                        color: row.get(3)?,
                        order: row.get(4)?,
                        is_default: row.get::<_, i32>(5)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    /// All categories in display order.
    pub fn list_categories(&self) -> Result<Vec<HabitCategory>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, icon, color, sort_order, is_default
             FROM habit_categories
             ORDER BY sort_order ASC, name ASC",
        )?;
        let categories = stmt
            .query_map([], |row| {
                Ok(HabitCategory {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    icon: row.get(2)?,
                    color: row.get(3)?,
                    order: row.get(4)?,
                    is_default: row.get::<_, i32>(5)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Insert the preset categories if the category table is empty.
    ///
    /// Returns how many were inserted (0 when categories already exist).
    pub fn seed_default_categories(&self) -> Result<usize, DatabaseError> {
        let inserted = self.transaction(|store| -> Result<usize, DatabaseError> {
            let existing: i64 =
                store
                    .conn
                    .query_row("SELECT COUNT(*) FROM habit_categories", [], |row| row.get(0))?;
            if existing > 0 {
                return Ok(0);
            }
            let presets = presets::default_categories();
            for category in &presets {
                store.insert_category(category)?;
            }
            Ok(presets.len())
        })?;
        if inserted > 0 {
            tracing::debug!(inserted, "seeded default categories");
        }
        Ok(inserted)
    }
}

fn not_found(entity: &'static str, id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        entity,
        id: id.to_string(),
    }
}
