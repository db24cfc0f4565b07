//! Built-in habit categories seeded into an empty store.

use crate::habit::HabitCategory;

/// `(id, name, icon, color)` for each preset, in display order.
const PRESET_CATEGORIES: [(&str, &str, &str, &str); 8] = [
    ("preset-health", "Health", "heart", "#ef4444"),
    ("preset-fitness", "Fitness", "dumbbell", "#f97316"),
    ("preset-mind", "Mindfulness", "leaf", "#22c55e"),
    ("preset-learning", "Learning", "book", "#3b82f6"),
    ("preset-productivity", "Productivity", "check-circle", "#8b5cf6"),
    ("preset-finance", "Finance", "wallet", "#eab308"),
    ("preset-social", "Social", "users", "#ec4899"),
    ("preset-home", "Home", "home", "#14b8a6"),
];

/// The preset categories, flagged `is_default`.
///
/// Ids are stable so reseeding a wiped table yields the same references.
pub fn default_categories() -> Vec<HabitCategory> {
    PRESET_CATEGORIES
        .iter()
        .zip(0..)
        .map(|(&(id, name, icon, color), order)| HabitCategory {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            order,
            is_default: true,
        })
        .collect()
}
