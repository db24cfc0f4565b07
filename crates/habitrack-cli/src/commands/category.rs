use clap::Subcommand;
use habitrack_core::{Config, HabitCategory};

use super::{open_store, print_json};

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Create a custom category
    Create {
        /// Category name
        name: String,
        /// Icon name
        #[arg(long, default_value = "")]
        icon: String,
        /// Display color
        #[arg(long, default_value = "")]
        color: String,
        /// Sort position
        #[arg(long, default_value = "100")]
        order: i32,
    },
    /// List categories, presets included
    List,
}

pub fn run(action: CategoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = open_store(&config)?;

    match action {
        CategoryAction::Create {
            name,
            icon,
            color,
            order,
        } => {
            let category = HabitCategory::new(&name, &icon, &color, order);
            store.create_category(&category)?;
            print_json(&category)?;
        }
        CategoryAction::List => {
            print_json(&store.list_categories()?)?;
        }
    }
    Ok(())
}
