use clap::Subcommand;
use habitrack_core::{Config, DatabaseError, HabitList};

use super::{open_store, print_json};

#[derive(Subcommand)]
pub enum ListAction {
    /// Create a habit list
    Create {
        /// List name
        name: String,
        /// Icon name
        #[arg(long, default_value = "")]
        icon: String,
        /// Display color
        #[arg(long, default_value = "")]
        color: String,
        /// Sort position
        #[arg(long, default_value = "0")]
        order: i32,
    },
    /// List all habit lists
    List,
    /// Get a habit list
    Get {
        /// List ID
        id: String,
    },
    /// Delete a list; its habits become unlisted
    Delete {
        /// List ID
        id: String,
    },
}

pub fn run(action: ListAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = open_store(&config)?;

    match action {
        ListAction::Create {
            name,
            icon,
            color,
            order,
        } => {
            let list = HabitList::new(&name, &icon, &color, order);
            store.create_list(&list)?;
            print_json(&list)?;
        }
        ListAction::List => {
            print_json(&store.list_lists()?)?;
        }
        ListAction::Get { id } => {
            let list = store.get_list(&id)?.ok_or(DatabaseError::NotFound {
                entity: "list",
                id: id.clone(),
            })?;
            print_json(&list)?;
        }
        ListAction::Delete { id } => {
            let detached = store.delete_list(&id)?;
            print_json(&serde_json::json!({ "deleted": id, "detached_habits": detached }))?;
        }
    }
    Ok(())
}
