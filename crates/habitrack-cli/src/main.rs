use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use habitrack_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "habitrack", version, about = "Habitrack CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Repeat pattern management
    Pattern {
        #[command(subcommand)]
        action: commands::pattern::PatternAction,
    },
    /// Record a habit as done (or avoided) for a day
    Done(commands::completion::MarkArgs),
    /// Remove the record for a day
    Undo(commands::completion::UndoArgs),
    /// Habit list management
    List {
        #[command(subcommand)]
        action: commands::list::ListAction,
    },
    /// Category management
    Category {
        #[command(subcommand)]
        action: commands::category::CategoryAction,
    },
    /// Streaks, completion rates and charts
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn init_tracing() {
    // The subscriber is not up yet, so a broken config is reported on stderr
    // here and surfaces again from the command that loads it.
    let filter = std::env::var("HABITRACK_LOG").unwrap_or_else(|_| match Config::read_existing() {
        Ok(config) => config.unwrap_or_default().logging.filter,
        Err(e) => {
            eprintln!("warning: {e}");
            Config::default().logging.filter
        }
    });

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Pattern { action } => commands::pattern::run(action),
        Commands::Done(args) => commands::completion::mark(args),
        Commands::Undo(args) => commands::completion::undo(args),
        Commands::List { action } => commands::list::run(action),
        Commands::Category { action } => commands::category::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "habitrack", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
