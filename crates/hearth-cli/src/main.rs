use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod session;

use session::Session;

#[derive(Parser)]
#[command(name = "hearth", version, about = "Hearth habit tracker CLI")]
struct Cli {
    /// Account to act as (defaults to $HEARTH_USER, then "local")
    #[arg(long, global = true)]
    user: Option<String>,
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
    /// Record today's result for a habit
    Checkin(commands::checkin::CheckinArgs),
    /// Attach a note to a day's entry
    Note(commands::checkin::NoteArgs),
    /// Browse and buy from the shop
    Shop {
        #[command(subcommand)]
        action: commands::shop::ShopAction,
    },
    /// Spend an inventory item
    Use(commands::shop::UseArgs),
    /// Coin wagers
    Wager {
        #[command(subcommand)]
        action: commands::wager::WagerAction,
    },
    /// Show coin balance
    Wallet,
    /// Show consumables and owned cosmetics
    Inventory,
    /// Show or change app settings
    Settings {
        #[command(subcommand)]
        action: Option<commands::settings::SettingsAction>,
    },
    /// Engine configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Remote write queue
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
    /// Account management
    Account {
        #[command(subcommand)]
        action: commands::account::AccountAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("HEARTH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(command: Commands, session: &mut Session) -> commands::CmdResult {
    match command {
        Commands::Habit { action } => commands::habit::run(action, session),
        Commands::Checkin(args) => commands::checkin::run(args, session),
        Commands::Note(args) => commands::checkin::note(args, session),
        Commands::Shop { action } => commands::shop::run(action, session),
        Commands::Use(args) => commands::shop::use_item(args, session),
        Commands::Wager { action } => commands::wager::run(action, session),
        Commands::Wallet => commands::wallet::wallet(session),
        Commands::Inventory => commands::wallet::inventory(session),
        Commands::Settings { action } => commands::settings::run(action, session),
        Commands::Sync { action } => commands::sync::run(action, session),
        Commands::Account { action } => commands::account::run(action, session),
        Commands::Config { action } => commands::config::run(action),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        command => Session::open(cli.user).map_err(Into::into).and_then(|mut session| {
            let result = dispatch(command, &mut session);
            session.close();
            result
        }),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
