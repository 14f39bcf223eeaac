//! Sports Buddy CLI - accounts, taxonomy, and events over the selected backend.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{account, backend, event, taxonomy, CliError};
use sportsbuddy_store::{StoreConfig, StoreHandle};

#[derive(Parser)]
#[command(name = "sportsbuddy")]
#[command(about = "Sports Buddy accounts, categories, cities, and events")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Data directory for the local backend and session files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which backend is active
    Backend,
    /// Create an account and start a session
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Requested role (user or admin); the role policy has the final say
        #[arg(long, default_value = "user")]
        role: String,
    },
    /// Sign in and start a session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// Manage sport categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage cities
    City {
        #[command(subcommand)]
        action: CityAction,
    },
    /// Manage areas within a city
    Area {
        #[command(subcommand)]
        action: AreaAction,
    },
    /// Manage events
    Event {
        #[command(subcommand)]
        action: EventAction,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// List categories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a category (admin)
    Add { name: String },
    /// Remove a category (admin)
    Remove { name: String },
}

#[derive(Subcommand)]
enum CityAction {
    /// List cities and their areas
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a city (admin)
    Add { name: String },
    /// Remove a city (admin)
    Remove { name: String },
}

#[derive(Subcommand)]
enum AreaAction {
    /// Add an area to a city (admin)
    Add { city: String, area: String },
    /// Remove an area from a city (admin)
    Remove { city: String, area: String },
}

#[derive(Subcommand)]
enum EventAction {
    /// Create an event owned by the signed-in identity
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        /// RFC 3339 timestamp or "YYYY-MM-DD HH:MM" (UTC)
        #[arg(long)]
        when: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        area: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Update fields of an event you own
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        when: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an event (owner or admin)
    Delete { id: String },
    /// List your events, or every event with --all (admin)
    List {
        /// List every event
        #[arg(long)]
        all: bool,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Filter by city
        #[arg(long)]
        city: Option<String>,
        /// Filter by area (requires --city)
        #[arg(long, requires = "city")]
        area: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logger() {
    let filter =
        EnvFilter::try_from_env("SPORTSBUDDY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<StoreHandle, CliError> {
    let mut config = StoreConfig::load(config.as_deref())?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(StoreHandle::select(&config)?)
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(cli.config, cli.data_dir)?;

    match cli.command {
        Commands::Backend => backend::run(&store),
        Commands::Register {
            email,
            password,
            role,
        } => account::register(&store, &email, &password, &role).await,
        Commands::Login { email, password } => account::login(&store, &email, &password).await,
        Commands::Logout => account::logout(&store).await,
        Commands::Whoami => account::whoami(&store).await,
        Commands::Category { action } => match action {
            CategoryAction::List { json } => taxonomy::list_categories(&store, json).await,
            CategoryAction::Add { name } => taxonomy::add_category(&store, &name).await,
            CategoryAction::Remove { name } => taxonomy::remove_category(&store, &name).await,
        },
        Commands::City { action } => match action {
            CityAction::List { json } => taxonomy::list_cities(&store, json).await,
            CityAction::Add { name } => taxonomy::add_city(&store, &name).await,
            CityAction::Remove { name } => taxonomy::remove_city(&store, &name).await,
        },
        Commands::Area { action } => match action {
            AreaAction::Add { city, area } => taxonomy::add_area(&store, &city, &area).await,
            AreaAction::Remove { city, area } => {
                taxonomy::remove_area(&store, &city, &area).await
            }
        },
        Commands::Event { action } => match action {
            EventAction::Create {
                name,
                category,
                when,
                city,
                area,
                description,
            } => {
                event::create(
                    &store,
                    event::EventFields {
                        name: Some(name),
                        category: Some(category),
                        when: Some(when),
                        city: Some(city),
                        area: Some(area),
                        description: Some(description),
                    },
                )
                .await
            }
            EventAction::Update {
                id,
                name,
                category,
                when,
                city,
                area,
                description,
            } => {
                event::update(
                    &store,
                    &id,
                    event::EventFields {
                        name,
                        category,
                        when,
                        city,
                        area,
                        description,
                    },
                )
                .await
            }
            EventAction::Delete { id } => event::delete(&store, &id).await,
            EventAction::List {
                all,
                category,
                city,
                area,
                json,
            } => event::list(&store, all, category, city, area, json).await,
        },
    }
}

#[tokio::main]
async fn main() {
    init_logger();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
