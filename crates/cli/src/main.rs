//! Samara CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! samara-cli migrate
//!
//! # Create a staff account
//! samara-cli admin create -u nadia -p 'long-secret' -r admin
//! samara-cli admin create -u karim -p 'van-route-19' -r delivery
//!
//! # Insert the default delivery cities
//! samara-cli seed cities
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create staff accounts
//! - `seed cities` - Seed delivery coverage

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "samara-cli")]
#[command(author, version, about = "Samara CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage staff accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Insert reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new staff account
    Create {
        /// Sign-in name (at least 3 characters)
        #[arg(short, long)]
        username: String,

        /// Password, stored as an Argon2id hash
        #[arg(short, long)]
        password: String,

        /// Role (`admin` or `delivery`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Default Irish delivery cities (safe to run repeatedly)
    Cities,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                password,
                role,
            } => {
                commands::admin::create_user(&username, &password, &role).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Cities => {
                commands::seed::cities().await?;
            }
        },
    }
    Ok(())
}
