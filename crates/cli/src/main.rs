//! Bookstore CLI - database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (schema and session table)
//! bookstore migrate
//!
//! # Create a customer or seller account
//! bookstore user create -e reader@example.com -r customer -p 'long password'
//!
//! # Open the store a seller manages
//! bookstore store create -e seller@example.com -n "Corner Books"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bookstore")]
#[command(author, version, about = "Bookstore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage seller stores
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Role (`customer` or `seller`)
        #[arg(short, long, default_value = "customer")]
        role: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Create the store owned by a seller
    Create {
        /// Seller's email address
        #[arg(short, long)]
        email: String,

        /// Store name
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                role,
                password,
            } => {
                commands::user::create(&email, &role, &password).await?;
            }
        },
        Commands::Store { action } => match action {
            StoreAction::Create { email, name } => {
                commands::store::create(&email, &name).await?;
            }
        },
    }
    Ok(())
}
