//! Foodcourt CLI - Inspect and edit a persistent cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart with totals
//! fc-cli show
//!
//! # Add a dish (one unit per call)
//! fc-cli add --dish 12 --restaurant 3 --price 250 --name "Borscht"
//!
//! # Change or remove entries
//! fc-cli update 12 3
//! fc-cli remove 12
//! fc-cli clear
//!
//! # Merge the local cart into the server cart (needs a session)
//! fc-cli sync
//!
//! # Place the order (needs a session)
//! fc-cli checkout --payment cash --address "1 Main St"
//! ```
//!
//! # Environment Variables
//!
//! - `FOODCOURT_ACCESS_TOKEN` / `FOODCOURT_USER_ID` - Session; both required
//!   for server-backed operations
//! - See `foodcourt_cart::config` for the rest

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "fc-cli")]
#[command(author, version, about = "Foodcourt cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    Show {
        /// Delivery option used for the totals (`standard`, `express`)
        #[arg(short, long, default_value = "standard")]
        delivery: String,
    },
    /// Add one unit of a dish
    Add {
        #[arg(long)]
        dish: i64,

        #[arg(long)]
        restaurant: i64,

        /// Unit price
        #[arg(long)]
        price: Decimal,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,
    },
    /// Remove a dish
    Remove { dish: i64 },
    /// Set a dish's quantity (0 removes it)
    Update { dish: i64, quantity: u32 },
    /// Empty the cart
    Clear,
    /// Merge the local cart with the server cart
    Sync,
    /// Place an order for the cart
    Checkout {
        /// Payment method (`credit-card`, `paypal`, `cash-on-delivery`)
        #[arg(short, long, default_value = "credit-card")]
        payment: String,

        #[arg(short, long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("foodcourt_cart=info,foodcourt_cli=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Show { delivery } => commands::cart::show(&delivery),
        Commands::Add {
            dish,
            restaurant,
            price,
            name,
            description,
        } => commands::cart::add(dish, restaurant, price, name, description).await,
        Commands::Remove { dish } => commands::cart::remove(dish).await,
        Commands::Update { dish, quantity } => commands::cart::update(dish, quantity).await,
        Commands::Clear => commands::cart::clear().await,
        Commands::Sync => commands::cart::sync().await,
        Commands::Checkout { payment, address } => {
            commands::checkout::place(&payment, address).await
        }
    }
}
