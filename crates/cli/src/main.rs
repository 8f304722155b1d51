//! Kiosk CLI - Cart and catalog management tools.
//!
//! # Usage
//!
//! ```bash
//! # Check a catalog file
//! kiosk catalog check --catalog ./catalog.json
//!
//! # Add two white medium shirts to a client's cart
//! kiosk cart --client 6c1f... add -p 1 --color White --size M -q 2
//!
//! # Show the cart, then place the order
//! kiosk cart --client 6c1f... show
//! kiosk cart --client 6c1f... checkout
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and edit a client's persisted cart
//! - `catalog check` - Validate a catalog file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kiosk_core::{CurrencyCode, ProductId};
use uuid::Uuid;

mod commands;

use commands::cart::{CartContext, Selection};

#[derive(Parser)]
#[command(name = "kiosk")]
#[command(author, version, about = "Kiosk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit a client's cart
    Cart {
        #[command(flatten)]
        target: CartTarget,

        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Args)]
struct CatalogArgs {
    /// Product catalog JSON file
    #[arg(long, env = "KIOSK_CATALOG", default_value = "./catalog.json")]
    catalog: PathBuf,

    /// Currency catalog prices are expressed in
    #[arg(long, env = "KIOSK_CURRENCY", default_value = "USD")]
    currency: CurrencyCode,
}

#[derive(Args)]
struct CartTarget {
    /// Root directory holding per-client cart storage
    #[arg(long, env = "KIOSK_DATA_DIR", default_value = "./data/carts")]
    data_dir: PathBuf,

    /// Client id whose cart to operate on
    #[arg(long, env = "KIOSK_CLIENT")]
    client: Uuid,

    #[command(flatten)]
    catalog: CatalogArgs,
}

#[derive(Args)]
struct SelectionArgs {
    /// Product id
    #[arg(short, long)]
    product: ProductId,

    /// Selected color
    #[arg(long)]
    color: Option<String>,

    /// Selected size
    #[arg(long)]
    size: Option<String>,
}

impl From<SelectionArgs> for Selection {
    fn from(args: SelectionArgs) -> Self {
        Self {
            product_id: args.product,
            color: args.color,
            size: args.size,
        }
    }
}

#[derive(Subcommand)]
enum CartAction {
    /// Add units of a product, merging with a matching line
    Add {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (zero or less removes it)
    Update {
        #[command(flatten)]
        selection: SelectionArgs,

        /// New quantity
        #[arg(short, long, allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Remove every line
    Clear,
    /// Print the cart as JSON
    Show,
    /// Print the order for the cart as JSON and clear the cart
    Checkout,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Validate a catalog file and list its products
    Check {
        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiosk=info,kiosk_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Cart { target, action } => {
            let ctx = CartContext::open(
                &target.data_dir,
                target.client,
                &target.catalog.catalog,
                target.catalog.currency,
            )?;
            let output = match action {
                CartAction::Add {
                    selection,
                    quantity,
                } => commands::cart::add(&ctx, selection.into(), quantity)?,
                CartAction::Update {
                    selection,
                    quantity,
                } => commands::cart::update(&ctx, selection.into(), quantity)?,
                CartAction::Remove { selection } => {
                    commands::cart::remove(&ctx, selection.into())?
                }
                CartAction::Clear => commands::cart::clear(&ctx)?,
                CartAction::Show => commands::cart::show(&ctx)?,
                CartAction::Checkout => commands::cart::checkout(&ctx)?,
            };
            commands::emit(&output);
        }
        Commands::Catalog { action } => match action {
            CatalogAction::Check { catalog } => {
                let output = commands::catalog::check(&catalog.catalog, catalog.currency)?;
                commands::emit(&output);
            }
        },
    }
    Ok(())
}
