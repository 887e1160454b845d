//! Petalshop CLI - Browse the flower shop, fill a cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the password is read from stdin when not given)
//! petalshop login -e ayse@example.com
//!
//! # Browse roses under 50₺ that are in stock
//! petalshop products --category 1 --query ros --in-stock --max-price 50
//!
//! # Fill the cart and order it
//! petalshop cart add 3
//! petalshop cart show
//! petalshop order place
//! petalshop orders
//! ```
//!
//! # Environment Variables
//!
//! See `petalshop_storefront::config` for the full list. `RUST_LOG`
//! controls log output (written to stderr).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use petalshop_core::{CategoryId, Price, ProductId};
use petalshop_storefront::Storefront;
use petalshop_storefront::config::StorefrontConfig;
use petalshop_storefront::navigation::LogNavigator;

mod commands;

#[derive(Parser)]
#[command(name = "petalshop")]
#[command(author, version, about = "Petalshop storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account
    Register(commands::auth::RegisterArgs),
    /// Sign out
    Logout,
    /// Show who is signed in
    Whoami,
    /// List product categories
    Categories,
    /// List products, optionally filtered
    Products {
        /// Only this category (0 for all)
        #[arg(short, long)]
        category: Option<CategoryId>,

        /// Case-insensitive search in name and description
        #[arg(short, long)]
        query: Option<String>,

        /// Hide products that are out of stock
        #[arg(long)]
        in_stock: bool,

        /// Highest unit price to show
        #[arg(long)]
        max_price: Option<Price>,
    },
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// List past orders
    Orders,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product
    Remove {
        /// Product ID
        product_id: ProductId,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Order everything in the cart
    Place,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "petalshop_storefront=info,petalshop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Storefront::new(config, Arc::new(LogNavigator))?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&store, &email, password).await?;
        }
        Commands::Register(args) => commands::auth::register(&store, args).await?,
        Commands::Logout => commands::auth::logout(&store)?,
        Commands::Whoami => commands::auth::whoami(&store),
        Commands::Categories => commands::catalog::categories(&store).await?,
        Commands::Products {
            category,
            query,
            in_stock,
            max_price,
        } => {
            let filter = commands::catalog::ProductFilter {
                category,
                query,
                in_stock,
                max_price,
            };
            commands::catalog::products(&store, filter).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&store).await?,
            CartAction::Add { product_id } => commands::cart::add(&store, product_id).await?,
            CartAction::Remove { product_id } => {
                commands::cart::remove(&store, product_id).await?;
            }
        },
        Commands::Order { action } => match action {
            OrderAction::Place => commands::orders::place(&store).await?,
        },
        Commands::Orders => commands::orders::list(&store).await?,
    }
    Ok(())
}
