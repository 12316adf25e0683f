//! FitWear CLI - drive the client stores from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (session is kept under FITWEAR_STATE_DIR)
//! fitwear login -u ana -p hunter22
//!
//! # Browse and fill the cart
//! fitwear products list --search tee
//! fitwear cart add 12 --quantity 2
//!
//! # Check out
//! fitwear checkout --payment card
//!
//! # Ask the route guard about a screen
//! fitwear access /inventory
//! ```
//!
//! # Environment Variables
//!
//! See `fitwear_client::config` for the full list. `RUST_LOG` controls
//! log verbosity.

#![cfg_attr(not(test), forbid(unsafe_code))]
// Printing results is this binary's job.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};
use fitwear_client::config::ClientConfig;
use fitwear_client::models::Registration;
use fitwear_client::state::AppState;
use fitwear_core::PaymentMethod;
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "fitwear")]
#[command(author, version, about = "FitWear client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account and sign in as it
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Browse the catalogue
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the cart as a purchase
    Checkout {
        /// Payment method (`cash` or `card`)
        #[arg(long, default_value = "cash")]
        payment: PaymentMethod,
    },
    /// Purchase history
    Purchases {
        #[command(subcommand)]
        action: PurchaseAction,
    },
    /// Show the route guard's decision for a location
    Access {
        /// Location, e.g. `/inventory`
        location: String,
    },
    /// Show the navigation menu for the current user
    Menu,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Update profile fields
    Update {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
    /// Change your password
    Password {
        #[arg(long)]
        current: String,

        #[arg(long)]
        new: String,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        category: Option<i32>,

        #[arg(long)]
        page: Option<u32>,
    },
    /// Show one product
    Show { id: i32 },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product
    Add {
        product_id: i32,

        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product
    Remove { product_id: i32 },
    /// Set a product's quantity (0 removes it)
    Set {
        product_id: i32,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Show the cart
    Show,
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum PurchaseAction {
    /// List your purchases
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one purchase
    Show { id: i32 },
    /// Cancel a pending purchase
    Cancel { id: i32 },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
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

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fitwear_client=warn,fitwear_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), commands::CommandError> {
    let app = AppState::from_config(config)?;
    app.bootstrap().await;

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&app, username, password).await?;
        }
        Commands::Register {
            username,
            email,
            password,
            first_name,
            last_name,
            phone,
            address,
        } => {
            let form = Registration {
                username,
                email,
                password: SecretString::from(password),
                first_name,
                last_name,
                phone,
                address,
            };
            commands::auth::register(&app, &form).await?;
        }
        Commands::Logout => commands::auth::logout(&app),
        Commands::Whoami => commands::auth::whoami(&app),
        Commands::Profile { action } => match action {
            ProfileAction::Update {
                first_name,
                last_name,
                email,
                phone,
                address,
            } => {
                commands::auth::update_profile(&app, first_name, last_name, email, phone, address)
                    .await?;
            }
            ProfileAction::Password { current, new } => {
                commands::auth::change_password(&app, current, new).await?;
            }
        },
        Commands::Products { action } => match action {
            ProductAction::List {
                search,
                category,
                page,
            } => commands::catalog::list(&app, search, category, page).await?,
            ProductAction::Show { id } => commands::catalog::show(&app, id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&app, product_id, quantity).await?,
            CartAction::Remove { product_id } => commands::cart::remove(&app, product_id),
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&app, product_id, quantity)?,
            CartAction::Show => commands::cart::show(&app),
            CartAction::Clear => commands::cart::clear(&app),
        },
        Commands::Checkout { payment } => commands::purchases::checkout(&app, payment).await?,
        Commands::Purchases { action } => match action {
            PurchaseAction::List { page } => commands::purchases::list(&app, page).await?,
            PurchaseAction::Show { id } => commands::purchases::show(&app, id).await?,
            PurchaseAction::Cancel { id } => commands::purchases::cancel(&app, id).await?,
        },
        Commands::Access { location } => commands::navigation::access(&app, &location),
        Commands::Menu => commands::navigation::menu(&app),
    }
    Ok(())
}
