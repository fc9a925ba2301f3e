//! Rink Rental CLI - Fire the background cart actions from a terminal.
//!
//! Builds a headless page holding the triggering element, dispatches the
//! same event the browser would, and reports the resulting toast and
//! location.
//!
//! # Usage
//!
//! ```bash
//! # Add gear to the cart (form action is rewritten to the background endpoint)
//! rink-cli --cookies "csrftoken=abc; sessionid=xyz" add -a /rental/cart/add/3/ -f quantity=1 -f days=2
//!
//! # Remove a cart item
//! rink-cli --cookies "$RINK_COOKIES" remove --id 12
//!
//! # Check out
//! rink-cli --cookies "$RINK_COOKIES" checkout
//!
//! # Show which value a cookie resolves to
//! rink-cli --cookies "csrftoken=abc" cookie csrftoken
//! ```
//!
//! # Commands
//!
//! - `add` - Submit an add-to-cart form
//! - `remove` - Click a remove button
//! - `checkout` - Click the checkout button
//! - `cookie` - Look up a cookie

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rink_rental_storefront::EnhanceConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod commands;

#[derive(Parser)]
#[command(name = "rink-cli")]
#[command(author, version, about = "Rink Rental cart tools")]
struct Cli {
    /// Cookie string sent with the request (`name=value; name2=value2`)
    #[arg(long, global = true, env = "RINK_COOKIES", default_value = "")]
    cookies: String,

    /// Override `RINK_BASE_URL`
    #[arg(long, global = true)]
    base_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an add-to-cart form
    Add {
        /// Form action (e.g. /rental/cart/add/3/)
        #[arg(short, long)]
        action: String,

        /// Form field as `name=value` (repeatable)
        #[arg(short, long = "field", value_parser = commands::cart::parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Click a remove button
    Remove {
        /// Cart item ID (`data-id`)
        #[arg(long)]
        id: Option<String>,

        /// Explicit endpoint (`data-href`)
        #[arg(long)]
        href: Option<String>,
    },
    /// Click the checkout button
    Checkout {
        /// Explicit endpoint (`data-href`)
        #[arg(long)]
        href: Option<String>,
    },
    /// Look up a cookie in the cookie string
    Cookie {
        /// Cookie name
        name: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &EnhanceConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
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
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rink_rental_storefront=info,rink_rental_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = EnhanceConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    let _sentry_guard = init_sentry(&config);

    match cli.command {
        Commands::Add { action, fields } => {
            commands::cart::add(config, &cli.cookies, &action, fields).await?;
        }
        Commands::Remove { id, href } => {
            commands::cart::remove(config, &cli.cookies, id, href).await?;
        }
        Commands::Checkout { href } => {
            commands::cart::checkout(config, &cli.cookies, href).await?;
        }
        Commands::Cookie { name } => commands::cookie::show(&config, &cli.cookies, &name),
    }
    Ok(())
}
