//! SnapDish CLI - operator tools over the service library.
//!
//! # Usage
//!
//! ```bash
//! # Find or create the client behind a set of contact details
//! snapdish resolve-client --restaurant "Bistro Zuid" --contact Daan -e chef@bistro.nl
//!
//! # Store a submission
//! snapdish submit --restaurant "Bistro Zuid" --contact Daan -e chef@bistro.nl \
//!     --item-name "Steak tartare" --image tartare.jpg
//!
//! # Package tiers
//! snapdish packages
//!
//! # Affiliate dashboard numbers
//! snapdish affiliate summary --affiliate-id 3f2b...
//!
//! # Attach a submission to a client
//! snapdish link-submission --submission-id 1b4e... --client-id 9a7c...
//! ```
//!
//! # Commands
//!
//! - `resolve-client` - Resolve or create a client
//! - `submit` - Upload images and store a submission
//! - `packages` - Package tier terms and usage
//! - `affiliate summary` / `affiliate referrals` - Affiliate dashboard
//! - `link-submission` - Reassign a submission

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snapdish_core::{AffiliateId, AuthUserId, ClientId, PackageTier, SubmissionId};
use snapdish_service::services::ItemDetails;
use snapdish_service::{ConfigError, ServiceConfig};

mod commands;

use commands::{ClientArgs, CommandError};

#[derive(Parser)]
#[command(name = "snapdish")]
#[command(author, version, about = "SnapDish operator tools")]
struct Cli {
    /// Access token of a signed-in user; requests run as that user
    #[arg(long, global = true)]
    session_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the client for a set of contact details
    ResolveClient {
        #[command(flatten)]
        client: ClientArgs,

        /// Auth account to resolve for (defaults to the session user)
        #[arg(long)]
        auth_user_id: Option<AuthUserId>,
    },
    /// Upload images and store a submission
    Submit {
        #[command(flatten)]
        client: ClientArgs,

        /// Name of the dish
        #[arg(long)]
        item_name: String,

        /// Dish category (starter, main, dessert, ...)
        #[arg(long)]
        item_type: Option<String>,

        /// Dish description
        #[arg(long)]
        description: Option<String>,

        /// Reference image; repeat for several
        #[arg(long = "image", required = true)]
        images: Vec<PathBuf>,

        /// Notes for the photographer
        #[arg(long)]
        notes: Option<String>,

        /// Auth account to submit as (defaults to the session user)
        #[arg(long)]
        auth_user_id: Option<AuthUserId>,
    },
    /// Show package tiers, or the usage of one tier
    Packages {
        /// Tier to report usage for (`tasting`, `full_menu`, `deluxe`)
        #[arg(long)]
        tier: Option<PackageTier>,

        /// Dishes already used on that tier
        #[arg(long, default_value_t = 0)]
        used: u32,
    },
    /// Affiliate dashboard
    Affiliate {
        #[command(subcommand)]
        action: AffiliateAction,
    },
    /// Reassign a submission to a client
    LinkSubmission {
        #[arg(long)]
        submission_id: SubmissionId,

        #[arg(long)]
        client_id: ClientId,
    },
}

#[derive(Subcommand)]
enum AffiliateAction {
    /// Commission totals and referral count
    Summary {
        #[arg(long)]
        affiliate_id: AffiliateId,
    },
    /// Clients referred by the affiliate
    Referrals {
        #[arg(long)]
        affiliate_id: AffiliateId,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServiceConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

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

    // Loaded up front for Sentry; commands that need it report the error
    let config = ServiceConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "snapdish_cli=info,snapdish_service=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(
    cli: Cli,
    config: Result<ServiceConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Packages { tier, used } = &cli.command {
        commands::packages::run(*tier, *used);
        return Ok(());
    }

    let config = config.map_err(CommandError::from)?;
    let state = commands::connect(&config, cli.session_token)?;

    match cli.command {
        Commands::ResolveClient {
            client,
            auth_user_id,
        } => {
            commands::client::resolve(&state, client, auth_user_id).await?;
        }
        Commands::Submit {
            client,
            item_name,
            item_type,
            description,
            images,
            notes,
            auth_user_id,
        } => {
            let item = ItemDetails {
                item_name,
                item_type,
                description,
            };
            commands::submit::submit(&state, client, item, &images, notes, auth_user_id).await?;
        }
        Commands::Affiliate { action } => match action {
            AffiliateAction::Summary { affiliate_id } => {
                commands::affiliate::summary(&state, affiliate_id).await?;
            }
            AffiliateAction::Referrals { affiliate_id } => {
                commands::affiliate::referrals(&state, affiliate_id).await?;
            }
        },
        Commands::LinkSubmission {
            submission_id,
            client_id,
        } => {
            commands::submit::link(&state, submission_id, client_id).await?;
        }
        Commands::Packages { .. } => {}
    }
    Ok(())
}
