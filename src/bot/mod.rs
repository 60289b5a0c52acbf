//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for JESTFLY, including all slash commands,
//! autocomplete handlers, error reporting and bot startup. Commands only parse input,
//! call into [`crate::core`] and render the result.

/// Discord command implementations (wallet, store, booking, community, admin, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::AppConfig,
    core::profile,
    entities::ProfileModel,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::{collections::HashSet, sync::Arc};
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Settings from `config.toml`
    pub config: Arc<AppConfig>,
    /// Discord user IDs allowed to run `/admin`
    pub admins: HashSet<String>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(
        database: DatabaseConnection,
        config: Arc<AppConfig>,
        admins: HashSet<String>,
    ) -> Self {
        Self {
            database,
            config,
            admins,
        }
    }

    /// Whether `user_id` has admin rights.
    #[must_use]
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.contains(user_id)
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Returns the invoking member's profile, creating it on first use.
pub async fn ensure_author(ctx: Context<'_>) -> Result<ProfileModel> {
    let author = ctx.author();
    profile::ensure_profile(&ctx.data().database, &author.id.to_string(), &author.name).await
}

/// Command check restricting a command to admins.
pub async fn admin_check(ctx: Context<'_>) -> Result<bool> {
    let allowed = ctx.data().is_admin(&ctx.author().id.to_string());
    if !allowed {
        warn!(user = %ctx.author().id, command = %ctx.command().qualified_name, "Rejected non-admin");
    }
    Ok(allowed)
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            let reply = if error.is_user_facing() {
                format!("❌ {error}")
            } else {
                error!(command = %ctx.command().qualified_name, "Command failed: {error:?}");
                "❌ Something went wrong. Please try again later.".to_string()
            };
            if let Err(e) = ctx.say(reply).await {
                error!("Failed to send error message: {e}");
            }
        }
        poise::FrameworkError::CommandCheckFailed { ctx, .. } => {
            if let Err(e) = ctx.say("❌ This command is reserved for admins.").await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the framework and runs the Discord client until it stops.
#[instrument(skip_all)]
pub async fn run_bot(
    token: String,
    config: Arc<AppConfig>,
    admins: HashSet<String>,
    database: DatabaseConnection,
) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(BotData::new(database, config, admins))
            })
        })
        .build();

    info!("Setting up Serenity client for Poise framework...");
    let mut client =
        serenity::ClientBuilder::new(&token, serenity::GatewayIntents::non_privileged())
            .framework(framework)
            .await?;

    info!("Starting bot client...");
    client.start().await.inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;
