//! Offline registry maintenance: edits the storage file through the same
//! `Registry` API the bot uses. Run these while the bot is stopped.

use std::sync::Arc;

use {
    anyhow::Result,
    clap::Subcommand,
    guildlink_common::Snowflake,
    guildlink_config::GuildlinkConfig,
    guildlink_relay::{AuditLevel, AuditLog, AuditSink, FileStore, Registry},
};

#[derive(Subcommand)]
pub enum GatewayAction {
    /// List registered gateway channels.
    List,
    /// Register (or move) a guild's gateway channel.
    Add {
        /// Guild id.
        guild: Snowflake,
        /// Channel id.
        channel: Snowflake,
    },
    /// Remove a guild from the relay.
    Remove {
        /// Guild id.
        guild: Snowflake,
    },
}

#[derive(Subcommand)]
pub enum BannedWordAction {
    /// List banned words.
    List,
    /// Ban a word.
    Add { word: String },
    /// Unban a word.
    Remove { word: String },
}

async fn open(config: &GuildlinkConfig) -> Result<Registry> {
    let store = Arc::new(FileStore::new(config.storage_path()));
    Ok(Registry::load(store).await?)
}

pub async fn handle_gateways(action: GatewayAction, config: &GuildlinkConfig) -> Result<()> {
    let registry = open(config).await?;
    let audit = AuditLog::new(config.audit_log_path());
    println!("{}", gateways(action, &registry, &audit).await?);
    Ok(())
}

pub async fn handle_banned_words(action: BannedWordAction, config: &GuildlinkConfig) -> Result<()> {
    let registry = open(config).await?;
    let audit = AuditLog::new(config.audit_log_path());
    println!("{}", banned_words(action, &registry, &audit).await?);
    Ok(())
}

async fn gateways(
    action: GatewayAction,
    registry: &Registry,
    audit: &dyn AuditSink,
) -> Result<String> {
    match action {
        GatewayAction::List => {
            let channels = registry.snapshot_channels().await;
            if channels.is_empty() {
                return Ok("No gateways registered.".into());
            }
            let lines: Vec<String> = channels
                .iter()
                .map(|(guild, channel)| format!("{guild}\t{channel}"))
                .collect();
            Ok(lines.join("\n"))
        },
        GatewayAction::Add { guild, channel } => {
            registry.set_gateway(guild, channel).await?;
            audit
                .log_event(
                    &format!("Guild {guild} registered channel {channel} as its gateway (offline)"),
                    AuditLevel::Info,
                )
                .await;
            Ok(format!("Registered guild {guild} -> channel {channel}."))
        },
        GatewayAction::Remove { guild } => {
            if registry.clear_gateway(guild).await? {
                audit
                    .log_event(
                        &format!("Guild {guild} left the global chat (offline)"),
                        AuditLevel::Info,
                    )
                    .await;
                Ok(format!("Removed guild {guild}."))
            } else {
                Ok(format!("Guild {guild} was not registered."))
            }
        },
    }
}

async fn banned_words(
    action: BannedWordAction,
    registry: &Registry,
    audit: &dyn AuditSink,
) -> Result<String> {
    match action {
        BannedWordAction::List => {
            let words = registry.banned_words().await;
            if words.is_empty() {
                Ok("No banned words configured.".into())
            } else {
                Ok(words.join("\n"))
            }
        },
        BannedWordAction::Add { word } => {
            let word = word.trim();
            if registry.add_banned_word(word).await? {
                audit
                    .log_event(&format!("Banned word added: {word} (offline)"), AuditLevel::Info)
                    .await;
                Ok(format!("Banned `{word}`."))
            } else {
                Ok(format!("`{word}` was already banned."))
            }
        },
        BannedWordAction::Remove { word } => {
            let word = word.trim();
            if registry.remove_banned_word(word).await? {
                audit
                    .log_event(
                        &format!("Banned word removed: {word} (offline)"),
                        AuditLevel::Info,
                    )
                    .await;
                Ok(format!("Unbanned `{word}`."))
            } else {
                Ok(format!("`{word}` was not banned."))
            }
        },
    }
}
