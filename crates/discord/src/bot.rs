use std::{sync::Arc, time::Duration};

use {
    guildlink_config::GuildlinkConfig,
    guildlink_relay::{AuditLog, AuditSink, FileStore, GatewayAdmin, GlobalChat, Registry},
    secrecy::ExposeSecret,
    serenity::{all::Client, cache::Settings as CacheSettings},
    tracing::{info, warn},
};

use crate::{
    Error, Result,
    handler::GuildlinkHandler,
    session::DiscordSession,
};

/// Connect to Discord and relay until the gateway closes or Ctrl-C.
///
/// A corrupt registry document aborts startup.
pub async fn run(config: &GuildlinkConfig) -> Result<()> {
    let token = config.discord.token.expose_secret();
    if token.trim().is_empty() {
        return Err(Error::message(
            "discord token is not configured (set GUILDLINK_TOKEN or discord.token)",
        ));
    }

    let storage_path = config.storage_path();
    info!(path = %storage_path.display(), "opening registry");
    let registry = Arc::new(Registry::load(Arc::new(FileStore::new(&storage_path))).await?);

    let session = Arc::new(DiscordSession::new());
    let delivery_timeout = Duration::from_secs(config.relay.delivery_timeout_secs);
    let mut audit_log = AuditLog::new(config.audit_log_path());
    if config.audit.mirror_to_channel {
        audit_log = audit_log
            .with_mirror(Arc::clone(&registry), session.clone())
            .with_mirror_timeout(delivery_timeout);
    }
    let audit: Arc<dyn AuditSink> = Arc::new(audit_log);

    let chat = Arc::new(GlobalChat::new(
        Arc::clone(&registry),
        session.clone(),
        Arc::clone(&audit),
        delivery_timeout,
    ));
    let admin = GatewayAdmin::new(registry, session.clone(), audit);
    let handler = GuildlinkHandler::new(
        chat,
        admin,
        Arc::clone(&session),
        config.discord.command_prefix.clone(),
        config.discord.message_cache_size,
    );

    let mut cache_settings = CacheSettings::default();
    cache_settings.max_messages = config.discord.message_cache_size;

    let mut client = Client::builder(token, GuildlinkHandler::intents())
        .event_handler(handler)
        .cache_settings(cache_settings)
        .await?;
    session.attach(Arc::clone(&client.http), Arc::clone(&client.cache));

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("shutting down discord shards");
        shard_manager.shutdown_all().await;
    });

    info!("starting discord gateway");
    client.start().await?;
    info!("discord gateway stopped");
    Ok(())
}
