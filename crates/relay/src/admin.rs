//! Registry mutations behind the admin commands, with the acknowledgement
//! text posted back in the invoking channel.
//!
//! Privilege checks belong to the command front-end; everything here assumes
//! the caller is allowed.

use std::sync::Arc;

use {guildlink_common::Snowflake, tracing::info};

use crate::{
    Result,
    audit::{AuditLevel, AuditSink},
    registry::Registry,
    session::GatewaySession,
};

pub struct GatewayAdmin {
    registry: Arc<Registry>,
    session: Arc<dyn GatewaySession>,
    audit: Arc<dyn AuditSink>,
}

impl GatewayAdmin {
    pub fn new(
        registry: Arc<Registry>,
        session: Arc<dyn GatewaySession>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            registry,
            session,
            audit,
        }
    }

    /// Make `channel_id` the guild's gateway channel.
    pub async fn register(&self, guild_id: Snowflake, channel_id: Snowflake) -> Result<String> {
        self.registry.set_gateway(guild_id, channel_id).await?;
        info!(%guild_id, %channel_id, "gateway registered");
        self.audit
            .log_event(
                &format!("Guild {guild_id} registered channel {channel_id} as its gateway"),
                AuditLevel::Info,
            )
            .await;
        Ok("✅ This channel is now connected to the global chat.".into())
    }

    /// Remove the guild from the relay.
    pub async fn deregister(&self, guild_id: Snowflake) -> Result<String> {
        if !self.registry.clear_gateway(guild_id).await? {
            return Ok("ℹ️ This guild was not registered for the global chat.".into());
        }
        info!(%guild_id, "gateway removed");
        self.audit
            .log_event(
                &format!("Guild {guild_id} left the global chat"),
                AuditLevel::Info,
            )
            .await;
        Ok("✅ Global chat removed for this guild.".into())
    }

    /// Every registration, with cached names or placeholders.
    pub async fn list(&self) -> String {
        let channels = self.registry.snapshot_channels().await;
        if channels.is_empty() {
            return "No global chat configured.".into();
        }

        let lines: Vec<String> = channels
            .iter()
            .map(|(guild_id, channel_id)| {
                let guild_name = guild_id
                    .parse::<Snowflake>()
                    .ok()
                    .and_then(|id| self.session.cached_guild_name(id))
                    .unwrap_or_else(|| format!("Guild not cached ({guild_id})"));
                let channel_name = self
                    .session
                    .cached_channel_name(*channel_id)
                    .unwrap_or_else(|| format!("Channel not cached ({channel_id})"));
                format!("- {guild_name} | #{channel_name} ({guild_id}/{channel_id})")
            })
            .collect();
        format!("**Connected:**\n{}", lines.join("\n"))
    }

    /// Mirror audit events into `channel_id`.
    pub async fn set_log_channel(
        &self,
        guild_id: Snowflake,
        channel_id: Snowflake,
    ) -> Result<String> {
        self.registry.set_log_target(guild_id, channel_id).await?;
        self.audit
            .log_event(
                &format!("Audit log channel set to {channel_id} in guild {guild_id}"),
                AuditLevel::Info,
            )
            .await;
        Ok("✅ Global chat log events will be posted in this channel.".into())
    }

    pub async fn clear_log_channel(&self) -> Result<String> {
        if self.registry.clear_log_target().await? {
            Ok("✅ Log channel removed.".into())
        } else {
            Ok("ℹ️ No log channel was configured.".into())
        }
    }

    pub async fn ban_word(&self, word: &str) -> Result<String> {
        let word = word.trim();
        if word.is_empty() {
            return Ok("Usage: banword <word>".into());
        }
        if self.registry.add_banned_word(word).await? {
            self.audit
                .log_event(&format!("Banned word added: {word}"), AuditLevel::Info)
                .await;
            Ok(format!("✅ `{word}` is now banned."))
        } else {
            Ok(format!("ℹ️ `{word}` was already banned."))
        }
    }

    pub async fn unban_word(&self, word: &str) -> Result<String> {
        let word = word.trim();
        if word.is_empty() {
            return Ok("Usage: unbanword <word>".into());
        }
        if self.registry.remove_banned_word(word).await? {
            self.audit
                .log_event(&format!("Banned word removed: {word}"), AuditLevel::Info)
                .await;
            Ok(format!("✅ `{word}` is no longer banned."))
        } else {
            Ok(format!("ℹ️ `{word}` was not banned."))
        }
    }

    pub async fn banned_words(&self) -> String {
        let words = self.registry.banned_words().await;
        if words.is_empty() {
            "No banned words configured.".into()
        } else {
            let list: Vec<String> = words.iter().map(|w| format!("`{w}`")).collect();
            format!("**Banned words:** {}", list.join(", "))
        }
    }
}
