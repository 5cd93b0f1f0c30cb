//! Discord event handler for serenity.
//!
//! Routes guild messages to the command front-end or the relay, and feeds
//! edit/delete events to the audit path.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use {
    guildlink_common::Snowflake,
    guildlink_relay::{
        Author, ChannelHandle, DispatchOutcome, GatewayAdmin, GatewaySession, GlobalChat,
        MessageDeletion, MessageEdit, OutboundMessage,
    },
    serenity::{
        all::{
            ChannelId, Context, EventHandler, GatewayIntents, GuildId, Message, MessageId,
            MessageUpdateEvent, Ready,
        },
        async_trait,
    },
    tracing::{debug, error, info, warn},
};

use crate::{
    commands::{Command, GUILD_ONLY, NOT_ADMIN, help_text},
    convert,
    session::DiscordSession,
};

/// Author and text of recently seen guild messages. Deletion events carry
/// only ids, so this is what the deletion audit can show.
struct RecentMessages {
    capacity: usize,
    order: VecDeque<Snowflake>,
    entries: HashMap<Snowflake, (Author, String)>,
}

impl RecentMessages {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    fn insert(&mut self, id: Snowflake, author: Author, text: String) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(id, (author, text)).is_none() {
            self.order.push_back(id);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn get(&self, id: Snowflake) -> Option<(Author, String)> {
        self.entries.get(&id).cloned()
    }

    fn update_text(&mut self, id: Snowflake, text: String) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.1 = text;
        }
    }

    fn take(&mut self, id: Snowflake) -> Option<(Author, String)> {
        let entry = self.entries.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(entry)
    }
}

/// Handler for Discord gateway events.
pub struct GuildlinkHandler {
    chat: Arc<GlobalChat>,
    admin: GatewayAdmin,
    session: Arc<DiscordSession>,
    prefix: String,
    recent: Mutex<RecentMessages>,
}

impl GuildlinkHandler {
    pub fn new(
        chat: Arc<GlobalChat>,
        admin: GatewayAdmin,
        session: Arc<DiscordSession>,
        prefix: impl Into<String>,
        message_cache_size: usize,
    ) -> Self {
        Self {
            chat,
            admin,
            session,
            prefix: prefix.into(),
            recent: Mutex::new(RecentMessages::new(message_cache_size)),
        }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }

    fn recent(&self) -> MutexGuard<'_, RecentMessages> {
        self.recent.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn run_command(&self, ctx: &Context, msg: &Message, command: Command) {
        let reply = self.command_reply(ctx, msg, command).await;
        let channel = ChannelHandle {
            id: Snowflake::new(msg.channel_id.get()),
            name: String::new(),
        };
        if let Err(e) = self
            .session
            .send_message(&channel, OutboundMessage::text(reply))
            .await
        {
            warn!(channel_id = %msg.channel_id, error = %e, "failed to send command reply");
        }
    }

    async fn command_reply(&self, ctx: &Context, msg: &Message, command: Command) -> String {
        if command == Command::Help {
            return help_text(&self.prefix);
        }
        let Some(guild_id) = msg.guild_id else {
            return GUILD_ONLY.into();
        };
        if command.requires_admin() && !is_admin(ctx, msg) {
            debug!(user_id = %msg.author.id, ?command, "refused admin command");
            return NOT_ADMIN.into();
        }

        let guild = Snowflake::new(guild_id.get());
        let channel = Snowflake::new(msg.channel_id.get());
        info!(guild_id = %guild, user_id = %msg.author.id, ?command, "command");

        let result = match command {
            Command::SetGlobal => self.admin.register(guild, channel).await,
            Command::ClearGlobal => self.admin.deregister(guild).await,
            Command::GlobalInfo => Ok(self.admin.list().await),
            Command::SetLog => self.admin.set_log_channel(guild, channel).await,
            Command::ClearLog => self.admin.clear_log_channel().await,
            Command::BanWord(word) => self.admin.ban_word(&word).await,
            Command::UnbanWord(word) => self.admin.unban_word(&word).await,
            Command::BannedWords => Ok(self.admin.banned_words().await),
            Command::Help => Ok(help_text(&self.prefix)),
        };
        result.unwrap_or_else(|e| {
            error!(guild_id = %guild, error = %e, "command failed");
            format!("❌ Could not update the global chat settings: {e}")
        })
    }
}

fn is_admin(ctx: &Context, msg: &Message) -> bool {
    msg.author_permissions(&ctx.cache)
        .is_some_and(|p| p.administrator())
}

#[async_trait]
impl EventHandler for GuildlinkHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
    }

    async fn cache_ready(&self, _ctx: Context, guilds: Vec<GuildId>) {
        debug!(guild_count = guilds.len(), "discord cache ready");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages to prevent relay loops
        if msg.author.bot {
            return;
        }

        if let Some(command) = Command::parse(&self.prefix, &msg.content) {
            self.run_command(&ctx, &msg, command).await;
            return;
        }

        let inbound = convert::inbound_message(&ctx.cache, &msg);
        if inbound.guild.is_some() {
            self.recent()
                .insert(inbound.id, inbound.author.clone(), inbound.text.clone());
        }

        match self.chat.handle_message(inbound).await {
            DispatchOutcome::Ignored(reason) => {
                debug!(message_id = %msg.id, ?reason, "message not relayed");
            },
            DispatchOutcome::Rejected { word } => {
                info!(message_id = %msg.id, %word, "message rejected by moderation");
            },
            DispatchOutcome::Relayed(result) => {
                debug!(
                    message_id = %msg.id,
                    delivered = result.delivered,
                    pruned = result.pruned,
                    failed = result.failed,
                    "message relayed"
                );
            },
        }
    }

    async fn message_update(
        &self,
        ctx: Context,
        old_if_available: Option<Message>,
        _new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        let (Some(guild_id), Some(after)) = (event.guild_id, event.content.clone()) else {
            return;
        };
        let id = Snowflake::new(event.id.get());
        let recent = self.recent().get(id);

        let before = old_if_available
            .as_ref()
            .map(|m| m.content.clone())
            .or_else(|| recent.as_ref().map(|(_, text)| text.clone()));
        let author = event
            .author
            .as_ref()
            .map(|user| convert::author(user, None))
            .or_else(|| {
                old_if_available
                    .as_ref()
                    .map(|m| convert::author(&m.author, m.member.as_deref()))
            })
            .or_else(|| recent.map(|(author, _)| author));
        let Some(author) = author else {
            debug!(message_id = %event.id, "edit without a known author");
            return;
        };

        self.recent().update_text(id, after.clone());
        let edit = MessageEdit {
            guild: convert::guild_info(&ctx.cache, guild_id),
            channel_id: Snowflake::new(event.channel_id.get()),
            channel_name: convert::channel_name(&ctx.cache, event.channel_id),
            author,
            before,
            after,
        };
        self.chat.handle_edit(edit).await;
    }

    async fn message_delete(
        &self,
        ctx: Context,
        channel_id: ChannelId,
        deleted_message_id: MessageId,
        guild_id: Option<GuildId>,
    ) {
        let Some(guild_id) = guild_id else {
            return;
        };
        let message_id = Snowflake::new(deleted_message_id.get());
        let cached = self.recent().take(message_id);
        let deletion = MessageDeletion {
            guild: convert::guild_info(&ctx.cache, guild_id),
            channel_id: Snowflake::new(channel_id.get()),
            channel_name: convert::channel_name(&ctx.cache, channel_id),
            message_id,
            cached,
        };
        self.chat.handle_delete(deletion).await;
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn author(name: &str) -> Author {
        Author {
            id: Snowflake::new(1),
            display_name: name.into(),
            is_bot: false,
        }
    }

    #[test]
    fn recent_messages_evict_oldest() {
        let mut recent = RecentMessages::new(2);
        recent.insert(Snowflake::new(1), author("a"), "one".into());
        recent.insert(Snowflake::new(2), author("b"), "two".into());
        recent.insert(Snowflake::new(3), author("c"), "three".into());

        assert!(recent.get(Snowflake::new(1)).is_none());
        assert_eq!(recent.get(Snowflake::new(3)).unwrap().1, "three");
        assert_eq!(recent.order.len(), 2);
    }

    #[test]
    fn recent_messages_track_edits_and_deletes() {
        let mut recent = RecentMessages::new(10);
        recent.insert(Snowflake::new(1), author("a"), "helo".into());
        recent.update_text(Snowflake::new(1), "hello".into());

        let (who, text) = recent.take(Snowflake::new(1)).unwrap();
        assert_eq!(who.display_name, "a");
        assert_eq!(text, "hello");
        assert!(recent.take(Snowflake::new(1)).is_none());
        assert!(recent.order.is_empty());
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut recent = RecentMessages::new(0);
        recent.insert(Snowflake::new(1), author("a"), "x".into());
        assert!(recent.get(Snowflake::new(1)).is_none());
    }

    #[test]
    fn intents_cover_guild_messages() {
        let intents = GuildlinkHandler::intents();
        assert!(intents.contains(GatewayIntents::GUILD_MESSAGES));
        assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(!intents.contains(GatewayIntents::DIRECT_MESSAGES));
    }
}
