//! `GatewaySession` backed by serenity's HTTP client and cache.

use std::sync::{Arc, OnceLock};

use {
    async_trait::async_trait,
    guildlink_common::Snowflake,
    guildlink_relay::{
        Attachment, AttachmentRef, ChannelHandle, Error, GatewaySession, MentionPolicy,
        MessageRef, Notice, OutboundMessage, Result,
    },
    serenity::{
        all::{Cache, Channel, Http, Timestamp},
        builder::{
            CreateAllowedMentions, CreateAttachment, CreateEmbed, CreateEmbedFooter,
            CreateMessage,
        },
    },
    tracing::{debug, warn},
};

use crate::convert::{channel_id, guild_id, message_id};

/// Discord's maximum message content length in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Discord's maximum embed description length in characters.
pub const MAX_EMBED_DESCRIPTION_LEN: usize = 4096;

const NOTICE_COLOUR: u32 = 0x3498DB;

/// Truncate `text` to at most `max` characters, on a char boundary.
pub fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Split `text` into pieces of at most `max` characters, preferring to break
/// at a newline, then a space. The separator a piece is split on is dropped.
pub fn chunk_message(text: &str, max: usize) -> Vec<&str> {
    if max == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut remaining = text;
    while let Some((window_end, _)) = remaining.char_indices().nth(max) {
        let window = &remaining[..window_end];
        match window.rfind('\n').or_else(|| window.rfind(' ')) {
            Some(split_at) if split_at > 0 => {
                chunks.push(&remaining[..split_at]);
                remaining = &remaining[split_at + 1..];
            },
            _ => {
                chunks.push(window);
                remaining = &remaining[window_end..];
            },
        }
    }
    if !remaining.is_empty() || chunks.is_empty() {
        chunks.push(remaining);
    }
    chunks
}

fn allowed_mentions(policy: MentionPolicy) -> CreateAllowedMentions {
    CreateAllowedMentions::new()
        .all_users(policy.users)
        .all_roles(policy.roles)
        .everyone(policy.everyone)
}

/// The channel was deleted or the bot can no longer see it.
fn is_gone(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(http) => http
            .status_code()
            .is_some_and(|status| matches!(status.as_u16(), 403 | 404)),
        _ => false,
    }
}

struct Handles {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

/// Discord session shared by the relay core and the event handler.
///
/// Created before the serenity client exists; [`DiscordSession::attach`] hands
/// it the client's HTTP and cache handles before the gateway starts.
pub struct DiscordSession {
    handles: OnceLock<Handles>,
    downloads: reqwest::Client,
}

impl Default for DiscordSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscordSession {
    pub fn new() -> Self {
        Self {
            handles: OnceLock::new(),
            downloads: reqwest::Client::new(),
        }
    }

    pub fn attach(&self, http: Arc<Http>, cache: Arc<Cache>) {
        if self.handles.set(Handles { http, cache }).is_err() {
            warn!("discord session already attached; ignoring");
        }
    }

    fn handles(&self) -> Result<&Handles> {
        self.handles.get().ok_or_else(|| {
            Error::delivery(
                "discord session",
                std::io::Error::new(std::io::ErrorKind::NotConnected, "client not started"),
            )
        })
    }

    fn cache(&self) -> Option<&Cache> {
        self.handles.get().map(|h| h.cache.as_ref())
    }
}

#[async_trait]
impl GatewaySession for DiscordSession {
    async fn resolve_channel(&self, id: Snowflake) -> Result<Option<ChannelHandle>> {
        let Some(channel) = channel_id(id) else {
            return Ok(None);
        };
        let handles = self.handles()?;

        if let Some(cached) = handles.cache.channel(channel) {
            return Ok(Some(ChannelHandle {
                id,
                name: cached.name.clone(),
            }));
        }

        match handles.http.get_channel(channel).await {
            Ok(Channel::Guild(channel)) => Ok(Some(ChannelHandle {
                id,
                name: channel.name,
            })),
            Ok(_) => {
                debug!(channel_id = %id, "not a guild channel");
                Ok(None)
            },
            Err(e) if is_gone(&e) => {
                debug!(channel_id = %id, error = %e, "channel is gone");
                Ok(None)
            },
            Err(e) => Err(Error::delivery(format!("resolve channel {id}"), e)),
        }
    }

    async fn send_message(&self, channel: &ChannelHandle, message: OutboundMessage) -> Result<()> {
        let Some(target) = channel_id(channel.id) else {
            return Err(Error::invalid_input("channel id 0"));
        };
        let handles = self.handles()?;

        // Long content goes out as several messages; attachments ride on the last.
        let chunks = chunk_message(&message.content, MAX_MESSAGE_LEN);
        let last = chunks.len().saturating_sub(1);
        if last > 0 {
            debug!(channel_id = %channel.id, parts = chunks.len(), "splitting long message");
        }
        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut builder = CreateMessage::new()
                .content(chunk)
                .allowed_mentions(allowed_mentions(message.mentions));
            if i == last {
                let files: Vec<CreateAttachment> = message
                    .attachments
                    .iter()
                    .map(|a| CreateAttachment::bytes(a.data.to_vec(), a.filename.clone()))
                    .collect();
                builder = builder.add_files(files);
            }
            target
                .send_message(&*handles.http, builder)
                .await
                .map_err(|e| Error::delivery(format!("send to channel {}", channel.id), e))?;
        }
        Ok(())
    }

    async fn send_notice(&self, channel: &ChannelHandle, notice: &Notice) -> Result<()> {
        let Some(target) = channel_id(channel.id) else {
            return Err(Error::invalid_input("channel id 0"));
        };
        let handles = self.handles()?;

        let mut embed = CreateEmbed::new()
            .title(&notice.title)
            .description(truncate(&notice.description, MAX_EMBED_DESCRIPTION_LEN))
            .footer(CreateEmbedFooter::new(&notice.footer))
            .colour(NOTICE_COLOUR);
        if let Ok(timestamp) = Timestamp::from_unix_timestamp(notice.timestamp.timestamp()) {
            embed = embed.timestamp(timestamp);
        }
        let builder = CreateMessage::new()
            .embed(embed)
            .allowed_mentions(allowed_mentions(MentionPolicy::NONE));

        target
            .send_message(&*handles.http, builder)
            .await
            .map_err(|e| Error::delivery(format!("send notice to channel {}", channel.id), e))?;
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<()> {
        let target = (
            channel_id(message.channel_id),
            message_id(message.message_id),
        );
        let (Some(channel), Some(id)) = target else {
            return Err(Error::invalid_input("message reference contains id 0"));
        };
        let handles = self.handles()?;
        channel
            .delete_message(&*handles.http, id)
            .await
            .map_err(|e| Error::delivery(format!("delete message {}", message.message_id), e))
    }

    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> Result<Attachment> {
        let context = || format!("download attachment {}", attachment.filename);
        let response = self
            .downloads
            .get(&attachment.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::delivery(context(), e))?;
        let data = response
            .bytes()
            .await
            .map_err(|e| Error::delivery(context(), e))?;
        Ok(Attachment {
            filename: attachment.filename.clone(),
            data,
        })
    }

    fn cached_guild_name(&self, id: Snowflake) -> Option<String> {
        let guild = guild_id(id)?;
        self.cache()?.guild(guild).map(|g| g.name.clone())
    }

    fn cached_channel_name(&self, id: Snowflake) -> Option<String> {
        let channel = channel_id(id)?;
        self.cache()?.channel(channel).map(|c| c.name.clone())
    }
}
