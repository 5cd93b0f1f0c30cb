use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    guildlink_common::Snowflake,
};

use crate::{
    Result,
    message::{Attachment, AttachmentRef, MessageRef},
};

/// A live channel handle returned by [`GatewaySession::resolve_channel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub id: Snowflake,
    pub name: String,
}

/// Which mentions in an outbound message may ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MentionPolicy {
    pub users: bool,
    pub roles: bool,
    pub everyone: bool,
}

impl MentionPolicy {
    /// Relayed messages keep user pings; role, `@everyone` and `@here`
    /// mentions never ping across guilds.
    pub const RELAY: Self = Self {
        users: true,
        roles: false,
        everyone: false,
    };

    /// Nothing pings.
    pub const NONE: Self = Self {
        users: false,
        roles: false,
        everyone: false,
    };
}

/// One outbound message to a single channel. Built fresh per target.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub mentions: MentionPolicy,
}

impl OutboundMessage {
    /// Plain text with no attachments and no pings.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachments: Vec::new(),
            mentions: MentionPolicy::NONE,
        }
    }
}

/// A formatted notice (audit mirror): title, body, footer subtitle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub footer: String,
    pub timestamp: DateTime<Utc>,
}

/// Platform session capabilities consumed by the relay core.
///
/// The platform adapter provides the concrete implementation.
#[async_trait]
pub trait GatewaySession: Send + Sync {
    /// Resolve a channel ID to a live handle.
    ///
    /// `Ok(None)` means the channel is gone or the bot lost access to it;
    /// `Err` is reserved for transport failures where the channel may still
    /// exist.
    async fn resolve_channel(&self, channel_id: Snowflake) -> Result<Option<ChannelHandle>>;

    /// Send a message to a resolved channel.
    async fn send_message(&self, channel: &ChannelHandle, message: OutboundMessage) -> Result<()>;

    /// Send a formatted notice to a resolved channel.
    async fn send_notice(&self, channel: &ChannelHandle, notice: &Notice) -> Result<()>;

    /// Delete a message.
    async fn delete_message(&self, message: &MessageRef) -> Result<()>;

    /// Download an attachment from the origin message.
    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> Result<Attachment>;

    /// Guild name from the session cache, without network calls.
    fn cached_guild_name(&self, guild_id: Snowflake) -> Option<String>;

    /// Channel name from the session cache, without network calls.
    fn cached_channel_name(&self, channel_id: Snowflake) -> Option<String>;
}
