use {
    bytes::Bytes,
    chrono::{DateTime, Utc},
    guildlink_common::Snowflake,
};

/// Who wrote a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: Snowflake,
    pub display_name: String,
    pub is_bot: bool,
}

/// Guild and channel a relayed message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub guild_id: Snowflake,
    pub guild_name: String,
    pub channel_id: Snowflake,
    pub channel_name: String,
}

/// Location of a single platform message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
}

/// An attachment on an inbound message, not yet downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub filename: String,
    pub url: String,
}

/// A downloaded attachment. `Bytes` clones share the buffer, so every target
/// gets its own upload without copying the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Bytes,
}

/// A message event as the gateway session delivers it.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: Snowflake,
    pub author: Author,
    /// `None` for direct messages.
    pub guild: Option<GuildInfo>,
    pub channel_id: Snowflake,
    pub channel_name: String,
    pub text: String,
    pub attachments: Vec<AttachmentRef>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: Snowflake,
    pub name: String,
}

impl InboundMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            channel_id: self.channel_id,
            message_id: self.id,
        }
    }
}

/// A message accepted by the gate, with attachments fetched, ready for
/// fan-out. Never persisted.
#[derive(Debug, Clone)]
pub struct RelayMessage {
    pub id: Snowflake,
    pub author: Author,
    pub origin: Origin,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

/// An edit observed in a guild channel.
#[derive(Debug, Clone)]
pub struct MessageEdit {
    pub guild: GuildInfo,
    pub channel_id: Snowflake,
    pub channel_name: String,
    pub author: Author,
    /// Previous content, when the message was cached.
    pub before: Option<String>,
    pub after: String,
}

/// A deletion observed in a guild channel.
#[derive(Debug, Clone)]
pub struct MessageDeletion {
    pub guild: GuildInfo,
    pub channel_id: Snowflake,
    pub channel_name: String,
    pub message_id: Snowflake,
    /// Author and content, when the message was cached.
    pub cached: Option<(Author, String)>,
}
