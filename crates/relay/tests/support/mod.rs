#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    bytes::Bytes,
    chrono::{TimeZone, Utc},
    guildlink_common::Snowflake,
    guildlink_relay::{
        Attachment, AttachmentRef, AuditLevel, AuditSink, Author, ChannelHandle, Error,
        GatewaySession, GuildInfo, InboundMessage, MemoryStore, MessageRef, Notice,
        OutboundMessage, Registry, RegistryDocument, Result,
    },
};

pub fn id(n: u64) -> Snowflake {
    Snowflake::new(n)
}

/// In-memory gateway session. Channels are live unless marked otherwise.
#[derive(Default)]
pub struct MockSession {
    guild_names: Mutex<HashMap<Snowflake, String>>,
    channel_names: Mutex<HashMap<Snowflake, String>>,
    missing: Mutex<HashSet<Snowflake>>,
    unreachable: Mutex<HashSet<Snowflake>>,
    failing: Mutex<HashSet<Snowflake>>,
    hanging: Mutex<HashSet<Snowflake>>,
    broken_attachments: Mutex<HashSet<String>>,
    send_delay: Mutex<Option<Duration>>,
    pub fail_delete: AtomicBool,
    pub hang_notices: AtomicBool,
    pub sent: Mutex<Vec<(Snowflake, OutboundMessage)>>,
    pub notices: Mutex<Vec<(Snowflake, Notice)>>,
    pub deleted: Mutex<Vec<MessageRef>>,
    pub resolved: Mutex<Vec<Snowflake>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn name_guild(&self, guild: u64, name: &str) {
        self.guild_names.lock().unwrap().insert(id(guild), name.into());
    }

    pub fn name_channel(&self, channel: u64, name: &str) {
        self.channel_names
            .lock()
            .unwrap()
            .insert(id(channel), name.into());
    }

    /// The channel was deleted or the bot lost access.
    pub fn remove_channel(&self, channel: u64) {
        self.missing.lock().unwrap().insert(id(channel));
    }

    /// Resolution fails with a transport error.
    pub fn make_unreachable(&self, channel: u64) {
        self.unreachable.lock().unwrap().insert(id(channel));
    }

    /// Sends to this channel fail.
    pub fn make_failing(&self, channel: u64) {
        self.failing.lock().unwrap().insert(id(channel));
    }

    /// Sends to this channel never complete.
    pub fn make_hanging(&self, channel: u64) {
        self.hanging.lock().unwrap().insert(id(channel));
    }

    pub fn break_attachment(&self, filename: &str) {
        self.broken_attachments
            .lock()
            .unwrap()
            .insert(filename.into());
    }

    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = Some(delay);
    }

    pub fn sent_to(&self) -> Vec<Snowflake> {
        self.sent.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    pub fn sent_messages(&self) -> Vec<(Snowflake, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn resolve_count(&self, channel: u64) -> usize {
        self.resolved
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == id(channel))
            .count()
    }
}

#[async_trait]
impl GatewaySession for MockSession {
    async fn resolve_channel(&self, channel_id: Snowflake) -> Result<Option<ChannelHandle>> {
        self.resolved.lock().unwrap().push(channel_id);
        if self.unreachable.lock().unwrap().contains(&channel_id) {
            return Err(Error::delivery(
                "resolve channel",
                std::io::Error::other("connection reset"),
            ));
        }
        if self.missing.lock().unwrap().contains(&channel_id) {
            return Ok(None);
        }
        let name = self
            .channel_names
            .lock()
            .unwrap()
            .get(&channel_id)
            .cloned()
            .unwrap_or_else(|| "global".into());
        Ok(Some(ChannelHandle { id: channel_id, name }))
    }

    async fn send_message(&self, channel: &ChannelHandle, message: OutboundMessage) -> Result<()> {
        let hangs = self.hanging.lock().unwrap().contains(&channel.id);
        if hangs {
            std::future::pending::<()>().await;
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(&channel.id) {
            return Err(Error::delivery(
                format!("send to {}", channel.id),
                std::io::Error::other("missing permissions"),
            ));
        }
        self.sent.lock().unwrap().push((channel.id, message));
        Ok(())
    }

    async fn send_notice(&self, channel: &ChannelHandle, notice: &Notice) -> Result<()> {
        if self.hang_notices.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.notices
            .lock()
            .unwrap()
            .push((channel.id, notice.clone()));
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<()> {
        self.deleted.lock().unwrap().push(*message);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::delivery(
                "delete message",
                std::io::Error::other("unknown message"),
            ));
        }
        Ok(())
    }

    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> Result<Attachment> {
        if self
            .broken_attachments
            .lock()
            .unwrap()
            .contains(&attachment.filename)
        {
            return Err(Error::delivery(
                "download attachment",
                std::io::Error::other("404"),
            ));
        }
        Ok(Attachment {
            filename: attachment.filename.clone(),
            data: Bytes::from(attachment.url.clone().into_bytes()),
        })
    }

    fn cached_guild_name(&self, guild_id: Snowflake) -> Option<String> {
        self.guild_names.lock().unwrap().get(&guild_id).cloned()
    }

    fn cached_channel_name(&self, channel_id: Snowflake) -> Option<String> {
        self.channel_names.lock().unwrap().get(&channel_id).cloned()
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    pub events: Mutex<Vec<(AuditLevel, String)>>,
}

impl RecordingAudit {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(AuditLevel, String)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, level: AuditLevel) -> usize {
        self.events().iter().filter(|(l, _)| *l == level).count()
    }
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn log_event(&self, message: &str, level: AuditLevel) {
        self.events.lock().unwrap().push((level, message.to_string()));
    }
}

/// Registry seeded with `(guild, channel)` pairs and banned words.
pub async fn registry(
    gateways: &[(u64, u64)],
    banned: &[&str],
) -> (Arc<MemoryStore>, Arc<Registry>) {
    let mut doc = RegistryDocument::default();
    for (guild, channel) in gateways {
        doc.channels.insert(guild.to_string(), id(*channel));
    }
    doc.banned_words = banned.iter().map(|w| (*w).to_string()).collect();
    let store = Arc::new(MemoryStore::with_document(doc));
    let registry = Arc::new(Registry::load(store.clone()).await.unwrap());
    (store, registry)
}

pub fn inbound(guild: u64, channel: u64, text: &str) -> InboundMessage {
    InboundMessage {
        id: id(guild * 1000 + channel),
        author: Author {
            id: id(7),
            display_name: "alice".into(),
            is_bot: false,
        },
        guild: Some(GuildInfo {
            id: id(guild),
            name: format!("Guild {guild}"),
        }),
        channel_id: id(channel),
        channel_name: "global".into(),
        text: text.into(),
        attachments: Vec::new(),
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    }
}

pub fn gateways(registry_doc: &RegistryDocument) -> Vec<(String, u64)> {
    registry_doc
        .channels
        .iter()
        .map(|(g, c)| (g.clone(), c.get()))
        .collect()
}
