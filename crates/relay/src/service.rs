//! Inbound message dispatch: opt-in check, moderation gate, then fan-out.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    guildlink_common::Snowflake,
    tracing::{debug, warn},
};

use crate::{
    audit::{AuditLevel, AuditSink},
    broadcast::{BroadcastEngine, RelayResult},
    gate::{self, GateDecision},
    message::{InboundMessage, MessageDeletion, MessageEdit, Origin, RelayMessage},
    registry::Registry,
    session::GatewaySession,
};

/// Why an inbound message was not relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    FromBot,
    DirectMessage,
    /// The guild has no gateway registered.
    NotRegistered,
    /// The guild is registered but the message is in another channel.
    NotGatewayChannel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    /// Matched a banned word; deletion was attempted and nothing was relayed.
    Rejected { word: String },
    Relayed(RelayResult),
}

/// Messages removed by the gate are remembered so their deletion events are
/// not audited a second time.
const MODERATED_MEMORY: usize = 256;

/// The global chat service wired to one gateway session.
pub struct GlobalChat {
    registry: Arc<Registry>,
    session: Arc<dyn GatewaySession>,
    audit: Arc<dyn AuditSink>,
    engine: BroadcastEngine,
    moderated: Mutex<VecDeque<Snowflake>>,
}

impl GlobalChat {
    pub fn new(
        registry: Arc<Registry>,
        session: Arc<dyn GatewaySession>,
        audit: Arc<dyn AuditSink>,
        delivery_timeout: Duration,
    ) -> Self {
        let engine = BroadcastEngine::new(
            Arc::clone(&registry),
            Arc::clone(&session),
            Arc::clone(&audit),
        )
        .with_delivery_timeout(delivery_timeout);
        Self {
            registry,
            session,
            audit,
            engine,
            moderated: Mutex::new(VecDeque::new()),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Handle one inbound message event.
    pub async fn handle_message(&self, message: InboundMessage) -> DispatchOutcome {
        if message.author.is_bot {
            return DispatchOutcome::Ignored(IgnoreReason::FromBot);
        }
        let Some(guild) = message.guild.clone() else {
            return DispatchOutcome::Ignored(IgnoreReason::DirectMessage);
        };
        match self.registry.gateway_channel(guild.id).await {
            None => return DispatchOutcome::Ignored(IgnoreReason::NotRegistered),
            Some(channel_id) if channel_id != message.channel_id => {
                return DispatchOutcome::Ignored(IgnoreReason::NotGatewayChannel);
            },
            Some(_) => {},
        }

        let banned = self.registry.banned_words().await;
        if let GateDecision::Reject(word) = gate::evaluate(&message.text, &banned) {
            self.remember_moderated(message.id);
            if let Err(e) = self.session.delete_message(&message.message_ref()).await {
                debug!(message_id = %message.id, error = %e, "could not delete rejected message");
            }
            self.audit
                .log_event(
                    &format!(
                        "Deleted message in {} ({}) #{} ({}) due to banned word: {word}",
                        guild.name, guild.id, message.channel_name, message.channel_id
                    ),
                    AuditLevel::Warn,
                )
                .await;
            return DispatchOutcome::Rejected { word };
        }

        let mut attachments = Vec::with_capacity(message.attachments.len());
        for attachment in &message.attachments {
            match self.session.fetch_attachment(attachment).await {
                Ok(fetched) => attachments.push(fetched),
                Err(e) => {
                    warn!(filename = %attachment.filename, error = %e, "skipping attachment");
                },
            }
        }

        let relay = RelayMessage {
            id: message.id,
            author: message.author,
            origin: Origin {
                guild_id: guild.id,
                guild_name: guild.name,
                channel_id: message.channel_id,
                channel_name: message.channel_name,
            },
            text: message.text,
            attachments,
            created_at: message.created_at,
        };
        DispatchOutcome::Relayed(self.engine.relay(&relay).await)
    }

    /// Audit an edit in a gateway channel. Returns whether an event was
    /// emitted.
    pub async fn handle_edit(&self, edit: MessageEdit) -> bool {
        if edit.author.is_bot || !self.is_gateway(edit.guild.id, edit.channel_id).await {
            return false;
        }
        if edit.before.as_deref() == Some(edit.after.as_str()) {
            return false;
        }
        let before = edit.before.as_deref().unwrap_or("(not cached)");
        self.audit
            .log_event(
                &format!(
                    "Message edited in {}#{} by {}: '{before}' -> '{}'",
                    edit.guild.name, edit.channel_name, edit.author.display_name, edit.after
                ),
                AuditLevel::Info,
            )
            .await;
        true
    }

    /// Audit a deletion in a gateway channel. Returns whether an event was
    /// emitted.
    pub async fn handle_delete(&self, deletion: MessageDeletion) -> bool {
        if self.take_moderated(deletion.message_id)
            || !self.is_gateway(deletion.guild.id, deletion.channel_id).await
        {
            return false;
        }
        let text = match &deletion.cached {
            Some((author, _)) if author.is_bot => return false,
            Some((author, content)) => format!(
                "Message deleted in {}#{} by {}: {content}",
                deletion.guild.name, deletion.channel_name, author.display_name
            ),
            None => format!(
                "Message {} deleted in {}#{} (not cached)",
                deletion.message_id, deletion.guild.name, deletion.channel_name
            ),
        };
        self.audit.log_event(&text, AuditLevel::Warn).await;
        true
    }

    fn remember_moderated(&self, message_id: Snowflake) {
        let mut moderated = self.moderated.lock().unwrap_or_else(|e| e.into_inner());
        if moderated.len() == MODERATED_MEMORY {
            moderated.pop_front();
        }
        moderated.push_back(message_id);
    }

    fn take_moderated(&self, message_id: Snowflake) -> bool {
        let mut moderated = self.moderated.lock().unwrap_or_else(|e| e.into_inner());
        match moderated.iter().position(|id| *id == message_id) {
            Some(pos) => {
                moderated.remove(pos);
                true
            },
            None => false,
        }
    }

    async fn is_gateway(&self, guild_id: Snowflake, channel_id: Snowflake) -> bool {
        self.registry.gateway_channel(guild_id).await == Some(channel_id)
    }
}
