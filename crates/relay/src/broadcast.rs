//! Fan-out of accepted messages to every other registered gateway channel.

use std::{sync::Arc, time::Duration};

use {
    guildlink_common::Snowflake,
    serde::Serialize,
    tokio::sync::Mutex,
    tracing::{debug, info},
};

use crate::{
    Error,
    audit::{AuditLevel, AuditSink},
    format::relay_payload,
    message::RelayMessage,
    registry::Registry,
    session::{GatewaySession, MentionPolicy, OutboundMessage},
};

/// Default deadline for a single delivery attempt.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-pass delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelayResult {
    pub delivered: usize,
    pub skipped_origin: usize,
    pub pruned: usize,
    pub failed: usize,
}

impl RelayResult {
    /// Delivery attempts made (everything except the origin).
    pub fn attempted(&self) -> usize {
        self.delivered + self.pruned + self.failed
    }
}

enum Outcome {
    Delivered,
    Pruned,
    Failed,
}

/// Serialized fan-out engine. At most one pass runs at a time.
pub struct BroadcastEngine {
    registry: Arc<Registry>,
    session: Arc<dyn GatewaySession>,
    audit: Arc<dyn AuditSink>,
    delivery_timeout: Duration,
    pass: Mutex<()>,
}

impl BroadcastEngine {
    pub fn new(
        registry: Arc<Registry>,
        session: Arc<dyn GatewaySession>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            registry,
            session,
            audit,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            pass: Mutex::new(()),
        }
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Deliver `message` to every registered gateway channel except the
    /// origin guild's.
    ///
    /// Per-target failures never escape: they are counted, audited, and the
    /// pass moves on. Targets whose channel no longer resolves are removed
    /// from the registry.
    pub async fn relay(&self, message: &RelayMessage) -> RelayResult {
        let _pass = self.pass.lock().await;

        let targets = self.registry.snapshot_channels().await;
        let origin = message.origin.guild_id.to_string();
        let content = relay_payload(message);
        let mut result = RelayResult::default();

        for (guild_id, channel_id) in targets {
            if guild_id == origin {
                result.skipped_origin += 1;
                continue;
            }
            match self
                .deliver(message, &content, &guild_id, channel_id)
                .await
            {
                Outcome::Delivered => result.delivered += 1,
                Outcome::Pruned => result.pruned += 1,
                Outcome::Failed => result.failed += 1,
            }
        }

        info!(
            origin_guild = %message.origin.guild_id,
            message_id = %message.id,
            delivered = result.delivered,
            pruned = result.pruned,
            failed = result.failed,
            "relay pass complete"
        );
        result
    }

    async fn deliver(
        &self,
        message: &RelayMessage,
        content: &str,
        guild_id: &str,
        channel_id: Snowflake,
    ) -> Outcome {
        let origin = message.origin.guild_id;

        let resolved = self
            .with_deadline(self.session.resolve_channel(channel_id))
            .await;
        let channel = match resolved {
            Ok(Some(channel)) => channel,
            Ok(None) => return self.prune(origin, guild_id, channel_id).await,
            Err(e) => return self.fail(origin, guild_id, &e).await,
        };

        let outbound = OutboundMessage {
            content: content.to_string(),
            attachments: message.attachments.clone(),
            mentions: MentionPolicy::RELAY,
        };
        match self
            .with_deadline(self.session.send_message(&channel, outbound))
            .await
        {
            Ok(()) => {
                debug!(target_guild = guild_id, %channel_id, "delivered");
                Outcome::Delivered
            },
            Err(e) => self.fail(origin, guild_id, &e).await,
        }
    }

    async fn prune(&self, origin: Snowflake, guild_id: &str, channel_id: Snowflake) -> Outcome {
        let stale = Error::StaleTarget {
            guild_id: guild_id.to_string(),
            channel_id,
        };
        match self.registry.clear_gateway(guild_id).await {
            Ok(_) => {
                self.audit
                    .log_event(
                        &format!("{stale}; removed guild {guild_id} from global chat"),
                        AuditLevel::Warn,
                    )
                    .await;
                Outcome::Pruned
            },
            Err(e) => {
                self.audit
                    .log_event(
                        &format!(
                            "{stale}; failed to remove it while relaying from {origin}: {e}"
                        ),
                        AuditLevel::Error,
                    )
                    .await;
                Outcome::Failed
            },
        }
    }

    async fn fail(&self, origin: Snowflake, guild_id: &str, error: &Error) -> Outcome {
        self.audit
            .log_event(
                &format!("Failed to relay message from {origin} to {guild_id}: {error}"),
                AuditLevel::Error,
            )
            .await;
        Outcome::Failed
    }

    async fn with_deadline<T>(
        &self,
        fut: impl Future<Output = crate::Result<T>>,
    ) -> crate::Result<T> {
        tokio::time::timeout(self.delivery_timeout, fut)
            .await
            .unwrap_or(Err(Error::Timeout(self.delivery_timeout)))
    }
}
