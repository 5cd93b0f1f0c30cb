//! Guild -> gateway channel registry.
//!
//! The persisted [`RegistryDocument`] is the single source of truth. The
//! in-memory copy is hydrated once by [`Registry::load`]; every mutation is
//! persisted whole before it replaces the in-memory copy, so a failed write
//! leaves both sides unchanged.

use std::{collections::BTreeMap, fmt::Display, sync::Arc};

use {
    guildlink_common::Snowflake,
    serde::{Deserialize, Serialize},
    tokio::sync::Mutex,
    tracing::{debug, info},
};

use crate::{Result, store::RegistryStore};

/// Where audit events are mirrored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
}

impl LogTarget {
    /// Both IDs, when fully configured.
    pub fn resolved(&self) -> Option<(Snowflake, Snowflake)> {
        Some((self.guild_id?, self.channel_id?))
    }
}

/// The persisted registry aggregate.
///
/// Missing fields load as empty. Legacy key names (`global_channels`,
/// `banned_words`) are accepted, and unknown top-level keys are carried
/// through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryDocument {
    /// Guild ID (string key) -> gateway channel ID.
    #[serde(alias = "global_channels")]
    pub channels: BTreeMap<String, Snowflake>,
    /// Reserved: persisted but not consulted by the relay path.
    pub blacklist: Vec<Snowflake>,
    /// Case-insensitive substrings, in insertion order.
    #[serde(rename = "bannedWords", alias = "banned_words")]
    pub banned_words: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<LogTarget>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Owned registry: the persisted document plus its in-memory cache.
pub struct Registry {
    store: Arc<dyn RegistryStore>,
    doc: Mutex<RegistryDocument>,
}

impl Registry {
    /// Read persisted state (creating an empty document if none exists).
    ///
    /// A corrupt document is returned as [`crate::Error::StorageCorrupt`].
    pub async fn load(store: Arc<dyn RegistryStore>) -> Result<Self> {
        let doc = store.load().await?;
        info!(
            gateways = doc.channels.len(),
            banned_words = doc.banned_words.len(),
            "registry loaded"
        );
        Ok(Self {
            store,
            doc: Mutex::new(doc),
        })
    }

    /// A copy of the whole document.
    pub async fn document(&self) -> RegistryDocument {
        self.doc.lock().await.clone()
    }

    /// Overwrite the persisted state with `doc`.
    pub async fn save(&self, doc: RegistryDocument) -> Result<()> {
        let mut current = self.doc.lock().await;
        self.store.save(&doc).await?;
        *current = doc;
        Ok(())
    }

    /// Apply `f` to a copy of the document and persist it if `f` reports a
    /// change. The lock is held across the write so concurrent mutations never
    /// lose each other's updates.
    async fn mutate<T>(&self, f: impl FnOnce(&mut RegistryDocument) -> (bool, T)) -> Result<T> {
        let mut current = self.doc.lock().await;
        let mut next = current.clone();
        let (changed, out) = f(&mut next);
        if changed {
            self.store.save(&next).await?;
            *current = next;
        }
        Ok(out)
    }

    /// Register (or move) a guild's gateway channel.
    pub async fn set_gateway(&self, guild_id: impl Display, channel_id: Snowflake) -> Result<()> {
        let key = guild_id.to_string();
        debug!(guild_id = %key, %channel_id, "setting gateway");
        self.mutate(|doc| {
            doc.channels.insert(key, channel_id);
            (true, ())
        })
        .await
    }

    /// Remove a guild's gateway. Returns whether an entry was removed.
    pub async fn clear_gateway(&self, guild_id: impl Display) -> Result<bool> {
        let key = guild_id.to_string();
        self.mutate(|doc| {
            let removed = doc.channels.remove(&key).is_some();
            (removed, removed)
        })
        .await
    }

    pub async fn is_gateway_configured(&self, guild_id: impl Display) -> bool {
        self.doc
            .lock()
            .await
            .channels
            .contains_key(&guild_id.to_string())
    }

    /// The gateway channel registered for a guild.
    pub async fn gateway_channel(&self, guild_id: impl Display) -> Option<Snowflake> {
        self.doc
            .lock()
            .await
            .channels
            .get(&guild_id.to_string())
            .copied()
    }

    /// A copy of the guild -> channel mapping, safe to iterate while the
    /// registry is mutated.
    pub async fn snapshot_channels(&self) -> BTreeMap<String, Snowflake> {
        self.doc.lock().await.channels.clone()
    }

    pub async fn banned_words(&self) -> Vec<String> {
        self.doc.lock().await.banned_words.clone()
    }

    /// Add a banned word. Returns `false` if it was already present
    /// (case-insensitively).
    pub async fn add_banned_word(&self, word: &str) -> Result<bool> {
        let word = word.trim();
        if word.is_empty() {
            return Err(crate::Error::invalid_input("banned word must not be empty"));
        }
        let lower = word.to_lowercase();
        self.mutate(|doc| {
            if doc.banned_words.iter().any(|w| w.to_lowercase() == lower) {
                return (false, false);
            }
            doc.banned_words.push(word.to_string());
            (true, true)
        })
        .await
    }

    /// Remove a banned word (case-insensitive). Returns whether it was present.
    pub async fn remove_banned_word(&self, word: &str) -> Result<bool> {
        let lower = word.trim().to_lowercase();
        self.mutate(|doc| {
            let before = doc.banned_words.len();
            doc.banned_words.retain(|w| w.to_lowercase() != lower);
            let removed = doc.banned_words.len() != before;
            (removed, removed)
        })
        .await
    }

    /// Fully configured audit mirror target, if any.
    pub async fn log_target(&self) -> Option<(Snowflake, Snowflake)> {
        self.doc.lock().await.log.and_then(|l| l.resolved())
    }

    pub async fn set_log_target(&self, guild_id: Snowflake, channel_id: Snowflake) -> Result<()> {
        self.mutate(|doc| {
            doc.log = Some(LogTarget {
                guild_id: Some(guild_id),
                channel_id: Some(channel_id),
            });
            (true, ())
        })
        .await
    }

    /// Remove the audit mirror target. Returns whether one was set.
    pub async fn clear_log_target(&self) -> Result<bool> {
        self.mutate(|doc| {
            let had = doc.log.take().is_some();
            (had, had)
        })
        .await
    }

    /// Reserved identifiers; not consulted by the relay path.
    pub async fn blacklist(&self) -> Vec<Snowflake> {
        self.doc.lock().await.blacklist.clone()
    }
}
