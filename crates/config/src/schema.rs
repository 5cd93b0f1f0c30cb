//! Config schema types (discord session, storage, audit, relay).

use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildlinkConfig {
    /// Base directory for the registry document and audit log. Defaults to the
    /// platform data directory.
    pub data_dir: Option<PathBuf>,
    pub discord: DiscordConfig,
    pub storage: StorageConfig,
    pub audit: AuditConfig,
    pub relay: RelayConfig,
}

impl GuildlinkConfig {
    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Resolved path of the registry document.
    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| self.data_dir().join("storage.json"))
    }

    /// Resolved path of the append-only audit log.
    pub fn audit_log_path(&self) -> PathBuf {
        self.audit
            .file_path
            .clone()
            .unwrap_or_else(|| self.data_dir().join("logs").join("globalchat_log.txt"))
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "guildlink")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Discord bot session settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Prefix for admin commands (`!setglobal`, ...).
    pub command_prefix: String,

    /// Messages kept per channel in the gateway cache. Edit/delete auditing
    /// can only show the previous content of cached messages.
    pub message_cache_size: usize,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("command_prefix", &self.command_prefix)
            .field("message_cache_size", &self.message_cache_size)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            command_prefix: "!".into(),
            message_cache_size: 500,
        }
    }
}

/// Registry document location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON registry document. Defaults to `<data_dir>/storage.json`.
    pub path: Option<PathBuf>,
}

/// Audit sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Append-only log file. Defaults to `<data_dir>/logs/globalchat_log.txt`.
    pub file_path: Option<PathBuf>,
    /// Mirror events into the log channel named in the registry document.
    pub mirror_to_channel: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            file_path: None,
            mirror_to_channel: true,
        }
    }
}

/// Broadcast engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Deadline for a single delivery attempt, in seconds.
    pub delivery_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_secs: 5,
        }
    }
}
