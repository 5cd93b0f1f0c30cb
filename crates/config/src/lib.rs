//! Configuration loading, env substitution, and validation.
//!
//! Config files: `guildlink.toml`, `guildlink.yaml`, or `guildlink.json`,
//! searched in `./` then the user config directory.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, discover_and_load, load_config},
    schema::{AuditConfig, DiscordConfig, GuildlinkConfig, RelayConfig, StorageConfig},
    validate::{Diagnostic, Severity, validate},
};
