use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    Result,
    env_subst::substitute_env,
    error::{Context, Error},
    schema::GuildlinkConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "guildlink.toml",
    "guildlink.yaml",
    "guildlink.yml",
    "guildlink.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<GuildlinkConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply environment
/// overrides.
///
/// Search order:
/// 1. `./guildlink.{toml,yaml,yml,json}`
/// 2. `<user config dir>/guildlink/guildlink.{toml,yaml,yml,json}`
///
/// Falls back to `GuildlinkConfig::default()` if no file is found or the file
/// fails to parse.
pub fn discover_and_load() -> GuildlinkConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                GuildlinkConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            GuildlinkConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Apply `GUILDLINK_*` (and legacy `TOKEN` / `FILE_LOG_PATH`) environment
/// variables on top of a loaded config.
pub fn apply_env_overrides(config: &mut GuildlinkConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut GuildlinkConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = non_empty("GUILDLINK_TOKEN").or_else(|| non_empty("TOKEN")) {
        config.discord.token = Secret::new(token);
    }
    if let Some(dir) = non_empty("GUILDLINK_DATA_DIR") {
        config.data_dir = Some(PathBuf::from(dir));
    }
    if let Some(path) = non_empty("GUILDLINK_STORAGE_PATH") {
        config.storage.path = Some(PathBuf::from(path));
    }
    if let Some(path) = non_empty("FILE_LOG_PATH") {
        config.audit.file_path = Some(PathBuf::from(path));
    }
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dirs = directories::ProjectDirs::from("", "", "guildlink")?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dirs.config_dir().join(name))
        .find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> Result<GuildlinkConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    let shown = path.display();

    match ext {
        "toml" => toml::from_str(raw).with_context(|| format!("invalid TOML in {shown}")),
        "yaml" | "yml" => {
            serde_yaml::from_str(raw).with_context(|| format!("invalid YAML in {shown}"))
        },
        "json" => serde_json::from_str(raw).with_context(|| format!("invalid JSON in {shown}")),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}
