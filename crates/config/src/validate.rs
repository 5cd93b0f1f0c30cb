//! Sanity checks run before the bot connects.

use std::fmt;

use secrecy::ExposeSecret;

use crate::schema::GuildlinkConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "discord.token".
    pub path: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.path, self.message)
    }
}

/// Check a config for values the bot cannot start with.
pub fn validate(config: &GuildlinkConfig) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let mut push = |severity, path, message: &str| {
        out.push(Diagnostic {
            severity,
            path,
            message: message.to_string(),
        });
    };

    if config.discord.token.expose_secret().trim().is_empty() {
        push(
            Severity::Error,
            "discord.token",
            "bot token is required (set it in the config file or GUILDLINK_TOKEN)",
        );
    }

    let prefix = &config.discord.command_prefix;
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        push(
            Severity::Error,
            "discord.command_prefix",
            "command prefix must be non-empty and contain no whitespace",
        );
    }

    if config.relay.delivery_timeout_secs == 0 {
        push(
            Severity::Error,
            "relay.delivery_timeout_secs",
            "delivery timeout must be at least one second",
        );
    }

    if config.discord.message_cache_size == 0 {
        push(
            Severity::Warning,
            "discord.message_cache_size",
            "message cache disabled; deleted-message audit events will not include content",
        );
    }

    out
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::Secret};

    fn valid() -> GuildlinkConfig {
        let mut cfg = GuildlinkConfig::default();
        cfg.discord.token = Secret::new("token".into());
        cfg
    }

    #[test]
    fn valid_config_has_no_diagnostics() {
        assert!(validate(&valid()).is_empty());
    }

    #[test]
    fn missing_token_is_an_error() {
        let diags = validate(&GuildlinkConfig::default());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].path, "discord.token");
    }

    #[test]
    fn bad_prefix_and_timeout() {
        let mut cfg = valid();
        cfg.discord.command_prefix = "g !".into();
        cfg.relay.delivery_timeout_secs = 0;
        let paths: Vec<_> = validate(&cfg).into_iter().map(|d| d.path).collect();
        assert_eq!(
            paths,
            vec!["discord.command_prefix", "relay.delivery_timeout_secs"]
        );
    }

    #[test]
    fn disabled_cache_only_warns() {
        let mut cfg = valid();
        cfg.discord.message_cache_size = 0;
        let diags = validate(&cfg);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(diags[0].to_string().starts_with("warning [discord.message_cache_size]"));
    }
}
