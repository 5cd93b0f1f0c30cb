//! `guildlink doctor` — config validation and registry health check.
//!
//! Prints a report with `[ok]`, `[warn]`, `[fail]`, or `[info]` per item.

use std::{path::Path, sync::Arc};

use {
    anyhow::{Result, bail},
    guildlink_config::{GuildlinkConfig, Severity},
    guildlink_relay::{FileStore, Registry},
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

struct Section {
    title: &'static str,
    items: Vec<(Status, String)>,
}

impl Section {
    fn new(title: &'static str) -> Self {
        Self {
            title,
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push((status, message.into()));
    }

    fn failures(&self) -> usize {
        self.items
            .iter()
            .filter(|(status, _)| *status == Status::Fail)
            .count()
    }
}

fn print_report(sections: &[Section]) {
    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for (status, message) in &section.items {
            eprintln!("  [{}{}{RESET}]  {message}", status.color(), status.label());
        }
        eprintln!();
    }
}

fn check_config(config: &GuildlinkConfig) -> Section {
    let mut section = Section::new("Configuration");
    let diagnostics = guildlink_config::validate(config);
    if diagnostics.is_empty() {
        section.push(Status::Ok, "config is valid");
    }
    for diagnostic in diagnostics {
        let status = match diagnostic.severity {
            Severity::Error => Status::Fail,
            Severity::Warning => Status::Warn,
        };
        section.push(status, diagnostic.to_string());
    }
    section
}

async fn check_registry(path: &Path) -> Section {
    let mut section = Section::new("Registry");
    section.push(Status::Info, format!("storage file: {}", path.display()));
    if !path.exists() {
        section.push(
            Status::Warn,
            "storage file does not exist yet; it is created on first start",
        );
        return section;
    }
    match Registry::load(Arc::new(FileStore::new(path))).await {
        Ok(registry) => {
            let gateways = registry.snapshot_channels().await.len();
            let words = registry.banned_words().await.len();
            section.push(
                Status::Ok,
                format!("{gateways} gateway(s), {words} banned word(s)"),
            );
            match registry.log_target().await {
                Some((guild, channel)) => {
                    section.push(Status::Info, format!("log channel {channel} in guild {guild}"));
                },
                None => section.push(Status::Info, "no log channel configured"),
            }
        },
        Err(e) => section.push(Status::Fail, e.to_string()),
    }
    section
}

fn check_audit(config: &GuildlinkConfig) -> Section {
    let mut section = Section::new("Audit log");
    let path = config.audit_log_path();
    section.push(Status::Info, format!("audit file: {}", path.display()));
    section.push(
        Status::Info,
        if config.audit.mirror_to_channel {
            "events are mirrored to the log channel"
        } else {
            "channel mirroring is disabled"
        },
    );
    section
}

pub async fn handle_doctor(config: &GuildlinkConfig) -> Result<()> {
    eprintln!("{BOLD}guildlink doctor{RESET}");
    eprintln!("{BOLD}================{RESET}\n");

    // The registry check only reads: a missing file is reported, not created.
    let sections = vec![
        check_config(config),
        check_registry(&config.storage_path()).await,
        check_audit(config),
    ];
    print_report(&sections);

    let failures: usize = sections.iter().map(Section::failures).sum();
    if failures > 0 {
        bail!("{failures} check(s) failed");
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::Secret, tempfile::TempDir};

    #[test]
    fn missing_token_fails_config_check() {
        let section = check_config(&GuildlinkConfig::default());
        assert_eq!(section.failures(), 1);
    }

    #[test]
    fn valid_config_passes() {
        let mut config = GuildlinkConfig::default();
        config.discord.token = Secret::new("abc".into());
        let section = check_config(&config);
        assert_eq!(section.failures(), 0);
        assert_eq!(section.items[0].0, Status::Ok);
    }

    #[tokio::test]
    async fn corrupt_registry_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("storage.json");
        std::fs::write(&path, "{ not json").unwrap();
        let section = check_registry(&path).await;
        assert_eq!(section.failures(), 1);
        assert!(section.items[1].1.contains("corrupt"));
    }

    #[tokio::test]
    async fn missing_registry_is_only_a_warning() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("storage.json");
        let section = check_registry(&path).await;
        assert_eq!(section.failures(), 0);
        assert!(!path.exists());
    }
}
