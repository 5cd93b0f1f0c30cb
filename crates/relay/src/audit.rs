//! Audit events: one line per event in an append-only file, optionally
//! mirrored as a notice into the configured log channel.

use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    guildlink_common::format_utc,
    tokio::{fs, io::AsyncWriteExt},
    tracing::{error, info, warn},
};

use crate::{
    Error, Result,
    broadcast::DEFAULT_DELIVERY_TIMEOUT,
    registry::Registry,
    session::{GatewaySession, Notice},
};

/// Title used for mirrored audit notices.
pub const NOTICE_TITLE: &str = "GlobalChat Log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuditLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub level: AuditLevel,
    pub message: String,
}

impl AuditEvent {
    pub fn new(level: AuditLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }

    /// `[YYYY-MM-DD HH:MM:SS][LEVEL] message`
    pub fn to_line(&self) -> String {
        format!(
            "[{}][{}] {}",
            format_utc(self.timestamp),
            self.level,
            self.message
        )
    }

    pub fn to_notice(&self) -> Notice {
        Notice {
            title: NOTICE_TITLE.into(),
            description: self.message.clone(),
            footer: self.level.to_string(),
            timestamp: self.timestamp,
        }
    }
}

/// Receives audit events from the gate, the engine, and the admin surface.
///
/// Implementations must never fail the caller: sink errors are logged and
/// swallowed.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_event(&self, message: &str, level: AuditLevel);
}

/// Production audit sink.
pub struct AuditLog {
    path: PathBuf,
    mirror: Option<Mirror>,
    mirror_timeout: Duration,
}

struct Mirror {
    registry: Arc<Registry>,
    session: Arc<dyn GatewaySession>,
}

impl AuditLog {
    /// File-only sink.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mirror: None,
            mirror_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    /// Also mirror events into the registry's log channel, when one is set
    /// and resolves.
    pub fn with_mirror(
        mut self,
        registry: Arc<Registry>,
        session: Arc<dyn GatewaySession>,
    ) -> Self {
        self.mirror = Some(Mirror { registry, session });
        self
    }

    /// Deadline for resolving the log channel and posting one notice.
    pub fn with_mirror_timeout(mut self, timeout: Duration) -> Self {
        self.mirror_timeout = timeout;
        self
    }

    /// Open-append-close per event, written with a single call so concurrent
    /// appends never split a line.
    async fn append(&self, event: &AuditEvent) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let mut line = event.to_line();
        line.push('\n');
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn mirror(&self, mirror: &Mirror, event: &AuditEvent) -> Result<()> {
        let Some((_guild_id, channel_id)) = mirror.registry.log_target().await else {
            return Ok(());
        };
        match mirror.session.resolve_channel(channel_id).await? {
            Some(channel) => mirror.session.send_notice(&channel, &event.to_notice()).await,
            None => {
                warn!(%channel_id, "audit log channel does not resolve");
                Ok(())
            },
        }
    }
}

#[async_trait]
impl AuditSink for AuditLog {
    async fn log_event(&self, message: &str, level: AuditLevel) {
        match level {
            AuditLevel::Info => info!(target: "guildlink::audit", "{message}"),
            AuditLevel::Warn => warn!(target: "guildlink::audit", "{message}"),
            AuditLevel::Error => error!(target: "guildlink::audit", "{message}"),
        }

        let event = AuditEvent::new(level, message);
        if let Err(e) = self.append(&event).await {
            warn!(path = %self.path.display(), error = %e, "failed to write audit log file");
        }
        if let Some(mirror) = &self.mirror
            && let Err(e) = tokio::time::timeout(self.mirror_timeout, self.mirror(mirror, &event))
                .await
                .unwrap_or(Err(Error::Timeout(self.mirror_timeout)))
        {
            warn!(error = %e, "failed to mirror audit event to log channel");
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::TimeZone,
        tempfile::TempDir,
    };

    #[test]
    fn line_format() {
        let event = AuditEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 58).unwrap(),
            level: AuditLevel::Warn,
            message: "Deleted message".into(),
        };
        assert_eq!(event.to_line(), "[2024-12-31 23:59:58][WARN] Deleted message");
    }

    #[test]
    fn notice_shows_level_as_footer() {
        let notice = AuditEvent::new(AuditLevel::Error, "boom").to_notice();
        assert_eq!(notice.title, NOTICE_TITLE);
        assert_eq!(notice.description, "boom");
        assert_eq!(notice.footer, "ERROR");
    }

    #[tokio::test]
    async fn appends_one_line_per_event() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs").join("audit.txt");
        let log = AuditLog::new(&path);

        log.log_event("first", AuditLevel::Info).await;
        log.log_event("second", AuditLevel::Error).await;

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] first"));
        assert!(lines[1].ends_with("[ERROR] second"));
    }

    #[tokio::test]
    async fn each_event_is_on_disk_when_log_event_returns() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audit.txt");
        let log = AuditLog::new(&path);

        for i in 1..=200 {
            log.log_event(&format!("event {i}"), AuditLevel::Info).await;
            let content = std::fs::read_to_string(&path).unwrap();
            assert_eq!(content.lines().count(), i);
            assert!(content.ends_with(&format!("[INFO] event {i}\n")));
        }
    }

    #[tokio::test]
    async fn concurrent_appends_keep_line_boundaries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audit.txt");
        let log = Arc::new(AuditLog::new(&path));

        let mut tasks = Vec::new();
        for i in 0..50 {
            let log = Arc::clone(&log);
            tasks.push(tokio::spawn(async move {
                log.log_event(&format!("event {i}"), AuditLevel::Info).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 50);
        assert!(content.lines().all(|l| l.contains("[INFO] event ")));
    }

    #[tokio::test]
    async fn unwritable_path_does_not_panic() {
        let tmp = TempDir::new().unwrap();
        // A directory where the file should be.
        let log = AuditLog::new(tmp.path());
        log.log_event("ignored", AuditLevel::Warn).await;
    }
}
