use std::{error::Error as StdError, path::PathBuf, time::Duration};

use guildlink_common::Snowflake;

/// Crate-wide result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed relay errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The persisted registry document could not be parsed.
    #[error("registry document {} is corrupt: {source}", .path.display())]
    StorageCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A registered gateway channel no longer resolves.
    #[error("gateway channel {channel_id} of guild {guild_id} no longer resolves")]
    StaleTarget {
        guild_id: String,
        channel_id: Snowflake,
    },

    /// Sending to (or deleting from) one channel failed.
    #[error("delivery failed: {context}: {source}")]
    Delivery {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// A delivery attempt exceeded its deadline.
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    /// Input payload or parameter is invalid.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn delivery(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Delivery {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
