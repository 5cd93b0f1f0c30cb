//! Shared identifier types, timestamp formatting, and error helpers used across
//! all guildlink crates.

pub mod context;
pub mod snowflake;
pub mod time;

pub use {
    context::FromMessage,
    snowflake::{ParseSnowflakeError, Snowflake},
    time::format_utc,
};
