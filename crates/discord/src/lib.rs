//! Discord adapter for the guildlink relay.
//!
//! Implements `GatewaySession` over serenity, translates gateway events into
//! relay calls, and runs the prefix command front-end.

pub mod bot;
pub mod commands;
pub mod convert;
pub mod error;
pub mod handler;
pub mod session;

pub use {
    bot::run,
    error::{Error, Result},
    handler::GuildlinkHandler,
    session::DiscordSession,
};
