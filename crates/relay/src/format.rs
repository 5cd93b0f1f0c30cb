use guildlink_common::format_utc;

use crate::message::RelayMessage;

/// Attribution line placed above every relayed message.
pub fn relay_header(message: &RelayMessage) -> String {
    format!(
        "**{}** from **{}** (#{}) at {} UTC",
        message.author.display_name,
        message.origin.guild_name,
        message.origin.channel_name,
        format_utc(message.created_at),
    )
}

/// Full outbound text: header, newline, raw body.
pub fn relay_payload(message: &RelayMessage) -> String {
    format!("{}\n{}", relay_header(message), message.text)
}
