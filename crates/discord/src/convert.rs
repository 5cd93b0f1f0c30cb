//! Serenity model -> relay type conversions.

use {
    chrono::{DateTime, Utc},
    guildlink_common::Snowflake,
    guildlink_relay::{AttachmentRef, Author, GuildInfo, InboundMessage},
    serenity::all::{
        Cache, ChannelId, GuildId, Message, MessageId, PartialMember, Timestamp, User,
    },
};

// Serenity ids are non-zero; a zero snowflake has no platform counterpart.

pub fn channel_id(id: Snowflake) -> Option<ChannelId> {
    (id.get() != 0).then(|| ChannelId::new(id.get()))
}

pub fn guild_id(id: Snowflake) -> Option<GuildId> {
    (id.get() != 0).then(|| GuildId::new(id.get()))
}

pub fn message_id(id: Snowflake) -> Option<MessageId> {
    (id.get() != 0).then(|| MessageId::new(id.get()))
}

/// Server nickname, then global display name, then username.
pub fn display_name(nick: Option<&str>, global_name: Option<&str>, username: &str) -> String {
    nick.or(global_name).unwrap_or(username).to_string()
}

pub fn author(user: &User, member: Option<&PartialMember>) -> Author {
    Author {
        id: Snowflake::new(user.id.get()),
        display_name: display_name(
            member.and_then(|m| m.nick.as_deref()),
            user.global_name.as_deref(),
            &user.name,
        ),
        is_bot: user.bot,
    }
}

pub fn timestamp(ts: Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.unix_timestamp(), 0).unwrap_or_else(Utc::now)
}

/// Cached guild name, falling back to the id.
pub fn guild_name(cache: &Cache, id: GuildId) -> String {
    cache
        .guild(id)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Cached channel name, falling back to the id.
pub fn channel_name(cache: &Cache, id: ChannelId) -> String {
    cache
        .channel(id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| id.to_string())
}

pub fn guild_info(cache: &Cache, id: GuildId) -> GuildInfo {
    GuildInfo {
        id: Snowflake::new(id.get()),
        name: guild_name(cache, id),
    }
}

pub fn inbound_message(cache: &Cache, msg: &Message) -> InboundMessage {
    InboundMessage {
        id: Snowflake::new(msg.id.get()),
        author: author(&msg.author, msg.member.as_deref()),
        guild: msg.guild_id.map(|id| guild_info(cache, id)),
        channel_id: Snowflake::new(msg.channel_id.get()),
        channel_name: channel_name(cache, msg.channel_id),
        text: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| AttachmentRef {
                filename: a.filename.clone(),
                url: a.url.clone(),
            })
            .collect(),
        created_at: timestamp(msg.timestamp),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone, rstest::rstest};

    #[test]
    fn zero_ids_have_no_serenity_counterpart() {
        assert!(channel_id(Snowflake::new(0)).is_none());
        assert!(guild_id(Snowflake::new(0)).is_none());
        assert!(message_id(Snowflake::new(0)).is_none());
        assert_eq!(
            channel_id(Snowflake::new(123)).unwrap(),
            ChannelId::new(123)
        );
    }

    #[rstest]
    #[case(Some("nick"), Some("Global"), "user", "nick")]
    #[case(None, Some("Global"), "user", "Global")]
    #[case(None, None, "user", "user")]
    fn display_name_precedence(
        #[case] nick: Option<&str>,
        #[case] global_name: Option<&str>,
        #[case] username: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(display_name(nick, global_name, username), expected);
    }

    #[test]
    fn timestamp_keeps_seconds() {
        let ts = Timestamp::from_unix_timestamp(1_717_243_200).unwrap();
        assert_eq!(
            timestamp(ts),
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
        );
    }
}
