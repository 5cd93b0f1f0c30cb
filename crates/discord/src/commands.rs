//! Prefix command front-end (`!setglobal`, `!banword spam`, ...).

/// An admin or info command parsed from a guild message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetGlobal,
    ClearGlobal,
    GlobalInfo,
    SetLog,
    ClearLog,
    BanWord(String),
    UnbanWord(String),
    BannedWords,
    Help,
}

impl Command {
    /// Parse `text` as a command. Returns `None` for anything that is not a
    /// known command with the configured prefix.
    pub fn parse(prefix: &str, text: &str) -> Option<Self> {
        if prefix.is_empty() {
            return None;
        }
        let rest = text.trim().strip_prefix(prefix)?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let command = match name.to_ascii_lowercase().as_str() {
            "setglobal" => Self::SetGlobal,
            "clearglobal" => Self::ClearGlobal,
            "globalinfo" => Self::GlobalInfo,
            "setlog" => Self::SetLog,
            "clearlog" => Self::ClearLog,
            "banword" => Self::BanWord(arg.to_string()),
            "unbanword" => Self::UnbanWord(arg.to_string()),
            "bannedwords" => Self::BannedWords,
            "globalhelp" => Self::Help,
            _ => return None,
        };
        Some(command)
    }

    /// Whether the invoking member needs the Administrator permission.
    pub fn requires_admin(&self) -> bool {
        !matches!(self, Self::GlobalInfo | Self::Help)
    }
}

pub fn help_text(prefix: &str) -> String {
    [
        "**Global chat commands**".to_string(),
        format!("`{prefix}setglobal` - connect this channel to the global chat (admin)"),
        format!("`{prefix}clearglobal` - disconnect this server (admin)"),
        format!("`{prefix}globalinfo` - list connected servers"),
        format!("`{prefix}setlog` - post global chat logs in this channel (admin)"),
        format!("`{prefix}clearlog` - stop posting logs (admin)"),
        format!("`{prefix}banword <word>` - ban a word (admin)"),
        format!("`{prefix}unbanword <word>` - unban a word (admin)"),
        format!("`{prefix}bannedwords` - show banned words (admin)"),
        format!("`{prefix}globalhelp` - show this help"),
    ]
    .join("\n")
}

pub const NOT_ADMIN: &str = "⛔ You need the Administrator permission to use this command.";
pub const GUILD_ONLY: &str = "This command can only be used in a server.";

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("!setglobal", Some(Command::SetGlobal))]
    #[case("  !SetGlobal  ", Some(Command::SetGlobal))]
    #[case("!clearglobal", Some(Command::ClearGlobal))]
    #[case("!globalinfo", Some(Command::GlobalInfo))]
    #[case("!setlog", Some(Command::SetLog))]
    #[case("!clearlog", Some(Command::ClearLog))]
    #[case("!banword spam", Some(Command::BanWord("spam".into())))]
    #[case("!banword   two words ", Some(Command::BanWord("two words".into())))]
    #[case("!banword", Some(Command::BanWord(String::new())))]
    #[case("!unbanword Spam", Some(Command::UnbanWord("Spam".into())))]
    #[case("!bannedwords", Some(Command::BannedWords))]
    #[case("!globalhelp", Some(Command::Help))]
    #[case("!unknown", None)]
    #[case("setglobal", None)]
    #[case("hello !setglobal", None)]
    #[case("", None)]
    fn parses_commands(#[case] text: &str, #[case] expected: Option<Command>) {
        assert_eq!(Command::parse("!", text), expected);
    }

    #[test]
    fn custom_prefix() {
        assert_eq!(Command::parse("gl.", "gl.globalinfo"), Some(Command::GlobalInfo));
        assert_eq!(Command::parse("gl.", "!globalinfo"), None);
        assert_eq!(Command::parse("", "setglobal"), None);
    }

    #[test]
    fn only_info_commands_are_open() {
        assert!(!Command::GlobalInfo.requires_admin());
        assert!(!Command::Help.requires_admin());
        assert!(Command::SetGlobal.requires_admin());
        assert!(Command::BannedWords.requires_admin());
        assert!(Command::BanWord("x".into()).requires_admin());
    }

    #[test]
    fn help_lists_every_command_with_prefix() {
        let help = help_text("?");
        for name in [
            "setglobal",
            "clearglobal",
            "globalinfo",
            "setlog",
            "clearlog",
            "banword",
            "unbanword",
            "bannedwords",
            "globalhelp",
        ] {
            assert!(help.contains(&format!("`?{name}")), "missing {name}");
        }
    }
}
