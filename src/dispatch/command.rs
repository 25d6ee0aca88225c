//! Parsing of commands addressed to the bot in PR comments.
use anyhow::Context;
use regex::Regex;

/// A command addressed to the bot, e.g. `@pytorchbot ciflow default`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

pub struct CommandParser {
    pattern: Regex,
}

impl CommandParser {
    /// Creates a parser for commands that mention `@<bot_name>`.
    pub fn new(bot_name: &str) -> anyhow::Result<Self> {
        let pattern = format!(
            r"^.*@{}\s+([0-9A-Za-z_]+)\s?(.*)$",
            regex::escape(bot_name)
        );
        let pattern = Regex::new(&pattern)
            .with_context(|| format!("Cannot build command pattern for bot {bot_name}"))?;
        Ok(Self { pattern })
    }

    /// Finds a command in the given comment text.
    ///
    /// The whole text is matched as a single line, and the greedy prefix means that the last
    /// mention of the bot wins. Arguments are split on single spaces, so a command without
    /// arguments has exactly one empty argument.
    pub fn parse(&self, text: &str) -> Option<Command> {
        let captures = self.pattern.captures(text)?;
        let name = captures.get(1)?.as_str().to_string();
        let args = captures
            .get(2)
            .map_or("", |m| m.as_str())
            .split(' ')
            .map(|arg| arg.to_string())
            .collect();
        Some(Command { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, CommandParser};

    fn parse(text: &str) -> Option<Command> {
        CommandParser::new("pytorchbot").unwrap().parse(text)
    }

    fn command(name: &str, args: &[&str]) -> Option<Command> {
        Some(Command {
            name: name.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_parse_command_with_prefix_text() {
        assert_eq!(
            parse("hey @pytorchbot ciflow default"),
            command("ciflow", &["default"])
        );
    }

    #[test]
    fn test_parse_no_mention() {
        assert_eq!(parse("no mention here"), None);
    }

    #[test]
    fn test_parse_command_without_args() {
        assert_eq!(parse("@pytorchbot ciflow"), command("ciflow", &[""]));
    }

    #[test]
    fn test_parse_multiple_args() {
        assert_eq!(
            parse("@pytorchbot ciflow add linux cuda"),
            command("ciflow", &["add", "linux", "cuda"])
        );
    }

    #[test]
    fn test_parse_args_split_on_single_spaces() {
        assert_eq!(
            parse("@pytorchbot ciflow a  b"),
            command("ciflow", &["a", "", "b"])
        );
    }

    #[test]
    fn test_parse_last_mention_wins() {
        assert_eq!(
            parse("@pytorchbot foo @pytorchbot ciflow default"),
            command("ciflow", &["default"])
        );
    }

    #[test]
    fn test_parse_mention_without_command() {
        assert_eq!(parse("thanks @pytorchbot"), None);
    }

    #[test]
    fn test_parse_case_sensitive() {
        assert_eq!(parse("@PyTorchBot ciflow default"), None);
    }

    #[test]
    fn test_parse_other_bot() {
        assert_eq!(parse("@pytorchbot2 ciflow default"), None);
    }

    #[test]
    fn test_parse_mention_on_later_line() {
        assert_eq!(parse("first line\n@pytorchbot ciflow default"), None);
    }

    #[test]
    fn test_parse_escapes_bot_name() {
        let parser = CommandParser::new("bot.name").unwrap();
        assert_eq!(parser.parse("@botxname ciflow"), None);
        assert_eq!(parser.parse("@bot.name ciflow"), command("ciflow", &[""]));
    }
}
