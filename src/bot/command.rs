//! Parsing of incoming bot text.

use super::menu::MenuButton;

/// Classified incoming text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotInput {
    /// A slash command.
    Command(BotCommand),
    /// Anything else, trimmed. May be a menu button or a setting value.
    Text(String),
}

/// A slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    News,
    Help,
    Unknown(String),
}

impl BotInput {
    /// The menu button this text presses, if any.
    pub fn button(&self) -> Option<MenuButton> {
        match self {
            BotInput::Text(text) => MenuButton::from_text(text),
            BotInput::Command(_) => None,
        }
    }
}

/// Parse one incoming message.
///
/// Commands may carry a `@botname` suffix and arguments; both are ignored.
pub fn parse_input(input: &str) -> BotInput {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return BotInput::Text(trimmed.to_string());
    };

    let word = rest.split_whitespace().next().unwrap_or("");
    let name = word.split('@').next().unwrap_or("").to_lowercase();

    let command = match name.as_str() {
        "start" => BotCommand::Start,
        "news" => BotCommand::News,
        "help" => BotCommand::Help,
        _ => BotCommand::Unknown(name),
    };
    BotInput::Command(command)
}
