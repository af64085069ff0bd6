//! Reply keyboards and the buttons on them.

use crate::transport::ReplyKeyboard;

/// A button of one of the bot's menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuButton {
    LatestNews,
    Topics,
    Keywords,
    Settings,
    Help,
    SetKeywords,
    ClearKeywords,
    SetTopics,
    ClearTopics,
    AutoInterval,
    Back,
}

const ALL_BUTTONS: [MenuButton; 11] = [
    MenuButton::LatestNews,
    MenuButton::Topics,
    MenuButton::Keywords,
    MenuButton::Settings,
    MenuButton::Help,
    MenuButton::SetKeywords,
    MenuButton::ClearKeywords,
    MenuButton::SetTopics,
    MenuButton::ClearTopics,
    MenuButton::AutoInterval,
    MenuButton::Back,
];

impl MenuButton {
    /// Text shown on the button.
    pub fn label(&self) -> &'static str {
        match self {
            MenuButton::LatestNews => "Latest news",
            MenuButton::Topics => "Topics",
            MenuButton::Keywords => "Keywords",
            MenuButton::Settings => "Settings",
            MenuButton::Help => "Help",
            MenuButton::SetKeywords => "Set keywords",
            MenuButton::ClearKeywords => "Clear keywords",
            MenuButton::SetTopics => "Set topics",
            MenuButton::ClearTopics => "Clear topics",
            MenuButton::AutoInterval => "Auto-delivery interval",
            MenuButton::Back => "Back",
        }
    }

    /// Recognize a button press. Matching ignores case and surrounding spaces.
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        if text == "news" {
            return Some(MenuButton::LatestNews);
        }
        ALL_BUTTONS
            .into_iter()
            .find(|b| b.label().to_lowercase() == text)
    }
}

fn keyboard(rows: &[&[MenuButton]]) -> ReplyKeyboard {
    ReplyKeyboard {
        rows: rows
            .iter()
            .map(|row| row.iter().map(|b| b.label().to_string()).collect())
            .collect(),
    }
}

pub fn main_menu() -> ReplyKeyboard {
    keyboard(&[
        &[MenuButton::LatestNews, MenuButton::Topics],
        &[MenuButton::Keywords, MenuButton::Settings],
        &[MenuButton::Help],
    ])
}

pub fn settings_menu() -> ReplyKeyboard {
    keyboard(&[&[MenuButton::AutoInterval], &[MenuButton::Back]])
}

pub fn keywords_menu() -> ReplyKeyboard {
    keyboard(&[
        &[MenuButton::SetKeywords, MenuButton::ClearKeywords],
        &[MenuButton::Back],
    ])
}

pub fn topics_menu() -> ReplyKeyboard {
    keyboard(&[
        &[MenuButton::SetTopics, MenuButton::ClearTopics],
        &[MenuButton::Back],
    ])
}
