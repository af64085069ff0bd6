//! Telegram bot front end.

pub mod command;
pub mod handler;
pub mod menu;
pub mod poller;

pub use command::{parse_input, BotCommand, BotInput};
pub use handler::BotHandler;
pub use menu::MenuButton;
pub use poller::{start_poller, ChatDispatcher, MessageHandler, UpdatePoller};
