//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;
pub mod keyboards;
pub mod state;
pub mod subscription;

use teloxide::types::InlineKeyboardButton;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use state::{AdminState, Session, SessionStore};

/// Shorthand for an inline callback button.
pub fn cb(text: impl Into<String>, data: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, data)
}
