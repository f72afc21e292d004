//! Dispatcher schema, handler dependencies and handler chain builders

pub mod admin;
pub mod callbacks;
pub mod commands;
pub mod helpers;

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use crate::storage::blob::FsBlobStore;
use crate::storage::db::DbPool;
use crate::telegram::bot::Command;
use crate::telegram::state::SessionStore;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
///
/// Built once in `main` and cloned into every handler closure; nothing in
/// here is a process global.
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub blob: Arc<FsBlobStore>,
    pub sessions: Arc<SessionStore>,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<DbPool>, blob: Arc<FsBlobStore>, sessions: Arc<SessionStore>) -> Self {
        Self {
            db_pool,
            blob,
            sessions,
        }
    }
}

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Returns a handler tree usable with teloxide's Dispatcher; the same
/// schema serves production and integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callbacks = deps;

    dptree::entry()
        // Command handler must run before the plain-message handler
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                    let deps = deps_commands.clone();
                    async move {
                        if let Err(e) = commands::handle_command(&bot, &msg, cmd, &deps).await {
                            log::error!("Command handler error: {}", e);
                        }
                        Ok(())
                    }
                }),
        )
        // Conversation steps and reply-keyboard buttons
        .branch(Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let deps = deps_messages.clone();
            async move {
                if let Err(e) = commands::handle_message(&bot, &msg, &deps).await {
                    log::error!("Message handler error: {}", e);
                }
                Ok(())
            }
        }))
        // Inline keyboard callbacks
        .branch(Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
            let deps = deps_callbacks.clone();
            async move {
                if let Err(e) = callbacks::handle_callback(&bot, &q, &deps).await {
                    log::error!("Callback handler error: {}", e);
                }
                Ok(())
            }
        }))
}
