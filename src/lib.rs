//! Golosura - Telegram bot for running a photo-contest vote
//!
//! Users browse contestants by category, cast one vote per user, and view
//! a leaderboard; an administrator curates contestant records and binds the
//! channel used for the must-be-subscribed gate.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging
//! - `storage`: database pool, schema migrations, photo blob store
//! - `voting`: the tally engine, category queries, admin curation
//! - `telegram`: bot integration, dispatcher schema, handlers

pub mod cli;
pub mod core;
pub mod i18n;
pub mod storage;
pub mod telegram;
pub mod voting;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use crate::storage::{create_pool, get_connection, DbConnection, DbPool};
pub use crate::voting::{Category, VoteError};
