use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot
/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: database.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "database.sqlite".to_string()));

/// Directory where contestant photos are stored
/// Read from PHOTOS_DIR environment variable
/// Default: photos
pub static PHOTOS_DIR: Lazy<String> = Lazy::new(|| env::var("PHOTOS_DIR").unwrap_or_else(|_| "photos".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: bot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "bot.log".to_string()));

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    /// Panel password
    /// Read from ADMIN_PASSWORD environment variable; empty disables the panel
    pub static ADMIN_PASSWORD: Lazy<String> =
        Lazy::new(|| env::var("ADMIN_PASSWORD").unwrap_or_else(|_| String::new()));

    /// Checks the supplied password against the configured one.
    /// An unset/empty ADMIN_PASSWORD never matches.
    pub fn password_matches(candidate: &str) -> bool {
        !ADMIN_PASSWORD.is_empty() && candidate == ADMIN_PASSWORD.as_str()
    }
}

/// Voting configuration
pub mod voting {
    /// Leaderboard size shown in the rating view
    pub const LEADERBOARD_SIZE: usize = 3;

    /// Contestants per page in the admin delete flow
    pub const PAGE_SIZE: usize = 10;
}

/// Validation configuration
pub mod validation {
    /// Maximum contestant name length in characters
    pub const MAX_NAME_LENGTH: usize = 200;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_never_matches_when_unset() {
        // ADMIN_PASSWORD is not set in the test environment
        assert!(!admin::password_matches(""));
        assert!(!admin::password_matches("hunter2"));
    }

    #[test]
    fn limits_are_positive() {
        assert!(voting::PAGE_SIZE > 0);
        assert!(voting::LEADERBOARD_SIZE > 0);
        assert!(validation::MAX_NAME_LENGTH > 0);
    }
}
