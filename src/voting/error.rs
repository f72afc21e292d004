use thiserror::Error;

/// Errors produced by the voting machinery.
///
/// `AlreadyVoted` and `NotVoted` are expected business outcomes, not faults;
/// the storage variants surface persistence problems unchanged (no retries
/// happen at this level).
#[derive(Error, Debug)]
pub enum VoteError {
    /// The user already has a live vote
    #[error("user has already voted")]
    AlreadyVoted,

    /// The user has no live vote to retract
    #[error("user has not voted")]
    NotVoted,

    /// The target contestant does not exist (e.g. deleted concurrently)
    #[error("contestant {0} does not exist")]
    ContestantNotFound(i64),

    /// Underlying database fault; state is left as if the call never started
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Connection pool fault
    #[error("storage pool error: {0}")]
    Pool(#[from] r2d2::Error),
}
