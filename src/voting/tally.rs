//! Vote casting and retraction
//!
//! Thin pool-level facade over the transactional primitives in
//! `storage::db`; the store, not this module, is the serialization point
//! for concurrent calls.

use crate::storage::db::{self, DbPool};
use crate::voting::error::VoteError;

/// Casts a vote for `contestant_id` on behalf of `user_id`.
///
/// At most one live vote per user: a second cast fails with
/// [`VoteError::AlreadyVoted`] until the vote is retracted. Casting for a
/// contestant that no longer exists fails with
/// [`VoteError::ContestantNotFound`].
pub fn cast_vote(pool: &DbPool, user_id: i64, contestant_id: i64) -> Result<(), VoteError> {
    let mut conn = db::get_connection(pool)?;
    db::cast_vote(&mut conn, user_id, contestant_id)?;
    log::info!("User {} voted for contestant {}", user_id, contestant_id);
    Ok(())
}

/// Retracts the user's live vote.
///
/// Fails with [`VoteError::NotVoted`] when there is nothing to retract, so
/// retracting twice in a row yields Ok then NotVoted.
pub fn retract_vote(pool: &DbPool, user_id: i64) -> Result<(), VoteError> {
    let mut conn = db::get_connection(pool)?;
    db::retract_vote(&mut conn, user_id)?;
    log::info!("User {} retracted their vote", user_id);
    Ok(())
}

/// Contestant the user currently votes for, if any.
pub fn user_vote(pool: &DbPool, user_id: i64) -> Result<Option<i64>, VoteError> {
    let conn = db::get_connection(pool)?;
    Ok(db::get_vote_for_user(&conn, user_id)?)
}
