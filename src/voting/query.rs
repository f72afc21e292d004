//! Category-scoped queries: leaderboard and pagination

use crate::storage::db::{self, Contestant, DbPool};
use crate::voting::category::Category;
use crate::voting::error::VoteError;

/// Top `n` contestants of the category by vote count.
///
/// Returns fewer entries when the category is smaller, and an empty vector
/// (not an error) when it has no contestants at all.
pub fn top_n(pool: &DbPool, category: Category, n: usize) -> Result<Vec<Contestant>, VoteError> {
    let conn = db::get_connection(pool)?;
    Ok(db::list_by_category(&conn, category, Some(n), 0)?)
}

/// Zero-based page of the category listing.
///
/// A `page_index` past the last page yields an empty vector, never an error.
pub fn page(pool: &DbPool, category: Category, page_index: usize, page_size: usize) -> Result<Vec<Contestant>, VoteError> {
    let conn = db::get_connection(pool)?;
    Ok(db::list_by_category(
        &conn,
        category,
        Some(page_size),
        page_index * page_size,
    )?)
}

/// Full category listing (votes descending, insertion order on ties).
pub fn list(pool: &DbPool, category: Category) -> Result<Vec<Contestant>, VoteError> {
    let conn = db::get_connection(pool)?;
    Ok(db::list_by_category(&conn, category, None, 0)?)
}

/// Number of contestants in the category.
pub fn count(pool: &DbPool, category: Category) -> Result<i64, VoteError> {
    let conn = db::get_connection(pool)?;
    Ok(db::count_by_category(&conn, category)?)
}

/// Total page count for a category of `count` contestants.
///
/// Always at least 1: an empty category still renders as "page 1 of 1".
pub fn total_pages(count: i64, page_size: usize) -> i64 {
    let page_size = page_size as i64;
    ((count.max(0) + page_size - 1) / page_size).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_never_zero() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(21, 10), 3);
    }

    #[test]
    fn total_pages_clamps_negative_counts() {
        assert_eq!(total_pages(-5, 10), 1);
    }
}
