//! Admin curation: adding and removing contestants
//!
//! Authorization is the caller's concern; these functions trust that the
//! actor was already verified as an administrator.

use crate::core::error::AppResult;
use crate::storage::blob::BlobStore;
use crate::storage::db::{self, DbPool};
use crate::voting::category::Category;

/// Adds a contestant; the photo blob must already be stored under
/// `photo_ref`. Name validation happens in the record store, before any
/// write.
pub fn add_contestant(pool: &DbPool, name: &str, category: Category, photo_ref: &str) -> AppResult<i64> {
    let conn = db::get_connection(pool)?;
    let id = db::create_contestant(&conn, name, category, photo_ref)?;
    log::info!("Contestant {} added: {:?} (category {})", id, name.trim(), category.id());
    Ok(id)
}

/// Removes a contestant, cascading over its votes, and deletes the photo
/// blob.
///
/// Returns `false` when no such contestant exists — a reporting signal for
/// the caller's message, not an error. The row cascade commits first; a
/// blob-store failure afterwards is logged and does not resurrect the
/// records.
pub fn remove_contestant(pool: &DbPool, blob: &dyn BlobStore, id: i64) -> AppResult<bool> {
    let mut conn = db::get_connection(pool)?;
    let Some(photo_ref) = db::delete_contestant(&mut conn, id)? else {
        return Ok(false);
    };

    if let Err(e) = blob.delete(&photo_ref) {
        log::warn!("Failed to delete photo blob {}: {}", photo_ref, e);
    }
    log::info!("Contestant {} deleted", id);
    Ok(true)
}
