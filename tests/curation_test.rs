//! Integration tests for admin curation: cascade delete and blob cleanup
//!
//! Run with: cargo test --test curation_test

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use golosura::storage::blob::{BlobStore, FsBlobStore};
use golosura::storage::db::{self, DbPool};
use golosura::storage::{create_pool, get_connection};
use golosura::voting::{curation, tally, Category, VoteError};
use golosura::AppError;

struct Fixture {
    _dir: TempDir,
    pool: Arc<DbPool>,
    blob: FsBlobStore,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let pool = create_pool(dir.path().join("contest.sqlite").to_str().unwrap()).unwrap();
    let blob = FsBlobStore::new(dir.path().join("photos")).unwrap();
    Fixture {
        _dir: dir,
        pool: Arc::new(pool),
        blob,
    }
}

fn add_with_photo(fx: &Fixture, name: &str, category: Category) -> (i64, String) {
    let photo_ref = format!("{name}.jpg");
    fx.blob.store(&photo_ref, b"jpeg-bytes").unwrap();
    let id = curation::add_contestant(&fx.pool, name, category, &photo_ref).unwrap();
    (id, photo_ref)
}

#[test]
fn add_contestant_rejects_blank_name() {
    let fx = fixture();
    let err = curation::add_contestant(&fx.pool, "  \t ", Category::Weekly, "p.jpg").unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn remove_missing_contestant_reports_false() {
    let fx = fixture();
    assert!(!curation::remove_contestant(&fx.pool, &fx.blob, 999).unwrap());
}

#[test]
fn scenario_c_delete_cascades_votes_and_blob() {
    let fx = fixture();
    let (x, photo_ref) = add_with_photo(&fx, "X", Category::Weekly);

    tally::cast_vote(&fx.pool, 1, x).unwrap();
    tally::cast_vote(&fx.pool, 2, x).unwrap();
    assert!(fx.blob.exists(&photo_ref));

    assert!(curation::remove_contestant(&fx.pool, &fx.blob, x).unwrap());

    // No vote row may reference the deleted contestant
    assert_eq!(tally::user_vote(&fx.pool, 1).unwrap(), None);
    assert_eq!(tally::user_vote(&fx.pool, 2).unwrap(), None);
    let conn = get_connection(&fx.pool).unwrap();
    let orphan_rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM votes WHERE contestant_id = ?1",
            rusqlite::params![x],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphan_rows, 0);

    // The photo blob is gone too
    assert!(!fx.blob.exists(&photo_ref));

    // Users freed by the cascade can vote again
    let (y, _) = add_with_photo(&fx, "Y", Category::Weekly);
    tally::cast_vote(&fx.pool, 1, y).unwrap();
}

#[test]
fn delete_leaves_other_contestants_untouched() {
    let fx = fixture();
    let (x, _) = add_with_photo(&fx, "X", Category::Weekly);
    let (y, y_photo) = add_with_photo(&fx, "Y", Category::Weekly);

    tally::cast_vote(&fx.pool, 1, x).unwrap();
    tally::cast_vote(&fx.pool, 2, y).unwrap();

    assert!(curation::remove_contestant(&fx.pool, &fx.blob, x).unwrap());

    let conn = get_connection(&fx.pool).unwrap();
    let survivor = db::get_contestant(&conn, y).unwrap().unwrap();
    assert_eq!(survivor.votes, 1);
    assert_eq!(tally::user_vote(&fx.pool, 2).unwrap(), Some(y));
    assert!(fx.blob.exists(&y_photo));
}

#[test]
fn cast_racing_a_delete_is_rejected() {
    let fx = fixture();
    let (x, _) = add_with_photo(&fx, "X", Category::Weekly);

    assert!(curation::remove_contestant(&fx.pool, &fx.blob, x).unwrap());

    // A stale vote button pressed after the delete
    assert!(matches!(
        tally::cast_vote(&fx.pool, 1, x),
        Err(VoteError::ContestantNotFound(_))
    ));
    assert_eq!(tally::user_vote(&fx.pool, 1).unwrap(), None);
}

#[test]
fn double_delete_reports_false_second_time() {
    let fx = fixture();
    let (x, _) = add_with_photo(&fx, "X", Category::Weekly);

    assert!(curation::remove_contestant(&fx.pool, &fx.blob, x).unwrap());
    assert!(!curation::remove_contestant(&fx.pool, &fx.blob, x).unwrap());
}

#[test]
fn blob_failure_does_not_resurrect_records() {
    struct FailingBlob;
    impl BlobStore for FailingBlob {
        fn store(&self, _key: &str, _bytes: &[u8]) -> std::io::Result<()> {
            Ok(())
        }
        fn delete(&self, _key: &str) -> std::io::Result<()> {
            Err(std::io::Error::other("blob store is down"))
        }
        fn exists(&self, _key: &str) -> bool {
            true
        }
    }

    let fx = fixture();
    let (x, _) = add_with_photo(&fx, "X", Category::Weekly);
    tally::cast_vote(&fx.pool, 1, x).unwrap();

    // The row cascade committed, so the delete still reports success
    assert!(curation::remove_contestant(&fx.pool, &FailingBlob, x).unwrap());
    let conn = get_connection(&fx.pool).unwrap();
    assert!(db::get_contestant(&conn, x).unwrap().is_none());
    assert_eq!(tally::user_vote(&fx.pool, 1).unwrap(), None);
}
