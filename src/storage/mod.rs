//! Database and blob storage

pub mod blob;
pub mod db;
pub mod migrations;

// Re-exports for convenience
pub use blob::{BlobStore, FsBlobStore};
pub use db::{create_pool, get_connection, DbConnection, DbPool};
