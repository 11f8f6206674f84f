//! Persistence for `Human` records.
//!
//! Every operation issues at most one statement against the `humans` table
//! (delete issues a lookup first). Ids arrive exactly as they appeared in the
//! request path; an id the backend cannot read as an integer matches no row.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::Human;

mod memory;
mod postgres;

pub use memory::MemoryHumanStore;
pub use postgres::{PgHumanStore, PgStoreOptions};

/// Failure of a persistence operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no human matches the requested id")]
    NotFound,

    #[error("storage operation timed out")]
    Timeout,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage backend for humans, shared by every request handler.
#[async_trait]
pub trait HumanStore: Send + Sync {
    /// All rows, in whatever order the backend returns them.
    async fn list(&self) -> Result<Vec<Human>>;

    /// The row matching `id`, or [`StoreError::NotFound`].
    async fn get(&self, id: &str) -> Result<Human>;

    /// Inserts a row and returns it with its generated id.
    async fn create(&self, first_name: &str, last_name: &str) -> Result<Human>;

    /// Overwrites both names of the row matching `id`.
    ///
    /// Succeeds even when no row matches.
    async fn update(&self, id: &str, first_name: &str, last_name: &str) -> Result<()>;

    /// Removes the row matching `id`, or reports [`StoreError::NotFound`] if
    /// the existence check finds nothing.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<()>;

    /// Releases backend resources. Called once, on shutdown.
    async fn close(&self);
}
