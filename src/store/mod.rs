//! Store gateway: the only path to the backing quad store.
//!
//! The gateway is deliberately narrow — pattern reads, buffered quad
//! inserts, the closed set of [`UpdateOp`]s, and an explicit commit.
//! There is no cross-request transaction: each update operation is one
//! request and the store's per-request atomicity is all the atomicity
//! there is. Multi-request sequences built on top of this interface
//! (membership `set`, forced refresh) interleave with concurrent
//! writers; the operations themselves are written so that a single
//! request keeps the bookkeeping consistent.

mod memory;
mod sparql;
mod update;

pub use memory::MemoryStore;
pub use sparql::SparqlClient;
pub use update::UpdateOp;

use async_trait::async_trait;
use thiserror::Error;

use crate::term::{Quad, QuadPattern};

/// Gateway errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport or connectivity failure; retryable by the caller.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The endpoint answered, but not with success.
    #[error("store endpoint error: {0}")]
    Endpoint(String),

    /// The endpoint's response could not be decoded.
    #[error("malformed store response: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Transactional wrapper around a quad store.
///
/// Implementations must be shareable across request handlers and the
/// scheduled sweep; state is scoped to the handle, never to the
/// process.
#[async_trait]
pub trait QuadStore: Send + Sync {
    /// Read all committed quads matching a pattern.
    async fn quads(&self, pattern: &QuadPattern) -> StoreResult<Vec<Quad>>;

    /// Buffer quads for insertion; nothing is visible until `commit`.
    async fn insert(&self, quads: Vec<Quad>) -> StoreResult<()>;

    /// Execute one update operation as its own request, immediately.
    async fn update(&self, op: &UpdateOp) -> StoreResult<()>;

    /// Flush buffered inserts to the store.
    async fn commit(&self) -> StoreResult<()>;

    /// Whether any committed quad matches the pattern.
    async fn contains(&self, pattern: &QuadPattern) -> StoreResult<bool> {
        Ok(!self.quads(pattern).await?.is_empty())
    }
}
