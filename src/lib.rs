//! cardex — a catalog persistence engine over a remote RDF quad store.
//!
//! The engine sits between typed application objects and a quad store
//! that is reachable only through a query/update/commit protocol with
//! no multi-statement transactions. It provides:
//!
//! - object-like read/write semantics over raw triples: typed
//!   relations with get/add/remove/set/clear, synchronized by minimal
//!   diffs ([`mapping`]);
//! - reference-counted collection membership, where every mutation
//!   adjusts the shared count in the same atomic update
//!   ([`collection`]);
//! - deduplication and garbage collection of catalog records that is
//!   safe while collections and annotations mutate concurrently
//!   ([`gc`], [`catalog`]);
//! - blank-node normalization and shape-validated annotation
//!   submissions at the boundary of every shared graph
//!   ([`normalize`], [`annotation`]).
//!
//! All store access flows through the [`store::QuadStore`] gateway:
//! the SPARQL protocol client in production, an in-memory double in
//! tests. Each update operation is a single request — the only
//! atomicity the store offers — and multi-request sequences document
//! their race windows instead of pretending to be transactions.
//!
//! # Example
//!
//! ```no_run
//! use cardex::collection::Collection;
//! use cardex::{Config, MemoryStore};
//!
//! # async fn demo() -> cardex::Result<()> {
//! let store = MemoryStore::new();
//! let layout = Config::default().layout().expect("default layout is valid");
//!
//! let collection = Collection::create(
//!     &store,
//!     &layout,
//!     "My collection".to_string(),
//!     Some("Favourite records".to_string()),
//!     None,
//! )
//! .await?;
//!
//! let record = cardex::catalog::create_blank_record(&store, &layout).await?;
//! collection.add_records(&store, &layout, &[record]).await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod annotation;
pub mod catalog;
pub mod collection;
pub mod config;
pub mod error;
pub mod gc;
pub mod http;
pub mod mapping;
pub mod normalize;
pub mod store;
pub mod term;
pub mod turtle;
pub mod vocab;

// Re-export the types nearly every caller needs.
pub use config::{Config, GraphLayout};
pub use error::{Error, Result};
pub use store::{MemoryStore, QuadStore, SparqlClient, StoreError, UpdateOp};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
