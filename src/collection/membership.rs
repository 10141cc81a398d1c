//! Collection membership with reference-count bookkeeping.
//!
//! Membership is a set-valued relation between a collection and
//! records, with one extra obligation: every mutation adjusts the
//! record's shared reference count in the same update request. The
//! add/remove/clear operations are each one request and therefore
//! atomic at the store; `set` is composed of two and is not.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::GraphLayout;
use crate::error::Result;
use crate::store::{QuadStore, UpdateOp};
use crate::term::{NamedNode, QuadPattern, Term};
use crate::vocab::rdfs;

/// Membership engine for one collection.
#[derive(Debug, Clone)]
pub struct Membership {
    collection: NamedNode,
    gc_graph: NamedNode,
}

impl Membership {
    /// Membership of the given collection, with bookkeeping in the
    /// layout's reference-count graph.
    pub fn new(collection: NamedNode, layout: &GraphLayout) -> Self {
        Self {
            collection,
            gc_graph: layout.gc_graph().clone(),
        }
    }

    /// Current members of the collection.
    pub async fn members(&self, store: &dyn QuadStore) -> Result<Vec<NamedNode>> {
        let quads = store
            .quads(
                &QuadPattern::graph(self.collection.clone())
                    .with_subject(self.collection.clone())
                    .with_predicate(rdfs::MEMBER),
            )
            .await?;
        Ok(quads
            .into_iter()
            .filter_map(|q| match q.object {
                Term::NamedNode(n) => Some(n),
                _ => None,
            })
            .collect())
    }

    /// Add records to the collection.
    ///
    /// One update request: records already present are filtered out by
    /// the store-side NOT EXISTS test, each new member's count is
    /// incremented in the same statement, and a missing count starts
    /// from zero. Calling this twice with the same records changes
    /// nothing the second time.
    pub async fn add(&self, store: &dyn QuadStore, records: &[NamedNode]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        debug!(collection = %self.collection, count = records.len(), "adding members");
        store
            .update(&UpdateOp::AddMembers {
                collection: self.collection.clone(),
                gc_graph: self.gc_graph.clone(),
                records: records.to_vec(),
            })
            .await?;
        store.commit().await?;
        Ok(())
    }

    /// Remove records from the collection; the mirror of `add`.
    pub async fn remove(&self, store: &dyn QuadStore, records: &[NamedNode]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        debug!(collection = %self.collection, count = records.len(), "removing members");
        store
            .update(&UpdateOp::RemoveMembers {
                collection: self.collection.clone(),
                gc_graph: self.gc_graph.clone(),
                records: records.to_vec(),
            })
            .await?;
        store.commit().await?;
        Ok(())
    }

    /// Remove every member, decrementing each count by exactly one,
    /// in a single update request.
    pub async fn clear(&self, store: &dyn QuadStore) -> Result<()> {
        debug!(collection = %self.collection, "clearing members");
        store
            .update(&UpdateOp::ClearMembers {
                collection: self.collection.clone(),
                gc_graph: self.gc_graph.clone(),
            })
            .await?;
        store.commit().await?;
        Ok(())
    }

    /// Replace the membership with `target`.
    ///
    /// Composed as remove(existing − target) followed by
    /// add(target − existing) — two separate requests, NOT one atomic
    /// operation. A crash or a concurrent add/remove on the same
    /// collection between the two can leave membership or counts
    /// inconsistent with either endpoint of the transition.
    pub async fn set(&self, store: &dyn QuadStore, target: &[NamedNode]) -> Result<()> {
        let existing: FxHashSet<NamedNode> =
            self.members(store).await?.into_iter().collect();
        let target_set: FxHashSet<NamedNode> = target.iter().cloned().collect();

        let to_remove: Vec<NamedNode> = existing
            .iter()
            .filter(|r| !target_set.contains(*r))
            .cloned()
            .collect();
        let to_add: Vec<NamedNode> = target_set
            .iter()
            .filter(|r| !existing.contains(*r))
            .cloned()
            .collect();

        self.remove(store, &to_remove).await?;
        self.add(store, &to_add).await?;
        Ok(())
    }
}
