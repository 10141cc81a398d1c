//! Collections: named sets of catalog records.
//!
//! A collection owns its named graph — the graph identifier is the
//! collection URI — holding its attribute triples and its membership
//! edges. Attributes go through the object-graph mapping; membership
//! goes through the [`Membership`] engine so reference counts stay
//! exact.

mod membership;

pub use membership::Membership;

use tracing::info;

use crate::config::GraphLayout;
use crate::error::{Error, Result};
use crate::mapping::{self, Relation, TermValue};
use crate::store::{QuadStore, UpdateOp};
use crate::term::{NamedNode, QuadPattern, Subject, Term, Triple};
use crate::vocab::{activity, cdx, rdf};

/// A collection with its typed attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// URI of the collection; doubles as its graph identifier.
    pub uri: NamedNode,
    /// Human-readable name.
    pub name: Option<String>,
    /// Free-form description.
    pub summary: Option<String>,
    /// URI of the owning scope.
    pub scope: Option<NamedNode>,
}

fn name_relation() -> Relation {
    Relation::unique(activity::NAME)
}

fn summary_relation() -> Relation {
    Relation::unique(activity::SUMMARY)
}

fn scope_relation() -> Relation {
    Relation::unique(activity::CONTEXT)
}

/// Derive the URI slug for a collection name.
///
/// Lowercases, maps whitespace runs to single underscores, and drops
/// anything that may not appear in a slug.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_space = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            if !last_was_space {
                slug.push('_');
            }
            last_was_space = true;
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            slug.push(c.to_ascii_lowercase());
            last_was_space = false;
        }
    }
    slug
}

impl Collection {
    /// An empty collection at the given URI.
    pub fn new(uri: NamedNode) -> Self {
        Self {
            uri,
            name: None,
            summary: None,
            scope: None,
        }
    }

    fn subject(&self) -> Subject {
        Subject::NamedNode(self.uri.clone())
    }

    /// Whether a collection exists at this URI.
    pub async fn exists(store: &dyn QuadStore, uri: &NamedNode) -> Result<bool> {
        Ok(store
            .contains(
                &QuadPattern::graph(uri.clone())
                    .with_subject(uri.clone())
                    .with_predicate(rdf::TYPE)
                    .with_object(cdx::COLLECTION.into_owned()),
            )
            .await?)
    }

    /// Load a collection, or `NotFound`.
    pub async fn load(store: &dyn QuadStore, uri: &NamedNode) -> Result<Self> {
        if !Self::exists(store, uri).await? {
            return Err(Error::NotFound(format!("collection {uri}")));
        }
        let mut collection = Self::new(uri.clone());
        collection.refresh(store).await?;
        Ok(collection)
    }

    /// Re-read all attributes from the store.
    pub async fn refresh(&mut self, store: &dyn QuadStore) -> Result<()> {
        let subject = self.subject();
        self.name = unique_value(store, &self.uri, &subject, &name_relation()).await?;
        self.summary = unique_value(store, &self.uri, &subject, &summary_relation()).await?;
        self.scope = unique_value(store, &self.uri, &subject, &scope_relation()).await?;
        Ok(())
    }

    /// Persist all attributes in one update: the stored triples of the
    /// declared relations are diffed against the desired state, so
    /// only actual changes travel. Membership edges are not touched.
    pub async fn save(&self, store: &dyn QuadStore) -> Result<()> {
        let subject = self.subject();

        let mut desired: Vec<Triple> = vec![Triple::new(
            subject.clone(),
            rdf::TYPE,
            cdx::COLLECTION.into_owned(),
        )];
        if let Some(name) = &self.name {
            desired.push(Triple::new(subject.clone(), activity::NAME, name.to_term()));
        }
        if let Some(summary) = &self.summary {
            desired.push(Triple::new(
                subject.clone(),
                activity::SUMMARY,
                summary.to_term(),
            ));
        }
        if let Some(scope) = &self.scope {
            desired.push(Triple::new(
                subject.clone(),
                activity::CONTEXT,
                scope.to_term(),
            ));
        }

        let mut stored: Vec<Triple> = Vec::new();
        for relation in [
            Relation::unique(rdf::TYPE),
            name_relation(),
            summary_relation(),
            scope_relation(),
        ] {
            let values = relation.get(store, &self.uri, &subject).await?;
            stored.extend(mapping::triples_for(
                &subject,
                &relation.predicate().into_owned(),
                &values,
            ));
        }

        let op = mapping::diff_object(&self.uri, stored, desired);
        if op.is_noop() {
            return Ok(());
        }
        store.update(&op).await?;
        store.commit().await?;
        Ok(())
    }

    /// Create and persist a new collection, rejecting a duplicate URI.
    pub async fn create(
        store: &dyn QuadStore,
        layout: &GraphLayout,
        name: String,
        summary: Option<String>,
        scope: Option<NamedNode>,
    ) -> Result<Self> {
        let slug = slugify(&name);
        let uri = layout
            .collection_uri(&slug)
            .map_err(|e| Error::Validation(e.to_string()))?;
        if Self::exists(store, &uri).await? {
            return Err(Error::Validation(format!(
                "a collection already exists at {uri}"
            )));
        }
        let collection = Self {
            uri,
            name: Some(name),
            summary,
            scope,
        };
        collection.save(store).await?;
        info!(uri = %collection.uri, "created collection");
        Ok(collection)
    }

    /// Delete the collection by dropping its entire named graph in one
    /// operation.
    ///
    /// The reference counts of former members are NOT decremented:
    /// the membership edges disappear with the graph but the
    /// bookkeeping keeps counting them. Call [`Self::clear_records`]
    /// first when the counts are expected to reflect the removal.
    pub async fn delete(&self, store: &dyn QuadStore) -> Result<()> {
        store
            .update(&UpdateOp::DropGraph {
                graph: self.uri.clone(),
            })
            .await?;
        store.commit().await?;
        info!(uri = %self.uri, "deleted collection graph");
        Ok(())
    }

    /// The membership engine for this collection.
    pub fn membership(&self, layout: &GraphLayout) -> Membership {
        Membership::new(self.uri.clone(), layout)
    }

    /// Current record members.
    pub async fn records(&self, store: &dyn QuadStore, layout: &GraphLayout) -> Result<Vec<NamedNode>> {
        self.membership(layout).members(store).await
    }

    /// Add records; see [`Membership::add`].
    pub async fn add_records(
        &self,
        store: &dyn QuadStore,
        layout: &GraphLayout,
        records: &[NamedNode],
    ) -> Result<()> {
        self.membership(layout).add(store, records).await
    }

    /// Remove records; see [`Membership::remove`].
    pub async fn remove_records(
        &self,
        store: &dyn QuadStore,
        layout: &GraphLayout,
        records: &[NamedNode],
    ) -> Result<()> {
        self.membership(layout).remove(store, records).await
    }

    /// Replace the membership; see [`Membership::set`] for the
    /// non-atomicity caveat.
    pub async fn set_records(
        &self,
        store: &dyn QuadStore,
        layout: &GraphLayout,
        records: &[NamedNode],
    ) -> Result<()> {
        self.membership(layout).set(store, records).await
    }

    /// Remove every member; see [`Membership::clear`].
    pub async fn clear_records(
        &self,
        store: &dyn QuadStore,
        layout: &GraphLayout,
    ) -> Result<()> {
        self.membership(layout).clear(store).await
    }
}

async fn unique_value<V: TermValue>(
    store: &dyn QuadStore,
    graph: &NamedNode,
    subject: &Subject,
    relation: &Relation,
) -> Result<Option<V>> {
    let mut values: Vec<Term> = relation.get(store, graph, subject).await?;
    match values.len() {
        0 => Ok(None),
        1 => Ok(Some(V::from_term(&values.remove(0))?)),
        _ => Err(crate::mapping::MappingError::UniqueViolation(
            relation.predicate().to_string(),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My collection"), "my_collection");
        assert_eq!(slugify("  Venice   1600–1650!  "), "venice_16001650");
        assert_eq!(slugify("already_a-slug"), "already_a-slug");
    }
}
