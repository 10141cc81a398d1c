//! Typed relations over one named graph.
//!
//! The closed set of relation kinds replaces the duck-typed field
//! descriptors of classic object mappers: behavior is selected by the
//! tag, and every kind implements the same surface — get, add, remove,
//! set, clear. Writes are minimal diffs: the stored set S and desired
//! set D produce one update deleting S∖D and inserting D∖S, so
//! concurrent readers never observe a transient empty state. There is
//! no optimistic locking; racing writers on the same predicate resolve
//! by last-committed-write-wins at the store.

use crate::error::Result;
use crate::mapping::{MappingError, MappingResult, TermValue};
use crate::store::{QuadStore, UpdateOp};
use crate::term::{NamedNode, NamedNodeRef, QuadPattern, Subject, Term, Triple};

/// The closed set of relation behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Required, exactly one value.
    Single,
    /// Optional, at most one value.
    Unique,
    /// Unordered set of values.
    Set,
}

/// One predicate of an object, with its behavior tag.
#[derive(Debug, Clone)]
pub struct Relation {
    predicate: NamedNode,
    kind: RelationKind,
}

impl Relation {
    /// A required single-valued relation.
    pub fn single(predicate: impl Into<NamedNode>) -> Self {
        Self {
            predicate: predicate.into(),
            kind: RelationKind::Single,
        }
    }

    /// An optional unique-valued relation.
    pub fn unique(predicate: impl Into<NamedNode>) -> Self {
        Self {
            predicate: predicate.into(),
            kind: RelationKind::Unique,
        }
    }

    /// A multi-valued set relation.
    pub fn set_valued(predicate: impl Into<NamedNode>) -> Self {
        Self {
            predicate: predicate.into(),
            kind: RelationKind::Set,
        }
    }

    /// The relation's predicate.
    pub fn predicate(&self) -> NamedNodeRef<'_> {
        self.predicate.as_ref()
    }

    /// The relation's behavior tag.
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Check an offered value set against the kind's cardinality.
    pub fn check_cardinality(&self, len: usize) -> MappingResult<()> {
        match self.kind {
            RelationKind::Single if len == 0 => {
                Err(MappingError::MissingValue(self.predicate.to_string()))
            }
            RelationKind::Single | RelationKind::Unique if len > 1 => {
                Err(MappingError::UniqueViolation(self.predicate.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// All stored values of this relation for a subject.
    pub async fn get(
        &self,
        store: &dyn QuadStore,
        graph: &NamedNode,
        subject: &Subject,
    ) -> Result<Vec<Term>> {
        let quads = store
            .quads(
                &QuadPattern::graph(graph.clone())
                    .with_subject(subject.clone())
                    .with_predicate(self.predicate.clone()),
            )
            .await?;
        Ok(quads.into_iter().map(|q| q.object).collect())
    }

    /// Stored values decoded to a typed value.
    pub async fn get_typed<V: TermValue>(
        &self,
        store: &dyn QuadStore,
        graph: &NamedNode,
        subject: &Subject,
    ) -> Result<Vec<V>> {
        let terms = self.get(store, graph, subject).await?;
        terms
            .iter()
            .map(|t| V::from_term(t).map_err(Into::into))
            .collect()
    }

    /// Replace the stored value set with `values` in one update.
    pub async fn set(
        &self,
        store: &dyn QuadStore,
        graph: &NamedNode,
        subject: &Subject,
        values: Vec<Term>,
    ) -> Result<()> {
        self.check_cardinality(values.len())?;
        let stored = self.get(store, graph, subject).await?;
        let op = diff_update(graph, subject, &self.predicate, &stored, &values);
        if op.is_noop() {
            return Ok(());
        }
        store.update(&op).await?;
        store.commit().await?;
        Ok(())
    }

    /// Add values, keeping what is already stored.
    pub async fn add(
        &self,
        store: &dyn QuadStore,
        graph: &NamedNode,
        subject: &Subject,
        values: Vec<Term>,
    ) -> Result<()> {
        let stored = self.get(store, graph, subject).await?;
        let mut desired = stored.clone();
        for value in values {
            if !desired.contains(&value) {
                desired.push(value);
            }
        }
        self.check_cardinality(desired.len())?;
        let op = diff_update(graph, subject, &self.predicate, &stored, &desired);
        if op.is_noop() {
            return Ok(());
        }
        store.update(&op).await?;
        store.commit().await?;
        Ok(())
    }

    /// Remove the given values, leaving the rest.
    pub async fn remove(
        &self,
        store: &dyn QuadStore,
        graph: &NamedNode,
        subject: &Subject,
        values: &[Term],
    ) -> Result<()> {
        let stored = self.get(store, graph, subject).await?;
        let desired: Vec<Term> = stored
            .iter()
            .filter(|t| !values.contains(t))
            .cloned()
            .collect();
        let op = diff_update(graph, subject, &self.predicate, &stored, &desired);
        if op.is_noop() {
            return Ok(());
        }
        store.update(&op).await?;
        store.commit().await?;
        Ok(())
    }

    /// Delete every stored value of this relation.
    pub async fn clear(
        &self,
        store: &dyn QuadStore,
        graph: &NamedNode,
        subject: &Subject,
    ) -> Result<()> {
        let stored = self.get(store, graph, subject).await?;
        let op = diff_update(graph, subject, &self.predicate, &stored, &[]);
        if op.is_noop() {
            return Ok(());
        }
        store.update(&op).await?;
        store.commit().await?;
        Ok(())
    }
}

/// Desired triples for a whole object: used by model `save`
/// implementations to diff every declared relation in one update.
pub(crate) fn triples_for(
    subject: &Subject,
    predicate: &NamedNode,
    values: &[Term],
) -> Vec<Triple> {
    values
        .iter()
        .map(|v| Triple::new(subject.clone(), predicate.clone(), v.clone()))
        .collect()
}

fn diff_update(
    graph: &NamedNode,
    subject: &Subject,
    predicate: &NamedNode,
    stored: &[Term],
    desired: &[Term],
) -> UpdateOp {
    let delete: Vec<Triple> = stored
        .iter()
        .filter(|t| !desired.contains(t))
        .map(|t| Triple::new(subject.clone(), predicate.clone(), t.clone()))
        .collect();
    let insert: Vec<Triple> = desired
        .iter()
        .filter(|t| !stored.contains(t))
        .map(|t| Triple::new(subject.clone(), predicate.clone(), t.clone()))
        .collect();
    UpdateOp::DiffGraph {
        graph: graph.clone(),
        delete,
        insert,
    }
}

/// Compute the diff between all stored triples of an object's declared
/// relations and the desired state, as one update operation.
pub(crate) fn diff_object(
    graph: &NamedNode,
    stored: Vec<Triple>,
    desired: Vec<Triple>,
) -> UpdateOp {
    let delete: Vec<Triple> = stored
        .iter()
        .filter(|t| !desired.contains(t))
        .cloned()
        .collect();
    let insert: Vec<Triple> = desired
        .iter()
        .filter(|t| !stored.contains(t))
        .cloned()
        .collect();
    UpdateOp::DiffGraph {
        graph: graph.clone(),
        delete,
        insert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::term::Literal;

    fn node(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn literal(v: &str) -> Term {
        Term::Literal(Literal::new_simple_literal(v))
    }

    #[tokio::test]
    async fn test_set_replaces_values_with_minimal_diff() {
        let store = MemoryStore::new();
        let graph = node("http://example.org/g");
        let subject = Subject::NamedNode(node("http://example.org/s"));
        let relation = Relation::set_valued(node("http://example.org/tag"));

        relation
            .set(&store, &graph, &subject, vec![literal("a"), literal("b")])
            .await
            .unwrap();
        relation
            .set(&store, &graph, &subject, vec![literal("b"), literal("c")])
            .await
            .unwrap();

        let mut values: Vec<String> = relation
            .get_typed(&store, &graph, &subject)
            .await
            .unwrap();
        values.sort();
        assert_eq!(values, vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_unique_rejects_multiple_values() {
        let store = MemoryStore::new();
        let graph = node("http://example.org/g");
        let subject = Subject::NamedNode(node("http://example.org/s"));
        let relation = Relation::unique(node("http://example.org/name"));

        let err = relation
            .set(
                &store,
                &graph,
                &subject,
                vec![literal("one"), literal("two")],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Mapping(MappingError::UniqueViolation(_))
        ));

        // Nothing was written.
        assert!(relation.get(&store, &graph, &subject).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_requires_a_value() {
        let relation = Relation::single(node("http://example.org/name"));
        assert!(relation.check_cardinality(0).is_err());
        assert!(relation.check_cardinality(1).is_ok());
        assert!(relation.check_cardinality(2).is_err());
    }

    #[tokio::test]
    async fn test_add_and_remove() {
        let store = MemoryStore::new();
        let graph = node("http://example.org/g");
        let subject = Subject::NamedNode(node("http://example.org/s"));
        let relation = Relation::set_valued(node("http://example.org/tag"));

        relation
            .add(&store, &graph, &subject, vec![literal("a")])
            .await
            .unwrap();
        relation
            .add(&store, &graph, &subject, vec![literal("a"), literal("b")])
            .await
            .unwrap();
        assert_eq!(relation.get(&store, &graph, &subject).await.unwrap().len(), 2);

        relation
            .remove(&store, &graph, &subject, &[literal("a")])
            .await
            .unwrap();
        assert_eq!(
            relation.get(&store, &graph, &subject).await.unwrap(),
            vec![literal("b")]
        );

        relation.clear(&store, &graph, &subject).await.unwrap();
        assert!(relation.get(&store, &graph, &subject).await.unwrap().is_empty());
    }
}
