//! In-memory gateway backend.
//!
//! Holds the quad set in process and executes the same closed
//! operation set the SPARQL client renders, with matching semantics:
//! what a single update request does at the remote store, one call
//! does here. Used by the test suite and usable as a scratch store.

use async_trait::async_trait;
use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use tokio::sync::RwLock;

use super::update::UpdateOp;
use super::{QuadStore, StoreResult};
use crate::term::{
    triple_in_graph, GraphName, NamedNode, Quad, QuadPattern, Subject, Term, Triple,
};
use crate::vocab::{activity, oa, rdfs, schema};

/// In-memory quad store.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    quads: FxHashSet<Quad>,
    pending: Vec<Quad>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    fn matching(&self, pattern: &QuadPattern) -> Vec<Quad> {
        self.quads
            .iter()
            .filter(|q| pattern.matches(q))
            .cloned()
            .collect()
    }

    fn remove_matching(&mut self, pattern: &QuadPattern) {
        self.quads.retain(|q| !pattern.matches(q));
    }

    fn subject_quads(&self, graph: &NamedNode, subject: &Subject) -> Vec<Quad> {
        self.matching(
            &QuadPattern::graph(graph.clone()).with_subject(subject.clone()),
        )
    }

    fn is_member(&self, collection: &NamedNode, record: &NamedNode) -> bool {
        self.quads.contains(&Quad::new(
            collection.clone(),
            rdfs::MEMBER,
            record.clone(),
            collection.clone(),
        ))
    }

    fn count_of(&self, gc_graph: &NamedNode, record: &NamedNode) -> Option<i64> {
        let pattern = QuadPattern::graph(gc_graph.clone())
            .with_subject(record.clone())
            .with_predicate(schema::UPVOTE_COUNT);
        self.quads.iter().find(|q| pattern.matches(q)).and_then(|q| {
            match &q.object {
                Term::Literal(l) => l.value().parse::<i64>().ok(),
                _ => None,
            }
        })
    }

    fn set_count(&mut self, gc_graph: &NamedNode, record: &NamedNode, value: i64) {
        self.remove_matching(
            &QuadPattern::graph(gc_graph.clone())
                .with_subject(record.clone())
                .with_predicate(schema::UPVOTE_COUNT),
        );
        self.quads.insert(Quad::new(
            record.clone(),
            schema::UPVOTE_COUNT,
            crate::term::Literal::from(value),
            gc_graph.clone(),
        ));
    }

    fn upload_date(&self, gc_graph: &NamedNode, record: &NamedNode) -> Option<NaiveDate> {
        let pattern = QuadPattern::graph(gc_graph.clone())
            .with_subject(record.clone())
            .with_predicate(schema::UPLOAD_DATE);
        self.quads.iter().find(|q| pattern.matches(q)).and_then(|q| {
            match &q.object {
                Term::Literal(l) => l.value().parse::<NaiveDate>().ok(),
                _ => None,
            }
        })
    }

    /// Objects of a subject's triples that can themselves be subjects.
    fn dependents(&self, graph: &NamedNode, subject: &Subject) -> Vec<Subject> {
        self.subject_quads(graph, subject)
            .iter()
            .filter_map(|q| crate::term::term_to_subject(&q.object))
            .filter(|s| s != subject)
            .collect()
    }

    fn delete_with_dependents(&mut self, graph: &NamedNode, subject: &Subject) {
        for dependent in self.dependents(graph, subject) {
            self.remove_matching(
                &QuadPattern::graph(graph.clone()).with_subject(dependent),
            );
        }
        self.remove_matching(
            &QuadPattern::graph(graph.clone()).with_subject(subject.clone()),
        );
    }

    fn apply(&mut self, op: &UpdateOp) {
        match op {
            UpdateOp::DiffGraph {
                graph,
                delete,
                insert,
            } => {
                for triple in delete {
                    self.quads.remove(&triple_in_graph(triple.clone(), graph));
                }
                for triple in insert {
                    self.quads.insert(triple_in_graph(triple.clone(), graph));
                }
            }
            UpdateOp::DropGraph { graph } => {
                let graph = GraphName::NamedNode(graph.clone());
                self.quads.retain(|q| q.graph_name != graph);
            }
            UpdateOp::AddMembers {
                collection,
                gc_graph,
                records,
            } => self.add_members(collection, gc_graph, records),
            UpdateOp::RemoveMembers {
                collection,
                gc_graph,
                records,
            } => self.remove_members(collection, gc_graph, records),
            UpdateOp::ClearMembers {
                collection,
                gc_graph,
            } => {
                let members: Vec<NamedNode> = self
                    .matching(
                        &QuadPattern::graph(collection.clone())
                            .with_subject(collection.clone())
                            .with_predicate(rdfs::MEMBER),
                    )
                    .into_iter()
                    .filter_map(|q| match q.object {
                        Term::NamedNode(n) => Some(n),
                        _ => None,
                    })
                    .collect();
                self.remove_members(collection, gc_graph, &members);
            }
            UpdateOp::PurgeRecords {
                records_graph,
                gc_graph,
                records,
            } => self.purge(records_graph, gc_graph, records),
            UpdateOp::SweepGarbage {
                records_graph,
                gc_graph,
                until,
            } => self.sweep(records_graph, gc_graph, *until),
            UpdateOp::ReplaceAnnotationBody {
                annotations_graph,
                annotation,
                body,
                updated,
            } => self.replace_body(annotations_graph, annotation, body, updated),
            UpdateOp::DeleteAnnotation {
                annotations_graph,
                annotation,
            } => self.delete_annotation(annotations_graph, annotation),
        }
    }

    fn add_members(
        &mut self,
        collection: &NamedNode,
        gc_graph: &NamedNode,
        records: &[NamedNode],
    ) {
        for record in dedup(records) {
            if self.is_member(collection, record) {
                continue;
            }
            let count = self.count_of(gc_graph, record).unwrap_or(0);
            self.set_count(gc_graph, record, count + 1);
            self.quads.insert(Quad::new(
                collection.clone(),
                rdfs::MEMBER,
                record.clone(),
                collection.clone(),
            ));
        }
    }

    fn remove_members(
        &mut self,
        collection: &NamedNode,
        gc_graph: &NamedNode,
        records: &[NamedNode],
    ) {
        for record in dedup(records) {
            if !self.is_member(collection, record) {
                continue;
            }
            // The update template joins on an existing count entry;
            // without one the row does not match and nothing changes.
            let Some(count) = self.count_of(gc_graph, record) else {
                continue;
            };
            self.quads.remove(&Quad::new(
                collection.clone(),
                rdfs::MEMBER,
                record.clone(),
                collection.clone(),
            ));
            self.set_count(gc_graph, record, count - 1);
        }
    }

    fn purge(
        &mut self,
        records_graph: &NamedNode,
        gc_graph: &NamedNode,
        records: &[NamedNode],
    ) {
        for record in dedup(records) {
            // The template requires both an upload stamp and stored
            // content; a record missing either is left untouched.
            if self.upload_date(gc_graph, record).is_none() {
                continue;
            }
            let subject = Subject::NamedNode(record.clone());
            if self.subject_quads(records_graph, &subject).is_empty() {
                continue;
            }
            self.delete_with_dependents(records_graph, &subject);
            self.remove_matching(
                &QuadPattern::graph(gc_graph.clone())
                    .with_subject(record.clone())
                    .with_predicate(schema::UPLOAD_DATE),
            );
        }
    }

    fn sweep(&mut self, records_graph: &NamedNode, gc_graph: &NamedNode, until: NaiveDate) {
        let stamps: Vec<(NamedNode, NaiveDate)> = self
            .matching(
                &QuadPattern::graph(gc_graph.clone()).with_predicate(schema::UPLOAD_DATE),
            )
            .into_iter()
            .filter_map(|q| match (&q.subject, &q.object) {
                (Subject::NamedNode(r), Term::Literal(l)) => {
                    l.value().parse::<NaiveDate>().ok().map(|d| (r.clone(), d))
                }
                _ => None,
            })
            .collect();

        for (record, date) in stamps {
            if date >= until {
                continue;
            }
            if self.count_of(gc_graph, &record).unwrap_or(0) != 0 {
                continue;
            }
            let subject = Subject::NamedNode(record.clone());
            self.delete_with_dependents(records_graph, &subject);
            self.remove_matching(
                &QuadPattern::graph(gc_graph.clone()).with_subject(record.clone()),
            );
        }
    }

    fn replace_body(
        &mut self,
        annotations_graph: &NamedNode,
        annotation: &NamedNode,
        body: &Term,
        updated: &crate::term::Literal,
    ) {
        let body_pattern = QuadPattern::graph(annotations_graph.clone())
            .with_subject(annotation.clone())
            .with_predicate(oa::HAS_BODY);
        if self.matching(&body_pattern).is_empty() {
            return;
        }
        self.remove_matching(&body_pattern);
        self.remove_matching(
            &QuadPattern::graph(annotations_graph.clone())
                .with_subject(annotation.clone())
                .with_predicate(activity::UPDATED),
        );
        self.quads.insert(Quad::new(
            annotation.clone(),
            oa::HAS_BODY,
            body.clone(),
            annotations_graph.clone(),
        ));
        self.quads.insert(Quad::new(
            annotation.clone(),
            activity::UPDATED,
            updated.clone(),
            annotations_graph.clone(),
        ));
    }

    fn delete_annotation(&mut self, annotations_graph: &NamedNode, annotation: &NamedNode) {
        let subject = Subject::NamedNode(annotation.clone());
        let own = self.subject_quads(annotations_graph, &subject);
        if own.is_empty() {
            return;
        }
        let targets: Vec<Subject> = own
            .iter()
            .filter(|q| q.predicate == oa::HAS_TARGET)
            .filter_map(|q| crate::term::term_to_subject(&q.object))
            .collect();
        for target in &targets {
            let selectors: Vec<Subject> = self
                .subject_quads(annotations_graph, target)
                .iter()
                .filter(|q| q.predicate == oa::HAS_SELECTOR)
                .filter_map(|q| crate::term::term_to_subject(&q.object))
                .collect();
            for selector in selectors {
                self.remove_matching(
                    &QuadPattern::graph(annotations_graph.clone()).with_subject(selector),
                );
            }
            self.remove_matching(
                &QuadPattern::graph(annotations_graph.clone())
                    .with_subject(target.clone()),
            );
        }
        self.remove_matching(
            &QuadPattern::graph(annotations_graph.clone()).with_subject(subject),
        );
    }
}

fn dedup(records: &[NamedNode]) -> Vec<&NamedNode> {
    let mut seen = FxHashSet::default();
    records.iter().filter(|r| seen.insert(*r)).collect()
}

#[async_trait]
impl QuadStore for MemoryStore {
    async fn quads(&self, pattern: &QuadPattern) -> StoreResult<Vec<Quad>> {
        Ok(self.state.read().await.matching(pattern))
    }

    async fn insert(&self, quads: Vec<Quad>) -> StoreResult<()> {
        self.state.write().await.pending.extend(quads);
        Ok(())
    }

    async fn update(&self, op: &UpdateOp) -> StoreResult<()> {
        self.state.write().await.apply(op);
        Ok(())
    }

    async fn commit(&self) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let pending = std::mem::take(&mut state.pending);
        state.quads.extend(pending);
        Ok(())
    }
}

/// Convenience for tests and scratch setups: stage and commit in one go.
impl MemoryStore {
    /// Insert triples into a graph and commit immediately.
    pub async fn load_graph(
        &self,
        graph: &NamedNode,
        triples: impl IntoIterator<Item = Triple>,
    ) -> StoreResult<()> {
        self.insert(crate::term::triples_in_graph(triples, graph))
            .await?;
        self.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Literal;

    fn node(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn count_literal(store_quads: &[Quad]) -> Option<i64> {
        store_quads.iter().find_map(|q| match &q.object {
            Term::Literal(l) => l.value().parse().ok(),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_insert_is_invisible_until_commit() {
        let store = MemoryStore::new();
        let g = node("http://example.org/g");
        store
            .insert(vec![Quad::new(
                node("http://example.org/s"),
                node("http://example.org/p"),
                Literal::new_simple_literal("v"),
                g.clone(),
            )])
            .await
            .unwrap();

        assert!(store.quads(&QuadPattern::graph(g.clone())).await.unwrap().is_empty());
        store.commit().await.unwrap();
        assert_eq!(store.quads(&QuadPattern::graph(g)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_members_is_idempotent_and_counts_once() {
        let store = MemoryStore::new();
        let collection = node("http://example.org/collections/c");
        let gc = node("http://example.org/records-gc/");
        let record = node("http://example.org/r1");

        let op = UpdateOp::AddMembers {
            collection: collection.clone(),
            gc_graph: gc.clone(),
            records: vec![record.clone()],
        };
        store.update(&op).await.unwrap();
        store.update(&op).await.unwrap();

        let counts = store
            .quads(
                &QuadPattern::graph(gc)
                    .with_subject(record)
                    .with_predicate(schema::UPVOTE_COUNT),
            )
            .await
            .unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(count_literal(&counts), Some(1));
    }

    #[tokio::test]
    async fn test_remove_member_without_count_entry_is_a_noop() {
        let store = MemoryStore::new();
        let collection = node("http://example.org/collections/c");
        let gc = node("http://example.org/records-gc/");
        let record = node("http://example.org/r1");

        // Membership edge present but no bookkeeping entry: the
        // template's count join fails and the row stays.
        store
            .load_graph(
                &collection,
                vec![Triple::new(
                    collection.clone(),
                    rdfs::MEMBER,
                    record.clone(),
                )],
            )
            .await
            .unwrap();

        store
            .update(&UpdateOp::RemoveMembers {
                collection: collection.clone(),
                gc_graph: gc,
                records: vec![record.clone()],
            })
            .await
            .unwrap();

        let edges = store
            .quads(&QuadPattern::graph(collection).with_predicate(rdfs::MEMBER))
            .await
            .unwrap();
        assert_eq!(edges.len(), 1);
    }

    #[tokio::test]
    async fn test_drop_graph_leaves_other_graphs() {
        let store = MemoryStore::new();
        let g1 = node("http://example.org/g1");
        let g2 = node("http://example.org/g2");
        let t = Triple::new(
            node("http://example.org/s"),
            node("http://example.org/p"),
            Literal::new_simple_literal("v"),
        );
        store.load_graph(&g1, vec![t.clone()]).await.unwrap();
        store.load_graph(&g2, vec![t]).await.unwrap();

        store
            .update(&UpdateOp::DropGraph { graph: g1.clone() })
            .await
            .unwrap();

        assert!(store.quads(&QuadPattern::graph(g1)).await.unwrap().is_empty());
        assert_eq!(store.quads(&QuadPattern::graph(g2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purge_deletes_content_and_stamp_but_not_count() {
        let store = MemoryStore::new();
        let records = node("http://example.org/records/");
        let gc = node("http://example.org/records-gc/");
        let r = node("http://example.org/r1");
        let field = node("http://example.org/r1/field");

        store
            .load_graph(
                &records,
                vec![
                    Triple::new(r.clone(), node("http://example.org/p"), field.clone()),
                    Triple::new(
                        field.clone(),
                        node("http://example.org/q"),
                        Literal::new_simple_literal("v"),
                    ),
                ],
            )
            .await
            .unwrap();
        store
            .load_graph(
                &gc,
                vec![
                    Triple::new(
                        r.clone(),
                        schema::UPLOAD_DATE,
                        Literal::new_typed_literal("2026-08-01", crate::vocab::xsd::DATE),
                    ),
                    Triple::new(r.clone(), schema::UPVOTE_COUNT, Literal::from(2_i64)),
                ],
            )
            .await
            .unwrap();

        store
            .update(&UpdateOp::PurgeRecords {
                records_graph: records.clone(),
                gc_graph: gc.clone(),
                records: vec![r.clone()],
            })
            .await
            .unwrap();

        assert!(store
            .quads(&QuadPattern::graph(records))
            .await
            .unwrap()
            .is_empty());
        let gc_quads = store.quads(&QuadPattern::graph(gc)).await.unwrap();
        assert_eq!(gc_quads.len(), 1);
        assert!(gc_quads[0].predicate == schema::UPVOTE_COUNT);
    }
}
