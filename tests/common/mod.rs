//! Shared fixtures for the integration tests.

use cardex::term::{Literal, NamedNode, Triple};
use cardex::vocab::{cdx, rdf, schema};
use cardex::{GraphLayout, MemoryStore, QuadStore};

pub fn layout() -> GraphLayout {
    GraphLayout::new("https://cardex.dev/test/").unwrap()
}

pub fn node(iri: &str) -> NamedNode {
    NamedNode::new(iri).unwrap()
}

pub fn record_uri(name: &str) -> NamedNode {
    node(&format!("https://catalog.example.org/records/{name}"))
}

/// Minimal record content: a type triple and a title.
pub fn record_content(uri: &NamedNode, title: &str) -> Vec<Triple> {
    vec![
        Triple::new(uri.clone(), rdf::TYPE, cdx::RECORD.into_owned()),
        Triple::new(
            uri.clone(),
            node("https://schema.org/name"),
            Literal::new_simple_literal(title),
        ),
    ]
}

/// Save a record with minimal content, stamping it today.
pub async fn save_record(store: &MemoryStore, layout: &GraphLayout, uri: &NamedNode) {
    cardex::catalog::save_records(
        store,
        layout,
        record_content(uri, uri.as_str()),
        std::slice::from_ref(uri),
    )
    .await
    .unwrap();
}

/// Sort URIs lexically, for set-wise comparisons.
pub fn sorted(mut uris: Vec<NamedNode>) -> Vec<NamedNode> {
    uris.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    uris
}

/// Current reference count of a record, defaulting to 0.
pub async fn count_of(store: &MemoryStore, layout: &GraphLayout, uri: &NamedNode) -> i64 {
    cardex::gc::reference_count(store, layout, uri)
        .await
        .unwrap()
        .count
}

/// Whether the bookkeeping graph holds an explicit count entry.
pub async fn has_count_entry(
    store: &MemoryStore,
    layout: &GraphLayout,
    uri: &NamedNode,
) -> bool {
    use cardex::term::QuadPattern;
    store
        .contains(
            &QuadPattern::graph(layout.gc_graph().clone())
                .with_subject(uri.clone())
                .with_predicate(schema::UPVOTE_COUNT),
        )
        .await
        .unwrap()
}
