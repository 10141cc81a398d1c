//! Catalog record content.
//!
//! Records live in one shared Records graph. Their content is written
//! as a whole — skolemized, appended, stamped — and replaced as a
//! whole on a forced refresh. Membership edges live in collection
//! graphs and are never touched from here.

use tracing::info;

use crate::config::GraphLayout;
use crate::error::{Error, Result};
use crate::gc;
use crate::mapping::TermValue;
use crate::normalize::skolemize_triples;
use crate::store::QuadStore;
use crate::term::{
    quad_to_triple, triples_in_graph, NamedNode, Quad, QuadPattern, Subject, Triple,
};
use crate::vocab::{cdx, rdf, schema, xsd};

/// Whether any content is stored for the record.
pub async fn record_exists(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    record: &NamedNode,
) -> Result<bool> {
    Ok(store
        .contains(
            &QuadPattern::graph(layout.records_graph().clone())
                .with_subject(record.clone()),
        )
        .await?)
}

/// The record's stored content: its own triples plus one level of
/// dependent sub-resource triples.
pub async fn stored_record(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    record: &NamedNode,
) -> Result<Vec<Triple>> {
    let records_graph = layout.records_graph();
    let own: Vec<Quad> = store
        .quads(
            &QuadPattern::graph(records_graph.clone()).with_subject(record.clone()),
        )
        .await?;

    let mut triples: Vec<Triple> = Vec::new();
    let mut fields: Vec<Subject> = Vec::new();
    for quad in own {
        if let Some(field) = crate::term::term_to_subject(&quad.object) {
            if field != Subject::NamedNode(record.clone()) && !fields.contains(&field) {
                fields.push(field);
            }
        }
        triples.push(quad_to_triple(quad));
    }
    for field in fields {
        let dependent = store
            .quads(&QuadPattern::graph(records_graph.clone()).with_subject(field))
            .await?;
        triples.extend(dependent.into_iter().map(quad_to_triple));
    }
    Ok(triples)
}

/// Save fetched record content to the store.
///
/// The batch is skolemized, appended to the Records graph, and each of
/// the listed record subjects is stamped with today's date in the
/// bookkeeping graph; one commit covers both.
pub async fn save_records(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    content: Vec<Triple>,
    records: &[NamedNode],
) -> Result<()> {
    let clean = skolemize_triples(content);
    let mut quads = triples_in_graph(clean, layout.records_graph());

    let today = chrono::Utc::now().date_naive();
    let stamp = crate::term::Literal::new_typed_literal(
        today.format("%Y-%m-%d").to_string(),
        xsd::DATE,
    );
    for record in records {
        quads.push(Quad::new(
            record.clone(),
            schema::UPLOAD_DATE,
            stamp.clone(),
            layout.gc_graph().clone(),
        ));
    }

    store.insert(quads).await?;
    store.commit().await?;
    info!(count = records.len(), "saved record content");
    Ok(())
}

/// Forced refresh: replace a record's stored content with a freshly
/// fetched version.
///
/// Two requests — the deduplication purge, then the insert. The pair
/// is not atomic: a sweep running in between sees the record without
/// content and, if its count is transiently zero and its stamp stale,
/// may delete it entirely. The grace window on the sweep tolerates
/// this for any record touched within it. Membership edges are
/// unaffected throughout.
pub async fn refresh_record(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    record: &NamedNode,
    content: Vec<Triple>,
) -> Result<()> {
    gc::purge_records(store, layout, std::slice::from_ref(record)).await?;
    save_records(store, layout, content, std::slice::from_ref(record)).await
}

/// Fetch a record's content, or `NotFound` when nothing is stored.
pub async fn get_record(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    record: &NamedNode,
) -> Result<Vec<Triple>> {
    let triples = stored_record(store, layout, record).await?;
    if triples.is_empty() {
        return Err(Error::NotFound(format!("record {record}")));
    }
    Ok(triples)
}

/// Create a blank record: a minimal typed record under a minted URI,
/// saved through the normal path so it is stamped like any fetch.
pub async fn create_blank_record(
    store: &dyn QuadStore,
    layout: &GraphLayout,
) -> Result<NamedNode> {
    let uri = layout.mint_blank_record_uri();
    let identifier = uri
        .as_str()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let content = vec![
        Triple::new(uri.clone(), rdf::TYPE, cdx::RECORD.into_owned()),
        Triple::new(uri.clone(), schema::IDENTIFIER, identifier.to_term()),
    ];
    save_records(store, layout, content, std::slice::from_ref(&uri)).await?;
    info!(%uri, "created blank record");
    Ok(uri)
}
