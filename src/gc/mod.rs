//! Reference-counting garbage collection.
//!
//! The bookkeeping graph holds, per record, an integer count of the
//! collections currently containing it and the date its content was
//! last written. The membership engine maintains the count
//! incrementally; this module owns the two destructive passes over the
//! bookkeeping: the deduplication purge that precedes a fresh insert,
//! and the scheduled sweep that forgets unreferenced, stale records.

use chrono::NaiveDate;
use tracing::info;

use crate::config::GraphLayout;
use crate::error::Result;
use crate::mapping::TermValue;
use crate::store::{QuadStore, UpdateOp};
use crate::term::{NamedNode, QuadPattern, Term};
use crate::vocab::schema;

/// Per-record bookkeeping tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCount {
    /// Number of distinct collections currently containing the record;
    /// an absent entry reads as 0.
    pub count: i64,
    /// Date the record's content was last written, if it ever was.
    pub last_update: Option<NaiveDate>,
}

/// Read a record's bookkeeping entry.
pub async fn reference_count(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    record: &NamedNode,
) -> Result<ReferenceCount> {
    let quads = store
        .quads(
            &QuadPattern::graph(layout.gc_graph().clone()).with_subject(record.clone()),
        )
        .await?;

    let mut count = 0;
    let mut last_update = None;
    for quad in &quads {
        if quad.predicate == schema::UPVOTE_COUNT {
            count = decode_count(&quad.object)?;
        } else if quad.predicate == schema::UPLOAD_DATE {
            last_update = Some(NaiveDate::from_term(&quad.object)?);
        }
    }
    Ok(ReferenceCount { count, last_update })
}

fn decode_count(term: &Term) -> Result<i64> {
    Ok(i64::from_term(term)?)
}

/// Deduplication purge: delete the listed records' stored content,
/// the content of their dependent sub-resources, and their upload
/// stamps — leaving reference counts alone, so membership survives a
/// refresh. Targets are bound explicitly; nothing is scanned.
pub async fn purge_records(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    records: &[NamedNode],
) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    store
        .update(&UpdateOp::PurgeRecords {
            records_graph: layout.records_graph().clone(),
            gc_graph: layout.gc_graph().clone(),
            records: records.to_vec(),
        })
        .await?;
    store.commit().await?;
    info!(count = records.len(), "purged stored records");
    Ok(())
}

/// Garbage sweep: forget every record whose count is zero (or absent)
/// and whose last update lies before `until`.
///
/// One update request; re-running with the same or a later cutoff
/// after a successful run is a no-op, so a failed sweep is simply
/// retried wholesale on the next scheduled run. The sweep may run
/// concurrently with live traffic — restricting it to zero-count,
/// stale targets narrows the window in which a record mid-refresh
/// could be caught with a transient zero count, but does not close it.
pub async fn collect_garbage(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    until: NaiveDate,
) -> Result<()> {
    store
        .update(&UpdateOp::SweepGarbage {
            records_graph: layout.records_graph().clone(),
            gc_graph: layout.gc_graph().clone(),
            until,
        })
        .await?;
    store.commit().await?;
    info!(%until, "swept unreferenced records");
    Ok(())
}
