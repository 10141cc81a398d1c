//! The closed set of update operations the gateway accepts.
//!
//! Every mutation the engine performs is one of these operations, and
//! each renders to exactly one SPARQL update request — the unit of
//! atomicity the remote store guarantees. Caller data (URIs, literals)
//! is injected through the terms' N-Triples `Display`, which escapes
//! literals and only ever prints IRIs that were validated at
//! construction; no raw strings reach the query text.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::term::{Literal, NamedNode, Term, Triple};
use crate::vocab::{rdfs, schema, xsd};
use crate::vocab::{activity, oa};

/// A single-request update against the quad store.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Replace one triple set with another inside one graph:
    /// `DELETE DATA` the stored-minus-desired triples and
    /// `INSERT DATA` the desired-minus-stored ones, in one request,
    /// so concurrent readers never observe a transient empty state.
    DiffGraph {
        graph: NamedNode,
        delete: Vec<Triple>,
        insert: Vec<Triple>,
    },

    /// Remove an object's entire named graph in one operation.
    DropGraph { graph: NamedNode },

    /// Insert membership edges for the given records into a collection
    /// graph, incrementing each record's reference count in the same
    /// statement. Records that are already members are filtered out by
    /// a NOT EXISTS test, which makes the operation idempotent and
    /// keeps the counts exact. A missing count reads as 0 before the
    /// increment.
    AddMembers {
        collection: NamedNode,
        gc_graph: NamedNode,
        records: Vec<NamedNode>,
    },

    /// Mirror of `AddMembers`: only current members match, their edge
    /// is deleted and their count decremented in the same statement.
    RemoveMembers {
        collection: NamedNode,
        gc_graph: NamedNode,
        records: Vec<NamedNode>,
    },

    /// Remove every current member of a collection, decrementing each
    /// count by exactly one, in a single request.
    ClearMembers {
        collection: NamedNode,
        gc_graph: NamedNode,
    },

    /// Deduplication purge: delete the listed records' content
    /// statements and those of their dependent sub-resources from the
    /// Records graph, plus their upload stamps, leaving the reference
    /// counts alone. Targets are bound via VALUES, never a scan.
    PurgeRecords {
        records_graph: NamedNode,
        gc_graph: NamedNode,
        records: Vec<NamedNode>,
    },

    /// Garbage sweep: forget every record whose bookkeeping shows a
    /// zero (or absent) count and an upload stamp older than `until`.
    /// Content, dependent sub-resources and the bookkeeping entry all
    /// go; re-running with the same cutoff is a no-op.
    SweepGarbage {
        records_graph: NamedNode,
        gc_graph: NamedNode,
        until: NaiveDate,
    },

    /// Replace an annotation's body and update timestamp. Only the
    /// body and `as:updated` are editable; the request is a no-op for
    /// an annotation without a stored body.
    ReplaceAnnotationBody {
        annotations_graph: NamedNode,
        annotation: NamedNode,
        body: Term,
        updated: Literal,
    },

    /// Delete an annotation with its target and selector nodes.
    DeleteAnnotation {
        annotations_graph: NamedNode,
        annotation: NamedNode,
    },
}

impl UpdateOp {
    /// Render the operation as one SPARQL 1.1 update request.
    pub fn to_sparql(&self) -> String {
        match self {
            UpdateOp::DiffGraph {
                graph,
                delete,
                insert,
            } => render_diff(graph, delete, insert),
            UpdateOp::DropGraph { graph } => format!("DROP SILENT GRAPH {graph}"),
            UpdateOp::AddMembers {
                collection,
                gc_graph,
                records,
            } => render_add_members(collection, gc_graph, records),
            UpdateOp::RemoveMembers {
                collection,
                gc_graph,
                records,
            } => render_remove_members(collection, gc_graph, records),
            UpdateOp::ClearMembers {
                collection,
                gc_graph,
            } => render_clear_members(collection, gc_graph),
            UpdateOp::PurgeRecords {
                records_graph,
                gc_graph,
                records,
            } => render_purge(records_graph, gc_graph, records),
            UpdateOp::SweepGarbage {
                records_graph,
                gc_graph,
                until,
            } => render_sweep(records_graph, gc_graph, *until),
            UpdateOp::ReplaceAnnotationBody {
                annotations_graph,
                annotation,
                body,
                updated,
            } => render_replace_body(annotations_graph, annotation, body, updated),
            UpdateOp::DeleteAnnotation {
                annotations_graph,
                annotation,
            } => render_delete_annotation(annotations_graph, annotation),
        }
    }

    /// An operation that cannot change anything need not be issued.
    pub fn is_noop(&self) -> bool {
        match self {
            UpdateOp::DiffGraph { delete, insert, .. } => {
                delete.is_empty() && insert.is_empty()
            }
            UpdateOp::AddMembers { records, .. }
            | UpdateOp::RemoveMembers { records, .. }
            | UpdateOp::PurgeRecords { records, .. } => records.is_empty(),
            _ => false,
        }
    }
}

/// Render a `VALUES ?var { <a> <b> … }` binding.
fn values_clause(var: &str, nodes: &[NamedNode]) -> String {
    let mut out = format!("VALUES ?{var} {{");
    for node in nodes {
        let _ = write!(out, " {node}");
    }
    out.push_str(" }");
    out
}

fn triple_block(out: &mut String, triples: &[Triple], indent: &str) {
    for t in triples {
        let _ = writeln!(out, "{indent}{} {} {} .", t.subject, t.predicate, t.object);
    }
}

fn date_literal(date: NaiveDate) -> Literal {
    Literal::new_typed_literal(date.format("%Y-%m-%d").to_string(), xsd::DATE)
}

fn render_diff(graph: &NamedNode, delete: &[Triple], insert: &[Triple]) -> String {
    let mut out = String::new();
    if !delete.is_empty() {
        out.push_str("DELETE DATA {\n");
        let _ = writeln!(out, "  GRAPH {graph} {{");
        triple_block(&mut out, delete, "    ");
        out.push_str("  }\n}");
    }
    if !insert.is_empty() {
        if !out.is_empty() {
            out.push_str(" ;\n");
        }
        out.push_str("INSERT DATA {\n");
        let _ = writeln!(out, "  GRAPH {graph} {{");
        triple_block(&mut out, insert, "    ");
        out.push_str("  }\n}");
    }
    out
}

fn render_add_members(
    collection: &NamedNode,
    gc_graph: &NamedNode,
    records: &[NamedNode],
) -> String {
    format!(
        "\
DELETE {{
  GRAPH ?gc {{ ?r {count} ?count . }}
}}
INSERT {{
  GRAPH ?gc {{ ?r {count} ?count_upd . }}
  GRAPH ?collection {{ ?collection {member} ?r . }}
}}
WHERE {{
  {collection_values}
  {gc_values}
  {record_values}
  GRAPH ?collection {{ FILTER NOT EXISTS {{ ?collection {member} ?r }} }}
  GRAPH ?gc {{ OPTIONAL {{ ?r {count} ?c }} }}
  BIND(IF(BOUND(?c), ?c, 0) AS ?count)
  BIND(?count + 1 AS ?count_upd)
}}",
        count = schema::UPVOTE_COUNT,
        member = rdfs::MEMBER,
        collection_values = values_clause("collection", std::slice::from_ref(collection)),
        gc_values = values_clause("gc", std::slice::from_ref(gc_graph)),
        record_values = values_clause("r", records),
    )
}

fn render_remove_members(
    collection: &NamedNode,
    gc_graph: &NamedNode,
    records: &[NamedNode],
) -> String {
    format!(
        "\
DELETE {{
  GRAPH ?gc {{ ?r {count} ?count . }}
  GRAPH ?collection {{ ?collection {member} ?r . }}
}}
INSERT {{
  GRAPH ?gc {{ ?r {count} ?count_upd . }}
}}
WHERE {{
  {collection_values}
  {gc_values}
  {record_values}
  GRAPH ?collection {{ FILTER EXISTS {{ ?collection {member} ?r }} }}
  GRAPH ?gc {{ ?r {count} ?count }}
  BIND(?count - 1 AS ?count_upd)
}}",
        count = schema::UPVOTE_COUNT,
        member = rdfs::MEMBER,
        collection_values = values_clause("collection", std::slice::from_ref(collection)),
        gc_values = values_clause("gc", std::slice::from_ref(gc_graph)),
        record_values = values_clause("r", records),
    )
}

fn render_clear_members(collection: &NamedNode, gc_graph: &NamedNode) -> String {
    format!(
        "\
DELETE {{
  GRAPH ?gc {{ ?r {count} ?count . }}
  GRAPH ?collection {{ ?collection {member} ?r . }}
}}
INSERT {{
  GRAPH ?gc {{ ?r {count} ?count_upd . }}
}}
WHERE {{
  {collection_values}
  {gc_values}
  GRAPH ?collection {{ ?collection {member} ?r . }}
  GRAPH ?gc {{ ?r {count} ?count }}
  BIND(?count - 1 AS ?count_upd)
}}",
        count = schema::UPVOTE_COUNT,
        member = rdfs::MEMBER,
        collection_values = values_clause("collection", std::slice::from_ref(collection)),
        gc_values = values_clause("gc", std::slice::from_ref(gc_graph)),
    )
}

fn render_purge(
    records_graph: &NamedNode,
    gc_graph: &NamedNode,
    records: &[NamedNode],
) -> String {
    format!(
        "\
DELETE {{
  GRAPH {records_graph} {{
    ?r ?p1 ?o1 .
    ?f ?p2 ?o2 .
  }}
  GRAPH {gc_graph} {{ ?r {stamp} ?d . }}
}}
WHERE {{
  {record_values}
  GRAPH {gc_graph} {{ ?r {stamp} ?d . }}
  GRAPH {records_graph} {{
    ?r ?p1 ?o1 ;
       ?pt ?f .
    OPTIONAL {{ ?f ?p2 ?o2 . }}
  }}
}}",
        stamp = schema::UPLOAD_DATE,
        record_values = values_clause("r", records),
    )
}

fn render_sweep(
    records_graph: &NamedNode,
    gc_graph: &NamedNode,
    until: NaiveDate,
) -> String {
    format!(
        "\
DELETE {{
  GRAPH {records_graph} {{
    ?r ?p1 ?o1 .
    ?f ?p2 ?o2 .
  }}
  GRAPH {gc_graph} {{
    ?r {stamp} ?d .
    ?r {count} ?c .
  }}
}}
WHERE {{
  GRAPH {gc_graph} {{
    ?r {stamp} ?d .
    OPTIONAL {{ ?r {count} ?c }}
  }}
  FILTER(?d < {cutoff})
  FILTER(!BOUND(?c) || ?c = 0)
  OPTIONAL {{
    GRAPH {records_graph} {{
      ?r ?p1 ?o1 .
      OPTIONAL {{ ?r ?pt ?f . ?f ?p2 ?o2 . }}
    }}
  }}
}}",
        stamp = schema::UPLOAD_DATE,
        count = schema::UPVOTE_COUNT,
        cutoff = date_literal(until),
    )
}

fn render_replace_body(
    annotations_graph: &NamedNode,
    annotation: &NamedNode,
    body: &Term,
    updated: &Literal,
) -> String {
    format!(
        "\
DELETE {{
  GRAPH {annotations_graph} {{
    {annotation} {has_body} ?o .
    {annotation} {updated_pred} ?u .
  }}
}}
INSERT {{
  GRAPH {annotations_graph} {{
    {annotation} {has_body} {body} ;
                 {updated_pred} {updated} .
  }}
}}
WHERE {{
  GRAPH {annotations_graph} {{
    {annotation} {has_body} ?o .
    OPTIONAL {{ {annotation} {updated_pred} ?u }}
  }}
}}",
        has_body = oa::HAS_BODY,
        updated_pred = activity::UPDATED,
    )
}

fn render_delete_annotation(
    annotations_graph: &NamedNode,
    annotation: &NamedNode,
) -> String {
    format!(
        "\
DELETE {{
  GRAPH {annotations_graph} {{
    {annotation} ?pa ?oa .
    ?target ?pt ?ot .
    ?selector ?ps ?os .
  }}
}}
WHERE {{
  GRAPH {annotations_graph} {{
    {annotation} ?pa ?oa .
    OPTIONAL {{
      {annotation} {has_target} ?target .
      ?target ?pt ?ot .
      OPTIONAL {{ ?target {has_selector} ?selector . ?selector ?ps ?os . }}
    }}
  }}
}}",
        has_target = oa::HAS_TARGET,
        has_selector = oa::HAS_SELECTOR,
    )
}

/// Render buffered quads as one `INSERT DATA` request, grouped by graph.
pub fn render_insert_data(quads: &[crate::term::Quad]) -> String {
    use crate::term::GraphName;

    let mut out = String::from("INSERT DATA {\n");
    let mut remaining: Vec<&crate::term::Quad> = quads.iter().collect();
    while let Some(first) = remaining.first() {
        let graph = first.graph_name.clone();
        let (batch, rest): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|q| q.graph_name == graph);
        remaining = rest;
        match &graph {
            GraphName::NamedNode(g) => {
                let _ = writeln!(out, "  GRAPH {g} {{");
                for q in &batch {
                    let _ =
                        writeln!(out, "    {} {} {} .", q.subject, q.predicate, q.object);
                }
                out.push_str("  }\n");
            }
            _ => {
                for q in &batch {
                    let _ =
                        writeln!(out, "  {} {} {} .", q.subject, q.predicate, q.object);
                }
            }
        }
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Quad;

    fn node(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn parses(update: &str) -> spargebra::Update {
        spargebra::Update::parse(update, None)
            .unwrap_or_else(|e| panic!("rendered update does not parse: {e}\n{update}"))
    }

    #[test]
    fn test_add_members_renders_valid_sparql() {
        let op = UpdateOp::AddMembers {
            collection: node("http://example.org/collections/c1"),
            gc_graph: node("http://example.org/records-gc/"),
            records: vec![node("http://example.org/r1"), node("http://example.org/r2")],
        };
        let text = op.to_sparql();
        parses(&text);
        assert!(text.contains("FILTER NOT EXISTS"));
        assert!(text.contains("IF(BOUND(?c), ?c, 0)"));
        assert!(text.contains("?count + 1"));
        assert!(text.contains("<http://example.org/r1> <http://example.org/r2>"));
    }

    #[test]
    fn test_remove_members_renders_valid_sparql() {
        let op = UpdateOp::RemoveMembers {
            collection: node("http://example.org/collections/c1"),
            gc_graph: node("http://example.org/records-gc/"),
            records: vec![node("http://example.org/r1")],
        };
        let text = op.to_sparql();
        parses(&text);
        assert!(text.contains("FILTER EXISTS"));
        assert!(text.contains("?count - 1"));
    }

    #[test]
    fn test_clear_members_renders_valid_sparql() {
        let op = UpdateOp::ClearMembers {
            collection: node("http://example.org/collections/c1"),
            gc_graph: node("http://example.org/records-gc/"),
        };
        parses(&op.to_sparql());
    }

    #[test]
    fn test_purge_binds_targets_via_values() {
        let op = UpdateOp::PurgeRecords {
            records_graph: node("http://example.org/records/"),
            gc_graph: node("http://example.org/records-gc/"),
            records: vec![node("http://example.org/r1")],
        };
        let text = op.to_sparql();
        parses(&text);
        assert!(text.contains("VALUES ?r { <http://example.org/r1> }"));
        // The purge must leave reference counts alone.
        assert!(!text.contains("upvoteCount"));
    }

    #[test]
    fn test_sweep_renders_cutoff_and_zero_count() {
        let op = UpdateOp::SweepGarbage {
            records_graph: node("http://example.org/records/"),
            gc_graph: node("http://example.org/records-gc/"),
            until: NaiveDate::from_ymd_opt(2026, 7, 24).unwrap(),
        };
        let text = op.to_sparql();
        parses(&text);
        assert!(text.contains("\"2026-07-24\"^^<http://www.w3.org/2001/XMLSchema#date>"));
        assert!(text.contains("!BOUND(?c) || ?c = 0"));
    }

    #[test]
    fn test_diff_graph_renders_both_sections() {
        let graph = node("http://example.org/collections/c1");
        let s = node("http://example.org/collections/c1");
        let p = node("https://www.w3.org/ns/activitystreams#name");
        let op = UpdateOp::DiffGraph {
            graph: graph.clone(),
            delete: vec![Triple::new(
                s.clone(),
                p.clone(),
                Literal::new_simple_literal("old"),
            )],
            insert: vec![Triple::new(s, p, Literal::new_simple_literal("new"))],
        };
        let text = op.to_sparql();
        parses(&text);
        assert!(text.contains("DELETE DATA"));
        assert!(text.contains("INSERT DATA"));
        assert!(text.contains("\"old\""));
        assert!(text.contains("\"new\""));
    }

    #[test]
    fn test_diff_graph_escapes_literals() {
        let graph = node("http://example.org/g");
        let op = UpdateOp::DiffGraph {
            graph: graph.clone(),
            delete: vec![],
            insert: vec![Triple::new(
                node("http://example.org/s"),
                node("http://example.org/p"),
                Literal::new_simple_literal("tricky \"quote\" } ."),
            )],
        };
        let text = op.to_sparql();
        parses(&text);
        assert!(text.contains(r#""tricky \"quote\" } .""#));
    }

    #[test]
    fn test_drop_graph() {
        let op = UpdateOp::DropGraph {
            graph: node("http://example.org/collections/c1"),
        };
        let text = op.to_sparql();
        parses(&text);
        assert_eq!(
            text,
            "DROP SILENT GRAPH <http://example.org/collections/c1>"
        );
    }

    #[test]
    fn test_replace_body_and_delete_annotation_parse() {
        let replace = UpdateOp::ReplaceAnnotationBody {
            annotations_graph: node("http://example.org/annotations/"),
            annotation: node("http://example.org/annotations/a1"),
            body: Term::Literal(Literal::new_simple_literal("new comment")),
            updated: Literal::new_typed_literal(
                "2026-08-07T10:00:00+00:00",
                xsd::DATE_TIME,
            ),
        };
        parses(&replace.to_sparql());

        let delete = UpdateOp::DeleteAnnotation {
            annotations_graph: node("http://example.org/annotations/"),
            annotation: node("http://example.org/annotations/a1"),
        };
        parses(&delete.to_sparql());
    }

    #[test]
    fn test_insert_data_groups_by_graph() {
        let g1 = node("http://example.org/g1");
        let g2 = node("http://example.org/g2");
        let s = node("http://example.org/s");
        let p = node("http://example.org/p");
        let quads = vec![
            Quad::new(s.clone(), p.clone(), Literal::new_simple_literal("a"), g1.clone()),
            Quad::new(s.clone(), p.clone(), Literal::new_simple_literal("b"), g2),
            Quad::new(s, p, Literal::new_simple_literal("c"), g1),
        ];
        let text = render_insert_data(&quads);
        parses(&text);
        assert_eq!(text.matches("GRAPH <http://example.org/g1>").count(), 1);
    }

    #[test]
    fn test_noop_detection() {
        let graph = node("http://example.org/g");
        assert!(UpdateOp::DiffGraph {
            graph: graph.clone(),
            delete: vec![],
            insert: vec![],
        }
        .is_noop());
        assert!(UpdateOp::AddMembers {
            collection: graph.clone(),
            gc_graph: graph.clone(),
            records: vec![],
        }
        .is_noop());
        assert!(!UpdateOp::DropGraph { graph }.is_noop());
    }
}
