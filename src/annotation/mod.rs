//! User-authored annotations on catalog records.
//!
//! A submission arrives as a raw graph and is checked for shape before
//! anything else: exactly one body, target and source, with the body
//! and target hanging off one annotation node and the source hanging
//! off the target. Only then is the graph normalized in memory —
//! typed, stamped, attributed, its subject renamed to a minted URI,
//! its blank nodes skolemized — and written to the shared Annotations
//! graph in a single commit. A rejected submission writes nothing.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::config::GraphLayout;
use crate::error::{Error, Result};
use crate::mapping::TermValue;
use crate::normalize::{replace_node, skolemize_triples};
use crate::store::{QuadStore, UpdateOp};
use crate::term::{
    quad_to_triple, subject_to_term, triples_in_graph, Literal, NamedNode, QuadPattern,
    Subject, Term, Triple,
};
use crate::vocab::{activity, cdx, dcterms, oa, rdf, xsd};

/// Shape violations that reject a submission outright.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("an annotation needs exactly one body")]
    NeedsOneBody,

    #[error("an annotation needs exactly one target")]
    NeedsOneTarget,

    #[error("an annotation needs exactly one source")]
    NeedsOneSource,

    #[error("body and target must be properties of the annotation node")]
    BodyTargetMismatch,

    #[error("the source must be a property of the target")]
    SourceNotOnTarget,

    #[error("a comment body must be a literal")]
    CommentNotLiteral,

    #[error("a tag body must be an IRI")]
    TagNotIri,

    #[error("only commenting or tagging is supported at this time")]
    UnsupportedMotivation,
}

/// What an annotation is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motivation {
    /// Free-text comment; the body is a literal.
    Commenting,
    /// Reference to a shared tag; the body is an IRI.
    Tagging,
}

/// The validated skeleton of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Shape {
    subject: Subject,
    motivation: Motivation,
}

fn single_edge(
    triples: &[Triple],
    predicate: crate::term::NamedNodeRef<'_>,
    missing: ValidationError,
) -> std::result::Result<(Subject, Term), ValidationError> {
    let mut found: Vec<(Subject, Term)> = triples
        .iter()
        .filter(|t| t.predicate == predicate)
        .map(|t| (t.subject.clone(), t.object.clone()))
        .collect();
    if found.len() == 1 {
        Ok(found.remove(0))
    } else {
        Err(missing)
    }
}

fn validate(triples: &[Triple]) -> std::result::Result<Shape, ValidationError> {
    let (body_subject, body) =
        single_edge(triples, oa::HAS_BODY, ValidationError::NeedsOneBody)?;
    let (target_subject, target) =
        single_edge(triples, oa::HAS_TARGET, ValidationError::NeedsOneTarget)?;
    let (source_subject, _source) =
        single_edge(triples, oa::HAS_SOURCE, ValidationError::NeedsOneSource)?;

    if body_subject != target_subject {
        return Err(ValidationError::BodyTargetMismatch);
    }
    if subject_to_term(&source_subject) != target {
        return Err(ValidationError::SourceNotOnTarget);
    }

    let mut motivations: Vec<&Term> = triples
        .iter()
        .filter(|t| t.subject == body_subject && t.predicate == oa::MOTIVATED_BY)
        .map(|t| &t.object)
        .collect();
    motivations.dedup();
    let motivation = match motivations.as_slice() {
        [] => Motivation::Commenting,
        [Term::NamedNode(n)] if *n == oa::COMMENTING => Motivation::Commenting,
        [Term::NamedNode(n)] if *n == oa::TAGGING => Motivation::Tagging,
        _ => return Err(ValidationError::UnsupportedMotivation),
    };

    match motivation {
        Motivation::Commenting => {
            if !matches!(body, Term::Literal(_)) {
                return Err(ValidationError::CommentNotLiteral);
            }
        }
        Motivation::Tagging => {
            if !matches!(body, Term::NamedNode(_)) {
                return Err(ValidationError::TagNotIri);
            }
        }
    }

    Ok(Shape {
        subject: body_subject,
        motivation,
    })
}

/// Replace all values of `(subject, predicate)` in the batch.
fn set_value(triples: &mut Vec<Triple>, subject: &Subject, predicate: NamedNode, object: Term) {
    triples.retain(|t| !(t.subject == *subject && t.predicate == predicate));
    triples.push(Triple::new(subject.clone(), predicate, object));
}

/// Validate, normalize and store a submitted annotation graph.
///
/// Returns the clean triples as stored, with the minted subject URI.
pub async fn create_annotation(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    mut triples: Vec<Triple>,
    creator: &NamedNode,
) -> Result<Vec<Triple>> {
    let shape = validate(&triples)?;

    let published = Utc::now();
    set_value(
        &mut triples,
        &shape.subject,
        rdf::TYPE.into_owned(),
        Term::NamedNode(cdx::ANNOTATION.into_owned()),
    );
    set_value(
        &mut triples,
        &shape.subject,
        activity::PUBLISHED.into_owned(),
        published.to_term(),
    );
    set_value(
        &mut triples,
        &shape.subject,
        dcterms::CREATOR.into_owned(),
        creator.to_term(),
    );

    // The annotation node gets a proper URI; every other anonymous
    // node is wrapped with a stable token before the merge.
    let minted = layout.mint_annotation_uri();
    let renamed = replace_node(triples, &subject_to_term(&shape.subject), &minted);
    let clean = skolemize_triples(renamed);

    store
        .insert(triples_in_graph(
            clean.iter().cloned(),
            layout.annotations_graph(),
        ))
        .await?;
    store.commit().await?;
    info!(uri = %minted, motivation = ?shape.motivation, "stored annotation");
    Ok(clean)
}

async fn require_annotation(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    annotation: &NamedNode,
) -> Result<()> {
    let present = store
        .contains(
            &QuadPattern::graph(layout.annotations_graph().clone())
                .with_subject(annotation.clone()),
        )
        .await?;
    if present {
        Ok(())
    } else {
        Err(Error::NotFound(format!("annotation {annotation}")))
    }
}

/// Replace an annotation's body, stamping `as:updated`.
///
/// Only the body is editable; everything else is fixed at creation.
pub async fn update_annotation_body(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    annotation: &NamedNode,
    body: Term,
) -> Result<DateTime<Utc>> {
    require_annotation(store, layout, annotation).await?;
    let updated = Utc::now();
    let updated_literal = Literal::new_typed_literal(updated.to_rfc3339(), xsd::DATE_TIME);
    store
        .update(&UpdateOp::ReplaceAnnotationBody {
            annotations_graph: layout.annotations_graph().clone(),
            annotation: annotation.clone(),
            body,
            updated: updated_literal,
        })
        .await?;
    store.commit().await?;
    Ok(updated)
}

/// Delete an annotation together with its target and selector nodes.
pub async fn delete_annotation(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    annotation: &NamedNode,
) -> Result<()> {
    require_annotation(store, layout, annotation).await?;
    store
        .update(&UpdateOp::DeleteAnnotation {
            annotations_graph: layout.annotations_graph().clone(),
            annotation: annotation.clone(),
        })
        .await?;
    store.commit().await?;
    info!(uri = %annotation, "deleted annotation");
    Ok(())
}

/// All annotations targeting a record, as one batch of triples:
/// annotation nodes, their target nodes, and any selectors.
pub async fn annotations_for_record(
    store: &dyn QuadStore,
    layout: &GraphLayout,
    record: &NamedNode,
) -> Result<Vec<Triple>> {
    let graph = layout.annotations_graph();

    let targets: Vec<Subject> = store
        .quads(
            &QuadPattern::graph(graph.clone())
                .with_predicate(oa::HAS_SOURCE)
                .with_object(record.clone()),
        )
        .await?
        .into_iter()
        .map(|q| q.subject)
        .collect();

    let mut triples: Vec<Triple> = Vec::new();
    for target in targets {
        let annotations: Vec<Subject> = store
            .quads(
                &QuadPattern::graph(graph.clone())
                    .with_predicate(oa::HAS_TARGET)
                    .with_object(subject_to_term(&target)),
            )
            .await?
            .into_iter()
            .map(|q| q.subject)
            .collect();
        if annotations.is_empty() {
            continue;
        }

        let target_quads = store
            .quads(&QuadPattern::graph(graph.clone()).with_subject(target.clone()))
            .await?;
        let selectors: Vec<Subject> = target_quads
            .iter()
            .filter(|q| q.predicate == oa::HAS_SELECTOR)
            .filter_map(|q| crate::term::term_to_subject(&q.object))
            .collect();

        for annotation in annotations {
            let own = store
                .quads(&QuadPattern::graph(graph.clone()).with_subject(annotation))
                .await?;
            push_unique(&mut triples, own.into_iter().map(quad_to_triple));
        }
        push_unique(&mut triples, target_quads.into_iter().map(quad_to_triple));
        for selector in selectors {
            let own = store
                .quads(&QuadPattern::graph(graph.clone()).with_subject(selector))
                .await?;
            push_unique(&mut triples, own.into_iter().map(quad_to_triple));
        }
    }
    Ok(triples)
}

fn push_unique(triples: &mut Vec<Triple>, batch: impl Iterator<Item = Triple>) {
    for triple in batch {
        if !triples.contains(&triple) {
            triples.push(triple);
        }
    }
}
