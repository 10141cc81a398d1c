//! Blank-node normalization.
//!
//! Blank node identifiers are only meaningful within one serialization
//! or session. Before a batch of incoming triples is merged into a
//! graph shared across requests, every blank node is rewritten to a
//! stable `bnode:` token derived from its session-local label, so that
//! unrelated submissions cannot collide.

use crate::term::{NamedNode, Subject, Term, Triple};

/// Scheme prefix of skolemized blank-node tokens.
pub const BNODE_SCHEME: &str = "bnode:";

/// Stable token for a blank-node label.
///
/// Blank node labels are restricted to characters that are also valid
/// in an IRI path, so the rewritten token needs no further escaping.
pub fn skolem_token(label: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{BNODE_SCHEME}{label}"))
}

fn skolemize_subject(subject: Subject) -> Subject {
    match subject {
        Subject::BlankNode(b) => Subject::NamedNode(skolem_token(b.as_str())),
        other => other,
    }
}

fn skolemize_term(term: Term) -> Term {
    match term {
        Term::BlankNode(b) => Term::NamedNode(skolem_token(b.as_str())),
        other => other,
    }
}

/// Rewrite every blank node in a batch of triples to its stable token.
///
/// All triples must come from the same incoming graph; labels from
/// different graphs map to the same token and must not be mixed.
pub fn skolemize_triples(triples: impl IntoIterator<Item = Triple>) -> Vec<Triple> {
    triples
        .into_iter()
        .map(|t| {
            Triple::new(
                skolemize_subject(t.subject),
                t.predicate,
                skolemize_term(t.object),
            )
        })
        .collect()
}

/// Copy triples with every occurrence of `old` replaced by `new`.
///
/// Predicates are left alone; they are never anonymous.
pub fn replace_node(
    triples: impl IntoIterator<Item = Triple>,
    old: &Term,
    new: &NamedNode,
) -> Vec<Triple> {
    triples
        .into_iter()
        .map(|t| {
            let subject = if &crate::term::subject_to_term(&t.subject) == old {
                Subject::NamedNode(new.clone())
            } else {
                t.subject
            };
            let object = if &t.object == old {
                Term::NamedNode(new.clone())
            } else {
                t.object
            };
            Triple::new(subject, t.predicate, object)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{BlankNode, Literal};

    fn predicate() -> NamedNode {
        NamedNode::new("http://example.org/p").unwrap()
    }

    #[test]
    fn test_skolem_token_is_stable() {
        let b = BlankNode::new("n0").unwrap();
        assert_eq!(skolem_token(b.as_str()), skolem_token("n0"));
        assert_eq!(skolem_token("n0").as_str(), "bnode:n0");
    }

    #[test]
    fn test_skolemize_rewrites_subject_and_object() {
        let b = BlankNode::new("x1").unwrap();
        let named = NamedNode::new("http://example.org/a").unwrap();
        let triples = vec![
            Triple::new(b.clone(), predicate(), Literal::new_simple_literal("v")),
            Triple::new(named.clone(), predicate(), b.clone()),
        ];

        let clean = skolemize_triples(triples);
        let token = Term::NamedNode(skolem_token("x1"));

        assert_eq!(
            crate::term::subject_to_term(&clean[0].subject),
            token
        );
        assert_eq!(clean[1].object, token);
        assert_eq!(clean[1].subject, Subject::NamedNode(named));
    }

    #[test]
    fn test_skolemize_same_label_same_token() {
        let b = BlankNode::new("shared").unwrap();
        let triples = vec![
            Triple::new(b.clone(), predicate(), Literal::new_simple_literal("a")),
            Triple::new(b, predicate(), Literal::new_simple_literal("b")),
        ];
        let clean = skolemize_triples(triples);
        assert_eq!(clean[0].subject, clean[1].subject);
    }

    #[test]
    fn test_replace_node() {
        let b = BlankNode::new("subj").unwrap();
        let minted = NamedNode::new("http://example.org/minted").unwrap();
        let other = NamedNode::new("http://example.org/other").unwrap();
        let triples = vec![
            Triple::new(b.clone(), predicate(), other.clone()),
            Triple::new(other, predicate(), b.clone()),
        ];

        let renamed = replace_node(triples, &Term::BlankNode(b), &minted);
        assert_eq!(renamed[0].subject, Subject::NamedNode(minted.clone()));
        assert_eq!(renamed[1].object, Term::NamedNode(minted));
    }
}
