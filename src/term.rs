//! RDF term plumbing shared across the crate.
//!
//! Terms are the oxrdf primitives; this module adds the quad pattern
//! used for gateway reads and a few conversions that oxrdf leaves to
//! the caller.

pub use oxrdf::{
    BlankNode, GraphName, Literal, NamedNode, NamedNodeRef, Quad, Subject, Term, Triple,
};

/// Pattern over quads; `None` positions match anything.
///
/// A bound graph restricts the match to one named graph. The default
/// graph is never addressed here: every partition this crate touches
/// is a named graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadPattern {
    /// Graph (None = any named graph)
    pub graph: Option<NamedNode>,
    /// Subject (None = variable)
    pub subject: Option<Subject>,
    /// Predicate (None = variable)
    pub predicate: Option<NamedNode>,
    /// Object (None = variable)
    pub object: Option<Term>,
}

impl QuadPattern {
    /// Create a new quad pattern.
    pub fn new(
        graph: Option<NamedNode>,
        subject: Option<Subject>,
        predicate: Option<NamedNode>,
        object: Option<Term>,
    ) -> Self {
        Self {
            graph,
            subject,
            predicate,
            object,
        }
    }

    /// Pattern matching every quad of one named graph.
    pub fn graph(graph: NamedNode) -> Self {
        Self::new(Some(graph), None, None, None)
    }

    /// Restrict the pattern to a subject.
    pub fn with_subject(mut self, subject: impl Into<Subject>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Restrict the pattern to a predicate.
    pub fn with_predicate(mut self, predicate: impl Into<NamedNode>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Restrict the pattern to an object.
    pub fn with_object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Check whether a quad matches this pattern.
    pub fn matches(&self, quad: &Quad) -> bool {
        if let Some(ref g) = self.graph {
            match &quad.graph_name {
                GraphName::NamedNode(n) if n == g => {}
                _ => return false,
            }
        }
        if let Some(ref s) = self.subject {
            if s != &quad.subject {
                return false;
            }
        }
        if let Some(ref p) = self.predicate {
            if p != &quad.predicate {
                return false;
            }
        }
        if let Some(ref o) = self.object {
            if o != &quad.object {
                return false;
            }
        }
        true
    }
}

/// Convert a subject into the equivalent term.
pub fn subject_to_term(subject: &Subject) -> Term {
    match subject {
        Subject::NamedNode(n) => Term::NamedNode(n.clone()),
        Subject::BlankNode(b) => Term::BlankNode(b.clone()),
        #[allow(unreachable_patterns)]
        _ => unreachable!("RDF-star subjects are not produced by this crate"),
    }
}

/// Narrow a term to a subject position, if it can stand there.
pub fn term_to_subject(term: &Term) -> Option<Subject> {
    match term {
        Term::NamedNode(n) => Some(Subject::NamedNode(n.clone())),
        Term::BlankNode(b) => Some(Subject::BlankNode(b.clone())),
        _ => None,
    }
}

/// Place a triple inside a named graph.
pub fn triple_in_graph(triple: Triple, graph: &NamedNode) -> Quad {
    Quad::new(
        triple.subject,
        triple.predicate,
        triple.object,
        graph.clone(),
    )
}

/// Place a batch of triples inside a named graph.
pub fn triples_in_graph(
    triples: impl IntoIterator<Item = Triple>,
    graph: &NamedNode,
) -> Vec<Quad> {
    triples
        .into_iter()
        .map(|t| triple_in_graph(t, graph))
        .collect()
}

/// Strip the graph component off a quad.
pub fn quad_to_triple(quad: Quad) -> Triple {
    Triple::new(quad.subject, quad.predicate, quad.object)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Quad {
        Quad::new(
            NamedNode::new("http://example.org/alice").unwrap(),
            NamedNode::new("http://xmlns.com/foaf/0.1/name").unwrap(),
            Literal::new_simple_literal("Alice"),
            NamedNode::new("http://example.org/graph/").unwrap(),
        )
    }

    #[test]
    fn test_pattern_matches_any() {
        assert!(QuadPattern::default().matches(&quad()));
    }

    #[test]
    fn test_pattern_bound_positions() {
        let q = quad();
        let graph = NamedNode::new("http://example.org/graph/").unwrap();

        let pattern = QuadPattern::graph(graph.clone())
            .with_subject(NamedNode::new("http://example.org/alice").unwrap());
        assert!(pattern.matches(&q));

        let pattern = QuadPattern::graph(graph)
            .with_subject(NamedNode::new("http://example.org/bob").unwrap());
        assert!(!pattern.matches(&q));

        let pattern =
            QuadPattern::default().with_object(Literal::new_simple_literal("Alice"));
        assert!(pattern.matches(&q));
    }

    #[test]
    fn test_pattern_wrong_graph() {
        let pattern =
            QuadPattern::graph(NamedNode::new("http://example.org/other/").unwrap());
        assert!(!pattern.matches(&quad()));
    }

    #[test]
    fn test_subject_term_conversions() {
        let named = Subject::NamedNode(NamedNode::new("http://example.org/a").unwrap());
        let roundtrip = term_to_subject(&subject_to_term(&named)).unwrap();
        assert_eq!(roundtrip, named);

        let literal = Term::Literal(Literal::new_simple_literal("x"));
        assert!(term_to_subject(&literal).is_none());
    }
}
