//! Vocabulary constants for the graphs this crate writes.
//!
//! Well-known namespaces follow the oxrdf `vocab` convention of const
//! `NamedNodeRef`s; `rdf` and `xsd` are re-exported from oxrdf itself.

pub use oxrdf::vocab::{rdf, xsd};

use oxrdf::NamedNodeRef;

/// RDF Schema.
pub mod rdfs {
    use oxrdf::NamedNodeRef;

    /// `rdfs:member` — the collection membership edge.
    pub const MEMBER: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#member");
}

/// schema.org terms used for reference-count bookkeeping.
pub mod schema {
    use oxrdf::NamedNodeRef;

    /// Number of collections currently containing a record.
    pub const UPVOTE_COUNT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://schema.org/upvoteCount");

    /// Date a record's content was last written.
    pub const UPLOAD_DATE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://schema.org/uploadDate");

    /// External identifier of a record.
    pub const IDENTIFIER: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://schema.org/identifier");
}

/// Web Annotation vocabulary.
pub mod oa {
    use oxrdf::NamedNodeRef;

    pub const HAS_BODY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/oa#hasBody");
    pub const HAS_TARGET: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/oa#hasTarget");
    pub const HAS_SOURCE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/oa#hasSource");
    pub const HAS_SELECTOR: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/oa#hasSelector");
    pub const MOTIVATED_BY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/oa#motivatedBy");
    pub const COMMENTING: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/oa#commenting");
    pub const TAGGING: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/oa#tagging");
}

/// ActivityStreams terms used for object attributes and timestamps.
pub mod activity {
    use oxrdf::NamedNodeRef;

    pub const NAME: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/activitystreams#name");
    pub const SUMMARY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/activitystreams#summary");
    pub const CONTEXT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/activitystreams#context");
    pub const PUBLISHED: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/activitystreams#published");
    pub const UPDATED: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://www.w3.org/ns/activitystreams#updated");
}

/// Dublin Core terms.
pub mod dcterms {
    use oxrdf::NamedNodeRef;

    pub const CREATOR: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/creator");
}

/// The crate's own classes.
pub mod cdx {
    use oxrdf::NamedNodeRef;

    pub const COLLECTION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://cardex.dev/vocab#Collection");
    pub const ANNOTATION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://cardex.dev/vocab#Annotation");
    pub const RECORD: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://cardex.dev/vocab#Record");
}

/// All prefixes this crate may emit, for serializer headers.
pub fn prefixes() -> Vec<(&'static str, &'static str)> {
    vec![
        ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
        ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
        ("xsd", "http://www.w3.org/2001/XMLSchema#"),
        ("schema", "https://schema.org/"),
        ("oa", "http://www.w3.org/ns/oa#"),
        ("as", "https://www.w3.org/ns/activitystreams#"),
        ("dcterms", "http://purl.org/dc/terms/"),
        ("cdx", "https://cardex.dev/vocab#"),
    ]
}

/// Check that a constant is a valid IRI; used by tests only.
#[allow(dead_code)]
fn assert_valid(node: NamedNodeRef<'_>) -> bool {
    oxrdf::NamedNode::new(node.as_str()).is_ok()
}
