//! Object-graph mapping.
//!
//! Typed attributes map to triples scoped to one named graph per
//! object. A relation is one of a closed set of kinds — selected by an
//! explicit tag, not by runtime introspection — and every write is a
//! minimal diff against the stored triples, issued as one update
//! request.

mod relation;
mod value;

pub use relation::{Relation, RelationKind};
pub(crate) use relation::{diff_object, triples_for};
pub use value::TermValue;

use thiserror::Error;

/// Mapping errors.
#[derive(Error, Debug)]
pub enum MappingError {
    /// A stored term could not be decoded to the requested type.
    #[error("cannot decode {found} as {expected}")]
    UnexpectedTerm {
        expected: &'static str,
        found: String,
    },

    /// More than one value offered to a relation that holds at most one.
    #[error("relation <{0}> holds at most one value")]
    UniqueViolation(String),

    /// No value offered to a relation that requires exactly one.
    #[error("relation <{0}> requires a value")]
    MissingValue(String),
}

pub type MappingResult<T> = Result<T, MappingError>;
