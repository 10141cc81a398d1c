//! Typed value codecs between application values and RDF terms.

use chrono::{DateTime, NaiveDate, Utc};

use super::{MappingError, MappingResult};
use crate::term::{Literal, NamedNode, Term};
use crate::vocab::xsd;

/// A value that can cross the term boundary in both directions.
pub trait TermValue: Sized {
    /// Encode the value as an RDF term.
    fn to_term(&self) -> Term;

    /// Decode an RDF term, rejecting terms of the wrong shape.
    fn from_term(term: &Term) -> MappingResult<Self>;
}

fn unexpected(expected: &'static str, term: &Term) -> MappingError {
    MappingError::UnexpectedTerm {
        expected,
        found: term.to_string(),
    }
}

impl TermValue for String {
    fn to_term(&self) -> Term {
        Term::Literal(Literal::new_simple_literal(self.clone()))
    }

    fn from_term(term: &Term) -> MappingResult<Self> {
        match term {
            Term::Literal(l) => Ok(l.value().to_string()),
            other => Err(unexpected("a string literal", other)),
        }
    }
}

impl TermValue for i64 {
    fn to_term(&self) -> Term {
        Term::Literal(Literal::from(*self))
    }

    fn from_term(term: &Term) -> MappingResult<Self> {
        match term {
            Term::Literal(l) => l
                .value()
                .parse()
                .map_err(|_| unexpected("an integer literal", term)),
            other => Err(unexpected("an integer literal", other)),
        }
    }
}

impl TermValue for NaiveDate {
    fn to_term(&self) -> Term {
        Term::Literal(Literal::new_typed_literal(
            self.format("%Y-%m-%d").to_string(),
            xsd::DATE,
        ))
    }

    fn from_term(term: &Term) -> MappingResult<Self> {
        match term {
            Term::Literal(l) => l
                .value()
                .parse()
                .map_err(|_| unexpected("an xsd:date literal", term)),
            other => Err(unexpected("an xsd:date literal", other)),
        }
    }
}

impl TermValue for DateTime<Utc> {
    fn to_term(&self) -> Term {
        Term::Literal(Literal::new_typed_literal(self.to_rfc3339(), xsd::DATE_TIME))
    }

    fn from_term(term: &Term) -> MappingResult<Self> {
        match term {
            Term::Literal(l) => DateTime::parse_from_rfc3339(l.value())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| unexpected("an xsd:dateTime literal", term)),
            other => Err(unexpected("an xsd:dateTime literal", other)),
        }
    }
}

impl TermValue for NamedNode {
    fn to_term(&self) -> Term {
        Term::NamedNode(self.clone())
    }

    fn from_term(term: &Term) -> MappingResult<Self> {
        match term {
            Term::NamedNode(n) => Ok(n.clone()),
            other => Err(unexpected("an IRI", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_roundtrip() {
        let term = "hello".to_string().to_term();
        assert_eq!(String::from_term(&term).unwrap(), "hello");
    }

    #[test]
    fn test_integer_roundtrip_and_rejection() {
        let term = 42_i64.to_term();
        assert_eq!(i64::from_term(&term).unwrap(), 42);

        let not_a_number = "forty-two".to_string().to_term();
        assert!(i64::from_term(&not_a_number).is_err());
    }

    #[test]
    fn test_date_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let term = date.to_term();
        assert_eq!(NaiveDate::from_term(&term).unwrap(), date);
        match &term {
            Term::Literal(l) => assert_eq!(l.datatype(), xsd::DATE),
            _ => panic!("expected a literal"),
        }
    }

    #[test]
    fn test_datetime_roundtrip() {
        let now = Utc::now();
        let term = now.to_term();
        let back = DateTime::<Utc>::from_term(&term).unwrap();
        assert_eq!(back.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn test_iri_rejects_literal() {
        let literal = "not an iri".to_string().to_term();
        assert!(NamedNode::from_term(&literal).is_err());

        let iri = NamedNode::new("http://example.org/x").unwrap();
        assert_eq!(NamedNode::from_term(&iri.to_term()).unwrap(), iri);
    }
}
