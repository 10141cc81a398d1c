//! Turtle exchange at the facade boundary.
//!
//! Graph payloads enter and leave the HTTP facade as Turtle; this is
//! the only serialization the service speaks. Parsing produces plain
//! triples — blank nodes intact, normalization happens later, behind
//! validation.

use rio_api::formatter::TriplesFormatter;
use rio_api::parser::TriplesParser;
use rio_turtle::{TurtleFormatter, TurtleParser};
use thiserror::Error;

use crate::term::{BlankNode, Literal, NamedNode, Subject, Term, Triple};

/// Turtle I/O errors.
#[derive(Error, Debug)]
pub enum TurtleError {
    #[error("cannot parse turtle: {0}")]
    Parse(String),

    #[error("cannot serialize turtle: {0}")]
    Serialize(String),
}

pub type TurtleResult<T> = Result<T, TurtleError>;

/// Parse a Turtle document into triples.
pub fn parse_turtle(input: &str) -> TurtleResult<Vec<Triple>> {
    let mut parser = TurtleParser::new(input.as_bytes(), None);
    let mut triples = Vec::new();
    let mut conversion_error: Option<TurtleError> = None;

    let parsed: Result<(), rio_turtle::TurtleError> = parser.parse_all(&mut |t| {
        match convert_triple(&t) {
            Ok(triple) => triples.push(triple),
            Err(e) => {
                if conversion_error.is_none() {
                    conversion_error = Some(e);
                }
            }
        }
        Ok(())
    });

    parsed.map_err(|e| TurtleError::Parse(e.to_string()))?;
    if let Some(e) = conversion_error {
        return Err(e);
    }
    Ok(triples)
}

/// Serialize triples as a Turtle document.
pub fn format_turtle(triples: &[Triple]) -> TurtleResult<String> {
    let mut formatter = TurtleFormatter::new(Vec::new());
    for triple in triples {
        let subject = match &triple.subject {
            Subject::NamedNode(n) => rio_api::model::Subject::NamedNode(
                rio_api::model::NamedNode { iri: n.as_str() },
            ),
            Subject::BlankNode(b) => rio_api::model::Subject::BlankNode(
                rio_api::model::BlankNode { id: b.as_str() },
            ),
            #[allow(unreachable_patterns)]
            _ => {
                return Err(TurtleError::Serialize(
                    "unsupported subject term".to_string(),
                ))
            }
        };
        let predicate = rio_api::model::NamedNode {
            iri: triple.predicate.as_str(),
        };
        let datatype;
        let object = match &triple.object {
            Term::NamedNode(n) => {
                rio_api::model::Term::NamedNode(rio_api::model::NamedNode {
                    iri: n.as_str(),
                })
            }
            Term::BlankNode(b) => {
                rio_api::model::Term::BlankNode(rio_api::model::BlankNode {
                    id: b.as_str(),
                })
            }
            Term::Literal(l) => rio_api::model::Term::Literal(match l.language() {
                Some(language) => rio_api::model::Literal::LanguageTaggedString {
                    value: l.value(),
                    language,
                },
                None => {
                    datatype = l.datatype();
                    if datatype.as_str() == "http://www.w3.org/2001/XMLSchema#string" {
                        rio_api::model::Literal::Simple { value: l.value() }
                    } else {
                        rio_api::model::Literal::Typed {
                            value: l.value(),
                            datatype: rio_api::model::NamedNode {
                                iri: datatype.as_str(),
                            },
                        }
                    }
                }
            }),
            #[allow(unreachable_patterns)]
            _ => {
                return Err(TurtleError::Serialize(
                    "unsupported object term".to_string(),
                ))
            }
        };

        formatter
            .format(&rio_api::model::Triple {
                subject,
                predicate,
                object,
            })
            .map_err(|e| TurtleError::Serialize(e.to_string()))?;
    }
    let bytes = formatter
        .finish()
        .map_err(|e| TurtleError::Serialize(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TurtleError::Serialize(e.to_string()))
}

fn convert_triple(t: &rio_api::model::Triple<'_>) -> TurtleResult<Triple> {
    let subject = match t.subject {
        rio_api::model::Subject::NamedNode(n) => Subject::NamedNode(convert_iri(n)?),
        rio_api::model::Subject::BlankNode(b) => Subject::BlankNode(
            BlankNode::new(b.id).map_err(|e| TurtleError::Parse(e.to_string()))?,
        ),
        _ => return Err(TurtleError::Parse("unsupported subject term".to_string())),
    };
    let predicate = convert_iri(t.predicate)?;
    let object = match t.object {
        rio_api::model::Term::NamedNode(n) => Term::NamedNode(convert_iri(n)?),
        rio_api::model::Term::BlankNode(b) => Term::BlankNode(
            BlankNode::new(b.id).map_err(|e| TurtleError::Parse(e.to_string()))?,
        ),
        rio_api::model::Term::Literal(l) => Term::Literal(match l {
            rio_api::model::Literal::Simple { value } => Literal::new_simple_literal(value),
            rio_api::model::Literal::LanguageTaggedString { value, language } => {
                Literal::new_language_tagged_literal(value, language)
                    .map_err(|e| TurtleError::Parse(e.to_string()))?
            }
            rio_api::model::Literal::Typed { value, datatype } => {
                Literal::new_typed_literal(value, convert_iri(datatype)?)
            }
        }),
        _ => return Err(TurtleError::Parse("unsupported object term".to_string())),
    };
    Ok(Triple::new(subject, predicate, object))
}

fn convert_iri(n: rio_api::model::NamedNode<'_>) -> TurtleResult<NamedNode> {
    NamedNode::new(n.iri).map_err(|e| TurtleError::Parse(e.to_string()))
}
