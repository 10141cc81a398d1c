//! SPARQL 1.1 protocol gateway.
//!
//! Each update operation is rendered and POSTed as exactly one update
//! request; pattern reads go to the query endpoint and come back as
//! `application/sparql-results+json`. Buffered inserts are flushed as
//! one `INSERT DATA` request on `commit`.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use sparesults::{QueryResultsFormat, QueryResultsParser, ReaderQueryResultsParserOutput};
use std::sync::Mutex;
use tracing::debug;

use super::update::{render_insert_data, UpdateOp};
use super::{QuadStore, StoreError, StoreResult};
use crate::term::{NamedNode, Quad, QuadPattern, Subject, Term};

const RESULTS_JSON: &str = "application/sparql-results+json";

/// Gateway to a remote SPARQL endpoint.
pub struct SparqlClient {
    http: reqwest::Client,
    query_endpoint: String,
    update_endpoint: String,
    pending: Mutex<Vec<Quad>>,
}

impl SparqlClient {
    /// Create a client for the given query and update endpoints.
    pub fn new(query_endpoint: impl Into<String>, update_endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            query_endpoint: query_endpoint.into(),
            update_endpoint: update_endpoint.into(),
            pending: Mutex::new(Vec::new()),
        }
    }

    async fn post_update(&self, update: &str) -> StoreResult<()> {
        debug!(endpoint = %self.update_endpoint, "posting update request");
        let response = self
            .http
            .post(&self.update_endpoint)
            .form(&[("update", update)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Endpoint(format!("{status}: {body}")));
        }
        Ok(())
    }
}

#[async_trait]
impl QuadStore for SparqlClient {
    async fn quads(&self, pattern: &QuadPattern) -> StoreResult<Vec<Quad>> {
        let query = render_select(pattern);
        debug!(endpoint = %self.query_endpoint, %query, "posting query request");
        let response = self
            .http
            .post(&self.query_endpoint)
            .header(ACCEPT, RESULTS_JSON)
            .form(&[("query", query.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Endpoint(format!("{status}: {body}")));
        }
        let body = response.text().await?;

        let parser = QueryResultsParser::from_format(QueryResultsFormat::Json);
        let reader = parser
            .for_reader(body.as_bytes())
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let solutions = match reader {
            ReaderQueryResultsParserOutput::Solutions(solutions) => solutions,
            ReaderQueryResultsParserOutput::Boolean(_) => {
                return Err(StoreError::Decode(
                    "expected solutions, got a boolean result".to_string(),
                ))
            }
        };

        let mut quads = Vec::new();
        for solution in solutions {
            let solution = solution.map_err(|e| StoreError::Decode(e.to_string()))?;
            quads.push(quad_from_solution(pattern, &solution)?);
        }
        Ok(quads)
    }

    async fn insert(&self, quads: Vec<Quad>) -> StoreResult<()> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .extend(quads);
        Ok(())
    }

    async fn update(&self, op: &UpdateOp) -> StoreResult<()> {
        if op.is_noop() {
            return Ok(());
        }
        self.post_update(&op.to_sparql()).await
    }

    async fn commit(&self) -> StoreResult<()> {
        let pending = {
            let mut buffer = self
                .pending
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            std::mem::take(&mut *buffer)
        };
        if pending.is_empty() {
            return Ok(());
        }
        let update = render_insert_data(&pending);
        if let Err(e) = self.post_update(&update).await {
            // Keep the batch so a retried commit can flush it.
            self.pending
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .splice(0..0, pending);
            return Err(e);
        }
        Ok(())
    }
}

fn render_select(pattern: &QuadPattern) -> String {
    let graph = pattern
        .graph
        .as_ref()
        .map_or_else(|| "?g".to_string(), NamedNode::to_string);
    let subject = pattern
        .subject
        .as_ref()
        .map_or_else(|| "?s".to_string(), Subject::to_string);
    let predicate = pattern
        .predicate
        .as_ref()
        .map_or_else(|| "?p".to_string(), NamedNode::to_string);
    let object = pattern
        .object
        .as_ref()
        .map_or_else(|| "?o".to_string(), Term::to_string);
    format!("SELECT * WHERE {{ GRAPH {graph} {{ {subject} {predicate} {object} . }} }}")
}

fn quad_from_solution(
    pattern: &QuadPattern,
    solution: &sparesults::QuerySolution,
) -> StoreResult<Quad> {
    let graph = match &pattern.graph {
        Some(g) => g.clone(),
        None => match solution.get("g") {
            Some(Term::NamedNode(n)) => n.clone(),
            other => {
                return Err(StoreError::Decode(format!(
                    "expected an IRI graph binding, got {other:?}"
                )))
            }
        },
    };
    let subject = match &pattern.subject {
        Some(s) => s.clone(),
        None => match solution.get("s") {
            Some(term) => crate::term::term_to_subject(term).ok_or_else(|| {
                StoreError::Decode(format!("term cannot stand as subject: {term}"))
            })?,
            None => {
                return Err(StoreError::Decode("missing subject binding".to_string()))
            }
        },
    };
    let predicate = match &pattern.predicate {
        Some(p) => p.clone(),
        None => match solution.get("p") {
            Some(Term::NamedNode(n)) => n.clone(),
            other => {
                return Err(StoreError::Decode(format!(
                    "expected an IRI predicate binding, got {other:?}"
                )))
            }
        },
    };
    let object = match &pattern.object {
        Some(o) => o.clone(),
        None => solution
            .get("o")
            .cloned()
            .ok_or_else(|| StoreError::Decode("missing object binding".to_string()))?,
    };
    Ok(Quad::new(subject, predicate, object, graph))
}
