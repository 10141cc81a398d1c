//! HTTP handlers for the facade API.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;
use crate::collection::Collection;
use crate::error::Error;
use crate::store::StoreError;
use crate::term::{NamedNode, QuadPattern, Subject, Term, Triple};
use crate::vocab::{cdx, oa, rdf};
use crate::{annotation, catalog, gc, turtle};

/// Error wrapper translating the crate taxonomy to status codes.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) | Error::Mapping(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Store(StoreError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn parse_iri(value: &str) -> ApiResult<NamedNode> {
    NamedNode::new(value)
        .map_err(|e| ApiError(Error::Validation(format!("invalid IRI {value:?}: {e}"))))
}

fn parse_iris(values: &[String]) -> ApiResult<Vec<NamedNode>> {
    values.iter().map(|v| parse_iri(v)).collect()
}

fn parse_graph_body(body: &str) -> ApiResult<Vec<Triple>> {
    turtle::parse_turtle(body).map_err(|e| ApiError(Error::Validation(e.to_string())))
}

fn turtle_response(triples: &[Triple]) -> ApiResult<Response> {
    let body = turtle::format_turtle(triples)
        .map_err(|e| ApiError(Error::Validation(e.to_string())))?;
    Ok(([(header::CONTENT_TYPE, "text/turtle")], body).into_response())
}

/// Collection metadata payload.
#[derive(Deserialize)]
pub struct CollectionPayload {
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Collection metadata view.
#[derive(Serialize)]
pub struct CollectionView {
    pub uri: String,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub scope: Option<String>,
}

impl From<&Collection> for CollectionView {
    fn from(c: &Collection) -> Self {
        Self {
            uri: c.uri.as_str().to_string(),
            name: c.name.clone(),
            summary: c.summary.clone(),
            scope: c.scope.as_ref().map(|s| s.as_str().to_string()),
        }
    }
}

/// Record list payload for membership mutations.
#[derive(Deserialize)]
pub struct RecordsPayload {
    pub records: Vec<String>,
}

pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CollectionPayload>,
) -> ApiResult<(StatusCode, Json<CollectionView>)> {
    let scope = payload.scope.as_deref().map(parse_iri).transpose()?;
    let collection = Collection::create(
        &*state.store,
        &state.layout,
        payload.name,
        payload.summary,
        scope,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(CollectionView::from(&collection))))
}

pub async fn list_collections(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CollectionView>>> {
    let quads = state
        .store
        .quads(
            &QuadPattern::default()
                .with_predicate(rdf::TYPE)
                .with_object(cdx::COLLECTION.into_owned()),
        )
        .await
        .map_err(Error::from)?;

    let mut views = Vec::new();
    for quad in quads {
        if let Subject::NamedNode(uri) = quad.subject {
            let collection = Collection::load(&*state.store, &uri).await?;
            views.push(CollectionView::from(&collection));
        }
    }
    Ok(Json(views))
}

pub async fn get_collection(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
) -> ApiResult<Json<CollectionView>> {
    let uri = parse_iri(&uri)?;
    let collection = Collection::load(&*state.store, &uri).await?;
    Ok(Json(CollectionView::from(&collection)))
}

pub async fn update_collection(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
    Json(payload): Json<CollectionPayload>,
) -> ApiResult<Json<CollectionView>> {
    let uri = parse_iri(&uri)?;
    let mut collection = Collection::load(&*state.store, &uri).await?;
    collection.name = Some(payload.name);
    collection.summary = payload.summary;
    collection.scope = payload.scope.as_deref().map(parse_iri).transpose()?;
    collection.save(&*state.store).await?;
    Ok(Json(CollectionView::from(&collection)))
}

pub async fn delete_collection(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
) -> ApiResult<StatusCode> {
    let uri = parse_iri(&uri)?;
    let collection = Collection::load(&*state.store, &uri).await?;
    collection.delete(&*state.store).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn collection_records(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
) -> ApiResult<Response> {
    let uri = parse_iri(&uri)?;
    let collection = Collection::load(&*state.store, &uri).await?;
    let members = collection.records(&*state.store, &state.layout).await?;

    let mut triples = Vec::new();
    for member in members {
        triples.extend(
            catalog::stored_record(&*state.store, &state.layout, &member).await?,
        );
    }
    turtle_response(&triples)
}

async fn members_view(
    state: &AppState,
    collection: &Collection,
) -> ApiResult<Json<Vec<String>>> {
    let members = collection.records(&*state.store, &state.layout).await?;
    Ok(Json(
        members.iter().map(|m| m.as_str().to_string()).collect(),
    ))
}

pub async fn add_records(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
    Json(payload): Json<RecordsPayload>,
) -> ApiResult<Json<Vec<String>>> {
    if payload.records.is_empty() {
        return Err(ApiError(Error::Validation("no records selected".into())));
    }
    let uri = parse_iri(&uri)?;
    let records = parse_iris(&payload.records)?;
    let collection = Collection::load(&*state.store, &uri).await?;
    collection
        .add_records(&*state.store, &state.layout, &records)
        .await?;
    members_view(&state, &collection).await
}

pub async fn remove_records(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
    Json(payload): Json<RecordsPayload>,
) -> ApiResult<Json<Vec<String>>> {
    let uri = parse_iri(&uri)?;
    let records = parse_iris(&payload.records)?;
    let collection = Collection::load(&*state.store, &uri).await?;
    collection
        .remove_records(&*state.store, &state.layout, &records)
        .await?;
    members_view(&state, &collection).await
}

pub async fn set_records(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
    Json(payload): Json<RecordsPayload>,
) -> ApiResult<Json<Vec<String>>> {
    let uri = parse_iri(&uri)?;
    let records = parse_iris(&payload.records)?;
    let collection = Collection::load(&*state.store, &uri).await?;
    collection
        .set_records(&*state.store, &state.layout, &records)
        .await?;
    members_view(&state, &collection).await
}

/// URI of a newly minted object.
#[derive(Serialize)]
pub struct MintedView {
    pub uri: String,
}

pub async fn create_blank_record(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<MintedView>)> {
    let uri = catalog::create_blank_record(&*state.store, &state.layout).await?;
    Ok((
        StatusCode::CREATED,
        Json(MintedView {
            uri: uri.as_str().to_string(),
        }),
    ))
}

pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
) -> ApiResult<Response> {
    let uri = parse_iri(&uri)?;
    let triples = catalog::get_record(&*state.store, &state.layout, &uri).await?;
    turtle_response(&triples)
}

pub async fn refresh_record(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
    body: String,
) -> ApiResult<Response> {
    let uri = parse_iri(&uri)?;
    let content = parse_graph_body(&body)?;
    catalog::refresh_record(&*state.store, &state.layout, &uri, content).await?;
    let stored = catalog::get_record(&*state.store, &state.layout, &uri).await?;
    turtle_response(&stored)
}

pub async fn record_annotations(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
) -> ApiResult<Response> {
    let uri = parse_iri(&uri)?;
    let triples =
        annotation::annotations_for_record(&*state.store, &state.layout, &uri).await?;
    turtle_response(&triples)
}

pub async fn create_annotation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Response> {
    let creator = headers
        .get("x-agent")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError(Error::Validation(
                "missing x-agent header identifying the creator".into(),
            ))
        })?;
    let creator = parse_iri(creator)?;
    let triples = parse_graph_body(&body)?;
    let stored =
        annotation::create_annotation(&*state.store, &state.layout, triples, &creator)
            .await?;
    turtle_response(&stored)
}

pub async fn update_annotation(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
    body: String,
) -> ApiResult<Response> {
    let uri = parse_iri(&uri)?;
    let triples = parse_graph_body(&body)?;
    let body_term: Term = triples
        .iter()
        .find(|t| t.subject == Subject::NamedNode(uri.clone()) && t.predicate == oa::HAS_BODY)
        .map(|t| t.object.clone())
        .ok_or_else(|| {
            ApiError(Error::Validation(
                "request graph carries no body for the annotation".into(),
            ))
        })?;

    let updated = annotation::update_annotation_body(
        &*state.store,
        &state.layout,
        &uri,
        body_term.clone(),
    )
    .await?;

    use crate::mapping::TermValue;
    let response = vec![
        Triple::new(uri.clone(), oa::HAS_BODY, body_term),
        Triple::new(uri, crate::vocab::activity::UPDATED, updated.to_term()),
    ];
    turtle_response(&response)
}

pub async fn delete_annotation(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
) -> ApiResult<StatusCode> {
    let uri = parse_iri(&uri)?;
    annotation::delete_annotation(&*state.store, &state.layout, &uri).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Optional cutoff for a triggered sweep.
#[derive(Deserialize)]
pub struct SweepParams {
    #[serde(default)]
    pub until: Option<String>,
}

pub async fn sweep(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SweepParams>,
) -> ApiResult<StatusCode> {
    let until = match params.until {
        Some(raw) => raw.parse().map_err(|_| {
            ApiError(Error::Validation(format!("invalid cutoff date {raw:?}")))
        })?,
        None => state.config.default_cutoff(),
    };
    gc::collect_garbage(&*state.store, &state.layout, until).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn purge(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RecordsPayload>,
) -> ApiResult<StatusCode> {
    let records = parse_iris(&payload.records)?;
    gc::purge_records(&*state.store, &state.layout, &records).await?;
    Ok(StatusCode::NO_CONTENT)
}
