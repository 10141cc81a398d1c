//! Router construction and server startup.

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::handler;
use super::AppState;
use crate::config::{Config, GraphLayout};
use crate::store::QuadStore;

/// Build the service router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/collections",
            post(handler::create_collection).get(handler::list_collections),
        )
        .route(
            "/collections/:uri",
            get(handler::get_collection)
                .put(handler::update_collection)
                .delete(handler::delete_collection),
        )
        .route(
            "/collections/:uri/records",
            get(handler::collection_records)
                .post(handler::add_records)
                .put(handler::set_records)
                .delete(handler::remove_records),
        )
        .route("/records/blank", post(handler::create_blank_record))
        .route(
            "/records/:uri",
            get(handler::get_record).put(handler::refresh_record),
        )
        .route("/records/:uri/annotations", get(handler::record_annotations))
        .route("/annotations", post(handler::create_annotation))
        .route(
            "/annotations/:uri",
            axum::routing::put(handler::update_annotation)
                .delete(handler::delete_annotation),
        )
        .route("/gc/sweep", post(handler::sweep))
        .route("/gc/purge", post(handler::purge))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the facade until the process is stopped.
pub async fn serve(
    config: Config,
    layout: GraphLayout,
    store: Arc<dyn QuadStore>,
) -> anyhow::Result<()> {
    let port = config.http_port;
    let state = Arc::new(AppState {
        store,
        layout,
        config,
    });
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("cardex facade listening on http://localhost:{port}");
    axum::serve(listener, app).await?;
    Ok(())
}
